//! faceattend-hw — Hardware abstraction for the attendance scan loop.
//!
//! Provides V4L2 still capture behind the core `FrameSource` trait:
//! per-tick frame grabs, grayscale conversion, dark-frame rejection and
//! JPEG encoding for upload to the recognition service.

pub mod camera;
pub mod convert;

pub use camera::{Camera, CameraError, DeviceInfo, PixelFormat};
