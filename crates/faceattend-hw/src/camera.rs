//! V4L2 still capture via the `v4l` crate.

use crate::convert;
use faceattend_core::{FrameSource, StillFrame};
use std::path::Path;
use thiserror::Error;
use v4l::buffer::Type as BufType;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

/// Resolution requested from the driver. Recognition uploads do not need
/// more, and smaller frames keep the multipart payload cheap.
const REQUEST_WIDTH: u32 = 640;
const REQUEST_HEIGHT: u32 = 360;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("device busy")]
    DeviceBusy,
    #[error("video capture not supported by {0}")]
    CaptureNotSupported(String),
    #[error("unsupported pixel format {0} (need YUYV, GREY, or Y16)")]
    UnsupportedFormat(String),
    #[error("capture failed: {0}")]
    CaptureFailed(String),
}

/// Pixel format negotiated with the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Packed YUYV 4:2:2; luma extracted from even bytes.
    Yuyv,
    /// Native 8-bit grayscale.
    Grey,
    /// 16-bit little-endian grayscale, downscaled to 8-bit.
    Y16,
}

impl PixelFormat {
    fn negotiate(fourcc: FourCC) -> Option<Self> {
        if fourcc == FourCC::new(b"YUYV") {
            Some(PixelFormat::Yuyv)
        } else if fourcc == FourCC::new(b"GREY") {
            Some(PixelFormat::Grey)
        } else if fourcc == FourCC::new(b"Y16 ") || fourcc == FourCC::new(b"Y16\0") {
            Some(PixelFormat::Y16)
        } else {
            None
        }
    }
}

/// A discovered capture-capable device, for diagnostics.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
    pub driver: String,
}

/// Exclusive handle on one V4L2 capture device.
///
/// The handle is owned by the active session; the kernel resources go away
/// when it drops, on every exit path. Streams exist only inside a capture
/// call, so nothing runs between ticks.
pub struct Camera {
    device: Device,
    pub device_path: String,
    pub width: u32,
    pub height: u32,
    pixel_format: PixelFormat,
}

impl Camera {
    /// Open `device_path`, negotiate a format, and discard `warmup_frames`
    /// frames so auto-gain and auto-exposure settle before the first scan.
    pub fn open(device_path: &str, warmup_frames: usize) -> Result<Self, CameraError> {
        if !Path::new(device_path).exists() {
            return Err(CameraError::DeviceNotFound(device_path.to_string()));
        }

        let device = Device::with_path(device_path).map_err(|e| {
            if e.to_string().contains("busy") || e.to_string().contains("EBUSY") {
                CameraError::DeviceBusy
            } else {
                CameraError::DeviceNotFound(format!("{device_path}: {e}"))
            }
        })?;

        let caps = device
            .query_caps()
            .map_err(|e| CameraError::CaptureFailed(format!("query capabilities: {e}")))?;
        if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
            return Err(CameraError::CaptureNotSupported(device_path.to_string()));
        }

        let mut fmt = device
            .format()
            .map_err(|e| CameraError::CaptureFailed(format!("get format: {e}")))?;
        fmt.fourcc = FourCC::new(b"YUYV");
        fmt.width = REQUEST_WIDTH;
        fmt.height = REQUEST_HEIGHT;
        let negotiated = device
            .set_format(&fmt)
            .map_err(|e| CameraError::CaptureFailed(format!("set format: {e}")))?;

        let pixel_format = PixelFormat::negotiate(negotiated.fourcc)
            .ok_or_else(|| CameraError::UnsupportedFormat(format!("{:?}", negotiated.fourcc)))?;

        tracing::info!(
            device = device_path,
            driver = %caps.driver,
            card = %caps.card,
            width = negotiated.width,
            height = negotiated.height,
            format = ?pixel_format,
            "camera opened"
        );

        let camera = Self {
            device,
            device_path: device_path.to_string(),
            width: negotiated.width,
            height: negotiated.height,
            pixel_format,
        };

        if warmup_frames > 0 {
            tracing::debug!(count = warmup_frames, "discarding warmup frames");
            for _ in 0..warmup_frames {
                let _ = camera.grab_luma();
            }
        }

        Ok(camera)
    }

    /// Dequeue one frame and convert it to 8-bit grayscale.
    fn grab_luma(&self) -> Result<Vec<u8>, CameraError> {
        let mut stream = MmapStream::with_buffers(&self.device, BufType::VideoCapture, 4)
            .map_err(|e| CameraError::CaptureFailed(format!("mmap stream: {e}")))?;
        let (buf, _meta) = stream
            .next()
            .map_err(|e| CameraError::CaptureFailed(format!("dequeue buffer: {e}")))?;

        let luma = match self.pixel_format {
            PixelFormat::Yuyv => convert::luma_from_yuyv(buf, self.width, self.height),
            PixelFormat::Y16 => convert::luma_from_y16(buf, self.width, self.height),
            PixelFormat::Grey => {
                let pixels = (self.width * self.height) as usize;
                if buf.len() < pixels {
                    return Err(CameraError::CaptureFailed(format!(
                        "GREY buffer too short: expected {pixels}, got {}",
                        buf.len()
                    )));
                }
                Ok(buf[..pixels].to_vec())
            }
        };
        luma.map_err(|e| CameraError::CaptureFailed(e.to_string()))
    }

    /// List capture-capable `/dev/video*` devices.
    pub fn enumerate() -> Vec<DeviceInfo> {
        let mut devices = Vec::new();
        for i in 0..16 {
            let path = format!("/dev/video{i}");
            if !Path::new(&path).exists() {
                continue;
            }
            let Ok(dev) = Device::with_path(&path) else {
                continue;
            };
            let Ok(caps) = dev.query_caps() else {
                continue;
            };
            if caps
                .capabilities
                .contains(v4l::capability::Flags::VIDEO_CAPTURE)
            {
                devices.push(DeviceInfo {
                    path,
                    name: caps.card.clone(),
                    driver: caps.driver.clone(),
                });
            }
        }
        devices
    }
}

impl FrameSource for Camera {
    /// Grab the current still as JPEG, or `None` when no usable frame is
    /// available. Capture errors and dark frames are skip conditions for
    /// the scan loop, never faults.
    fn capture_still(&mut self) -> Option<StillFrame> {
        let luma = match self.grab_luma() {
            Ok(luma) => luma,
            Err(err) => {
                tracing::warn!(device = %self.device_path, error = %err, "frame grab failed");
                return None;
            }
        };

        if convert::is_too_dark(&luma) {
            tracing::debug!(device = %self.device_path, "dark frame skipped");
            return None;
        }

        match convert::encode_jpeg(&luma, self.width, self.height) {
            Ok(jpeg) => Some(StillFrame {
                jpeg,
                width: self.width,
                height: self.height,
            }),
            Err(err) => {
                tracing::warn!(error = %err, "jpeg encode failed");
                None
            }
        }
    }
}
