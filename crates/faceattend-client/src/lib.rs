//! faceattend-client — HTTP client for the remote recognition service.
//!
//! Submits one camera still per scan attempt as a multipart upload and
//! maps every observable result (match payload, benign negative, fault)
//! into the core outcome taxonomy.

pub mod classify;
pub mod client;
pub mod wire;

pub use classify::classify;
pub use client::{Recognize, RecognitionClient, SubmitError};
pub use wire::{MatchReply, ReplyStatus};
