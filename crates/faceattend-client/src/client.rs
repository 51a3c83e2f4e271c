//! HTTP submission of camera stills to the recognition endpoint.

use crate::wire::MatchReply;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubmitError {
    /// No face detected or no matching identity (HTTP 404/400). Benign.
    #[error("no recognizable face")]
    NoMatch,
    #[error("recognition request timed out")]
    Timeout,
    #[error("recognition service returned HTTP {0}")]
    Http(u16),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed reply: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SubmitError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SubmitError::Timeout
        } else if err.is_decode() {
            SubmitError::Decode(err.to_string())
        } else {
            SubmitError::Transport(err.to_string())
        }
    }
}

/// One recognition submission: a still frame in, a match reply or a
/// classified failure out. Abstracted so the session orchestrator can be
/// driven by a scripted recognizer under test.
pub trait Recognize: Send + Sync + 'static {
    fn submit(
        &self,
        jpeg: &[u8],
        subject_id: Option<i64>,
    ) -> impl Future<Output = Result<MatchReply, SubmitError>> + Send;
}

/// Client for one recognition endpoint.
///
/// The same client serves both surfaces; they differ only in endpoint URL
/// and whether a subject context accompanies the upload.
#[derive(Clone)]
pub struct RecognitionClient {
    http: reqwest::Client,
    endpoint: String,
}

impl RecognitionClient {
    /// Build a client with request and connect timeouts. A stalled service
    /// can therefore never hold a scan attempt open indefinitely.
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, SubmitError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { http, endpoint })
    }

    /// Submit one still frame, with the subject context attached when the
    /// surface scans for a specific class session.
    pub async fn submit(
        &self,
        jpeg: &[u8],
        subject_id: Option<i64>,
    ) -> Result<MatchReply, SubmitError> {
        let part = Part::bytes(jpeg.to_vec())
            .file_name("scan.jpg")
            .mime_str("image/jpeg")?;
        let mut form = Form::new().part("file", part);
        if let Some(id) = subject_id {
            form = form.text("subject_id", id.to_string());
        }

        let response = self
            .http
            .post(self.endpoint.as_str())
            .multipart(form)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let reply = response.json::<MatchReply>().await?;
                tracing::debug!(status = ?reply.status, "recognition reply");
                Ok(reply)
            }
            // The service reports "no face" / "unknown face" this way on
            // most ticks; it is not a fault.
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => Err(SubmitError::NoMatch),
            status => Err(SubmitError::Http(status.as_u16())),
        }
    }
}

impl Recognize for RecognitionClient {
    fn submit(
        &self,
        jpeg: &[u8],
        subject_id: Option<i64>,
    ) -> impl Future<Output = Result<MatchReply, SubmitError>> + Send {
        RecognitionClient::submit(self, jpeg, subject_id)
    }
}
