//! Wire types for the recognition service's JSON replies.

use faceattend_core::Student;
use serde::Deserialize;

/// `status` field of a 2xx reply body.
///
/// The service also reports benign negatives ("idle", "error") as 200
/// bodies; those fold into [`ReplyStatus::Other`] and classify as no-match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Success,
    Partial,
    #[serde(other)]
    Other,
}

/// Body of a 2xx reply from the recognition endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchReply {
    pub status: ReplyStatus,
    /// Absent on benign-negative bodies.
    #[serde(default)]
    pub student: Option<Student>,
    #[serde(default)]
    pub message: String,
}
