use serde::{Deserialize, Serialize};

/// A recognized person, as reported by the recognition service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub roll_number: Option<String>,
}

/// Classified result of one scan attempt.
///
/// Produced exclusively by the outcome classifier; the state machine
/// consumes it without further interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Attendance recorded (or already recorded) for a recognized person.
    Success { student: Student, message: String },
    /// Person recognized but a secondary condition was not met
    /// (no class scheduled, outside the time window).
    Partial { student: Student, message: String },
    /// No face in frame or no matching identity. Frequent and silent.
    NoMatch,
    /// Service or network fault. Shown with a generic message.
    SystemError { message: String },
}

impl Outcome {
    /// The message displayed to users when the service is unreachable.
    pub const DISCONNECTED_MESSAGE: &'static str = "System Disconnected";

    pub fn system_error() -> Self {
        Outcome::SystemError {
            message: Self::DISCONNECTED_MESSAGE.to_string(),
        }
    }
}
