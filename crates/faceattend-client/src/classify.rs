//! Maps a submission result onto the fixed outcome taxonomy.

use crate::client::SubmitError;
use crate::wire::{MatchReply, ReplyStatus};
use faceattend_core::Outcome;

/// Pure, deterministic mapping of one recognition result (or failure) to
/// an [`Outcome`].
///
/// The service fails "normally" on most ticks — empty frame, no face,
/// unknown face — and those must stay silent. Only genuine faults become
/// [`Outcome::SystemError`], and always with the generic message; the
/// failure detail belongs in the log, not on screen.
pub fn classify(result: Result<MatchReply, SubmitError>) -> Outcome {
    match result {
        Ok(reply) => match (reply.status, reply.student) {
            (ReplyStatus::Success, Some(student)) => Outcome::Success {
                student,
                message: reply.message,
            },
            (ReplyStatus::Partial, Some(student)) => Outcome::Partial {
                student,
                message: reply.message,
            },
            // A match status without a student is a contract violation.
            (ReplyStatus::Success | ReplyStatus::Partial, None) => Outcome::system_error(),
            // Benign negatives the service reports as 200 bodies.
            (ReplyStatus::Other, _) => Outcome::NoMatch,
        },
        Err(SubmitError::NoMatch) => Outcome::NoMatch,
        Err(_) => Outcome::system_error(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faceattend_core::Student;

    fn reply(status: ReplyStatus, student: Option<Student>, message: &str) -> MatchReply {
        MatchReply {
            status,
            student,
            message: message.to_string(),
        }
    }

    fn jane() -> Student {
        Student {
            id: 12,
            name: "Jane Doe".into(),
            roll_number: Some("R-101".into()),
        }
    }

    #[test]
    fn test_success_reply_classifies_success() {
        let outcome = classify(Ok(reply(
            ReplyStatus::Success,
            Some(jane()),
            "Marked Present",
        )));
        assert_eq!(
            outcome,
            Outcome::Success {
                student: jane(),
                message: "Marked Present".into()
            }
        );
    }

    #[test]
    fn test_partial_reply_classifies_partial() {
        let outcome = classify(Ok(reply(
            ReplyStatus::Partial,
            Some(jane()),
            "No class is currently scheduled.",
        )));
        assert!(matches!(outcome, Outcome::Partial { .. }));
    }

    #[test]
    fn test_benign_negative_body_is_no_match() {
        let outcome = classify(Ok(reply(ReplyStatus::Other, None, "No face recognized")));
        assert_eq!(outcome, Outcome::NoMatch);
    }

    #[test]
    fn test_http_not_found_is_no_match() {
        assert_eq!(classify(Err(SubmitError::NoMatch)), Outcome::NoMatch);
    }

    #[test]
    fn test_transport_fault_is_system_error_with_generic_message() {
        let outcome = classify(Err(SubmitError::Transport("connection refused".into())));
        assert_eq!(
            outcome,
            Outcome::SystemError {
                message: Outcome::DISCONNECTED_MESSAGE.into()
            }
        );
    }

    #[test]
    fn test_timeout_is_system_error() {
        assert!(matches!(
            classify(Err(SubmitError::Timeout)),
            Outcome::SystemError { .. }
        ));
    }

    #[test]
    fn test_server_error_status_is_system_error() {
        assert!(matches!(
            classify(Err(SubmitError::Http(500))),
            Outcome::SystemError { .. }
        ));
    }

    #[test]
    fn test_match_without_student_is_system_error() {
        let outcome = classify(Ok(reply(ReplyStatus::Success, None, "Marked Present")));
        assert!(matches!(outcome, Outcome::SystemError { .. }));
    }
}
