//! Presentation state machine with timed reversion to idle.
//!
//! One instance owns the user-visible status for a scanning surface. All
//! mutation goes through [`PresentationStateMachine::begin_scan`],
//! [`apply`](PresentationStateMachine::apply) and
//! [`revert_if_due`](PresentationStateMachine::revert_if_due); callers
//! inject the current `Instant`, so transitions are deterministic under
//! test without a running clock.

use crate::outcome::{Outcome, Student};
use std::time::{Duration, Instant};

/// Text shown while no face is being processed.
const IDLE_MESSAGE: &str = "Looking for faces...";

/// Text shown while a recognition request is in flight.
const SCANNING_MESSAGE: &str = "Identifying...";

/// User-visible status tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Scanning,
    Success,
    Partial,
    Error,
}

impl Status {
    /// Lowercase tag for log fields and status payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Idle => "idle",
            Status::Scanning => "scanning",
            Status::Success => "success",
            Status::Partial => "partial",
            Status::Error => "error",
        }
    }

    /// True for states that are shown for a fixed duration and then revert.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Success | Status::Partial | Status::Error)
    }
}

/// The single user-visible state of a scanning surface.
#[derive(Debug, Clone)]
pub struct DisplayState {
    pub status: Status,
    /// Name of the recognized person, when one is shown.
    pub label: Option<String>,
    pub message: String,
    pub entered_at: Instant,
}

/// Acknowledgment cue requested on entry to a terminal state. Cosmetic;
/// playback is a presentation concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Chime,
    Neutral,
}

impl Cue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cue::Chime => "chime",
            Cue::Neutral => "neutral",
        }
    }
}

/// An accepted recognition, handed back to the orchestrator for dedupe
/// and feed handling.
#[derive(Debug, Clone)]
pub struct Acceptance {
    pub student: Student,
    pub message: String,
}

/// Side effects requested by [`PresentationStateMachine::apply`].
#[derive(Debug, Default)]
pub struct Applied {
    pub cue: Option<Cue>,
    pub acceptance: Option<Acceptance>,
}

/// Drives `Idle → Scanning → {Success | Partial | Error | Idle} → Idle`.
///
/// Terminal states arm a reversion deadline; leaving a terminal state for
/// any reason clears it, so at most one deadline is ever pending.
pub struct PresentationStateMachine {
    state: DisplayState,
    revert_at: Option<Instant>,
    display_for: Duration,
}

impl PresentationStateMachine {
    pub fn new(display_for: Duration, now: Instant) -> Self {
        Self {
            state: DisplayState {
                status: Status::Idle,
                label: None,
                message: IDLE_MESSAGE.to_string(),
                entered_at: now,
            },
            revert_at: None,
            display_for,
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Deadline of the pending reversion timer, if a terminal state is
    /// currently displayed.
    pub fn revert_deadline(&self) -> Option<Instant> {
        self.revert_at
    }

    /// Enter `Scanning`. Cancels a pending reversion: a new attempt
    /// supersedes whatever result was on screen.
    pub fn begin_scan(&mut self, now: Instant) {
        self.revert_at = None;
        self.enter(Status::Scanning, None, SCANNING_MESSAGE.to_string(), now);
    }

    /// Apply a classified outcome to the current display.
    ///
    /// `NoMatch` returns straight to idle with nothing armed; the other
    /// outcomes enter their terminal state and arm exactly one reversion
    /// deadline, replacing any previous one.
    pub fn apply(&mut self, outcome: Outcome, now: Instant) -> Applied {
        match outcome {
            Outcome::Success { student, message } => {
                self.enter(
                    Status::Success,
                    Some(student.name.clone()),
                    message.clone(),
                    now,
                );
                self.arm_revert(now);
                Applied {
                    cue: Some(Cue::Chime),
                    acceptance: Some(Acceptance { student, message }),
                }
            }
            Outcome::Partial { student, message } => {
                self.enter(Status::Partial, Some(student.name), message, now);
                self.arm_revert(now);
                Applied {
                    cue: Some(Cue::Neutral),
                    acceptance: None,
                }
            }
            Outcome::NoMatch => {
                self.revert_at = None;
                self.enter_idle(now);
                Applied::default()
            }
            Outcome::SystemError { message } => {
                self.enter(Status::Error, None, message, now);
                self.arm_revert(now);
                Applied::default()
            }
        }
    }

    /// Restore idle if the reversion deadline has passed. Returns whether
    /// a reversion happened.
    pub fn revert_if_due(&mut self, now: Instant) -> bool {
        match self.revert_at {
            Some(at) if now >= at => {
                self.revert_at = None;
                self.enter_idle(now);
                true
            }
            _ => false,
        }
    }

    fn arm_revert(&mut self, now: Instant) {
        self.revert_at = Some(now + self.display_for);
    }

    fn enter_idle(&mut self, now: Instant) {
        self.enter(Status::Idle, None, IDLE_MESSAGE.to_string(), now);
    }

    fn enter(&mut self, status: Status, label: Option<String>, message: String, now: Instant) {
        tracing::debug!(from = self.state.status.as_str(), to = status.as_str(), "display transition");
        self.state = DisplayState {
            status,
            label,
            message,
            entered_at: now,
        };
    }
}
