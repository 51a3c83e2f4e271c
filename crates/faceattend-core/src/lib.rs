//! faceattend-core — Scan orchestration primitives.
//!
//! Pure types and logic shared by both attendance surfaces: the outcome
//! taxonomy, the presentation state machine with timed reversion, the
//! duplicate-acceptance guard, and the bounded live log feed. No I/O and
//! no async runtime; time enters as `Instant` parameters.

pub mod dedupe;
pub mod feed;
pub mod frame;
pub mod machine;
pub mod outcome;

pub use dedupe::DedupeGuard;
pub use feed::{LogEntry, LogFeed};
pub use frame::{FrameSource, StillFrame};
pub use machine::{Acceptance, Applied, Cue, DisplayState, PresentationStateMachine, Status};
pub use outcome::{Outcome, Student};
