//! Session orchestrator: the periodic, single-flight scan loop.
//!
//! One tokio task owns every piece of mutable session state — display
//! machine, dedupe guard, feed, camera handle — and drives it from a
//! single `select!` over the tick timer, the reversion deadline and the
//! command channel. The recognition call is awaited inline in that task,
//! so a second attempt can never start while one is in flight and a late
//! result can never be applied after the task has exited.

use faceattend_client::{classify, Recognize, SubmitError};
use faceattend_core::{
    DedupeGuard, FrameSource, LogEntry, LogFeed, PresentationStateMachine, Status,
};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session task exited")]
    Closed,
}

/// Per-surface parameters of a scan session. All timing comes from
/// configuration; nothing here is hard-coded at use sites.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub scan_interval: Duration,
    pub display_duration: Duration,
    /// Kiosk: withhold new scan attempts while a Success/Partial result
    /// is displayed.
    pub cooldown_while_displayed: bool,
    /// Classroom: record accepted recognitions into the live feed,
    /// gated by the dedupe guard.
    pub feed_enabled: bool,
    pub feed_capacity: usize,
    /// Classroom: subject context attached to each submission.
    pub subject_id: Option<i64>,
}

impl SessionConfig {
    /// Unattended entry kiosk: scanning pauses while a result is shown.
    pub fn kiosk(scan_interval: Duration, display_duration: Duration) -> Self {
        Self {
            scan_interval,
            display_duration,
            cooldown_while_displayed: true,
            feed_enabled: false,
            feed_capacity: faceattend_core::feed::DEFAULT_FEED_CAPACITY,
            subject_id: None,
        }
    }

    /// Instructor-facing classroom surface: scanning continues through
    /// displayed results; duplicates are suppressed at the feed instead.
    pub fn classroom(
        scan_interval: Duration,
        display_duration: Duration,
        subject_id: i64,
        feed_capacity: usize,
    ) -> Self {
        Self {
            scan_interval,
            display_duration,
            cooldown_while_displayed: false,
            feed_enabled: true,
            feed_capacity,
            subject_id: Some(subject_id),
        }
    }
}

/// Point-in-time view of the session for the presentation layer.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub status: Status,
    pub label: Option<String>,
    pub message: String,
    pub camera_active: bool,
    /// Time spent in the current display state.
    pub in_state: Duration,
}

/// Messages sent from IPC handlers to the session task.
enum SessionCommand {
    Status { reply: oneshot::Sender<StatusReport> },
    Feed { reply: oneshot::Sender<Vec<LogEntry>> },
    SetCameraActive(bool),
    Stop,
}

/// Clone-safe handle to the session task.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub async fn status(&self) -> Result<StatusReport, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Status { reply: reply_tx })
            .await
            .map_err(|_| SessionError::Closed)?;
        reply_rx.await.map_err(|_| SessionError::Closed)
    }

    pub async fn feed(&self) -> Result<Vec<LogEntry>, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Feed { reply: reply_tx })
            .await
            .map_err(|_| SessionError::Closed)?;
        reply_rx.await.map_err(|_| SessionError::Closed)
    }

    pub async fn set_camera_active(&self, active: bool) -> Result<(), SessionError> {
        self.tx
            .send(SessionCommand::SetCameraActive(active))
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// End the session. The camera handle is released when the task
    /// drops; an in-flight recognition call finishes into the void.
    pub async fn stop(&self) -> Result<(), SessionError> {
        self.tx
            .send(SessionCommand::Stop)
            .await
            .map_err(|_| SessionError::Closed)
    }
}

/// Spawn the session task and return its handle.
pub fn spawn_session<F, R>(cfg: SessionConfig, frames: F, recognizer: R) -> SessionHandle
where
    F: FrameSource,
    R: Recognize,
{
    let (tx, rx) = mpsc::channel(8);
    let session = Session::new(cfg, frames, recognizer);
    tokio::spawn(session.run(rx));
    SessionHandle { tx }
}

struct Session<F, R> {
    cfg: SessionConfig,
    machine: PresentationStateMachine,
    dedupe: DedupeGuard,
    feed: LogFeed,
    frames: F,
    recognizer: R,
    camera_active: bool,
}

impl<F, R> Session<F, R>
where
    F: FrameSource,
    R: Recognize,
{
    fn new(cfg: SessionConfig, frames: F, recognizer: R) -> Self {
        Self {
            machine: PresentationStateMachine::new(cfg.display_duration, now()),
            dedupe: DedupeGuard::new(),
            feed: LogFeed::new(cfg.feed_capacity),
            frames,
            recognizer,
            camera_active: true,
            cfg,
        }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<SessionCommand>) {
        let mut ticker = tokio::time::interval_at(
            tokio::time::Instant::now() + self.cfg.scan_interval,
            self.cfg.scan_interval,
        );
        // A slow recognition call must not be followed by a tick burst.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_ms = self.cfg.scan_interval.as_millis() as u64,
            display_ms = self.cfg.display_duration.as_millis() as u64,
            feed = self.cfg.feed_enabled,
            "session started"
        );

        loop {
            let revert_at = self
                .machine
                .revert_deadline()
                .map(tokio::time::Instant::from_std);

            tokio::select! {
                _ = ticker.tick() => self.on_tick().await,
                _ = tokio::time::sleep_until(revert_at.unwrap_or_else(tokio::time::Instant::now)),
                    if revert_at.is_some() =>
                {
                    if self.machine.revert_if_due(now()) {
                        tracing::debug!("display reverted to idle");
                    }
                }
                cmd = rx.recv() => match cmd {
                    Some(SessionCommand::Status { reply }) => {
                        let _ = reply.send(self.status_report());
                    }
                    Some(SessionCommand::Feed { reply }) => {
                        let _ = reply.send(self.feed.snapshot());
                    }
                    Some(SessionCommand::SetCameraActive(active)) => {
                        if self.camera_active != active {
                            tracing::info!(active, "camera toggled");
                        }
                        self.camera_active = active;
                    }
                    Some(SessionCommand::Stop) | None => break,
                },
            }
        }

        tracing::info!("session stopped");
        // Dropping `self` releases the camera handle.
    }

    /// One scheduled scan attempt. No-op unless the session is eligible;
    /// a missing frame is a silent skip.
    async fn on_tick(&mut self) {
        if !self.camera_active {
            return;
        }
        if self.cfg.cooldown_while_displayed
            && matches!(
                self.machine.state().status,
                Status::Success | Status::Partial
            )
        {
            return;
        }

        let Some(frame) = self.frames.capture_still() else {
            tracing::debug!("no frame available; skipping tick");
            return;
        };

        self.machine.begin_scan(now());

        let result = self
            .recognizer
            .submit(&frame.jpeg, self.cfg.subject_id)
            .await;
        match &result {
            Err(SubmitError::NoMatch) => tracing::debug!("no recognizable face"),
            Err(err) => tracing::warn!(error = %err, "recognition request failed"),
            Ok(_) => {}
        }

        let applied = self.machine.apply(classify(result), now());

        if let Some(cue) = applied.cue {
            tracing::debug!(cue = cue.as_str(), "acknowledgment cue");
        }

        if let Some(acceptance) = applied.acceptance {
            if self.cfg.feed_enabled {
                if self.dedupe.admit(acceptance.student.id) {
                    tracing::info!(student = %acceptance.student.name, "attendance logged");
                    self.feed.append(LogEntry::new(
                        acceptance.student.name,
                        acceptance.student.roll_number,
                        acceptance.message,
                    ));
                } else {
                    tracing::debug!(
                        student = %acceptance.student.name,
                        "repeat acceptance suppressed"
                    );
                }
            }
        }
    }

    fn status_report(&self) -> StatusReport {
        let state = self.machine.state();
        StatusReport {
            status: state.status,
            label: state.label.clone(),
            message: state.message.clone(),
            camera_active: self.camera_active,
            in_state: now().duration_since(state.entered_at),
        }
    }
}

/// Session time base. Routed through the tokio clock so the paused-time
/// test harness and the reversion deadline agree on "now".
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

#[cfg(test)]
mod tests {
    use super::*;
    use faceattend_client::{MatchReply, ReplyStatus};
    use faceattend_core::{StillFrame, Student};
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const KIOSK_INTERVAL: Duration = Duration::from_millis(3000);
    const CLASSROOM_INTERVAL: Duration = Duration::from_millis(2000);
    const DISPLAY: Duration = Duration::from_millis(3500);

    struct StaticFrames {
        frame: Option<StillFrame>,
    }

    impl FrameSource for StaticFrames {
        fn capture_still(&mut self) -> Option<StillFrame> {
            self.frame.clone()
        }
    }

    fn live_frames() -> StaticFrames {
        StaticFrames {
            frame: Some(StillFrame {
                jpeg: vec![0xFF, 0xD8, 0x00],
                width: 2,
                height: 2,
            }),
        }
    }

    fn dead_frames() -> StaticFrames {
        StaticFrames { frame: None }
    }

    /// Replays a scripted list of replies (then NoMatch forever), with a
    /// configurable latency and concurrency accounting.
    struct ScriptedRecognizer {
        script: Mutex<VecDeque<Result<MatchReply, SubmitError>>>,
        latency: Duration,
        calls: Arc<AtomicUsize>,
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
    }

    impl ScriptedRecognizer {
        fn new(script: Vec<Result<MatchReply, SubmitError>>, latency: Duration) -> Self {
            Self {
                script: Mutex::new(script.into()),
                latency,
                calls: Arc::new(AtomicUsize::new(0)),
                in_flight: Arc::new(AtomicUsize::new(0)),
                max_in_flight: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Recognize for ScriptedRecognizer {
        fn submit(
            &self,
            _jpeg: &[u8],
            _subject_id: Option<i64>,
        ) -> impl Future<Output = Result<MatchReply, SubmitError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(SubmitError::NoMatch));
            let latency = self.latency;
            let in_flight = self.in_flight.clone();
            let max_in_flight = self.max_in_flight.clone();
            async move {
                let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_in_flight.fetch_max(current, Ordering::SeqCst);
                if latency > Duration::ZERO {
                    tokio::time::sleep(latency).await;
                }
                in_flight.fetch_sub(1, Ordering::SeqCst);
                reply
            }
        }
    }

    fn success(id: i64, name: &str) -> Result<MatchReply, SubmitError> {
        Ok(MatchReply {
            status: ReplyStatus::Success,
            student: Some(Student {
                id,
                name: name.to_string(),
                roll_number: None,
            }),
            message: "Marked Present".to_string(),
        })
    }

    /// Let the session task drain timers and commands that became ready.
    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    async fn advance(duration: Duration) {
        tokio::time::advance(duration).await;
        settle().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_kiosk_success_displays_then_reverts() {
        let recognizer =
            ScriptedRecognizer::new(vec![success(7, "Jane Doe")], Duration::ZERO);
        let calls = recognizer.calls.clone();
        let handle = spawn_session(
            SessionConfig::kiosk(KIOSK_INTERVAL, DISPLAY),
            live_frames(),
            recognizer,
        );

        // First tick at t=3.0s.
        advance(KIOSK_INTERVAL).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let report = handle.status().await.unwrap();
        assert_eq!(report.status, Status::Success);
        assert_eq!(report.label.as_deref(), Some("Jane Doe"));
        assert_eq!(report.message, "Marked Present");

        // Just before the 3.5s reversion deadline the result still shows.
        advance(DISPLAY - Duration::from_millis(100)).await;
        assert_eq!(handle.status().await.unwrap().status, Status::Success);

        // Past the deadline: idle again.
        advance(Duration::from_millis(200)).await;
        let report = handle.status().await.unwrap();
        assert_eq!(report.status, Status::Idle);
        assert!(report.label.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_kiosk_cooldown_withholds_scans_while_displayed() {
        let recognizer = ScriptedRecognizer::new(
            vec![success(7, "Jane Doe"), success(8, "Ravi Kumar")],
            Duration::ZERO,
        );
        let calls = recognizer.calls.clone();
        let handle = spawn_session(
            SessionConfig::kiosk(KIOSK_INTERVAL, DISPLAY),
            live_frames(),
            recognizer,
        );

        // t=3.0s: success displayed until 6.5s.
        advance(KIOSK_INTERVAL).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // t=6.0s: tick fires during the display window and must not scan.
        advance(KIOSK_INTERVAL).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(handle.status().await.unwrap().status, Status::Success);

        // t=9.0s: display reverted at 6.5s, scanning resumed.
        advance(KIOSK_INTERVAL).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_flight_under_slow_service() {
        let recognizer = ScriptedRecognizer::new(
            (0..4).map(|i| success(i, "Jane Doe")).collect(),
            Duration::from_millis(10_000),
        );
        let calls = recognizer.calls.clone();
        let max_in_flight = recognizer.max_in_flight.clone();
        let _handle = spawn_session(
            SessionConfig::kiosk(KIOSK_INTERVAL, DISPLAY),
            live_frames(),
            recognizer,
        );

        // t=3.0s: first call starts, completing at 13.0s.
        advance(KIOSK_INTERVAL).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Ticks at 6.0s, 9.0s and 12.0s fall while the call is in flight.
        advance(Duration::from_millis(9_000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // After completion the loop resumes; never more than one in flight.
        advance(Duration::from_millis(4_100)).await;
        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
        assert!(calls.load(Ordering::SeqCst) >= 2);
        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_frame_means_no_recognition_calls() {
        let recognizer = ScriptedRecognizer::new(vec![], Duration::ZERO);
        let calls = recognizer.calls.clone();
        let handle = spawn_session(
            SessionConfig::kiosk(KIOSK_INTERVAL, DISPLAY),
            dead_frames(),
            recognizer,
        );

        for _ in 0..10 {
            advance(KIOSK_INTERVAL).await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(handle.status().await.unwrap().status, Status::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_camera_toggle_suspends_scanning() {
        let recognizer = ScriptedRecognizer::new(vec![], Duration::ZERO);
        let calls = recognizer.calls.clone();
        let handle = spawn_session(
            SessionConfig::kiosk(KIOSK_INTERVAL, DISPLAY),
            live_frames(),
            recognizer,
        );

        handle.set_camera_active(false).await.unwrap();
        for _ in 0..5 {
            advance(KIOSK_INTERVAL).await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let report = handle.status().await.unwrap();
        assert!(!report.camera_active);
        assert_eq!(report.status, Status::Idle);

        handle.set_camera_active(true).await.unwrap();
        advance(KIOSK_INTERVAL).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_match_stays_silent() {
        let recognizer =
            ScriptedRecognizer::new(vec![Err(SubmitError::NoMatch)], Duration::ZERO);
        let handle = spawn_session(
            SessionConfig::kiosk(KIOSK_INTERVAL, DISPLAY),
            live_frames(),
            recognizer,
        );

        advance(KIOSK_INTERVAL).await;
        let report = handle.status().await.unwrap();
        assert_eq!(report.status, Status::Idle);
        assert!(handle.feed().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_fault_shows_error_then_reverts() {
        let recognizer = ScriptedRecognizer::new(
            vec![Err(SubmitError::Transport("connection refused".into()))],
            Duration::ZERO,
        );
        // Interval longer than the display window so the reversion timer,
        // not the next tick, is what clears the error.
        let handle = spawn_session(
            SessionConfig::kiosk(Duration::from_millis(5000), DISPLAY),
            live_frames(),
            recognizer,
        );

        advance(Duration::from_millis(5000)).await;
        let report = handle.status().await.unwrap();
        assert_eq!(report.status, Status::Error);
        assert_eq!(report.message, "System Disconnected");

        advance(DISPLAY + Duration::from_millis(100)).await;
        assert_eq!(handle.status().await.unwrap().status, Status::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_classroom_dedupe_suppresses_consecutive_repeats() {
        let recognizer = ScriptedRecognizer::new(
            vec![
                success(1, "Alice"),
                success(1, "Alice"),
                success(1, "Alice"),
                success(2, "Bob"),
                success(1, "Alice"),
            ],
            Duration::ZERO,
        );
        let calls = recognizer.calls.clone();
        let handle = spawn_session(
            SessionConfig::classroom(CLASSROOM_INTERVAL, DISPLAY, 42, 10),
            live_frames(),
            recognizer,
        );

        // Five ticks; the classroom surface never cools down. Advanced
        // one period at a time so no tick is coalesced away.
        for _ in 0..5 {
            advance(CLASSROOM_INTERVAL).await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 5);

        // [A, A, A, B, A] logs as [A, B, A], newest first.
        let entries = handle.feed().await.unwrap();
        let labels: Vec<&str> = entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["Alice", "Bob", "Alice"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_session() {
        let recognizer = ScriptedRecognizer::new(vec![], Duration::ZERO);
        let calls = recognizer.calls.clone();
        let handle = spawn_session(
            SessionConfig::kiosk(KIOSK_INTERVAL, DISPLAY),
            live_frames(),
            recognizer,
        );

        handle.stop().await.unwrap();
        settle().await;
        assert!(matches!(handle.status().await, Err(SessionError::Closed)));

        advance(KIOSK_INTERVAL * 3).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
