use std::time::Duration;

/// Daemon configuration, loaded from environment variables.
pub struct Config {
    /// Base URL of the recognition service.
    pub api_url: String,
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    /// Tick period of the kiosk auto-scan loop.
    pub kiosk_interval: Duration,
    /// Tick period of the classroom scan loop.
    pub classroom_interval: Duration,
    /// How long a terminal result stays on screen before reverting.
    pub display_duration: Duration,
    /// Upper bound on one recognition request.
    pub request_timeout: Duration,
    /// Frames discarded at startup for camera AGC/AE stabilization.
    pub warmup_frames: usize,
    /// Entries retained by the classroom live feed.
    pub feed_capacity: usize,
    /// Path of the kiosk recognition endpoint.
    pub kiosk_path: String,
    /// Path of the classroom recognition endpoint.
    pub classroom_path: String,
}

impl Config {
    /// Load configuration from `FACEATTEND_*` environment variables with
    /// defaults. Timing values are per-surface and independently tunable.
    pub fn from_env() -> Self {
        Self {
            api_url: env_string("FACEATTEND_API_URL", "http://localhost:8000"),
            camera_device: env_string("FACEATTEND_CAMERA_DEVICE", "/dev/video0"),
            kiosk_interval: Duration::from_millis(env_u64("FACEATTEND_KIOSK_INTERVAL_MS", 3000)),
            classroom_interval: Duration::from_millis(env_u64(
                "FACEATTEND_CLASSROOM_INTERVAL_MS",
                2000,
            )),
            display_duration: Duration::from_millis(env_u64("FACEATTEND_DISPLAY_MS", 3500)),
            request_timeout: Duration::from_secs(env_u64("FACEATTEND_REQUEST_TIMEOUT_SECS", 10)),
            warmup_frames: env_usize("FACEATTEND_WARMUP_FRAMES", 4),
            feed_capacity: env_usize("FACEATTEND_FEED_CAPACITY", 10),
            kiosk_path: env_string("FACEATTEND_KIOSK_ENDPOINT", "/attendance/auto-mark"),
            classroom_path: env_string(
                "FACEATTEND_CLASSROOM_ENDPOINT",
                "/teacher/attendance/live",
            ),
        }
    }

    /// Full URL of the kiosk recognition endpoint.
    pub fn kiosk_endpoint(&self) -> String {
        join_url(&self.api_url, &self.kiosk_path)
    }

    /// Full URL of the classroom recognition endpoint.
    pub fn classroom_endpoint(&self) -> String {
        join_url(&self.api_url, &self.classroom_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
