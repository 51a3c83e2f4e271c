use crate::session::{SessionError, SessionHandle};
use zbus::interface;

/// D-Bus surface for external presentation layers.
///
/// Bus name: org.faceattend.FaceAttend1
/// Object path: /org/faceattend/FaceAttend1
///
/// The daemon never renders; kiosk and classroom frontends read the
/// display state and feed from here.
pub struct AttendService {
    handle: SessionHandle,
}

impl AttendService {
    pub fn new(handle: SessionHandle) -> Self {
        Self { handle }
    }
}

#[interface(name = "org.faceattend.FaceAttend1")]
impl AttendService {
    /// Current display state as a JSON object.
    async fn status(&self) -> zbus::fdo::Result<String> {
        let report = self.handle.status().await.map_err(to_fdo)?;
        Ok(serde_json::json!({
            "status": report.status.as_str(),
            "label": report.label,
            "message": report.message,
            "camera_active": report.camera_active,
            "in_state_ms": report.in_state.as_millis() as u64,
        })
        .to_string())
    }

    /// Live feed entries, newest first, as a JSON array.
    async fn feed(&self) -> zbus::fdo::Result<String> {
        let entries = self.handle.feed().await.map_err(to_fdo)?;
        serde_json::to_string(&entries).map_err(|e| zbus::fdo::Error::Failed(e.to_string()))
    }

    /// Pause or resume scanning without ending the session.
    async fn set_camera_active(&self, active: bool) -> zbus::fdo::Result<()> {
        self.handle.set_camera_active(active).await.map_err(to_fdo)
    }

    /// End the scan session.
    async fn stop(&self) -> zbus::fdo::Result<()> {
        self.handle.stop().await.map_err(to_fdo)
    }
}

fn to_fdo(err: SessionError) -> zbus::fdo::Error {
    zbus::fdo::Error::Failed(err.to_string())
}
