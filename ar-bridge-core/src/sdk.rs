//! Contract consumed from the AR tracking SDK.

use serde::{Deserialize, Serialize};

use crate::event::EventKind;
use crate::overlay::InitErrorKind;
use crate::projection::{CameraParameters, Viewport};

/// What the SDK tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingMode {
    /// Horizontal surfaces in front of the device.
    Surface,
    /// Printed image markers.
    Image,
    /// QR codes; detection carries the decoded text.
    QrCode,
    /// A pre-scanned spatial scene.
    Spatial,
}

/// Configuration passed to [`TrackingSdk::init`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    /// Session credential (JWT issued by the SDK vendor).
    pub token: String,
    /// Tracking mode.
    pub mode: TrackingMode,
    /// Scene identifier, required for spatial tracking.
    pub scene_oid: Option<String>,
    /// Force the SDK's own tracking instead of a WebXR session.
    pub disable_webxr: bool,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            mode: TrackingMode::Surface,
            scene_oid: None,
            disable_webxr: false,
        }
    }
}

/// Opaque handle to the camera video feed, usable as a scene background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSource {
    /// Host-defined identifier of the feed.
    pub id: String,
}

/// The tracking SDK as seen by the adaptation layer.
///
/// Implementations dispatch events for subscribed kinds onto the host's
/// single event queue; this crate never calls back into them re-entrantly.
pub trait TrackingSdk {
    /// Initialize tracking and return the render surface size.
    ///
    /// # Errors
    ///
    /// Returns the [`InitErrorKind`] reported by the SDK.
    fn init(&mut self, config: &SdkConfig) -> Result<Viewport, InitErrorKind>;

    /// Current physical camera parameters.
    fn camera_parameters(&self) -> Option<CameraParameters>;

    /// Camera feed, if the SDK exposes one.
    fn camera_feed(&self) -> Option<VideoSource>;

    /// Register interest in an event kind.
    fn subscribe(&mut self, kind: EventKind);

    /// Begin continuous tracking.
    fn start(&mut self);
}
