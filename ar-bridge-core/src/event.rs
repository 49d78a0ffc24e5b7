//! Session events dispatched to the adaptation layer.

use serde::{Deserialize, Serialize};

use crate::engine::RequestId;
use crate::math::{Quat, Vec3};
use crate::pose::Pose;
use crate::projection::{NormalizedTouch, Viewport};

/// SDK event kinds a session can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// New camera pose.
    Pose,
    /// Render surface changed size.
    Resize,
    /// Screen touch.
    Touch,
    /// Render frame tick.
    Frame,
    /// Tracked target found.
    Detected,
    /// Tracked target lost.
    Lost,
    /// Continuous surface hit-test result.
    HitTestResult,
}

/// A touch position as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "space", rename_all = "snake_case")]
pub enum TouchInput {
    /// Already in normalized device coordinates (what the SDK delivers).
    Normalized {
        /// Horizontal position in `[-1, 1]`.
        x: f32,
        /// Vertical position in `[-1, 1]`, Y up.
        y: f32,
    },
    /// Raw client pixels (what a DOM touch listener delivers).
    Pixels {
        /// Pixels from the left edge.
        x: f32,
        /// Pixels from the top edge.
        y: f32,
    },
}

impl TouchInput {
    /// Normalize against the current viewport.
    #[must_use]
    pub fn normalize(&self, viewport: Viewport) -> Option<NormalizedTouch> {
        match *self {
            Self::Normalized { x, y } => Some(NormalizedTouch::new(x, y)),
            Self::Pixels { x, y } => viewport.normalize(x, y),
        }
    }
}

impl From<NormalizedTouch> for TouchInput {
    fn from(touch: NormalizedTouch) -> Self {
        Self::Normalized {
            x: touch.x,
            y: touch.y,
        }
    }
}

/// A surface hit reported continuously by the SDK in hit-test mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitTestResult {
    /// World position of the hit.
    pub position: Vec3,
    /// Surface orientation at the hit.
    pub rotation: Quat,
}

/// Everything the single event-processing function handles.
///
/// SDK kinds are delivered only when subscribed; asset completions always are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionEvent {
    /// New camera pose.
    Pose(Pose),
    /// Render surface changed size.
    Resize(Viewport),
    /// Screen touch.
    Touch(TouchInput),
    /// Render frame tick.
    Frame {
        /// Host clock in milliseconds.
        timestamp_ms: u64,
    },
    /// Tracked target found.
    Detected {
        /// Target identifier (image ID, decoded QR text, scene ID).
        target: String,
    },
    /// Tracked target lost.
    Lost {
        /// Target identifier.
        target: String,
    },
    /// Surface hit-test result.
    HitTestResult(HitTestResult),
    /// An asset load finished.
    AssetLoaded {
        /// The request that finished.
        request_id: RequestId,
    },
    /// An asset load failed.
    AssetFailed {
        /// The request that failed.
        request_id: RequestId,
        /// Loader-provided reason.
        reason: String,
    },
}

impl SessionEvent {
    /// The SDK event kind, or `None` for engine completions.
    #[must_use]
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            Self::Pose(_) => Some(EventKind::Pose),
            Self::Resize(_) => Some(EventKind::Resize),
            Self::Touch(_) => Some(EventKind::Touch),
            Self::Frame { .. } => Some(EventKind::Frame),
            Self::Detected { .. } => Some(EventKind::Detected),
            Self::Lost { .. } => Some(EventKind::Lost),
            Self::HitTestResult(_) => Some(EventKind::HitTestResult),
            Self::AssetLoaded { .. } | Self::AssetFailed { .. } => None,
        }
    }
}
