//! Contract consumed from the 3D rendering engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::Handedness;
use crate::projection::Viewport;

/// What the engine can accept for camera placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineCapabilities {
    /// Engine coordinate handedness.
    pub handedness: Handedness,
    /// The camera node accepts a raw local-to-world matrix.
    pub accepts_raw_matrix: bool,
    /// Automatic matrix recomputation from position/rotation can be disabled.
    pub manual_matrix_update: bool,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

impl EngineCapabilities {
    /// three.js and A-Frame: right-handed, raw matrices with
    /// `matrixAutoUpdate = false`.
    #[must_use]
    pub const fn right_handed_matrix() -> Self {
        Self {
            handedness: Handedness::Right,
            accepts_raw_matrix: true,
            manual_matrix_update: true,
            near: 0.1,
            far: 1000.0,
        }
    }

    /// Babylon.js: left-handed, camera placed by position and quaternion.
    #[must_use]
    pub const fn left_handed_decompose() -> Self {
        Self {
            handedness: Handedness::Left,
            accepts_raw_matrix: false,
            manual_matrix_update: false,
            near: 0.01,
            far: 1000.0,
        }
    }
}

/// Identifier for an in-flight asset load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Create a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-blocking model/texture load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRequest {
    /// Request identifier echoed back in the completion event.
    pub id: RequestId,
    /// Asset URI.
    pub uri: String,
    /// 1-based attempt number.
    pub attempt: u32,
    /// Delay the loader should wait before fetching (retry backoff).
    pub delay_ms: u64,
}

impl AssetRequest {
    /// First attempt at loading `uri`.
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            id: RequestId::new(),
            uri: uri.into(),
            attempt: 1,
            delay_ms: 0,
        }
    }

    /// Follow-up attempt for the same request after `delay_ms`.
    #[must_use]
    pub fn retry(&self, delay_ms: u64) -> Self {
        Self {
            id: self.id,
            uri: self.uri.clone(),
            attempt: self.attempt + 1,
            delay_ms,
        }
    }
}

/// The rendering engine as seen by the adaptation layer.
pub trait RenderEngine {
    /// Camera capabilities, used to pick the pose strategy.
    fn capabilities(&self) -> EngineCapabilities;

    /// Resize the output surface.
    fn resize_surface(&mut self, viewport: Viewport);

    /// Start loading an asset. Must not block; the host delivers
    /// `SessionEvent::AssetLoaded` or `SessionEvent::AssetFailed` later.
    fn load_asset(&mut self, request: AssetRequest);
}
