//! Recorded session traces.
//!
//! A trace scripts everything the outside world does during one session:
//! how the SDK answers, how slow (or broken) each asset is, and the SDK
//! events and user actions in dispatch order.

use std::collections::HashMap;
use std::path::Path;

use ar_bridge_core::{CameraParameters, ExperienceConfig, InitErrorKind, SessionEvent, Viewport};
use serde::{Deserialize, Serialize};

use crate::error::{ReplayError, ReplayResult};

/// Scripted SDK behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkScript {
    /// Init rejection, or `None` for a successful init.
    pub init_error: Option<InitErrorKind>,
    /// Render surface reported by a successful init.
    pub surface: Viewport,
    /// Camera parameters; `None` makes every projection update fail.
    pub camera_parameters: Option<CameraParameters>,
    /// Camera feed identifier, if the SDK exposes one.
    pub camera_feed: Option<String>,
}

impl Default for SdkScript {
    fn default() -> Self {
        Self {
            init_error: None,
            surface: Viewport::new(720, 1280),
            camera_parameters: Some(CameraParameters::new(60.0, 0.5625)),
            camera_feed: None,
        }
    }
}

/// Scripted loader behavior for one asset URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetScript {
    /// Time each attempt takes before it settles.
    pub latency_ms: u64,
    /// Number of leading attempts that fail.
    pub failures: u32,
}

/// Something the user does through the page rather than the SDK.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HostAction {
    /// Let time pass so in-flight loads can settle.
    Wait {
        /// Milliseconds to wait.
        ms: u64,
    },
    /// Place the hit-test preview.
    ConfirmPlacement,
    /// Scale the most recently loaded model.
    SetScale {
        /// New uniform scale.
        scale: f32,
    },
    /// Rotate the most recently loaded model about Y.
    SetYaw {
        /// New yaw in radians.
        yaw: f32,
    },
    /// Repaint the most recently loaded model.
    SetTint {
        /// Color as `0xRRGGBB`.
        rgb: u32,
    },
}

/// One scripted step: an SDK event or a user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraceStep {
    /// Dispatched to the session as-is.
    Event(SessionEvent),
    /// Applied by the host.
    Action(HostAction),
}

impl From<SessionEvent> for TraceStep {
    fn from(event: SessionEvent) -> Self {
        Self::Event(event)
    }
}

/// A complete recorded session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trace {
    /// Experience under test.
    pub config: ExperienceConfig,
    /// SDK answers.
    pub sdk: SdkScript,
    /// Loader behavior by URI. Unlisted URIs load instantly.
    pub assets: HashMap<String, AssetScript>,
    /// Steps in dispatch order.
    pub events: Vec<TraceStep>,
}

impl Trace {
    /// Parse a trace from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Parse`] if the document is not a valid trace
    /// and [`ReplayError::Session`] if its experience config is rejected.
    pub fn from_json(json: &str) -> ReplayResult<Self> {
        let trace: Self = serde_json::from_str(json)?;
        trace.config.validate()?;
        Ok(trace)
    }

    /// Read and parse a trace file.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Io`] if the file cannot be read and
    /// [`ReplayError::Parse`] if it is not a valid trace.
    pub fn load(path: &Path) -> ReplayResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!("Loaded trace {} ({} bytes)", path.display(), json.len());
        Self::from_json(&json)
    }

    /// Loader behavior for `uri`.
    #[must_use]
    pub fn asset(&self, uri: &str) -> AssetScript {
        self.assets.get(uri).cloned().unwrap_or_default()
    }
}
