//! Experience configuration.
//!
//! One JSON document describes an AR experience: which tracking mode the SDK
//! runs in, which engine conventions apply, how content is placed and which
//! model is loaded. Every field has a default so partial documents work.

use std::f32::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::content::RetryConfig;
use crate::engine::EngineCapabilities;
use crate::error::{ArError, ArResult};
use crate::math::Vec3;
use crate::pose::MatrixLayout;
use crate::sdk::{SdkConfig, TrackingMode};
use crate::session::StartPolicy;

/// How content gets into the scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementMode {
    /// Each touch on the floor places a new copy of the model.
    #[default]
    TouchToPlace,
    /// A preview follows SDK hit-test results until placement is confirmed.
    HitTest,
    /// Content is fixed to a tracked target and shown while it is detected.
    Anchored,
}

/// Engine convention preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineProfile {
    /// Right-handed engine taking raw matrices (three.js, A-Frame).
    #[default]
    RightHandedMatrix,
    /// Left-handed engine placed by position and rotation (Babylon.js).
    LeftHandedDecompose,
}

impl EngineProfile {
    /// Capabilities advertised by engines of this profile.
    #[must_use]
    pub fn capabilities(self) -> EngineCapabilities {
        match self {
            Self::RightHandedMatrix => EngineCapabilities::right_handed_matrix(),
            Self::LeftHandedDecompose => EngineCapabilities::left_handed_decompose(),
        }
    }
}

/// The invisible floor used for touch placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorConfig {
    /// Height of the floor relative to the initial camera.
    pub height: f32,
    /// Side length of the square floor.
    pub size: f32,
    /// Rotation about X applied to the +Z-facing plane, in radians.
    pub rotation_x: f32,
    /// Accept hits from both faces.
    pub double_sided: bool,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            height: -1.0,
            size: 100.0,
            rotation_x: FRAC_PI_2,
            double_sided: true,
        }
    }
}

/// A touchable button next to anchored content that opens a link.
///
/// The quad is built facing +Z and rotated about Y by `yaw`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotConfig {
    /// Link opened when the button is touched.
    pub url: String,
    /// Center relative to the target origin.
    pub position: Vec3,
    /// Width of the quad.
    pub width: f32,
    /// Height of the quad.
    pub height: f32,
    /// Rotation about Y in radians.
    #[serde(default)]
    pub yaw: f32,
}

impl HotspotConfig {
    fn validate(&self) -> ArResult<()> {
        if self.url.is_empty() {
            return Err(ArError::Config("hotspot url must not be empty".to_string()));
        }
        let sized = |v: f32| v.is_finite() && v > 0.0;
        if !(sized(self.width) && sized(self.height))
            || !self.position.is_finite()
            || !self.yaw.is_finite()
        {
            return Err(ArError::Config(format!(
                "hotspot {} must have a finite position and positive size",
                self.url
            )));
        }
        Ok(())
    }
}

/// Transform of target-anchored content relative to the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// Offset from the target origin.
    pub position: Vec3,
    /// Rotation about Y in radians.
    pub yaw: f32,
    /// Link buttons shown with the content.
    pub hotspots: Vec<HotspotConfig>,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            position: Vec3::zero(),
            yaw: 0.0,
            hotspots: Vec::new(),
        }
    }
}

/// Everything needed to run one AR experience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceConfig {
    /// Passed to the tracking SDK on init.
    pub sdk: SdkConfig,
    /// Placement behavior.
    pub placement: PlacementMode,
    /// Engine conventions.
    pub engine: EngineProfile,
    /// Model loaded for placement, preview or anchoring.
    pub model_uri: String,
    /// Uniform scale applied to loaded models.
    pub model_scale: f32,
    /// Reference floor.
    pub floor: FloorConfig,
    /// Anchored content transform.
    pub anchor: AnchorConfig,
    /// Overrides the default start policy for the mode.
    pub start_policy: Option<StartPolicy>,
    /// Asset-load retry policy.
    pub retry: RetryConfig,
    /// Element order of incoming poses.
    pub matrix_layout: MatrixLayout,
    /// Show the camera feed as the scene background while a target is detected.
    pub camera_feed_background: bool,
}

impl Default for ExperienceConfig {
    fn default() -> Self {
        Self {
            sdk: SdkConfig::default(),
            placement: PlacementMode::default(),
            engine: EngineProfile::default(),
            model_uri: "models/model.glb".to_string(),
            model_scale: 1.0,
            floor: FloorConfig::default(),
            anchor: AnchorConfig::default(),
            start_policy: None,
            retry: RetryConfig::default(),
            matrix_layout: MatrixLayout::default(),
            camera_feed_background: false,
        }
    }
}

impl ExperienceConfig {
    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ArError::Serialization`] for malformed JSON and
    /// [`ArError::Config`] for inconsistent settings.
    pub fn from_json(json: &str) -> ArResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ArError::Config`] describing the first problem found.
    pub fn validate(&self) -> ArResult<()> {
        if self.model_uri.is_empty() {
            return Err(ArError::Config("model_uri must not be empty".to_string()));
        }
        if !(self.model_scale.is_finite() && self.model_scale > 0.0) {
            return Err(ArError::Config(format!(
                "model_scale must be positive, got {}",
                self.model_scale
            )));
        }
        let floor = &self.floor;
        if !(floor.size.is_finite() && floor.size > 0.0)
            || !floor.height.is_finite()
            || !floor.rotation_x.is_finite()
        {
            return Err(ArError::Config(
                "floor must have a finite height and rotation and a positive size".to_string(),
            ));
        }
        if matches!(self.placement, PlacementMode::TouchToPlace | PlacementMode::HitTest)
            && self.sdk.mode != TrackingMode::Surface
        {
            return Err(ArError::Config(format!(
                "{:?} placement requires surface tracking, got {:?}",
                self.placement, self.sdk.mode
            )));
        }
        if self.sdk.mode == TrackingMode::Spatial && self.sdk.scene_oid.is_none() {
            return Err(ArError::Config("spatial tracking requires scene_oid".to_string()));
        }
        if !self.anchor.hotspots.is_empty() && self.placement != PlacementMode::Anchored {
            return Err(ArError::Config(
                "hotspots require anchored placement".to_string(),
            ));
        }
        for hotspot in &self.anchor.hotspots {
            hotspot.validate()?;
        }
        if self.retry.max_attempts == 0 {
            return Err(ArError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective start policy: the override, or the default for the mode.
    #[must_use]
    pub fn start_policy(&self) -> StartPolicy {
        self.start_policy
            .unwrap_or_else(|| StartPolicy::for_mode(self.sdk.mode, self.placement))
    }
}
