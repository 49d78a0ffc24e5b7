//! Content placed in the scene and the asset loads that produce it.
//!
//! ## Lifecycle
//!
//! ```text
//!   request_*() ──► pending ──AssetLoaded──► ContentNode
//!                      │
//!                      └──AssetFailed──► retry (backoff) ──► … ──► give up
//! ```
//!
//! Loads never block. Independent placements may be in flight at once.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{AssetRequest, RequestId};
use crate::error::{ArError, ArResult};
use crate::event::HitTestResult;
use crate::math::{Quat, Vec3};
use crate::raycast::PlacementPoint;

/// Unique identifier for placed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentId(Uuid);

impl ContentId {
    /// Create a new unique content ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a node exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentRole {
    /// Placed by a touch on the reference plane.
    Placed,
    /// Follows hit-test results until the user confirms placement.
    Preview,
    /// Fixed relative to a tracked target; shown while it is detected.
    Anchored,
}

/// Initial transform and visibility of a node once its asset arrives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spawn {
    /// World position.
    pub position: Vec3,
    /// World rotation.
    pub rotation: Quat,
    /// Uniform scale.
    pub scale: f32,
    /// Visible on arrival.
    pub visible: bool,
}

impl Spawn {
    /// Visible at a placement point, turned to face the camera.
    #[must_use]
    pub fn at_placement(point: &PlacementPoint, scale: f32) -> Self {
        Self {
            position: point.position,
            rotation: Quat::from_axis_angle(Vec3::up(), point.yaw),
            scale,
            visible: true,
        }
    }

    /// Hidden at a fixed transform.
    #[must_use]
    pub fn hidden(position: Vec3, yaw: f32, scale: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_axis_angle(Vec3::up(), yaw),
            scale,
            visible: false,
        }
    }
}

/// A loaded model in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    /// Node identifier.
    pub id: ContentId,
    /// Source asset.
    pub uri: String,
    /// Why the node exists.
    pub role: ContentRole,
    /// World position.
    pub position: Vec3,
    /// World rotation.
    pub rotation: Quat,
    /// Uniform scale.
    pub scale: f32,
    /// Paint tint as `0xRRGGBB`, applied to materials named for it.
    pub tint: Option<u32>,
    /// Whether the node is rendered.
    pub visible: bool,
    /// Seconds of animation played.
    pub animation_time: f32,
}

/// Exponential backoff for failed asset loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound for any delay in milliseconds.
    pub max_delay_ms: u64,
    /// Growth factor between attempts.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 200,
            max_delay_ms: 5_000,
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay before the attempt following `failed_attempt` (1-based).
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap
    )] // Attempt counts and delays are small
    pub fn delay_after(&self, failed_attempt: u32) -> u64 {
        let exponent = failed_attempt.saturating_sub(1) as i32;
        let delay = self.initial_delay_ms as f64 * self.multiplier.powi(exponent);
        delay.min(self.max_delay_ms as f64) as u64
    }
}

/// What happened to a failed load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadFailure {
    /// Re-issue this request.
    Retry(AssetRequest),
    /// Attempts exhausted.
    GaveUp {
        /// Asset URI.
        uri: String,
        /// Attempts made.
        attempts: u32,
        /// Last failure reason.
        reason: String,
    },
}

#[derive(Debug, Clone)]
struct PendingLoad {
    request: AssetRequest,
    role: ContentRole,
    spawn: Spawn,
}

/// All content nodes plus in-flight loads.
#[derive(Debug, Clone, Default)]
pub struct ContentRegistry {
    nodes: Vec<ContentNode>,
    pending: HashMap<RequestId, PendingLoad>,
    retry: RetryConfig,
}

impl ContentRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new(retry: RetryConfig) -> Self {
        Self {
            nodes: Vec::new(),
            pending: HashMap::new(),
            retry,
        }
    }

    /// Record a new load and return the request to hand to the engine.
    pub fn request(&mut self, uri: &str, role: ContentRole, spawn: Spawn) -> AssetRequest {
        let request = AssetRequest::new(uri);
        tracing::debug!("Requesting {} for {:?} ({})", uri, role, request.id);
        self.pending.insert(
            request.id,
            PendingLoad {
                request: request.clone(),
                role,
                spawn,
            },
        );
        request
    }

    /// Load content at a touch placement, visible on arrival.
    pub fn request_placement(
        &mut self,
        uri: &str,
        point: &PlacementPoint,
        scale: f32,
    ) -> AssetRequest {
        self.request(uri, ContentRole::Placed, Spawn::at_placement(point, scale))
    }

    /// Load the hit-test preview, hidden until the first hit result.
    pub fn request_preview(&mut self, uri: &str, scale: f32) -> AssetRequest {
        self.request(uri, ContentRole::Preview, Spawn::hidden(Vec3::zero(), 0.0, scale))
    }

    /// Load target-anchored content, hidden until the target is detected.
    pub fn request_anchored(
        &mut self,
        uri: &str,
        position: Vec3,
        yaw: f32,
        scale: f32,
    ) -> AssetRequest {
        self.request(uri, ContentRole::Anchored, Spawn::hidden(position, yaw, scale))
    }

    /// Turn a finished load into a node.
    ///
    /// # Errors
    ///
    /// Returns [`ArError::UnknownRequest`] if the request is not pending.
    pub fn complete(&mut self, request_id: RequestId) -> ArResult<ContentId> {
        let load = self
            .pending
            .remove(&request_id)
            .ok_or_else(|| ArError::UnknownRequest(request_id.to_string()))?;

        let node = ContentNode {
            id: ContentId::new(),
            uri: load.request.uri,
            role: load.role,
            position: load.spawn.position,
            rotation: load.spawn.rotation,
            scale: load.spawn.scale,
            tint: None,
            visible: load.spawn.visible,
            animation_time: 0.0,
        };
        let id = node.id;
        tracing::info!("Loaded {} as {:?} content {}", node.uri, node.role, id);
        self.nodes.push(node);
        Ok(id)
    }

    /// Apply the retry policy to a failed load.
    ///
    /// # Errors
    ///
    /// Returns [`ArError::UnknownRequest`] if the request is not pending.
    pub fn fail(&mut self, request_id: RequestId, reason: &str) -> ArResult<LoadFailure> {
        let load = self
            .pending
            .get_mut(&request_id)
            .ok_or_else(|| ArError::UnknownRequest(request_id.to_string()))?;

        let attempt = load.request.attempt;
        if attempt >= self.retry.max_attempts {
            let uri = load.request.uri.clone();
            self.pending.remove(&request_id);
            tracing::warn!("Giving up on {} after {} attempts: {}", uri, attempt, reason);
            return Ok(LoadFailure::GaveUp {
                uri,
                attempts: attempt,
                reason: reason.to_string(),
            });
        }

        let next = load.request.retry(self.retry.delay_after(attempt));
        load.request = next.clone();
        tracing::warn!(
            "Load of {} failed (attempt {}): {}; retrying in {}ms",
            next.uri,
            attempt,
            reason,
            next.delay_ms
        );
        Ok(LoadFailure::Retry(next))
    }

    /// Advance animation clocks of visible nodes.
    pub fn advance_animations(&mut self, delta_secs: f32) {
        for node in self.nodes.iter_mut().filter(|n| n.visible) {
            node.animation_time += delta_secs;
        }
    }

    /// Show or hide every node with `role`. Returns how many changed.
    pub fn set_visible_role(&mut self, role: ContentRole, visible: bool) -> usize {
        let mut changed = 0;
        for node in self.nodes.iter_mut().filter(|n| n.role == role) {
            if node.visible != visible {
                node.visible = visible;
                changed += 1;
            }
        }
        changed
    }

    /// Move the preview node to a hit-test result and show it.
    pub fn apply_hit_test(&mut self, hit: &HitTestResult) -> Option<ContentId> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.role == ContentRole::Preview)?;
        node.position = hit.position;
        node.rotation = hit.rotation;
        node.visible = true;
        Some(node.id)
    }

    /// Freeze the visible preview where it is, turning it into placed content.
    pub fn promote_preview(&mut self) -> Option<ContentId> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.role == ContentRole::Preview && n.visible)?;
        node.role = ContentRole::Placed;
        Some(node.id)
    }

    /// Set a node's uniform scale.
    ///
    /// # Errors
    ///
    /// Returns [`ArError::InvalidOperation`] unless `scale` is finite and
    /// positive, and [`ArError::ContentNotFound`] for an unknown ID.
    pub fn set_scale(&mut self, id: ContentId, scale: f32) -> ArResult<()> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ArError::InvalidOperation(format!(
                "scale must be positive, got {scale}"
            )));
        }
        self.get_mut(id)?.scale = scale;
        Ok(())
    }

    /// Set a node's rotation about Y.
    ///
    /// # Errors
    ///
    /// Returns [`ArError::InvalidOperation`] for a non-finite yaw and
    /// [`ArError::ContentNotFound`] for an unknown ID.
    pub fn set_yaw(&mut self, id: ContentId, yaw: f32) -> ArResult<()> {
        if !yaw.is_finite() {
            return Err(ArError::InvalidOperation(format!("yaw must be finite, got {yaw}")));
        }
        self.get_mut(id)?.rotation = Quat::from_axis_angle(Vec3::up(), yaw);
        Ok(())
    }

    /// Set a node's paint tint.
    ///
    /// # Errors
    ///
    /// Returns [`ArError::ContentNotFound`] for an unknown ID.
    pub fn set_tint(&mut self, id: ContentId, rgb: u32) -> ArResult<()> {
        self.get_mut(id)?.tint = Some(rgb & 0x00FF_FFFF);
        Ok(())
    }

    /// Look up a node.
    #[must_use]
    pub fn get(&self, id: ContentId) -> Option<&ContentNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn get_mut(&mut self, id: ContentId) -> ArResult<&mut ContentNode> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| ArError::ContentNotFound(id.to_string()))
    }

    /// All nodes in load order.
    #[must_use]
    pub fn nodes(&self) -> &[ContentNode] {
        &self.nodes
    }

    /// Nodes with `role`.
    pub fn by_role(&self, role: ContentRole) -> impl Iterator<Item = &ContentNode> {
        self.nodes.iter().filter(move |n| n.role == role)
    }

    /// Number of loads still in flight.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether any load for `role` is in flight.
    #[must_use]
    pub fn has_pending(&self, role: ContentRole) -> bool {
        self.pending.values().any(|p| p.role == role)
    }
}
