//! One-shot gate around the SDK's continuous-tracking start.
//!
//! ```text
//!   NotStarted ──[try_start]──► Started   (terminal)
//! ```

use serde::{Deserialize, Serialize};

use crate::config::PlacementMode;
use crate::sdk::{TrackingMode, TrackingSdk};

/// When continuous tracking begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartPolicy {
    /// Right after a successful init.
    AtLoad,
    /// On the first accepted placement, avoiding jitter before the user commits.
    OnFirstPlacement,
}

impl StartPolicy {
    /// Default policy for a tracking/placement combination.
    #[must_use]
    pub fn for_mode(mode: TrackingMode, placement: PlacementMode) -> Self {
        match (mode, placement) {
            (TrackingMode::Surface, PlacementMode::TouchToPlace | PlacementMode::HitTest) => {
                Self::OnFirstPlacement
            }
            _ => Self::AtLoad,
        }
    }
}

/// Monotonic latch guaranteeing a single [`TrackingSdk::start`] call.
#[derive(Debug, Clone)]
pub struct SessionGate {
    policy: StartPolicy,
    started: bool,
}

impl SessionGate {
    /// Create a gate in the not-started state.
    #[must_use]
    pub fn new(policy: StartPolicy) -> Self {
        Self {
            policy,
            started: false,
        }
    }

    /// Start tracking unless already started.
    ///
    /// Returns `true` only for the call that actually started the SDK.
    pub fn try_start<S: TrackingSdk + ?Sized>(&mut self, sdk: &mut S) -> bool {
        if self.started {
            return false;
        }
        sdk.start();
        self.started = true;
        tracing::info!("Continuous tracking started ({:?})", self.policy);
        true
    }

    /// Start now if the policy says tracking begins at load.
    pub fn start_at_load<S: TrackingSdk + ?Sized>(&mut self, sdk: &mut S) -> bool {
        match self.policy {
            StartPolicy::AtLoad => self.try_start(sdk),
            StartPolicy::OnFirstPlacement => false,
        }
    }

    /// Whether tracking has been started.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Configured policy.
    #[must_use]
    pub fn policy(&self) -> StartPolicy {
        self.policy
    }
}
