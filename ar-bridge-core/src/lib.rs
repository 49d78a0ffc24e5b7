//! # AR Bridge Core
//!
//! Adaptation layer between an AR tracking SDK and a 3D rendering engine.
//! Compiles to WASM for use in the browser next to the SDK and engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  ar-bridge-core                     │
//! ├─────────────────────────────────────────────────────┤
//! │  Pose Adapter        │  Projection Updater          │
//! │  - Matrix direct     │  - FOV / aspect from SDK     │
//! │  - Flip + decompose  │  - Engine surface resize     │
//! ├─────────────────────────────────────────────────────┤
//! │  Placement Raycaster │  Session Gate                │
//! │  - Reference floor   │  - One-shot tracking start   │
//! │  - Facing yaw        │  - At load / first placement │
//! ├─────────────────────────────────────────────────────┤
//! │  SessionContext: single event dispatch, content,    │
//! │  overlay, asset retry                               │
//! └─────────────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod camera;
pub mod config;
pub mod content;
pub mod context;
pub mod engine;
pub mod error;
pub mod event;
pub mod math;
pub mod overlay;
pub mod pose;
pub mod projection;
pub mod raycast;
pub mod sdk;
pub mod session;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use camera::{CameraTransform, Handedness, RenderCamera};
pub use config::{
    AnchorConfig, EngineProfile, ExperienceConfig, FloorConfig, HotspotConfig, PlacementMode,
};
pub use content::{ContentId, ContentNode, ContentRegistry, ContentRole, LoadFailure, RetryConfig};
pub use context::{subscriptions_for, Background, EventOutcome, SessionContext};
pub use engine::{AssetRequest, EngineCapabilities, RenderEngine, RequestId};
pub use error::{ArError, ArResult};
pub use event::{EventKind, HitTestResult, SessionEvent, TouchInput};
pub use math::{Mat4, Quat, Ray, Vec3};
pub use overlay::{ErrorScreen, InitErrorKind, Overlay};
pub use pose::{MatrixLayout, Pose, PoseAdapter, PoseStrategy};
pub use projection::{CameraParameters, NormalizedTouch, Projection, ProjectionUpdater, Viewport};
pub use raycast::{
    facing_yaw, pick_hotspot, Hotspot, PlacementPoint, PlacementRaycaster, PlaneId, ReferencePlane,
};
pub use sdk::{SdkConfig, TrackingMode, TrackingSdk, VideoSource};
pub use session::{SessionGate, StartPolicy};

/// AR bridge core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
