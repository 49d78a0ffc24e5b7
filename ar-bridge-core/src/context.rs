//! Session orchestration.
//!
//! [`SessionContext`] owns every piece of per-session state and is the only
//! place events are dispatched:
//!
//! ```text
//!                 ┌──────────────────────── SessionContext ─────────────────────────┐
//!  SessionEvent ─►│ handle() ──► Pose ─────────► PoseAdapter ──────┐                │
//!                 │          ├─► Resize ───────► ProjectionUpdater ─┼─► RenderCamera │
//!                 │          ├─► Touch ────────► PlacementRaycaster ┘                │
//!                 │          │                     └► ContentRegistry ─► SessionGate │
//!                 │          ├─► Frame ────────► animations, dirty flag              │
//!                 │          ├─► Detected/Lost ► anchored content, background        │
//!                 │          ├─► Touch (anchored) ► hotspots                         │
//!                 │          ├─► HitTestResult ► preview                             │
//!                 │          └─► Asset* ───────► ContentRegistry (retry/backoff)     │
//!                 └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything runs on the caller's thread; asset loads are fire-and-forget
//! requests whose completion comes back as another [`SessionEvent`].

use std::collections::BTreeSet;

use serde::Serialize;

use crate::camera::RenderCamera;
use crate::config::{ExperienceConfig, PlacementMode};
use crate::content::{ContentId, ContentRegistry, ContentRole, LoadFailure};
use crate::engine::{AssetRequest, RenderEngine};
use crate::error::{ArError, ArResult};
use crate::event::{EventKind, HitTestResult, SessionEvent, TouchInput};
use crate::overlay::{InitErrorKind, Overlay};
use crate::pose::{MatrixLayout, Pose, PoseAdapter, PoseStrategy};
use crate::projection::{Projection, ProjectionUpdater, Viewport};
use crate::raycast::{pick_hotspot, Hotspot, PlacementPoint, PlacementRaycaster, ReferencePlane};
use crate::sdk::{TrackingMode, TrackingSdk, VideoSource};
use crate::session::SessionGate;

/// What the engine draws behind the scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "source", rename_all = "snake_case")]
pub enum Background {
    /// Transparent; the page shows the camera feed itself.
    Transparent,
    /// The SDK camera feed as a scene texture.
    CameraFeed(VideoSource),
}

/// Result of handling one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EventOutcome {
    /// The event kind is not subscribed in this session.
    Ignored {
        /// Kind that was dropped.
        kind: EventKind,
    },
    /// The camera transform was updated.
    PoseApplied,
    /// The projection and engine surface were updated.
    ProjectionUpdated {
        /// New projection.
        projection: Projection,
    },
    /// A touch hit the floor and a load was issued there.
    Placement {
        /// Where the content goes.
        point: PlacementPoint,
        /// The load handed to the engine.
        request: AssetRequest,
        /// This placement started continuous tracking.
        session_started: bool,
    },
    /// A touch missed the floor.
    NoPlacement,
    /// A touch hit a link button; the host opens the link.
    HotspotActivated {
        /// Link to open.
        url: String,
    },
    /// A touch in anchored mode hit no button.
    NoHotspot,
    /// A render frame ran.
    Rendered {
        /// Frames rendered so far.
        frame: u64,
        /// Milliseconds since the previous frame.
        delta_ms: u64,
        /// The camera changed since the previous frame.
        camera_updated: bool,
    },
    /// A tracked target was found.
    TargetDetected {
        /// Target identifier.
        target: String,
        /// Anchored nodes made visible.
        shown: usize,
    },
    /// A tracked target was lost.
    TargetLost {
        /// Target identifier.
        target: String,
        /// Anchored nodes hidden.
        hidden: usize,
    },
    /// The preview followed a hit-test result.
    PreviewMoved {
        /// The preview node, if it has loaded and is not yet placed.
        content: Option<ContentId>,
    },
    /// An asset load finished.
    ContentLoaded {
        /// The new node.
        content: ContentId,
        /// Its role.
        role: ContentRole,
    },
    /// An asset load failed and was re-issued.
    AssetRetry {
        /// The re-issued request.
        request: AssetRequest,
    },
    /// An asset load failed for the last time.
    AssetAbandoned {
        /// Asset URI.
        uri: String,
        /// Attempts made.
        attempts: u32,
    },
}

/// Event kinds an experience needs from the SDK.
///
/// Anchored experiences also take touches when they have link buttons or
/// track a spatial scene.
#[must_use]
pub fn subscriptions_for(config: &ExperienceConfig) -> BTreeSet<EventKind> {
    let touchable =
        config.sdk.mode == TrackingMode::Spatial || !config.anchor.hotspots.is_empty();
    let specific: &[EventKind] = match config.placement {
        PlacementMode::TouchToPlace => &[EventKind::Touch],
        PlacementMode::HitTest => &[EventKind::HitTestResult],
        PlacementMode::Anchored if touchable => {
            &[EventKind::Detected, EventKind::Lost, EventKind::Touch]
        }
        PlacementMode::Anchored => &[EventKind::Detected, EventKind::Lost],
    };
    [EventKind::Pose, EventKind::Resize, EventKind::Frame]
        .into_iter()
        .chain(specific.iter().copied())
        .collect()
}

/// Per-session state plus the tracking SDK and render engine it drives.
pub struct SessionContext<S: TrackingSdk, E: RenderEngine> {
    sdk: S,
    engine: E,
    config: ExperienceConfig,
    camera: RenderCamera,
    adapter: PoseAdapter,
    updater: ProjectionUpdater,
    raycaster: PlacementRaycaster,
    hotspots: Vec<Hotspot>,
    target_visible: bool,
    gate: SessionGate,
    content: ContentRegistry,
    overlay: Overlay,
    subscriptions: BTreeSet<EventKind>,
    viewport: Viewport,
    background: Background,
    last_hit: Option<HitTestResult>,
    last_frame_ms: Option<u64>,
    frames: u64,
}

impl<S: TrackingSdk, E: RenderEngine> SessionContext<S, E> {
    /// Initialize the SDK and set up the session.
    ///
    /// On an SDK init failure the error screen for that kind is shown in
    /// `overlay`, nothing is subscribed and the error is returned. On success
    /// the loading screen is hidden and the session keeps its own copy of the
    /// overlay; read it back through [`SessionContext::overlay`].
    ///
    /// # Errors
    ///
    /// - [`ArError::Config`] if `config` is inconsistent
    /// - [`ArError::Init`] if the SDK rejects initialization
    /// - [`ArError::MissingCameraParameters`] if no projection can be built
    pub fn initialize(
        mut sdk: S,
        mut engine: E,
        config: ExperienceConfig,
        overlay: &mut Overlay,
    ) -> ArResult<Self> {
        config.validate()?;

        let viewport = match sdk.init(&config.sdk) {
            Ok(viewport) => viewport,
            Err(kind) => {
                tracing::error!("Tracking SDK init failed: {}", kind);
                overlay.show_error(kind);
                return Err(ArError::Init(kind));
            }
        };

        let caps = engine.capabilities();
        let params = match sdk.camera_parameters().map(|p| p.validate().map(|()| p)) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                tracing::error!("Tracking SDK reported unusable camera parameters: {}", e);
                overlay.show_error(InitErrorKind::InternalError);
                return Err(e);
            }
            None => {
                tracing::error!("Tracking SDK has no camera parameters after init");
                overlay.show_error(InitErrorKind::InternalError);
                return Err(ArError::MissingCameraParameters(
                    "no parameters after init".to_string(),
                ));
            }
        };
        let mut camera = RenderCamera::new(
            Projection::new(params, caps.near, caps.far),
            caps.handedness,
        );
        let mut updater = ProjectionUpdater::new(caps.near, caps.far);
        updater.on_resize(viewport, &sdk, &mut engine, &mut camera)?;

        overlay.hide_loading();

        let subscriptions = subscriptions_for(&config);
        for kind in &subscriptions {
            sdk.subscribe(*kind);
        }

        let floor = &config.floor;
        let raycaster = PlacementRaycaster::new(ReferencePlane::horizontal(
            floor.height,
            floor.size,
            floor.rotation_x,
            floor.double_sided,
        ));

        let hotspots = config
            .anchor
            .hotspots
            .iter()
            .map(|h| {
                Hotspot::new(
                    h.url.clone(),
                    ReferencePlane::upright(h.position, h.width, h.height, h.yaw),
                )
            })
            .collect();

        let mut content = ContentRegistry::new(config.retry.clone());
        match config.placement {
            PlacementMode::TouchToPlace => {}
            PlacementMode::HitTest => {
                engine.load_asset(content.request_preview(&config.model_uri, config.model_scale));
                overlay.initializing_hint = true;
            }
            PlacementMode::Anchored => {
                engine.load_asset(content.request_anchored(
                    &config.model_uri,
                    config.anchor.position,
                    config.anchor.yaw,
                    config.model_scale,
                ));
            }
        }

        let mut gate = SessionGate::new(config.start_policy());
        gate.start_at_load(&mut sdk);

        let adapter = PoseAdapter::for_engine(&caps);
        tracing::info!(
            "Session initialized: mode={:?} placement={:?} strategy={:?} surface={}x{}",
            config.sdk.mode,
            config.placement,
            adapter.strategy(),
            viewport.width,
            viewport.height
        );

        Ok(Self {
            sdk,
            engine,
            camera,
            adapter,
            updater,
            raycaster,
            hotspots,
            target_visible: false,
            gate,
            content,
            overlay: overlay.clone(),
            subscriptions,
            viewport,
            background: Background::Transparent,
            last_hit: None,
            last_frame_ms: None,
            frames: 0,
            config,
        })
    }

    /// Dispatch one event.
    ///
    /// # Errors
    ///
    /// - [`ArError::MissingCameraParameters`] if a resize finds no usable
    ///   camera parameters
    /// - [`ArError::UnknownRequest`] for completions of requests this
    ///   session never issued
    pub fn handle(&mut self, event: SessionEvent) -> ArResult<EventOutcome> {
        if let Some(kind) = event.kind() {
            if !self.subscriptions.contains(&kind) {
                tracing::debug!("Ignoring unsubscribed {:?} event", kind);
                return Ok(EventOutcome::Ignored { kind });
            }
        }

        match event {
            SessionEvent::Pose(pose) => Ok(self.on_pose(&pose)),
            SessionEvent::Resize(viewport) => self.on_resize(viewport),
            SessionEvent::Touch(touch) if self.config.placement == PlacementMode::Anchored => {
                Ok(self.on_hotspot_touch(touch))
            }
            SessionEvent::Touch(touch) => Ok(self.on_touch(touch)),
            SessionEvent::Frame { timestamp_ms } => Ok(self.on_frame(timestamp_ms)),
            SessionEvent::Detected { target } => Ok(self.on_detected(target)),
            SessionEvent::Lost { target } => Ok(self.on_lost(target)),
            SessionEvent::HitTestResult(hit) => Ok(self.on_hit_test(hit)),
            SessionEvent::AssetLoaded { request_id } => {
                let id = self.content.complete(request_id)?;
                let role = self
                    .content
                    .get(id)
                    .map_or(ContentRole::Placed, |node| node.role);
                if role == ContentRole::Preview {
                    if let Some(hit) = self.last_hit {
                        self.content.apply_hit_test(&hit);
                    }
                }
                Ok(EventOutcome::ContentLoaded { content: id, role })
            }
            SessionEvent::AssetFailed { request_id, reason } => {
                match self.content.fail(request_id, &reason)? {
                    LoadFailure::Retry(request) => {
                        self.engine.load_asset(request.clone());
                        Ok(EventOutcome::AssetRetry { request })
                    }
                    LoadFailure::GaveUp { uri, attempts, .. } => {
                        self.overlay.notice = Some(format!("Could not load {uri}"));
                        Ok(EventOutcome::AssetAbandoned { uri, attempts })
                    }
                }
            }
        }
    }

    fn on_pose(&mut self, pose: &Pose) -> EventOutcome {
        match self.config.matrix_layout {
            MatrixLayout::RowMajor => self.adapter.apply(pose, &mut self.camera),
            MatrixLayout::ColumnMajor => {
                let pose = Pose::with_layout(*pose.elements(), MatrixLayout::ColumnMajor);
                self.adapter.apply(&pose, &mut self.camera);
            }
        }
        EventOutcome::PoseApplied
    }

    fn on_resize(&mut self, viewport: Viewport) -> ArResult<EventOutcome> {
        let projection =
            self.updater
                .on_resize(viewport, &self.sdk, &mut self.engine, &mut self.camera)?;
        self.viewport = viewport;
        Ok(EventOutcome::ProjectionUpdated { projection })
    }

    fn on_touch(&mut self, touch: TouchInput) -> EventOutcome {
        let Some(touch) = touch.normalize(self.viewport) else {
            tracing::debug!("Touch outside a zero-sized viewport");
            return EventOutcome::NoPlacement;
        };
        let Some(point) = self.raycaster.on_touch(&self.camera, touch) else {
            tracing::debug!("Touch ({:.3}, {:.3}) missed the floor", touch.x, touch.y);
            return EventOutcome::NoPlacement;
        };

        let request =
            self.content
                .request_placement(&self.config.model_uri, &point, self.config.model_scale);
        self.engine.load_asset(request.clone());
        let session_started = self.gate.try_start(&mut self.sdk);

        EventOutcome::Placement {
            point,
            request,
            session_started,
        }
    }

    fn on_hotspot_touch(&mut self, touch: TouchInput) -> EventOutcome {
        if !self.target_visible {
            return EventOutcome::NoHotspot;
        }
        let hit = touch
            .normalize(self.viewport)
            .and_then(|touch| pick_hotspot(&self.hotspots, &self.camera, touch));
        match hit {
            Some(hotspot) => {
                tracing::info!("Hotspot touched: {}", hotspot.url());
                EventOutcome::HotspotActivated {
                    url: hotspot.url().to_string(),
                }
            }
            None => EventOutcome::NoHotspot,
        }
    }

    #[allow(clippy::cast_precision_loss)] // Frame deltas are small
    fn on_frame(&mut self, timestamp_ms: u64) -> EventOutcome {
        let delta_ms = self
            .last_frame_ms
            .map_or(0, |last| timestamp_ms.saturating_sub(last));
        self.last_frame_ms = Some(timestamp_ms);
        self.content.advance_animations(delta_ms as f32 / 1000.0);
        self.frames += 1;

        EventOutcome::Rendered {
            frame: self.frames,
            delta_ms,
            camera_updated: self.camera.take_dirty(),
        }
    }

    fn on_detected(&mut self, target: String) -> EventOutcome {
        let shown = self.content.set_visible_role(ContentRole::Anchored, true);
        self.target_visible = true;
        if self.config.camera_feed_background {
            self.background = self
                .sdk
                .camera_feed()
                .map_or(Background::Transparent, Background::CameraFeed);
        }
        if self.config.sdk.mode == TrackingMode::QrCode {
            self.overlay.decoded_text = Some(target.clone());
        }
        tracing::info!("Target detected: {}", target);
        EventOutcome::TargetDetected { target, shown }
    }

    fn on_lost(&mut self, target: String) -> EventOutcome {
        let hidden = self.content.set_visible_role(ContentRole::Anchored, false);
        self.target_visible = false;
        self.background = Background::Transparent;
        tracing::info!("Target lost: {}", target);
        EventOutcome::TargetLost { target, hidden }
    }

    fn on_hit_test(&mut self, hit: HitTestResult) -> EventOutcome {
        self.overlay.initializing_hint = false;
        self.last_hit = Some(hit);
        EventOutcome::PreviewMoved {
            content: self.content.apply_hit_test(&hit),
        }
    }

    /// Place the hit-test preview where it currently is.
    ///
    /// Returns whether this call started continuous tracking.
    ///
    /// # Errors
    ///
    /// Returns [`ArError::InvalidOperation`] outside hit-test placement or
    /// when no preview is visible yet.
    pub fn confirm_placement(&mut self) -> ArResult<bool> {
        if self.config.placement != PlacementMode::HitTest {
            return Err(ArError::InvalidOperation(format!(
                "confirm_placement requires hit-test placement, session uses {:?}",
                self.config.placement
            )));
        }
        let id = self.content.promote_preview().ok_or_else(|| {
            ArError::InvalidOperation("no preview has been positioned yet".to_string())
        })?;
        tracing::info!("Preview {} placed", id);
        Ok(self.gate.try_start(&mut self.sdk))
    }

    /// The tracking SDK.
    #[must_use]
    pub fn sdk(&self) -> &S {
        &self.sdk
    }

    /// The render engine.
    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The render camera.
    #[must_use]
    pub fn camera(&self) -> &RenderCamera {
        &self.camera
    }

    /// Overlay state.
    #[must_use]
    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// Placed, preview and anchored content.
    #[must_use]
    pub fn content(&self) -> &ContentRegistry {
        &self.content
    }

    /// Mutable content access for scale, rotation and tint controls.
    pub fn content_mut(&mut self) -> &mut ContentRegistry {
        &mut self.content
    }

    /// Current scene background.
    #[must_use]
    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Kinds subscribed at init.
    #[must_use]
    pub fn subscriptions(&self) -> &BTreeSet<EventKind> {
        &self.subscriptions
    }

    /// Whether continuous tracking has started.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.gate.is_started()
    }

    /// Active pose strategy.
    #[must_use]
    pub fn pose_strategy(&self) -> PoseStrategy {
        self.adapter.strategy()
    }

    /// Current surface size.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &ExperienceConfig {
        &self.config
    }
}
