//! Session Integration Tests
//!
//! Drives a full session through the public API:
//! - Init success and failure paths
//! - Pose → touch → placement → tracking start
//! - Misses, resizes and frame ticks in between

use std::cell::RefCell;
use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;

use ar_bridge_core::{
    ArError, AssetRequest, CameraParameters, CameraTransform, EngineCapabilities, EventKind,
    EventOutcome, ExperienceConfig, InitErrorKind, Mat4, MatrixLayout, NormalizedTouch, Overlay,
    Pose, RenderEngine, SdkConfig, SessionContext, SessionEvent, TouchInput, TrackingSdk, Vec3,
    VideoSource, Viewport,
};

#[derive(Default)]
struct SdkLog {
    init_calls: u32,
    subscribed: Vec<EventKind>,
    starts: u32,
}

struct RecordingSdk {
    init: Result<Viewport, InitErrorKind>,
    params: CameraParameters,
    log: Rc<RefCell<SdkLog>>,
}

impl TrackingSdk for RecordingSdk {
    fn init(&mut self, _config: &SdkConfig) -> Result<Viewport, InitErrorKind> {
        self.log.borrow_mut().init_calls += 1;
        self.init
    }
    fn camera_parameters(&self) -> Option<CameraParameters> {
        Some(self.params)
    }
    fn camera_feed(&self) -> Option<VideoSource> {
        None
    }
    fn subscribe(&mut self, kind: EventKind) {
        self.log.borrow_mut().subscribed.push(kind);
    }
    fn start(&mut self) {
        self.log.borrow_mut().starts += 1;
    }
}

#[derive(Default)]
struct EngineLog {
    resizes: Vec<Viewport>,
    loads: Vec<AssetRequest>,
}

struct RecordingEngine {
    caps: EngineCapabilities,
    log: Rc<RefCell<EngineLog>>,
}

impl RenderEngine for RecordingEngine {
    fn capabilities(&self) -> EngineCapabilities {
        self.caps
    }
    fn resize_surface(&mut self, viewport: Viewport) {
        self.log.borrow_mut().resizes.push(viewport);
    }
    fn load_asset(&mut self, request: AssetRequest) {
        self.log.borrow_mut().loads.push(request);
    }
}

struct Harness {
    sdk_log: Rc<RefCell<SdkLog>>,
    engine_log: Rc<RefCell<EngineLog>>,
    overlay: Overlay,
    result: Result<SessionContext<RecordingSdk, RecordingEngine>, ArError>,
}

fn launch(init: Result<Viewport, InitErrorKind>, caps: EngineCapabilities) -> Harness {
    launch_with(ExperienceConfig::default(), init, caps)
}

fn launch_with(
    config: ExperienceConfig,
    init: Result<Viewport, InitErrorKind>,
    caps: EngineCapabilities,
) -> Harness {
    let sdk_log = Rc::new(RefCell::new(SdkLog::default()));
    let engine_log = Rc::new(RefCell::new(EngineLog::default()));
    let sdk = RecordingSdk {
        init,
        params: CameraParameters::new(60.0, 0.75),
        log: Rc::clone(&sdk_log),
    };
    let engine = RecordingEngine {
        caps,
        log: Rc::clone(&engine_log),
    };
    let mut overlay = Overlay::new();
    let result = SessionContext::initialize(sdk, engine, config, &mut overlay);
    Harness {
        sdk_log,
        engine_log,
        overlay,
        result,
    }
}

/// Camera at the origin pitched straight down at the floor.
fn looking_down() -> Pose {
    Pose::from_matrix(&Mat4::from_rotation_x(-FRAC_PI_2))
}

fn touch(x: f32, y: f32) -> SessionEvent {
    SessionEvent::Touch(NormalizedTouch::new(x, y).into())
}

// ============================================================================
// End-to-end scenario
// ============================================================================

#[test]
fn test_pose_touch_place_and_start_once() {
    let harness = launch(
        Ok(Viewport::new(720, 960)),
        EngineCapabilities::right_handed_matrix(),
    );
    let mut session = harness.result.expect("init succeeds");
    assert!(!session.overlay().loading_visible);
    assert!(session.overlay().error.is_none());

    // Pose reflected verbatim in the camera transform
    let pose = looking_down();
    assert_eq!(
        session.handle(SessionEvent::Pose(pose)).expect("pose"),
        EventOutcome::PoseApplied
    );
    assert_eq!(
        session.camera().transform(),
        &CameraTransform::Matrix(pose.to_matrix())
    );

    // Center touch hits the floor directly below
    let outcome = session.handle(touch(0.0, 0.0)).expect("touch");
    let EventOutcome::Placement {
        point,
        request,
        session_started,
    } = outcome
    else {
        panic!("expected placement, got {outcome:?}");
    };
    assert!(point.position.x.abs() < 1e-5);
    assert!((point.position.y + 1.0).abs() < 1e-5);
    assert!(point.position.z.abs() < 1e-5);
    assert!(session_started);
    assert_eq!(harness.sdk_log.borrow().starts, 1);
    assert_eq!(harness.engine_log.borrow().loads, vec![request]);

    // Level the camera: the next touch misses and does not restart
    session
        .handle(SessionEvent::Pose(Pose::from_matrix(&Mat4::identity())))
        .expect("pose");
    assert_eq!(
        session.handle(touch(0.0, 0.5)).expect("touch"),
        EventOutcome::NoPlacement
    );
    assert_eq!(harness.sdk_log.borrow().starts, 1);
    assert_eq!(harness.engine_log.borrow().loads.len(), 1);
}

#[test]
fn test_touch_before_any_pose_misses() {
    let harness = launch(
        Ok(Viewport::new(720, 960)),
        EngineCapabilities::right_handed_matrix(),
    );
    let mut session = harness.result.expect("init succeeds");
    assert_eq!(
        session.handle(touch(0.0, 0.0)).expect("touch"),
        EventOutcome::NoPlacement
    );
    assert!(!session.is_started());
}

fn placement_at(caps: EngineCapabilities, x: f32, y: f32) -> Vec3 {
    let harness = launch(Ok(Viewport::new(720, 960)), caps);
    let mut session = harness.result.expect("init succeeds");
    session
        .handle(SessionEvent::Pose(looking_down()))
        .expect("pose");
    let outcome = session.handle(touch(x, y)).expect("touch");
    let EventOutcome::Placement { point, .. } = outcome else {
        panic!("expected placement, got {outcome:?}");
    };
    point.position
}

#[test]
fn test_left_handed_engine_mirrors_x_off_center() {
    let right = EngineCapabilities::right_handed_matrix;
    let left = EngineCapabilities::left_handed_decompose;

    // Center touches land on the same spot in both conventions.
    let center = placement_at(left(), 0.0, 0.0);
    assert!((center.y + 1.0).abs() < 1e-5);
    assert!(center.x.abs() < 1e-4);
    assert!(center.z.abs() < 1e-4);

    // The handedness flip negates the camera X axis, so off-center touches
    // land mirrored across X: 0.5 * tan(30°) * 0.75 ≈ 0.2165 to either side.
    let r = placement_at(right(), 0.5, 0.0);
    let l = placement_at(left(), 0.5, 0.0);
    assert!((r.x - 0.2165).abs() < 1e-3);
    assert!((l.x + 0.2165).abs() < 1e-3);
    assert!((r.z - l.z).abs() < 1e-4);
    assert!((l.y + 1.0).abs() < 1e-5);
}

#[test]
fn test_column_major_pose_is_transposed_on_the_way_in() {
    let config = ExperienceConfig {
        matrix_layout: MatrixLayout::ColumnMajor,
        ..ExperienceConfig::default()
    };
    let harness = launch_with(
        config,
        Ok(Viewport::new(720, 960)),
        EngineCapabilities::right_handed_matrix(),
    );
    let mut session = harness.result.expect("init succeeds");

    // Looking straight down from (2, 0.5, 0), written row by row.
    #[rustfmt::skip]
    let rows = [
        1.0,  0.0, 0.0, 2.0,
        0.0,  0.0, 1.0, 0.5,
        0.0, -1.0, 0.0, 0.0,
        0.0,  0.0, 0.0, 1.0,
    ];
    session
        .handle(SessionEvent::Pose(Pose::new(rows)))
        .expect("pose");

    let position = session.camera().position();
    assert!((position.x - 2.0).abs() < 1e-5);
    assert!((position.y - 0.5).abs() < 1e-5);
    assert!(position.z.abs() < 1e-5);

    let outcome = session.handle(touch(0.0, 0.0)).expect("touch");
    let EventOutcome::Placement { point, .. } = outcome else {
        panic!("expected placement, got {outcome:?}");
    };
    assert!((point.position.x - 2.0).abs() < 1e-4);
    assert!((point.position.y + 1.0).abs() < 1e-5);
    assert!(point.position.z.abs() < 1e-4);
}

#[test]
fn test_resize_is_idempotent() {
    let harness = launch(
        Ok(Viewport::new(720, 960)),
        EngineCapabilities::right_handed_matrix(),
    );
    let mut session = harness.result.expect("init succeeds");

    let first = session
        .handle(SessionEvent::Resize(Viewport::new(1080, 1920)))
        .expect("resize");
    let second = session
        .handle(SessionEvent::Resize(Viewport::new(1080, 1920)))
        .expect("resize");
    assert_eq!(first, second);
    assert_eq!(
        harness.engine_log.borrow().resizes,
        vec![
            Viewport::new(720, 960),
            Viewport::new(1080, 1920),
            Viewport::new(1080, 1920)
        ]
    );
}

#[test]
fn test_pixel_touch_uses_current_viewport() {
    let harness = launch(
        Ok(Viewport::new(100, 200)),
        EngineCapabilities::right_handed_matrix(),
    );
    let mut session = harness.result.expect("init succeeds");
    session
        .handle(SessionEvent::Pose(looking_down()))
        .expect("pose");
    let outcome = session
        .handle(SessionEvent::Touch(TouchInput::Pixels { x: 50.0, y: 100.0 }))
        .expect("touch");
    assert!(matches!(outcome, EventOutcome::Placement { .. }));
}

#[test]
fn test_frames_report_camera_updates_once_per_pose() {
    let harness = launch(
        Ok(Viewport::new(720, 960)),
        EngineCapabilities::right_handed_matrix(),
    );
    let mut session = harness.result.expect("init succeeds");

    let camera_updated = |outcome: EventOutcome| match outcome {
        EventOutcome::Rendered { camera_updated, .. } => camera_updated,
        other => panic!("expected render, got {other:?}"),
    };

    session
        .handle(SessionEvent::Pose(looking_down()))
        .expect("pose");
    assert!(camera_updated(
        session
            .handle(SessionEvent::Frame { timestamp_ms: 0 })
            .expect("frame")
    ));
    assert!(!camera_updated(
        session
            .handle(SessionEvent::Frame { timestamp_ms: 16 })
            .expect("frame")
    ));
    session
        .handle(SessionEvent::Pose(looking_down()))
        .expect("pose");
    assert!(camera_updated(
        session
            .handle(SessionEvent::Frame { timestamp_ms: 33 })
            .expect("frame")
    ));
}

// ============================================================================
// Error scenario
// ============================================================================

#[test]
fn test_camera_error_shows_exact_pair_and_subscribes_nothing() {
    let harness = launch(
        Err(InitErrorKind::CameraError),
        EngineCapabilities::right_handed_matrix(),
    );

    assert!(matches!(
        harness.result,
        Err(ArError::Init(InitErrorKind::CameraError))
    ));
    assert!(!harness.overlay.loading_visible);
    let screen = harness.overlay.error.as_ref().expect("error screen");
    assert_eq!(screen.title, "Camera Error");
    assert_eq!(screen.kind, InitErrorKind::CameraError);
    assert_eq!(screen.message, InitErrorKind::CameraError.message());

    let sdk = harness.sdk_log.borrow();
    assert_eq!(sdk.init_calls, 1);
    assert!(sdk.subscribed.is_empty());
    assert_eq!(sdk.starts, 0);
    assert!(harness.engine_log.borrow().resizes.is_empty());
}

#[test]
fn test_every_init_error_maps_to_its_own_screen() {
    for kind in InitErrorKind::ALL {
        let harness = launch(Err(kind), EngineCapabilities::right_handed_matrix());
        let screen = harness.overlay.error.expect("error screen");
        assert_eq!(screen.kind, kind);
        assert_eq!(screen.title, kind.title());
        assert_eq!(screen.message, kind.message());
    }
}
