//! Integration tests for trace replay.
//!
//! Each test writes a trace to disk, replays it through a real session on
//! tokio and inspects the report the way the CLI would produce it.

use std::path::{Path, PathBuf};

use ar_bridge_core::{ContentRole, EventKind, EventOutcome, InitErrorKind, PoseStrategy, Vec3};
use ar_bridge_replay::{run_replay, ReplayOptions, ReplayReport, Trace};

/// Look-down pose: the center of the screen sees the floor right below.
const LOOK_DOWN: &str = "[1, 0, 0, 0, 0, 0, -1, 0, 0, 1, 0, 0, 0, 0, 0, 1]";

fn write_trace(dir: &Path, json: &str) -> PathBuf {
    let path = dir.join("trace.json");
    std::fs::write(&path, json).expect("write trace");
    path
}

async fn replay_file(json: &str) -> ReplayReport {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_trace(dir.path(), json);
    let trace = Trace::load(&path).expect("load trace");
    run_replay(trace, &ReplayOptions::default())
        .await
        .expect("replay")
}

fn approx(a: Vec3, b: Vec3) -> bool {
    (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3 && (a.z - b.z).abs() < 1e-3
}

// ===========================================================================
// Touch placement
// ===========================================================================

#[tokio::test]
async fn test_touch_placement_starts_tracking_once() {
    let json = format!(
        r#"{{
            "config": {{"model_uri": "models/bear.glb"}},
            "assets": {{"models/bear.glb": {{"latency_ms": 5}}}},
            "events": [
                {{"type": "touch", "data": {{"space": "normalized", "x": 0.0, "y": 0.0}}}},
                {{"type": "pose", "data": {LOOK_DOWN}}},
                {{"type": "touch", "data": {{"space": "normalized", "x": 0.0, "y": 0.0}}}},
                {{"type": "touch", "data": {{"space": "pixels", "x": 360, "y": 640}}}}
            ]
        }}"#
    );
    let report = replay_file(&json).await;

    assert!(report.init_error.is_none());
    assert_eq!(report.strategy, Some(PoseStrategy::MatrixDirect));
    assert!(!report.overlay.loading_visible);

    // First touch happens before any pose and looks at the horizon.
    assert_eq!(report.outcomes[0], EventOutcome::NoPlacement);
    assert_eq!(report.placements.len(), 2);
    for point in &report.placements {
        assert!(approx(point.position, Vec3::new(0.0, -1.0, 0.0)));
    }

    assert_eq!(report.start_calls, 1);
    assert_eq!(report.content.len(), 2);
    assert!(report
        .content
        .iter()
        .all(|node| node.role == ContentRole::Placed && node.visible));
}

#[tokio::test]
async fn test_report_round_trips_through_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let trace_path = write_trace(
        dir.path(),
        &format!(
            r#"{{"events": [
                {{"type": "pose", "data": {LOOK_DOWN}}},
                {{"type": "touch", "data": {{"space": "normalized", "x": 0.0, "y": 0.0}}}}
            ]}}"#
        ),
    );
    let report_path = dir.path().join("report.json");

    let trace = Trace::load(&trace_path).expect("load");
    let report = run_replay(trace, &ReplayOptions::default())
        .await
        .expect("replay");
    report.write_to(&report_path).expect("write report");

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).expect("read report"))
            .expect("parse report");
    assert_eq!(json["strategy"], "matrix_direct");
    assert_eq!(json["start_calls"], 1);
    assert_eq!(json["outcomes"][1]["outcome"], "placement");
    assert_eq!(json["outcomes"][1]["session_started"], true);
    assert_eq!(json["content"].as_array().map(Vec::len), Some(1));
}

// ===========================================================================
// Asset retries
// ===========================================================================

#[tokio::test]
async fn test_flaky_asset_loads_after_retries() {
    let json = format!(
        r#"{{
            "config": {{
                "model_uri": "models/flaky.glb",
                "retry": {{"max_attempts": 3, "initial_delay_ms": 5, "max_delay_ms": 20, "multiplier": 2.0}}
            }},
            "assets": {{"models/flaky.glb": {{"failures": 2}}}},
            "events": [
                {{"type": "pose", "data": {LOOK_DOWN}}},
                {{"type": "touch", "data": {{"space": "normalized", "x": 0.0, "y": 0.0}}}}
            ]
        }}"#
    );
    let report = replay_file(&json).await;

    assert_eq!(report.loads_issued, 3);
    let retries = report
        .outcomes
        .iter()
        .filter(|o| matches!(o, EventOutcome::AssetRetry { .. }))
        .count();
    assert_eq!(retries, 2);
    assert_eq!(report.content.len(), 1);
    assert!(report.overlay.notice.is_none());
}

#[tokio::test]
async fn test_broken_asset_is_abandoned_with_notice() {
    let json = format!(
        r#"{{
            "config": {{
                "model_uri": "models/broken.glb",
                "retry": {{"max_attempts": 2, "initial_delay_ms": 5, "max_delay_ms": 20, "multiplier": 2.0}}
            }},
            "assets": {{"models/broken.glb": {{"failures": 10}}}},
            "events": [
                {{"type": "pose", "data": {LOOK_DOWN}}},
                {{"type": "touch", "data": {{"space": "normalized", "x": 0.0, "y": 0.0}}}}
            ]
        }}"#
    );
    let report = replay_file(&json).await;

    assert_eq!(report.loads_issued, 2);
    assert!(report.content.is_empty());
    assert!(report.outcomes.contains(&EventOutcome::AssetAbandoned {
        uri: "models/broken.glb".to_string(),
        attempts: 2,
    }));
    assert_eq!(
        report.overlay.notice.as_deref(),
        Some("Could not load models/broken.glb")
    );
    // Tracking still started: the placement itself was accepted.
    assert_eq!(report.start_calls, 1);
}

// ===========================================================================
// Hit-test placement and host actions
// ===========================================================================

#[tokio::test]
async fn test_hit_test_preview_is_confirmed_and_edited() {
    let json = r#"{
        "config": {"placement": "hit_test", "model_uri": "models/car.glb", "model_scale": 0.5},
        "assets": {"models/car.glb": {"latency_ms": 5}},
        "events": [
            {"action": "confirm_placement"},
            {"type": "hit_test_result", "data": {
                "position": {"x": 0.5, "y": -1.0, "z": -2.0},
                "rotation": {"x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0}}},
            {"action": "wait", "ms": 100},
            {"action": "confirm_placement"},
            {"action": "set_tint", "rgb": 4278190335},
            {"action": "set_scale", "scale": 0.75}
        ]
    }"#;
    let report = replay_file(json).await;

    // Confirming before the preview exists is refused.
    assert_eq!(report.rejected_actions, 1);
    assert_eq!(report.start_calls, 1);
    assert!(!report.overlay.initializing_hint);

    assert_eq!(report.content.len(), 1);
    let node = &report.content[0];
    assert_eq!(node.role, ContentRole::Placed);
    assert!(node.visible);
    assert!(approx(node.position, Vec3::new(0.5, -1.0, -2.0)));
    assert_eq!(node.tint, Some(0x00_00FF));
    assert!((node.scale - 0.75).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_edit_without_content_is_rejected() {
    let report = replay_file(r#"{"events": [{"action": "set_yaw", "yaw": 1.0}]}"#).await;
    assert_eq!(report.rejected_actions, 1);
    assert!(report.content.is_empty());
}

// ===========================================================================
// Init failure
// ===========================================================================

#[tokio::test]
async fn test_init_error_reports_error_screen_only() {
    let report = replay_file(
        r#"{
            "sdk": {"init_error": "LICENSE_ERROR"},
            "events": [{"type": "frame", "data": {"timestamp_ms": 0}}]
        }"#,
    )
    .await;

    assert_eq!(report.init_error, Some(InitErrorKind::LicenseError));
    assert!(report.subscriptions.is_empty());
    assert!(report.outcomes.is_empty());
    assert_eq!(report.start_calls, 0);
    assert!(!report.overlay.loading_visible);
    assert!(report.overlay.error.is_some());
}

// ===========================================================================
// Shipped traces
// ===========================================================================

#[tokio::test]
async fn test_shipped_traces_replay() {
    let traces = Path::new(env!("CARGO_MANIFEST_DIR")).join("traces");
    let mut replayed = 0;
    for entry in std::fs::read_dir(&traces).expect("traces dir") {
        let path = entry.expect("entry").path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let trace = Trace::load(&path).expect("load shipped trace");
        let report = run_replay(trace, &ReplayOptions::default())
            .await
            .expect("replay shipped trace");
        assert!(report.to_json().is_ok(), "{}", path.display());
        replayed += 1;
    }
    assert!(replayed >= 4);
}

#[tokio::test]
async fn test_image_trace_swaps_background() {
    let traces = Path::new(env!("CARGO_MANIFEST_DIR")).join("traces");
    let trace = Trace::load(&traces.join("image_anchored.json")).expect("load");
    let report = run_replay(trace, &ReplayOptions::default())
        .await
        .expect("replay");

    let detected = report
        .outcomes
        .iter()
        .find(|o| matches!(o, EventOutcome::TargetDetected { .. }));
    assert_eq!(
        detected,
        Some(&EventOutcome::TargetDetected {
            target: "poster-1".to_string(),
            shown: 1,
        })
    );
    // The trace ends with the target lost.
    assert_eq!(report.content.len(), 1);
    assert!(!report.content[0].visible);
    assert_eq!(report.content[0].role, ContentRole::Anchored);
    assert_eq!(report.start_calls, 1);
    assert!(!report.subscriptions.is_empty());
}

#[tokio::test]
async fn test_spatial_trace_opens_hotspot_links() {
    let traces = Path::new(env!("CARGO_MANIFEST_DIR")).join("traces");
    let trace = Trace::load(&traces.join("spatial_hotspots.json")).expect("load");
    let report = run_replay(trace, &ReplayOptions::default())
        .await
        .expect("replay");

    assert!(report.subscriptions.contains(&EventKind::Touch));
    let links: Vec<&str> = report
        .outcomes
        .iter()
        .filter_map(|o| match o {
            EventOutcome::HotspotActivated { url } => Some(url.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(links, vec!["https://example.com/manual.pdf", "https://example.com/"]);

    // One touch before the scene was detected, one beside both buttons.
    let misses = report
        .outcomes
        .iter()
        .filter(|o| **o == EventOutcome::NoHotspot)
        .count();
    assert_eq!(misses, 2);
    // Touches never place content in anchored mode.
    assert!(report.placements.is_empty());
    assert_eq!(report.content.len(), 1);
}
