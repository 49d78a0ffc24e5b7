//! What a replay produced.

use std::path::Path;

use ar_bridge_core::{
    Background, ContentNode, EventKind, EventOutcome, InitErrorKind, Overlay, PlacementPoint,
    PoseStrategy,
};
use serde::Serialize;

use crate::error::{ReplayError, ReplayResult};

/// Summary of one replayed session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    /// Init rejection, if the session never started.
    pub init_error: Option<InitErrorKind>,
    /// Pose strategy chosen for the engine.
    pub strategy: Option<PoseStrategy>,
    /// Kinds subscribed at init.
    pub subscriptions: Vec<EventKind>,
    /// Outcome of every dispatched event, in order.
    pub outcomes: Vec<EventOutcome>,
    /// Accepted touch placements.
    pub placements: Vec<PlacementPoint>,
    /// Host actions the session refused.
    pub rejected_actions: usize,
    /// Content in the scene when the replay ended.
    pub content: Vec<ContentNode>,
    /// Calls to the SDK's continuous-tracking start.
    pub start_calls: u32,
    /// Load attempts issued to the engine, retries included.
    pub loads_issued: usize,
    /// Overlay state when the replay ended.
    pub overlay: Overlay,
    /// Scene background when the replay ended.
    pub background: Option<Background>,
}

impl ReplayReport {
    /// Report for a session whose SDK init was rejected.
    #[must_use]
    pub fn rejected(kind: InitErrorKind, overlay: Overlay) -> Self {
        Self {
            init_error: Some(kind),
            strategy: None,
            subscriptions: Vec::new(),
            outcomes: Vec::new(),
            placements: Vec::new(),
            rejected_actions: 0,
            content: Vec::new(),
            start_calls: 0,
            loads_issued: 0,
            overlay,
            background: None,
        }
    }

    /// Outcomes that were not ignored.
    pub fn handled(&self) -> impl Iterator<Item = &EventOutcome> {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o, EventOutcome::Ignored { .. }))
    }

    /// Render the report as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Parse`] if serialization fails.
    pub fn to_json(&self) -> ReplayResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Io`] if the file cannot be written.
    pub fn write_to(&self, path: &Path) -> ReplayResult<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| ReplayError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!("Report written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_report_carries_error_screen() {
        let mut overlay = Overlay::new();
        overlay.show_error(InitErrorKind::CameraError);
        let report = ReplayReport::rejected(InitErrorKind::CameraError, overlay);

        let json: serde_json::Value =
            serde_json::from_str(&report.to_json().expect("json")).expect("parse");
        assert_eq!(json["init_error"], "CAMERA_ERROR");
        assert_eq!(json["overlay"]["error"]["title"], "Camera Error");
        assert_eq!(json["overlay"]["loading_visible"], false);
    }

    #[test]
    fn handled_skips_ignored() {
        let mut report = ReplayReport::rejected(InitErrorKind::InternalError, Overlay::new());
        report.outcomes = vec![
            EventOutcome::Ignored {
                kind: EventKind::Lost,
            },
            EventOutcome::PoseApplied,
        ];
        assert_eq!(report.handled().count(), 1);
    }
}
