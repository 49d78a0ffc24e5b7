//! Loading and error overlay state.
//!
//! The overlay is plain data. Hosts mirror it onto whatever surface they own
//! (DOM nodes in the browser, a JSON report in the replay host).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Failure kinds reported by SDK initialization.
///
/// These are never retried; the matching title/message pair is shown verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InitErrorKind {
    /// Device or environment incompatibility.
    InternalError,
    /// Camera permission or access denied.
    CameraError,
    /// Motion sensor permission or access denied.
    SensorsError,
    /// Invalid or unpublished session credentials.
    LicenseError,
}

impl InitErrorKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::InternalError,
        Self::CameraError,
        Self::SensorsError,
        Self::LicenseError,
    ];

    /// Error name as reported by the SDK.
    #[must_use]
    pub const fn sdk_name(self) -> &'static str {
        match self {
            Self::InternalError => "INTERNAL_ERROR",
            Self::CameraError => "CAMERA_ERROR",
            Self::SensorsError => "SENSORS_ERROR",
            Self::LicenseError => "LICENSE_ERROR",
        }
    }

    /// Parse an SDK error name.
    #[must_use]
    pub fn from_sdk_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.sdk_name() == name)
    }

    /// Title shown on the error screen.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::InternalError => "Internal Error",
            Self::CameraError => "Camera Error",
            Self::SensorsError => "Sensors Error",
            Self::LicenseError => "License Error",
        }
    }

    /// Message shown on the error screen.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InternalError => {
                "An unespecified error has occurred. Your device might not be compatible with this experience."
            }
            Self::CameraError => {
                "Could not access to your device's camera. Please, ensure you have given required permissions from your browser settings."
            }
            Self::SensorsError => {
                "Could not access to your device's motion sensors. Please, ensure you have given required permissions from your browser settings."
            }
            Self::LicenseError => "This experience does not exist or has been unpublished.",
        }
    }
}

impl fmt::Display for InitErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sdk_name())
    }
}

/// Title/message pair displayed on the error screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorScreen {
    /// Error kind that produced this screen.
    pub kind: InitErrorKind,
    /// Screen title.
    pub title: String,
    /// Screen message.
    pub message: String,
}

impl From<InitErrorKind> for ErrorScreen {
    fn from(kind: InitErrorKind) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            message: kind.message().to_string(),
        }
    }
}

/// Full-screen overlay state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlay {
    /// Loading screen visible.
    pub loading_visible: bool,
    /// Error screen, if one is shown.
    pub error: Option<ErrorScreen>,
    /// Non-fatal notice (e.g. an asset that could not be loaded).
    pub notice: Option<String>,
    /// "Move your device" hint shown until the first hit-test result.
    pub initializing_hint: bool,
    /// Text decoded from the last detected QR code.
    pub decoded_text: Option<String>,
}

impl Overlay {
    /// Overlay as it looks before SDK initialization completes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            loading_visible: true,
            error: None,
            notice: None,
            initializing_hint: false,
            decoded_text: None,
        }
    }

    /// Hide the loading screen after a successful init.
    pub fn hide_loading(&mut self) {
        self.loading_visible = false;
    }

    /// Hide the loading screen and show the error pair for `kind`.
    pub fn show_error(&mut self, kind: InitErrorKind) {
        self.loading_visible = false;
        self.error = Some(ErrorScreen::from(kind));
    }

    /// Whether the error screen is visible.
    #[must_use]
    pub fn error_visible(&self) -> bool {
        self.error.is_some()
    }
}

impl Default for Overlay {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_overlay_shows_loading_only() {
        let overlay = Overlay::new();
        assert!(overlay.loading_visible);
        assert!(!overlay.error_visible());
    }

    #[test]
    fn show_error_hides_loading_and_sets_pair() {
        let mut overlay = Overlay::new();
        overlay.show_error(InitErrorKind::CameraError);

        assert!(!overlay.loading_visible);
        let screen = overlay.error.expect("error screen");
        assert_eq!(screen.title, "Camera Error");
        assert!(screen.message.starts_with("Could not access to your device's camera."));
    }

    #[test]
    fn sdk_names_roundtrip() {
        for kind in InitErrorKind::ALL {
            assert_eq!(InitErrorKind::from_sdk_name(kind.sdk_name()), Some(kind));
        }
        assert_eq!(InitErrorKind::from_sdk_name("TIMEOUT"), None);
    }

    #[test]
    fn kind_serializes_as_sdk_name() {
        let json = serde_json::to_string(&InitErrorKind::LicenseError).expect("serialize");
        assert_eq!(json, "\"LICENSE_ERROR\"");
    }

    #[test]
    fn every_kind_has_distinct_title() {
        let titles: std::collections::HashSet<_> =
            InitErrorKind::ALL.iter().map(|k| k.title()).collect();
        assert_eq!(titles.len(), InitErrorKind::ALL.len());
    }
}
