//! WebAssembly bindings for ar-bridge-core.
//!
//! The page owns the actual tracking SDK and 3D engine objects. It awaits the
//! SDK's init promise itself, then hands both objects to [`WasmSession`] and
//! forwards every SDK callback and asset-loader completion to
//! `handleEvent` as JSON.
//!
//! Expected JS shapes:
//!
//! ```text
//!   sdk    { getCameraParameters() -> {fov, aspect},
//!            getCameraFeed() -> any | undefined,
//!            subscribe(kind: string), start() }
//!   engine { resize(width, height), loadAsset(requestJson: string),
//!            setProjection?(projectionJson: string),
//!            setCameraTransform?(transformJson: string) }
//! ```
//!
//! The optional engine hooks receive the projection after init and every
//! resize, and the camera transform after every pose. The transform JSON is
//! `{"kind": "matrix", ...}` for matrix engines or `{"kind": "decomposed",
//! "position", "rotation", "scale"}` for engines placed by position and
//! rotation.

use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::camera::CameraTransform;
use crate::config::ExperienceConfig;
use crate::context::EventOutcome;
use crate::engine::{AssetRequest, EngineCapabilities, RenderEngine};
use crate::event::{EventKind, SessionEvent};
use crate::overlay::{InitErrorKind, Overlay};
use crate::projection::{CameraParameters, Projection, Viewport};
use crate::sdk::{SdkConfig, TrackingSdk, VideoSource};
use crate::SessionContext;

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// How the page's own SDK init call ended.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum InitReport {
    /// Init resolved with this render surface.
    Surface(Viewport),
    /// Init rejected with an SDK error name.
    Error(String),
}

impl InitReport {
    fn into_result(self) -> Result<Viewport, InitErrorKind> {
        match self {
            Self::Surface(viewport) => Ok(viewport),
            Self::Error(name) => Err(InitErrorKind::from_sdk_name(&name).unwrap_or_else(|| {
                tracing::warn!("Unknown SDK error {}, treating as internal", name);
                InitErrorKind::InternalError
            })),
        }
    }
}

fn method(target: &JsValue, name: &str) -> Option<js_sys::Function> {
    js_sys::Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .and_then(|value| value.dyn_into::<js_sys::Function>().ok())
}

fn call(target: &JsValue, name: &str, args: &[JsValue]) -> Option<JsValue> {
    let Some(function) = method(target, name) else {
        tracing::warn!("JS object has no {}() method", name);
        return None;
    };
    let result = match args {
        [] => function.call0(target),
        [a] => function.call1(target, a),
        [a, b] => function.call2(target, a, b),
        _ => function.apply(target, &args.iter().collect::<js_sys::Array>()),
    };
    result
        .map_err(|e| tracing::warn!("{}() threw: {:?}", name, e))
        .ok()
}

/// Call an optional hook with one JSON argument, skipping it when absent.
fn notify(target: &JsValue, name: &str, json: &str) {
    if let Some(function) = method(target, name) {
        if let Err(e) = function.call1(target, &JsValue::from_str(json)) {
            tracing::warn!("{}() threw: {:?}", name, e);
        }
    }
}

fn projection_json(projection: &Projection) -> String {
    serde_json::to_string(projection).unwrap_or_default()
}

fn camera_transform_json(transform: &CameraTransform) -> String {
    serde_json::to_string(transform).unwrap_or_default()
}

/// The page's tracking SDK object.
struct JsTrackingSdk {
    sdk: JsValue,
    init: Result<Viewport, InitErrorKind>,
}

impl TrackingSdk for JsTrackingSdk {
    fn init(&mut self, _config: &SdkConfig) -> Result<Viewport, InitErrorKind> {
        self.init
    }

    fn camera_parameters(&self) -> Option<CameraParameters> {
        let value = call(&self.sdk, "getCameraParameters", &[])?;
        let json: String = js_sys::JSON::stringify(&value).ok()?.into();
        serde_json::from_str(&json)
            .map_err(|e| tracing::warn!("Bad camera parameters {}: {}", json, e))
            .ok()
    }

    fn camera_feed(&self) -> Option<VideoSource> {
        let feed = call(&self.sdk, "getCameraFeed", &[])?;
        if feed.is_undefined() || feed.is_null() {
            return None;
        }
        Some(VideoSource {
            id: "camera-feed".to_string(),
        })
    }

    fn subscribe(&mut self, kind: EventKind) {
        if let Ok(serde_json::Value::String(name)) = serde_json::to_value(kind) {
            call(&self.sdk, "subscribe", &[JsValue::from_str(&name)]);
        }
    }

    fn start(&mut self) {
        call(&self.sdk, "start", &[]);
    }
}

/// The page's engine object.
struct JsEngine {
    engine: JsValue,
    caps: EngineCapabilities,
}

impl RenderEngine for JsEngine {
    fn capabilities(&self) -> EngineCapabilities {
        self.caps
    }

    fn resize_surface(&mut self, viewport: Viewport) {
        call(
            &self.engine,
            "resize",
            &[
                JsValue::from(viewport.width),
                JsValue::from(viewport.height),
            ],
        );
    }

    fn load_asset(&mut self, request: AssetRequest) {
        match serde_json::to_string(&request) {
            Ok(json) => {
                call(&self.engine, "loadAsset", &[JsValue::from_str(&json)]);
            }
            Err(e) => tracing::warn!("Could not encode asset request: {}", e),
        }
    }
}

fn show(document: &web_sys::Document, id: &str, visible: bool) {
    let Some(element) = document
        .get_element_by_id(id)
        .and_then(|e| e.dyn_into::<web_sys::HtmlElement>().ok())
    else {
        return;
    };
    let display = if visible { "flex" } else { "none" };
    let _ = element.style().set_property("display", display);
}

fn set_text(document: &web_sys::Document, id: &str, text: &str) {
    if let Some(element) = document.get_element_by_id(id) {
        element.set_text_content(Some(text));
    }
}

/// Mirror overlay state onto the page's overlay elements.
fn apply_overlay(overlay: &Overlay) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    show(&document, "loading-screen", overlay.loading_visible);
    show(&document, "error-screen", overlay.error.is_some());
    if let Some(error) = &overlay.error {
        set_text(&document, "error-title", &error.title);
        set_text(&document, "error-message", &error.message);
    }
    show(&document, "initializing", overlay.initializing_hint);
    if let Some(text) = &overlay.decoded_text {
        set_text(&document, "decoded-text", text);
    }
    if let Some(notice) = &overlay.notice {
        web_sys::console::warn_1(&JsValue::from_str(notice));
    }
}

fn open_link(url: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Err(e) = window.open_with_url_and_target(url, "_blank") {
        tracing::warn!("Could not open {}: {:?}", url, e);
    }
}

/// AR session instance for WASM.
#[wasm_bindgen]
pub struct WasmSession {
    context: SessionContext<JsTrackingSdk, JsEngine>,
}

#[wasm_bindgen]
impl WasmSession {
    /// Set up a session after the page's SDK init settled.
    ///
    /// `init_json` is `{"surface": {"width", "height"}}` on success or
    /// `{"error": "CAMERA_ERROR"}` (any SDK error name) on failure.
    ///
    /// # Errors
    ///
    /// Returns an error string if the configuration is invalid or the SDK
    /// rejected init; the error screen is already shown in that case.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config_json: &str,
        init_json: &str,
        sdk: JsValue,
        engine: JsValue,
    ) -> Result<WasmSession, String> {
        let config = ExperienceConfig::from_json(config_json).map_err(|e| e.to_string())?;
        let report: InitReport = serde_json::from_str(init_json).map_err(|e| e.to_string())?;

        let sdk = JsTrackingSdk {
            sdk,
            init: report.into_result(),
        };
        let engine = JsEngine {
            engine,
            caps: config.engine.capabilities(),
        };

        let mut overlay = Overlay::new();
        let result = SessionContext::initialize(sdk, engine, config, &mut overlay);
        apply_overlay(&overlay);
        let context = result.map_err(|e| e.to_string())?;
        let session = Self { context };
        session.push_projection();
        Ok(session)
    }

    fn engine_object(&self) -> &JsValue {
        &self.context.engine().engine
    }

    fn push_projection(&self) {
        notify(
            self.engine_object(),
            "setProjection",
            &projection_json(self.context.camera().projection()),
        );
    }

    fn push_camera_transform(&self) {
        notify(
            self.engine_object(),
            "setCameraTransform",
            &camera_transform_json(self.context.camera().transform()),
        );
    }

    /// Dispatch one event given as JSON and return the outcome as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string for malformed events or failed handling.
    #[wasm_bindgen(js_name = handleEvent)]
    pub fn handle_event(&mut self, event_json: &str) -> Result<String, String> {
        let event: SessionEvent = serde_json::from_str(event_json).map_err(|e| e.to_string())?;
        let outcome = self.context.handle(event).map_err(|e| e.to_string())?;
        match &outcome {
            EventOutcome::PoseApplied => self.push_camera_transform(),
            EventOutcome::ProjectionUpdated { .. } => self.push_projection(),
            EventOutcome::HotspotActivated { url } => open_link(url),
            _ => {}
        }
        apply_overlay(self.context.overlay());
        serde_json::to_string(&outcome).map_err(|e| e.to_string())
    }

    /// Place the hit-test preview where it is.
    ///
    /// # Errors
    ///
    /// Returns an error string outside hit-test placement or before the
    /// first hit result.
    #[wasm_bindgen(js_name = confirmPlacement)]
    pub fn confirm_placement(&mut self) -> Result<bool, String> {
        self.context.confirm_placement().map_err(|e| e.to_string())
    }

    /// Whether continuous tracking has started.
    #[wasm_bindgen(js_name = isStarted)]
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.context.is_started()
    }

    /// Content nodes as JSON.
    #[wasm_bindgen(js_name = getContentJson)]
    #[must_use]
    pub fn get_content_json(&self) -> String {
        serde_json::to_string(self.context.content().nodes()).unwrap_or_default()
    }

    /// Current projection (fov, aspect, clip range, matrix) as JSON.
    #[wasm_bindgen(js_name = getProjectionJson)]
    #[must_use]
    pub fn get_projection_json(&self) -> String {
        projection_json(self.context.camera().projection())
    }

    /// Camera transform in the form the engine consumes, as JSON.
    #[wasm_bindgen(js_name = getCameraTransformJson)]
    #[must_use]
    pub fn get_camera_transform_json(&self) -> String {
        camera_transform_json(self.context.camera().transform())
    }

    /// Render camera world matrix as a 16-element array.
    #[wasm_bindgen(js_name = getCameraMatrix)]
    #[must_use]
    pub fn get_camera_matrix(&self) -> Vec<f32> {
        self.context.camera().world_matrix().data.to_vec()
    }
}
