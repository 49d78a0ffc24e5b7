//! Scripted stand-ins for the tracking SDK and the render engine.
//!
//! ```text
//!   ChannelEngine::load_asset ──spawn──► sleep(delay + latency)
//!                                            │
//!                                            ▼
//!   session loop ◄──── mpsc ◄──── AssetLoaded / AssetFailed
//! ```

use std::collections::HashMap;
use std::time::Duration;

use ar_bridge_core::{
    AssetRequest, CameraParameters, EngineCapabilities, EventKind, InitErrorKind, RenderEngine,
    SdkConfig, SessionEvent, TrackingSdk, VideoSource, Viewport,
};
use tokio::sync::mpsc;

use crate::trace::{AssetScript, SdkScript};

/// Tracking SDK that answers from a script and records what it was asked.
#[derive(Debug, Clone)]
pub struct ScriptedSdk {
    script: SdkScript,
    subscriptions: Vec<EventKind>,
    starts: u32,
}

impl ScriptedSdk {
    /// Create an SDK that follows `script`.
    #[must_use]
    pub fn new(script: SdkScript) -> Self {
        Self {
            script,
            subscriptions: Vec::new(),
            starts: 0,
        }
    }

    /// Kinds subscribed, in order.
    #[must_use]
    pub fn subscriptions(&self) -> &[EventKind] {
        &self.subscriptions
    }

    /// Number of `start` calls received.
    #[must_use]
    pub fn starts(&self) -> u32 {
        self.starts
    }
}

impl TrackingSdk for ScriptedSdk {
    fn init(&mut self, config: &SdkConfig) -> Result<Viewport, InitErrorKind> {
        tracing::debug!("SDK init in {:?} mode", config.mode);
        match self.script.init_error {
            Some(kind) => Err(kind),
            None => Ok(self.script.surface),
        }
    }

    fn camera_parameters(&self) -> Option<CameraParameters> {
        self.script.camera_parameters
    }

    fn camera_feed(&self) -> Option<VideoSource> {
        self.script
            .camera_feed
            .as_ref()
            .map(|id| VideoSource { id: id.clone() })
    }

    fn subscribe(&mut self, kind: EventKind) {
        self.subscriptions.push(kind);
    }

    fn start(&mut self) {
        self.starts += 1;
    }
}

/// Render engine whose asset loads run as tokio tasks.
///
/// Each load settles after the retry delay plus the scripted latency and
/// posts its completion on the session's event queue.
#[derive(Debug)]
pub struct ChannelEngine {
    caps: EngineCapabilities,
    assets: HashMap<String, AssetScript>,
    events: mpsc::UnboundedSender<SessionEvent>,
    resizes: Vec<Viewport>,
    loads_issued: usize,
}

impl ChannelEngine {
    /// Create an engine posting completions to `events`.
    #[must_use]
    pub fn new(
        caps: EngineCapabilities,
        assets: HashMap<String, AssetScript>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            caps,
            assets,
            events,
            resizes: Vec::new(),
            loads_issued: 0,
        }
    }

    /// Surface sizes applied, in order.
    #[must_use]
    pub fn resizes(&self) -> &[Viewport] {
        &self.resizes
    }

    /// Number of load attempts started.
    #[must_use]
    pub fn loads_issued(&self) -> usize {
        self.loads_issued
    }
}

impl RenderEngine for ChannelEngine {
    fn capabilities(&self) -> EngineCapabilities {
        self.caps
    }

    fn resize_surface(&mut self, viewport: Viewport) {
        self.resizes.push(viewport);
    }

    fn load_asset(&mut self, request: AssetRequest) {
        self.loads_issued += 1;
        let script = self.assets.get(&request.uri).cloned().unwrap_or_default();
        let events = self.events.clone();

        tokio::spawn(async move {
            let wait = request.delay_ms.saturating_add(script.latency_ms);
            if wait > 0 {
                tokio::time::sleep(Duration::from_millis(wait)).await;
            }

            let event = if request.attempt <= script.failures {
                SessionEvent::AssetFailed {
                    request_id: request.id,
                    reason: format!("scripted failure {} of {}", request.attempt, script.failures),
                }
            } else {
                SessionEvent::AssetLoaded {
                    request_id: request.id,
                }
            };
            if events.send(event).is_err() {
                tracing::debug!("Session ended before {} settled", request.uri);
            }
        });
    }
}
