//! The replay loop.
//!
//! Scripted steps and asset completions are handled strictly one at a time
//! on the caller's task, so the session never sees concurrent mutation.

use std::time::Duration;

use ar_bridge_core::{
    ArError, EngineProfile, EventOutcome, Overlay, PlacementPoint, SessionContext, SessionEvent,
};
use tokio::sync::mpsc;

use crate::error::{ReplayError, ReplayResult};
use crate::host::{ChannelEngine, ScriptedSdk};
use crate::report::ReplayReport;
use crate::trace::{HostAction, Trace, TraceStep};

/// How long the loop waits for a completion while loads are pending.
pub const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Replay options beyond the trace itself.
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Overrides the trace's engine profile.
    pub engine: Option<EngineProfile>,
    /// Give up when nothing arrives for this long.
    pub stall_timeout: Duration,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            engine: None,
            stall_timeout: DEFAULT_STALL_TIMEOUT,
        }
    }
}

/// Outcomes collected while replaying.
#[derive(Default)]
struct Recorder {
    outcomes: Vec<EventOutcome>,
    placements: Vec<PlacementPoint>,
    rejected_actions: usize,
}

impl Recorder {
    fn dispatch(&mut self, session: &mut Session, event: SessionEvent) -> ReplayResult<()> {
        let outcome = session.handle(event)?;
        tracing::debug!("Outcome: {:?}", outcome);
        if let EventOutcome::Placement { point, .. } = &outcome {
            self.placements.push(*point);
        }
        self.outcomes.push(outcome);
        Ok(())
    }

    /// Handle every completion that has already arrived.
    fn drain(
        &mut self,
        session: &mut Session,
        rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
    ) -> ReplayResult<()> {
        while let Ok(event) = rx.try_recv() {
            self.dispatch(session, event)?;
        }
        Ok(())
    }

    fn reject(&mut self, action: &HostAction, error: &ArError) {
        tracing::warn!("Action {:?} rejected: {}", action, error);
        self.rejected_actions += 1;
    }
}

type Session = SessionContext<ScriptedSdk, ChannelEngine>;

async fn apply_action(
    session: &mut Session,
    action: HostAction,
    rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
    recorder: &mut Recorder,
) -> ReplayResult<()> {
    if let HostAction::Wait { ms } = action {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        return recorder.drain(session, rx);
    }
    if action == HostAction::ConfirmPlacement {
        if let Err(e) = session.confirm_placement() {
            recorder.reject(&action, &e);
        }
        return Ok(());
    }

    let Some(target) = session.content().nodes().last().map(|node| node.id) else {
        recorder.reject(&action, &ArError::InvalidOperation("no content loaded".to_string()));
        return Ok(());
    };
    let content = session.content_mut();
    let result = match action {
        HostAction::SetScale { scale } => content.set_scale(target, scale),
        HostAction::SetYaw { yaw } => content.set_yaw(target, yaw),
        HostAction::SetTint { rgb } => content.set_tint(target, rgb),
        HostAction::Wait { .. } | HostAction::ConfirmPlacement => Ok(()),
    };
    if let Err(e) = result {
        recorder.reject(&action, &e);
    }
    Ok(())
}

/// Replay `trace` until every scripted step is done and no asset load is
/// outstanding.
///
/// Completions that arrive while steps are being replayed are handled
/// before the next step. An SDK init rejection is a normal outcome and
/// yields a report.
///
/// # Errors
///
/// - [`ReplayError::Session`] if the session fails to initialize for
///   another reason or an event cannot be handled
/// - [`ReplayError::Stalled`] if loads stay pending past the stall timeout
pub async fn run_replay(trace: Trace, options: &ReplayOptions) -> ReplayResult<ReplayReport> {
    let profile = options.engine.unwrap_or(trace.config.engine);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let sdk = ScriptedSdk::new(trace.sdk.clone());
    let engine = ChannelEngine::new(profile.capabilities(), trace.assets.clone(), tx);

    let mut overlay = Overlay::new();
    let mut session = match SessionContext::initialize(sdk, engine, trace.config, &mut overlay) {
        Ok(session) => session,
        Err(ArError::Init(kind)) => {
            tracing::warn!("Replay ended at init: {}", kind);
            return Ok(ReplayReport::rejected(kind, overlay));
        }
        Err(e) => return Err(e.into()),
    };

    let mut recorder = Recorder::default();
    for step in trace.events {
        recorder.drain(&mut session, &mut rx)?;
        match step {
            TraceStep::Event(event) => recorder.dispatch(&mut session, event)?,
            TraceStep::Action(action) => {
                apply_action(&mut session, action, &mut rx, &mut recorder).await?;
            }
        }
        tokio::task::yield_now().await;
    }

    while session.content().pending_count() > 0 {
        match tokio::time::timeout(options.stall_timeout, rx.recv()).await {
            Ok(Some(event)) => recorder.dispatch(&mut session, event)?,
            Ok(None) => break,
            Err(_) => {
                return Err(ReplayError::Stalled(
                    options.stall_timeout,
                    session.content().pending_count(),
                ))
            }
        }
    }

    tracing::info!(
        "Replay finished: {} outcomes, {} placements, {} nodes",
        recorder.outcomes.len(),
        recorder.placements.len(),
        session.content().nodes().len()
    );

    Ok(ReplayReport {
        init_error: None,
        strategy: Some(session.pose_strategy()),
        subscriptions: session.subscriptions().iter().copied().collect(),
        outcomes: recorder.outcomes,
        placements: recorder.placements,
        rejected_actions: recorder.rejected_actions,
        content: session.content().nodes().to_vec(),
        start_calls: session.sdk().starts(),
        loads_issued: session.engine().loads_issued(),
        overlay: session.overlay().clone(),
        background: Some(session.background().clone()),
    })
}
