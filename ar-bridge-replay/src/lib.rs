//! # AR Bridge Replay
//!
//! Headless host that replays recorded AR sessions through
//! [`ar_bridge_core::SessionContext`] without a browser, camera or GPU.
//!
//! ## Usage
//!
//! ```bash
//! # Replay a trace and print the report
//! cargo run -p ar-bridge-replay -- --trace ar-bridge-replay/traces/touch_to_place.json
//!
//! # Same trace against a left-handed engine, report to a file
//! cargo run -p ar-bridge-replay -- --trace trace.json --engine flip --report out.json
//! ```
//!
//! ## Architecture
//!
//! - `Trace` - Recorded SDK answers, asset behavior, events and user actions
//! - `ScriptedSdk` / `ChannelEngine` - Collaborators driven by the trace
//! - `run_replay` - Single-queue event loop on tokio
//! - `ReplayReport` - Outcomes, placements, content and overlay state

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

mod error;
mod host;
mod report;
mod runner;
mod trace;

pub use error::{ReplayError, ReplayResult};
pub use host::{ChannelEngine, ScriptedSdk};
pub use report::ReplayReport;
pub use runner::{run_replay, ReplayOptions, DEFAULT_STALL_TIMEOUT};
pub use trace::{AssetScript, HostAction, SdkScript, Trace, TraceStep};

use std::path::PathBuf;

use ar_bridge_core::EngineProfile;
use clap::{Parser, ValueEnum};

/// Engine conventions selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineArg {
    /// Right-handed engine taking raw matrices.
    Direct,
    /// Left-handed engine placed by position and rotation.
    Flip,
}

impl From<EngineArg> for EngineProfile {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Direct => Self::RightHandedMatrix,
            EngineArg::Flip => Self::LeftHandedDecompose,
        }
    }
}

/// Command-line arguments for ar-bridge-replay.
#[derive(Debug, Clone, Parser)]
#[command(name = "ar-bridge-replay")]
#[command(about = "Replay a recorded AR session through the adaptation layer")]
#[command(version)]
pub struct CliArgs {
    /// Trace file to replay
    #[arg(long, env = "AR_BRIDGE_TRACE")]
    pub trace: PathBuf,

    /// Engine conventions, overriding the trace's config
    #[arg(long, value_enum, env = "AR_BRIDGE_ENGINE")]
    pub engine: Option<EngineArg>,

    /// Write the report here instead of stdout
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Seconds to wait for pending asset loads before giving up
    #[arg(long, default_value = "30")]
    pub stall_timeout_secs: u64,
}

impl From<&CliArgs> for ReplayOptions {
    fn from(args: &CliArgs) -> Self {
        Self {
            engine: args.engine.map(EngineProfile::from),
            stall_timeout: std::time::Duration::from_secs(args.stall_timeout_secs),
        }
    }
}
