//! Relay capture replay binary.
//!
//! # Usage
//!
//! ```bash
//! # Replay with defaults
//! relaymirror-replay --input session.cbor
//!
//! # Keep buffers across disconnects, cap history, log every line
//! relaymirror-replay --input session.cbor --keep-mirror-on-disconnect --max-lines 500 \
//!     --log-level debug
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use relaymirror_client::ClientConfig;
use relaymirror_core::{NicklistMode, ReconcilerConfig};
use relaymirror_replay::{ReplayConfig, load_capture, replay};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Nicklist policy
#[derive(Debug, Clone, Copy, ValueEnum)]
enum NicklistArg {
    /// Each nicklist message replaces the sets of the buffers it mentions
    Replace,
    /// Nicklist messages only ever add
    Additive,
}

impl From<NicklistArg> for NicklistMode {
    fn from(arg: NicklistArg) -> Self {
        match arg {
            NicklistArg::Replace => Self::Replace,
            NicklistArg::Additive => Self::Additive,
        }
    }
}

/// Replay a captured relay session through the buffer mirror
#[derive(Parser, Debug)]
#[command(name = "relaymirror-replay")]
#[command(about = "Replay a captured relay session through the buffer mirror")]
#[command(version)]
struct Args {
    /// Capture file (CBOR sequence)
    #[arg(short, long)]
    input: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Nicklist policy
    #[arg(long, value_enum, default_value = "replace")]
    nicklist_mode: NicklistArg,

    /// Keep buffers on disconnect (routing is still invalidated)
    #[arg(long)]
    keep_mirror_on_disconnect: bool,

    /// Maximum lines kept per buffer
    #[arg(long)]
    max_lines: Option<usize>,

    /// Echo every inbound message as a diagnostic record
    #[arg(long)]
    echo_all: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let entries = load_capture(&args.input)?;
    tracing::info!(path = %args.input.display(), entries = entries.len(), "capture loaded");

    let config = ReplayConfig {
        client: ClientConfig {
            reconciler: ReconcilerConfig {
                nicklist_mode: args.nicklist_mode.into(),
                max_lines_per_buffer: args.max_lines,
                ..ReconcilerConfig::default()
            },
            clear_on_disconnect: !args.keep_mirror_on_disconnect,
            echo_all: args.echo_all,
        },
    };

    let summary = replay(entries, config).await?;
    tracing::info!(
        entries = summary.entries,
        buffers = summary.buffers,
        lines = summary.lines,
        nicks = summary.nicks,
        notifications = summary.notifications,
        commands = summary.commands,
        stale = summary.client.stale_messages,
        rejected = summary.reconcile.rejected_messages,
        dropped_lines = summary.reconcile.dropped_lines,
        dropped_nicks = summary.reconcile.dropped_nicks,
        "replay finished"
    );

    Ok(())
}
