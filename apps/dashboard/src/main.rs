use std::path::PathBuf;

use clap::Parser;
use control_core::{load_settings, Orchestrator, Settings};
use crossbeam_channel::bounded;
use tracing_subscriber::EnvFilter;

mod backend_bridge;
mod controller;
mod ui;

use backend_bridge::commands::BackendCommand;
use controller::events::UiEvent;

#[derive(Parser, Debug)]
#[command(about = "Launcher and dashboard for the local miner backend")]
struct Args {
    /// TOML settings file; defaults to ./dashboard.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    backend_url: Option<String>,
    #[arg(long)]
    relay_url: Option<String>,
    /// Bound on a mining job in milliseconds. Unbounded when unset.
    #[arg(long)]
    job_timeout_ms: Option<u64>,
    /// Keep running after the last window closes, until `activate` or `quit`.
    #[arg(long)]
    persist_without_surfaces: Option<bool>,
}

impl Args {
    fn apply(self, settings: &mut Settings) {
        if let Some(v) = self.backend_url {
            settings.backend_url = v;
        }
        if let Some(v) = self.relay_url {
            settings.relay_url = v;
        }
        if let Some(ms) = self.job_timeout_ms {
            settings.job_timeout = Some(std::time::Duration::from_millis(ms));
        }
        if let Some(v) = self.persist_without_surfaces {
            settings.persist_without_surfaces = v;
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    args.apply(&mut settings);
    tracing::info!(
        backend = %settings.backend_url,
        relay = %settings.relay_url,
        "dashboard starting"
    );

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(Orchestrator::new(settings), cmd_rx, ui_tx);

    ui::console::run(cmd_tx, ui_rx)
}
