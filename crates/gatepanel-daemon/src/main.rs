//! gatepanel: status LCD daemon for routers and gateways.
//!
//! Loads the JSON configuration, opens the framebuffer and backlight, starts
//! the background tasks and runs the render loop on the main thread.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use gatepanel_core::config::PanelConfig;
use gatepanel_core::display::DisplayManager;
use log::info;

use gatepanel_daemon::app_state::{self, AppState};
use gatepanel_daemon::tasks;

#[derive(Parser)]
#[command(name = "gatepanel")]
#[command(about = "Router status LCD daemon", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Framebuffer device of the panel
    #[arg(long, default_value = "/dev/fb0")]
    fb: PathBuf,
}

fn load_config(path: Option<&Path>) -> Result<PanelConfig> {
    let Some(path) = path else {
        info!("No configuration given, using defaults");
        return Ok(PanelConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading configuration {}", path.display()))?;
    let config = PanelConfig::from_json_str(&text)
        .map_err(|e| anyhow!("invalid configuration {}: {e}", path.display()))?;
    info!(
        "Configuration {} loaded ({} pages)",
        path.display(),
        config.pages.len()
    );
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    info!("Starting gatepanel {}", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_deref())?;
    let display = app_state::open_display(&cli.fb, &config.display)?;
    let state = AppState::new(
        &config,
        app_state::backlight_sink(&config.backlight),
        Instant::now(),
    );

    tasks::spawn_all(&config, &state).context("starting background tasks")?;

    let mut manager = DisplayManager::new(display, &config, state.resources(), Instant::now());
    manager.run()
}
