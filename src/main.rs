mod app;

use anyhow::{anyhow, Context};
use app::CinemaApp;
use clap::Parser;
use eframe::NativeOptions;
use egui_cinema::{PlayerConfig, PlayerView};
use std::time::Duration;

/// Streaming-style video player
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// URL or path of the video to open
    source: Option<String>,

    /// Seconds jumped by the skip buttons and arrow keys
    #[arg(long, default_value_t = 10.0)]
    skip_seconds: f64,

    /// Idle check period before the controls hide, in milliseconds
    #[arg(long, default_value_t = 500)]
    idle_ms: u64,

    /// Double-click window, in milliseconds
    #[arg(long, default_value_t = 200)]
    click_ms: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    ffmpeg_next::init().context("Failed to initialize FFmpeg")?;

    let config = PlayerConfig::default()
        .with_skip_seconds(args.skip_seconds)
        .with_idle_check_interval(Duration::from_millis(args.idle_ms))
        .with_click_window(Duration::from_millis(args.click_ms));
    let view = PlayerView::new(config).context("Failed to set up the player")?;

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Cinema")
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Cinema",
        options,
        Box::new(move |cc| Ok(Box::new(CinemaApp::new(cc, view, args.source)))),
    )
    .map_err(|e| anyhow!("{e}"))
}
