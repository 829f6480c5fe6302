// Prevents additional console window on Windows in release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod config;
mod view;

use app::{NarratorApp, WINDOW_SIZE, WINDOW_TITLE};
use config::{AudioBackend, DesktopConfig};
use eframe::egui;
use narrator_audio::{CpalDevice, NullDevice, OutputDevice};
use narrator_playback::{Mp3Loader, Player, SessionStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let config = DesktopConfig::load()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let preferences_dir = config.preferences_dir()?;
    tracing::info!(
        backend = ?config.audio_backend,
        preferences = %preferences_dir.display(),
        "Starting audiobook player"
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(WINDOW_SIZE)
            .with_resizable(false),
        ..Default::default()
    };

    let backend = config.audio_backend;
    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(move |cc| {
            let app = NarratorApp::new(cc, |view| {
                Player::new(
                    output_device(backend),
                    Box::new(Mp3Loader),
                    SessionStore::open(&preferences_dir),
                    view,
                )
            });
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Window failed: {e}"))
}

fn output_device(backend: AudioBackend) -> Box<dyn OutputDevice> {
    match backend {
        AudioBackend::Cpal => Box::new(CpalDevice::new()),
        AudioBackend::Null => Box::new(NullDevice::new()),
    }
}
