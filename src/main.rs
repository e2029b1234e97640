mod app;
mod color;
mod config;
mod data;
mod error;
mod state;
mod ui;

use std::path::PathBuf;

use app::ArticleLensApp;
use config::Config;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = Config::load().unwrap_or_else(|e| {
        log::warn!("Using default configuration: {e}");
        Config::default()
    });

    // An explicit dataset path on the command line wins over the config.
    let initial_path = std::env::args_os().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Article Lens – Search Term Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(ArticleLensApp::new(&config, initial_path)))),
    )
}
