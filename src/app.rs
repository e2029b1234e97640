use std::path::PathBuf;

use eframe::egui;

use crate::config::Config;
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ArticleLensApp {
    pub state: AppState,
}

impl ArticleLensApp {
    /// Build the app and open the initial dataset, if one is configured.
    pub fn new(config: &Config, initial_path: Option<PathBuf>) -> Self {
        let mut state = AppState::new(config.default_search.clone(), config.preview_rows);
        if let Some(path) = initial_path.or_else(|| config.data_path.clone()) {
            state.open_path(&path);
        } else {
            state.recompute();
        }
        Self { state }
    }
}

impl eframe::App for ArticleLensApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: search and per-term summaries ----
        egui::SidePanel::left("search_panel")
            .default_width(300.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::dashboard(ui, &self.state);
        });
    }
}
