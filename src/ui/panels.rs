use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::color::COMPLEMENT_COLOR;
use crate::data::aggregate::{GroupLabel, MeanRow};
use crate::data::loader::SUPPORTED_EXTENSIONS;
use crate::data::model::Metric;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – search input and per-term summaries
// ---------------------------------------------------------------------------

/// Render the left search panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Search terms");
    ui.label("Enter several search terms (comma separated):");

    let mut input = state.search_input.clone();
    let response = ui.add(
        egui::TextEdit::singleline(&mut input)
            .hint_text("grün, Klima, Energie")
            .desired_width(f32::INFINITY),
    );
    let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
    if ui.button("Apply").clicked() || submitted {
        state.set_search_input(input);
    } else {
        state.search_input = input;
    }

    if let Some(prompt) = &state.input_error {
        ui.label(RichText::new(prompt).color(Color32::from_rgb(0xE6, 0x7E, 0x22)));
    }
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }
    let Some(tables) = &state.tables else {
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            let per_term = &tables.counts.per_term;
            for (i, (term, count)) in per_term.iter().enumerate() {
                // A repeated term shares the card of its first occurrence.
                if per_term[..i].iter().any(|(t, _)| t == term) {
                    continue;
                }
                let color = state.term_colors.color_for(i);
                ui.push_id(i, |ui: &mut Ui| {
                    group_card(ui, term, color, *count, tables.means.term_row(term));
                });
            }

            let complement = tables.means.row(&GroupLabel::Complement);
            ui.push_id("complement", |ui: &mut Ui| {
                group_card(
                    ui,
                    GroupLabel::COMPLEMENT_LABEL,
                    COMPLEMENT_COLOR,
                    tables.counts.complement,
                    complement,
                );
            });
        });
}

/// Collapsible summary of one group: article count and mean metrics.
fn group_card(ui: &mut Ui, title: &str, color: Color32, count: usize, means: Option<&MeanRow>) {
    egui::CollapsingHeader::new(RichText::new(format!("{title}  ({count})")).strong().color(color))
        .id_salt(title)
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            let Some(row) = means else {
                ui.label("No articles found");
                return;
            };
            ui.label(format!("Articles: {}", row.articles));
            egui::Grid::new("means")
                .striped(true)
                .num_columns(2)
                .show(ui, |ui: &mut Ui| {
                    ui.strong("Metric");
                    ui.strong("Mean");
                    ui.end_row();
                    for metric in Metric::REACTIONS {
                        ui.label(metric.label());
                        ui.label(format_mean(row.mean(metric)));
                        ui.end_row();
                    }
                    ui.label(RichText::new("Engagement").italics());
                    ui.end_row();
                    for metric in Metric::ENGAGEMENT {
                        ui.label(metric.label());
                        ui.label(format_mean(row.mean(metric)));
                        ui.end_row();
                    }
                });
        });
}

pub fn format_mean(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "–".to_string())
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let range = ds
                .date_range()
                .map(|(from, to)| format!(", {from} – {to}"))
                .unwrap_or_default();
            ui.label(format!(
                "{} articles on {} days{range}",
                ds.len(),
                ds.dates().len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open article dataset")
        .add_filter("Supported files", &SUPPORTED_EXTENSIONS)
        .add_filter("Spreadsheets", &["xlsx", "xlsm", "xls", "ods"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.open_path(&path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_means_render_as_dash() {
        assert_eq!(format_mean(Some(3.14159)), "3.14");
        assert_eq!(format_mean(Some(2.0)), "2.00");
        assert_eq!(format_mean(None), "–");
    }
}
