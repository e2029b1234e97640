use std::collections::HashMap;
use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use eframe::egui::{self, Align2, Color32, FontId, RichText, ScrollArea, Sense, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoint, PlotPoints, Points};

use crate::color::{contrast_text, diverging_color, COMPLEMENT_COLOR};
use crate::data::aggregate::{DashboardTables, GroupLabel, MetricMatrix};
use crate::data::filter::matches_term;
use crate::data::model::{ArticleTable, Metric};
use crate::state::AppState;
use crate::ui::panels::format_mean;

const WARNING_COLOR: Color32 = Color32::from_rgb(0xE6, 0x7E, 0x22);

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render all charts for the current search in the central panel.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a dataset to start  (File → Open…)");
            });
            return;
        }
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            if let Some(tables) = &state.tables {
                ui.heading("Share of articles over time");
                if tables.no_share_data() {
                    ui.label(
                        RichText::new("No data found for the given search terms.")
                            .color(WARNING_COLOR),
                    );
                } else {
                    share_plot(ui, tables, state);
                }
                ui.add_space(12.0);

                if !tables.means.rows.is_empty() {
                    ui.heading("Comparison of all metrics");
                    means_bar_chart(ui, tables, state);
                    ui.add_space(12.0);
                }

                if let Some(matrix) = &tables.matrix {
                    ui.heading("Heatmap: differences between search terms");
                    heatmap(ui, matrix);
                    ui.add_space(12.0);
                }
            }

            ui.heading("Original data (excerpt)");
            data_preview(ui, dataset, state);
        });
}

/// Colour of a mean-table label: the first term with that text, or grey.
fn label_color(label: &GroupLabel, tables: &DashboardTables, state: &AppState) -> Color32 {
    match label {
        GroupLabel::Term(term) => tables
            .terms
            .iter()
            .position(|t| t == term)
            .map(|i| state.term_colors.color_for(i))
            .unwrap_or(Color32::GRAY),
        GroupLabel::Complement => COMPLEMENT_COLOR,
    }
}

// ---------------------------------------------------------------------------
// Daily share line chart
// ---------------------------------------------------------------------------

fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn date_from_day_number(x: f64) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

fn share_plot(ui: &mut Ui, tables: &DashboardTables, state: &AppState) {
    // (term, day) → (matched, total) for the hover label.
    let counts: HashMap<(String, i32), (usize, usize)> = tables
        .daily_share
        .iter()
        .map(|r| ((r.term.clone(), r.date.num_days_from_ce()), (r.matched, r.total)))
        .collect();

    Plot::new("share_plot")
        .height(320.0)
        .legend(Legend::default())
        .x_axis_label("Date")
        .y_axis_label("Share (%)")
        .include_y(0.0)
        .x_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| {
            date_from_day_number(mark.value)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        })
        .label_formatter(move |name: &str, value: &PlotPoint| {
            let Some(date) = date_from_day_number(value.x) else {
                return String::new();
            };
            match counts.get(&(name.to_string(), date.num_days_from_ce())) {
                Some((matched, total)) => format!(
                    "{name}\nDate: {date}\nShare: {:.2}%\nArticles with term: {matched}\nTotal articles: {total}",
                    value.y
                ),
                None => format!("{date}\n{:.2}%", value.y),
            }
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (i, term) in tables.terms.iter().enumerate() {
                let color = state.term_colors.color_for(i);
                let points: Vec<[f64; 2]> = tables
                    .daily_share
                    .iter()
                    .filter(|r| &r.term == term)
                    .map(|r| [day_number(r.date), r.percentage])
                    .collect();

                plot_ui.line(
                    Line::new(PlotPoints::from(points.clone()))
                        .name(term)
                        .color(color)
                        .width(1.5),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from(points))
                        .name(term)
                        .color(color)
                        .radius(3.0),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Grouped bar chart of mean metrics
// ---------------------------------------------------------------------------

fn means_bar_chart(ui: &mut Ui, tables: &DashboardTables, state: &AppState) {
    let n_groups = tables.means.rows.len();
    let bar_width = 0.8 / n_groups as f64;

    Plot::new("means_plot")
        .height(320.0)
        .legend(Legend::default())
        .x_axis_label("Metric")
        .y_axis_label("Mean value")
        .include_y(0.0)
        .x_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            Metric::ALL
                .get(idx as usize)
                .map(|m| m.label().to_string())
                .unwrap_or_default()
        })
        .allow_drag(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            // The long form holds exactly one entry per metric for each group.
            for (j, group) in tables.mean_points.chunks(Metric::COUNT).enumerate() {
                let Some(first) = group.first() else {
                    continue;
                };
                let offset = (j as f64 - (n_groups as f64 - 1.0) / 2.0) * bar_width;
                let label = first.label.to_string();
                let bars: Vec<Bar> = group
                    .iter()
                    .filter_map(|point| {
                        let value = point.value?;
                        Some(
                            Bar::new(point.metric.index() as f64 + offset, value)
                                .width(bar_width * 0.95)
                                .name(point.metric.label()),
                        )
                    })
                    .collect();

                let hover_label = label.clone();
                plot_ui.bar_chart(
                    BarChart::new(bars)
                        .name(&label)
                        .color(label_color(&first.label, tables, state))
                        .element_formatter(Box::new(move |bar: &Bar, _chart: &BarChart| {
                            format!("{hover_label}\nMetric: {}\nMean: {:.2}", bar.name, bar.value)
                        })),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Metric × term heatmap
// ---------------------------------------------------------------------------

const HEATMAP_LABEL_WIDTH: f32 = 110.0;
const HEATMAP_HEADER_HEIGHT: f32 = 24.0;
const HEATMAP_CELL_HEIGHT: f32 = 28.0;

fn heatmap(ui: &mut Ui, matrix: &MetricMatrix) {
    let Some((lo, hi)) = matrix.value_range() else {
        ui.label("No values to compare.");
        return;
    };

    let n_cols = matrix.terms.len().max(1);
    let width = ui
        .available_width()
        .max(HEATMAP_LABEL_WIDTH + 60.0 * n_cols as f32);
    let cell_w = (width - HEATMAP_LABEL_WIDTH) / n_cols as f32;
    let size = egui::vec2(
        width,
        HEATMAP_HEADER_HEIGHT + HEATMAP_CELL_HEIGHT * matrix.metrics.len() as f32,
    );

    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let origin = response.rect.min;
    let text_color = ui.visuals().text_color();

    let cell_rect = |row: usize, col: usize| {
        egui::Rect::from_min_size(
            egui::pos2(
                origin.x + HEATMAP_LABEL_WIDTH + cell_w * col as f32,
                origin.y + HEATMAP_HEADER_HEIGHT + HEATMAP_CELL_HEIGHT * row as f32,
            ),
            egui::vec2(cell_w, HEATMAP_CELL_HEIGHT),
        )
    };

    for (col, term) in matrix.terms.iter().enumerate() {
        painter.text(
            egui::pos2(
                origin.x + HEATMAP_LABEL_WIDTH + cell_w * (col as f32 + 0.5),
                origin.y + HEATMAP_HEADER_HEIGHT / 2.0,
            ),
            Align2::CENTER_CENTER,
            term,
            FontId::proportional(13.0),
            text_color,
        );
    }

    let mut hover_text = None;
    let hover_pos = response.hover_pos();

    for (row, metric) in matrix.metrics.iter().enumerate() {
        let row_rect = cell_rect(row, 0);
        painter.text(
            egui::pos2(origin.x + HEATMAP_LABEL_WIDTH - 8.0, row_rect.center().y),
            Align2::RIGHT_CENTER,
            metric.label(),
            FontId::proportional(13.0),
            text_color,
        );

        for col in 0..matrix.terms.len() {
            let rect = cell_rect(row, col);
            let value = matrix.get(*metric, col);
            let fill = value
                .map(|v| diverging_color(v, lo, hi))
                .unwrap_or(Color32::DARK_GRAY);
            painter.rect_filled(rect.shrink(1.0), 2.0, fill);
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                format_mean(value),
                FontId::monospace(12.0),
                contrast_text(fill),
            );

            if hover_pos.is_some_and(|p| rect.contains(p)) {
                hover_text = Some(format!(
                    "Search term: {}\nMetric: {}\nValue: {}",
                    matrix.terms[col],
                    metric.label(),
                    format_mean(value)
                ));
            }
        }
    }

    if let Some(text) = hover_text {
        response.on_hover_text_at_pointer(text);
    }

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Scale:");
        ui.label(RichText::new(format!("{lo:.2}")).color(diverging_color(lo, lo, hi)));
        ui.label("→");
        ui.label(RichText::new(format!("{hi:.2}")).color(diverging_color(hi, lo, hi)));
    });
}

// ---------------------------------------------------------------------------
// Raw data excerpt
// ---------------------------------------------------------------------------

const PREVIEW_TEXT_CHARS: usize = 80;

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars).collect();
        out.push('…');
        out
    }
}

fn data_preview(ui: &mut Ui, dataset: &ArticleTable, state: &AppState) {
    let rows = &dataset.articles()[..state.preview_rows.min(dataset.len())];
    let terms: Vec<&String> = state
        .tables
        .as_ref()
        .map(|t| t.terms.iter().collect())
        .unwrap_or_default();

    ui.push_id("data_preview", |ui: &mut Ui| {
        ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .vscroll(false)
                .column(Column::auto())
                .column(Column::initial(320.0).resizable(true))
                .column(Column::auto())
                .columns(Column::auto(), Metric::COUNT)
                .header(20.0, |mut header| {
                    header.col(|ui| {
                        ui.strong("date");
                    });
                    header.col(|ui| {
                        ui.strong("text");
                    });
                    header.col(|ui| {
                        ui.strong("matches");
                    });
                    for metric in Metric::ALL {
                        header.col(|ui| {
                            ui.strong(metric.column());
                        });
                    }
                })
                .body(|mut body| {
                    for article in rows {
                        body.row(18.0, |mut row| {
                            row.col(|ui| {
                                ui.label(article.date.to_string());
                            });
                            row.col(|ui| {
                                ui.label(truncate(article.text_or_empty(), PREVIEW_TEXT_CHARS));
                            });
                            row.col(|ui| {
                                let matched: Vec<&str> = terms
                                    .iter()
                                    .filter(|t| matches_term(article, t))
                                    .map(|t| t.as_str())
                                    .collect();
                                ui.label(matched.join(", "));
                            });
                            for metric in Metric::ALL {
                                row.col(|ui| {
                                    ui.label(
                                        article
                                            .metric(metric)
                                            .map(|v| v.to_string())
                                            .unwrap_or_default(),
                                    );
                                });
                            }
                        });
                    }
                });
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_numbers_round_trip() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(date_from_day_number(day_number(d)), Some(d));
        assert_eq!(date_from_day_number(day_number(d) + 0.3), Some(d));
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("grüne Energie", 5), "grüne…");
        assert_eq!(truncate("Sport", 5), "Sport");
    }
}
