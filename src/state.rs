use std::path::Path;
use std::sync::Arc;

use crate::color::TermColors;
use crate::data::aggregate::{run_pipeline, DashboardTables};
use crate::data::filter::SearchTerms;
use crate::data::model::ArticleTable;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded dataset (None until a file is opened). Never mutated once set.
    pub dataset: Option<Arc<ArticleTable>>,

    /// Raw contents of the search field (comma separated).
    pub search_input: String,

    /// Derived tables for the last applied search; replaced wholesale.
    pub tables: Option<DashboardTables>,

    /// Colours for the current terms, in input order.
    pub term_colors: TermColors,

    /// Prompt shown when the search input yields no terms.
    pub input_error: Option<String>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Rows shown in the raw data excerpt.
    pub preview_rows: usize,
}

impl AppState {
    pub fn new(search_input: String, preview_rows: usize) -> Self {
        Self {
            search_input,
            preview_rows,
            ..Default::default()
        }
    }

    /// Ingest a newly loaded dataset and recompute for the current search.
    pub fn set_dataset(&mut self, dataset: ArticleTable) {
        self.dataset = Some(Arc::new(dataset));
        self.status_message = None;
        self.recompute();
    }

    /// Load a file and ingest it; failures end up in `status_message`.
    pub fn open_path(&mut self, path: &Path) {
        match crate::data::loader::load_file(path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} articles from {}",
                    dataset.len(),
                    path.display()
                );
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", path.display());
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Replace the search text and recompute.
    pub fn set_search_input(&mut self, input: impl Into<String>) {
        self.search_input = input.into();
        self.recompute();
    }

    /// Re-run the whole pipeline for the current search input.
    pub fn recompute(&mut self) {
        let terms = match SearchTerms::parse(&self.search_input) {
            Ok(terms) => terms,
            Err(e) => {
                log::warn!("{e}");
                self.input_error = Some(e.to_string());
                self.tables = None;
                self.term_colors = TermColors::default();
                return;
            }
        };
        self.input_error = None;

        let Some(dataset) = &self.dataset else {
            return;
        };

        let tables = run_pipeline(dataset, &terms);
        log::info!(
            "search {:?}: {} series rows, {} mean rows, matrix {}",
            terms.as_slice(),
            tables.daily_share.len(),
            tables.means.rows.len(),
            if tables.matrix.is_some() { "shown" } else { "skipped" }
        );
        self.term_colors = TermColors::new(terms.len());
        self.tables = Some(tables);
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::model::{Article, Metric};

    fn table() -> ArticleTable {
        let article = |d, text: &str| Article {
            date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
            text: Some(text.to_string()),
            fulltext: None,
            metrics: [Some(1.0); Metric::COUNT],
        };
        ArticleTable::new(vec![
            article(1, "grüne Energie"),
            article(1, "Klimawandel"),
            article(2, "Sport"),
        ])
    }

    #[test]
    fn empty_search_sets_prompt_and_clears_tables() {
        let mut state = AppState::new("grün".to_string(), 5);
        state.set_dataset(table());
        assert!(state.tables.is_some());

        state.set_search_input("  , ");
        assert_eq!(
            state.input_error.as_deref(),
            Some("Please enter at least one search term.")
        );
        assert!(state.tables.is_none());

        state.set_search_input("Klima");
        assert!(state.input_error.is_none());
        assert_eq!(state.tables.as_ref().unwrap().terms.as_slice(), ["Klima"]);
    }

    #[test]
    fn search_before_loading_keeps_tables_empty() {
        let mut state = AppState::new(String::new(), 5);
        state.set_search_input("Klima");
        assert!(state.input_error.is_none());
        assert!(state.tables.is_none());
    }

    #[test]
    fn recompute_replaces_outputs() {
        let mut state = AppState::new("grün, Klima".to_string(), 5);
        state.set_dataset(table());
        let first = state.tables.clone().unwrap();
        assert!(first.matrix.is_some());

        state.set_search_input("Sport");
        let second = state.tables.as_ref().unwrap();
        assert!(second.matrix.is_none());
        assert_eq!(second.counts.per_term, vec![("Sport".to_string(), 1)]);
    }

    #[test]
    fn failed_load_reports_status() {
        let mut state = AppState::new("Klima".to_string(), 5);
        state.open_path(Path::new("/nonexistent/articles.csv"));
        assert!(state.dataset.is_none());
        assert!(state
            .status_message
            .as_deref()
            .unwrap()
            .starts_with("Error:"));
    }
}
