use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while turning user input into pipeline arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("Please enter at least one search term.")]
    NoSearchTerms,
}

/// Violations of the fixed article schema, detected once at ingestion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: column '{column}' holds non-numeric value '{value}'")]
    NonNumeric {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: cannot interpret '{value}' as a date")]
    InvalidDate { row: usize, value: String },

    #[error("the table contains no articles")]
    EmptyTable,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serializing config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
