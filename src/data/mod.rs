/// Data layer: typed article table, loading, term matching and aggregation.
///
/// Architecture:
/// ```text
///  .xlsx / .parquet / .csv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file, validate schema → ArticleTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ ArticleTable  │  Vec<Article>, immutable, shared via Arc
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  search terms → per-term match masks + complement
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  daily share, counts, mean metrics, metric × term matrix
///   └───────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
