use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Metric – the nine engagement columns
// ---------------------------------------------------------------------------

/// One of the nine numeric engagement columns tracked per article.
///
/// The declaration order is the canonical display order: seven reaction
/// types followed by the two engagement counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    Haha,
    Like,
    Wow,
    Angry,
    Sad,
    Love,
    Hug,
    Shares,
    Comments,
}

impl Metric {
    pub const COUNT: usize = 9;

    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::Haha,
        Metric::Like,
        Metric::Wow,
        Metric::Angry,
        Metric::Sad,
        Metric::Love,
        Metric::Hug,
        Metric::Shares,
        Metric::Comments,
    ];

    pub const REACTIONS: [Metric; 7] = [
        Metric::Haha,
        Metric::Like,
        Metric::Wow,
        Metric::Angry,
        Metric::Sad,
        Metric::Love,
        Metric::Hug,
    ];

    pub const ENGAGEMENT: [Metric; 2] = [Metric::Shares, Metric::Comments];

    /// Column name in the source table.
    pub fn column(self) -> &'static str {
        match self {
            Metric::Haha => "haha",
            Metric::Like => "like",
            Metric::Wow => "wow",
            Metric::Angry => "angry",
            Metric::Sad => "sad",
            Metric::Love => "love",
            Metric::Hug => "hug",
            Metric::Shares => "shares",
            Metric::Comments => "comments_num",
        }
    }

    /// Human-readable label for charts and tables.
    pub fn label(self) -> &'static str {
        match self {
            Metric::Haha => "Haha",
            Metric::Like => "Like",
            Metric::Wow => "Wow",
            Metric::Angry => "Angry",
            Metric::Sad => "Sad",
            Metric::Love => "Love",
            Metric::Hug => "Hug",
            Metric::Shares => "Shares",
            Metric::Comments => "Comments",
        }
    }

    pub fn from_column(name: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.column() == name)
    }

    /// Position in [`Metric::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Metric values of one article, indexed by [`Metric::index`]. `None` is a missing cell.
pub type MetricValues = [Option<f64>; Metric::COUNT];

// ---------------------------------------------------------------------------
// Article – one row of the source table
// ---------------------------------------------------------------------------

/// A single published article.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// Publication date (time of day is dropped at ingestion).
    pub date: NaiveDate,
    /// Short text / teaser.
    pub text: Option<String>,
    /// Full article body.
    pub fulltext: Option<String>,
    pub metrics: MetricValues,
}

impl Article {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics[metric.index()]
    }

    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn fulltext_or_empty(&self) -> &str {
        self.fulltext.as_deref().unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// ArticleTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full validated dataset. Built once by the loader and shared
/// read-only (behind an `Arc`) for the rest of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleTable {
    articles: Vec<Article>,
}

impl ArticleTable {
    pub fn new(articles: Vec<Article>) -> Self {
        ArticleTable { articles }
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    /// Number of articles.
    pub fn len(&self) -> usize {
        self.articles.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Distinct publication dates in ascending order.
    pub fn dates(&self) -> BTreeSet<NaiveDate> {
        self.articles.iter().map(|a| a.date).collect()
    }

    /// Earliest and latest publication date, if any.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.articles.iter().map(|a| a.date).min()?;
        let max = self.articles.iter().map(|a| a.date).max()?;
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_order_is_reactions_then_engagement() {
        let joined: Vec<Metric> = Metric::REACTIONS
            .into_iter()
            .chain(Metric::ENGAGEMENT)
            .collect();
        assert_eq!(joined, Metric::ALL.to_vec());
        for (i, m) in Metric::ALL.into_iter().enumerate() {
            assert_eq!(m.index(), i);
        }
    }

    #[test]
    fn metric_columns_resolve_back() {
        for m in Metric::ALL {
            assert_eq!(Metric::from_column(m.column()), Some(m));
        }
        assert_eq!(Metric::from_column("comments"), None);
    }

    #[test]
    fn date_range_spans_all_articles() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        let article = |d| Article {
            date: day(d),
            text: None,
            fulltext: None,
            metrics: [None; Metric::COUNT],
        };
        let table = ArticleTable::new(vec![article(5), article(2), article(5)]);

        assert_eq!(table.date_range(), Some((day(2), day(5))));
        assert_eq!(table.dates().into_iter().collect::<Vec<_>>(), vec![day(2), day(5)]);
        assert_eq!(ArticleTable::new(Vec::new()).date_range(), None);
    }
}
