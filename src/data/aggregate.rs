use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

use super::filter::{count, SearchTerms, TermMatches};
use super::model::{ArticleTable, Metric};

// ---------------------------------------------------------------------------
// Output tables
// ---------------------------------------------------------------------------

/// One point of the daily-share series.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyShareRow {
    pub date: NaiveDate,
    pub term: String,
    /// `matched / total * 100`, always within `0..=100`.
    pub percentage: f64,
    pub matched: usize,
    pub total: usize,
}

/// Row label of the mean-metrics table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupLabel {
    Term(String),
    /// Articles matching none of the terms.
    Complement,
}

impl GroupLabel {
    pub const COMPLEMENT_LABEL: &'static str = "Without search terms";
}

impl fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupLabel::Term(t) => f.write_str(t),
            GroupLabel::Complement => f.write_str(Self::COMPLEMENT_LABEL),
        }
    }
}

/// Matched-article counts per term, plus the complement size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermCounts {
    pub per_term: Vec<(String, usize)>,
    pub complement: usize,
}

/// Mean of every metric over one group, rounded to two decimals.
/// `None` where the group has no value at all for a metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanRow {
    pub label: GroupLabel,
    pub articles: usize,
    pub means: [Option<f64>; Metric::COUNT],
}

impl MeanRow {
    pub fn mean(&self, metric: Metric) -> Option<f64> {
        self.means[metric.index()]
    }
}

/// Wide-form mean comparison: one row per non-empty term, then the complement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeanMetrics {
    pub rows: Vec<MeanRow>,
}

/// Long-form mean comparison entry, ready for a grouped bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanPoint {
    pub label: GroupLabel,
    pub metric: Metric,
    pub value: Option<f64>,
}

impl MeanMetrics {
    pub fn row(&self, label: &GroupLabel) -> Option<&MeanRow> {
        self.rows.iter().find(|r| &r.label == label)
    }

    pub fn term_row(&self, term: &str) -> Option<&MeanRow> {
        self.rows
            .iter()
            .find(|r| matches!(&r.label, GroupLabel::Term(t) if t == term))
    }

    /// Reshape into one entry per (label, metric): labels in row order,
    /// metrics in [`Metric::ALL`] order.
    pub fn to_long(&self) -> Vec<MeanPoint> {
        self.rows
            .iter()
            .flat_map(|row| {
                Metric::ALL.into_iter().map(move |metric| MeanPoint {
                    label: row.label.clone(),
                    metric,
                    value: row.mean(metric),
                })
            })
            .collect()
    }
}

/// Metric × term matrix of raw per-term means.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricMatrix {
    /// Column headers, in input order.
    pub terms: Vec<String>,
    /// Row headers, always [`Metric::ALL`].
    pub metrics: Vec<Metric>,
    /// `values[metric_row][term_col]`.
    pub values: Vec<Vec<Option<f64>>>,
}

impl MetricMatrix {
    pub fn get(&self, metric: Metric, term_col: usize) -> Option<f64> {
        self.values
            .get(metric.index())
            .and_then(|row| row.get(term_col).copied().flatten())
    }

    /// Smallest and largest defined cell, for the colour scale.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .flatten()
            .flatten()
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Everything the presentation layer needs for one set of search terms.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardTables {
    pub terms: SearchTerms,
    pub daily_share: Vec<DailyShareRow>,
    pub counts: TermCounts,
    pub means: MeanMetrics,
    pub mean_points: Vec<MeanPoint>,
    pub matrix: Option<MetricMatrix>,
}

impl DashboardTables {
    /// True when the time series has nothing to plot.
    pub fn no_share_data(&self) -> bool {
        self.daily_share.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run matching once and derive every output table from the shared masks.
///
/// Pure: the table is only read and identical inputs give identical outputs.
pub fn run_pipeline(table: &ArticleTable, terms: &SearchTerms) -> DashboardTables {
    let matches = TermMatches::compute(table, terms);
    let means = mean_metrics(table, &matches);

    DashboardTables {
        terms: terms.clone(),
        daily_share: daily_share(table, &matches),
        counts: term_counts(&matches),
        mean_points: means.to_long(),
        matrix: metric_matrix(&matches, &means),
        means,
    }
}

/// Daily share of each term's matches among all articles of that day.
///
/// Dates come from the data only. Empty when no term matched anything.
pub fn daily_share(table: &ArticleTable, matches: &TermMatches) -> Vec<DailyShareRow> {
    if !matches.any_term_matched() {
        return Vec::new();
    }

    let mut totals: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for article in table.articles() {
        *totals.entry(article.date).or_default() += 1;
    }

    let mut rows = Vec::with_capacity(totals.len() * matches.per_term.len());
    for (term, mask) in &matches.per_term {
        let mut matched_per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for (article, _) in table.articles().iter().zip(mask).filter(|&(_, &m)| m) {
            *matched_per_day.entry(article.date).or_default() += 1;
        }

        for (&date, &total) in &totals {
            let matched = matched_per_day.get(&date).copied().unwrap_or(0);
            rows.push(DailyShareRow {
                date,
                term: term.clone(),
                percentage: percentage(matched, total),
                matched,
                total,
            });
        }
    }
    rows
}

/// `matched / total * 100`, with `0 / 0` defined as 0.
fn percentage(matched: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        matched as f64 / total as f64 * 100.0
    }
}

pub fn term_counts(matches: &TermMatches) -> TermCounts {
    TermCounts {
        per_term: matches
            .per_term
            .iter()
            .map(|(term, mask)| (term.clone(), count(mask)))
            .collect(),
        complement: count(&matches.complement),
    }
}

/// Per-term and complement means. Empty groups produce no row, and a
/// repeated term yields a single row.
pub fn mean_metrics(table: &ArticleTable, matches: &TermMatches) -> MeanMetrics {
    let groups = matches
        .per_term
        .iter()
        .map(|(term, mask)| (GroupLabel::Term(term.clone()), mask))
        .chain(std::iter::once((GroupLabel::Complement, &matches.complement)));

    let mut rows: Vec<MeanRow> = Vec::new();
    for (label, mask) in groups {
        let articles = count(mask);
        if articles == 0 || rows.iter().any(|r| r.label == label) {
            continue;
        }
        rows.push(MeanRow {
            label,
            articles,
            means: group_means(table, mask),
        });
    }

    MeanMetrics { rows }
}

/// Mean of each metric over the masked rows, skipping missing values.
fn group_means(table: &ArticleTable, mask: &[bool]) -> [Option<f64>; Metric::COUNT] {
    let mut sums = [0.0_f64; Metric::COUNT];
    let mut counts = [0_usize; Metric::COUNT];

    for (article, _) in table.articles().iter().zip(mask).filter(|&(_, &m)| m) {
        for metric in Metric::ALL {
            if let Some(v) = article.metric(metric) {
                sums[metric.index()] += v;
                counts[metric.index()] += 1;
            }
        }
    }

    let mut means = [None; Metric::COUNT];
    for i in 0..Metric::COUNT {
        if counts[i] > 0 {
            means[i] = Some(round2(sums[i] / counts[i] as f64));
        }
    }
    means
}

/// Two decimals, ties to even.
fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

/// Metric × term matrix of the per-term means.
///
/// Only built for two or more terms that all matched something.
pub fn metric_matrix(matches: &TermMatches, means: &MeanMetrics) -> Option<MetricMatrix> {
    if matches.per_term.len() < 2 || !matches.all_terms_matched() {
        return None;
    }

    let columns: Vec<&MeanRow> = matches
        .per_term
        .iter()
        .map(|(term, _)| means.term_row(term))
        .collect::<Option<_>>()?;

    let values = Metric::ALL
        .into_iter()
        .map(|metric| columns.iter().map(|row| row.mean(metric)).collect())
        .collect();

    Some(MetricMatrix {
        terms: matches.per_term.iter().map(|(t, _)| t.clone()).collect(),
        metrics: Metric::ALL.to_vec(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Article, MetricValues};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn article(d: u32, text: &str, metrics: MetricValues) -> Article {
        Article {
            date: day(d),
            text: Some(text.to_string()),
            fulltext: None,
            metrics,
        }
    }

    fn uniform(v: f64) -> MetricValues {
        [Some(v); Metric::COUNT]
    }

    fn scenario_table() -> ArticleTable {
        ArticleTable::new(vec![
            article(1, "grüne Energie", uniform(10.0)),
            article(1, "Klimawandel", uniform(20.0)),
            article(2, "Sport", uniform(30.0)),
        ])
    }

    fn terms(input: &str) -> SearchTerms {
        SearchTerms::parse(input).unwrap()
    }

    #[test]
    fn two_term_scenario() {
        let out = run_pipeline(&scenario_table(), &terms("grün, Klima"));

        let share: Vec<(NaiveDate, &str, f64, usize, usize)> = out
            .daily_share
            .iter()
            .map(|r| (r.date, r.term.as_str(), r.percentage, r.matched, r.total))
            .collect();
        assert_eq!(
            share,
            vec![
                (day(1), "grün", 50.0, 1, 2),
                (day(2), "grün", 0.0, 0, 1),
                (day(1), "Klima", 50.0, 1, 2),
                (day(2), "Klima", 0.0, 0, 1),
            ]
        );

        assert_eq!(
            out.counts,
            TermCounts {
                per_term: vec![("grün".to_string(), 1), ("Klima".to_string(), 1)],
                complement: 1,
            }
        );

        let labels: Vec<GroupLabel> = out.means.rows.iter().map(|r| r.label.clone()).collect();
        assert_eq!(
            labels,
            vec![
                GroupLabel::Term("grün".to_string()),
                GroupLabel::Term("Klima".to_string()),
                GroupLabel::Complement,
            ]
        );
        let complement = out.means.row(&GroupLabel::Complement).unwrap();
        assert_eq!(complement.articles, 1);
        assert_eq!(complement.mean(Metric::Like), Some(30.0));

        let matrix = out.matrix.expect("two matched terms produce a matrix");
        assert_eq!(matrix.values.len(), Metric::COUNT);
        assert!(matrix.values.iter().all(|row| row.len() == 2));
        assert_eq!(matrix.get(Metric::Shares, 0), Some(10.0));
        assert_eq!(matrix.get(Metric::Shares, 1), Some(20.0));
        assert_eq!(matrix.value_range(), Some((10.0, 20.0)));
    }

    #[test]
    fn unmatched_single_term() {
        let out = run_pipeline(&scenario_table(), &terms("xyz-nomatch"));

        assert!(out.no_share_data());
        assert!(out.daily_share.iter().all(|r| r.percentage == 0.0));
        assert!(out.means.term_row("xyz-nomatch").is_none());
        assert_eq!(out.means.rows.len(), 1);
        assert_eq!(out.means.rows[0].label, GroupLabel::Complement);
        assert_eq!(out.counts.per_term, vec![("xyz-nomatch".to_string(), 0)]);
        assert_eq!(out.counts.complement, 3);
        assert!(out.matrix.is_none());
    }

    #[test]
    fn unmatched_term_among_matched_ones() {
        let out = run_pipeline(&scenario_table(), &terms("Sport, xyz-nomatch"));

        let zero_rows: Vec<&DailyShareRow> = out
            .daily_share
            .iter()
            .filter(|r| r.term == "xyz-nomatch")
            .collect();
        assert_eq!(zero_rows.len(), 2);
        assert!(zero_rows.iter().all(|r| r.percentage == 0.0 && r.matched == 0));

        assert!(out.means.term_row("xyz-nomatch").is_none());
        assert!(out.means.term_row("Sport").is_some());
        assert!(out.matrix.is_none());
    }

    #[test]
    fn single_matched_term_has_no_matrix() {
        let out = run_pipeline(&scenario_table(), &terms("Klima"));
        assert!(out.matrix.is_none());
        assert_eq!(out.means.rows.len(), 2);
    }

    #[test]
    fn complement_row_absent_when_everything_matches() {
        let out = run_pipeline(&scenario_table(), &terms("grün, Klima, Sport"));
        assert_eq!(out.counts.complement, 0);
        assert!(out.means.row(&GroupLabel::Complement).is_none());
    }

    #[test]
    fn means_skip_missing_and_round() {
        let mut a = uniform(1.0);
        a[Metric::Wow.index()] = None;
        let mut b = uniform(2.0);
        b[Metric::Wow.index()] = None;
        b[Metric::Love.index()] = Some(2.34);
        let mut c = [None; Metric::COUNT];
        c[Metric::Like.index()] = Some(4.0);

        let table = ArticleTable::new(vec![
            article(1, "Klima a", a),
            article(1, "Klima b", b),
            article(2, "Klima c", c),
        ]);
        let out = run_pipeline(&table, &terms("Klima"));
        let row = out.means.term_row("Klima").unwrap();

        assert_eq!(row.articles, 3);
        assert_eq!(row.mean(Metric::Like), Some(2.33));
        assert_eq!(row.mean(Metric::Haha), Some(1.5));
        assert_eq!(row.mean(Metric::Love), Some(1.67));
        assert_eq!(row.mean(Metric::Wow), None);
    }

    #[test]
    fn rounding_ties_go_to_even() {
        // 1/8 = 0.125 and 3/8 = 0.375 sit exactly on a tie.
        let mut rows: Vec<Article> = (0..8)
            .map(|_| {
                let mut m = uniform(0.0);
                m[Metric::Shares.index()] = Some(1.0);
                article(1, "Klima", m)
            })
            .collect();
        rows[0].metrics[Metric::Like.index()] = Some(1.0);
        rows[0].metrics[Metric::Wow.index()] = Some(3.0);

        let out = run_pipeline(&ArticleTable::new(rows), &terms("Klima"));
        let row = out.means.term_row("Klima").unwrap();
        assert_eq!(row.mean(Metric::Like), Some(0.12));
        assert_eq!(row.mean(Metric::Wow), Some(0.38));
        assert_eq!(row.mean(Metric::Shares), Some(1.0));

        assert_eq!(round2(2.345_678), 2.35);
        assert_eq!(round2(-0.125), -0.12);
    }

    #[test]
    fn repeated_term_has_one_mean_row() {
        let out = run_pipeline(&scenario_table(), &terms("Klima, Klima"));

        assert_eq!(out.counts.per_term.len(), 2);
        let labels: Vec<GroupLabel> = out.means.rows.iter().map(|r| r.label.clone()).collect();
        assert_eq!(
            labels,
            vec![GroupLabel::Term("Klima".to_string()), GroupLabel::Complement]
        );
        assert_eq!(out.mean_points.len(), 2 * Metric::COUNT);

        let matrix = out.matrix.expect("both columns resolve to the shared row");
        assert_eq!(matrix.get(Metric::Like, 0), matrix.get(Metric::Like, 1));
    }

    #[test]
    fn long_form_is_labels_then_metrics() {
        let out = run_pipeline(&scenario_table(), &terms("grün, Klima"));
        assert_eq!(out.mean_points.len(), 3 * Metric::COUNT);

        let first = &out.mean_points[0];
        assert_eq!(first.label, GroupLabel::Term("grün".to_string()));
        assert_eq!(first.metric, Metric::Haha);
        assert_eq!(first.value, Some(10.0));

        let last = out.mean_points.last().unwrap();
        assert_eq!(last.label, GroupLabel::Complement);
        assert_eq!(last.metric, Metric::Comments);
        assert_eq!(last.value, Some(30.0));
    }

    #[test]
    fn overlapping_matches_count_for_each_term() {
        let table = ArticleTable::new(vec![
            article(1, "Klima und Energie", uniform(1.0)),
            article(1, "Sport", uniform(1.0)),
        ]);
        let out = run_pipeline(&table, &terms("Klima, Energie"));
        let total: f64 = out
            .daily_share
            .iter()
            .filter(|r| r.date == day(1))
            .map(|r| r.percentage)
            .sum();
        assert_eq!(total, 100.0);
    }

    #[test]
    fn percentages_are_bounded_and_dates_come_from_data() {
        let table = ArticleTable::new(vec![
            article(1, "Klima", uniform(1.0)),
            article(3, "Klima Klima", uniform(1.0)),
            article(3, "Sport", uniform(1.0)),
            article(7, "nichts", uniform(1.0)),
        ]);
        let out = run_pipeline(&table, &terms("Klima, Sport, i"));

        assert!(out
            .daily_share
            .iter()
            .all(|r| (0.0..=100.0).contains(&r.percentage)));
        let dates: std::collections::BTreeSet<NaiveDate> =
            out.daily_share.iter().map(|r| r.date).collect();
        assert_eq!(dates, table.dates());
        assert!(!dates.contains(&day(2)));
    }

    #[test]
    fn pipeline_is_idempotent() {
        let table = scenario_table();
        let t = terms("grün, Klima, Sport");
        let first = run_pipeline(&table, &t);
        let second = run_pipeline(&table, &t);
        assert_eq!(first, second);
        assert_eq!(table, scenario_table());
    }

    #[test]
    fn zero_total_gives_zero_percentage() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
    }
}
