use super::model::{Article, ArticleTable};
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Search terms
// ---------------------------------------------------------------------------

/// Ordered, non-empty list of trimmed search terms.
///
/// Duplicates are kept: each entry has its own count and matrix column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerms(Vec<String>);

impl SearchTerms {
    /// Split a comma-separated input field into terms.
    pub fn parse(input: &str) -> Result<Self, PipelineError> {
        Self::new(input.split(','))
    }

    /// Trim every entry and drop the blank ones.
    pub fn new<I, S>(terms: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms: Vec<String> = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            return Err(PipelineError::NoSearchTerms);
        }
        Ok(SearchTerms(terms))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<'a> IntoIterator for &'a SearchTerms {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// Term matching
// ---------------------------------------------------------------------------

/// Case-insensitive substring test against the short and the full text.
/// `needle` must already be lower-cased. Missing text counts as "".
fn matches_lowered(article: &Article, needle: &str) -> bool {
    article.text_or_empty().to_lowercase().contains(needle)
        || article.fulltext_or_empty().to_lowercase().contains(needle)
}

/// Whether `term` occurs in the article's short or full text, ignoring case.
pub fn matches_term(article: &Article, term: &str) -> bool {
    matches_lowered(article, &term.to_lowercase())
}

/// One flag per article: does it match `term`?
pub fn match_mask(table: &ArticleTable, term: &str) -> Vec<bool> {
    let needle = term.to_lowercase();
    table
        .articles()
        .iter()
        .map(|a| matches_lowered(a, &needle))
        .collect()
}

/// Match masks for every search term plus the complement (articles that
/// match none of them).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermMatches {
    /// `(term, mask)` in input order.
    pub per_term: Vec<(String, Vec<bool>)>,
    pub complement: Vec<bool>,
}

impl TermMatches {
    pub fn compute(table: &ArticleTable, terms: &SearchTerms) -> Self {
        let per_term: Vec<(String, Vec<bool>)> = terms
            .iter()
            .map(|t| (t.clone(), match_mask(table, t)))
            .collect();

        let complement = (0..table.len())
            .map(|i| per_term.iter().all(|(_, mask)| !mask[i]))
            .collect();

        for (term, mask) in &per_term {
            log::debug!(
                "term '{term}' matches {} of {} articles",
                count(mask),
                table.len()
            );
        }

        TermMatches {
            per_term,
            complement,
        }
    }

    /// Whether every term matched at least one article.
    pub fn all_terms_matched(&self) -> bool {
        self.per_term.iter().all(|(_, mask)| mask.contains(&true))
    }

    /// Whether any term matched any article.
    pub fn any_term_matched(&self) -> bool {
        self.per_term.iter().any(|(_, mask)| mask.contains(&true))
    }
}

/// Number of set flags in a mask.
pub fn count(mask: &[bool]) -> usize {
    mask.iter().filter(|&&m| m).count()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::model::Metric;

    fn article(text: Option<&str>, fulltext: Option<&str>) -> Article {
        Article {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            text: text.map(str::to_string),
            fulltext: fulltext.map(str::to_string),
            metrics: [None; Metric::COUNT],
        }
    }

    #[test]
    fn parse_trims_and_drops_blank_terms() {
        let terms = SearchTerms::parse(" grün, ,Klima ,, Energie").unwrap();
        assert_eq!(terms.as_slice(), ["grün", "Klima", "Energie"]);

        let dup = SearchTerms::parse("Klima,Klima").unwrap();
        assert_eq!(dup.len(), 2);
    }

    #[test]
    fn blank_input_is_rejected() {
        assert_eq!(SearchTerms::parse(""), Err(PipelineError::NoSearchTerms));
        assert_eq!(SearchTerms::parse(" ,  , "), Err(PipelineError::NoSearchTerms));
        assert_eq!(
            SearchTerms::new(Vec::<String>::new()),
            Err(PipelineError::NoSearchTerms)
        );
    }

    #[test]
    fn matching_ignores_case_and_checks_both_fields() {
        let a = article(Some("Grüne Energie"), None);
        assert!(matches_term(&a, "grün"));
        assert!(matches_term(&a, "ENERGIE"));
        assert!(!matches_term(&a, "Klima"));

        let b = article(None, Some("Der Klimawandel"));
        assert!(matches_term(&b, "klima"));

        let c = article(None, None);
        assert!(!matches_term(&c, "klima"));
    }

    #[test]
    fn complement_excludes_any_match() {
        let table = ArticleTable::new(vec![
            article(Some("grüne Energie"), None),
            article(Some("Klimawandel"), None),
            article(Some("Sport"), None),
            article(Some("Klima und grün"), None),
        ]);
        let terms = SearchTerms::parse("grün, Klima").unwrap();
        let matches = TermMatches::compute(&table, &terms);

        assert_eq!(matches.per_term[0].1, vec![true, false, false, true]);
        assert_eq!(matches.per_term[1].1, vec![false, true, false, true]);
        assert_eq!(matches.complement, vec![false, false, true, false]);
        assert!(matches.all_terms_matched());

        let none = TermMatches::compute(&table, &SearchTerms::parse("xyz-nomatch").unwrap());
        assert!(!none.any_term_matched());
        assert_eq!(count(&none.complement), 4);
    }
}
