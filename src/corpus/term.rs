use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// TermFrequency
/// Counts how often each term occurs in a single document.
///
/// Terms keep their first-seen order, and the total number of tokens
/// (the document length) is tracked alongside the counts.
///
/// # Examples
/// ```
/// use plsa_retrieval::TermFrequency;
/// let mut freq = TermFrequency::new();
/// freq.add_terms(&["dog", "fish", "fish"]);
/// assert_eq!(freq.term_count("fish"), 2);
/// assert_eq!(freq.term_sum(), 3);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TermFrequency {
    #[serde(with = "indexmap::map::serde_seq")]
    term_count: IndexMap<String, u32>,
    total_term_count: u64,
}

/// add / count
impl TermFrequency {
    pub fn new() -> Self {
        TermFrequency {
            term_count: IndexMap::new(),
            total_term_count: 0,
        }
    }

    /// Build from a whitespace separated line
    pub fn from_text(text: &str) -> Self {
        let mut freq = Self::new();
        for term in text.split_whitespace() {
            freq.add_term(term);
        }
        freq
    }

    /// Add one occurrence of a term
    ///
    /// # Arguments
    /// * `term` - term to add
    #[inline]
    pub fn add_term(&mut self, term: &str) -> &mut Self {
        if let Some(count) = self.term_count.get_mut(term) {
            *count += 1;
        } else {
            self.term_count.insert(term.to_string(), 1);
        }
        self.total_term_count += 1;
        self
    }

    /// Add several terms
    ///
    /// # Arguments
    /// * `terms` - slice of terms
    #[inline]
    pub fn add_terms<T>(&mut self, terms: &[T]) -> &mut Self
    where
        T: AsRef<str>,
    {
        for term in terms {
            self.add_term(term.as_ref());
        }
        self
    }

    /// Occurrences of `term`, 0 if absent
    #[inline]
    pub fn term_count(&self, term: &str) -> u32 {
        self.term_count.get(term).copied().unwrap_or(0)
    }

    /// Total number of tokens added
    #[inline]
    pub fn term_sum(&self) -> u64 {
        self.total_term_count
    }

    /// Number of distinct terms
    #[inline]
    pub fn term_num(&self) -> usize {
        self.term_count.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_term_count == 0
    }

    /// Distinct terms in first-seen order
    #[inline]
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.term_count.keys().map(|t| t.as_str())
    }

    /// (term, count) pairs in first-seen order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.term_count.iter().map(|(t, &c)| (t.as_str(), c))
    }
}

impl<T: AsRef<str>> FromIterator<T> for TermFrequency {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut freq = TermFrequency::new();
        for term in iter {
            freq.add_term(term.as_ref());
        }
        freq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_total() {
        let mut freq = TermFrequency::new();
        freq.add_terms(&["a", "b", "a", "c", "a"]);
        assert_eq!(freq.term_count("a"), 3);
        assert_eq!(freq.term_count("b"), 1);
        assert_eq!(freq.term_count("z"), 0);
        assert_eq!(freq.term_sum(), 5);
        assert_eq!(freq.term_num(), 3);
    }

    #[test]
    fn keeps_first_seen_order() {
        let freq = TermFrequency::from_text("  dog fish\tcat fish dog ");
        let terms: Vec<&str> = freq.terms().collect();
        assert_eq!(terms, vec!["dog", "fish", "cat"]);
        assert_eq!(freq.term_sum(), 5);
    }

    #[test]
    fn collects_from_iterator() {
        let freq: TermFrequency = ["x", "y", "x"].iter().collect();
        assert!(!freq.is_empty());
        assert_eq!(freq.term_count("x"), 2);
        assert_eq!(freq.term_num(), 2);
        assert!(TermFrequency::new().is_empty());
    }
}
