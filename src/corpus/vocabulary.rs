use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::corpus::term::TermFrequency;

/// Ordered, deduplicated set of terms.
/// A term's position is its row in every `W x _` matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: IndexSet<Box<str>>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self { terms: IndexSet::new() }
    }

    /// Insert a term, returning its index.
    /// An already known term keeps its first index.
    #[inline]
    pub fn insert(&mut self, term: &str) -> usize {
        if let Some(idx) = self.terms.get_index_of(term) {
            return idx;
        }
        self.terms.insert_full(Box::from(term)).0
    }

    /// Insert every distinct term of a document, in first-seen order
    pub fn extend_from_freq(&mut self, freq: &TermFrequency) -> &mut Self {
        for term in freq.terms() {
            self.insert(term);
        }
        self
    }

    pub fn extend_from_terms<T>(&mut self, terms: &[T]) -> &mut Self
    where
        T: AsRef<str>,
    {
        for term in terms {
            self.insert(term.as_ref());
        }
        self
    }

    /// Index of `term`, `None` if it is not part of the vocabulary
    #[inline]
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.terms.get_index_of(term)
    }

    #[inline]
    pub fn term(&self, idx: usize) -> Option<&str> {
        self.terms.get_index(idx).map(|t| t.as_ref())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.as_ref())
    }
}
