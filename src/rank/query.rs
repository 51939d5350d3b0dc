use serde::{Deserialize, Serialize};

/// A query: identifier plus its terms in order.
/// Repeated terms are kept, every occurrence is scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub key: String,
    pub terms: Vec<String>,
}

impl Query {
    pub fn new<K, T>(key: K, terms: &[T]) -> Self
    where
        K: Into<String>,
        T: AsRef<str>,
    {
        Self {
            key: key.into(),
            terms: terms.iter().map(|t| t.as_ref().to_string()).collect(),
        }
    }

    /// Whitespace tokenized query text
    pub fn from_text<K: Into<String>>(key: K, text: &str) -> Self {
        Self {
            key: key.into(),
            terms: text.split_whitespace().map(str::to_string).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
