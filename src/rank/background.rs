use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Background language model
/// Log-probabilities of terms under a large reference corpus, one row per record
/// in file order. A numeric term is its own row index; any other term is looked
/// up by the identifier written in its record.
/// Read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackgroundModel {
    rows: Vec<f64>,
    /// first field of each record -> row, for non-numeric terms
    #[serde(with = "indexmap::map::serde_seq")]
    names: IndexMap<Box<str>, usize>,
}

impl BackgroundModel {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            names: IndexMap::new(),
        }
    }

    /// Build from `(term, log_prob)` records, in file order
    pub fn from_records<I, T>(records: I) -> Self
    where
        I: IntoIterator<Item = (T, f64)>,
        T: AsRef<str>,
    {
        let mut model = Self::new();
        for (term, log_prob) in records {
            model.push(term.as_ref(), log_prob);
        }
        model
    }

    /// Append the next record as a new row
    #[inline]
    pub fn push(&mut self, term: &str, log_prob: f64) {
        self.names.insert(Box::from(term), self.rows.len());
        self.rows.push(log_prob);
    }

    /// Row index of `term`: the parsed number, or the row of its record
    #[inline]
    fn row_of(&self, term: &str) -> Option<usize> {
        match term.parse::<usize>() {
            Ok(row) => Some(row),
            Err(_) => self.names.get(term).copied(),
        }
    }

    /// `log P_bg(term)`
    #[inline]
    pub fn log_prob(&self, term: &str) -> Option<f64> {
        self.row_of(term).and_then(|row| self.rows.get(row).copied())
    }

    /// `P_bg(term)`
    #[inline]
    pub fn prob(&self, term: &str) -> Option<f64> {
        self.log_prob(term).map(f64::exp)
    }

    /// Number of rows
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
