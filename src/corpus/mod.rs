pub mod term;
pub mod vocabulary;

use ndarray::{Array1, Array2, Axis, Zip};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::corpus::{term::TermFrequency, vocabulary::Vocabulary};
use crate::error::{ensure_dim, Result};

/// Term-document count matrix
///
/// - `counts[[i, j]]`: occurrences of vocabulary term `i` in document `j` (`W x D`)
/// - `doc_len[j]`: total token count of document `j`
/// - `keys[j]`: document identifier
///
/// Built once per collection and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountMatrix {
    counts: Array2<f64>,
    doc_len: Array1<f64>,
    keys: Vec<String>,
}

impl CountMatrix {
    /// Wrap prepared arrays, checking that the declared dimensions agree
    pub fn new(counts: Array2<f64>, doc_len: Array1<f64>, keys: Vec<String>) -> Result<Self> {
        ensure_dim("document lengths", counts.ncols(), doc_len.len())?;
        ensure_dim("document keys", counts.ncols(), keys.len())?;
        Ok(Self { counts, doc_len, keys })
    }

    /// Count every vocabulary term in every document.
    /// Tokens outside the vocabulary still count toward the document length.
    pub fn from_documents<K>(vocab: &Vocabulary, docs: &[(K, TermFrequency)]) -> Self
    where
        K: AsRef<str> + Sync,
    {
        let mut counts = Array2::<f64>::zeros((vocab.len(), docs.len()));
        counts
            .axis_iter_mut(Axis(1))
            .into_par_iter()
            .zip(docs.par_iter())
            .for_each(|(mut column, (_, freq))| {
                for (term, count) in freq.iter() {
                    if let Some(idx) = vocab.index_of(term) {
                        column[idx] = count as f64;
                    }
                }
            });
        let doc_len = docs.iter().map(|(_, freq)| freq.term_sum() as f64).collect::<Array1<f64>>();
        let keys = docs.iter().map(|(key, _)| key.as_ref().to_string()).collect();
        Self { counts, doc_len, keys }
    }

    #[inline]
    pub fn counts(&self) -> &Array2<f64> {
        &self.counts
    }

    #[inline]
    pub fn doc_len(&self) -> &Array1<f64> {
        &self.doc_len
    }

    #[inline]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Vocabulary size `W`
    #[inline]
    pub fn word_num(&self) -> usize {
        self.counts.nrows()
    }

    /// Document count `D`
    #[inline]
    pub fn doc_num(&self) -> usize {
        self.counts.ncols()
    }

    /// `Σ_i C[i, j]` for every document
    pub fn column_totals(&self) -> Array1<f64> {
        self.counts.sum_axis(Axis(0))
    }

    /// Empirical term model `P(w|d) = C[i, j] / len[j]`.
    /// A document of length zero gets an all-zero column.
    pub fn term_model(&self) -> Array2<f64> {
        let mut model = self.counts.clone();
        Zip::from(model.columns_mut())
            .and(&self.doc_len)
            .par_for_each(|mut column, &len| {
                if len != 0.0 {
                    column.mapv_inplace(|c| c / len);
                } else {
                    column.fill(0.0);
                }
            });
        model
    }
}
