use std::{cmp::Ordering, fmt::Debug};

use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::PlsaConfig;
use crate::corpus::{vocabulary::Vocabulary, CountMatrix};
use crate::error::{ensure_dim, Result};
use crate::model::FoldedModel;
use crate::rank::{background::BackgroundModel, query::Query};

/// Query likelihood ranker
///
/// Per query term `w` found in the vocabulary and per document `d`:
/// `log(α·P(w|d) + β·den(w,d) + (1-α-β)·P_bg(w))`, summed over the query.
/// - `P(w|d)`: empirical term model of the test document
/// - `den(w,d)`: topic mixture evidence left by folding-in
/// - `P_bg(w)`: background model probability
///
/// Terms outside the vocabulary contribute nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryLikelihood {
    pub alpha: f64,
    pub beta: f64,
}

impl Default for QueryLikelihood {
    fn default() -> Self {
        Self { alpha: 0.1, beta: 0.8 }
    }
}

impl QueryLikelihood {
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        PlsaConfig::default().weights(alpha, beta).validate()?;
        Ok(Self { alpha, beta })
    }

    pub fn from_config(config: &PlsaConfig) -> Result<Self> {
        Self::new(config.alpha, config.beta)
    }

    /// Weight of the background model
    #[inline]
    pub fn background_weight(&self) -> f64 {
        1.0 - self.alpha - self.beta
    }

    /// Resolve the scored occurrences of a query: `(vocabulary index, weighted background)`.
    /// Terms without a background entry are skipped with one warning per query.
    fn resolve(
        &self,
        query: &Query,
        vocab: &Vocabulary,
        background: &BackgroundModel,
    ) -> Vec<(usize, f64)> {
        let gamma = self.background_weight();
        let mut resolved = Vec::with_capacity(query.len());
        let mut missing = Vec::new();
        for term in &query.terms {
            // first vocabulary match only, vocabulary entries are unique
            if let Some(idx) = vocab.index_of(term) {
                match background.prob(term) {
                    Some(bg) => resolved.push((idx, gamma * bg)),
                    None => missing.push(term.as_str()),
                }
            }
        }
        if !missing.is_empty() {
            warn!(query = %query.key, ?missing, "terms without background entry skipped");
        }
        resolved
    }

    /// Score every (query, document) pair
    ///
    /// # Arguments
    /// * `vocab` - vocabulary indexing the matrix rows
    /// * `counts` - test counts `C'` and lengths
    /// * `folded` - folding-in output providing `den'`
    /// * `background` - background model
    /// * `queries` - queries to score
    pub fn score(
        &self,
        vocab: &Vocabulary,
        counts: &CountMatrix,
        folded: &FoldedModel,
        background: &BackgroundModel,
        queries: &[Query],
    ) -> Result<ScoreTable> {
        ensure_dim("test counts rows", vocab.len(), counts.word_num())?;
        ensure_dim("den' rows", vocab.len(), folded.den.nrows())?;
        ensure_dim("den' documents", counts.doc_num(), folded.den.ncols())?;

        info!(queries = queries.len(), docs = counts.doc_num(), "ranking");

        let term_model = counts.term_model();
        let den = &folded.den;
        let mut scores = Array2::<f64>::zeros((queries.len(), counts.doc_num()));
        for (mut row, query) in scores.axis_iter_mut(Axis(0)).zip(queries) {
            let resolved = self.resolve(query, vocab, background);
            let doc_scores: Vec<f64> = (0..counts.doc_num())
                .into_par_iter()
                .map(|j| {
                    resolved
                        .iter()
                        .map(|&(idx, bg)| {
                            let topic = self.beta * den[[idx, j]];
                            (self.alpha * term_model[[idx, j]] + topic + bg).ln()
                        })
                        .sum::<f64>()
                })
                .collect();
            row.assign(&Array1::from(doc_scores));
        }

        Ok(ScoreTable {
            scores,
            query_keys: queries.iter().map(|q| q.key.clone()).collect(),
            doc_keys: counts.keys().to_vec(),
        })
    }
}

/// Accumulated log-scores, one row per query and one column per document
#[derive(Debug, Clone)]
pub struct ScoreTable {
    pub scores: Array2<f64>,
    pub query_keys: Vec<String>,
    pub doc_keys: Vec<String>,
}

/// Ranked documents of a single query
#[derive(Debug, Clone)]
pub struct Ranking {
    pub query: String,
    pub hits: Hits<String>,
}

impl ScoreTable {
    #[inline]
    pub fn score(&self, query: usize, doc: usize) -> f64 {
        self.scores[[query, doc]]
    }

    /// Hits of query `q` in document order, unsorted
    pub fn hits(&self, q: usize) -> Hits<String> {
        let list = self
            .scores
            .row(q)
            .iter()
            .zip(&self.doc_keys)
            .map(|(&score, key)| (key.clone(), score))
            .collect();
        Hits::new(list)
    }

    /// Every query with its documents sorted by descending score
    pub fn rankings(&self) -> Vec<Ranking> {
        (0..self.query_keys.len())
            .map(|q| {
                let mut hits = self.hits(q);
                hits.sort_by_score();
                Ranking {
                    query: self.query_keys[q].clone(),
                    hits,
                }
            })
            .collect()
    }
}

/// Structure to store search results
pub struct Hits<K> {
    /// (Document ID, Score)
    pub list: Vec<(K, f64)>,
}

/// descending, NaN last, equal scores keep their order
#[inline]
fn score_desc(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => Ordering::Equal,
    }
}

impl<K> Hits<K> {
    pub fn new(list: Vec<(K, f64)>) -> Self {
        Hits { list }
    }

    /// Sort by descending score.
    /// Stable: documents with equal scores keep their relative order.
    pub fn sort_by_score(&mut self) -> &mut Self {
        self.list.sort_by(|a, b| score_desc(a.1, b.1));
        self
    }

    /// Document keys in current order
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.list.iter().map(|(k, _)| k)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

impl<K: Clone> Clone for Hits<K> {
    fn clone(&self) -> Self {
        Hits { list: self.list.clone() }
    }
}

impl<K> Debug for Hits<K>
where
    K: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            // one hit per line
            writeln!(f, "Hits [")?;
            for (key, score) in &self.list {
                writeln!(f, "    {:?}: {:.6}", key, score)?;
            }
            write!(f, "]")
        } else {
            f.debug_list().entries(&self.list).finish()
        }
    }
}
