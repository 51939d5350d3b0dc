pub mod folding;
pub mod matrix;
pub mod posterior;
pub mod snapshot;
pub mod trainer;

pub use matrix::is_column_stochastic;
pub use trainer::log_likelihood;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::corpus::vocabulary::Vocabulary;

/// Trained PLSA parameters
///
/// Produced by `EmTrainer`, then shared read-only with `FoldingIn`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicModel {
    /// `P(w|t)`, `W x T`, each column a distribution over words
    pub word_topic: Array2<f64>,
    /// `P(t|d)`, `T x D`, each column a distribution over topics
    pub doc_topic: Array2<f64>,
    /// evidence `Z(w,d)` of the last E-step, `W x D`
    pub den: Array2<f64>,
    /// log-likelihood entering each epoch
    pub log_likelihood: Vec<f64>,
}

impl TopicModel {
    #[inline]
    pub fn word_num(&self) -> usize {
        self.word_topic.nrows()
    }

    #[inline]
    pub fn topic_num(&self) -> usize {
        self.word_topic.ncols()
    }

    #[inline]
    pub fn doc_num(&self) -> usize {
        self.doc_topic.ncols()
    }

    /// The `n` most probable terms of `topic`, highest first.
    /// Ties keep vocabulary order.
    pub fn top_words<'v>(
        &self,
        topic: usize,
        vocab: &'v Vocabulary,
        n: usize,
    ) -> Vec<(&'v str, f64)> {
        if topic >= self.topic_num() {
            return Vec::new();
        }
        let mut words: Vec<(&str, f64)> = self
            .word_topic
            .column(topic)
            .iter()
            .enumerate()
            .filter_map(|(i, &p)| vocab.term(i).map(|term| (term, p)))
            .collect();
        words.sort_by(|a, b| b.1.total_cmp(&a.1));
        words.truncate(n);
        words
    }
}

/// Folded-in test side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldedModel {
    /// `P(t|d')`, `T x D'`
    pub doc_topic: Array2<f64>,
    /// evidence `den'(w,d') = Σ_t P(w|t) P(t|d')` of the last E-step, `W x D'`
    pub den: Array2<f64>,
    /// log-likelihood entering each epoch
    pub log_likelihood: Vec<f64>,
}

impl FoldedModel {
    #[inline]
    pub fn doc_num(&self) -> usize {
        self.doc_topic.ncols()
    }
}
