use ndarray::{Array1, Array2, Zip};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::corpus::CountMatrix;
use crate::error::{ensure_dim, PlsaError, Result};
use crate::model::matrix::{divide_columns, normalize_columns, random_stochastic};
use crate::model::TopicModel;

/// Outcome of one synchronous E/M pass
pub(crate) struct Epoch {
    /// updated `P(t|d)`, `T x D`
    pub doc_topic: Array2<f64>,
    /// updated `P(w|t)`, `W x T`; `None` when the topic-word side is frozen
    pub word_topic: Option<Array2<f64>>,
    /// evidence `Z(w,d)` of the E-step, `W x D`
    pub den: Array2<f64>,
    /// data log-likelihood of the parameters that entered the epoch
    pub log_likelihood: f64,
}

/// One E-step plus the M-step sums, in matrix form.
///
/// With `R[i,j] = C[i,j] / Z(i,j)` (0 where `Z` is 0) the posterior weighted counts are
/// - `Σ_j C[i,j] P(t|w_i,d_j) = P(w_i|t) · (R · P(t|d)ᵀ)[i,t]`
/// - `Σ_i C[i,j] P(t|w_i,d_j) = P(t|d_j) · (P(w|t)ᵀ · R)[t,j]`
///
/// Reads only the incoming parameters and writes fresh arrays.
pub(crate) fn run_epoch(
    word_topic: &Array2<f64>,
    doc_topic: &Array2<f64>,
    counts: &CountMatrix,
    totals: &Array1<f64>,
    update_word_topic: bool,
) -> Epoch {
    // E-step: Z(i,j) = Σ_t P(w_i|t) P(t|d_j)
    let den = word_topic.dot(doc_topic);

    let mut ratio = Array2::<f64>::zeros(den.raw_dim());
    Zip::from(&mut ratio)
        .and(counts.counts())
        .and(&den)
        .par_for_each(|r, &c, &z| {
            if z != 0.0 {
                *r = c / z;
            }
        });

    let log_likelihood = Zip::from(counts.counts())
        .and(&den)
        .fold(0.0, |acc, &c, &z| if c > 0.0 { acc + c * z.ln() } else { acc });

    // M-step: P(t|d) = Σ_i C[i,j] P(t|w_i,d_j) / Σ_i C[i,j]
    let mut next_doc_topic = doc_topic * &word_topic.t().dot(&ratio);
    divide_columns(&mut next_doc_topic, totals.view());

    // M-step: P(w|t) ∝ Σ_j C[i,j] P(t|w_i,d_j)
    let next_word_topic = update_word_topic.then(|| {
        let mut mass = word_topic * &ratio.dot(&doc_topic.t());
        normalize_columns(&mut mass);
        mass
    });

    Epoch {
        doc_topic: next_doc_topic,
        word_topic: next_word_topic,
        den,
        log_likelihood,
    }
}

/// Relative change between two successive log-likelihoods
#[inline]
pub(crate) fn relative_delta(prev: f64, next: f64) -> f64 {
    if prev == 0.0 {
        (next - prev).abs()
    } else {
        ((next - prev) / prev).abs()
    }
}

/// EM trainer
///
/// Fits `P(w|t)` and `P(t|d)` to a training count matrix by alternating
/// E and M steps for a fixed number of epochs.
/// With a tolerance set, training may stop once the relative likelihood
/// change falls below it.
#[derive(Debug, Clone)]
pub struct EmTrainer {
    pub topics: usize,
    pub epochs: usize,
    pub tolerance: Option<f64>,
}

impl EmTrainer {
    pub fn new(topics: usize, epochs: usize) -> Self {
        Self {
            topics,
            epochs,
            tolerance: None,
        }
    }

    pub fn with_tolerance(mut self, tolerance: Option<f64>) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Initialize both distributions from `rng` and train them on `counts`
    pub fn fit<R: Rng + ?Sized>(&self, counts: &CountMatrix, rng: &mut R) -> Result<TopicModel> {
        if self.topics == 0 {
            return Err(PlsaError::InvalidConfig("topic count must be positive".into()));
        }
        if counts.word_num() == 0 || counts.doc_num() == 0 {
            return Err(PlsaError::EmptyCorpus("training collection"));
        }
        let word_topic = random_stochastic(counts.word_num(), self.topics, rng);
        let doc_topic = random_stochastic(self.topics, counts.doc_num(), rng);
        self.fit_from(counts, word_topic, doc_topic)
    }

    /// Train from explicit initial distributions
    ///
    /// # Arguments
    /// * `counts` - training counts `C`, `W x D`
    /// * `word_topic` - initial `P(w|t)`, `W x T`
    /// * `doc_topic` - initial `P(t|d)`, `T x D`
    pub fn fit_from(
        &self,
        counts: &CountMatrix,
        mut word_topic: Array2<f64>,
        mut doc_topic: Array2<f64>,
    ) -> Result<TopicModel> {
        ensure_dim("P(w|t) rows", counts.word_num(), word_topic.nrows())?;
        ensure_dim("P(w|t) topics", self.topics, word_topic.ncols())?;
        ensure_dim("P(t|d) topics", self.topics, doc_topic.nrows())?;
        ensure_dim("P(t|d) documents", counts.doc_num(), doc_topic.ncols())?;

        info!(
            words = counts.word_num(),
            docs = counts.doc_num(),
            topics = self.topics,
            epochs = self.epochs,
            "EM training"
        );

        let totals = counts.column_totals();
        let mut den = Array2::<f64>::zeros((counts.word_num(), counts.doc_num()));
        let mut history = Vec::with_capacity(self.epochs);

        for epoch in 0..self.epochs {
            let step = run_epoch(&word_topic, &doc_topic, counts, &totals, true);
            debug!(epoch, log_likelihood = step.log_likelihood, "EM epoch");

            if let Some(next) = step.word_topic {
                word_topic = next;
            }
            doc_topic = step.doc_topic;
            den = step.den;

            let converged = match (self.tolerance, history.last()) {
                (Some(tol), Some(&prev)) => relative_delta(prev, step.log_likelihood) < tol,
                _ => false,
            };
            history.push(step.log_likelihood);
            if converged {
                warn!(epoch, "log-likelihood converged, stopping EM early");
                break;
            }
        }

        Ok(TopicModel {
            word_topic,
            doc_topic,
            den,
            log_likelihood: history,
        })
    }
}

/// Data log-likelihood `Σ_{i,j} C[i,j] · ln Σ_t P(w_i|t) P(t|d_j)`
pub fn log_likelihood(
    counts: &CountMatrix,
    word_topic: &Array2<f64>,
    doc_topic: &Array2<f64>,
) -> Result<f64> {
    ensure_dim("P(w|t) rows", counts.word_num(), word_topic.nrows())?;
    ensure_dim("topic count", word_topic.ncols(), doc_topic.nrows())?;
    ensure_dim("P(t|d) documents", counts.doc_num(), doc_topic.ncols())?;
    let den = word_topic.dot(doc_topic);
    Ok(Zip::from(counts.counts())
        .and(&den)
        .fold(0.0, |acc, &c, &z| if c > 0.0 { acc + c * z.ln() } else { acc }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{term::TermFrequency, vocabulary::Vocabulary};
    use crate::model::matrix::is_column_stochastic;
    use crate::model::posterior::Posterior;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Axis};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn to_distribution(mut raw: Array2<f64>) -> Array2<f64> {
        normalize_columns(&mut raw);
        raw
    }

    /// Topic=2, Word=4, Document=3
    fn synthetic() -> CountMatrix {
        let counts = array![
            [4.0, 0.0, 1.0],
            [3.0, 1.0, 0.0],
            [0.0, 5.0, 2.0],
            [1.0, 2.0, 3.0],
        ];
        let len = counts.sum_axis(Axis(0));
        CountMatrix::new(counts, len, vec!["a".into(), "b".into(), "c".into()]).unwrap()
    }

    #[test]
    fn log_likelihood_is_non_decreasing() {
        let counts = synthetic();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let model = EmTrainer::new(2, 40).fit(&counts, &mut rng).unwrap();

        assert_eq!(model.log_likelihood.len(), 40);
        for pair in model.log_likelihood.windows(2) {
            assert!(pair[1] >= pair[0] - 1e-9, "likelihood decreased: {} -> {}", pair[0], pair[1]);
        }
        let final_ll = log_likelihood(&counts, &model.word_topic, &model.doc_topic).unwrap();
        assert!(final_ll >= *model.log_likelihood.last().unwrap() - 1e-9);
    }

    #[test]
    fn distributions_stay_column_stochastic() {
        let counts = synthetic();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for epochs in [1, 2, 10] {
            let model = EmTrainer::new(2, epochs).fit(&counts, &mut rng).unwrap();
            assert!(is_column_stochastic(&model.word_topic, 1e-9));
            assert!(is_column_stochastic(&model.doc_topic, 1e-9));
            assert!(model.word_topic.iter().all(|v| *v >= 0.0));
        }
    }

    #[test]
    fn same_seed_same_model() {
        let counts = synthetic();
        let a = EmTrainer::new(2, 15).fit(&counts, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        let b = EmTrainer::new(2, 15).fit(&counts, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        assert_eq!(a.word_topic, b.word_topic);
        assert_eq!(a.doc_topic, b.doc_topic);
        assert_eq!(a.den, b.den);
    }

    #[test]
    fn single_epoch_matches_hand_update() {
        let counts = synthetic();
        let word_topic = to_distribution(array![[1.0, 2.0], [2.0, 1.0], [3.0, 3.0], [4.0, 1.0]]);
        let doc_topic = to_distribution(array![[1.0, 2.0, 1.0], [1.0, 1.0, 3.0]]);
        let post = Posterior::compute(&word_topic, &doc_topic).unwrap();

        let model = EmTrainer::new(2, 1)
            .fit_from(&counts, word_topic.clone(), doc_topic.clone())
            .unwrap();

        let c = counts.counts();
        for t in 0..2 {
            let mut col = vec![0.0; 4];
            for i in 0..4 {
                col[i] = (0..3).map(|j| c[[i, j]] * post.resp[[t, i, j]]).sum::<f64>();
            }
            let total: f64 = col.iter().sum();
            for i in 0..4 {
                assert_abs_diff_eq!(model.word_topic[[i, t]], col[i] / total, epsilon = 1e-12);
            }
            for j in 0..3 {
                let num: f64 = (0..4).map(|i| c[[i, j]] * post.resp[[t, i, j]]).sum();
                let den: f64 = (0..4).map(|i| c[[i, j]]).sum();
                assert_abs_diff_eq!(model.doc_topic[[t, j]], num / den, epsilon = 1e-12);
            }
        }
        for (a, b) in model.den.iter().zip(post.den.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn empty_document_gets_zero_mixture() {
        let counts = array![[2.0, 0.0], [1.0, 0.0]];
        let len = counts.sum_axis(Axis(0));
        let counts = CountMatrix::new(counts, len, vec!["full".into(), "empty".into()]).unwrap();
        let model = EmTrainer::new(2, 5).fit(&counts, &mut ChaCha8Rng::seed_from_u64(1)).unwrap();
        assert!(model.doc_topic.column(1).iter().all(|p| *p == 0.0));
        assert!(model.doc_topic.iter().all(|p| p.is_finite()));
        assert!(is_column_stochastic(&model.doc_topic, 1e-9));
    }

    #[test]
    fn topic_without_mass_collapses_to_zero() {
        // topic 1 has no probability in any document, so no word mass reaches it
        let counts = synthetic();
        let word_topic = to_distribution(array![[1.0, 1.0], [1.0, 1.0], [1.0, 1.0], [1.0, 1.0]]);
        let doc_topic = array![[1.0, 1.0, 1.0], [0.0, 0.0, 0.0]];
        let model = EmTrainer::new(2, 3).fit_from(&counts, word_topic, doc_topic).unwrap();
        assert!(model.word_topic.column(1).iter().all(|p| *p == 0.0));
        assert!(is_column_stochastic(&model.word_topic, 1e-9));
    }

    #[test]
    fn zero_epochs_keep_initial_parameters() {
        let counts = synthetic();
        let word_topic = to_distribution(Array2::from_elem((4, 2), 1.0));
        let doc_topic = to_distribution(Array2::from_elem((2, 3), 1.0));
        let model = EmTrainer::new(2, 0)
            .fit_from(&counts, word_topic.clone(), doc_topic.clone())
            .unwrap();
        assert_eq!(model.word_topic, word_topic);
        assert_eq!(model.doc_topic, doc_topic);
        assert!(model.log_likelihood.is_empty());
    }

    #[test]
    fn tolerance_stops_early() {
        let counts = synthetic();
        let full = EmTrainer::new(2, 200)
            .fit(&counts, &mut ChaCha8Rng::seed_from_u64(8))
            .unwrap();
        let early = EmTrainer::new(2, 200)
            .with_tolerance(Some(1e-3))
            .fit(&counts, &mut ChaCha8Rng::seed_from_u64(8))
            .unwrap();
        assert_eq!(full.log_likelihood.len(), 200);
        assert!(early.log_likelihood.len() < 200);
        // the shared prefix is identical
        assert_eq!(&full.log_likelihood[..early.log_likelihood.len()], &early.log_likelihood[..]);
    }

    #[test]
    fn rejects_bad_shapes_and_empty_input() {
        let counts = synthetic();
        let bad = EmTrainer::new(3, 1).fit_from(
            &counts,
            Array2::zeros((4, 2)),
            Array2::zeros((2, 3)),
        );
        assert!(matches!(bad, Err(PlsaError::ShapeMismatch { .. })));

        let mut vocab = Vocabulary::new();
        vocab.insert("x");
        let empty = CountMatrix::from_documents::<String>(&vocab, &[]);
        let res = EmTrainer::new(2, 1).fit(&empty, &mut ChaCha8Rng::seed_from_u64(0));
        assert!(matches!(res, Err(PlsaError::EmptyCorpus(_))));

        let docs = vec![("d".to_string(), TermFrequency::from_text("x"))];
        let one = CountMatrix::from_documents(&vocab, &docs);
        assert!(EmTrainer::new(0, 1).fit(&one, &mut ChaCha8Rng::seed_from_u64(0)).is_err());
    }
}
