use ndarray::Array2;
use rand::Rng;
use tracing::{debug, info};

use crate::corpus::CountMatrix;
use crate::error::{ensure_dim, Result};
use crate::model::matrix::random_stochastic;
use crate::model::trainer::run_epoch;
use crate::model::{FoldedModel, TopicModel};

/// Folding-in engine
///
/// Estimates `P(t|d')` for unseen documents against a trained, frozen `P(w|t)`.
/// Same E-step as training; the M-step only touches the document mixtures.
#[derive(Debug, Clone)]
pub struct FoldingIn {
    pub epochs: usize,
}

impl FoldingIn {
    pub fn new(epochs: usize) -> Self {
        Self { epochs }
    }

    /// Draw fresh test mixtures from `rng` and fold `counts` into `model`
    /// An empty test set folds to empty `T x 0` and `W x 0` arrays.
    pub fn fold<R: Rng + ?Sized>(
        &self,
        model: &TopicModel,
        counts: &CountMatrix,
        rng: &mut R,
    ) -> Result<FoldedModel> {
        let doc_topic = random_stochastic(model.topic_num(), counts.doc_num(), rng);
        self.fold_from(model, counts, doc_topic)
    }

    /// Fold from explicit initial test mixtures `P(t|d')` (`T x D'`)
    pub fn fold_from(
        &self,
        model: &TopicModel,
        counts: &CountMatrix,
        mut doc_topic: Array2<f64>,
    ) -> Result<FoldedModel> {
        ensure_dim("test vocabulary", model.word_num(), counts.word_num())?;
        ensure_dim("P(t|d') topics", model.topic_num(), doc_topic.nrows())?;
        ensure_dim("P(t|d') documents", counts.doc_num(), doc_topic.ncols())?;

        info!(docs = counts.doc_num(), epochs = self.epochs, "folding-in");

        let totals = counts.column_totals();
        let mut den = Array2::<f64>::zeros((counts.word_num(), counts.doc_num()));
        let mut history = Vec::with_capacity(self.epochs);

        for epoch in 0..self.epochs {
            let step = run_epoch(&model.word_topic, &doc_topic, counts, &totals, false);
            debug!(epoch, log_likelihood = step.log_likelihood, "folding-in epoch");
            doc_topic = step.doc_topic;
            den = step.den;
            history.push(step.log_likelihood);
        }

        Ok(FoldedModel {
            doc_topic,
            den,
            log_likelihood: history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlsaError;
    use crate::model::matrix::is_column_stochastic;
    use crate::model::trainer::EmTrainer;
    use ndarray::{array, Array1, Axis};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn matrix(counts: Array2<f64>) -> CountMatrix {
        let len = counts.sum_axis(Axis(0));
        let keys = (0..counts.ncols()).map(|j| format!("d{}", j)).collect();
        CountMatrix::new(counts, len, keys).unwrap()
    }

    fn trained() -> TopicModel {
        let train = matrix(array![
            [4.0, 0.0, 1.0],
            [3.0, 1.0, 0.0],
            [0.0, 5.0, 2.0],
            [1.0, 2.0, 3.0],
        ]);
        EmTrainer::new(2, 30).fit(&train, &mut ChaCha8Rng::seed_from_u64(21)).unwrap()
    }

    #[test]
    fn topic_word_is_untouched() {
        let model = trained();
        let before = model.word_topic.clone();
        let test = matrix(array![[2.0, 0.0], [0.0, 1.0], [1.0, 3.0], [0.0, 0.0]]);
        let folded = FoldingIn::new(10)
            .fold(&model, &test, &mut ChaCha8Rng::seed_from_u64(2))
            .unwrap();

        assert_eq!(model.word_topic, before);
        assert_eq!(folded.doc_topic.dim(), (2, 2));
        assert_eq!(folded.den.dim(), (4, 2));
        assert!(is_column_stochastic(&folded.doc_topic, 1e-9));
    }

    #[test]
    fn den_is_mixture_evidence() {
        let model = trained();
        let test = matrix(array![[1.0], [1.0], [0.0], [2.0]]);
        let init = array![[0.5], [0.5]];
        let folded = FoldingIn::new(1).fold_from(&model, &test, init.clone()).unwrap();
        // one epoch: den was computed from the initial mixture
        let expected = model.word_topic.dot(&init);
        assert_eq!(folded.den, expected);
    }

    #[test]
    fn folding_likelihood_is_non_decreasing() {
        let model = trained();
        let test = matrix(array![[2.0, 1.0], [1.0, 0.0], [0.0, 4.0], [1.0, 1.0]]);
        let folded = FoldingIn::new(25)
            .fold(&model, &test, &mut ChaCha8Rng::seed_from_u64(4))
            .unwrap();
        for pair in folded.log_likelihood.windows(2) {
            assert!(pair[1] >= pair[0] - 1e-9);
        }
    }

    #[test]
    fn empty_test_document_gets_zero_mixture() {
        let model = trained();
        let test = CountMatrix::new(
            array![[1.0, 0.0], [0.0, 0.0], [1.0, 0.0], [0.0, 0.0]],
            array![2.0, 0.0],
            vec!["a".into(), "b".into()],
        )
        .unwrap();
        let folded = FoldingIn::new(5)
            .fold(&model, &test, &mut ChaCha8Rng::seed_from_u64(9))
            .unwrap();
        assert!(folded.doc_topic.column(1).iter().all(|p| *p == 0.0));
        assert!(folded.den.column(1).iter().all(|z| *z == 0.0));
    }

    #[test]
    fn empty_test_set_folds_to_empty_arrays() {
        let model = trained();
        let test = CountMatrix::new(Array2::zeros((4, 0)), Array1::zeros(0), Vec::new()).unwrap();
        let folded = FoldingIn::new(3)
            .fold(&model, &test, &mut ChaCha8Rng::seed_from_u64(6))
            .unwrap();
        assert_eq!(folded.doc_topic.dim(), (2, 0));
        assert_eq!(folded.den.dim(), (4, 0));
        assert_eq!(folded.log_likelihood, vec![0.0; 3]);
    }

    #[test]
    fn rejects_vocabulary_mismatch() {
        let model = trained();
        let test = matrix(array![[1.0], [1.0], [1.0]]);
        let res = FoldingIn::new(1).fold(&model, &test, &mut ChaCha8Rng::seed_from_u64(0));
        assert!(matches!(res, Err(PlsaError::ShapeMismatch { .. })));
    }
}
