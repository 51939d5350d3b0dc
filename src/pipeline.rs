use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::config::PlsaConfig;
use crate::corpus::{term::TermFrequency, vocabulary::Vocabulary, CountMatrix};
use crate::error::Result;
use crate::model::{folding::FoldingIn, trainer::EmTrainer, FoldedModel, TopicModel};
use crate::rank::{
    background::BackgroundModel,
    query::Query,
    scoring::{QueryLikelihood, Ranking, ScoreTable},
};

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub vocabulary: Vocabulary,
    pub model: TopicModel,
    pub test_counts: CountMatrix,
    pub folded: FoldedModel,
    pub scores: ScoreTable,
}

impl PipelineOutput {
    pub fn rankings(&self) -> Vec<Ranking> {
        self.scores.rankings()
    }
}

/// Retrieval pipeline
///
/// Vocabulary and counts, EM training, folding-in of the test documents,
/// then query likelihood ranking. Stages only feed forward.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PlsaConfig,
}

impl Pipeline {
    pub fn new(config: PlsaConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PlsaConfig {
        &self.config
    }

    /// Union of training, test and query terms, inserted in that order
    pub fn build_vocabulary(
        train: &[(String, TermFrequency)],
        test: &[(String, TermFrequency)],
        queries: &[Query],
    ) -> Vocabulary {
        let mut vocab = Vocabulary::new();
        for (_, freq) in train.iter().chain(test) {
            vocab.extend_from_freq(freq);
        }
        for query in queries {
            vocab.extend_from_terms(&query.terms);
        }
        vocab
    }

    /// Run every stage from raw documents
    pub fn run(
        &self,
        train: &[(String, TermFrequency)],
        test: &[(String, TermFrequency)],
        queries: &[Query],
        background: &BackgroundModel,
    ) -> Result<PipelineOutput> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        let vocabulary = Self::build_vocabulary(train, test, queries);
        info!(vocabulary = vocabulary.len(), "vocabulary built");

        let train_counts = CountMatrix::from_documents(&vocabulary, train);
        let model = EmTrainer::new(self.config.topics, self.config.train_epochs)
            .with_tolerance(self.config.tolerance)
            .fit(&train_counts, &mut rng)?;

        self.rank_with_rng(vocabulary, model, test, queries, background, &mut rng)
    }

    /// Fold `test` into an already trained model and rank it.
    /// `vocabulary` must be the one `model` was trained against.
    pub fn rank_with(
        &self,
        vocabulary: Vocabulary,
        model: TopicModel,
        test: &[(String, TermFrequency)],
        queries: &[Query],
        background: &BackgroundModel,
    ) -> Result<PipelineOutput> {
        // offset the seed so the test draws differ from the training ones
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed.wrapping_add(1));
        self.rank_with_rng(vocabulary, model, test, queries, background, &mut rng)
    }

    fn rank_with_rng(
        &self,
        vocabulary: Vocabulary,
        model: TopicModel,
        test: &[(String, TermFrequency)],
        queries: &[Query],
        background: &BackgroundModel,
        rng: &mut ChaCha8Rng,
    ) -> Result<PipelineOutput> {
        let test_counts = CountMatrix::from_documents(&vocabulary, test);
        let folded = FoldingIn::new(self.config.fold_epochs).fold(&model, &test_counts, rng)?;
        let scores = QueryLikelihood::from_config(&self.config)?.score(
            &vocabulary,
            &test_counts,
            &folded,
            background,
            queries,
        )?;
        Ok(PipelineOutput {
            vocabulary,
            model,
            test_counts,
            folded,
            scores,
        })
    }
}
