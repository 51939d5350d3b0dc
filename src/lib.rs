/// This crate is a retrieval engine built on a PLSA topic model.
pub mod config;
pub mod corpus;
pub mod error;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod rank;

/// Retrieval Pipeline
/// The top-level struct of this crate. It wires every stage together:
/// - Vocabulary construction over training, test and query terms
/// - EM training of the topic model
/// - Folding-in of the test documents
/// - Query likelihood ranking against a background model
///
/// All random draws come from one generator seeded by `PlsaConfig::seed`,
/// so a fixed configuration reproduces the same scores.
pub use pipeline::{Pipeline, PipelineOutput};

/// Run Configuration
/// Topic count, epoch counts, interpolation weights, seed and loader settings.
/// Validated once before any stage runs.
pub use config::PlsaConfig;

/// Error type shared by every stage
pub use error::{PlsaError, Result};

/// Term Frequency structure
/// Occurrence counts of each term within one document, plus the total.
/// Terms keep their first-seen order.
pub use corpus::term::TermFrequency;

/// Vocabulary
/// Ordered set of unique terms. A term's position is its row in every
/// word-indexed matrix.
pub use corpus::vocabulary::Vocabulary;

/// Count Matrix
/// Word × document occurrence counts together with the document lengths
/// and keys.
pub use corpus::CountMatrix;

/// Topic Models
/// - `TopicModel`: trained P(w|t) and P(t|d), the mixture probabilities and
///   the per-epoch log-likelihood
/// - `FoldedModel`: P(t|d') of unseen documents inferred with P(w|t) frozen
pub use model::{FoldedModel, TopicModel};

/// EM Trainer and Folding-In
/// - `EmTrainer`: fits a `TopicModel` to a count matrix
/// - `FoldingIn`: infers topic mixtures for new documents
pub use model::{folding::FoldingIn, trainer::EmTrainer};

/// Model Snapshot
/// A trained model with its vocabulary, persisted as CBOR.
pub use model::snapshot::ModelSnapshot;

/// Ranking
/// - `QueryLikelihood`: interpolated query likelihood scorer
/// - `ScoreTable`: raw query × document scores
/// - `Ranking`/`Hits`: per-query results sorted by score, best first
pub use rank::scoring::{Hits, QueryLikelihood, Ranking, ScoreTable};

/// Background language model and queries
pub use rank::{background::BackgroundModel, query::Query};
