use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use plsa_retrieval::{
    loader,
    rank::report::write_report_file,
    ModelSnapshot, Pipeline, PlsaConfig,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "plsa-retrieval")]
#[command(
    about = "Rank documents with a PLSA topic model and a background language model",
    long_about = None
)]
struct Cli {
    /// Training collection, one document per line
    #[arg(long, default_value = "Collection.txt")]
    collection: PathBuf,

    /// Directory of test documents
    #[arg(long, default_value = "Document")]
    docs: PathBuf,

    /// Directory of queries
    #[arg(long, default_value = "Query")]
    queries: PathBuf,

    /// Background model file (`term log_prob` per line)
    #[arg(long, default_value = "BGLM.txt")]
    background: PathBuf,

    /// Ranking report destination
    #[arg(short, long, default_value = "result.csv")]
    output: PathBuf,

    /// Number of latent topics
    #[arg(short, long, default_value = "30")]
    topics: usize,

    /// EM epochs on the training collection
    #[arg(long, default_value = "50")]
    train_epochs: usize,

    /// Folding-in epochs on the test documents
    #[arg(long, default_value = "10")]
    fold_epochs: usize,

    /// Weight of the empirical term model
    #[arg(long, default_value = "0.1")]
    alpha: f64,

    /// Weight of the topic model
    #[arg(long, default_value = "0.8")]
    beta: f64,

    #[arg(long, default_value = "42")]
    seed: u64,

    /// Stop training once the relative log-likelihood gain drops below this
    #[arg(long)]
    tolerance: Option<f64>,

    /// End-of-content token removed from documents and queries
    #[arg(long, default_value = "-1", allow_hyphen_values = true)]
    sentinel: String,

    /// Metadata lines skipped at the top of each test document
    #[arg(long, default_value = "3")]
    header_lines: usize,

    /// Persist the trained model
    #[arg(long)]
    save_model: Option<PathBuf>,

    /// Skip training and rank with a previously saved model
    #[arg(long, conflicts_with = "save_model")]
    load_model: Option<PathBuf>,

    /// Log the most probable terms of each topic
    #[arg(long, default_value = "0")]
    top_words: usize,

    /// Verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn config(&self) -> PlsaConfig {
        PlsaConfig {
            topics: self.topics,
            train_epochs: self.train_epochs,
            fold_epochs: self.fold_epochs,
            alpha: self.alpha,
            beta: self.beta,
            seed: self.seed,
            tolerance: self.tolerance,
            sentinel: self.sentinel.clone(),
            header_lines: self.header_lines,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let program_start = Instant::now();
    let pipeline = Pipeline::new(cli.config()).context("invalid configuration")?;
    let config = pipeline.config();

    let load_start = Instant::now();
    let test = loader::read_document_dir(&cli.docs, config.header_lines, &config.sentinel)
        .with_context(|| format!("failed to read documents from {}", cli.docs.display()))?;
    let queries = loader::read_query_dir(&cli.queries, &config.sentinel)
        .with_context(|| format!("failed to read queries from {}", cli.queries.display()))?;
    let background = loader::read_background(&cli.background).with_context(|| {
        format!("failed to read background model {}", cli.background.display())
    })?;

    let output = match &cli.load_model {
        Some(path) => {
            let snapshot = ModelSnapshot::load(path)
                .with_context(|| format!("failed to load model {}", path.display()))?;
            info!(elapsed_ms = load_start.elapsed().as_millis() as u64, "inputs loaded");
            pipeline.rank_with(
                snapshot.vocabulary,
                snapshot.model,
                &test,
                &queries,
                &background,
            )?
        }
        None => {
            let train = loader::read_collection(&cli.collection).with_context(|| {
                format!("failed to read collection {}", cli.collection.display())
            })?;
            info!(elapsed_ms = load_start.elapsed().as_millis() as u64, "inputs loaded");
            pipeline.run(&train, &test, &queries, &background)?
        }
    };

    if cli.top_words > 0 {
        for topic in 0..output.model.topic_num() {
            let words = output.model.top_words(topic, &output.vocabulary, cli.top_words);
            info!(topic, ?words, "top words");
        }
    }

    if let Some(path) = &cli.save_model {
        ModelSnapshot::new(output.vocabulary.clone(), output.model.clone())
            .save(path)
            .with_context(|| format!("failed to save model to {}", path.display()))?;
        info!(path = %path.display(), "model saved");
    }

    write_report_file(&cli.output, &output.rankings())
        .with_context(|| format!("failed to write report {}", cli.output.display()))?;
    info!(
        path = %cli.output.display(),
        queries = queries.len(),
        elapsed_ms = program_start.elapsed().as_millis() as u64,
        "report written"
    );
    Ok(())
}
