use serde::{Deserialize, Serialize};

use crate::error::{PlsaError, Result};

/// Pipeline configuration
///
/// Every knob of the pipeline lives here: topic count, epoch budgets,
/// ranking weights, the random seed and the loader conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlsaConfig {
    /// Number of latent topics
    pub topics: usize,
    /// EM epochs over the training collection
    pub train_epochs: usize,
    /// Folding-in epochs over the test documents
    pub fold_epochs: usize,
    /// Weight of the empirical term model `P(w|d)`
    pub alpha: f64,
    /// Weight of the topic mixture evidence `den(w,d)`
    pub beta: f64,
    /// Seed of the random source used by the initializer
    pub seed: u64,
    /// Relative log-likelihood delta under which training stops early.
    /// `None` runs the full epoch budget.
    pub tolerance: Option<f64>,
    /// Token marking the end of a document or query, removed on load
    pub sentinel: String,
    /// Number of metadata lines at the top of each document file
    pub header_lines: usize,
}

impl Default for PlsaConfig {
    fn default() -> Self {
        Self {
            topics: 30,
            train_epochs: 50,
            fold_epochs: 10,
            alpha: 0.1,
            beta: 0.8,
            seed: 42,
            tolerance: None,
            sentinel: "-1".to_string(),
            header_lines: 3,
        }
    }
}

impl PlsaConfig {
    /// Create a configuration with the given topic count
    pub fn new(topics: usize) -> Self {
        Self {
            topics,
            ..Default::default()
        }
    }

    pub fn train_epochs(mut self, epochs: usize) -> Self {
        self.train_epochs = epochs;
        self
    }

    pub fn fold_epochs(mut self, epochs: usize) -> Self {
        self.fold_epochs = epochs;
        self
    }

    /// Set the ranking weights (alpha, beta)
    pub fn weights(mut self, alpha: f64, beta: f64) -> Self {
        self.alpha = alpha;
        self.beta = beta;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.topics == 0 {
            return Err(PlsaError::InvalidConfig("topic count must be positive".into()));
        }
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(PlsaError::InvalidConfig(format!("alpha must be >= 0, got {}", self.alpha)));
        }
        if !self.beta.is_finite() || self.beta < 0.0 {
            return Err(PlsaError::InvalidConfig(format!("beta must be >= 0, got {}", self.beta)));
        }
        // negative background weight would push the log argument below zero
        if self.alpha + self.beta > 1.0 {
            return Err(PlsaError::InvalidConfig(format!(
                "alpha + beta must not exceed 1, got {}",
                self.alpha + self.beta
            )));
        }
        if let Some(tol) = self.tolerance {
            if !tol.is_finite() || tol < 0.0 {
                return Err(PlsaError::InvalidConfig(format!(
                    "tolerance must be >= 0, got {}",
                    tol
                )));
            }
        }
        Ok(())
    }
}
