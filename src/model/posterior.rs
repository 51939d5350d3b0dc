use ndarray::{Array1, Array2, Array3, ArrayView1, Axis, Zip};
use rayon::prelude::*;

use crate::error::{ensure_dim, Result};

/// E-step posterior of one document
pub struct DocPosterior {
    /// `P(t|w,d)` laid out `W x T`
    pub resp: Array2<f64>,
    /// `Z(w,d) = Σ_t P(w|t) P(t|d)`, the evidence mass of each word
    pub den: Array1<f64>,
}

/// E-step against a fixed topic-word distribution
#[derive(Clone, Copy)]
pub struct EStep<'a> {
    word_topic: &'a Array2<f64>,
}

impl<'a> EStep<'a> {
    /// # Arguments
    /// * `word_topic` - `P(w|t)`, shape `W x T`
    pub fn new(word_topic: &'a Array2<f64>) -> Self {
        Self { word_topic }
    }

    /// Posterior of one document given its topic mixture `P(t|d)`.
    ///
    /// Words whose evidence `Z(w,d)` is exactly zero get an all-zero posterior row.
    pub fn document(&self, mixture: ArrayView1<'_, f64>) -> DocPosterior {
        // p(t|w,d) ∝ P(w|t) P(t|d), broadcast over words
        let mut resp = self.word_topic * &mixture;
        let den = resp.sum_axis(Axis(1));
        Zip::from(resp.rows_mut()).and(&den).for_each(|mut row, &z| {
            if z != 0.0 {
                row.mapv_inplace(|p| p / z);
            } else {
                row.fill(0.0);
            }
        });
        DocPosterior { resp, den }
    }
}

/// Full posterior tensor of a collection
///
/// `resp[[t, i, j]] = P(t | w_i, d_j)` and `den[[i, j]] = Z(w_i, d_j)`.
/// Training never holds this tensor, it works on `C / Z` directly.
/// This is the materialized form, for inspection and small collections.
#[derive(Debug, Clone)]
pub struct Posterior {
    pub resp: Array3<f64>,
    pub den: Array2<f64>,
}

impl Posterior {
    /// # Arguments
    /// * `word_topic` - `P(w|t)`, `W x T`
    /// * `doc_topic` - `P(t|d)`, `T x D`
    pub fn compute(word_topic: &Array2<f64>, doc_topic: &Array2<f64>) -> Result<Self> {
        ensure_dim("topic count", word_topic.ncols(), doc_topic.nrows())?;
        let (words, topics) = word_topic.dim();
        let docs = doc_topic.ncols();
        let estep = EStep::new(word_topic);

        let blocks: Vec<DocPosterior> = (0..docs)
            .into_par_iter()
            .map(|j| estep.document(doc_topic.column(j)))
            .collect();

        let mut resp = Array3::<f64>::zeros((topics, words, docs));
        let mut den = Array2::<f64>::zeros((words, docs));
        for (j, block) in blocks.into_iter().enumerate() {
            resp.index_axis_mut(Axis(2), j).assign(&block.resp.t());
            den.column_mut(j).assign(&block.den);
        }
        Ok(Self { resp, den })
    }
}
