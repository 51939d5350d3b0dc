use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::corpus::vocabulary::Vocabulary;
use crate::error::{ensure_dim, Result};
use crate::model::TopicModel;

/// On-disk form of a trained model
///
/// Holds the vocabulary next to the parameters, since `P(w|t)` rows are
/// only meaningful against the term order they were trained with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub vocabulary: Vocabulary,
    pub model: TopicModel,
}

impl ModelSnapshot {
    pub fn new(vocabulary: Vocabulary, model: TopicModel) -> Self {
        Self { vocabulary, model }
    }

    /// Check the internal shapes of a deserialized snapshot
    pub fn validate(&self) -> Result<()> {
        let model = &self.model;
        ensure_dim("snapshot vocabulary", self.vocabulary.len(), model.word_num())?;
        ensure_dim("snapshot topics", model.topic_num(), model.doc_topic.nrows())?;
        ensure_dim("snapshot den rows", model.word_num(), model.den.nrows())?;
        ensure_dim("snapshot den columns", model.doc_num(), model.den.ncols())?;
        Ok(())
    }

    /// CBOR encode into `writer`
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        serde_cbor::to_writer(writer, self)?;
        Ok(())
    }

    /// CBOR decode from `reader` and validate
    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        let snapshot: ModelSnapshot = serde_cbor::from_reader(reader)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::read_from(BufReader::new(File::open(path)?))
    }
}
