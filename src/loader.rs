use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::corpus::term::TermFrequency;
use crate::error::{PlsaError, Result};
use crate::rank::{background::BackgroundModel, query::Query};

/// Keyed documents, in load order
pub type Documents = Vec<(String, TermFrequency)>;

/// Training collection: one document per line
pub fn read_collection<P: AsRef<Path>>(path: P) -> Result<Documents> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut docs = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        docs.push((format!("train-{}", n), TermFrequency::from_text(line.trim_end())));
    }
    info!(path = %path.as_ref().display(), docs = docs.len(), "training collection loaded");
    Ok(docs)
}

/// Regular files directly under `dir`, sorted by file name
fn sorted_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

fn file_key(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Whitespace tokens of `text` with every `sentinel` token dropped
fn tokens_without<'a>(text: &'a str, sentinel: &'a str) -> impl Iterator<Item = &'a str> {
    text.split_whitespace().filter(move |t| *t != sentinel)
}

/// Document directory: one file per document, keyed by file name.
///
/// # Arguments
/// * `dir` - directory to scan (not recursive)
/// * `header_lines` - metadata lines skipped at the top of each file
/// * `sentinel` - end-of-content token to drop
pub fn read_document_dir<P: AsRef<Path>>(
    dir: P,
    header_lines: usize,
    sentinel: &str,
) -> Result<Documents> {
    let mut docs = Vec::new();
    for path in sorted_files(dir.as_ref())? {
        let text = fs::read_to_string(&path)?;
        let mut freq = TermFrequency::new();
        for line in text.lines().skip(header_lines) {
            for token in tokens_without(line, sentinel) {
                freq.add_term(token);
            }
        }
        docs.push((file_key(&path), freq));
    }
    info!(dir = %dir.as_ref().display(), docs = docs.len(), "documents loaded");
    Ok(docs)
}

/// Query directory: one file per query, keyed by file name
pub fn read_query_dir<P: AsRef<Path>>(dir: P, sentinel: &str) -> Result<Vec<Query>> {
    let mut queries = Vec::new();
    for path in sorted_files(dir.as_ref())? {
        let text = fs::read_to_string(&path)?;
        let terms: Vec<&str> = tokens_without(&text, sentinel).collect();
        queries.push(Query::new(file_key(&path), terms.as_slice()));
    }
    info!(dir = %dir.as_ref().display(), queries = queries.len(), "queries loaded");
    Ok(queries)
}

/// Background model file: `term log_prob` per line, blank lines ignored.
/// Records become rows in file order.
pub fn read_background<P: AsRef<Path>>(path: P) -> Result<BackgroundModel> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut model = BackgroundModel::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let mut fields = line.split_whitespace();
        let Some(term) = fields.next() else {
            continue;
        };
        let parse_err = |message: String| PlsaError::Parse {
            path: path.to_path_buf(),
            line: n + 1,
            message,
        };
        let value = fields
            .next()
            .ok_or_else(|| parse_err(format!("missing log-probability for `{}`", term)))?;
        let log_prob: f64 = value
            .parse()
            .map_err(|e| parse_err(format!("bad log-probability `{}`: {}", value, e)))?;
        model.push(term, log_prob);
    }
    info!(path = %path.display(), records = model.len(), "background model loaded");
    Ok(model)
}
