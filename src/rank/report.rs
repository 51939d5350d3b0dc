use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::rank::scoring::Ranking;

pub const REPORT_HEADER: [&str; 2] = ["Query", "RetrievedDocuments"];

/// Write the ranking report
///
/// Header `Query,RetrievedDocuments`, then one row per query: the query
/// identifier and its documents, best first, separated by single spaces.
pub fn write_report<W: Write>(writer: W, rankings: &[Ranking]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(REPORT_HEADER)?;
    for ranking in rankings {
        let docs = ranking.hits.keys().map(String::as_str).collect::<Vec<_>>().join(" ");
        csv.write_record([ranking.query.as_str(), docs.as_str()])?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_report_file<P: AsRef<Path>>(path: P, rankings: &[Ranking]) -> Result<()> {
    write_report(File::create(path)?, rankings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::scoring::Hits;

    fn ranking(query: &str, docs: &[(&str, f64)]) -> Ranking {
        Ranking {
            query: query.to_string(),
            hits: Hits::new(docs.iter().map(|(k, s)| (k.to_string(), *s)).collect()),
        }
    }

    #[test]
    fn report_layout() {
        let rankings = vec![
            ranking("q1.query", &[("d2", -1.0), ("d1", -2.0)]),
            ranking("q2.query", &[("d1", -0.5), ("d2", -3.0)]),
        ];
        let mut out = Vec::new();
        write_report(&mut out, &rankings).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "Query,RetrievedDocuments\nq1.query,d2 d1\nq2.query,d1 d2\n");
    }

    #[test]
    fn report_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.csv");
        write_report_file(&path, &[ranking("q", &[("only", 0.0)])]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().nth(1), Some("q,only"));
    }
}
