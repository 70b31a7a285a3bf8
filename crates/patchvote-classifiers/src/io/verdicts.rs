use std::path::Path;

use csv::WriterBuilder;

use crate::error::{PatchvoteError, Result};
use crate::evaluate::Classification;

fn csv_error(path: &Path, e: csv::Error) -> PatchvoteError {
    PatchvoteError::io(path, std::io::Error::from(e))
}

/// Write one `group / truth / verdict` row per classified group as TSV.
pub fn write_verdicts_tsv<P: AsRef<Path>>(
    path: P,
    classification: &Classification,
) -> Result<()> {
    let path = path.as_ref();
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    writer
        .write_record(["group", "truth", "verdict"])
        .map_err(|e| csv_error(path, e))?;
    for (label, truth, verdict) in classification.rows() {
        let truth = truth.to_string();
        let verdict = verdict.to_string();
        writer
            .write_record([label, truth.as_str(), verdict.as_str()])
            .map_err(|e| csv_error(path, e))?;
    }
    writer.flush().map_err(|e| PatchvoteError::io(path, e))?;

    log::info!(
        "Wrote {} verdicts to {}",
        classification.verdicts.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::AggregationMethod;
    use std::collections::BTreeMap;

    #[test]
    fn writes_header_and_sorted_rows() {
        let mut verdicts = BTreeMap::new();
        let mut truths = BTreeMap::new();
        verdicts.insert("vg_2".to_string(), 1);
        verdicts.insert("nvg_1".to_string(), 1);
        truths.insert("vg_2".to_string(), 1);
        truths.insert("nvg_1".to_string(), 0);
        let classification = Classification {
            method: AggregationMethod::Far,
            verdicts,
            truths,
            failures: Vec::new(),
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verdicts.tsv");
        write_verdicts_tsv(&path, &classification).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "group\ttruth\tverdict\nnvg_1\t0\t1\nvg_2\t1\t1\n");
    }
}
