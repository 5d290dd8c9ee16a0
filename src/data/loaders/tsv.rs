// tsv.rs - TSV loader for labelled square distance matrices

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use crate::data::loaders::{check_row_labels, parse_distance, LabeledMatrix};
use crate::error::{Result, TreeError};

/// Load a square matrix: header `<corner>\t<label>...`, then one labelled row per sample.
///
/// Lines starting with `#` and blank lines are skipped.
pub fn load_tsv(file_path: &Path) -> Result<LabeledMatrix> {
    let file = File::open(file_path)?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines().enumerate();

    // Read header
    let mut header = None;
    for (_, line) in lines.by_ref() {
        let line = line?;
        if is_skipped(&line) {
            continue;
        }
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 2 {
            return Err(TreeError::Parse(
                "TSV header must have at least 2 columns".to_string(),
            ));
        }
        header = Some(parts[1..].iter().map(|s| s.trim().to_string()).collect::<Vec<_>>());
        break;
    }
    let labels = header.ok_or_else(|| TreeError::Parse("empty TSV matrix file".to_string()))?;

    let mut row_labels = Vec::new();
    let mut rows = Vec::new();
    for (line_idx, line) in lines {
        let line = line?;
        let line_num = line_idx + 1;
        if is_skipped(&line) {
            continue;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() != labels.len() + 1 {
            return Err(TreeError::Parse(format!(
                "line {} has {} columns, expected {}",
                line_num,
                parts.len(),
                labels.len() + 1
            )));
        }

        row_labels.push(parts[0].trim().to_string());
        let values = parts[1..]
            .iter()
            .enumerate()
            .map(|(col, cell)| parse_distance(cell, line_num, col + 2))
            .collect::<Result<Vec<f64>>>()?;
        rows.push(values);
    }

    check_row_labels(&labels, &row_labels)?;
    LabeledMatrix::from_square_rows(labels, &rows)
}

fn is_skipped(line: &str) -> bool {
    line.trim().is_empty() || line.starts_with('#')
}
