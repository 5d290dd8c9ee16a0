// csv.rs - CSV loader for labelled square distance matrices

use std::path::Path;
use crate::data::loaders::{check_row_labels, parse_distance, LabeledMatrix};
use crate::error::{Result, TreeError};

/// Load a comma-separated square matrix with a header row and labelled rows
pub fn load_csv(file_path: &Path) -> Result<LabeledMatrix> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .comment(Some(b'#'))
        .trim(::csv::Trim::All)
        .from_path(file_path)?;

    let header = reader.headers()?.clone();
    if header.len() < 2 {
        return Err(TreeError::Parse(
            "CSV header must have at least 2 columns".to_string(),
        ));
    }
    let labels: Vec<String> = header.iter().skip(1).map(str::to_string).collect();

    let mut row_labels = Vec::new();
    let mut rows = Vec::new();
    for (record_idx, record) in reader.records().enumerate() {
        let record = record?;
        let line_num = record
            .position()
            .map_or(record_idx + 2, |p| p.line() as usize);

        let mut cells = record.iter();
        let label = cells.next().unwrap_or_default().to_string();
        let values = cells
            .enumerate()
            .map(|(col, cell)| parse_distance(cell, line_num, col + 2))
            .collect::<Result<Vec<f64>>>()?;
        row_labels.push(label);
        rows.push(values);
    }

    check_row_labels(&labels, &row_labels)?;
    LabeledMatrix::from_square_rows(labels, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# Generated: now").unwrap();
        writeln!(file, "\"sample\",\"a\",\"b\",\"c\"").unwrap();
        writeln!(file, "a, 0, 2, 4").unwrap();
        writeln!(file, "b, 2, 0, 6").unwrap();
        writeln!(file, "c, 4, 6, 0").unwrap();

        let loaded = load_csv(file.path()).unwrap();
        assert_eq!(loaded.labels, vec!["a", "b", "c"]);
        assert_eq!(loaded.matrix.get(2, 1).unwrap(), 6.0);
    }

    #[test]
    fn test_ragged_csv_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sample,a,b\na,0,1\nb,1").unwrap();
        assert!(load_csv(file.path()).is_err());
    }
}
