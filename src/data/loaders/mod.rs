// mod.rs - Precomputed distance matrix loaders

pub mod csv;
pub mod phylip;
pub mod tsv;

use std::path::Path;
use tracing::info;
use crate::data::matrix::DistanceMatrix;
use crate::error::{Result, TreeError};

/// Distance matrix read from disk, with the row labels it was stored under
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledMatrix {
    pub labels: Vec<String>,
    pub matrix: DistanceMatrix,
}

impl LabeledMatrix {
    /// Pair labels with full square rows, checking that both agree in size
    pub fn from_square_rows(labels: Vec<String>, rows: &[Vec<f64>]) -> Result<Self> {
        if rows.len() != labels.len() {
            return Err(TreeError::dimension_mismatch(
                "matrix rows vs labels",
                labels.len(),
                rows.len(),
            ));
        }
        let matrix = DistanceMatrix::from_rows(rows)?;
        Ok(Self { labels, matrix })
    }

    pub fn width(&self) -> usize {
        self.matrix.width()
    }
}

/// Load a matrix, picking the reader from `format` or the file extension
pub fn load_matrix(path: &Path, format: Option<&str>) -> Result<LabeledMatrix> {
    let format = match format {
        Some(f) => f.to_lowercase(),
        None => path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_else(|| "tsv".to_string()),
    };

    let loaded = match format.as_str() {
        "tsv" | "txt" | "tab" => tsv::load_tsv(path)?,
        "csv" => csv::load_csv(path)?,
        "phylip" | "phy" | "dist" => phylip::load_phylip(path)?,
        other => {
            return Err(TreeError::Parse(format!(
                "unknown matrix format '{}'. Use: tsv, csv, phylip",
                other
            )))
        }
    };

    info!(
        "Loaded {} × {} distance matrix from {}",
        loaded.width(),
        loaded.width(),
        path.display()
    );
    Ok(loaded)
}

/// Parse one matrix cell; missing values are rejected
pub(crate) fn parse_distance(cell: &str, line: usize, column: usize) -> Result<f64> {
    let cleaned = cell.trim().trim_matches('"');
    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("na") || cleaned == "-" {
        return Err(TreeError::Parse(format!(
            "missing distance at line {} column {}",
            line, column
        )));
    }
    cleaned.parse::<f64>().map_err(|_| {
        TreeError::Parse(format!(
            "invalid distance '{}' at line {} column {}",
            cleaned, line, column
        ))
    })
}

/// Check that row labels repeat the header labels in the same order
pub(crate) fn check_row_labels(header: &[String], rows: &[String]) -> Result<()> {
    if header.len() != rows.len() {
        return Err(TreeError::dimension_mismatch(
            "matrix rows vs header columns",
            header.len(),
            rows.len(),
        ));
    }
    for (i, (col, row)) in header.iter().zip(rows).enumerate() {
        if col != row {
            return Err(TreeError::Parse(format!(
                "row {} is labelled '{}' but column {} is '{}'",
                i + 1,
                row,
                i + 1,
                col
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_distance() {
        assert_eq!(parse_distance(" 0.25 ", 2, 3).unwrap(), 0.25);
        assert_eq!(parse_distance("\"4\"", 2, 3).unwrap(), 4.0);
        assert!(matches!(parse_distance("NA", 2, 3), Err(TreeError::Parse(_))));
        assert!(matches!(parse_distance("x1", 2, 3), Err(TreeError::Parse(_))));
    }

    #[test]
    fn test_row_labels_must_match() {
        let header = vec!["a".to_string(), "b".to_string()];
        assert!(check_row_labels(&header, &header.clone()).is_ok());
        assert!(check_row_labels(&header, &["b".to_string(), "a".to_string()]).is_err());
        assert!(check_row_labels(&header, &["a".to_string()]).is_err());
    }

    #[test]
    fn test_load_matrix_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "sample,a,b\na,0,3\nb,3,0").unwrap();

        let loaded = load_matrix(file.path(), None).unwrap();
        assert_eq!(loaded.labels, vec!["a", "b"]);
        assert_eq!(loaded.matrix.get(1, 0).unwrap(), 3.0);

        assert!(matches!(
            load_matrix(file.path(), Some("xlsx")),
            Err(TreeError::Parse(_))
        ));
    }
}
