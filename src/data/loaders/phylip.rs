// phylip.rs - PHYLIP distance matrix loader (square or lower-triangular)

use std::fs;
use std::path::Path;
use crate::data::loaders::{parse_distance, LabeledMatrix};
use crate::data::matrix::DistanceMatrix;
use crate::error::{Result, TreeError};

/// Load a relaxed PHYLIP matrix: a taxon count, then one line per taxon with
/// its name followed by either all `n` distances or the `i` distances below the diagonal.
pub fn load_phylip(file_path: &Path) -> Result<LabeledMatrix> {
    let content = fs::read_to_string(file_path)?;
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let (count_line, count) = lines
        .next()
        .ok_or_else(|| TreeError::Parse("empty PHYLIP file".to_string()))?;
    let n: usize = count.split_whitespace().next().unwrap_or_default().parse().map_err(|_| {
        TreeError::Parse(format!(
            "line {}: expected taxon count, found '{}'",
            count_line, count
        ))
    })?;

    // the count is untrusted until the matrix allocation accepts it
    let mut matrix = DistanceMatrix::new(n, 0.0)?;
    let mut labels = Vec::with_capacity(matrix.width());
    let mut lower_triangle: Option<bool> = None;

    for row in 0..n {
        let (line_num, line) = lines.next().ok_or_else(|| {
            TreeError::dimension_mismatch("PHYLIP taxon lines", n, row)
        })?;
        let mut fields = line.split_whitespace();
        let name = fields.next().unwrap_or_default().to_string();
        let cells: Vec<&str> = fields.collect();

        // the first row decides the layout; row 0 of a lower triangle is empty
        let lower = *lower_triangle.get_or_insert(cells.len() != n);
        let expected = if lower { row } else { n };
        if cells.len() != expected {
            return Err(TreeError::Parse(format!(
                "line {}: taxon '{}' has {} distances, expected {}",
                line_num,
                name,
                cells.len(),
                expected
            )));
        }

        for (col, cell) in cells.iter().enumerate().take(row) {
            let value = parse_distance(cell, line_num, col + 2)?;
            matrix.set(row, col, value)?;
        }
        labels.push(name);
    }

    Ok(LabeledMatrix { labels, matrix })
}
