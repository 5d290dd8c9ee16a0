// alignment.rs - Multiple alignment input for distance computation

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use bio::io::fasta;
use regex::Regex;
use tracing::{info, warn};
use crate::error::{Result, TreeError};

/// Read-only view of a positionally aligned set of sequences
pub trait MultipleAlignment {
    /// Number of aligned rows (sequences)
    fn num_rows(&self) -> usize;

    /// Residues of row `index`, gaps included
    fn row(&self, index: usize) -> &[u8];

    /// Optional display name of row `index`
    fn row_name(&self, _index: usize) -> Option<&str> {
        None
    }
}

impl<S: AsRef<[u8]>, const N: usize> MultipleAlignment for [S; N] {
    fn num_rows(&self) -> usize {
        self.len()
    }

    fn row(&self, index: usize) -> &[u8] {
        self[index].as_ref()
    }
}

impl<S: AsRef<[u8]>> MultipleAlignment for Vec<S> {
    fn num_rows(&self) -> usize {
        self.len()
    }

    fn row(&self, index: usize) -> &[u8] {
        self[index].as_ref()
    }
}

/// Named, equal-length aligned rows
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    names: Vec<String>,
    rows: Vec<Vec<u8>>,
}

impl Alignment {
    /// Create an alignment, checking that names and rows line up and all rows share one length
    pub fn new(names: Vec<String>, rows: Vec<Vec<u8>>) -> Result<Self> {
        if names.len() != rows.len() {
            return Err(TreeError::dimension_mismatch(
                "alignment names vs rows",
                rows.len(),
                names.len(),
            ));
        }
        if let Some(first) = rows.first() {
            let columns = first.len();
            for (name, row) in names.iter().zip(&rows) {
                if row.len() != columns {
                    return Err(TreeError::InvalidAlignment(format!(
                        "row '{}' has {} columns, expected {}",
                        name,
                        row.len(),
                        columns
                    )));
                }
            }
        }
        Ok(Self { names, rows })
    }

    /// Load an aligned FASTA file
    pub fn from_fasta(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader = fasta::Reader::new(BufReader::new(file));

        let mut names = Vec::new();
        let mut rows = Vec::new();
        for record_result in reader.records() {
            let record = record_result.map_err(|e| {
                TreeError::InvalidAlignment(format!(
                    "invalid FASTA record in {}: {}",
                    path.display(),
                    e
                ))
            })?;
            names.push(record.id().to_string());
            rows.push(record.seq().to_vec());
        }

        if rows.is_empty() {
            return Err(TreeError::InvalidAlignment(format!(
                "no sequences found in {}",
                path.display()
            )));
        }

        let alignment = Self::new(names, rows)?;
        info!(
            rows = alignment.num_rows(),
            columns = alignment.num_columns(),
            "Alignment loaded from {}",
            path.display()
        );
        Ok(alignment)
    }

    /// Number of alignment columns
    pub fn num_columns(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Keep only rows whose names pass every supplied filter
    pub fn filter_rows(
        &mut self,
        include: Option<&Regex>,
        exclude: Option<&Regex>,
        include_set: Option<&HashSet<String>>,
        exclude_set: Option<&HashSet<String>>,
    ) {
        let before = self.rows.len();
        let keep: Vec<bool> = self
            .names
            .iter()
            .map(|name| {
                include.map_or(true, |re| re.is_match(name))
                    && !exclude.is_some_and(|re| re.is_match(name))
                    && include_set.map_or(true, |set| set.contains(name))
                    && !exclude_set.is_some_and(|set| set.contains(name))
            })
            .collect();

        let mut flags = keep.iter();
        self.names.retain(|_| *flags.next().unwrap_or(&false));
        let mut flags = keep.iter();
        self.rows.retain(|_| *flags.next().unwrap_or(&false));

        let removed = before - self.rows.len();
        if removed > 0 {
            info!("Row filters removed {} of {} rows", removed, before);
        }
        if self.rows.is_empty() && before > 0 {
            warn!("Row filters removed every row of the alignment");
        }
    }
}

impl MultipleAlignment for Alignment {
    fn num_rows(&self) -> usize {
        self.rows.len()
    }

    fn row(&self, index: usize) -> &[u8] {
        &self.rows[index]
    }

    fn row_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }
}
