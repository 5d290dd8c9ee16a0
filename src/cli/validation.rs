// validation.rs - Input validation utilities

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use regex::Regex;
use tracing::info;
use crate::cli::args::Args;
use crate::core::{ClusterMethod, DistanceModel};
use crate::error::{Result, TreeError};
use crate::output::{MatrixFormat, TreeFormat};

/// Parsed and checked command line settings
pub struct ValidationResult {
    pub method: ClusterMethod,
    pub model: DistanceModel,
    pub tree_format: TreeFormat,
    pub matrix_format: MatrixFormat,
    pub row_include_regex: Option<Regex>,
    pub row_exclude_regex: Option<Regex>,
    pub rows_include_set: Option<HashSet<String>>,
    pub rows_exclude_set: Option<HashSet<String>>,
}

impl ValidationResult {
    /// Whether any row filter was requested
    pub fn has_row_filters(&self) -> bool {
        self.row_include_regex.is_some()
            || self.row_exclude_regex.is_some()
            || self.rows_include_set.is_some()
            || self.rows_exclude_set.is_some()
    }
}

/// Validate all command line arguments
pub fn validate_args(args: &Args) -> Result<ValidationResult> {
    if args.alignment.is_none() && args.matrix.is_none() {
        return Err(TreeError::Configuration(
            "either --alignment or --matrix is required".to_string(),
        ));
    }
    for path in [&args.alignment, &args.matrix].into_iter().flatten() {
        if !Path::new(path).exists() {
            return Err(TreeError::Configuration(format!(
                "input file '{}' does not exist",
                path
            )));
        }
    }

    let method: ClusterMethod = args.method.parse()?;
    let model: DistanceModel = args.model.parse()?;
    let tree_format: TreeFormat = args.tree_format.parse()?;
    let matrix_format: MatrixFormat = args.matrix_format.parse()?;

    if !args.saturation.is_finite() || args.saturation <= 0.0 {
        return Err(TreeError::Configuration(
            "saturation must be a positive finite distance".to_string(),
        ));
    }

    // Compile regex patterns
    let row_include_regex = args.include_rows.as_deref().map(Regex::new).transpose()?;
    let row_exclude_regex = args.exclude_rows.as_deref().map(Regex::new).transpose()?;

    // Load filter sets from files
    let rows_include_set = args
        .include_rows_list
        .as_deref()
        .map(load_set_from_file)
        .transpose()?;
    let rows_exclude_set = args
        .exclude_rows_list
        .as_deref()
        .map(load_set_from_file)
        .transpose()?;

    let result = ValidationResult {
        method,
        model,
        tree_format,
        matrix_format,
        row_include_regex,
        row_exclude_regex,
        rows_include_set,
        rows_exclude_set,
    };
    if result.has_row_filters() && args.alignment.is_none() {
        return Err(TreeError::Configuration(
            "row filters need --alignment; precomputed matrices are used as given".to_string(),
        ));
    }
    Ok(result)
}

/// Load a set of strings from a file (one per line)
pub fn load_set_from_file(file_path: &str) -> Result<HashSet<String>> {
    let file = File::open(file_path).map_err(|e| {
        TreeError::Configuration(format!("failed to open filter file '{}': {}", file_path, e))
    })?;

    let reader = BufReader::new(file);
    let mut set = HashSet::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            set.insert(trimmed.to_string());
        }
    }

    info!("Loaded {} items from filter file '{}'", set.len(), file_path);
    Ok(set)
}
