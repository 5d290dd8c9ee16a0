// config.rs - Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;
use crate::error::{Result, TreeError};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    // Input/Output
    pub alignment: Option<String>,
    pub matrix: Option<String>,
    pub matrix_input_format: Option<String>,
    pub output: Option<String>,
    pub tree_format: Option<String>,
    pub matrix_output: Option<String>,
    pub matrix_format: Option<String>,
    pub merge_log: Option<String>,

    // Clustering
    pub method: Option<String>,
    pub model: Option<String>,
    pub saturation: Option<f64>,

    // Row filtering
    pub include_rows: Option<String>,
    pub exclude_rows: Option<String>,
    pub include_rows_list: Option<String>,
    pub exclude_rows_list: Option<String>,

    // Flags
    pub progress: Option<bool>,
    pub verbose: Option<bool>,
    pub dry_run: Option<bool>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            TreeError::Configuration(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| TreeError::Configuration(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# aligntree.toml - Configuration file for aligntree
# Command line arguments will override these settings

# =============================================================================
# INPUT/OUTPUT
# =============================================================================

# Aligned FASTA file
alignment = "/path/to/alignment.fasta"

# Precomputed distance matrix (.tsv, .csv or .phy); used instead of the
# alignment distances when given
# matrix = "/path/to/distances.tsv"

# Precomputed matrix format: tsv, csv, phylip (default: from extension)
# matrix_input_format = "tsv"

# Output tree file
output = "tree.nwk"

# Tree format: newick, json
tree_format = "newick"

# Also write the computed distance matrix
# matrix_output = "distances.tsv"

# Distance matrix output format: tsv, csv, phylip, nexus
matrix_format = "tsv"

# Merge history (TSV)
# merge_log = "merges.tsv"

# =============================================================================
# CLUSTERING
# =============================================================================

# Clustering method: single, complete, upgma, wpgma, upgmc, wpgmc, nj
method = "upgma"

# Distance model: clustal, kimura, jukes-cantor, hamming
model = "clustal"

# Distance assigned when a corrected model (kimura, jukes-cantor) saturates
saturation = 10.0

# =============================================================================
# ROW FILTERING
# =============================================================================

# Include only rows matching regex pattern
# include_rows = "ecoli.*"

# Exclude rows matching regex pattern
# exclude_rows = "outgroup.*"

# Include only rows listed in a file (one name per line)
# include_rows_list = "keep.txt"

# Exclude rows listed in a file (one name per line)
# exclude_rows_list = "drop.txt"

# =============================================================================
# FLAGS
# =============================================================================

# Show a progress bar while computing distances
progress = false

# Enable debug logging
verbose = false

# Validate inputs without computation (dry run)
dry_run = false
"#
        .to_string()
    }
}
