// merge.rs - Merge configuration file with CLI arguments

use crate::cli::{Args, Config};
use crate::error::Result;

impl Args {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: Config) -> Self {
        // Input/Output
        if self.alignment.is_none() {
            self.alignment = config.alignment;
        }
        if self.matrix.is_none() {
            self.matrix = config.matrix;
        }
        if self.matrix_input_format.is_none() {
            self.matrix_input_format = config.matrix_input_format;
        }
        if self.output.is_none() {
            self.output = config.output;
        }
        if self.matrix_output.is_none() {
            self.matrix_output = config.matrix_output;
        }
        if self.merge_log.is_none() {
            self.merge_log = config.merge_log;
        }

        // Settings with defaults (only override defaults, not explicit CLI values)
        if let Some(tree_format) = config.tree_format.filter(|_| self.tree_format == "newick") {
            self.tree_format = tree_format;
        }
        if let Some(matrix_format) = config.matrix_format.filter(|_| self.matrix_format == "tsv") {
            self.matrix_format = matrix_format;
        }
        if let Some(method) = config.method.filter(|_| self.method == "upgma") {
            self.method = method;
        }
        if let Some(model) = config.model.filter(|_| self.model == "clustal") {
            self.model = model;
        }
        if let Some(saturation) = config.saturation.filter(|_| self.saturation == 10.0) {
            self.saturation = saturation;
        }

        // Row filtering
        if self.include_rows.is_none() {
            self.include_rows = config.include_rows;
        }
        if self.exclude_rows.is_none() {
            self.exclude_rows = config.exclude_rows;
        }
        if self.include_rows_list.is_none() {
            self.include_rows_list = config.include_rows_list;
        }
        if self.exclude_rows_list.is_none() {
            self.exclude_rows_list = config.exclude_rows_list;
        }

        // Flags (CLI flags take precedence, config only sets if not explicitly set)
        if !self.progress && config.progress.unwrap_or(false) {
            self.progress = true;
        }
        if !self.verbose && config.verbose.unwrap_or(false) {
            self.verbose = true;
        }
        if !self.dry_run && config.dry_run.unwrap_or(false) {
            self.dry_run = true;
        }

        self
    }

    /// Load configuration and merge with CLI args
    pub fn with_config_file(self, config_path: &str) -> Result<Self> {
        let config = Config::from_file(config_path)?;
        Ok(self.merge_with_config(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh::FromArgs;

    fn parse(args: &[&str]) -> Args {
        Args::from_args(&["aligntree"], args).unwrap()
    }

    #[test]
    fn test_config_fills_defaults_only() {
        let args = parse(&["--alignment", "cli.fasta", "--method", "nj"]);
        let config = Config {
            alignment: Some("file.fasta".to_string()),
            method: Some("single".to_string()),
            model: Some("kimura".to_string()),
            merge_log: Some("merges.tsv".to_string()),
            progress: Some(true),
            ..Config::default()
        };

        let merged = args.merge_with_config(config);
        assert_eq!(merged.alignment.as_deref(), Some("cli.fasta"));
        assert_eq!(merged.method, "nj");
        assert_eq!(merged.model, "kimura");
        assert_eq!(merged.merge_log.as_deref(), Some("merges.tsv"));
        assert!(merged.progress);
        assert!(!merged.dry_run);
    }

    #[test]
    fn test_empty_config_changes_nothing() {
        let merged = parse(&["--saturation", "4.5"]).merge_with_config(Config::new());
        assert_eq!(merged.saturation, 4.5);
        assert_eq!(merged.tree_format, "newick");
        assert_eq!(merged.alignment, None);
    }
}
