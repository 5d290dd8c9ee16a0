// distance.rs - Distance matrix computation from a multiple alignment

use std::time::Instant;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use crate::core::compare::{DistanceModel, DEFAULT_SATURATION};
use crate::data::{DistanceMatrix, MultipleAlignment};
use crate::error::{Result, TreeError};

/// Turns an alignment into the initial distance matrix of a clustering run
pub trait DistanceCalculator {
    /// Compute a `rows × rows` matrix for `alignment`
    fn compute_matrix(&self, alignment: &dyn MultipleAlignment) -> Result<DistanceMatrix>;

    /// Short human-readable name for logs
    fn name(&self) -> String;
}

/// Direct pairwise comparison of aligned rows
#[derive(Debug, Clone)]
pub struct PairwiseDistance {
    model: DistanceModel,
    saturation: f64,
    show_progress: bool,
}

impl PairwiseDistance {
    pub fn new(model: DistanceModel) -> Self {
        Self {
            model,
            saturation: DEFAULT_SATURATION,
            show_progress: false,
        }
    }

    /// Distance used once a corrected model leaves its domain
    pub fn with_saturation(mut self, saturation: f64) -> Self {
        self.saturation = saturation;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn model(&self) -> DistanceModel {
        self.model
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {per_sec} ETA: {eta}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

impl Default for PairwiseDistance {
    fn default() -> Self {
        Self::new(DistanceModel::Clustal)
    }
}

impl DistanceCalculator for PairwiseDistance {
    fn compute_matrix(&self, alignment: &dyn MultipleAlignment) -> Result<DistanceMatrix> {
        let n_rows = alignment.num_rows();
        let mut matrix = DistanceMatrix::new(n_rows, 0.0)?;

        let start = Instant::now();
        let total_comparisons = matrix.len();
        info!(
            "Computing {} distance matrix ({} × {} = {} comparisons)",
            self.model, n_rows, n_rows, total_comparisons
        );

        let pb = self.progress_bar(total_comparisons as u64);
        let update_interval = std::cmp::max(1, total_comparisons / 100);
        let mut comparisons_done = 0;
        let mut saturated = 0usize;

        for i in 1..n_rows {
            for j in 0..i {
                let (distance, hit_saturation) =
                    self.model.distance(alignment.row(i), alignment.row(j), self.saturation);
                if hit_saturation {
                    saturated += 1;
                }
                matrix.set(i, j, distance)?;

                comparisons_done += 1;
                if comparisons_done % update_interval == 0 {
                    pb.set_position(comparisons_done as u64);
                }
            }
        }
        pb.finish_and_clear();

        if saturated > 0 {
            warn!(
                "{} of {} pairs exceeded the {} model range and were set to {}",
                saturated, total_comparisons, self.model, self.saturation
            );
        }
        info!("Distance matrix computed in {:.2}s", start.elapsed().as_secs_f64());

        Ok(matrix)
    }

    fn name(&self) -> String {
        format!("pairwise {}", self.model)
    }
}

/// Copies an externally supplied matrix, ignoring alignment content
#[derive(Debug, Clone)]
pub struct PrecomputedDistance {
    matrix: DistanceMatrix,
}

impl PrecomputedDistance {
    pub fn new(matrix: DistanceMatrix) -> Self {
        Self { matrix }
    }

    pub fn matrix(&self) -> &DistanceMatrix {
        &self.matrix
    }
}

impl DistanceCalculator for PrecomputedDistance {
    fn compute_matrix(&self, alignment: &dyn MultipleAlignment) -> Result<DistanceMatrix> {
        if self.matrix.width() != alignment.num_rows() {
            return Err(TreeError::dimension_mismatch(
                "precomputed matrix vs alignment rows",
                alignment.num_rows(),
                self.matrix.width(),
            ));
        }
        Ok(self.matrix.clone())
    }

    fn name(&self) -> String {
        format!("precomputed ({} rows)", self.matrix.width())
    }
}
