// cluster.rs - Generic agglomerative clustering driver

//! The merge loop shared by every clustering strategy.
//!
//! Each step asks the strategy for the pair to merge, relocates that pair
//! into the last two rows of the working matrix, lets the strategy join the
//! two clusters in the tree and rewrite distances into the surviving row,
//! then drops the last row. The run context ([`ClusterRun`]) owns the
//! shrinking matrix and the row → tree node map for the whole run.

use std::time::Instant;
use serde::Serialize;
use tracing::{debug, info};
use crate::data::{ClusterTree, DistanceMatrix, MatrixCoord, NodeId};
use crate::error::{Result, TreeError};

/// Lifecycle of a clustering run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Matrix computed, leaves allocated, identity index map
    Initialized,
    /// At least one merge done, more than one cluster left
    Merging,
    /// One cluster left
    Done,
}

/// Rows taking part in a merge: `absorbed` is dropped by the shrink,
/// `survivor` receives the merged cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergePair {
    pub survivor: usize,
    pub absorbed: usize,
}

/// What a strategy reports after joining two clusters in the tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinOutcome {
    pub node: NodeId,
    pub absorbed_weight: f64,
    pub survivor_weight: f64,
    pub height: f64,
}

/// One merge of the run, in tree-node terms
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeStep {
    pub step: usize,
    pub first: NodeId,
    pub second: NodeId,
    pub distance: f64,
    pub first_weight: f64,
    pub second_weight: f64,
    pub node: NodeId,
    pub height: f64,
}

/// Result of a complete run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterReport {
    pub root: NodeId,
    pub steps: Vec<MergeStep>,
}

/// Mutable state of one clustering run
#[derive(Debug, Clone)]
pub struct ClusterRun {
    matrix: DistanceMatrix,
    index_map: Vec<NodeId>,
    leaf_count: usize,
    steps: Vec<MergeStep>,
}

impl ClusterRun {
    /// Start a run over `matrix`; row `i` represents leaf `i`
    pub fn new(matrix: DistanceMatrix) -> Self {
        let leaf_count = matrix.width();
        Self {
            index_map: (0..leaf_count).collect(),
            matrix,
            leaf_count,
            steps: Vec::with_capacity(leaf_count.saturating_sub(1)),
        }
    }

    pub fn matrix(&self) -> &DistanceMatrix {
        &self.matrix
    }

    pub fn matrix_mut(&mut self) -> &mut DistanceMatrix {
        &mut self.matrix
    }

    /// Number of active clusters
    pub fn width(&self) -> usize {
        self.matrix.width()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn index_map(&self) -> &[NodeId] {
        &self.index_map
    }

    /// Tree node currently represented by matrix row `row`
    pub fn node_at(&self, row: usize) -> Result<NodeId> {
        self.index_map.get(row).copied().ok_or_else(|| {
            TreeError::InvalidIndex(format!(
                "row {} out of range for {} active clusters",
                row,
                self.index_map.len()
            ))
        })
    }

    pub fn distance(&self, a: usize, b: usize) -> Result<f64> {
        self.matrix.get(a, b)
    }

    pub fn merges_done(&self) -> usize {
        self.steps.len()
    }

    pub fn steps(&self) -> &[MergeStep] {
        &self.steps
    }

    pub fn state(&self) -> RunState {
        if self.width() <= 1 {
            RunState::Done
        } else if self.steps.is_empty() {
            RunState::Initialized
        } else {
            RunState::Merging
        }
    }

    fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        self.matrix.swap(a, b)?;
        self.index_map.swap(a, b);
        Ok(())
    }

    /// Drop the last row and hand the surviving slot to `node`
    fn shrink(&mut self, survivor: usize, node: NodeId) -> Result<()> {
        self.matrix.shrink()?;
        self.index_map.pop();
        match self.index_map.get_mut(survivor) {
            Some(slot) => {
                *slot = node;
                Ok(())
            }
            None => Err(TreeError::InvalidIndex(format!(
                "surviving row {} vanished in shrink",
                survivor
            ))),
        }
    }
}

/// Numerically specific steps of an agglomerative method.
///
/// `swap` and `shrink` keep auxiliary per-row arrays aligned with the
/// working matrix; strategies without such arrays can ignore them.
pub trait ClusterStrategy {
    fn name(&self) -> String;

    /// Set up auxiliary state from the initial matrix
    fn initialize(&mut self, _run: &ClusterRun) -> Result<()> {
        Ok(())
    }

    /// Coordinates of the pair to merge next
    fn find_minimum(&self, run: &ClusterRun) -> Result<MatrixCoord>;

    /// Create the parent node of the two rows in `pair`
    fn join(
        &mut self,
        run: &ClusterRun,
        pair: MergePair,
        tree: &mut dyn ClusterTree,
    ) -> Result<JoinOutcome>;

    /// Write distances from every other cluster to the merged one into `pair.survivor`
    fn update_distances(&mut self, run: &mut ClusterRun, pair: MergePair) -> Result<()>;

    fn swap(&mut self, _a: usize, _b: usize) {}

    fn shrink(&mut self) {}
}

/// Drives a strategy over a run until one cluster is left
pub struct ClusteringDriver<S: ClusterStrategy> {
    run: ClusterRun,
    strategy: S,
}

impl<S: ClusterStrategy> ClusteringDriver<S> {
    /// Allocate leaves in `tree` and initialize the strategy
    pub fn new(matrix: DistanceMatrix, mut strategy: S, tree: &mut dyn ClusterTree) -> Result<Self> {
        if matrix.width() == 0 {
            return Err(TreeError::InvalidIndex(
                "cannot cluster an empty distance matrix".to_string(),
            ));
        }

        tree.set_leaf_count(matrix.width());
        let run = ClusterRun::new(matrix);
        strategy.initialize(&run)?;
        Ok(Self { run, strategy })
    }

    pub fn run(&self) -> &ClusterRun {
        &self.run
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn state(&self) -> RunState {
        self.run.state()
    }

    fn relocate(&mut self, a: usize, b: usize) -> Result<()> {
        self.run.swap(a, b)?;
        self.strategy.swap(a, b);
        Ok(())
    }

    /// Perform one merge
    pub fn step(&mut self, tree: &mut dyn ClusterTree) -> Result<MergeStep> {
        let width = self.run.width();
        if width < 2 {
            return Err(TreeError::InvalidIndex(
                "no clusters left to merge".to_string(),
            ));
        }
        let last = width - 1;
        let second_last = width - 2;

        let coord = self.strategy.find_minimum(&self.run)?;
        if coord.row == coord.col {
            return Err(TreeError::InvalidIndex(format!(
                "strategy selected diagonal pair ({}, {})",
                coord.row, coord.col
            )));
        }

        // If the second cluster sits in the last row, the first swap moves it
        self.relocate(coord.row, last)?;
        let second = if coord.col == last { coord.row } else { coord.col };
        self.relocate(second, second_last)?;

        let pair = MergePair {
            survivor: second_last,
            absorbed: last,
        };
        let distance = self.run.distance(pair.absorbed, pair.survivor)?;
        let first = self.run.node_at(pair.absorbed)?;
        let second = self.run.node_at(pair.survivor)?;

        let joined = self.strategy.join(&self.run, pair, tree)?;
        self.strategy.update_distances(&mut self.run, pair)?;
        self.run.shrink(pair.survivor, joined.node)?;
        self.strategy.shrink();

        let step = MergeStep {
            step: self.run.merges_done() + 1,
            first,
            second,
            distance,
            first_weight: joined.absorbed_weight,
            second_weight: joined.survivor_weight,
            node: joined.node,
            height: joined.height,
        };
        debug!(
            step = step.step,
            first = step.first,
            second = step.second,
            distance = step.distance,
            node = step.node,
            height = step.height,
            "Merged clusters"
        );
        #[cfg(feature = "debug-stats")]
        if let (Ok(min), Ok(max)) = (self.run.matrix.minimum(), self.run.matrix.maximum()) {
            debug!(width = self.run.width(), min, max, "Working matrix after merge");
        }

        self.run.steps.push(step.clone());
        Ok(step)
    }

    /// Merge until one cluster is left
    pub fn finish(mut self, tree: &mut dyn ClusterTree) -> Result<ClusterReport> {
        while self.run.width() > 1 {
            self.step(tree)?;
        }
        let root = self.run.node_at(0)?;
        Ok(ClusterReport {
            root,
            steps: self.run.steps,
        })
    }
}

/// Run a strategy to completion over `matrix`, growing `tree`
pub fn agglomerate<S: ClusterStrategy>(
    matrix: DistanceMatrix,
    strategy: S,
    tree: &mut dyn ClusterTree,
) -> Result<ClusterReport> {
    let start = Instant::now();
    let leaves = matrix.width();
    let name = strategy.name();
    info!("Clustering {} leaves with {}", leaves, name);

    let driver = ClusteringDriver::new(matrix, strategy, tree)?;
    let report = driver.finish(tree)?;

    info!(
        "{} finished: {} merges in {:.3}s",
        name,
        report.steps.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(report)
}
