// mod.rs - Core logic module

pub mod cluster;
pub mod compare;
pub mod distance;
pub mod linkage;
pub mod nj;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::data::{ClusterTree, DistanceMatrix, MultipleAlignment, PhyloTree};
use crate::error::{Result, TreeError};

// Re-export main types for convenience
pub use cluster::{
    agglomerate, ClusterReport, ClusterRun, ClusterStrategy, ClusteringDriver, JoinOutcome,
    MergePair, MergeStep, RunState,
};
pub use compare::{compare_rows, hamming_distance, DistanceModel, SiteStats, DEFAULT_SATURATION};
pub use distance::{DistanceCalculator, PairwiseDistance, PrecomputedDistance};
pub use linkage::{LinkageMethod, LinkageStrategy};
pub use nj::NeighborJoiningStrategy;

/// Clustering algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterMethod {
    Linkage(LinkageMethod),
    NeighborJoining,
}

impl Default for ClusterMethod {
    fn default() -> Self {
        ClusterMethod::Linkage(LinkageMethod::Upgma)
    }
}

impl FromStr for ClusterMethod {
    type Err = TreeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nj" | "neighbor-joining" | "neighbour-joining" => Ok(ClusterMethod::NeighborJoining),
            other => other.parse::<LinkageMethod>().map(ClusterMethod::Linkage).map_err(|_| {
                TreeError::UnsupportedMethod(format!(
                    "clustering method '{}'. Use: single, complete, upgma, wpgma, upgmc, wpgmc, nj",
                    s
                ))
            }),
        }
    }
}

impl fmt::Display for ClusterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterMethod::Linkage(method) => write!(f, "{}", method),
            ClusterMethod::NeighborJoining => f.write_str("nj"),
        }
    }
}

/// What to build and how to get the initial distances
pub struct TreeConfig {
    pub method: ClusterMethod,
    /// `None` compares rows directly with the Clustal model
    pub calculator: Option<Box<dyn DistanceCalculator>>,
}

impl TreeConfig {
    pub fn new(method: ClusterMethod) -> Self {
        Self {
            method,
            calculator: None,
        }
    }

    pub fn with_calculator(mut self, calculator: impl DistanceCalculator + 'static) -> Self {
        self.calculator = Some(Box::new(calculator));
        self
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new(ClusterMethod::default())
    }
}

impl fmt::Debug for TreeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeConfig")
            .field("method", &self.method)
            .field("calculator", &self.calculator.as_ref().map(|c| c.name()))
            .finish()
    }
}

/// Build a rooted tree for `alignment`; leaves carry row names when every row has one
pub fn build_tree(alignment: &dyn MultipleAlignment, config: &TreeConfig) -> Result<PhyloTree> {
    let mut tree = PhyloTree::new();
    build_tree_into(alignment, config, &mut tree)?;

    let names: Option<Vec<&str>> = (0..alignment.num_rows())
        .map(|i| alignment.row_name(i))
        .collect();
    if let Some(names) = names {
        tree.set_leaf_labels(&names)?;
    }
    Ok(tree)
}

/// Compute distances for `alignment` and grow `tree` from them
pub fn build_tree_into(
    alignment: &dyn MultipleAlignment,
    config: &TreeConfig,
    tree: &mut dyn ClusterTree,
) -> Result<ClusterReport> {
    let default_calculator;
    let calculator: &dyn DistanceCalculator = match &config.calculator {
        Some(calculator) => calculator.as_ref(),
        None => {
            default_calculator = PairwiseDistance::default();
            &default_calculator
        }
    };

    let matrix = calculator.compute_matrix(alignment)?;
    if matrix.width() != alignment.num_rows() {
        return Err(TreeError::dimension_mismatch(
            format!("{} matrix vs alignment rows", calculator.name()),
            alignment.num_rows(),
            matrix.width(),
        ));
    }
    cluster_matrix_into(matrix, config.method, tree)
}

/// Cluster an existing matrix into `tree`
pub fn cluster_matrix_into(
    matrix: DistanceMatrix,
    method: ClusterMethod,
    tree: &mut dyn ClusterTree,
) -> Result<ClusterReport> {
    match method {
        ClusterMethod::Linkage(linkage) => agglomerate(matrix, LinkageStrategy::new(linkage), tree),
        ClusterMethod::NeighborJoining => agglomerate(matrix, NeighborJoiningStrategy::new(), tree),
    }
}

/// Cluster an existing matrix into a fresh tree
pub fn cluster_matrix(matrix: DistanceMatrix, method: ClusterMethod) -> Result<(PhyloTree, ClusterReport)> {
    let mut tree = PhyloTree::new();
    let report = cluster_matrix_into(matrix, method, &mut tree)?;
    Ok((tree, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Alignment;

    #[test]
    fn test_method_from_str() {
        assert_eq!("nj".parse::<ClusterMethod>().unwrap(), ClusterMethod::NeighborJoining);
        assert_eq!(
            "Average".parse::<ClusterMethod>().unwrap(),
            ClusterMethod::Linkage(LinkageMethod::Upgma)
        );
        assert!(matches!(
            "fastme".parse::<ClusterMethod>(),
            Err(TreeError::UnsupportedMethod(_))
        ));
        assert_eq!(ClusterMethod::NeighborJoining.to_string(), "nj");
        assert_eq!(ClusterMethod::default().to_string(), "upgma");
    }

    #[test]
    fn test_build_tree_labels_leaves() {
        let alignment = Alignment::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![b"AAAA".to_vec(), b"AAAT".to_vec(), b"TTTT".to_vec()],
        )
        .unwrap();
        let tree = build_tree(&alignment, &TreeConfig::default()).unwrap();

        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(tree.label(2), Some("c"));
        let root = tree.root().unwrap();
        assert_eq!(tree.leaves_under(root).unwrap(), vec![0, 1, 2]);
        // a and b join first at p = 0.25
        assert_eq!(tree.parent(0).unwrap(), Some(3));
        assert_eq!(tree.height(3).unwrap(), 0.125);
    }

    #[test]
    fn test_precomputed_width_must_match() {
        let matrix = DistanceMatrix::new(3, 1.0).unwrap();
        let config = TreeConfig::new(ClusterMethod::NeighborJoining)
            .with_calculator(PrecomputedDistance::new(matrix));
        let result = build_tree(&["AC", "AG"], &config);
        assert!(matches!(result, Err(TreeError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_unnamed_rows_stay_unlabelled() {
        let tree = build_tree(&["ACGT", "ACGA"], &TreeConfig::default()).unwrap();
        assert_eq!(tree.label(0), None);
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn test_cluster_matrix() {
        let matrix = DistanceMatrix::from_rows(&[
            vec![0.0, 2.0, 6.0],
            vec![2.0, 0.0, 6.0],
            vec![6.0, 6.0, 0.0],
        ])
        .unwrap();
        let (tree, report) =
            cluster_matrix(matrix, ClusterMethod::Linkage(LinkageMethod::Complete)).unwrap();
        assert_eq!(report.root, 4);
        assert_eq!(tree.height(4).unwrap(), 3.0);
    }
}
