// linkage.rs - Hierarchical linkage strategies (single, complete, UPGMA, WPGMA, UPGMC, WPGMC)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;
use crate::core::cluster::{ClusterRun, ClusterStrategy, JoinOutcome, MergePair};
use crate::data::{ClusterTree, MatrixCoord};
use crate::error::{Result, TreeError};

/// Distance update rule applied after each merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkageMethod {
    /// Nearest neighbour
    Single,
    /// Farthest neighbour
    Complete,
    /// Unweighted pair group, size-weighted average
    Upgma,
    /// Weighted pair group, plain average
    Wpgma,
    /// Unweighted centroid
    Upgmc,
    /// Weighted centroid (median)
    Wpgmc,
}

impl FromStr for LinkageMethod {
    type Err = TreeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" | "nearest" => Ok(LinkageMethod::Single),
            "complete" | "farthest" => Ok(LinkageMethod::Complete),
            "upgma" | "average" => Ok(LinkageMethod::Upgma),
            "wpgma" | "mcquitty" => Ok(LinkageMethod::Wpgma),
            "upgmc" | "centroid" => Ok(LinkageMethod::Upgmc),
            "wpgmc" | "median" => Ok(LinkageMethod::Wpgmc),
            _ => Err(TreeError::UnsupportedMethod(format!(
                "linkage method '{}'. Use: single, complete, upgma, wpgma, upgmc, wpgmc",
                s
            ))),
        }
    }
}

impl fmt::Display for LinkageMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkageMethod::Single => "single",
            LinkageMethod::Complete => "complete",
            LinkageMethod::Upgma => "upgma",
            LinkageMethod::Wpgma => "wpgma",
            LinkageMethod::Upgmc => "upgmc",
            LinkageMethod::Wpgmc => "wpgmc",
        };
        f.write_str(name)
    }
}

impl LinkageMethod {
    /// Distance from `s` to the union of clusters 1 and 2.
    ///
    /// `d1s`/`d2s` are the pre-merge distances to `s`, `d12` the merge distance,
    /// `n1`/`n2` the leaf counts of the merged clusters.
    pub fn combine(self, d1s: f64, d2s: f64, d12: f64, n1: usize, n2: usize) -> f64 {
        let (n1, n2) = (n1 as f64, n2 as f64);
        let total = n1 + n2;
        match self {
            LinkageMethod::Single => d1s.min(d2s),
            LinkageMethod::Complete => d1s.max(d2s),
            LinkageMethod::Upgma => (n1 * d1s + n2 * d2s) / total,
            LinkageMethod::Wpgma => (d1s + d2s) / 2.0,
            LinkageMethod::Upgmc => {
                (n1 * d1s + n2 * d2s) / total - n1 * n2 * d12 / (total * total)
            }
            LinkageMethod::Wpgmc => (d1s + d2s) / 2.0 - d12 / 4.0,
        }
    }
}

/// Ultrametric clustering: every merge sits at half the merge distance
#[derive(Debug, Clone)]
pub struct LinkageStrategy {
    method: LinkageMethod,
    /// Leaf count of the cluster in each active row
    sizes: Vec<usize>,
}

impl LinkageStrategy {
    pub fn new(method: LinkageMethod) -> Self {
        Self {
            method,
            sizes: Vec::new(),
        }
    }

    pub fn method(&self) -> LinkageMethod {
        self.method
    }

    pub fn cluster_sizes(&self) -> &[usize] {
        &self.sizes
    }

    fn size(&self, row: usize) -> Result<usize> {
        self.sizes.get(row).copied().ok_or_else(|| {
            TreeError::InvalidIndex(format!("no cluster size tracked for row {}", row))
        })
    }
}

impl ClusterStrategy for LinkageStrategy {
    fn name(&self) -> String {
        format!("{} linkage", self.method)
    }

    fn initialize(&mut self, run: &ClusterRun) -> Result<()> {
        self.sizes = vec![1; run.width()];
        Ok(())
    }

    fn find_minimum(&self, run: &ClusterRun) -> Result<MatrixCoord> {
        let (_, coord) = run.matrix().minimum_with_coord()?;
        Ok(coord)
    }

    fn join(
        &mut self,
        run: &ClusterRun,
        pair: MergePair,
        tree: &mut dyn ClusterTree,
    ) -> Result<JoinOutcome> {
        let distance = run.distance(pair.absorbed, pair.survivor)?;
        let absorbed = run.node_at(pair.absorbed)?;
        let survivor = run.node_at(pair.survivor)?;

        let half = distance / 2.0;
        let absorbed_height = tree.height(absorbed)?;
        let absorbed_weight = half - absorbed_height;
        let survivor_weight = half - tree.height(survivor)?;
        if absorbed_weight < 0.0 || survivor_weight < 0.0 {
            // centroid methods are not monotone
            warn!(absorbed, survivor, distance, "Negative branch weight in {} linkage", self.method);
        }

        let node = tree.join_nodes(absorbed, survivor, absorbed_weight, survivor_weight)?;
        let height = absorbed_height + absorbed_weight;
        tree.set_height(node, height)?;

        Ok(JoinOutcome {
            node,
            absorbed_weight,
            survivor_weight,
            height,
        })
    }

    fn update_distances(&mut self, run: &mut ClusterRun, pair: MergePair) -> Result<()> {
        let d12 = run.distance(pair.absorbed, pair.survivor)?;
        let n1 = self.size(pair.absorbed)?;
        let n2 = self.size(pair.survivor)?;

        for s in 0..run.width() {
            if s == pair.absorbed || s == pair.survivor {
                continue;
            }
            let d1s = run.distance(pair.absorbed, s)?;
            let d2s = run.distance(pair.survivor, s)?;
            let merged = self.method.combine(d1s, d2s, d12, n1, n2);
            run.matrix_mut().set(pair.survivor, s, merged)?;
        }

        self.sizes[pair.survivor] = n1 + n2;
        Ok(())
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.sizes.swap(a, b);
    }

    fn shrink(&mut self) {
        self.sizes.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cluster::{agglomerate, ClusteringDriver};
    use crate::data::{DistanceMatrix, PhyloTree};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn sorted_pair(a: usize, b: usize) -> [usize; 2] {
        if a < b { [a, b] } else { [b, a] }
    }

    fn five_leaves() -> DistanceMatrix {
        DistanceMatrix::from_rows(&[
            vec![0.0, 4.0, 7.0, 4.0, 7.0],
            vec![4.0, 0.0, 7.0, 2.0, 7.0],
            vec![7.0, 7.0, 0.0, 7.0, 2.0],
            vec![4.0, 2.0, 7.0, 0.0, 7.0],
            vec![7.0, 7.0, 2.0, 7.0, 0.0],
        ])
        .unwrap()
    }

    fn classic() -> DistanceMatrix {
        DistanceMatrix::from_rows(&[
            vec![0.0, 17.0, 21.0, 31.0, 23.0],
            vec![17.0, 0.0, 30.0, 34.0, 21.0],
            vec![21.0, 30.0, 0.0, 28.0, 39.0],
            vec![31.0, 34.0, 28.0, 0.0, 43.0],
            vec![23.0, 21.0, 39.0, 43.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("UPGMA".parse::<LinkageMethod>().unwrap(), LinkageMethod::Upgma);
        assert_eq!("average".parse::<LinkageMethod>().unwrap(), LinkageMethod::Upgma);
        assert_eq!("centroid".parse::<LinkageMethod>().unwrap(), LinkageMethod::Upgmc);
        assert_eq!("median".parse::<LinkageMethod>().unwrap(), LinkageMethod::Wpgmc);
        assert!(matches!(
            "ward".parse::<LinkageMethod>(),
            Err(TreeError::UnsupportedMethod(_))
        ));
        assert_eq!(LinkageMethod::Wpgma.to_string(), "wpgma");
    }

    #[test]
    fn test_combine_formulas() {
        let (d1s, d2s, d12) = (4.0, 8.0, 2.0);
        assert_eq!(LinkageMethod::Single.combine(d1s, d2s, d12, 1, 3), 4.0);
        assert_eq!(LinkageMethod::Complete.combine(d1s, d2s, d12, 1, 3), 8.0);
        assert_eq!(LinkageMethod::Wpgma.combine(d1s, d2s, d12, 1, 3), 6.0);
        assert!(close(LinkageMethod::Upgma.combine(d1s, d2s, d12, 1, 3), 7.0));
        assert!(close(LinkageMethod::Upgmc.combine(d1s, d2s, d12, 1, 3), 7.0 - 3.0 * 2.0 / 16.0));
        assert!(close(LinkageMethod::Wpgmc.combine(d1s, d2s, d12, 1, 3), 5.5));
    }

    #[test]
    fn test_upgma_picks_closest_pair_first() {
        let mut tree = PhyloTree::new();
        let report = agglomerate(five_leaves(), LinkageStrategy::new(LinkageMethod::Upgma), &mut tree).unwrap();

        let merges: Vec<[usize; 2]> = report.steps.iter().map(|s| sorted_pair(s.first, s.second)).collect();
        assert_eq!(merges, vec![[1, 3], [2, 4], [0, 5], [6, 7]]);
        let heights: Vec<f64> = report.steps.iter().map(|s| s.height).collect();
        assert_eq!(heights, vec![1.0, 1.0, 2.0, 3.5]);
        assert_eq!(report.root, 8);
        assert_eq!(tree.root(), Some(8));
    }

    #[test]
    fn test_upgma_height_is_half_distance() {
        let mut tree = PhyloTree::new();
        let report = agglomerate(classic(), LinkageStrategy::new(LinkageMethod::Upgma), &mut tree).unwrap();

        for step in &report.steps {
            assert!(close(step.height, step.distance / 2.0));
            assert!(close(tree.height(step.node).unwrap(), step.height));
        }
        let heights: Vec<f64> = report.steps.iter().map(|s| s.height).collect();
        assert_eq!(heights, vec![8.5, 11.0, 14.0, 16.5]);

        let merges: Vec<[usize; 2]> = report.steps.iter().map(|s| sorted_pair(s.first, s.second)).collect();
        assert_eq!(merges, vec![[0, 1], [4, 5], [2, 3], [6, 7]]);

        // branch weights of the first join put both leaves at the node height
        assert_eq!(report.steps[0].first_weight, 8.5);
        assert_eq!(report.steps[0].second_weight, 8.5);
        let second = &report.steps[1];
        let inner_weight = if second.first == 5 { second.first_weight } else { second.second_weight };
        assert!(close(inner_weight + 8.5, 11.0));
    }

    #[test]
    fn test_every_method_finishes_four_leaves() {
        let matrix = DistanceMatrix::from_rows(&[
            vec![0.0, 0.3, 0.5, 0.6],
            vec![0.3, 0.0, 0.6, 0.5],
            vec![0.5, 0.6, 0.0, 0.9],
            vec![0.6, 0.5, 0.9, 0.0],
        ])
        .unwrap();

        for method in [
            LinkageMethod::Single,
            LinkageMethod::Complete,
            LinkageMethod::Upgma,
            LinkageMethod::Wpgma,
            LinkageMethod::Upgmc,
            LinkageMethod::Wpgmc,
        ] {
            let mut tree = PhyloTree::new();
            let mut driver = ClusteringDriver::new(matrix.clone(), LinkageStrategy::new(method), &mut tree).unwrap();
            for _ in 0..3 {
                driver.step(&mut tree).unwrap();
            }
            assert_eq!(driver.run().width(), 1, "{}", method);
            assert_eq!(driver.strategy().cluster_sizes(), &[4], "{}", method);
            assert_eq!(tree.node_count(), 7, "{}", method);
        }
    }

    #[test]
    fn test_sizes_follow_rows() {
        let mut tree = PhyloTree::new();
        let strategy = LinkageStrategy::new(LinkageMethod::Upgma);
        let mut driver = ClusteringDriver::new(five_leaves(), strategy, &mut tree).unwrap();

        driver.step(&mut tree).unwrap();
        assert_eq!(driver.strategy().cluster_sizes(), &[1, 1, 1, 2]);
        // leaf 0 averaged against leaves 1 and 3
        assert_eq!(driver.run().distance(3, 0).unwrap(), 4.0);

        driver.step(&mut tree).unwrap();
        assert_eq!(driver.strategy().cluster_sizes(), &[1, 2, 2]);
    }
}
