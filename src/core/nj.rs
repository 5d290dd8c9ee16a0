// nj.rs - Neighbor-joining strategy (Saitou & Nei)

//! Neighbor joining on the shared driver.
//!
//! The strategy keeps one accumulator per active row,
//! `R[i] = sum_k d(i, k) / (active - 2)`, updated incrementally on every
//! merge. With two or fewer clusters left the divisor vanishes and every
//! accumulator is zero.

use tracing::{trace, warn};
use crate::core::cluster::{ClusterRun, ClusterStrategy, JoinOutcome, MergePair};
use crate::data::{ClusterTree, MatrixCoord};
use crate::error::{Result, TreeError};

#[derive(Debug, Clone, Default)]
pub struct NeighborJoiningStrategy {
    accumulator: Vec<f64>,
}

/// Scale a row sum by `active - 2`
#[inline]
fn scaled(sum: f64, active: usize) -> f64 {
    if active > 2 {
        sum / (active - 2) as f64
    } else {
        0.0
    }
}

impl NeighborJoiningStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current `R` value of every active row
    pub fn accumulator(&self) -> &[f64] {
        &self.accumulator
    }

    fn r(&self, row: usize) -> Result<f64> {
        self.accumulator.get(row).copied().ok_or_else(|| {
            TreeError::InvalidIndex(format!("no accumulator tracked for row {}", row))
        })
    }

    /// Recompute every accumulator from the matrix
    pub fn accumulate(run: &ClusterRun) -> Vec<f64> {
        let width = run.width();
        let mut sums = vec![0.0; width];
        for (coord, value) in run.matrix().iter_pairs() {
            sums[coord.row] += value;
            sums[coord.col] += value;
        }
        sums.into_iter().map(|sum| scaled(sum, width)).collect()
    }
}

impl ClusterStrategy for NeighborJoiningStrategy {
    fn name(&self) -> String {
        "neighbor joining".to_string()
    }

    fn initialize(&mut self, run: &ClusterRun) -> Result<()> {
        self.accumulator = Self::accumulate(run);
        Ok(())
    }

    /// Pair minimising `d(i, j) - R[i] - R[j]`, first in scan order on ties
    fn find_minimum(&self, run: &ClusterRun) -> Result<MatrixCoord> {
        let mut best: Option<(f64, MatrixCoord)> = None;
        for (coord, value) in run.matrix().iter_pairs() {
            let q = value - self.r(coord.row)? - self.r(coord.col)?;
            if q.is_nan() {
                continue;
            }
            if best.map_or(true, |(b, _)| q < b) {
                best = Some((q, coord));
            }
        }
        best.map(|(_, coord)| coord).ok_or_else(|| {
            TreeError::InvalidIndex(format!(
                "no comparable pair among {} active clusters",
                run.width()
            ))
        })
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

        let absorbed_weight = (distance + self.r(pair.absorbed)? - self.r(pair.survivor)?) / 2.0;
        let survivor_weight = distance - absorbed_weight;
        if absorbed_weight < 0.0 || survivor_weight < 0.0 {
            warn!(absorbed, survivor, absorbed_weight, survivor_weight, "Negative neighbor-joining branch length");
        }

        let node = tree.join_nodes(absorbed, survivor, absorbed_weight, survivor_weight)?;
        let height = (tree.height(absorbed)? + absorbed_weight)
            .max(tree.height(survivor)? + survivor_weight);
        tree.set_height(node, height)?;

        Ok(JoinOutcome {
            node,
            absorbed_weight,
            survivor_weight,
            height,
        })
    }

    fn update_distances(&mut self, run: &mut ClusterRun, pair: MergePair) -> Result<()> {
        let width = run.width();
        let remaining = width - 1;
        let d12 = run.distance(pair.absorbed, pair.survivor)?;
        let mut merged_sum = 0.0;

        for s in 0..width {
            if s == pair.absorbed || s == pair.survivor {
                continue;
            }
            let d1s = run.distance(pair.absorbed, s)?;
            let d2s = run.distance(pair.survivor, s)?;
            let dks = (d1s + d2s - d12) / 2.0;

            // back to a raw row sum, swap the two old terms for the merged one
            let sum = self.r(s)? * (width - 2) as f64 - d1s - d2s + dks;
            self.accumulator[s] = scaled(sum, remaining);
            merged_sum += dks;

            run.matrix_mut().set(pair.survivor, s, dks)?;
        }

        self.accumulator[pair.survivor] = scaled(merged_sum, remaining);
        trace!(width = remaining, "Accumulators updated");
        Ok(())
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.accumulator.swap(a, b);
    }

    fn shrink(&mut self) {
        self.accumulator.pop();
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

    fn four_leaves() -> DistanceMatrix {
        DistanceMatrix::from_rows(&[
            vec![0.0, 0.3, 0.5, 0.6],
            vec![0.3, 0.0, 0.6, 0.5],
            vec![0.5, 0.6, 0.0, 0.9],
            vec![0.6, 0.5, 0.9, 0.0],
        ])
        .unwrap()
    }

    fn five_taxa() -> DistanceMatrix {
        DistanceMatrix::from_rows(&[
            vec![0.0, 5.0, 9.0, 9.0, 8.0],
            vec![5.0, 0.0, 10.0, 10.0, 9.0],
            vec![9.0, 10.0, 0.0, 8.0, 7.0],
            vec![9.0, 10.0, 8.0, 0.0, 3.0],
            vec![8.0, 9.0, 7.0, 3.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_initial_accumulator() {
        let mut tree = PhyloTree::new();
        let driver = ClusteringDriver::new(four_leaves(), NeighborJoiningStrategy::new(), &mut tree).unwrap();
        let r = driver.strategy().accumulator();
        assert!(close(r[0], 0.7));
        assert!(close(r[1], 0.7));
        assert!(close(r[2], 1.0));
        assert!(close(r[3], 1.0));
    }

    #[test]
    fn test_accumulator_stays_consistent() {
        let mut tree = PhyloTree::new();
        let mut driver = ClusteringDriver::new(five_taxa(), NeighborJoiningStrategy::new(), &mut tree).unwrap();

        while driver.run().width() > 1 {
            driver.step(&mut tree).unwrap();
            let fresh = NeighborJoiningStrategy::accumulate(driver.run());
            let tracked = driver.strategy().accumulator();
            assert_eq!(fresh.len(), tracked.len());
            for (a, b) in fresh.iter().zip(tracked) {
                assert!(close(*a, *b), "{} vs {}", a, b);
            }
        }
        assert_eq!(driver.strategy().accumulator(), &[0.0]);
    }

    #[test]
    fn test_textbook_first_join() {
        let mut tree = PhyloTree::new();
        let report = agglomerate(five_taxa(), NeighborJoiningStrategy::new(), &mut tree).unwrap();

        let first = &report.steps[0];
        assert_eq!((first.first, first.second), (1, 0));
        assert!(close(first.first_weight, 3.0));
        assert!(close(first.second_weight, 2.0));
        assert!(close(tree.branch_length(0).unwrap(), 2.0));
        assert!(close(tree.branch_length(1).unwrap(), 3.0));
        assert_eq!(report.steps.len(), 4);
    }

    #[test]
    fn test_four_leaf_split() {
        let mut tree = PhyloTree::new();
        let report = agglomerate(four_leaves(), NeighborJoiningStrategy::new(), &mut tree).unwrap();
        assert_eq!(report.steps.len(), 3);

        let first = &report.steps[0];
        assert!(close(first.distance, 0.5));
        assert!(close(first.first_weight, 0.4));
        assert!(close(first.second_weight, 0.1));

        let root = tree.root().unwrap();
        let mut sides: Vec<Vec<usize>> = tree
            .children(root)
            .unwrap()
            .iter()
            .map(|&child| tree.leaves_under(child).unwrap())
            .collect();
        sides.sort();
        assert_eq!(sides, vec![vec![0, 2], vec![1, 3]]);
    }

    #[test]
    fn test_heights_cover_both_children() {
        let mut tree = PhyloTree::new();
        let report = agglomerate(five_taxa(), NeighborJoiningStrategy::new(), &mut tree).unwrap();
        for step in &report.steps {
            let h1 = tree.height(step.first).unwrap() + step.first_weight;
            let h2 = tree.height(step.second).unwrap() + step.second_weight;
            assert!(close(step.height, h1.max(h2)));
        }
    }

    #[test]
    fn test_two_leaves_split_evenly() {
        let matrix = DistanceMatrix::from_rows(&[vec![0.0, 0.8], vec![0.8, 0.0]]).unwrap();
        let mut tree = PhyloTree::new();
        let report = agglomerate(matrix, NeighborJoiningStrategy::new(), &mut tree).unwrap();
        assert_eq!(report.steps.len(), 1);
        assert!(close(report.steps[0].first_weight, 0.4));
        assert!(close(report.steps[0].second_weight, 0.4));
    }
}
