// mod.rs - Data structures module

pub mod alignment;
pub mod loaders;
pub mod matrix;
pub mod tree;

// Re-export main types for convenience
pub use alignment::{Alignment, MultipleAlignment};
pub use loaders::{load_matrix, LabeledMatrix};
pub use matrix::{DistanceMatrix, MatrixCoord};
pub use tree::{ClusterTree, NodeId, PhyloTree, TreeNode};
