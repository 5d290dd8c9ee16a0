// lib.rs - aligntree library root

//! # aligntree - Distance-based phylogenetic trees from multiple alignments
//!
//! This library turns a multiple sequence alignment (or a precomputed distance
//! matrix) into a rooted binary tree by agglomerative clustering. One generic
//! merge loop drives every method; the methods differ only in how they pick
//! the next pair and how they recompute distances to the merged cluster.
//!
//! ## Features
//!
//! - **Packed distance matrix**: strictly lower-triangular storage with in-place swap and shrink
//! - **Distance models**: Clustal p-distance, Kimura, Jukes-Cantor and Hamming
//! - **Linkage methods**: single, complete, UPGMA, WPGMA, UPGMC and WPGMC
//! - **Neighbor joining**: Saitou-Nei criterion with incremental row sums
//! - **Multiple formats**: TSV, CSV, PHYLIP, NEXUS matrices; Newick and JSON trees
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use aligntree::prelude::*;
//!
//! let alignment = Alignment::from_fasta(std::path::Path::new("aligned.fasta"))?;
//!
//! // Kimura distances, neighbor joining
//! let config = TreeConfig::new(ClusterMethod::NeighborJoining)
//!     .with_calculator(PairwiseDistance::new(DistanceModel::Kimura));
//! let tree = build_tree(&alignment, &config)?;
//!
//! println!("{}", to_newick(&tree)?);
//! # Ok::<(), TreeError>(())
//! ```

// Re-export all main modules
pub mod cli;
pub mod core;
pub mod data;
pub mod error;
pub mod output;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::cli::{validate_args, Args, ValidationResult};
    pub use crate::core::{build_tree, build_tree_into, cluster_matrix, cluster_matrix_into};
    pub use crate::core::{ClusterMethod, ClusterReport, LinkageMethod, MergeStep, TreeConfig};
    pub use crate::core::{DistanceCalculator, DistanceModel, PairwiseDistance, PrecomputedDistance};
    pub use crate::data::{load_matrix, Alignment, LabeledMatrix, MultipleAlignment};
    pub use crate::data::{ClusterTree, DistanceMatrix, MatrixCoord, NodeId, PhyloTree};
    pub use crate::error::{Result, TreeError};
    pub use crate::output::{to_newick, write_matrix, write_merge_log, write_tree};
    pub use crate::output::{MatrixFormat, TreeFormat};
}

// Re-export main types at the root level for convenience
pub use crate::core::{build_tree, ClusterMethod, LinkageMethod, TreeConfig};
pub use crate::data::{Alignment, DistanceMatrix, PhyloTree};
pub use crate::error::{Result, TreeError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn get_info() -> String {
    format!(
        "aligntree v{} - Distance-based phylogenetic tree builder",
        VERSION
    )
}
