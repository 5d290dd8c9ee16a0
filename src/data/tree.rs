// tree.rs - Rooted binary tree grown by agglomerative joins

use serde::{Deserialize, Serialize};
use crate::error::{Result, TreeError};

/// Dense node identifier: leaves are `0..leaf_count`, internal nodes follow in creation order
pub type NodeId = usize;

/// Operations the clustering driver needs from a tree
pub trait ClusterTree {
    /// Reset the tree to `n` unconnected leaves of height zero
    fn set_leaf_count(&mut self, n: usize);

    /// Create a parent of `a` and `b` with the given branch weights, returning its id
    fn join_nodes(&mut self, a: NodeId, b: NodeId, weight_a: f64, weight_b: f64) -> Result<NodeId>;

    fn set_height(&mut self, node: NodeId, height: f64) -> Result<()>;

    fn height(&self, node: NodeId) -> Result<f64>;

    fn num_children(&self, node: NodeId) -> Result<usize>;
}

/// A single node of a [`PhyloTree`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Weight of the edge to the parent
    pub branch_length: f64,
    pub height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl TreeNode {
    fn leaf() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            branch_length: 0.0,
            height: 0.0,
            label: None,
        }
    }
}

/// Arena-backed phylogenetic tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhyloTree {
    nodes: Vec<TreeNode>,
    leaf_count: usize,
}

impl PhyloTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tree with `n` leaves and no internal nodes
    pub fn with_leaves(n: usize) -> Self {
        let mut tree = Self::new();
        tree.set_leaf_count(n);
        tree
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn internal_count(&self) -> usize {
        self.nodes.len() - self.leaf_count
    }

    fn node(&self, id: NodeId) -> Result<&TreeNode> {
        self.nodes.get(id).ok_or_else(|| {
            TreeError::InvalidIndex(format!(
                "tree node {} does not exist ({} nodes)",
                id,
                self.nodes.len()
            ))
        })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut TreeNode> {
        let count = self.nodes.len();
        self.nodes.get_mut(id).ok_or_else(|| {
            TreeError::InvalidIndex(format!("tree node {} does not exist ({} nodes)", id, count))
        })
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        id < self.leaf_count
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.node(id)?.children)
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    pub fn branch_length(&self, id: NodeId) -> Result<f64> {
        Ok(self.node(id)?.branch_length)
    }

    pub fn label(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id).and_then(|n| n.label.as_deref())
    }

    /// Attach names to leaves in order; extra names are an error
    pub fn set_leaf_labels<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        if names.len() != self.leaf_count {
            return Err(TreeError::dimension_mismatch(
                "leaf labels",
                self.leaf_count,
                names.len(),
            ));
        }
        for (node, name) in self.nodes.iter_mut().zip(names) {
            node.label = Some(name.as_ref().to_string());
        }
        Ok(())
    }

    /// The single parentless node, once the tree is fully joined
    pub fn root(&self) -> Option<NodeId> {
        let mut roots = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(id, _)| id);
        match (roots.next(), roots.next()) {
            (Some(root), None) => Some(root),
            _ => None,
        }
    }

    /// Children-before-parent order starting at `start`
    pub fn postorder(&self, start: NodeId) -> Result<Vec<NodeId>> {
        self.node(start)?;
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(start, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            stack.push((id, true));
            for &child in self.nodes[id].children.iter().rev() {
                stack.push((child, false));
            }
        }
        Ok(order)
    }

    /// Sorted leaf ids below `node`
    pub fn leaves_under(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let mut leaves: Vec<NodeId> = self
            .postorder(node)?
            .into_iter()
            .filter(|&id| self.is_leaf(id))
            .collect();
        leaves.sort_unstable();
        Ok(leaves)
    }
}

impl ClusterTree for PhyloTree {
    fn set_leaf_count(&mut self, n: usize) {
        self.nodes.clear();
        self.nodes.resize_with(n, TreeNode::leaf);
        self.leaf_count = n;
    }

    fn join_nodes(&mut self, a: NodeId, b: NodeId, weight_a: f64, weight_b: f64) -> Result<NodeId> {
        if a == b {
            return Err(TreeError::InvalidIndex(format!("cannot join node {} with itself", a)));
        }
        for id in [a, b] {
            if self.node(id)?.parent.is_some() {
                return Err(TreeError::InvalidIndex(format!(
                    "node {} already has a parent",
                    id
                )));
            }
        }

        let parent = self.nodes.len();
        self.nodes.push(TreeNode {
            parent: None,
            children: vec![a, b],
            branch_length: 0.0,
            height: 0.0,
            label: None,
        });
        for (id, weight) in [(a, weight_a), (b, weight_b)] {
            let child = self.node_mut(id)?;
            child.parent = Some(parent);
            child.branch_length = weight;
        }
        Ok(parent)
    }

    fn set_height(&mut self, node: NodeId, height: f64) -> Result<()> {
        self.node_mut(node)?.height = height;
        Ok(())
    }

    fn height(&self, node: NodeId) -> Result<f64> {
        Ok(self.node(node)?.height)
    }

    fn num_children(&self, node: NodeId) -> Result<usize> {
        Ok(self.node(node)?.children.len())
    }
}
