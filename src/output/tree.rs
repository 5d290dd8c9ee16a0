// tree.rs - Tree and merge-log writers

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use serde::Serialize;
use tracing::info;
use crate::core::{ClusterReport, MergeStep};
use crate::data::{NodeId, PhyloTree};
use crate::error::{Result, TreeError};
use crate::output::create_output;

/// Decimal places for Newick branch lengths
pub const NEWICK_PRECISION: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeFormat {
    Newick,
    Json,
}

impl FromStr for TreeFormat {
    type Err = TreeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "newick" | "nwk" | "nh" => Ok(TreeFormat::Newick),
            "json" => Ok(TreeFormat::Json),
            _ => Err(TreeError::Configuration(format!(
                "unsupported tree format: {}. Use: newick, json",
                s
            ))),
        }
    }
}

impl fmt::Display for TreeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeFormat::Newick => f.write_str("newick"),
            TreeFormat::Json => f.write_str("json"),
        }
    }
}

/// Quote a Newick label when it contains structural characters
fn newick_label(label: &str) -> String {
    let needs_quotes = label
        .chars()
        .any(|c| c.is_whitespace() || "()[]':;,".contains(c));
    if needs_quotes {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}

/// Render the whole tree in Newick notation; unlabelled leaves use their index
pub fn to_newick(tree: &PhyloTree) -> Result<String> {
    let root = tree.root().ok_or_else(|| {
        TreeError::InvalidIndex("tree has no single root to serialize".to_string())
    })?;

    let mut rendered: HashMap<NodeId, String> = HashMap::with_capacity(tree.node_count());
    for node in tree.postorder(root)? {
        let mut text = if tree.is_leaf(node) {
            match tree.label(node) {
                Some(label) => newick_label(label),
                None => node.to_string(),
            }
        } else {
            let parts = tree
                .children(node)?
                .iter()
                .map(|child| rendered.remove(child).unwrap_or_default())
                .collect::<Vec<_>>();
            format!("({})", parts.join(","))
        };
        if node != root {
            text.push_str(&format!(":{:.*}", NEWICK_PRECISION, tree.branch_length(node)?));
        }
        rendered.insert(node, text);
    }

    let mut newick = rendered.remove(&root).unwrap_or_default();
    newick.push(';');
    Ok(newick)
}

#[derive(Serialize)]
struct TreeDocument<'a> {
    generator: String,
    generated: String,
    method: &'a str,
    root: NodeId,
    tree: &'a PhyloTree,
    merges: &'a [MergeStep],
}

pub fn render_tree<W: Write>(
    writer: &mut W,
    format: TreeFormat,
    tree: &PhyloTree,
    report: &ClusterReport,
    method: &str,
) -> Result<()> {
    match format {
        TreeFormat::Newick => writeln!(writer, "{}", to_newick(tree)?)?,
        TreeFormat::Json => {
            let document = TreeDocument {
                generator: format!("aligntree v{}", env!("CARGO_PKG_VERSION")),
                generated: chrono::Utc::now().to_rfc3339(),
                method,
                root: report.root,
                tree,
                merges: &report.steps,
            };
            serde_json::to_writer_pretty(&mut *writer, &document)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

/// Write the tree to `file_path`
pub fn write_tree(
    file_path: &Path,
    format: TreeFormat,
    tree: &PhyloTree,
    report: &ClusterReport,
    method: &str,
) -> Result<()> {
    let mut writer = create_output(file_path)?;
    render_tree(&mut writer, format, tree, report, method)?;
    writer.flush()?;
    info!("Tree written to: {} ({} format)", file_path.display(), format);
    Ok(())
}

/// One row per merge, tab separated, with a header
pub fn write_merge_log(file_path: &Path, report: &ClusterReport) -> Result<()> {
    let writer = create_output(file_path)?;
    let mut log = csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer);
    for step in &report.steps {
        log.serialize(step)?;
    }
    log.flush()?;
    info!("Merge log with {} steps written to: {}", report.steps.len(), file_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{cluster_matrix, ClusterMethod, LinkageMethod};
    use crate::data::{ClusterTree, DistanceMatrix};

    fn upgma_tree() -> (PhyloTree, ClusterReport) {
        let matrix = DistanceMatrix::from_rows(&[
            vec![0.0, 2.0, 6.0],
            vec![2.0, 0.0, 6.0],
            vec![6.0, 6.0, 0.0],
        ])
        .unwrap();
        cluster_matrix(matrix, ClusterMethod::Linkage(LinkageMethod::Upgma)).unwrap()
    }

    #[test]
    fn test_newick_with_indices() {
        let (tree, _) = upgma_tree();
        assert_eq!(
            to_newick(&tree).unwrap(),
            "((1:1.000000,0:1.000000):2.000000,2:3.000000);"
        );
    }

    #[test]
    fn test_newick_with_labels() {
        let (mut tree, _) = upgma_tree();
        tree.set_leaf_labels(&["E. coli", "it's", "plain"]).unwrap();
        assert_eq!(
            to_newick(&tree).unwrap(),
            "(('it''s':1.000000,'E. coli':1.000000):2.000000,plain:3.000000);"
        );
    }

    #[test]
    fn test_single_leaf_and_unjoined_trees() {
        let mut tree = PhyloTree::with_leaves(1);
        tree.set_leaf_labels(&["only"]).unwrap();
        assert_eq!(to_newick(&tree).unwrap(), "only;");

        let mut forest = PhyloTree::new();
        forest.set_leaf_count(2);
        assert!(to_newick(&forest).is_err());
    }

    #[test]
    fn test_json_document() {
        let (tree, report) = upgma_tree();
        let mut buffer = Vec::new();
        render_tree(&mut buffer, TreeFormat::Json, &tree, &report, "upgma").unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["method"], "upgma");
        assert_eq!(value["root"], 4);
        assert_eq!(value["merges"].as_array().unwrap().len(), 2);
        assert_eq!(value["tree"]["leaf_count"], 3);
    }

    #[test]
    fn test_merge_log() {
        let (_, report) = upgma_tree();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merges.tsv");
        write_merge_log(&path, &report).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("step\tfirst\tsecond\tdistance\tfirst_weight\tsecond_weight\tnode\theight")
        );
        assert_eq!(lines.next(), Some("1\t1\t0\t2.0\t1.0\t1.0\t3\t1.0"));
        assert_eq!(lines.count(), 1);
    }
}
