// mod.rs - Output formatters module

pub mod tree;

use std::fmt;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::info;
use crate::data::DistanceMatrix;
use crate::error::{Result, TreeError};

pub use tree::{to_newick, write_merge_log, write_tree, TreeFormat};

/// Distance matrix file layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixFormat {
    Tsv,
    Csv,
    Phylip,
    Nexus,
}

impl FromStr for MatrixFormat {
    type Err = TreeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tsv" => Ok(MatrixFormat::Tsv),
            "csv" => Ok(MatrixFormat::Csv),
            "phylip" => Ok(MatrixFormat::Phylip),
            "nexus" => Ok(MatrixFormat::Nexus),
            _ => Err(TreeError::Configuration(format!(
                "unsupported matrix format: {}. Use: tsv, csv, phylip, nexus",
                s
            ))),
        }
    }
}

impl fmt::Display for MatrixFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatrixFormat::Tsv => "tsv",
            MatrixFormat::Csv => "csv",
            MatrixFormat::Phylip => "phylip",
            MatrixFormat::Nexus => "nexus",
        };
        f.write_str(name)
    }
}

/// Ensure parent directory exists before creating file
pub(crate) fn ensure_parent_dir(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub(crate) fn create_output(file_path: &Path) -> Result<BufWriter<File>> {
    ensure_parent_dir(file_path)?;
    let file = File::create(file_path)?;
    Ok(BufWriter::new(file))
}

/// Command, timestamp and version lines wrapped in the format's comment markers
fn write_provenance<W: Write>(writer: &mut W, open: &str, close: &str, command_line: &str) -> Result<()> {
    writeln!(writer, "{}Command: {}{}", open, command_line, close)?;
    writeln!(
        writer,
        "{}Generated: {}{}",
        open,
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        close
    )?;
    writeln!(writer, "{}aligntree v{}{}", open, env!("CARGO_PKG_VERSION"), close)?;
    Ok(())
}

fn check_labels(labels: &[String], matrix: &DistanceMatrix) -> Result<()> {
    if labels.len() != matrix.width() {
        return Err(TreeError::dimension_mismatch(
            "output labels vs matrix width",
            matrix.width(),
            labels.len(),
        ));
    }
    Ok(())
}

/// Full square matrix, tab separated, with `#` provenance lines
pub fn render_tsv<W: Write>(
    writer: &mut W,
    labels: &[String],
    matrix: &DistanceMatrix,
    command_line: &str,
) -> Result<()> {
    check_labels(labels, matrix)?;
    write_provenance(writer, "# ", "", command_line)?;

    write!(writer, "Sample")?;
    for label in labels {
        write!(writer, "\t{}", label)?;
    }
    writeln!(writer)?;

    for (row, label) in matrix.to_square().iter().zip(labels) {
        write!(writer, "{}", label)?;
        for distance in row {
            write!(writer, "\t{}", distance)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Full square matrix as quoted-where-needed CSV
pub fn render_csv<W: Write>(
    writer: &mut W,
    labels: &[String],
    matrix: &DistanceMatrix,
    command_line: &str,
) -> Result<()> {
    check_labels(labels, matrix)?;
    write_provenance(writer, "# ", "", command_line)?;

    let mut csv_writer = csv::Writer::from_writer(&mut *writer);
    let mut header = vec!["Sample".to_string()];
    header.extend(labels.iter().cloned());
    csv_writer.write_record(&header)?;

    for (row, label) in matrix.to_square().iter().zip(labels) {
        let mut record = vec![label.clone()];
        record.extend(row.iter().map(|d| d.to_string()));
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// PHYLIP names end at the first whitespace
fn phylip_label(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Lower-triangular PHYLIP; provenance trails the matrix as `#` lines.
/// Whitespace inside labels is written as `_`.
pub fn render_phylip<W: Write>(
    writer: &mut W,
    labels: &[String],
    matrix: &DistanceMatrix,
    command_line: &str,
) -> Result<()> {
    check_labels(labels, matrix)?;

    writeln!(writer, "    {}", labels.len())?;
    for (i, label) in labels.iter().enumerate() {
        write!(writer, "{:<10}", phylip_label(label))?;
        for j in 0..i {
            write!(writer, "  {}", matrix.get(i, j)?)?;
        }
        writeln!(writer)?;
    }

    writeln!(writer)?;
    write_provenance(writer, "# ", "", command_line)?;
    Ok(())
}

/// NEXUS DISTANCES block, lower triangle without diagonal
pub fn render_nexus<W: Write>(
    writer: &mut W,
    labels: &[String],
    matrix: &DistanceMatrix,
    command_line: &str,
) -> Result<()> {
    check_labels(labels, matrix)?;

    writeln!(writer, "#NEXUS")?;
    write_provenance(writer, "[", "]", command_line)?;
    writeln!(writer, "BEGIN DISTANCES;")?;
    writeln!(writer, "    DIMENSIONS NTAX={};", labels.len())?;
    writeln!(writer, "    FORMAT LABELS LOWER NODIAGONAL;")?;
    writeln!(writer, "    MATRIX")?;
    for (i, label) in labels.iter().enumerate() {
        write!(writer, "        {}", label)?;
        for j in 0..i {
            write!(writer, " {}", matrix.get(i, j)?)?;
        }
        writeln!(writer)?;
    }
    writeln!(writer, "    ;")?;
    writeln!(writer, "END;")?;
    Ok(())
}

/// Render a labelled distance matrix in the requested format
pub fn render_matrix<W: Write>(
    writer: &mut W,
    format: MatrixFormat,
    labels: &[String],
    matrix: &DistanceMatrix,
    command_line: &str,
) -> Result<()> {
    match format {
        MatrixFormat::Tsv => render_tsv(writer, labels, matrix, command_line),
        MatrixFormat::Csv => render_csv(writer, labels, matrix, command_line),
        MatrixFormat::Phylip => render_phylip(writer, labels, matrix, command_line),
        MatrixFormat::Nexus => render_nexus(writer, labels, matrix, command_line),
    }
}

/// Write distance matrix in the specified format
pub fn write_matrix(
    file_path: &Path,
    format: MatrixFormat,
    labels: &[String],
    matrix: &DistanceMatrix,
    command_line: &str,
) -> Result<()> {
    let mut writer = create_output(file_path)?;
    render_matrix(&mut writer, format, labels, matrix, command_line)?;
    writer.flush()?;
    info!("Distance matrix written to: {} ({} format)", file_path.display(), format);
    Ok(())
}
