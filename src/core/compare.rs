// compare.rs - Site comparison of aligned rows and per-pair distance formulas

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::error::TreeError;

/// Distance assigned when a corrected formula leaves its domain
pub const DEFAULT_SATURATION: f64 = 10.0;

/// Per-pair distance formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceModel {
    /// Uncorrected fraction of mismatching residues over gap-free columns
    Clustal,
    /// Kimura protein correction of the Clustal fraction
    Kimura,
    /// Jukes-Cantor nucleotide correction of the Clustal fraction
    JukesCantor,
    /// Raw count of differing columns, gaps included
    Hamming,
}

impl FromStr for DistanceModel {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clustal" | "p-distance" | "identity" => Ok(DistanceModel::Clustal),
            "kimura" => Ok(DistanceModel::Kimura),
            "jukes-cantor" | "jc" | "jc69" => Ok(DistanceModel::JukesCantor),
            "hamming" => Ok(DistanceModel::Hamming),
            _ => Err(TreeError::UnsupportedMethod(format!(
                "distance model '{}'. Use: clustal, kimura, jukes-cantor, hamming",
                s
            ))),
        }
    }
}

impl fmt::Display for DistanceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DistanceModel::Clustal => "clustal",
            DistanceModel::Kimura => "kimura",
            DistanceModel::JukesCantor => "jukes-cantor",
            DistanceModel::Hamming => "hamming",
        };
        f.write_str(name)
    }
}

impl DistanceModel {
    pub fn description(&self) -> &str {
        match self {
            DistanceModel::Clustal => "Fraction of mismatches over gap-free columns",
            DistanceModel::Kimura => "Kimura-corrected protein distance",
            DistanceModel::JukesCantor => "Jukes-Cantor corrected nucleotide distance",
            DistanceModel::Hamming => "Hamming distance (all mismatches, gaps included)",
        }
    }

    /// Apply the formula to one pair of aligned rows.
    ///
    /// Returns the distance and whether a corrected model saturated.
    pub fn distance(&self, a: &[u8], b: &[u8], saturation: f64) -> (f64, bool) {
        match self {
            DistanceModel::Hamming => (hamming_distance(a, b) as f64, false),
            DistanceModel::Clustal => (compare_rows(a, b).p_distance(), false),
            DistanceModel::Kimura => {
                let p = compare_rows(a, b).p_distance();
                corrected(1.0 - p - 0.2 * p * p, 1.0, saturation)
            }
            DistanceModel::JukesCantor => {
                let p = compare_rows(a, b).p_distance();
                corrected(1.0 - 4.0 / 3.0 * p, 0.75, saturation)
            }
        }
    }
}

/// `-scale * ln(argument)`, or `saturation` once the argument is no longer positive
fn corrected(argument: f64, scale: f64, saturation: f64) -> (f64, bool) {
    if argument <= 0.0 {
        (saturation, true)
    } else {
        let d = -scale * argument.ln();
        // -0.0 for identical rows
        (d.max(0.0), false)
    }
}

/// Column statistics for one pair of aligned rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SiteStats {
    /// Columns with a residue in both rows
    pub compared: usize,
    /// Compared columns whose residues differ
    pub mismatches: usize,
    /// Columns with a gap in at least one row
    pub gap_columns: usize,
    /// Maximal runs of gap columns
    pub indel_events: usize,
}

impl SiteStats {
    /// Mismatch fraction over compared columns; 1.0 when nothing was comparable
    pub fn p_distance(&self) -> f64 {
        if self.compared == 0 {
            1.0
        } else {
            self.mismatches as f64 / self.compared as f64
        }
    }
}

#[inline]
fn is_gap(residue: u8) -> bool {
    residue == b'-' || residue == b'.'
}

/// Compare two aligned rows column by column (case-insensitive)
pub fn compare_rows(a: &[u8], b: &[u8]) -> SiteStats {
    let mut stats = SiteStats::default();
    let mut in_gap = false;

    for (&x, &y) in a.iter().zip(b) {
        if is_gap(x) || is_gap(y) {
            if !in_gap {
                stats.indel_events += 1;
                in_gap = true;
            }
            stats.gap_columns += 1;
        } else {
            in_gap = false;
            stats.compared += 1;
            if !x.eq_ignore_ascii_case(&y) {
                stats.mismatches += 1;
            }
        }
    }

    stats
}

/// Count all differing columns, treating gaps as residues and
/// the length difference as extra mismatches
pub fn hamming_distance(a: &[u8], b: &[u8]) -> usize {
    let min_len = a.len().min(b.len());
    let max_len = a.len().max(b.len());

    let mismatches = a
        .iter()
        .zip(b)
        .filter(|(x, y)| !x.eq_ignore_ascii_case(y))
        .count();

    mismatches + (max_len - min_len)
}
