// args.rs - Command line arguments definition

use argh::FromArgs;

#[derive(FromArgs)]
/// aligntree - Distance-based phylogenetic trees from multiple alignments
pub struct Args {
    /// path to aligned FASTA file
    #[argh(option)]
    pub alignment: Option<String>,

    /// path to precomputed distance matrix (.tsv, .csv or .phy)
    #[argh(option)]
    pub matrix: Option<String>,

    /// precomputed matrix format: tsv, csv, phylip (default: from extension)
    #[argh(option)]
    pub matrix_input_format: Option<String>,

    /// output tree file
    #[argh(option)]
    pub output: Option<String>,

    /// clustering method: single, complete, upgma, wpgma, upgmc, wpgmc, nj (default: upgma)
    #[argh(option, default = "String::from(\"upgma\")")]
    pub method: String,

    /// distance model: clustal, kimura, jukes-cantor, hamming (default: clustal)
    #[argh(option, default = "String::from(\"clustal\")")]
    pub model: String,

    /// tree format: newick, json (default: newick)
    #[argh(option, default = "String::from(\"newick\")")]
    pub tree_format: String,

    /// also write the distance matrix to this file
    #[argh(option)]
    pub matrix_output: Option<String>,

    /// distance matrix output format: tsv, csv, phylip, nexus (default: tsv)
    #[argh(option, default = "String::from(\"tsv\")")]
    pub matrix_format: String,

    /// write the merge history (TSV) to this file
    #[argh(option)]
    pub merge_log: Option<String>,

    /// distance assigned when a corrected model saturates (default: 10.0)
    #[argh(option, default = "10.0")]
    pub saturation: f64,

    /// include only rows matching regex pattern
    #[argh(option)]
    pub include_rows: Option<String>,

    /// exclude rows matching regex pattern
    #[argh(option)]
    pub exclude_rows: Option<String>,

    /// include only rows listed in a file (one name per line)
    #[argh(option)]
    pub include_rows_list: Option<String>,

    /// exclude rows listed in a file (one name per line)
    #[argh(option)]
    pub exclude_rows_list: Option<String>,

    /// show a progress bar while computing distances
    #[argh(switch)]
    pub progress: bool,

    /// enable debug logging
    #[argh(switch, short = 'v')]
    pub verbose: bool,

    /// validate inputs without computation (dry run)
    #[argh(switch)]
    pub dry_run: bool,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    /// generate sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,
}
