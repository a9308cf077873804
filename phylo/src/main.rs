//! 系統樹を推定するユーティリティ
//!
//! このバイナリは、FASTA形式の種ファイルから平均距離法で系統樹を構築し、
//! インデント付きの木またはNewick形式で出力します。
//! 2つの種を指定すると、最小共通祖先と進化的距離も出力します。

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use thiserror::Error;

use lexitree::errors::LexitreeError;
use lexitree::PhyloTree;

/// 出力形式
#[derive(Clone, Debug)]
enum OutputFormat {
    Indented,
    Newick,
}

impl FromStr for OutputFormat {
    type Err = &'static str;

    fn from_str(format: &str) -> Result<Self, Self::Err> {
        match format {
            "indented" => Ok(Self::Indented),
            "newick" => Ok(Self::Newick),
            _ => Err("Could not parse a format"),
        }
    }
}

/// コマンドライン引数
#[derive(Parser, Debug)]
#[clap(name = "phylo", about = "Builds a phylogenetic tree with UPGMA")]
struct Args {
    /// Species file in FASTA format.
    #[clap(short = 'i', long)]
    species: PathBuf,

    /// Number of dots used to indent the deepest node.
    #[clap(short = 'p', long, default_value = "10")]
    printing_depth: i32,

    /// Output format. Choices are indented and newick.
    #[clap(short = 'O', long, default_value = "indented")]
    output_format: OutputFormat,

    /// Two labels whose common ancestor and evolutionary distance are printed.
    #[clap(long, num_args = 2, value_names = ["LABEL1", "LABEL2"])]
    pair: Option<Vec<String>>,

    /// Lists the species in the tree.
    #[clap(short = 'l', long)]
    list_species: bool,
}

/// 系統樹の構築中に発生する可能性のあるエラー
#[derive(Debug, Error)]
enum PhyloError {
    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 系統樹の処理エラー
    #[error(transparent)]
    Lexitree(#[from] LexitreeError),
}

/// メイン関数
///
/// 種ファイルから系統樹を構築し、指定された形式で標準出力に出力します。
fn main() -> Result<(), PhyloError> {
    let args = Args::parse();

    eprintln!("Building the tree...");
    let tree = PhyloTree::from_path(&args.species, args.printing_depth)?;
    eprintln!(
        "{} species, height {}",
        tree.count_all_species(),
        tree.height()
    );

    let out = io::stdout();
    let mut out = BufWriter::new(out.lock());

    match args.output_format {
        OutputFormat::Indented => write!(out, "{tree}")?,
        OutputFormat::Newick => writeln!(out, "{}", tree.to_tree_string())?,
    }

    if args.list_species {
        for species in tree.all_species() {
            writeln!(out, "{}", species.name())?;
        }
    }

    if let Some(pair) = &args.pair {
        let (label1, label2) = (&pair[0], &pair[1]);
        let ancestor = tree
            .find_least_common_ancestor_by_label(label1, label2)
            .map_or("(none)", |id| tree.node(id).label());
        writeln!(out, "ancestor\t{ancestor}")?;
        writeln!(
            out,
            "distance\t{}",
            tree.find_evolutionary_distance(label1, label2)
        )?;
    }
    out.flush()?;

    Ok(())
}
