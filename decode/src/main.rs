//! ラティスを復号するユーティリティ
//!
//! このバイナリは、ラティスファイルを読み込んで最良の認識仮説を出力します。
//! オプションにより、パス数や密度の計算、単語の出現時刻の検索、
//! Graphviz形式やラティス形式でのファイル出力も行います。

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use lexitree::errors::LexitreeError;
use lexitree::Lattice;

/// コマンドライン引数
#[derive(Parser, Debug)]
#[clap(name = "decode", about = "Decodes a speech recognition lattice")]
struct Args {
    /// Lattice file.
    #[clap(short = 'i', long)]
    lattice: PathBuf,

    /// Weight of the language model scores.
    #[clap(short = 's', long, default_value = "1.0")]
    lm_scale: f64,

    /// Prints the number of paths from the start node to the end node.
    #[clap(short = 'c', long)]
    count_paths: bool,

    /// Prints the number of non-silence words divided by the end time.
    #[clap(short = 'd', long)]
    density: bool,

    /// Prints the midpoint times of every edge labeled with this word.
    #[clap(long)]
    hits: Option<String>,

    /// Prints the words that overlap this time in seconds.
    #[clap(short = 't', long)]
    time: Option<f64>,

    /// A file to which the lattice is written in Graphviz format.
    #[clap(long)]
    dot_out: Option<PathBuf>,

    /// A file to which the lattice is written in the input format.
    #[clap(short = 'o', long)]
    lattice_out: Option<PathBuf>,
}

/// 復号中に発生する可能性のあるエラー
#[derive(Debug, Error)]
enum DecodeError {
    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// ラティスの処理エラー
    #[error(transparent)]
    Lexitree(#[from] LexitreeError),
}

/// メイン関数
///
/// ラティスを読み込み、最良仮説と指定された問い合わせの結果を標準出力に出力します。
fn main() -> Result<(), DecodeError> {
    let args = Args::parse();

    eprintln!("Loading the lattice...");
    let lattice = Lattice::from_path(&args.lattice)?;
    eprintln!(
        "Loaded {}: {} nodes, {} edges",
        lattice.utterance_id(),
        lattice.num_nodes(),
        lattice.num_edges()
    );

    let out = io::stdout();
    let mut out = BufWriter::new(out.lock());

    let hyp = lattice.decode(args.lm_scale)?;
    writeln!(out, "{}\t{}\t{}", lattice.utterance_id(), hyp, hyp.total_score())?;

    if args.count_paths {
        writeln!(out, "paths\t{}", lattice.count_all_paths())?;
    }
    if args.density {
        writeln!(out, "density\t{}", lattice.lattice_density())?;
    }
    if let Some(word) = &args.hits {
        write!(out, "hits\t")?;
        lattice.write_sorted_hits(&mut out, word)?;
        writeln!(out)?;
    }
    if let Some(time) = args.time {
        let mut words: Vec<_> = lattice.unique_words_at_time(time).into_iter().collect();
        words.sort_unstable();
        writeln!(out, "words\t{}", words.join(" "))?;
    }
    out.flush()?;

    if let Some(path) = &args.dot_out {
        eprintln!("Writing the dot file...");
        lattice.write_as_dot(path)?;
    }
    if let Some(path) = &args.lattice_out {
        eprintln!("Writing the lattice file...");
        lattice.save_as_file(path)?;
    }

    Ok(())
}
