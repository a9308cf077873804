//! 文字単位のテキストから単語を発見するユーティリティ
//!
//! このバイナリは、文字単位に分割されたテキストを読み込み、
//! バイグラム統計に基づく結合を繰り返して単語を発見します。
//! 辞書を指定すると、発見した単語のうち辞書に含まれるものを報告します。

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use lexitree::errors::LexitreeError;
use lexitree::wordifier::{
    load_dictionary_file, load_sentences_file, write_num_words_discovered, Wordifier,
};

/// コマンドライン引数
#[derive(Parser, Debug)]
#[clap(name = "wordify", about = "Discovers words in character-segmented text")]
struct Args {
    /// Text file whose tokens are separated by white spaces.
    #[clap(short = 'i', long)]
    text: PathBuf,

    /// Dictionary file used to evaluate the discovered words.
    #[clap(short = 'd', long)]
    dictionary: Option<PathBuf>,

    /// Minimum number of occurrences of a bigram to be merged.
    #[clap(short = 'c', long, default_value = "2")]
    count_threshold: u32,

    /// Minimum product score of a bigram to be merged.
    #[clap(short = 'p', long, default_value = "0.5")]
    probability_threshold: f64,

    /// Maximum number of iterations.
    #[clap(long, default_value = "5")]
    max_iter: u64,

    /// Prints the resegmented text.
    #[clap(short = 'S', long)]
    print_segmentation: bool,
}

/// 単語発見中に発生する可能性のあるエラー
#[derive(Debug, Error)]
enum WordifyError {
    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 単語発見の処理エラー
    #[error(transparent)]
    Lexitree(#[from] LexitreeError),
}

/// メイン関数
///
/// テキストを読み込んで単語発見を実行し、結果を標準出力に出力します。
fn main() -> Result<(), WordifyError> {
    let args = Args::parse();

    eprintln!("Loading the text...");
    let data = load_sentences_file(&args.text)?;
    let dictionary = args
        .dictionary
        .as_ref()
        .map(load_dictionary_file)
        .transpose()?;

    let mut wordifier = Wordifier::new(data)
        .count_threshold(args.count_threshold)?
        .probability_threshold(args.probability_threshold)?
        .max_iter(args.max_iter)?;

    eprintln!("Discovering words...");
    let num_iter = wordifier.run();
    eprintln!(
        "Finished after {num_iter} iterations: {} tokens",
        wordifier.data().len()
    );

    let out = io::stdout();
    let mut out = BufWriter::new(out.lock());
    for (i, words) in wordifier.discovered().iter().enumerate() {
        let mut words: Vec<_> = words.iter().map(String::as_str).collect();
        words.sort_unstable();
        writeln!(out, "Iteration {}: {}", i + 1, words.join(" "))?;
    }
    if args.print_segmentation {
        writeln!(out, "{}", wordifier.data().join(" "))?;
    }
    if let Some(dictionary) = &dictionary {
        write_num_words_discovered(&mut out, &wordifier.vocabulary(), dictionary)?;
    }
    out.flush()?;

    Ok(())
}
