//! # Lexitree
//!
//! 音声認識のラティス、生物種の系統樹、教師なし単語分割を扱うライブラリです。
//!
//! ## 概要
//!
//! このライブラリは、互いに独立した3つのエンジンを提供します。
//! いずれも平文のテキストファイルから構築され、構築後は変更されません。
//!
//! ## 主な機能
//!
//! - **ラティスのデコード**: 認識仮説のラティス（有向非巡回グラフ）から最良経路を求め、
//!   経路数や単語密度を計算します
//! - **系統樹の推定**: FASTA形式の配列から平均距離法（UPGMA）で系統樹を構築し、
//!   最小共通祖先や進化的距離を問い合わせます
//! - **単語の発見**: 文字単位のテキストから、結びつきの強いバイグラムを繰り返し結合して
//!   単語を発見します
//!
//! ## 使用例
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use lexitree::Lattice;
//!
//! let text = "\
//! id utt1
//! start 0
//! end 2
//! numNodes 3
//! numEdges 2
//! node 0 0.00
//! node 1 0.40
//! node 2 0.80
//! edge 0 1 hello 10 2
//! edge 1 2 world 20 3
//! ";
//! let lattice = Lattice::from_reader(text.as_bytes())?;
//! let hyp = lattice.decode(1.0)?;
//!
//! assert_eq!(hyp.to_string(), "hello world");
//! assert_eq!(hyp.total_score(), 35.0);
//! assert_eq!(lattice.count_all_paths(), 1u32.into());
//! # Ok(())
//! # }
//! ```

/// エラー型の定義
pub mod errors;

/// ラティスの構築とデコード
pub mod lattice;

/// 系統樹の推定
pub mod phylo;

/// 内部ユーティリティ関数
pub mod utils;

/// 教師なし単語発見
pub mod wordifier;

#[cfg(test)]
mod tests;

// Re-exports
pub use lattice::{Hypothesis, Lattice};
pub use phylo::{PhyloTree, Species};
pub use wordifier::Wordifier;

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
