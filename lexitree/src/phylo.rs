//! 種の配列から系統樹を推定するモジュール
//!
//! FASTA形式で与えられた種の配列どうしのハミング距離をもとに、
//! 平均距離法（UPGMA）で根付きの二分木を構築します。
//! 構築した木に対しては、最小共通祖先や進化的距離の問い合わせ、
//! Newick形式やインデント付きの表示が行えます。

mod distance;
mod species;
mod tree;

pub use crate::phylo::species::{load_species, load_species_file, Species};
pub use crate::phylo::tree::{NodeId, PhyloTree, PhyloTreeNode};
