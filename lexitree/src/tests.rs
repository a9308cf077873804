//! Lexitreeのテストモジュール群
//!
//! 各エンジン(lattice、phylo、wordifier)について、
//! リソースファイルを用いたシナリオを検証するテストを含みます。
