//! バイグラム統計による教師なしの単語発見を行うモジュール
//!
//! 文字単位に分割されたテキストから、結びつきの強い隣接トークンを繰り返し結合して
//! 単語を発見します。各反復は次の手順からなります。
//!
//! 1. 隣接するトークン対（バイグラム）の出現回数を数える
//! 2. 出現回数を確率に変換する
//! 3. バイグラムごとに積スコア `P(w1, w2) / sqrt(P(w1) * P(w2))` を計算する
//! 4. 閾値を満たすバイグラムを新しい単語とする
//! 5. 新しい単語に従ってトークン列を左から結合し直す
//!
//! # 使用例
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use lexitree::wordifier::{load_sentences, Wordifier};
//!
//! let data = load_sentences("t h e _ t h e _ t h e".as_bytes())?;
//! let mut wordifier = Wordifier::new(data)
//!     .count_threshold(3)?
//!     .probability_threshold(0.5)?
//!     .max_iter(1)?;
//! wordifier.run();
//!
//! assert_eq!(wordifier.data().concat(), "the_the_the");
//! assert!(wordifier.discovered()[0].contains("th"));
//! # Ok(())
//! # }
//! ```

mod corpus;
mod report;
mod stats;

use hashbrown::{HashMap, HashSet};

use crate::errors::{LexitreeError, Result};

pub use crate::wordifier::corpus::{
    load_dictionary, load_dictionary_file, load_sentences, load_sentences_file,
};
pub use crate::wordifier::report::{
    print_num_words_discovered, words_discovered, write_num_words_discovered,
};
pub use crate::wordifier::stats::{
    compute_counts, convert_counts_to_probabilities, find_new_words, get_scores, get_vocabulary,
    resegment, BigramCounts, Probabilities,
};

/// 単語発見の反復を管理するドライバ。
///
/// 各反復で新しい単語が1つも見つからなければ、`max_iter`に達する前に終了します。
pub struct Wordifier {
    data: Vec<String>,
    count_threshold: u32,
    probability_threshold: f64,
    max_iter: u64,
    discovered: Vec<HashSet<String>>,
}

impl Wordifier {
    /// 新しいドライバを作成します。
    ///
    /// # 引数
    ///
    /// * `data` - 文字単位に分割されたトークン列
    pub fn new(data: Vec<String>) -> Self {
        Self {
            data,
            count_threshold: 2,
            probability_threshold: 0.5,
            max_iter: 5,
            discovered: vec![],
        }
    }

    /// 出現回数の閾値を変更します。
    ///
    /// デフォルト値は 2 です。
    ///
    /// # エラー
    ///
    /// 値が1未満の場合、[`LexitreeError::InvalidArgument`] が返されます。
    pub fn count_threshold(mut self, n: u32) -> Result<Self> {
        if n == 0 {
            return Err(LexitreeError::invalid_argument(
                "count_threshold",
                "must be at least 1",
            ));
        }
        self.count_threshold = n;
        Ok(self)
    }

    /// 積スコアの閾値を変更します。
    ///
    /// デフォルト値は 0.5 です。
    ///
    /// # エラー
    ///
    /// 値が負または有限でない場合、[`LexitreeError::InvalidArgument`] が返されます。
    pub fn probability_threshold(mut self, threshold: f64) -> Result<Self> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(LexitreeError::invalid_argument(
                "probability_threshold",
                "must be a non-negative finite number",
            ));
        }
        self.probability_threshold = threshold;
        Ok(self)
    }

    /// 最大反復回数を変更します。
    ///
    /// デフォルト値は 5 です。
    ///
    /// # エラー
    ///
    /// 値が1未満の場合、[`LexitreeError::InvalidArgument`] が返されます。
    pub fn max_iter(mut self, n: u64) -> Result<Self> {
        if n == 0 {
            return Err(LexitreeError::invalid_argument(
                "max_iter",
                "must be at least 1",
            ));
        }
        self.max_iter = n;
        Ok(self)
    }

    /// 反復を1回行います。
    ///
    /// # 戻り値
    ///
    /// この反復で発見した新しい単語
    pub fn step(&mut self) -> HashSet<String> {
        let new_words = {
            let counts = compute_counts(&self.data);
            let probs = convert_counts_to_probabilities(&counts);
            let scores = get_scores(&probs);
            find_new_words(
                counts.counts(),
                &scores,
                self.count_threshold,
                self.probability_threshold,
            )
        };
        if !new_words.is_empty() {
            self.data = resegment(&self.data, &new_words);
        }
        new_words
    }

    /// 最大反復回数まで、または新しい単語が見つからなくなるまで反復します。
    ///
    /// # 戻り値
    ///
    /// 新しい単語を発見した反復の回数
    pub fn run(&mut self) -> u64 {
        let mut num_iter = 0;
        while num_iter < self.max_iter {
            let new_words = self.step();
            if new_words.is_empty() {
                log::info!("No new words after {num_iter} iterations");
                break;
            }
            num_iter += 1;
            log::info!(
                "Iteration {num_iter}: {} new words, {} tokens",
                new_words.len(),
                self.data.len()
            );
            self.discovered.push(new_words);
        }
        num_iter
    }

    /// 現在のトークン列を返します。
    pub fn data(&self) -> &[String] {
        &self.data
    }

    /// 現在のトークン列を取り出します。
    pub fn into_data(self) -> Vec<String> {
        self.data
    }

    /// 反復ごとに発見した単語を返します。
    pub fn discovered(&self) -> &[HashSet<String>] {
        &self.discovered
    }

    /// 現在のトークン列の語彙を返します。
    pub fn vocabulary(&self) -> HashMap<String, u32> {
        get_vocabulary(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            Wordifier::new(vec![]).count_threshold(0),
            Err(LexitreeError::InvalidArgument(_))
        ));
        assert!(matches!(
            Wordifier::new(vec![]).probability_threshold(-0.1),
            Err(LexitreeError::InvalidArgument(_))
        ));
        assert!(matches!(
            Wordifier::new(vec![]).probability_threshold(f64::NAN),
            Err(LexitreeError::InvalidArgument(_))
        ));
        assert!(matches!(
            Wordifier::new(vec![]).max_iter(0),
            Err(LexitreeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_step() {
        // t h e _ t h e _ t h e: "t h" and "h e" occur 3 times, the rest twice.
        let mut wordifier = Wordifier::new(tokens("t h e _ t h e _ t h e"))
            .count_threshold(3)
            .unwrap();
        let new_words = wordifier.step();
        let expected: HashSet<String> = ["th", "he"].iter().map(|s| s.to_string()).collect();
        assert_eq!(expected, new_words);
        assert_eq!(tokens("th e _ th e _ th e"), wordifier.data());
    }

    #[test]
    fn test_run_stops_early() {
        let mut wordifier = Wordifier::new(tokens("t h e _ t h e _ t h e"))
            .count_threshold(3)
            .unwrap()
            .max_iter(10)
            .unwrap();
        let num_iter = wordifier.run();
        assert!(num_iter < 10);
        assert_eq!(num_iter as usize, wordifier.discovered().len());
        assert_eq!("the_the_the", wordifier.data().concat());
        assert_eq!(Some(&3), wordifier.vocabulary().get("the"));
    }

    #[test]
    fn test_run_empty_data() {
        let mut wordifier = Wordifier::new(vec![]);
        assert_eq!(0, wordifier.run());
        assert!(wordifier.into_data().is_empty());
    }
}
