//! 復号結果の仮説の定義

use std::fmt;

/// ラティス上の1本のパスに沿った単語とスコアの列。
///
/// 始点から終点の順に並びます。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hypothesis {
    words: Vec<(String, f64)>,
}

impl Hypothesis {
    /// 空の仮説を作成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// 末尾に単語を追加します。
    ///
    /// # 引数
    ///
    /// * `word` - 単語ラベル
    /// * `score` - その辺のコスト
    pub fn add_word<S>(&mut self, word: S, score: f64)
    where
        S: Into<String>,
    {
        self.words.push((word.into(), score));
    }

    /// 単語とスコアのペアのスライスを返します。
    pub fn words(&self) -> &[(String, f64)] {
        &self.words
    }

    /// 単語数を返します。
    pub fn num_words(&self) -> usize {
        self.words.len()
    }

    /// 単語が含まれていないかどうかを判定します。
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// 全単語のスコアの合計を返します。
    pub fn total_score(&self) -> f64 {
        self.words.iter().map(|(_, score)| score).sum()
    }
}

impl fmt::Display for Hypothesis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (word, _)) in self.words.iter().enumerate() {
            if i != 0 {
                f.write_str(" ")?;
            }
            f.write_str(word)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hypothesis() {
        let mut hyp = Hypothesis::new();
        assert!(hyp.is_empty());
        assert_eq!(0.0, hyp.total_score());
        assert_eq!("", hyp.to_string());

        hyp.add_word("the", 2.5);
        hyp.add_word("cat", 4.0);

        assert_eq!(2, hyp.num_words());
        assert_eq!(6.5, hyp.total_score());
        assert_eq!("the cat", hyp.to_string());
        assert_eq!(("cat".to_string(), 4.0), hyp.words()[1]);
    }
}
