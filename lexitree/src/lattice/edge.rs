//! ラティスの辺の定義

/// 無音区間を表すラベル
///
/// ラティス密度の計算では、このラベルを持つ辺は単語として数えません。
pub const SILENCE_LABEL: &str = "-silence-";

/// ラティス内の1本の辺。
///
/// 単語ラベルと、音響モデル・言語モデルの2つのスコアを保持します。
/// 構築後は変更されません。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    label: String,
    am_score: i32,
    lm_score: i32,
}

impl Edge {
    /// 新しい辺を作成します。
    ///
    /// # 引数
    ///
    /// * `label` - 単語ラベル
    /// * `am_score` - 音響モデルのスコア
    /// * `lm_score` - 言語モデルのスコア
    pub fn new<S>(label: S, am_score: i32, lm_score: i32) -> Self
    where
        S: Into<String>,
    {
        Self {
            label: label.into(),
            am_score,
            lm_score,
        }
    }

    /// 単語ラベルを返します。
    #[inline(always)]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// 音響モデルのスコアを返します。
    #[inline(always)]
    pub const fn am_score(&self) -> i32 {
        self.am_score
    }

    /// 言語モデルのスコアを返します。
    #[inline(always)]
    pub const fn lm_score(&self) -> i32 {
        self.lm_score
    }

    /// 無音区間の辺かどうかを判定します。
    #[inline(always)]
    pub fn is_silence(&self) -> bool {
        self.label == SILENCE_LABEL
    }

    /// 言語モデルの重みを適用した辺のコストを計算します。
    ///
    /// コストは `am_score + lm_scale * lm_score` です。
    ///
    /// # 引数
    ///
    /// * `lm_scale` - 言語モデルスコアの重み
    #[inline(always)]
    pub fn combined_score(&self, lm_scale: f64) -> f64 {
        f64::from(self.am_score) + f64::from(self.lm_score) * lm_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_score() {
        let edge = Edge::new("a", 10, -4);
        assert_eq!(10.0, edge.combined_score(0.0));
        assert_eq!(2.0, edge.combined_score(2.0));
        assert_eq!(12.0, edge.combined_score(-0.5));
    }

    #[test]
    fn test_is_silence() {
        assert!(Edge::new("-silence-", 0, 0).is_silence());
        assert!(!Edge::new("silence", 0, 0).is_silence());
        assert!(!Edge::new("to_the", 0, 0).is_silence());
    }
}
