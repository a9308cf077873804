//! バイグラム統計と単語の結合

use hashbrown::{HashMap, HashSet};

/// データ中のバイグラムの出現回数。
///
/// キーは2つのトークンを1つの空白で連結した文字列です。
/// 集計したデータへの参照を保持し、ユニグラム確率の推定に使います。
#[derive(Debug, Clone)]
pub struct BigramCounts<'a> {
    counts: HashMap<String, u32>,
    total: u32,
    initial_data: &'a [String],
}

impl<'a> BigramCounts<'a> {
    /// バイグラムごとの出現回数を返します。
    pub fn counts(&self) -> &HashMap<String, u32> {
        &self.counts
    }

    /// バイグラムの総数（隣接するトークン対の数）を返します。
    pub fn total(&self) -> u32 {
        self.total
    }

    /// 集計の対象となったデータを返します。
    pub fn initial_data(&self) -> &'a [String] {
        self.initial_data
    }

    /// バイグラム `w1 w2` の出現回数を返します。
    pub fn get(&self, w1: &str, w2: &str) -> u32 {
        self.counts
            .get(&bigram_key(w1, w2))
            .copied()
            .unwrap_or(0)
    }
}

/// バイグラム確率とユニグラム確率の組。
#[derive(Debug, Clone, Default)]
pub struct Probabilities {
    /// バイグラムの同時確率
    pub bigram: HashMap<String, f64>,
    /// トークンの周辺確率
    pub unigram: HashMap<String, f64>,
}

fn bigram_key(w1: &str, w2: &str) -> String {
    format!("{w1} {w2}")
}

/// 隣接するトークン対の出現回数を数えます。
///
/// # 引数
///
/// * `data` - トークン列
///
/// # 戻り値
///
/// バイグラムの出現回数と総数
pub fn compute_counts(data: &[String]) -> BigramCounts<'_> {
    let mut counts = HashMap::new();
    let mut total = 0;
    for pair in data.windows(2) {
        *counts.entry(bigram_key(&pair[0], &pair[1])).or_insert(0) += 1;
        total += 1;
    }
    BigramCounts {
        counts,
        total,
        initial_data: data,
    }
}

/// 出現回数を確率に変換します。
///
/// バイグラム確率は出現回数をバイグラムの総数で割った値です。
/// ユニグラム確率は、トークンが1回出現するごとに `1 / バイグラムの総数` を加算して求めます。
/// バイグラムが1つもない場合、ユニグラム確率は計算しません。
pub fn convert_counts_to_probabilities(counts: &BigramCounts<'_>) -> Probabilities {
    let mut probs = Probabilities::default();
    if counts.total == 0 {
        return probs;
    }
    let total = f64::from(counts.total);

    for (key, &count) in &counts.counts {
        probs.bigram.insert(key.clone(), f64::from(count) / total);
    }

    let share = 1.0 / total;
    for token in counts.initial_data {
        *probs.unigram.entry(token.clone()).or_insert(0.0) += share;
    }
    probs
}

/// バイグラムごとの積スコアを計算します。
///
/// スコアは `P(w1, w2) / sqrt(P(w1) * P(w2))` です。
pub fn get_scores(probs: &Probabilities) -> HashMap<String, f64> {
    let mut scores = HashMap::with_capacity(probs.bigram.len());
    for (key, &joint) in &probs.bigram {
        let Some((w1, w2)) = key.split_once(' ') else {
            continue;
        };
        let (Some(&p1), Some(&p2)) = (probs.unigram.get(w1), probs.unigram.get(w2)) else {
            log::warn!("No unigram probability for the bigram {key}");
            continue;
        };
        scores.insert(key.clone(), joint / (p1 * p2).sqrt());
    }
    scores
}

/// 閾値を満たすバイグラムを新しい単語として取り出します。
///
/// 出現回数が`count_threshold`以上で、かつスコアが`probability_threshold`以上の
/// バイグラムについて、空白を除いた連結文字列を返します。
///
/// # 引数
///
/// * `counts` - バイグラムの出現回数
/// * `scores` - バイグラムの積スコア
/// * `count_threshold` - 出現回数の閾値
/// * `probability_threshold` - スコアの閾値
pub fn find_new_words(
    counts: &HashMap<String, u32>,
    scores: &HashMap<String, f64>,
    count_threshold: u32,
    probability_threshold: f64,
) -> HashSet<String> {
    counts
        .iter()
        .filter(|&(key, &count)| {
            count >= count_threshold
                && scores
                    .get(key)
                    .is_some_and(|&score| score >= probability_threshold)
        })
        .map(|(key, _)| key.split_whitespace().collect())
        .collect()
}

/// 新しい単語に従ってトークン列を結合し直します。
///
/// 左から順に、直前のトークンと現在のトークンの連結が`new_words`に含まれていれば
/// 1つのトークンにまとめます。結合は重ならず、`A B C` に対して `AB` と `BC` が
/// 両方含まれる場合は `AB C` になります。トークンを連結した文字列は変わりません。
///
/// # 引数
///
/// * `data` - 結合前のトークン列
/// * `new_words` - 新しい単語の集合
///
/// # 戻り値
///
/// 結合後のトークン列
pub fn resegment(data: &[String], new_words: &HashSet<String>) -> Vec<String> {
    let mut result = Vec::with_capacity(data.len());
    let mut prev: Option<&String> = None;
    for token in data {
        let Some(p) = prev.take() else {
            prev = Some(token);
            continue;
        };
        let combined = format!("{p}{token}");
        if new_words.contains(&combined) {
            result.push(combined);
        } else {
            result.push(p.clone());
            prev = Some(token);
        }
    }
    result.extend(prev.cloned());
    result
}

/// トークンごとの出現回数を数えます。
pub fn get_vocabulary(data: &[String]) -> HashMap<String, u32> {
    let mut vocab = HashMap::new();
    for token in data {
        *vocab.entry(token.clone()).or_insert(0) += 1;
    }
    vocab
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::utils::hashmap;

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_compute_counts() {
        let data = tokens("t h e _ t h e");
        let counts = compute_counts(&data);
        assert_eq!(6, counts.total());
        assert_eq!(2, counts.get("t", "h"));
        assert_eq!(2, counts.get("h", "e"));
        assert_eq!(1, counts.get("e", "_"));
        assert_eq!(0, counts.get("e", "t"));
        assert_eq!(counts.total(), counts.counts().values().sum::<u32>());
        assert_eq!(data.as_slice(), counts.initial_data());
    }

    #[test]
    fn test_compute_counts_short() {
        let data = tokens("a");
        let counts = compute_counts(&data);
        assert_eq!(0, counts.total());
        assert!(counts.counts().is_empty());

        let probs = convert_counts_to_probabilities(&counts);
        assert!(probs.bigram.is_empty());
        assert!(probs.unigram.is_empty());
    }

    #[test]
    fn test_probabilities() {
        let data = tokens("t h e _ c a t");
        let counts = compute_counts(&data);
        let probs = convert_counts_to_probabilities(&counts);

        assert_eq!(Some(&(1.0 / 6.0)), probs.bigram.get("t h"));
        // Unigram frequencies are normalized by the bigram total.
        assert_eq!(Some(&(1.0 / 6.0 + 1.0 / 6.0)), probs.unigram.get("t"));
        assert_eq!(Some(&(1.0 / 6.0)), probs.unigram.get("_"));
    }

    #[test]
    fn test_unigram_accumulates_per_occurrence() {
        let data = tokens("a b a c a d e f g h i");
        let counts = compute_counts(&data);
        let probs = convert_counts_to_probabilities(&counts);

        assert_eq!(10, counts.total());
        // Three additions of 0.1 differ from 3 / 10 in the last bit.
        assert_eq!(Some(&(0.1 + 0.1 + 0.1)), probs.unigram.get("a"));
        assert_ne!(Some(&(3.0 / 10.0)), probs.unigram.get("a"));
        assert_eq!(Some(&0.1), probs.unigram.get("i"));
    }

    #[test]
    fn test_get_scores() {
        let probs = Probabilities {
            bigram: hashmap! {
                "a b".to_string() => 0.25,
            },
            unigram: hashmap! {
                "a".to_string() => 0.5,
                "b".to_string() => 0.125,
            },
        };
        let scores = get_scores(&probs);
        assert_eq!(Some(&1.0), scores.get("a b"));
    }

    #[test]
    fn test_find_new_words() {
        let counts = hashmap! {
            "t h".to_string() => 3,
            "h e".to_string() => 2,
            "e _".to_string() => 1,
            "c a".to_string() => 5,
        };
        let scores = hashmap! {
            "t h".to_string() => 0.9,
            "h e".to_string() => 0.5,
            "e _".to_string() => 0.9,
            "c a".to_string() => 0.1,
        };
        let new_words = find_new_words(&counts, &scores, 2, 0.5);
        let expected: HashSet<String> = ["th", "he"].iter().map(|s| s.to_string()).collect();
        assert_eq!(expected, new_words);
    }

    #[test]
    fn test_resegment_left_to_right() {
        let data = tokens("t h e _ c a t");
        let new_words: HashSet<String> = ["th", "he"].iter().map(|s| s.to_string()).collect();
        assert_eq!(tokens("th e _ c a t"), resegment(&data, &new_words));
    }

    #[test]
    fn test_resegment_non_overlapping() {
        let data = tokens("A B C");
        let new_words: HashSet<String> = ["AB", "BC"].iter().map(|s| s.to_string()).collect();
        assert_eq!(tokens("AB C"), resegment(&data, &new_words));
    }

    #[test]
    fn test_resegment_merges_last_pair() {
        let data = tokens("x a b");
        let new_words: HashSet<String> = ["ab"].iter().map(|s| s.to_string()).collect();
        let result = resegment(&data, &new_words);
        assert_eq!(tokens("x ab"), result);
        assert_eq!(data.concat(), result.concat());
    }

    #[test]
    fn test_resegment_edge_cases() {
        let new_words: HashSet<String> = ["aa"].iter().map(|s| s.to_string()).collect();
        assert!(resegment(&[], &new_words).is_empty());
        assert_eq!(tokens("a"), resegment(&tokens("a"), &new_words));
        assert_eq!(tokens("aa aa a"), resegment(&tokens("a a a a a"), &new_words));
    }

    #[test]
    fn test_get_vocabulary() {
        let vocab = get_vocabulary(&tokens("th e _ th e"));
        assert_eq!(
            hashmap! {
                "th".to_string() => 2,
                "e".to_string() => 2,
                "_".to_string() => 1,
            },
            vocab
        );
    }
}
