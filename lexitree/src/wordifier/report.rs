//! 発見した単語の辞書による評価

use std::io::{self, BufWriter, Write};

use hashbrown::{HashMap, HashSet};

use crate::errors::Result;

/// 語彙のうち辞書にも含まれる単語を、辞書順に出現回数とともに返します。
pub fn words_discovered<'a>(
    vocab: &'a HashMap<String, u32>,
    dictionary: &HashSet<String>,
) -> Vec<(&'a str, u32)> {
    let mut words: Vec<_> = vocab
        .iter()
        .filter(|(word, _)| dictionary.contains(word.as_str()))
        .map(|(word, &count)| (word.as_str(), count))
        .collect();
    words.sort_unstable();
    words
}

/// 発見した単語の一覧と集計を書き込みます。
///
/// 辞書順に `Discovered <単語> (count <回数>)` を1行ずつ出力し、
/// 最後に異なり語数と延べ語数を出力します。
///
/// # 引数
///
/// * `wtr` - 書き込み先
/// * `vocab` - 単語ごとの出現回数
/// * `dictionary` - 評価用の辞書
///
/// # エラー
///
/// 書き込みに失敗した場合、I/Oエラーが返されます。
pub fn write_num_words_discovered<W>(
    mut wtr: W,
    vocab: &HashMap<String, u32>,
    dictionary: &HashSet<String>,
) -> Result<()>
where
    W: Write,
{
    let words = words_discovered(vocab, dictionary);
    let mut total = 0u64;
    for &(word, count) in &words {
        writeln!(wtr, "Discovered {word} (count {count})")?;
        total += u64::from(count);
    }
    writeln!(wtr, "Number of unique words discovered: {}", words.len())?;
    writeln!(wtr, "Total number words discovered: {total}")?;
    Ok(())
}

/// 発見した単語の一覧と集計を標準出力に書き込みます。
pub fn print_num_words_discovered(
    vocab: &HashMap<String, u32>,
    dictionary: &HashSet<String>,
) -> Result<()> {
    let out = io::stdout();
    let mut wtr = BufWriter::new(out.lock());
    write_num_words_discovered(&mut wtr, vocab, dictionary)?;
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::utils::hashmap;

    #[test]
    fn test_write_num_words_discovered() {
        let vocab = hashmap! {
            "the".to_string() => 3,
            "cat".to_string() => 1,
            "th".to_string() => 2,
            "at".to_string() => 4,
        };
        let dictionary: HashSet<String> = ["the", "cat", "at", "dog"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut buf = vec![];
        write_num_words_discovered(&mut buf, &vocab, &dictionary).unwrap();
        let expected = "\
Discovered at (count 4)
Discovered cat (count 1)
Discovered the (count 3)
Number of unique words discovered: 3
Total number words discovered: 8
";
        assert_eq!(expected, String::from_utf8(buf).unwrap());
    }

    #[test]
    fn test_nothing_discovered() {
        let vocab = hashmap! {
            "x".to_string() => 1,
        };
        let mut buf = vec![];
        write_num_words_discovered(&mut buf, &vocab, &HashSet::new()).unwrap();
        assert_eq!(
            "Number of unique words discovered: 0\nTotal number words discovered: 0\n",
            String::from_utf8(buf).unwrap()
        );
    }
}
