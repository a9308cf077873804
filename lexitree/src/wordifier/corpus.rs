//! コーパスと辞書の読み込み

use std::io::Read;
use std::path::Path;

use hashbrown::HashSet;

use crate::errors::Result;
use crate::utils;

/// 文字単位で分割されたテキストを読み込みます。
///
/// すべての行を空白で分割し、出現順のトークン列として返します。
///
/// # 引数
///
/// * `rdr` - テキストのリーダー
///
/// # エラー
///
/// 読み込みに失敗した場合、I/Oエラーが返されます。
pub fn load_sentences<R>(rdr: R) -> Result<Vec<String>>
where
    R: Read,
{
    let data = utils::read_tokens(rdr)?;
    log::debug!("Loaded {} tokens", data.len());
    Ok(data)
}

/// テキストファイルをパスから読み込みます。
///
/// # エラー
///
/// ファイルを開けない場合、[`LexitreeError::OpenFile`](crate::errors::LexitreeError::OpenFile)
/// が返されます。
pub fn load_sentences_file<P>(path: P) -> Result<Vec<String>>
where
    P: AsRef<Path>,
{
    load_sentences(utils::open_file(path)?)
}

/// 評価用の辞書を読み込みます。
///
/// 1行に1語以上を空白区切りで記述した形式で、重複は除かれます。
pub fn load_dictionary<R>(rdr: R) -> Result<HashSet<String>>
where
    R: Read,
{
    let words: HashSet<String> = utils::read_tokens(rdr)?.into_iter().collect();
    log::debug!("Loaded {} dictionary words", words.len());
    Ok(words)
}

/// 評価用の辞書をパスから読み込みます。
pub fn load_dictionary_file<P>(path: P) -> Result<HashSet<String>>
where
    P: AsRef<Path>,
{
    load_dictionary(utils::open_file(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_sentences() {
        let text = "t h e _ c a t\ns a t\n";
        let data = load_sentences(text.as_bytes()).unwrap();
        assert_eq!(
            vec!["t", "h", "e", "_", "c", "a", "t", "s", "a", "t"],
            data
        );
    }

    #[test]
    fn test_load_dictionary() {
        let text = "the cat\nsat\n\nthe\n";
        let dict = load_dictionary(text.as_bytes()).unwrap();
        assert_eq!(3, dict.len());
        assert!(dict.contains("the"));
        assert!(dict.contains("sat"));
        assert!(!dict.contains(""));
    }
}
