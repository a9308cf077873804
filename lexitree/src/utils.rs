//! ユーティリティ関数を提供するモジュール
//!
//! 主に以下の機能を提供します：
//!
//! - 固定小数点形式での数値の書式化
//! - ファイルのオープンとトークン列への分割
//! - テスト用のマクロ

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::errors::{LexitreeError, Result};

/// 浮動小数点数を小数点以下`precision`桁の文字列に書式化する
///
/// 値を往復可能な最短の十進表現に変換してから、その表現を四捨五入(ゼロから遠い方向)します。
/// 標準の`{:.N}`は二進表現の正確な値を偶数丸めするため、`0.125`や`1.005`のような値で
/// 結果が異なります。時刻や枝長の出力は、こちらの丸め規則に従うファイル形式と互換です。
///
/// # 引数
///
/// * `value` - 書式化する値
/// * `precision` - 小数点以下の桁数
///
/// # 戻り値
///
/// 書式化された文字列
///
/// # 例
///
/// ```
/// # use lexitree::utils::format_fixed;
/// assert_eq!(format_fixed(0.125, 2), "0.13");
/// assert_eq!(format_fixed(1.005, 2), "1.01");
/// assert_eq!(format_fixed(0.3, 5), "0.30000");
/// ```
pub fn format_fixed(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let repr = value.abs().to_string();
    let (int_part, frac_part) = repr.split_once('.').unwrap_or((repr.as_str(), ""));

    let mut digits: Vec<u8> = int_part.bytes().map(|b| b - b'0').collect();
    let mut int_len = digits.len();
    let mut rest = frac_part.bytes().map(|b| b - b'0');
    for _ in 0..precision {
        digits.push(rest.next().unwrap_or(0));
    }

    if rest.next().is_some_and(|d| d >= 5) {
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, 1);
                int_len += 1;
                break;
            }
            i -= 1;
            if digits[i] == 9 {
                digits[i] = 0;
            } else {
                digits[i] += 1;
                break;
            }
        }
    }

    let mut out = String::with_capacity(digits.len() + 2);
    if value < 0.0 {
        out.push('-');
    }
    out.extend(digits[..int_len].iter().map(|&d| char::from(b'0' + d)));
    if precision != 0 {
        out.push('.');
        out.extend(digits[int_len..].iter().map(|&d| char::from(b'0' + d)));
    }
    out
}

/// ファイルを開きます
///
/// 開けなかった場合は、パスを含む[`LexitreeError::OpenFile`]を返します。
pub(crate) fn open_file<P>(path: P) -> Result<File>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    File::open(path).map_err(|e| LexitreeError::open_file(path, e))
}

/// リーダーの内容を空白区切りのトークン列に分割する
///
/// 空行や連続する空白は無視されます。
///
/// # 引数
///
/// * `rdr` - 読み込み元
///
/// # 戻り値
///
/// 出現順のトークン列
///
/// # エラー
///
/// 読み込みに失敗した場合、I/Oエラーが返されます。
pub fn read_tokens<R>(rdr: R) -> Result<Vec<String>>
where
    R: Read,
{
    let reader = BufReader::new(rdr);
    let mut tokens = vec![];
    for line in reader.lines() {
        let line = line?;
        tokens.extend(line.split_whitespace().map(str::to_string));
    }
    Ok(tokens)
}

#[cfg(test)]
/// HashMapリテラルを簡潔に記述するためのマクロ
///
/// キーと値のペアを`=>`演算子で指定し、カンマで区切って記述します。
///
/// # 例
///
/// ```ignore
/// let map = hashmap! {
///     "t h".to_string() => 2,
///     "h e".to_string() => 1,
/// };
/// ```
macro_rules! hashmap {
    ( $($k:expr => $v:expr,)* ) => {
        {
            #[allow(unused_mut)]
            let mut h = hashbrown::HashMap::new();
            $(
                h.insert($k, $v);
            )*
            h
        }
    };
    ( $($k:expr => $v:expr),* ) => {
        hashmap![$( $k => $v, )*]
    };
}

#[cfg(test)]
pub(crate) use hashmap;
