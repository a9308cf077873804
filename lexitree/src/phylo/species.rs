//! 種と配列の読み込み

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::errors::{LexitreeError, Result};
use crate::utils;

/// ヘッダ内で種名の前に置かれる `|` の数
const NUM_HEADER_FIELDS: usize = 6;

/// 名前と配列を持つ1つの種。
///
/// 配列は1文字ずつのトークンの列として保持します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Species {
    name: String,
    sequence: Vec<char>,
}

impl Species {
    /// 新しい種を作成します。
    ///
    /// # 引数
    ///
    /// * `name` - 種名
    /// * `sequence` - 配列（各文字が1トークン）
    pub fn new<S>(name: S, sequence: &str) -> Self
    where
        S: Into<String>,
    {
        Self {
            name: name.into(),
            sequence: sequence.chars().collect(),
        }
    }

    /// 種名を返します。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 配列を返します。
    pub fn sequence(&self) -> &[char] {
        &self.sequence
    }

    /// 2つの種の距離を計算します。
    ///
    /// 一致しない位置の数を配列長で割った値（ハミング距離の割合）です。
    /// 空の配列どうしの距離は0とします。
    ///
    /// # エラー
    ///
    /// 配列長が異なる場合、[`LexitreeError::InvalidArgument`] が返されます。
    pub fn distance(a: &Self, b: &Self) -> Result<f64> {
        if a.sequence.len() != b.sequence.len() {
            return Err(LexitreeError::invalid_argument(
                "species",
                format!(
                    "sequences of {} ({}) and {} ({}) differ in length",
                    a.name,
                    a.sequence.len(),
                    b.name,
                    b.sequence.len(),
                ),
            ));
        }
        if a.sequence.is_empty() {
            return Ok(0.0);
        }
        let mismatches = a
            .sequence
            .iter()
            .zip(&b.sequence)
            .filter(|(x, y)| x != y)
            .count();
        Ok(mismatches as f64 / a.sequence.len() as f64)
    }
}

/// ヘッダ行から種名を取り出す
///
/// 6番目の `|` より後ろが種名です。`|` が足りない場合や、
/// 種名の中にさらに `|` が含まれる場合は `None` を返します。
fn parse_header(header: &str) -> Option<&str> {
    let mut fields = header.splitn(NUM_HEADER_FIELDS + 1, '|');
    for _ in 0..NUM_HEADER_FIELDS {
        fields.next()?;
    }
    let name = fields.next()?.trim();
    if name.is_empty() || name.contains('|') {
        return None;
    }
    Some(name)
}

/// FASTA形式の種ファイルを読み込みます。
///
/// # 引数
///
/// * `rdr` - 種ファイルのリーダー
///
/// # 戻り値
///
/// 出現順の種のリスト
///
/// # エラー
///
/// 読み込みに失敗した場合、I/Oエラーが返されます。
pub fn load_species<R>(rdr: R) -> Result<Vec<Species>>
where
    R: Read,
{
    let reader = BufReader::new(rdr);

    let mut species = vec![];
    let mut current: Option<Species> = None;
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('>') {
            species.extend(current.take());
            match parse_header(line) {
                Some(name) => {
                    current = Some(Species {
                        name: name.to_string(),
                        sequence: vec![],
                    })
                }
                None => log::warn!("Skipping a header without a species name: {line}"),
            }
        } else if let Some(current) = current.as_mut() {
            current
                .sequence
                .extend(line.split_whitespace().flat_map(str::chars));
        }
    }
    species.extend(current);

    log::debug!("Loaded {} species", species.len());
    Ok(species)
}

/// FASTA形式の種ファイルをパスから読み込みます。
///
/// # エラー
///
/// ファイルを開けない場合、[`LexitreeError::OpenFile`] が返されます。
pub fn load_species_file<P>(path: P) -> Result<Vec<Species>>
where
    P: AsRef<Path>,
{
    load_species(utils::open_file(path)?)
}
