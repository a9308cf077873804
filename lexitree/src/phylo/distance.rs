//! ラベルの非順序ペアをキーとする距離表

use hashbrown::HashMap;

/// クラスタ間の距離を、ラベルの非順序ペアで引ける表。
///
/// `(a, b)` と `(b, a)` は同じエントリを指します。
#[derive(Debug, Default, Clone)]
pub(crate) struct DistanceMap {
    map: HashMap<(String, String), f64>,
}

/// ラベルのペアを `(辞書順で小さい方, 大きい方)` に並べ替える
fn ordered<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl DistanceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn insert(&mut self, a: &str, b: &str, distance: f64) {
        let (lesser, greater) = ordered(a, b);
        self.map
            .insert((lesser.to_string(), greater.to_string()), distance);
    }

    #[cfg(test)]
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let (lesser, greater) = ordered(a, b);
        self.map
            .get(&(lesser.to_string(), greater.to_string()))
            .copied()
    }

    pub fn remove(&mut self, a: &str, b: &str) -> Option<f64> {
        let (lesser, greater) = ordered(a, b);
        self.map.remove(&(lesser.to_string(), greater.to_string()))
    }

    /// 距離が最小のペアを返します。
    ///
    /// 最小値を持つペアが複数ある場合は、`"小さい方|大きい方"` という
    /// キー文字列が辞書順で最小のものを選びます。
    ///
    /// # 戻り値
    ///
    /// `(小さい方のラベル, 大きい方のラベル, 距離)`。表が空の場合は`None`
    pub fn closest_pair(&self) -> Option<(&str, &str, f64)> {
        let min = self
            .map
            .values()
            .copied()
            .fold(f64::INFINITY, f64::min);

        self.map
            .iter()
            .filter(|&(_, &d)| d == min)
            .map(|((lesser, greater), &d)| (format!("{lesser}|{greater}"), lesser, greater, d))
            .min_by(|x, y| x.0.cmp(&y.0))
            .map(|(_, lesser, greater, d)| (lesser.as_str(), greater.as_str(), d))
    }
}
