//! UPGMAによる系統樹の構築と問い合わせ

use std::fmt::{self, Write as _};
use std::path::Path;

use hashbrown::HashMap;

use crate::errors::{LexitreeError, Result};
use crate::phylo::distance::DistanceMap;
use crate::phylo::species::{self, Species};
use crate::utils::format_fixed;

/// 系統樹内のノードを指すインデックス。
///
/// ノードは木が所有するアリーナに格納され、親子の参照はこのインデックスで表します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// 系統樹のノード。
///
/// 葉は1つの種に対応します。内部ノードのラベルは、
/// 左の子と右の子のラベルを `+` で連結したものです。
#[derive(Debug, Clone)]
pub struct PhyloTreeNode {
    label: String,
    species: Option<Species>,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    // Merge height: half the distance at which the two children were joined.
    distance_to_child: f64,
    num_leaves: usize,
}

impl PhyloTreeNode {
    /// ラベルを返します。
    pub fn label(&self) -> &str {
        &self.label
    }

    /// 葉であれば対応する種を返します。
    pub fn species(&self) -> Option<&Species> {
        self.species.as_ref()
    }

    /// 親ノードを返します。
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// 左の子を返します。
    pub fn left_child(&self) -> Option<NodeId> {
        self.left
    }

    /// 右の子を返します。
    pub fn right_child(&self) -> Option<NodeId> {
        self.right
    }

    /// このノードの高さ（子を結合した距離の半分）を返します。葉では0です。
    ///
    /// 木は超距離的であるため、この値はどの子孫の葉までの重み付き距離とも等しくなります。
    pub fn distance_to_child(&self) -> f64 {
        self.distance_to_child
    }

    /// 部分木に含まれる葉の数を返します。
    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    /// 葉かどうかを判定します。
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

impl fmt::Display for PhyloTreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// 種の集合から推定される、根付きの二分系統樹。
///
/// 構築後は変更されません。
///
/// # 例
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use lexitree::phylo::{PhyloTree, Species};
///
/// let species = vec![
///     Species::new("A", "AAAAAAAAAA"),
///     Species::new("B", "AAAAAAAACC"),
///     Species::new("C", "CCCCCAAACA"),
/// ];
/// let tree = PhyloTree::new(species, 10)?;
///
/// assert_eq!(tree.count_all_species(), 3);
/// assert_eq!(
///     tree.to_tree_string(),
///     "(C:0.30000,(B:0.10000,A:0.10000):0.20000):0.0",
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PhyloTree {
    nodes: Vec<PhyloTreeNode>,
    labels: HashMap<String, NodeId>,
    overall_root: Option<NodeId>,
    printing_depth: usize,
}

impl PhyloTree {
    /// 種の集合から系統樹を構築します。
    ///
    /// # 引数
    ///
    /// * `species` - 種のリスト（種名は一意である必要があります）
    /// * `printing_depth` - 最も深いノードを表示するときのインデント幅
    ///
    /// # エラー
    ///
    /// `printing_depth`が負の場合、種名が重複している場合、
    /// 配列長が揃っていない場合に [`LexitreeError::InvalidArgument`] が返されます。
    pub fn new(species: Vec<Species>, printing_depth: i32) -> Result<Self> {
        let printing_depth = usize::try_from(printing_depth).map_err(|_| {
            LexitreeError::invalid_argument("printing_depth", "must not be negative")
        })?;

        let mut tree = Self {
            nodes: Vec::with_capacity(species.len().saturating_mul(2)),
            labels: HashMap::new(),
            overall_root: None,
            printing_depth,
        };
        tree.build(species)?;
        Ok(tree)
    }

    /// FASTA形式の種ファイルから系統樹を構築します。
    ///
    /// # 引数
    ///
    /// * `path` - 種ファイルのパス
    /// * `printing_depth` - 最も深いノードを表示するときのインデント幅
    pub fn from_path<P>(path: P, printing_depth: i32) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        Self::new(species::load_species_file(path)?, printing_depth)
    }

    fn push_node(&mut self, node: PhyloTreeNode) -> Result<NodeId> {
        let id = NodeId(self.nodes.len());
        if self.labels.insert(node.label.clone(), id).is_some() {
            return Err(LexitreeError::invalid_argument(
                "species",
                format!("duplicate label {}", node.label),
            ));
        }
        self.nodes.push(node);
        Ok(id)
    }

    /// 平均距離法（UPGMA）で木を構築する
    fn build(&mut self, species: Vec<Species>) -> Result<()> {
        let mut distances = DistanceMap::new();
        for (i, a) in species.iter().enumerate() {
            for b in &species[i + 1..] {
                distances.insert(a.name(), b.name(), Species::distance(a, b)?);
            }
        }

        let mut working = Vec::with_capacity(species.len());
        for s in species {
            let id = self.push_node(PhyloTreeNode {
                label: s.name().to_string(),
                species: Some(s),
                parent: None,
                left: None,
                right: None,
                distance_to_child: 0.0,
                num_leaves: 1,
            })?;
            working.push(id);
        }

        while working.len() > 1 {
            let (lesser, greater, min_distance) = distances
                .closest_pair()
                .map(|(l, g, d)| (l.to_string(), g.to_string(), d))
                .ok_or_else(|| {
                    LexitreeError::invalid_state("no distance left to merge", "UPGMA")
                })?;
            let less = self.labels[&lesser];
            let great = self.labels[&greater];

            let combined_label = format!("{lesser}+{greater}");
            let num_less = self.nodes[less.0].num_leaves as f64;
            let num_great = self.nodes[great.0].num_leaves as f64;

            for &other in &working {
                if other == less || other == great {
                    continue;
                }
                let other_label = self.nodes[other.0].label.clone();
                let d_less = distances.remove(&lesser, &other_label);
                let d_great = distances.remove(&greater, &other_label);
                let (Some(d_less), Some(d_great)) = (d_less, d_great) else {
                    return Err(LexitreeError::invalid_state(
                        "missing distance",
                        format!("{lesser} / {greater} to {other_label}"),
                    ));
                };
                distances.insert(
                    &combined_label,
                    &other_label,
                    (num_less * d_less + num_great * d_great) / (num_less + num_great),
                );
            }
            distances.remove(&lesser, &greater);

            log::debug!("Merging {lesser} and {greater} at distance {min_distance}");
            // Averaged distances can round below a child's height.
            let height = (min_distance / 2.0)
                .max(self.nodes[less.0].distance_to_child)
                .max(self.nodes[great.0].distance_to_child);
            let combined = self.push_node(PhyloTreeNode {
                label: combined_label,
                species: None,
                parent: None,
                left: Some(less),
                right: Some(great),
                distance_to_child: height,
                num_leaves: self.nodes[less.0].num_leaves + self.nodes[great.0].num_leaves,
            })?;
            self.nodes[less.0].parent = Some(combined);
            self.nodes[great.0].parent = Some(combined);

            working.retain(|&id| id != less && id != great);
            working.push(combined);
            debug_assert_eq!(working.len() * (working.len() - 1) / 2, distances.len());
        }

        self.overall_root = working.first().copied();
        Ok(())
    }

    /// 木全体の根を返します。種が1つもない場合は`None`です。
    pub fn overall_root(&self) -> Option<NodeId> {
        self.overall_root
    }

    /// 表示時のインデント幅を返します。
    pub fn printing_depth(&self) -> usize {
        self.printing_depth
    }

    /// インデックスが指すノードを返します。
    ///
    /// # パニック
    ///
    /// インデックスが別の木のものであり範囲外の場合、パニックします。
    pub fn node(&self, id: NodeId) -> &PhyloTreeNode {
        &self.nodes[id.0]
    }

    /// ノードの上にある枝の長さを返します。根では0です。
    pub fn branch_length(&self, id: NodeId) -> f64 {
        let node = self.node(id);
        node.parent.map_or(0.0, |p| {
            self.node(p).distance_to_child - node.distance_to_child
        })
    }

    /// 木の高さ（根から最も遠い葉までの辺の数）を返します。
    pub fn height(&self) -> i32 {
        self.node_height(self.overall_root)
    }

    /// 木の重み付きの高さを返します。
    pub fn weighted_height(&self) -> f64 {
        self.weighted_node_height(self.overall_root)
    }

    /// 木に含まれる種の数を返します。
    pub fn count_all_species(&self) -> usize {
        self.overall_root
            .map_or(0, |root| self.node(root).num_leaves)
    }

    /// 木に含まれるすべての種を、左の子を先にした深さ優先順で返します。
    pub fn all_species(&self) -> Vec<&Species> {
        let mut species = Vec::with_capacity(self.count_all_species());
        let mut stack: Vec<NodeId> = self.overall_root.into_iter().collect();
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if let Some(s) = node.species() {
                species.push(s);
            }
            stack.extend(node.right);
            stack.extend(node.left);
        }
        species
    }

    /// ラベルでノードを検索します。
    ///
    /// # 戻り値
    ///
    /// 見つかった場合は`Some(NodeId)`、見つからない場合は`None`
    pub fn find_tree_node_by_label(&self, label: &str) -> Option<NodeId> {
        self.labels.get(label).copied()
    }

    /// 2つのノードの最小共通祖先を返します。
    ///
    /// どちらかが`None`の場合は`None`を返します。ノードはそれ自身の祖先とみなします。
    pub fn find_least_common_ancestor(
        &self,
        a: Option<NodeId>,
        b: Option<NodeId>,
    ) -> Option<NodeId> {
        let (a, b) = (a?, b?);
        let mut is_ancestor_of_a = vec![false; self.nodes.len()];
        let mut cur = Some(a);
        while let Some(id) = cur {
            is_ancestor_of_a[id.0] = true;
            cur = self.node(id).parent;
        }

        let mut cur = Some(b);
        while let Some(id) = cur {
            if is_ancestor_of_a[id.0] {
                return Some(id);
            }
            cur = self.node(id).parent;
        }
        None
    }

    /// ラベルで指定した2つのノードの最小共通祖先を返します。
    pub fn find_least_common_ancestor_by_label(&self, label1: &str, label2: &str) -> Option<NodeId> {
        self.find_least_common_ancestor(
            self.find_tree_node_by_label(label1),
            self.find_tree_node_by_label(label2),
        )
    }

    /// 2つのノードの進化的距離を返します。
    ///
    /// 最小共通祖先から各ノードまでの枝の長さの合計です。
    /// どちらかのラベルが見つからない場合は正の無限大を返します。
    pub fn find_evolutionary_distance(&self, label1: &str, label2: &str) -> f64 {
        let (Some(a), Some(b)) = (
            self.find_tree_node_by_label(label1),
            self.find_tree_node_by_label(label2),
        ) else {
            return f64::INFINITY;
        };
        let Some(ancestor) = self.find_least_common_ancestor(Some(a), Some(b)) else {
            return f64::INFINITY;
        };
        // The sum of branch lengths down a path telescopes to a difference of heights.
        let top = self.node(ancestor).distance_to_child;
        (top - self.node(a).distance_to_child) + (top - self.node(b).distance_to_child)
    }

    /// ノードの深さ（根までの親リンクの数）を返します。`None`の場合は-1です。
    pub fn node_depth(&self, node: Option<NodeId>) -> i32 {
        let Some(mut id) = node else {
            return -1;
        };
        let mut depth = 0;
        while let Some(parent) = self.node(id).parent {
            depth += 1;
            id = parent;
        }
        depth
    }

    /// ノードを根とする部分木の高さを返します。`None`の場合は-1、葉では0です。
    pub fn node_height(&self, node: Option<NodeId>) -> i32 {
        let Some(id) = node else {
            return -1;
        };
        let node = self.node(id);
        1 + self.node_height(node.left).max(self.node_height(node.right))
    }

    /// ノードから葉までの枝の長さの和の最大値を返します。`None`の場合は負の無限大です。
    ///
    /// 木は超距離的であるため、どの葉までの和もノードの高さに一致します。
    pub fn weighted_node_height(&self, node: Option<NodeId>) -> f64 {
        node.map_or(f64::NEG_INFINITY, |id| self.node(id).distance_to_child)
    }

    /// 木をNewick形式の文字列に変換します。
    ///
    /// 内部ノードは `(右の子,左の子):枝長` の形で、右の子を先に出力します。
    /// 枝長は小数点以下5桁で、根の枝長は `0.0` です。
    pub fn to_tree_string(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.overall_root {
            self.write_newick(&mut out, root);
        }
        out
    }

    fn write_newick(&self, out: &mut String, id: NodeId) {
        let node = self.node(id);
        if let (Some(left), Some(right)) = (node.left, node.right) {
            out.push('(');
            self.write_newick(out, right);
            out.push(',');
            self.write_newick(out, left);
            out.push(')');
        } else {
            out.push_str(&node.label);
        }
        out.push(':');
        if node.parent.is_some() {
            out.push_str(&format_fixed(self.branch_length(id), 5));
        } else {
            out.push_str("0.0");
        }
    }

    fn write_indented(
        &self,
        f: &mut fmt::Formatter<'_>,
        node: Option<NodeId>,
        max_depth: f64,
    ) -> fmt::Result {
        let Some(id) = node else {
            return Ok(());
        };
        let n = self.node(id);
        self.write_indented(f, n.right, max_depth)?;

        let weighted_depth = max_depth - n.distance_to_child;
        let num_dots = if max_depth > 0.0 {
            (self.printing_depth as f64 * (weighted_depth / max_depth)).ceil() as usize
        } else {
            0
        };
        for _ in 0..num_dots {
            f.write_char('.')?;
        }
        writeln!(f, "{n}")?;

        self.write_indented(f, n.left, max_depth)
    }
}

impl fmt::Display for PhyloTree {
    /// 右の子、自身、左の子の順にノードを1行ずつ出力します。
    ///
    /// 各行の先頭には、根からの重み付き深さに比例した数の `.` が付きます。
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, self.overall_root, self.weighted_height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_species() -> Vec<Species> {
        vec![
            Species::new("A", "AAAAAAAAAA"),
            Species::new("B", "AAAAAAAACC"),
            Species::new("C", "CCCCCAAACA"),
        ]
    }

    #[test]
    fn test_negative_printing_depth() {
        assert!(matches!(
            PhyloTree::new(three_species(), -1),
            Err(LexitreeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_duplicate_species() {
        let species = vec![Species::new("A", "AC"), Species::new("A", "AG")];
        assert!(matches!(
            PhyloTree::new(species, 5),
            Err(LexitreeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_empty_tree() {
        let tree = PhyloTree::new(vec![], 5).unwrap();
        assert_eq!(None, tree.overall_root());
        assert_eq!(0, tree.count_all_species());
        assert_eq!(-1, tree.height());
        assert_eq!(f64::NEG_INFINITY, tree.weighted_height());
        assert_eq!("", tree.to_tree_string());
        assert_eq!("", tree.to_string());
        assert!(tree.all_species().is_empty());
    }

    #[test]
    fn test_single_species() {
        let tree = PhyloTree::new(vec![Species::new("Solo", "ACGT")], 5).unwrap();
        let root = tree.overall_root().unwrap();
        assert!(tree.node(root).is_leaf());
        assert_eq!("Solo:0.0", tree.to_tree_string());
        assert_eq!("Solo\n", tree.to_string());
        assert_eq!(0, tree.height());
        assert_eq!(0.0, tree.find_evolutionary_distance("Solo", "Solo"));
    }

    #[test]
    fn test_structure() {
        let tree = PhyloTree::new(three_species(), 10).unwrap();
        let root = tree.overall_root().unwrap();
        let root_node = tree.node(root);
        assert_eq!("A+B+C", root_node.label());
        assert_eq!(0.3, root_node.distance_to_child());
        assert_eq!(3, root_node.num_leaves());

        let ab = root_node.left_child().unwrap();
        let c = root_node.right_child().unwrap();
        assert_eq!("A+B", tree.node(ab).label());
        assert_eq!("C", tree.node(c).label());
        assert_eq!(0.1, tree.node(ab).distance_to_child());
        assert_eq!(Some(root), tree.node(ab).parent());
        assert_eq!(None, root_node.parent());
        assert!(tree.node(c).species().is_some());
        assert!(root_node.species().is_none());
    }

    #[test]
    fn test_depth_and_height() {
        let tree = PhyloTree::new(three_species(), 10).unwrap();
        let a = tree.find_tree_node_by_label("A");
        let ab = tree.find_tree_node_by_label("A+B");
        assert_eq!(2, tree.node_depth(a));
        assert_eq!(1, tree.node_depth(ab));
        assert_eq!(0, tree.node_depth(tree.overall_root()));
        assert_eq!(-1, tree.node_depth(None));

        assert_eq!(0, tree.node_height(a));
        assert_eq!(1, tree.node_height(ab));
        assert_eq!(2, tree.height());
        assert_eq!(-1, tree.node_height(None));

        assert_eq!(0.0, tree.weighted_node_height(a));
        assert_eq!(0.1, tree.weighted_node_height(ab));
        assert_eq!(0.3, tree.weighted_height());
    }

    #[test]
    fn test_all_species_order() {
        let tree = PhyloTree::new(three_species(), 10).unwrap();
        let names: Vec<&str> = tree.all_species().iter().map(|s| s.name()).collect();
        assert_eq!(vec!["A", "B", "C"], names);
    }

    #[test]
    fn test_find_by_label() {
        let tree = PhyloTree::new(three_species(), 10).unwrap();
        assert!(tree.find_tree_node_by_label("A+B").is_some());
        assert_eq!(None, tree.find_tree_node_by_label("D"));
        // A substring of a label is not a label.
        assert_eq!(None, tree.find_tree_node_by_label("B+C"));
    }

    #[test]
    fn test_lca() {
        let tree = PhyloTree::new(three_species(), 10).unwrap();
        let lca = tree.find_least_common_ancestor_by_label("A", "B").unwrap();
        assert_eq!("A+B", tree.node(lca).label());
        let lca = tree.find_least_common_ancestor_by_label("B", "C").unwrap();
        assert_eq!("A+B+C", tree.node(lca).label());
        let lca = tree.find_least_common_ancestor_by_label("A+B", "A").unwrap();
        assert_eq!("A+B", tree.node(lca).label());
        let lca = tree.find_least_common_ancestor_by_label("C", "C").unwrap();
        assert_eq!("C", tree.node(lca).label());
        assert_eq!(None, tree.find_least_common_ancestor_by_label("A", "Z"));
        assert_eq!(None, tree.find_least_common_ancestor(None, tree.overall_root()));
    }

    #[test]
    fn test_evolutionary_distance() {
        let tree = PhyloTree::new(three_species(), 10).unwrap();
        assert!((tree.find_evolutionary_distance("A", "C") - 0.6).abs() < 1e-12);
        assert!((tree.find_evolutionary_distance("A", "B") - 0.2).abs() < 1e-12);
        assert_eq!(
            tree.find_evolutionary_distance("B", "C"),
            tree.find_evolutionary_distance("C", "B")
        );
        assert_eq!(0.0, tree.find_evolutionary_distance("A", "A"));
        assert_eq!(f64::INFINITY, tree.find_evolutionary_distance("A", "Z"));
    }

    #[test]
    fn test_branch_lengths() {
        let tree = PhyloTree::new(three_species(), 10).unwrap();
        let id = |l| tree.find_tree_node_by_label(l).unwrap();
        assert_eq!(0.1, tree.branch_length(id("A")));
        assert!((tree.branch_length(id("A+B")) - 0.2).abs() < 1e-12);
        assert_eq!(0.3, tree.branch_length(id("C")));
        assert_eq!(0.0, tree.branch_length(id("A+B+C")));
    }

    #[test]
    fn test_indented_print() {
        let tree = PhyloTree::new(three_species(), 10).unwrap();
        let expected = "\
..........C
A+B+C
..........B
.......A+B
..........A
";
        assert_eq!(expected, tree.to_string());

        let flat = PhyloTree::new(three_species(), 0).unwrap();
        assert_eq!("C\nA+B+C\nB\nA+B\nA\n", flat.to_string());
    }
}
