//! 音声認識の仮説を表すラティス（有向非巡回グラフ）の実装モジュール。
//!
//! ラティスは、ノード（時刻）と辺（単語とスコア）から構成され、
//! 非常に多くの認識候補をコンパクトに表現します。
//! このモジュールは、ラティスファイルの読み書き、トポロジカルソート、
//! 最良パスの復号、パス数の計数、各種の問い合わせを提供します。
//!
//! # 例
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use lexitree::lattice::Lattice;
//!
//! let text = "id utt-1
//! start 0
//! end 3
//! numNodes 4
//! numEdges 4
//! node 0 0.00
//! node 1 0.50
//! node 2 0.50
//! node 3 1.00
//! edge 0 1 a 1 1
//! edge 0 2 b 2 1
//! edge 1 3 c 1 1
//! edge 2 3 d 1 1
//! ";
//!
//! let lattice = Lattice::from_reader(text.as_bytes())?;
//! let hyp = lattice.decode(1.0)?;
//! assert_eq!(hyp.to_string(), "a c");
//! assert_eq!(hyp.total_score(), 4.0);
//! assert_eq!(lattice.count_all_paths().to_string(), "2");
//! # Ok(())
//! # }
//! ```
mod edge;
mod hypothesis;

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

use hashbrown::HashSet;
use num_bigint::BigUint;

use crate::errors::{LexitreeError, Result};
use crate::utils::{self, format_fixed};

pub use crate::lattice::edge::{Edge, SILENCE_LABEL};
pub use crate::lattice::hypothesis::Hypothesis;

/// 音声認識の仮説を表すラティス。
///
/// ファイルから一度だけ構築され、その後は変更されません。
/// 辺は始点ノードごとに終点の昇順で保持されるため、
/// 辺の走査は常に `(i, j)` の行優先順になります。
#[derive(Debug, Clone)]
pub struct Lattice {
    utterance_id: String,
    start_idx: usize,
    end_idx: usize,
    num_nodes: usize,
    num_edges: usize,
    node_times: Vec<f64>,
    adjacency: Vec<BTreeMap<usize, Edge>>,
    non_silence_words: usize,

    // Computed once at construction; also proves the graph is acyclic.
    topo_order: Vec<usize>,
}

/// 空白区切りのトークンを順に読み出すカーソル
struct Tokens<'a> {
    inner: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.split_whitespace(),
        }
    }

    fn next_token(&mut self, what: &str) -> Result<&'a str> {
        self.inner.next().ok_or_else(|| {
            LexitreeError::invalid_format("lattice", format!("unexpected end of input, expected {what}"))
        })
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        let token = self.next_token(keyword)?;
        if token != keyword {
            return Err(LexitreeError::invalid_format(
                "lattice",
                format!("expected `{keyword}`, found `{token}`"),
            ));
        }
        Ok(())
    }

    fn parse<T>(&mut self, what: &str) -> Result<T>
    where
        T: FromStr,
        LexitreeError: From<T::Err>,
    {
        Ok(self.next_token(what)?.parse()?)
    }
}

impl Lattice {
    /// ラティスファイルを読み込みます。
    ///
    /// # 引数
    ///
    /// * `path` - ラティスファイルのパス
    ///
    /// # 戻り値
    ///
    /// 読み込まれたラティス
    ///
    /// # エラー
    ///
    /// ファイルを開けない場合は [`LexitreeError::OpenFile`]、
    /// 形式が不正な場合は [`LexitreeError`] の各バリアントが返されます。
    pub fn from_path<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let file = utils::open_file(path)?;
        Self::from_reader(file)
    }

    /// リーダーからラティスを読み込みます。
    ///
    /// 入力は空白区切りのトークン列で、次の順に並びます。
    ///
    /// ```text
    /// id <utteranceID>
    /// start <int>
    /// end <int>
    /// numNodes <int>
    /// numEdges <int>
    /// node <i> <time>                                  (任意の順で繰り返し)
    /// edge <from> <to> <label> <amScore> <lmScore>     (任意の順で繰り返し)
    /// ```
    ///
    /// # 引数
    ///
    /// * `rdr` - ラティスファイルのリーダー
    ///
    /// # 戻り値
    ///
    /// 読み込まれたラティス
    ///
    /// # エラー
    ///
    /// トークンの欠落、数値の形式エラー、範囲外のノード番号、
    /// 巡回を含むグラフの場合にエラーが返されます。
    pub fn from_reader<R>(mut rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut text = String::new();
        rdr.read_to_string(&mut text)?;
        let mut tokens = Tokens::new(&text);

        tokens.expect_keyword("id")?;
        let utterance_id = tokens.next_token("an utterance ID")?.to_string();
        tokens.expect_keyword("start")?;
        let start_idx: usize = tokens.parse("a start index")?;
        tokens.expect_keyword("end")?;
        let end_idx: usize = tokens.parse("an end index")?;
        tokens.expect_keyword("numNodes")?;
        let num_nodes: usize = tokens.parse("the number of nodes")?;
        tokens.expect_keyword("numEdges")?;
        let num_edges: usize = tokens.parse("the number of edges")?;

        check_node_index("start", start_idx, num_nodes)?;
        check_node_index("end", end_idx, num_nodes)?;

        let mut adjacency = allocate_nodes(num_nodes, BTreeMap::new())?;
        let mut node_times = allocate_nodes(num_nodes, 0.0)?;
        let mut non_silence_words = 0;
        let mut num_edge_records = 0;

        while let Some(record) = tokens.inner.next() {
            match record {
                "node" => {
                    let idx: usize = tokens.parse("a node index")?;
                    check_node_index("node", idx, num_nodes)?;
                    let time: f64 = tokens.parse("a node time")?;
                    node_times[idx] = time;
                }
                "edge" => {
                    let from: usize = tokens.parse("a source node")?;
                    let to: usize = tokens.parse("a target node")?;
                    check_node_index("edge", from, num_nodes)?;
                    check_node_index("edge", to, num_nodes)?;
                    let label = tokens.next_token("an edge label")?;
                    let am_score: i32 = tokens.parse("an acoustic score")?;
                    let lm_score: i32 = tokens.parse("a language model score")?;
                    let edge = Edge::new(label, am_score, lm_score);
                    if !edge.is_silence() {
                        non_silence_words += 1;
                    }
                    adjacency[from].insert(to, edge);
                    num_edge_records += 1;
                }
                other => {
                    return Err(LexitreeError::invalid_format(
                        "lattice",
                        format!("unknown record type `{other}`"),
                    ));
                }
            }
        }

        if num_edge_records != num_edges {
            log::warn!("numEdges is {num_edges} but {num_edge_records} edge records were read");
        }

        let mut lattice = Self {
            utterance_id,
            start_idx,
            end_idx,
            num_nodes,
            num_edges,
            node_times,
            adjacency,
            non_silence_words,
            topo_order: vec![],
        };
        lattice.topo_order = lattice.kahn_order();
        if lattice.topo_order.len() != num_nodes {
            return Err(LexitreeError::invalid_format(
                "lattice",
                "the graph contains a cycle",
            ));
        }

        log::debug!(
            "Loaded lattice {}: {} nodes, {} edges",
            lattice.utterance_id,
            lattice.num_nodes,
            num_edge_records,
        );

        Ok(lattice)
    }

    /// 発話IDを返します。
    #[inline(always)]
    pub fn utterance_id(&self) -> &str {
        &self.utterance_id
    }

    /// 始点ノードの番号を返します。
    #[inline(always)]
    pub const fn start_idx(&self) -> usize {
        self.start_idx
    }

    /// 終点ノードの番号を返します。
    #[inline(always)]
    pub const fn end_idx(&self) -> usize {
        self.end_idx
    }

    /// ノード数を返します。
    #[inline(always)]
    pub const fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// ヘッダに記載された辺の数を返します。
    #[inline(always)]
    pub const fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// 各ノードの時刻（秒）を返します。
    #[inline(always)]
    pub fn node_times(&self) -> &[f64] {
        &self.node_times
    }

    /// `-silence-` 以外のラベルを持つ辺の数を返します。
    #[inline(always)]
    pub const fn non_silence_words(&self) -> usize {
        self.non_silence_words
    }

    /// ノード `i` から `j` への辺を返します。
    ///
    /// # 戻り値
    ///
    /// 辺が存在する場合は`Some(&Edge)`、存在しない場合は`None`
    pub fn edge(&self, i: usize, j: usize) -> Option<&Edge> {
        self.adjacency.get(i).and_then(|row| row.get(&j))
    }

    /// すべての辺を `(i, j)` の行優先順で走査するイテレータを返します。
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, &Edge)> + '_ {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().map(move |(&j, edge)| (i, j, edge)))
    }

    /// ノードのトポロジカル順序を返します。
    ///
    /// すべての辺 `(u, v)` について、`u` は `v` より前に現れます。
    /// 入次数0のノードを番号の小さい順にキューへ入れ、
    /// 取り出したノードの後続ノードを番号順に処理します（Kahnのアルゴリズム）。
    pub fn topological_sort(&self) -> Vec<usize> {
        self.topo_order.clone()
    }

    fn kahn_order(&self) -> Vec<usize> {
        let mut in_degree = vec![0usize; self.num_nodes];
        for (_, j, _) in self.edges() {
            in_degree[j] += 1;
        }

        let mut queue: VecDeque<usize> = (0..self.num_nodes)
            .filter(|&i| in_degree[i] == 0)
            .collect();

        let mut order = Vec::with_capacity(self.num_nodes);
        while let Some(n) = queue.pop_front() {
            order.push(n);
            for &j in self.adjacency[n].keys() {
                in_degree[j] -= 1;
                if in_degree[j] == 0 {
                    queue.push_back(j);
                }
            }
        }
        order
    }

    /// 始点から終点への最小コストのパスを求めます。
    ///
    /// 辺のコストは `am_score + lm_scale * lm_score` で、パスのコストは辺のコストの和です。
    /// トポロジカル順にノードを処理し、後続の辺を緩和します。
    /// 同じコストのパスが複数ある場合は、先に見つかった前任ノードが優先されます。
    ///
    /// # 引数
    ///
    /// * `lm_scale` - 言語モデルスコアの重み
    ///
    /// # 戻り値
    ///
    /// 最良パス上の単語とスコアの列。始点と終点が同じ場合は空の仮説
    ///
    /// # エラー
    ///
    /// 終点が始点から到達不能な場合、[`LexitreeError::InvalidState`] が返されます。
    pub fn decode(&self, lm_scale: f64) -> Result<Hypothesis> {
        let mut cost = vec![f64::INFINITY; self.num_nodes];
        let mut parent: Vec<Option<usize>> = vec![None; self.num_nodes];
        cost[self.start_idx] = 0.0;

        for &u in &self.topo_order {
            if cost[u] == f64::INFINITY {
                continue;
            }
            for (&v, edge) in &self.adjacency[u] {
                let new_cost = cost[u] + edge.combined_score(lm_scale);
                if new_cost < cost[v] {
                    cost[v] = new_cost;
                    parent[v] = Some(u);
                }
            }
        }

        let mut path = vec![self.end_idx];
        let mut node = self.end_idx;
        while node != self.start_idx {
            node = parent[node].ok_or_else(|| {
                LexitreeError::invalid_state(
                    "no path from the start node to the end node",
                    format!("lattice {}", self.utterance_id),
                )
            })?;
            path.push(node);
        }
        path.reverse();

        let mut hyp = Hypothesis::new();
        for w in path.windows(2) {
            // Every consecutive pair was linked by a relaxed edge.
            if let Some(edge) = self.edge(w[0], w[1]) {
                hyp.add_word(edge.label(), edge.combined_score(lm_scale));
            }
        }
        Ok(hyp)
    }

    /// 始点から終点への異なるパスの総数を数えます。
    ///
    /// パス数はラティスの大きさに対して指数的に増えるため、多倍長整数で返します。
    pub fn count_all_paths(&self) -> BigUint {
        let mut paths = vec![BigUint::default(); self.num_nodes];
        paths[self.start_idx] = BigUint::from(1u8);

        for &u in &self.topo_order {
            if paths[u] == BigUint::default() {
                continue;
            }
            let count = paths[u].clone();
            for &v in self.adjacency[u].keys() {
                paths[v] += &count;
            }
        }

        std::mem::take(&mut paths[self.end_idx])
    }

    /// ラティス密度を返します。
    ///
    /// `-silence-` 以外の単語数を、終点ノードの時刻で割った値です。
    /// 始点ノードの時刻は差し引きません。
    pub fn lattice_density(&self) -> f64 {
        self.non_silence_words as f64 / self.node_times[self.end_idx]
    }

    /// 指定時刻と重なるすべての単語を返します。
    ///
    /// 辺 `(i, j)` は `time(i) <= time <= time(j)` のとき重なるとみなします。
    /// 時刻がラティスの範囲外の場合は空集合になります。
    ///
    /// # 引数
    ///
    /// * `time` - 問い合わせる時刻（秒）
    pub fn unique_words_at_time(&self, time: f64) -> HashSet<&str> {
        self.edges()
            .filter(|&(i, j, _)| self.node_times[i] <= time && time <= self.node_times[j])
            .map(|(_, _, edge)| edge.label())
            .collect()
    }

    /// 指定された単語が現れる各辺の中点時刻を、整列した文字列として返します。
    ///
    /// 中点は小数点以下2桁で書式化され、書式化後の文字列の辞書順に並びます
    /// （数値順ではありません）。
    ///
    /// # 引数
    ///
    /// * `word` - 検索する単語
    pub fn sorted_hits(&self, word: &str) -> Vec<String> {
        let mut times: Vec<String> = self
            .edges()
            .filter(|(_, _, edge)| edge.label() == word)
            .map(|(i, j, _)| format_fixed((self.node_times[i] + self.node_times[j]) / 2.0, 2))
            .collect();
        times.sort_unstable();
        times
    }

    /// [`sorted_hits`](Self::sorted_hits) の結果を1行に書き出します。
    ///
    /// 各時刻の後ろに空白を1つ出力します。該当がなければ何も出力しません。
    ///
    /// # エラー
    ///
    /// 書き込みに失敗した場合、I/Oエラーが返されます。
    pub fn write_sorted_hits<W>(&self, mut wtr: W, word: &str) -> Result<()>
    where
        W: Write,
    {
        for t in self.sorted_hits(word) {
            write!(wtr, "{t} ")?;
        }
        Ok(())
    }

    /// [`sorted_hits`](Self::sorted_hits) の結果を標準出力に書き出します。
    pub fn print_sorted_hits(&self, word: &str) -> Result<()> {
        let out = std::io::stdout();
        let mut out = out.lock();
        self.write_sorted_hits(&mut out, word)?;
        out.flush()?;
        Ok(())
    }

    /// ラティスをGraphviz形式で書き出します。
    ///
    /// # 引数
    ///
    /// * `wtr` - 書き込み先
    pub fn write_dot<W>(&self, wtr: W) -> Result<()>
    where
        W: Write,
    {
        let mut wtr = BufWriter::new(wtr);
        writeln!(wtr, "digraph g {{")?;
        writeln!(wtr, "   rankdir=\"LR\"")?;
        for (i, j, edge) in self.edges() {
            writeln!(wtr, "   {i} -> {j} [label = \"{}\"]", edge.label())?;
        }
        writeln!(wtr, "}}")?;
        wtr.flush()?;
        Ok(())
    }

    /// ラティスをGraphviz形式でファイルに書き出します。
    ///
    /// # 引数
    ///
    /// * `path` - 出力ファイルのパス
    pub fn write_as_dot<P>(&self, path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| LexitreeError::open_file(path, e))?;
        self.write_dot(file)
    }

    /// ラティスを入力と同じ形式でファイルに保存します。
    ///
    /// # 引数
    ///
    /// * `path` - 出力ファイルのパス
    pub fn save_as_file<P>(&self, path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| LexitreeError::open_file(path, e))?;
        let mut wtr = BufWriter::new(file);
        writeln!(wtr, "{self}")?;
        wtr.flush()?;
        Ok(())
    }
}

/// ノード数分の配列を確保します。
///
/// `numNodes` はファイルから読んだ値なので、確保に失敗した場合は形式エラーとします。
fn allocate_nodes<T: Clone>(num_nodes: usize, value: T) -> Result<Vec<T>> {
    let mut nodes = Vec::new();
    nodes.try_reserve_exact(num_nodes).map_err(|e| {
        LexitreeError::invalid_format(
            "lattice",
            format!("numNodes {num_nodes} is too large: {e}"),
        )
    })?;
    nodes.resize(num_nodes, value);
    Ok(nodes)
}

fn check_node_index(what: &'static str, idx: usize, num_nodes: usize) -> Result<()> {
    if idx >= num_nodes {
        return Err(LexitreeError::invalid_format(
            "lattice",
            format!("{what} node {idx} is out of range (numNodes = {num_nodes})"),
        ));
    }
    Ok(())
}

impl fmt::Display for Lattice {
    /// ラティスファイルと同じ形式で書き出します。
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "id {}", self.utterance_id)?;
        writeln!(f, "start {}", self.start_idx)?;
        writeln!(f, "end {}", self.end_idx)?;
        writeln!(f, "numNodes {}", self.num_nodes)?;
        writeln!(f, "numEdges {}", self.num_edges)?;
        for (i, &time) in self.node_times.iter().enumerate() {
            writeln!(f, "node {i} {}", format_fixed(time, 2))?;
        }
        for (i, j, edge) in self.edges() {
            writeln!(
                f,
                "edge {i} {j} {} {} {}",
                edge.label(),
                edge.am_score(),
                edge.lm_score(),
            )?;
        }
        Ok(())
    }
}
