//! Target connectivity: nodes, the coupling graph, and devices.
//!
//! An [`Architecture`] is an undirected graph over [`Node`]s. Nodes are kept
//! sorted, so each one has a stable arena index; after placement, qubit `p`
//! of a circuit sits on the node with arena index `p`.
//!
//! ## Performance
//!
//! On construction, all-pairs distance and predecessor matrices are
//! precomputed by a BFS from each node. `distance()` is then O(1) and
//! `shortest_path()` is O(path length).
//!
//! # Example
//!
//! ```
//! use quire_compile::Architecture;
//!
//! let arch = Architecture::line(5);
//! assert!(arch.are_adjacent(0, 1));
//! assert!(!arch.are_adjacent(0, 2));
//! assert_eq!(arch.shortest_path(0, 3), Some(vec![0, 1, 2, 3]));
//! ```

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{CompileError, CompileResult};

/// A physical location on a device, ordered by label then index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Node {
    /// Register-like label, e.g. `"q"` or `"grid"`.
    pub label: String,
    /// Index within the label.
    pub index: u32,
}

impl Node {
    /// Create a node.
    pub fn new(label: impl Into<String>, index: u32) -> Self {
        Self {
            label: label.into(),
            index,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.label, self.index)
    }
}

impl From<u32> for Node {
    fn from(index: u32) -> Self {
        Node::new("q", index)
    }
}

/// Plain serialisable description of an architecture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchitectureDesc {
    /// Declared nodes. Nodes mentioned only by edges are added implicitly.
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Undirected edges.
    pub edges: Vec<(Node, Node)>,
}

/// Undirected device connectivity graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ArchitectureDesc", into = "ArchitectureDesc")]
pub struct Architecture {
    /// Arena of sorted nodes; `NodeIndex::new(p)` is physical qubit `p`.
    graph: UnGraph<Node, ()>,
    /// Reverse lookup from node to arena index.
    lookup: FxHashMap<Node, u32>,
    /// `dist[from][to]`, or `u32::MAX` if unreachable.
    dist: Vec<Vec<u32>>,
    /// `pred[from][to]` is the hop before `to` on the path from `from`.
    pred: Vec<Vec<u32>>,
}

impl Architecture {
    /// Build an architecture from its edges; the node set is the edges' endpoints.
    pub fn new(edges: impl IntoIterator<Item = (Node, Node)>) -> CompileResult<Self> {
        let edges: Vec<_> = edges.into_iter().collect();
        let nodes = edges
            .iter()
            .flat_map(|(a, b)| [a.clone(), b.clone()])
            .collect::<Vec<_>>();
        Self::with_nodes(nodes, edges)
    }

    /// Build an architecture from declared nodes and edges between them.
    ///
    /// Fails when an edge references an undeclared node or is a self-loop.
    /// Duplicate edges are ignored.
    pub fn with_nodes(
        nodes: impl IntoIterator<Item = Node>,
        edges: impl IntoIterator<Item = (Node, Node)>,
    ) -> CompileResult<Self> {
        let nodes: Vec<Node> = nodes.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        let lookup = index_lookup(&nodes);

        let mut pairs = Vec::new();
        for (a, b) in edges {
            if a == b {
                return Err(CompileError::MalformedArchitecture(format!(
                    "self-loop on node {a}"
                )));
            }
            let resolve = |n: &Node| {
                lookup.get(n).copied().ok_or_else(|| {
                    CompileError::MalformedArchitecture(format!("edge references undeclared node {n}"))
                })
            };
            pairs.push((resolve(&a)?, resolve(&b)?));
        }

        Ok(Self::from_indices(nodes, lookup, pairs))
    }

    /// Assemble from sorted nodes, their lookup and index pairs known to be valid.
    fn from_indices(
        nodes: Vec<Node>,
        lookup: FxHashMap<Node, u32>,
        edges: Vec<(u32, u32)>,
    ) -> Self {
        let mut graph = UnGraph::with_capacity(nodes.len(), edges.len());
        for node in nodes {
            graph.add_node(node);
        }
        for (a, b) in edges {
            graph.update_edge(NodeIndex::new(a as usize), NodeIndex::new(b as usize), ());
        }

        let mut arch = Self {
            graph,
            lookup,
            dist: vec![],
            pred: vec![],
        };
        arch.precompute_distances();
        arch
    }

    /// BFS from every node, visiting neighbours in ascending order.
    fn precompute_distances(&mut self) {
        let n = self.num_nodes();
        self.dist = vec![vec![u32::MAX; n]; n];
        self.pred = vec![vec![u32::MAX; n]; n];

        for src in 0..n {
            self.dist[src][src] = 0;
            let mut queue = VecDeque::from([index_u32(src)]);

            while let Some(current) = queue.pop_front() {
                let cur = current as usize;
                for neighbour in self.neighbours(current) {
                    let nb = neighbour as usize;
                    if self.dist[src][nb] == u32::MAX {
                        self.dist[src][nb] = self.dist[src][cur] + 1;
                        self.pred[src][nb] = current;
                        queue.push_back(neighbour);
                    }
                }
            }
        }
    }

    /// Nodes `0..n` labelled `q`, with the given index edges.
    fn numbered(n: u32, edges: Vec<(u32, u32)>) -> Self {
        let nodes: Vec<Node> = (0..n).map(Node::from).collect();
        let lookup = index_lookup(&nodes);
        Self::from_indices(nodes, lookup, edges)
    }

    /// A line `0 - 1 - ... - (n-1)`.
    pub fn line(n: u32) -> Self {
        Self::numbered(n, (1..n).map(|i| (i - 1, i)).collect())
    }

    /// A ring: a line closed back to node 0 when `n >= 3`.
    pub fn ring(n: u32) -> Self {
        let mut edges: Vec<_> = (1..n).map(|i| (i - 1, i)).collect();
        if n >= 3 {
            edges.push((n - 1, 0));
        }
        Self::numbered(n, edges)
    }

    /// A `rows x cols` grid, node `r * cols + c` at row `r`, column `c`.
    pub fn grid(rows: u32, cols: u32) -> Self {
        let mut edges = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                let here = r * cols + c;
                if c + 1 < cols {
                    edges.push((here, here + 1));
                }
                if r + 1 < rows {
                    edges.push((here, here + cols));
                }
            }
        }
        Self::numbered(rows * cols, edges)
    }

    /// Every pair of nodes connected.
    pub fn fully_connected(n: u32) -> Self {
        let edges = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();
        Self::numbered(n, edges)
    }

    /// Node 0 connected to every other node.
    pub fn star(n: u32) -> Self {
        Self::numbered(n, (1..n).map(|i| (0, i)).collect())
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct edges.
    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Nodes in arena order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.graph.node_weights()
    }

    /// The node at arena index `p`.
    pub fn node(&self, p: u32) -> Option<&Node> {
        self.graph.node_weight(NodeIndex::new(p as usize))
    }

    /// Arena index of `node`.
    pub fn index_of(&self, node: &Node) -> Option<u32> {
        self.lookup.get(node).copied()
    }

    /// Edges as sorted `(low, high)` index pairs.
    pub fn edges(&self) -> Vec<(u32, u32)> {
        let mut edges: Vec<_> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| {
                let (a, b) = (index_u32(a.index()), index_u32(b.index()));
                (a.min(b), a.max(b))
            })
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Neighbours of `p`, ascending.
    pub fn neighbours(&self, p: u32) -> Vec<u32> {
        if p as usize >= self.num_nodes() {
            return vec![];
        }
        let mut out: Vec<u32> = self
            .graph
            .neighbors(NodeIndex::new(p as usize))
            .map(|n| index_u32(n.index()))
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Number of neighbours of `p`.
    pub fn degree(&self, p: u32) -> usize {
        self.neighbours(p).len()
    }

    /// Check if two nodes share an edge.
    #[inline]
    pub fn are_adjacent(&self, a: u32, b: u32) -> bool {
        self.distance(a, b) == Some(1)
    }

    /// Shortest-path distance, or `None` if unreachable or out of range.
    pub fn distance(&self, from: u32, to: u32) -> Option<u32> {
        let d = *self.dist.get(from as usize)?.get(to as usize)?;
        (d != u32::MAX).then_some(d)
    }

    /// Shortest path `from ..= to`, ties broken toward lower node indices.
    pub fn shortest_path(&self, from: u32, to: u32) -> Option<Vec<u32>> {
        self.distance(from, to)?;
        let row = &self.pred[from as usize];
        let mut path = vec![to];
        let mut current = to;
        while current != from {
            current = row[current as usize];
            path.push(current);
        }
        path.reverse();
        Some(path)
    }

    /// Whether every node can reach every other node.
    pub fn is_connected(&self) -> bool {
        self.num_nodes() == 0 || connected_components(&self.graph) == 1
    }

    /// Plain description of this architecture.
    pub fn to_desc(&self) -> ArchitectureDesc {
        let node = |p: u32| self.node(p).cloned().unwrap_or_else(|| Node::from(p));
        ArchitectureDesc {
            nodes: self.nodes().cloned().collect(),
            edges: self
                .edges()
                .into_iter()
                .map(|(a, b)| (node(a), node(b)))
                .collect(),
        }
    }
}

impl PartialEq for Architecture {
    fn eq(&self, other: &Self) -> bool {
        self.nodes().eq(other.nodes()) && self.edges() == other.edges()
    }
}

impl Eq for Architecture {}

impl TryFrom<ArchitectureDesc> for Architecture {
    type Error = CompileError;

    fn try_from(desc: ArchitectureDesc) -> Result<Self, Self::Error> {
        let implied = desc.edges.iter().flat_map(|(a, b)| [a.clone(), b.clone()]);
        let nodes: Vec<Node> = desc.nodes.iter().cloned().chain(implied).collect();
        Self::with_nodes(nodes, desc.edges)
    }
}

impl From<Architecture> for ArchitectureDesc {
    fn from(arch: Architecture) -> Self {
        arch.to_desc()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn index_u32(i: usize) -> u32 {
    i as u32
}

fn index_lookup(nodes: &[Node]) -> FxHashMap<Node, u32> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.clone(), index_u32(i)))
        .collect()
}

/// Plain serialisable description of a device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceDesc {
    /// The connectivity graph.
    #[serde(flatten)]
    pub architecture: ArchitectureDesc,
    /// Per-node error rates.
    #[serde(default)]
    pub node_errors: Vec<(Node, f64)>,
    /// Per-edge error rates.
    #[serde(default)]
    pub edge_errors: Vec<(Node, Node, f64)>,
}

/// An architecture annotated with optional error rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DeviceDesc", into = "DeviceDesc")]
pub struct Device {
    architecture: Architecture,
    node_errors: FxHashMap<u32, f64>,
    edge_errors: FxHashMap<(u32, u32), f64>,
}

impl Device {
    /// A device with no error information.
    pub fn new(architecture: Architecture) -> Self {
        Self {
            architecture,
            node_errors: FxHashMap::default(),
            edge_errors: FxHashMap::default(),
        }
    }

    /// Attach an error rate to a node.
    pub fn with_node_error(mut self, node: &Node, rate: f64) -> CompileResult<Self> {
        let p = self.resolve(node)?;
        self.node_errors.insert(p, rate);
        Ok(self)
    }

    /// Attach an error rate to an existing edge.
    pub fn with_edge_error(mut self, a: &Node, b: &Node, rate: f64) -> CompileResult<Self> {
        let (pa, pb) = (self.resolve(a)?, self.resolve(b)?);
        if !self.architecture.are_adjacent(pa, pb) {
            return Err(CompileError::MalformedArchitecture(format!(
                "no edge between {a} and {b}"
            )));
        }
        self.edge_errors.insert((pa.min(pb), pa.max(pb)), rate);
        Ok(self)
    }

    fn resolve(&self, node: &Node) -> CompileResult<u32> {
        self.architecture
            .index_of(node)
            .ok_or_else(|| CompileError::MalformedArchitecture(format!("unknown node {node}")))
    }

    /// The connectivity graph.
    pub fn architecture(&self) -> &Architecture {
        &self.architecture
    }

    /// Error rate of the node at arena index `p`, if known.
    pub fn node_error(&self, p: u32) -> Option<f64> {
        self.node_errors.get(&p).copied()
    }

    /// Error rate of the edge between `a` and `b`, if known.
    pub fn edge_error(&self, a: u32, b: u32) -> Option<f64> {
        self.edge_errors.get(&(a.min(b), a.max(b))).copied()
    }
}

impl From<Architecture> for Device {
    fn from(architecture: Architecture) -> Self {
        Device::new(architecture)
    }
}

impl TryFrom<DeviceDesc> for Device {
    type Error = CompileError;

    fn try_from(desc: DeviceDesc) -> Result<Self, Self::Error> {
        let mut device = Device::new(Architecture::try_from(desc.architecture)?);
        for (node, rate) in &desc.node_errors {
            device = device.with_node_error(node, *rate)?;
        }
        for (a, b, rate) in &desc.edge_errors {
            device = device.with_edge_error(a, b, *rate)?;
        }
        Ok(device)
    }
}

impl From<Device> for DeviceDesc {
    fn from(device: Device) -> Self {
        let node = |p: u32| {
            device
                .architecture
                .node(p)
                .cloned()
                .unwrap_or_else(|| Node::from(p))
        };
        let mut node_errors: Vec<_> = device
            .node_errors
            .iter()
            .map(|(&p, &rate)| (node(p), rate))
            .collect();
        node_errors.sort_by(|a, b| a.0.cmp(&b.0));
        let mut edge_errors: Vec<_> = device
            .edge_errors
            .iter()
            .map(|(&(a, b), &rate)| (node(a), node(b), rate))
            .collect();
        edge_errors.sort_by(|x, y| (&x.0, &x.1).cmp(&(&y.0, &y.1)));
        DeviceDesc {
            architecture: device.architecture.to_desc(),
            node_errors,
            edge_errors,
        }
    }
}
