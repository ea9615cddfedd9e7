//! Plate- and well-level transfer graphs.
//!
//! Both graphs are built fresh from a [`TransferTable`] with petgraph. A valid pick
//! list produces acyclic graphs; a cycle is logged as a data anomaly, not returned
//! as an error.

use crate::core::table::TransferTable;
use crate::domain::model::WellId;
use petgraph::algo::is_cyclic_directed;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use std::fmt;

/// Aggregate of all transfers between one pair of plates.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateEdge {
    pub total_volume: f64,
    pub transfer_count: usize,
}

impl fmt::Display for PlateEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} tx, {}", self.transfer_count, self.total_volume)
    }
}

/// A single well-to-well transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct WellEdge {
    pub volume: f64,
}

impl fmt::Display for WellEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.volume)
    }
}

/// Node and edge index for a graph keyed by some node identity.
#[derive(Debug, Clone)]
pub struct TransferGraph<N, E> {
    graph: DiGraph<N, E>,
    index: HashMap<N, NodeIndex>,
}

pub type PlateGraph = TransferGraph<String, PlateEdge>;
pub type WellGraph = TransferGraph<WellId, WellEdge>;

impl<N, E> TransferGraph<N, E>
where
    N: Clone + Eq + std::hash::Hash,
{
    fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    fn node(&mut self, key: &N) -> NodeIndex {
        if let Some(idx) = self.index.get(key) {
            return *idx;
        }
        let idx = self.graph.add_node(key.clone());
        self.index.insert(key.clone(), idx);
        idx
    }

    pub fn graph(&self) -> &DiGraph<N, E> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_acyclic(&self) -> bool {
        is_acyclic(&self.graph)
    }

    /// Edges from `from` to `to`, in insertion order.
    pub fn edges_between(&self, from: &N, to: &N) -> Vec<&E> {
        let (Some(&a), Some(&b)) = (self.index.get(from), self.index.get(to)) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self.graph.edges_connecting(a, b).collect();
        edges.sort_by_key(|e| e.id());
        edges.into_iter().map(|e| e.weight()).collect()
    }

    /// Nodes with no incoming edges.
    pub fn roots(&self) -> Vec<&N> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|idx| &self.graph[idx])
            .collect()
    }

    /// Nodes that both receive and give.
    pub fn intermediates(&self) -> Vec<&N> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .next()
                    .is_some()
                    && self
                        .graph
                        .neighbors_directed(idx, Direction::Outgoing)
                        .next()
                        .is_some()
            })
            .map(|idx| &self.graph[idx])
            .collect()
    }
}

impl<N, E> TransferGraph<N, E>
where
    N: fmt::Display,
    E: fmt::Display,
{
    /// Graphviz text for the graph.
    pub fn to_dot(&self) -> String {
        format!(
            "digraph {{\n{}}}\n",
            Dot::with_config(&self.graph, &[Config::GraphContentOnly])
        )
    }
}

/// True when the directed graph has no cycle (self-loops count as cycles).
pub fn is_acyclic<N, E>(graph: &DiGraph<N, E>) -> bool {
    !is_cyclic_directed(graph)
}

/// Source plate -> destination plate, one edge per pair carrying the summed volume.
pub fn build_plate_graph(table: &TransferTable) -> PlateGraph {
    let mut plates = PlateGraph::new();
    let mut pairs: HashMap<(NodeIndex, NodeIndex), EdgeIndex> = HashMap::new();

    for record in table {
        let src = plates.node(&record.source_plate);
        let dst = plates.node(&record.destination_plate);
        match pairs.get(&(src, dst)) {
            Some(&edge) => {
                let weight = &mut plates.graph[edge];
                weight.total_volume += record.transfer_volume;
                weight.transfer_count += 1;
            }
            None => {
                let edge = plates.graph.add_edge(
                    src,
                    dst,
                    PlateEdge {
                        total_volume: record.transfer_volume,
                        transfer_count: 1,
                    },
                );
                pairs.insert((src, dst), edge);
            }
        }
    }

    if !plates.is_acyclic() {
        tracing::warn!("Plate transfer graph is not a DAG");
    }
    tracing::debug!(
        "Built plate graph: {} plates, {} plate pairs",
        plates.node_count(),
        plates.edge_count()
    );
    plates
}

/// One edge per transfer between wells; parallel edges are kept.
pub fn build_well_graph(table: &TransferTable) -> WellGraph {
    let mut wells = WellGraph::new();

    for record in table {
        let src = wells.node(&record.source());
        let dst = wells.node(&record.destination());
        wells.graph.add_edge(
            src,
            dst,
            WellEdge {
                volume: record.transfer_volume,
            },
        );
    }

    if !wells.is_acyclic() {
        tracing::warn!("Well transfer graph is not a DAG");
    }
    tracing::debug!(
        "Built well graph: {} wells, {} transfers",
        wells.node_count(),
        wells.edge_count()
    );
    wells
}
