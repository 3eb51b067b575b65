//! Dependency ordering of KSQL statements.
//!
//! Every statement becomes a node keyed by its upper-cased name, with an edge
//! from each statement to every statement reading from it. Sources that are
//! not declared in the same set (raw topics, objects managed elsewhere) are
//! ignored.

mod error;
pub mod types;

pub use crate::error::DagError;
use crate::types::{DagNode, DagResult, EmptyEdge};
use ksqlparser::Statement;
use log::{debug, info};
use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap};
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Default)]
pub struct StatementDag {
    pub graph: DiGraph<DagNode, EmptyEdge>,
    pub key_to_index: HashMap<String, NodeIndex>,
}

impl StatementDag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph. Two statements declaring the same name (ignoring
    /// case) are rejected.
    pub fn build(statements: Vec<Statement>) -> DagResult<Self> {
        let started = Instant::now();
        let mut dag = Self::new();

        for stmt in statements {
            let node = DagNode::new(stmt);
            if dag.key_to_index.contains_key(&node.key) {
                return Err(DagError::DuplicateNode(node.name));
            }
            let key = node.key.clone();
            let idx = dag.graph.add_node(node);
            dag.key_to_index.insert(key, idx);
        }

        for idx in dag.graph.node_indices() {
            let deps: Vec<String> = dag.graph[idx]
                .statement
                .dependencies()
                .into_iter()
                .map(str::to_uppercase)
                .collect();
            for dep in deps {
                match dag.key_to_index.get(&dep) {
                    Some(&from) => {
                        dag.graph.update_edge(from, idx, EmptyEdge);
                    }
                    None => debug!(
                        "{} reads from undeclared source {dep}, ignoring",
                        dag.graph[idx].name
                    ),
                }
            }
        }

        info!(
            "StatementDag::build completed with {} statements in {:.3}s",
            dag.graph.node_count(),
            started.elapsed().as_secs_f64()
        );
        Ok(dag)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn get(&self, name: &str) -> Option<&DagNode> {
        self.key_to_index
            .get(&name.to_uppercase())
            .map(|&idx| &self.graph[idx])
    }

    /// Kahn's algorithm, always taking the ready node with the smallest key,
    /// so the order depends only on the statement set.
    pub fn toposort(&self) -> DagResult<Vec<NodeIndex>> {
        let mut indegree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|idx| {
                let n = self.graph.edges_directed(idx, Direction::Incoming).count();
                (idx, n)
            })
            .collect();

        let mut ready: BTreeSet<(&str, NodeIndex)> = indegree
            .iter()
            .filter(|(_, n)| **n == 0)
            .map(|(&idx, _)| (self.graph[idx].key.as_str(), idx))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some((_, idx)) = ready.pop_first() {
            order.push(idx);
            for edge in self.graph.edges_directed(idx, Direction::Outgoing) {
                let target = edge.target();
                if let Some(n) = indegree.get_mut(&target) {
                    *n -= 1;
                    if *n == 0 {
                        ready.insert((self.graph[target].key.as_str(), target));
                    }
                }
            }
        }

        if order.len() != self.graph.node_count() {
            return Err(DagError::CycleDetected(self.cycle_members(&order)));
        }
        Ok(order)
    }

    /// Names caught in a cycle, sorted. Falls back to every unplaced node
    /// when no strongly connected component stands out.
    fn cycle_members(&self, placed: &[NodeIndex]) -> Vec<String> {
        let mut names: Vec<String> = kosaraju_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .flatten()
            .map(|idx| self.graph[idx].name.clone())
            .collect();

        if names.is_empty() {
            names = self
                .graph
                .node_indices()
                .filter(|idx| !placed.contains(idx))
                .map(|idx| self.graph[idx].name.clone())
                .collect();
        }
        names.sort();
        names
    }

    /// Consumes the graph, returning its statements in dependency order.
    pub fn into_ordered(self) -> DagResult<Vec<Statement>> {
        let order = self.toposort()?;
        let expected = self.graph.node_count();

        let (nodes, _) = self.graph.into_nodes_edges();
        let mut slots: Vec<Option<Statement>> =
            nodes.into_iter().map(|n| Some(n.weight.statement)).collect();

        let ordered: Vec<Statement> = order
            .into_iter()
            .filter_map(|idx| slots.get_mut(idx.index()).and_then(Option::take))
            .collect();

        if ordered.len() != expected {
            return Err(DagError::Incomplete {
                expected,
                actual: ordered.len(),
            });
        }
        Ok(ordered)
    }

    /// DOT rendering of the graph, edges pointing downstream.
    pub fn to_dot_string(&self) -> String {
        self.to_string()
    }

    /// Write the dependency graph to the given path in DOT format.
    pub fn export_dot_to<P: AsRef<Path>>(&self, path: P) -> DagResult<()> {
        std::fs::write(path, self.to_dot_string())?;
        Ok(())
    }
}

impl Display for StatementDag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "digraph {{")?;
        writeln!(f, "    rankdir=LR;")?;
        for idx in self.graph.node_indices() {
            writeln!(
                f,
                "    {} [label=\"{}\"];",
                idx.index(),
                self.graph[idx].name
            )?;
        }
        for edge in self.graph.edge_references() {
            writeln!(
                f,
                "    {} -> {};",
                edge.source().index(),
                edge.target().index()
            )?;
        }
        writeln!(f, "}}")
    }
}

pub fn resolve_order(statements: Vec<Statement>) -> DagResult<Vec<Statement>> {
    StatementDag::build(statements)?.into_ordered()
}
