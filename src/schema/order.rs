//! Table iteration order for whole-schema statement batches.
//!
//! `Document` reproduces the order tables appear in the schema file, which
//! can create a referencing table before the table it references.
//! `Dependency` sorts tables so that every referenced table comes first,
//! keeping document order between tables that do not depend on each other.

use std::collections::BTreeSet;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use super::{SchemaError, SchemaModel, SchemaResult, TableDef};

/// Order in which whole-schema batches visit tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableOrder {
    /// Schema document order.
    Document,
    /// Referenced tables before referencing tables.
    #[default]
    Dependency,
}

impl SchemaModel {
    /// Tables sorted so that every table comes after the tables its foreign
    /// keys reference.
    ///
    /// References to tables outside the schema and self references are
    /// ignored. Ties are broken by document order, so a schema that is
    /// already correctly ordered comes back unchanged.
    pub fn dependency_order(&self) -> SchemaResult<Vec<&TableDef>> {
        let tables: Vec<&TableDef> = self.tables().collect();

        // Edge direction: referenced -> referencing.
        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..tables.len()).map(|i| graph.add_node(i)).collect();
        for (idx, table) in tables.iter().enumerate() {
            for referenced in table.referenced_tables() {
                if referenced == table.name {
                    continue;
                }
                if let Some(from) = tables.iter().position(|t| t.name == referenced) {
                    graph.update_edge(nodes[from], nodes[idx], ());
                }
            }
        }

        let mut in_degree: Vec<usize> = nodes
            .iter()
            .map(|&n| graph.neighbors_directed(n, Direction::Incoming).count())
            .collect();
        let mut ready: BTreeSet<usize> = (0..tables.len())
            .filter(|&i| in_degree[i] == 0)
            .collect();

        let mut ordered = Vec::with_capacity(tables.len());
        while let Some(idx) = ready.pop_first() {
            ordered.push(tables[idx]);
            for next in graph.neighbors_directed(nodes[idx], Direction::Outgoing) {
                let target = graph[next];
                in_degree[target] -= 1;
                if in_degree[target] == 0 {
                    ready.insert(target);
                }
            }
        }

        if ordered.len() < tables.len() {
            let mut cyclic: Vec<String> = tarjan_scc(&graph)
                .into_iter()
                .filter(|scc| scc.len() > 1)
                .flatten()
                .map(|n| tables[graph[n]].name.clone())
                .collect();
            cyclic.sort();
            return Err(SchemaError::DependencyCycle(cyclic));
        }

        Ok(ordered)
    }

    /// Tables in the requested order.
    pub fn ordered_tables(&self, order: TableOrder) -> SchemaResult<Vec<&TableDef>> {
        match order {
            TableOrder::Document => Ok(self.tables().collect()),
            TableOrder::Dependency => self.dependency_order(),
        }
    }
}
