//! Category dependency graph.
//!
//! Provides the `CategoryGraph` type, which records which change categories
//! read values produced by other categories (skills read ability modifiers,
//! hit points read Constitution, ...). The engine resolves categories in an
//! order that respects these edges, preferring the ruleset's priority order
//! wherever the edges leave a choice.

use crate::error::StatError;
use crate::target::ChangeCategory;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// A directed acyclic graph of category dependencies.
///
/// If category A depends on category B, then B is resolved before A.
///
/// # Examples
///
/// ```rust
/// use pfstat::graph::CategoryGraph;
/// use pfstat::target::ChangeCategory;
///
/// let mut graph = CategoryGraph::new();
/// graph.add_edge(ChangeCategory::Skill, ChangeCategory::Ability);
/// graph.add_node(ChangeCategory::Attack);
///
/// let order = graph
///     .resolution_order(&[
///         ChangeCategory::Skill,
///         ChangeCategory::Attack,
///         ChangeCategory::Ability,
///     ])
///     .unwrap();
///
/// // Attack has no dependencies and keeps its priority; Skill waits for Ability.
/// assert_eq!(
///     order,
///     vec![ChangeCategory::Attack, ChangeCategory::Ability, ChangeCategory::Skill]
/// );
/// ```
pub struct CategoryGraph {
    graph: DiGraph<ChangeCategory, ()>,
    node_map: HashMap<ChangeCategory, NodeIndex>,
}

impl CategoryGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Add a node to the graph if it doesn't exist.
    pub fn add_node(&mut self, category: ChangeCategory) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&category) {
            idx
        } else {
            let idx = self.graph.add_node(category);
            self.node_map.insert(category, idx);
            idx
        }
    }

    /// Record that `from` depends on `to` (`to` must be resolved first).
    ///
    /// Both nodes are added if missing.
    pub fn add_edge(&mut self, from: ChangeCategory, to: ChangeCategory) {
        let from_idx = self.add_node(from);
        let to_idx = self.add_node(to);
        self.graph.update_edge(to_idx, from_idx, ());
    }

    /// Detect cycles in the graph.
    ///
    /// # Returns
    ///
    /// * `Ok(())` if no cycles are detected
    /// * `Err(StatError::Cycle)` with the cycle path if a cycle is found
    pub fn detect_cycles(&self) -> Result<(), StatError> {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();

        for node_idx in self.graph.node_indices() {
            if !visited.contains(&node_idx) {
                let mut cycle_path = Vec::new();
                if let Some(cycle) =
                    self.dfs_cycle_detect(node_idx, &mut visited, &mut rec_stack, &mut cycle_path)
                {
                    return Err(cycle);
                }
            }
        }

        Ok(())
    }

    fn dfs_cycle_detect(
        &self,
        node: NodeIndex,
        visited: &mut HashSet<NodeIndex>,
        rec_stack: &mut HashSet<NodeIndex>,
        cycle_path: &mut Vec<ChangeCategory>,
    ) -> Option<StatError> {
        visited.insert(node);
        rec_stack.insert(node);
        cycle_path.push(self.graph[node]);

        for neighbor in self.graph.neighbors_directed(node, Direction::Outgoing) {
            if !visited.contains(&neighbor) {
                if let Some(cycle) = self.dfs_cycle_detect(neighbor, visited, rec_stack, cycle_path)
                {
                    return Some(cycle);
                }
            } else if rec_stack.contains(&neighbor) {
                let neighbor_category = self.graph[neighbor];
                let start = cycle_path
                    .iter()
                    .position(|category| *category == neighbor_category)
                    .unwrap_or(0);
                let mut cycle = cycle_path[start..].to_vec();
                cycle.push(neighbor_category);
                return Some(StatError::Cycle { path: cycle });
            }
        }

        rec_stack.remove(&node);
        cycle_path.pop();
        None
    }

    /// Order all categories so dependencies come first.
    ///
    /// Among categories whose dependencies are satisfied, the one listed
    /// earliest in `priority` goes next; unlisted categories follow in
    /// declaration order.
    pub fn resolution_order(
        &self,
        priority: &[ChangeCategory],
    ) -> Result<Vec<ChangeCategory>, StatError> {
        self.detect_cycles()?;

        let rank = |category: ChangeCategory| {
            let listed = priority
                .iter()
                .position(|p| *p == category)
                .unwrap_or(usize::MAX);
            (listed, category)
        };

        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|idx| {
                let degree = self.graph.neighbors_directed(idx, Direction::Incoming).count();
                (idx, degree)
            })
            .collect();

        let mut ready: BinaryHeap<Reverse<((usize, ChangeCategory), NodeIndex)>> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(idx, _)| Reverse((rank(self.graph[*idx]), *idx)))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse((_, idx))) = ready.pop() {
            order.push(self.graph[idx]);
            for dependent in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse((rank(self.graph[dependent]), dependent)));
                    }
                }
            }
        }

        Ok(order)
    }
}

impl Default for CategoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_no_cycle() {
        let mut graph = CategoryGraph::new();
        graph.add_edge(ChangeCategory::Misc, ChangeCategory::Ability);
        graph.add_edge(ChangeCategory::Skills, ChangeCategory::Misc);

        assert!(graph.detect_cycles().is_ok());
        let order = graph.resolution_order(&[]).unwrap();
        assert_eq!(
            order,
            vec![
                ChangeCategory::Ability,
                ChangeCategory::Misc,
                ChangeCategory::Skills
            ]
        );
    }

    #[test]
    fn test_graph_detect_cycle() {
        let mut graph = CategoryGraph::new();
        graph.add_edge(ChangeCategory::Ability, ChangeCategory::Misc);
        graph.add_edge(ChangeCategory::Misc, ChangeCategory::Ac);
        graph.add_edge(ChangeCategory::Ac, ChangeCategory::Ability);

        match graph.detect_cycles() {
            Err(StatError::Cycle { path }) => {
                assert_eq!(path.len(), 4);
                assert_eq!(path.first(), path.last());
            }
            other => panic!("Expected Cycle error, got {:?}", other),
        }
        assert!(graph.resolution_order(&[]).is_err());
    }

    #[test]
    fn test_resolution_order_follows_priority_when_free() {
        let mut graph = CategoryGraph::new();
        for category in [
            ChangeCategory::Damage,
            ChangeCategory::Attack,
            ChangeCategory::Ability,
        ] {
            graph.add_node(category);
        }

        let order = graph
            .resolution_order(&[
                ChangeCategory::Ability,
                ChangeCategory::Attack,
                ChangeCategory::Damage,
            ])
            .unwrap();
        assert_eq!(
            order,
            vec![
                ChangeCategory::Ability,
                ChangeCategory::Attack,
                ChangeCategory::Damage
            ]
        );
    }

    #[test]
    fn test_dependencies_override_priority() {
        let mut graph = CategoryGraph::new();
        graph.add_edge(ChangeCategory::Ability, ChangeCategory::Damage);

        let order = graph
            .resolution_order(&[ChangeCategory::Ability, ChangeCategory::Damage])
            .unwrap();
        assert_eq!(order, vec![ChangeCategory::Damage, ChangeCategory::Ability]);
    }
}
