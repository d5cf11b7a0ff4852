//! Wait-for graph construction and cycle search

use dlsim_resources::{Process, Registry};
use dlsim_types::{ProcessId, ResourceId};
use std::collections::{BTreeMap, HashSet};

/// Directed graph where `P -> H` means P waits on a resource H holds
#[derive(Debug, Clone, Default)]
pub struct WaitForGraph {
    /// Every process in enumeration order, including isolated ones
    nodes: Vec<ProcessId>,
    edges: BTreeMap<ProcessId, Vec<ProcessId>>,
}

impl WaitForGraph {
    /// Build the graph from waiting entries `(process, resource)`
    ///
    /// Each waiting process gets an edge to every other process holding a
    /// non-zero amount of the resource it waits on.
    pub fn build<I>(registry: &Registry, waiting: I) -> Self
    where
        I: IntoIterator<Item = (ProcessId, ResourceId)>,
    {
        let nodes: Vec<ProcessId> = registry.processes().map(Process::id).collect();
        let mut edges: BTreeMap<ProcessId, Vec<ProcessId>> =
            nodes.iter().map(|pid| (*pid, Vec::new())).collect();

        for (waiter, resource) in waiting {
            let Ok(pool) = registry.resource(resource) else {
                continue;
            };
            let targets = edges.entry(waiter).or_default();
            for (holder, units) in pool.holders() {
                if units > 0 && holder != waiter && !targets.contains(&holder) {
                    targets.push(holder);
                }
            }
        }

        Self { nodes, edges }
    }

    /// Outgoing edges of `process`
    #[must_use]
    pub fn waits_on(&self, process: ProcessId) -> &[ProcessId] {
        self.edges.get(&process).map_or(&[][..], Vec::as_slice)
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Processes with at least one outgoing edge
    #[must_use]
    pub fn waiting_count(&self) -> usize {
        self.edges.values().filter(|targets| !targets.is_empty()).count()
    }

    /// First cycle found by DFS in node enumeration order
    ///
    /// The cycle starts at the node the back-edge points to and follows the
    /// DFS path from there. It is not guaranteed to be the shortest.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<ProcessId>> {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for node in &self.nodes {
            if visited.contains(node) {
                continue;
            }
            if let Some(cycle) = self.find_cycle_util(*node, &mut visited, &mut rec_stack, &mut path)
            {
                return Some(cycle);
            }
        }
        None
    }

    fn find_cycle_util(
        &self,
        node: ProcessId,
        visited: &mut HashSet<ProcessId>,
        rec_stack: &mut HashSet<ProcessId>,
        path: &mut Vec<ProcessId>,
    ) -> Option<Vec<ProcessId>> {
        visited.insert(node);
        rec_stack.insert(node);
        path.push(node);

        for next in self.waits_on(node) {
            if rec_stack.contains(next) {
                let start = path.iter().position(|p| p == next)?;
                return Some(path[start..].to_vec());
            }
            if !visited.contains(next) {
                if let Some(cycle) = self.find_cycle_util(*next, visited, rec_stack, path) {
                    return Some(cycle);
                }
            }
        }

        rec_stack.remove(&node);
        path.pop();
        None
    }
}
