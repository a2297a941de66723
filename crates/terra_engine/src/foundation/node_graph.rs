//! Arena-backed directed node graph
//!
//! Nodes live in a [`SlotMap`] and are addressed by [`NodeKey`] handles, so
//! removing a node never invalidates the others. Every node keeps two
//! independent link lists: the nodes that feed it (`inputs`) and the nodes
//! it feeds (`outputs`). Linking always updates both ends.
//!
//! The scene manager uses this to declare frame pass dependencies and
//! derive a fixed execution order.

use slotmap::{new_key_type, SlotMap};
use std::collections::VecDeque;

new_key_type! {
    /// Handle to a node stored in a [`NodeGraph`]
    pub struct NodeKey;
}

#[derive(Debug)]
struct Node<T> {
    value: T,
    inputs: Vec<NodeKey>,
    outputs: Vec<NodeKey>,
}

/// Directed graph with arena storage
#[derive(Debug)]
pub struct NodeGraph<T> {
    nodes: SlotMap<NodeKey, Node<T>>,
}

impl<T> Default for NodeGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NodeGraph<T> {
    /// Create an empty graph
    pub fn new() -> Self {
        Self { nodes: SlotMap::with_key() }
    }

    /// Insert a node and return its handle
    pub fn add_node(&mut self, value: T) -> NodeKey {
        self.nodes.insert(Node {
            value,
            inputs: Vec::new(),
            outputs: Vec::new(),
        })
    }

    /// Register `source` as an input of `node`
    ///
    /// Returns `false` if either handle is stale or the link already exists.
    pub fn add_input(&mut self, node: NodeKey, source: NodeKey) -> bool {
        if !self.link_allowed(source, node) {
            return false;
        }
        self.nodes[node].inputs.push(source);
        self.nodes[source].outputs.push(node);
        true
    }

    /// Register `target` as an output of `node`
    ///
    /// Returns `false` if either handle is stale or the link already exists.
    pub fn add_output(&mut self, node: NodeKey, target: NodeKey) -> bool {
        if !self.link_allowed(node, target) {
            return false;
        }
        self.nodes[node].outputs.push(target);
        self.nodes[target].inputs.push(node);
        true
    }

    fn link_allowed(&self, from: NodeKey, to: NodeKey) -> bool {
        match (self.nodes.get(from), self.nodes.get(to)) {
            (Some(from_node), Some(_)) => from != to && !from_node.outputs.contains(&to),
            _ => false,
        }
    }

    /// Nodes feeding `node`
    pub fn inputs_of(&self, node: NodeKey) -> &[NodeKey] {
        self.nodes.get(node).map_or(&[], |n| n.inputs.as_slice())
    }

    /// Nodes fed by `node`
    pub fn outputs_of(&self, node: NodeKey) -> &[NodeKey] {
        self.nodes.get(node).map_or(&[], |n| n.outputs.as_slice())
    }

    /// Value stored at `node`
    pub fn get(&self, node: NodeKey) -> Option<&T> {
        self.nodes.get(node).map(|n| &n.value)
    }

    /// Remove a node and every link touching it
    pub fn remove_node(&mut self, node: NodeKey) -> Option<T> {
        let removed = self.nodes.remove(node)?;
        for input in &removed.inputs {
            if let Some(n) = self.nodes.get_mut(*input) {
                n.outputs.retain(|k| *k != node);
            }
        }
        for output in &removed.outputs {
            if let Some(n) = self.nodes.get_mut(*output) {
                n.inputs.retain(|k| *k != node);
            }
        }
        Some(removed.value)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Kahn ordering; `None` when the graph contains a cycle
    ///
    /// Ties are broken by insertion order so the result is stable.
    pub fn topological_order(&self) -> Option<Vec<NodeKey>> {
        let mut pending: Vec<(NodeKey, usize)> = self
            .nodes
            .iter()
            .map(|(key, node)| (key, node.inputs.len()))
            .collect();
        let mut ready: VecDeque<NodeKey> = pending
            .iter()
            .filter(|(_, count)| *count == 0)
            .map(|(key, _)| *key)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(key) = ready.pop_front() {
            order.push(key);
            for output in &self.nodes[key].outputs {
                if let Some(entry) = pending.iter_mut().find(|(k, _)| k == output) {
                    entry.1 -= 1;
                    if entry.1 == 0 {
                        ready.push_back(*output);
                    }
                }
            }
        }

        (order.len() == self.nodes.len()).then_some(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_input_updates_both_ends() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node("a");
        let b = graph.add_node("b");

        assert!(graph.add_input(b, a));
        assert_eq!(graph.inputs_of(b), &[a]);
        assert_eq!(graph.outputs_of(a), &[b]);
        assert!(graph.inputs_of(a).is_empty());
        assert!(graph.outputs_of(b).is_empty());
    }

    #[test]
    fn test_add_output_updates_both_ends() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node("a");
        let b = graph.add_node("b");

        assert!(graph.add_output(a, b));
        assert_eq!(graph.outputs_of(a), &[b]);
        assert_eq!(graph.inputs_of(b), &[a]);
        assert!(graph.outputs_of(b).is_empty());
        assert!(graph.inputs_of(a).is_empty());
    }

    #[test]
    fn test_duplicate_and_self_links_rejected() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node(1);
        let b = graph.add_node(2);

        assert!(graph.add_output(a, b));
        assert!(!graph.add_input(b, a));
        assert!(!graph.add_output(a, a));
        assert_eq!(graph.inputs_of(b).len(), 1);
    }

    #[test]
    fn test_remove_node_unlinks_neighbours() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node('a');
        let b = graph.add_node('b');
        let c = graph.add_node('c');
        graph.add_output(a, b);
        graph.add_output(b, c);

        assert_eq!(graph.remove_node(b), Some('b'));
        assert!(graph.outputs_of(a).is_empty());
        assert!(graph.inputs_of(c).is_empty());
        assert_eq!(graph.len(), 2);
        assert!(graph.get(b).is_none());
    }

    #[test]
    fn test_topological_order() {
        let mut graph = NodeGraph::new();
        let main = graph.add_node("main");
        let shadow = graph.add_node("shadow");
        let water = graph.add_node("water");
        graph.add_input(main, shadow);
        graph.add_input(main, water);

        let order = graph.topological_order().expect("acyclic");
        let pos = |k| order.iter().position(|x| *x == k).unwrap();
        assert!(pos(shadow) < pos(main));
        assert!(pos(water) < pos(main));
    }

    #[test]
    fn test_cycle_detected() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node(());
        let b = graph.add_node(());
        graph.add_output(a, b);
        graph.add_output(b, a);
        assert!(graph.topological_order().is_none());
    }
}
