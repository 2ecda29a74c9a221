use std::collections::{HashMap, HashSet};

use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Directed;

use edeps_graph::{Graph as Sentence, NodeHandle};
use edeps_protocol::Deprel;

/// The enhanced layer of one sentence as a directed petgraph, edges
/// pointing from parent to child.
pub struct EnhancedView {
    graph: Graph<NodeHandle, Deprel, Directed>,
    index_map: HashMap<NodeHandle, NodeIndex>,
}

impl EnhancedView {
    pub fn new(sentence: &Sentence) -> Self {
        let mut view = Self {
            graph: Graph::new(),
            index_map: HashMap::new(),
        };
        for child in sentence.handles() {
            view.add_node(child);
            let Some(node) = sentence.node(child) else {
                continue;
            };
            for edge in node.incoming() {
                view.add_edge(edge.node, child, edge.label.clone());
            }
        }
        view
    }

    fn add_node(&mut self, handle: NodeHandle) -> NodeIndex {
        *self
            .index_map
            .entry(handle)
            .or_insert_with(|| self.graph.add_node(handle))
    }

    fn add_edge(&mut self, parent: NodeHandle, child: NodeHandle, label: Deprel) {
        let from = self.add_node(parent);
        let to = self.add_node(child);
        self.graph.add_edge(from, to, label);
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// True when a directed path leads from `from` to `to` and uses at
    /// least one `acl` edge (any subtype).
    ///
    /// The walk runs over (node, acl seen) states, so each node is visited
    /// at most twice.
    pub fn reaches_through_acl(&self, from: NodeHandle, to: NodeHandle) -> bool {
        let (Some(&start), Some(&goal)) = (self.index_map.get(&from), self.index_map.get(&to)) else {
            return false;
        };

        let mut stack = vec![(start, false)];
        let mut visited = HashSet::new();

        while let Some(state) = stack.pop() {
            if !visited.insert(state) {
                continue;
            }
            let (current, seen_acl) = state;

            for edge in self.graph.edges(current) {
                let through_acl = seen_acl || edge.weight().is_acl();
                if edge.target() == goal && through_acl {
                    return true;
                }
                stack.push((edge.target(), through_acl));
            }
        }

        false
    }
}
