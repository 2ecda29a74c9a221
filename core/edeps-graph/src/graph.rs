use std::collections::{BTreeMap, BTreeSet, HashSet};

use edeps_protocol::{Deprel, EdgeKey, NodeId};
use tracing::warn;

use crate::error::{GraphError, GraphWarning, Result, WarningKind};
use crate::node::{Argument, BasicRole, Edge, Node, NodeHandle};

/// One sentence: an arena of nodes addressed by [`NodeHandle`], with an
/// identifier index kept in identifier order.
///
/// Every graph contains the virtual root `0`. It is the target of HEAD `0`
/// and of enhanced `0:root` edges and is never listed by [`Graph::nodes`].
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    index: BTreeMap<NodeId, NodeHandle>,
    warnings: Vec<GraphWarning>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        let mut root = Node::new(NodeId::ROOT, "<ROOT>");
        root.basic = BasicRole::Absent;

        let mut index = BTreeMap::new();
        index.insert(NodeId::ROOT, NodeHandle(0));

        Self {
            nodes: vec![root],
            index,
            warnings: Vec::new(),
        }
    }

    /// Number of sentence nodes, not counting the virtual root.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_node(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn handle(&self, id: &NodeId) -> Option<NodeHandle> {
        self.index.get(id).copied()
    }

    /// Node behind a handle, `None` when the handle is out of range.
    pub fn node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle.index())
    }

    pub fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle.index())
    }

    // Handles stored in the arena were issued by this graph.
    pub(crate) fn at(&self, handle: NodeHandle) -> &Node {
        &self.nodes[handle.index()]
    }

    pub(crate) fn at_mut(&mut self, handle: NodeHandle) -> &mut Node {
        &mut self.nodes[handle.index()]
    }

    pub fn get_node(&self, id: &NodeId) -> Result<&Node> {
        self.handle(id)
            .map(|h| self.at(h))
            .ok_or(GraphError::NotFound(*id))
    }

    pub fn get_node_mut(&mut self, id: &NodeId) -> Result<&mut Node> {
        let handle = self.handle(id).ok_or(GraphError::NotFound(*id))?;
        Ok(self.at_mut(handle))
    }

    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    /// Sentence nodes in identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.handles().map(move |h| self.at(h))
    }

    /// Handles of sentence nodes in identifier order.
    pub fn handles(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.index
            .iter()
            .filter(|(id, _)| !id.is_root())
            .map(|(_, h)| *h)
    }

    pub fn warnings(&self) -> &[GraphWarning] {
        &self.warnings
    }

    /// Registers a node that is not linked to anything yet.
    pub fn add_node(&mut self, node: Node) -> Result<NodeHandle> {
        let id = node.id();
        if self.has_node(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        if node.is_linked() {
            return Err(GraphError::LinkedNode(id));
        }
        if let Some((from, to)) = id.span_range() {
            let overlaps = self
                .index
                .keys()
                .filter_map(NodeId::span_range)
                .any(|(a, b)| from <= b && a <= to);
            if overlaps {
                return Err(GraphError::OverlappingSpan(id));
            }
        }

        let handle = NodeHandle(self.nodes.len() as u32);
        self.nodes.push(node);
        self.index.insert(id, handle);
        Ok(handle)
    }

    /// Sets the basic parent of `child`, once.
    ///
    /// Spans and empty nodes have no place in the basic tree: they get the
    /// absent role whatever `head` says.
    pub fn attach_basic_parent(&mut self, child: NodeId, head: Option<(NodeId, Deprel)>) -> Result<()> {
        let child_h = self.handle(&child).ok_or(GraphError::NotFound(child))?;
        if self.at(child_h).basic != BasicRole::Pending {
            return Err(GraphError::AlreadyAttached(child));
        }

        if child.is_span() || child.is_empty_node() {
            if let Some((parent, label)) = head {
                self.warn(child, WarningKind::IgnoredHead(format!("{}:{}", parent, label)));
            }
            self.at_mut(child_h).basic = BasicRole::Absent;
            return Ok(());
        }

        let (parent, label) = head.ok_or(GraphError::MissingBasicParent(child))?;
        let parent_h = self.handle(&parent).ok_or(GraphError::NotFound(parent))?;
        if parent == child {
            return Err(GraphError::SelfAttachment(child));
        }
        if parent.is_span() || parent.is_empty_node() {
            return Err(GraphError::NotInTree(parent));
        }
        if self.is_ancestor_handle(child_h, parent_h) {
            return Err(GraphError::Cycle { child, parent });
        }

        self.at_mut(child_h).basic = BasicRole::Attached {
            parent: parent_h,
            label,
        };
        self.at_mut(parent_h).children.insert(child_h);
        Ok(())
    }

    /// True when `candidate` lies on the basic path from `node` up to the root.
    pub fn is_basic_ancestor(&self, candidate: &NodeId, node: &NodeId) -> bool {
        match (self.handle(candidate), self.handle(node)) {
            (Some(c), Some(n)) => self.is_ancestor_handle(c, n),
            _ => false,
        }
    }

    fn is_ancestor_handle(&self, candidate: NodeHandle, node: NodeHandle) -> bool {
        // Chains in real treebanks run past a hundred nodes; walk, don't recurse.
        let mut visited = HashSet::new();
        let mut current = self.at(node).basic_parent().map(|(h, _)| h);

        while let Some(handle) = current {
            if handle == candidate {
                return true;
            }
            if !visited.insert(handle) {
                break;
            }
            current = self.at(handle).basic_parent().map(|(h, _)| h);
        }
        false
    }

    /// Adds the enhanced edges listed for `child` as `parent:label`
    /// fragments.
    ///
    /// Unparseable fragments and repeated edges are skipped with a warning.
    /// Missing parents, self loops and spans fail before anything is linked.
    pub fn attach_enhanced_edges<S: AsRef<str>>(&mut self, child: NodeId, fragments: &[S]) -> Result<()> {
        let child_h = self.handle(&child).ok_or(GraphError::NotFound(child))?;
        if child.is_span() && !fragments.is_empty() {
            return Err(GraphError::SpanReference(child));
        }

        let mut pending = Vec::new();
        let mut skipped = Vec::new();
        for fragment in fragments {
            let fragment: &str = fragment.as_ref();
            let key = match fragment.parse::<EdgeKey>() {
                Ok(key) => key,
                Err(reason) => {
                    skipped.push(WarningKind::BadFragment {
                        fragment: fragment.to_string(),
                        reason,
                    });
                    continue;
                }
            };

            let parent_h = self.handle(&key.parent).ok_or(GraphError::NotFound(key.parent))?;
            if key.parent == child {
                return Err(GraphError::SelfLoop(child));
            }
            if key.parent.is_span() {
                return Err(GraphError::SpanReference(key.parent));
            }
            pending.push((parent_h, key));
        }

        for kind in skipped {
            self.warn(child, kind);
        }
        for (parent_h, key) in pending {
            if !self.link_enhanced(child_h, parent_h, key.label.clone()) {
                self.warn(child, WarningKind::DuplicateEdge(key));
            }
        }
        Ok(())
    }

    /// The only place enhanced edges are created. Returns false, changing
    /// nothing, when the edge already exists.
    fn link_enhanced(&mut self, child: NodeHandle, parent: NodeHandle, label: Deprel) -> bool {
        let incoming = Edge {
            node: parent,
            label: label.clone(),
        };
        if !self.at_mut(child).incoming.insert(incoming) {
            return false;
        }
        self.at_mut(parent).outgoing.insert(Edge { node: child, label });
        true
    }

    /// Enhanced parents of a node, sorted by identifier then label.
    pub fn enhanced_parents(&self, handle: NodeHandle) -> Vec<EdgeKey> {
        let Some(node) = self.node(handle) else {
            return Vec::new();
        };
        let keys: BTreeSet<EdgeKey> = node
            .incoming()
            .map(|e| EdgeKey::new(self.at(e.node).id(), e.label.clone()))
            .collect();
        keys.into_iter().collect()
    }

    /// Basic parent as an identifier/label pair.
    pub fn basic_head(&self, handle: NodeHandle) -> Option<EdgeKey> {
        self.node(handle)?
            .basic_parent()
            .map(|(parent, label)| EdgeKey::new(self.at(parent).id(), label.clone()))
    }

    pub fn set_predicate(&mut self, id: &NodeId, sense: Option<String>) -> Result<()> {
        self.get_node_mut(id)?.set_predicate(sense);
        Ok(())
    }

    /// Adds a semantic-role argument; every target must exist.
    pub fn add_argument(&mut self, id: &NodeId, argument: Argument) -> Result<bool> {
        if let Some(missing) = argument.targets.iter().find(|t| !self.has_node(t)) {
            return Err(GraphError::NotFound(*missing));
        }
        Ok(self.get_node_mut(id)?.insert_argument(argument))
    }

    /// Checks that tree links and enhanced edges are mirrored on both ends.
    pub fn is_consistent(&self) -> bool {
        self.nodes.iter().enumerate().all(|(i, node)| {
            let me = NodeHandle(i as u32);
            let parent_ok = match node.basic_parent() {
                Some((parent, _)) => self.at(parent).children.contains(&me),
                None => true,
            };
            let children_ok = node
                .children()
                .all(|c| matches!(self.at(c).basic_parent(), Some((p, _)) if p == me));
            let incoming_ok = node.incoming().all(|e| {
                self.at(e.node).outgoing.contains(&Edge {
                    node: me,
                    label: e.label.clone(),
                })
            });
            let outgoing_ok = node.outgoing().all(|e| {
                self.at(e.node).incoming.contains(&Edge {
                    node: me,
                    label: e.label.clone(),
                })
            });
            parent_ok && children_ok && incoming_ok && outgoing_ok
        })
    }

    fn warn(&mut self, node: NodeId, kind: WarningKind) {
        let warning = GraphWarning { node, kind };
        warn!("{}", warning);
        self.warnings.push(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NodeId {
        s.parse().unwrap()
    }

    fn rel(s: &str) -> Deprel {
        s.parse().unwrap()
    }

    fn graph_with(ids: &[&str]) -> Graph {
        let mut graph = Graph::new();
        for i in ids {
            graph.add_node(Node::new(id(i), format!("w{}", i))).unwrap();
        }
        graph
    }

    #[test]
    fn test_add_node_rejects_duplicates_and_root() {
        let mut graph = graph_with(&["1", "2"]);
        assert_eq!(graph.len(), 2);
        assert_eq!(
            graph.add_node(Node::new(id("2"), "again")),
            Err(GraphError::DuplicateNode(id("2")))
        );
        assert_eq!(
            graph.add_node(Node::new(NodeId::ROOT, "root")),
            Err(GraphError::DuplicateNode(NodeId::ROOT))
        );
    }

    #[test]
    fn test_get_node_reports_missing() {
        let graph = graph_with(&["1"]);
        assert!(graph.has_node(&id("1")));
        assert!(!graph.has_node(&id("2")));
        assert_eq!(graph.get_node(&id("2")).unwrap_err(), GraphError::NotFound(id("2")));
        assert_eq!(graph.get_node(&id("1")).unwrap().form, "w1");
    }

    #[test]
    fn test_nodes_are_listed_in_identifier_order() {
        let graph = graph_with(&["3", "1", "2.1", "1-2", "2"]);
        let order: Vec<String> = graph.nodes().map(|n| n.id().to_string()).collect();
        assert_eq!(order, ["1-2", "1", "2", "2.1", "3"]);
    }

    #[test]
    fn test_overlapping_spans_are_rejected() {
        let mut graph = graph_with(&["1-2"]);
        assert_eq!(
            graph.add_node(Node::new(id("2-3"), "x")),
            Err(GraphError::OverlappingSpan(id("2-3")))
        );
        assert!(graph.add_node(Node::new(id("3-4"), "y")).is_ok());
    }

    #[test]
    fn test_cycle_is_rejected_without_mutation() {
        let mut graph = graph_with(&["3", "4", "5"]);
        graph.attach_basic_parent(id("3"), Some((id("4"), rel("obj")))).unwrap();
        graph.attach_basic_parent(id("4"), Some((id("5"), rel("xcomp")))).unwrap();

        let before_5 = graph.get_node(&id("5")).unwrap().clone();
        let before_3 = graph.get_node(&id("3")).unwrap().clone();

        assert_eq!(
            graph.attach_basic_parent(id("5"), Some((id("3"), rel("advcl")))),
            Err(GraphError::Cycle {
                child: id("5"),
                parent: id("3")
            })
        );
        assert_eq!(graph.get_node(&id("5")).unwrap(), &before_5);
        assert_eq!(graph.get_node(&id("3")).unwrap(), &before_3);
        assert!(graph.is_basic_ancestor(&id("5"), &id("3")));
        assert!(!graph.is_basic_ancestor(&id("3"), &id("5")));
        assert!(graph.is_consistent());
    }

    #[test]
    fn test_self_and_repeated_attachment_fail() {
        let mut graph = graph_with(&["1", "2"]);
        assert_eq!(
            graph.attach_basic_parent(id("1"), Some((id("1"), rel("dep")))),
            Err(GraphError::SelfAttachment(id("1")))
        );
        assert_eq!(
            graph.attach_basic_parent(id("1"), Some((id("9"), rel("dep")))),
            Err(GraphError::NotFound(id("9")))
        );
        graph.attach_basic_parent(id("1"), Some((id("2"), rel("nsubj")))).unwrap();
        assert_eq!(
            graph.attach_basic_parent(id("1"), Some((id("0"), rel("root")))),
            Err(GraphError::AlreadyAttached(id("1")))
        );
        assert_eq!(
            graph.attach_basic_parent(id("2"), None),
            Err(GraphError::MissingBasicParent(id("2")))
        );
    }

    #[test]
    fn test_span_and_empty_nodes_record_absent_role() {
        let mut graph = graph_with(&["1-2", "1", "2", "2.1"]);
        graph.attach_basic_parent(id("1-2"), None).unwrap();
        graph.attach_basic_parent(id("2.1"), Some((id("1"), rel("conj")))).unwrap();

        assert_eq!(graph.get_node(&id("1-2")).unwrap().basic_role(), &BasicRole::Absent);
        assert_eq!(graph.get_node(&id("2.1")).unwrap().basic_role(), &BasicRole::Absent);
        assert_eq!(graph.get_node(&id("1")).unwrap().basic_role(), &BasicRole::Pending);
        assert_eq!(graph.warnings().len(), 1);
        assert!(matches!(graph.warnings()[0].kind, WarningKind::IgnoredHead(_)));

        assert_eq!(
            graph.attach_basic_parent(id("1"), Some((id("2.1"), rel("dep")))),
            Err(GraphError::NotInTree(id("2.1")))
        );
        assert_eq!(
            graph.attach_basic_parent(id("1"), Some((id("1-2"), rel("dep")))),
            Err(GraphError::NotInTree(id("1-2")))
        );
    }

    #[test]
    fn test_long_chain_does_not_recurse() {
        let ids: Vec<String> = (1..=2000).map(|i| i.to_string()).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let mut graph = graph_with(&refs);
        for i in 1..2000u32 {
            graph
                .attach_basic_parent(NodeId::Word(i), Some((NodeId::Word(i + 1), rel("dep"))))
                .unwrap();
        }
        assert!(graph.is_basic_ancestor(&NodeId::Word(2000), &NodeId::Word(1)));
        assert!(graph
            .attach_basic_parent(NodeId::Word(2000), Some((NodeId::Word(1), rel("dep"))))
            .is_err());
    }

    #[test]
    fn test_enhanced_edges_are_mirrored() {
        let mut graph = graph_with(&["1", "2", "3"]);
        graph.attach_enhanced_edges(id("2"), &["1:nsubj", "3:nsubj:xsubj"]).unwrap();

        let two = graph.handle(&id("2")).unwrap();
        let rendered: Vec<String> = graph.enhanced_parents(two).iter().map(|k| k.to_string()).collect();
        assert_eq!(rendered, ["1:nsubj", "3:nsubj:xsubj"]);

        let one = graph.get_node(&id("1")).unwrap();
        let out: Vec<(NodeHandle, String)> = one.outgoing().map(|e| (e.node, e.label.to_string())).collect();
        assert_eq!(out, [(two, "nsubj".to_string())]);
        assert!(graph.is_consistent());
    }

    #[test]
    fn test_duplicate_enhanced_edge_warns_once() {
        let mut graph = graph_with(&["1", "2"]);
        graph.attach_enhanced_edges(id("2"), &["1:nsubj", "1:nsubj"]).unwrap();

        assert_eq!(graph.get_node(&id("2")).unwrap().incoming().count(), 1);
        assert_eq!(graph.get_node(&id("1")).unwrap().outgoing().count(), 1);
        assert_eq!(graph.warnings().len(), 1);
        assert_eq!(
            graph.warnings()[0].kind,
            WarningKind::DuplicateEdge("1:nsubj".parse().unwrap())
        );
    }

    #[test]
    fn test_bad_fragment_is_skipped() {
        let mut graph = graph_with(&["1", "2"]);
        graph.attach_enhanced_edges(id("2"), &["x:nsubj", "1:obj"]).unwrap();
        assert_eq!(graph.get_node(&id("2")).unwrap().incoming().count(), 1);
        assert!(matches!(graph.warnings()[0].kind, WarningKind::BadFragment { .. }));
    }

    #[test]
    fn test_enhanced_structural_errors_link_nothing() {
        let mut graph = graph_with(&["1-2", "1", "2"]);
        assert_eq!(
            graph.attach_enhanced_edges(id("2"), &["1:nsubj", "7:obj"]),
            Err(GraphError::NotFound(id("7")))
        );
        assert_eq!(graph.get_node(&id("2")).unwrap().incoming().count(), 0);
        assert_eq!(
            graph.attach_enhanced_edges(id("2"), &["2:dep"]),
            Err(GraphError::SelfLoop(id("2")))
        );
        assert_eq!(
            graph.attach_enhanced_edges(id("2"), &["1-2:dep"]),
            Err(GraphError::SpanReference(id("1-2")))
        );
        assert_eq!(
            graph.attach_enhanced_edges(id("1-2"), &["1:dep"]),
            Err(GraphError::SpanReference(id("1-2")))
        );
    }

    #[test]
    fn test_clone_detached_can_seed_another_graph() {
        let mut graph = graph_with(&["1", "2"]);
        graph.attach_basic_parent(id("1"), Some((id("2"), rel("nsubj")))).unwrap();
        graph.attach_enhanced_edges(id("1"), &["2:nsubj"]).unwrap();
        graph.set_predicate(&id("2"), Some("run.01".to_string())).unwrap();
        graph
            .add_argument(&id("2"), Argument { targets: vec![id("1")], label: "A0".to_string() })
            .unwrap();

        let linked = graph.get_node(&id("1")).unwrap().clone();
        let mut other = Graph::new();
        assert_eq!(other.add_node(linked), Err(GraphError::LinkedNode(id("1"))));

        let seed = graph.get_node(&id("2")).unwrap().clone_detached();
        assert!(!seed.is_linked());
        assert_eq!(seed.predicate(), Some("run.01"));
        assert_eq!(seed.arguments().count(), 1);
        assert!(other.add_node(seed).is_ok());
    }

    #[test]
    fn test_foreign_handle_is_not_found() {
        let big = graph_with(&["1", "2", "3"]);
        let three = big.handle(&id("3")).unwrap();
        let mut small = graph_with(&["1"]);

        assert!(small.node(three).is_none());
        assert!(small.node_mut(three).is_none());
        assert!(small.enhanced_parents(three).is_empty());
        assert_eq!(small.basic_head(three), None);
        assert_eq!(big.node(three).unwrap().form, "w3");
    }

    #[test]
    fn test_argument_targets_must_exist() {
        let mut graph = graph_with(&["1"]);
        let argument = Argument { targets: vec![id("4")], label: "A1".to_string() };
        assert_eq!(graph.add_argument(&id("1"), argument), Err(GraphError::NotFound(id("4"))));
    }
}
