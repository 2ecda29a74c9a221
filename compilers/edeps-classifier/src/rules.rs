use edeps_graph::{Edge, Graph, NodeHandle};
use edeps_protocol::{Deprel, EdgeCategory, RelationBase};

use crate::view::EnhancedView;

/// An enhanced edge under test, `parent -label-> child`.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub child: NodeHandle,
    pub parent: NodeHandle,
    pub label: &'a Deprel,
}

impl<'a> Candidate<'a> {
    /// Incoming edges of the child other than this one.
    fn siblings<'g>(&self, graph: &'g Graph) -> impl Iterator<Item = &'g Edge> + 'g {
        let (parent, label) = (self.parent, self.label.clone());
        incoming(graph, self.child).filter(move |e| !(e.node == parent && e.label == label))
    }
}

fn incoming(graph: &Graph, handle: NodeHandle) -> impl Iterator<Item = &Edge> + '_ {
    graph.node(handle).into_iter().flat_map(|node| node.incoming())
}

fn outgoing(graph: &Graph, handle: NodeHandle) -> impl Iterator<Item = &Edge> + '_ {
    graph.node(handle).into_iter().flat_map(|node| node.outgoing())
}

fn is_core_argument(label: &Deprel) -> bool {
    matches!(
        label.base(),
        RelationBase::Nsubj | RelationBase::Csubj | RelationBase::Obj | RelationBase::Iobj | RelationBase::Obl
    )
}

/// The parent is an empty node standing in for an elided predicate.
pub fn gapping(graph: &Graph, edge: Candidate<'_>) -> bool {
    graph.node(edge.parent).map_or(false, |node| node.is_empty_node())
}

/// The child is a conjunct whose head conjunct also depends on the parent.
pub fn coparent(graph: &Graph, edge: Candidate<'_>) -> bool {
    edge.siblings(graph)
        .filter(|e| e.label.is_conj())
        .any(|e| incoming(graph, e.node).any(|up| up.node == edge.parent))
}

/// The child depends on a conjunct of the parent.
pub fn codepend(graph: &Graph, edge: Candidate<'_>) -> bool {
    edge.siblings(graph)
        .filter(|e| !e.label.is_conj())
        .any(|e| incoming(graph, e.node).any(|up| up.node == edge.parent && up.label.is_conj()))
}

/// Subject of an open complement, controlled by an argument of the
/// governing predicate.
pub fn xsubj(graph: &Graph, edge: Candidate<'_>) -> bool {
    if !edge.label.is_subject() {
        return false;
    }
    edge.siblings(graph)
        .filter(|e| is_core_argument(&e.label))
        .any(|e| outgoing(graph, e.node).any(|down| down.node == edge.parent && down.label.is_xcomp()))
}

/// `ref` edge, or the parent is reachable from the child through its
/// relative clause.
pub fn relcl(view: &EnhancedView, edge: Candidate<'_>) -> bool {
    edge.label.is_ref() || view.reaches_through_acl(edge.child, edge.parent)
}

/// Subject of a copular relative clause hanging off another predicate
/// the child is already the subject of.
pub fn relcl_copular(graph: &Graph, edge: Candidate<'_>) -> bool {
    if !edge.label.is_subject() {
        return false;
    }
    edge.siblings(graph)
        .filter(|e| e.label.is_subject())
        .any(|e| incoming(graph, e.node).any(|up| up.node == edge.parent && up.label.is_acl()))
}

/// Every matching category, or `ENHANCED` when no rule explains the edge.
pub fn explain(graph: &Graph, view: &EnhancedView, edge: Candidate<'_>) -> EdgeCategory {
    let mut categories = EdgeCategory::empty();
    categories.set(EdgeCategory::GAPPING, gapping(graph, edge));
    categories.set(EdgeCategory::COPARENT, coparent(graph, edge));
    categories.set(EdgeCategory::CODEPEND, codepend(graph, edge));
    categories.set(EdgeCategory::XSUBJ, xsubj(graph, edge));
    categories.set(
        EdgeCategory::RELCL,
        relcl(view, edge) || relcl_copular(graph, edge),
    );

    if categories.is_empty() {
        EdgeCategory::ENHANCED
    } else {
        categories
    }
}
