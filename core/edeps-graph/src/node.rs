use std::collections::BTreeSet;

use edeps_protocol::{Deprel, Features, Misc, NodeId};

/// Position of a node in its graph's arena.
///
/// Handles are only meaningful for the graph that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeHandle(pub(crate) u32);

impl NodeHandle {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Place of a node in the basic tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BasicRole {
    /// Not processed yet.
    #[default]
    Pending,
    /// Spans, empty nodes and the virtual root have no basic parent.
    Absent,
    Attached { parent: NodeHandle, label: Deprel },
}

/// One end of an enhanced edge, seen from the other end.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    pub node: NodeHandle,
    pub label: Deprel,
}

/// A semantic-role argument attached to a predicate node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Argument {
    pub targets: Vec<NodeId>,
    pub label: String,
}

/// One line of a sentence.
///
/// Lexical fields are public. Links to other nodes are only changed
/// through [`crate::Graph`], which keeps both ends consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    id: NodeId,
    pub form: String,
    pub lemma: String,
    pub upos: String,
    pub xpos: String,
    pub feats: Features,
    pub misc: Misc,

    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) basic: BasicRole,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) children: BTreeSet<NodeHandle>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) incoming: BTreeSet<Edge>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) outgoing: BTreeSet<Edge>,

    predicate: Option<String>,
    arguments: BTreeSet<Argument>,
}

impl Node {
    pub fn new(id: NodeId, form: impl Into<String>) -> Self {
        let blank = || edeps_protocol::EMPTY_COLUMN.to_string();
        Self {
            id,
            form: form.into(),
            lemma: blank(),
            upos: blank(),
            xpos: blank(),
            feats: Features::new(),
            misc: Misc::new(),
            basic: BasicRole::Pending,
            children: BTreeSet::new(),
            incoming: BTreeSet::new(),
            outgoing: BTreeSet::new(),
            predicate: None,
            arguments: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn is_span(&self) -> bool {
        self.id.is_span()
    }

    pub fn is_empty_node(&self) -> bool {
        self.id.is_empty_node()
    }

    pub fn basic_role(&self) -> &BasicRole {
        &self.basic
    }

    pub fn basic_parent(&self) -> Option<(NodeHandle, &Deprel)> {
        match &self.basic {
            BasicRole::Attached { parent, label } => Some((*parent, label)),
            _ => None,
        }
    }

    pub fn children(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.children.iter().copied()
    }

    pub fn incoming(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.incoming.iter()
    }

    pub fn outgoing(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.outgoing.iter()
    }

    pub fn has_incoming_from(&self, parent: NodeHandle) -> bool {
        self.incoming.iter().any(|e| e.node == parent)
    }

    pub fn predicate(&self) -> Option<&str> {
        self.predicate.as_deref()
    }

    pub(crate) fn set_predicate(&mut self, sense: Option<String>) {
        self.predicate = sense;
    }

    pub fn arguments(&self) -> impl Iterator<Item = &Argument> + '_ {
        self.arguments.iter()
    }

    pub(crate) fn insert_argument(&mut self, argument: Argument) -> bool {
        self.arguments.insert(argument)
    }

    /// True when the node carries tree or enhanced-graph links.
    pub fn is_linked(&self) -> bool {
        self.basic != BasicRole::Pending
            || !self.children.is_empty()
            || !self.incoming.is_empty()
            || !self.outgoing.is_empty()
    }

    /// Copy for registration in another graph. Lexical, misc and predicate
    /// fields are kept; tree role and enhanced edges are dropped because
    /// their handles belong to this node's graph.
    pub fn clone_detached(&self) -> Node {
        Node {
            basic: BasicRole::Pending,
            children: BTreeSet::new(),
            incoming: BTreeSet::new(),
            outgoing: BTreeSet::new(),
            ..self.clone()
        }
    }
}
