use edeps_protocol::{EdgeKey, NodeId, ParseError};
use thiserror::Error;

/// Structural problems that abort construction of a sentence graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("line {id}: {source}")]
    Parse {
        id: String,
        #[source]
        source: ParseError,
    },

    #[error("node {0} does not exist")]
    NotFound(NodeId),

    #[error("node {0} is already present")]
    DuplicateNode(NodeId),

    #[error("span {0} overlaps an existing span")]
    OverlappingSpan(NodeId),

    #[error("node {0} still carries links from another graph")]
    LinkedNode(NodeId),

    #[error("node {0} already has a basic parent")]
    AlreadyAttached(NodeId),

    #[error("node {0} has no basic parent")]
    MissingBasicParent(NodeId),

    #[error("node {0} cannot be attached to itself")]
    SelfAttachment(NodeId),

    #[error("attaching {child} under {parent} would create a cycle")]
    Cycle { child: NodeId, parent: NodeId },

    #[error("node {0} is not part of the basic tree")]
    NotInTree(NodeId),

    #[error("node {0} lists itself as an enhanced parent")]
    SelfLoop(NodeId),

    #[error("span {0} cannot take part in the enhanced graph")]
    SpanReference(NodeId),
}

pub type Result<T> = std::result::Result<T, GraphError>;

/// Problems reported while building a graph that do not stop it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WarningKind {
    #[error("duplicate enhanced edge {0}")]
    DuplicateEdge(EdgeKey),

    #[error("skipped enhanced edge '{fragment}': {reason}")]
    BadFragment { fragment: String, reason: ParseError },

    #[error("ignored basic head '{0}' on a node outside the basic tree")]
    IgnoredHead(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphWarning {
    pub node: NodeId,
    pub kind: WarningKind,
}

impl std::fmt::Display for GraphWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node {}: {}", self.node, self.kind)
    }
}
