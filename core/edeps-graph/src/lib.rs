//! Sentence graph with two layers over one node set: the basic dependency
//! tree, where every token has exactly one parent, and the enhanced graph,
//! where a node may have any number of labeled parents.

pub mod error;
pub mod graph;
pub mod node;
mod records;

pub use error::{GraphError, GraphWarning, Result, WarningKind};
pub use graph::Graph;
pub use node::{Argument, BasicRole, Edge, Node, NodeHandle};
