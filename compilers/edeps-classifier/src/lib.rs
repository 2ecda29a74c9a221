//! Enhanced-edge classification.
//!
//! Each enhanced edge is compared with the node's basic edge. Edges the
//! basic tree explains become `Basic`, `Cased` or `Relabeled`; the rest
//! are matched against the ellipsis, coordination, control and relative
//! clause rules. Results are stored as `Edep=` entries in MISC.

pub mod classifier;
pub mod rules;
pub mod view;

pub use classifier::{classify, Annotations, Classifier};
pub use rules::Candidate;
pub use view::EnhancedView;
