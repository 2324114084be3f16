//! Domain layer: the canonical tree and its business rules
//!
//! This layer is independent of external concerns (no I/O, no config loading).

pub mod arena;
pub mod error;
pub mod node;

pub use arena::{MovePosition, NodeId, OutlineNode, OutlineTree, PreorderIter};
pub use error::{DomainError, DomainResult};
pub use node::NestedNode;
