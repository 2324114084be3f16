//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent business logic violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("node is no longer part of the tree")]
    NodeMissing,

    #[error("cannot move a node into its own subtree")]
    WouldCycle,

    #[error("the synthetic root cannot be moved or deleted")]
    RootImmutable,

    #[error("no drag gesture is in progress")]
    NotDragging,
}

pub type DomainResult<T> = Result<T, DomainError>;
