//! Outline tree core: an editable, drag-and-drop-reorderable tree bound to
//! an in-memory store.
//!
//! Two components, wired single-threaded:
//!
//! - [`store::TreeStore`] owns the canonical nested tree, applies
//!   create/update/delete/move operations, republishes the full tree after
//!   every mutation and mirrors it to a [`infrastructure::BlobStore`].
//! - [`controller::TreeController`] subscribes a flat
//!   [`projection::Projection`] to the store and translates user gestures
//!   (add, edit, delete, drag-reorder) into store operations.
//!
//! The rendering surface is out of scope: consumers read per-row
//! `{text, depth, expandable}` data from the projection and feed gestures to
//! the controller; no visual layout is prescribed.

pub mod config;
pub mod controller;
pub mod domain;
pub mod infrastructure;
pub mod projection;
pub mod store;
pub mod util;

pub use config::Settings;
pub use controller::{DragPayload, DragState, DropZone, TreeController};
pub use domain::{DomainError, MovePosition, NestedNode, NodeId, OutlineNode, OutlineTree};
pub use infrastructure::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use projection::{FlatId, FlatNode, Projection};
pub use store::{TreeObserver, TreeStore};
