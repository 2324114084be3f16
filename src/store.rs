//! Tree store: sole owner and mutator of the canonical tree.
//!
//! Every successful mutation triggers exactly one synchronous broadcast to
//! all subscribers and one full-tree write-through to the blob store. The
//! blob write is fire-and-forget: the backing store is a convenience mirror,
//! not a durability guarantee.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, instrument, warn};

use crate::config::Settings;
use crate::domain::{DomainResult, MovePosition, NestedNode, NodeId, OutlineTree};
use crate::infrastructure::BlobStore;

/// Subscriber to full-tree republishes. Delivery is synchronous on the
/// mutating call, so subscribers never observe a committed tree they have
/// not been handed yet.
pub trait TreeObserver {
    fn tree_changed(&mut self, tree: &OutlineTree);
}

pub struct TreeStore {
    tree: OutlineTree,
    blob: Box<dyn BlobStore>,
    subscribers: Vec<Rc<RefCell<dyn TreeObserver>>>,
    persist_key: String,
    edit_cache_key: String,
}

impl TreeStore {
    /// Build the canonical tree from a seed literal.
    pub fn with_seed(seed: &[NestedNode], blob: Box<dyn BlobStore>, settings: &Settings) -> Self {
        Self {
            tree: OutlineTree::from_nested(seed),
            blob,
            subscribers: Vec::new(),
            persist_key: settings.persist_key.clone(),
            edit_cache_key: settings.edit_cache_key.clone(),
        }
    }

    /// Rebuild the canonical tree from the backing blob, falling back to the
    /// seed when the blob is missing or unreadable.
    pub fn open(blob: Box<dyn BlobStore>, seed: &[NestedNode], settings: &Settings) -> Self {
        let restored = match blob.get(&settings.persist_key) {
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<NestedNode>>(&bytes) {
                Ok(top_level) => Some(top_level),
                Err(e) => {
                    warn!("stored tree blob is malformed, using seed: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("failed to read tree blob, using seed: {}", e);
                None
            }
        };
        let top_level = restored.unwrap_or_else(|| seed.to_vec());
        Self::with_seed(&top_level, blob, settings)
    }

    /// Register a subscriber and immediately hand it the current tree.
    pub fn subscribe(&mut self, observer: Rc<RefCell<dyn TreeObserver>>) {
        observer.borrow_mut().tree_changed(&self.tree);
        self.subscribers.push(observer);
    }

    pub fn tree(&self) -> &OutlineTree {
        &self.tree
    }

    /// Append a new leaf under `parent` (top level when None). No-op on a
    /// vanished parent: callers are expected to pass nodes obtained from the
    /// current projection.
    #[instrument(level = "debug", skip(self))]
    pub fn insert(&mut self, parent: Option<NodeId>, text: &str) -> Option<NodeId> {
        let parent = parent.unwrap_or_else(|| self.tree.root());
        match self.tree.insert(parent, text) {
            Some(id) => {
                self.committed();
                Some(id)
            }
            None => {
                debug!("insert against vanished parent ignored");
                None
            }
        }
    }

    /// Set a node's text in place. Deletability of empty-text leaves is the
    /// caller's discretion, not enforced here.
    #[instrument(level = "debug", skip(self, text))]
    pub fn update(&mut self, node: NodeId, text: &str) -> bool {
        let changed = self.tree.update(node, text);
        if changed {
            self.committed();
        }
        changed
    }

    /// Remove a node and its entire subtree, keyed by stable node id.
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&mut self, node: NodeId) -> bool {
        let changed = self.tree.delete(node);
        if changed {
            self.committed();
        }
        changed
    }

    /// Atomic detach-then-reattach under a single broadcast. Cyclic moves
    /// are rejected and leave the tree untouched.
    #[instrument(level = "debug", skip(self))]
    pub fn move_node(&mut self, node: NodeId, dest: MovePosition) -> DomainResult<()> {
        self.tree.move_node(node, dest)?;
        self.committed();
        Ok(())
    }

    /// Last-write-wins single-slot cache for the most recently saved item
    /// text. Lives in the same blob store as the tree mirror.
    pub fn cache_edit(&mut self, text: &str) {
        match serde_json::to_vec(text) {
            Ok(bytes) => {
                if let Err(e) = self.blob.put(&self.edit_cache_key, &bytes) {
                    warn!("edit cache write failed: {}", e);
                }
            }
            Err(e) => warn!("edit cache serialization failed: {}", e),
        }
    }

    /// Read back the edit cache slot, None when empty or unreadable.
    pub fn cached_edit(&self) -> Option<String> {
        match self.blob.get(&self.edit_cache_key) {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).ok(),
            Ok(None) => None,
            Err(e) => {
                debug!("edit cache read failed: {}", e);
                None
            }
        }
    }

    fn committed(&mut self) {
        self.persist();
        self.notify();
    }

    fn persist(&mut self) {
        match serde_json::to_vec(&self.tree.to_nested()) {
            Ok(bytes) => {
                if let Err(e) = self.blob.put(&self.persist_key, &bytes) {
                    warn!("tree blob write failed: {}", e);
                }
            }
            Err(e) => warn!("tree serialization failed: {}", e),
        }
    }

    fn notify(&mut self) {
        for subscriber in &self.subscribers {
            subscriber.borrow_mut().tree_changed(&self.tree);
        }
    }
}
