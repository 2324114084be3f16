//! Interaction controller: translates user gestures into store mutations.
//!
//! All wiring is single-threaded `Rc<RefCell<..>>`: a gesture runs to
//! completion on the UI event loop, the store broadcast re-flattens the
//! projection before the gesture returns, and no locking is needed because
//! there is exactly one mutator of the canonical tree.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::Settings;
use crate::domain::{DomainError, DomainResult, MovePosition, NodeId};
use crate::projection::{FlatId, FlatNode, Projection};
use crate::store::{TreeObserver, TreeStore};

/// What a drag gesture carries, validated again at the drop boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragPayload {
    pub node_id: NodeId,
    pub origin_parent_id: NodeId,
}

/// Classification of the pointer's vertical position within a target row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropZone {
    Above,
    Below,
    Center,
}

impl DropZone {
    /// Top quarter drops above, bottom quarter below, middle half onto.
    pub fn classify(pointer_fraction: f32) -> Self {
        if pointer_fraction < 0.25 {
            DropZone::Above
        } else if pointer_fraction > 0.75 {
            DropZone::Below
        } else {
            DropZone::Center
        }
    }
}

/// Tracking state of the single in-flight drag gesture. Cleared in full on
/// drop or drag-end, whatever the outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragState {
    pub payload: Option<DragPayload>,
    pub hover_target: Option<NodeId>,
    pub hover_since: Option<Instant>,
    pub zone: Option<DropZone>,
}

impl DragState {
    fn clear(&mut self) {
        *self = DragState::default();
    }
}

/// Mediates between the rendering surface and the tree store: resolves flat
/// rows to canonical nodes through the projection's identity maps, calls
/// store operations, and keeps the drag state machine.
pub struct TreeController {
    store: Rc<RefCell<TreeStore>>,
    projection: Rc<RefCell<Projection>>,
    drag: DragState,
    dwell_threshold: Duration,
}

impl TreeController {
    pub fn new(store: Rc<RefCell<TreeStore>>, settings: &Settings) -> Self {
        let projection = Rc::new(RefCell::new(Projection::new()));
        store
            .borrow_mut()
            .subscribe(Rc::clone(&projection) as Rc<RefCell<dyn TreeObserver>>);
        Self {
            store,
            projection,
            drag: DragState::default(),
            dwell_threshold: settings.dwell_threshold(),
        }
    }

    /// Handle on the shared projection, for the rendering surface.
    pub fn projection(&self) -> Rc<RefCell<Projection>> {
        Rc::clone(&self.projection)
    }

    pub fn rows(&self) -> Vec<FlatNode> {
        self.projection.borrow().rows().cloned().collect()
    }

    pub fn visible_rows(&self) -> Vec<FlatNode> {
        self.projection
            .borrow()
            .visible_rows()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.payload.is_some()
    }

    /// Append a new top-level item.
    pub fn add_top_level(&mut self, text: &str) -> Option<NodeId> {
        self.store.borrow_mut().insert(None, text)
    }

    /// Append a new child under the given row. A parent that already held
    /// children is auto-expanded so the new item is visible.
    pub fn add_child(&mut self, row: FlatId, text: &str) -> Option<NodeId> {
        let parent = self.projection.borrow().node_of(row)?;
        let was_container = self.store.borrow().tree().get(parent).map(|n| n.container)?;
        let new_id = self.store.borrow_mut().insert(Some(parent), text)?;
        if was_container {
            self.projection.borrow_mut().expand(parent);
        }
        Some(new_id)
    }

    /// Delete the row's node and its whole subtree.
    pub fn delete(&mut self, row: FlatId) -> bool {
        let node = self.projection.borrow().node_of(row);
        match node {
            Some(node) => self.store.borrow_mut().delete(node),
            None => false,
        }
    }

    /// Save edited text to the node and mirror it into the single-slot edit
    /// cache.
    pub fn save(&mut self, row: FlatId, text: &str) -> bool {
        let Some(node) = self.projection.borrow().node_of(row) else {
            return false;
        };
        let mut store = self.store.borrow_mut();
        store.cache_edit(text);
        store.update(node, text)
    }

    /// Replay the cached edit as an add-child on the given row.
    pub fn restore(&mut self, row: FlatId) -> Option<NodeId> {
        let cached = self.store.borrow().cached_edit()?;
        self.add_child(row, &cached)
    }

    /// Begin a drag: record the payload and collapse the dragged row's
    /// projection entry (visual only, the canonical tree is untouched).
    pub fn drag_start(&mut self, row: FlatId) -> DomainResult<()> {
        let node = self
            .projection
            .borrow()
            .node_of(row)
            .ok_or(DomainError::NodeMissing)?;
        let origin_parent = self
            .store
            .borrow()
            .tree()
            .get(node)
            .and_then(|n| n.parent)
            .ok_or(DomainError::NodeMissing)?;
        self.drag.clear();
        self.drag.payload = Some(DragPayload {
            node_id: node,
            origin_parent_id: origin_parent,
        });
        self.projection.borrow_mut().collapse(node);
        Ok(())
    }

    /// Continuous hover over a candidate target. Dwelling on the same
    /// collapsed target for at least the configured threshold auto-expands
    /// it; independently the pointer's vertical position within the row
    /// (0.0 top .. 1.0 bottom) is classified into the pending drop zone.
    ///
    /// The dwell check is a plain wall-clock delta re-evaluated per event,
    /// not a scheduled timer, so the caller supplies `now`.
    pub fn drag_over(&mut self, row: FlatId, pointer_fraction: f32, now: Instant) {
        let Some(source) = self.drag.payload.map(|p| p.node_id) else {
            return;
        };
        let Some(target) = self.projection.borrow().node_of(row) else {
            return;
        };

        if self.drag.hover_target == Some(target) {
            let dwelled = self
                .drag
                .hover_since
                .is_some_and(|since| now.duration_since(since) >= self.dwell_threshold);
            if dwelled && target != source {
                let mut projection = self.projection.borrow_mut();
                if !projection.is_expanded(target) {
                    debug!("dwell threshold reached, auto-expanding hover target");
                    projection.expand(target);
                }
            }
        } else {
            self.drag.hover_target = Some(target);
            self.drag.hover_since = Some(now);
        }

        self.drag.zone = Some(DropZone::classify(pointer_fraction));
    }

    /// Drop the dragged node onto the given row, re-parenting it according
    /// to the pending drop zone. Drag state is cleared whatever the outcome.
    pub fn drop_onto(&mut self, row: FlatId) -> DomainResult<()> {
        let result = self.perform_drop(row);
        if let Err(ref e) = result {
            warn!("drop rejected: {}", e);
        }
        self.drag.clear();
        result
    }

    /// Drag left the widget or was cancelled; reset tracking state.
    pub fn drag_end(&mut self) {
        self.drag.clear();
    }

    fn perform_drop(&mut self, row: FlatId) -> DomainResult<()> {
        let payload = self.drag.payload.ok_or(DomainError::NotDragging)?;
        let target = self
            .projection
            .borrow()
            .node_of(row)
            .ok_or(DomainError::NodeMissing)?;
        if target == payload.node_id {
            // Dropping a node onto itself is a no-op, not an error.
            return Ok(());
        }

        // Validate the payload at the drop boundary before touching the
        // store; the store enforces the cycle guard again.
        {
            let store = self.store.borrow();
            if !store.tree().contains(payload.node_id) {
                return Err(DomainError::NodeMissing);
            }
            if store.tree().is_descendant(target, payload.node_id) {
                return Err(DomainError::WouldCycle);
            }
        }

        let dest = match self.drag.zone.unwrap_or(DropZone::Center) {
            DropZone::Above => MovePosition::Before(target),
            DropZone::Below => MovePosition::After(target),
            DropZone::Center => MovePosition::FirstChild(target),
        };
        self.store.borrow_mut().move_node(payload.node_id, dest)?;

        // The subtree arrived somewhere new; show all of it.
        let store = self.store.borrow();
        self.projection
            .borrow_mut()
            .expand_subtree(store.tree(), payload.node_id);
        Ok(())
    }
}
