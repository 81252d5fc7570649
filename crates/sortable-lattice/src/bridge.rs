//! Conversion of controller reorder notifications into pure state updates.
//!
//! The [`StateBridge`] never holds the application's items. For every
//! [`ReorderEvent`] it dispatches an updater through the application's
//! [`StateSetter`]; the updater receives the items as they are at that moment
//! and returns the next ordered items.
//!
//! Moves are identity based: an event is resolved by `item_id`, and
//! `new_index` is the item's final position. Replaying a move that has already
//! been applied therefore changes nothing, and an event naming an item that
//! is no longer present leaves the items untouched.
//!
//! Lists that exchange items (a shared drag group, or a parent list and the
//! lists nested inside it) share a [`DragTransfer`]: the source list publishes
//! the dragged item when the drag starts, and the target list takes it when
//! the item is added.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use sortable_lattice_core::logging::span_names;
use sortable_lattice_core::{Diagnostic, DiagnosticKind, DiagnosticSink};

use crate::controller::ReorderEvent;
use crate::error::{BindingError, Result};
use crate::item::{SortableItem, StateSetter};

/// The item currently being dragged between lists of one group.
pub struct DragTransfer<A> {
    dragging: Mutex<Option<A>>,
}

impl<A: SortableItem> DragTransfer<A> {
    /// Create an empty transfer slot, to be shared by every list of a group.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            dragging: Mutex::new(None),
        })
    }

    /// Publish the dragged item.
    pub fn put(&self, item: A) {
        *self.dragging.lock() = Some(item);
    }

    /// Id of the dragged item, if any.
    pub fn dragging_id(&self) -> Option<String> {
        self.dragging.lock().as_ref().map(|item| item.id().to_string())
    }

    /// A copy of the dragged item if it has the given id.
    pub fn get(&self, id: &str) -> Option<A> {
        self.dragging
            .lock()
            .as_ref()
            .filter(|item| item.id() == id)
            .cloned()
    }

    /// Forget the dragged item if it has the given id.
    pub fn clear(&self, id: &str) {
        let mut dragging = self.dragging.lock();
        if dragging.as_ref().is_some_and(|item| item.id() == id) {
            *dragging = None;
        }
    }
}

impl<A> fmt::Debug for DragTransfer<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragTransfer")
            .field("dragging", &self.dragging.lock().is_some())
            .finish()
    }
}

/// Position of the item with `id`.
pub fn position_of<A: SortableItem>(items: &[A], id: &str) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}

/// Move the item with `id` so that it ends up at `new_index`.
///
/// `new_index` is clamped to the end of the list. Returns `None` if no item
/// has that id.
pub fn move_item<A: SortableItem>(items: &[A], id: &str, new_index: usize) -> Option<Vec<A>> {
    let from = position_of(items, id)?;
    let mut next = items.to_vec();
    let item = next.remove(from);
    let to = new_index.min(next.len());
    next.insert(to, item);
    Some(next)
}

/// Insert `item` at `new_index`; an item with the same id is moved instead.
pub fn insert_item<A: SortableItem>(items: &[A], item: A, new_index: usize) -> Vec<A> {
    if let Some(moved) = move_item(items, item.id(), new_index) {
        return moved;
    }
    let mut next = items.to_vec();
    let to = new_index.min(next.len());
    next.insert(to, item);
    next
}

/// Remove the item with `id`. Returns `None` if no item has that id.
pub fn remove_item<A: SortableItem>(items: &[A], id: &str) -> Option<Vec<A>> {
    let at = position_of(items, id)?;
    let mut next = items.to_vec();
    next.remove(at);
    Some(next)
}

/// Modify the item with `id`, leaving every other item untouched.
pub fn update_item<A, F>(items: &[A], id: &str, f: F) -> Option<Vec<A>>
where
    A: SortableItem,
    F: FnOnce(&mut A),
{
    let at = position_of(items, id)?;
    let mut next = items.to_vec();
    f(&mut next[at]);
    Some(next)
}

/// Feeds controller reorder notifications into the application's state.
pub struct StateBridge<A> {
    setter: RwLock<StateSetter<A>>,
    transfer: Option<Arc<DragTransfer<A>>>,
    diagnostics: Arc<dyn DiagnosticSink>,
    /// Generation of the controller the bridge is subscribed to.
    attached: Mutex<Option<u64>>,
    /// Events received while held, in arrival order.
    deferred: Mutex<Option<Vec<ReorderEvent>>>,
}

impl<A> fmt::Debug for StateBridge<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateBridge")
            .field("attached", &*self.attached.lock())
            .field("shares_transfer", &self.transfer.is_some())
            .finish_non_exhaustive()
    }
}

impl<A: SortableItem> StateBridge<A> {
    /// Create a bridge dispatching through `setter`.
    pub fn new(setter: StateSetter<A>, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            setter: RwLock::new(setter),
            transfer: None,
            diagnostics,
            attached: Mutex::new(None),
            deferred: Mutex::new(None),
        }
    }

    /// Share a drag transfer slot with the other lists of a group.
    pub fn with_transfer(mut self, transfer: Arc<DragTransfer<A>>) -> Self {
        self.transfer = Some(transfer);
        self
    }

    /// Replace the application's setter.
    pub fn set_setter(&self, setter: StateSetter<A>) {
        *self.setter.write() = setter;
    }

    /// Mark the bridge as subscribed to the controller of `generation`.
    pub fn attach(&self, generation: u64) -> Result<()> {
        let mut attached = self.attached.lock();
        if let Some(current) = *attached {
            return Err(BindingError::AlreadyAttached {
                generation: current,
            });
        }
        *attached = Some(generation);
        Ok(())
    }

    /// Mark the bridge as no longer subscribed. Events held for the old
    /// controller are discarded.
    pub fn detach(&self) {
        *self.attached.lock() = None;
        if let Some(dropped) = self.deferred.lock().as_mut().map(std::mem::take) {
            if !dropped.is_empty() {
                tracing::debug!(target: "sortable_lattice::bridge", count = dropped.len(), "discarding held reorder events");
            }
        }
    }

    /// Whether the bridge is subscribed to a live controller.
    pub fn is_attached(&self) -> bool {
        self.attached.lock().is_some()
    }

    /// Hold incoming events until [`release`](Self::release).
    ///
    /// Used while options are being reconciled, so that events the controller
    /// emits in the middle are processed after the new options are in place.
    pub fn hold(&self) {
        let mut deferred = self.deferred.lock();
        if deferred.is_none() {
            *deferred = Some(Vec::new());
        }
    }

    /// Stop holding and process held events in arrival order.
    pub fn release(&self) {
        let held = self.deferred.lock().take().unwrap_or_default();
        for event in held {
            self.dispatch(event);
        }
    }

    /// Apply a reorder event.
    ///
    /// Fails with [`BindingError::Unbound`] when the bridge is not subscribed
    /// to a live controller.
    pub fn apply(&self, event: ReorderEvent) -> Result<()> {
        if !self.is_attached() {
            return Err(BindingError::Unbound {
                operation: "apply a reorder event",
            });
        }
        self.enqueue(event);
        Ok(())
    }

    /// Entry point for the controller's reorder signal.
    pub(crate) fn on_reorder(&self, event: &ReorderEvent) {
        if !self.is_attached() {
            self.diagnostics.report(
                Diagnostic::error(
                    DiagnosticKind::LifecycleMisuse,
                    "reorder event delivered to a detached bridge",
                )
                .with_subject(event.item_id()),
            );
            return;
        }
        self.enqueue(event.clone());
    }

    fn enqueue(&self, event: ReorderEvent) {
        {
            let mut deferred = self.deferred.lock();
            if let Some(held) = deferred.as_mut() {
                held.push(event);
                return;
            }
        }
        self.dispatch(event);
    }

    fn dispatch(&self, event: ReorderEvent) {
        let _span = tracing::trace_span!(target: "sortable_lattice::bridge", span_names::BRIDGE, item = event.item_id()).entered();
        tracing::trace!(target: "sortable_lattice::bridge", ?event, "bridging reorder event");
        match event {
            ReorderEvent::Choose { item_id } => self.update_flags(item_id, |item| item.set_chosen(true)),
            ReorderEvent::Unchoose { item_id } => {
                self.update_flags(item_id, |item| item.set_chosen(false))
            }
            ReorderEvent::Select { item_id } => {
                self.update_flags(item_id, |item| item.set_selected(true))
            }
            ReorderEvent::Deselect { item_id } => {
                self.update_flags(item_id, |item| item.set_selected(false))
            }
            ReorderEvent::Start { item_id, .. } => self.publish_dragged(item_id),
            ReorderEvent::Update {
                item_id, new_index, ..
            } => {
                let diagnostics = self.diagnostics.clone();
                self.setter().update(move |items| {
                    move_item(items, &item_id, new_index)
                        .unwrap_or_else(|| stale(&diagnostics, &item_id, items))
                });
            }
            ReorderEvent::Add { item_id, new_index } => {
                let Some(item) = self.transfer.as_ref().and_then(|t| t.get(&item_id)) else {
                    report_stale(&self.diagnostics, &item_id);
                    return;
                };
                self.setter()
                    .update(move |items| insert_item(items, item, new_index));
            }
            ReorderEvent::Remove { item_id, .. } => {
                let diagnostics = self.diagnostics.clone();
                self.setter().update(move |items| {
                    remove_item(items, &item_id).unwrap_or_else(|| stale(&diagnostics, &item_id, items))
                });
            }
            ReorderEvent::End { item_id } => {
                if let Some(transfer) = &self.transfer {
                    transfer.clear(&item_id);
                }
            }
        }
    }

    fn setter(&self) -> StateSetter<A> {
        self.setter.read().clone()
    }

    fn update_flags<F>(&self, item_id: String, f: F)
    where
        F: FnOnce(&mut A) + Send + 'static,
    {
        let diagnostics = self.diagnostics.clone();
        self.setter().update(move |items| {
            update_item(items, &item_id, f).unwrap_or_else(|| stale(&diagnostics, &item_id, items))
        });
    }

    fn publish_dragged(&self, item_id: String) {
        let Some(transfer) = self.transfer.clone() else {
            return;
        };
        let diagnostics = self.diagnostics.clone();
        self.setter().update(move |items| {
            match items.iter().find(|item| item.id() == item_id) {
                Some(item) => transfer.put(item.clone()),
                None => report_stale(&diagnostics, &item_id),
            }
            items.to_vec()
        });
    }
}

fn report_stale(diagnostics: &Arc<dyn DiagnosticSink>, item_id: &str) {
    diagnostics.report(
        Diagnostic::debug(
            DiagnosticKind::StaleReference,
            "reorder event names an item that is not in the list; ignored",
        )
        .with_subject(item_id),
    );
}

fn stale<A: Clone>(diagnostics: &Arc<dyn DiagnosticSink>, item_id: &str, items: &[A]) -> Vec<A> {
    report_stale(diagnostics, item_id);
    items.to_vec()
}

static_assertions::assert_impl_all!(StateBridge<crate::item::Item>: Send, Sync);
