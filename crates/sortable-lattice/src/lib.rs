//! Sortable Lattice - a declarative binding layer for drag-reorderable lists.
//!
//! The actual pointer handling, ghost rendering and element reordering are
//! done by an external, imperative sortable controller, reached through the
//! [`SortableBackend`] and [`ControllerHandle`] traits. This crate keeps three
//! independently changing things consistent:
//!
//! - the controller's lifetime versus the host element it is attached to
//!   ([`ControllerLifecycle`]),
//! - a declarative [`Configuration`] versus the controller's live options
//!   ([`Classification`], [`OptionsReconciler`]),
//! - the controller's reorder notifications versus the application's
//!   immutable, ordered items ([`StateBridge`]).
//!
//! [`SortableList`] ties them together behind a single rendered host node.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sortable_lattice::{
//!     BackendError, Configuration, ControllerHandle, Item, ItemStore, LifecycleState,
//!     OptionValue, ReorderEvent, SortableBackend, SortableList,
//! };
//! use sortable_lattice_core::Signal;
//!
//! struct Backend;
//! struct Handle(Signal<ReorderEvent>);
//!
//! impl SortableBackend for Backend {
//!     type Element = u32;
//!     type Handle = Handle;
//!
//!     fn create(&self, _: &u32, _: &Configuration) -> Result<Handle, BackendError> {
//!         Ok(Handle(Signal::new()))
//!     }
//! }
//!
//! impl ControllerHandle for Handle {
//!     fn set_option(&mut self, _: &str, _: OptionValue) {}
//!     fn remove_option(&mut self, _: &str) {}
//!     fn reordered(&self) -> &Signal<ReorderEvent> {
//!         &self.0
//!     }
//!     fn destroy(self) {}
//! }
//!
//! let store = ItemStore::new(vec![Item::new("a"), Item::new("b"), Item::new("c")]);
//! let list = SortableList::builder(Arc::new(Backend), store.setter())
//!     .tag("ul")
//!     .options(Configuration::new().with("animation", 150))
//!     .build()?;
//!
//! list.render().mount(&1);
//! assert_eq!(list.state(), LifecycleState::Bound);
//!
//! list.with_controller(|handle| {
//!     handle.0.emit(ReorderEvent::Update {
//!         item_id: "a".into(),
//!         old_index: 0,
//!         new_index: 2,
//!     })
//! });
//! assert_eq!(store.ids(), vec!["b", "c", "a"]);
//! # Ok::<(), sortable_lattice::BindingError>(())
//! ```

pub mod bridge;
pub mod controller;
pub mod element;
mod error;
pub mod item;
pub mod lifecycle;
pub mod list;
pub mod options;
pub mod reconcile;

#[cfg(test)]
mod testing;

pub use bridge::{DragTransfer, StateBridge};
pub use controller::{ControllerEvent, ControllerHandle, ReorderEvent, SortableBackend};
pub use element::{ElementTag, ExternalRef, HostElementRef, Style};
pub use error::{BackendError, BindingError, Result};
pub use item::{Item, ItemStore, SortableItem, StateSetter, Updater};
pub use lifecycle::{ControllerLifecycle, LifecycleState};
pub use list::{HostNode, RefCallback, SortableList, SortableListBuilder};
pub use options::{
    Callback, Classification, Configuration, FieldSpec, OptionKind, OptionSchema,
    OptionSchemaBuilder, OptionValue, ValueShape,
};
pub use reconcile::{OptionsReconciler, ReconcileReport, ReconcilerConfig, StructuredComparator};
