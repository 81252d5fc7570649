//! The external sortable controller, as seen by the binding layer.
//!
//! The controller library owns pointer handling, ghost rendering and element
//! reordering. The binding layer only needs to construct it, mutate its
//! options field by field, listen to its reorder notifications and destroy
//! it. [`SortableBackend`] and [`ControllerHandle`] are that surface.

use std::fmt;

use serde::{Deserialize, Serialize};
use sortable_lattice_core::Signal;

use crate::error::BackendError;
use crate::options::{Configuration, OptionValue};

/// Constructs controllers on host elements.
pub trait SortableBackend: Send + Sync + 'static {
    /// The host element type. Equality is element identity.
    type Element: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;

    /// A live controller bound to one element.
    type Handle: ControllerHandle;

    /// Create a controller on `element` with a fully resolved configuration.
    fn create(
        &self,
        element: &Self::Element,
        options: &Configuration,
    ) -> Result<Self::Handle, BackendError>;
}

/// A live controller.
///
/// Handles are exclusively owned by the
/// [`ControllerLifecycle`](crate::ControllerLifecycle). [`destroy`](Self::destroy)
/// consumes the handle, so it cannot be used afterwards.
pub trait ControllerHandle: Send + 'static {
    /// Replace one option's value on the live controller.
    fn set_option(&mut self, name: &str, value: OptionValue);

    /// Remove one option, deregistering it if it is a callback.
    fn remove_option(&mut self, name: &str);

    /// Reorder notifications emitted by the controller.
    fn reordered(&self) -> &Signal<ReorderEvent>;

    /// Detach the controller from its element and release its listeners.
    fn destroy(self);
}

/// A notification from the controller about the items it manages.
///
/// Indices are positions within the list's host element after the gesture
/// (`new_index`) and before it (`old_index`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ReorderEvent {
    /// The pointer grabbed an item.
    #[serde(rename_all = "camelCase")]
    Choose { item_id: String },
    /// The pointer released an item without necessarily moving it.
    #[serde(rename_all = "camelCase")]
    Unchoose { item_id: String },
    /// An item joined the multi-selection.
    #[serde(rename_all = "camelCase")]
    Select { item_id: String },
    /// An item left the multi-selection.
    #[serde(rename_all = "camelCase")]
    Deselect { item_id: String },
    /// A drag started.
    #[serde(rename_all = "camelCase")]
    Start { item_id: String, index: usize },
    /// An item moved within this list.
    #[serde(rename_all = "camelCase")]
    Update {
        item_id: String,
        old_index: usize,
        new_index: usize,
    },
    /// An item was dropped into this list from another list.
    #[serde(rename_all = "camelCase")]
    Add { item_id: String, new_index: usize },
    /// An item was dragged out of this list into another list.
    #[serde(rename_all = "camelCase")]
    Remove { item_id: String, old_index: usize },
    /// A drag finished.
    #[serde(rename_all = "camelCase")]
    End { item_id: String },
}

impl ReorderEvent {
    /// The item the event is about.
    pub fn item_id(&self) -> &str {
        match self {
            Self::Choose { item_id }
            | Self::Unchoose { item_id }
            | Self::Select { item_id }
            | Self::Deselect { item_id }
            | Self::Start { item_id, .. }
            | Self::Update { item_id, .. }
            | Self::Add { item_id, .. }
            | Self::Remove { item_id, .. }
            | Self::End { item_id } => item_id,
        }
    }

    /// The name of the option callback the controller invokes for this event.
    pub fn callback_name(&self) -> &'static str {
        match self {
            Self::Choose { .. } => "onChoose",
            Self::Unchoose { .. } => "onUnchoose",
            Self::Select { .. } => "onSelect",
            Self::Deselect { .. } => "onDeselect",
            Self::Start { .. } => "onStart",
            Self::Update { .. } => "onUpdate",
            Self::Add { .. } => "onAdd",
            Self::Remove { .. } => "onRemove",
            Self::End { .. } => "onEnd",
        }
    }
}

/// Arguments passed to option callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControllerEvent {
    /// The callback's option name, e.g. `onEnd`.
    pub name: String,
    pub item_id: Option<String>,
    pub old_index: Option<usize>,
    pub new_index: Option<usize>,
}

impl ControllerEvent {
    /// An event with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl From<&ReorderEvent> for ControllerEvent {
    fn from(event: &ReorderEvent) -> Self {
        let (old_index, new_index) = match event {
            ReorderEvent::Start { index, .. } => (Some(*index), None),
            ReorderEvent::Update {
                old_index,
                new_index,
                ..
            } => (Some(*old_index), Some(*new_index)),
            ReorderEvent::Add { new_index, .. } => (None, Some(*new_index)),
            ReorderEvent::Remove { old_index, .. } => (Some(*old_index), None),
            _ => (None, None),
        };
        Self {
            name: event.callback_name().to_string(),
            item_id: Some(event.item_id().to_string()),
            old_index,
            new_index,
        }
    }
}
