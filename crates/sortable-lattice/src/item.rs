//! Items and the application-owned ordered collection.
//!
//! The binding layer never mutates the application's collection in place.
//! Every change is expressed as an [`Updater`]: a pure function from the
//! current ordered items to the next ones, dispatched through a
//! [`StateSetter`]. Passing a transformation rather than a value lets
//! several lists (a parent and its nested children, or lists sharing a drag
//! group) update the same state without overwriting each other.

use std::fmt;
use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};
use sortable_lattice_core::{Property, ReadOnlyProperty, Signal};

/// An element of a sortable list.
///
/// Identity is the [`id`](Self::id); the `chosen` and `selected` flags are
/// driven by controller interaction, never by application logic.
pub trait SortableItem: Clone + Send + Sync + 'static {
    /// Identifier, unique within its collection.
    fn id(&self) -> &str;

    /// Mark the item as grabbed (or released) by the pointer.
    fn set_chosen(&mut self, chosen: bool);

    /// Mark the item as part of (or removed from) a multi-selection.
    fn set_selected(&mut self, selected: bool);
}

/// The default item type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    /// Identifier, unique within its collection.
    pub id: String,
    /// Grabbed by the pointer.
    #[serde(default)]
    pub chosen: bool,
    /// Part of a multi-selection.
    #[serde(default)]
    pub selected: bool,
}

impl Item {
    /// Create an unflagged item.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            chosen: false,
            selected: false,
        }
    }
}

impl SortableItem for Item {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_chosen(&mut self, chosen: bool) {
        self.chosen = chosen;
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}

/// A pure transformation of the ordered items.
pub type Updater<A> = Box<dyn FnOnce(&[A]) -> Vec<A> + Send>;

/// The application's pure-updater dispatch function.
///
/// Equivalent to a state setter that only accepts functions of the previous
/// state. Clones share the same dispatch function.
pub struct StateSetter<A> {
    dispatch: Arc<dyn Fn(Updater<A>) + Send + Sync>,
}

impl<A: 'static> StateSetter<A> {
    /// Wrap a dispatch function.
    pub fn new<F>(dispatch: F) -> Self
    where
        F: Fn(Updater<A>) + Send + Sync + 'static,
    {
        Self {
            dispatch: Arc::new(dispatch),
        }
    }

    /// Dispatch a transformation.
    pub fn update<F>(&self, updater: F)
    where
        F: FnOnce(&[A]) -> Vec<A> + Send + 'static,
    {
        (self.dispatch)(Box::new(updater));
    }

    /// Whether both setters dispatch through the same function.
    pub fn same_dispatch(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.dispatch), Arc::as_ptr(&other.dispatch))
    }
}

impl<A> Clone for StateSetter<A> {
    fn clone(&self) -> Self {
        Self {
            dispatch: self.dispatch.clone(),
        }
    }
}

impl<A> fmt::Debug for StateSetter<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter").finish_non_exhaustive()
    }
}

/// A simple application-side store for ordered items.
///
/// Applies dispatched updaters synchronously and emits
/// [`items_changed`](Self::items_changed) when the result differs.
pub struct ItemStore<A> {
    items: Property<Vec<A>>,
    items_changed: Signal<Vec<A>>,
}

impl<A: SortableItem + PartialEq> ItemStore<A> {
    /// Create a store holding `items`.
    pub fn new(items: Vec<A>) -> Arc<Self> {
        Arc::new(Self {
            items: Property::new(items),
            items_changed: Signal::new(),
        })
    }

    /// A copy of the current items.
    pub fn get(&self) -> Vec<A> {
        self.items.get()
    }

    /// Access the current items without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[A]) -> R,
    {
        self.items.with(|items| f(items))
    }

    /// The items as a read-only property.
    pub fn items(&self) -> ReadOnlyProperty<'_, Vec<A>> {
        ReadOnlyProperty::new(&self.items)
    }

    /// Current item ids, in order.
    pub fn ids(&self) -> Vec<String> {
        self.with(|items| items.iter().map(|i| i.id().to_string()).collect())
    }

    /// Apply a transformation to the current items.
    ///
    /// The updater runs under the store's write lock, so updates dispatched
    /// from several threads apply one after another. It must not call back
    /// into this store. Returns `true` if the items changed.
    pub fn apply(&self, updater: Updater<A>) -> bool {
        match self.items.update(|current| updater(current)) {
            Some(next) => {
                self.items_changed.emit(next);
                true
            }
            None => false,
        }
    }

    /// Signal emitted with the new items after every effective change.
    pub fn items_changed(&self) -> &Signal<Vec<A>> {
        &self.items_changed
    }

    /// A setter dispatching into this store.
    ///
    /// The setter holds a weak reference; updates dispatched after the store
    /// is dropped are discarded.
    pub fn setter(self: &Arc<Self>) -> StateSetter<A> {
        let store: Weak<Self> = Arc::downgrade(self);
        StateSetter::new(move |updater| match store.upgrade() {
            Some(store) => {
                store.apply(updater);
            }
            None => {
                tracing::trace!(target: "sortable_lattice::bridge", "item store dropped, discarding update");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn items(ids: &[&str]) -> Vec<Item> {
        ids.iter().map(|id| Item::new(*id)).collect()
    }

    #[test]
    fn test_setter_applies_updater_to_current_items() {
        let store = ItemStore::new(items(&["a", "b"]));
        let setter = store.setter();

        setter.update(|current| {
            let mut next = current.to_vec();
            next.reverse();
            next
        });

        assert_eq!(store.ids(), vec!["b", "a"]);
        assert_eq!(store.items().with(|items| items.len()), 2);
    }

    #[test]
    fn test_concurrent_dispatch_keeps_every_update() {
        let store = ItemStore::new(Vec::<Item>::new());
        let notified = Arc::new(AtomicUsize::new(0));
        let notified_clone = notified.clone();
        store.items_changed().connect(move |_| {
            notified_clone.fetch_add(1, Ordering::SeqCst);
        });

        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let setter = store.setter();
                std::thread::spawn(move || {
                    for n in 0..200 {
                        setter.update(move |current| {
                            let mut next = current.to_vec();
                            next.push(Item::new(format!("{worker}-{n}")));
                            next
                        });
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(store.with(|items| items.len()), 800);
        assert_eq!(notified.load(Ordering::SeqCst), 800);
    }

    #[test]
    fn test_unchanged_result_does_not_notify() {
        let store = ItemStore::new(items(&["a"]));
        let notified = Arc::new(AtomicUsize::new(0));
        let notified_clone = notified.clone();
        store.items_changed().connect(move |_| {
            notified_clone.fetch_add(1, Ordering::SeqCst);
        });

        store.setter().update(|current| current.to_vec());
        assert_eq!(notified.load(Ordering::SeqCst), 0);

        store.setter().update(|_| Vec::new());
        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_setter_after_store_dropped_is_noop() {
        let store = ItemStore::new(items(&["a"]));
        let setter = store.setter();
        drop(store);
        setter.update(|_| Vec::new());
    }

    #[test]
    fn test_same_dispatch() {
        let store = ItemStore::new(items(&[]));
        let a = store.setter();
        let b = a.clone();
        let c = store.setter();
        assert!(a.same_dispatch(&b));
        assert!(!a.same_dispatch(&c));
    }

    #[test]
    fn test_item_deserializes_without_flags() {
        let item: Item = serde_json::from_str(r#"{"id":"a"}"#).unwrap();
        assert_eq!(item, Item::new("a"));
    }
}
