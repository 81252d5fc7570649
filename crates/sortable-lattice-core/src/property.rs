//! Value cells with change detection.
//!
//! A [`Property`] pairs with a [`Signal`](crate::Signal) when observers need
//! to hear about changes: the owner writes through [`Property::set`] or
//! [`Property::update`] and emits only when the write reports a change.
//!
//! # Example
//!
//! ```
//! use sortable_lattice_core::{Property, Signal};
//!
//! struct Cursor {
//!     index: Property<usize>,
//!     index_changed: Signal<usize>,
//! }
//!
//! impl Cursor {
//!     fn step(&self) {
//!         if let Some(index) = self.index.update(|i| i + 1) {
//!             self.index_changed.emit(index);
//!         }
//!     }
//! }
//!
//! let cursor = Cursor { index: Property::new(2), index_changed: Signal::new() };
//! cursor.step();
//! assert_eq!(cursor.index.get(), 3);
//! ```

use std::fmt;

use parking_lot::RwLock;

/// A locked value cell whose writes report whether anything changed.
///
/// `Send + Sync` whenever `T` is. Reads share the lock; writes, including
/// the read-modify-write of [`update`](Self::update), take it exclusively.
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// A copy of the current value. Prefer [`with`](Self::with) for large values.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.value.read())
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Store `value`. Returns `true` if it differs from the current one.
    pub fn set(&self, value: T) -> bool {
        let mut current = self.value.write();
        if *current == value {
            return false;
        }
        *current = value;
        true
    }

    /// Derive the next value from the current one under a single write lock.
    ///
    /// Concurrent updates are serialized, so each sees the result of the one
    /// before it. Returns a copy of the new value if it changed. `f` must not
    /// touch this property.
    pub fn update<F>(&self, f: F) -> Option<T>
    where
        F: FnOnce(&T) -> T,
    {
        let mut current = self.value.write();
        let next = f(&current);
        if *current == next {
            return None;
        }
        *current = next;
        Some(current.clone())
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Property").field(&*self.value.read()).finish()
    }
}

/// A borrowed view of a [`Property`] without its setters.
pub struct ReadOnlyProperty<'a, T> {
    inner: &'a Property<T>,
}

impl<'a, T: Clone> ReadOnlyProperty<'a, T> {
    pub fn new(property: &'a Property<T>) -> Self {
        Self { inner: property }
    }

    pub fn get(&self) -> T {
        self.inner.get()
    }

    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        self.inner.with(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_set_reports_change() {
        let element = Property::new(None);

        assert!(element.set(Some("ul#1")));
        assert!(!element.set(Some("ul#1")));
        assert_eq!(element.get(), Some("ul#1"));
    }

    #[test]
    fn test_update_returns_new_value_only_on_change() {
        let ids = Property::new(vec!["a", "b"]);

        assert_eq!(ids.update(|v| v.clone()), None);

        let reversed = ids.update(|v| v.iter().rev().copied().collect());
        assert_eq!(reversed, Some(vec!["b", "a"]));
        assert_eq!(ids.with(|v| v.len()), 2);
    }

    #[test]
    fn test_concurrent_updates_are_serialized() {
        let counter = Arc::new(Property::new(0usize));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let counter = counter.clone();
                thread::spawn(move || {
                    for _ in 0..250 {
                        counter.update(|n| n + 1);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(counter.get(), 1000);
    }

    #[test]
    fn test_read_only_view_tracks_writes() {
        let prop = Property::new(42);
        let view = ReadOnlyProperty::new(&prop);

        prop.set(100);
        assert_eq!(view.get(), 100);
        assert!(view.with(|v| *v > 50));
    }

    #[test]
    fn test_default_and_debug() {
        let prop: Property<Vec<u8>> = Property::default();
        assert!(prop.with(Vec::is_empty));
        assert_eq!(format!("{prop:?}"), "Property([])");
    }
}
