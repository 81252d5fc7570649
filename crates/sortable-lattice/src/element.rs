//! Host element references and rendering attributes.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use sortable_lattice_core::{Property, Signal};

use crate::error::{BindingError, Result};

/// The kind of host element to render, e.g. `ul` or `div`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementTag(String);

impl ElementTag {
    /// Validate and wrap a tag name.
    ///
    /// Tag names start with an ASCII letter and contain only ASCII
    /// alphanumerics and `-`.
    pub fn new(tag: impl Into<String>) -> Result<Self> {
        let tag = tag.into();
        let mut chars = tag.chars();
        let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '-');
        if valid {
            Ok(Self(tag))
        } else {
            Err(BindingError::InvalidTag(tag))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ElementTag {
    fn default() -> Self {
        Self("div".to_string())
    }
}

impl fmt::Display for ElementTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inline style declarations passed through to the host element.
pub type Style = BTreeMap<String, String>;

struct RefInner<E> {
    current: Property<Option<E>>,
    changed: Arc<Signal<Option<E>>>,
}

/// A shared cell pointing at the rendered host element.
///
/// Clones share the same cell. [`changed`](Self::changed) is emitted whenever
/// the cell starts pointing at a different element or becomes empty.
pub struct HostElementRef<E> {
    inner: Arc<RefInner<E>>,
}

impl<E> Clone for HostElementRef<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Clone + PartialEq + Send + Sync + 'static> HostElementRef<E> {
    /// An empty reference.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RefInner {
                current: Property::new(None),
                changed: Arc::new(Signal::new()),
            }),
        }
    }

    /// The element currently referenced.
    pub fn current(&self) -> Option<E> {
        self.inner.current.get()
    }

    /// Whether an element is currently referenced.
    pub fn is_set(&self) -> bool {
        self.inner.current.with(Option::is_some)
    }

    /// Point the reference at `element` (or clear it), notifying observers
    /// if that is a change. Returns whether it changed.
    pub fn set(&self, element: Option<E>) -> bool {
        if self.inner.current.set(element.clone()) {
            self.inner.changed.emit(element);
            true
        } else {
            false
        }
    }

    /// Emitted with the new target after every change.
    ///
    /// Shared, so observers can hold a [`ConnectionGuard`] on it.
    ///
    /// [`ConnectionGuard`]: sortable_lattice_core::ConnectionGuard
    pub fn changed(&self) -> &Arc<Signal<Option<E>>> {
        &self.inner.changed
    }

    /// Whether both handles share one cell.
    pub fn same_cell(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<E: Clone + PartialEq + Send + Sync + 'static> Default for HostElementRef<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + fmt::Debug> fmt::Debug for HostElementRef<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HostElementRef")
            .field(&self.inner.current.get())
            .finish()
    }
}

/// A caller-supplied sink for the bound element.
pub enum ExternalRef<E> {
    /// Called with the element on mount and `None` on unmount.
    Callback(Arc<dyn Fn(Option<&E>) + Send + Sync>),
    /// A cell the caller reads.
    Cell(HostElementRef<E>),
}

impl<E: Clone + PartialEq + Send + Sync + 'static> ExternalRef<E> {
    /// A callback ref.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(Option<&E>) + Send + Sync + 'static,
    {
        Self::Callback(Arc::new(f))
    }

    /// A cell ref.
    pub fn cell(cell: HostElementRef<E>) -> Self {
        Self::Cell(cell)
    }

    /// Deliver the element (or its absence).
    pub fn forward(&self, element: Option<&E>) {
        match self {
            Self::Callback(f) => f(element),
            Self::Cell(cell) => {
                cell.set(element.cloned());
            }
        }
    }
}

impl<E> Clone for ExternalRef<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Callback(f) => Self::Callback(f.clone()),
            Self::Cell(cell) => Self::Cell(cell.clone()),
        }
    }
}

impl<E> fmt::Debug for ExternalRef<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callback(_) => write!(f, "ExternalRef::Callback(..)"),
            Self::Cell(_) => write!(f, "ExternalRef::Cell(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_tag_validation() {
        assert_eq!(ElementTag::new("ul").unwrap().as_str(), "ul");
        assert!(ElementTag::new("my-list").is_ok());
        assert!(ElementTag::new("h1").is_ok());
        assert!(matches!(ElementTag::new(""), Err(BindingError::InvalidTag(_))));
        assert!(ElementTag::new("1ul").is_err());
        assert!(ElementTag::new("ul li").is_err());
        assert_eq!(ElementTag::default().to_string(), "div");
    }

    #[test]
    fn test_ref_notifies_on_change_only() {
        let cell = HostElementRef::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        cell.changed().connect(move |el| seen_clone.lock().push(*el));

        assert!(cell.set(Some(1)));
        assert!(!cell.set(Some(1)));
        assert!(cell.set(Some(2)));
        assert!(cell.set(None));

        assert_eq!(*seen.lock(), vec![Some(1), Some(2), None]);
        assert!(!cell.is_set());
    }

    #[test]
    fn test_external_ref_forwarding() {
        let cell = HostElementRef::<u32>::new();
        ExternalRef::cell(cell.clone()).forward(Some(&7));
        assert_eq!(cell.current(), Some(7));

        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        let callback = ExternalRef::callback(move |el: Option<&u32>| *seen_clone.lock() = Some(el.copied()));
        callback.forward(None);
        assert_eq!(*seen.lock(), Some(None));
    }
}
