//! The declarative sortable list.
//!
//! A [`SortableList`] renders a single host node and wires the three moving
//! parts together: the host element reference drives the
//! [`ControllerLifecycle`], configuration updates go through the
//! [`OptionsReconciler`](crate::OptionsReconciler), and reorder events reach
//! the application through the [`StateBridge`]. The list itself never
//! reorders anything.
//!
//! # Example
//!
//! ```ignore
//! let store = ItemStore::new(vec![Item::new("a"), Item::new("b")]);
//! let list = SortableList::builder(backend, store.setter())
//!     .tag("ul")
//!     .class_name("todo")
//!     .options(Configuration::new().with("animation", 150))
//!     .build()?;
//!
//! let node = list.render();
//! node.mount(&element);
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use sortable_lattice_core::{ConnectionGuard, DiagnosticSink, Signal, TracingSink};

use crate::bridge::{DragTransfer, StateBridge};
use crate::controller::{ReorderEvent, SortableBackend};
use crate::element::{ElementTag, ExternalRef, HostElementRef, Style};
use crate::error::Result;
use crate::item::{SortableItem, StateSetter};
use crate::lifecycle::{ControllerLifecycle, LifecycleState};
use crate::options::{Classification, Configuration, OptionSchema};
use crate::reconcile::{OptionsReconciler, ReconcileReport, ReconcilerConfig};

/// Callback the host invokes with the rendered element on mount and `None`
/// on unmount.
pub type RefCallback<E> = Arc<dyn Fn(Option<&E>) + Send + Sync>;

/// The single host node a [`SortableList`] renders.
pub struct HostNode<E, C> {
    pub tag: ElementTag,
    pub class_name: Option<String>,
    pub style: Style,
    pub children: Vec<C>,
    pub ref_callback: RefCallback<E>,
}

impl<E, C> HostNode<E, C> {
    /// Report that the host created `element` for this node.
    pub fn mount(&self, element: &E) {
        (self.ref_callback)(Some(element));
    }

    /// Report that the host removed the element for this node.
    pub fn unmount(&self) {
        (self.ref_callback)(None);
    }
}

impl<E, C: fmt::Debug> fmt::Debug for HostNode<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostNode")
            .field("tag", &self.tag)
            .field("class_name", &self.class_name)
            .field("style", &self.style)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

type SharedLifecycle<B, A> = Arc<Mutex<ControllerLifecycle<B, A>>>;

/// A drag-reorderable list bound to an external sortable controller.
pub struct SortableList<B: SortableBackend, A: SortableItem, C = ()> {
    tag: ElementTag,
    class_name: Option<String>,
    style: Style,
    children: Vec<C>,
    external_ref: Option<ExternalRef<B::Element>>,
    element_ref: HostElementRef<B::Element>,
    schema: Arc<OptionSchema>,
    /// Options as the caller gave them, before defaults are applied.
    options: Mutex<Configuration>,
    bridge: Arc<StateBridge<A>>,
    lifecycle: SharedLifecycle<B, A>,
    ref_observer: Mutex<Option<ConnectionGuard<Option<B::Element>>>>,
}

impl<B: SortableBackend, A: SortableItem> SortableList<B, A> {
    /// Start building a list whose reorders are dispatched through `setter`.
    pub fn builder(backend: Arc<B>, setter: StateSetter<A>) -> SortableListBuilder<B, A> {
        SortableListBuilder::new(backend, setter)
    }
}

impl<B: SortableBackend, A: SortableItem, C: Clone> SortableList<B, A, C> {
    /// Describe the host node to render.
    ///
    /// Class name, style and children are passed through unmodified.
    pub fn render(&self) -> HostNode<B::Element, C> {
        HostNode {
            tag: self.tag.clone(),
            class_name: self.class_name.clone(),
            style: self.style.clone(),
            children: self.children.clone(),
            ref_callback: self.ref_callback(),
        }
    }
}

impl<B: SortableBackend, A: SortableItem, C> SortableList<B, A, C> {
    /// The callback delivering the host element to both the caller's
    /// reference and the internal one.
    pub fn ref_callback(&self) -> RefCallback<B::Element> {
        let external = self.external_ref.clone();
        let internal = self.element_ref.clone();
        Arc::new(move |element: Option<&B::Element>| {
            if let Some(external) = &external {
                external.forward(element);
            }
            internal.set(element.cloned());
        })
    }

    /// Replace the configuration.
    ///
    /// Defaults are applied, then the live controller (if any) is updated in
    /// place. Reorder events the controller emits while this runs are
    /// processed after it.
    pub fn set_options(&self, options: Configuration) -> Result<ReconcileReport> {
        let resolved = self.schema.resolve(&options);
        self.bridge.hold();
        let result = self.lifecycle.lock().reconcile(resolved);
        self.bridge.release();

        let report = result?;
        *self.options.lock() = options;
        Ok(report)
    }

    /// Replace the application's state setter.
    pub fn set_state(&self, setter: StateSetter<A>) -> Result<()> {
        self.lifecycle.lock().ensure_live("replace the state setter")?;
        self.bridge.set_setter(setter);
        Ok(())
    }

    /// Feed a reorder event to the list as if the controller emitted it.
    pub fn apply_reorder(&self, event: ReorderEvent) -> Result<()> {
        self.lifecycle.lock().ensure_live("apply a reorder event")?;
        self.bridge.apply(event)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.lock().state()
    }

    /// The element the live controller is bound to.
    pub fn element(&self) -> Option<B::Element> {
        self.lifecycle.lock().element().cloned()
    }

    /// Number of controllers created so far.
    pub fn generation(&self) -> u64 {
        self.lifecycle.lock().generation()
    }

    /// The options as last given by the caller.
    pub fn options(&self) -> Configuration {
        self.options.lock().clone()
    }

    /// The options the controller runs with, defaults included.
    pub fn resolved_options(&self) -> Configuration {
        self.lifecycle.lock().options().clone()
    }

    /// The internal host element reference.
    pub fn element_ref(&self) -> &HostElementRef<B::Element> {
        &self.element_ref
    }

    /// Run `f` against the live controller, if there is one.
    ///
    /// `f` runs with the list's lifecycle lock held. It must not call
    /// [`set_options`](Self::set_options), [`teardown`](Self::teardown) or
    /// the ref callback of this same list, directly or through an option
    /// callback it fires; the lock is not re-entrant and the call deadlocks.
    /// Reorder events it raises are queued and applied once `f` returns.
    pub fn with_controller<R>(&self, f: impl FnOnce(&B::Handle) -> R) -> Option<R> {
        self.bridge.hold();
        let result = self.lifecycle.lock().with_handle(f);
        self.bridge.release();
        result
    }

    /// Tear the list down, destroying any live controller.
    ///
    /// Every later operation fails with
    /// [`BindingError::Disposed`](crate::BindingError::Disposed). Called on
    /// drop.
    pub fn teardown(&self) {
        drop(self.ref_observer.lock().take());
        self.lifecycle.lock().dispose();
    }
}

impl<B: SortableBackend, A: SortableItem, C> fmt::Debug for SortableList<B, A, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortableList")
            .field("tag", &self.tag)
            .field("class_name", &self.class_name)
            .field("lifecycle", &*self.lifecycle.lock())
            .finish_non_exhaustive()
    }
}

impl<B: SortableBackend, A: SortableItem, C> Drop for SortableList<B, A, C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Builder for [`SortableList`].
///
/// Defaults: tag `div`, no class name, empty style, no children, the
/// built-in sortable schema, deep comparison of structured options, and
/// diagnostics written through `tracing`.
pub struct SortableListBuilder<B: SortableBackend, A: SortableItem, C = ()> {
    backend: Arc<B>,
    setter: StateSetter<A>,
    tag: Option<String>,
    options: Configuration,
    class_name: Option<String>,
    style: Style,
    children: Vec<C>,
    external_ref: Option<ExternalRef<B::Element>>,
    element_ref: Option<HostElementRef<B::Element>>,
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
    reconciler_config: ReconcilerConfig,
    schema: Option<OptionSchema>,
    transfer: Option<Arc<DragTransfer<A>>>,
}

impl<B: SortableBackend, A: SortableItem> SortableListBuilder<B, A> {
    pub fn new(backend: Arc<B>, setter: StateSetter<A>) -> Self {
        Self {
            backend,
            setter,
            tag: None,
            options: Configuration::new(),
            class_name: None,
            style: Style::new(),
            children: Vec::new(),
            external_ref: None,
            element_ref: None,
            diagnostics: None,
            reconciler_config: ReconcilerConfig::default(),
            schema: None,
            transfer: None,
        }
    }
}

impl<B: SortableBackend, A: SortableItem, C: Clone> SortableListBuilder<B, A, C> {
    /// The host element kind. Validated by [`build`](Self::build).
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// The configuration the controller is created with.
    pub fn options(mut self, options: Configuration) -> Self {
        self.options = options;
        self
    }

    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Add one inline style declaration.
    pub fn style_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.insert(name.into(), value.into());
        self
    }

    /// Children rendered inside the host node.
    pub fn children<C2: Clone>(self, children: Vec<C2>) -> SortableListBuilder<B, A, C2> {
        SortableListBuilder {
            backend: self.backend,
            setter: self.setter,
            tag: self.tag,
            options: self.options,
            class_name: self.class_name,
            style: self.style,
            children,
            external_ref: self.external_ref,
            element_ref: self.element_ref,
            diagnostics: self.diagnostics,
            reconciler_config: self.reconciler_config,
            schema: self.schema,
            transfer: self.transfer,
        }
    }

    pub fn child(mut self, child: C) -> Self {
        self.children.push(child);
        self
    }

    /// A reference that receives the host element alongside the internal
    /// one.
    pub fn external_ref(mut self, external_ref: ExternalRef<B::Element>) -> Self {
        self.external_ref = Some(external_ref);
        self
    }

    /// The internal reference that drives the controller lifecycle.
    ///
    /// Defaults to a fresh [`HostElementRef`]. If it already points at an
    /// element, the controller is created by [`build`](Self::build).
    pub fn element_ref(mut self, element_ref: HostElementRef<B::Element>) -> Self {
        self.element_ref = Some(element_ref);
        self
    }

    /// Where recoverable problems are reported.
    pub fn diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub fn reconciler_config(mut self, config: ReconcilerConfig) -> Self {
        self.reconciler_config = config;
        self
    }

    /// Declare the controller's options instead of using the sortable schema.
    pub fn schema(mut self, schema: OptionSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Share a drag transfer with the other lists items can move between.
    pub fn transfer(mut self, transfer: Arc<DragTransfer<A>>) -> Self {
        self.transfer = Some(transfer);
        self
    }

    /// Build the list.
    ///
    /// Fails on an invalid tag, or if the element reference is already set
    /// and the controller cannot be created on it.
    pub fn build(self) -> Result<SortableList<B, A, C>> {
        let tag = match self.tag {
            Some(tag) => ElementTag::new(tag)?,
            None => ElementTag::default(),
        };
        let diagnostics = self
            .diagnostics
            .unwrap_or_else(|| Arc::new(TracingSink) as Arc<dyn DiagnosticSink>);
        let (schema, classification) = match self.schema {
            Some(schema) => {
                let classification = Arc::new(Classification::new(&schema));
                (Arc::new(schema), classification)
            }
            None => (
                Arc::new(OptionSchema::sortable().clone()),
                Classification::sortable(),
            ),
        };

        let mut bridge = StateBridge::new(self.setter, diagnostics.clone());
        if let Some(transfer) = self.transfer {
            bridge = bridge.with_transfer(transfer);
        }
        let bridge = Arc::new(bridge);

        let reconciler =
            OptionsReconciler::new(classification, diagnostics).with_config(self.reconciler_config);
        let resolved = schema.resolve(&self.options);
        let lifecycle = Arc::new(Mutex::new(ControllerLifecycle::new(
            self.backend,
            reconciler,
            bridge.clone(),
            resolved,
        )));

        let element_ref = self.element_ref.unwrap_or_default();
        let observer = observe_element(element_ref.changed(), Arc::downgrade(&lifecycle));
        if let Some(element) = element_ref.current() {
            lifecycle.lock().on_element_changed(Some(element))?;
        }

        tracing::debug!(target: "sortable_lattice::lifecycle", %tag, "sortable list built");
        Ok(SortableList {
            tag,
            class_name: self.class_name,
            style: self.style,
            children: self.children,
            external_ref: self.external_ref,
            element_ref,
            schema,
            options: Mutex::new(self.options),
            bridge,
            lifecycle,
            ref_observer: Mutex::new(Some(observer)),
        })
    }
}

/// Forward element changes to the lifecycle for as long as it exists.
fn observe_element<B, A>(
    changed: &Arc<Signal<Option<B::Element>>>,
    lifecycle: Weak<Mutex<ControllerLifecycle<B, A>>>,
) -> ConnectionGuard<Option<B::Element>>
where
    B: SortableBackend,
    A: SortableItem,
{
    Signal::connect_scoped(changed, move |element: &Option<B::Element>| {
        let Some(lifecycle) = lifecycle.upgrade() else {
            return;
        };
        if let Err(err) = lifecycle.lock().on_element_changed(element.clone()) {
            tracing::error!(target: "sortable_lattice::lifecycle", error = %err, "host element change not applied");
        }
    })
}

static_assertions::assert_impl_all!(HostNode<u32, ()>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BindingError;
    use crate::item::{Item, ItemStore};
    use crate::options::OptionValue;
    use crate::testing::{Call, RecordingBackend};
    use sortable_lattice_core::{CollectingSink, DiagnosticKind};

    fn store() -> Arc<ItemStore<Item>> {
        ItemStore::new(vec![Item::new("a"), Item::new("b"), Item::new("c")])
    }

    fn build(backend: &RecordingBackend, store: &Arc<ItemStore<Item>>) -> SortableList<RecordingBackend, Item> {
        SortableList::builder(Arc::new(backend.clone()), store.setter())
            .options(Configuration::new().with("animation", 150))
            .build()
            .unwrap()
    }

    #[test]
    fn test_render_passes_attributes_through() {
        let backend = RecordingBackend::new();
        let list = SortableList::builder(Arc::new(backend), store().setter())
            .tag("ul")
            .class_name("todo")
            .style_property("gap", "4px")
            .children(vec!["one", "two"])
            .child("three")
            .build()
            .unwrap();

        let node = list.render();
        assert_eq!(node.tag.as_str(), "ul");
        assert_eq!(node.class_name.as_deref(), Some("todo"));
        assert_eq!(node.style.get("gap").map(String::as_str), Some("4px"));
        assert_eq!(node.children, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_default_tag_and_invalid_tag() {
        let list = SortableList::builder(Arc::new(RecordingBackend::new()), store().setter())
            .build()
            .unwrap();
        assert_eq!(list.render().tag.as_str(), "div");

        let err = SortableList::builder(Arc::new(RecordingBackend::new()), store().setter())
            .tag("not a tag")
            .build()
            .unwrap_err();
        assert!(matches!(err, BindingError::InvalidTag(_)));
    }

    #[test]
    fn test_mount_creates_controller_with_resolved_options() {
        let backend = RecordingBackend::new();
        let store = store();
        let list = build(&backend, &store);
        assert_eq!(list.state(), LifecycleState::Unbound);

        list.render().mount(&5);
        assert_eq!(list.state(), LifecycleState::Bound);
        assert_eq!(list.element(), Some(5));

        let options = list.with_controller(|h| h.options.clone()).unwrap();
        assert_eq!(options.get("animation"), Some(&OptionValue::Int(150)));
        assert_eq!(options.get("ghostClass"), Some(&OptionValue::from("sortable-ghost")));
    }

    #[test]
    fn test_mount_unmount_cycle() {
        let backend = RecordingBackend::new();
        let store = store();
        let list = build(&backend, &store);

        let node = list.render();
        node.mount(&1);
        node.unmount();

        assert_eq!(
            backend.calls(),
            vec![Call::Create { handle: 1, element: 1 }, Call::Destroy { handle: 1 }]
        );
        assert_eq!(list.state(), LifecycleState::Unbound);
    }

    #[test]
    fn test_external_ref_mirrors_internal() {
        let external = HostElementRef::new();
        let list = SortableList::builder(Arc::new(RecordingBackend::new()), store().setter())
            .external_ref(ExternalRef::cell(external.clone()))
            .build()
            .unwrap();

        let node = list.render();
        node.mount(&9);
        assert_eq!(external.current(), Some(9));
        assert_eq!(list.element_ref().current(), Some(9));

        node.unmount();
        assert_eq!(external.current(), None);
        assert_eq!(list.element_ref().current(), None);
    }

    #[test]
    fn test_preset_element_ref_binds_on_build() {
        let backend = RecordingBackend::new();
        let cell = HostElementRef::new();
        cell.set(Some(4));

        let list = SortableList::builder(Arc::new(backend.clone()), store().setter())
            .element_ref(cell.clone())
            .build()
            .unwrap();
        assert_eq!(list.state(), LifecycleState::Bound);
        assert_eq!(backend.creates(), 1);

        cell.set(None);
        assert_eq!(backend.destroys(), 1);
    }

    #[test]
    fn test_set_options_updates_in_place() {
        let backend = RecordingBackend::new();
        let store = store();
        let list = build(&backend, &store);
        list.render().mount(&1);
        backend.clear_log();

        let report = list
            .set_options(Configuration::new().with("animation", 300))
            .unwrap();

        assert_eq!(report.applied, vec!["animation"]);
        assert_eq!(
            backend.calls(),
            vec![Call::Set {
                handle: 1,
                name: "animation".into(),
                value: OptionValue::Int(300),
            }]
        );
        assert_eq!(list.options().get("animation"), Some(&OptionValue::Int(300)));
        assert_eq!(list.generation(), 1);
    }

    #[test]
    fn test_controller_events_reach_application_state() {
        let backend = RecordingBackend::new();
        let store = store();
        let list = build(&backend, &store);
        list.render().mount(&1);

        list.with_controller(|h| {
            h.fire(ReorderEvent::Update {
                item_id: "a".into(),
                old_index: 0,
                new_index: 2,
            })
        });
        assert_eq!(store.ids(), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_apply_reorder_requires_bound_controller() {
        let store = store();
        let list = build(&RecordingBackend::new(), &store);
        let event = ReorderEvent::Update {
            item_id: "c".into(),
            old_index: 2,
            new_index: 0,
        };

        let err = list.apply_reorder(event.clone()).unwrap_err();
        assert!(matches!(err, BindingError::Unbound { .. }));

        list.render().mount(&1);
        list.apply_reorder(event).unwrap();
        assert_eq!(store.ids(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_set_state_redirects_updates() {
        let first = store();
        let second = ItemStore::new(vec![Item::new("x"), Item::new("y")]);
        let list = build(&RecordingBackend::new(), &first);
        list.render().mount(&1);

        list.set_state(second.setter()).unwrap();
        list.apply_reorder(ReorderEvent::Update {
            item_id: "x".into(),
            old_index: 0,
            new_index: 1,
        })
        .unwrap();

        assert_eq!(first.ids(), vec!["a", "b", "c"]);
        assert_eq!(second.ids(), vec!["y", "x"]);
    }

    #[test]
    fn test_teardown_disposes() {
        let backend = RecordingBackend::new();
        let sink = Arc::new(CollectingSink::new());
        let list = SortableList::builder(Arc::new(backend.clone()), store().setter())
            .diagnostics(sink.clone())
            .build()
            .unwrap();
        let node = list.render();
        node.mount(&1);

        list.teardown();
        list.teardown();
        assert_eq!(list.state(), LifecycleState::Disposed);
        assert_eq!(backend.destroys(), 1);

        // The ref is no longer observed.
        node.unmount();
        node.mount(&2);
        assert_eq!(backend.creates(), 1);

        let err = list.set_options(Configuration::new()).unwrap_err();
        assert!(matches!(err, BindingError::Disposed { .. }));
        let err = list
            .apply_reorder(ReorderEvent::End { item_id: "a".into() })
            .unwrap_err();
        assert!(matches!(err, BindingError::Disposed { .. }));
        assert!(list.set_state(store().setter()).is_err());
        assert_eq!(sink.count(DiagnosticKind::LifecycleMisuse), 3);
    }

    #[test]
    fn test_drop_destroys_controller() {
        let backend = RecordingBackend::new();
        let list = build(&backend, &store());
        list.render().mount(&1);
        drop(list);
        assert_eq!(backend.destroys(), 1);
    }
}
