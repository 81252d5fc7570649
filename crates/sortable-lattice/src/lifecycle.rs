//! Creation and destruction of the controller as the host element comes and
//! goes.
//!
//! # States
//!
//! ```text
//!            element set                 element cleared / replaced
//! Unbound ───────────────▶ Bound ───────────────────────────────▶ Unbound
//!    │                       │                                 (next handle)
//!    │ dispose               │ dispose
//!    ▼                       ▼
//! Disposed ◀─────────────────┘
//! ```
//!
//! Every handle is its own lifecycle instance, numbered by a generation
//! counter. When the element is replaced, the old handle is destroyed before
//! a new one is created, so at most one controller is live at a time.
//! `Disposed` is terminal: every later operation fails with
//! [`BindingError::Disposed`].

use std::fmt;
use std::sync::Arc;

use sortable_lattice_core::logging::span_names;
use sortable_lattice_core::{ConnectionId, Diagnostic, DiagnosticKind};

use crate::bridge::StateBridge;
use crate::controller::{ControllerHandle, SortableBackend};
use crate::error::{BindingError, Result};
use crate::item::SortableItem;
use crate::options::Configuration;
use crate::reconcile::{OptionsReconciler, ReconcileReport};

/// Observable state of a [`ControllerLifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// No element, or no controller created for it yet.
    Unbound,
    /// A controller is live on the current element.
    Bound,
    /// The owner was torn down. Terminal.
    Disposed,
}

struct Binding<B: SortableBackend> {
    element: B::Element,
    handle: B::Handle,
    connection: ConnectionId,
    generation: u64,
}

enum Slot<B: SortableBackend> {
    Unbound,
    Bound(Binding<B>),
    Disposed,
}

/// Owns the controller handle and drives it from element changes.
///
/// The reconciler and the state bridge only reach the handle through this
/// owner.
pub struct ControllerLifecycle<B: SortableBackend, A: SortableItem> {
    backend: Arc<B>,
    slot: Slot<B>,
    /// The resolved configuration the live controller (or the next one) has.
    options: Configuration,
    reconciler: OptionsReconciler,
    bridge: Arc<StateBridge<A>>,
    generation: u64,
}

impl<B: SortableBackend, A: SortableItem> fmt::Debug for ControllerLifecycle<B, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerLifecycle")
            .field("state", &self.state())
            .field("element", &self.element())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl<B: SortableBackend, A: SortableItem> ControllerLifecycle<B, A> {
    /// Create an unbound lifecycle.
    ///
    /// `options` is the resolved configuration the first controller will be
    /// created with.
    pub fn new(
        backend: Arc<B>,
        reconciler: OptionsReconciler,
        bridge: Arc<StateBridge<A>>,
        options: Configuration,
    ) -> Self {
        Self {
            backend,
            slot: Slot::Unbound,
            options,
            reconciler,
            bridge,
            generation: 0,
        }
    }

    pub fn state(&self) -> LifecycleState {
        match self.slot {
            Slot::Unbound => LifecycleState::Unbound,
            Slot::Bound(_) => LifecycleState::Bound,
            Slot::Disposed => LifecycleState::Disposed,
        }
    }

    /// The element the live controller is bound to.
    pub fn element(&self) -> Option<&B::Element> {
        match &self.slot {
            Slot::Bound(binding) => Some(&binding.element),
            _ => None,
        }
    }

    /// Number of controllers created so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The current resolved configuration.
    pub fn options(&self) -> &Configuration {
        &self.options
    }

    /// Run `f` against the live controller.
    pub fn with_handle<R>(&self, f: impl FnOnce(&B::Handle) -> R) -> Option<R> {
        match &self.slot {
            Slot::Bound(binding) => Some(f(&binding.handle)),
            _ => None,
        }
    }

    /// React to the host element reference changing.
    pub fn on_element_changed(&mut self, element: Option<B::Element>) -> Result<()> {
        self.ensure_live("bind a host element")?;
        match (&self.slot, &element) {
            (Slot::Bound(binding), Some(el)) if binding.element == *el => return Ok(()),
            (Slot::Unbound, None) => return Ok(()),
            _ => {}
        }

        self.release();
        match element {
            Some(element) => self.bind(element),
            None => Ok(()),
        }
    }

    /// Reconcile the live controller to `next`, a resolved configuration.
    ///
    /// Without a live controller, `next` is only remembered for the next one.
    pub fn reconcile(&mut self, next: Configuration) -> Result<ReconcileReport> {
        self.ensure_live("reconcile options")?;
        let report = match &mut self.slot {
            Slot::Bound(binding) => {
                self.reconciler
                    .reconcile(&self.options, &next, &mut binding.handle)
            }
            _ => ReconcileReport::default(),
        };
        self.options = next;
        Ok(report)
    }

    /// Tear down: destroy any live controller and refuse further use.
    ///
    /// Calling this more than once is harmless.
    pub fn dispose(&mut self) {
        if matches!(self.slot, Slot::Disposed) {
            return;
        }
        self.release();
        self.slot = Slot::Disposed;
        tracing::debug!(target: "sortable_lattice::lifecycle", generation = self.generation, "lifecycle disposed");
    }

    fn bind(&mut self, element: B::Element) -> Result<()> {
        let _span = tracing::debug_span!(target: "sortable_lattice::lifecycle", span_names::LIFECYCLE, generation = self.generation + 1).entered();
        let initial = self.reconciler.sanitize(&self.options);
        let handle = match self.backend.create(&element, &initial) {
            Ok(handle) => handle,
            Err(err) => {
                tracing::error!(target: "sortable_lattice::lifecycle", ?element, error = %err, "controller creation failed");
                return Err(err.into());
            }
        };

        let generation = self.generation + 1;
        if let Err(err) = self.bridge.attach(generation) {
            handle.destroy();
            tracing::error!(target: "sortable_lattice::lifecycle", ?element, error = %err, "controller wiring failed; destroyed");
            return Err(err);
        }
        self.generation = generation;

        let bridge = self.bridge.clone();
        let connection = handle
            .reordered()
            .connect(move |event| bridge.on_reorder(event));

        tracing::debug!(target: "sortable_lattice::lifecycle", ?element, generation, "controller created");
        self.slot = Slot::Bound(Binding {
            element,
            handle,
            connection,
            generation,
        });
        Ok(())
    }

    /// Destroy the live controller, if any, and return to `Unbound`.
    fn release(&mut self) {
        let binding = match std::mem::replace(&mut self.slot, Slot::Unbound) {
            Slot::Bound(binding) => binding,
            other => {
                self.slot = other;
                return;
            }
        };
        let Binding {
            element,
            handle,
            connection,
            generation,
        } = binding;

        let signal = handle.reordered();
        signal.disconnect(connection);
        signal.disconnect_all();
        self.bridge.detach();
        handle.destroy();

        tracing::debug!(target: "sortable_lattice::lifecycle", ?element, generation, "controller destroyed");
    }

    /// Fail with [`BindingError::Disposed`] once torn down, reporting the
    /// misuse.
    pub(crate) fn ensure_live(&self, operation: &'static str) -> Result<()> {
        if !matches!(self.slot, Slot::Disposed) {
            return Ok(());
        }
        self.reconciler.diagnostics().report(Diagnostic::error(
            DiagnosticKind::LifecycleMisuse,
            format!("cannot {operation}: controller disposed"),
        ));
        Err(BindingError::Disposed { operation })
    }
}

impl<B: SortableBackend, A: SortableItem> Drop for ControllerLifecycle<B, A> {
    fn drop(&mut self) {
        self.dispose();
    }
}
