//! In-place reconciliation of a live controller's options.
//!
//! Given the previously applied configuration and the next one, the
//! [`OptionsReconciler`] mutates only the fields that changed, using the
//! comparison each field's [`OptionKind`] calls for. It never recreates the
//! controller.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use sortable_lattice_core::logging::span_names;
use sortable_lattice_core::{Diagnostic, DiagnosticKind, DiagnosticSink, PerfSpan, TracingSink};

use crate::controller::ControllerHandle;
use crate::options::{Classification, Configuration, OptionKind, OptionValue};

/// How structured (nested) option values are compared.
#[derive(Clone, Default)]
pub enum StructuredComparator {
    /// Full recursive equality. Callbacks nested inside records compare by
    /// identity.
    #[default]
    Deep,
    /// A caller-supplied equality, for large nested values with a cheaper
    /// notion of sameness (a version field, say).
    Custom(Arc<dyn Fn(&OptionValue, &OptionValue) -> bool + Send + Sync>),
}

impl StructuredComparator {
    /// Wrap a custom equality function.
    pub fn custom<F>(eq: F) -> Self
    where
        F: Fn(&OptionValue, &OptionValue) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(eq))
    }

    /// Whether two structured values are the same.
    ///
    /// A custom comparator only sees pairs of lists or records. Fields that
    /// also admit plain values compare those by equality.
    pub fn same(&self, a: &OptionValue, b: &OptionValue) -> bool {
        match self {
            Self::Custom(eq) if a.is_nested() && b.is_nested() => eq(a, b),
            _ => a == b,
        }
    }
}

impl fmt::Debug for StructuredComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deep => write!(f, "Deep"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Configuration for an [`OptionsReconciler`].
#[derive(Debug, Clone, Default)]
pub struct ReconcilerConfig {
    /// Comparator for structured fields.
    pub comparator: StructuredComparator,
}

impl ReconcilerConfig {
    /// Use a custom comparator for structured fields.
    pub fn with_comparator(mut self, comparator: StructuredComparator) -> Self {
        self.comparator = comparator;
        self
    }
}

/// What a reconciliation did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Fields written to the controller.
    pub applied: Vec<String>,
    /// Fields removed from the controller.
    pub removed: Vec<String>,
    /// Fields left untouched because they could not be classified.
    pub skipped: Vec<String>,
}

impl ReconcileReport {
    /// Whether the controller was left untouched.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty() && self.removed.is_empty()
    }
}

/// Applies configuration changes to a live controller.
#[derive(Clone)]
pub struct OptionsReconciler {
    classification: Arc<Classification>,
    config: ReconcilerConfig,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl fmt::Debug for OptionsReconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsReconciler")
            .field("fields", &self.classification.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for OptionsReconciler {
    fn default() -> Self {
        Self::new(Classification::sortable(), Arc::new(TracingSink))
    }
}

enum Check<'a> {
    Known(OptionKind),
    Skip(&'a str),
}

impl OptionsReconciler {
    /// Create a reconciler for a classified schema.
    pub fn new(classification: Arc<Classification>, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            classification,
            config: ReconcilerConfig::default(),
            diagnostics,
        }
    }

    /// Replace the reconciler configuration.
    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    /// The sink diagnostics are reported to.
    pub fn diagnostics(&self) -> &Arc<dyn DiagnosticSink> {
        &self.diagnostics
    }

    /// Drop every field that cannot be safely handed to a controller.
    ///
    /// Used for the configuration a controller is created with; each dropped
    /// field is reported.
    pub fn sanitize(&self, options: &Configuration) -> Configuration {
        options
            .iter()
            .filter(|(name, value)| matches!(self.check(name, Some(*value)), Check::Known(_)))
            .map(|(name, value)| (name, value.clone()))
            .collect()
    }

    /// Bring `handle` from `previous` to `next`, touching only changed fields.
    pub fn reconcile<H>(
        &self,
        previous: &Configuration,
        next: &Configuration,
        handle: &mut H,
    ) -> ReconcileReport
    where
        H: ControllerHandle,
    {
        let _span = tracing::trace_span!(target: "sortable_lattice::options", span_names::RECONCILE).entered();
        let _perf = PerfSpan::new("reconcile_options");

        let names: BTreeSet<&str> = previous.names().chain(next.names()).collect();
        let mut report = ReconcileReport::default();

        for name in names {
            let before = previous.get(name);
            let after = next.get(name);

            let kind = match self.check(name, after) {
                Check::Known(kind) => kind,
                Check::Skip(field) => {
                    report.skipped.push(field.to_string());
                    continue;
                }
            };

            let changed = match kind {
                OptionKind::Primitive => before != after,
                OptionKind::Callback => !same_callback(before, after),
                OptionKind::Structured => match (before, after) {
                    (Some(a), Some(b)) => !self.config.comparator.same(a, b),
                    (None, None) => false,
                    _ => true,
                },
            };
            if !changed {
                continue;
            }

            if kind == OptionKind::Callback && before.is_some() {
                // Deregister the old listener before registering its replacement.
                handle.remove_option(name);
                if after.is_none() {
                    report.removed.push(name.to_string());
                }
            }

            match after {
                Some(value) => {
                    tracing::trace!(target: "sortable_lattice::options", option = name, ?kind, "applying option");
                    handle.set_option(name, value.clone());
                    report.applied.push(name.to_string());
                }
                None if kind != OptionKind::Callback => {
                    tracing::trace!(target: "sortable_lattice::options", option = name, ?kind, "removing option");
                    handle.remove_option(name);
                    report.removed.push(name.to_string());
                }
                None => {}
            }
        }

        tracing::debug!(
            target: "sortable_lattice::options",
            applied = report.applied.len(),
            removed = report.removed.len(),
            skipped = report.skipped.len(),
            "reconciled options"
        );
        report
    }

    /// Classify a field and validate the value it is about to take.
    ///
    /// Unknown fields and values of the wrong shape are reported (when a
    /// value is present) and skipped; the controller keeps its prior value.
    fn check<'a>(&self, name: &'a str, value: Option<&OptionValue>) -> Check<'a> {
        let Some(kind) = self.classification.kind_of(name) else {
            if value.is_some() {
                self.diagnostics.report(
                    Diagnostic::warning(
                        DiagnosticKind::UnclassifiedField,
                        "option kind is unknown; changes to it are not watched",
                    )
                    .with_subject(name),
                );
            }
            return Check::Skip(name);
        };

        if let (Some(value), Some(shape)) = (value, self.classification.shape_of(name)) {
            if !shape.admits(value) {
                self.diagnostics.report(
                    Diagnostic::warning(
                        DiagnosticKind::ShapeMismatch,
                        format!("value of shape {:?} is not admitted by {:?}", value.shape(), shape),
                    )
                    .with_subject(name),
                );
                return Check::Skip(name);
            }
        }

        Check::Known(kind)
    }
}

/// Shallow comparison: callbacks by identity, anything else by equality.
fn same_callback(a: Option<&OptionValue>, b: Option<&OptionValue>) -> bool {
    match (a, b) {
        (Some(OptionValue::Callback(a)), Some(OptionValue::Callback(b))) => a.ptr_eq(b),
        (a, b) => a == b,
    }
}
