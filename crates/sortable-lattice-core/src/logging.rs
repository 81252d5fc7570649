//! Logging and diagnostics for Sortable Lattice.
//!
//! This module provides:
//! - Integration with the `tracing` crate for structured logging
//! - An injectable [`DiagnosticSink`] for recoverable problems
//! - Performance tracing hooks for profiling
//!
//! # Tracing Integration
//!
//! Sortable Lattice uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt::init();
//!     // ...
//! }
//! ```
//!
//! # Diagnostics
//!
//! Problems the binding layer recovers from locally (an option it cannot
//! classify, a reorder event naming an item that no longer exists) are
//! reported as [`Diagnostic`] values through a [`DiagnosticSink`]. The default
//! [`TracingSink`] forwards them to `tracing`; tests can install a
//! [`CollectingSink`] and assert on what was reported.
//!
//! ```
//! use std::sync::Arc;
//! use sortable_lattice_core::logging::{CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink};
//!
//! let sink = Arc::new(CollectingSink::new());
//! sink.report(Diagnostic::warning(DiagnosticKind::UnclassifiedField, "unknown option").with_subject("colour"));
//! assert_eq!(sink.count(DiagnosticKind::UnclassifiedField), 1);
//! ```

use std::fmt;

use parking_lot::Mutex;

/// Span names used throughout Sortable Lattice for tracing.
pub mod span_names {
    /// Options reconciliation span.
    pub const RECONCILE: &str = "sortable_lattice::reconcile";
    /// Controller lifecycle transitions.
    pub const LIFECYCLE: &str = "sortable_lattice::lifecycle";
    /// Reorder bridging span.
    pub const BRIDGE: &str = "sortable_lattice::bridge";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "sortable_lattice_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "sortable_lattice_core::signal";
    /// Option classification and reconciliation.
    pub const OPTIONS: &str = "sortable_lattice::options";
    /// Controller lifecycle.
    pub const LIFECYCLE: &str = "sortable_lattice::lifecycle";
    /// Reorder event bridging.
    pub const BRIDGE: &str = "sortable_lattice::bridge";
}

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Expected in normal operation; interesting when debugging.
    Debug,
    /// Something was skipped that the caller probably wanted applied.
    Warning,
    /// A contract was violated.
    Error,
}

/// The category of a reported diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A configuration field that no schema entry classifies.
    UnclassifiedField,
    /// A configuration value whose shape the field does not admit.
    ShapeMismatch,
    /// A reorder event naming an item that is not in the collection.
    StaleReference,
    /// An operation attempted after the controller was disposed.
    LifecycleMisuse,
}

impl DiagnosticKind {
    /// The tracing target this kind of diagnostic is logged under.
    pub fn target(self) -> &'static str {
        match self {
            Self::UnclassifiedField | Self::ShapeMismatch => targets::OPTIONS,
            Self::StaleReference => targets::BRIDGE,
            Self::LifecycleMisuse => targets::LIFECYCLE,
        }
    }
}

/// A structured report of a locally recovered problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// What went wrong.
    pub kind: DiagnosticKind,
    /// How serious it is.
    pub severity: Severity,
    /// The option name or item id concerned, if any.
    pub subject: Option<String>,
    /// Human-readable detail.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic with an explicit severity.
    pub fn new(kind: DiagnosticKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            subject: None,
            message: message.into(),
        }
    }

    /// Create a debug-level diagnostic.
    pub fn debug(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Debug, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Warning, message)
    }

    /// Create an error diagnostic.
    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Error, message)
    }

    /// Attach the option name or item id this diagnostic is about.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Some(subject) => write!(f, "{:?} '{}': {}", self.kind, subject, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

/// Receiver for diagnostics.
///
/// Implementations must not panic; reporting happens in the middle of
/// reconciliation and reorder handling.
pub trait DiagnosticSink: Send + Sync {
    /// Record one diagnostic.
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing` under the kind's target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        let subject = diagnostic.subject.as_deref().unwrap_or("");
        // `target:` must be a literal, so dispatch per target.
        macro_rules! emit {
            ($target:expr) => {
                match diagnostic.severity {
                    Severity::Debug => tracing::debug!(
                        target: $target,
                        kind = ?diagnostic.kind,
                        subject,
                        "{}",
                        diagnostic.message
                    ),
                    Severity::Warning => tracing::warn!(
                        target: $target,
                        kind = ?diagnostic.kind,
                        subject,
                        "{}",
                        diagnostic.message
                    ),
                    Severity::Error => tracing::error!(
                        target: $target,
                        kind = ?diagnostic.kind,
                        subject,
                        "{}",
                        diagnostic.message
                    ),
                }
            };
        }
        match diagnostic.kind.target() {
            targets::OPTIONS => emit!("sortable_lattice::options"),
            targets::BRIDGE => emit!("sortable_lattice::bridge"),
            _ => emit!("sortable_lattice::lifecycle"),
        }
    }
}

/// Stores every diagnostic it receives. Intended for tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    collected: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything reported so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.collected.lock().clone()
    }

    /// Number of reported diagnostics of a kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.collected.lock().iter().filter(|d| d.kind == kind).count()
    }

    /// Whether a diagnostic of `kind` about `subject` was reported.
    pub fn contains(&self, kind: DiagnosticKind, subject: &str) -> bool {
        self.collected
            .lock()
            .iter()
            .any(|d| d.kind == kind && d.subject.as_deref() == Some(subject))
    }

    /// Remove and return everything reported so far.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.collected.lock())
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.collected.lock().push(diagnostic);
    }
}

/// A guard that emits a tracing span when dropped.
///
/// This is useful for tracking the duration of operations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "sortable_lattice::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

/// Macros for common tracing patterns.
///
/// These are thin wrappers around the `tracing` macros with consistent
/// target naming.
#[macro_export]
macro_rules! sortable_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "sortable_lattice_core", $($arg)*)
    };
}

#[macro_export]
macro_rules! sortable_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "sortable_lattice_core", $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink_counts_by_kind() {
        let sink = CollectingSink::new();
        sink.report(Diagnostic::warning(DiagnosticKind::ShapeMismatch, "bad").with_subject("sort"));
        sink.report(Diagnostic::debug(DiagnosticKind::StaleReference, "gone").with_subject("z"));
        sink.report(Diagnostic::debug(DiagnosticKind::StaleReference, "gone").with_subject("y"));

        assert_eq!(sink.count(DiagnosticKind::StaleReference), 2);
        assert!(sink.contains(DiagnosticKind::ShapeMismatch, "sort"));
        assert!(!sink.contains(DiagnosticKind::ShapeMismatch, "z"));

        assert_eq!(sink.take().len(), 3);
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::error(DiagnosticKind::LifecycleMisuse, "controller disposed");
        assert_eq!(d.to_string(), "LifecycleMisuse: controller disposed");

        let d = d.with_subject("list");
        assert_eq!(d.to_string(), "LifecycleMisuse 'list': controller disposed");
    }

    #[test]
    fn test_tracing_sink_does_not_panic() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let sink = TracingSink;
        sink.report(Diagnostic::warning(DiagnosticKind::UnclassifiedField, "x").with_subject("colour"));
        sink.report(Diagnostic::error(DiagnosticKind::LifecycleMisuse, "y"));
        sink.report(Diagnostic::debug(DiagnosticKind::StaleReference, "z"));
    }

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new("test_operation");
    }
}
