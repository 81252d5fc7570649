//! Core systems for Sortable Lattice.
//!
//! This crate provides the foundational pieces the binding layer is built on:
//!
//! - **Signal/Slot System**: Type-safe notifications from an external controller
//! - **Property System**: Value cells with change detection
//! - **Diagnostics**: Structured, injectable reporting of recoverable problems
//!
//! # Signal/Slot Example
//!
//! ```
//! use sortable_lattice_core::Signal;
//!
//! let reordered = Signal::<(usize, usize)>::new();
//!
//! let conn_id = reordered.connect(|(from, to)| {
//!     println!("item moved from {} to {}", from, to);
//! });
//!
//! reordered.emit((0, 2));
//! reordered.disconnect(conn_id);
//! ```
//!
//! # Property Example
//!
//! ```
//! use sortable_lattice_core::{Property, Signal};
//!
//! struct Toggle {
//!     enabled: Property<bool>,
//!     enabled_changed: Signal<bool>,
//! }
//!
//! impl Toggle {
//!     fn set_enabled(&self, enabled: bool) {
//!         if self.enabled.set(enabled) {
//!             self.enabled_changed.emit(enabled);
//!         }
//!     }
//! }
//! ```

pub mod logging;
pub mod property;
pub mod signal;

pub use logging::{
    CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink, PerfSpan, Severity, TracingSink,
};
pub use property::{Property, ReadOnlyProperty};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
