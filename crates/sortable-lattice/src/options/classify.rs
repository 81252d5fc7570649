//! Partitioning of configuration fields by update semantics.
//!
//! Every declared field falls into exactly one [`OptionKind`]:
//!
//! - a field that admits a function is a [`Callback`](OptionKind::Callback),
//!   compared by identity;
//! - otherwise a field that admits a record is
//!   [`Structured`](OptionKind::Structured), compared deeply and replaced
//!   wholesale;
//! - everything else is [`Primitive`](OptionKind::Primitive), compared by
//!   equality.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use super::schema::OptionSchema;
use super::value::ValueShape;

/// Update semantics of a configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    Primitive,
    Callback,
    Structured,
}

impl OptionKind {
    /// The kind a field with the declared `shape` belongs to.
    pub fn of_shape(shape: ValueShape) -> Self {
        if shape.contains(ValueShape::FUNCTION) {
            Self::Callback
        } else if shape.contains(ValueShape::RECORD) {
            Self::Structured
        } else {
            Self::Primitive
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    kind: OptionKind,
    shape: ValueShape,
}

/// The classification of every field of a schema.
///
/// Computed once per schema, never per update.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    entries: BTreeMap<String, Entry>,
}

impl Classification {
    /// Classify every field of `schema`.
    pub fn new(schema: &OptionSchema) -> Self {
        let entries: BTreeMap<String, Entry> = schema
            .fields()
            .map(|spec| {
                let entry = Entry {
                    kind: OptionKind::of_shape(spec.shape),
                    shape: spec.shape,
                };
                (spec.name.clone(), entry)
            })
            .collect();

        let classification = Self { entries };
        tracing::debug!(
            target: "sortable_lattice::options",
            primitive = classification.count(OptionKind::Primitive),
            callback = classification.count(OptionKind::Callback),
            structured = classification.count(OptionKind::Structured),
            "classified option schema"
        );
        classification
    }

    /// The classification of [`OptionSchema::sortable`], computed once.
    pub fn sortable() -> Arc<Classification> {
        static CLASSIFICATION: OnceLock<Arc<Classification>> = OnceLock::new();
        CLASSIFICATION
            .get_or_init(|| Arc::new(Self::new(OptionSchema::sortable())))
            .clone()
    }

    /// The kind of a field, or `None` if the schema does not declare it.
    pub fn kind_of(&self, name: &str) -> Option<OptionKind> {
        self.entries.get(name).map(|e| e.kind)
    }

    /// The declared shape of a field.
    pub fn shape_of(&self, name: &str) -> Option<ValueShape> {
        self.entries.get(name).map(|e| e.shape)
    }

    /// Names of all fields of `kind`, ordered.
    pub fn fields_of(&self, kind: OptionKind) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, e)| e.kind == kind)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    fn count(&self, kind: OptionKind) -> usize {
        self.entries.values().filter(|e| e.kind == kind).count()
    }

    /// Total number of classified fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
