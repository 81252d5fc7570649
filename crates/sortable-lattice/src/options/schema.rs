//! Declared configuration fields of a sortable controller.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::config::Configuration;
use super::value::{OptionValue, ValueShape};

/// One declared configuration field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// The option name as the controller knows it.
    pub name: String,
    /// Shapes the field admits.
    pub shape: ValueShape,
    /// The controller's default, if it defines one.
    pub default: Option<OptionValue>,
}

/// The full set of configuration fields a controller understands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionSchema {
    fields: BTreeMap<String, FieldSpec>,
}

/// Event callbacks of the sortable controller.
const EVENT_CALLBACKS: &[&str] = &[
    "onChoose",
    "onUnchoose",
    "onStart",
    "onEnd",
    "onAdd",
    "onUpdate",
    "onSort",
    "onRemove",
    "onFilter",
    "onMove",
    "onClone",
    "onChange",
    "onSelect",
    "onDeselect",
];

impl OptionSchema {
    /// Start declaring a custom schema.
    pub fn builder() -> OptionSchemaBuilder {
        OptionSchemaBuilder::default()
    }

    /// The schema of the sortable controller, built once per process.
    pub fn sortable() -> &'static OptionSchema {
        static SCHEMA: OnceLock<OptionSchema> = OnceLock::new();
        SCHEMA.get_or_init(Self::build_sortable)
    }

    fn build_sortable() -> Self {
        let scalar = ValueShape::SCALAR;
        let record = ValueShape::RECORD;
        let function = ValueShape::FUNCTION;

        let mut builder = Self::builder()
            .field("group", record | scalar)
            .field_with_default("sort", scalar, true)
            .field_with_default("disabled", scalar, false)
            .field("store", record)
            .field("handle", scalar)
            .field_with_default("draggable", scalar, ">*")
            .field_with_default("swapThreshold", scalar, 1.0)
            .field_with_default("invertSwap", scalar, false)
            .field("invertedSwapThreshold", scalar)
            .field_with_default("removeCloneOnHide", scalar, true)
            .field("direction", scalar | function)
            .field_with_default("ghostClass", scalar, "sortable-ghost")
            .field_with_default("chosenClass", scalar, "sortable-chosen")
            .field_with_default("dragClass", scalar, "sortable-drag")
            .field_with_default("ignore", scalar, "a, img")
            .field("filter", scalar | function)
            .field_with_default("preventOnFilter", scalar, true)
            .field_with_default("animation", scalar, 0)
            .field("easing", scalar)
            .field("setData", function)
            .field_with_default("dropBubble", scalar, false)
            .field_with_default("dragoverBubble", scalar, false)
            .field_with_default("dataIdAttr", scalar, "data-id")
            .field_with_default("delay", scalar, 0)
            .field_with_default("delayOnTouchOnly", scalar, false)
            .field_with_default("touchStartThreshold", scalar, 1)
            .field_with_default("forceFallback", scalar, false)
            .field_with_default("fallbackClass", scalar, "sortable-fallback")
            .field_with_default("fallbackOnBody", scalar, false)
            .field_with_default("fallbackTolerance", scalar, 0)
            .field_with_default(
                "fallbackOffset",
                record,
                OptionValue::record([("x", 0), ("y", 0)]),
            )
            .field_with_default("supportPointer", scalar, true)
            .field_with_default("emptyInsertThreshold", scalar, 5)
            .field_with_default("scroll", scalar | record, true)
            .field_with_default("scrollSensitivity", scalar, 30)
            .field_with_default("scrollSpeed", scalar, 10)
            .field_with_default("bubbleScroll", scalar, true);

        for name in EVENT_CALLBACKS {
            builder = builder.field(*name, function);
        }
        builder.build()
    }

    /// Look up a field.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// All fields, ordered by name.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values()
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The defaults of every field that has one.
    pub fn defaults(&self) -> Configuration {
        self.fields
            .values()
            .filter_map(|f| f.default.clone().map(|d| (f.name.clone(), d)))
            .collect()
    }

    /// Fully resolve `options`: defaults overlaid by the caller's values.
    ///
    /// Fields the schema does not declare are kept; the reconciler decides
    /// what to do with them.
    pub fn resolve(&self, options: &Configuration) -> Configuration {
        options.merged_over(&self.defaults())
    }
}

/// Builder for [`OptionSchema`].
#[derive(Debug, Default)]
pub struct OptionSchemaBuilder {
    fields: BTreeMap<String, FieldSpec>,
}

impl OptionSchemaBuilder {
    /// Declare a field without a default.
    ///
    /// Declaring the same name twice merges the shapes.
    pub fn field(self, name: impl Into<String>, shape: ValueShape) -> Self {
        self.insert(name.into(), shape, None)
    }

    /// Declare a field with a default value.
    pub fn field_with_default(
        self,
        name: impl Into<String>,
        shape: ValueShape,
        default: impl Into<OptionValue>,
    ) -> Self {
        self.insert(name.into(), shape, Some(default.into()))
    }

    fn insert(mut self, name: String, shape: ValueShape, default: Option<OptionValue>) -> Self {
        self.fields
            .entry(name.clone())
            .and_modify(|spec| {
                spec.shape = spec.shape | shape;
                if default.is_some() {
                    spec.default = default.clone();
                }
            })
            .or_insert(FieldSpec {
                name,
                shape,
                default,
            });
        self
    }

    /// Finish the schema.
    pub fn build(self) -> OptionSchema {
        OptionSchema {
            fields: self.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sortable_schema_declares_events() {
        let schema = OptionSchema::sortable();
        for name in EVENT_CALLBACKS {
            let spec = schema.field(name).unwrap();
            assert_eq!(spec.shape, ValueShape::FUNCTION);
        }
        assert!(schema.field("colour").is_none());
    }

    #[test]
    fn test_resolve_overlays_defaults() {
        let schema = OptionSchema::sortable();
        let options = Configuration::new().with("animation", 150).with("handle", ".grip");

        let resolved = schema.resolve(&options);

        assert_eq!(resolved.get("animation"), Some(&OptionValue::Int(150)));
        assert_eq!(resolved.get("handle"), Some(&OptionValue::from(".grip")));
        assert_eq!(resolved.get("ghostClass"), Some(&OptionValue::from("sortable-ghost")));
        assert_eq!(
            resolved.get("fallbackOffset"),
            Some(&OptionValue::record([("x", 0), ("y", 0)]))
        );
        assert!(resolved.get("group").is_none());
    }

    #[test]
    fn test_builder_merges_repeated_fields() {
        let schema = OptionSchema::builder()
            .field("direction", ValueShape::SCALAR)
            .field("direction", ValueShape::FUNCTION)
            .build();

        assert_eq!(schema.len(), 1);
        assert_eq!(
            schema.field("direction").map(|f| f.shape),
            Some(ValueShape::SCALAR | ValueShape::FUNCTION)
        );
    }
}
