//! Declarative configuration objects.

use std::collections::BTreeMap;

use crate::controller::ControllerEvent;
use crate::error::{BindingError, Result};

use super::value::OptionValue;

/// A mapping of option names to values, as the application declares it.
///
/// Configurations are plain values: the binding layer diffs successive
/// configurations instead of observing mutations.
///
/// ```
/// use sortable_lattice::{Configuration, OptionValue};
///
/// let options = Configuration::new()
///     .with("animation", 150)
///     .with("fallbackOffset", OptionValue::record([("x", 0), ("y", 4)]))
///     .with_callback("onEnd", |event| println!("dropped {:?}", event.item_id));
///
/// assert_eq!(options.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    values: BTreeMap<String, OptionValue>,
}

impl Configuration {
    /// An empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Builder-style callback registration.
    pub fn with_callback<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&ControllerEvent) + Send + Sync + 'static,
    {
        self.with(name, OptionValue::callback(f))
    }

    /// Set a field, returning the previous value.
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: impl Into<OptionValue>,
    ) -> Option<OptionValue> {
        self.values.insert(name.into(), value.into())
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<OptionValue> {
        self.values.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Field names, ordered.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// This configuration's values laid over `base`.
    pub fn merged_over(&self, base: &Configuration) -> Configuration {
        let mut merged = base.clone();
        for (name, value) in &self.values {
            merged.values.insert(name.clone(), value.clone());
        }
        merged
    }

    /// Build a configuration from a JSON object.
    ///
    /// Nested objects become records and arrays become lists. Callbacks
    /// cannot be expressed in JSON and must be added afterwards.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Object(map) => Ok(map
                .into_iter()
                .map(|(k, v)| (k, OptionValue::from(v)))
                .collect()),
            other => Err(BindingError::InvalidConfiguration(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Parse a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| BindingError::InvalidConfiguration(e.to_string()))?;
        Self::from_json(value)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

impl<K: Into<String>> FromIterator<(K, OptionValue)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (K, OptionValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl TryFrom<serde_json::Value> for Configuration {
    type Error = BindingError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        Self::from_json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merged_over_prefers_own_values() {
        let base = Configuration::new().with("sort", true).with("delay", 0);
        let own = Configuration::new().with("delay", 200);

        let merged = own.merged_over(&base);
        assert_eq!(merged.get("sort"), Some(&OptionValue::Bool(true)));
        assert_eq!(merged.get("delay"), Some(&OptionValue::Int(200)));
    }

    #[test]
    fn test_from_json_object() {
        let config = Configuration::from_json(json!({
            "animation": 150,
            "group": { "name": "shared", "pull": true },
            "fallbackOffset": { "x": 0, "y": 0 }
        }))
        .unwrap();

        assert_eq!(config.len(), 3);
        assert_eq!(config.get("animation"), Some(&OptionValue::Int(150)));
        assert_eq!(
            config.get("group").and_then(|g| g.get("name")),
            Some(&OptionValue::from("shared"))
        );
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = Configuration::from_json(json!([1, 2])).unwrap_err();
        assert!(matches!(err, BindingError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("an array"));

        assert!(Configuration::from_json_str("{not json").is_err());
    }

    #[test]
    fn test_names_are_ordered() {
        let config = Configuration::new().with("sort", true).with("animation", 0);
        assert_eq!(config.names().collect::<Vec<_>>(), vec!["animation", "sort"]);
    }
}
