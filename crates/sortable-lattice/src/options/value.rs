//! Option values and their shapes.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

use crate::controller::ControllerEvent;

/// The set of value shapes a configuration field admits.
///
/// A field may admit more than one shape (for example `direction` takes
/// either a string or a function).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ValueShape(u8);

impl ValueShape {
    /// No shape. `Null` values have this shape and are admitted everywhere.
    pub const NONE: Self = Self(0);
    /// Booleans, numbers and strings.
    pub const SCALAR: Self = Self(1 << 0);
    /// Functions invoked by the controller.
    pub const FUNCTION: Self = Self(1 << 1);
    /// Nested records and lists.
    pub const RECORD: Self = Self(1 << 2);

    /// Returns true if this shape set contains another.
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Returns true if a field declared with this shape accepts `value`.
    pub fn admits(self, value: &OptionValue) -> bool {
        self.contains(value.shape())
    }
}

impl BitOr for ValueShape {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A function-valued option.
///
/// Equality is identity: two callbacks are equal only if they are clones of
/// the same registration.
#[derive(Clone)]
pub struct Callback(Arc<dyn Fn(&ControllerEvent) + Send + Sync>);

impl Callback {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ControllerEvent) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the callback.
    pub fn call(&self, event: &ControllerEvent) {
        (self.0)(event);
    }

    /// Whether both refer to the same function instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Arc::as_ptr(&self.0))
    }
}

/// The value of one configuration field.
///
/// `PartialEq` is deep for lists and records, by identity for callbacks and
/// bitwise for floats, so a `NaN` equals itself.
#[derive(Debug, Clone, Default)]
pub enum OptionValue {
    /// Explicitly unset.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<OptionValue>),
    Record(BTreeMap<String, OptionValue>),
    Callback(Callback),
}

impl PartialEq for OptionValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Record(a), Self::Record(b)) => a == b,
            (Self::Callback(a), Self::Callback(b)) => a == b,
            _ => false,
        }
    }
}

impl OptionValue {
    /// Build a record from name/value pairs.
    pub fn record<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<OptionValue>,
    {
        Self::Record(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a callback value.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&ControllerEvent) + Send + Sync + 'static,
    {
        Self::Callback(Callback::new(f))
    }

    /// The runtime shape of this value.
    pub fn shape(&self) -> ValueShape {
        match self {
            Self::Null => ValueShape::NONE,
            Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Str(_) => ValueShape::SCALAR,
            Self::List(_) | Self::Record(_) => ValueShape::RECORD,
            Self::Callback(_) => ValueShape::FUNCTION,
        }
    }

    /// Whether this is a list or a record.
    pub fn is_nested(&self) -> bool {
        matches!(self, Self::List(_) | Self::Record(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&BTreeMap<String, OptionValue>> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            Self::Callback(c) => Some(c),
            _ => None,
        }
    }

    /// Look up a field of a record value.
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.as_record().and_then(|r| r.get(key))
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for OptionValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for OptionValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for OptionValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Callback> for OptionValue {
    fn from(v: Callback) -> Self {
        Self::Callback(v)
    }
}

impl<T: Into<OptionValue>> From<Vec<T>> for OptionValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for OptionValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::Str(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Record(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}
