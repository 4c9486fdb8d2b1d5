//! Domain primitive types used across the Wiring workspace.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

/// Caching policy of an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// Built once, then served from the instance cache.
    #[default]
    Singleton,
    /// Rebuilt on every resolution.
    PerRequest,
}

impl Lifetime {
    /// Parses the configuration spelling of a lifetime.
    ///
    /// Accepts `singleton`/`single` and `per-request`/`instance`.
    #[must_use]
    pub fn from_config(raw: &str) -> Option<Self> {
        match raw {
            "singleton" | "single" => Some(Self::Singleton),
            "per-request" | "instance" => Some(Self::PerRequest),
            _ => None,
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singleton => write!(f, "singleton"),
            Self::PerRequest => write!(f, "per-request"),
        }
    }
}

/// A host object built by the container, tagged with its registered type name.
///
/// Clones share the same underlying object; equality is identity.
#[derive(Clone)]
pub struct Instance {
    type_name: Rc<str>,
    object: Rc<dyn Any>,
}

impl Instance {
    /// Wraps a freshly built object.
    pub fn new<T: Any>(type_name: impl Into<Rc<str>>, object: T) -> Self {
        Self::from_rc(type_name, Rc::new(object))
    }

    /// Wraps an object that is already reference counted.
    pub fn from_rc<T: Any>(type_name: impl Into<Rc<str>>, object: Rc<T>) -> Self {
        Self {
            type_name: type_name.into(),
            object,
        }
    }

    /// Registered type name of the object.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns a shared handle to the object if it is a `T`.
    #[must_use]
    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        Rc::clone(&self.object).downcast::<T>().ok()
    }

    /// Borrows the object if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }

    /// Returns `true` if both handles point at the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.object), Rc::as_ptr(&other.object))
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .field("address", &Rc::as_ptr(&self.object).cast::<()>())
            .finish()
    }
}

/// A resolved value: a scalar, a nested structure, or a host object.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// Absent value, used for optional parameters.
    #[default]
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Int(i64),
    /// Floating point scalar.
    Float(f64),
    /// Text scalar.
    String(String),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Keyed mapping of values, in declaration order.
    Map(IndexMap<String, Value>),
    /// Host object.
    Object(Instance),
}

impl Value {
    /// Wraps a host object under its registered type name.
    pub fn object<T: Any>(type_name: impl Into<Rc<str>>, object: T) -> Self {
        Self::Object(Instance::new(type_name, object))
    }

    /// Short name of the value's shape, or the object's type name.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Object(instance) => instance.type_name(),
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrows the text of a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer of a [`Value::Int`].
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean of a [`Value::Bool`].
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrows the items of a [`Value::List`].
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrows the mapping of a [`Value::Map`].
    #[must_use]
    pub const fn as_map(&self) -> Option<&IndexMap<String, Self>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Borrows the host object of a [`Value::Object`].
    #[must_use]
    pub const fn as_instance(&self) -> Option<&Instance> {
        match self {
            Self::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// Returns a shared handle to the host object if it is a `T`.
    #[must_use]
    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        self.as_instance().and_then(Instance::downcast::<T>)
    }

    /// Converts a decoded JSON-like tree into a value.
    ///
    /// Integers that do not fit an `i64` become floats.
    #[must_use]
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            serde_json::Value::String(s) => Self::String(s.clone()),
            serde_json::Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            serde_json::Value::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Renders the value as JSON; host objects become `"<object TypeName>"`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(n) => serde_json::Value::from(*n),
            Self::Float(x) => serde_json::Number::from_f64(*x)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Self::Object(instance) => {
                serde_json::Value::String(format!("<object {}>", instance.type_name()))
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
            Self::List(_) | Self::Map(_) => write!(f, "{}", self.to_json()),
            Self::Object(instance) => write!(f, "<object {}>", instance.type_name()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<Vec<Self>> for Value {
    fn from(items: Vec<Self>) -> Self {
        Self::List(items)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Self::Object(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;

    #[test]
    fn lifetime_accepts_both_spellings() {
        assert_eq!(Lifetime::from_config("single"), Some(Lifetime::Singleton));
        assert_eq!(Lifetime::from_config("singleton"), Some(Lifetime::Singleton));
        assert_eq!(Lifetime::from_config("instance"), Some(Lifetime::PerRequest));
        assert_eq!(Lifetime::from_config("per-request"), Some(Lifetime::PerRequest));
        assert_eq!(Lifetime::from_config("scoped"), None);
    }

    #[test]
    fn instance_equality_is_identity() {
        let a = Instance::new("Probe", Probe);
        let b = a.clone();
        let c = Instance::new("Probe", Probe);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn instance_downcast_checks_type() {
        let instance = Instance::new("Probe", Probe);
        assert!(instance.downcast::<Probe>().is_some());
        assert!(instance.downcast::<String>().is_none());
        assert_eq!(instance.type_name(), "Probe");
    }

    #[test]
    fn from_json_maps_numbers_and_nesting() {
        let json = serde_json::json!({"n": 3, "x": 1.5, "items": ["a", true, null]});
        let value = Value::from_json(&json);
        let map = value.as_map().expect("map");
        assert_eq!(map["n"], Value::Int(3));
        assert_eq!(map["x"], Value::Float(1.5));
        assert_eq!(
            map["items"],
            Value::List(vec![Value::from("a"), Value::Bool(true), Value::Null])
        );
    }

    #[test]
    fn mappings_keep_declaration_order() {
        let json = serde_json::json!({"zeta": 1, "alpha": 2, "mid": 3});
        let value = Value::from_json(&json);
        let keys: Vec<&str> = value
            .as_map()
            .expect("map")
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
        assert_eq!(value.to_json().to_string(), r#"{"zeta":1,"alpha":2,"mid":3}"#);
    }

    #[test]
    fn display_renders_scalars_bare() {
        assert_eq!(Value::from("text").to_string(), "text");
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::object("Probe", Probe).to_string(), "<object Probe>");
    }
}
