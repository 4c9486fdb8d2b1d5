//! Normalized definition model.
//!
//! Everything here is produced by the [`builder`](crate::builder) and is
//! immutable afterwards.

use std::collections::BTreeMap;
use std::fmt;

use wiring_common::constants::{ANONYMOUS_ID_PREFIX, AUTO_TYPE_ID_PREFIX};
use wiring_common::types::{Lifetime, Value};

/// A non-text literal scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// `null`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point.
    Float(f64),
}

impl From<&Scalar> for Value {
    fn from(scalar: &Scalar) -> Self {
        match scalar {
            Scalar::Null => Self::Null,
            Scalar::Bool(b) => Self::Bool(*b),
            Scalar::Int(n) => Self::Int(*n),
            Scalar::Float(x) => Self::Float(*x),
        }
    }
}

/// Literal payload of an [`ArgumentBinding::Literal`].
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// A scalar returned as-is.
    Scalar(Scalar),
    /// Text, subject to `{$name}` interpolation.
    Text(String),
    /// List resolved element-wise.
    List(Vec<ArgumentBinding>),
    /// Mapping resolved entry-wise, in declaration order.
    Map(Vec<(String, ArgumentBinding)>),
}

/// How one argument or property value is obtained during resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentBinding {
    /// Resolve another named entry.
    Reference(String),
    /// Look up a parameter; absent parameters are an error.
    Parameter(String),
    /// Resolve the entry that is `default-for` a type, or auto-build it.
    TypeDefault(String),
    /// A literal, possibly nesting further bindings.
    Literal(Literal),
}

/// A static dependency named by a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency<'a> {
    /// Another entry, by id.
    Entry(&'a str),
    /// Whatever satisfies a type, by type name.
    Type(&'a str),
}

impl ArgumentBinding {
    /// Collects the entries and types this binding needs, including nested ones.
    #[must_use]
    pub fn dependencies(&self) -> Vec<Dependency<'_>> {
        let mut out = Vec::new();
        self.collect_dependencies(&mut out);
        out
    }

    fn collect_dependencies<'a>(&'a self, out: &mut Vec<Dependency<'a>>) {
        match self {
            Self::Reference(id) => out.push(Dependency::Entry(id)),
            Self::TypeDefault(type_name) => out.push(Dependency::Type(type_name)),
            Self::Parameter(_) => {}
            Self::Literal(Literal::List(items)) => {
                for item in items {
                    item.collect_dependencies(out);
                }
            }
            Self::Literal(Literal::Map(entries)) => {
                for (_, item) in entries {
                    item.collect_dependencies(out);
                }
            }
            Self::Literal(Literal::Scalar(_) | Literal::Text(_)) => {}
        }
    }
}

impl fmt::Display for ArgumentBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference(id) => write!(f, "ref: {id}"),
            Self::Parameter(name) => write!(f, "param: {name}"),
            Self::TypeDefault(type_name) => write!(f, "instance-of: {type_name}"),
            Self::Literal(Literal::Scalar(s)) => write!(f, "value: {}", Value::from(s)),
            Self::Literal(Literal::Text(text)) => write!(f, "value: {text:?}"),
            Self::Literal(Literal::List(items)) => write!(f, "value: [{} item(s)]", items.len()),
            Self::Literal(Literal::Map(entries)) => write!(f, "value: {{{} key(s)}}", entries.len()),
        }
    }
}

/// What an entry is built from. Exactly one source per entry.
#[derive(Debug, Clone, PartialEq)]
pub enum EntrySource {
    /// Construct a registered type.
    Class(String),
    /// Resolve a literal binding.
    Value(ArgumentBinding),
    /// Call `method` on whatever `factory` resolves to.
    Factory {
        /// Binding yielding the factory object, or a type name for a static method.
        factory: ArgumentBinding,
        /// Method name.
        method: String,
    },
}

/// A named, buildable unit.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDefinition {
    /// Unique id.
    pub id: String,
    /// How the entry is built.
    pub source: EntrySource,
    /// Caching policy.
    pub lifetime: Lifetime,
    /// Type this entry is the fallback implementation for.
    pub default_for: Option<String>,
    /// Constructor or factory-method argument bindings, by parameter name.
    pub arguments: BTreeMap<String, ArgumentBinding>,
    /// Setter-injected property bindings, in declaration order.
    pub properties: Vec<(String, ArgumentBinding)>,
}

impl EntryDefinition {
    /// Synthesized per-request entry that auto-builds a registered type.
    #[must_use]
    pub fn auto(type_name: &str) -> Self {
        Self {
            id: format!("{AUTO_TYPE_ID_PREFIX}{type_name}"),
            source: EntrySource::Class(type_name.to_owned()),
            lifetime: Lifetime::PerRequest,
            default_for: None,
            arguments: BTreeMap::new(),
            properties: Vec::new(),
        }
    }

    /// Target type for class entries.
    #[must_use]
    pub fn target_type(&self) -> Option<&str> {
        match &self.source {
            EntrySource::Class(type_name) => Some(type_name),
            EntrySource::Value(_) | EntrySource::Factory { .. } => None,
        }
    }

    /// Returns `true` for entries lifted out of inline specifications.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.id.starts_with(ANONYMOUS_ID_PREFIX)
    }

    /// Bindings that must be resolved before the entry exists.
    ///
    /// Property bindings are excluded: they are applied after construction.
    pub fn construction_bindings(&self) -> impl Iterator<Item = &ArgumentBinding> {
        let source = match &self.source {
            EntrySource::Class(_) => None,
            EntrySource::Value(binding) | EntrySource::Factory { factory: binding, .. } => {
                Some(binding)
            }
        };
        source.into_iter().chain(self.arguments.values())
    }
}

impl fmt::Display for EntryDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            EntrySource::Class(type_name) => write!(f, "class {type_name}"),
            EntrySource::Factory { factory, method } => write!(f, "factory ({factory})::{method}"),
            EntrySource::Value(binding) => write!(f, "{binding}"),
        }
    }
}
