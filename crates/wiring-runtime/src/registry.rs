//! Host type registration.
//!
//! The container never inspects types at runtime. Instead the host registers
//! a [`TypeBinding`] per type name describing how to construct it, which
//! factory methods it offers, and which properties can be injected through
//! setters. Parameter lists are declared explicitly with [`Param`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use wiring_common::error::{Result, WiringError};
use wiring_common::types::{Instance, Value};

/// Declared parameter of a constructor or method.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Name matched against argument bindings.
    pub name: String,
    /// Declared type, used to fall back on the type-default index.
    pub type_name: Option<String>,
    /// Value used when nothing else satisfies the parameter.
    pub default: Option<Value>,
    /// Whether the parameter may be left as [`Value::Null`].
    pub optional: bool,
}

impl Param {
    /// An untyped, required parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            default: None,
            optional: false,
        }
    }

    /// A required parameter declared with a type.
    pub fn typed(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Self::new(name)
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Marks the parameter optional.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Resolved arguments handed to a host constructor or method, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    target: String,
    values: Vec<(String, Value)>,
}

impl Arguments {
    /// Creates an empty argument list for `target` (used in error messages).
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            values: Vec::new(),
        }
    }

    /// Appends a named argument.
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.values.push((name.into(), value));
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Borrows an argument by name.
    ///
    /// # Errors
    ///
    /// Returns an unresolvable-argument error if no such argument was declared.
    pub fn get(&self, name: &str) -> Result<&Value> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
            .ok_or_else(|| WiringError::UnresolvableArgument {
                target: self.target.clone(),
                parameter: name.to_owned(),
            })
    }

    /// Moves an argument out, leaving [`Value::Null`] behind.
    ///
    /// # Errors
    ///
    /// Returns an unresolvable-argument error if no such argument was declared.
    pub fn take(&mut self, name: &str) -> Result<Value> {
        match self.values.iter_mut().find(|(n, _)| n == name) {
            Some((_, value)) => Ok(std::mem::take(value)),
            None => Err(WiringError::UnresolvableArgument {
                target: self.target.clone(),
                parameter: name.to_owned(),
            }),
        }
    }

    /// Returns the host object passed as `name`.
    ///
    /// # Errors
    ///
    /// Returns an argument-type error if the value is not a `T`.
    pub fn object<T: Any>(&self, name: &str) -> Result<Rc<T>> {
        let value = self.get(name)?;
        value
            .downcast::<T>()
            .ok_or_else(|| mismatch(name, std::any::type_name::<T>(), value))
    }

    /// Returns the host object passed as `name`, or `None` for `null`.
    ///
    /// # Errors
    ///
    /// Returns an argument-type error if the value is neither `null` nor a `T`.
    pub fn optional_object<T: Any>(&self, name: &str) -> Result<Option<Rc<T>>> {
        if self.get(name)?.is_null() {
            return Ok(None);
        }
        self.object(name).map(Some)
    }

    /// Returns the text passed as `name`.
    ///
    /// # Errors
    ///
    /// Returns an argument-type error if the value is not a string.
    pub fn string(&self, name: &str) -> Result<String> {
        let value = self.get(name)?;
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| mismatch(name, "string", value))
    }

    /// Returns the integer passed as `name`.
    ///
    /// # Errors
    ///
    /// Returns an argument-type error if the value is not an integer.
    pub fn int(&self, name: &str) -> Result<i64> {
        let value = self.get(name)?;
        value.as_i64().ok_or_else(|| mismatch(name, "int", value))
    }

    /// Returns the boolean passed as `name`.
    ///
    /// # Errors
    ///
    /// Returns an argument-type error if the value is not a boolean.
    pub fn bool(&self, name: &str) -> Result<bool> {
        let value = self.get(name)?;
        value.as_bool().ok_or_else(|| mismatch(name, "bool", value))
    }
}

fn mismatch(name: &str, expected: &str, actual: &Value) -> WiringError {
    WiringError::ArgumentType {
        name: name.to_owned(),
        expected: expected.to_owned(),
        actual: actual.kind().to_owned(),
    }
}

/// A host function together with its declared parameters.
pub struct Callable<F: ?Sized> {
    params: Vec<Param>,
    call: Box<F>,
}

impl<F: ?Sized> Callable<F> {
    /// Declared parameters, in call order.
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// The wrapped function.
    #[must_use]
    pub fn function(&self) -> &F {
        &self.call
    }
}

impl<F: ?Sized> fmt::Debug for Callable<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Builds a new instance from resolved arguments.
pub type Constructor = Callable<dyn Fn(&mut Arguments) -> Result<Instance>>;
/// Invokes a factory method on an existing instance.
pub type Method = Callable<dyn Fn(&Instance, &mut Arguments) -> Result<Value>>;
/// Invokes a factory function that needs no receiver.
pub type StaticMethod = Callable<dyn Fn(&mut Arguments) -> Result<Value>>;
/// Injects one property into an existing instance.
pub type Setter = Box<dyn Fn(&Instance, Value) -> Result<()>>;

/// Type-erased capabilities registered for one type name.
pub struct TypeDescriptor {
    name: Rc<str>,
    constructor: Option<Constructor>,
    methods: HashMap<String, Method>,
    static_methods: HashMap<String, StaticMethod>,
    setters: HashMap<String, Setter>,
}

impl TypeDescriptor {
    /// Registered type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Constructor, if the type can be built directly.
    #[must_use]
    pub const fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }

    /// Factory method invoked on an instance of this type.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    /// Factory function invoked through the type name.
    #[must_use]
    pub fn static_method(&self, name: &str) -> Option<&StaticMethod> {
        self.static_methods.get(name)
    }

    /// Setter for a property.
    #[must_use]
    pub fn setter(&self, property: &str) -> Option<&Setter> {
        self.setters.get(property)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.methods.keys().collect();
        methods.sort();
        let mut setters: Vec<_> = self.setters.keys().collect();
        setters.sort();
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("constructor", &self.constructor)
            .field("methods", &methods)
            .field("setters", &setters)
            .finish_non_exhaustive()
    }
}

/// Fluent registration of one host type `T` under a type name.
pub struct TypeBinding<T> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> TypeBinding<T> {
    /// Starts a binding for `T` named `name`.
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        Self {
            descriptor: TypeDescriptor {
                name: name.into(),
                constructor: None,
                methods: HashMap::new(),
                static_methods: HashMap::new(),
                setters: HashMap::new(),
            },
            _marker: PhantomData,
        }
    }

    /// Sets the constructor and its parameter list.
    #[must_use]
    pub fn constructor<F>(mut self, params: impl IntoIterator<Item = Param>, build: F) -> Self
    where
        F: Fn(&mut Arguments) -> Result<T> + 'static,
    {
        let name = Rc::clone(&self.descriptor.name);
        let call: Box<dyn Fn(&mut Arguments) -> Result<Instance>> =
            Box::new(move |args: &mut Arguments| {
                build(args).map(|object| Instance::new(Rc::clone(&name), object))
            });
        self.descriptor.constructor = Some(Callable {
            params: params.into_iter().collect(),
            call,
        });
        self
    }

    /// Adds a factory method callable on instances of `T`.
    #[must_use]
    pub fn method<F>(
        mut self,
        method: impl Into<String>,
        params: impl IntoIterator<Item = Param>,
        call: F,
    ) -> Self
    where
        F: Fn(&T, &mut Arguments) -> Result<Value> + 'static,
    {
        let type_name = Rc::clone(&self.descriptor.name);
        let call: Box<dyn Fn(&Instance, &mut Arguments) -> Result<Value>> =
            Box::new(move |instance: &Instance, args: &mut Arguments| {
                call(receiver::<T>(&type_name, instance)?, args)
            });
        let _ = self.descriptor.methods.insert(
            method.into(),
            Callable {
                params: params.into_iter().collect(),
                call,
            },
        );
        self
    }

    /// Adds a factory function reachable through the type name.
    #[must_use]
    pub fn static_method<F>(
        mut self,
        method: impl Into<String>,
        params: impl IntoIterator<Item = Param>,
        call: F,
    ) -> Self
    where
        F: Fn(&mut Arguments) -> Result<Value> + 'static,
    {
        let call: Box<dyn Fn(&mut Arguments) -> Result<Value>> = Box::new(call);
        let _ = self.descriptor.static_methods.insert(
            method.into(),
            Callable {
                params: params.into_iter().collect(),
                call,
            },
        );
        self
    }

    /// Adds a setter for `property`. Setters receive a shared reference, so
    /// host types keep injectable state behind interior mutability.
    #[must_use]
    pub fn setter<F>(mut self, property: impl Into<String>, set: F) -> Self
    where
        F: Fn(&T, Value) -> Result<()> + 'static,
    {
        let type_name = Rc::clone(&self.descriptor.name);
        let _ = self.descriptor.setters.insert(
            property.into(),
            Box::new(move |instance: &Instance, value: Value| {
                set(receiver::<T>(&type_name, instance)?, value)
            }),
        );
        self
    }
}

fn receiver<'a, T: Any>(type_name: &str, instance: &'a Instance) -> Result<&'a T> {
    instance
        .downcast_ref::<T>()
        .ok_or_else(|| WiringError::ArgumentType {
            name: "self".to_owned(),
            expected: type_name.to_owned(),
            actual: instance.type_name().to_owned(),
        })
}

/// Table of host types keyed by type name.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a binding, replacing any previous one with the same name.
    pub fn register<T: Any>(&mut self, binding: TypeBinding<T>) -> &mut Self {
        let descriptor = binding.descriptor;
        tracing::debug!(type_name = %descriptor.name, "registered type");
        let _ = self.types.insert(descriptor.name.to_string(), descriptor);
        self
    }

    /// Builder-style variant of [`register`](Self::register).
    #[must_use]
    pub fn with<T: Any>(mut self, binding: TypeBinding<T>) -> Self {
        let _ = self.register(binding);
        self
    }

    /// Looks up a type by name.
    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<&TypeDescriptor> {
        self.types.get(type_name)
    }

    /// Returns `true` if the type is registered with a constructor.
    #[must_use]
    pub fn is_constructible(&self, type_name: &str) -> bool {
        self.get(type_name)
            .is_some_and(|descriptor| descriptor.constructor().is_some())
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no type is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
