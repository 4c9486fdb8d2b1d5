//! Resolution engine: turns entry definitions into live values.
//!
//! A [`Resolver`] borrows the container's state for one top-level request.
//! Construction is depth-first through argument bindings; property
//! injection is deferred until the requested graph has been constructed,
//! which is what allows two entries to refer to each other through setters.

use std::collections::{BTreeMap, HashMap};

use wiring_common::config::ContainerOptions;
use wiring_common::error::{Result, WiringError};
use wiring_common::types::{Lifetime, Value};
use wiring_definition::{ArgumentBinding, DefinitionSet, EntryDefinition, EntrySource, Literal};

use crate::context::{CreationContext, Deferred, Operation};
use crate::interpolate::interpolate;
use crate::registry::{Arguments, Param, TypeRegistry};

/// Display name used for constructors in error messages.
const CONSTRUCTOR_NAME: &str = "new";

/// Borrowed container state plus the creation context of one request.
pub(crate) struct Resolver<'a> {
    definitions: &'a DefinitionSet,
    registry: &'a TypeRegistry,
    parameters: &'a BTreeMap<String, Value>,
    options: ContainerOptions,
    instances: &'a mut HashMap<String, Value>,
    context: CreationContext,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(
        definitions: &'a DefinitionSet,
        registry: &'a TypeRegistry,
        parameters: &'a BTreeMap<String, Value>,
        options: ContainerOptions,
        instances: &'a mut HashMap<String, Value>,
    ) -> Self {
        Self {
            definitions,
            registry,
            parameters,
            options,
            instances,
            context: CreationContext::new(),
        }
    }

    /// Resolves `id`, drains deferred population, and wraps any failure
    /// with the creation trace.
    pub(crate) fn run(mut self, id: &str) -> Result<Value> {
        let outcome = self.get(id).and_then(|value| {
            self.drain_deferred()?;
            Ok(value)
        });
        outcome.map_err(|source| {
            self.evict_unpopulated();
            tracing::debug!(id, error = %source, "resolution failed");
            WiringError::Resolution {
                id: id.to_owned(),
                trace: self.context.to_string(),
                source: Box::new(source),
            }
        })
    }

    fn get(&mut self, id: &str) -> Result<Value> {
        let definitions = self.definitions;
        self.context.push(Operation::Get, id)?;
        let entry = definitions.get(id).ok_or_else(|| WiringError::NoDefinition {
            id: id.to_owned(),
        })?;
        let value = self.instance_of(entry)?;
        self.context.pop(Operation::Get, id);
        Ok(value)
    }

    fn instance_of(&mut self, entry: &EntryDefinition) -> Result<Value> {
        if entry.lifetime == Lifetime::Singleton {
            if let Some(cached) = self.instances.get(&entry.id) {
                tracing::trace!(id = %entry.id, "singleton cache hit");
                return Ok(cached.clone());
            }
        }
        self.create(entry)
    }

    fn create(&mut self, entry: &EntryDefinition) -> Result<Value> {
        self.context.push(Operation::Create, &entry.id)?;
        tracing::debug!(id = %entry.id, source = %entry, lifetime = %entry.lifetime, "creating instance");
        let value = match &entry.source {
            EntrySource::Class(type_name) => self.construct(type_name, &entry.arguments)?,
            EntrySource::Factory { factory, method } => {
                self.call_factory(factory, method, &entry.arguments)?
            }
            EntrySource::Value(binding) => self.resolve_binding(binding)?,
        };
        if entry.lifetime == Lifetime::Singleton {
            let _ = self.instances.insert(entry.id.clone(), value.clone());
            self.context.record_commit(&entry.id);
        }
        if !entry.properties.is_empty() {
            self.context.defer(value.clone(), &entry.id, entry.lifetime)?;
        }
        self.context.pop(Operation::Create, &entry.id);
        Ok(value)
    }

    fn construct(
        &mut self,
        type_name: &str,
        bindings: &BTreeMap<String, ArgumentBinding>,
    ) -> Result<Value> {
        let registry = self.registry;
        let descriptor = registry
            .get(type_name)
            .ok_or_else(|| WiringError::UnknownType {
                type_name: type_name.to_owned(),
            })?;
        let constructor = descriptor
            .constructor()
            .ok_or_else(|| WiringError::MissingMethod {
                type_name: type_name.to_owned(),
                method: CONSTRUCTOR_NAME.to_owned(),
            })?;
        let mut args = self.build_arguments(type_name, constructor.params(), bindings)?;
        let instance = (constructor.function())(&mut args)?;
        Ok(Value::Object(instance))
    }

    fn call_factory(
        &mut self,
        factory: &ArgumentBinding,
        method: &str,
        bindings: &BTreeMap<String, ArgumentBinding>,
    ) -> Result<Value> {
        let registry = self.registry;
        match self.resolve_binding(factory)? {
            Value::Object(receiver) => {
                let type_name = receiver.type_name();
                let callable = registry
                    .get(type_name)
                    .and_then(|descriptor| descriptor.method(method))
                    .ok_or_else(|| missing_method(type_name, method))?;
                let target = format!("{type_name}::{method}");
                let mut args = self.build_arguments(&target, callable.params(), bindings)?;
                (callable.function())(&receiver, &mut args)
            }
            Value::String(type_name) => {
                let callable = registry
                    .get(&type_name)
                    .ok_or_else(|| WiringError::UnknownType {
                        type_name: type_name.clone(),
                    })?
                    .static_method(method)
                    .ok_or_else(|| missing_method(&type_name, method))?;
                let target = format!("{type_name}::{method}");
                let mut args = self.build_arguments(&target, callable.params(), bindings)?;
                (callable.function())(&mut args)
            }
            other => Err(WiringError::ArgumentType {
                name: "factory".to_owned(),
                expected: "object or type name".to_owned(),
                actual: other.kind().to_owned(),
            }),
        }
    }

    /// Satisfies each declared parameter in order: named binding, then the
    /// declared type, then the default value, then `null` if optional.
    fn build_arguments(
        &mut self,
        target: &str,
        params: &[Param],
        bindings: &BTreeMap<String, ArgumentBinding>,
    ) -> Result<Arguments> {
        for name in bindings.keys() {
            if !params.iter().any(|param| &param.name == name) {
                tracing::warn!(target_name = target, argument = %name, "ignoring binding for undeclared parameter");
            }
        }
        let mut args = Arguments::new(target);
        for param in params {
            let value = if let Some(binding) = bindings.get(&param.name) {
                self.resolve_binding(binding)?
            } else if let Some(type_name) = param
                .type_name
                .as_deref()
                .filter(|type_name| self.can_satisfy(type_name))
            {
                self.instance_for_type(type_name)?
            } else if let Some(default) = &param.default {
                default.clone()
            } else if param.optional {
                Value::Null
            } else {
                return Err(WiringError::UnresolvableArgument {
                    target: target.to_owned(),
                    parameter: param.name.clone(),
                });
            };
            args.push(param.name.clone(), value);
        }
        Ok(args)
    }

    fn can_satisfy(&self, type_name: &str) -> bool {
        self.definitions.default_for(type_name).is_some()
            || self.registry.is_constructible(type_name)
    }

    fn instance_for_type(&mut self, type_name: &str) -> Result<Value> {
        let definitions = self.definitions;
        if let Some(entry) = definitions.default_for(type_name) {
            return self.get(&entry.id);
        }
        if self.registry.is_constructible(type_name) {
            let auto = EntryDefinition::auto(type_name);
            self.context.push(Operation::Get, &auto.id)?;
            let value = self.instance_of(&auto)?;
            self.context.pop(Operation::Get, &auto.id);
            return Ok(value);
        }
        Err(WiringError::UnresolvableType {
            type_name: type_name.to_owned(),
        })
    }

    fn resolve_binding(&mut self, binding: &ArgumentBinding) -> Result<Value> {
        match binding {
            ArgumentBinding::Reference(id) => self.get(id),
            ArgumentBinding::Parameter(name) => self
                .parameters
                .get(name)
                .filter(|value| !value.is_null())
                .cloned()
                .ok_or_else(|| WiringError::UndefinedParameter { name: name.clone() }),
            ArgumentBinding::TypeDefault(type_name) => self.instance_for_type(type_name),
            ArgumentBinding::Literal(Literal::Scalar(scalar)) => Ok(Value::from(scalar)),
            ArgumentBinding::Literal(Literal::Text(text)) => {
                interpolate(text, self.parameters, self.options.strict_interpolation)
                    .map(Value::String)
            }
            ArgumentBinding::Literal(Literal::List(items)) => items
                .iter()
                .map(|item| self.resolve_binding(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            ArgumentBinding::Literal(Literal::Map(entries)) => entries
                .iter()
                .map(|(key, item)| self.resolve_binding(item).map(|value| (key.clone(), value)))
                .collect::<Result<_>>()
                .map(Value::Map),
        }
    }

    /// Applies queued property injections, most recently queued first,
    /// until the queue is empty.
    fn drain_deferred(&mut self) -> Result<()> {
        while let Some(job) = self.context.next_deferred() {
            self.context.push(Operation::Populate, &job.entry_id)?;
            self.populate(&job)?;
            self.context.pop(Operation::Populate, &job.entry_id);
            self.context.finish_population();
        }
        Ok(())
    }

    fn populate(&mut self, job: &Deferred) -> Result<()> {
        let definitions = self.definitions;
        let registry = self.registry;
        let entry = definitions
            .get(&job.entry_id)
            .ok_or_else(|| WiringError::NoDefinition {
                id: job.entry_id.clone(),
            })?;
        let target = job.instance.as_instance();
        let descriptor = target.and_then(|object| registry.get(object.type_name()));
        for (property, binding) in &entry.properties {
            let setter = descriptor.and_then(|descriptor| descriptor.setter(property));
            let (Some(object), Some(setter)) = (target, setter) else {
                return Err(WiringError::MissingSetter {
                    type_name: job.instance.kind().to_owned(),
                    property: property.clone(),
                });
            };
            let value = self.resolve_binding(binding)?;
            tracing::debug!(id = %entry.id, property = %property, "injecting property");
            setter(object, value)?;
        }
        Ok(())
    }

    /// Rolls back the cache after a failed request.
    ///
    /// Singletons whose property injection never completed are dropped. If
    /// any were, every singleton committed during the request goes too,
    /// since it may hold a reference to a dropped one.
    fn evict_unpopulated(&mut self) {
        let half_wired = self
            .context
            .unpopulated()
            .any(|job| self.instances.get(&job.entry_id) == Some(&job.instance));
        if !half_wired {
            return;
        }
        for id in self.context.committed() {
            if self.instances.remove(id).is_some() {
                tracing::debug!(id = %id, "evicting singleton built by failed request");
            }
        }
    }
}

fn missing_method(type_name: &str, method: &str) -> WiringError {
    WiringError::MissingMethod {
        type_name: type_name.to_owned(),
        method: method.to_owned(),
    }
}
