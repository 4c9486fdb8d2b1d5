//! The container: definitions, parameters, and the singleton cache.

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value as Json};
use wiring_common::config::{AssemblyDocument, ContainerOptions};
use wiring_common::error::Result;
use wiring_common::types::Value;
use wiring_definition::{DefinitionSet, build_definitions};

use crate::engine::Resolver;
use crate::registry::TypeRegistry;

/// Assembles object graphs from entry definitions on request.
///
/// Singletons are cached per container; everything else is rebuilt on each
/// request. A container is single-threaded: host objects are shared through
/// [`Rc`](std::rc::Rc), and every resolution takes `&mut self`.
#[derive(Debug)]
pub struct Container {
    definitions: DefinitionSet,
    registry: TypeRegistry,
    parameters: BTreeMap<String, Value>,
    options: ContainerOptions,
    instances: HashMap<String, Value>,
}

impl Container {
    /// Creates a container over already-built definitions.
    pub fn new(
        definitions: DefinitionSet,
        registry: TypeRegistry,
        parameters: impl IntoIterator<Item = (String, Value)>,
        options: ContainerOptions,
    ) -> Self {
        let parameters: BTreeMap<String, Value> = parameters.into_iter().collect();
        tracing::info!(
            entries = definitions.len(),
            types = registry.len(),
            parameters = parameters.len(),
            "container ready"
        );
        Self {
            definitions,
            registry,
            parameters,
            options,
            instances: HashMap::new(),
        }
    }

    /// Builds a container from a raw entry mapping and parameter mapping.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any entry specification is invalid.
    pub fn from_config(
        entries: &Map<String, Json>,
        parameters: &Map<String, Json>,
        registry: TypeRegistry,
        options: ContainerOptions,
    ) -> Result<Self> {
        let definitions = build_definitions(entries, options)?;
        let parameters = parameters
            .iter()
            .map(|(name, value)| (name.clone(), Value::from_json(value)));
        Ok(Self::new(definitions, registry, parameters, options))
    }

    /// Builds a container from a decoded assembly document.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any entry specification is invalid.
    pub fn from_document(document: &AssemblyDocument, registry: TypeRegistry) -> Result<Self> {
        Self::from_config(
            &document.entries,
            &document.parameters,
            registry,
            document.options,
        )
    }

    /// Returns the value for entry `id`, building whatever it needs.
    ///
    /// Singletons are served from the cache once built. Property injection
    /// for everything built by this call completes before it returns.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::Resolution`](wiring_common::error::WiringError::Resolution)
    /// wrapping the underlying failure together with the creation trace.
    /// Singletons whose properties were not fully injected are evicted, so a
    /// later request rebuilds them.
    pub fn get_instance(&mut self, id: &str) -> Result<Value> {
        tracing::debug!(id, "instance requested");
        Resolver::new(
            &self.definitions,
            &self.registry,
            &self.parameters,
            self.options,
            &mut self.instances,
        )
        .run(id)
    }

    /// Sets or replaces a parameter. Already cached singletons keep the
    /// values they were built with.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let name = name.into();
        tracing::debug!(name = %name, "parameter set");
        let _ = self.parameters.insert(name, value.into());
        self
    }

    /// Looks up a parameter.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// The definition set this container resolves against.
    #[must_use]
    pub const fn definitions(&self) -> &DefinitionSet {
        &self.definitions
    }

    /// The registered host types.
    #[must_use]
    pub const fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Options in effect.
    #[must_use]
    pub const fn options(&self) -> ContainerOptions {
        self.options
    }

    /// Returns `true` if a singleton for `id` is cached.
    #[must_use]
    pub fn is_cached(&self, id: &str) -> bool {
        self.instances.contains_key(id)
    }
}
