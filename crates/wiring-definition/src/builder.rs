//! Lowering of raw configuration into a [`DefinitionSet`].
//!
//! Every entry spec is validated, its bindings are normalized, and inline
//! anonymous specs are lifted into synthetic per-request entries.

use std::collections::BTreeMap;

use serde_json::{Map, Value as Json};
use wiring_common::config::ContainerOptions;
use wiring_common::constants::{ANONYMOUS_ID_PREFIX, keys};
use wiring_common::error::Result;
use wiring_common::types::Lifetime;

use crate::model::{ArgumentBinding, EntryDefinition, EntrySource, Literal, Scalar};
use crate::validator::{self, config_error, has_key};

/// Immutable table of entry definitions plus the type-default index.
#[derive(Debug, Clone, Default)]
pub struct DefinitionSet {
    entries: BTreeMap<String, EntryDefinition>,
    type_defaults: BTreeMap<String, String>,
}

impl DefinitionSet {
    /// Looks up an entry by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&EntryDefinition> {
        self.entries.get(id)
    }

    /// Returns the entry registered as `default-for` a type.
    #[must_use]
    pub fn default_for(&self, type_name: &str) -> Option<&EntryDefinition> {
        self.type_defaults
            .get(type_name)
            .and_then(|id| self.entries.get(id))
    }

    /// Iterates over all entries, anonymous ones included, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &EntryDefinition> {
        self.entries.values()
    }

    /// Iterates over `(type name, entry id)` pairs of the type-default index.
    pub fn type_defaults(&self) -> impl Iterator<Item = (&str, &str)> {
        self.type_defaults
            .iter()
            .map(|(type_name, id)| (type_name.as_str(), id.as_str()))
    }

    /// Number of entries, anonymous ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds a definition set from a mapping of entry id to raw entry spec.
///
/// # Errors
///
/// Returns a configuration error for the first malformed entry.
pub fn build_definitions(
    entries: &Map<String, Json>,
    options: ContainerOptions,
) -> Result<DefinitionSet> {
    let mut builder = DefinitionBuilder::new(options);
    for (id, raw) in entries {
        builder.add_entry(id, raw)?;
    }
    let set = builder.finish();
    tracing::info!(
        entries = set.len(),
        type_defaults = set.type_defaults.len(),
        "built definition set"
    );
    Ok(set)
}

/// Incremental builder owning the anonymous-id counter.
#[derive(Debug)]
pub struct DefinitionBuilder {
    options: ContainerOptions,
    next_anonymous: usize,
    set: DefinitionSet,
}

impl DefinitionBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new(options: ContainerOptions) -> Self {
        Self {
            options,
            next_anonymous: 1,
            set: DefinitionSet::default(),
        }
    }

    /// Validates, lowers, and registers one top-level entry.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming `id` if the entry spec is malformed,
    /// or if it repeats a `default-for` type while duplicates are forbidden.
    pub fn add_entry(&mut self, id: &str, raw: &Json) -> Result<()> {
        validator::validate_id(id, raw)?;
        let spec = validator::validate_spec(id, raw)?;
        let lifetime = validator::parse_lifetime(id, raw, spec)?;
        let default_for = validator::parse_default_for(id, raw, spec)?;

        let definition = self.lower_entry(id, id, raw, spec, lifetime, default_for.clone())?;
        if let Some(type_name) = default_for {
            self.register_default(id, raw, type_name)?;
        }
        tracing::debug!(id, lifetime = %definition.lifetime, "registered entry");
        let _ = self.set.entries.insert(id.to_owned(), definition);
        Ok(())
    }

    /// Consumes the builder and returns the finished set.
    #[must_use]
    pub fn finish(self) -> DefinitionSet {
        self.set
    }

    fn register_default(&mut self, id: &str, raw: &Json, type_name: String) -> Result<()> {
        if let Some(previous) = self.set.type_defaults.get(&type_name) {
            if self.options.forbid_duplicate_defaults {
                return Err(config_error(
                    id,
                    raw,
                    format!("`{previous}` is already default-for `{type_name}`"),
                ));
            }
            tracing::warn!(
                type_name = %type_name,
                previous = %previous,
                replacement = id,
                "default-for registered twice, last entry wins"
            );
        }
        let _ = self.set.type_defaults.insert(type_name, id.to_owned());
        Ok(())
    }

    /// Lowers a validated spec. `owner` is the top-level entry used in errors.
    fn lower_entry(
        &mut self,
        owner: &str,
        id: &str,
        raw: &Json,
        spec: &Map<String, Json>,
        lifetime: Lifetime,
        default_for: Option<String>,
    ) -> Result<EntryDefinition> {
        let source = if let Some(type_name) = spec.get(keys::CLASS).and_then(Json::as_str) {
            EntrySource::Class(type_name.to_owned())
        } else if has_key(spec, keys::FACTORY) {
            let method = spec
                .get(keys::METHOD)
                .and_then(Json::as_str)
                .ok_or_else(|| config_error(owner, raw, "factory method must be a string"))?;
            EntrySource::Factory {
                factory: self.lower_binding(owner, &spec[keys::FACTORY])?,
                method: method.to_owned(),
            }
        } else {
            EntrySource::Value(self.lower_binding(owner, &spec[keys::VALUE])?)
        };

        let mut arguments = BTreeMap::new();
        if let Some(args) = spec.get(keys::ARGS).and_then(Json::as_object) {
            for (name, value) in args {
                let _ = arguments.insert(name.clone(), self.lower_binding(owner, value)?);
            }
        }

        let mut properties = Vec::new();
        if let Some(props) = spec.get(keys::PROPERTIES).and_then(Json::as_object) {
            for (name, value) in props {
                properties.push((name.clone(), self.lower_binding(owner, value)?));
            }
        }

        Ok(EntryDefinition {
            id: id.to_owned(),
            source,
            lifetime,
            default_for,
            arguments,
            properties,
        })
    }

    /// Normalizes one raw argument, property, value, or factory binding.
    fn lower_binding(&mut self, owner: &str, raw: &Json) -> Result<ArgumentBinding> {
        let binding = match raw {
            Json::Null => ArgumentBinding::Literal(Literal::Scalar(Scalar::Null)),
            Json::Bool(b) => ArgumentBinding::Literal(Literal::Scalar(Scalar::Bool(*b))),
            Json::Number(n) => ArgumentBinding::Literal(Literal::Scalar(
                n.as_i64()
                    .map_or_else(|| Scalar::Float(n.as_f64().unwrap_or(f64::NAN)), Scalar::Int),
            )),
            Json::String(s) => ArgumentBinding::Literal(Literal::Text(s.clone())),
            Json::Array(items) => ArgumentBinding::Literal(Literal::List(
                items
                    .iter()
                    .map(|item| self.lower_binding(owner, item))
                    .collect::<Result<_>>()?,
            )),
            Json::Object(map) => {
                if [keys::CLASS, keys::FACTORY, keys::VALUE]
                    .into_iter()
                    .any(|key| has_key(map, key))
                {
                    ArgumentBinding::Reference(self.lift_anonymous(owner, raw)?)
                } else if let Some(binding) = single_key_binding(owner, raw, map)? {
                    binding
                } else {
                    let mut entries = Vec::with_capacity(map.len());
                    for (key, value) in map {
                        entries.push((key.clone(), self.lower_binding(owner, value)?));
                    }
                    ArgumentBinding::Literal(Literal::Map(entries))
                }
            }
        };
        Ok(binding)
    }

    /// Registers an inline spec as its own per-request entry and returns its id.
    fn lift_anonymous(&mut self, owner: &str, raw: &Json) -> Result<String> {
        let spec = validator::validate_spec(owner, raw)?;
        let id = format!("{ANONYMOUS_ID_PREFIX}{}", self.next_anonymous);
        self.next_anonymous += 1;
        let definition = self.lower_entry(owner, &id, raw, spec, Lifetime::PerRequest, None)?;
        tracing::debug!(owner, id = %id, "lifted anonymous entry");
        let _ = self.set.entries.insert(id.clone(), definition);
        Ok(id)
    }
}

/// Recognizes `{ref: id}`, `{param: name}`, and `{instance-of: type}`.
fn single_key_binding(
    owner: &str,
    raw: &Json,
    map: &Map<String, Json>,
) -> Result<Option<ArgumentBinding>> {
    let mut iter = map.iter();
    let (Some((key, value)), None) = (iter.next(), iter.next()) else {
        return Ok(None);
    };
    let make: fn(String) -> ArgumentBinding = match key.as_str() {
        keys::REF => ArgumentBinding::Reference,
        keys::PARAM => ArgumentBinding::Parameter,
        keys::INSTANCE_OF => ArgumentBinding::TypeDefault,
        _ => return Ok(None),
    };
    let name = value
        .as_str()
        .ok_or_else(|| config_error(owner, raw, format!("`{key}` must name a string")))?;
    Ok(Some(make(name.to_owned())))
}
