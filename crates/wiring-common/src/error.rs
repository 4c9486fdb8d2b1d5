//! Unified error types for the Wiring workspace.
//!
//! Configuration-time failures are raised while a definition set is being
//! built; every other variant is raised while an entry is being resolved and
//! reaches callers wrapped in [`WiringError::Resolution`].

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum WiringError {
    /// An entry specification is malformed.
    #[error("failed to build container from configuration, entry `{entry}`: {message} (spec: {spec})")]
    Configuration {
        /// Offending entry id.
        entry: String,
        /// What is wrong with the entry.
        message: String,
        /// Rendering of the raw entry specification.
        spec: String,
    },

    /// A referenced entry id has no definition.
    #[error("there is no definition for `{id}`")]
    NoDefinition {
        /// Requested entry id.
        id: String,
    },

    /// An entry was requested again while it was still being built.
    #[error("cyclic dependency detected at `{id}`: {}", path.join(" -> "))]
    CyclicDependency {
        /// Entry id that closed the cycle.
        id: String,
        /// In-flight entry ids from the outermost request to the cycle point.
        path: Vec<String>,
    },

    /// A constructor or method parameter could not be satisfied.
    #[error("there is no argument supplied for parameter `{parameter}` of `{target}`")]
    UnresolvableArgument {
        /// Type or method owning the parameter.
        target: String,
        /// Parameter name.
        parameter: String,
    },

    /// No entry is `default-for` a type and the type cannot be auto-built.
    #[error("requested instance of `{type_name}`: there is no entry with default-for satisfying it")]
    UnresolvableType {
        /// Requested type name.
        type_name: String,
    },

    /// A class entry names a type the registry does not know.
    #[error("there is no type registered with name `{type_name}`")]
    UnknownType {
        /// Requested type name.
        type_name: String,
    },

    /// A factory entry names a method the factory type does not expose.
    #[error("type `{type_name}` has no factory method `{method}`")]
    MissingMethod {
        /// Factory type name.
        type_name: String,
        /// Requested method name.
        method: String,
    },

    /// Property population targets a setter that is not registered.
    #[error("type `{type_name}` has no setter for property `{property}`")]
    MissingSetter {
        /// Type of the instance being populated.
        type_name: String,
        /// Property name.
        property: String,
    },

    /// A required parameter is absent from the parameter table.
    #[error("requested undefined parameter `{name}`")]
    UndefinedParameter {
        /// Parameter name.
        name: String,
    },

    /// A resolved argument does not have the shape a host function expects.
    #[error("argument `{name}` expected {expected}, got {actual}")]
    ArgumentType {
        /// Argument name.
        name: String,
        /// Expected shape or type name.
        expected: String,
        /// Actual shape or type name.
        actual: String,
    },

    /// A host-registered constructor, method, or setter reported a failure.
    #[error("`{target}` failed: {message}")]
    Host {
        /// Type or method that failed.
        target: String,
        /// Failure description supplied by the host.
        message: String,
    },

    /// Any failure while resolving an entry, with the creation trace.
    #[error("failed to get container instance `{id}`: {source}\ntrace:\n{trace}")]
    Resolution {
        /// Entry id requested by the caller.
        id: String,
        /// Rendered creation trace at the time of failure.
        trace: String,
        /// Underlying failure.
        #[source]
        source: Box<WiringError>,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl WiringError {
    /// Returns the innermost error, looking through [`WiringError::Resolution`] wrappers.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        let mut current = self;
        while let Self::Resolution { source, .. } = current {
            current = source;
        }
        current
    }

    /// Shorthand for a [`WiringError::Host`] failure.
    pub fn host(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Host {
            target: target.into(),
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, WiringError>;
