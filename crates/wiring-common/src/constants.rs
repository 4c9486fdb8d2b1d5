//! System-wide constants and configuration keys.

/// Leading character reserved for ids the container generates itself.
pub const RESERVED_ID_MARKER: char = '#';

/// Prefix of entries lifted out of inline anonymous specifications.
pub const ANONYMOUS_ID_PREFIX: &str = "#anon_";

/// Prefix of entries synthesized to auto-build a registered type.
pub const AUTO_TYPE_ID_PREFIX: &str = "#type:";

/// Keys recognized inside an entry specification.
pub mod keys {
    /// Target type to construct.
    pub const CLASS: &str = "class";
    /// Binding that yields the factory object or factory type name.
    pub const FACTORY: &str = "factory";
    /// Factory method name.
    pub const METHOD: &str = "method";
    /// Literal value of an entry.
    pub const VALUE: &str = "value";
    /// Lifetime policy.
    pub const LIFETIME: &str = "lifetime";
    /// Type this entry is the fallback implementation for.
    pub const DEFAULT_FOR: &str = "default-for";
    /// Constructor or factory-method arguments.
    pub const ARGS: &str = "args";
    /// Setter-injected properties.
    pub const PROPERTIES: &str = "properties";
    /// Reference to another entry.
    pub const REF: &str = "ref";
    /// Lookup in the parameter table.
    pub const PARAM: &str = "param";
    /// Resolution through the type-default index.
    pub const INSTANCE_OF: &str = "instance-of";
}

/// Default configuration document looked up by the CLI.
pub const DEFAULT_DOCUMENT_FILE: &str = "wiring.json";

/// Application name used in CLI output.
pub const APP_NAME: &str = "wiring";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "wire";
