//! # wiring-definition
//!
//! Turns raw entry configuration into the static definition model.
//!
//! Handles:
//! - **Validator**: Structural checks of raw entry specifications.
//! - **Builder**: Normalization of bindings, lifting of inline anonymous
//!   entries, and the type-default index.
//! - **Model**: Entry definitions and argument bindings.
//! - **Graph**: Static construction-order analysis and cycle detection.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod builder;
pub mod graph;
pub mod model;
pub mod validator;

pub use builder::{DefinitionBuilder, DefinitionSet, build_definitions};
pub use model::{ArgumentBinding, Dependency, EntryDefinition, EntrySource, Literal, Scalar};
