//! # wiring-runtime
//!
//! Resolves entry definitions into live object graphs.
//!
//! Handles:
//! - **Registry**: Host types registered with constructors, factory
//!   methods, and setters in place of runtime reflection.
//! - **Container**: Singleton cache, parameters, and the public
//!   `get_instance` entry point.
//! - **Engine**: Depth-first construction, type-default fallback, and
//!   deferred property injection.
//! - **Context**: Cycle detection and the creation trace of one request.
//! - **Interpolation**: `{$name}` substitution in literal text.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod container;
mod context;
mod engine;
pub mod interpolate;
pub mod registry;

pub use container::Container;
pub use registry::{Arguments, Param, TypeBinding, TypeRegistry};
