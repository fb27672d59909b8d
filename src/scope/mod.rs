//! Hierarchical dependency resolution.
//!
//! Every scoped flow owns one [`DependencyScope`]. A scope answers lookups
//! from the registrations its modules contributed and falls back to its
//! parent when a type is not registered locally, so the nearest registration
//! always wins.

mod core;
mod module;

pub use self::core::DependencyScope;
pub use module::{DependencyModule, ModuleFn, ModuleList, ObjectScope, Registrations, module_fn};
