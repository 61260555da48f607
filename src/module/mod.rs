//! Module options, the module tree, namespace resolution and installation.
//!
//! A store is composed from a tree of modules. [`ModuleTree`] mirrors the
//! nesting of [`ModuleOptions`]; installation walks that tree once, grafting
//! each module's state into the live state tree and registering its getters,
//! mutations and actions in the store's flat registries.

mod install;
mod namespace;
mod options;
mod tree;

pub(crate) use install::install_module;
pub use options::{ActionFn, ActionFuture, GetterFn, ModuleOptions, MutationFn, StateInit};
pub use tree::{ModuleRecord, ModuleTree};
