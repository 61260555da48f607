//! The observable state tree.
//!
//! State is a dynamic `serde_json::Value` tree. [`ReactiveState`] owns the
//! live root and reports every write so memoized getters can be invalidated
//! and strict mode can check the committing window.

pub mod path;
mod reactive;

pub use path::{IntoModulePath, StatePath};
pub use reactive::ReactiveState;
