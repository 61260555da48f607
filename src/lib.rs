//! # Modstore
//!
//! A hierarchical, observable state store for Rust.
//!
//! A single store holds a tree of application state composed from
//! independently written modules:
//!
//! ## Modules
//!
//! - [`ModuleOptions`] - state, getters, mutations, actions and child modules
//! - Namespaced modules prefix their names with their own name (`a/increment`)
//! - Modules can be registered and unregistered after construction
//!
//! ## Store
//!
//! - [`Store::commit`] - the only sanctioned way to change state, synchronous
//! - [`Store::dispatch`] - actions that may do asynchronous work and commit
//! - Memoized getters recomputed only after writes to the state they read
//! - Subscribers and plugins observe every applied mutation
//! - Strict mode reports state writes made outside a mutation

pub mod error;
pub mod getter;
pub mod helpers;
pub mod module;
mod runtime;
pub mod state;
pub mod store;

// Re-export main types for convenience
pub use error::{Result, StoreError};
pub use getter::Getters;
pub use helpers::NamespacedHelpers;
pub use module::{ModuleOptions, ModuleRecord, ModuleTree};
pub use state::IntoModulePath;
pub use store::{
    Dispatch, MutationRecord, Plugin, Store, StoreBuilder, StoreConfig, StrictModeViolation,
    SubscriptionId,
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn it_works() {
        // Basic smoke test
        let store = Store::builder()
            .state(json!({"count": 0}))
            .mutation("increment", |state, _| {
                let count = state["count"].as_i64().unwrap_or(0);
                state["count"] = json!(count + 1);
            })
            .build()
            .unwrap();
        assert_eq!(store.state()["count"], 0);
        store.commit("increment", ()).unwrap();
        assert_eq!(store.state()["count"], 1);
    }
}
