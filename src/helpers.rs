//! Namespace-bound shortcuts over a store.
//!
//! Useful for code that works against one namespaced module and should not
//! repeat its prefix on every call.

use crate::error::Result;
use crate::store::{Dispatch, Store};
use serde_json::Value;

/// A store view that prefixes every name with one namespace.
///
/// # Examples
///
/// ```
/// use modstore::{ModuleOptions, Store};
/// use serde_json::json;
///
/// let store = Store::builder()
///     .module(
///         "cart",
///         ModuleOptions::new()
///             .namespaced(true)
///             .state(json!({"items": 0}))
///             .mutation("add", |state, _| {
///                 let n = state["items"].as_i64().unwrap_or(0);
///                 state["items"] = json!(n + 1);
///             })
///             .getter("count", |state| state["items"].clone()),
///     )
///     .build()
///     .unwrap();
///
/// let cart = store.namespaced("cart");
/// cart.commit("add", ()).unwrap();
/// assert_eq!(cart.getter("count").unwrap(), json!(1));
/// ```
#[derive(Debug, Clone)]
pub struct NamespacedHelpers<'a> {
    store: &'a Store,
    namespace: String,
}

impl<'a> NamespacedHelpers<'a> {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Fully-qualified form of a local name.
    pub fn qualify(&self, name: &str) -> String {
        format!("{}{}", self.namespace, name)
    }

    pub fn commit(&self, name: &str, payload: impl Into<Value>) -> Result<()> {
        self.store.commit(&self.qualify(name), payload)
    }

    pub fn dispatch(&self, name: &str, payload: impl Into<Value>) -> Result<Dispatch> {
        self.store.dispatch(&self.qualify(name), payload)
    }

    pub fn getter(&self, name: &str) -> Result<Value> {
        self.store.getter(&self.qualify(name))
    }

    /// Evaluate several getters, keyed by their local names.
    pub fn map_getters(&self, names: &[&str]) -> Result<Vec<(String, Value)>> {
        names
            .iter()
            .map(|name| -> Result<(String, Value)> {
                Ok((name.to_string(), self.getter(name)?))
            })
            .collect()
    }
}

impl Store {
    /// Bind `namespace` (with or without the trailing `/`). The empty
    /// namespace addresses root-level names.
    pub fn namespaced(&self, namespace: &str) -> NamespacedHelpers<'_> {
        let trimmed = namespace.trim_end_matches('/');
        let namespace = if trimmed.is_empty() {
            String::new()
        } else {
            format!("{trimmed}/")
        };
        NamespacedHelpers {
            store: self,
            namespace,
        }
    }

    /// Project top-level state keys. Missing keys map to `null`.
    pub fn map_state(&self, keys: &[&str]) -> Vec<(String, Value)> {
        let state = self.state();
        keys.iter()
            .map(|key| (key.to_string(), state.get(*key).cloned().unwrap_or(Value::Null)))
            .collect()
    }
}
