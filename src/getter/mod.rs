//! Memoized getters and the read view over them.

mod memo;

pub(crate) use memo::GetterCell;

use crate::error::Result;
use crate::store::Store;
use serde_json::Value;

/// Read-only view over a store's getters.
///
/// # Examples
///
/// ```
/// use modstore::Store;
/// use serde_json::json;
///
/// let store = Store::builder()
///     .state(json!({"todos": [{"done": true}, {"done": false}]}))
///     .getter("doneCount", |state| {
///         let todos = state["todos"].as_array().cloned().unwrap_or_default();
///         json!(todos.iter().filter(|t| t["done"] == json!(true)).count())
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(store.getters().get("doneCount").unwrap(), json!(1));
/// ```
pub struct Getters<'a> {
    store: &'a Store,
}

impl<'a> Getters<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Evaluate the getter registered under the fully-qualified `name`.
    pub fn get(&self, name: &str) -> Result<Value> {
        self.store.getter(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.store.registry().getter(name).is_some()
    }

    /// Fully-qualified getter names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.store.registry().getter_names()
    }
}
