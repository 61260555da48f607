use super::store::{Plugin, Store, StoreConfig};
use crate::error::{Result, StoreError};
use crate::module::ModuleOptions;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Collects the root module, store settings and plugins.
///
/// The module methods delegate to the root [`ModuleOptions`].
#[derive(Default)]
pub struct StoreBuilder {
    root: ModuleOptions,
    config: StoreConfig,
    plugins: Vec<Plugin>,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the root module options wholesale.
    pub fn root(mut self, options: ModuleOptions) -> Self {
        self.root = options;
        self
    }

    pub fn state(mut self, state: Value) -> Self {
        self.root = self.root.state(state);
        self
    }

    pub fn state_fn<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.root = self.root.state_fn(factory);
        self
    }

    pub fn getter<F>(mut self, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.root = self.root.getter(name, getter);
        self
    }

    pub fn mutation<F>(mut self, name: impl Into<String>, mutation: F) -> Self
    where
        F: Fn(&mut Value, &Value) + Send + Sync + 'static,
    {
        self.root = self.root.mutation(name, mutation);
        self
    }

    pub fn action<F, Fut>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(Store, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, StoreError>> + Send + 'static,
    {
        self.root = self.root.action(name, action);
        self
    }

    pub fn module(mut self, name: impl Into<String>, module: ModuleOptions) -> Self {
        self.root = self.root.module(name, module);
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a plugin. Plugins run once, in the order added, at the end of
    /// [`build`](Self::build).
    pub fn plugin<F>(mut self, plugin: F) -> Self
    where
        F: Fn(&Store) + Send + Sync + 'static,
    {
        self.plugins.push(Arc::new(plugin));
        self
    }

    /// Build the module tree, install it and run the plugins.
    pub fn build(self) -> Result<Store> {
        Store::construct(self.root, self.config, &self.plugins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_deserializes_with_defaults() {
        let config: StoreConfig = serde_json::from_value(json!({})).unwrap();
        assert!(!config.strict);

        let config: StoreConfig = serde_json::from_value(json!({"strict": true})).unwrap();
        let store = StoreBuilder::new().config(config).build().unwrap();
        assert!(store.is_strict());
    }

    #[test]
    fn root_state_defaults_to_empty_object() {
        let store = StoreBuilder::new().build().unwrap();
        assert_eq!(*store.state(), json!({}));
    }
}
