use crate::error::StoreError;
use crate::store::Store;
use futures::future::BoxFuture;
use futures::FutureExt;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Getter body: projects the module's local state.
pub type GetterFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Mutation body: edits the module's local state with a payload.
pub type MutationFn = Arc<dyn Fn(&mut Value, &Value) + Send + Sync>;

/// Future returned by an action handler.
pub type ActionFuture = BoxFuture<'static, Result<Value, StoreError>>;

/// Action body: receives the whole store and the payload.
pub type ActionFn = Arc<dyn Fn(Store, Value) -> ActionFuture + Send + Sync>;

/// Initial state of a module.
#[derive(Clone)]
pub enum StateInit {
    Value(Value),
    /// Called once per record built, so reused options get fresh state.
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl StateInit {
    pub(crate) fn resolve(&self) -> Value {
        match self {
            StateInit::Value(value) => value.clone(),
            StateInit::Factory(factory) => factory(),
        }
    }
}

/// User-supplied description of a module: its state, getters, mutations,
/// actions and nested modules.
///
/// Declaration order is preserved. Declaring the same name twice replaces the
/// earlier declaration in place.
///
/// # Examples
///
/// ```
/// use modstore::ModuleOptions;
/// use serde_json::json;
///
/// let counter = ModuleOptions::new()
///     .namespaced(true)
///     .state(json!({"age": 18}))
///     .mutation("increment", |state, n| {
///         let age = state["age"].as_i64().unwrap_or(0);
///         state["age"] = json!(age + n.as_i64().unwrap_or(0));
///     })
///     .getter("isAdult", |state| json!(state["age"].as_i64() >= Some(18)));
/// ```
#[derive(Clone, Default)]
pub struct ModuleOptions {
    pub(crate) state: Option<StateInit>,
    pub(crate) namespaced: bool,
    pub(crate) getters: IndexMap<String, GetterFn>,
    pub(crate) mutations: IndexMap<String, MutationFn>,
    pub(crate) actions: IndexMap<String, ActionFn>,
    pub(crate) modules: IndexMap<String, ModuleOptions>,
}

impl ModuleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial state, cloned into every record built from these options.
    pub fn state(mut self, state: Value) -> Self {
        self.state = Some(StateInit::Value(state));
        self
    }

    /// Initial state produced by a factory.
    pub fn state_fn<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.state = Some(StateInit::Factory(Arc::new(factory)));
        self
    }

    /// Prefix this module's getters, mutations and actions with its name.
    pub fn namespaced(mut self, namespaced: bool) -> Self {
        self.namespaced = namespaced;
        self
    }

    pub fn getter<F>(mut self, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.getters.insert(name.into(), Arc::new(getter));
        self
    }

    pub fn mutation<F>(mut self, name: impl Into<String>, mutation: F) -> Self
    where
        F: Fn(&mut Value, &Value) + Send + Sync + 'static,
    {
        self.mutations.insert(name.into(), Arc::new(mutation));
        self
    }

    /// Declare an action.
    ///
    /// The handler is called synchronously by `dispatch`; the future it
    /// returns is driven by whoever awaits the dispatch.
    pub fn action<F, Fut>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(Store, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, StoreError>> + Send + 'static,
    {
        let handler: ActionFn =
            Arc::new(move |store: Store, payload: Value| action(store, payload).boxed());
        self.actions.insert(name.into(), handler);
        self
    }

    /// Nest a child module under `name`.
    pub fn module(mut self, name: impl Into<String>, module: ModuleOptions) -> Self {
        self.modules.insert(name.into(), module);
        self
    }

    pub fn is_namespaced(&self) -> bool {
        self.namespaced
    }

    pub(crate) fn initial_state(&self) -> Value {
        self.state
            .as_ref()
            .map(StateInit::resolve)
            .unwrap_or_else(|| Value::Object(Default::default()))
    }
}

impl fmt::Debug for ModuleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleOptions")
            .field("namespaced", &self.namespaced)
            .field("getters", &self.getters.keys().collect::<Vec<_>>())
            .field("mutations", &self.mutations.keys().collect::<Vec<_>>())
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("modules", &self.modules)
            .finish()
    }
}
