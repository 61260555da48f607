use super::builder::StoreBuilder;
use super::dispatch::Dispatch;
use super::registry::Registry;
use crate::error::{Result, StoreError};
use crate::getter::Getters;
use crate::module::{install_module, ModuleOptions, ModuleRecord, ModuleTree};
use crate::state::{IntoModulePath, ReactiveState};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Function run once with the fully constructed store.
pub type Plugin = Arc<dyn Fn(&Store) + Send + Sync>;

type Subscriber = Arc<dyn Fn(&MutationRecord, &Value) + Send + Sync>;

/// Descriptor handed to subscribers after a mutation handler has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRecord {
    /// Fully-qualified mutation name.
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Value,
}

/// Handle returned by [`Store::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

/// A state write observed outside of a committing window while strict mode
/// is on. Reported, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrictModeViolation {
    pub path: Vec<String>,
}

impl fmt::Display for StrictModeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state at [{}] written outside of a mutation", self.path.join("/"))
    }
}

/// Store-level settings that can be loaded from configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Report every state write made outside a mutation.
    pub strict: bool,
}

struct StoreInner {
    strict: bool,
    committing: Arc<AtomicBool>,
    state: ReactiveState,
    modules: RwLock<ModuleTree>,
    registry: Registry,
    subscribers: RwLock<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: AtomicUsize,
    violations: Arc<Mutex<Vec<StrictModeViolation>>>,
}

/// Restores the previous committing flag on drop, so nested commits never
/// close the outer window early.
struct CommitGuard<'a> {
    flag: &'a AtomicBool,
    previous: bool,
}

impl<'a> CommitGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        let previous = flag.swap(true, Ordering::SeqCst);
        Self { flag, previous }
    }
}

impl Drop for CommitGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(self.previous, Ordering::SeqCst);
    }
}

/// A hierarchical state container.
///
/// State changes only through named, synchronous mutations (`commit`);
/// asynchronous work is orchestrated by named actions (`dispatch`). Getters
/// are memoized projections recomputed only after a write to the state they
/// read. `Store` is a cheap handle: clones share the same state.
///
/// # Examples
///
/// ```
/// use modstore::{ModuleOptions, Store};
/// use serde_json::json;
///
/// let store = Store::builder()
///     .module(
///         "a",
///         ModuleOptions::new()
///             .namespaced(true)
///             .state(json!({"age": 18}))
///             .mutation("increment", |state, n| {
///                 let age = state["age"].as_i64().unwrap_or(0);
///                 state["age"] = json!(age + n.as_i64().unwrap_or(0));
///             }),
///     )
///     .build()
///     .unwrap();
///
/// store.commit("a/increment", 5).unwrap();
/// assert_eq!(store.state()["a"]["age"], 23);
/// assert!(store.commit("increment", 5).is_err());
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    pub(crate) fn construct(
        root: ModuleOptions,
        config: StoreConfig,
        plugins: &[Plugin],
    ) -> Result<Self> {
        let tree = ModuleTree::new(root);
        let state = ReactiveState::new(tree.root().state().clone());
        let store = Store {
            inner: Arc::new(StoreInner {
                strict: config.strict,
                committing: Arc::new(AtomicBool::new(false)),
                state,
                modules: RwLock::new(tree),
                registry: Registry::new(),
                subscribers: RwLock::new(Vec::new()),
                next_subscription: AtomicUsize::new(0),
                violations: Arc::new(Mutex::new(Vec::new())),
            }),
        };

        {
            let tree = store.inner.modules.read();
            store.with_commit(|| install_module(&store, &tree, &[], tree.root()))?;
        }

        if config.strict {
            store.enforce_strict_mode();
        }

        tracing::debug!(strict = config.strict, plugins = plugins.len(), "store constructed");
        for plugin in plugins {
            plugin(&store);
        }
        Ok(store)
    }

    fn enforce_strict_mode(&self) {
        let committing = Arc::clone(&self.inner.committing);
        let violations = Arc::clone(&self.inner.violations);
        self.inner.state.watch(move |path| {
            if !committing.load(Ordering::SeqCst) {
                let violation = StrictModeViolation {
                    path: path.to_vec(),
                };
                tracing::error!(%violation, "strict mode violation");
                violations.lock().push(violation);
            }
        });
    }

    fn with_commit<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = CommitGuard::enter(&self.inner.committing);
        f()
    }

    /// Snapshot of the root state.
    pub fn state(&self) -> Arc<Value> {
        self.inner.state.read()
    }

    pub fn getters(&self) -> Getters<'_> {
        Getters::new(self)
    }

    /// Evaluate the getter registered under the fully-qualified `name`.
    pub fn getter(&self, name: &str) -> Result<Value> {
        let cell = self
            .inner
            .registry
            .getter(name)
            .ok_or_else(|| StoreError::UnknownGetter(name.to_string()))?;
        Ok(cell.get(&self.inner.state))
    }

    /// Apply every mutation handler registered under `kind`, in registration
    /// order, inside a committing window.
    ///
    /// Subscribers are notified after each handler's write, so a name shared
    /// by N modules produces N notifications.
    pub fn commit(&self, kind: &str, payload: impl Into<Value>) -> Result<()> {
        let handlers = self.inner.registry.mutation_handlers(kind);
        if handlers.is_empty() {
            return Err(StoreError::UnknownMutation(kind.to_string()));
        }
        let payload = payload.into();
        tracing::debug!(mutation = kind, handlers = handlers.len(), "commit");

        self.with_commit(|| -> Result<()> {
            for handler in &handlers {
                handler(self, &payload)?;
            }
            Ok(())
        })
    }

    /// Invoke every action handler registered under `kind`, in registration
    /// order.
    ///
    /// Handlers are called and their futures polled once before this
    /// returns, so everything an action does before its first suspension
    /// point has already happened. The returned [`Dispatch`] resolves once
    /// all of them have settled; dropping it abandons only the work still
    /// suspended.
    pub fn dispatch(&self, kind: &str, payload: impl Into<Value>) -> Result<Dispatch> {
        let handlers = self.inner.registry.action_handlers(kind);
        if handlers.is_empty() {
            return Err(StoreError::UnknownAction(kind.to_string()));
        }
        let payload = payload.into();
        tracing::debug!(action = kind, handlers = handlers.len(), "dispatch");

        let pending = handlers
            .iter()
            .map(|handler| handler(self, payload.clone()))
            .collect();
        Ok(Dispatch::new(kind, pending))
    }

    /// Register a listener called after every mutation handler runs.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&MutationRecord, &Value) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_subscription.fetch_add(1, Ordering::SeqCst));
        let listener: Subscriber = Arc::new(listener);
        self.inner.subscribers.write().push((id, listener));
        id
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.inner.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        subscribers.len() != before
    }

    pub(crate) fn notify_subscribers(&self, mutation: &MutationRecord) {
        let subscribers: Vec<Subscriber> = self
            .inner
            .subscribers
            .read()
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect();
        if subscribers.is_empty() {
            return;
        }

        let state = self.state();
        for subscriber in subscribers {
            subscriber(mutation, state.as_ref());
        }
    }

    /// Swap the whole root state.
    pub fn replace_state(&self, state: Value) {
        self.with_commit(|| self.inner.state.replace(state));
        tracing::debug!("state replaced");
    }

    /// Write the root state directly, outside any mutation.
    ///
    /// Under strict mode this is reported as a [`StrictModeViolation`]
    /// unless it happens inside a committing window.
    pub fn with_state_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Value) -> R,
    {
        self.inner.state.write_root(f)
    }

    /// Add a module at `path` after construction.
    ///
    /// The parent module must exist. Registering over an existing module
    /// replaces it: everything the old subtree installed is removed before
    /// the new one is installed, and its state is grafted afresh. A
    /// registration that cannot be grafted fails before the old module is
    /// removed, so it stays installed.
    pub fn register_module(&self, path: impl IntoModulePath, options: ModuleOptions) -> Result<()> {
        let path = path.into_module_path();
        if path.is_empty() {
            return Err(StoreError::invalid_path(&path, "cannot register the root module"));
        }

        let record = ModuleRecord::build(options);
        self.with_commit(|| -> Result<()> {
            let mut tree = self.inner.modules.write();
            let (name, parent) = path
                .split_last()
                .ok_or_else(|| StoreError::invalid_path(&path, "cannot register the root module"))?;
            if tree.get(parent).is_none() {
                return Err(StoreError::invalid_path(&path, "parent module does not exist"));
            }
            // Anything that would stop the graft fails here, before an
            // existing module at this path is touched.
            self.inner.state.check_graft(parent, name)?;
            record.check_nesting(&path)?;

            if tree.get(&path).is_some() {
                self.inner
                    .registry
                    .remove_owned_by(&path, self.inner.state.context());
            }
            tree.insert(&path, record)?;
            let installed = match tree.get(&path) {
                Some(record) => install_module(self, &tree, &path, record),
                None => Err(StoreError::invalid_path(&path, "module vanished during registration")),
            };
            if installed.is_err() {
                // Leave no half-installed module behind
                let _ = tree.unregister(&path);
                self.inner
                    .registry
                    .remove_owned_by(&path, self.inner.state.context());
            }
            installed
        })?;

        tracing::debug!(module = %path.join("/"), "module registered");
        Ok(())
    }

    /// Remove the module at `path`, everything it registered and its state.
    pub fn unregister_module(&self, path: impl IntoModulePath) -> Result<()> {
        let path = path.into_module_path();
        self.with_commit(|| {
            self.inner.modules.write().unregister(&path)?;
            self.inner
                .registry
                .remove_owned_by(&path, self.inner.state.context());
            if let Some((name, parent)) = path.split_last() {
                self.inner.state.remove_property(parent, name);
            }
            Ok::<_, StoreError>(())
        })?;

        tracing::debug!(module = %path.join("/"), "module unregistered");
        Ok(())
    }

    pub fn has_module(&self, path: impl IntoModulePath) -> bool {
        self.inner
            .modules
            .read()
            .get(&path.into_module_path())
            .is_some()
    }

    /// True while a mutation, state replacement or module registration is
    /// being applied.
    pub fn is_committing(&self) -> bool {
        self.inner.committing.load(Ordering::SeqCst)
    }

    pub fn is_strict(&self) -> bool {
        self.inner.strict
    }

    /// Strict-mode violations observed so far, oldest first.
    pub fn strict_violations(&self) -> Vec<StrictModeViolation> {
        self.inner.violations.lock().clone()
    }

    /// Drain the recorded strict-mode violations, oldest first.
    ///
    /// Long-running strict stores should call this periodically; the list
    /// is otherwise kept for the life of the store.
    pub fn take_strict_violations(&self) -> Vec<StrictModeViolation> {
        std::mem::take(&mut *self.inner.violations.lock())
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub(crate) fn state_core(&self) -> &ReactiveState {
        &self.inner.state
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("strict", &self.inner.strict)
            .field("committing", &self.is_committing())
            .field("getters", &self.inner.registry.getter_names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn counter() -> ModuleOptions {
        ModuleOptions::new()
            .state(json!({"count": 0}))
            .mutation("increment", |state, n| {
                let count = state["count"].as_i64().unwrap_or(0);
                state["count"] = json!(count + n.as_i64().unwrap_or(1));
            })
    }

    #[test]
    fn commit_guard_restores_previous_flag() {
        let flag = AtomicBool::new(false);
        {
            let _outer = CommitGuard::enter(&flag);
            {
                let _inner = CommitGuard::enter(&flag);
                assert!(flag.load(Ordering::SeqCst));
            }
            // Inner exit must not close the outer window
            assert!(flag.load(Ordering::SeqCst));
        }
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[test]
    fn committing_only_inside_mutation() {
        let store = Store::builder().root(counter()).build().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let handle = store.clone();
        store.subscribe(move |_, _| seen_clone.lock().push(handle.is_committing()));

        assert!(!store.is_committing());
        store.commit("increment", 1).unwrap();
        assert!(!store.is_committing());
        assert_eq!(*seen.lock(), vec![true]);
    }

    #[test]
    fn reentrant_commit_from_subscriber() {
        let store = Store::builder()
            .state(json!({"count": 0, "echo": 0}))
            .mutation("increment", |state, _| {
                let count = state["count"].as_i64().unwrap_or(0);
                state["count"] = json!(count + 1);
            })
            .mutation("echo", |state, payload| state["echo"] = payload.clone())
            .build()
            .unwrap();

        let handle = store.clone();
        store.subscribe(move |mutation, state| {
            if mutation.kind == "increment" {
                handle.commit("echo", state["count"].clone()).unwrap();
                assert!(handle.is_committing());
            }
        });

        store.commit("increment", ()).unwrap();
        assert_eq!(*store.state(), json!({"count": 1, "echo": 1}));
        assert!(!store.is_committing());
    }

    #[test]
    fn strict_mode_reports_direct_writes_only() {
        let store = Store::builder().root(counter()).strict(true).build().unwrap();

        store.commit("increment", 2).unwrap();
        store.replace_state(json!({"count": 10}));
        assert!(store.strict_violations().is_empty());

        let value = store.with_state_mut(|state| {
            state["count"] = json!(99);
            7
        });
        assert_eq!(value, 7);
        assert_eq!(store.state()["count"], 99);
        assert_eq!(
            store.strict_violations(),
            vec![StrictModeViolation { path: vec![] }]
        );
    }

    #[test]
    fn non_strict_store_records_nothing() {
        let store = Store::builder().root(counter()).build().unwrap();
        store.with_state_mut(|state| state["count"] = json!(5));
        assert!(store.strict_violations().is_empty());
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let store = Store::builder().root(counter()).build().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let id = store.subscribe(move |_, _| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        store.commit("increment", 1).unwrap();
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.commit("increment", 1).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn plugins_run_once_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let first = order.clone();
        let second = order.clone();
        let store = Store::builder()
            .root(counter())
            .plugin(move |store| first.lock().push(("first", store.state()["count"].clone())))
            .plugin(move |store| {
                store.replace_state(json!({"count": 3}));
                second.lock().push(("second", store.state()["count"].clone()));
            })
            .build()
            .unwrap();

        assert_eq!(
            *order.lock(),
            vec![("first", json!(0)), ("second", json!(3))]
        );
        assert_eq!(store.state()["count"], 3);
    }

    #[test]
    fn mutation_on_removed_state_fails() {
        let store = Store::builder()
            .module("a", counter())
            .build()
            .unwrap();
        store.replace_state(json!({}));
        assert_eq!(
            store.commit("increment", 1),
            Err(StoreError::StateNotFound {
                path: vec!["a".to_string()]
            })
        );
    }

    #[test]
    fn unregister_removes_state_and_handlers() {
        let store = Store::builder()
            .module(
                "a",
                counter().getter("count", |state| state["count"].clone()),
            )
            .build()
            .unwrap();

        store.unregister_module("a").unwrap();
        assert!(!store.has_module("a"));
        assert_eq!(*store.state(), json!({}));
        assert!(matches!(
            store.commit("increment", 1),
            Err(StoreError::UnknownMutation(_))
        ));
        assert!(!store.getters().contains("count"));
        assert!(matches!(
            store.unregister_module("a"),
            Err(StoreError::InvalidPath { .. })
        ));
    }

    #[test]
    fn failed_registration_leaves_no_module() {
        let store = Store::builder()
            .module("a", counter())
            .build()
            .unwrap();
        store.replace_state(json!({}));

        // Parent module exists but its state was replaced away
        let err = store
            .register_module(["a", "b"], counter())
            .unwrap_err();
        assert!(matches!(err, StoreError::ModuleInstall { .. }));
        assert!(!store.has_module("a/b"));
        assert!(store.has_module("a"));
    }

    #[test]
    fn failed_reregistration_keeps_existing_module() {
        let store = Store::builder()
            .module("a", ModuleOptions::new().module("b", counter()))
            .build()
            .unwrap();
        store.replace_state(json!({"a": 5}));

        let err = store
            .register_module(["a", "b"], ModuleOptions::new().state(json!({"count": 100})))
            .unwrap_err();
        assert!(matches!(err, StoreError::ModuleInstall { .. }));
        assert!(store.has_module("a/b"));
        // The old handler is still registered; only its state is gone
        assert_eq!(
            store.commit("increment", 1),
            Err(StoreError::StateNotFound {
                path: vec!["a".to_string(), "b".to_string()]
            })
        );
        assert_eq!(*store.state(), json!({"a": 5}));
    }

    #[test]
    fn nested_module_under_scalar_state_is_rejected_up_front() {
        let store = Store::builder().module("a", counter()).build().unwrap();
        let before = store.state();

        let err = store
            .register_module(
                "a",
                ModuleOptions::new()
                    .state(json!(1))
                    .module("inner", counter()),
            )
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::ModuleInstall {
                path: vec!["a".to_string(), "inner".to_string()],
                reason: "parent state is not an object".to_string(),
            }
        );
        assert_eq!(store.state(), before);
        store.commit("increment", 1).unwrap();
        assert_eq!(store.state()["a"]["count"], 1);
    }

    #[test]
    fn module_grafting_is_not_a_strict_violation() {
        let store = Store::builder()
            .module("a", ModuleOptions::new().module("b", counter()))
            .strict(true)
            .build()
            .unwrap();
        store.register_module(["a", "c"], counter()).unwrap();
        store.register_module(["a", "c"], counter()).unwrap();
        store.unregister_module(["a", "c"]).unwrap();

        assert!(store.has_module("a/b"));
        assert!(store.strict_violations().is_empty());
    }

    #[test]
    fn take_strict_violations_drains_the_list() {
        let store = Store::builder().root(counter()).strict(true).build().unwrap();
        store.with_state_mut(|state| state["count"] = json!(1));
        store.with_state_mut(|state| state["count"] = json!(2));

        assert_eq!(store.take_strict_violations().len(), 2);
        assert!(store.take_strict_violations().is_empty());
        assert!(store.strict_violations().is_empty());

        store.with_state_mut(|state| state["count"] = json!(3));
        assert_eq!(store.strict_violations().len(), 1);
    }
}
