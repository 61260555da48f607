use super::Store;
use crate::error::Result;
use crate::getter::GetterCell;
use crate::module::ActionFuture;
use crate::runtime::DependencyContext;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) type MutationHandler = Arc<dyn Fn(&Store, &Value) -> Result<()> + Send + Sync>;
pub(crate) type ActionHandler = Arc<dyn Fn(&Store, Value) -> ActionFuture + Send + Sync>;

/// A handler plus the module path that installed it.
struct Registered<H> {
    owner: Vec<String>,
    handler: H,
}

/// Flat, fully-qualified registries of getters, mutations and actions.
///
/// Several modules may register the same mutation or action name; their
/// handlers all run, in registration order. Getter names are unique and a
/// later registration replaces an earlier one.
pub(crate) struct Registry {
    getters: RwLock<IndexMap<String, Arc<GetterCell>>>,
    mutations: RwLock<HashMap<String, Vec<Registered<MutationHandler>>>>,
    actions: RwLock<HashMap<String, Vec<Registered<ActionHandler>>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            getters: RwLock::new(IndexMap::new()),
            mutations: RwLock::new(HashMap::new()),
            actions: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a getter, returning the one it replaced.
    pub fn add_getter(&self, name: String, cell: GetterCell) -> Option<Arc<GetterCell>> {
        self.getters.write().insert(name, Arc::new(cell))
    }

    pub fn add_mutation(&self, name: String, owner: &[String], handler: MutationHandler) {
        self.mutations
            .write()
            .entry(name)
            .or_default()
            .push(Registered {
                owner: owner.to_vec(),
                handler,
            });
    }

    pub fn add_action(&self, name: String, owner: &[String], handler: ActionHandler) {
        self.actions.write().entry(name).or_default().push(Registered {
            owner: owner.to_vec(),
            handler,
        });
    }

    pub fn getter(&self, name: &str) -> Option<Arc<GetterCell>> {
        self.getters.read().get(name).cloned()
    }

    pub fn getter_names(&self) -> Vec<String> {
        self.getters.read().keys().cloned().collect()
    }

    /// Handlers for `name`, cloned out so none of the registry locks are
    /// held while they run.
    pub fn mutation_handlers(&self, name: &str) -> Vec<MutationHandler> {
        self.mutations
            .read()
            .get(name)
            .map(|entries| entries.iter().map(|e| Arc::clone(&e.handler)).collect())
            .unwrap_or_default()
    }

    pub fn action_handlers(&self, name: &str) -> Vec<ActionHandler> {
        self.actions
            .read()
            .get(name)
            .map(|entries| entries.iter().map(|e| Arc::clone(&e.handler)).collect())
            .unwrap_or_default()
    }

    /// Drop everything installed from the module at `prefix` or below it.
    pub fn remove_owned_by(&self, prefix: &[String], deps: &DependencyContext) {
        self.getters.write().retain(|_, cell| {
            let keep = !cell.owner().starts_with(prefix);
            if !keep {
                deps.remove_observer(cell.id());
            }
            keep
        });
        retain_unowned(&mut self.mutations.write(), prefix);
        retain_unowned(&mut self.actions.write(), prefix);
    }
}

fn retain_unowned<H>(entries: &mut HashMap<String, Vec<Registered<H>>>, prefix: &[String]) {
    entries.retain(|_, handlers| {
        handlers.retain(|h| !h.owner.starts_with(prefix));
        !handlers.is_empty()
    });
}
