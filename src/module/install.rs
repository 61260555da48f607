use super::tree::{ModuleRecord, ModuleTree};
use crate::error::Result;
use crate::getter::GetterCell;
use crate::store::{MutationRecord, Store};
use serde_json::Value;
use std::sync::Arc;

/// Install `record` (found at `path` in `tree`) and all of its descendants
/// into `store`.
///
/// For a non-root module the record's state is grafted into its parent's
/// state as a tracked property. Getters, mutations and actions are then
/// registered under the module's namespace, and children are installed in
/// declaration order. Handlers resolve the module's local state by path on
/// every call rather than holding on to it.
pub(crate) fn install_module(
    store: &Store,
    tree: &ModuleTree,
    path: &[String],
    record: &ModuleRecord,
) -> Result<()> {
    let namespace = tree.namespace(path)?;
    let registry = store.registry();
    let state = store.state_core();

    if let Some((name, parent)) = path.split_last() {
        state.add_tracked_property(parent, name, record.state().clone())?;
    }

    let options = record.options();

    for (name, getter) in &options.getters {
        let kind = format!("{namespace}{name}");
        let cell = GetterCell::new(kind.clone(), path.to_vec(), Arc::clone(getter), state);
        if let Some(previous) = registry.add_getter(kind.clone(), cell) {
            state.context().remove_observer(previous.id());
            tracing::warn!(getter = %kind, "getter re-registered, previous definition replaced");
        }
    }

    for (name, mutation) in &options.mutations {
        let kind = format!("{namespace}{name}");
        let local = path.to_vec();
        let mutation = Arc::clone(mutation);
        let record_kind = kind.clone();
        registry.add_mutation(
            kind,
            path,
            Arc::new(move |store: &Store, payload: &Value| -> Result<()> {
                store
                    .state_core()
                    .write(&local, |state| mutation(state, payload))?;
                store.notify_subscribers(&MutationRecord {
                    kind: record_kind.clone(),
                    payload: payload.clone(),
                });
                Ok(())
            }),
        );
    }

    for (name, action) in &options.actions {
        let action = Arc::clone(action);
        registry.add_action(
            format!("{namespace}{name}"),
            path,
            Arc::new(move |store: &Store, payload: Value| action(store.clone(), payload)),
        );
    }

    tracing::debug!(
        module = %path.join("/"),
        namespace = %namespace,
        getters = options.getters.len(),
        mutations = options.mutations.len(),
        actions = options.actions.len(),
        "module installed"
    );

    let mut child_path = path.to_vec();
    for (name, child) in record.children() {
        child_path.push(name.to_string());
        install_module(store, tree, &child_path, child)?;
        child_path.pop();
    }
    Ok(())
}
