use crate::module::GetterFn;
use crate::state::path::walk;
use crate::state::ReactiveState;
use parking_lot::Mutex;
use serde_json::Value;

static NULL: Value = Value::Null;

/// A registered getter: a memoized projection of one module's local state.
///
/// The local state is looked up by path on every recomputation, so the
/// getter keeps working after the subtree is swapped by `replace_state`.
pub(crate) struct GetterCell {
    id: usize,
    name: String,
    owner: Vec<String>,
    compute: GetterFn,
    cached: Mutex<Option<Value>>,
}

impl GetterCell {
    pub fn new(name: String, owner: Vec<String>, compute: GetterFn, state: &ReactiveState) -> Self {
        let deps = state.context();
        let id = deps.next_id();

        // Register this as a memo with the dependency context
        deps.register_memo(id);

        Self {
            id,
            name,
            owner,
            compute,
            cached: Mutex::new(None),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Module path this getter was installed from.
    pub fn owner(&self) -> &[String] {
        &self.owner
    }

    /// Get the current value, recomputing if necessary.
    pub fn get(&self, state: &ReactiveState) -> Value {
        let deps = state.context();

        if !deps.is_memo_dirty(self.id) {
            if let Some(value) = self.cached.lock().as_ref() {
                return value.clone();
            }
        }

        // Recompute within observer context to track dependencies
        let value = deps.with_observer(self.id, || {
            let root = state.tracked_read(&self.owner);
            let local = walk(&root, &self.owner).unwrap_or(&NULL);
            (self.compute)(local)
        });
        tracing::trace!(getter = %self.name, "getter recomputed");

        *self.cached.lock() = Some(value.clone());
        deps.mark_memo_clean(self.id);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_cell(
        owner: &[&str],
        state: &ReactiveState,
    ) -> (GetterCell, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let runs_clone = runs.clone();
        let compute: GetterFn = Arc::new(move |local: &Value| {
            runs_clone.fetch_add(1, Ordering::SeqCst);
            json!(local["n"].as_i64().unwrap_or(0) * 2)
        });
        let owner = owner.iter().map(|s| s.to_string()).collect();
        (
            GetterCell::new("double".to_string(), owner, compute, state),
            runs,
        )
    }

    #[test]
    fn memoizes_until_owner_written() {
        let state = ReactiveState::new(json!({"a": {"n": 2}, "b": {"n": 0}}));
        let (cell, runs) = counting_cell(&["a"], &state);

        assert_eq!(cell.get(&state), json!(4));
        assert_eq!(cell.get(&state), json!(4));
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // Sibling write leaves the memo intact
        state
            .write(&["b".to_string(), "n".to_string()], |v| *v = json!(9))
            .unwrap();
        assert_eq!(cell.get(&state), json!(4));
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        state
            .write(&["a".to_string(), "n".to_string()], |v| *v = json!(5))
            .unwrap();
        assert_eq!(cell.get(&state), json!(10));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn root_replacement_invalidates() {
        let state = ReactiveState::new(json!({"a": {"n": 1}}));
        let (cell, _) = counting_cell(&["a"], &state);
        assert_eq!(cell.get(&state), json!(2));

        state.replace(json!({"a": {"n": 3}}));
        assert_eq!(cell.get(&state), json!(6));
    }

    #[test]
    fn missing_owner_state_reads_null() {
        let state = ReactiveState::new(json!({"a": {"n": 1}}));
        let (cell, _) = counting_cell(&["a"], &state);
        state.replace(json!({}));
        assert_eq!(cell.get(&state), json!(0));
    }
}
