use crate::state::path::{overlaps, StatePath};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Dependency bookkeeping for one store.
struct TrackingState {
    // Observers currently evaluating, innermost last
    observer_stack: Vec<usize>,
    // Map from state path to set of observer IDs that read it
    dependencies: HashMap<Vec<String>, HashSet<usize>>,
    // Map from observer ID to set of state paths it read
    observer_deps: HashMap<usize, HashSet<Vec<String>>>,
    // Map from memo ID to dirty state
    memo_dirty: HashMap<usize, bool>,
}

impl TrackingState {
    fn new() -> Self {
        Self {
            observer_stack: Vec::new(),
            dependencies: HashMap::new(),
            observer_deps: HashMap::new(),
            memo_dirty: HashMap::new(),
        }
    }

    fn clear_deps(&mut self, observer_id: usize) {
        if let Some(old_deps) = self.observer_deps.remove(&observer_id) {
            for path in old_deps {
                if let Some(observers) = self.dependencies.get_mut(&path) {
                    observers.remove(&observer_id);
                    if observers.is_empty() {
                        self.dependencies.remove(&path);
                    }
                }
            }
        }
    }
}

/// Tracks which state paths each getter read during its last evaluation and
/// invalidates getters when an overlapping path is written.
///
/// One context belongs to one store; there is no process-wide runtime.
/// Invalidated getters are only marked dirty here and recompute lazily on
/// their next read.
pub(crate) struct DependencyContext {
    next_id: AtomicUsize,
    state: Mutex<TrackingState>,
}

impl DependencyContext {
    pub fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(0),
            state: Mutex::new(TrackingState::new()),
        }
    }

    /// Generate the next unique ID for a memoized observer.
    pub fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Register a memo and mark it as dirty initially.
    pub fn register_memo(&self, memo_id: usize) {
        self.state.lock().memo_dirty.insert(memo_id, true);
    }

    /// Forget an observer and every edge pointing at it.
    pub fn remove_observer(&self, observer_id: usize) {
        let mut ctx = self.state.lock();
        ctx.clear_deps(observer_id);
        ctx.memo_dirty.remove(&observer_id);
    }

    /// Record a read of `path` by the innermost evaluating observer.
    pub fn track_read(&self, path: &StatePath) {
        let mut ctx = self.state.lock();
        let current = ctx.observer_stack.last().copied();
        if let Some(observer) = current {
            ctx.dependencies
                .entry(path.to_vec())
                .or_default()
                .insert(observer);
            ctx.observer_deps
                .entry(observer)
                .or_default()
                .insert(path.to_vec());
        }
    }

    /// Run `f` as `observer_id`, replacing the dependencies it recorded on
    /// its previous run with the reads performed now.
    pub fn with_observer<F, R>(&self, observer_id: usize, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        {
            let mut ctx = self.state.lock();
            ctx.clear_deps(observer_id);
            ctx.observer_stack.push(observer_id);
        }

        let result = f();

        let mut ctx = self.state.lock();
        if let Some(pos) = ctx.observer_stack.iter().rposition(|&id| id == observer_id) {
            ctx.observer_stack.remove(pos);
        }
        result
    }

    /// Mark every observer that read a path overlapping `path` as dirty.
    ///
    /// Returns how many observers went from clean to dirty.
    pub fn notify_write(&self, path: &StatePath) -> usize {
        let mut ctx = self.state.lock();
        let affected: Vec<usize> = ctx
            .dependencies
            .iter()
            .filter(|(read, _)| overlaps(read, path))
            .flat_map(|(_, observers)| observers.iter().copied())
            .collect();

        let mut invalidated = 0;
        for observer_id in affected {
            if let Some(dirty) = ctx.memo_dirty.get_mut(&observer_id) {
                if !*dirty {
                    *dirty = true;
                    invalidated += 1;
                }
            }
        }
        invalidated
    }

    /// Check if a memo is dirty (needs recomputation).
    pub fn is_memo_dirty(&self, memo_id: usize) -> bool {
        self.state
            .lock()
            .memo_dirty
            .get(&memo_id)
            .copied()
            .unwrap_or(true)
    }

    /// Mark a memo as clean (after recomputation).
    pub fn mark_memo_clean(&self, memo_id: usize) {
        self.state.lock().memo_dirty.insert(memo_id, false);
    }
}
