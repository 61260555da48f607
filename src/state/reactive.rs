use super::path::{walk, walk_mut, StatePath};
use crate::error::{Result, StoreError};
use crate::runtime::DependencyContext;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;

type WriteWatcher = Arc<dyn Fn(&StatePath) + Send + Sync>;

/// The composed state tree plus the bookkeeping that makes it observable.
///
/// The root is held copy-on-write: readers get an `Arc<Value>` snapshot and
/// writers go through `Arc::make_mut`, so a snapshot handed to a subscriber
/// never changes underneath it. Every write reports the written path to the
/// dependency context and then to each registered watcher, in that order.
pub struct ReactiveState {
    root: RwLock<Arc<Value>>,
    deps: DependencyContext,
    watchers: RwLock<Vec<WriteWatcher>>,
}

impl ReactiveState {
    pub(crate) fn new(initial: Value) -> Self {
        Self {
            root: RwLock::new(Arc::new(initial)),
            deps: DependencyContext::new(),
            watchers: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn context(&self) -> &DependencyContext {
        &self.deps
    }

    /// Snapshot of the whole tree. Not tracked.
    pub fn read(&self) -> Arc<Value> {
        Arc::clone(&self.root.read())
    }

    /// Snapshot of the whole tree, recording a read of `path` for the
    /// getter currently being evaluated.
    pub(crate) fn tracked_read(&self, path: &StatePath) -> Arc<Value> {
        self.deps.track_read(path);
        self.read()
    }

    /// Apply `f` to the subtree at `path`.
    pub(crate) fn write<F, R>(&self, path: &StatePath, f: F) -> Result<R>
    where
        F: FnOnce(&mut Value) -> R,
    {
        let result = {
            let mut root = self.root.write();
            let target = walk_mut(Arc::make_mut(&mut root), path).ok_or_else(|| {
                StoreError::StateNotFound {
                    path: path.to_vec(),
                }
            })?;
            f(target)
        };
        self.after_write(path);
        Ok(result)
    }

    /// Apply `f` to the root of the tree.
    pub(crate) fn write_root<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Value) -> R,
    {
        let result = {
            let mut root = self.root.write();
            f(Arc::make_mut(&mut root))
        };
        self.after_write(&[]);
        result
    }

    /// Add `key` under the object at `parent`, making it observable.
    ///
    /// An existing key is overwritten. Getters that read the new key's path,
    /// or any ancestor of it, are invalidated as for any other write.
    /// Check that `key` could be grafted under `parent` without writing.
    pub(crate) fn check_graft(&self, parent: &StatePath, key: &str) -> Result<()> {
        let root = self.read();
        match walk(&root, parent) {
            Some(Value::Object(_)) => Ok(()),
            Some(_) => Err(StoreError::install(
                &child_path(parent, key),
                "parent state is not an object",
            )),
            None => Err(StoreError::install(
                &child_path(parent, key),
                "parent state does not exist",
            )),
        }
    }

    pub(crate) fn add_tracked_property(
        &self,
        parent: &StatePath,
        key: &str,
        value: Value,
    ) -> Result<()> {
        {
            let mut root = self.root.write();
            let target = walk_mut(Arc::make_mut(&mut root), parent);
            match target {
                Some(Value::Object(map)) => {
                    map.insert(key.to_string(), value);
                }
                Some(_) => {
                    return Err(StoreError::install(
                        &child_path(parent, key),
                        "parent state is not an object",
                    ))
                }
                None => {
                    return Err(StoreError::install(
                        &child_path(parent, key),
                        "parent state does not exist",
                    ))
                }
            }
        }
        self.after_write(&child_path(parent, key));
        Ok(())
    }

    /// Remove `key` from the object at `parent`. Returns the removed value.
    pub(crate) fn remove_property(&self, parent: &StatePath, key: &str) -> Option<Value> {
        let removed = {
            let mut root = self.root.write();
            match walk_mut(Arc::make_mut(&mut root), parent) {
                Some(Value::Object(map)) => map.remove(key),
                _ => None,
            }
        };
        if removed.is_some() {
            self.after_write(&child_path(parent, key));
        }
        removed
    }

    /// Swap the whole tree.
    pub(crate) fn replace(&self, value: Value) {
        *self.root.write() = Arc::new(value);
        self.after_write(&[]);
    }

    /// Register a watcher called synchronously after every write.
    pub(crate) fn watch<F>(&self, watcher: F)
    where
        F: Fn(&StatePath) + Send + Sync + 'static,
    {
        self.watchers.write().push(Arc::new(watcher));
    }

    fn after_write(&self, path: &StatePath) {
        let invalidated = self.deps.notify_write(path);
        if invalidated > 0 {
            tracing::trace!(path = %path.join("/"), invalidated, "getters invalidated");
        }
        let watchers = self.watchers.read().clone();
        for watcher in watchers {
            watcher(path);
        }
    }
}

fn child_path(parent: &StatePath, key: &str) -> Vec<String> {
    let mut path = parent.to_vec();
    path.push(key.to_string());
    path
}
