use super::options::ModuleOptions;
use crate::error::{Result, StoreError};
use indexmap::IndexMap;
use serde_json::Value;

/// One node of the module tree.
#[derive(Debug)]
pub struct ModuleRecord {
    options: ModuleOptions,
    state: Value,
    children: IndexMap<String, ModuleRecord>,
}

impl ModuleRecord {
    /// Build a record and, recursively, one child record per nested module.
    pub fn build(options: ModuleOptions) -> Self {
        let state = options.initial_state();
        let children = options
            .modules
            .iter()
            .map(|(name, child)| (name.clone(), ModuleRecord::build(child.clone())))
            .collect();
        Self {
            options,
            state,
            children,
        }
    }

    pub fn options(&self) -> &ModuleOptions {
        &self.options
    }

    /// The state this record was built with. The live copy lives in the
    /// store's state tree once installed.
    pub fn state(&self) -> &Value {
        &self.state
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &ModuleRecord)> {
        self.children.iter().map(|(name, child)| (name.as_str(), child))
    }

    pub fn child(&self, name: &str) -> Option<&ModuleRecord> {
        self.children.get(name)
    }

    /// Check that every nested module has object state to graft into, with
    /// this record installed at `path`.
    pub fn check_nesting(&self, path: &[String]) -> Result<()> {
        for (name, child) in &self.children {
            let mut child_path = path.to_vec();
            child_path.push(name.clone());
            if !self.state.is_object() {
                return Err(StoreError::install(&child_path, "parent state is not an object"));
            }
            child.check_nesting(&child_path)?;
        }
        Ok(())
    }
}

/// The tree of module records, rooted at the store's own options.
///
/// Every non-root record hangs off exactly one parent under a unique local
/// name, so a path of names identifies at most one record.
#[derive(Debug)]
pub struct ModuleTree {
    root: ModuleRecord,
}

impl ModuleTree {
    pub fn new(options: ModuleOptions) -> Self {
        Self {
            root: ModuleRecord::build(options),
        }
    }

    pub fn root(&self) -> &ModuleRecord {
        &self.root
    }

    /// Look up the record at `path`. The empty path is the root.
    pub fn get(&self, path: &[String]) -> Option<&ModuleRecord> {
        path.iter()
            .try_fold(&self.root, |record, name| record.children.get(name))
    }

    fn get_mut(&mut self, path: &[String]) -> Option<&mut ModuleRecord> {
        let mut record = &mut self.root;
        for name in path {
            record = record.children.get_mut(name)?;
        }
        Some(record)
    }

    /// Insert a record built from `options` at `path`.
    ///
    /// The parent at `path[..len - 1]` must already exist. An existing record
    /// with the same local name is replaced.
    pub fn register(&mut self, path: &[String], options: ModuleOptions) -> Result<&ModuleRecord> {
        self.insert(path, ModuleRecord::build(options))
    }

    /// Insert an already built record at `path`, replacing any record with
    /// the same local name.
    pub fn insert(&mut self, path: &[String], record: ModuleRecord) -> Result<&ModuleRecord> {
        let (name, parent_path) = path
            .split_last()
            .ok_or_else(|| StoreError::invalid_path(path, "cannot register the root module"))?;
        let parent = self
            .get_mut(parent_path)
            .ok_or_else(|| StoreError::invalid_path(path, "parent module does not exist"))?;

        parent
            .children
            .insert(name.clone(), record);
        parent
            .children
            .get(name)
            .ok_or_else(|| StoreError::invalid_path(path, "module vanished during registration"))
    }

    /// Detach and return the record at `path`.
    pub fn unregister(&mut self, path: &[String]) -> Result<ModuleRecord> {
        let (name, parent_path) = path
            .split_last()
            .ok_or_else(|| StoreError::invalid_path(path, "cannot unregister the root module"))?;
        self.get_mut(parent_path)
            .and_then(|parent| parent.children.shift_remove(name))
            .ok_or_else(|| StoreError::invalid_path(path, "module does not exist"))
    }

    /// Visit every record depth-first, parents before children.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&[String], &ModuleRecord),
    {
        fn visit<F>(path: &mut Vec<String>, record: &ModuleRecord, f: &mut F)
        where
            F: FnMut(&[String], &ModuleRecord),
        {
            f(path.as_slice(), record);
            for (name, child) in &record.children {
                path.push(name.clone());
                visit(path, child, f);
                path.pop();
            }
        }

        visit(&mut Vec::new(), &self.root, &mut f);
    }
}
