use super::tree::ModuleTree;
use crate::error::{Result, StoreError};

impl ModuleTree {
    /// Registry prefix for the module at `path`.
    ///
    /// Each module along the path whose own options are namespaced
    /// contributes `name/`; the root has no name and contributes nothing.
    /// Computed fresh on every call so it always reflects the current tree.
    pub fn namespace(&self, path: &[String]) -> Result<String> {
        let mut record = self.root();
        let mut namespace = String::new();
        for name in path {
            record = record.child(name).ok_or_else(|| {
                StoreError::invalid_path(path, format!("no module named {name:?}"))
            })?;
            if record.options().is_namespaced() {
                namespace.push_str(name);
                namespace.push('/');
            }
        }
        Ok(namespace)
    }
}

#[cfg(test)]
mod tests {
    use crate::module::{ModuleOptions, ModuleTree};
    use crate::StoreError;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    fn tree(a_namespaced: bool, sibling_namespaced: bool) -> ModuleTree {
        ModuleTree::new(
            ModuleOptions::new()
                .module(
                    "a",
                    ModuleOptions::new()
                        .namespaced(a_namespaced)
                        .module("b", ModuleOptions::new().namespaced(true))
                        .module("plain", ModuleOptions::new()),
                )
                .module("s", ModuleOptions::new().namespaced(sibling_namespaced)),
        )
    }

    #[test]
    fn root_is_empty() {
        assert_eq!(tree(true, true).namespace(&[]).unwrap(), "");
    }

    #[test]
    fn only_namespaced_modules_contribute() {
        let t = tree(true, false);
        assert_eq!(t.namespace(&path(&["a"])).unwrap(), "a/");
        assert_eq!(t.namespace(&path(&["a", "b"])).unwrap(), "a/b/");
        assert_eq!(t.namespace(&path(&["a", "plain"])).unwrap(), "a/");
        assert_eq!(t.namespace(&path(&["s"])).unwrap(), "");

        let t = tree(false, false);
        assert_eq!(t.namespace(&path(&["a", "b"])).unwrap(), "b/");
    }

    #[test]
    fn unrelated_flags_do_not_matter() {
        let p = path(&["a", "b"]);
        assert_eq!(
            tree(true, false).namespace(&p).unwrap(),
            tree(true, true).namespace(&p).unwrap()
        );
    }

    #[test]
    fn idempotent() {
        let t = tree(true, true);
        let p = path(&["a", "b"]);
        assert_eq!(t.namespace(&p).unwrap(), t.namespace(&p).unwrap());
    }

    #[test]
    fn missing_module_is_invalid_path() {
        assert!(matches!(
            tree(true, true).namespace(&path(&["a", "zzz"])),
            Err(StoreError::InvalidPath { .. })
        ));
    }
}
