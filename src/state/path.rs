use serde_json::Value;

/// A location in the state tree: one segment per object key (or array index).
pub type StatePath = [String];

/// Resolve `path` inside `root`.
///
/// Object segments are looked up by key, array segments by numeric index.
pub fn walk<'a>(root: &'a Value, path: &StatePath) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Mutable counterpart of [`walk`].
pub fn walk_mut<'a>(root: &'a mut Value, path: &StatePath) -> Option<&'a mut Value> {
    let mut node = root;
    for segment in path {
        node = match node {
            Value::Object(map) => map.get_mut(segment)?,
            Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(node)
}

/// True when one path is a prefix of the other.
///
/// A write at either location can change what a reader of the other sees.
pub fn overlaps(a: &StatePath, b: &StatePath) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

/// Conversion into a module path.
///
/// Strings are split on `/` so `"a/b"` and `["a", "b"]` address the same
/// module; empty segments are dropped.
pub trait IntoModulePath {
    fn into_module_path(self) -> Vec<String>;
}

impl IntoModulePath for &str {
    fn into_module_path(self) -> Vec<String> {
        self.split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl IntoModulePath for String {
    fn into_module_path(self) -> Vec<String> {
        self.as_str().into_module_path()
    }
}

impl IntoModulePath for &[&str] {
    fn into_module_path(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> IntoModulePath for [&str; N] {
    fn into_module_path(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl IntoModulePath for Vec<&str> {
    fn into_module_path(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl IntoModulePath for Vec<String> {
    fn into_module_path(self) -> Vec<String> {
        self
    }
}

impl IntoModulePath for &[String] {
    fn into_module_path(self) -> Vec<String> {
        self.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.into_module_path()
    }

    #[test]
    fn walk_objects_and_arrays() {
        let state = json!({"todos": [{"id": 0}, {"id": 1}], "a": {"age": 18}});
        assert_eq!(walk(&state, &path(&["a", "age"])), Some(&json!(18)));
        assert_eq!(walk(&state, &path(&["todos", "1", "id"])), Some(&json!(1)));
        assert_eq!(walk(&state, &path(&["todos", "x"])), None);
        assert_eq!(walk(&state, &path(&["missing"])), None);
        assert_eq!(walk(&state, &[]), Some(&state));
    }

    #[test]
    fn walk_mut_edits_in_place() {
        let mut state = json!({"a": {"b": {"n": 1}}});
        if let Some(n) = walk_mut(&mut state, &path(&["a", "b", "n"])) {
            *n = json!(2);
        }
        assert_eq!(state["a"]["b"]["n"], 2);
    }

    #[test]
    fn overlap_is_prefix_either_way() {
        assert!(overlaps(&path(&["a"]), &path(&["a", "b"])));
        assert!(overlaps(&path(&["a", "b"]), &path(&["a"])));
        assert!(overlaps(&[], &path(&["a"])));
        assert!(!overlaps(&path(&["a"]), &path(&["b"])));
        assert!(!overlaps(&path(&["a", "x"]), &path(&["a", "y"])));
    }

    #[test]
    fn string_paths_split_on_slash() {
        assert_eq!("a/b".into_module_path(), path(&["a", "b"]));
        assert_eq!("b".into_module_path(), path(&["b"]));
        assert!("".into_module_path().is_empty());
        assert_eq!(["a", "b"].into_module_path(), path(&["a", "b"]));
    }
}
