//! Mount table
//!
//! Maps virtual path prefixes to real directories. One table-wide lock
//! guards every read and write; request handlers resolve under the lock and
//! release it before touching the filesystem.

pub mod resolver;

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Normalize a virtual path into the key shape the resolver searches for.
///
/// Empty segments are dropped, so `"docs/"`, `"//docs"` and `"/docs"` all
/// map to `"/docs"`, and `""` maps to `"/"`.
pub fn normalize_virtual_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// Changes applied by [`MountTable::replace`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MountDiff {
    /// New or re-pointed entries
    pub mounted: Vec<(String, PathBuf)>,
    pub unmounted: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MountTable {
    entries: Mutex<HashMap<String, PathBuf>>,
}

impl MountTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a mount. Returns the normalized key and the
    /// location it replaced, if any.
    pub fn insert(
        &self,
        virtual_path: &str,
        location: impl Into<PathBuf>,
    ) -> (String, Option<PathBuf>) {
        let key = normalize_virtual_path(virtual_path);
        let previous = self.lock().insert(key.clone(), location.into());
        (key, previous)
    }

    /// Remove a mount if present.
    pub fn remove(&self, virtual_path: &str) -> Option<(String, PathBuf)> {
        let key = normalize_virtual_path(virtual_path);
        let removed = self.lock().remove(&key)?;
        Some((key, removed))
    }

    /// Swap the whole table in one critical section and report what changed.
    pub fn replace<I, S, P>(&self, entries: I) -> MountDiff
    where
        I: IntoIterator<Item = (S, P)>,
        S: AsRef<str>,
        P: Into<PathBuf>,
    {
        let fresh: HashMap<String, PathBuf> = entries
            .into_iter()
            .map(|(virt, loc)| (normalize_virtual_path(virt.as_ref()), loc.into()))
            .collect();

        let mut guard = self.lock();
        let mut diff = MountDiff::default();
        for (key, location) in &fresh {
            if guard.get(key) != Some(location) {
                diff.mounted.push((key.clone(), location.clone()));
            }
        }
        for key in guard.keys() {
            if !fresh.contains_key(key) {
                diff.unmounted.push(key.clone());
            }
        }
        *guard = fresh;
        drop(guard);

        diff.mounted.sort();
        diff.unmounted.sort();
        diff
    }

    pub fn get(&self, virtual_path: &str) -> Option<PathBuf> {
        self.lock()
            .get(&normalize_virtual_path(virtual_path))
            .cloned()
    }

    /// Point-in-time copy, ordered by virtual path.
    pub fn snapshot(&self) -> BTreeMap<String, PathBuf> {
        self.lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Resolve a raw request path against the current table.
    pub fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        resolver::resolve(request_path, &self.lock())
    }

    // A panic while holding the lock cannot leave the map half-written.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, PathBuf>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_normalize_virtual_path() {
        assert_eq!(normalize_virtual_path("/test"), "/test");
        assert_eq!(normalize_virtual_path("test/"), "/test");
        assert_eq!(normalize_virtual_path("//a//b/"), "/a/b");
        assert_eq!(normalize_virtual_path("/"), "/");
        assert_eq!(normalize_virtual_path(""), "/");
    }

    #[test]
    fn test_insert_overwrites_existing_key() {
        let table = MountTable::new();
        let (key, previous) = table.insert("/test", "/first");
        assert_eq!(key, "/test");
        assert!(previous.is_none());

        let (_, previous) = table.insert("/test/", "/second");
        assert_eq!(previous, Some(PathBuf::from("/first")));
        assert_eq!(table.get("/test"), Some(PathBuf::from("/second")));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let table = MountTable::new();
        assert!(table.remove("/missing").is_none());
        table.insert("/a", "/srv/a");
        assert_eq!(
            table.remove("/a"),
            Some(("/a".to_string(), PathBuf::from("/srv/a")))
        );
        assert!(table.is_empty());
    }

    #[test]
    fn test_replace_swaps_all_entries() {
        let table = MountTable::new();
        table.insert("/old", "/srv/old");
        table.insert("/docs", "/srv/docs");
        let diff = table.replace([("/new", "/srv/new"), ("docs", "/srv/docs")]);
        assert_eq!(
            diff.mounted,
            vec![("/new".to_string(), PathBuf::from("/srv/new"))]
        );
        assert_eq!(diff.unmounted, vec!["/old".to_string()]);

        let snapshot = table.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(!snapshot.contains_key("/old"));
        assert_eq!(snapshot.get("/docs"), Some(&PathBuf::from("/srv/docs")));
    }

    #[test]
    fn test_resolve_uses_current_entries() {
        let table = MountTable::new();
        assert!(table.resolve("/a/file.txt").is_none());
        table.insert("/a", "/srv/a");
        assert_eq!(
            table.resolve("/a/file.txt"),
            Some(PathBuf::from("/srv/a/file.txt"))
        );
        table.remove("/a");
        assert!(table.resolve("/a/file.txt").is_none());
    }

    #[test]
    fn test_concurrent_mounts_and_lookups() {
        let table = Arc::new(MountTable::new());
        let writers: Vec<_> = (0..4)
            .map(|i| {
                let table = Arc::clone(&table);
                thread::spawn(move || {
                    for j in 0..100 {
                        let virt = format!("/w{i}/{j}");
                        table.insert(&virt, format!("/srv/{i}/{j}"));
                        let _ = table.resolve(&format!("{virt}/file"));
                        if j % 2 == 0 {
                            table.remove(&virt);
                        }
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }
        assert_eq!(table.len(), 4 * 50);
    }
}
