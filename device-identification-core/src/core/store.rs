//! String key-value preference storage backed by SQLite.

use crate::{DeviceIdError, Result, StoreOptions};
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};

/// A mapping from string keys to string values.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, returning the value it replaced.
    fn put(&mut self, key: &str, value: &str) -> Result<Option<String>>;

    /// Removes `key`, returning the value it held.
    fn remove(&mut self, key: &str) -> Result<Option<String>>;

    fn contains(&self, key: &str) -> Result<bool>;

    fn clear(&mut self) -> Result<()>;

    fn size(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.size()? == 0)
    }
}

/// Preferences for one namespace in a SQLite file.
///
/// Several namespaces can share a file. Writes are committed in WAL mode with
/// `synchronous = NORMAL`: they are visible to this connection at once but
/// reach the disk on the next checkpoint rather than before `put` returns.
///
/// Secure stores use a rollback journal instead of WAL, so no sidecar file
/// outlives a commit, and the database is created owner-only.
pub struct PreferenceStore {
    conn: Connection,
    namespace: String,
    secure: bool,
}

impl PreferenceStore {
    pub fn open<P: AsRef<Path>>(path: P, options: StoreOptions) -> Result<Self> {
        let path = path.as_ref();
        if options.secure {
            create_owner_only(path)?;
        }

        let conn = Connection::open(path)?;
        let journal_mode = if options.secure { "DELETE" } else { "WAL" };
        conn.query_row(&format!("PRAGMA journal_mode = {journal_mode}"), [], |row| {
            row.get::<_, String>(0)
        })?;
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch(include_str!("schema.sql"))?;

        if options.secure {
            restrict_to_owner(path)?;
            // left behind by an earlier non-secure open
            for suffix in SIDECAR_SUFFIXES {
                let sidecar = sidecar_path(path, suffix);
                if sidecar.exists() {
                    restrict_to_owner(&sidecar)?;
                }
            }
        }

        Ok(Self {
            conn,
            namespace: options.namespace,
            secure: options.secure,
        })
    }

    /// Opens `<dir>/<namespace>.db`, creating `dir` if needed.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceIdError::InvalidNamespace`] if the namespace is empty or
    /// contains a path separator.
    pub fn open_in<P: AsRef<Path>>(dir: P, options: StoreOptions) -> Result<Self> {
        let namespace = &options.namespace;
        if namespace.is_empty() || namespace.contains(['/', '\\']) {
            return Err(DeviceIdError::InvalidNamespace(namespace.clone()));
        }
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.db", options.namespace));
        Self::open(path, options)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    fn lookup(conn: &Connection, namespace: &str, key: &str) -> Result<Option<String>> {
        let value = conn
            .query_row(
                "SELECT value FROM preferences WHERE namespace = ? AND key = ?",
                params![namespace, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

impl KeyValueStore for PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Self::lookup(&self.conn, &self.namespace, key)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<Option<String>> {
        let tx = self.conn.transaction()?;
        let old = Self::lookup(&tx, &self.namespace, key)?;
        tx.execute(
            "INSERT INTO preferences (namespace, key, value) VALUES (?, ?, ?)
             ON CONFLICT (namespace, key) DO UPDATE SET value = excluded.value",
            params![self.namespace, key, value],
        )?;
        tx.commit()?;
        Ok(old)
    }

    fn remove(&mut self, key: &str) -> Result<Option<String>> {
        let tx = self.conn.transaction()?;
        let old = Self::lookup(&tx, &self.namespace, key)?;
        tx.execute(
            "DELETE FROM preferences WHERE namespace = ? AND key = ?",
            params![self.namespace, key],
        )?;
        tx.commit()?;
        Ok(old)
    }

    fn contains(&self, key: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM preferences WHERE namespace = ? AND key = ?",
            params![self.namespace, key],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn clear(&mut self) -> Result<()> {
        self.conn.execute(
            "DELETE FROM preferences WHERE namespace = ?",
            [&self.namespace],
        )?;
        Ok(())
    }

    fn size(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM preferences WHERE namespace = ?",
            [&self.namespace],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

const SIDECAR_SUFFIXES: [&str; 3] = ["-journal", "-wal", "-shm"];

fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(unix)]
fn create_owner_only(path: &Path) -> Result<()> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .mode(0o600)
        .open(path)?;
    Ok(())
}

#[cfg(not(unix))]
fn create_owner_only(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_default(dir: &TempDir) -> PreferenceStore {
        PreferenceStore::open_in(dir.path(), StoreOptions::default()).unwrap()
    }

    #[test]
    fn test_put_then_get() {
        let dir = TempDir::new().unwrap();
        let mut store = open_default(&dir);

        assert_eq!(store.put("user", "alice").unwrap(), None);
        assert_eq!(store.get("user").unwrap().as_deref(), Some("alice"));
        assert!(store.contains("user").unwrap());
        assert_eq!(store.size().unwrap(), 1);
    }

    #[test]
    fn test_put_returns_previous_value() {
        let dir = TempDir::new().unwrap();
        let mut store = open_default(&dir);

        store.put("user", "alice").unwrap();
        assert_eq!(store.put("user", "bob").unwrap().as_deref(), Some("alice"));
        assert_eq!(store.get("user").unwrap().as_deref(), Some("bob"));
        assert_eq!(store.size().unwrap(), 1);
    }

    #[test]
    fn test_remove() {
        let dir = TempDir::new().unwrap();
        let mut store = open_default(&dir);

        store.put("user", "alice").unwrap();
        assert_eq!(store.remove("user").unwrap().as_deref(), Some("alice"));
        assert_eq!(store.get("user").unwrap(), None);
        assert!(!store.contains("user").unwrap());
        assert_eq!(store.remove("user").unwrap(), None);
    }

    #[test]
    fn test_clear() {
        let dir = TempDir::new().unwrap();
        let mut store = open_default(&dir);
        assert!(store.is_empty().unwrap());

        store.put("a", "1").unwrap();
        store.put("b", "2").unwrap();
        assert!(!store.is_empty().unwrap());

        store.clear().unwrap();
        assert!(store.is_empty().unwrap());
        assert_eq!(store.size().unwrap(), 0);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = open_default(&dir);
            store.put("device", "358764064677893").unwrap();
        }

        let store = open_default(&dir);
        assert_eq!(store.namespace(), "app_prefs");
        assert_eq!(store.get("device").unwrap().as_deref(), Some("358764064677893"));
        assert!(dir.path().join("app_prefs.db").exists());
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shared.db");
        let mut first = PreferenceStore::open(&path, StoreOptions::new("first")).unwrap();
        let mut second = PreferenceStore::open(&path, StoreOptions::new("second")).unwrap();

        first.put("key", "one").unwrap();
        second.put("key", "two").unwrap();
        second.clear().unwrap();

        assert_eq!(first.get("key").unwrap().as_deref(), Some("one"));
        assert!(second.is_empty().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_secure_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store =
            PreferenceStore::open_in(dir.path(), StoreOptions::new("secret").secure(true)).unwrap();
        assert!(store.is_secure());

        let mode = fs::metadata(dir.path().join("secret.db")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_secure_store_leaves_no_readable_sidecars() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let mut store =
            PreferenceStore::open_in(dir.path(), StoreOptions::new("secret").secure(true)).unwrap();
        store.put("token", "s3cr3t").unwrap();
        store.put("other", "value").unwrap();
        store.remove("other").unwrap();

        let db = dir.path().join("secret.db");
        let mode = fs::metadata(&db).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        for suffix in SIDECAR_SUFFIXES {
            let sidecar = sidecar_path(&db, suffix);
            if let Ok(meta) = fs::metadata(&sidecar) {
                assert_eq!(meta.permissions().mode() & 0o077, 0, "{}", sidecar.display());
            }
        }
        assert!(!sidecar_path(&db, "-wal").exists());
        assert_eq!(store.get("token").unwrap().as_deref(), Some("s3cr3t"));
    }

    #[cfg(unix)]
    #[test]
    fn test_reopening_as_secure_restricts_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        {
            let mut store = PreferenceStore::open_in(dir.path(), StoreOptions::new("prefs")).unwrap();
            store.put("key", "value").unwrap();
        }

        let store =
            PreferenceStore::open_in(dir.path(), StoreOptions::new("prefs").secure(true)).unwrap();
        let db = dir.path().join("prefs.db");
        assert_eq!(fs::metadata(&db).unwrap().permissions().mode() & 0o777, 0o600);
        assert!(!sidecar_path(&db, "-wal").exists());
        assert_eq!(store.get("key").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn test_namespace_with_path_separator_is_rejected() {
        let dir = TempDir::new().unwrap();
        for namespace in ["../escape", "a/b", "a\\b", ""] {
            let result = PreferenceStore::open_in(dir.path(), StoreOptions::new(namespace));
            assert!(
                matches!(result, Err(DeviceIdError::InvalidNamespace(_))),
                "{namespace:?}"
            );
        }
        assert!(!dir.path().parent().unwrap().join("escape.db").exists());
    }
}
