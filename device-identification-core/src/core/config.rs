//! Resolver and preference store configuration.
//!
//! The list of known buggy Android IDs is data, not logic: it can be extended
//! from a JSON file without touching the resolver.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Android ID shared by the stock emulator images and a batch of real devices.
///
/// See <http://code.google.com/p/android/issues/detail?id=10603>.
pub const BUGGY_ANDROID_ID: &str = "9774d56d682e549c";

/// Namespace used by [`StoreOptions::default`].
pub const DEFAULT_NAMESPACE: &str = "app_prefs";

/// Settings for [`crate::DeviceIdentifierResolver`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverConfig {
    /// Android ID values known to be shared between devices.
    pub buggy_android_ids: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            buggy_android_ids: vec![BUGGY_ANDROID_ID.to_string()],
        }
    }
}

impl ResolverConfig {
    /// Returns true if `android_id` is one of the known non-unique values.
    pub fn is_buggy_android_id(&self, android_id: &str) -> bool {
        self.buggy_android_ids.iter().any(|id| id == android_id)
    }

    /// Loads a config from a JSON file; returns defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns [`crate::DeviceIdError::Io`] if the file exists but cannot be read,
    /// or [`crate::DeviceIdError::Json`] if it is not valid config JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the config as pretty JSON, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// How a [`crate::PreferenceStore`] is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreOptions {
    /// Name of the preference namespace.
    pub namespace: String,
    /// Restrict the backing file to its owner.
    pub secure: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            secure: false,
        }
    }
}

impl StoreOptions {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_flags_emulator_id() {
        let config = ResolverConfig::default();
        assert!(config.is_buggy_android_id("9774d56d682e549c"));
        assert!(!config.is_buggy_android_id("0123456789abcdef"));
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ResolverConfig::load(dir.path().join("missing.json")).unwrap();
        assert_eq!(config, ResolverConfig::default());
    }

    #[test]
    fn test_save_then_load_extra_sentinel() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("resolver.json");

        let mut config = ResolverConfig::default();
        config.buggy_android_ids.push("deadbeefdeadbeef".to_string());
        config.save(&path).unwrap();

        let loaded = ResolverConfig::load(&path).unwrap();
        assert!(loaded.is_buggy_android_id("deadbeefdeadbeef"));
        assert!(loaded.is_buggy_android_id(BUGGY_ANDROID_ID));
    }

    #[test]
    fn test_load_uses_camel_case_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resolver.json");
        fs::write(&path, r#"{ "buggyAndroidIds": ["abc"] }"#).unwrap();

        let config = ResolverConfig::load(&path).unwrap();
        assert_eq!(config.buggy_android_ids, vec!["abc".to_string()]);
    }

    #[test]
    fn test_load_invalid_json_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resolver.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            ResolverConfig::load(&path),
            Err(crate::DeviceIdError::Json(_))
        ));
    }

    #[test]
    fn test_store_options_default_namespace() {
        let options = StoreOptions::default();
        assert_eq!(options.namespace, "app_prefs");
        assert!(!options.secure);
        assert!(StoreOptions::new("other").secure(true).secure);
    }
}
