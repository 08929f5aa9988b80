// CLASSIFICATION: COMMUNITY
// Filename: config.rs v0.1
// Author: Lukas Bower
// Date Modified: 2027-08-20

//! Runtime configuration for a semihosting session.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::semihosting::handles::{Handle, FIRST_FILE_HANDLE, MAX_FIRST_HANDLE};

/// Environment override for [`SemihostConfig::root`].
pub const ENV_ROOT: &str = "COHESIX_SEMIHOST_ROOT";
/// Environment override for [`SemihostConfig::features_path`].
pub const ENV_FEATURES: &str = "COHESIX_SEMIHOST_FEATURES";
/// Environment override for [`SemihostConfig::cmdline`].
pub const ENV_CMDLINE: &str = "COHESIX_SEMIHOST_CMDLINE";

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid semihost config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("first_handle {0} overlaps the console handles")]
    ReservedHandle(Handle),
    #[error("first_handle {0} exceeds {max}", max = MAX_FIRST_HANDLE)]
    FirstHandleTooLarge(Handle),
}

/// Session settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SemihostConfig {
    /// Directory relative target file names resolve against.
    pub root: PathBuf,
    /// Backing file for the `:semihosting-features` pseudo-file.
    pub features_path: String,
    /// Handle given to the first opened file.
    pub first_handle: Handle,
    /// Returned by the get-command-line call.
    pub cmdline: String,
    /// Heap base, heap limit, stack base, stack limit.
    pub heap_info: [u32; 4],
}

impl Default for SemihostConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            features_path: "shfb.txt".into(),
            first_handle: FIRST_FILE_HANDLE,
            cmdline: String::new(),
            heap_info: [0; 4],
        }
    }
}

impl SemihostConfig {
    /// Load a TOML file. Missing keys keep their defaults; a relative `root`
    /// is taken relative to the file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut cfg = Self::from_toml(&text)?;
        if cfg.root.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            cfg.root = base.join(&cfg.root);
        }
        Ok(cfg)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let cfg: SemihostConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `COHESIX_SEMIHOST_*` environment overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(root) = std::env::var(ENV_ROOT) {
            self.root = PathBuf::from(root);
        }
        if let Ok(features) = std::env::var(ENV_FEATURES) {
            self.features_path = features;
        }
        if let Ok(cmdline) = std::env::var(ENV_CMDLINE) {
            self.cmdline = cmdline;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.first_handle < FIRST_FILE_HANDLE {
            return Err(ConfigError::ReservedHandle(self.first_handle));
        }
        if self.first_handle > MAX_FIRST_HANDLE {
            return Err(ConfigError::FirstHandleTooLarge(self.first_handle));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = SemihostConfig::from_toml("").unwrap();
        assert_eq!(cfg, SemihostConfig::default());
        assert_eq!(cfg.first_handle, 3);
    }

    #[test]
    fn partial_toml_overrides() {
        let cfg = SemihostConfig::from_toml(
            "features_path = \"/flash/shfb.txt\"\ncmdline = \"fw --fast\"\nheap_info = [1, 2, 3, 4]\n",
        )
        .unwrap();
        assert_eq!(cfg.features_path, "/flash/shfb.txt");
        assert_eq!(cfg.cmdline, "fw --fast");
        assert_eq!(cfg.heap_info, [1, 2, 3, 4]);
    }

    #[test]
    fn reserved_first_handle_rejected() {
        let err = SemihostConfig::from_toml("first_handle = 2").unwrap_err();
        assert!(matches!(err, ConfigError::ReservedHandle(2)));
    }

    #[test]
    fn oversized_first_handle_rejected() {
        let err = SemihostConfig::from_toml("first_handle = 2147483647").unwrap_err();
        assert!(matches!(err, ConfigError::FirstHandleTooLarge(i32::MAX)));
        let cfg = SemihostConfig::from_toml("first_handle = 1073741824").unwrap();
        assert_eq!(cfg.first_handle, MAX_FIRST_HANDLE);
    }

    #[test]
    fn load_rebases_relative_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("semihost.toml");
        std::fs::write(&path, "root = \"sd\"\n").unwrap();
        let cfg = SemihostConfig::load(&path).unwrap();
        assert_eq!(cfg.root, dir.path().join("sd"));
        assert!(matches!(
            SemihostConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    #[serial]
    fn env_overrides_apply() {
        std::env::set_var(ENV_ROOT, "/mnt/sd");
        std::env::set_var(ENV_CMDLINE, "boot");
        let cfg = SemihostConfig::default().with_env();
        std::env::remove_var(ENV_ROOT);
        std::env::remove_var(ENV_CMDLINE);
        assert_eq!(cfg.root, PathBuf::from("/mnt/sd"));
        assert_eq!(cfg.cmdline, "boot");
        assert_eq!(cfg.features_path, "shfb.txt");
    }
}
