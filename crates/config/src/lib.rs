//! # Config - Bitcask reader settings
//!
//! All settings can be supplied through environment variables:
//!
//! ```text
//! BITCASK_DIR        bitcask directory                 (default: "data")
//! BITCASK_STRICT     abort load on first corrupt record (default: "false")
//! BITCASK_USE_HINTS  load from .hint files when present (default: "true")
//! ```

use std::path::{Path, PathBuf};

pub const ENV_DIR: &str = "BITCASK_DIR";
pub const ENV_STRICT: &str = "BITCASK_STRICT";
pub const ENV_USE_HINTS: &str = "BITCASK_USE_HINTS";

/// Directory used when `BITCASK_DIR` is not set.
pub const DEFAULT_DIR: &str = "data";

/// Settings for opening and loading a bitcask directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitcaskConfig {
    /// Directory holding the `.data` and `.hint` files.
    pub dir: PathBuf,
    /// If `true`, a corrupt data record aborts `load()` instead of being
    /// skipped.
    pub strict: bool,
    /// If `false`, hint files are ignored and every generation is loaded by a
    /// full data file scan.
    pub use_hints: bool,
}

impl BitcaskConfig {
    /// Permissive, hint-using config for `dir`.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            strict: false,
            use_hints: true,
        }
    }

    /// Builds a config from `BITCASK_*` environment variables.
    ///
    /// Unset or unparsable values fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. [`from_env`] is this with
    /// `std::env::var`.
    ///
    /// [`from_env`]: BitcaskConfig::from_env
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let dir = lookup(ENV_DIR).unwrap_or_else(|| DEFAULT_DIR.to_string());
        Self {
            dir: PathBuf::from(dir),
            strict: parse_or(lookup(ENV_STRICT), false),
            use_hints: parse_or(lookup(ENV_USE_HINTS), true),
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn use_hints(mut self, use_hints: bool) -> Self {
        self.use_hints = use_hints;
        self
    }
}

fn parse_or(value: Option<String>, default: bool) -> bool {
    value
        .and_then(|v| v.trim().to_ascii_lowercase().parse().ok())
        .unwrap_or(default)
}
