//! Compiler configuration
//!
//! An immutable policy object created once per parser and shared by every
//! expression it produces.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Environment variable selecting the compiler mode
pub const MODE_ENV: &str = "CORTEN_EL_COMPILER_MODE";
/// Environment variable overriding the mixed-mode warm-up count
pub const WARM_UP_ENV: &str = "CORTEN_EL_WARM_UP";

/// When expressions are compiled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerMode {
    /// Always interpret
    #[default]
    Off,
    /// Compile right after the first interpretation
    Immediate,
    /// Interpret until warm, then compile once
    Mixed,
}

impl fmt::Display for CompilerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompilerMode::Off => "off",
            CompilerMode::Immediate => "immediate",
            CompilerMode::Mixed => "mixed",
        };
        f.write_str(name)
    }
}

impl FromStr for CompilerMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(CompilerMode::Off),
            "immediate" => Ok(CompilerMode::Immediate),
            "mixed" => Ok(CompilerMode::Mixed),
            _ => Err(ConfigError::InvalidMode(s.to_string())),
        }
    }
}

/// Invalid configuration input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Unknown compiler mode name
    #[error("invalid compiler mode '{0}', expected off, immediate or mixed")]
    InvalidMode(String),
    /// Warm-up count is not a number
    #[error("invalid warm-up threshold '{0}'")]
    InvalidWarmUp(String),
}

/// Compilation and auto-grow policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfiguration {
    /// Compilation mode
    pub mode: CompilerMode,
    /// Create missing intermediate objects while navigating
    pub auto_grow_null_references: bool,
    /// Grow lists when indexing past their end
    pub auto_grow_collections: bool,
    /// Upper bound on the size a list may be grown to
    pub maximum_auto_grow_size: usize,
    /// Longest accepted expression source
    pub maximum_expression_length: usize,
    /// Interpreted evaluations before a mixed-mode compile attempt
    pub warm_up_threshold: u32,
    /// Try the native tier for purely numeric units
    pub native_tier: bool,
}

impl Default for CompilerConfiguration {
    fn default() -> Self {
        Self {
            mode: CompilerMode::Off,
            auto_grow_null_references: false,
            auto_grow_collections: false,
            maximum_auto_grow_size: usize::MAX,
            maximum_expression_length: 10_000,
            warm_up_threshold: 100,
            native_tier: true,
        }
    }
}

impl CompilerConfiguration {
    /// Configuration with the given mode and defaults elsewhere
    pub fn new(mode: CompilerMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Set both auto-grow flags
    pub fn with_auto_grow(mut self, null_references: bool, collections: bool) -> Self {
        self.auto_grow_null_references = null_references;
        self.auto_grow_collections = collections;
        self
    }

    /// Set the auto-grow size bound
    pub fn with_maximum_auto_grow_size(mut self, size: usize) -> Self {
        self.maximum_auto_grow_size = size;
        self
    }

    /// Set the maximum source length
    pub fn with_maximum_expression_length(mut self, length: usize) -> Self {
        self.maximum_expression_length = length;
        self
    }

    /// Set the mixed-mode warm-up count
    pub fn with_warm_up_threshold(mut self, threshold: u32) -> Self {
        self.warm_up_threshold = threshold;
        self
    }

    /// Enable or disable the native tier
    pub fn with_native_tier(mut self, enabled: bool) -> Self {
        self.native_tier = enabled;
        self
    }

    /// Read the mode and warm-up count from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from a variable lookup.
    ///
    /// Unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(mode) = lookup(MODE_ENV) {
            config.mode = mode.parse()?;
        }
        if let Some(warm_up) = lookup(WARM_UP_ENV) {
            config.warm_up_threshold = warm_up
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidWarmUp(warm_up.clone()))?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_mode_is_off() {
        let config = CompilerConfiguration::default();
        assert_eq!(config.mode, CompilerMode::Off);
        assert_eq!(config.warm_up_threshold, 100);
        assert!(!config.auto_grow_null_references);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("MIXED".parse::<CompilerMode>(), Ok(CompilerMode::Mixed));
        assert_eq!(" immediate ".parse::<CompilerMode>(), Ok(CompilerMode::Immediate));
        assert!("sometimes".parse::<CompilerMode>().is_err());
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [(MODE_ENV, "mixed"), (WARM_UP_ENV, "5")].into();
        let config =
            CompilerConfiguration::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.mode, CompilerMode::Mixed);
        assert_eq!(config.warm_up_threshold, 5);

        let bad = CompilerConfiguration::from_lookup(|k| {
            (k == WARM_UP_ENV).then(|| "many".to_string())
        });
        assert_eq!(bad, Err(ConfigError::InvalidWarmUp("many".into())));
    }
}
