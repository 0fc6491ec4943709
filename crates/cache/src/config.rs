//! Cache configuration for texture budgets and scratch pool limits.
//!
//! Configuration can be loaded from a file, environment variables, or created
//! programmatically, and is turned into the [`BudgetPolicy`] and
//! [`ScratchPoolConfig`] a rendering context is built with.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::memory_budget::BudgetPolicy;
use crate::scratch::ScratchPoolConfig;

const MB: usize = 1024 * 1024;

/// Configuration for the texture cache and scratch pool.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Texture cache VRAM budget in bytes
    pub texture_budget: usize,
    /// Maximum cached textures, 0 for no limit
    pub max_textures: usize,
    /// Scratch textures kept per shape and format
    pub scratch_per_shape: usize,
    /// Scratch textures kept in total
    pub scratch_total: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let scratch = ScratchPoolConfig::default();
        Self {
            texture_budget: 512 * MB,
            max_textures: 0,
            scratch_per_shape: scratch.max_per_shape,
            scratch_total: scratch.max_total,
        }
    }
}

impl CacheConfig {
    /// Creates a new cache configuration with a texture budget in megabytes.
    pub fn new(texture_budget_mb: usize) -> Self {
        Self::default().with_texture_budget_mb(texture_budget_mb)
    }

    /// Sets the texture cache budget in megabytes.
    pub fn with_texture_budget_mb(mut self, mb: usize) -> Self {
        self.texture_budget = mb * MB;
        self
    }

    /// Caps the number of cached textures (0 removes the cap).
    pub fn with_max_textures(mut self, max_textures: usize) -> Self {
        self.max_textures = max_textures;
        self
    }

    /// Sets the scratch pool limits.
    pub fn with_scratch_limits(mut self, per_shape: usize, total: usize) -> Self {
        self.scratch_per_shape = per_shape;
        self.scratch_total = total;
        self
    }

    /// Returns the default configuration file path for the current platform.
    ///
    /// - macOS: ~/Library/Application Support/texcache/cache.toml
    /// - Linux: ~/.config/texcache/cache.toml
    /// - Windows: %APPDATA%\texcache\cache.toml
    pub fn default_config_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("texcache").join("cache.toml")
        } else {
            PathBuf::from("texcache.toml")
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TEXCACHE_TEXTURE_BUDGET_MB`: texture budget in MB (default: 512)
    /// - `TEXCACHE_MAX_TEXTURES`: cached texture cap, 0 for none (default: 0)
    /// - `TEXCACHE_SCRATCH_PER_SHAPE`: scratch textures per shape (default: 10)
    /// - `TEXCACHE_SCRATCH_TOTAL`: scratch textures in total (default: 100)
    ///
    /// # Errors
    /// Returns an error if any environment variable contains an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(mb) = env_usize("TEXCACHE_TEXTURE_BUDGET_MB")? {
            config.texture_budget = mb * MB;
        }
        if let Some(max) = env_usize("TEXCACHE_MAX_TEXTURES")? {
            config.max_textures = max;
        }
        if let Some(count) = env_usize("TEXCACHE_SCRATCH_PER_SHAPE")? {
            config.scratch_per_shape = count;
        }
        if let Some(count) = env_usize("TEXCACHE_SCRATCH_TOTAL")? {
            config.scratch_total = count;
        }

        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// Expected file format:
    /// ```toml
    /// texture_budget_mb = 512
    /// max_textures = 0
    /// scratch_per_shape = 10
    /// scratch_total = 100
    /// ```
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from a TOML string.
    ///
    /// Only flat `key = value` lines are understood; unknown keys are ignored.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for line in toml_str.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"');

                match key {
                    "texture_budget_mb" => config.texture_budget = parse_usize(key, value)? * MB,
                    "max_textures" => config.max_textures = parse_usize(key, value)?,
                    "scratch_per_shape" => config.scratch_per_shape = parse_usize(key, value)?,
                    "scratch_total" => config.scratch_total = parse_usize(key, value)?,
                    _ => log::debug!("ignoring unknown cache config key {:?}", key),
                }
            }
        }

        Ok(config)
    }

    /// Saves configuration to a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path.as_ref(), self.to_toml())?;
        Ok(())
    }

    /// Converts configuration to TOML format.
    pub fn to_toml(&self) -> String {
        format!(
            "# Texture Cache Configuration\n\
             texture_budget_mb = {}\n\
             max_textures = {}\n\
             scratch_per_shape = {}\n\
             scratch_total = {}\n",
            self.texture_budget_mb(),
            self.max_textures,
            self.scratch_per_shape,
            self.scratch_total
        )
    }

    /// Returns the texture budget in megabytes.
    pub fn texture_budget_mb(&self) -> usize {
        self.texture_budget / MB
    }

    /// Capacity policy enforcing this configuration's budget and cap.
    pub fn budget_policy(&self) -> BudgetPolicy {
        let policy = BudgetPolicy::with_bytes(self.texture_budget);
        if self.max_textures > 0 {
            policy.with_max_textures(self.max_textures)
        } else {
            policy
        }
    }

    pub fn scratch_config(&self) -> ScratchPoolConfig {
        ScratchPoolConfig {
            max_per_shape: self.scratch_per_shape,
            max_total: self.scratch_total,
        }
    }
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value
        .parse::<usize>()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

fn env_usize(name: &str) -> Result<Option<usize>, ConfigError> {
    match std::env::var(name) {
        Ok(value) => parse_usize(name, value.trim()).map(Some),
        Err(_) => Ok(None),
    }
}

/// Errors that can occur during configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid value for a configuration parameter
    #[error("Invalid value for configuration key: {0}")]
    InvalidValue(String),

    /// I/O error reading or writing configuration file
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const ENV_VARS: [&str; 4] = [
        "TEXCACHE_TEXTURE_BUDGET_MB",
        "TEXCACHE_MAX_TEXTURES",
        "TEXCACHE_SCRATCH_PER_SHAPE",
        "TEXCACHE_SCRATCH_TOTAL",
    ];

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.texture_budget, 512 * MB);
        assert_eq!(config.max_textures, 0);
        assert_eq!(config.scratch_config(), ScratchPoolConfig::default());
    }

    #[test]
    fn test_builder_methods() {
        let config = CacheConfig::new(64)
            .with_max_textures(20)
            .with_scratch_limits(2, 8);

        assert_eq!(config.texture_budget, 64 * MB);
        assert_eq!(config.texture_budget_mb(), 64);
        assert_eq!(config.max_textures, 20);
        assert_eq!(
            config.scratch_config(),
            ScratchPoolConfig {
                max_per_shape: 2,
                max_total: 8
            }
        );
    }

    #[test]
    fn test_budget_policy() {
        let policy = CacheConfig::new(16).budget_policy();
        assert_eq!(policy.budget().total_budget(), 16 * MB);
    }

    #[test]
    fn test_default_config_path() {
        let path = CacheConfig::default_config_path();
        assert!(path.ends_with("cache.toml") || path.ends_with("texcache.toml"));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        // Save and restore env vars to avoid test pollution
        let _guard = EnvGuard::new(&ENV_VARS);

        env::set_var("TEXCACHE_TEXTURE_BUDGET_MB", "128");
        env::set_var("TEXCACHE_MAX_TEXTURES", "50");
        env::set_var("TEXCACHE_SCRATCH_PER_SHAPE", "3");
        env::set_var("TEXCACHE_SCRATCH_TOTAL", "12");

        let config = CacheConfig::from_env().unwrap();
        assert_eq!(config.texture_budget, 128 * MB);
        assert_eq!(config.max_textures, 50);
        assert_eq!(config.scratch_per_shape, 3);
        assert_eq!(config.scratch_total, 12);
    }

    #[test]
    #[serial]
    fn test_from_env_partial() {
        let _guard = EnvGuard::new(&ENV_VARS);

        for name in ENV_VARS {
            env::remove_var(name);
        }
        env::set_var("TEXCACHE_TEXTURE_BUDGET_MB", "128");

        let config = CacheConfig::from_env().unwrap();
        assert_eq!(config.texture_budget, 128 * MB);
        assert_eq!(config.scratch_total, 100); // default
    }

    #[test]
    #[serial]
    fn test_from_env_invalid() {
        let _guard = EnvGuard::new(&["TEXCACHE_MAX_TEXTURES"]);

        env::set_var("TEXCACHE_MAX_TEXTURES", "lots");
        let result = CacheConfig::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue(ref key)) if key == "TEXCACHE_MAX_TEXTURES"
        ));
    }

    // Helper to save and restore environment variables
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new(var_names: &[&str]) -> Self {
            let vars = var_names
                .iter()
                .map(|name| (name.to_string(), env::var(name).ok()))
                .collect();
            Self { vars }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (name, value) in &self.vars {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = CacheConfig::new(128).with_max_textures(7);
        let parsed = CacheConfig::from_toml(&config.to_toml()).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
            # Test configuration
            texture_budget_mb = 256
            max_textures = "40"
            scratch_per_shape = 4
            unknown_key = 1
        "#;

        let config = CacheConfig::from_toml(toml).unwrap();
        assert_eq!(config.texture_budget, 256 * MB);
        assert_eq!(config.max_textures, 40);
        assert_eq!(config.scratch_per_shape, 4);
        assert_eq!(config.scratch_total, 100); // default
    }

    #[test]
    fn test_from_toml_invalid() {
        let err = CacheConfig::from_toml("scratch_total = -1").unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for configuration key: scratch_total");
    }

    #[test]
    fn test_file_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("cache.toml");

        let config = CacheConfig::new(32).with_scratch_limits(1, 4);
        config.save_to_file(&config_path).unwrap();

        let loaded = CacheConfig::from_file(&config_path).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = CacheConfig::from_file(temp_dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
