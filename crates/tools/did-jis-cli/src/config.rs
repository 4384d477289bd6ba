use anyhow::{Context, Result};
use did_jis_core::BindingPolicy;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "did-jis.toml";

/// Settings read from the optional TOML file.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// 64 character hex secret to restore instead of generating a key.
    pub secret_key_hex: Option<String>,

    /// Log filter, e.g. "info" or "did_jis_core=debug".
    pub log_level: Option<String>,

    /// Whether documents must use the key-derived DID.
    pub binding_policy: BindingPolicy,

    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            secret_key_hex: None,
            log_level: None,
            binding_policy: BindingPolicy::default(),
            pretty: true,
        }
    }
}

impl CliConfig {
    /// Load `explicit`, or the default path if it exists.
    ///
    /// An explicitly named file must exist; a missing default file yields
    /// the default configuration.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_PATH);
                match fs::read_to_string(&path) {
                    Ok(contents) => Self::from_toml(&contents)
                        .with_context(|| format!("Failed to parse configuration file: {:?}", path)),
                    Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
                    Err(e) => Err(e)
                        .with_context(|| format!("Failed to read configuration file: {:?}", path)),
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {:?}", path))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse configuration file: {:?}", path))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}
