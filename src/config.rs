//! Configuration for bluebook.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (BLUEBOOK_OFFLINE, BLUEBOOK_COURTLISTENER_TOKEN)
//! 2. Config file: BLUEBOOK_CONFIG, else .bluebook/config.yaml in the current
//!    directory or a parent, else ~/.bluebook/config.yaml
//! 3. Defaults
//!
//! Every section is optional, and so is every key within a section.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::claims::ClaimSettings;
use crate::core::{InputLimits, LookupSettings};
use crate::format::RuleOverrides;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const CONFIG_DIR: &str = ".bluebook";
const CONFIG_FILE: &str = "config.yaml";

/// Config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub limits: InputLimits,
    #[serde(default)]
    pub claims: ClaimSettings,
    #[serde(default)]
    pub resolver: ResolverSettings,
    #[serde(default)]
    pub lookup: LookupSettings,
    /// Extra abbreviations merged into the formatter's tables
    #[serde(default)]
    pub rules: RuleOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolverSettings {
    /// Use `*Brown*, 347 U.S. at 490.` instead of supra for repeat cases
    #[serde(default)]
    pub case_short_form: bool,
}

/// Configuration with its origin
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: Config,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
pub fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    // An empty file is a valid, all-defaults config
    if content.trim().is_empty() {
        return Ok(Config::default());
    }

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Apply environment overrides through `env`
fn apply_env(config: &mut Config, env: &dyn Fn(&str) -> Option<String>) {
    if let Some(offline) = env("BLUEBOOK_OFFLINE") {
        let offline = offline.trim().to_lowercase();
        if !offline.is_empty() && !matches!(offline.as_str(), "0" | "false" | "no") {
            config.lookup.enabled = false;
        }
    }

    if let Some(token) = env("BLUEBOOK_COURTLISTENER_TOKEN").filter(|t| !t.trim().is_empty()) {
        config.lookup.courtlistener_token = Some(token.trim().to_string());
    }
}

/// Load configuration starting the file search at `start`
fn load_config_from(start: &Path, env: &dyn Fn(&str) -> Option<String>) -> Result<ResolvedConfig> {
    let config_file = match env("BLUEBOOK_CONFIG") {
        Some(explicit) => Some(PathBuf::from(explicit)),
        None => find_config_file(start).or_else(|| {
            dirs::home_dir()
                .map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
                .filter(|path| path.exists())
        }),
    };

    let mut config = match &config_file {
        Some(path) => load_config_file(path)?,
        None => Config::default(),
    };
    apply_env(&mut config, env);

    Ok(ResolvedConfig {
        config,
        config_file,
    })
}

fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    load_config_from(&cwd, &|key| std::env::var(key).ok())
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}
