//! Scenario loading and parsing

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Scenario file (loaded from a .toml file)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub owners: Vec<OwnerConfig>,
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Include listener counts after every step, not only trigger steps
    #[serde(default)]
    pub show_registry: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Txt,
    Json,
}

/// A named subscriber that method listeners can bind to
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OwnerConfig {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepConfig {
    Subscribe {
        listener: String,
        owner: Option<String>,
    },
    Unsubscribe {
        listener: String,
        owner: Option<String>,
    },
    UnsubscribeAll,
    Trigger {
        source: String,
        value: i64,
    },
    /// Release the scenario's handle on an owner without unsubscribing it
    DropOwner {
        owner: String,
    },
}

/// Problems found while resolving a scenario against the listener catalog
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScenarioError {
    #[error("Step {step}: unknown listener '{listener}'")]
    UnknownListener { step: usize, listener: String },

    #[error("Step {step}: unknown owner '{owner}'")]
    UnknownOwner { step: usize, owner: String },

    #[error("Step {step}: owner '{owner}' was already dropped")]
    OwnerDropped { step: usize, owner: String },

    #[error("Step {step}: listener '{listener}' is a method and needs an owner")]
    MissingOwner { step: usize, listener: String },

    #[error("Step {step}: listener '{listener}' is a free function and takes no owner")]
    UnexpectedOwner { step: usize, listener: String },

    #[error("Owner '{0}' is declared more than once")]
    DuplicateOwner(String),
}

/// Parse a scenario from TOML text
pub fn parse_config(content: &str) -> Result<ScenarioConfig> {
    let config: ScenarioConfig = toml::from_str(content).context("Failed to parse scenario")?;
    Ok(config)
}

/// Load a scenario from a TOML file
pub fn load_config(path: &Path) -> Result<ScenarioConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file: {:?}", path))?;

    let config = parse_config(&content)
        .with_context(|| format!("Failed to parse scenario file: {:?}", path))?;

    log::debug!(
        "Scenario '{}': {} owner(s), {} step(s)",
        config.name,
        config.owners.len(),
        config.steps.len()
    );

    Ok(config)
}
