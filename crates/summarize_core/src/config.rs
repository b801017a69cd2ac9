use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_json::Value;

pub const DEFAULT_CONFIG_PATH: &str = "config/status.json";

/// Comma-separated organization override, highest precedence.
pub const ORGS_ENV: &str = "SUMMARIZE_ORGS";
/// Single-organization override, consulted when `SUMMARIZE_ORGS` is unset.
pub const ORG_ENV: &str = "SUMMARIZE_ORG";

/// Startup configuration, loaded once and treated as read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub organizations: Vec<String>,
    pub target_repository: Option<String>,
    pub tasks_dir: Option<PathBuf>,
}

impl Config {
    /// The hosted backend requires an `owner/repo` target.
    pub fn require_target_repository(&self) -> Result<&str> {
        self.target_repository
            .as_deref()
            .context("`target_repository` must be specified for the issue backend.")
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    load_config_with_lookup(path, |key| env::var(key).ok())
}

/// Env lookup is injected so tests do not mutate process state.
pub fn load_config_with_lookup(
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config> {
    if !path.exists() {
        bail!(
            "Missing configuration file at {}. Copy config/status.json.example and set `target_repository`.",
            path.display()
        );
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let data: Value = serde_json::from_str(&content)
        .with_context(|| format!("Unable to parse {}", path.display()))?;
    let Value::Object(data) = data else {
        bail!("{} must contain a JSON object.", path.display());
    };

    let target_repository = match data.get("target_repository") {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => {
            let candidate = raw.trim();
            if candidate.is_empty() {
                bail!("`target_repository` in {} cannot be empty.", path.display());
            }
            if !candidate.contains('/') {
                bail!(
                    "`target_repository` in {} must be in the form `owner/repo`.",
                    path.display()
                );
            }
            Some(candidate.to_string())
        }
        Some(_) => bail!("`target_repository` in {} must be a string.", path.display()),
    };

    let tasks_dir = match data.get("tasks_dir") {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => {
            let candidate = raw.trim();
            if candidate.is_empty() {
                bail!("`tasks_dir` in {} cannot be empty.", path.display());
            }
            Some(PathBuf::from(candidate))
        }
        Some(_) => bail!("`tasks_dir` in {} must be a string.", path.display()),
    };

    let configured_organizations = match data.get("organizations") {
        None | Some(Value::Null) => None,
        Some(Value::Array(values)) => {
            let mut cleaned = Vec::new();
            for value in values {
                let Value::String(name) = value else {
                    bail!(
                        "`organizations` in {} must be an array of strings.",
                        path.display()
                    );
                };
                let name = name.trim();
                if !name.is_empty() {
                    cleaned.push(name.to_string());
                }
            }
            Some(cleaned)
        }
        Some(_) => bail!(
            "`organizations` in {} must be an array of strings.",
            path.display()
        ),
    };

    let env_override = lookup(ORGS_ENV)
        .or_else(|| lookup(ORG_ENV))
        .filter(|value| !value.is_empty());

    // A set-but-blank override resets to the default organization; it does
    // not fall through to the config file's list.
    let organizations = match env_override {
        Some(value) => {
            let cleaned: Vec<String> = value
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
            if cleaned.is_empty() { None } else { Some(cleaned) }
        }
        None => configured_organizations.filter(|names| !names.is_empty()),
    }
    .or_else(|| default_organizations(target_repository.as_deref()))
    .with_context(|| {
        format!(
            "No organizations configured: set `organizations` in {} or the {ORGS_ENV} environment variable.",
            path.display()
        )
    })?;

    Ok(Config {
        organizations,
        target_repository,
        tasks_dir,
    })
}

/// Default to the owner half of `target_repository` when no organization
/// list is configured anywhere.
fn default_organizations(target_repository: Option<&str>) -> Option<Vec<String>> {
    let owner = target_repository?.split('/').next()?.trim();
    if owner.is_empty() {
        return None;
    }
    Some(vec![owner.to_string()])
}
