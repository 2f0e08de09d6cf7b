use crate::proc::registry::KillBounds;
use anyhow::{Context, Result};
use colored::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TermConfig {
    pub history_file: PathBuf,
    pub error_log_file: PathBuf,
    pub history_limit: usize,
    pub error_window: usize,
    /// 0 disables the foreground timeout entirely.
    pub command_timeout_secs: u64,
    pub kill_grace_secs: u64,
    pub kill_force_secs: u64,
    /// 0 disables rotation (unbounded audit log).
    pub error_log_max_bytes: u64,
    pub cwd: Option<PathBuf>,
    pub env: HashMap<String, String>,
}

impl Default for TermConfig {
    fn default() -> Self {
        Self {
            history_file: PathBuf::from(".pterm").join("history"),
            error_log_file: PathBuf::from(".pterm").join("errors.log"),
            history_limit: crate::history::DEFAULT_LIMIT,
            error_window: crate::errlog::DEFAULT_WINDOW,
            command_timeout_secs: 1800,
            kill_grace_secs: 3,
            kill_force_secs: 1,
            error_log_max_bytes: 1024 * 1024,
            cwd: None,
            env: HashMap::new(),
        }
    }
}

impl TermConfig {
    pub fn timeout(&self) -> Option<Duration> {
        match self.command_timeout_secs {
            0 => None,
            s => Some(Duration::from_secs(s)),
        }
    }

    pub fn rotate_bytes(&self) -> Option<u64> {
        match self.error_log_max_bytes {
            0 => None,
            n => Some(n),
        }
    }

    pub fn kill_bounds(&self) -> KillBounds {
        KillBounds {
            grace: Duration::from_secs(self.kill_grace_secs),
            force: Duration::from_secs(self.kill_force_secs),
        }
    }
}

/// Loads `pterm.toml` from `dir` when present, then applies the `.env`
/// override layer. Missing config means defaults; the engine must come up
/// inside any host directory.
pub fn load_config(dir: &Path) -> Result<TermConfig> {
    let config_path = dir.join("pterm.toml");
    let mut config = if config_path.exists() {
        let content = fs::read_to_string(&config_path).context("Failed to read pterm.toml")?;
        toml::from_str(&content).context("Failed to parse pterm.toml")?
    } else {
        TermConfig::default()
    };

    // Resolve storage paths against the config directory
    if config.history_file.is_relative() {
        config.history_file = dir.join(&config.history_file);
    }
    if config.error_log_file.is_relative() {
        config.error_log_file = dir.join(&config.error_log_file);
    }

    // Load .env using dotenvy (Override Layer).
    // Determines filename: .env or .env.<name> based on PTERM_ENV
    let env_filename = env::var("PTERM_ENV")
        .map(|v| format!(".env.{}", v))
        .unwrap_or_else(|_| ".env".to_string());

    let env_path = dir.join(&env_filename);

    if env_path.exists() {
        eprintln!(
            "{} Loading environment from: {}",
            "🌿".green(),
            env_filename.bold()
        );

        // Keep the vars in the config map, not the process environment,
        // until a command is actually spawned.
        for item in dotenvy::from_path_iter(&env_path)? {
            let (key, val) = item?;
            // .env overrides pterm.toml
            config.env.insert(key, val);
        }
    }

    Ok(config)
}
