use std::{collections::HashMap, fs, io::ErrorKind, path::Path, time::Duration};

use anyhow::Context;

pub const DEFAULT_CONFIG_FILE: &str = "miner.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: String,
    pub stats_interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".into(),
            stats_interval: Duration::from_millis(1000),
        }
    }
}

pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let file_path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    match fs::read_to_string(file_path) {
        Ok(raw) => {
            let file_cfg: HashMap<String, toml::Value> = toml::from_str(&raw)
                .with_context(|| format!("invalid config file '{}'", file_path.display()))?;
            apply_file_values(&mut settings, &file_cfg)?;
        }
        Err(err) if err.kind() == ErrorKind::NotFound && path.is_none() => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", file_path.display()))
        }
    }

    apply_env(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

fn apply_file_values(
    settings: &mut Settings,
    file_cfg: &HashMap<String, toml::Value>,
) -> anyhow::Result<()> {
    if let Some(v) = file_cfg.get("bind_addr") {
        settings.bind_addr = v
            .as_str()
            .context("bind_addr must be a string")?
            .to_string();
    }
    if let Some(v) = file_cfg.get("stats_interval_ms") {
        let ms = v
            .as_integer()
            .and_then(|ms| u64::try_from(ms).ok())
            .context("stats_interval_ms must be a non-negative integer")?;
        anyhow::ensure!(ms > 0, "stats_interval_ms must be greater than zero");
        settings.stats_interval = Duration::from_millis(ms);
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("MINER_BIND") {
        settings.bind_addr = v;
    }
    if let Some(v) = var("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }

    if let Some(ms) = var("APP__STATS_INTERVAL_MS").and_then(|v| v.parse::<u64>().ok()) {
        if ms > 0 {
            settings.stats_interval = Duration::from_millis(ms);
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
