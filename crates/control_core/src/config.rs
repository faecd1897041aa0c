use std::{
    fs,
    io::ErrorKind,
    path::Path,
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend_url: String,
    pub relay_url: String,
    pub probe_timeout: Duration,
    pub request_timeout: Duration,
    /// Bound on start-job. `None` waits for the backend however long the search takes.
    pub job_timeout: Option<Duration>,
    pub relay_connect_timeout: Duration,
    /// Keep the process alive with zero surfaces (activation-driven platforms).
    pub persist_without_surfaces: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:3000".into(),
            relay_url: "ws://localhost:3000/ws".into(),
            probe_timeout: Duration::from_secs(3),
            request_timeout: Duration::from_secs(10),
            job_timeout: None,
            relay_connect_timeout: Duration::from_secs(5),
            persist_without_surfaces: cfg!(target_os = "macos"),
        }
    }
}

impl Settings {
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.backend_url.trim_end_matches('/'))
    }

    pub fn status_url(&self) -> String {
        self.endpoint("/api/stats")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    backend_url: Option<String>,
    relay_url: Option<String>,
    probe_timeout_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
    job_timeout_ms: Option<u64>,
    relay_connect_timeout_ms: Option<u64>,
    persist_without_surfaces: Option<bool>,
}

/// Defaults, then the TOML file, then environment overrides.
///
/// A missing default file is fine; a missing file that was asked for explicitly is not.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let file_path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    match fs::read_to_string(file_path) {
        Ok(raw) => apply_file_overrides(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", file_path.display()))?,
        Err(err) if err.kind() == ErrorKind::NotFound && path.is_none() => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", file_path.display()))
        }
    }

    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

pub fn apply_file_overrides(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;

    if let Some(v) = file_cfg.backend_url {
        settings.backend_url = v;
    }
    if let Some(v) = file_cfg.relay_url {
        settings.relay_url = v;
    }
    if let Some(v) = file_cfg.probe_timeout_ms {
        settings.probe_timeout = Duration::from_millis(v);
    }
    if let Some(v) = file_cfg.request_timeout_ms {
        settings.request_timeout = Duration::from_millis(v);
    }
    if let Some(v) = file_cfg.job_timeout_ms {
        settings.job_timeout = Some(Duration::from_millis(v));
    }
    if let Some(v) = file_cfg.relay_connect_timeout_ms {
        settings.relay_connect_timeout = Duration::from_millis(v);
    }
    if let Some(v) = file_cfg.persist_without_surfaces {
        settings.persist_without_surfaces = v;
    }
    Ok(())
}

pub fn apply_env_overrides(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("BACKEND_URL") {
        settings.backend_url = v;
    }
    if let Some(v) = var("APP__BACKEND_URL") {
        settings.backend_url = v;
    }

    if let Some(v) = var("RELAY_URL") {
        settings.relay_url = v;
    }
    if let Some(v) = var("APP__RELAY_URL") {
        settings.relay_url = v;
    }

    if let Some(ms) = var("APP__PROBE_TIMEOUT_MS").and_then(|v| v.parse::<u64>().ok()) {
        settings.probe_timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = var("APP__REQUEST_TIMEOUT_MS").and_then(|v| v.parse::<u64>().ok()) {
        settings.request_timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = var("APP__JOB_TIMEOUT_MS").and_then(|v| v.parse::<u64>().ok()) {
        settings.job_timeout = Some(Duration::from_millis(ms));
    }
    if let Some(ms) = var("APP__RELAY_CONNECT_TIMEOUT_MS").and_then(|v| v.parse::<u64>().ok()) {
        settings.relay_connect_timeout = Duration::from_millis(ms);
    }
    if let Some(flag) = var("APP__PERSIST_WITHOUT_SURFACES").and_then(|v| parse_flag(&v)) {
        settings.persist_without_surfaces = flag;
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
