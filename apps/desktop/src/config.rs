use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "desktop.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".into(),
            log_filter: "warn".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    log_filter: Option<String>,
}

/// Defaults, then the TOML file, then environment overrides.
///
/// An explicit `path` must exist; the default `desktop.toml` is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let raw = match path {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?,
        ),
        None => fs::read_to_string(DEFAULT_CONFIG_FILE).ok(),
    };
    if let Some(raw) = raw {
        apply_file(&mut settings, &raw)?;
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw).context("invalid config file")?;
    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = lookup("APP__SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = lookup("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let mut settings = Settings::default();
        apply_file(&mut settings, "server_url = \"https://bot.example.com\"\n")
            .expect("apply file");
        assert_eq!(settings.server_url, "https://bot.example.com");
        assert_eq!(settings.log_filter, "warn");
    }

    #[test]
    fn app_prefixed_env_wins_over_plain_env() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SERVER_URL", "http://plain:8000"),
            ("APP__SERVER_URL", "http://prefixed:8000"),
            ("APP__LOG_FILTER", "debug"),
        ]);
        let mut settings = Settings::default();
        apply_env(&mut settings, |key| env.get(key).map(|v| v.to_string()));
        assert_eq!(settings.server_url, "http://prefixed:8000");
        assert_eq!(settings.log_filter, "debug");
    }

    #[test]
    fn rejects_malformed_file() {
        let mut settings = Settings::default();
        assert!(apply_file(&mut settings, "server_url = ").is_err());
    }

    #[test]
    fn missing_explicit_config_file_is_an_error() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("sitechat_missing_{suffix}.toml"));
        assert!(load_settings(Some(&path)).is_err());
    }

    #[test]
    fn reads_explicit_config_file() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("sitechat_config_{suffix}.toml"));
        fs::write(&path, "log_filter = \"info\"\n").expect("write config");

        let settings = load_settings(Some(&path)).expect("load");
        if env::var("APP__LOG_FILTER").is_err() {
            assert_eq!(settings.log_filter, "info");
        }

        fs::remove_file(path).expect("cleanup");
    }
}
