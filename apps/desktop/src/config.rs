use std::{fs, path::{Path, PathBuf}, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use game_core::{LevelCatalog, SessionConfig};
use platform_integration::{InterludeProvider, NoInterlude, SimulatedInterlude};
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "zviryata.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterludeMode {
    Off,
    #[default]
    Simulated,
    Failing,
}

impl FromStr for InterludeMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "off" | "none" | "false" => Ok(Self::Off),
            "simulated" | "on" | "true" => Ok(Self::Simulated),
            "failing" => Ok(Self::Failing),
            other => Err(format!(
                "unknown interlude mode '{other}' (expected off, simulated or failing)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub catalog_path: Option<PathBuf>,
    pub celebration_delay_ms: u64,
    pub interlude: InterludeMode,
    pub interlude_display_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: storage::DEFAULT_DATABASE_URL.into(),
            catalog_path: None,
            celebration_delay_ms: game_core::DEFAULT_CELEBRATION_DELAY.as_millis() as u64,
            interlude: InterludeMode::default(),
            interlude_display_ms: 1500,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    database_url: Option<String>,
    catalog_path: Option<PathBuf>,
    celebration_delay_ms: Option<u64>,
    interlude: Option<String>,
    interlude_display_ms: Option<u64>,
}

impl Settings {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            celebration_delay: Duration::from_millis(self.celebration_delay_ms),
            ..SessionConfig::default()
        }
    }

    pub fn load_catalog(&self) -> anyhow::Result<LevelCatalog> {
        match &self.catalog_path {
            Some(path) => LevelCatalog::from_path(path)
                .with_context(|| format!("failed to load catalog from '{}'", path.display())),
            None => Ok(LevelCatalog::builtin()),
        }
    }

    pub fn interlude_provider(&self) -> Arc<dyn InterludeProvider> {
        let display_for = Duration::from_millis(self.interlude_display_ms);
        match self.interlude {
            InterludeMode::Off => Arc::new(NoInterlude),
            InterludeMode::Simulated => Arc::new(SimulatedInterlude::new(display_for)),
            InterludeMode::Failing => Arc::new(SimulatedInterlude::failing(
                display_for,
                "simulated interlude failure",
            )),
        }
    }
}

/// Defaults, then the optional config file, then environment variables.
pub fn load_settings(config_path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        if let Err(err) = apply_file(&mut settings, &raw) {
            warn!(path = %config_path.display(), error = %err, "ignoring malformed config file");
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut Settings, raw: &str) -> Result<(), toml::de::Error> {
    let file_cfg: FileSettings = toml::from_str(raw)?;

    if let Some(v) = file_cfg.database_url {
        settings.database_url = v;
    }
    if let Some(v) = file_cfg.catalog_path {
        settings.catalog_path = Some(v);
    }
    if let Some(v) = file_cfg.celebration_delay_ms {
        settings.celebration_delay_ms = v;
    }
    if let Some(v) = file_cfg.interlude {
        match v.parse() {
            Ok(mode) => settings.interlude = mode,
            Err(err) => warn!(error = %err, "ignoring interlude setting from config file"),
        }
    }
    if let Some(v) = file_cfg.interlude_display_ms {
        settings.interlude_display_ms = v;
    }

    Ok(())
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = var("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = var("APP__CATALOG_PATH") {
        settings.catalog_path = Some(PathBuf::from(v));
    }

    if let Some(v) = var("APP__CELEBRATION_DELAY_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.celebration_delay_ms = parsed;
        }
    }

    if let Some(v) = var("APP__INTERLUDE") {
        if let Ok(mode) = v.parse() {
            settings.interlude = mode;
        }
    }

    if let Some(v) = var("APP__INTERLUDE_DISPLAY_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.interlude_display_ms = parsed;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
