use crate::domain::date_range::DateRange;
use crate::domain::layout::DEFAULT_GRID_ROWS;
use crate::domain::palette::Palette;
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const BUILTIN_PALETTE: &str = include_str!("../../config/palette.toml");

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngineConfig {
    /// Record field the date-range filter reads
    pub date_field: String,
    pub grid_rows: u32,
    /// Range given to dashboards that have never been saved
    pub default_range: DateRange,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            date_field: "orderDate".to_string(),
            grid_rows: DEFAULT_GRID_ROWS,
            default_range: DateRange::All,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    load_app_config_from(Path::new("config"))
}

/// `app` is required, `app.local` is optional, then `DASHBOARD__SECTION__KEY`
/// environment variables win.
pub fn load_app_config_from(dir: &Path) -> anyhow::Result<AppConfig> {
    let base = dir.join("app");
    let local = dir.join("app.local");

    let settings = config::Config::builder()
        .add_source(config::File::with_name(&base.to_string_lossy()))
        .add_source(config::File::with_name(&local.to_string_lossy()).required(false))
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("loading configuration from {}", dir.display()))?;

    Ok(settings.try_deserialize()?)
}

/// The catalog compiled into the binary.
pub fn builtin_palette() -> anyhow::Result<Palette> {
    toml::from_str(BUILTIN_PALETTE).context("parsing built-in palette")
}

/// `palette.toml` in the config directory replaces the built-in catalog when present.
pub async fn load_palette_config(dir: &Path) -> anyhow::Result<Palette> {
    let path = dir.join("palette.toml");
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return builtin_palette();
    }

    let text = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let palette: Palette =
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;

    tracing::info!("Loaded {} palette archetypes from {}", palette.archetypes.len(), path.display());
    Ok(palette)
}
