use std::path::{Path, PathBuf};
use std::time::Duration;

use ::config::{Config, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::rendering::renderer::RendererOptions;

const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "NEXUS";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: f32,
    pub height: f32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Nexus".to_string(),
            width: 1280.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    pub display_name: String,
    pub currency_balance: u64,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            display_name: "Player".to_string(),
            currency_balance: 1250,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewBackend {
    /// Offscreen wgpu rendering with CPU readback
    #[default]
    Gpu,
    /// CPU rasterizer, always available
    Software,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    pub backend: PreviewBackend,
    pub rotation_step: f32,
    pub width: u32,
    pub height: u32,
    pub slow_frame_ms: u64,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            backend: PreviewBackend::Gpu,
            rotation_step: 0.01,
            width: 480,
            height: 480,
            slow_frame_ms: 16,
        }
    }
}

impl From<&PreviewSettings> for RendererOptions {
    fn from(preview: &PreviewSettings) -> Self {
        RendererOptions {
            rotation_step: preview.rotation_step,
            slow_frame_budget: Duration::from_millis(preview.slow_frame_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    /// Session log, recreated on every start
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some(PathBuf::from("log.txt")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub window: WindowSettings,
    pub profile: ProfileSettings,
    pub preview: PreviewSettings,
    pub logging: LoggingSettings,
    pub catalog_path: Option<PathBuf>,
}

impl AppSettings {
    /// Defaults, then the per-user settings file, then `explicit`, then
    /// `NEXUS__SECTION__KEY` environment variables.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();

        if let Some(path) = user_config_path() {
            debug!("User settings path: {}", path.display());
            builder = builder.add_source(toml_file(&path).required(false));
        }
        if let Some(path) = explicit {
            info!("Loading settings from {}", path.display());
            builder = builder.add_source(toml_file(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let settings: AppSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml_str(data: &str) -> Result<Self, SettingsError> {
        let settings: AppSettings = Config::builder()
            .add_source(File::from_str(data, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.preview.rotation_step.is_finite() {
            return Err(SettingsError::Invalid {
                field: "preview.rotation_step",
                reason: "must be a finite number".to_string(),
            });
        }
        if self.preview.width == 0 || self.preview.height == 0 {
            return Err(SettingsError::Invalid {
                field: "preview.width/height",
                reason: "preview must have a non-zero size".to_string(),
            });
        }
        if self.window.width <= 0.0 || self.window.height <= 0.0 {
            return Err(SettingsError::Invalid {
                field: "window.width/height",
                reason: "window must have a positive size".to_string(),
            });
        }
        Ok(())
    }
}

fn toml_file(path: &Path) -> File<::config::FileSourceFile, FileFormat> {
    File::new(&path.to_string_lossy(), FileFormat::Toml)
}

pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "nexus", "nexus-viewer").map(|proj| proj.config_dir().join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let settings = AppSettings::from_toml_str("").unwrap();
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.preview.backend, PreviewBackend::Gpu);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let settings = AppSettings::from_toml_str(
            r#"
            catalog_path = "data/catalog.toml"

            [preview]
            backend = "software"
            rotation_step = 0.02

            [profile]
            display_name = "Nova"
            "#,
        )
        .unwrap();

        assert_eq!(settings.preview.backend, PreviewBackend::Software);
        assert_eq!(settings.preview.width, 480);
        assert_eq!(settings.profile.display_name, "Nova");
        assert_eq!(settings.profile.currency_balance, 1250);
        assert_eq!(settings.catalog_path, Some(PathBuf::from("data/catalog.toml")));

        let options = RendererOptions::from(&settings.preview);
        assert_eq!(options.rotation_step, 0.02);
        assert_eq!(options.slow_frame_budget, Duration::from_millis(16));
    }

    #[test]
    fn test_rejects_zero_preview() {
        let err = AppSettings::from_toml_str("[preview]\nwidth = 0").unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { .. }));
    }

    #[test]
    fn test_unknown_backend_is_an_error() {
        assert!(AppSettings::from_toml_str("[preview]\nbackend = \"vulkan\"").is_err());
    }
}
