pub mod settings;

pub use settings::{
    user_config_path, AppSettings, LoggingSettings, PreviewBackend, PreviewSettings,
    ProfileSettings, SettingsError, WindowSettings,
};
