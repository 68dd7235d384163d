// Nexus: game platform dashboard with a live avatar preview

pub mod app;
pub mod catalog;
pub mod config;
pub mod rendering;
pub mod ui;
pub mod utils;
pub mod validation;
pub mod world;

pub use crate::catalog::{Catalog, CatalogError};
pub use crate::config::{AppSettings, SettingsError};
pub use crate::rendering::{SceneError, SceneRenderer};
pub use crate::validation::ValidationError;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
