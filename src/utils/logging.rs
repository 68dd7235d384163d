use std::env;
use std::fs;
use std::io;
use std::path::Path;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingSettings;

/// Initialize logging: console output plus an optional session log file
/// that is truncated on every start. `RUST_LOG` overrides the configured level.
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    let enable_backtrace = env::var("RUST_BACKTRACE").map(|v| v == "1").unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| build_filter(&settings.level))?;

    let console = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_ansi(true);

    let file_layer = match &settings.file {
        Some(path) => Some(
            fmt::layer()
                .with_writer(open_session_log(path)?)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .boxed(),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file_layer)
        .try_init()?;

    std::panic::set_hook(Box::new(move |panic_info| {
        tracing::error!("Panic occurred: {}", panic_info);

        if let Some(location) = panic_info.location() {
            tracing::error!(
                "Panic location: {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            );
        }

        if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            tracing::error!("Panic payload: {}", s);
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            tracing::error!("Panic payload: {}", s);
        }

        if enable_backtrace {
            tracing::error!("Backtrace:\n{:?}", std::backtrace::Backtrace::capture());
        }
    }));

    tracing::info!("Logging initialized with level: {}", settings.level);
    match &settings.file {
        Some(path) => tracing::info!("File logging enabled: {}", path.display()),
        None => tracing::info!("File logging disabled"),
    }
    tracing::info!("Backtrace enabled: {}", enable_backtrace);
    Ok(())
}

/// Configured level for everything, with this crate always at debug or above
pub fn build_filter(level: &str) -> anyhow::Result<EnvFilter> {
    let filter = EnvFilter::try_new(level)?
        .add_directive("nexus_viewer=debug".parse()?)
        .add_directive("wgpu_core=warn".parse()?)
        .add_directive("wgpu_hal=warn".parse()?)
        .add_directive("naga=warn".parse()?);
    Ok(filter)
}

fn open_session_log(path: &Path) -> io::Result<fs::File> {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            eprintln!("Warning: Failed to remove existing {}: {}", path.display(), e);
        }
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::File::create(path)
}

/// Log system information for debugging
pub fn log_system_info() {
    tracing::info!("=== System Information ===");
    tracing::info!("OS: {}", env::consts::OS);
    tracing::info!("Architecture: {}", env::consts::ARCH);
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));

    if let Ok(backend) = env::var("WGPU_BACKEND") {
        tracing::info!("WGPU Backend: {}", backend);
    }

    if let Ok(adapter) = env::var("WGPU_ADAPTER_NAME") {
        tracing::info!("WGPU Adapter: {}", adapter);
    }

    tracing::info!("========================");
}

/// Log the outcome of a wgpu operation and pass the result through
pub fn handle_wgpu_result<T, E: std::fmt::Display>(
    result: Result<T, E>,
    operation: &str,
) -> Result<T, E> {
    match &result {
        Ok(_) => {
            tracing::debug!("WGPU operation '{}' completed successfully", operation);
        }
        Err(e) => {
            tracing::error!("WGPU operation '{}' failed: {}", operation, e);
        }
    }
    result
}

/// Log wgpu adapter information
pub fn log_adapter_info(adapter: &wgpu::Adapter) {
    let info = adapter.get_info();
    tracing::info!("=== WGPU Adapter Information ===");
    tracing::info!("Name: {}", info.name);
    tracing::info!("Backend: {:?}", info.backend);
    tracing::info!("Device Type: {:?}", info.device_type);
    tracing::info!("Driver: {} {}", info.driver, info.driver_info);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_accepts_levels() {
        assert!(build_filter("info").is_ok());
        assert!(build_filter("warn,nexus_viewer::rendering=trace").is_ok());
    }

    #[test]
    fn test_filter_rejects_garbage() {
        assert!(build_filter("not a level=[").is_err());
    }

    #[test]
    fn test_session_log_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("session.txt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "old session").unwrap();

        drop(open_session_log(&path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }
}
