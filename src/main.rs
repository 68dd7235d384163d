use std::path::PathBuf;

use anyhow::Context;
use eframe::egui;
use tracing::info;

use nexus_viewer::app::NexusApp;
use nexus_viewer::catalog::Catalog;
use nexus_viewer::config::AppSettings;
use nexus_viewer::utils::logging::{init_logging, log_system_info};

/// `--config <path>` or `--config=<path>`
fn config_arg(mut args: impl Iterator<Item = String>) -> Option<PathBuf> {
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    None
}

fn main() -> anyhow::Result<()> {
    let config_path = config_arg(std::env::args().skip(1));
    let settings = AppSettings::load(config_path.as_deref()).context("loading settings")?;

    init_logging(&settings.logging).context("initializing logging")?;
    log_system_info();

    let catalog = Catalog::load_or_builtin(settings.catalog_path.as_deref()).context("loading catalog")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("nexus-worker")
        .build()
        .context("starting tokio runtime")?;
    let handle = runtime.handle().clone();

    let title = format!("{} {}", settings.window.title, nexus_viewer::VERSION);
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(&title)
            .with_inner_size([settings.window.width, settings.window.height]),
        ..Default::default()
    };

    info!("Starting {}", title);
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Ok(Box::new(NexusApp::new(cc, catalog, settings, handle)))),
    )
    .map_err(|e| anyhow::anyhow!("window closed with error: {e}"))?;

    runtime.shutdown_background();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_config_arg_forms() {
        assert_eq!(config_arg(args(&["--config", "a.toml"])), Some(PathBuf::from("a.toml")));
        assert_eq!(config_arg(args(&["-v", "--config=b.toml"])), Some(PathBuf::from("b.toml")));
        assert_eq!(config_arg(args(&["--config"])), None);
        assert_eq!(config_arg(args(&[])), None);
    }
}
