use eframe::egui;
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::{AppSettings, PreviewBackend};
use crate::rendering::backend::{SoftwareBackend, WgpuBackend};
use crate::rendering::renderer::RendererOptions;
use crate::rendering::{RenderBackend, SceneRenderer, SurfaceSize};
use crate::ui::pages::avatar::AvatarPageState;
use crate::ui::UiState;
use crate::world::Uploader;

pub fn preview_backend(kind: PreviewBackend) -> Box<dyn RenderBackend> {
    match kind {
        PreviewBackend::Gpu => Box::new(WgpuBackend::new()),
        PreviewBackend::Software => Box::new(SoftwareBackend::new()),
    }
}

/// Fresh view state over an already loaded catalog
pub fn build_ui_state(catalog: Catalog, settings: AppSettings, runtime: Handle) -> UiState {
    let renderer = SceneRenderer::new(
        preview_backend(settings.preview.backend),
        RendererOptions::from(&settings.preview),
    );
    let preview_size = SurfaceSize::new(settings.preview.width, settings.preview.height);
    let avatar = AvatarPageState::new(
        catalog.avatar_items().to_vec(),
        renderer,
        preview_size,
        Uploader::new(runtime),
    );
    UiState::new(catalog, settings, avatar)
}

pub struct NexusApp {
    catalog: Catalog,
    settings: AppSettings,
    runtime: Handle,
    ui: UiState,
}

impl NexusApp {
    pub fn new(cc: &eframe::CreationContext<'_>, catalog: Catalog, settings: AppSettings, runtime: Handle) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        let ui = build_ui_state(catalog.clone(), settings.clone(), runtime.clone());
        info!(
            "Dashboard ready: {} experiences, {} avatar items, {} preview",
            catalog.experiences().len(),
            catalog.avatar_items().len(),
            ui.avatar.renderer().backend().name()
        );
        Self {
            catalog,
            settings,
            runtime,
            ui,
        }
    }

    /// Throw away all view state, as a page reload would
    fn reload(&mut self) {
        warn!("Reloading application state");
        self.ui.avatar.leave();
        self.ui = build_ui_state(self.catalog.clone(), self.settings.clone(), self.runtime.clone());
    }
}

impl eframe::App for NexusApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.ui.show(ctx) {
            self.reload();
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.ui.avatar.leave();
        info!("Shutting down");
    }
}
