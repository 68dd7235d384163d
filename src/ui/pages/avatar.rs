use std::time::Duration;

use eframe::egui;
use egui::{Color32, ColorImage, RichText, TextureOptions, Vec2};
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::{AvatarCategory, AvatarItem};
use crate::rendering::{PreviewSurface, RenderBackend, SceneError, SceneRenderer, SurfaceSize};
use crate::ui::boundary::RenderFailure;
use crate::ui::components::{
    loading_button, pill, show_modal, show_spinner_with_text, show_status_slot, ButtonStyle, ComboField, FormField,
    ModalConfig, StatusMessage, StyledButton,
};
use crate::validation::{ValidationError, ValidationResult};
use crate::world::{Outfit, PendingFile, UploadDraft, UploadEvent, Uploader};

pub type PreviewRenderer = SceneRenderer<Box<dyn RenderBackend>>;

const USER_ITEM_PREFIX: &str = "user-item-";

#[derive(Debug, Default)]
struct UploadModal {
    open: bool,
    draft: UploadDraft,
    error: Option<ValidationError>,
    ticket: Option<Uuid>,
}

/// Wardrobe, outfit, live preview and upload flow behind the Avatar page
pub struct AvatarPageState {
    wardrobe: Vec<AvatarItem>,
    outfit: Outfit,
    pub selected_category: AvatarCategory,
    renderer: PreviewRenderer,
    surface: PreviewSurface,
    texture: Option<egui::TextureHandle>,
    mount_attempted: bool,
    uploader: Uploader,
    upload: UploadModal,
    pub status: Option<StatusMessage>,
}

impl AvatarPageState {
    pub fn new(
        wardrobe: Vec<AvatarItem>,
        renderer: PreviewRenderer,
        preview_size: SurfaceSize,
        uploader: Uploader,
    ) -> Self {
        Self {
            wardrobe,
            outfit: Outfit::new(),
            selected_category: AvatarCategory::Hats,
            renderer,
            surface: PreviewSurface::new(preview_size),
            texture: None,
            mount_attempted: false,
            uploader,
            upload: UploadModal::default(),
            status: None,
        }
    }

    pub fn wardrobe(&self) -> &[AvatarItem] {
        &self.wardrobe
    }

    pub fn outfit(&self) -> &Outfit {
        &self.outfit
    }

    pub fn renderer(&self) -> &PreviewRenderer {
        &self.renderer
    }

    pub fn surface(&self) -> &PreviewSurface {
        &self.surface
    }

    pub fn items_in_category(&self, category: AvatarCategory) -> impl Iterator<Item = &AvatarItem> {
        self.wardrobe.iter().filter(move |i| i.category == category)
    }

    /// Items added through the upload flow
    pub fn my_items(&self) -> impl Iterator<Item = &AvatarItem> {
        self.wardrobe.iter().filter(|i| i.id.starts_with(USER_ITEM_PREFIX))
    }

    pub fn toggle_item(&mut self, id: &str) -> bool {
        let Some(item) = self.wardrobe.iter().find(|i| i.id == id).cloned() else {
            warn!("Toggle for unknown item {}", id);
            return false;
        };
        let equipped = self.outfit.toggle(&item);
        self.renderer.set_equipped(self.outfit.items());
        equipped
    }

    pub fn reset_outfit(&mut self) {
        self.outfit.reset();
        self.renderer.set_equipped(self.outfit.items());
    }

    pub fn save(&mut self) {
        let ids: Vec<&str> = self.outfit.items().iter().map(|i| i.id.as_str()).collect();
        info!("Avatar saved: {:?}", ids);
        self.status = Some(StatusMessage::success("Avatar saved!").expires_after(Duration::from_secs(3)));
    }

    /// Called when the page becomes visible; mounts the preview once per visit
    pub fn enter(&mut self) {
        if self.mount_attempted {
            return;
        }
        self.mount_attempted = true;
        self.renderer.set_equipped(self.outfit.items());
        if let Err(e) = self.renderer.mount(&self.surface) {
            warn!("Avatar preview unavailable: {}", e);
        }
    }

    /// Called when navigating away
    pub fn leave(&mut self) {
        self.renderer.unmount();
        self.texture = None;
        self.mount_attempted = false;
    }

    pub fn is_upload_open(&self) -> bool {
        self.upload.open
    }

    pub fn upload_draft_mut(&mut self) -> &mut UploadDraft {
        &mut self.upload.draft
    }

    pub fn upload_error(&self) -> Option<&ValidationError> {
        self.upload.error.as_ref()
    }

    pub fn is_uploading(&self) -> bool {
        self.upload.ticket.is_some()
    }

    /// A file was picked; open the modal with name and category defaults
    pub fn begin_upload(&mut self, file: PendingFile) {
        self.uploader.cancel();
        self.upload = UploadModal {
            open: true,
            draft: UploadDraft::new(file),
            error: None,
            ticket: None,
        };
    }

    pub fn confirm_upload(&mut self) -> ValidationResult<Uuid> {
        match self.uploader.start(&self.upload.draft) {
            Ok(ticket) => {
                self.upload.error = None;
                self.upload.ticket = Some(ticket);
                Ok(ticket)
            }
            Err(e) => {
                self.upload.error = Some(e.clone());
                Err(e)
            }
        }
    }

    pub fn close_upload(&mut self) {
        self.uploader.cancel();
        self.upload = UploadModal::default();
    }

    /// Drain finished uploads. A new item joins the wardrobe and its
    /// category becomes the selected tab.
    pub fn poll_uploads(&mut self) -> Option<AvatarItem> {
        match self.uploader.poll()? {
            UploadEvent::Complete(done) => {
                let item = done.item;
                self.selected_category = item.category;
                self.wardrobe.push(item.clone());
                self.upload = UploadModal::default();
                self.status = Some(
                    StatusMessage::success(format!("Uploaded {}", item.name))
                        .expires_after(Duration::from_secs(3)),
                );
                Some(item)
            }
            UploadEvent::Failed(failed) => {
                self.upload.ticket = None;
                self.status = Some(StatusMessage::error(format!("Upload failed: {}", failed.reason)));
                None
            }
        }
    }

    /// Track the on-screen preview size, step the animation and refresh the texture
    pub fn tick_preview(&mut self, ctx: &egui::Context, size_points: Vec2) {
        let ppp = ctx.pixels_per_point();
        let size = SurfaceSize::new(
            (size_points.x * ppp).round().max(0.0) as u32,
            (size_points.y * ppp).round().max(0.0) as u32,
        );
        if !size.is_empty() {
            self.surface.set_size(size);
        }

        if !self.renderer.is_running() {
            return;
        }
        if self.renderer.frame().is_err() {
            return;
        }
        if let Some(frame) = self.renderer.frame_image() {
            let image = ColorImage::from_rgba_unmultiplied(
                [frame.width() as usize, frame.height() as usize],
                frame.as_raw(),
            );
            match self.texture.as_mut() {
                Some(texture) => texture.set(image, TextureOptions::LINEAR),
                None => {
                    self.texture = Some(ctx.load_texture("avatar-preview", image, TextureOptions::LINEAR))
                }
            }
        }
        ctx.request_repaint();
    }
}

pub fn show(ui: &mut egui::Ui, state: &mut AvatarPageState) -> Result<(), RenderFailure> {
    state.enter();
    if state.is_uploading() {
        ui.ctx().request_repaint_after(Duration::from_millis(100));
    }

    ui.columns(2, |columns| {
        let (left, right) = columns.split_at_mut(1);
        preview_column(&mut left[0], state);
        wardrobe_column(&mut right[0], state);
    });

    upload_modal(ui.ctx(), state);
    Ok(())
}

fn preview_column(ui: &mut egui::Ui, state: &mut AvatarPageState) {
    ui.vertical_centered(|ui| {
        ui.label(RichText::new("Your Avatar").size(24.0).strong().color(Color32::WHITE));
    });

    let side = ui.available_width().min(480.0);
    let size = Vec2::splat(side);
    state.tick_preview(ui.ctx(), size);

    match (&state.texture, state.renderer.last_error()) {
        (Some(texture), None) => {
            let response = ui.image((texture.id(), size));
            let overlay = response.rect.shrink(8.0);
            let painter = ui.painter_at(response.rect);
            painter.text(
                overlay.left_top(),
                egui::Align2::LEFT_TOP,
                format!("{} items equipped", state.outfit.len()),
                egui::FontId::proportional(14.0),
                Color32::WHITE,
            );
            painter.text(
                overlay.right_top(),
                egui::Align2::RIGHT_TOP,
                format!("{:.0} fps", state.renderer.stats().fps),
                egui::FontId::monospace(12.0),
                Color32::LIGHT_GRAY,
            );
        }
        (_, Some(error)) => preview_placeholder(ui, size, error),
        (None, None) => {
            ui.allocate_ui(size, |ui| show_spinner_with_text(ui, "Preparing preview..."));
        }
    }

    ui.horizontal(|ui| {
        if ui.button("Reset Camera").clicked() {
            state.renderer.reset_camera();
        }
    });
}

fn preview_placeholder(ui: &mut egui::Ui, size: Vec2, error: &SceneError) {
    let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
    ui.painter().rect_filled(rect, 12.0, Color32::from_rgb(0x1f, 0x29, 0x37));
    let message = match error {
        SceneError::Unsupported { .. } => "3D preview is not available on this device",
        _ => "3D preview failed to start",
    };
    ui.painter().text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        message,
        egui::FontId::proportional(16.0),
        Color32::GRAY,
    );
}

fn wardrobe_column(ui: &mut egui::Ui, state: &mut AvatarPageState) {
    ui.horizontal(|ui| {
        if StyledButton::new("Save").style(ButtonStyle::Success).show(ui).clicked() {
            state.save();
        }
        if StyledButton::new("Reset").style(ButtonStyle::Danger).show(ui).clicked() {
            state.reset_outfit();
        }
        if StyledButton::new("Upload Asset")
            .enabled(!state.is_uploading())
            .show(ui)
            .clicked()
        {
            pick_model_file(state);
        }
    });
    show_status_slot(ui, &mut state.status);
    ui.add_space(8.0);

    ui.horizontal(|ui| {
        for category in AvatarCategory::ALL {
            if pill(ui, category.label(), state.selected_category == category).clicked() {
                state.selected_category = category;
            }
        }
    });
    ui.add_space(8.0);

    let mut clicked: Option<String> = None;
    egui::ScrollArea::vertical()
        .id_salt("wardrobe")
        .max_height(320.0)
        .show(ui, |ui| {
            ui.horizontal_wrapped(|ui| {
                for item in state.items_in_category(state.selected_category) {
                    let equipped = state.outfit.is_equipped(&item.id);
                    let label = if equipped {
                        format!("✔ {}", item.name)
                    } else {
                        item.name.clone()
                    };
                    let button = egui::Button::new(label)
                        .min_size(Vec2::new(120.0, 64.0))
                        .selected(equipped);
                    if ui.add(button).clicked() {
                        clicked = Some(item.id.clone());
                    }
                }
            });
        });
    if let Some(id) = clicked {
        state.toggle_item(&id);
    }

    ui.add_space(12.0);
    ui.label(RichText::new("My Items").strong().color(Color32::WHITE));
    let mine: Vec<&AvatarItem> = state.my_items().collect();
    if mine.is_empty() {
        ui.label(RichText::new("Uploaded items appear here.").color(Color32::GRAY));
    }
    for item in mine {
        ui.label(format!("{} ({})", item.name, item.category));
    }
}

fn pick_model_file(state: &mut AvatarPageState) {
    let picked = rfd::FileDialog::new()
        .add_filter("glTF model", &["glb", "gltf"])
        .pick_file();
    let Some(path) = picked else {
        return;
    };
    match PendingFile::from_path(&path) {
        Ok(file) => state.begin_upload(file),
        Err(e) => {
            warn!("Cannot read {}: {}", path.display(), e);
            state.status = Some(StatusMessage::error(format!("Cannot read {}", path.display())));
        }
    }
}

fn upload_modal(ctx: &egui::Context, state: &mut AvatarPageState) {
    let mut open = state.upload.open;
    let uploading = state.is_uploading();
    let mut confirm = false;

    show_modal(ctx, ModalConfig::titled("Upload Asset"), &mut open, |ui, keep_open| {
        if let Some(file) = &state.upload.draft.file {
            ui.label(RichText::new(file.file_name()).strong());
            ui.label(format!("{:.2} MB", file.size() as f64 / 1024.0 / 1024.0));
            ui.separator();
        }

        let error = state.upload.error.as_ref().map(ToString::to_string);
        FormField::new("Asset Name", &mut state.upload.draft.name)
            .placeholder("e.g. Wizard Hat")
            .validation_error(error.as_deref())
            .show(ui);

        let options: Vec<(AvatarCategory, &str)> =
            AvatarCategory::ALL.iter().map(|c| (*c, c.label())).collect();
        ComboField::new("Category", &mut state.upload.draft.category, &options).show(ui);

        ui.horizontal(|ui| {
            if loading_button(ui, "Upload", uploading).clicked() {
                confirm = true;
            }
            if !uploading && StyledButton::new("Cancel").style(ButtonStyle::Secondary).show(ui).clicked() {
                *keep_open = false;
            }
        });
    });

    if confirm && state.confirm_upload().is_err() {
        return;
    }
    if state.upload.open && !open {
        state.close_upload();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::backend::HeadlessBackend;
    use crate::rendering::renderer::RendererOptions;

    fn state() -> AvatarPageState {
        let wardrobe = vec![
            AvatarItem::new("hat-1", "Cap", "/m/cap.glb", AvatarCategory::Hats),
            AvatarItem::new("shirt-1", "Tee", "/m/tee.glb", AvatarCategory::Shirts),
            AvatarItem::new("user-item-1", "Mine", "/m/mine.glb", AvatarCategory::Pants),
        ];
        let backend: Box<dyn RenderBackend> = Box::new(HeadlessBackend::new());
        let renderer = SceneRenderer::new(backend, RendererOptions::default());
        let uploader = Uploader::new(tokio::runtime::Handle::current());
        AvatarPageState::new(wardrobe, renderer, SurfaceSize::new(64, 64), uploader)
    }

    #[tokio::test]
    async fn test_toggle_updates_appearance() {
        let mut page = state();
        page.enter();
        assert!(page.renderer().is_mounted());

        assert!(page.toggle_item("shirt-1"));
        assert_eq!(page.renderer().appearance().torso_color, crate::rendering::renderer::SHIRT_COLOR);

        page.reset_outfit();
        assert!(page.outfit().is_empty());
        assert_eq!(page.renderer().appearance().torso_color, crate::rendering::renderer::BODY_COLOR);
    }

    #[tokio::test]
    async fn test_leave_unmounts_and_enter_remounts() {
        let mut page = state();
        page.enter();
        page.leave();
        assert!(!page.renderer().is_mounted());
        assert_eq!(page.surface().listener_count(), 0);
        page.enter();
        assert!(page.renderer().is_mounted());
    }

    #[tokio::test]
    async fn test_my_items_and_unknown_toggle() {
        let mut page = state();
        assert_eq!(page.my_items().count(), 1);
        assert!(!page.toggle_item("nope"));
    }

    #[tokio::test]
    async fn test_invalid_upload_keeps_modal_open() {
        let mut page = state();
        page.begin_upload(PendingFile::new("hat.obj", 10));
        assert!(page.is_upload_open());
        assert!(page.confirm_upload().is_err());
        assert!(page.is_upload_open());
        assert!(!page.is_uploading());
        assert!(matches!(page.upload_error(), Some(ValidationError::UnsupportedFile { .. })));
    }
}
