use eframe::egui;
use egui::{Align2, Vec2};

pub struct ModalConfig {
    pub title: String,
    pub min_width: f32,
    pub anchor: Align2,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            title: "Modal".to_string(),
            min_width: 400.0,
            anchor: Align2::CENTER_CENTER,
        }
    }
}

impl ModalConfig {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Centered, non-resizable window. `open` is cleared by the title-bar close
/// button; the content can clear it too.
pub fn show_modal<R>(
    ctx: &egui::Context,
    config: ModalConfig,
    open: &mut bool,
    content: impl FnOnce(&mut egui::Ui, &mut bool) -> R,
) -> Option<R> {
    if !*open {
        return None;
    }

    let mut window_open = true;
    let mut keep_open = true;
    let result = egui::Window::new(config.title)
        .anchor(config.anchor, Vec2::ZERO)
        .collapsible(false)
        .resizable(false)
        .open(&mut window_open)
        .show(ctx, |ui| {
            ui.set_min_width(config.min_width);
            content(ui, &mut keep_open)
        })
        .and_then(|inner| inner.inner);

    *open = window_open && keep_open;
    result
}
