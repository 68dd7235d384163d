use eframe::egui;
use egui::{Color32, RichText};

use crate::ui::navigation::Page;

pub fn show(ui: &mut egui::Ui, page: Page) {
    ui.vertical_centered(|ui| {
        ui.add_space(ui.available_height() * 0.3);
        ui.label(RichText::new(page.name()).size(36.0).strong().color(Color32::from_gray(0x9c)));
        ui.add_space(8.0);
        ui.label(RichText::new("This page is under construction.").size(18.0));
        ui.label("Check back later for more amazing content!");
    });
}
