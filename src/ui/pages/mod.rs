pub mod avatar;
pub mod detail;
pub mod discover;
pub mod home;
pub mod placeholder;

use eframe::egui;
use egui::{Color32, RichText};

use crate::catalog::Catalog;
use crate::config::ProfileSettings;
use crate::ui::navigation::{NavAction, NavQueue};

/// Read-only data plus the navigation outbox every view gets
pub struct ViewContext<'a> {
    pub catalog: &'a Catalog,
    pub profile: &'a ProfileSettings,
    pub nav: &'a mut NavQueue,
}

impl ViewContext<'_> {
    pub fn request(&mut self, action: NavAction) {
        self.nav.push(action);
    }
}

pub(crate) fn section_heading(ui: &mut egui::Ui, title: &str) {
    ui.add_space(16.0);
    ui.label(RichText::new(title).size(22.0).strong().color(Color32::WHITE));
    ui.add_space(8.0);
}
