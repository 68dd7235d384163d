use eframe::egui;
use egui::{Color32, RichText};
use tracing::info;

use crate::config::ProfileSettings;
use crate::ui::navigation::{NavAction, NavQueue, Page};

const MENU_PAGES: [Page; 4] = [Page::Profile, Page::Friends, Page::Settings, Page::Billing];

/// `1250` -> `1,250`
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn show(ui: &mut egui::Ui, profile: &ProfileSettings, search: &mut String, nav: &mut NavQueue) {
    ui.horizontal(|ui| {
        ui.add(
            egui::TextEdit::singleline(search)
                .hint_text("🔍 Search experiences...")
                .desired_width(360.0),
        );

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.menu_button(format!("{} ⏷", profile.display_name), |ui| {
                for page in MENU_PAGES {
                    if ui.button(page.name()).clicked() {
                        nav.push(NavAction::Navigate(page));
                        ui.close_menu();
                    }
                }
                ui.separator();
                if ui.button("Logout").clicked() {
                    info!("User clicked logout");
                    ui.close_menu();
                }
            });

            ui.label(
                RichText::new(format!("◉ {}", format_thousands(profile.currency_balance)))
                    .strong()
                    .color(Color32::from_rgb(0xfa, 0xcc, 0x15)),
            );
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1250), "1,250");
        assert_eq!(format_thousands(1_234_567), "1,234,567");
    }
}
