use eframe::egui;
use egui::{Color32, RichText};

const FILLED: Color32 = Color32::from_rgb(0xfb, 0xbf, 0x24);
const EMPTY: Color32 = Color32::from_gray(0x4b);

/// Stars filled for a (possibly fractional) rating, rounded to the nearest star
pub fn filled_stars(rating: f32) -> u8 {
    rating.clamp(0.0, 5.0).round() as u8
}

pub fn star_rating(ui: &mut egui::Ui, rating: f32) {
    let filled = filled_stars(rating);
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 2.0;
        for star in 1..=5u8 {
            let color = if star <= filled { FILLED } else { EMPTY };
            ui.label(RichText::new("★").color(color));
        }
    });
}

/// Clickable stars. Returns true when `rating` changed.
pub fn star_rating_input(ui: &mut egui::Ui, rating: &mut u8) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 2.0;
        for star in 1..=5u8 {
            let color = if star <= *rating { FILLED } else { EMPTY };
            let response = ui.add(
                egui::Button::new(RichText::new("★").size(20.0).color(color)).frame(false),
            );
            if response.clicked() && *rating != star {
                *rating = star;
                changed = true;
            }
        }
    });
    changed
}
