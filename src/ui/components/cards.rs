use eframe::egui;
use egui::{Color32, RichText, Sense, Vec2};

use crate::catalog::{Experience, Genre, NewsArticle, NewsCategory};
use crate::ui::browse::format_player_count;

pub const CARD_WIDTH: f32 = 200.0;
const THUMB_HEIGHT: f32 = 112.0;
const CARD_FILL: Color32 = Color32::from_rgb(0x1f, 0x29, 0x37);

/// Display switches for [`experience_card`]. One card serves the plain,
/// stats, loading and error variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CardOptions {
    pub show_stats: bool,
    pub loading: bool,
    pub error: bool,
}

impl CardOptions {
    pub fn with_stats() -> Self {
        Self {
            show_stats: true,
            ..Self::default()
        }
    }

    pub fn loading() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    pub fn error() -> Self {
        Self {
            error: true,
            ..Self::default()
        }
    }

    /// Loading and error cards aren't clickable
    pub fn interactive(&self) -> bool {
        !self.loading && !self.error
    }
}

pub fn genre_color(genre: Genre) -> Color32 {
    match genre {
        Genre::Adventure => Color32::from_rgb(0x05, 0x96, 0x69),
        Genre::Roleplay => Color32::from_rgb(0xdb, 0x27, 0x77),
        Genre::Combat => Color32::from_rgb(0xdc, 0x26, 0x26),
        Genre::Simulation => Color32::from_rgb(0x25, 0x63, 0xeb),
        Genre::Obby => Color32::from_rgb(0xd9, 0x77, 0x06),
        Genre::Racing => Color32::from_rgb(0x7c, 0x3a, 0xed),
    }
}

fn news_color(category: NewsCategory) -> Color32 {
    match category {
        NewsCategory::Event => Color32::from_rgb(0x7c, 0x3a, 0xed),
        NewsCategory::Update => Color32::from_rgb(0x25, 0x63, 0xeb),
        NewsCategory::Community => Color32::from_rgb(0x05, 0x96, 0x69),
        NewsCategory::News => Color32::from_rgb(0x4b, 0x55, 0x63),
    }
}

pub fn badge(ui: &mut egui::Ui, text: &str, color: Color32) {
    egui::Frame::new()
        .fill(color)
        .corner_radius(8.0)
        .inner_margin(egui::Margin::symmetric(6, 2))
        .show(ui, |ui| {
            ui.label(RichText::new(text).small().color(Color32::WHITE));
        });
}

/// Thumbnails are never fetched; a tile tinted by genre stands in
fn thumbnail(ui: &mut egui::Ui, color: Color32, initial: &str) {
    let (rect, _) = ui.allocate_exact_size(Vec2::new(CARD_WIDTH, THUMB_HEIGHT), Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 8.0, color.gamma_multiply(0.7));
    painter.text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        initial,
        egui::FontId::proportional(40.0),
        Color32::WHITE,
    );
}

/// Returns the card's response; only interactive cards report clicks
pub fn experience_card(ui: &mut egui::Ui, experience: &Experience, options: CardOptions) -> egui::Response {
    let inner = egui::Frame::new()
        .fill(CARD_FILL)
        .corner_radius(10.0)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.set_width(CARD_WIDTH);
            ui.vertical(|ui| {
                if options.loading {
                    let (rect, _) = ui.allocate_exact_size(Vec2::new(CARD_WIDTH, THUMB_HEIGHT), Sense::hover());
                    ui.painter().rect_filled(rect, 8.0, Color32::from_gray(0x37));
                    ui.spinner();
                    return;
                }
                if options.error {
                    let (rect, _) = ui.allocate_exact_size(Vec2::new(CARD_WIDTH, THUMB_HEIGHT), Sense::hover());
                    ui.painter().rect_filled(rect, 8.0, Color32::from_rgb(0x45, 0x0a, 0x0a));
                    ui.colored_label(Color32::from_rgb(0xf8, 0x71, 0x71), "Failed to load");
                    return;
                }

                let initial: String = experience.title.chars().take(1).collect();
                thumbnail(ui, genre_color(experience.genre), &initial);
                ui.label(RichText::new(&experience.title).strong().color(Color32::WHITE));
                ui.label(RichText::new(&experience.creator).small().color(Color32::GRAY));
                ui.horizontal(|ui| {
                    badge(ui, experience.genre.label(), genre_color(experience.genre));
                    if options.show_stats {
                        ui.label(
                            RichText::new(format!("👥 {}", format_player_count(experience.player_count)))
                                .small(),
                        );
                    }
                });
            });
        });

    let sense = if options.interactive() {
        Sense::click()
    } else {
        Sense::hover()
    };
    inner.response.interact(sense).on_hover_cursor(if options.interactive() {
        egui::CursorIcon::PointingHand
    } else {
        egui::CursorIcon::Default
    })
}

/// Wrapped grid of cards. Returns the experience clicked this frame.
pub fn experience_grid<'a>(
    ui: &mut egui::Ui,
    experiences: &[&'a Experience],
    options: CardOptions,
) -> Option<&'a Experience> {
    let mut clicked = None;
    ui.horizontal_wrapped(|ui| {
        ui.spacing_mut().item_spacing = Vec2::splat(12.0);
        for &experience in experiences {
            if experience_card(ui, experience, options).clicked() {
                clicked = Some(experience);
            }
        }
    });
    clicked
}

/// "See All" tile at the end of a short row
pub fn see_all_tile(ui: &mut egui::Ui) -> egui::Response {
    let (rect, response) =
        ui.allocate_exact_size(Vec2::new(CARD_WIDTH, THUMB_HEIGHT + 56.0), Sense::click());
    let fill = if response.hovered() {
        Color32::from_gray(0x4b)
    } else {
        Color32::from_gray(0x37)
    };
    ui.painter().rect_filled(rect, 10.0, fill);
    ui.painter().text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        "See All →",
        egui::FontId::proportional(18.0),
        Color32::WHITE,
    );
    response.on_hover_cursor(egui::CursorIcon::PointingHand)
}

pub fn news_card(ui: &mut egui::Ui, article: &NewsArticle) {
    egui::Frame::new()
        .fill(CARD_FILL)
        .corner_radius(10.0)
        .inner_margin(10.0)
        .show(ui, |ui| {
            ui.set_width(CARD_WIDTH * 1.5);
            badge(ui, article.category.label(), news_color(article.category));
            ui.label(RichText::new(&article.title).strong().color(Color32::WHITE));
            ui.label(RichText::new(&article.summary).small().color(Color32::LIGHT_GRAY));
        });
}

/// "<name> is playing <title>" card. Returns true when the game was clicked.
pub fn activity_card(ui: &mut egui::Ui, friend_name: &str, experience: &Experience) -> bool {
    let response = egui::Frame::new()
        .fill(CARD_FILL)
        .corner_radius(10.0)
        .inner_margin(10.0)
        .show(ui, |ui| {
            ui.set_width(CARD_WIDTH * 1.5);
            ui.horizontal(|ui| {
                thumbnail_dot(ui, genre_color(experience.genre));
                ui.vertical(|ui| {
                    ui.label(RichText::new(friend_name).strong().color(Color32::WHITE));
                    ui.label(RichText::new(format!("is playing {}", experience.title)).small());
                });
            });
        })
        .response;
    response.interact(Sense::click()).clicked()
}

fn thumbnail_dot(ui: &mut egui::Ui, color: Color32) {
    let (rect, _) = ui.allocate_exact_size(Vec2::splat(32.0), Sense::hover());
    ui.painter().circle_filled(rect.center(), 16.0, color);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn experience() -> Experience {
        Experience {
            id: "7".into(),
            title: "Turbo Karts".into(),
            creator: "Pit Crew".into(),
            creator_avatar_url: String::new(),
            thumbnail_url: String::new(),
            player_count: 1200,
            genre: Genre::Racing,
            description: String::new(),
        }
    }

    fn card_senses_click(options: CardOptions) -> bool {
        let ctx = egui::Context::default();
        let mut senses_click = None;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                let response = experience_card(ui, &experience(), options);
                senses_click = Some(response.sense.senses_click());
            });
        });
        senses_click.unwrap()
    }

    #[test]
    fn test_only_loaded_cards_are_clickable() {
        assert!(card_senses_click(CardOptions::default()));
        assert!(card_senses_click(CardOptions::with_stats()));
        assert!(!card_senses_click(CardOptions::loading()));
        assert!(!card_senses_click(CardOptions::error()));
    }

    #[test]
    fn test_interactive_flags() {
        assert!(CardOptions::with_stats().interactive());
        assert!(!CardOptions::loading().interactive());
        assert!(!CardOptions {
            show_stats: true,
            error: true,
            ..CardOptions::default()
        }
        .interactive());
    }
}
