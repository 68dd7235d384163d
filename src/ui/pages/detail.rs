use std::time::Duration;

use eframe::egui;
use egui::{Color32, RichText};
use tracing::info;

use super::{section_heading, ViewContext};
use crate::catalog::{Experience, Review};
use crate::ui::boundary::RenderFailure;
use crate::ui::components::{
    badge, genre_color, show_status_slot, star_rating, star_rating_input, FormField, StatusMessage,
    StyledButton,
};
use crate::ui::navigation::NavAction;
use crate::ui::review::ReviewDraft;

/// Review form state, reset whenever a different experience is opened
#[derive(Debug, Default)]
pub struct DetailState {
    experience_id: Option<String>,
    pub draft: ReviewDraft,
    pub status: Option<StatusMessage>,
}

impl DetailState {
    fn follow(&mut self, experience: &Experience) {
        if self.experience_id.as_deref() != Some(experience.id.as_str()) {
            self.experience_id = Some(experience.id.clone());
            self.draft = ReviewDraft::default();
            self.status = None;
        }
    }

    /// Validate and submit the current draft, leaving the outcome in `status`
    pub fn submit(&mut self, experience_id: &str) -> bool {
        match self.draft.submit(experience_id) {
            Ok(_) => {
                self.status = Some(
                    StatusMessage::success("Thank you for your review!")
                        .expires_after(Duration::from_secs(4)),
                );
                true
            }
            Err(e) => {
                self.status = Some(StatusMessage::from(&e));
                false
            }
        }
    }
}

pub fn rating_text(average: Option<f32>) -> String {
    match average {
        Some(avg) => format!("{:.1}", avg),
        None => "N/A".to_string(),
    }
}

pub fn show(
    ui: &mut egui::Ui,
    view: &mut ViewContext<'_>,
    experience: &Experience,
    state: &mut DetailState,
) -> Result<(), RenderFailure> {
    state.follow(experience);
    let catalog = view.catalog;
    let average = catalog.average_rating();

    if ui.button("← Back").clicked() {
        view.request(NavAction::Back);
    }
    ui.add_space(8.0);

    egui::Frame::new()
        .fill(genre_color(experience.genre).gamma_multiply(0.35))
        .corner_radius(16.0)
        .inner_margin(24.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                badge(ui, experience.genre.label(), genre_color(experience.genre));
                star_rating(ui, average.unwrap_or(0.0));
                ui.label(RichText::new(rating_text(average)).strong().color(Color32::WHITE));
            });
            ui.label(RichText::new(&experience.title).size(36.0).strong().color(Color32::WHITE));
            ui.horizontal(|ui| {
                ui.label(format!("by {}", experience.creator));
                ui.separator();
                ui.label(format!("👥 {} playing", experience.player_count));
            });
            ui.add_space(8.0);
            if StyledButton::new("▶ Play Now").show(ui).clicked() {
                info!("Play requested for {} ({})", experience.title, experience.id);
            }
        });

    ui.columns(2, |columns| {
        let (main, side) = columns.split_at_mut(1);
        let main = &mut main[0];
        let side = &mut side[0];

        section_heading(main, "About This Experience");
        main.label(RichText::new(&experience.description).size(15.0));

        section_heading(main, &format!("Reviews ({})", catalog.reviews().len()));
        for review in catalog.reviews() {
            review_row(main, review);
        }

        section_heading(main, "Leave a Review");
        review_form(main, &experience.id, state);

        section_heading(side, "Quick Stats");
        quick_stat(side, "Active Players", experience.player_count.to_string());
        quick_stat(side, "Genre", experience.genre.label().to_string());
        quick_stat(side, "Rating", format!("{}/5", rating_text(average)));
        quick_stat(side, "Reviews", catalog.reviews().len().to_string());
    });

    Ok(())
}

fn review_row(ui: &mut egui::Ui, review: &Review) {
    ui.horizontal(|ui| {
        ui.label(RichText::new(&review.author).strong().color(Color32::WHITE));
        star_rating(ui, review.rating as f32);
    });
    ui.label(&review.comment);
    ui.separator();
}

fn review_form(ui: &mut egui::Ui, experience_id: &str, state: &mut DetailState) {
    ui.label("Your Rating");
    star_rating_input(ui, &mut state.draft.rating);
    ui.add_space(6.0);
    FormField::new("Your Comment", &mut state.draft.comment)
        .multiline(4)
        .placeholder("Share your thoughts about this experience...")
        .show(ui);
    if StyledButton::new("Submit Review").show(ui).clicked() {
        state.submit(experience_id);
    }
    show_status_slot(ui, &mut state.status);
}

fn quick_stat(ui: &mut egui::Ui, label: &str, value: String) {
    ui.horizontal(|ui| {
        ui.label(RichText::new(label).color(Color32::GRAY));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(RichText::new(value).strong().color(Color32::WHITE));
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;

    #[test]
    fn test_rating_text() {
        assert_eq!(rating_text(Some(4.0)), "4.0");
        assert_eq!(rating_text(Some(3.666)), "3.7");
        assert_eq!(rating_text(None), "N/A");
    }

    #[test]
    fn test_submit_reports_inline() {
        let mut state = DetailState::default();
        assert!(!state.submit("1"));
        let status = state.status.as_ref().unwrap();
        assert_eq!(status.message, ValidationError::MissingRating.to_string());

        state.draft.rating = 4;
        state.draft.comment = "Loved it".into();
        assert!(state.submit("1"));
        assert_eq!(state.draft, ReviewDraft::default());
    }
}
