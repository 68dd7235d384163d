use eframe::egui;
use egui::{Color32, RichText};

use super::{section_heading, ViewContext};
use crate::catalog::Experience;
use crate::ui::boundary::RenderFailure;
use crate::ui::components::{activity_card, experience_card, news_card, see_all_tile, CardOptions};
use crate::ui::navigation::{NavAction, Page};

pub const JUMP_BACK_IN_COUNT: usize = 5;

/// First experiences shown in the "Jump Back In" row
pub fn recently_played(experiences: &[Experience]) -> &[Experience] {
    &experiences[..experiences.len().min(JUMP_BACK_IN_COUNT)]
}

pub fn show(ui: &mut egui::Ui, view: &mut ViewContext<'_>) -> Result<(), RenderFailure> {
    let catalog = view.catalog;
    ui.label(
        RichText::new(format!("Welcome back, {}!", view.profile.display_name))
            .size(32.0)
            .strong()
            .color(Color32::WHITE),
    );
    ui.label(RichText::new("Ready to jump back into the action?").color(Color32::GRAY));

    section_heading(ui, "Jump Back In");
    egui::ScrollArea::horizontal()
        .id_salt("jump_back_in")
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                for experience in recently_played(catalog.experiences()) {
                    if experience_card(ui, experience, CardOptions::default()).clicked() {
                        view.request(NavAction::SelectDetail(experience.clone()));
                    }
                }
                if see_all_tile(ui).clicked() {
                    view.request(NavAction::Navigate(Page::Discover));
                }
            });
        });

    section_heading(ui, "Friends Activity");
    ui.horizontal_wrapped(|ui| {
        for (activity, experience) in catalog.friend_activity() {
            if activity_card(ui, &activity.friend_name, experience) {
                view.request(NavAction::SelectDetail(experience.clone()));
            }
        }
    });

    section_heading(ui, "Platform News");
    ui.horizontal_wrapped(|ui| {
        for article in catalog.news() {
            news_card(ui, article);
        }
    });

    Ok(())
}
