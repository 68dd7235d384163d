use eframe::egui;
use egui::{Color32, RichText};

use super::{section_heading, ViewContext};
use crate::catalog::Experience;
use crate::ui::boundary::RenderFailure;
use crate::ui::browse::{compose, GenreFilter, GridControls, SortOrder};
use crate::ui::components::{experience_grid, genre_color, pill, CardOptions, StyledButton};
use crate::ui::navigation::NavAction;

pub const FEATURED_ID: &str = "10";

#[derive(Debug, Clone, Default)]
pub struct DiscoverState {
    pub recommended: GridControls,
    pub popular: GridControls,
    pub noteworthy: GridControls,
}

/// The three Discover rows and the experiences each starts from
pub fn grid_sources(experiences: &[Experience]) -> [(&'static str, Vec<&Experience>); 3] {
    let end = experiences.len().min(14);
    let start = 2.min(end);
    [
        ("Recommended For You", experiences.iter().collect()),
        ("Popular Experiences", experiences.iter().rev().collect()),
        ("New & Noteworthy", experiences[start..end].iter().collect()),
    ]
}

pub fn show(
    ui: &mut egui::Ui,
    view: &mut ViewContext<'_>,
    state: &mut DiscoverState,
) -> Result<(), RenderFailure> {
    let catalog = view.catalog;
    let featured = catalog
        .experience(FEATURED_ID)
        .ok_or_else(|| RenderFailure::missing("experience", FEATURED_ID))?;

    featured_hero(ui, view, featured);

    let [recommended, popular, noteworthy] = grid_sources(catalog.experiences());
    grid_section(ui, view, recommended, &mut state.recommended, true);
    grid_section(ui, view, popular, &mut state.popular, false);
    grid_section(ui, view, noteworthy, &mut state.noteworthy, false);
    Ok(())
}

fn featured_hero(ui: &mut egui::Ui, view: &mut ViewContext<'_>, featured: &Experience) {
    egui::Frame::new()
        .fill(genre_color(featured.genre).gamma_multiply(0.4))
        .corner_radius(16.0)
        .inner_margin(24.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new(&featured.title).size(40.0).strong().color(Color32::WHITE));
            ui.label(RichText::new(&featured.description).size(16.0).color(Color32::LIGHT_GRAY));
            ui.add_space(12.0);
            ui.horizontal(|ui| {
                if StyledButton::new("▶ Play Now").show(ui).clicked() {
                    view.request(NavAction::SelectDetail(featured.clone()));
                }
                ui.label(format!("👥 {} Playing", featured.player_count));
            });
        });
}

fn grid_section(
    ui: &mut egui::Ui,
    view: &mut ViewContext<'_>,
    (title, source): (&str, Vec<&Experience>),
    controls: &mut GridControls,
    show_controls: bool,
) {
    ui.horizontal(|ui| {
        section_heading(ui, title);
        if show_controls {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                egui::ComboBox::from_id_salt(("sort", title))
                    .selected_text(controls.sort.label())
                    .show_ui(ui, |ui| {
                        for order in SortOrder::ALL {
                            ui.selectable_value(&mut controls.sort, order, order.label());
                        }
                    });
            });
        }
    });

    if show_controls {
        ui.horizontal_wrapped(|ui| {
            for filter in GenreFilter::options() {
                if pill(ui, filter.label(), controls.filter == filter).clicked() {
                    controls.filter = filter;
                }
            }
        });
        ui.add_space(8.0);
    }

    let shown = compose(source, controls.filter, controls.sort);
    if shown.is_empty() {
        ui.vertical_centered(|ui| {
            ui.label(RichText::new("No experiences found").strong().size(18.0));
            ui.label("Try adjusting your filters or search terms");
        });
        return;
    }
    if let Some(clicked) = experience_grid(ui, &shown, CardOptions::with_stats()) {
        view.request(NavAction::SelectDetail(clicked.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn test_grid_sources() {
        let catalog = Catalog::builtin().unwrap();
        let [(t1, all), (t2, reversed), (t3, noteworthy)] = grid_sources(catalog.experiences());
        assert_eq!(t1, "Recommended For You");
        assert_eq!(all.len(), 24);
        assert_eq!(t2, "Popular Experiences");
        assert_eq!(reversed[0].id, catalog.experiences()[23].id);
        assert_eq!(t3, "New & Noteworthy");
        assert_eq!(noteworthy.len(), 12);
        assert_eq!(noteworthy[0].id, catalog.experiences()[2].id);
    }

    #[test]
    fn test_grid_sources_short_catalog() {
        let [_, _, (_, noteworthy)] = grid_sources(&[]);
        assert!(noteworthy.is_empty());
    }
}
