use eframe::egui;
use egui::{Color32, RichText, Sense, Vec2};
use tracing::debug;

use crate::catalog::{Catalog, Friend};
use crate::ui::components::{nav_button, ACCENT};
use crate::ui::navigation::{NavAction, NavQueue, Page};

const ONLINE: Color32 = Color32::from_rgb(0x4a, 0xde, 0x80);

/// Second line under a friend's name
pub fn friend_status_line(friend: &Friend) -> (String, Color32) {
    match (friend.is_online(), &friend.current_game) {
        (true, Some(game)) => (game.name.clone(), Color32::from_rgb(0x81, 0x8c, 0xf8)),
        (true, None) => ("Online".to_string(), ONLINE),
        (false, _) => ("Offline".to_string(), Color32::GRAY),
    }
}

pub fn show(ui: &mut egui::Ui, catalog: &Catalog, active: Page, nav: &mut NavQueue) {
    ui.add_space(8.0);
    ui.label(RichText::new("◆ Nexus").size(24.0).strong().color(Color32::WHITE));
    ui.add_space(16.0);

    for page in Page::SIDEBAR {
        if nav_button(ui, page.name(), page == active).clicked() {
            nav.push(NavAction::Navigate(page));
        }
    }

    ui.add_space(24.0);
    let header = ui.add(
        egui::Label::new(RichText::new("FRIENDS").small().strong().color(Color32::GRAY))
            .sense(Sense::click()),
    );
    if header.clicked() {
        nav.push(NavAction::Navigate(Page::Friends));
    }

    for friend in catalog.friends() {
        ui.horizontal(|ui| {
            let (dot, _) = ui.allocate_exact_size(Vec2::splat(10.0), Sense::hover());
            let color = if friend.is_online() { ONLINE } else { Color32::DARK_GRAY };
            ui.painter().circle_filled(dot.center(), 4.0, color);

            ui.vertical(|ui| {
                ui.label(RichText::new(&friend.name).color(Color32::LIGHT_GRAY));
                let (line, color) = friend_status_line(friend);
                ui.label(RichText::new(line).small().color(color));
            });

            if let Some(game) = friend.joinable_game() {
                let join = egui::Button::new(RichText::new("Join").small().color(Color32::WHITE)).fill(ACCENT);
                if ui.add(join).clicked() {
                    match catalog.experience(&game.id) {
                        Some(experience) => nav.push(NavAction::SelectDetail(experience.clone())),
                        None => debug!("{} is in unlisted game {}", friend.name, game.id),
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FriendStatus, GameRef};

    fn friend(status: FriendStatus, game: Option<&str>) -> Friend {
        Friend {
            name: "Nova".into(),
            avatar_url: String::new(),
            status,
            current_game: game.map(|name| GameRef {
                name: name.into(),
                id: "1".into(),
            }),
        }
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(friend_status_line(&friend(FriendStatus::Online, Some("Kart Rush"))).0, "Kart Rush");
        assert_eq!(friend_status_line(&friend(FriendStatus::Online, None)).0, "Online");
        assert_eq!(friend_status_line(&friend(FriendStatus::Offline, Some("Kart Rush"))).0, "Offline");
    }
}
