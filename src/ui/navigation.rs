use std::fmt;

use tracing::{debug, warn};

use crate::catalog::Experience;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Page {
    #[default]
    Home,
    Discover,
    Create,
    Avatar,
    Store,
    Friends,
    Profile,
    Settings,
    Billing,
}

impl Page {
    pub const ALL: [Page; 9] = [
        Page::Home,
        Page::Discover,
        Page::Create,
        Page::Avatar,
        Page::Store,
        Page::Friends,
        Page::Profile,
        Page::Settings,
        Page::Billing,
    ];

    /// Entries shown in the sidebar, in order
    pub const SIDEBAR: [Page; 5] = [Page::Home, Page::Discover, Page::Create, Page::Avatar, Page::Store];

    pub fn name(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Discover => "Discover",
            Page::Create => "Create",
            Page::Avatar => "Avatar",
            Page::Store => "Store",
            Page::Friends => "Friends",
            Page::Profile => "Profile",
            Page::Settings => "Settings",
            Page::Billing => "Billing",
        }
    }

    /// Case-insensitive lookup; anything unknown lands on Home.
    pub fn from_name(name: &str) -> Page {
        let trimmed = name.trim();
        match Page::ALL
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(trimmed))
        {
            Some(page) => *page,
            None => {
                warn!("Unknown page '{}', falling back to Home", name);
                Page::Home
            }
        }
    }

    /// Pages without content yet
    pub fn is_placeholder(&self) -> bool {
        matches!(
            self,
            Page::Create | Page::Store | Page::Friends | Page::Profile | Page::Settings | Page::Billing
        )
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NavAction {
    SelectDetail(Experience),
    Navigate(Page),
    Back,
}

/// Current page plus the experience opened on top of it, if any.
/// The detail view always wins over the page view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationState {
    page: Page,
    detail: Option<Experience>,
}

impl NavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn detail(&self) -> Option<&Experience> {
        self.detail.as_ref()
    }

    pub fn apply(&mut self, action: NavAction) {
        match action {
            NavAction::SelectDetail(experience) => {
                debug!("Opening experience {} ({})", experience.id, experience.title);
                self.detail = Some(experience);
            }
            NavAction::Navigate(page) => {
                debug!("Navigating to {}", page);
                self.detail = None;
                self.page = page;
            }
            NavAction::Back => {
                self.detail = None;
            }
        }
    }

    pub fn select_detail(&mut self, experience: Experience) {
        self.apply(NavAction::SelectDetail(experience));
    }

    pub fn navigate(&mut self, page: Page) {
        self.apply(NavAction::Navigate(page));
    }

    pub fn back(&mut self) {
        self.apply(NavAction::Back);
    }
}

/// Collects navigation requests raised while drawing a frame. Views push
/// actions here and the app applies them once the frame is done.
#[derive(Debug, Default)]
pub struct NavQueue {
    actions: Vec<NavAction>,
}

impl NavQueue {
    pub fn push(&mut self, action: NavAction) {
        self.actions.push(action);
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn apply_to(&mut self, state: &mut NavigationState) {
        for action in self.actions.drain(..) {
            state.apply(action);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Genre;

    fn experience(id: &str) -> Experience {
        Experience {
            id: id.into(),
            title: format!("Experience {}", id),
            creator: "Studio".into(),
            creator_avatar_url: String::new(),
            thumbnail_url: String::new(),
            player_count: 10,
            genre: Genre::Adventure,
            description: String::new(),
        }
    }

    #[test]
    fn test_initial_state() {
        let nav = NavigationState::new();
        assert_eq!(nav.page(), Page::Home);
        assert!(nav.detail().is_none());
    }

    #[test]
    fn test_back_keeps_page() {
        let mut nav = NavigationState::new();
        nav.navigate(Page::Avatar);
        nav.select_detail(experience("3"));
        nav.back();
        assert_eq!(nav.page(), Page::Avatar);
        assert!(nav.detail().is_none());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Page::from_name("discover"), Page::Discover);
        assert_eq!(Page::from_name("Billing"), Page::Billing);
        assert_eq!(Page::from_name("marketplace"), Page::Home);
    }

    #[test]
    fn test_queue_applies_in_order() {
        let mut nav = NavigationState::new();
        let mut queue = NavQueue::default();
        queue.push(NavAction::Navigate(Page::Friends));
        queue.push(NavAction::SelectDetail(experience("1")));
        queue.apply_to(&mut nav);
        assert!(queue.is_empty());
        assert_eq!(nav.page(), Page::Friends);
        assert_eq!(nav.detail().map(|e| e.id.as_str()), Some("1"));
    }
}
