//! Dashboard views
//!
//! Views draw from [`UiState`] and never change navigation directly; they
//! push [`NavAction`](navigation::NavAction)s that are applied once the frame
//! is drawn.

pub mod boundary;
pub mod browse;
pub mod components;
pub mod header;
pub mod navigation;
pub mod pages;
pub mod review;
pub mod sidebar;

use std::collections::HashMap;

use eframe::egui;
use tracing::info;

use crate::catalog::Catalog;
use crate::config::AppSettings;
use boundary::{default_fallback, BoundaryOutcome, ErrorBoundary, FallbackAction};
use navigation::{NavAction, NavQueue, NavigationState, Page};
use pages::avatar::AvatarPageState;
use pages::detail::DetailState;
use pages::discover::DiscoverState;
use pages::ViewContext;

const DETAIL_REGION: &str = "Detail";

pub struct UiState {
    pub catalog: Catalog,
    pub settings: AppSettings,
    pub nav: NavigationState,
    pub search: String,
    pub discover: DiscoverState,
    pub detail: DetailState,
    pub avatar: AvatarPageState,
    queue: NavQueue,
    app_boundary: ErrorBoundary,
    page_boundaries: HashMap<&'static str, ErrorBoundary>,
}

impl UiState {
    pub fn new(catalog: Catalog, settings: AppSettings, avatar: AvatarPageState) -> Self {
        Self {
            catalog,
            settings,
            nav: NavigationState::new(),
            search: String::new(),
            discover: DiscoverState::default(),
            detail: DetailState::default(),
            avatar,
            queue: NavQueue::default(),
            app_boundary: ErrorBoundary::new("App").top_level(),
            page_boundaries: HashMap::new(),
        }
    }

    /// Region name of the view currently in the central panel
    pub fn current_region(&self) -> &'static str {
        if self.nav.detail().is_some() {
            DETAIL_REGION
        } else {
            self.nav.page().name()
        }
    }

    pub fn page_boundary(&self, region: &str) -> Option<&ErrorBoundary> {
        self.page_boundaries.get(region)
    }

    pub fn app_boundary(&self) -> &ErrorBoundary {
        &self.app_boundary
    }

    fn avatar_visible(&self) -> bool {
        self.nav.detail().is_none() && self.nav.page() == Page::Avatar
    }

    /// Draw one frame. Returns true when the user asked for a full reload.
    pub fn show(&mut self, ctx: &egui::Context) -> bool {
        if let Some(item) = self.avatar.poll_uploads() {
            info!("New wardrobe item {} in {}", item.id, item.category);
        }

        let mut reload = false;
        if self.app_boundary.has_failed() {
            egui::CentralPanel::default().show(ctx, |ui| {
                if let (Some(failure), Some(context)) = (self.app_boundary.failure(), self.app_boundary.context()) {
                    match default_fallback(ui, failure, context, true) {
                        Some(FallbackAction::Retry) => self.app_boundary.retry(),
                        Some(FallbackAction::ReturnHome) => {
                            self.queue.push(NavAction::Navigate(Page::Home));
                            self.app_boundary.retry();
                        }
                        Some(FallbackAction::Reload) => reload = true,
                        None => {}
                    }
                }
            });
        } else {
            let mut shell_reload = false;
            let mut boundary = std::mem::replace(&mut self.app_boundary, ErrorBoundary::new("App"));
            boundary.guard(|| {
                shell_reload = self.show_shell(ctx);
                Ok(())
            });
            self.app_boundary = boundary;
            reload |= shell_reload;
        }

        self.finish_frame();
        reload
    }

    fn show_shell(&mut self, ctx: &egui::Context) -> bool {
        let active = self.nav.page();
        egui::SidePanel::left("sidebar")
            .resizable(false)
            .exact_width(240.0)
            .show(ctx, |ui| sidebar::show(ui, &self.catalog, active, &mut self.queue));

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(6.0);
            header::show(ui, &self.settings.profile, &mut self.search, &mut self.queue);
            ui.add_space(6.0);
        });

        let mut reload = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .id_salt(self.current_region())
                .show(ui, |ui| {
                    reload = self.show_page(ui);
                });
        });
        reload
    }

    /// Detail wins over the page view. Each view renders inside its own boundary.
    fn show_page(&mut self, ui: &mut egui::Ui) -> bool {
        let region = self.current_region();
        let boundary = self
            .page_boundaries
            .entry(region)
            .or_insert_with(|| ErrorBoundary::new(region));

        let mut view = ViewContext {
            catalog: &self.catalog,
            profile: &self.settings.profile,
            nav: &mut self.queue,
        };
        let detail = self.nav.detail().cloned();
        let page = self.nav.page();
        let discover = &mut self.discover;
        let detail_state = &mut self.detail;
        let avatar = &mut self.avatar;

        let outcome = boundary.show(ui, |ui| match &detail {
            Some(experience) => pages::detail::show(ui, &mut view, experience, detail_state),
            None => match page {
                Page::Home => pages::home::show(ui, &mut view),
                Page::Discover => pages::discover::show(ui, &mut view, discover),
                Page::Avatar => pages::avatar::show(ui, avatar),
                other => {
                    pages::placeholder::show(ui, other);
                    Ok(())
                }
            },
        });

        match outcome {
            BoundaryOutcome::Fallback(Some(FallbackAction::Reload)) => true,
            BoundaryOutcome::Fallback(Some(FallbackAction::ReturnHome)) => {
                self.queue.push(NavAction::Navigate(Page::Home));
                false
            }
            _ => false,
        }
    }

    /// Apply queued navigation and keep the preview mounted only while visible
    fn finish_frame(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        let was_visible = self.avatar_visible();
        let previous_region = self.current_region();
        self.queue.apply_to(&mut self.nav);
        if was_visible && !self.avatar_visible() {
            self.avatar.leave();
        }

        // Entering a view starts it fresh, as a remount would
        let region = self.current_region();
        if region != previous_region {
            if let Some(boundary) = self.page_boundaries.get_mut(region) {
                boundary.retry();
            }
        }
    }

    /// Apply a navigation action outside of drawing
    pub fn dispatch(&mut self, action: NavAction) {
        self.queue.push(action);
        self.finish_frame();
    }
}
