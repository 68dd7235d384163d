use std::cell::Cell;
use std::rc::Rc;

use eframe::egui;
use nexus_viewer::app::build_ui_state;
use nexus_viewer::catalog::{Catalog, Genre};
use nexus_viewer::config::{AppSettings, PreviewBackend};
use nexus_viewer::ui::boundary::{BoundaryOutcome, ErrorBoundary, FallbackAction, RenderFailure};
use nexus_viewer::ui::browse::{compose, GenreFilter, SortOrder};
use nexus_viewer::ui::navigation::{NavAction, NavigationState, Page};
use nexus_viewer::ui::UiState;
use nexus_viewer::world::Outfit;

fn software_settings() -> AppSettings {
    let mut settings = AppSettings::default();
    settings.preview.backend = PreviewBackend::Software;
    settings.preview.width = 64;
    settings.preview.height = 64;
    settings
}

fn dashboard() -> UiState {
    let catalog = Catalog::builtin().unwrap();
    build_ui_state(catalog, software_settings(), tokio::runtime::Handle::current())
}

fn run_frame(ctx: &egui::Context, ui: &mut UiState) -> bool {
    let mut reload = false;
    let _ = ctx.run(egui::RawInput::default(), |ctx| {
        reload = ui.show(ctx);
    });
    reload
}

#[test]
fn test_navigate_clears_detail() {
    let catalog = Catalog::builtin().unwrap();
    let mut nav = NavigationState::new();
    nav.select_detail(catalog.experience("4").unwrap().clone());
    assert_eq!(nav.page(), Page::Home);

    nav.navigate(Page::Discover);
    assert!(nav.detail().is_none());
    assert_eq!(nav.page(), Page::Discover);
}

#[test]
fn test_compose_over_builtin_catalog() {
    let catalog = Catalog::builtin().unwrap();

    let popular = compose(catalog.experiences(), GenreFilter::All, SortOrder::Popular);
    assert_eq!(popular.len(), catalog.experiences().len());
    assert!(popular.windows(2).all(|w| w[0].player_count >= w[1].player_count));

    let combat = compose(catalog.experiences(), GenreFilter::Only(Genre::Combat), SortOrder::AZ);
    assert!(!combat.is_empty());
    assert!(combat.iter().all(|e| e.genre == Genre::Combat));
    assert!(combat
        .windows(2)
        .all(|w| w[0].title.to_lowercase() <= w[1].title.to_lowercase()));

    let newest = compose(catalog.experiences(), GenreFilter::All, SortOrder::Newest);
    assert_eq!(newest[0].id, "24");
}

#[test]
fn test_outfit_over_builtin_wardrobe() {
    let catalog = Catalog::builtin().unwrap();
    let hats: Vec<_> = catalog
        .avatar_items()
        .iter()
        .filter(|i| i.category.label() == "Hats")
        .collect();
    assert!(hats.len() >= 2);

    let mut outfit = Outfit::new();
    assert!(outfit.toggle(hats[0]));
    assert!(outfit.toggle(hats[1]));
    assert_eq!(outfit.len(), 1);
    assert!(outfit.is_equipped(&hats[1].id));
    assert!(!outfit.toggle(hats[1]));
    assert!(outfit.is_empty());
}

#[test]
fn test_boundary_contains_panicking_subtree() {
    let ctx = egui::Context::default();
    let reports = Rc::new(Cell::new(0));
    let counter = reports.clone();
    let mut boundary = ErrorBoundary::new("Discover").with_reporter(move |_, _| counter.set(counter.get() + 1));
    let mut should_panic = true;

    let mut outcome = None;
    let _ = ctx.run(egui::RawInput::default(), |ctx| {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.label("outside");
            outcome = Some(boundary.show(ui, |ui| {
                if should_panic {
                    panic!("broken grid");
                }
                ui.label("grid");
                Ok(1)
            }));
        });
    });
    assert!(matches!(outcome, Some(BoundaryOutcome::Fallback(None))));
    assert_eq!(boundary.failure(), Some(&RenderFailure::Panicked("broken grid".into())));
    assert_eq!(reports.get(), 1);

    // The fallback stays up without reporting again
    let _ = ctx.run(egui::RawInput::default(), |ctx| {
        egui::CentralPanel::default().show(ctx, |ui| {
            outcome = Some(boundary.show(ui, |_| Ok(2)));
        });
    });
    assert!(matches!(outcome, Some(BoundaryOutcome::Fallback(None))));
    assert_eq!(reports.get(), 1);

    should_panic = false;
    boundary.retry();
    let _ = ctx.run(egui::RawInput::default(), |ctx| {
        egui::CentralPanel::default().show(ctx, |ui| {
            outcome = Some(boundary.show(ui, |ui| {
                if should_panic {
                    panic!("broken grid");
                }
                Ok(3)
            }));
        });
    });
    assert!(matches!(outcome, Some(BoundaryOutcome::Rendered(3))));
    assert!(!boundary.has_failed());
}

#[test]
fn test_fallback_action_retries() {
    let ctx = egui::Context::default();
    let mut boundary = ErrorBoundary::new("Home");
    let mut outcome = None;

    let _ = ctx.run(egui::RawInput::default(), |ctx| {
        egui::CentralPanel::default().show(ctx, |ui| {
            outcome = Some(boundary.show_with(
                ui,
                |_| Err::<(), _>(RenderFailure::missing("experience", "10")),
                |_, _, _| Some(FallbackAction::Retry),
            ));
        });
    });
    assert!(matches!(outcome, Some(BoundaryOutcome::Fallback(Some(FallbackAction::Retry)))));
    assert!(!boundary.has_failed());
}

#[tokio::test]
async fn test_dashboard_renders_every_page() {
    let ctx = egui::Context::default();
    let mut ui = dashboard();

    for page in Page::ALL {
        ui.dispatch(NavAction::Navigate(page));
        assert!(!run_frame(&ctx, &mut ui));
        assert!(!ui.app_boundary().has_failed());
        assert!(
            ui.page_boundary(page.name()).map_or(true, |b| !b.has_failed()),
            "{} failed",
            page
        );
    }
}

#[tokio::test]
async fn test_detail_overlays_page() {
    let ctx = egui::Context::default();
    let mut ui = dashboard();
    let experience = ui.catalog.experience("2").unwrap().clone();

    ui.dispatch(NavAction::Navigate(Page::Discover));
    ui.dispatch(NavAction::SelectDetail(experience));
    assert_eq!(ui.current_region(), "Detail");
    run_frame(&ctx, &mut ui);
    assert_eq!(ui.nav.detail().map(|e| e.id.as_str()), Some("2"));
    assert!(ui.page_boundary("Detail").map_or(false, |b| !b.has_failed()));

    ui.dispatch(NavAction::Back);
    assert_eq!(ui.nav.page(), Page::Discover);
    assert_eq!(ui.current_region(), "Discover");
}

#[tokio::test]
async fn test_avatar_preview_lives_only_on_avatar_page() {
    let ctx = egui::Context::default();
    let mut ui = dashboard();

    ui.dispatch(NavAction::Navigate(Page::Avatar));
    run_frame(&ctx, &mut ui);
    run_frame(&ctx, &mut ui);
    assert!(ui.avatar.renderer().is_mounted());
    assert!(ui.avatar.renderer().frames_rendered() > 0);

    ui.dispatch(NavAction::Navigate(Page::Home));
    assert!(!ui.avatar.renderer().is_mounted());
    assert_eq!(ui.avatar.surface().listener_count(), 0);
    assert!(ui.avatar.renderer().backend().live_resources().is_empty());

    ui.dispatch(NavAction::Navigate(Page::Avatar));
    run_frame(&ctx, &mut ui);
    assert!(ui.avatar.renderer().is_mounted());
}

#[tokio::test]
async fn test_returning_to_a_failed_page_renders_it_again() {
    // No featured experience, so Discover cannot render
    let catalog = Catalog::from_toml_str(
        r#"
[[experiences]]
id = "1"
title = "Lonely Lap"
creator = "Solo"
creator_avatar_url = ""
thumbnail_url = ""
player_count = 3
genre = "Racing"
description = ""
"#,
    )
    .unwrap();
    let ctx = egui::Context::default();
    let mut ui = build_ui_state(catalog, software_settings(), tokio::runtime::Handle::current());

    ui.dispatch(NavAction::Navigate(Page::Discover));
    run_frame(&ctx, &mut ui);
    assert!(matches!(
        ui.page_boundary("Discover").and_then(|b| b.failure()),
        Some(RenderFailure::MissingRecord { .. })
    ));
    assert!(!ui.app_boundary().has_failed());

    ui.dispatch(NavAction::Navigate(Page::Home));
    run_frame(&ctx, &mut ui);
    assert!(ui.page_boundary("Discover").is_some_and(|b| b.has_failed()));

    ui.dispatch(NavAction::Navigate(Page::Discover));
    assert!(!ui.page_boundary("Discover").is_some_and(|b| b.has_failed()));
    run_frame(&ctx, &mut ui);
    assert!(ui.page_boundary("Discover").is_some_and(|b| b.has_failed()));
}
