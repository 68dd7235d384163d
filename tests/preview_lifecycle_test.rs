use nexus_viewer::catalog::{AvatarCategory, AvatarItem};
use nexus_viewer::rendering::backend::HeadlessBackend;
use nexus_viewer::rendering::renderer::RendererOptions;
use nexus_viewer::rendering::{PreviewSurface, RenderBackend, SceneError, SceneRenderer, SurfaceSize};

fn renderer() -> SceneRenderer<HeadlessBackend> {
    SceneRenderer::new(HeadlessBackend::new(), RendererOptions::default())
}

#[test]
fn test_mount_unmount_returns_to_baseline() {
    let surface = PreviewSurface::new(SurfaceSize::new(320, 240));
    let mut preview = renderer();
    let baseline = preview.backend().live_resources();

    for _ in 0..3 {
        preview.mount(&surface).unwrap();
        assert!(preview.is_running());
        assert!(surface.is_bound());
        assert_eq!(surface.listener_count(), 1);
        preview.frame().unwrap();

        preview.unmount();
        assert!(!preview.is_running());
        assert!(!surface.is_bound());
        assert_eq!(surface.listener_count(), 0);
        assert_eq!(preview.backend().live_resources(), baseline);
        assert!(!preview.backend().has_context());
    }
    assert_eq!(preview.backend().contexts_created(), 3);
}

#[test]
fn test_frames_stop_after_unmount() {
    let surface = PreviewSurface::new(SurfaceSize::new(64, 64));
    let mut preview = renderer();
    preview.mount(&surface).unwrap();
    preview.frame().unwrap();
    preview.frame().unwrap();
    let drawn = preview.backend().frames_rendered();

    preview.unmount();
    preview.frame().unwrap();
    assert_eq!(preview.backend().frames_rendered(), drawn);

    // unmounting twice is harmless
    preview.unmount();
}

#[test]
fn test_surface_has_one_owner() {
    let surface = PreviewSurface::new(SurfaceSize::new(64, 64));
    let mut first = renderer();
    let mut second = renderer();

    first.mount(&surface).unwrap();
    let err = second.mount(&surface).unwrap_err();
    assert_eq!(err, SceneError::SurfaceInUse { owner: first.id() });
    assert!(!second.is_mounted());
    assert_eq!(second.backend().live_resources().total(), 0);

    first.unmount();
    second.mount(&surface).unwrap();
    assert_eq!(surface.owner(), Some(second.id()));
    second.unmount();
}

#[test]
fn test_unsupported_backend_acquires_nothing() {
    let surface = PreviewSurface::new(SurfaceSize::new(64, 64));
    let mut preview = SceneRenderer::new(
        HeadlessBackend::unsupported("no adapter"),
        RendererOptions::default(),
    );

    let err = preview.mount(&surface).unwrap_err();
    assert!(matches!(err, SceneError::Unsupported { .. }));
    assert_eq!(preview.last_error(), Some(&err));
    assert!(!surface.is_bound());
    assert_eq!(surface.listener_count(), 0);
    assert_eq!(preview.backend().live_resources().total(), 0);
}

#[test]
fn test_set_equipped_is_idempotent() {
    let surface = PreviewSurface::new(SurfaceSize::new(64, 64));
    let mut preview = renderer();
    preview.mount(&surface).unwrap();

    let items = vec![
        AvatarItem::new("h1", "Top Hat", "x", AvatarCategory::Hats),
        AvatarItem::new("s1", "Tee", "x", AvatarCategory::Shirts),
    ];
    let first = preview.set_equipped(&items);
    let live = preview.backend().live_resources();
    let second = preview.set_equipped(&items);

    assert_eq!(first, second);
    assert_eq!(preview.appearance(), first);
    assert_eq!(preview.backend().live_resources(), live);
    preview.unmount();
}

#[test]
fn test_resize_follows_surface() {
    let surface = PreviewSurface::new(SurfaceSize::new(100, 100));
    let mut preview = renderer();
    preview.mount(&surface).unwrap();

    surface.set_size(SurfaceSize::new(200, 100));
    preview.frame().unwrap();
    assert_eq!(preview.backend().context_size(), Some(SurfaceSize::new(200, 100)));

    // zero-area sizes are ignored
    surface.set_size(SurfaceSize::new(0, 100));
    preview.frame().unwrap();
    assert_eq!(preview.backend().context_size(), Some(SurfaceSize::new(200, 100)));
    preview.unmount();
}
