use cgmath::Point3;
use crossbeam_channel::Receiver;
use image::RgbaImage;
use std::f32::consts::FRAC_PI_2;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::backend::{Frame, GeometryHandle, MaterialHandle, RenderBackend, TextureDesc};
use super::camera::Camera;
use super::geometry::Geometry;
use super::light::{AmbientLight, DirectionalLight};
use super::material::{Color, Material};
use super::metrics::{FrameMetrics, FrameStats};
use super::scene::{AvatarPart, MeshNode, NodeId, NodeKind, SceneGraph, Transform};
use super::surface::{ListenerId, PreviewSurface, SurfaceSize};
use super::{SceneError, SceneResult};
use crate::catalog::{AvatarCategory, AvatarItem};

pub const BODY_COLOR: u32 = 0x4f46e5;
pub const SHIRT_COLOR: u32 = 0x059669;
pub const HEAD_COLOR: u32 = 0xfdbcbc;
pub const HAT_COLOR: u32 = 0xfbbf24;
const LIMB_ARM_COLOR: u32 = 0xfdbcbc;
const LIMB_LEG_COLOR: u32 = 0x1e40af;
const GROUND_COLOR: u32 = 0x111827;
const BACKGROUND_COLOR: u32 = 0x1f2937;
const SHADOW_MAP_SIZE: u32 = 1024;

/// Visual state derived from the equipped items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppearancePatch {
    pub torso_color: u32,
    pub head_color: u32,
}

impl Default for AppearancePatch {
    fn default() -> Self {
        Self {
            torso_color: BODY_COLOR,
            head_color: HEAD_COLOR,
        }
    }
}

impl AppearancePatch {
    /// Shirts recolour the torso and hats recolour the head. Pants and
    /// accessories do not change the placeholder.
    pub fn from_equipped<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a AvatarItem>,
    {
        let mut patch = Self::default();
        for item in items {
            match item.category {
                AvatarCategory::Shirts => patch.torso_color = SHIRT_COLOR,
                AvatarCategory::Hats => patch.head_color = HAT_COLOR,
                AvatarCategory::Pants | AvatarCategory::Accessories => {}
            }
        }
        patch
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererOptions {
    /// Radians added to the avatar's y rotation every frame
    pub rotation_step: f32,
    pub slow_frame_budget: Duration,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            rotation_step: 0.01,
            slow_frame_budget: Duration::from_millis(16),
        }
    }
}

struct SceneState {
    graph: SceneGraph,
    avatar: NodeId,
    body_material: MaterialHandle,
    head_material: MaterialHandle,
}

struct Mounted {
    surface: PreviewSurface,
    listener: ListenerId,
    resize_rx: Receiver<SurfaceSize>,
    size: SurfaceSize,
}

/// Owns the preview scene and its render loop.
///
/// Everything acquired in [`mount`](Self::mount) is released in
/// [`unmount`](Self::unmount), which also runs on drop.
pub struct SceneRenderer<B: RenderBackend> {
    id: Uuid,
    backend: B,
    options: RendererOptions,
    camera: Camera,
    scene: Option<SceneState>,
    mounted: Option<Mounted>,
    appearance: AppearancePatch,
    running: bool,
    stats: FrameStats,
    last_error: Option<SceneError>,
}

impl<B: RenderBackend> SceneRenderer<B> {
    pub fn new(backend: B, options: RendererOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            backend,
            options,
            camera: Camera::default(),
            scene: None,
            mounted: None,
            appearance: AppearancePatch::default(),
            running: false,
            stats: FrameStats::new(options.slow_frame_budget),
            last_error: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Bind to `surface`, create the context and build the scene. A failure
    /// leaves nothing acquired and is kept in [`last_error`](Self::last_error).
    pub fn mount(&mut self, surface: &PreviewSurface) -> SceneResult<()> {
        if self.is_mounted() {
            debug!("Renderer {} already mounted", self.id);
            return Ok(());
        }

        match self.try_mount(surface) {
            Ok(()) => {
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                error!("Failed to mount {} preview: {}", self.backend.name(), e);
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    fn try_mount(&mut self, surface: &PreviewSurface) -> SceneResult<()> {
        surface.bind(self.id)?;

        let size = surface.size();
        if let Err(e) = self.backend.create_context(size) {
            surface.unbind(self.id);
            return Err(e);
        }

        let mut graph = SceneGraph::new();
        let scene = match build_scene(&mut graph, &mut self.backend, self.appearance) {
            Ok((avatar, body_material, head_material)) => SceneState {
                graph,
                avatar,
                body_material,
                head_material,
            },
            Err(e) => {
                graph.dispose(&mut self.backend);
                self.backend.release_context();
                surface.unbind(self.id);
                return Err(e);
            }
        };

        let (listener, resize_rx) = surface.add_listener();
        self.camera.set_aspect(size.width, size.height);
        self.scene = Some(scene);
        self.mounted = Some(Mounted {
            surface: surface.clone(),
            listener,
            resize_rx,
            size,
        });
        self.stats.reset();
        self.running = true;

        info!(
            "Avatar preview mounted on {} backend at {}x{}",
            self.backend.name(),
            size.width,
            size.height
        );
        Ok(())
    }

    /// Advance the animation one step and draw. No-op while stopped.
    pub fn frame(&mut self) -> SceneResult<()> {
        if !self.running {
            return Ok(());
        }
        let started = Instant::now();

        let pending = self
            .mounted
            .as_ref()
            .and_then(|m| m.resize_rx.try_iter().last());
        if let Some(size) = pending {
            self.resize(size);
        }

        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };
        if let Some(transform) = scene.graph.transform_mut(scene.avatar) {
            transform.rotation.y += self.options.rotation_step;
        }

        let frame = Frame {
            view_proj: self.camera.build_view_projection_matrix(),
            eye: self.camera.eye.into(),
            lights: scene.graph.light_uniform(),
            clear_color: Color::from_hex(BACKGROUND_COLOR),
            draws: scene.graph.draw_list(),
        };
        if let Err(e) = self.backend.render(&frame) {
            warn!("Preview frame failed: {}", e);
            self.last_error = Some(e.clone());
            return Err(e);
        }

        self.last_error = None;
        self.stats.record(started.elapsed());
        Ok(())
    }

    /// Map the equipped set onto the placeholder. Applied immediately when
    /// mounted, otherwise on the next mount.
    pub fn set_equipped(&mut self, items: &[AvatarItem]) -> AppearancePatch {
        let patch = AppearancePatch::from_equipped(items);
        if patch != self.appearance {
            debug!("Appearance changed: {:?}", patch);
        }
        self.appearance = patch;
        if let Some(scene) = &self.scene {
            self.backend
                .update_material(scene.body_material, &Material::lambert(patch.torso_color));
            self.backend
                .update_material(scene.head_material, &Material::lambert(patch.head_color));
        }
        patch
    }

    pub fn appearance(&self) -> AppearancePatch {
        self.appearance
    }

    /// Match camera aspect and render target to `size`. Ignored when
    /// unmounted, for zero-area sizes, or when the size is unchanged.
    pub fn resize(&mut self, size: SurfaceSize) {
        if size.is_empty() {
            return;
        }
        let Some(mounted) = self.mounted.as_mut() else {
            return;
        };
        if mounted.size == size {
            return;
        }
        mounted.size = size;
        self.camera.set_aspect(size.width, size.height);
        self.backend.resize(size);
        debug!("Preview resized to {}x{}", size.width, size.height);
    }

    /// Stop the loop and release everything acquired by `mount`
    pub fn unmount(&mut self) {
        self.running = false;
        let scene = self.scene.take();
        let mounted = self.mounted.take();
        if scene.is_none() && mounted.is_none() {
            return;
        }

        if let Some(mut scene) = scene {
            scene.graph.dispose(&mut self.backend);
        }
        self.backend.release_context();
        if let Some(mounted) = mounted {
            mounted.surface.remove_listener(mounted.listener);
            mounted.surface.unbind(self.id);
        }

        let live = self.backend.live_resources();
        if !live.is_empty() {
            warn!("Resources still live after unmount: {:?}", live);
        }
        info!("Avatar preview unmounted");
    }

    pub fn reset_camera(&mut self) {
        self.camera.reset_pose();
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frame_image(&self) -> Option<&RgbaImage> {
        if self.is_mounted() {
            self.backend.frame_image()
        } else {
            None
        }
    }

    /// Current y rotation of the avatar group, if mounted
    pub fn avatar_rotation(&self) -> Option<f32> {
        let scene = self.scene.as_ref()?;
        scene.graph.node(scene.avatar).map(|n| n.transform.rotation.y)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn stats(&self) -> FrameMetrics {
        self.stats.metrics()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.stats.total_frames()
    }

    pub fn last_error(&self) -> Option<&SceneError> {
        self.last_error.as_ref()
    }
}

impl<B: RenderBackend> Drop for SceneRenderer<B> {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Build lights, ground and the placeholder avatar. Returns the avatar group
/// and the two recolourable materials.
fn build_scene<B: RenderBackend + ?Sized>(
    graph: &mut SceneGraph,
    backend: &mut B,
    appearance: AppearancePatch,
) -> SceneResult<(NodeId, MaterialHandle, MaterialHandle)> {
    graph.add_node(
        None,
        "ambient",
        NodeKind::AmbientLight(AmbientLight::new(0x404040, 0.6)),
        Transform::default(),
    );

    let sun = DirectionalLight::new(0xffffff, 0.8, Point3::new(5.0, 5.0, 5.0)).with_shadow(SHADOW_MAP_SIZE);
    let shadow_map = backend.create_texture(&TextureDesc::shadow_map(sun.shadow_map_size))?;
    graph.add_node(
        None,
        "sun",
        NodeKind::DirectionalLight {
            light: sun,
            shadow_map: Some(shadow_map),
        },
        Transform::at(5.0, 5.0, 5.0),
    );

    let avatar = graph.add_node(None, "avatar", NodeKind::Group, Transform::default());

    // Every handle joins the graph before the next one is created, so a
    // failed mount can dispose all of them.
    let (body_geometry, body_material) = create_mesh(
        backend,
        &Geometry::cylinder(0.3, 0.4, 1.2, 8),
        &Material::lambert(appearance.torso_color),
    )?;
    attach_part(graph, avatar, "body", body_geometry, body_material, AvatarPart::Body, Transform::default());

    let (head_geometry, head_material) = create_mesh(
        backend,
        &Geometry::sphere(0.25, 16, 16),
        &Material::lambert(appearance.head_color),
    )?;
    attach_part(graph, avatar, "head", head_geometry, head_material, AvatarPart::Head, Transform::at(0.0, 0.85, 0.0));

    // Left and right limbs share geometry and material
    let (arm_geometry, arm_material) = create_mesh(
        backend,
        &Geometry::cylinder(0.08, 0.1, 0.8, 8),
        &Material::lambert(LIMB_ARM_COLOR),
    )?;
    attach_part(graph, avatar, "left_arm", arm_geometry, arm_material, AvatarPart::LeftArm, Transform::at(-0.45, 0.2, 0.0));
    attach_part(graph, avatar, "right_arm", arm_geometry, arm_material, AvatarPart::RightArm, Transform::at(0.45, 0.2, 0.0));

    let (leg_geometry, leg_material) = create_mesh(
        backend,
        &Geometry::cylinder(0.1, 0.12, 0.8, 8),
        &Material::lambert(LIMB_LEG_COLOR),
    )?;
    attach_part(graph, avatar, "left_leg", leg_geometry, leg_material, AvatarPart::LeftLeg, Transform::at(-0.15, -1.0, 0.0));
    attach_part(graph, avatar, "right_leg", leg_geometry, leg_material, AvatarPart::RightLeg, Transform::at(0.15, -1.0, 0.0));

    let (ground_geometry, ground_material) = create_mesh(
        backend,
        &Geometry::plane(10.0, 10.0),
        &Material::translucent(GROUND_COLOR, 0.5),
    )?;
    graph.add_node(
        None,
        "ground",
        NodeKind::Mesh(MeshNode {
            geometry: ground_geometry,
            material: ground_material,
            transparent: true,
            part: None,
        }),
        Transform::at(0.0, -1.5, 0.0).with_rotation(-FRAC_PI_2, 0.0, 0.0),
    );

    Ok((avatar, body_material, head_material))
}

/// Geometry plus material, or neither
fn create_mesh<B: RenderBackend + ?Sized>(
    backend: &mut B,
    geometry: &Geometry,
    material: &Material,
) -> SceneResult<(GeometryHandle, MaterialHandle)> {
    let geometry = backend.create_geometry(geometry)?;
    match backend.create_material(material) {
        Ok(material) => Ok((geometry, material)),
        Err(e) => {
            backend.release_geometry(geometry);
            Err(e)
        }
    }
}

fn attach_part(
    graph: &mut SceneGraph,
    avatar: NodeId,
    name: &str,
    geometry: GeometryHandle,
    material: MaterialHandle,
    part: AvatarPart,
    transform: Transform,
) -> NodeId {
    let mesh = MeshNode {
        geometry,
        material,
        transparent: false,
        part: Some(part),
    };
    graph.add_node(Some(avatar), name, NodeKind::Mesh(mesh), transform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::backend::HeadlessBackend;

    fn item(id: &str, category: AvatarCategory) -> AvatarItem {
        AvatarItem::new(id, id, format!("/models/{id}.glb"), category)
    }

    #[test]
    fn test_patch_from_categories() {
        assert_eq!(AppearancePatch::from_equipped(&[]), AppearancePatch::default());

        let patch = AppearancePatch::from_equipped(&[item("shirt1", AvatarCategory::Shirts)]);
        assert_eq!(patch.torso_color, SHIRT_COLOR);
        assert_eq!(patch.head_color, HEAD_COLOR);

        let patch = AppearancePatch::from_equipped(&[
            item("hat1", AvatarCategory::Hats),
            item("pants1", AvatarCategory::Pants),
            item("acc1", AvatarCategory::Accessories),
        ]);
        assert_eq!(patch.torso_color, BODY_COLOR);
        assert_eq!(patch.head_color, HAT_COLOR);
    }

    #[test]
    fn test_scene_shape() {
        let surface = PreviewSurface::new(SurfaceSize::new(64, 64));
        let mut renderer = SceneRenderer::new(HeadlessBackend::new(), RendererOptions::default());
        renderer.mount(&surface).unwrap();

        let live = renderer.backend().live_resources();
        // body, head, arm, leg, ground
        assert_eq!(live.geometries, 5);
        assert_eq!(live.materials, 5);
        assert_eq!(live.textures, 1);
        assert_eq!(live.contexts, 1);
    }

    #[test]
    fn test_equipped_before_mount_applies_on_mount() {
        let surface = PreviewSurface::new(SurfaceSize::new(64, 64));
        let mut renderer = SceneRenderer::new(HeadlessBackend::new(), RendererOptions::default());
        renderer.set_equipped(&[item("shirt1", AvatarCategory::Shirts)]);
        renderer.mount(&surface).unwrap();

        let scene = renderer.scene.as_ref().unwrap();
        let material = renderer.backend().material(scene.body_material).unwrap();
        assert_eq!(material.color.to_hex(), SHIRT_COLOR);
    }

    #[test]
    fn test_failed_mount_releases_everything_it_created() {
        // 11 resources make up the full scene; fail at every step before that
        for limit in 0..11 {
            let surface = PreviewSurface::new(SurfaceSize::new(64, 64));
            let backend = HeadlessBackend::new().with_resource_limit(limit);
            let mut renderer = SceneRenderer::new(backend, RendererOptions::default());

            assert!(renderer.mount(&surface).is_err(), "limit {}", limit);
            assert!(!renderer.is_mounted());
            assert!(!surface.is_bound());
            assert!(renderer.backend().live_resources().is_empty());
            assert_eq!(renderer.backend().dropped_with_context(), 0, "limit {}", limit);
        }
    }

    #[test]
    fn test_frame_error_clears_after_recovery() {
        let surface = PreviewSurface::new(SurfaceSize::new(64, 64));
        let mut backend = HeadlessBackend::new();
        backend.fail_renders(1);
        let mut renderer = SceneRenderer::new(backend, RendererOptions::default());
        renderer.mount(&surface).unwrap();

        assert!(renderer.frame().is_err());
        assert!(matches!(renderer.last_error(), Some(SceneError::Backend { .. })));
        assert!(renderer.is_running());

        renderer.frame().unwrap();
        assert!(renderer.last_error().is_none());
        assert_eq!(renderer.backend().frames_rendered(), 1);
    }

    #[test]
    fn test_frame_rotates_avatar() {
        let surface = PreviewSurface::new(SurfaceSize::new(64, 64));
        let mut renderer = SceneRenderer::new(HeadlessBackend::new(), RendererOptions::default());
        renderer.mount(&surface).unwrap();
        for _ in 0..10 {
            renderer.frame().unwrap();
        }
        let rotation = renderer.avatar_rotation().unwrap();
        assert!((rotation - 0.1).abs() < 1e-5);
        assert_eq!(renderer.backend().frames_rendered(), 10);
    }
}
