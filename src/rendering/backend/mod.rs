//! Render backends
//!
//! A backend owns the graphics context and every resource created through
//! it. Resources are referred to by typed handles; the scene graph stores
//! handles only and hands them back on dispose.

pub mod headless;
pub mod software;
pub mod gpu;

pub use self::headless::HeadlessBackend;
pub use self::software::SoftwareBackend;
pub use self::gpu::WgpuBackend;

use cgmath::Matrix4;
use image::RgbaImage;
use std::collections::HashMap;

use super::geometry::Geometry;
use super::light::LightUniform;
use super::material::{Color, Material};
use super::surface::SurfaceSize;
use super::SceneResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryHandle(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialHandle(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureUsage {
    ShadowMap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub usage: TextureUsage,
}

impl TextureDesc {
    pub fn shadow_map(size: u32) -> Self {
        Self {
            label: "Shadow Map".to_string(),
            width: size,
            height: size,
            usage: TextureUsage::ShadowMap,
        }
    }
}

/// Number of live resources held by a backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub contexts: usize,
    pub geometries: usize,
    pub materials: usize,
    pub textures: usize,
}

impl ResourceCounts {
    pub fn total(&self) -> usize {
        self.contexts + self.geometries + self.materials + self.textures
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub geometry: GeometryHandle,
    pub material: MaterialHandle,
    pub model: Matrix4<f32>,
    pub transparent: bool,
}

/// Everything a backend needs to draw one frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub view_proj: Matrix4<f32>,
    pub eye: [f32; 3],
    pub lights: LightUniform,
    pub clear_color: Color,
    pub draws: Vec<DrawItem>,
}

impl Frame {
    /// Opaque draws first, then transparent ones, each in submission order
    pub fn ordered_draws(&self) -> impl Iterator<Item = &DrawItem> {
        self.draws
            .iter()
            .filter(|d| !d.transparent)
            .chain(self.draws.iter().filter(|d| d.transparent))
    }
}

pub trait RenderBackend {
    fn name(&self) -> &'static str;

    /// Acquire a drawing context sized to the surface
    fn create_context(&mut self, size: SurfaceSize) -> SceneResult<()>;
    fn release_context(&mut self);
    fn has_context(&self) -> bool;
    fn resize(&mut self, size: SurfaceSize);

    fn create_geometry(&mut self, geometry: &Geometry) -> SceneResult<GeometryHandle>;
    fn release_geometry(&mut self, handle: GeometryHandle);

    fn create_material(&mut self, material: &Material) -> SceneResult<MaterialHandle>;
    fn update_material(&mut self, handle: MaterialHandle, material: &Material);
    fn release_material(&mut self, handle: MaterialHandle);

    fn create_texture(&mut self, desc: &TextureDesc) -> SceneResult<TextureHandle>;
    fn release_texture(&mut self, handle: TextureHandle);

    fn render(&mut self, frame: &Frame) -> SceneResult<()>;

    /// Last rendered frame, if the backend produces pixels
    fn frame_image(&self) -> Option<&RgbaImage>;

    fn live_resources(&self) -> ResourceCounts;
}

impl<B: RenderBackend + ?Sized> RenderBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn create_context(&mut self, size: SurfaceSize) -> SceneResult<()> {
        (**self).create_context(size)
    }

    fn release_context(&mut self) {
        (**self).release_context()
    }

    fn has_context(&self) -> bool {
        (**self).has_context()
    }

    fn resize(&mut self, size: SurfaceSize) {
        (**self).resize(size)
    }

    fn create_geometry(&mut self, geometry: &Geometry) -> SceneResult<GeometryHandle> {
        (**self).create_geometry(geometry)
    }

    fn release_geometry(&mut self, handle: GeometryHandle) {
        (**self).release_geometry(handle)
    }

    fn create_material(&mut self, material: &Material) -> SceneResult<MaterialHandle> {
        (**self).create_material(material)
    }

    fn update_material(&mut self, handle: MaterialHandle, material: &Material) {
        (**self).update_material(handle, material)
    }

    fn release_material(&mut self, handle: MaterialHandle) {
        (**self).release_material(handle)
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> SceneResult<TextureHandle> {
        (**self).create_texture(desc)
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        (**self).release_texture(handle)
    }

    fn render(&mut self, frame: &Frame) -> SceneResult<()> {
        (**self).render(frame)
    }

    fn frame_image(&self) -> Option<&RgbaImage> {
        (**self).frame_image()
    }

    fn live_resources(&self) -> ResourceCounts {
        (**self).live_resources()
    }
}

/// Id-keyed storage for backend resources
#[derive(Debug)]
pub struct ResourceTable<V> {
    entries: HashMap<u32, V>,
    next_id: u32,
}

impl<V> ResourceTable<V> {
    pub fn new() -> Self {
        ResourceTable {
            entries: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn insert(&mut self, value: V) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.insert(id, value);
        id
    }

    pub fn get(&self, id: u32) -> Option<&V> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut V> {
        self.entries.get_mut(&id)
    }

    pub fn remove(&mut self, id: u32) -> Option<V> {
        self.entries.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = V> + '_ {
        self.entries.drain().map(|(_, v)| v)
    }
}

impl<V> Default for ResourceTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_table_ids_not_reused() {
        let mut table = ResourceTable::new();
        let a = table.insert("a");
        table.remove(a);
        let b = table.insert("b");
        assert_ne!(a, b);
        assert_eq!(table.get(b), Some(&"b"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_ordered_draws_puts_transparent_last() {
        let draw = |id, transparent| DrawItem {
            geometry: GeometryHandle(id),
            material: MaterialHandle(id),
            model: cgmath::SquareMatrix::identity(),
            transparent,
        };
        let frame = Frame {
            view_proj: cgmath::SquareMatrix::identity(),
            eye: [0.0; 3],
            lights: LightUniform::default(),
            clear_color: Color::from_hex(0),
            draws: vec![draw(0, true), draw(1, false), draw(2, false)],
        };
        let order: Vec<u32> = frame.ordered_draws().map(|d| d.geometry.0).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }
}
