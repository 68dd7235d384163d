use image::RgbaImage;
use tracing::{debug, warn};

use super::{
    Frame, GeometryHandle, MaterialHandle, RenderBackend, ResourceCounts, ResourceTable,
    TextureDesc, TextureHandle,
};
use crate::rendering::geometry::Geometry;
use crate::rendering::material::Material;
use crate::rendering::surface::SurfaceSize;
use crate::rendering::{SceneError, SceneResult};

/// Backend that draws nothing and only tracks resource ownership.
///
/// Used as a resource-count probe and as a stand-in where no pixels are
/// needed. `unsupported` builds one that refuses to create a context.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    context: Option<SurfaceSize>,
    geometries: ResourceTable<usize>,
    materials: ResourceTable<Material>,
    textures: ResourceTable<TextureDesc>,
    unsupported: Option<String>,
    resource_limit: Option<usize>,
    failing_renders: u32,
    frames_rendered: u64,
    contexts_created: u64,
    dropped_with_context: usize,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self {
            unsupported: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Refuse to create more than `limit` resources in one context
    pub fn with_resource_limit(mut self, limit: usize) -> Self {
        self.resource_limit = Some(limit);
        self
    }

    /// Make the next `count` renders fail
    pub fn fail_renders(&mut self, count: u32) {
        self.failing_renders = count;
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn contexts_created(&self) -> u64 {
        self.contexts_created
    }

    /// Resources that were still live when their context was released
    pub fn dropped_with_context(&self) -> usize {
        self.dropped_with_context
    }

    pub fn context_size(&self) -> Option<SurfaceSize> {
        self.context
    }

    pub fn material(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(handle.0)
    }

    fn require_context(&self) -> SceneResult<()> {
        if self.context.is_some() {
            Ok(())
        } else {
            Err(SceneError::backend("no active context"))
        }
    }

    fn require_capacity(&self) -> SceneResult<()> {
        self.require_context()?;
        let live = self.geometries.len() + self.materials.len() + self.textures.len();
        match self.resource_limit {
            Some(limit) if live >= limit => Err(SceneError::backend(format!("resource limit {} reached", limit))),
            _ => Ok(()),
        }
    }
}

impl RenderBackend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn create_context(&mut self, size: SurfaceSize) -> SceneResult<()> {
        if let Some(reason) = &self.unsupported {
            return Err(SceneError::unsupported(reason.clone()));
        }
        if self.context.is_some() {
            return Err(SceneError::backend("context already created"));
        }
        self.context = Some(size);
        self.contexts_created += 1;
        debug!("Headless context created at {}x{}", size.width, size.height);
        Ok(())
    }

    fn release_context(&mut self) {
        if self.context.take().is_none() {
            return;
        }
        // Resources die with their context
        let leftover = self.geometries.len() + self.materials.len() + self.textures.len();
        if leftover > 0 {
            warn!("Releasing headless context with {} resources still live", leftover);
            self.dropped_with_context += leftover;
            self.geometries.drain().for_each(drop);
            self.materials.drain().for_each(drop);
            self.textures.drain().for_each(drop);
        }
    }

    fn has_context(&self) -> bool {
        self.context.is_some()
    }

    fn resize(&mut self, size: SurfaceSize) {
        if let Some(current) = self.context.as_mut() {
            *current = size;
        }
    }

    fn create_geometry(&mut self, geometry: &Geometry) -> SceneResult<GeometryHandle> {
        self.require_capacity()?;
        Ok(GeometryHandle(self.geometries.insert(geometry.triangle_count())))
    }

    fn release_geometry(&mut self, handle: GeometryHandle) {
        self.geometries.remove(handle.0);
    }

    fn create_material(&mut self, material: &Material) -> SceneResult<MaterialHandle> {
        self.require_capacity()?;
        Ok(MaterialHandle(self.materials.insert(*material)))
    }

    fn update_material(&mut self, handle: MaterialHandle, material: &Material) {
        if let Some(slot) = self.materials.get_mut(handle.0) {
            *slot = *material;
        }
    }

    fn release_material(&mut self, handle: MaterialHandle) {
        self.materials.remove(handle.0);
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> SceneResult<TextureHandle> {
        self.require_capacity()?;
        Ok(TextureHandle(self.textures.insert(desc.clone())))
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        self.textures.remove(handle.0);
    }

    fn render(&mut self, frame: &Frame) -> SceneResult<()> {
        self.require_context()?;
        if self.failing_renders > 0 {
            self.failing_renders -= 1;
            return Err(SceneError::backend("injected render failure"));
        }
        for draw in &frame.draws {
            if self.geometries.get(draw.geometry.0).is_none() {
                return Err(SceneError::backend(format!("unknown geometry {:?}", draw.geometry)));
            }
            if self.materials.get(draw.material.0).is_none() {
                return Err(SceneError::backend(format!("unknown material {:?}", draw.material)));
            }
        }
        self.frames_rendered += 1;
        Ok(())
    }

    fn frame_image(&self) -> Option<&RgbaImage> {
        None
    }

    fn live_resources(&self) -> ResourceCounts {
        ResourceCounts {
            contexts: usize::from(self.context.is_some()),
            geometries: self.geometries.len(),
            materials: self.materials.len(),
            textures: self.textures.len(),
        }
    }
}
