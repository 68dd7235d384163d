//! CPU rasterizer
//!
//! Flat-shaded Lambert triangles into an RGBA framebuffer with a depth
//! buffer. Used when no GPU adapter is wanted or available.

use cgmath::{InnerSpace, Matrix4, Vector3, Vector4};
use image::RgbaImage;
use tracing::{debug, info, warn};

use super::{
    DrawItem, Frame, GeometryHandle, MaterialHandle, RenderBackend, ResourceCounts, ResourceTable,
    TextureDesc, TextureHandle,
};
use crate::rendering::geometry::Geometry;
use crate::rendering::light::LightUniform;
use crate::rendering::material::{Color, Material};
use crate::rendering::surface::SurfaceSize;
use crate::rendering::{SceneError, SceneResult};

/// Framebuffer for software rendering
pub struct Framebuffer {
    pub image: RgbaImage,
    pub zbuffer: Vec<f32>,
}

impl Framebuffer {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            image: RgbaImage::new(size.width, size.height),
            zbuffer: vec![f32::MAX; (size.width * size.height) as usize],
        }
    }

    pub fn width(&self) -> usize {
        self.image.width() as usize
    }

    pub fn height(&self) -> usize {
        self.image.height() as usize
    }

    pub fn clear(&mut self, color: Color) {
        let bytes = color.to_rgba8(1.0);
        for pixel in self.image.pixels_mut() {
            pixel.0 = bytes;
        }
        self.zbuffer.fill(f32::MAX);
    }

    /// Depth-tested write. Transparent fragments blend and leave depth alone.
    fn shade_pixel(&mut self, x: usize, y: usize, z: f32, rgb: [f32; 3], alpha: f32, blend: bool) {
        let idx = y * self.width() + x;
        if z >= self.zbuffer[idx] {
            return;
        }
        let pixel = self.image.get_pixel_mut(x as u32, y as u32);
        if blend {
            for c in 0..3 {
                let dst = pixel.0[c] as f32 / 255.0;
                let out = rgb[c] * alpha + dst * (1.0 - alpha);
                pixel.0[c] = (out.clamp(0.0, 1.0) * 255.0).round() as u8;
            }
        } else {
            self.zbuffer[idx] = z;
            for c in 0..3 {
                pixel.0[c] = (rgb[c].clamp(0.0, 1.0) * 255.0).round() as u8;
            }
            pixel.0[3] = 255;
        }
    }
}

/// Screen-space vertex: pixel x/y plus depth in `0..1`
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    z: f32,
}

pub struct SoftwareBackend {
    framebuffer: Option<Framebuffer>,
    geometries: ResourceTable<Geometry>,
    materials: ResourceTable<Material>,
    textures: ResourceTable<TextureDesc>,
}

impl SoftwareBackend {
    pub fn new() -> Self {
        Self {
            framebuffer: None,
            geometries: ResourceTable::new(),
            materials: ResourceTable::new(),
            textures: ResourceTable::new(),
        }
    }

    fn draw(&mut self, draw: &DrawItem, frame: &Frame) -> SceneResult<()> {
        let geometry = self
            .geometries
            .get(draw.geometry.0)
            .ok_or_else(|| SceneError::backend(format!("unknown geometry {:?}", draw.geometry)))?;
        let material = *self
            .materials
            .get(draw.material.0)
            .ok_or_else(|| SceneError::backend(format!("unknown material {:?}", draw.material)))?;
        let Some(fb) = self.framebuffer.as_mut() else {
            return Err(SceneError::backend("no active context"));
        };

        let eye = Vector3::from(frame.eye);
        let (width, height) = (fb.width() as f32, fb.height() as f32);

        for tri in geometry.triangles() {
            let world: [Vector4<f32>; 3] = [0, 1, 2].map(|i| {
                let [x, y, z] = tri[i].position;
                draw.model * Vector4::new(x, y, z, 1.0)
            });
            let rgb = shade_face(&world, eye, &material, &frame.lights);

            let clip = world.map(|w| frame.view_proj * w);
            let polygon = clip_near(&clip);
            if polygon.len() < 3 {
                continue;
            }
            let screen: Vec<ScreenVertex> = polygon
                .iter()
                .map(|c| ScreenVertex {
                    x: (c.x / c.w + 1.0) * 0.5 * width,
                    y: (1.0 - c.y / c.w) * 0.5 * height,
                    z: c.z / c.w,
                })
                .collect();

            for i in 1..screen.len() - 1 {
                rasterize_triangle(
                    fb,
                    [screen[0], screen[i], screen[i + 1]],
                    rgb,
                    material.opacity,
                    draw.transparent,
                );
            }
        }
        Ok(())
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Flat Lambert colour for one face, normal oriented towards the viewer
fn shade_face(world: &[Vector4<f32>; 3], eye: Vector3<f32>, material: &Material, lights: &LightUniform) -> [f32; 3] {
    let p0 = world[0].truncate();
    let p1 = world[1].truncate();
    let p2 = world[2].truncate();
    let mut normal = (p1 - p0).cross(p2 - p0);
    if normal.magnitude2() > 0.0 {
        normal = normal.normalize();
    }
    let center = (p0 + p1 + p2) / 3.0;
    if normal.dot(eye - center) < 0.0 {
        normal = -normal;
    }

    let light_dir = Vector3::from(lights.direction);
    let diffuse = normal.dot(light_dir).max(0.0) * lights.directional_intensity;
    let base = material.color.to_array();
    let mut rgb = [0.0; 3];
    for c in 0..3 {
        let light = lights.ambient_color[c] * lights.ambient_intensity + lights.color[c] * diffuse;
        rgb[c] = base[c] * light;
    }
    rgb
}

/// Clip a triangle against the near plane (`z >= 0` in clip space)
fn clip_near(clip: &[Vector4<f32>; 3]) -> Vec<Vector4<f32>> {
    let mut out = Vec::with_capacity(4);
    for i in 0..3 {
        let current = clip[i];
        let next = clip[(i + 1) % 3];
        let current_inside = current.z >= 0.0;
        let next_inside = next.z >= 0.0;
        if current_inside {
            out.push(current);
        }
        if current_inside != next_inside {
            let t = current.z / (current.z - next.z);
            out.push(current + (next - current) * t);
        }
    }
    out
}

/// Edge-function rasterization with incremental stepping
fn rasterize_triangle(fb: &mut Framebuffer, v: [ScreenVertex; 3], rgb: [f32; 3], alpha: f32, blend: bool) {
    let [v1, v2, v3] = v;
    let min_x = v1.x.min(v2.x).min(v3.x).max(0.0) as usize;
    let max_x = (v1.x.max(v2.x).max(v3.x) + 1.0).min(fb.width() as f32).max(0.0) as usize;
    let min_y = v1.y.min(v2.y).min(v3.y).max(0.0) as usize;
    let max_y = (v1.y.max(v2.y).max(v3.y) + 1.0).min(fb.height() as f32).max(0.0) as usize;
    if min_x >= max_x || min_y >= max_y {
        return;
    }

    let area = (v2.y - v3.y) * (v1.x - v3.x) + (v3.x - v2.x) * (v1.y - v3.y);
    if area.abs() < 0.00001 {
        return;
    }
    let inv_area = 1.0 / area;

    let a0 = v2.y - v3.y;
    let b0 = v3.x - v2.x;
    let a1 = v3.y - v1.y;
    let b1 = v1.x - v3.x;

    // Sample at pixel centres
    let start_x = min_x as f32 + 0.5;
    let start_y = min_y as f32 + 0.5;
    let mut w0_row = a0 * (start_x - v3.x) + b0 * (start_y - v3.y);
    let mut w1_row = a1 * (start_x - v3.x) + b1 * (start_y - v3.y);

    for y in min_y..max_y {
        let mut w0 = w0_row;
        let mut w1 = w1_row;
        for x in min_x..max_x {
            let bc_x = w0 * inv_area;
            let bc_y = w1 * inv_area;
            let bc_z = 1.0 - bc_x - bc_y;

            const ERR: f32 = -0.0001;
            if bc_x >= ERR && bc_y >= ERR && bc_z >= ERR {
                // NDC depth is affine in screen space
                let z = bc_x * v1.z + bc_y * v2.z + bc_z * v3.z;
                if (0.0..=1.0).contains(&z) {
                    fb.shade_pixel(x, y, z, rgb, alpha, blend);
                }
            }
            w0 += a0;
            w1 += a1;
        }
        w0_row += b0;
        w1_row += b1;
    }
}

impl RenderBackend for SoftwareBackend {
    fn name(&self) -> &'static str {
        "software"
    }

    fn create_context(&mut self, size: SurfaceSize) -> SceneResult<()> {
        if size.is_empty() {
            return Err(SceneError::unsupported("surface has zero area"));
        }
        if self.framebuffer.is_some() {
            return Err(SceneError::backend("context already created"));
        }
        info!("Software rasterizer context {}x{}", size.width, size.height);
        self.framebuffer = Some(Framebuffer::new(size));
        Ok(())
    }

    fn release_context(&mut self) {
        if self.framebuffer.take().is_none() {
            return;
        }
        let leftover = self.geometries.len() + self.materials.len() + self.textures.len();
        if leftover > 0 {
            warn!("Releasing software context with {} resources still live", leftover);
            self.geometries.drain().for_each(drop);
            self.materials.drain().for_each(drop);
            self.textures.drain().for_each(drop);
        }
        debug!("Software rasterizer context released");
    }

    fn has_context(&self) -> bool {
        self.framebuffer.is_some()
    }

    fn resize(&mut self, size: SurfaceSize) {
        if size.is_empty() {
            return;
        }
        if let Some(fb) = self.framebuffer.as_mut() {
            if fb.image.width() != size.width || fb.image.height() != size.height {
                *fb = Framebuffer::new(size);
            }
        }
    }

    fn create_geometry(&mut self, geometry: &Geometry) -> SceneResult<GeometryHandle> {
        Ok(GeometryHandle(self.geometries.insert(geometry.clone())))
    }

    fn release_geometry(&mut self, handle: GeometryHandle) {
        self.geometries.remove(handle.0);
    }

    fn create_material(&mut self, material: &Material) -> SceneResult<MaterialHandle> {
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
        Ok(TextureHandle(self.textures.insert(desc.clone())))
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        self.textures.remove(handle.0);
    }

    fn render(&mut self, frame: &Frame) -> SceneResult<()> {
        let Some(fb) = self.framebuffer.as_mut() else {
            return Err(SceneError::backend("no active context"));
        };
        fb.clear(frame.clear_color);
        for draw in frame.ordered_draws() {
            self.draw(draw, frame)?;
        }
        Ok(())
    }

    fn frame_image(&self) -> Option<&RgbaImage> {
        self.framebuffer.as_ref().map(|fb| &fb.image)
    }

    fn live_resources(&self) -> ResourceCounts {
        ResourceCounts {
            contexts: usize::from(self.framebuffer.is_some()),
            geometries: self.geometries.len(),
            materials: self.materials.len(),
            textures: self.textures.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::camera::Camera;
    use crate::rendering::light::{to_uniform, AmbientLight};
    use cgmath::SquareMatrix;

    fn frame_with(draws: Vec<DrawItem>) -> Frame {
        let camera = Camera::default();
        Frame {
            view_proj: camera.build_view_projection_matrix(),
            eye: camera.eye.into(),
            lights: to_uniform(Some(&AmbientLight::new(0xffffff, 1.0)), None),
            clear_color: Color::from_hex(0x1f2937),
            draws,
        }
    }

    #[test]
    fn test_clear_only() {
        let mut backend = SoftwareBackend::new();
        backend.create_context(SurfaceSize::new(32, 32)).unwrap();
        backend.render(&frame_with(Vec::new())).unwrap();
        let image = backend.frame_image().unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [0x1f, 0x29, 0x37, 255]);
    }

    #[test]
    fn test_sphere_covers_center() {
        let mut backend = SoftwareBackend::new();
        backend.create_context(SurfaceSize::new(64, 64)).unwrap();
        let geometry = backend.create_geometry(&Geometry::sphere(0.5, 16, 16)).unwrap();
        let material = backend.create_material(&Material::lambert(0xff0000)).unwrap();
        let draw = DrawItem {
            geometry,
            material,
            model: Matrix4::identity(),
            transparent: false,
        };
        backend.render(&frame_with(vec![draw])).unwrap();

        let image = backend.frame_image().unwrap();
        assert_eq!(image.get_pixel(32, 32).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(0, 0).0, [0x1f, 0x29, 0x37, 255]);
    }

    #[test]
    fn test_near_clip_keeps_front_part() {
        let clip = [
            Vector4::new(0.0, 0.0, 0.5, 1.0),
            Vector4::new(1.0, 0.0, 0.5, 1.0),
            Vector4::new(0.0, 1.0, -0.5, 1.0),
        ];
        let polygon = clip_near(&clip);
        assert_eq!(polygon.len(), 4);
        assert!(polygon.iter().all(|v| v.z >= -1e-6));
    }

    #[test]
    fn test_render_without_context_fails() {
        let mut backend = SoftwareBackend::new();
        assert!(matches!(
            backend.render(&frame_with(Vec::new())),
            Err(SceneError::Backend { .. })
        ));
    }
}
