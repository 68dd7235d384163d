use bytemuck::{Pod, Zeroable};
use std::f32::consts::PI;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;

        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// CPU-side triangle mesh. Backends upload it on `create_geometry`.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub label: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl Geometry {
    /// Closed cylinder along the y axis, centred on the origin.
    pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, radial_segments: u16) -> Self {
        let segments = radial_segments.max(3);
        let half_height = height / 2.0;
        let slope = (radius_bottom - radius_top) / height;
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        // Side: two rings, top then bottom
        for (y, radius) in [(half_height, radius_top), (-half_height, radius_bottom)] {
            for x in 0..=segments {
                let theta = x as f32 / segments as f32 * 2.0 * PI;
                let (sin, cos) = theta.sin_cos();
                let normal = normalize([sin, slope, cos]);
                vertices.push(Vertex {
                    position: [radius * sin, y, radius * cos],
                    normal,
                });
            }
        }
        let ring = segments + 1;
        for x in 0..segments {
            let a = x;
            let b = x + ring;
            let c = x + ring + 1;
            let d = x + 1;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }

        for (y, radius, sign) in [(half_height, radius_top, 1.0), (-half_height, radius_bottom, -1.0)] {
            if radius <= 0.0 {
                continue;
            }
            let center = vertices.len() as u16;
            vertices.push(Vertex {
                position: [0.0, y, 0.0],
                normal: [0.0, sign, 0.0],
            });
            for x in 0..=segments {
                let theta = x as f32 / segments as f32 * 2.0 * PI;
                let (sin, cos) = theta.sin_cos();
                vertices.push(Vertex {
                    position: [radius * sin, y, radius * cos],
                    normal: [0.0, sign, 0.0],
                });
            }
            for x in 0..segments {
                let i = center + 1 + x;
                if sign > 0.0 {
                    indices.extend_from_slice(&[i, i + 1, center]);
                } else {
                    indices.extend_from_slice(&[i + 1, i, center]);
                }
            }
        }

        Self {
            label: format!("cylinder({radius_top}, {radius_bottom}, {height})"),
            vertices,
            indices,
        }
    }

    /// UV sphere centred on the origin.
    pub fn sphere(radius: f32, width_segments: u16, height_segments: u16) -> Self {
        let width = width_segments.max(3);
        let height = height_segments.max(2);
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for iy in 0..=height {
            let v = iy as f32 / height as f32;
            for ix in 0..=width {
                let u = ix as f32 / width as f32;
                let position = [
                    -radius * (u * 2.0 * PI).cos() * (v * PI).sin(),
                    radius * (v * PI).cos(),
                    radius * (u * 2.0 * PI).sin() * (v * PI).sin(),
                ];
                vertices.push(Vertex {
                    position,
                    normal: normalize(position),
                });
            }
        }

        let row = width + 1;
        for iy in 0..height {
            for ix in 0..width {
                let a = iy * row + ix + 1;
                let b = iy * row + ix;
                let c = (iy + 1) * row + ix;
                let d = (iy + 1) * row + ix + 1;
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self {
            label: format!("sphere({radius})"),
            vertices,
            indices,
        }
    }

    /// Flat rectangle in the xy plane facing +z.
    pub fn plane(width: f32, height: f32) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        let normal = [0.0, 0.0, 1.0];
        let vertices = vec![
            Vertex { position: [-hw, hh, 0.0], normal },
            Vertex { position: [hw, hh, 0.0], normal },
            Vertex { position: [-hw, -hh, 0.0], normal },
            Vertex { position: [hw, -hh, 0.0], normal },
        ];
        Self {
            label: format!("plane({width}, {height})"),
            vertices,
            indices: vec![0, 2, 1, 2, 3, 1],
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [&Vertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                &self.vertices[tri[0] as usize],
                &self.vertices[tri[1] as usize],
                &self.vertices[tri[2] as usize],
            ]
        })
    }
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len == 0.0 {
        v
    } else {
        [v[0] / len, v[1] / len, v[2] / len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_indices_in_range(geometry: &Geometry) {
        let count = geometry.vertices.len() as u16;
        assert!(geometry.indices.iter().all(|&i| i < count), "{}", geometry.label);
        assert_eq!(geometry.indices.len() % 3, 0);
    }

    #[test]
    fn test_cylinder_shape() {
        let body = Geometry::cylinder(0.3, 0.4, 1.2, 8);
        assert_indices_in_range(&body);
        // 8 side quads plus two 8-triangle caps
        assert_eq!(body.triangle_count(), 16 + 8 + 8);

        let max_y = body.vertices.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        assert!((max_y - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_sphere_vertices_on_radius() {
        let head = Geometry::sphere(0.25, 16, 16);
        assert_indices_in_range(&head);
        assert_eq!(head.vertices.len(), 17 * 17);
        for v in &head.vertices {
            let [x, y, z] = v.position;
            assert!(((x * x + y * y + z * z).sqrt() - 0.25).abs() < 1e-5);
        }
    }

    #[test]
    fn test_plane() {
        let ground = Geometry::plane(10.0, 10.0);
        assert_indices_in_range(&ground);
        assert_eq!(ground.triangle_count(), 2);
    }
}
