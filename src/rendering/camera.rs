use bytemuck::{Pod, Zeroable};
use cgmath::{Matrix4, Point3, SquareMatrix, Vector3};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

pub const DEFAULT_EYE: [f32; 3] = [0.0, 0.0, 3.0];

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub aspect: f32,
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: DEFAULT_EYE.into(),
            target: (0.0, 0.0, 0.0).into(),
            up: Vector3::unit_y(),
            aspect: 1.0,
            fovy: 75.0,
            znear: 0.1,
            zfar: 1000.0,
        }
    }
}

impl Camera {
    /// Clip-space transform with depth mapped to `0..1`
    pub fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        let view = Matrix4::look_at_rh(self.eye, self.target, self.up);
        let proj = cgmath::perspective(cgmath::Deg(self.fovy), self.aspect, self.znear, self.zfar);
        OPENGL_TO_WGPU_MATRIX * proj * view
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn reset_pose(&mut self) {
        self.eye = DEFAULT_EYE.into();
        self.target = (0.0, 0.0, 0.0).into();
        self.up = Vector3::unit_y();
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera) {
        self.view_proj = camera.build_view_projection_matrix().into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;

    #[test]
    fn test_origin_projects_to_center() {
        let camera = Camera::default();
        let clip = camera.build_view_projection_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-6);
        assert!(ndc.y.abs() < 1e-6);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_reset_pose_keeps_aspect() {
        let mut camera = Camera::default();
        camera.set_aspect(800, 400);
        camera.eye = Point3::new(4.0, 1.0, 0.0);
        camera.reset_pose();
        assert_eq!(camera.eye, Point3::new(0.0, 0.0, 3.0));
        assert_eq!(camera.aspect, 2.0);
    }

    #[test]
    fn test_zero_size_ignored() {
        let mut camera = Camera::default();
        camera.set_aspect(0, 300);
        assert_eq!(camera.aspect, 1.0);
    }
}
