use bytemuck::{Pod, Zeroable};
use cgmath::{InnerSpace, Point3, Vector3};

use super::material::Color;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LightUniform {
    /// Unit vector pointing towards the directional light
    pub direction: [f32; 3],
    pub ambient_intensity: f32,
    pub color: [f32; 3],
    pub directional_intensity: f32,
    pub ambient_color: [f32; 3],
    // Uniforms require 16 byte alignment
    pub _padding: u32,
}

impl Default for LightUniform {
    fn default() -> Self {
        Self {
            direction: [0.0, 1.0, 0.0],
            ambient_intensity: 1.0,
            color: [0.0; 3],
            directional_intensity: 0.0,
            ambient_color: [1.0; 3],
            _padding: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

impl AmbientLight {
    pub fn new(hex: u32, intensity: f32) -> Self {
        Self {
            color: Color::from_hex(hex),
            intensity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub color: Color,
    pub intensity: f32,
    pub cast_shadow: bool,
    pub shadow_map_size: u32,
}

impl DirectionalLight {
    pub fn new(hex: u32, intensity: f32, position: Point3<f32>) -> Self {
        Self {
            position,
            target: Point3::new(0.0, 0.0, 0.0),
            color: Color::from_hex(hex),
            intensity,
            cast_shadow: false,
            shadow_map_size: 0,
        }
    }

    pub fn with_shadow(mut self, map_size: u32) -> Self {
        self.cast_shadow = true;
        self.shadow_map_size = map_size;
        self
    }

    pub fn direction(&self) -> Vector3<f32> {
        let dir = self.position - self.target;
        if dir.magnitude2() == 0.0 {
            Vector3::unit_y()
        } else {
            dir.normalize()
        }
    }
}

/// Combine the scene's lights into the shader-facing uniform
pub fn to_uniform(ambient: Option<&AmbientLight>, directional: Option<&DirectionalLight>) -> LightUniform {
    let mut uniform = LightUniform {
        ambient_intensity: 0.0,
        ambient_color: [0.0; 3],
        ..LightUniform::default()
    };
    if let Some(ambient) = ambient {
        uniform.ambient_color = ambient.color.to_array();
        uniform.ambient_intensity = ambient.intensity;
    }
    if let Some(light) = directional {
        uniform.direction = light.direction().into();
        uniform.color = light.color.to_array();
        uniform.directional_intensity = light.intensity;
    }
    uniform
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout_is_aligned() {
        assert_eq!(std::mem::size_of::<LightUniform>() % 16, 0);
    }

    #[test]
    fn test_directional_points_to_light() {
        let light = DirectionalLight::new(0xffffff, 0.8, Point3::new(5.0, 5.0, 5.0));
        let uniform = to_uniform(None, Some(&light));
        let expected = 1.0 / 3f32.sqrt();
        for c in uniform.direction {
            assert!((c - expected).abs() < 1e-6);
        }
        assert_eq!(uniform.ambient_intensity, 0.0);
    }
}
