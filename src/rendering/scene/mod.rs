pub mod graph;

pub use graph::{DisposeReport, NodeId, SceneGraph};

use cgmath::{Matrix4, Rad, Vector3};

use super::backend::{GeometryHandle, MaterialHandle, TextureHandle};
use super::light::{AmbientLight, DirectionalLight};

/// Local transform. Rotation is Euler angles in radians, applied X then Y then Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Vector3::new(x, y, z);
        self
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from_angle_x(Rad(self.rotation.x))
            * Matrix4::from_angle_y(Rad(self.rotation.y))
            * Matrix4::from_angle_z(Rad(self.rotation.z))
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// Placeholder avatar pieces the renderer recolours or animates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AvatarPart {
    Body,
    Head,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshNode {
    pub geometry: GeometryHandle,
    pub material: MaterialHandle,
    pub transparent: bool,
    pub part: Option<AvatarPart>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh(MeshNode),
    AmbientLight(AmbientLight),
    DirectionalLight {
        light: DirectionalLight,
        shadow_map: Option<TextureHandle>,
    },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}
