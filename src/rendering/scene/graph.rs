use cgmath::{Matrix4, SquareMatrix};
use std::collections::BTreeSet;
use tracing::debug;

use super::{Node, NodeKind, Transform};
use crate::rendering::backend::{DrawItem, RenderBackend};
use crate::rendering::light::{self, AmbientLight, DirectionalLight, LightUniform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// What a dispose pass handed back to the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisposeReport {
    pub nodes: usize,
    pub geometries: usize,
    pub materials: usize,
    pub textures: usize,
}

/// Arena-backed ownership tree of scene nodes.
///
/// Nodes hold backend handles only; [`dispose`](Self::dispose) walks the
/// tree once and releases every handle it reaches, shared handles included
/// exactly once.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        SceneGraph {
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn add_node(
        &mut self,
        parent: Option<NodeId>,
        name: impl Into<String>,
        kind: NodeKind,
        transform: Transform,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        // Unknown parents attach at the root
        let parent = parent.filter(|p| p.0 < self.nodes.len());
        self.nodes.push(Node {
            name: name.into(),
            kind,
            transform,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(p) => self.nodes[p.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn transform_mut(&mut self, id: NodeId) -> Option<&mut Transform> {
        self.nodes.get_mut(id.0).map(|n| &mut n.transform)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first walk from the roots with each node's world matrix
    pub fn traverse<F>(&self, mut visit: F)
    where
        F: FnMut(NodeId, &Node, &Matrix4<f32>),
    {
        let mut stack: Vec<(NodeId, Matrix4<f32>)> = self
            .roots
            .iter()
            .rev()
            .map(|&id| (id, Matrix4::identity()))
            .collect();

        while let Some((id, parent_world)) = stack.pop() {
            let node = &self.nodes[id.0];
            let world = parent_world * node.transform.matrix();
            visit(id, node, &world);
            for &child in node.children.iter().rev() {
                stack.push((child, world));
            }
        }
    }

    pub fn world_matrix(&self, id: NodeId) -> Option<Matrix4<f32>> {
        let mut node = self.node(id)?;
        let mut world = node.transform.matrix();
        while let Some(parent) = node.parent {
            node = &self.nodes[parent.0];
            world = node.transform.matrix() * world;
        }
        Some(world)
    }

    pub fn draw_list(&self) -> Vec<DrawItem> {
        let mut draws = Vec::new();
        self.traverse(|_, node, world| {
            if let NodeKind::Mesh(mesh) = &node.kind {
                draws.push(DrawItem {
                    geometry: mesh.geometry,
                    material: mesh.material,
                    model: *world,
                    transparent: mesh.transparent,
                });
            }
        });
        draws
    }

    /// First ambient and first directional light combined into a uniform
    pub fn light_uniform(&self) -> LightUniform {
        let mut ambient: Option<&AmbientLight> = None;
        let mut directional: Option<&DirectionalLight> = None;
        for node in &self.nodes {
            match &node.kind {
                NodeKind::AmbientLight(light) if ambient.is_none() => ambient = Some(light),
                NodeKind::DirectionalLight { light, .. } if directional.is_none() => {
                    directional = Some(light)
                }
                _ => {}
            }
        }
        light::to_uniform(ambient, directional)
    }

    /// Release every backend resource reachable from the roots and empty the
    /// graph. Safe to call on an empty graph.
    pub fn dispose<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> DisposeReport {
        let mut geometries = BTreeSet::new();
        let mut materials = BTreeSet::new();
        let mut textures = BTreeSet::new();
        let mut nodes = 0;

        self.traverse(|_, node, _| {
            nodes += 1;
            match &node.kind {
                NodeKind::Mesh(mesh) => {
                    geometries.insert(mesh.geometry);
                    materials.insert(mesh.material);
                }
                NodeKind::DirectionalLight {
                    shadow_map: Some(texture),
                    ..
                } => {
                    textures.insert(*texture);
                }
                _ => {}
            }
        });

        for &handle in &geometries {
            backend.release_geometry(handle);
        }
        for &handle in &materials {
            backend.release_material(handle);
        }
        for &handle in &textures {
            backend.release_texture(handle);
        }

        self.nodes.clear();
        self.roots.clear();

        let report = DisposeReport {
            nodes,
            geometries: geometries.len(),
            materials: materials.len(),
            textures: textures.len(),
        };
        debug!("Scene disposed: {:?}", report);
        report
    }
}
