//! Avatar preview rendering
//!
//! A small scene graph of primitive solids, a camera, a light rig and a
//! pluggable [`RenderBackend`](backend::RenderBackend). The
//! [`SceneRenderer`](renderer::SceneRenderer) owns the lifecycle: it acquires
//! a context on mount, animates while running, and releases every resource on
//! unmount.

pub mod backend;
pub mod camera;
pub mod geometry;
pub mod light;
pub mod material;
pub mod metrics;
pub mod renderer;
pub mod scene;
pub mod surface;

pub use backend::{RenderBackend, ResourceCounts};
pub use renderer::{AppearancePatch, SceneRenderer};
pub use surface::{PreviewSurface, SurfaceSize};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("3D preview is not supported on this system: {reason}")]
    Unsupported { reason: String },

    #[error("Preview surface is already bound to renderer {owner}")]
    SurfaceInUse { owner: uuid::Uuid },

    #[error("Render backend error: {reason}")]
    Backend { reason: String },
}

impl SceneError {
    pub fn unsupported(reason: impl Into<String>) -> Self {
        SceneError::Unsupported { reason: reason.into() }
    }

    pub fn backend(reason: impl Into<String>) -> Self {
        SceneError::Backend { reason: reason.into() }
    }
}

pub type SceneResult<T> = Result<T, SceneError>;
