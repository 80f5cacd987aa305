//! A scene-graph runtime for 3D applications
//!
//! This crate provides:
//! - A transform hierarchy with lazily cached world matrices
//! - Game objects composed from lifecycle-driven components
//! - Deferred structural mutation with priority-ordered update dispatch
//! - Cameras, scene lights, and backend-agnostic render seams

pub mod core;
pub mod render;
pub mod scene;

// Re-exports for convenience
pub use glam;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::core::{Engine, EngineConfig, FrameStats, Time};
    pub use crate::render::{ClearFlags, Material, Mesh, RenderContext, Shader};
    pub use crate::scene::{
        Camera, CameraMatrices, Capabilities, Component, ComponentId, ComponentListener,
        GameObject, GameObjectId, Light, LightKind, MeshRenderer, Projection, RenderArgs, Scene,
        SceneError, SceneLights, ScriptContext, TransformGraph, TransformId,
    };
    pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
}
