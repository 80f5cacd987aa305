//! Scene graph: game objects, components, transforms, cameras, lights

pub mod camera;
pub mod component;
mod error;
pub mod game_object;
pub mod lights;
pub mod mesh_renderer;
#[allow(clippy::module_inception)]
mod scene;
pub mod transform;

pub use camera::{Camera, CameraMatrices, Projection};
pub use component::{Capabilities, Component, ComponentId, RenderArgs, ScriptContext};
pub use error::SceneError;
pub use game_object::{GameObject, GameObjectId};
pub use lights::{Light, LightBinding, LightKind, LightsUniform, SceneLights, MAX_POINT_LIGHTS};
pub use mesh_renderer::MeshRenderer;
pub use scene::{ComponentListener, ListenerId, Scene};
pub use transform::{DirtyFlags, TransformGraph, TransformId};
