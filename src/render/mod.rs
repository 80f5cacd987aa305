//! Rendering seams: context state tracking and backend traits

mod context;
mod mesh;

pub use context::{ClearFlags, RenderContext};
pub use mesh::{Material, Mesh, Shader};
