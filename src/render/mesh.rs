//! Mesh, shader, and material seams
//!
//! Backend-agnostic traits the scene dispatches through. A concrete
//! backend supplies vertex data and program objects; the scene only needs
//! bind/draw entry points and attribute names for validation.

use glam::Mat4;

use crate::scene::camera::CameraMatrices;
use crate::scene::lights::SceneLights;

/// A compiled shader program.
pub trait Shader {
    /// Vertex attribute names the program consumes.
    fn attributes(&self) -> &[String];
}

/// Drawable vertex data.
pub trait Mesh {
    /// Attribute names this mesh can supply.
    fn attribute_names(&self) -> &[String];

    /// Bind the vertex streams the shader's attributes map to.
    fn bind(&mut self, shader: &dyn Shader);

    /// Issue the draw for the currently bound state.
    fn render(&mut self);

    /// Attribute names the shader wants but this mesh cannot supply.
    fn verify(&self, shader: &dyn Shader) -> Vec<String> {
        shader
            .attributes()
            .iter()
            .filter(|a| !self.attribute_names().contains(a))
            .cloned()
            .collect()
    }
}

/// Shader plus its per-draw parameter binding.
pub trait Material {
    fn shader(&self) -> &dyn Shader;

    /// Upload per-draw uniforms for one object.
    fn bind(&mut self, matrices: &CameraMatrices, model: Mat4, lights: &SceneLights);
}
