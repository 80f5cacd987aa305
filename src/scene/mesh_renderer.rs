//! Mesh renderer component

use crate::render::{Material, Mesh};
use crate::scene::component::{Capabilities, Component, RenderArgs, ScriptContext};
use crate::scene::transform::TransformId;

/// Draws a mesh with a material at its game object's global transform.
///
/// Does nothing until both a mesh and a material are assigned.
#[derive(Default)]
pub struct MeshRenderer {
    mesh: Option<Box<dyn Mesh>>,
    material: Option<Box<dyn Material>>,
    transform: Option<TransformId>,
}

impl MeshRenderer {
    /// Renderer with no mesh or material assigned yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer ready to draw.
    #[must_use]
    pub fn with(mesh: Box<dyn Mesh>, material: Box<dyn Material>) -> Self {
        Self {
            mesh: Some(mesh),
            material: Some(material),
            transform: None,
        }
    }

    pub fn set_mesh(&mut self, mesh: Box<dyn Mesh>) {
        self.mesh = Some(mesh);
    }

    pub fn set_material(&mut self, material: Box<dyn Material>) {
        self.material = Some(material);
    }

    #[must_use]
    pub fn mesh(&self) -> Option<&dyn Mesh> {
        self.mesh.as_deref()
    }

    #[must_use]
    pub fn material(&self) -> Option<&dyn Material> {
        self.material.as_deref()
    }
}

impl Component for MeshRenderer {
    fn capabilities(&self) -> Capabilities {
        Capabilities::ACTIVATED | Capabilities::RENDER
    }

    fn activated(&mut self, ctx: &mut ScriptContext<'_>) {
        self.transform = ctx.transform();
    }

    fn render(&mut self, args: &mut RenderArgs<'_>) {
        let Some(transform) = self.transform else {
            return;
        };
        let Some(mesh) = self.mesh.as_deref_mut() else {
            return;
        };
        let Some(material) = self.material.as_deref_mut() else {
            return;
        };
        let model = args.transforms.global_matrix(transform);
        mesh.bind(material.shader());
        material.bind(args.matrices, model, args.lights);
        mesh.render();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::{Mat4, Vec3};

    use crate::core::Time;
    use crate::render::{RenderContext, Shader};
    use crate::scene::camera::{Camera, CameraMatrices};
    use crate::scene::lights::SceneLights;
    use crate::scene::Scene;

    use super::*;

    type Log = Rc<RefCell<Vec<String>>>;

    struct StubShader(Vec<String>);

    impl Shader for StubShader {
        fn attributes(&self) -> &[String] {
            &self.0
        }
    }

    struct StubMesh {
        attributes: Vec<String>,
        log: Log,
    }

    impl Mesh for StubMesh {
        fn attribute_names(&self) -> &[String] {
            &self.attributes
        }

        fn bind(&mut self, _shader: &dyn Shader) {
            self.log.borrow_mut().push("mesh:bind".to_owned());
        }

        fn render(&mut self) {
            self.log.borrow_mut().push("mesh:render".to_owned());
        }
    }

    struct StubMaterial {
        shader: StubShader,
        log: Log,
        last_model: Rc<RefCell<Mat4>>,
    }

    impl Material for StubMaterial {
        fn shader(&self) -> &dyn Shader {
            &self.shader
        }

        fn bind(&mut self, _matrices: &CameraMatrices, model: Mat4, _lights: &SceneLights) {
            self.log.borrow_mut().push("material:bind".to_owned());
            *self.last_model.borrow_mut() = model;
        }
    }

    #[test]
    fn renders_through_the_scene_with_the_object_transform() {
        let log: Log = Rc::default();
        let last_model = Rc::new(RefCell::new(Mat4::IDENTITY));

        let mut scene = Scene::new("test");
        let cam_go = scene.create_game_object();
        let cam = scene
            .add_component(cam_go, Box::new(Camera::default()))
            .unwrap();

        let go = scene.create_game_object();
        let mesh = StubMesh {
            attributes: vec!["position".to_owned()],
            log: Rc::clone(&log),
        };
        let material = StubMaterial {
            shader: StubShader(vec!["position".to_owned()]),
            log: Rc::clone(&log),
            last_model: Rc::clone(&last_model),
        };
        scene
            .add_component(go, Box::new(MeshRenderer::with(Box::new(mesh), Box::new(material))))
            .unwrap();

        scene.update(Time::default());
        let t = scene.transform_of(go).unwrap();
        scene.transforms_mut().set_local_translation(t, Vec3::new(2.0, 0.0, 0.0));

        let mut ctx = RenderContext::new(640, 480);
        scene.render(cam, &mut ctx).unwrap();

        // Bind-bind-draw, with the model matrix taken from the transform.
        assert_eq!(
            *log.borrow(),
            vec!["mesh:bind", "material:bind", "mesh:render"]
        );
        assert_eq!(
            last_model.borrow().w_axis.truncate(),
            Vec3::new(2.0, 0.0, 0.0)
        );
    }

    #[test]
    fn incomplete_renderer_skips_the_draw() {
        let log: Log = Rc::default();
        let mut scene = Scene::new("test");
        let cam_go = scene.create_game_object();
        let cam = scene
            .add_component(cam_go, Box::new(Camera::default()))
            .unwrap();

        let go = scene.create_game_object();
        let mut renderer = MeshRenderer::new();
        renderer.set_mesh(Box::new(StubMesh {
            attributes: vec![],
            log: Rc::clone(&log),
        }));
        scene.add_component(go, Box::new(renderer)).unwrap();

        scene.update(Time::default());
        let mut ctx = RenderContext::new(640, 480);
        scene.render(cam, &mut ctx).unwrap();
        assert!(log.borrow().is_empty());
    }
}
