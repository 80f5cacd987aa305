//! Component trait and script dispatch context

use std::any::Any;

use bitflags::bitflags;
use slotmap::new_key_type;

use crate::core::Time;
use crate::scene::game_object::GameObjectId;
use crate::scene::lights::SceneLights;
use crate::scene::transform::{TransformGraph, TransformId};
use crate::scene::{CameraMatrices, Scene, SceneError};

new_key_type! {
    /// Stable handle to a component instance inside a scene.
    pub struct ComponentId;
}

bitflags! {
    /// Which lifecycle hooks a component wants.
    ///
    /// Read once when the component is added; the scene uses the bits to
    /// decide which dispatch lists the component joins, so changing the
    /// value after attachment has no effect.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u8 {
        const ACTIVATED = 1 << 0;
        const DEACTIVATED = 1 << 1;
        const UPDATE = 1 << 2;
        const LATE_UPDATE = 1 << 3;
        const RENDER = 1 << 4;
    }
}

/// A behavior attached to a game object.
///
/// Hooks default to no-ops; implementors override the ones they declare in
/// [`Component::capabilities`]. Hooks declared without the matching
/// capability bit are never called.
pub trait Component: Any {
    /// Hooks this component participates in.
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }

    /// Ordering key for update dispatch. Higher runs first; ties keep
    /// insertion order. Read once at attachment.
    fn script_priority(&self) -> i32 {
        0
    }

    /// Called once when the component enters the scene's live set.
    fn activated(&mut self, _ctx: &mut ScriptContext<'_>) {}

    /// Called once when the component leaves the live set.
    fn deactivated(&mut self, _ctx: &mut ScriptContext<'_>) {}

    /// Called every frame, in priority order.
    fn update(&mut self, _ctx: &mut ScriptContext<'_>) {}

    /// Called every frame after all `update` hooks.
    fn late_update(&mut self, _ctx: &mut ScriptContext<'_>) {}

    /// Called during camera rendering for render-capable components.
    fn render(&mut self, _args: &mut RenderArgs<'_>) {}
}

/// Everything a script hook may touch while it runs.
///
/// The component being dispatched is temporarily detached from the scene,
/// so the scene reference here is free of aliasing; structural mutations
/// made through it land in the pending queues and apply at end of frame.
pub struct ScriptContext<'a> {
    pub(crate) scene: &'a mut Scene,
    pub(crate) game_object: GameObjectId,
    pub(crate) component: ComponentId,
    pub(crate) time: Time,
}

impl ScriptContext<'_> {
    /// The game object this component is attached to.
    #[must_use]
    pub fn game_object(&self) -> GameObjectId {
        self.game_object
    }

    /// The handle of the component being dispatched.
    #[must_use]
    pub fn component_id(&self) -> ComponentId {
        self.component
    }

    /// Frame timing for this dispatch.
    #[must_use]
    pub fn time(&self) -> Time {
        self.time
    }

    /// The owning game object's transform, if the object is still alive.
    ///
    /// Returns `None` during `deactivated` when the whole object is being
    /// torn down.
    #[must_use]
    pub fn transform(&self) -> Option<TransformId> {
        self.scene.transform_of(self.game_object)
    }

    /// Shared access to the transform graph.
    #[must_use]
    pub fn transforms(&self) -> &TransformGraph {
        self.scene.transforms()
    }

    /// Mutable access to the transform graph.
    pub fn transforms_mut(&mut self) -> &mut TransformGraph {
        self.scene.transforms_mut()
    }

    /// The scene the component lives in.
    pub fn scene(&mut self) -> &mut Scene {
        self.scene
    }

    /// Spawn a new game object; it becomes live at end of frame.
    pub fn create_game_object(&mut self) -> GameObjectId {
        self.scene.create_game_object()
    }

    /// Destroy a game object and everything attached to it at end of frame.
    pub fn destroy_game_object(&mut self, id: GameObjectId) {
        self.scene.destroy_game_object(id);
    }

    /// Attach a component to a game object; it activates at end of frame.
    pub fn add_component(
        &mut self,
        game_object: GameObjectId,
        component: Box<dyn Component>,
    ) -> Result<ComponentId, SceneError> {
        self.scene.add_component(game_object, component)
    }

    /// Detach a component; its hooks keep running until end of frame.
    pub fn remove_component(&mut self, id: ComponentId) {
        self.scene.remove_component(id);
    }
}

/// Read-only frame state handed to render hooks.
pub struct RenderArgs<'a> {
    /// Matrices of the camera currently rendering.
    pub matrices: &'a CameraMatrices,
    /// Scene light set, with view-space directional terms already updated.
    pub lights: &'a SceneLights,
    /// Transform graph, for model matrices.
    pub transforms: &'a TransformGraph,
}
