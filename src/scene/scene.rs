//! Scene: game object and component lifecycle, frame dispatch
//!
//! The scene owns three arenas (game objects, transforms, components) plus
//! the per-frame dispatch lists. Structural mutations made while hooks are
//! running never touch the live lists directly; they land in pending queues
//! and are applied in a cleanup pass at the end of the frame, so a frame
//! always dispatches against the component set it started with.

use std::any::Any;

use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::core::Time;
use crate::render::RenderContext;
use crate::scene::camera::{Camera, CameraMatrices};
use crate::scene::component::{Capabilities, Component, ComponentId, ScriptContext};
use crate::scene::game_object::{GameObject, GameObjectId};
use crate::scene::lights::{Light, LightBinding, LightKind, LightsUniform, SceneLights};
use crate::scene::transform::{TransformGraph, TransformId};
use crate::scene::{RenderArgs, SceneError};

/// Observer notified when components enter or leave the live set.
///
/// Both hooks receive one batch per cleanup pass, not one call per
/// component. `components_removed` fires while the components are still
/// queryable through the scene.
pub trait ComponentListener {
    fn components_added(&mut self, scene: &Scene, added: &[ComponentId]);
    fn components_removed(&mut self, scene: &Scene, removed: &[ComponentId]);
}

/// Handle returned by [`Scene::add_component_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Clone, Copy)]
enum Hook {
    Activated,
    Deactivated,
    Update,
    LateUpdate,
}

/// One slot in the component arena.
///
/// The box sits in an `Option` so dispatch can lend the component out while
/// handing the hook a full `&mut Scene`. Capabilities and priority are
/// cached at attachment and never re-read.
struct ComponentEntry {
    component: Option<Box<dyn Component>>,
    owner: GameObjectId,
    caps: Capabilities,
    priority: i32,
    active: bool,
    dead: bool,
    removing: bool,
}

/// A collection of game objects, their components, and the scene lights.
#[derive(Default)]
pub struct Scene {
    name: String,

    game_objects: SlotMap<GameObjectId, GameObject>,
    transforms: TransformGraph,
    components: SlotMap<ComponentId, ComponentEntry>,

    /// Game objects that have survived at least one cleanup pass.
    live_objects: Vec<GameObjectId>,

    /// Dispatch lists, sorted by descending priority (stable within ties).
    update_list: Vec<ComponentId>,
    late_update_list: Vec<ComponentId>,
    render_list: Vec<ComponentId>,

    pending_new_objects: Vec<GameObjectId>,
    pending_delete_objects: Vec<GameObjectId>,
    pending_new_components: Vec<ComponentId>,
    pending_delete_components: Vec<ComponentId>,

    listeners: Vec<(ListenerId, Box<dyn ComponentListener>)>,
    next_listener: u64,

    lights: SceneLights,
}

impl Scene {
    /// Create an empty scene.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    /// Scene name, used for logging.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    // -------------------------------------------------------------------------
    // Game objects
    // -------------------------------------------------------------------------

    /// Spawn a game object with a default name. It joins the live set at
    /// the next cleanup pass; its transform is usable immediately.
    pub fn create_game_object(&mut self) -> GameObjectId {
        self.create_named_game_object("GameObject")
    }

    /// Spawn a game object with the given name.
    pub fn create_named_game_object(&mut self, name: &str) -> GameObjectId {
        let transform = self.transforms.insert();
        let id = self
            .game_objects
            .insert(GameObject::new(name.to_owned(), transform));
        self.pending_new_objects.push(id);
        log::debug!("scene '{}': created game object '{}'", self.name, name);
        id
    }

    /// Destroy a game object, its transform, and every attached component
    /// at the next cleanup pass.
    ///
    /// Attached components get no further `update`/`late_update`/`render`
    /// dispatch this frame; active ones still receive `deactivated` during
    /// cleanup.
    pub fn destroy_game_object(&mut self, id: GameObjectId) {
        let Some(go) = self.game_objects.get_mut(id) else {
            return;
        };
        log::debug!("scene '{}': destroying game object '{}'", self.name, go.name);
        let components: SmallVec<[ComponentId; 4]> = std::mem::take(&mut go.components);
        for cid in components {
            let Some(entry) = self.components.get_mut(cid) else {
                continue;
            };
            entry.dead = true;
            if entry.removing {
                continue;
            }
            entry.removing = true;
            if entry.active {
                self.pending_delete_components.push(cid);
            } else {
                // Added and destroyed within the same frame: never
                // activated, dropped without notification.
                self.pending_new_components.retain(|&c| c != cid);
                self.components.remove(cid);
            }
        }
        self.pending_delete_objects.push(id);
    }

    /// Look up a game object by handle.
    #[must_use]
    pub fn game_object(&self, id: GameObjectId) -> Option<&GameObject> {
        self.game_objects.get(id)
    }

    /// First live game object carrying the given name.
    #[must_use]
    pub fn find_game_object_by_name(&self, name: &str) -> Option<GameObjectId> {
        self.live_objects
            .iter()
            .copied()
            .find(|&id| self.game_objects.get(id).is_some_and(|go| go.name == name))
    }

    /// Number of game objects in the live set. Objects created this frame
    /// are not counted until cleanup.
    #[must_use]
    pub fn game_object_count(&self) -> usize {
        self.live_objects.len()
    }

    /// Handles of the live game objects, in activation order.
    #[must_use]
    pub fn live_game_objects(&self) -> &[GameObjectId] {
        &self.live_objects
    }

    /// Transform of a game object, if the object is alive.
    #[must_use]
    pub fn transform_of(&self, id: GameObjectId) -> Option<TransformId> {
        self.game_objects.get(id).map(|go| go.transform)
    }

    /// Shared access to the transform graph.
    #[must_use]
    pub fn transforms(&self) -> &TransformGraph {
        &self.transforms
    }

    /// Mutable access to the transform graph.
    pub fn transforms_mut(&mut self) -> &mut TransformGraph {
        &mut self.transforms
    }

    // -------------------------------------------------------------------------
    // Components
    // -------------------------------------------------------------------------

    /// Attach a component to a game object.
    ///
    /// Capabilities and priority are read once, here. The handle is valid
    /// immediately; activation and dispatch-list membership happen at the
    /// next cleanup pass.
    pub fn add_component(
        &mut self,
        game_object: GameObjectId,
        component: Box<dyn Component>,
    ) -> Result<ComponentId, SceneError> {
        let Some(go) = self.game_objects.get_mut(game_object) else {
            return Err(SceneError::StaleGameObject);
        };
        let caps = component.capabilities();
        let priority = component.script_priority();
        let id = self.components.insert(ComponentEntry {
            component: Some(component),
            owner: game_object,
            caps,
            priority,
            active: false,
            dead: false,
            removing: false,
        });
        go.components.push(id);
        self.pending_new_components.push(id);
        Ok(id)
    }

    /// Detach a component from its game object.
    ///
    /// An active component keeps receiving its frame hooks until the next
    /// cleanup pass, then gets `deactivated` and leaves the scene. A
    /// component added earlier this same frame is dropped silently, with no
    /// activation and no listener notification.
    pub fn remove_component(&mut self, id: ComponentId) {
        let Some(entry) = self.components.get_mut(id) else {
            return;
        };
        if entry.removing {
            return;
        }
        entry.removing = true;
        let owner = entry.owner;
        let active = entry.active;
        if let Some(go) = self.game_objects.get_mut(owner) {
            go.components.retain(|c| *c != id);
        }
        if active {
            self.pending_delete_components.push(id);
        } else {
            self.pending_new_components.retain(|&c| c != id);
            self.components.remove(id);
        }
    }

    /// Downcast a component handle to a concrete type.
    ///
    /// Returns `None` for stale handles, type mismatches, and components
    /// currently lent out to their own hook.
    #[must_use]
    pub fn component<T: Component>(&self, id: ComponentId) -> Option<&T> {
        let entry = self.components.get(id)?;
        let component = entry.component.as_deref()?;
        (component as &dyn Any).downcast_ref::<T>()
    }

    /// Mutable variant of [`Scene::component`].
    pub fn component_mut<T: Component>(&mut self, id: ComponentId) -> Option<&mut T> {
        let entry = self.components.get_mut(id)?;
        let component = entry.component.as_deref_mut()?;
        (component as &mut dyn Any).downcast_mut::<T>()
    }

    /// Owner of a component.
    #[must_use]
    pub fn component_owner(&self, id: ComponentId) -> Option<GameObjectId> {
        self.components.get(id).map(|e| e.owner)
    }

    /// Most recently attached component of a concrete type on one game
    /// object.
    ///
    /// Scans the attachment list in reverse. Linear in the object's
    /// component count; not for per-frame hot paths. The object's
    /// transform is not a component — it is always reachable through
    /// [`GameObject::transform`].
    #[must_use]
    pub fn component_of_type<T: Component>(
        &self,
        game_object: GameObjectId,
    ) -> Option<ComponentId> {
        let go = self.game_objects.get(game_object)?;
        go.components
            .iter()
            .copied()
            .rev()
            .find(|&c| self.component::<T>(c).is_some())
    }

    /// Every component of a concrete type on one game object, most
    /// recently attached first.
    #[must_use]
    pub fn components_of_type<T: Component>(&self, game_object: GameObjectId) -> Vec<ComponentId> {
        let Some(go) = self.game_objects.get(game_object) else {
            return Vec::new();
        };
        go.components
            .iter()
            .copied()
            .rev()
            .filter(|&c| self.component::<T>(c).is_some())
            .collect()
    }

    /// Find the most recently activated component of a concrete type.
    ///
    /// Linear in the number of live components.
    #[must_use]
    pub fn find_component_of_type<T: Component>(&self) -> Option<ComponentId> {
        self.live_objects.iter().rev().find_map(|&go| {
            self.game_objects.get(go).and_then(|go| {
                go.components
                    .iter()
                    .copied()
                    .rev()
                    .find(|&c| self.component::<T>(c).is_some())
            })
        })
    }

    /// Find every live component of a concrete type, in activation order.
    #[must_use]
    pub fn find_components_of_type<T: Component>(&self) -> Vec<ComponentId> {
        let mut out = Vec::new();
        for &go in &self.live_objects {
            let Some(go) = self.game_objects.get(go) else {
                continue;
            };
            out.extend(
                go.components
                    .iter()
                    .copied()
                    .filter(|&c| self.component::<T>(c).is_some()),
            );
        }
        out
    }

    // -------------------------------------------------------------------------
    // Listeners
    // -------------------------------------------------------------------------

    /// Register a component listener. Fires starting with the next cleanup
    /// pass.
    pub fn add_component_listener(&mut self, listener: Box<dyn ComponentListener>) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Unregister a listener. Returns whether it was registered.
    pub fn remove_component_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    // -------------------------------------------------------------------------
    // Lights
    // -------------------------------------------------------------------------

    /// Register a [`Light`] component with the scene light set.
    ///
    /// Ambient and directional slots are exclusive: binding a second light
    /// of either kind fails and leaves the original binding untouched.
    pub fn bind_light(&mut self, id: ComponentId) -> Result<(), SceneError> {
        let entry = self.components.get(id).ok_or(SceneError::StaleComponent)?;
        let light = entry
            .component
            .as_deref()
            .and_then(|c| (c as &dyn Any).downcast_ref::<Light>())
            .ok_or(SceneError::WrongComponentType { expected: "Light" })?;
        let kind = light.kind();
        let transform = self
            .game_objects
            .get(entry.owner)
            .map(|go| go.transform)
            .ok_or(SceneError::StaleGameObject)?;
        let binding = LightBinding {
            component: id,
            transform,
        };
        match kind {
            LightKind::Ambient => self.lights.set_ambient(Some(binding))?,
            LightKind::Directional => self.lights.set_directional(Some(binding))?,
            LightKind::Point => self.lights.add_point(binding),
        }
        Ok(())
    }

    /// The scene light set.
    #[must_use]
    pub fn lights(&self) -> &SceneLights {
        &self.lights
    }

    /// Mutable access to the scene light set.
    pub fn lights_mut(&mut self) -> &mut SceneLights {
        &mut self.lights
    }

    /// Pack the bound lights into a GPU-ready uniform block.
    ///
    /// Directional terms use the view-space values computed during the last
    /// [`Scene::render`] call.
    #[must_use]
    pub fn lights_uniform(&self) -> LightsUniform {
        self.lights.to_uniform(
            |id| self.component::<Light>(id),
            &self.transforms,
        )
    }

    // -------------------------------------------------------------------------
    // Frame dispatch
    // -------------------------------------------------------------------------

    /// Run one frame of script dispatch: all `update` hooks in priority
    /// order, then all `late_update` hooks, then the cleanup pass that
    /// applies pending structural changes.
    pub fn update(&mut self, time: Time) {
        for i in 0..self.update_list.len() {
            let id = self.update_list[i];
            self.dispatch(id, time, Hook::Update);
        }
        for i in 0..self.late_update_list.len() {
            let id = self.late_update_list[i];
            self.dispatch(id, time, Hook::LateUpdate);
        }
        self.cleanup(time);
    }

    /// Render the scene through the given camera component.
    ///
    /// Sets up the viewport and clear state, derives the camera matrices,
    /// refreshes the view-space directional light terms, then dispatches
    /// every render-capable component.
    pub fn render(
        &mut self,
        camera: ComponentId,
        ctx: &mut RenderContext,
    ) -> Result<CameraMatrices, SceneError> {
        let entry = self.components.get(camera).ok_or(SceneError::StaleComponent)?;
        let cam = entry
            .component
            .as_deref()
            .and_then(|c| (c as &dyn Any).downcast_ref::<Camera>())
            .ok_or(SceneError::WrongComponentType { expected: "Camera" })?;
        let matrices = cam.setup_camera(ctx, &self.transforms)?;
        self.lights
            .recompute_directional(&matrices.view, &self.transforms);

        for i in 0..self.render_list.len() {
            let id = self.render_list[i];
            let Some(entry) = self.components.get_mut(id) else {
                continue;
            };
            if entry.dead || !entry.active {
                continue;
            }
            let Some(mut component) = entry.component.take() else {
                continue;
            };
            {
                let mut args = RenderArgs {
                    matrices: &matrices,
                    lights: &self.lights,
                    transforms: &self.transforms,
                };
                component.render(&mut args);
            }
            if let Some(entry) = self.components.get_mut(id) {
                entry.component = Some(component);
            }
        }
        Ok(matrices)
    }

    fn dispatch(&mut self, id: ComponentId, time: Time, hook: Hook) {
        let Some(entry) = self.components.get_mut(id) else {
            return;
        };
        if entry.dead && !matches!(hook, Hook::Deactivated) {
            return;
        }
        let Some(mut component) = entry.component.take() else {
            return;
        };
        let owner = entry.owner;
        let mut ctx = ScriptContext {
            scene: self,
            game_object: owner,
            component: id,
            time,
        };
        match hook {
            Hook::Activated => component.activated(&mut ctx),
            Hook::Deactivated => component.deactivated(&mut ctx),
            Hook::Update => component.update(&mut ctx),
            Hook::LateUpdate => component.late_update(&mut ctx),
        }
        if let Some(entry) = self.components.get_mut(id) {
            entry.component = Some(component);
        }
    }

    /// Apply all pending structural changes queued since the last cleanup.
    ///
    /// Order matters: new objects join the live set, destroyed objects
    /// leave it, new components activate and join the dispatch lists, then
    /// removed components deactivate and leave. Changes queued by hooks
    /// running inside this pass wait for the next frame.
    fn cleanup(&mut self, time: Time) {
        let new_objects = std::mem::take(&mut self.pending_new_objects);
        for id in new_objects {
            if self.game_objects.contains_key(id) {
                self.live_objects.push(id);
            }
        }

        let dead_objects = std::mem::take(&mut self.pending_delete_objects);
        for id in dead_objects {
            if let Some(go) = self.game_objects.remove(id) {
                self.transforms.remove(go.transform);
                self.live_objects.retain(|&o| o != id);
            }
        }

        let new_components = std::mem::take(&mut self.pending_new_components);
        let mut added = Vec::with_capacity(new_components.len());
        for id in new_components {
            let Some(entry) = self.components.get_mut(id) else {
                continue;
            };
            if entry.dead {
                self.components.remove(id);
                continue;
            }
            entry.active = true;
            let caps = entry.caps;
            let priority = entry.priority;
            if caps.contains(Capabilities::ACTIVATED) {
                self.dispatch(id, time, Hook::Activated);
            }
            if caps.contains(Capabilities::UPDATE) {
                let pos = self
                    .update_list
                    .partition_point(|&c| self.components[c].priority >= priority);
                self.update_list.insert(pos, id);
            }
            if caps.contains(Capabilities::LATE_UPDATE) {
                let pos = self
                    .late_update_list
                    .partition_point(|&c| self.components[c].priority >= priority);
                self.late_update_list.insert(pos, id);
            }
            if caps.contains(Capabilities::RENDER) {
                self.render_list.push(id);
            }
            added.push(id);
        }
        if !added.is_empty() {
            log::trace!("scene '{}': activated {} component(s)", self.name, added.len());
            self.notify(&added, true);
        }

        let deletes = std::mem::take(&mut self.pending_delete_components);
        let mut removed = Vec::with_capacity(deletes.len());
        for id in deletes {
            let Some(entry) = self.components.get(id) else {
                continue;
            };
            if entry.active && entry.caps.contains(Capabilities::DEACTIVATED) {
                self.dispatch(id, time, Hook::Deactivated);
            }
            self.update_list.retain(|&c| c != id);
            self.late_update_list.retain(|&c| c != id);
            self.render_list.retain(|&c| c != id);
            self.lights.unbind(id);
            removed.push(id);
        }
        if !removed.is_empty() {
            log::trace!("scene '{}': removed {} component(s)", self.name, removed.len());
            // Notify while the components are still queryable.
            self.notify(&removed, false);
            for id in removed {
                self.components.remove(id);
            }
        }
    }

    fn notify(&mut self, batch: &[ComponentId], added: bool) {
        let mut listeners = std::mem::take(&mut self.listeners);
        for (_, listener) in listeners.iter_mut() {
            if added {
                listener.components_added(self, batch);
            } else {
                listener.components_removed(self, batch);
            }
        }
        // Listeners registered during notification keep their spot behind
        // the existing ones.
        listeners.append(&mut self.listeners);
        self.listeners = listeners;
    }

    // -------------------------------------------------------------------------
    // Serialization
    // -------------------------------------------------------------------------

    /// Rebuild the scene from a serialized description.
    pub fn load_scene(&mut self, _source: &str) -> Result<(), SceneError> {
        Err(SceneError::Unimplemented("scene deserialization"))
    }

    /// Serialize the scene to a string description.
    pub fn save_scene(&self) -> Result<String, SceneError> {
        Err(SceneError::Unimplemented("scene serialization"))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        tag: &'static str,
        priority: i32,
        log: Log,
    }

    impl Recorder {
        fn boxed(tag: &'static str, priority: i32, log: &Log) -> Box<dyn Component> {
            Box::new(Self {
                tag,
                priority,
                log: Rc::clone(log),
            })
        }
    }

    impl Component for Recorder {
        fn capabilities(&self) -> Capabilities {
            Capabilities::ACTIVATED
                | Capabilities::DEACTIVATED
                | Capabilities::UPDATE
                | Capabilities::LATE_UPDATE
        }

        fn script_priority(&self) -> i32 {
            self.priority
        }

        fn activated(&mut self, _ctx: &mut ScriptContext<'_>) {
            self.log.borrow_mut().push(format!("{}:activated", self.tag));
        }

        fn deactivated(&mut self, _ctx: &mut ScriptContext<'_>) {
            self.log.borrow_mut().push(format!("{}:deactivated", self.tag));
        }

        fn update(&mut self, _ctx: &mut ScriptContext<'_>) {
            self.log.borrow_mut().push(format!("{}:update", self.tag));
        }

        fn late_update(&mut self, _ctx: &mut ScriptContext<'_>) {
            self.log.borrow_mut().push(format!("{}:late", self.tag));
        }
    }

    struct CountingListener {
        log: Log,
    }

    impl ComponentListener for CountingListener {
        fn components_added(&mut self, _scene: &Scene, added: &[ComponentId]) {
            self.log.borrow_mut().push(format!("added:{}", added.len()));
        }

        fn components_removed(&mut self, scene: &Scene, removed: &[ComponentId]) {
            // Components must still be queryable here.
            let live = removed
                .iter()
                .filter(|&&id| scene.component::<Recorder>(id).is_some())
                .count();
            self.log.borrow_mut().push(format!("removed:{}:{}", removed.len(), live));
        }
    }

    fn tick(scene: &mut Scene) {
        scene.update(Time::default());
    }

    #[test]
    fn components_activate_at_end_of_frame_not_immediately() {
        let log: Log = Rc::default();
        let mut scene = Scene::new("test");
        let go = scene.create_game_object();
        scene.add_component(go, Recorder::boxed("a", 0, &log)).unwrap();

        // No dispatch this frame; activation happens in cleanup, so the
        // first update call comes one frame later.
        tick(&mut scene);
        assert_eq!(*log.borrow(), vec!["a:activated"]);

        tick(&mut scene);
        assert_eq!(
            *log.borrow(),
            vec!["a:activated", "a:update", "a:late"]
        );
    }

    #[test]
    fn update_runs_in_descending_priority_with_stable_ties() {
        let log: Log = Rc::default();
        let mut scene = Scene::new("test");
        let go = scene.create_game_object();
        scene.add_component(go, Recorder::boxed("p5a", 5, &log)).unwrap();
        scene.add_component(go, Recorder::boxed("m1", -1, &log)).unwrap();
        scene.add_component(go, Recorder::boxed("p0", 0, &log)).unwrap();
        scene.add_component(go, Recorder::boxed("p5b", 5, &log)).unwrap();
        tick(&mut scene);
        log.borrow_mut().clear();

        tick(&mut scene);
        let updates: Vec<String> = log
            .borrow()
            .iter()
            .filter(|e| e.ends_with(":update"))
            .map(|e| e.split(':').next().unwrap().to_owned())
            .collect();
        assert_eq!(updates, vec!["p5a", "p5b", "p0", "m1"]);
    }

    #[test]
    fn all_updates_run_before_any_late_update() {
        let log: Log = Rc::default();
        let mut scene = Scene::new("test");
        let go = scene.create_game_object();
        scene.add_component(go, Recorder::boxed("a", 0, &log)).unwrap();
        scene.add_component(go, Recorder::boxed("b", 0, &log)).unwrap();
        tick(&mut scene);
        log.borrow_mut().clear();

        tick(&mut scene);
        assert_eq!(
            *log.borrow(),
            vec!["a:update", "b:update", "a:late", "b:late"]
        );
    }

    #[test]
    fn listener_gets_one_batch_per_cleanup() {
        let log: Log = Rc::default();
        let mut scene = Scene::new("test");
        scene.add_component_listener(Box::new(CountingListener {
            log: Rc::clone(&log),
        }));
        let go = scene.create_game_object();
        let a = scene.add_component(go, Recorder::boxed("a", 0, &log)).unwrap();
        let b = scene.add_component(go, Recorder::boxed("b", 0, &log)).unwrap();
        scene.add_component(go, Recorder::boxed("c", 0, &log)).unwrap();
        tick(&mut scene);
        assert_eq!(log.borrow().iter().filter(|e| *e == "added:3").count(), 1);

        log.borrow_mut().clear();
        scene.remove_component(a);
        scene.remove_component(b);
        tick(&mut scene);
        // One removal batch of two, both still queryable at notify time.
        assert!(log.borrow().contains(&"removed:2:2".to_owned()));
    }

    #[test]
    fn removed_component_finishes_the_frame_then_deactivates() {
        let log: Log = Rc::default();
        let mut scene = Scene::new("test");
        let go = scene.create_game_object();
        let a = scene.add_component(go, Recorder::boxed("a", 0, &log)).unwrap();
        tick(&mut scene);
        log.borrow_mut().clear();

        scene.remove_component(a);
        tick(&mut scene);
        assert_eq!(
            *log.borrow(),
            vec!["a:update", "a:late", "a:deactivated"]
        );

        log.borrow_mut().clear();
        tick(&mut scene);
        assert!(log.borrow().is_empty());
        assert!(scene.component::<Recorder>(a).is_none());
    }

    #[test]
    fn add_then_remove_same_frame_is_dropped_silently() {
        let log: Log = Rc::default();
        let mut scene = Scene::new("test");
        scene.add_component_listener(Box::new(CountingListener {
            log: Rc::clone(&log),
        }));
        let go = scene.create_game_object();
        let a = scene.add_component(go, Recorder::boxed("a", 0, &log)).unwrap();
        scene.remove_component(a);
        tick(&mut scene);
        assert!(log.borrow().is_empty());
        assert!(scene.component::<Recorder>(a).is_none());
    }

    #[test]
    fn destroy_blocks_same_frame_dispatch_but_still_deactivates() {
        let log: Log = Rc::default();
        let mut scene = Scene::new("test");
        let go = scene.create_game_object();
        scene.add_component(go, Recorder::boxed("a", 0, &log)).unwrap();
        tick(&mut scene);
        log.borrow_mut().clear();

        scene.destroy_game_object(go);
        tick(&mut scene);
        assert_eq!(*log.borrow(), vec!["a:deactivated"]);
        assert_eq!(scene.game_object_count(), 0);
        assert!(scene.transform_of(go).is_none());
    }

    #[test]
    fn object_count_reflects_deferred_creation() {
        let mut scene = Scene::new("test");
        let go = scene.create_game_object();
        assert_eq!(scene.game_object_count(), 0);
        assert!(scene.transform_of(go).is_some());
        tick(&mut scene);
        assert_eq!(scene.game_object_count(), 1);
    }

    struct Spawner {
        spawned: Rc<RefCell<Option<GameObjectId>>>,
    }

    impl Component for Spawner {
        fn capabilities(&self) -> Capabilities {
            Capabilities::UPDATE
        }

        fn update(&mut self, ctx: &mut ScriptContext<'_>) {
            if self.spawned.borrow().is_none() {
                let id = ctx.create_game_object();
                *self.spawned.borrow_mut() = Some(id);
            }
        }
    }

    struct AddsSibling {
        log: Log,
        added: bool,
    }

    impl Component for AddsSibling {
        fn capabilities(&self) -> Capabilities {
            Capabilities::UPDATE
        }

        fn update(&mut self, ctx: &mut ScriptContext<'_>) {
            self.log.borrow_mut().push("adder:update".to_owned());
            if !self.added {
                self.added = true;
                let go = ctx.game_object();
                ctx.add_component(go, Recorder::boxed("sib", 0, &self.log))
                    .unwrap();
            }
        }
    }

    #[test]
    fn component_added_during_update_waits_until_next_frame() {
        let log: Log = Rc::default();
        let mut scene = Scene::new("test");
        let go = scene.create_game_object();
        scene
            .add_component(
                go,
                Box::new(AddsSibling {
                    log: Rc::clone(&log),
                    added: false,
                }),
            )
            .unwrap();
        tick(&mut scene);

        // The sibling is added mid-update: it must not update this frame,
        // and its activation fires once, in this frame's cleanup.
        tick(&mut scene);
        assert_eq!(*log.borrow(), vec!["adder:update", "sib:activated"]);

        tick(&mut scene);
        assert_eq!(
            *log.borrow(),
            vec![
                "adder:update",
                "sib:activated",
                "adder:update",
                "sib:update",
                "sib:late"
            ]
        );
    }

    #[test]
    fn structural_mutation_from_a_hook_is_deferred() {
        let spawned = Rc::new(RefCell::new(None));
        let mut scene = Scene::new("test");
        let go = scene.create_game_object();
        scene
            .add_component(
                go,
                Box::new(Spawner {
                    spawned: Rc::clone(&spawned),
                }),
            )
            .unwrap();
        tick(&mut scene);
        assert_eq!(scene.game_object_count(), 1);

        // Spawner's update runs this frame; the new object joins the live
        // set in the same frame's cleanup.
        tick(&mut scene);
        assert!(spawned.borrow().is_some());
        assert_eq!(scene.game_object_count(), 2);
    }

    #[test]
    fn typed_lookup_and_find() {
        let log: Log = Rc::default();
        let mut scene = Scene::new("test");
        let go = scene.create_game_object();
        let a = scene.add_component(go, Recorder::boxed("a", 0, &log)).unwrap();
        let b = scene.add_component(go, Recorder::boxed("b", 1, &log)).unwrap();
        tick(&mut scene);

        assert_eq!(scene.component::<Recorder>(a).map(|r| r.tag), Some("a"));
        assert_eq!(scene.find_components_of_type::<Recorder>(), vec![a, b]);
        assert_eq!(scene.find_component_of_type::<Recorder>(), Some(b));
        assert_eq!(scene.component_owner(a), Some(go));
    }

    #[test]
    fn per_object_queries_scan_in_reverse_attachment_order() {
        let log: Log = Rc::default();
        let mut scene = Scene::new("test");
        let go = scene.create_game_object();
        let a = scene.add_component(go, Recorder::boxed("a", 0, &log)).unwrap();
        let b = scene.add_component(go, Recorder::boxed("b", 0, &log)).unwrap();
        let other = scene.create_game_object();
        let c = scene.add_component(other, Recorder::boxed("c", 0, &log)).unwrap();
        tick(&mut scene);

        assert_eq!(scene.component_of_type::<Recorder>(go), Some(b));
        assert_eq!(scene.components_of_type::<Recorder>(go), vec![b, a]);
        assert_eq!(scene.components_of_type::<Recorder>(other), vec![c]);

        // The always-present transform is not part of the component list.
        assert_eq!(scene.component_of_type::<Camera>(go), None);

        scene.destroy_game_object(go);
        tick(&mut scene);
        assert_eq!(scene.component_of_type::<Recorder>(go), None);
        assert!(scene.components_of_type::<Recorder>(go).is_empty());
    }

    #[test]
    fn listener_can_be_removed() {
        let log: Log = Rc::default();
        let mut scene = Scene::new("test");
        let lid = scene.add_component_listener(Box::new(CountingListener {
            log: Rc::clone(&log),
        }));
        assert!(scene.remove_component_listener(lid));
        assert!(!scene.remove_component_listener(lid));

        let go = scene.create_game_object();
        scene.add_component(go, Recorder::boxed("a", 0, &log)).unwrap();
        tick(&mut scene);
        assert!(!log.borrow().iter().any(|e| e.starts_with("added")));
    }

    #[test]
    fn serialization_surface_reports_unimplemented() {
        let mut scene = Scene::new("test");
        assert!(matches!(
            scene.load_scene(""),
            Err(SceneError::Unimplemented(_))
        ));
        assert!(matches!(scene.save_scene(), Err(SceneError::Unimplemented(_))));
    }
}
