//! Game objects: named transform anchors that own components

use slotmap::new_key_type;
use smallvec::SmallVec;

use crate::scene::component::ComponentId;
use crate::scene::transform::TransformId;

new_key_type! {
    /// Stable handle to a game object inside a scene.
    pub struct GameObjectId;
}

/// A node in the scene: one transform plus an ordered set of components.
///
/// Game objects are created and destroyed only through the scene, which
/// keeps the transform graph and component arena in sync with them.
#[derive(Debug)]
pub struct GameObject {
    pub(crate) name: String,
    pub(crate) transform: TransformId,
    pub(crate) components: SmallVec<[ComponentId; 4]>,
}

impl GameObject {
    pub(crate) fn new(name: String, transform: TransformId) -> Self {
        Self {
            name,
            transform,
            components: SmallVec::new(),
        }
    }

    /// Display name, used for lookups and logging.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The transform created alongside this object.
    #[must_use]
    pub fn transform(&self) -> TransformId {
        self.transform
    }

    /// Handles of the currently attached components, in attachment order.
    #[must_use]
    pub fn components(&self) -> &[ComponentId] {
        &self.components
    }
}
