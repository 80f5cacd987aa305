//! Scene error types

use thiserror::Error;

use crate::scene::lights::LightKind;

/// Errors surfaced by scene-graph and render-path operations.
#[derive(Debug, Error)]
pub enum SceneError {
    /// A transform was asked to become its own parent.
    #[error("a transform cannot be its own parent")]
    SelfParent,

    /// A re-parent would make a transform an ancestor of itself.
    #[error("re-parenting would create a cycle in the transform hierarchy")]
    CyclicParent,

    /// A second exclusive light of the same kind was bound.
    #[error("scene already has a {kind:?} light bound")]
    DuplicateLight { kind: LightKind },

    /// The game object handle no longer refers to a live object.
    #[error("stale game object handle")]
    StaleGameObject,

    /// The component handle no longer refers to a live component.
    #[error("stale component handle")]
    StaleComponent,

    /// The transform handle no longer refers to a live transform.
    #[error("stale transform handle")]
    StaleTransform,

    /// A component that needs a transform was used before activation bound
    /// one.
    #[error("component is not attached to a game object transform")]
    Unattached,

    /// A handle resolved to a component of a different concrete type.
    #[error("component is not a {expected}")]
    WrongComponentType { expected: &'static str },

    /// The operation exists in the public surface but has no backing
    /// implementation yet.
    #[error("unimplemented: {0}")]
    Unimplemented(&'static str),
}
