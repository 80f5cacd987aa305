//! Hierarchical transform graph
//!
//! Stores every transform in a single arena and tracks parent/child links as
//! keys, so game objects, transforms, and the scene never hold reference
//! cycles. Derived matrices are cached per slot and recomputed lazily.

use std::cell::Cell;

use bitflags::bitflags;
use glam::{Mat4, Quat, Vec3};
use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use crate::scene::SceneError;

new_key_type! {
    /// Stable handle into the transform arena.
    pub struct TransformId;
}

bitflags! {
    /// One bit per cached derived value.
    ///
    /// A set bit means the slot is stale and must be recomputed before the
    /// next read. Global slots are invalidated whenever the node's local
    /// state or any ancestor's local state changes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DirtyFlags: u8 {
        const LOCAL = 1 << 0;
        const LOCAL_INV = 1 << 1;
        const GLOBAL = 1 << 2;
        const GLOBAL_INV = 1 << 3;
        const GLOBAL_POSITION = 1 << 4;
        const GLOBAL_ROTATION = 1 << 5;

        /// Everything derived from the parent chain.
        const GLOBAL_DERIVED = Self::GLOBAL.bits()
            | Self::GLOBAL_INV.bits()
            | Self::GLOBAL_POSITION.bits()
            | Self::GLOBAL_ROTATION.bits();
    }
}

/// A single node: local TRS state, hierarchy links, and lazily computed
/// caches.
///
/// Caches live in `Cell`s so reads can go through `&self` while still
/// memoizing, the same shape as a cached transform wrapper.
#[derive(Debug, Clone)]
struct TransformNode {
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,

    parent: Option<TransformId>,
    children: SmallVec<[TransformId; 8]>,

    local: Cell<Mat4>,
    local_inv: Cell<Mat4>,
    global: Cell<Mat4>,
    global_inv: Cell<Mat4>,
    global_position: Cell<Vec3>,
    global_rotation: Cell<Quat>,
    dirty: Cell<DirtyFlags>,
}

impl TransformNode {
    fn new() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            parent: None,
            children: SmallVec::new(),
            local: Cell::new(Mat4::IDENTITY),
            local_inv: Cell::new(Mat4::IDENTITY),
            global: Cell::new(Mat4::IDENTITY),
            global_inv: Cell::new(Mat4::IDENTITY),
            global_position: Cell::new(Vec3::ZERO),
            global_rotation: Cell::new(Quat::IDENTITY),
            dirty: Cell::new(DirtyFlags::all()),
        }
    }

    #[inline]
    fn is_stale(&self, slot: DirtyFlags) -> bool {
        self.dirty.get().contains(slot)
    }

    #[inline]
    fn clear(&self, slot: DirtyFlags) {
        self.dirty.set(self.dirty.get() - slot);
    }

    #[inline]
    fn mark(&self, slot: DirtyFlags) {
        self.dirty.set(self.dirty.get() | slot);
    }
}

/// Arena of hierarchical transforms.
///
/// Every game object owns exactly one entry, created with it and removed
/// with it. Matrix getters take `&self` and memoize through interior
/// mutability; all getters and local setters panic on a stale id (the same
/// contract as indexing the underlying arena). Structural operations that
/// can fail return `Result`.
#[derive(Debug, Default)]
pub struct TransformGraph {
    nodes: SlotMap<TransformId, TransformNode>,
}

impl TransformGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
        }
    }

    /// Allocate a new root transform at the origin.
    pub fn insert(&mut self) -> TransformId {
        self.nodes.insert(TransformNode::new())
    }

    /// Remove a transform, detaching it from its parent and turning its
    /// children into roots.
    pub fn remove(&mut self, id: TransformId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let parent = node.parent;
        let children: SmallVec<[TransformId; 8]> = node.children.clone();

        if let Some(p) = parent
            && let Some(pnode) = self.nodes.get_mut(p)
            && let Some(pos) = pnode.children.iter().position(|&c| c == id)
        {
            pnode.children.remove(pos);
        }
        for child in children {
            if let Some(cnode) = self.nodes.get_mut(child) {
                cnode.parent = None;
            }
            self.mark_global_dirty(child);
        }
        self.nodes.remove(id);
    }

    /// Whether `id` refers to a live transform.
    #[must_use]
    pub fn contains(&self, id: TransformId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live transforms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds no transforms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // -------------------------------------------------------------------------
    // Hierarchy
    // -------------------------------------------------------------------------

    /// Get the parent, if any.
    #[must_use]
    pub fn parent(&self, id: TransformId) -> Option<TransformId> {
        self.nodes[id].parent
    }

    /// Children in attachment order.
    #[must_use]
    pub fn children(&self, id: TransformId) -> &[TransformId] {
        &self.nodes[id].children
    }

    /// Re-parent a transform. `None` detaches it into a root.
    ///
    /// Fails with [`SceneError::SelfParent`] when `new_parent` is the
    /// transform itself and [`SceneError::CyclicParent`] when it is one of
    /// the transform's descendants; both leave the hierarchy untouched.
    /// Invalidates the global caches of the node and every descendant.
    pub fn set_parent(
        &mut self,
        id: TransformId,
        new_parent: Option<TransformId>,
    ) -> Result<(), SceneError> {
        if new_parent == Some(id) {
            return Err(SceneError::SelfParent);
        }
        if !self.nodes.contains_key(id) {
            return Err(SceneError::StaleTransform);
        }
        if let Some(p) = new_parent {
            if !self.nodes.contains_key(p) {
                return Err(SceneError::StaleTransform);
            }
            // Walk up from the new parent; hitting `id` means the parent
            // is a descendant and the link would close a cycle.
            let mut ancestor = Some(p);
            while let Some(a) = ancestor {
                if a == id {
                    return Err(SceneError::CyclicParent);
                }
                ancestor = self.nodes[a].parent;
            }
        }

        if let Some(old) = self.nodes[id].parent {
            let siblings = &mut self.nodes[old].children;
            if let Some(pos) = siblings.iter().position(|&c| c == id) {
                siblings.remove(pos);
            }
        }
        if let Some(p) = new_parent {
            self.nodes[p].children.push(id);
        }
        self.nodes[id].parent = new_parent;
        self.mark_global_dirty(id);
        Ok(())
    }

    /// Invalidate the global-derived cache slots of `id` and every
    /// descendant.
    ///
    /// This is the central invalidation walk: it fires on every local-state
    /// or parent-chain mutation, and it is a single bounded pass over the
    /// subtree regardless of how many readers later consume the caches.
    pub fn mark_global_dirty(&self, id: TransformId) {
        let node = &self.nodes[id];
        node.mark(DirtyFlags::GLOBAL_DERIVED);
        for &child in &node.children {
            self.mark_global_dirty(child);
        }
    }

    fn mark_local_dirty(&self, id: TransformId) {
        self.nodes[id].mark(DirtyFlags::LOCAL | DirtyFlags::LOCAL_INV);
        self.mark_global_dirty(id);
    }

    // -------------------------------------------------------------------------
    // Local state
    // -------------------------------------------------------------------------

    /// Local translation relative to the parent.
    #[must_use]
    pub fn local_translation(&self, id: TransformId) -> Vec3 {
        self.nodes[id].translation
    }

    /// Local rotation relative to the parent.
    #[must_use]
    pub fn local_rotation(&self, id: TransformId) -> Quat {
        self.nodes[id].rotation
    }

    /// Local scale.
    #[must_use]
    pub fn local_scale(&self, id: TransformId) -> Vec3 {
        self.nodes[id].scale
    }

    /// Set the local translation.
    pub fn set_local_translation(&mut self, id: TransformId, translation: Vec3) {
        self.nodes[id].translation = translation;
        self.mark_local_dirty(id);
    }

    /// Set the local rotation.
    pub fn set_local_rotation(&mut self, id: TransformId, rotation: Quat) {
        self.nodes[id].rotation = rotation;
        self.mark_local_dirty(id);
    }

    /// Set the local rotation from euler angles in radians (XYZ order).
    pub fn set_local_rotation_euler(&mut self, id: TransformId, euler: Vec3) {
        let rotation = Quat::from_euler(glam::EulerRot::XYZ, euler.x, euler.y, euler.z);
        self.set_local_rotation(id, rotation);
    }

    /// Set the local scale.
    pub fn set_local_scale(&mut self, id: TransformId, scale: Vec3) {
        self.nodes[id].scale = scale;
        self.mark_local_dirty(id);
    }

    // -------------------------------------------------------------------------
    // Derived matrices
    // -------------------------------------------------------------------------

    /// Local TRS matrix (object space to parent space).
    ///
    /// Composition order is fixed: scale, then rotate, then translate.
    #[must_use]
    pub fn local_matrix(&self, id: TransformId) -> Mat4 {
        let node = &self.nodes[id];
        if node.is_stale(DirtyFlags::LOCAL) {
            let m = Mat4::from_scale_rotation_translation(node.scale, node.rotation, node.translation);
            node.local.set(m);
            node.clear(DirtyFlags::LOCAL);
        }
        node.local.get()
    }

    /// Inverse of the local matrix.
    ///
    /// Computed analytically as `S⁻¹·R⁻¹·T⁻¹` rather than by inverting the
    /// forward matrix. Scale is included; a zero scale component yields a
    /// degenerate inverse.
    #[must_use]
    pub fn local_matrix_inverse(&self, id: TransformId) -> Mat4 {
        let node = &self.nodes[id];
        if node.is_stale(DirtyFlags::LOCAL_INV) {
            let m = Mat4::from_scale(node.scale.recip())
                * Mat4::from_quat(node.rotation.inverse())
                * Mat4::from_translation(-node.translation);
            node.local_inv.set(m);
            node.clear(DirtyFlags::LOCAL_INV);
        }
        node.local_inv.get()
    }

    /// Global matrix (object space to world space).
    ///
    /// Starts from the node's local matrix and applies each ancestor's local
    /// matrix in root-to-leaf composition order.
    #[must_use]
    pub fn global_matrix(&self, id: TransformId) -> Mat4 {
        let node = &self.nodes[id];
        if node.is_stale(DirtyFlags::GLOBAL) {
            let mut global = self.local_matrix(id);
            let mut ancestor = node.parent;
            while let Some(p) = ancestor {
                global = self.local_matrix(p) * global;
                ancestor = self.nodes[p].parent;
            }
            node.global.set(global);
            node.clear(DirtyFlags::GLOBAL);
        }
        node.global.get()
    }

    /// Inverse of the global matrix, walking the same chain over the local
    /// inverses.
    #[must_use]
    pub fn global_matrix_inverse(&self, id: TransformId) -> Mat4 {
        let node = &self.nodes[id];
        if node.is_stale(DirtyFlags::GLOBAL_INV) {
            let mut inv = self.local_matrix_inverse(id);
            let mut ancestor = node.parent;
            while let Some(p) = ancestor {
                inv = inv * self.local_matrix_inverse(p);
                ancestor = self.nodes[p].parent;
            }
            node.global_inv.set(inv);
            node.clear(DirtyFlags::GLOBAL_INV);
        }
        node.global_inv.get()
    }

    // -------------------------------------------------------------------------
    // Global state
    // -------------------------------------------------------------------------

    /// Global-space position, derived lazily from the global matrix.
    #[must_use]
    pub fn position(&self, id: TransformId) -> Vec3 {
        let node = &self.nodes[id];
        if node.parent.is_none() {
            return node.translation;
        }
        if node.is_stale(DirtyFlags::GLOBAL_POSITION) {
            let p = self.global_matrix(id).transform_point3(Vec3::ZERO);
            node.global_position.set(p);
            node.clear(DirtyFlags::GLOBAL_POSITION);
        }
        node.global_position.get()
    }

    /// Move the transform so its global position equals `position` exactly,
    /// solving the required local translation through the parent's global
    /// inverse.
    pub fn set_position(&mut self, id: TransformId, position: Vec3) {
        let local = match self.nodes[id].parent {
            None => position,
            Some(p) => self.global_matrix_inverse(p).transform_point3(position),
        };
        self.set_local_translation(id, local);
    }

    /// Global-space orientation: the node's local rotation composed with
    /// each ancestor's local rotation, ascending.
    #[must_use]
    pub fn rotation(&self, id: TransformId) -> Quat {
        let node = &self.nodes[id];
        if node.parent.is_none() {
            return node.rotation;
        }
        if node.is_stale(DirtyFlags::GLOBAL_ROTATION) {
            let mut q = node.rotation;
            let mut ancestor = node.parent;
            while let Some(p) = ancestor {
                let pnode = &self.nodes[p];
                q = pnode.rotation * q;
                ancestor = pnode.parent;
            }
            node.global_rotation.set(q);
            node.clear(DirtyFlags::GLOBAL_ROTATION);
        }
        node.global_rotation.get()
    }

    /// Rotate the transform so its global orientation equals `rotation`,
    /// given the current parent chain.
    pub fn set_rotation(&mut self, id: TransformId, rotation: Quat) {
        let local = match self.nodes[id].parent {
            None => rotation,
            Some(p) => self.rotation(p).inverse() * rotation,
        };
        self.set_local_rotation(id, local);
    }

    /// Global forward direction (negative Z in local space).
    #[must_use]
    pub fn forward(&self, id: TransformId) -> Vec3 {
        self.rotation(id) * Vec3::NEG_Z
    }

    /// Global right direction (positive X in local space).
    #[must_use]
    pub fn right(&self, id: TransformId) -> Vec3 {
        self.rotation(id) * Vec3::X
    }

    /// Global up direction (positive Y in local space).
    #[must_use]
    pub fn up(&self, id: TransformId) -> Vec3 {
        self.rotation(id) * Vec3::Y
    }

    #[cfg(test)]
    fn flags(&self, id: TransformId) -> DirtyFlags {
        self.nodes[id].dirty.get()
    }
}
