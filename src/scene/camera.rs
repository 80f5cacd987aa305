//! Camera component: projection, view, and render-target setup

use std::cell::Cell;

use glam::{Mat4, Vec4};
use serde::{Deserialize, Serialize};

use crate::render::{ClearFlags, RenderContext};
use crate::scene::component::{Capabilities, Component, ScriptContext};
use crate::scene::transform::{TransformGraph, TransformId};
use crate::scene::SceneError;

/// Projection model for a camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    Perspective {
        /// Vertical field of view in degrees.
        fov_y_degrees: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
}

impl Default for Projection {
    fn default() -> Self {
        Self::Perspective {
            fov_y_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Projection {
    /// A symmetric orthographic volume with the default clip range.
    #[must_use]
    pub fn orthographic_default() -> Self {
        Self::Orthographic {
            left: -1.0,
            right: 1.0,
            bottom: -1.0,
            top: 1.0,
            near: 0.1,
            far: 1000.0,
        }
    }

    /// Build the projection matrix. `aspect` only affects the perspective
    /// variant.
    #[must_use]
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        match *self {
            Self::Perspective {
                fov_y_degrees,
                near,
                far,
            } => Mat4::perspective_rh(fov_y_degrees.to_radians(), aspect, near, far),
            Self::Orthographic {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => Mat4::orthographic_rh(left, right, bottom, top, near, far),
        }
    }
}

/// The matrices derived for one camera render.
#[derive(Debug, Clone, Copy)]
pub struct CameraMatrices {
    pub projection: Mat4,
    pub view: Mat4,
    /// `projection * view`, ready for a shader's clip-space transform.
    pub view_projection: Mat4,
}

/// Camera component.
///
/// Captures its game object's transform at activation; the view matrix is
/// the transform's global inverse, so moving the object moves the camera.
#[derive(Debug, Serialize, Deserialize)]
pub struct Camera {
    pub projection: Projection,
    pub clear_color: Vec4,
    clear_color_buffer: bool,
    clear_depth_buffer: bool,
    #[serde(skip)]
    cached_clear_flags: Cell<Option<ClearFlags>>,
    #[serde(skip)]
    transform: Option<TransformId>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Projection::default())
    }
}

impl Camera {
    /// Camera clearing both buffers to opaque white.
    #[must_use]
    pub fn new(projection: Projection) -> Self {
        Self {
            projection,
            clear_color: Vec4::ONE,
            clear_color_buffer: true,
            clear_depth_buffer: true,
            cached_clear_flags: Cell::new(None),
            transform: None,
        }
    }

    /// Choose which buffers [`Camera::setup_camera`] clears.
    pub fn set_clear_flags(&mut self, color: bool, depth: bool) {
        self.clear_color_buffer = color;
        self.clear_depth_buffer = depth;
        self.cached_clear_flags.set(None);
    }

    /// The transform captured at activation, if any.
    #[must_use]
    pub fn transform(&self) -> Option<TransformId> {
        self.transform
    }

    fn clear_flags(&self) -> ClearFlags {
        if let Some(flags) = self.cached_clear_flags.get() {
            return flags;
        }
        let mut flags = ClearFlags::empty();
        if self.clear_color_buffer {
            flags |= ClearFlags::COLOR;
        }
        if self.clear_depth_buffer {
            flags |= ClearFlags::DEPTH;
        }
        self.cached_clear_flags.set(Some(flags));
        flags
    }

    /// Prepare the context for this camera and derive its matrices.
    ///
    /// Applies the viewport, submits the clear color, clears the selected
    /// buffers, then builds projection and view. Fails with
    /// [`SceneError::Unattached`] before activation has bound a transform.
    pub fn setup_camera(
        &self,
        ctx: &mut RenderContext,
        transforms: &TransformGraph,
    ) -> Result<CameraMatrices, SceneError> {
        let transform = self.transform.ok_or(SceneError::Unattached)?;

        ctx.apply_viewport();
        ctx.set_clear_color(self.clear_color);
        ctx.clear(self.clear_flags());

        let projection = self.projection.matrix(ctx.aspect_ratio());
        let view = transforms.global_matrix_inverse(transform);
        Ok(CameraMatrices {
            projection,
            view,
            view_projection: projection * view,
        })
    }
}

impl Component for Camera {
    fn capabilities(&self) -> Capabilities {
        Capabilities::ACTIVATED
    }

    fn activated(&mut self, ctx: &mut ScriptContext<'_>) {
        self.transform = ctx.transform();
    }
}
