//! Light component and the scene-wide light set

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::scene::component::{Capabilities, Component, ComponentId};
use crate::scene::transform::{TransformGraph, TransformId};
use crate::scene::SceneError;

/// Maximum point lights packed into one uniform block.
pub const MAX_POINT_LIGHTS: usize = 16;

/// Kind of light source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightKind {
    Ambient,
    Directional,
    Point,
}

/// Light component.
///
/// Holds color and intensity; the premultiplied product is cached and
/// refreshed by the setters, so shading code reads one vector per light.
/// Carries no lifecycle hooks; position and direction come from the owning
/// game object's transform via the scene binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Light {
    kind: LightKind,
    color: Vec3,
    intensity: f32,
    color_intensity: Vec3,
}

impl Light {
    /// White light of the given kind at intensity 1.
    #[must_use]
    pub fn new(kind: LightKind) -> Self {
        Self {
            kind,
            color: Vec3::ONE,
            intensity: 1.0,
            color_intensity: Vec3::ONE,
        }
    }

    #[must_use]
    pub fn kind(&self) -> LightKind {
        self.kind
    }

    #[must_use]
    pub fn color(&self) -> Vec3 {
        self.color
    }

    #[must_use]
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Color premultiplied by intensity.
    #[must_use]
    pub fn color_intensity(&self) -> Vec3 {
        self.color_intensity
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.color = color;
        self.color_intensity = color * self.intensity;
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity;
        self.color_intensity = self.color * intensity;
    }
}

impl Component for Light {
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }
}

/// A light component paired with the transform that positions it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightBinding {
    pub component: ComponentId,
    pub transform: TransformId,
}

/// The lights bound to a scene.
///
/// Ambient and directional are exclusive single slots; point lights
/// accumulate. The view-space directional terms are recomputed once per
/// camera render, not per draw.
#[derive(Debug, Default)]
pub struct SceneLights {
    ambient: Option<LightBinding>,
    directional: Option<LightBinding>,
    points: Vec<LightBinding>,

    /// View-space direction toward the directional light source.
    view_direction: Vec3,
    /// View-space Blinn half vector between the eye and the light.
    half_vector: Vec3,
}

impl SceneLights {
    /// Bind or clear the ambient slot.
    ///
    /// Fails with [`SceneError::DuplicateLight`] when a different ambient
    /// light is already bound, leaving the original binding in place.
    pub fn set_ambient(&mut self, binding: Option<LightBinding>) -> Result<(), SceneError> {
        match (self.ambient, binding) {
            (Some(current), Some(new)) if current.component != new.component => {
                Err(SceneError::DuplicateLight {
                    kind: LightKind::Ambient,
                })
            }
            _ => {
                self.ambient = binding;
                Ok(())
            }
        }
    }

    /// Bind or clear the directional slot, with the same exclusivity rule
    /// as the ambient slot.
    pub fn set_directional(&mut self, binding: Option<LightBinding>) -> Result<(), SceneError> {
        match (self.directional, binding) {
            (Some(current), Some(new)) if current.component != new.component => {
                Err(SceneError::DuplicateLight {
                    kind: LightKind::Directional,
                })
            }
            _ => {
                self.directional = binding;
                Ok(())
            }
        }
    }

    /// Add a point light. Re-binding the same component is a no-op.
    pub fn add_point(&mut self, binding: LightBinding) {
        if !self.points.iter().any(|b| b.component == binding.component) {
            self.points.push(binding);
        }
    }

    /// Drop any binding that refers to the given component.
    pub fn unbind(&mut self, component: ComponentId) {
        if self.ambient.is_some_and(|b| b.component == component) {
            self.ambient = None;
        }
        if self.directional.is_some_and(|b| b.component == component) {
            self.directional = None;
        }
        self.points.retain(|b| b.component != component);
    }

    #[must_use]
    pub fn ambient(&self) -> Option<LightBinding> {
        self.ambient
    }

    #[must_use]
    pub fn directional(&self) -> Option<LightBinding> {
        self.directional
    }

    #[must_use]
    pub fn points(&self) -> &[LightBinding] {
        &self.points
    }

    /// View-space direction toward the directional light, from the last
    /// [`SceneLights::recompute_directional`] call.
    #[must_use]
    pub fn view_direction(&self) -> Vec3 {
        self.view_direction
    }

    /// View-space Blinn half vector paired with [`SceneLights::view_direction`].
    #[must_use]
    pub fn half_vector(&self) -> Vec3 {
        self.half_vector
    }

    /// Refresh the view-space directional terms for a new view matrix.
    ///
    /// The world direction toward the light is the binding transform's
    /// global rotation applied to +Z (the light shines along its local -Z).
    pub fn recompute_directional(&mut self, view: &Mat4, transforms: &TransformGraph) {
        let Some(binding) = self.directional else {
            return;
        };
        if !transforms.contains(binding.transform) {
            return;
        }
        let world = transforms.rotation(binding.transform) * Vec3::Z;
        self.view_direction = view.transform_vector3(world).normalize_or_zero();
        self.half_vector = (Vec3::Z + self.view_direction).normalize_or_zero();
    }

    /// Pack the bound lights into a [`LightsUniform`].
    ///
    /// `resolve` maps a binding back to its live [`Light`] component;
    /// bindings that no longer resolve are skipped. Point lights beyond
    /// [`MAX_POINT_LIGHTS`] are dropped.
    pub fn to_uniform<'a>(
        &self,
        resolve: impl Fn(ComponentId) -> Option<&'a Light>,
        transforms: &TransformGraph,
    ) -> LightsUniform {
        let mut uniform = LightsUniform::zeroed();
        if let Some(light) = self.ambient.and_then(|b| resolve(b.component)) {
            uniform.ambient = light.color_intensity().to_array();
        }
        if let Some(light) = self.directional.and_then(|b| resolve(b.component)) {
            uniform.directional_color = light.color_intensity().to_array();
            uniform.directional_direction = self.view_direction.to_array();
            uniform.half_vector = self.half_vector.to_array();
        }
        for binding in self.points.iter().take(MAX_POINT_LIGHTS) {
            let Some(light) = resolve(binding.component) else {
                continue;
            };
            if !transforms.contains(binding.transform) {
                continue;
            }
            let slot = uniform.point_count as usize;
            uniform.points[slot] = PointLightUniform {
                position: transforms.position(binding.transform).to_array(),
                _pad0: 0.0,
                color_intensity: light.color_intensity().to_array(),
                _pad1: 0.0,
            };
            uniform.point_count += 1;
        }
        uniform
    }
}

/// One point light, std140-compatible.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointLightUniform {
    pub position: [f32; 3],
    pub _pad0: f32,
    pub color_intensity: [f32; 3],
    pub _pad1: f32,
}

/// GPU-ready block of every bound light.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightsUniform {
    pub ambient: [f32; 3],
    pub _pad0: f32,
    pub directional_color: [f32; 3],
    pub _pad1: f32,
    pub directional_direction: [f32; 3],
    pub _pad2: f32,
    pub half_vector: [f32; 3],
    pub point_count: u32,
    pub points: [PointLightUniform; MAX_POINT_LIGHTS],
}

impl Default for LightsUniform {
    fn default() -> Self {
        Self::zeroed()
    }
}
