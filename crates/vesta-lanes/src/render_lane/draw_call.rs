// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Draw call records and the renderer abstraction they are built from.

use std::rc::Rc;
use std::sync::Arc;
use vesta_core::math::{Aabb, Mat4};
use vesta_core::renderer::{Geometry, Material};

/// Anything that can be drawn: a geometry, a material, a transform and bounds.
///
/// Renderers missing a geometry or a material are skipped during assembly.
pub trait Renderer {
    /// The geometry to draw, if one is assigned.
    fn geometry(&self) -> Option<&Geometry>;

    /// The material to draw with, if one is assigned.
    fn material(&self) -> Option<&Material>;

    /// Object-to-world transform.
    fn model_matrix(&self) -> Mat4;

    /// World-space bounds used for culling and sorting.
    fn aabb(&self) -> Aabb;

    /// Whether this renderer takes part in shadow passes.
    fn cast_shadows(&self) -> bool {
        true
    }

    /// Stencil reference value applied before the draw.
    fn stencil_value(&self) -> u32 {
        0
    }
}

macro_rules! forward_renderer {
    ($($ptr:ty),*) => {
        $(
            impl<T: Renderer + ?Sized> Renderer for $ptr {
                fn geometry(&self) -> Option<&Geometry> {
                    (**self).geometry()
                }
                fn material(&self) -> Option<&Material> {
                    (**self).material()
                }
                fn model_matrix(&self) -> Mat4 {
                    (**self).model_matrix()
                }
                fn aabb(&self) -> Aabb {
                    (**self).aabb()
                }
                fn cast_shadows(&self) -> bool {
                    (**self).cast_shadows()
                }
                fn stencil_value(&self) -> u32 {
                    (**self).stencil_value()
                }
            }
        )*
    };
}

forward_renderer!(&T, Box<T>, Rc<T>, Arc<T>);

/// A plain renderer backed by shared scene resources.
#[derive(Debug, Clone)]
pub struct RenderItem {
    /// Geometry to draw.
    pub geometry: Option<Arc<Geometry>>,
    /// Material to draw with.
    pub material: Option<Arc<Material>>,
    /// Object-to-world transform.
    pub model_matrix: Mat4,
    /// World-space bounds.
    pub aabb: Aabb,
    /// Shadow pass participation.
    pub cast_shadows: bool,
    /// Stencil reference value.
    pub stencil_value: u32,
}

impl RenderItem {
    /// Creates an item whose world bounds are `local_bounds` moved by `model_matrix`.
    pub fn new(
        geometry: Arc<Geometry>,
        material: Arc<Material>,
        model_matrix: Mat4,
        local_bounds: Aabb,
    ) -> Self {
        Self {
            geometry: Some(geometry),
            material: Some(material),
            model_matrix,
            aabb: local_bounds.transform(&model_matrix),
            cast_shadows: true,
            stencil_value: 0,
        }
    }

    /// Sets the stencil reference value.
    pub fn with_stencil_value(mut self, value: u32) -> Self {
        self.stencil_value = value;
        self
    }

    /// Sets shadow pass participation.
    pub fn with_cast_shadows(mut self, cast_shadows: bool) -> Self {
        self.cast_shadows = cast_shadows;
        self
    }
}

impl Renderer for RenderItem {
    fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_deref()
    }

    fn material(&self) -> Option<&Material> {
        self.material.as_deref()
    }

    fn model_matrix(&self) -> Mat4 {
        self.model_matrix
    }

    fn aabb(&self) -> Aabb {
        self.aabb
    }

    fn cast_shadows(&self) -> bool {
        self.cast_shadows
    }

    fn stencil_value(&self) -> u32 {
        self.stencil_value
    }
}

/// One scheduled draw: a geometry/material pair and the transforms to draw it with.
///
/// Draw calls borrow their geometry and material from the renderers for the
/// lifetime `'a` of one prepare/draw cycle.
#[derive(Debug, Clone)]
pub struct DrawCallInfo<'a> {
    /// Geometry to draw.
    pub geometry: &'a Geometry,
    /// Material to draw with, possibly the pass override.
    pub material: &'a Material,
    /// One transform per instance. Never empty.
    pub model_matrices: Vec<Mat4>,
    /// Bounds of every instance merged together.
    pub aabb: Aabb,
    /// Shadow pass participation.
    pub cast_shadows: bool,
    /// Set on the head of an instancing batch.
    pub instanced: bool,
    /// Stencil reference value.
    pub stencil_value: u32,
}

impl<'a> DrawCallInfo<'a> {
    /// A single, not yet batched draw.
    pub fn new(geometry: &'a Geometry, material: &'a Material, model_matrix: Mat4, aabb: Aabb) -> Self {
        Self {
            geometry,
            material,
            model_matrices: vec![model_matrix],
            aabb,
            cast_shadows: true,
            instanced: false,
            stencil_value: 0,
        }
    }

    /// Number of instances this draw covers.
    pub fn instance_count(&self) -> usize {
        self.model_matrices.len()
    }

    /// Whether the draw goes through the instanced submission path.
    pub fn is_instanced_draw(&self) -> bool {
        self.instanced && self.model_matrices.len() > 1
    }

    /// Identity of the geometry/material pair, used to find compatible draws.
    pub fn batch_key(&self) -> BatchKey {
        BatchKey {
            geometry: self.geometry as *const Geometry as usize,
            material: self.material as *const Material as usize,
        }
    }
}

/// Pointer identity of a geometry/material pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchKey {
    geometry: usize,
    material: usize,
}
