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

//! The geometry, shader and material types that draw calls reference.
//!
//! These are owned by the application (typically behind an `Arc`) and only
//! borrowed by the render queue for the duration of one prepare/draw cycle.

use super::binding::BindingMask;
use super::common::{IndexFormat, PrimitiveTopology};
use super::pipeline::StencilState;
use super::resource::{GeometryId, ProgramId, SamplerId, TextureId};
use std::collections::HashMap;
use std::sync::Arc;

/// Render queue of opaque geometry.
pub const OPAQUE_RENDER_QUEUE: u32 = 2000;

/// First render queue treated as transparent.
pub const TRANSPARENT_RENDER_QUEUE: u32 = 3000;

/// A drawable geometry: a device geometry handle and how to draw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    /// Debug label.
    pub label: String,
    /// The device handle.
    pub id: GeometryId,
    /// Primitive assembly mode.
    pub topology: PrimitiveTopology,
    /// Number of indices, or number of vertices when not indexed.
    pub element_count: u32,
    /// Index format, `None` for non-indexed geometry.
    pub index_format: Option<IndexFormat>,
}

impl Geometry {
    /// Returns `true` if the geometry is drawn with an index buffer.
    pub fn is_indexed(&self) -> bool {
        self.index_format.is_some()
    }
}

/// A linked program together with the binding slots it declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Program {
    /// The device handle.
    pub id: ProgramId,
    /// Slots reflected from the program at link time.
    pub bindings: BindingMask,
}

/// A named texture slot declared by a shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureBinding {
    /// The name materials use to provide the texture.
    pub name: String,
    /// The binding slot.
    pub slot: u32,
}

/// A shader as seen by the render queue.
#[derive(Debug, Clone, PartialEq)]
pub struct Shader {
    /// Debug label.
    pub label: String,
    /// The linked program.
    pub program: Program,
    /// Whether the vertex stage reads per-instance data, allowing draws to be merged.
    pub supports_instancing: bool,
    /// Textures the shader samples.
    pub texture_bindings: Vec<TextureBinding>,
}

/// A texture and the sampler to read it with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialTexture {
    /// The texture.
    pub texture: TextureId,
    /// The sampler.
    pub sampler: SamplerId,
}

/// A shader plus the resources and state it is drawn with.
#[derive(Debug, Clone)]
pub struct Material {
    /// Debug label.
    pub label: String,
    /// The shader.
    pub shader: Arc<Shader>,
    /// Textures by binding name.
    pub textures: HashMap<String, MaterialTexture>,
    /// Ordering bucket; lower queues draw first when sorting.
    pub render_queue: u32,
    /// Stencil configuration.
    pub stencil: StencilState,
}

impl Material {
    /// Creates an opaque material with no textures and stencil disabled.
    pub fn new(label: impl Into<String>, shader: Arc<Shader>) -> Self {
        Self {
            label: label.into(),
            shader,
            textures: HashMap::new(),
            render_queue: OPAQUE_RENDER_QUEUE,
            stencil: StencilState::DISABLED,
        }
    }

    /// Sets the texture provided for `name`.
    pub fn with_texture(
        mut self,
        name: impl Into<String>,
        texture: TextureId,
        sampler: SamplerId,
    ) -> Self {
        self.textures
            .insert(name.into(), MaterialTexture { texture, sampler });
        self
    }

    /// Sets the render queue.
    pub fn with_render_queue(mut self, render_queue: u32) -> Self {
        self.render_queue = render_queue;
        self
    }

    /// Sets the stencil state.
    pub fn with_stencil(mut self, stencil: StencilState) -> Self {
        self.stencil = stencil;
        self
    }

    /// Returns `true` if the material draws in a transparent render queue.
    pub fn is_transparent(&self) -> bool {
        self.render_queue >= TRANSPARENT_RENDER_QUEUE
    }

    /// Returns the texture provided for `name`, if any.
    pub fn texture(&self, name: &str) -> Option<&MaterialTexture> {
        self.textures.get(name)
    }
}
