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

//! GPU resource handles and the descriptors used to create them.

use super::common::IndexFormat;
use crate::vesta_bitflags;
use std::borrow::Cow;

/// An opaque handle to a GPU buffer resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub usize);

/// An opaque handle to a GPU texture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

/// An opaque handle to a GPU sampler resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SamplerId(pub usize);

/// An opaque handle to a geometry (vertex layout plus vertex and index buffers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub usize);

/// An opaque handle to a single compiled shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderObjectId(pub usize);

/// An opaque handle to a linked shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub usize);

/// Any native handle the device owns, as tracked by the deferred-deletion queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeResource {
    /// A buffer.
    Buffer(BufferId),
    /// A texture.
    Texture(TextureId),
    /// A sampler.
    Sampler(SamplerId),
    /// A geometry.
    Geometry(GeometryId),
    /// A compiled shader stage.
    Shader(ShaderObjectId),
    /// A linked program.
    Program(ProgramId),
}

vesta_bitflags! {
    /// A set of flags describing the allowed usages of a [`BufferId`].
    pub struct BufferUsage: u32 {
        /// The buffer can be used as the source of a copy operation.
        const COPY_SRC = 1 << 0;
        /// The buffer can be used as the destination of a copy operation.
        const COPY_DST = 1 << 1;
        /// The buffer can be bound as a vertex buffer.
        const VERTEX = 1 << 2;
        /// The buffer can be bound as an index buffer.
        const INDEX = 1 << 3;
        /// The buffer can be bound as a constant (uniform) buffer.
        const CONSTANT = 1 << 4;
        /// The buffer can be bound as a read-only structured buffer.
        const STRUCTURED = 1 << 5;
    }
}

/// A descriptor used to create a [`BufferId`].
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// An optional debug label for the buffer.
    pub label: Option<Cow<'a, str>>,
    /// The total size of the buffer in bytes.
    pub size: u64,
    /// How the buffer will be used.
    pub usage: BufferUsage,
}

/// A descriptor used to create a [`TextureId`].
#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    /// An optional debug label for the texture.
    pub label: Option<Cow<'a, str>>,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Number of mip levels.
    pub mip_level_count: u32,
}

/// Texel filtering used by a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest texel.
    Nearest,
    /// Linear interpolation between texels.
    #[default]
    Linear,
}

/// Behaviour of a sampler outside the `[0, 1]` texture coordinate range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    /// Clamp to the edge texel.
    #[default]
    ClampToEdge,
    /// Repeat the texture.
    Repeat,
}

/// A descriptor used to create a [`SamplerId`].
#[derive(Debug, Clone, Default)]
pub struct SamplerDescriptor<'a> {
    /// An optional debug label for the sampler.
    pub label: Option<Cow<'a, str>>,
    /// Filtering used for magnification and minification.
    pub filter: FilterMode,
    /// Addressing used on every axis.
    pub address_mode: AddressMode,
}

/// A descriptor used to create a [`GeometryId`].
#[derive(Debug, Clone)]
pub struct GeometryDescriptor<'a> {
    /// An optional debug label for the geometry.
    pub label: Option<Cow<'a, str>>,
    /// The buffer holding the vertices.
    pub vertex_buffer: BufferId,
    /// Distance in bytes between two vertices.
    pub vertex_stride: u32,
    /// The index buffer and its format, if the geometry is indexed.
    pub index_buffer: Option<(BufferId, IndexFormat)>,
}

/// The pipeline stage a shader object runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex stage.
    Vertex,
    /// Fragment stage.
    Fragment,
}

/// A descriptor used to compile a [`ShaderObjectId`].
#[derive(Debug, Clone)]
pub struct ShaderDescriptor<'a> {
    /// An optional debug label for the shader.
    pub label: Option<Cow<'a, str>>,
    /// The stage the shader runs in.
    pub stage: ShaderStage,
    /// Backend-specific source or bytecode, as text.
    pub source: Cow<'a, str>,
}

/// A descriptor used to link a [`ProgramId`].
#[derive(Debug, Clone)]
pub struct ProgramDescriptor<'a> {
    /// An optional debug label for the program.
    pub label: Option<Cow<'a, str>>,
    /// The shader stages to link together.
    pub shaders: &'a [ShaderObjectId],
}
