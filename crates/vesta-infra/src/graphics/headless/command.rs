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

use vesta_core::renderer::{
    BufferId, GeometryId, IndexFormat, PrimitiveTopology, ProgramId, SamplerId, StencilState,
    TextureId,
};

/// One command recorded by the [`HeadlessDevice`](super::HeadlessDevice).
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    /// A frame boundary.
    NewFrame(u64),
    /// A buffer-to-buffer copy inside a copy pass.
    CopyBuffer {
        /// Source buffer.
        source: BufferId,
        /// Destination buffer.
        destination: BufferId,
        /// Bytes copied.
        size: u64,
    },
    /// `use_program`.
    UseProgram(ProgramId),
    /// `bind_constant_buffer`.
    BindConstantBuffer {
        /// Binding slot.
        slot: u32,
        /// Bound buffer.
        buffer: BufferId,
        /// Byte offset of the bound range.
        offset: u64,
        /// Byte size of the bound range.
        size: u64,
    },
    /// `bind_structured_buffer`.
    BindStructuredBuffer {
        /// Binding slot.
        slot: u32,
        /// Bound buffer.
        buffer: BufferId,
        /// Byte offset of the bound range.
        offset: u64,
        /// Byte size of the bound range.
        size: u64,
    },
    /// `bind_texture_sampler`.
    BindTextureSampler {
        /// Binding slot.
        slot: u32,
        /// Bound texture.
        texture: TextureId,
        /// Bound sampler.
        sampler: SamplerId,
    },
    /// `bind_geometry`.
    BindGeometry(GeometryId),
    /// `set_stencil_state`.
    SetStencilState(StencilState),
    /// `set_stencil_value`.
    SetStencilValue(u32),
    /// An indexed or non-indexed draw.
    Draw {
        /// Primitive assembly mode.
        topology: PrimitiveTopology,
        /// Index format for indexed draws.
        index_format: Option<IndexFormat>,
        /// Indices or vertices drawn per instance.
        count: u32,
        /// Instances drawn. 1 for plain draws.
        instance_count: u32,
    },
}

impl DeviceCommand {
    /// Whether this command is a draw.
    pub fn is_draw(&self) -> bool {
        matches!(self, Self::Draw { .. })
    }
}
