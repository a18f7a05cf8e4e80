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

use crate::renderer::api::*;
use crate::renderer::error::ResourceError;
use std::any::Any;
use std::fmt::Debug;

/// The single abstract device interface concrete backends implement.
///
/// The contract is immediate-mode: binds, state changes and draws are recorded
/// into the frame currently being built, in call order. Implementations are
/// driven from one CPU thread and need no internal locking.
///
/// `destroy_*` methods release a handle immediately. Callers go through
/// [`GraphicsBackend`](crate::renderer::GraphicsBackend), which delays them
/// until no frame in flight can reference the handle.
pub trait GraphicsDevice: Debug + 'static {
    /// Returns which graphics API this device targets.
    fn backend_type(&self) -> GraphicsBackendType;

    /// Returns the minimum alignment, in bytes, of constant-buffer bind offsets.
    fn constant_buffer_offset_alignment(&self) -> u64;

    /// Creates a new GPU buffer.
    /// ## Errors
    /// * `ResourceError` - If the buffer creation fails.
    fn create_buffer(&mut self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError>;

    /// Writes data to a GPU buffer.
    /// ## Arguments
    /// * `id` - The ID of the buffer to write to.
    /// * `offset` - The offset in the buffer where the data will be written.
    /// * `data` - A slice of bytes containing the data to be written.
    /// ## Errors
    /// * `ResourceError::OutOfBounds` - If the write does not fit in the buffer.
    fn write_buffer(&mut self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError>;

    /// Opens a copy pass. Buffer-to-buffer copies must be recorded inside one.
    fn begin_copy_pass(&mut self);

    /// Records a GPU-side copy between two buffers.
    /// ## Errors
    /// * `ResourceError` - If a handle is unknown or a range is out of bounds.
    fn copy_buffer_to_buffer(
        &mut self,
        source: BufferId,
        source_offset: u64,
        destination: BufferId,
        destination_offset: u64,
        size: u64,
    ) -> Result<(), ResourceError>;

    /// Closes the current copy pass.
    fn end_copy_pass(&mut self);

    /// Creates a new GPU texture.
    fn create_texture(&mut self, descriptor: &TextureDescriptor)
        -> Result<TextureId, ResourceError>;

    /// Creates a new sampler.
    fn create_sampler(&mut self, descriptor: &SamplerDescriptor)
        -> Result<SamplerId, ResourceError>;

    /// Creates a geometry from existing vertex and index buffers.
    fn create_geometry(
        &mut self,
        descriptor: &GeometryDescriptor,
    ) -> Result<GeometryId, ResourceError>;

    /// Compiles a single shader stage.
    fn compile_shader(
        &mut self,
        descriptor: &ShaderDescriptor,
    ) -> Result<ShaderObjectId, ResourceError>;

    /// Links shader stages into a program and reflects the binding slots it declares.
    fn create_program(
        &mut self,
        descriptor: &ProgramDescriptor,
    ) -> Result<(ProgramId, BindingMask), ResourceError>;

    /// Destroys a buffer immediately.
    fn destroy_buffer(&mut self, id: BufferId) -> Result<(), ResourceError>;
    /// Destroys a texture immediately.
    fn destroy_texture(&mut self, id: TextureId) -> Result<(), ResourceError>;
    /// Destroys a sampler immediately.
    fn destroy_sampler(&mut self, id: SamplerId) -> Result<(), ResourceError>;
    /// Destroys a geometry immediately.
    fn destroy_geometry(&mut self, id: GeometryId) -> Result<(), ResourceError>;
    /// Destroys a shader stage immediately.
    fn destroy_shader(&mut self, id: ShaderObjectId) -> Result<(), ResourceError>;
    /// Destroys a program immediately.
    fn destroy_program(&mut self, id: ProgramId) -> Result<(), ResourceError>;

    /// Binds `size` bytes of `buffer` at `offset` as a constant buffer in `slot`.
    fn bind_constant_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64, size: u64);

    /// Binds `size` bytes of `buffer` at `offset` as a structured buffer in `slot`.
    fn bind_structured_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64, size: u64);

    /// Binds a texture and its sampler in `slot`.
    fn bind_texture_sampler(&mut self, slot: u32, texture: TextureId, sampler: SamplerId);

    /// Applies the stencil test configuration.
    fn set_stencil_state(&mut self, state: &StencilState);

    /// Sets the stencil reference value.
    fn set_stencil_value(&mut self, value: u32);

    /// Makes `program` current for subsequent draws.
    fn use_program(&mut self, program: ProgramId);

    /// Makes `geometry` the source of vertices and indices for subsequent draws.
    fn bind_geometry(&mut self, geometry: GeometryId);

    /// Draws `index_count` indices of the bound geometry.
    fn draw_elements(
        &mut self,
        topology: PrimitiveTopology,
        index_format: IndexFormat,
        index_count: u32,
    );

    /// Draws `instance_count` instances of `index_count` indices of the bound geometry.
    fn draw_elements_instanced(
        &mut self,
        topology: PrimitiveTopology,
        index_format: IndexFormat,
        index_count: u32,
        instance_count: u32,
    );

    /// Draws `vertex_count` vertices of the bound geometry.
    fn draw_arrays(&mut self, topology: PrimitiveTopology, first_vertex: u32, vertex_count: u32);

    /// Draws `instance_count` instances of `vertex_count` vertices of the bound geometry.
    fn draw_arrays_instanced(
        &mut self,
        topology: PrimitiveTopology,
        first_vertex: u32,
        vertex_count: u32,
        instance_count: u32,
    );

    /// Called once per frame, after the backend retired expired resources.
    fn on_new_frame(&mut self, _frame_number: u64) {}

    /// Returns the device as `Any`, for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Returns the device as mutable `Any`, for downcasting to the concrete type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
