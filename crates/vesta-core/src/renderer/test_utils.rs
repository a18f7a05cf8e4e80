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

//! An in-memory device used by the unit tests of this crate.

use super::api::*;
use super::error::ResourceError;
use super::traits::GraphicsDevice;
use std::any::Any;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MockCall {
    CopyBuffer(BufferId, BufferId, u64),
    UseProgram(ProgramId),
    BindConstantBuffer(u32, BufferId, u64, u64),
    BindStructuredBuffer(u32, BufferId, u64, u64),
    BindTextureSampler(u32, TextureId, SamplerId),
    BindGeometry(GeometryId),
    SetStencilState(StencilState),
    SetStencilValue(u32),
    DrawElements(u32),
    DrawElementsInstanced(u32, u32),
    DrawArrays(u32),
    DrawArraysInstanced(u32, u32),
}

/// Hands out sequential ids, stores buffer bytes and logs every command.
#[derive(Debug, Default)]
pub(crate) struct MockDevice {
    next_id: usize,
    pub alignment: u64,
    pub buffers: HashMap<BufferId, Vec<u8>>,
    pub calls: Vec<MockCall>,
    pub destroyed: Vec<NativeResource>,
    pub fail_destroy: bool,
}

impl MockDevice {
    pub const PROGRAM_BINDINGS: BindingMask = BindingMask::from_bits(0b110);

    pub fn new() -> Self {
        Self {
            next_id: 1,
            alignment: 256,
            ..Default::default()
        }
    }

    fn next(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn destroy(&mut self, resource: NativeResource) -> Result<(), ResourceError> {
        if self.fail_destroy {
            return Err(ResourceError::BackendError("destroy refused".to_string()));
        }
        self.destroyed.push(resource);
        Ok(())
    }
}

impl GraphicsDevice for MockDevice {
    fn backend_type(&self) -> GraphicsBackendType {
        GraphicsBackendType::Headless
    }

    fn constant_buffer_offset_alignment(&self) -> u64 {
        self.alignment
    }

    fn create_buffer(&mut self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let id = BufferId(self.next());
        self.buffers.insert(id, vec![0; descriptor.size as usize]);
        Ok(id)
    }

    fn write_buffer(&mut self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let bytes = self.buffers.get_mut(&id).ok_or(ResourceError::NotFound)?;
        let start = offset as usize;
        let end = start + data.len();
        if end > bytes.len() {
            return Err(ResourceError::OutOfBounds);
        }
        bytes[start..end].copy_from_slice(data);
        Ok(())
    }

    fn begin_copy_pass(&mut self) {}

    fn copy_buffer_to_buffer(
        &mut self,
        source: BufferId,
        source_offset: u64,
        destination: BufferId,
        destination_offset: u64,
        size: u64,
    ) -> Result<(), ResourceError> {
        let src = self.buffers.get(&source).ok_or(ResourceError::NotFound)?;
        let chunk = src[source_offset as usize..(source_offset + size) as usize].to_vec();
        self.write_buffer(destination, destination_offset, &chunk)?;
        self.calls
            .push(MockCall::CopyBuffer(source, destination, size));
        Ok(())
    }

    fn end_copy_pass(&mut self) {}

    fn create_texture(&mut self, _d: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        Ok(TextureId(self.next()))
    }

    fn create_sampler(&mut self, _d: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        Ok(SamplerId(self.next()))
    }

    fn create_geometry(&mut self, _d: &GeometryDescriptor) -> Result<GeometryId, ResourceError> {
        Ok(GeometryId(self.next()))
    }

    fn compile_shader(&mut self, _d: &ShaderDescriptor) -> Result<ShaderObjectId, ResourceError> {
        Ok(ShaderObjectId(self.next()))
    }

    fn create_program(
        &mut self,
        _d: &ProgramDescriptor,
    ) -> Result<(ProgramId, BindingMask), ResourceError> {
        Ok((ProgramId(self.next()), Self::PROGRAM_BINDINGS))
    }

    fn destroy_buffer(&mut self, id: BufferId) -> Result<(), ResourceError> {
        self.destroy(NativeResource::Buffer(id))?;
        self.buffers.remove(&id);
        Ok(())
    }

    fn destroy_texture(&mut self, id: TextureId) -> Result<(), ResourceError> {
        self.destroy(NativeResource::Texture(id))
    }

    fn destroy_sampler(&mut self, id: SamplerId) -> Result<(), ResourceError> {
        self.destroy(NativeResource::Sampler(id))
    }

    fn destroy_geometry(&mut self, id: GeometryId) -> Result<(), ResourceError> {
        self.destroy(NativeResource::Geometry(id))
    }

    fn destroy_shader(&mut self, id: ShaderObjectId) -> Result<(), ResourceError> {
        self.destroy(NativeResource::Shader(id))
    }

    fn destroy_program(&mut self, id: ProgramId) -> Result<(), ResourceError> {
        self.destroy(NativeResource::Program(id))
    }

    fn bind_constant_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64, size: u64) {
        self.calls
            .push(MockCall::BindConstantBuffer(slot, buffer, offset, size));
    }

    fn bind_structured_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64, size: u64) {
        self.calls
            .push(MockCall::BindStructuredBuffer(slot, buffer, offset, size));
    }

    fn bind_texture_sampler(&mut self, slot: u32, texture: TextureId, sampler: SamplerId) {
        self.calls
            .push(MockCall::BindTextureSampler(slot, texture, sampler));
    }

    fn set_stencil_state(&mut self, state: &StencilState) {
        self.calls.push(MockCall::SetStencilState(*state));
    }

    fn set_stencil_value(&mut self, value: u32) {
        self.calls.push(MockCall::SetStencilValue(value));
    }

    fn use_program(&mut self, program: ProgramId) {
        self.calls.push(MockCall::UseProgram(program));
    }

    fn bind_geometry(&mut self, geometry: GeometryId) {
        self.calls.push(MockCall::BindGeometry(geometry));
    }

    fn draw_elements(&mut self, _t: PrimitiveTopology, _f: IndexFormat, index_count: u32) {
        self.calls.push(MockCall::DrawElements(index_count));
    }

    fn draw_elements_instanced(
        &mut self,
        _t: PrimitiveTopology,
        _f: IndexFormat,
        index_count: u32,
        instance_count: u32,
    ) {
        self.calls
            .push(MockCall::DrawElementsInstanced(index_count, instance_count));
    }

    fn draw_arrays(&mut self, _t: PrimitiveTopology, _first: u32, vertex_count: u32) {
        self.calls.push(MockCall::DrawArrays(vertex_count));
    }

    fn draw_arrays_instanced(
        &mut self,
        _t: PrimitiveTopology,
        _first: u32,
        vertex_count: u32,
        instance_count: u32,
    ) {
        self.calls
            .push(MockCall::DrawArraysInstanced(vertex_count, instance_count));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
