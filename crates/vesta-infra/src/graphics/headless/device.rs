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

use super::command::DeviceCommand;
use std::any::Any;
use std::collections::HashMap;
use vesta_core::renderer::{
    BindingMask, BufferDescriptor, BufferId, BufferUsage, GeometryDescriptor, GeometryId,
    GraphicsBackendType, GraphicsDevice, IndexFormat, NativeResource, PrimitiveTopology,
    ProgramDescriptor, ProgramId, ResourceError, SamplerDescriptor, SamplerId, ShaderDescriptor,
    ShaderObjectId, StencilState, TextureDescriptor, TextureId, MAX_BINDING_SLOTS,
};

const DEFAULT_CONSTANT_BUFFER_ALIGNMENT: u64 = 256;

#[derive(Debug)]
struct BufferEntry {
    label: String,
    usage: BufferUsage,
    bytes: Vec<u8>,
}

#[derive(Debug)]
struct ShaderEntry {
    bindings: BindingMask,
}

/// A [`GraphicsDevice`] that runs nowhere.
///
/// Buffers keep their bytes in memory so uploads can be inspected, every
/// bind/state/draw call lands in a command log, and destroyed handles are kept
/// in order. Program binding masks are reflected from the `binding(N)`
/// annotations of the linked shader sources.
#[derive(Debug)]
pub struct HeadlessDevice {
    next_id: usize,
    alignment: u64,
    buffers: HashMap<BufferId, BufferEntry>,
    textures: HashMap<TextureId, (u32, u32)>,
    samplers: HashMap<SamplerId, ()>,
    geometries: HashMap<GeometryId, ()>,
    shaders: HashMap<ShaderObjectId, ShaderEntry>,
    programs: HashMap<ProgramId, BindingMask>,
    in_copy_pass: bool,
    frame_number: u64,
    commands: Vec<DeviceCommand>,
    destroyed: Vec<NativeResource>,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDevice {
    /// Creates a device with a 256-byte constant buffer alignment.
    pub fn new() -> Self {
        Self::with_alignment(DEFAULT_CONSTANT_BUFFER_ALIGNMENT)
    }

    /// Creates a device reporting `alignment` as its constant buffer offset alignment.
    pub fn with_alignment(alignment: u64) -> Self {
        Self {
            next_id: 1,
            alignment: alignment.max(1),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            samplers: HashMap::new(),
            geometries: HashMap::new(),
            shaders: HashMap::new(),
            programs: HashMap::new(),
            in_copy_pass: false,
            frame_number: 0,
            commands: Vec::new(),
            destroyed: Vec::new(),
        }
    }

    fn allocate_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Every command recorded since creation or the last [`take_commands`](Self::take_commands).
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Drains the command log.
    pub fn take_commands(&mut self) -> Vec<DeviceCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Handles destroyed so far, in destruction order.
    pub fn destroyed(&self) -> &[NativeResource] {
        &self.destroyed
    }

    /// Whether `resource` is still alive on the device.
    pub fn is_alive(&self, resource: NativeResource) -> bool {
        match resource {
            NativeResource::Buffer(id) => self.buffers.contains_key(&id),
            NativeResource::Texture(id) => self.textures.contains_key(&id),
            NativeResource::Sampler(id) => self.samplers.contains_key(&id),
            NativeResource::Geometry(id) => self.geometries.contains_key(&id),
            NativeResource::Shader(id) => self.shaders.contains_key(&id),
            NativeResource::Program(id) => self.programs.contains_key(&id),
        }
    }

    /// Contents of a live buffer.
    pub fn buffer_data(&self, id: BufferId) -> Option<&[u8]> {
        self.buffers.get(&id).map(|entry| entry.bytes.as_slice())
    }

    /// Number of buffers alive.
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Last frame number announced by the backend.
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    fn record(&mut self, command: DeviceCommand) {
        log::trace!("headless: {command:?}");
        self.commands.push(command);
    }

    fn retire(&mut self, resource: NativeResource, existed: bool) -> Result<(), ResourceError> {
        if !existed {
            return Err(ResourceError::NotFound);
        }
        log::trace!("headless: destroyed {resource:?}");
        self.destroyed.push(resource);
        Ok(())
    }
}

/// Collects the slots named by `binding(N)` annotations in a shader source.
fn reflect_bindings(source: &str) -> BindingMask {
    let mut mask = BindingMask::EMPTY;
    for (position, _) in source.match_indices("binding(") {
        let rest = &source[position + "binding(".len()..];
        let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
        match digits.parse::<u32>() {
            Ok(slot) if slot < MAX_BINDING_SLOTS => mask = mask.with(slot),
            Ok(slot) => log::warn!("headless: ignoring binding({slot}) beyond the tracked slots"),
            Err(_) => {}
        }
    }
    mask
}

impl GraphicsDevice for HeadlessDevice {
    fn backend_type(&self) -> GraphicsBackendType {
        GraphicsBackendType::Headless
    }

    fn constant_buffer_offset_alignment(&self) -> u64 {
        self.alignment
    }

    fn create_buffer(&mut self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let id = BufferId(self.allocate_id());
        let label = descriptor.label.as_deref().unwrap_or("unnamed").to_string();
        log::trace!("headless: create buffer {id:?} '{label}' ({} bytes)", descriptor.size);
        self.buffers.insert(
            id,
            BufferEntry {
                label,
                usage: descriptor.usage,
                bytes: vec![0; descriptor.size as usize],
            },
        );
        Ok(id)
    }

    fn write_buffer(&mut self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let entry = self.buffers.get_mut(&id).ok_or(ResourceError::NotFound)?;
        let start = offset as usize;
        let end = start + data.len();
        if end > entry.bytes.len() {
            return Err(ResourceError::OutOfBounds);
        }
        entry.bytes[start..end].copy_from_slice(data);
        Ok(())
    }

    fn begin_copy_pass(&mut self) {
        if self.in_copy_pass {
            log::warn!("headless: begin_copy_pass while a copy pass is open");
        }
        self.in_copy_pass = true;
    }

    fn copy_buffer_to_buffer(
        &mut self,
        source: BufferId,
        source_offset: u64,
        destination: BufferId,
        destination_offset: u64,
        size: u64,
    ) -> Result<(), ResourceError> {
        if !self.in_copy_pass {
            return Err(ResourceError::BackendError(
                "buffer copy recorded outside of a copy pass".to_string(),
            ));
        }
        let src = self.buffers.get(&source).ok_or(ResourceError::NotFound)?;
        if !src.usage.contains(BufferUsage::COPY_SRC) {
            return Err(ResourceError::BackendError(format!(
                "buffer '{}' was not created with COPY_SRC",
                src.label
            )));
        }
        let start = source_offset as usize;
        let end = start + size as usize;
        let chunk = src
            .bytes
            .get(start..end)
            .ok_or(ResourceError::OutOfBounds)?
            .to_vec();
        self.write_buffer(destination, destination_offset, &chunk)?;
        self.record(DeviceCommand::CopyBuffer {
            source,
            destination,
            size,
        });
        Ok(())
    }

    fn end_copy_pass(&mut self) {
        self.in_copy_pass = false;
    }

    fn create_texture(&mut self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        if descriptor.width == 0 || descriptor.height == 0 {
            return Err(ResourceError::BackendError(
                "texture dimensions must be non-zero".to_string(),
            ));
        }
        let id = TextureId(self.allocate_id());
        self.textures.insert(id, (descriptor.width, descriptor.height));
        Ok(id)
    }

    fn create_sampler(&mut self, _descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        let id = SamplerId(self.allocate_id());
        self.samplers.insert(id, ());
        Ok(id)
    }

    fn create_geometry(&mut self, descriptor: &GeometryDescriptor) -> Result<GeometryId, ResourceError> {
        if !self.buffers.contains_key(&descriptor.vertex_buffer) {
            return Err(ResourceError::InvalidHandle);
        }
        if let Some((index_buffer, _)) = descriptor.index_buffer {
            if !self.buffers.contains_key(&index_buffer) {
                return Err(ResourceError::InvalidHandle);
            }
        }
        let id = GeometryId(self.allocate_id());
        self.geometries.insert(id, ());
        Ok(id)
    }

    fn compile_shader(&mut self, descriptor: &ShaderDescriptor) -> Result<ShaderObjectId, ResourceError> {
        let id = ShaderObjectId(self.allocate_id());
        let bindings = reflect_bindings(&descriptor.source);
        self.shaders.insert(id, ShaderEntry { bindings });
        Ok(id)
    }

    fn create_program(
        &mut self,
        descriptor: &ProgramDescriptor,
    ) -> Result<(ProgramId, BindingMask), ResourceError> {
        let mut bindings = BindingMask::EMPTY;
        for shader in descriptor.shaders {
            let entry = self.shaders.get(shader).ok_or(ResourceError::InvalidHandle)?;
            bindings = BindingMask::from_bits(bindings.bits() | entry.bindings.bits());
        }
        let id = ProgramId(self.allocate_id());
        self.programs.insert(id, bindings);
        Ok((id, bindings))
    }

    fn destroy_buffer(&mut self, id: BufferId) -> Result<(), ResourceError> {
        let existed = self.buffers.remove(&id).is_some();
        self.retire(NativeResource::Buffer(id), existed)
    }

    fn destroy_texture(&mut self, id: TextureId) -> Result<(), ResourceError> {
        let existed = self.textures.remove(&id).is_some();
        self.retire(NativeResource::Texture(id), existed)
    }

    fn destroy_sampler(&mut self, id: SamplerId) -> Result<(), ResourceError> {
        let existed = self.samplers.remove(&id).is_some();
        self.retire(NativeResource::Sampler(id), existed)
    }

    fn destroy_geometry(&mut self, id: GeometryId) -> Result<(), ResourceError> {
        let existed = self.geometries.remove(&id).is_some();
        self.retire(NativeResource::Geometry(id), existed)
    }

    fn destroy_shader(&mut self, id: ShaderObjectId) -> Result<(), ResourceError> {
        let existed = self.shaders.remove(&id).is_some();
        self.retire(NativeResource::Shader(id), existed)
    }

    fn destroy_program(&mut self, id: ProgramId) -> Result<(), ResourceError> {
        let existed = self.programs.remove(&id).is_some();
        self.retire(NativeResource::Program(id), existed)
    }

    fn bind_constant_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64, size: u64) {
        if offset % self.alignment != 0 {
            log::warn!("headless: constant buffer offset {offset} is not {}-aligned", self.alignment);
        }
        self.record(DeviceCommand::BindConstantBuffer {
            slot,
            buffer,
            offset,
            size,
        });
    }

    fn bind_structured_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64, size: u64) {
        self.record(DeviceCommand::BindStructuredBuffer {
            slot,
            buffer,
            offset,
            size,
        });
    }

    fn bind_texture_sampler(&mut self, slot: u32, texture: TextureId, sampler: SamplerId) {
        self.record(DeviceCommand::BindTextureSampler {
            slot,
            texture,
            sampler,
        });
    }

    fn set_stencil_state(&mut self, state: &StencilState) {
        self.record(DeviceCommand::SetStencilState(*state));
    }

    fn set_stencil_value(&mut self, value: u32) {
        self.record(DeviceCommand::SetStencilValue(value));
    }

    fn use_program(&mut self, program: ProgramId) {
        self.record(DeviceCommand::UseProgram(program));
    }

    fn bind_geometry(&mut self, geometry: GeometryId) {
        self.record(DeviceCommand::BindGeometry(geometry));
    }

    fn draw_elements(&mut self, topology: PrimitiveTopology, format: IndexFormat, index_count: u32) {
        self.draw_elements_instanced(topology, format, index_count, 1);
    }

    fn draw_elements_instanced(
        &mut self,
        topology: PrimitiveTopology,
        format: IndexFormat,
        index_count: u32,
        instance_count: u32,
    ) {
        self.record(DeviceCommand::Draw {
            topology,
            index_format: Some(format),
            count: index_count,
            instance_count,
        });
    }

    fn draw_arrays(&mut self, topology: PrimitiveTopology, first_vertex: u32, vertex_count: u32) {
        self.draw_arrays_instanced(topology, first_vertex, vertex_count, 1);
    }

    fn draw_arrays_instanced(
        &mut self,
        topology: PrimitiveTopology,
        _first_vertex: u32,
        vertex_count: u32,
        instance_count: u32,
    ) {
        self.record(DeviceCommand::Draw {
            topology,
            index_format: None,
            count: vertex_count,
            instance_count,
        });
    }

    fn on_new_frame(&mut self, frame_number: u64) {
        self.frame_number = frame_number;
        self.record(DeviceCommand::NewFrame(frame_number));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
