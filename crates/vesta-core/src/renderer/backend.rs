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

//! The graphics backend front-end: one device plus the resource lifecycle around it.
//!
//! Deleting a handle while earlier frames may still be executing on the GPU is
//! only safe if the destruction waits until those frames have retired. The
//! backend therefore never destroys on `delete_*`: it queues the handle with a
//! countdown of [`DELETE_RESOURCE_DELAY`] ticks and destroys it in the
//! [`init_new_frame`](GraphicsBackend::init_new_frame) call where the countdown
//! reaches zero.
//!
//! ```text
//! frame N     delete_texture(t)    t pending (2), evicted from the binding cache
//! frame N+1   init_new_frame()     t pending (1)
//! frame N+2   init_new_frame()     t destroyed
//! ```
//!
//! The backend is driven from a single thread and holds no locks.

use super::api::*;
use super::error::ResourceError;
use super::lifecycle::{BindingCache, DeletionQueue, PendingDeletion};
use super::traits::GraphicsDevice;

/// The front-end every render lane talks to.
#[derive(Debug)]
pub struct GraphicsBackend {
    device: Box<dyn GraphicsDevice>,
    deletions: DeletionQueue,
    bindings: BindingCache,
    frame_number: u64,
    draw_call_count: u32,
}

impl GraphicsBackend {
    /// Wraps a device selected at startup.
    pub fn new(device: Box<dyn GraphicsDevice>) -> Self {
        log::info!(
            "Graphics backend created: {:?} (constant buffer alignment {} bytes)",
            device.backend_type(),
            device.constant_buffer_offset_alignment()
        );
        Self {
            device,
            deletions: DeletionQueue::new(),
            bindings: BindingCache::new(),
            frame_number: 0,
            draw_call_count: 0,
        }
    }

    /// Returns which graphics API the device targets.
    pub fn backend_type(&self) -> GraphicsBackendType {
        self.device.backend_type()
    }

    /// Returns the minimum alignment of constant-buffer bind offsets.
    pub fn constant_buffer_offset_alignment(&self) -> u64 {
        self.device.constant_buffer_offset_alignment()
    }

    /// Returns the underlying device.
    pub fn device(&self) -> &dyn GraphicsDevice {
        self.device.as_ref()
    }

    /// Returns the underlying device downcast to its concrete type.
    pub fn device_as<T: GraphicsDevice>(&self) -> Option<&T> {
        self.device.as_any().downcast_ref::<T>()
    }

    /// Returns the underlying device downcast to its concrete type, mutably.
    pub fn device_as_mut<T: GraphicsDevice>(&mut self) -> Option<&mut T> {
        self.device.as_any_mut().downcast_mut::<T>()
    }

    // --- Frame pacing ---

    /// Starts a new frame.
    ///
    /// Must be called exactly once per frame, before any command of that frame
    /// is recorded. Every pending deletion is decremented once; the ones reaching
    /// zero are destroyed. Destruction failures are logged and dropped.
    pub fn init_new_frame(&mut self) {
        self.frame_number += 1;
        for resource in self.deletions.tick() {
            log::debug!(
                "Frame {}: destroying {:?} after deferred delay",
                self.frame_number,
                resource
            );
            if let Err(e) = self.destroy_now(resource) {
                log::warn!("Failed to destroy {resource:?}: {e}");
            }
        }
        self.draw_call_count = 0;
        self.device.on_new_frame(self.frame_number);
    }

    /// Number of `init_new_frame` calls so far.
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Number of draw calls issued since the last `init_new_frame`.
    pub fn draw_call_count(&self) -> u32 {
        self.draw_call_count
    }

    // --- Creation ---

    /// Creates a GPU buffer.
    pub fn create_buffer(&mut self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        self.device.create_buffer(descriptor)
    }

    /// Writes bytes into a GPU buffer.
    pub fn write_buffer(&mut self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        self.device.write_buffer(id, offset, data)
    }

    /// Copies `size` bytes from the start of `source` to the start of `destination`
    /// inside a dedicated copy pass.
    pub fn copy_buffer(
        &mut self,
        source: BufferId,
        destination: BufferId,
        size: u64,
    ) -> Result<(), ResourceError> {
        self.device.begin_copy_pass();
        let result = self
            .device
            .copy_buffer_to_buffer(source, 0, destination, 0, size);
        self.device.end_copy_pass();
        result
    }

    /// Creates a texture.
    pub fn create_texture(&mut self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        self.device.create_texture(descriptor)
    }

    /// Creates a sampler.
    pub fn create_sampler(&mut self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        self.device.create_sampler(descriptor)
    }

    /// Creates a geometry.
    pub fn create_geometry(
        &mut self,
        descriptor: &GeometryDescriptor,
    ) -> Result<GeometryId, ResourceError> {
        self.device.create_geometry(descriptor)
    }

    /// Compiles a shader stage.
    pub fn compile_shader(
        &mut self,
        descriptor: &ShaderDescriptor,
    ) -> Result<ShaderObjectId, ResourceError> {
        self.device.compile_shader(descriptor)
    }

    /// Links a program and captures its reflected binding mask.
    pub fn create_program(&mut self, descriptor: &ProgramDescriptor) -> Result<Program, ResourceError> {
        let (id, bindings) = self.device.create_program(descriptor)?;
        log::debug!(
            "Program {:?} linked with binding mask {:#x}",
            descriptor.label,
            bindings.bits()
        );
        Ok(Program { id, bindings })
    }

    // --- Deferred deletion ---

    /// Schedules a buffer for destruction.
    pub fn delete_buffer(&mut self, id: BufferId) {
        self.delete(NativeResource::Buffer(id));
    }

    /// Schedules a texture for destruction.
    pub fn delete_texture(&mut self, id: TextureId) {
        self.delete(NativeResource::Texture(id));
    }

    /// Schedules a sampler for destruction.
    pub fn delete_sampler(&mut self, id: SamplerId) {
        self.delete(NativeResource::Sampler(id));
    }

    /// Schedules a geometry for destruction.
    pub fn delete_geometry(&mut self, id: GeometryId) {
        self.delete(NativeResource::Geometry(id));
    }

    /// Schedules a shader stage for destruction.
    pub fn delete_shader(&mut self, id: ShaderObjectId) {
        self.delete(NativeResource::Shader(id));
    }

    /// Schedules a program for destruction.
    pub fn delete_program(&mut self, program: &Program) {
        self.delete(NativeResource::Program(program.id));
    }

    /// Schedules any native handle for destruction and drops it from the binding cache.
    ///
    /// Commands already recorded keep referencing the handle; later
    /// [`bind_resources`](Self::bind_resources) calls will not re-bind it.
    pub fn delete(&mut self, resource: NativeResource) {
        if !self.deletions.schedule(resource) {
            log::warn!("{resource:?} is already pending deletion");
            return;
        }
        let evicted = self.bindings.evict(resource);
        log::debug!(
            "Frame {}: {:?} scheduled for deletion in {} frames ({} cached bindings evicted)",
            self.frame_number,
            resource,
            DELETE_RESOURCE_DELAY,
            evicted
        );
    }

    /// Number of handles waiting to be destroyed.
    pub fn pending_deletions(&self) -> usize {
        self.deletions.len()
    }

    /// Returns the pending records.
    pub fn pending_deletion_records(&self) -> impl Iterator<Item = &PendingDeletion> {
        self.deletions.iter()
    }

    /// Returns `true` if `resource` is waiting to be destroyed.
    pub fn is_pending_deletion(&self, resource: NativeResource) -> bool {
        self.deletions.contains(resource)
    }

    /// Destroys every pending handle now.
    ///
    /// Only valid once the GPU is idle, e.g. at shutdown.
    pub fn flush_pending_deletions(&mut self) {
        for resource in self.deletions.drain_all() {
            if let Err(e) = self.destroy_now(resource) {
                log::warn!("Failed to destroy {resource:?}: {e}");
            }
        }
    }

    fn destroy_now(&mut self, resource: NativeResource) -> Result<(), ResourceError> {
        match resource {
            NativeResource::Buffer(id) => self.device.destroy_buffer(id),
            NativeResource::Texture(id) => self.device.destroy_texture(id),
            NativeResource::Sampler(id) => self.device.destroy_sampler(id),
            NativeResource::Geometry(id) => self.device.destroy_geometry(id),
            NativeResource::Shader(id) => self.device.destroy_shader(id),
            NativeResource::Program(id) => self.device.destroy_program(id),
        }
    }

    // --- Bindings ---

    /// Binds a constant-buffer range and records it in the binding cache.
    pub fn bind_constant_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64, size: u64) {
        self.record_binding(slot, BoundResource::ConstantBuffer { buffer, offset, size });
        self.device.bind_constant_buffer(slot, buffer, offset, size);
    }

    /// Binds a structured-buffer range and records it in the binding cache.
    pub fn bind_structured_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64, size: u64) {
        self.record_binding(slot, BoundResource::StructuredBuffer { buffer, offset, size });
        self.device.bind_structured_buffer(slot, buffer, offset, size);
    }

    /// Binds a texture and sampler and records them in the binding cache.
    pub fn bind_texture_sampler(&mut self, slot: u32, texture: TextureId, sampler: SamplerId) {
        self.record_binding(slot, BoundResource::TextureSampler { texture, sampler });
        self.device.bind_texture_sampler(slot, texture, sampler);
    }

    /// Returns the resource cached for `slot`.
    pub fn bound_resource(&self, slot: u32) -> Option<BoundResource> {
        self.bindings.get(slot)
    }

    fn record_binding(&mut self, slot: u32, resource: BoundResource) {
        if !self.bindings.set(slot, resource) {
            log::warn!("Binding slot {slot} exceeds the {MAX_BINDING_SLOTS} tracked slots");
        }
    }

    /// Re-issues the cached bindings for the slots `program` declares.
    ///
    /// Slots the program never declared are skipped. Returns the number of
    /// bindings issued.
    pub fn bind_resources(&mut self, program: &Program) -> usize {
        let mut issued = 0;
        for (slot, bound) in self.bindings.iter_masked(program.bindings) {
            match bound {
                BoundResource::ConstantBuffer { buffer, offset, size } => {
                    self.device.bind_constant_buffer(slot, buffer, offset, size)
                }
                BoundResource::StructuredBuffer { buffer, offset, size } => {
                    self.device.bind_structured_buffer(slot, buffer, offset, size)
                }
                BoundResource::TextureSampler { texture, sampler } => {
                    self.device.bind_texture_sampler(slot, texture, sampler)
                }
            }
            issued += 1;
        }
        issued
    }

    /// Makes `program` current and re-issues the cached bindings it declares.
    pub fn use_program(&mut self, program: &Program) {
        self.device.use_program(program.id);
        self.bind_resources(program);
    }

    // --- State and draws ---

    /// Applies a stencil configuration.
    pub fn set_stencil_state(&mut self, state: &StencilState) {
        self.device.set_stencil_state(state);
    }

    /// Sets the stencil reference value.
    pub fn set_stencil_value(&mut self, value: u32) {
        self.device.set_stencil_value(value);
    }

    /// Binds `geometry` and draws it, instanced when `instance_count > 1`.
    pub fn draw_geometry(&mut self, geometry: &Geometry, instance_count: u32) {
        self.device.bind_geometry(geometry.id);
        match (geometry.index_format, instance_count > 1) {
            (Some(format), false) => {
                self.draw_elements(geometry.topology, format, geometry.element_count)
            }
            (Some(format), true) => self.draw_elements_instanced(
                geometry.topology,
                format,
                geometry.element_count,
                instance_count,
            ),
            (None, false) => self.draw_arrays(geometry.topology, 0, geometry.element_count),
            (None, true) => self.draw_arrays_instanced(
                geometry.topology,
                0,
                geometry.element_count,
                instance_count,
            ),
        }
    }

    /// Draws indices of the bound geometry.
    pub fn draw_elements(&mut self, topology: PrimitiveTopology, format: IndexFormat, count: u32) {
        self.draw_call_count += 1;
        self.device.draw_elements(topology, format, count);
    }

    /// Draws instances of indices of the bound geometry.
    pub fn draw_elements_instanced(
        &mut self,
        topology: PrimitiveTopology,
        format: IndexFormat,
        count: u32,
        instance_count: u32,
    ) {
        self.draw_call_count += 1;
        self.device
            .draw_elements_instanced(topology, format, count, instance_count);
    }

    /// Draws vertices of the bound geometry.
    pub fn draw_arrays(&mut self, topology: PrimitiveTopology, first_vertex: u32, count: u32) {
        self.draw_call_count += 1;
        self.device.draw_arrays(topology, first_vertex, count);
    }

    /// Draws instances of vertices of the bound geometry.
    pub fn draw_arrays_instanced(
        &mut self,
        topology: PrimitiveTopology,
        first_vertex: u32,
        count: u32,
        instance_count: u32,
    ) {
        self.draw_call_count += 1;
        self.device
            .draw_arrays_instanced(topology, first_vertex, count, instance_count);
    }
}

impl Drop for GraphicsBackend {
    fn drop(&mut self) {
        if !self.deletions.is_empty() {
            log::debug!(
                "Graphics backend dropped with {} pending deletions, destroying now",
                self.deletions.len()
            );
            self.flush_pending_deletions();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::test_utils::{MockCall, MockDevice};

    fn backend() -> GraphicsBackend {
        GraphicsBackend::new(Box::new(MockDevice::new()))
    }

    fn calls(backend: &GraphicsBackend) -> &[MockCall] {
        &backend.device_as::<MockDevice>().unwrap().calls
    }

    fn destroyed(backend: &GraphicsBackend) -> &[NativeResource] {
        &backend.device_as::<MockDevice>().unwrap().destroyed
    }

    #[test]
    fn delete_texture_destroys_on_second_new_frame() {
        let mut backend = backend();
        let texture = backend
            .create_texture(&TextureDescriptor {
                label: None,
                width: 4,
                height: 4,
                mip_level_count: 1,
            })
            .unwrap();

        backend.delete_texture(texture);
        assert!(destroyed(&backend).is_empty());
        assert!(backend.is_pending_deletion(NativeResource::Texture(texture)));

        backend.init_new_frame();
        assert!(destroyed(&backend).is_empty());

        backend.init_new_frame();
        assert_eq!(destroyed(&backend), &[NativeResource::Texture(texture)]);

        backend.init_new_frame();
        assert_eq!(destroyed(&backend).len(), 1);
        assert_eq!(backend.pending_deletions(), 0);
        assert_eq!(backend.frame_number(), 3);
    }

    #[test]
    fn delete_evicts_cached_bindings() {
        let mut backend = backend();
        let texture = TextureId(10);
        let sampler = SamplerId(11);
        backend.bind_texture_sampler(3, texture, sampler);
        backend.bind_constant_buffer(1, BufferId(12), 0, 128);

        backend.delete_texture(texture);
        assert!(backend.bound_resource(3).is_none());
        assert!(backend.bound_resource(1).is_some());

        let program = Program {
            id: ProgramId(1),
            bindings: BindingMask::ALL,
        };
        assert_eq!(backend.bind_resources(&program), 1);
    }

    #[test]
    fn bind_resources_respects_program_mask() {
        let mut backend = backend();
        backend.bind_constant_buffer(1, BufferId(1), 0, 128);
        backend.bind_structured_buffer(2, BufferId(2), 256, 512);
        backend.bind_texture_sampler(4, TextureId(3), SamplerId(4));

        let program = Program {
            id: ProgramId(9),
            bindings: BindingMask::from_slots(&[2, 4, 7]),
        };
        let before = calls(&backend).len();
        backend.use_program(&program);
        let issued = &calls(&backend)[before..];

        assert_eq!(
            issued,
            &[
                MockCall::UseProgram(ProgramId(9)),
                MockCall::BindStructuredBuffer(2, BufferId(2), 256, 512),
                MockCall::BindTextureSampler(4, TextureId(3), SamplerId(4)),
            ]
        );
    }

    #[test]
    fn double_delete_is_scheduled_once() {
        let mut backend = backend();
        backend.delete_buffer(BufferId(5));
        backend.delete_buffer(BufferId(5));
        assert_eq!(backend.pending_deletions(), 1);
        backend.init_new_frame();
        backend.init_new_frame();
        assert_eq!(destroyed(&backend), &[NativeResource::Buffer(BufferId(5))]);
    }

    #[test]
    fn failed_destroy_is_swallowed() {
        let mut backend = backend();
        backend.device_as_mut::<MockDevice>().unwrap().fail_destroy = true;
        backend.delete_sampler(SamplerId(1));
        backend.init_new_frame();
        backend.init_new_frame();
        assert_eq!(backend.pending_deletions(), 0);
        assert!(destroyed(&backend).is_empty());
    }

    #[test]
    fn draw_counter_resets_each_frame() {
        let mut backend = backend();
        let geometry = Geometry {
            label: "quad".to_string(),
            id: GeometryId(1),
            topology: PrimitiveTopology::TriangleList,
            element_count: 6,
            index_format: Some(IndexFormat::Uint16),
        };
        backend.draw_geometry(&geometry, 1);
        backend.draw_geometry(&geometry, 4);
        assert_eq!(backend.draw_call_count(), 2);
        assert_eq!(
            calls(&backend).last(),
            Some(&MockCall::DrawElementsInstanced(6, 4))
        );

        backend.init_new_frame();
        assert_eq!(backend.draw_call_count(), 0);
    }

    #[test]
    fn create_program_reflects_bindings() {
        let mut backend = backend();
        let program = backend
            .create_program(&ProgramDescriptor {
                label: None,
                shaders: &[],
            })
            .unwrap();
        assert_eq!(program.bindings, MockDevice::PROGRAM_BINDINGS);
    }
}
