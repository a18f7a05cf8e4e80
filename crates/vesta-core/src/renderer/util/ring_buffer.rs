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

//! Growable, append-only GPU buffer for per-draw streaming data.
//!
//! The [`RingBuffer`] hands out one fixed-size slot per [`set_data`](RingBuffer::set_data)
//! call. When it runs out of slots within a frame it allocates a bigger buffer,
//! copies the old contents on the GPU timeline and retires the old buffer
//! through the backend's deferred deletion, so draws already recorded against
//! it stay valid.
//!
//! ```text
//! set_data x64   [0 .. 63]                      capacity 64
//! set_data #65   copy [0 .. 63] -> new buffer   capacity 128, old buffer pending deletion
//! reset()        cursor before slot 0
//! ```

use crate::renderer::{
    api::{BufferDescriptor, BufferId, BufferUsage},
    backend::GraphicsBackend,
    error::ResourceError,
};
use std::borrow::Cow;

/// Number of slots a new ring buffer starts with.
pub const RING_BUFFER_INITIAL_CAPACITY: u32 = 64;

/// Number of slots added on every growth.
pub const RING_BUFFER_GROWTH: u32 = 64;

/// Rounds `size` up to a multiple of `alignment` (an alignment of 0 leaves it unchanged).
pub fn align_size(size: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        size
    } else {
        size.div_ceil(alignment) * alignment
    }
}

/// A growable GPU buffer split into equally sized, aligned slots.
#[derive(Debug)]
pub struct RingBuffer {
    buffer: BufferId,
    element_size: u64,
    capacity: u32,
    /// Last written slot, `None` before the first write.
    cursor: Option<u32>,
    usage: BufferUsage,
    label: Cow<'static, str>,
}

impl RingBuffer {
    /// Creates a ring buffer with [`RING_BUFFER_INITIAL_CAPACITY`] slots.
    ///
    /// `element_size` is rounded up to the backend's constant-buffer offset
    /// alignment so that every slot can be bound on its own.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if the buffer creation fails.
    pub fn new(
        backend: &mut GraphicsBackend,
        element_size: u64,
        usage: BufferUsage,
        label: impl Into<Cow<'static, str>>,
    ) -> Result<Self, ResourceError> {
        Self::with_capacity(backend, element_size, RING_BUFFER_INITIAL_CAPACITY, usage, label)
    }

    /// Creates a ring buffer with `capacity` slots.
    pub fn with_capacity(
        backend: &mut GraphicsBackend,
        element_size: u64,
        capacity: u32,
        usage: BufferUsage,
        label: impl Into<Cow<'static, str>>,
    ) -> Result<Self, ResourceError> {
        let label = label.into();
        let element_size = align_size(element_size, backend.constant_buffer_offset_alignment());
        let usage = usage | BufferUsage::COPY_SRC | BufferUsage::COPY_DST;
        let capacity = capacity.max(1);
        let buffer = backend.create_buffer(&BufferDescriptor {
            label: Some(label.clone()),
            size: element_size * capacity as u64,
            usage,
        })?;

        Ok(Self {
            buffer,
            element_size,
            capacity,
            cursor: None,
            usage,
            label,
        })
    }

    /// Writes `data` at `offset` inside the next slot and returns the absolute byte
    /// offset written.
    ///
    /// Grows the buffer by [`RING_BUFFER_GROWTH`] slots when every slot is in use.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::OutOfBounds`] if `offset + data.len()` exceeds the
    /// element size; the cursor does not move in that case.
    pub fn set_data(
        &mut self,
        backend: &mut GraphicsBackend,
        data: &[u8],
        offset: u64,
    ) -> Result<u64, ResourceError> {
        if offset + data.len() as u64 > self.element_size {
            return Err(ResourceError::OutOfBounds);
        }

        let slot = self.cursor.map_or(0, |cursor| cursor + 1);
        if slot >= self.capacity {
            self.grow(backend, self.capacity + RING_BUFFER_GROWTH)?;
        }

        let absolute = self.element_size * slot as u64 + offset;
        backend.write_buffer(self.buffer, absolute, data)?;
        self.cursor = Some(slot);
        Ok(absolute)
    }

    fn grow(&mut self, backend: &mut GraphicsBackend, new_capacity: u32) -> Result<(), ResourceError> {
        let new_buffer = backend.create_buffer(&BufferDescriptor {
            label: Some(self.label.clone()),
            size: self.element_size * new_capacity as u64,
            usage: self.usage,
        })?;

        if let Err(e) = backend.copy_buffer(self.buffer, new_buffer, self.size()) {
            backend.delete_buffer(new_buffer);
            return Err(e);
        }

        log::debug!(
            "RingBuffer({}): grew from {} to {} slots",
            self.label,
            self.capacity,
            new_capacity
        );

        let old_buffer = std::mem::replace(&mut self.buffer, new_buffer);
        backend.delete_buffer(old_buffer);
        self.capacity = new_capacity;
        Ok(())
    }

    /// Rewinds the cursor to before slot 0. Capacity is kept.
    pub fn reset(&mut self) {
        self.cursor = None;
    }

    /// Retires the GPU buffer through the backend's deferred deletion.
    pub fn destroy(self, backend: &mut GraphicsBackend) {
        backend.delete_buffer(self.buffer);
    }

    /// The current GPU buffer.
    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    /// Byte offset of the last written slot, or `None` before the first write.
    pub fn current_offset(&self) -> Option<u64> {
        self.cursor.map(|slot| slot as u64 * self.element_size)
    }

    /// Size of one slot in bytes, after alignment.
    pub fn element_size(&self) -> u64 {
        self.element_size
    }

    /// Number of slots.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Total size of the buffer in bytes.
    pub fn size(&self) -> u64 {
        self.element_size * self.capacity as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::NativeResource;
    use crate::renderer::test_utils::MockDevice;

    fn backend() -> GraphicsBackend {
        GraphicsBackend::new(Box::new(MockDevice::new()))
    }

    fn contents(backend: &GraphicsBackend, buffer: BufferId) -> Vec<u8> {
        backend.device_as::<MockDevice>().unwrap().buffers[&buffer].clone()
    }

    #[test]
    fn test_align_size() {
        assert_eq!(align_size(128, 256), 256);
        assert_eq!(align_size(256, 256), 256);
        assert_eq!(align_size(257, 256), 512);
        assert_eq!(align_size(100, 0), 100);
    }

    #[test]
    fn element_size_is_aligned_to_backend() {
        let mut backend = backend();
        let ring = RingBuffer::new(&mut backend, 128, BufferUsage::CONSTANT, "per-draw").unwrap();
        assert_eq!(ring.element_size(), 256);
        assert_eq!(ring.capacity(), RING_BUFFER_INITIAL_CAPACITY);
        assert_eq!(ring.size(), 256 * 64);
        assert_eq!(ring.current_offset(), None);
    }

    #[test]
    fn set_data_advances_one_slot_per_call() {
        let mut backend = backend();
        let mut ring = RingBuffer::new(&mut backend, 16, BufferUsage::CONSTANT, "ring").unwrap();
        assert_eq!(ring.set_data(&mut backend, &[1; 16], 0).unwrap(), 0);
        assert_eq!(ring.set_data(&mut backend, &[2; 8], 8).unwrap(), 256 + 8);
        assert_eq!(ring.current_offset(), Some(256));

        ring.reset();
        assert_eq!(ring.current_offset(), None);
        assert_eq!(ring.set_data(&mut backend, &[3; 16], 0).unwrap(), 0);
    }

    #[test]
    fn oversized_write_is_rejected_without_advancing() {
        let mut backend = backend();
        let mut ring = RingBuffer::new(&mut backend, 256, BufferUsage::CONSTANT, "ring").unwrap();
        assert_eq!(
            ring.set_data(&mut backend, &[0; 200], 100),
            Err(ResourceError::OutOfBounds)
        );
        assert_eq!(ring.current_offset(), None);
    }

    #[test]
    fn sixty_fifth_write_grows_once_and_preserves_slots() {
        let mut backend = backend();
        let mut ring = RingBuffer::new(&mut backend, 256, BufferUsage::CONSTANT, "ring").unwrap();
        let first_buffer = ring.buffer();

        for i in 0..64u32 {
            ring.set_data(&mut backend, &[i as u8; 256], 0).unwrap();
        }
        assert_eq!(ring.capacity(), 64);
        let before = contents(&backend, first_buffer);

        let offset = ring.set_data(&mut backend, &[0xAB; 256], 0).unwrap();
        assert_eq!(offset, 64 * 256);
        assert_eq!(ring.capacity(), 128);
        assert_ne!(ring.buffer(), first_buffer);

        let after = contents(&backend, ring.buffer());
        assert_eq!(&after[..64 * 256], &before[..]);
        assert!(after[64 * 256..65 * 256].iter().all(|b| *b == 0xAB));

        // The old buffer is retired, not destroyed.
        assert!(backend.is_pending_deletion(NativeResource::Buffer(first_buffer)));
        assert!(backend
            .device_as::<MockDevice>()
            .unwrap()
            .destroyed
            .is_empty());
    }

    #[test]
    fn destroy_is_deferred() {
        let mut backend = backend();
        let ring = RingBuffer::new(&mut backend, 64, BufferUsage::STRUCTURED, "ring").unwrap();
        let buffer = ring.buffer();
        ring.destroy(&mut backend);
        backend.init_new_frame();
        assert!(backend.is_pending_deletion(NativeResource::Buffer(buffer)));
        backend.init_new_frame();
        assert!(!backend.is_pending_deletion(NativeResource::Buffer(buffer)));
    }
}
