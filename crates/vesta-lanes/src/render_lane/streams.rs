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

//! Per-frame ring buffers that carry object transforms to the GPU.

use super::batcher::MAX_INSTANCING_COUNT;
use bytemuck::{Pod, Zeroable};
use vesta_core::math::Mat4;
use vesta_core::renderer::{
    BufferUsage, GraphicsBackend, ResourceError, RingBuffer, MAX_FRAMES_IN_FLIGHT,
};

/// Transform data of one drawn object, as laid out on the GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PerDrawData {
    /// Object-to-world transform.
    pub model: Mat4,
    /// Inverse-transpose of `model`, for normals.
    pub model_normal: Mat4,
}

impl PerDrawData {
    /// Derives the normal matrix from `model`.
    pub fn new(model: &Mat4) -> Self {
        Self {
            model: *model,
            model_normal: model.normal_matrix(),
        }
    }
}

#[derive(Debug)]
struct FrameStreams {
    per_draw: RingBuffer,
    per_instance: RingBuffer,
}

impl FrameStreams {
    fn new(backend: &mut GraphicsBackend, index: usize) -> Result<Self, ResourceError> {
        let per_draw_size = std::mem::size_of::<PerDrawData>() as u64;
        let per_draw = RingBuffer::new(
            backend,
            per_draw_size,
            BufferUsage::CONSTANT,
            format!("per_draw_data[{index}]"),
        )?;
        let per_instance = match RingBuffer::new(
            backend,
            per_draw_size * MAX_INSTANCING_COUNT as u64,
            BufferUsage::STRUCTURED,
            format!("per_instance_data[{index}]"),
        ) {
            Ok(ring) => ring,
            Err(e) => {
                per_draw.destroy(backend);
                return Err(e);
            }
        };
        Ok(Self {
            per_draw,
            per_instance,
        })
    }

    fn destroy(self, backend: &mut GraphicsBackend) {
        self.per_draw.destroy(backend);
        self.per_instance.destroy(backend);
    }
}

/// One pair of ring buffers per frame in flight.
///
/// The CPU writes the current frame's pair while the GPU may still read the
/// pairs of earlier frames. A pair is rewound only when its frame comes around
/// again, [`MAX_FRAMES_IN_FLIGHT`] frames later.
#[derive(Debug)]
pub struct DrawStreams {
    frames: Vec<FrameStreams>,
    current: usize,
}

impl DrawStreams {
    /// Creates the ring buffers for every frame in flight.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if a buffer creation fails. Buffers created
    /// before the failure are handed back to the backend's deferred deletion.
    pub fn new(backend: &mut GraphicsBackend) -> Result<Self, ResourceError> {
        let mut frames = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        for index in 0..MAX_FRAMES_IN_FLIGHT {
            match FrameStreams::new(backend, index) {
                Ok(frame) => frames.push(frame),
                Err(e) => {
                    for frame in frames {
                        frame.destroy(backend);
                    }
                    return Err(e);
                }
            }
        }

        Ok(Self { frames, current: 0 })
    }

    /// Moves to the next frame's pair and rewinds it.
    pub fn begin_frame(&mut self) {
        self.current = (self.current + 1) % self.frames.len();
        let frame = &mut self.frames[self.current];
        frame.per_draw.reset();
        frame.per_instance.reset();
    }

    /// Index of the pair the current frame writes to.
    pub fn frame_index(&self) -> usize {
        self.current
    }

    /// Ring for single draws, one [`PerDrawData`] per slot.
    pub fn per_draw(&mut self) -> &mut RingBuffer {
        &mut self.frames[self.current].per_draw
    }

    /// Ring for instanced draws, up to [`MAX_INSTANCING_COUNT`] entries per slot.
    pub fn per_instance(&mut self) -> &mut RingBuffer {
        &mut self.frames[self.current].per_instance
    }

    /// Retires every ring buffer through the backend's deferred deletion.
    pub fn destroy(self, backend: &mut GraphicsBackend) {
        for frame in self.frames {
            frame.destroy(backend);
        }
    }
}
