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

//! Binding slots, reflected binding masks and the resources bound to them.

use super::core::MAX_BINDING_SLOTS;
use super::resource::{BufferId, NativeResource, SamplerId, TextureId};

/// The set of binding slots a program declares, as reflected at link time.
///
/// Bit `n` is set when the program reads from slot `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BindingMask(u64);

impl BindingMask {
    /// A mask with no slots.
    pub const EMPTY: Self = Self(0);
    /// A mask with every slot.
    pub const ALL: Self = Self(u64::MAX);

    /// Creates a mask from raw bits.
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Creates a mask from a list of slots. Slots past [`MAX_BINDING_SLOTS`] are ignored.
    pub fn from_slots(slots: &[u32]) -> Self {
        slots
            .iter()
            .filter(|slot| **slot < MAX_BINDING_SLOTS)
            .fold(Self::EMPTY, |mask, slot| Self(mask.0 | (1 << slot)))
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u64 {
        self.0
    }

    /// Checks if the mask contains `slot`.
    pub const fn contains(&self, slot: u32) -> bool {
        slot < MAX_BINDING_SLOTS && self.0 & (1 << slot) != 0
    }

    /// Returns the mask with `slot` added.
    #[must_use]
    pub const fn with(self, slot: u32) -> Self {
        if slot < MAX_BINDING_SLOTS {
            Self(self.0 | (1 << slot))
        } else {
            self
        }
    }
}

/// A resource recorded in a binding slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundResource {
    /// A range of a buffer bound as a constant buffer.
    ConstantBuffer {
        /// The buffer.
        buffer: BufferId,
        /// Byte offset of the range.
        offset: u64,
        /// Byte size of the range.
        size: u64,
    },
    /// A range of a buffer bound as a read-only structured buffer.
    StructuredBuffer {
        /// The buffer.
        buffer: BufferId,
        /// Byte offset of the range.
        offset: u64,
        /// Byte size of the range.
        size: u64,
    },
    /// A texture and the sampler used to read it.
    TextureSampler {
        /// The texture.
        texture: TextureId,
        /// The sampler.
        sampler: SamplerId,
    },
}

impl BoundResource {
    /// Returns `true` if this binding references `resource`.
    pub fn references(&self, resource: NativeResource) -> bool {
        match (*self, resource) {
            (BoundResource::ConstantBuffer { buffer, .. }, NativeResource::Buffer(id))
            | (BoundResource::StructuredBuffer { buffer, .. }, NativeResource::Buffer(id)) => {
                buffer == id
            }
            (BoundResource::TextureSampler { texture, .. }, NativeResource::Texture(id)) => {
                texture == id
            }
            (BoundResource::TextureSampler { sampler, .. }, NativeResource::Sampler(id)) => {
                sampler == id
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_from_slots() {
        let mask = BindingMask::from_slots(&[0, 3, 63, 64, 200]);
        assert!(mask.contains(0));
        assert!(mask.contains(3));
        assert!(mask.contains(63));
        assert!(!mask.contains(64));
        assert!(!mask.contains(1));
        assert_eq!(mask.bits(), 1 | (1 << 3) | (1 << 63));
    }

    #[test]
    fn test_mask_with() {
        let mask = BindingMask::EMPTY.with(5).with(70);
        assert_eq!(mask, BindingMask::from_bits(1 << 5));
    }

    #[test]
    fn test_bound_resource_references() {
        let cb = BoundResource::ConstantBuffer {
            buffer: BufferId(4),
            offset: 0,
            size: 16,
        };
        assert!(cb.references(NativeResource::Buffer(BufferId(4))));
        assert!(!cb.references(NativeResource::Buffer(BufferId(5))));
        assert!(!cb.references(NativeResource::Texture(TextureId(4))));

        let ts = BoundResource::TextureSampler {
            texture: TextureId(1),
            sampler: SamplerId(2),
        };
        assert!(ts.references(NativeResource::Texture(TextureId(1))));
        assert!(ts.references(NativeResource::Sampler(SamplerId(2))));
        assert!(!ts.references(NativeResource::Sampler(SamplerId(1))));
    }
}
