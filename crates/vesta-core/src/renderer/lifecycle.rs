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

//! Frame-delayed destruction of native handles and the slot binding cache.
//!
//! Both structures are plain data owned by [`GraphicsBackend`](super::GraphicsBackend);
//! they never talk to the device themselves.

use super::api::{
    BindingMask, BoundResource, NativeResource, DELETE_RESOURCE_DELAY, MAX_BINDING_SLOTS,
};

/// A native handle waiting for the frames that may reference it to retire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDeletion {
    /// The handle to destroy.
    pub resource: NativeResource,
    /// `init_new_frame` ticks left before the handle is destroyed.
    pub frames_remaining: u32,
}

/// Queue of handles scheduled for destruction.
#[derive(Debug, Default)]
pub struct DeletionQueue {
    pending: Vec<PendingDeletion>,
}

impl DeletionQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `resource` for destruction after [`DELETE_RESOURCE_DELAY`] ticks.
    ///
    /// Returns `false` without scheduling if the handle is already pending.
    pub fn schedule(&mut self, resource: NativeResource) -> bool {
        if self.contains(resource) {
            return false;
        }
        self.pending.push(PendingDeletion {
            resource,
            frames_remaining: DELETE_RESOURCE_DELAY,
        });
        true
    }

    /// Decrements every pending record once and returns the handles that reached zero,
    /// in scheduling order.
    pub fn tick(&mut self) -> Vec<NativeResource> {
        let mut expired = Vec::new();
        self.pending.retain_mut(|entry| {
            entry.frames_remaining = entry.frames_remaining.saturating_sub(1);
            if entry.frames_remaining == 0 {
                expired.push(entry.resource);
                false
            } else {
                true
            }
        });
        expired
    }

    /// Removes and returns every pending handle regardless of its countdown.
    pub fn drain_all(&mut self) -> Vec<NativeResource> {
        self.pending.drain(..).map(|entry| entry.resource).collect()
    }

    /// Returns `true` if `resource` is waiting to be destroyed.
    pub fn contains(&self, resource: NativeResource) -> bool {
        self.pending.iter().any(|entry| entry.resource == resource)
    }

    /// Returns the pending records.
    pub fn iter(&self) -> impl Iterator<Item = &PendingDeletion> {
        self.pending.iter()
    }

    /// Number of pending records.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// The resource last bound to each slot.
#[derive(Debug, Clone)]
pub struct BindingCache {
    slots: [Option<BoundResource>; MAX_BINDING_SLOTS as usize],
}

impl Default for BindingCache {
    fn default() -> Self {
        Self {
            slots: [None; MAX_BINDING_SLOTS as usize],
        }
    }
}

impl BindingCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `resource` in `slot`. Returns `false` if the slot is out of range.
    pub fn set(&mut self, slot: u32, resource: BoundResource) -> bool {
        match self.slots.get_mut(slot as usize) {
            Some(entry) => {
                *entry = Some(resource);
                true
            }
            None => false,
        }
    }

    /// Returns the resource recorded in `slot`.
    pub fn get(&self, slot: u32) -> Option<BoundResource> {
        self.slots.get(slot as usize).copied().flatten()
    }

    /// Clears every slot referencing `resource` and returns how many were cleared.
    pub fn evict(&mut self, resource: NativeResource) -> usize {
        let mut evicted = 0;
        for entry in self.slots.iter_mut() {
            if entry.is_some_and(|bound| bound.references(resource)) {
                *entry = None;
                evicted += 1;
            }
        }
        evicted
    }

    /// Clears every slot.
    pub fn clear(&mut self) {
        self.slots = [None; MAX_BINDING_SLOTS as usize];
    }

    /// Iterates the occupied slots whose bit is set in `mask`, in slot order.
    pub fn iter_masked(&self, mask: BindingMask) -> impl Iterator<Item = (u32, BoundResource)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(move |(slot, entry)| {
                let slot = slot as u32;
                match entry {
                    Some(bound) if mask.contains(slot) => Some((slot, *bound)),
                    _ => None,
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::{BufferId, SamplerId, TextureId};

    #[test]
    fn test_deletion_expires_after_delay() {
        let mut queue = DeletionQueue::new();
        let texture = NativeResource::Texture(TextureId(7));
        assert!(queue.schedule(texture));

        for _ in 1..DELETE_RESOURCE_DELAY {
            assert!(queue.tick().is_empty());
            assert!(queue.contains(texture));
        }
        assert_eq!(queue.tick(), vec![texture]);
        assert!(queue.is_empty());
        assert!(queue.tick().is_empty());
    }

    #[test]
    fn test_double_schedule_is_ignored() {
        let mut queue = DeletionQueue::new();
        let buffer = NativeResource::Buffer(BufferId(1));
        assert!(queue.schedule(buffer));
        assert!(!queue.schedule(buffer));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_staggered_deletions_keep_their_own_countdown() {
        let mut queue = DeletionQueue::new();
        let first = NativeResource::Buffer(BufferId(1));
        let second = NativeResource::Buffer(BufferId(2));
        queue.schedule(first);
        assert!(queue.tick().is_empty());
        queue.schedule(second);
        assert_eq!(queue.tick(), vec![first]);
        assert_eq!(queue.tick(), vec![second]);
    }

    #[test]
    fn test_drain_all() {
        let mut queue = DeletionQueue::new();
        queue.schedule(NativeResource::Buffer(BufferId(1)));
        queue.schedule(NativeResource::Sampler(SamplerId(1)));
        assert_eq!(queue.drain_all().len(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_binding_cache_evicts_by_handle() {
        let mut cache = BindingCache::new();
        let texture = TextureId(3);
        let sampler = SamplerId(4);
        cache.set(0, BoundResource::TextureSampler { texture, sampler });
        cache.set(5, BoundResource::TextureSampler { texture, sampler });
        cache.set(
            1,
            BoundResource::ConstantBuffer {
                buffer: BufferId(3),
                offset: 0,
                size: 64,
            },
        );

        assert_eq!(cache.evict(NativeResource::Texture(texture)), 2);
        assert!(cache.get(0).is_none());
        assert!(cache.get(5).is_none());
        assert!(cache.get(1).is_some());
    }

    #[test]
    fn test_binding_cache_masked_iteration() {
        let mut cache = BindingCache::new();
        for slot in [0, 2, 9] {
            cache.set(
                slot,
                BoundResource::StructuredBuffer {
                    buffer: BufferId(slot as usize),
                    offset: 0,
                    size: 16,
                },
            );
        }
        let slots: Vec<u32> = cache
            .iter_masked(BindingMask::from_slots(&[2, 9, 10]))
            .map(|(slot, _)| slot)
            .collect();
        assert_eq!(slots, vec![2, 9]);
        assert!(!cache.set(MAX_BINDING_SLOTS, BoundResource::TextureSampler {
            texture: TextureId(0),
            sampler: SamplerId(0),
        }));
    }
}
