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

//! Frame pacing constants and well-known binding slots.

/// The maximum number of frames that can be processed by the GPU at once.
/// This determines the number of slots in per-frame ring buffers.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// The number of `init_new_frame` ticks a deleted resource survives before the
/// device destroys it.
pub const DELETE_RESOURCE_DELAY: u32 = 2;

// A resource may still be referenced by every frame in flight when it is deleted.
const _: () = assert!(
    DELETE_RESOURCE_DELAY as usize >= MAX_FRAMES_IN_FLIGHT,
    "DELETE_RESOURCE_DELAY must cover every frame in flight"
);

/// The number of binding slots tracked by the binding cache.
pub const MAX_BINDING_SLOTS: u32 = 64;

/// Slot of the per-draw constant buffer (`PerDrawData`) used by non-instanced draws.
pub const PER_DRAW_DATA_BINDING: u32 = 1;

/// Slot of the per-instance structured buffer used by instanced draws.
pub const PER_INSTANCE_DATA_BINDING: u32 = 2;
