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

//! Provides the public, backend-agnostic rendering contracts.
//!
//! This module defines the "common language" of the render path: resource
//! handles and descriptors, the scene-facing geometry/shader/material types,
//! the abstract [`GraphicsDevice`] and the [`GraphicsBackend`] front-end that
//! manages GPU resource lifetimes across frames in flight.
//!
//! Concrete devices live in the `vesta-infra` crate; the render queue in
//! `vesta-lanes` only ever talks to a [`GraphicsBackend`].

pub mod api;
pub mod backend;
pub mod error;
pub mod lifecycle;
pub mod traits;
pub mod util;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export the most important traits and types for easier use.
pub use self::api::*;
pub use self::backend::GraphicsBackend;
pub use self::error::{RenderError, ResourceError};
pub use self::lifecycle::{BindingCache, DeletionQueue, PendingDeletion};
pub use self::traits::GraphicsDevice;
pub use self::util::{RingBuffer, RING_BUFFER_GROWTH, RING_BUFFER_INITIAL_CAPACITY};
