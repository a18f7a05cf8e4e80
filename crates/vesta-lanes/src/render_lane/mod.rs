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

//! Rendering lane - per-frame draw call scheduling.
//!
//! A frame goes through the [`RenderQueue`] in two steps:
//!
//! 1. `prepare`: the [`DrawCallAssembler`] turns renderers into draw calls
//!    (override material, filter, frustum culling), the [`InstancingBatcher`]
//!    merges compatible ones, and the [`DrawCallSorter`] orders the result.
//! 2. `draw`: each draw call streams its matrices through the per-frame
//!    [`DrawStreams`], binds its material and issues one draw.

mod assembler;
mod batcher;
mod draw_call;
mod queue;
mod settings;
mod sorter;
mod streams;

pub use assembler::*;
pub use batcher::*;
pub use draw_call::*;
pub use queue::*;
pub use settings::*;
pub use sorter::*;
pub use streams::*;
