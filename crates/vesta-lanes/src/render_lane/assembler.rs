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

//! Turns renderers into draw calls.

use super::draw_call::{DrawCallInfo, Renderer};
use super::settings::RenderSettings;
use vesta_core::math::Frustum;

/// Counters gathered while assembling one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyStats {
    /// Renderers visited.
    pub visited: usize,
    /// Renderers without a geometry or a material.
    pub incomplete: usize,
    /// Renderers rejected by the frustum.
    pub culled: usize,
    /// Draw calls rejected by the pass filter.
    pub filtered: usize,
    /// Draw calls emitted.
    pub emitted: usize,
}

/// Builds one draw call per visible, complete renderer.
#[derive(Debug, Default, Clone, Copy)]
pub struct DrawCallAssembler;

impl DrawCallAssembler {
    /// Appends the draw calls for `renderers` to `out`, in renderer order.
    ///
    /// The override material replaces each renderer's own material. When a
    /// frustum is given, renderers whose bounds fall outside any plane of
    /// `settings.culling_planes` are dropped.
    pub fn assemble<'a, R: Renderer>(
        renderers: &'a [R],
        settings: &RenderSettings<'a>,
        frustum: Option<&Frustum>,
        out: &mut Vec<DrawCallInfo<'a>>,
    ) -> AssemblyStats {
        let mut stats = AssemblyStats::default();

        for renderer in renderers {
            stats.visited += 1;

            let Some(geometry) = renderer.geometry() else {
                stats.incomplete += 1;
                continue;
            };
            let Some(material) = settings.override_material.or_else(|| renderer.material()) else {
                stats.incomplete += 1;
                continue;
            };

            let aabb = renderer.aabb();
            if let Some(frustum) = frustum {
                if !frustum.is_visible(&aabb, settings.culling_planes) {
                    stats.culled += 1;
                    continue;
                }
            }

            let mut call = DrawCallInfo::new(geometry, material, renderer.model_matrix(), aabb);
            call.cast_shadows = renderer.cast_shadows();
            call.stencil_value = renderer.stencil_value();

            if !settings.filter.accepts(&call) {
                stats.filtered += 1;
                continue;
            }

            out.push(call);
            stats.emitted += 1;
        }

        log::trace!(
            "Assembled {} draw calls from {} renderers ({} culled, {} filtered, {} incomplete)",
            stats.emitted,
            stats.visited,
            stats.culled,
            stats.filtered,
            stats.incomplete
        );
        stats
    }
}
