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

//! Orders draw calls by render queue, then by distance to the camera.

use super::draw_call::DrawCallInfo;
use super::settings::DrawCallSortMode;
use std::cmp::Ordering;
use vesta_core::math::{Mat4, Vec3, Vec4, EPSILON};

/// Where distances are measured from, recovered from a view-projection matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortReference {
    /// Perspective camera: the eye position.
    Eye(Vec3),
    /// Orthographic camera: the normalized view direction.
    Direction(Vec3),
}

impl SortReference {
    /// Unprojects the clip-space point at infinity along +Z.
    ///
    /// For a perspective projection that point is the eye (finite `w`). For an
    /// orthographic one it is a direction (`w == 0`). Returns `None` when the
    /// matrix cannot be inverted.
    pub fn from_view_projection(view_projection: &Mat4) -> Option<Self> {
        let unprojected = view_projection.inverse()? * Vec4::new(0.0, 0.0, 1.0, 0.0);
        if unprojected.w.abs() > EPSILON {
            Some(Self::Eye(unprojected.truncate() / unprojected.w))
        } else {
            let direction = unprojected.truncate();
            if direction.length_squared() < EPSILON * EPSILON {
                return None;
            }
            Some(Self::Direction(direction.normalize()))
        }
    }

    /// Distance of `point` from the camera along this reference.
    pub fn distance(&self, point: Vec3) -> f32 {
        match *self {
            Self::Eye(eye) => point.distance(eye),
            Self::Direction(direction) => point.dot(direction),
        }
    }
}

/// Orders the draw calls of a pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct DrawCallSorter;

impl DrawCallSorter {
    /// Sorts `draw_calls` in place and reports whether any ordering was applied.
    ///
    /// Draws are grouped by ascending material render queue; inside a queue
    /// they are ordered by the distance of their bounds' center. The sort is
    /// unstable, so equal keys may swap. Leaves the slice untouched for
    /// [`DrawCallSortMode::NoSorting`] or a non-invertible matrix.
    pub fn sort(
        draw_calls: &mut [DrawCallInfo<'_>],
        mode: DrawCallSortMode,
        view_projection: &Mat4,
    ) -> bool {
        if mode == DrawCallSortMode::NoSorting {
            return false;
        }
        let Some(reference) = SortReference::from_view_projection(view_projection) else {
            log::warn!("View-projection matrix is not invertible, draw calls left unsorted");
            return false;
        };

        let by_distance = |a: &DrawCallInfo<'_>, b: &DrawCallInfo<'_>| -> Ordering {
            let da = reference.distance(a.aabb.center());
            let db = reference.distance(b.aabb.center());
            match mode {
                DrawCallSortMode::BackToFront => db.total_cmp(&da),
                _ => da.total_cmp(&db),
            }
        };

        draw_calls.sort_unstable_by(|a, b| {
            a.material
                .render_queue
                .cmp(&b.material.render_queue)
                .then_with(|| by_distance(a, b))
        });
        true
    }
}
