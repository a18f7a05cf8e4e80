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

//! Per-pass render settings and the culling configuration.

use super::draw_call::DrawCallInfo;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use vesta_core::math::FrustumPlanes;
use vesta_core::renderer::Material;

/// How draw calls are ordered after batching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawCallSortMode {
    /// Keep assembly order.
    #[default]
    NoSorting,
    /// Nearest first. Suits opaque geometry.
    FrontToBack,
    /// Farthest first. Suits alpha blending.
    BackToFront,
}

impl fmt::Display for DrawCallSortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoSorting => "no_sorting",
            Self::FrontToBack => "front_to_back",
            Self::BackToFront => "back_to_front",
        };
        f.write_str(name)
    }
}

impl FromStr for DrawCallSortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "no_sorting" | "none" => Ok(Self::NoSorting),
            "front_to_back" => Ok(Self::FrontToBack),
            "back_to_front" => Ok(Self::BackToFront),
            other => Err(format!(
                "unknown sort mode '{other}' (expected no_sorting, front_to_back or back_to_front)"
            )),
        }
    }
}

/// A predicate deciding which draw calls a pass keeps.
#[derive(Clone)]
pub struct DrawCallFilter(Arc<dyn Fn(&DrawCallInfo<'_>) -> bool + Send + Sync>);

impl DrawCallFilter {
    /// Wraps a custom predicate.
    pub fn new(predicate: impl Fn(&DrawCallInfo<'_>) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    /// Keeps everything.
    pub fn all() -> Self {
        Self::new(|_| true)
    }

    /// Keeps draws whose material is below the transparent render queue.
    pub fn opaque() -> Self {
        Self::new(|call| !call.material.is_transparent())
    }

    /// Keeps draws whose material is in the transparent render queue or above.
    pub fn transparent() -> Self {
        Self::new(|call| call.material.is_transparent())
    }

    /// Keeps draws flagged as shadow casters.
    pub fn shadow_casters() -> Self {
        Self::new(|call| call.cast_shadows)
    }

    /// Evaluates the predicate.
    pub fn accepts(&self, call: &DrawCallInfo<'_>) -> bool {
        (self.0)(call)
    }
}

impl Default for DrawCallFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Debug for DrawCallFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DrawCallFilter(..)")
    }
}

/// Settings of one render pass.
#[derive(Debug, Clone, Default)]
pub struct RenderSettings<'a> {
    /// Ordering applied after batching.
    pub sort_mode: DrawCallSortMode,
    /// Which draw calls survive assembly.
    pub filter: DrawCallFilter,
    /// When set, replaces every renderer's material.
    pub override_material: Option<&'a Material>,
    /// Frustum planes tested during culling.
    pub culling_planes: FrustumPlanes,
}

impl<'a> RenderSettings<'a> {
    /// Sets the sort mode.
    pub fn with_sort_mode(mut self, sort_mode: DrawCallSortMode) -> Self {
        self.sort_mode = sort_mode;
        self
    }

    /// Sets the filter.
    pub fn with_filter(mut self, filter: DrawCallFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Draws everything with `material`.
    pub fn with_override_material(mut self, material: &'a Material) -> Self {
        self.override_material = Some(material);
        self
    }

    /// Restricts the planes tested during culling.
    pub fn with_culling_planes(mut self, planes: FrustumPlanes) -> Self {
        self.culling_planes = planes;
        self
    }
}

/// Frustum culling switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CullingConfig {
    /// Test renderer bounds against the camera frustum.
    pub enable_frustum_culling: bool,
    /// Keep culling against the last computed frustum instead of the current camera.
    pub freeze_frustum_culling: bool,
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            enable_frustum_culling: true,
            freeze_frustum_culling: false,
        }
    }
}
