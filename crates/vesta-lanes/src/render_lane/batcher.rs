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

//! Merges draw calls that share a geometry and a material into instanced draws.

use super::draw_call::{BatchKey, DrawCallInfo};
use ahash::AHashMap;

/// Upper bound on the instances of a single instanced draw.
pub const MAX_INSTANCING_COUNT: usize = 256;

/// Folds compatible draw calls into the first one of their kind.
///
/// Only materials whose shader supports instancing take part. The first
/// occurrence of a geometry/material pair becomes the batch head and absorbs
/// the matrices of later ones until it holds [`MAX_INSTANCING_COUNT`]
/// instances, at which point the next occurrence starts a new batch.
#[derive(Debug, Default)]
pub struct InstancingBatcher {
    heads: AHashMap<BatchKey, usize>,
}

impl InstancingBatcher {
    /// Creates an empty batcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches `draw_calls` in place and returns how many draw calls were folded away.
    ///
    /// Absorbed entries are removed with `swap_remove`, so relative order is
    /// not preserved. Sorting runs afterwards anyway.
    pub fn batch(&mut self, draw_calls: &mut Vec<DrawCallInfo<'_>>) -> usize {
        self.heads.clear();
        let mut folded = 0;
        let mut index = 0;

        while index < draw_calls.len() {
            if !draw_calls[index].material.shader.supports_instancing {
                index += 1;
                continue;
            }

            let key = draw_calls[index].batch_key();
            match self.heads.get(&key).copied() {
                Some(head) => {
                    // Heads always sit before `index`, so the element swapped in
                    // from the tail is unvisited.
                    let absorbed = draw_calls.swap_remove(index);
                    let batch = &mut draw_calls[head];
                    batch.model_matrices.extend(absorbed.model_matrices);
                    batch.aabb.combine(&absorbed.aabb);
                    batch.cast_shadows |= absorbed.cast_shadows;
                    if batch.model_matrices.len() >= MAX_INSTANCING_COUNT {
                        self.heads.remove(&key);
                    }
                    folded += 1;
                }
                None => {
                    draw_calls[index].instanced = true;
                    self.heads.insert(key, index);
                    index += 1;
                }
            }
        }

        if folded > 0 {
            log::trace!(
                "Instancing folded {folded} draw calls, {} remain",
                draw_calls.len()
            );
        }
        folded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vesta_core::math::{Aabb, Mat4, Vec3};
    use vesta_core::renderer::*;

    fn material(supports_instancing: bool) -> Material {
        let shader = Arc::new(Shader {
            label: "lit".to_string(),
            program: Program {
                id: ProgramId(1),
                bindings: BindingMask::EMPTY,
            },
            supports_instancing,
            texture_bindings: Vec::new(),
        });
        Material::new("m", shader)
    }

    fn geometry(id: usize) -> Geometry {
        Geometry {
            label: format!("mesh{id}"),
            id: GeometryId(id),
            topology: PrimitiveTopology::TriangleList,
            element_count: 36,
            index_format: Some(IndexFormat::Uint32),
        }
    }

    fn call<'a>(geometry: &'a Geometry, material: &'a Material, x: f32) -> DrawCallInfo<'a> {
        let model = Mat4::from_translation(Vec3::new(x, 0.0, 0.0));
        let aabb = Aabb::from_center_half_extents(Vec3::new(x, 0.0, 0.0), Vec3::splat(0.5));
        DrawCallInfo::new(geometry, material, model, aabb)
    }

    #[test]
    fn shared_pairs_fold_into_one_head() {
        let material = material(true);
        let shared = geometry(1);
        let others: Vec<Geometry> = (2..9).map(geometry).collect();

        let mut calls = vec![call(&shared, &material, 0.0)];
        calls.extend(others.iter().map(|g| call(g, &material, 1.0)));
        calls.push(call(&shared, &material, 5.0));
        calls.push(call(&shared, &material, 9.0));

        let folded = InstancingBatcher::new().batch(&mut calls);
        assert_eq!(folded, 2);
        assert_eq!(calls.len(), 8);

        let batch: Vec<_> = calls.iter().filter(|c| c.is_instanced_draw()).collect();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].instance_count(), 3);
        assert_eq!(batch[0].aabb.min.x, -0.5);
        assert_eq!(batch[0].aabb.max.x, 9.5);
        let total: usize = calls.iter().map(DrawCallInfo::instance_count).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn batches_are_capped() {
        let material = material(true);
        let shared = geometry(1);
        let mut calls: Vec<_> = (0..MAX_INSTANCING_COUNT + 1)
            .map(|i| call(&shared, &material, i as f32))
            .collect();

        InstancingBatcher::new().batch(&mut calls);
        let mut counts: Vec<usize> = calls.iter().map(DrawCallInfo::instance_count).collect();
        counts.sort_unstable();
        assert_eq!(counts, vec![1, MAX_INSTANCING_COUNT]);
        assert!(calls.iter().all(|c| c.instanced));
    }

    #[test]
    fn shaders_without_instancing_are_left_alone() {
        let material = material(false);
        let shared = geometry(1);
        let mut calls = vec![call(&shared, &material, 0.0), call(&shared, &material, 1.0)];

        assert_eq!(InstancingBatcher::new().batch(&mut calls), 0);
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| !c.instanced));
    }

    #[test]
    fn batcher_state_does_not_leak_between_runs() {
        let material = material(true);
        let shared = geometry(1);
        let mut batcher = InstancingBatcher::new();

        let mut first = vec![call(&shared, &material, 0.0), call(&shared, &material, 1.0)];
        batcher.batch(&mut first);
        let mut second = vec![call(&shared, &material, 0.0)];
        assert_eq!(batcher.batch(&mut second), 0);
        assert_eq!(second[0].instance_count(), 1);
    }
}
