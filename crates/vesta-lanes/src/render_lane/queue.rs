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

//! The render queue: prepare once, draw once, per pass and per frame.

use super::assembler::{AssemblyStats, DrawCallAssembler};
use super::batcher::InstancingBatcher;
use super::draw_call::{DrawCallInfo, Renderer};
use super::settings::{CullingConfig, RenderSettings};
use super::sorter::DrawCallSorter;
use super::streams::{DrawStreams, PerDrawData};
use vesta_core::math::{Frustum, Mat4};
use vesta_core::renderer::{
    GraphicsBackend, Material, RenderError, ResourceError, PER_DRAW_DATA_BINDING,
    PER_INSTANCE_DATA_BINDING,
};

/// Where a queue is in its prepare/draw cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderQueueState {
    /// Nothing prepared.
    #[default]
    Empty,
    /// Draw calls are assembled, batched and sorted.
    Prepared,
    /// The prepared draw calls were submitted.
    Drawn,
}

/// Outcome of [`RenderQueue::prepare`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrepareStats {
    /// Assembly counters.
    pub assembly: AssemblyStats,
    /// Draw calls folded into instanced batches.
    pub folded: usize,
    /// Draw calls left after batching.
    pub draw_calls: usize,
    /// Whether a sort was applied.
    pub sorted: bool,
}

/// Outcome of [`RenderQueue::draw`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Draws issued, instanced ones included.
    pub draw_calls: u32,
    /// Draws issued through the instanced path.
    pub instanced_draw_calls: u32,
    /// Objects drawn across every draw.
    pub instances: u32,
    /// Draw calls dropped because their transforms could not be uploaded.
    pub skipped: u32,
}

/// Culls, batches, sorts and submits the draw calls of one pass.
///
/// The queue borrows geometries and materials from the renderers handed to
/// [`prepare`](Self::prepare) for `'a`. Use [`recycle`](Self::recycle) to carry
/// the queue's allocations and frozen frustum into a cycle with a new borrow.
#[derive(Debug, Default)]
pub struct RenderQueue<'a> {
    draw_calls: Vec<DrawCallInfo<'a>>,
    frustum: Option<Frustum>,
    batcher: InstancingBatcher,
    instance_scratch: Vec<PerDrawData>,
    state: RenderQueueState,
}

impl<'a> RenderQueue<'a> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the draw list for `renderers`, replacing any previous one.
    ///
    /// Runs assembly (with frustum culling per `culling`), instancing, then
    /// sorting per `settings.sort_mode`.
    pub fn prepare<R: Renderer>(
        &mut self,
        culling: &CullingConfig,
        view_projection: &Mat4,
        renderers: &'a [R],
        settings: &RenderSettings<'a>,
    ) -> PrepareStats {
        self.draw_calls.clear();

        let frustum = if culling.enable_frustum_culling {
            if !culling.freeze_frustum_culling {
                self.frustum = Some(Frustum::from_view_projection(view_projection));
            } else if self.frustum.is_none() {
                log::debug!("Frustum culling frozen before any frustum existed, capturing one");
                self.frustum = Some(Frustum::from_view_projection(view_projection));
            }
            self.frustum.as_ref()
        } else {
            None
        };

        let assembly =
            DrawCallAssembler::assemble(renderers, settings, frustum, &mut self.draw_calls);
        let folded = self.batcher.batch(&mut self.draw_calls);
        let sorted = DrawCallSorter::sort(&mut self.draw_calls, settings.sort_mode, view_projection);

        self.state = RenderQueueState::Prepared;
        PrepareStats {
            assembly,
            folded,
            draw_calls: self.draw_calls.len(),
            sorted,
        }
    }

    /// Submits the prepared draw calls.
    ///
    /// For each draw call: make the program current, upload and bind the
    /// transforms, bind the material's textures, apply its stencil state and
    /// draw. A draw whose transforms fail to upload is skipped; a missing
    /// texture is reported and the draw still goes through.
    ///
    /// Drawing an already drawn queue submits the same list again.
    pub fn draw(&mut self, backend: &mut GraphicsBackend, streams: &mut DrawStreams) -> DrawStats {
        let mut stats = DrawStats::default();
        if self.state == RenderQueueState::Empty {
            log::debug!("RenderQueue::draw called before prepare, nothing to submit");
            return stats;
        }
        if self.state == RenderQueueState::Drawn {
            log::debug!(
                "RenderQueue::draw re-submitting {} draw calls",
                self.draw_calls.len()
            );
        }

        for call in &self.draw_calls {
            let material = call.material;
            backend.use_program(&material.shader.program);

            let instanced = call.is_instanced_draw();
            let upload = if instanced {
                self.instance_scratch.clear();
                self.instance_scratch
                    .extend(call.model_matrices.iter().map(PerDrawData::new));
                upload_instances(backend, streams, &self.instance_scratch)
            } else {
                upload_single(backend, streams, &PerDrawData::new(&call.model_matrices[0]))
            };
            if let Err(e) = upload {
                log::error!(
                    "Skipping draw of '{}' with '{}': transform upload failed: {e}",
                    call.geometry.label,
                    material.label
                );
                stats.skipped += 1;
                continue;
            }

            bind_material_textures(backend, material);
            backend.set_stencil_state(&material.stencil);
            backend.set_stencil_value(call.stencil_value);

            let instance_count = if instanced {
                call.model_matrices.len() as u32
            } else {
                1
            };
            backend.draw_geometry(call.geometry, instance_count);

            stats.draw_calls += 1;
            stats.instances += instance_count;
            if instanced {
                stats.instanced_draw_calls += 1;
            }
        }

        self.state = RenderQueueState::Drawn;
        stats
    }

    /// Drops the draw list. The frozen frustum is kept.
    pub fn clear(&mut self) {
        self.draw_calls.clear();
        self.state = RenderQueueState::Empty;
    }

    /// Whether the draw list is empty.
    pub fn is_empty(&self) -> bool {
        self.draw_calls.is_empty()
    }

    /// The prepared draw list, in submission order.
    pub fn draw_calls(&self) -> &[DrawCallInfo<'a>] {
        &self.draw_calls
    }

    /// Current cycle state.
    pub fn state(&self) -> RenderQueueState {
        self.state
    }

    /// The frustum culling last ran against.
    pub fn frustum(&self) -> Option<&Frustum> {
        self.frustum.as_ref()
    }

    /// Ends this borrow cycle and returns an empty queue free to borrow anew.
    ///
    /// The frustum and the batcher's table carry over.
    pub fn recycle<'b>(self) -> RenderQueue<'b> {
        RenderQueue {
            draw_calls: Vec::with_capacity(self.draw_calls.capacity()),
            frustum: self.frustum,
            batcher: self.batcher,
            instance_scratch: self.instance_scratch,
            state: RenderQueueState::Empty,
        }
    }
}

fn upload_single(
    backend: &mut GraphicsBackend,
    streams: &mut DrawStreams,
    data: &PerDrawData,
) -> Result<(), ResourceError> {
    let bytes = bytemuck::bytes_of(data);
    let ring = streams.per_draw();
    let offset = ring.set_data(backend, bytes, 0)?;
    backend.bind_constant_buffer(PER_DRAW_DATA_BINDING, ring.buffer(), offset, bytes.len() as u64);
    Ok(())
}

fn upload_instances(
    backend: &mut GraphicsBackend,
    streams: &mut DrawStreams,
    data: &[PerDrawData],
) -> Result<(), ResourceError> {
    let bytes: &[u8] = bytemuck::cast_slice(data);
    let ring = streams.per_instance();
    let offset = ring.set_data(backend, bytes, 0)?;
    backend.bind_structured_buffer(
        PER_INSTANCE_DATA_BINDING,
        ring.buffer(),
        offset,
        bytes.len() as u64,
    );
    Ok(())
}

fn bind_material_textures(backend: &mut GraphicsBackend, material: &Material) {
    for binding in &material.shader.texture_bindings {
        match material.texture(&binding.name) {
            Some(texture) => backend.bind_texture_sampler(binding.slot, texture.texture, texture.sampler),
            None => {
                let error = RenderError::MissingTexture {
                    material: material.label.clone(),
                    binding: binding.name.clone(),
                };
                log::error!("{error}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_lane::RenderItem;
    use std::sync::Arc;
    use vesta_core::math::{Aabb, FrustumPlanes, Vec3};
    use vesta_core::renderer::*;

    fn material() -> Arc<Material> {
        let shader = Arc::new(Shader {
            label: "lit".to_string(),
            program: Program {
                id: ProgramId(1),
                bindings: BindingMask::EMPTY,
            },
            supports_instancing: true,
            texture_bindings: Vec::new(),
        });
        Arc::new(Material::new("m", shader))
    }

    fn item(x: f32, material: &Arc<Material>) -> RenderItem {
        let geometry = Arc::new(Geometry {
            label: format!("mesh@{x}"),
            id: GeometryId(1),
            topology: PrimitiveTopology::TriangleList,
            element_count: 3,
            index_format: None,
        });
        RenderItem::new(
            geometry,
            material.clone(),
            Mat4::from_translation(Vec3::new(x, 0.0, -10.0)),
            Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5)),
        )
    }

    fn camera(yaw: f32) -> Mat4 {
        let projection = Mat4::perspective_rh_zo(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        projection * Mat4::from_rotation_y(yaw)
    }

    #[test]
    fn prepare_moves_to_prepared_and_clear_resets() {
        let material = material();
        let renderers = vec![item(0.0, &material), item(1.0, &material)];
        let mut queue = RenderQueue::new();
        assert_eq!(queue.state(), RenderQueueState::Empty);

        let stats = queue.prepare(
            &CullingConfig::default(),
            &camera(0.0),
            &renderers,
            &RenderSettings::default(),
        );
        assert_eq!(queue.state(), RenderQueueState::Prepared);
        assert_eq!(stats.draw_calls, 2);
        assert!(!stats.sorted);

        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.state(), RenderQueueState::Empty);
    }

    #[test]
    fn disabled_culling_keeps_everything() {
        let material = material();
        let renderers = vec![item(0.0, &material), item(1000.0, &material)];
        let culling = CullingConfig {
            enable_frustum_culling: false,
            ..Default::default()
        };
        let mut queue = RenderQueue::new();
        let stats = queue.prepare(&culling, &camera(0.0), &renderers, &RenderSettings::default());
        assert_eq!(stats.assembly.culled, 0);
        assert_eq!(queue.draw_calls().len(), 2);
        assert!(queue.frustum().is_none());
    }

    #[test]
    fn frozen_frustum_ignores_camera_motion() {
        let material = material();
        let renderers = vec![item(0.0, &material)];
        let settings = RenderSettings::default();
        let mut queue = RenderQueue::new();

        let live = CullingConfig::default();
        queue.prepare(&live, &camera(0.0), &renderers, &settings);
        assert_eq!(queue.draw_calls().len(), 1);

        let frozen = CullingConfig {
            freeze_frustum_culling: true,
            ..live
        };
        // Turned away from the object: a live frustum would cull it.
        let turned = camera(std::f32::consts::PI);
        queue.prepare(&frozen, &turned, &renderers, &settings);
        assert_eq!(queue.draw_calls().len(), 1);

        queue.prepare(&live, &turned, &renderers, &settings);
        assert!(queue.is_empty());
    }

    #[test]
    fn freezing_first_captures_a_frustum() {
        let material = material();
        let renderers = vec![item(0.0, &material)];
        let frozen = CullingConfig {
            freeze_frustum_culling: true,
            ..Default::default()
        };
        let mut queue = RenderQueue::new();
        queue.prepare(
            &frozen,
            &camera(0.0),
            &renderers,
            &RenderSettings::default().with_culling_planes(FrustumPlanes::SIDES),
        );
        assert!(queue.frustum().is_some());
    }

    #[test]
    fn recycle_keeps_the_frustum() {
        let material = material();
        let renderers = vec![item(0.0, &material)];
        let mut queue = RenderQueue::new();
        queue.prepare(
            &CullingConfig::default(),
            &camera(0.0),
            &renderers,
            &RenderSettings::default(),
        );
        let frustum = queue.frustum().copied();
        assert!(frustum.is_some());

        let recycled: RenderQueue<'static> = queue.recycle();
        assert_eq!(recycled.frustum().copied(), frustum);
        assert_eq!(recycled.state(), RenderQueueState::Empty);
        assert!(recycled.is_empty());
    }
}
