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

//! A synthetic scene: a grid of instanced crates, scattered rocks and glass panes.

use anyhow::{Context, Result};
use std::sync::Arc;
use vesta_core::math::{Aabb, Mat4, Vec3, FRAC_PI_4};
use vesta_core::renderer::*;
use vesta_lanes::RenderItem;

const CRATE_SPACING: f32 = 3.0;
const ROCK_COUNT: usize = 12;
const PANE_COUNT: usize = 6;

const LIT_VERTEX_SOURCE: &str = "
@group(0) @binding(1) var<uniform> per_draw: PerDrawData;
@group(0) @binding(2) var<storage, read> per_instance: array<PerDrawData>;
";
const LIT_FRAGMENT_SOURCE: &str = "
@group(1) @binding(3) var albedo: texture_2d<f32>;
";

pub struct Scene {
    crate_geometry: Arc<Geometry>,
    rock_geometries: Vec<Arc<Geometry>>,
    pane_geometry: Arc<Geometry>,
    lit_shader: Arc<Shader>,
    brick: Arc<Material>,
    glass: Arc<Material>,
    depth_only: Material,
    brick_texture: TextureId,
    sampler: SamplerId,
    grid_size: u32,
}

impl Scene {
    pub fn build(backend: &mut GraphicsBackend, grid_size: u32) -> Result<Self> {
        let vs = backend
            .compile_shader(&ShaderDescriptor {
                label: Some("lit.vs".into()),
                stage: ShaderStage::Vertex,
                source: LIT_VERTEX_SOURCE.into(),
            })
            .context("Failed to compile the lit vertex shader")?;
        let fs = backend
            .compile_shader(&ShaderDescriptor {
                label: Some("lit.fs".into()),
                stage: ShaderStage::Fragment,
                source: LIT_FRAGMENT_SOURCE.into(),
            })
            .context("Failed to compile the lit fragment shader")?;
        let program = backend
            .create_program(&ProgramDescriptor {
                label: Some("lit".into()),
                shaders: &[vs, fs],
            })
            .context("Failed to link the lit program")?;
        // The program keeps what it needs once linked.
        backend.delete_shader(vs);
        backend.delete_shader(fs);

        let lit_shader = Arc::new(Shader {
            label: "lit".to_string(),
            program,
            supports_instancing: true,
            texture_bindings: vec![TextureBinding {
                name: "albedo".to_string(),
                slot: 3,
            }],
        });
        let depth_shader = Arc::new(Shader {
            label: "depth".to_string(),
            program,
            supports_instancing: true,
            texture_bindings: Vec::new(),
        });

        let sampler = backend
            .create_sampler(&SamplerDescriptor::default())
            .context("Failed to create the default sampler")?;
        let brick_texture = create_texture(backend, "brick")?;
        let glass_texture = create_texture(backend, "glass")?;

        let brick = Arc::new(
            Material::new("brick", lit_shader.clone()).with_texture("albedo", brick_texture, sampler),
        );
        let glass = Arc::new(
            Material::new("glass", lit_shader.clone())
                .with_texture("albedo", glass_texture, sampler)
                .with_render_queue(TRANSPARENT_RENDER_QUEUE)
                .with_stencil(StencilState::write_reference()),
        );
        let depth_only = Material::new("depth_only", depth_shader);

        let crate_geometry = create_geometry(backend, "crate", 36, Some(IndexFormat::Uint16))?;
        let pane_geometry = create_geometry(backend, "pane", 4, None)?;
        let rock_geometries = (0..ROCK_COUNT)
            .map(|i| create_geometry(backend, &format!("rock{i}"), 240, Some(IndexFormat::Uint32)))
            .collect::<Result<Vec<_>>>()?;

        log::info!(
            "Scene built: {} crates, {} rocks, {} panes",
            grid_size * grid_size,
            ROCK_COUNT,
            PANE_COUNT
        );

        Ok(Self {
            crate_geometry,
            rock_geometries,
            pane_geometry,
            lit_shader,
            brick,
            glass,
            depth_only,
            brick_texture,
            sampler,
            grid_size,
        })
    }

    /// Material for the shadow pass.
    pub fn depth_only(&self) -> &Material {
        &self.depth_only
    }

    /// Swaps the brick texture for a fresh one, retiring the old one.
    pub fn reload_brick_texture(&mut self, backend: &mut GraphicsBackend) -> Result<()> {
        let texture = create_texture(backend, "brick")?;
        backend.delete_texture(self.brick_texture);
        log::info!(
            "Brick texture reloaded: {:?} -> {:?} ({} deletions pending)",
            self.brick_texture,
            texture,
            backend.pending_deletions()
        );
        self.brick_texture = texture;
        self.brick = Arc::new(
            Material::new("brick", self.lit_shader.clone()).with_texture("albedo", texture, self.sampler),
        );
        Ok(())
    }

    /// Renderers at time `t` seconds.
    pub fn renderers(&self, t: f32) -> Vec<RenderItem> {
        let unit = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5));
        let half = (self.grid_size as f32 - 1.0) * CRATE_SPACING * 0.5;
        let mut items = Vec::with_capacity((self.grid_size * self.grid_size) as usize + ROCK_COUNT + PANE_COUNT);

        for row in 0..self.grid_size {
            for col in 0..self.grid_size {
                let position = Vec3::new(
                    col as f32 * CRATE_SPACING - half,
                    0.0,
                    row as f32 * CRATE_SPACING - half,
                );
                let model = Mat4::from_translation(position) * Mat4::from_rotation_y(t + row as f32);
                items.push(RenderItem::new(self.crate_geometry.clone(), self.brick.clone(), model, unit));
            }
        }

        for (i, rock) in self.rock_geometries.iter().enumerate() {
            let angle = i as f32 / ROCK_COUNT as f32 * std::f32::consts::TAU;
            let position = Vec3::new(angle.cos(), 0.0, angle.sin()) * (half + 6.0);
            let model = Mat4::from_translation(position) * Mat4::from_scale(Vec3::splat(2.0));
            items.push(RenderItem::new(rock.clone(), self.brick.clone(), model, unit));
        }

        for i in 0..PANE_COUNT {
            let position = Vec3::new(i as f32 * 4.0 - 10.0, 2.0, 0.0);
            let model = Mat4::from_translation(position) * Mat4::from_rotation_y(FRAC_PI_4);
            items.push(
                RenderItem::new(self.pane_geometry.clone(), self.glass.clone(), model, unit)
                    .with_cast_shadows(false)
                    .with_stencil_value(1),
            );
        }

        items
    }
}

/// An orbiting camera at time `t` seconds.
pub fn camera(t: f32, aspect_ratio: f32) -> Mat4 {
    let eye = Vec3::new((t * 0.5).sin() * 40.0, 12.0, (t * 0.5).cos() * 40.0);
    let projection = Mat4::perspective_rh_zo(FRAC_PI_4, aspect_ratio, 0.1, 200.0);
    let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y).unwrap_or(Mat4::IDENTITY);
    projection * view
}

fn create_texture(backend: &mut GraphicsBackend, label: &str) -> Result<TextureId> {
    backend
        .create_texture(&TextureDescriptor {
            label: Some(label.into()),
            width: 256,
            height: 256,
            mip_level_count: 1,
        })
        .with_context(|| format!("Failed to create texture '{label}'"))
}

fn create_geometry(
    backend: &mut GraphicsBackend,
    label: &str,
    element_count: u32,
    index_format: Option<IndexFormat>,
) -> Result<Arc<Geometry>> {
    let vertex_buffer = backend
        .create_buffer(&BufferDescriptor {
            label: Some(format!("{label}.vertices").into()),
            size: element_count as u64 * 32,
            usage: BufferUsage::VERTEX,
        })
        .with_context(|| format!("Failed to create the vertex buffer of '{label}'"))?;
    let index_buffer = match index_format {
        Some(format) => Some((
            backend
                .create_buffer(&BufferDescriptor {
                    label: Some(format!("{label}.indices").into()),
                    size: element_count as u64 * format.size(),
                    usage: BufferUsage::INDEX,
                })
                .with_context(|| format!("Failed to create the index buffer of '{label}'"))?,
            format,
        )),
        None => None,
    };
    let id = backend
        .create_geometry(&GeometryDescriptor {
            label: Some(label.into()),
            vertex_buffer,
            vertex_stride: 32,
            index_buffer,
        })
        .with_context(|| format!("Failed to create geometry '{label}'"))?;

    Ok(Arc::new(Geometry {
        label: label.to_string(),
        id,
        topology: PrimitiveTopology::TriangleList,
        element_count,
        index_format,
    }))
}
