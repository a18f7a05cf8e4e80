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

//! Sandbox: runs the render queue over a synthetic scene on the headless device
//! and reports what it submitted.

mod config;
mod scene;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Args, SandboxConfig};
use scene::Scene;
use vesta_core::renderer::GraphicsBackend;
use vesta_infra::HeadlessDevice;
use vesta_lanes::{DrawCallFilter, DrawCallSortMode, DrawStats, DrawStreams, RenderQueue, RenderSettings};

const ASPECT_RATIO: f32 = 16.0 / 9.0;
const REPORT_INTERVAL: u64 = 30;

fn accumulate(total: &mut DrawStats, frame: DrawStats) {
    total.draw_calls += frame.draw_calls;
    total.instanced_draw_calls += frame.instanced_draw_calls;
    total.instances += frame.instances;
    total.skipped += frame.skipped;
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = SandboxConfig::resolve(&args)?;
    log::info!("Sandbox configuration: {config:?}");

    let mut backend = GraphicsBackend::new(Box::new(HeadlessDevice::new()));
    let mut streams = DrawStreams::new(&mut backend).context("Failed to create draw streams")?;
    let mut scene = Scene::build(&mut backend, config.grid_size)?;

    let mut shadow_queue: RenderQueue<'static> = RenderQueue::new();
    let mut opaque_queue: RenderQueue<'static> = RenderQueue::new();
    let mut transparent_queue: RenderQueue<'static> = RenderQueue::new();
    let mut totals = DrawStats::default();

    for frame in 0..config.frames {
        backend.init_new_frame();
        streams.begin_frame();

        if frame == config.frames / 2 {
            scene.reload_brick_texture(&mut backend)?;
        }

        let time = frame as f32 / 60.0;
        let view_projection = scene::camera(time, ASPECT_RATIO);
        let renderers = scene.renderers(time);

        // Shadow casters, drawn with the depth-only material.
        let shadow_settings = RenderSettings::default()
            .with_filter(DrawCallFilter::shadow_casters())
            .with_override_material(scene.depth_only());
        let mut shadows = shadow_queue.recycle();
        shadows.prepare(&config.culling, &view_projection, &renderers, &shadow_settings);
        let shadow_stats = shadows.draw(&mut backend, &mut streams);

        let opaque_settings = RenderSettings::default()
            .with_filter(DrawCallFilter::opaque())
            .with_sort_mode(config.sort_mode);
        let mut opaque = opaque_queue.recycle();
        let prepared = opaque.prepare(&config.culling, &view_projection, &renderers, &opaque_settings);
        let opaque_stats = opaque.draw(&mut backend, &mut streams);

        let transparent_settings = RenderSettings::default()
            .with_filter(DrawCallFilter::transparent())
            .with_sort_mode(DrawCallSortMode::BackToFront);
        let mut transparent = transparent_queue.recycle();
        transparent.prepare(&config.culling, &view_projection, &renderers, &transparent_settings);
        let transparent_stats = transparent.draw(&mut backend, &mut streams);

        let mut frame_stats = DrawStats::default();
        for pass in [shadow_stats, opaque_stats, transparent_stats] {
            accumulate(&mut frame_stats, pass);
        }
        accumulate(&mut totals, frame_stats);

        if frame % REPORT_INTERVAL == 0 {
            log::info!(
                "Frame {}: {} draws ({} instanced, {} objects), opaque pass culled {} of {} renderers",
                backend.frame_number(),
                backend.draw_call_count(),
                frame_stats.instanced_draw_calls,
                frame_stats.instances,
                prepared.assembly.culled,
                prepared.assembly.visited
            );
        }
        if frame_stats.skipped > 0 {
            log::warn!("Frame {frame}: {} draws skipped", frame_stats.skipped);
        }

        shadow_queue = shadows.recycle();
        opaque_queue = opaque.recycle();
        transparent_queue = transparent.recycle();
    }

    streams.destroy(&mut backend);
    log::info!(
        "Done: {} frames, {} draws ({} instanced), {} objects, {} skipped, {} deletions pending",
        config.frames,
        totals.draw_calls,
        totals.instanced_draw_calls,
        totals.instances,
        totals.skipped,
        backend.pending_deletions()
    );
    if let Some(device) = backend.device_as::<HeadlessDevice>() {
        log::debug!(
            "Headless device: {} buffers alive, {} resources destroyed",
            device.live_buffer_count(),
            device.destroyed().len()
        );
    }

    Ok(())
}
