mod common;

use common::{camera, item_at, Fixture};
use std::sync::Arc;
use vesta_core::math::Vec3;
use vesta_core::renderer::*;
use vesta_infra::DeviceCommand;
use vesta_lanes::*;

#[test]
fn per_draw_ring_grows_mid_frame_and_retires_the_old_buffer() {
    let mut fx = Fixture::new();
    let material = Arc::new(Material::new("lit", fx.shader(false, Vec::new())));
    let cube = fx.geometry("cube");
    let renderers: Vec<_> = (0..70)
        .map(|i| item_at(&cube, &material, Vec3::new(0.0, 0.0, -5.0 - i as f32)))
        .collect();

    fx.begin_frame();
    let old_buffer = fx.streams.per_draw().buffer();
    assert_eq!(fx.streams.per_draw().capacity(), RING_BUFFER_INITIAL_CAPACITY);

    let mut queue = RenderQueue::new();
    queue.prepare(&CullingConfig::default(), &camera(), &renderers, &RenderSettings::default());
    let stats = queue.draw(&mut fx.backend, &mut fx.streams);
    assert_eq!(stats.draw_calls, 70);
    assert_eq!(stats.skipped, 0);

    let ring = fx.streams.per_draw();
    assert_eq!(ring.capacity(), RING_BUFFER_INITIAL_CAPACITY + RING_BUFFER_GROWTH);
    let new_buffer = ring.buffer();
    assert_ne!(new_buffer, old_buffer);

    let copies = fx
        .take_commands()
        .into_iter()
        .filter(|c| matches!(c, DeviceCommand::CopyBuffer { .. }))
        .count();
    assert_eq!(copies, 1);

    // Earlier draws of this frame may still read the old buffer.
    let old = NativeResource::Buffer(old_buffer);
    assert!(fx.backend.is_pending_deletion(old));
    assert!(fx.device().is_alive(old));

    fx.backend.init_new_frame();
    assert!(fx.device().is_alive(old));
    fx.backend.init_new_frame();
    assert!(!fx.device().is_alive(old));
}

#[test]
fn consecutive_frames_write_to_different_buffers() {
    let mut fx = Fixture::new();
    let material = Arc::new(Material::new("lit", fx.shader(false, Vec::new())));
    let cube = fx.geometry("cube");
    let renderers = vec![item_at(&cube, &material, Vec3::new(0.0, 0.0, -10.0))];

    let mut bound = Vec::new();
    let mut queue = RenderQueue::new();
    for _ in 0..MAX_FRAMES_IN_FLIGHT + 1 {
        fx.begin_frame();
        fx.take_commands();
        queue.prepare(&CullingConfig::default(), &camera(), &renderers, &RenderSettings::default());
        queue.draw(&mut fx.backend, &mut fx.streams);
        let buffer = fx
            .take_commands()
            .into_iter()
            .rev()
            .find_map(|c| match c {
                DeviceCommand::BindConstantBuffer {
                    slot: PER_DRAW_DATA_BINDING,
                    buffer,
                    offset,
                    ..
                } => {
                    assert_eq!(offset, 0);
                    Some(buffer)
                }
                _ => None,
            })
            .expect("per-draw binding");
        bound.push(buffer);
    }

    assert_ne!(bound[0], bound[1]);
    assert_eq!(bound[0], bound[MAX_FRAMES_IN_FLIGHT]);
}

#[test]
fn deleted_texture_survives_until_frames_in_flight_retire() {
    let mut fx = Fixture::new();
    let texture = fx
        .backend
        .create_texture(&TextureDescriptor {
            label: Some("albedo".into()),
            width: 16,
            height: 16,
            mip_level_count: 1,
        })
        .expect("texture");
    let sampler = fx
        .backend
        .create_sampler(&SamplerDescriptor::default())
        .expect("sampler");
    let bindings = vec![TextureBinding {
        name: "albedo".to_string(),
        slot: 3,
    }];
    let material = Arc::new(
        Material::new("brick", fx.shader(false, bindings)).with_texture("albedo", texture, sampler),
    );
    let cube = fx.geometry("cube");
    let renderers = vec![item_at(&cube, &material, Vec3::new(0.0, 0.0, -10.0))];

    fx.begin_frame();
    let mut queue = RenderQueue::new();
    queue.prepare(&CullingConfig::default(), &camera(), &renderers, &RenderSettings::default());
    queue.draw(&mut fx.backend, &mut fx.streams);
    assert!(fx.backend.bound_resource(3).is_some());

    fx.backend.delete_texture(texture);
    let handle = NativeResource::Texture(texture);
    assert!(fx.backend.bound_resource(3).is_none());
    assert!(fx.device().is_alive(handle));

    fx.begin_frame();
    assert!(fx.device().is_alive(handle));
    fx.begin_frame();
    assert!(!fx.device().is_alive(handle));
    assert!(fx.device().destroyed().contains(&handle));
}

#[test]
fn destroying_streams_defers_every_ring() {
    let fx = Fixture::new();
    let before = fx.device().live_buffer_count();
    let Fixture {
        mut backend,
        streams,
        ..
    } = fx;

    streams.destroy(&mut backend);
    assert_eq!(backend.pending_deletions(), 2 * MAX_FRAMES_IN_FLIGHT);

    backend.init_new_frame();
    backend.init_new_frame();
    let device = backend
        .device_as::<vesta_infra::HeadlessDevice>()
        .expect("headless device");
    assert_eq!(device.live_buffer_count(), before - 2 * MAX_FRAMES_IN_FLIGHT);
}
