#![allow(dead_code)]

use std::sync::Arc;
use vesta_core::math::{Aabb, Mat4, Vec3};
use vesta_core::renderer::*;
use vesta_infra::{DeviceCommand, HeadlessDevice};
use vesta_lanes::{DrawStreams, RenderItem};

pub struct Fixture {
    pub backend: GraphicsBackend,
    pub streams: DrawStreams,
    pub program: Program,
}

impl Fixture {
    pub fn new() -> Self {
        let mut backend = GraphicsBackend::new(Box::new(HeadlessDevice::new()));
        let streams = DrawStreams::new(&mut backend).expect("draw streams");

        let vs = backend
            .compile_shader(&ShaderDescriptor {
                label: Some("lit.vs".into()),
                stage: ShaderStage::Vertex,
                source: "@binding(1) var<uniform> per_draw; @binding(2) var<storage> per_instance;"
                    .into(),
            })
            .expect("vertex shader");
        let fs = backend
            .compile_shader(&ShaderDescriptor {
                label: Some("lit.fs".into()),
                stage: ShaderStage::Fragment,
                source: "@binding(3) var albedo: texture_2d<f32>;".into(),
            })
            .expect("fragment shader");
        let program = backend
            .create_program(&ProgramDescriptor {
                label: Some("lit".into()),
                shaders: &[vs, fs],
            })
            .expect("program");

        Self {
            backend,
            streams,
            program,
        }
    }

    pub fn shader(&self, supports_instancing: bool, texture_bindings: Vec<TextureBinding>) -> Arc<Shader> {
        Arc::new(Shader {
            label: "lit".to_string(),
            program: self.program,
            supports_instancing,
            texture_bindings,
        })
    }

    pub fn geometry(&mut self, label: &str) -> Arc<Geometry> {
        let vertex_buffer = self
            .backend
            .create_buffer(&BufferDescriptor {
                label: Some(label.into()),
                size: 36 * 12,
                usage: BufferUsage::VERTEX,
            })
            .expect("vertex buffer");
        let id = self
            .backend
            .create_geometry(&GeometryDescriptor {
                label: Some(label.into()),
                vertex_buffer,
                vertex_stride: 12,
                index_buffer: None,
            })
            .expect("geometry");
        Arc::new(Geometry {
            label: label.to_string(),
            id,
            topology: PrimitiveTopology::TriangleList,
            element_count: 36,
            index_format: None,
        })
    }

    pub fn device(&self) -> &HeadlessDevice {
        self.backend
            .device_as::<HeadlessDevice>()
            .expect("headless device")
    }

    pub fn take_commands(&mut self) -> Vec<DeviceCommand> {
        self.backend
            .device_as_mut::<HeadlessDevice>()
            .expect("headless device")
            .take_commands()
    }

    pub fn begin_frame(&mut self) {
        self.backend.init_new_frame();
        self.streams.begin_frame();
    }
}

/// A unit cube centered at `position`.
pub fn item_at(geometry: &Arc<Geometry>, material: &Arc<Material>, position: Vec3) -> RenderItem {
    RenderItem::new(
        geometry.clone(),
        material.clone(),
        Mat4::from_translation(position),
        Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5)),
    )
}

/// Camera at the origin looking down -Z.
pub fn camera() -> Mat4 {
    let projection = Mat4::perspective_rh_zo(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
    let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y).expect("view");
    projection * view
}

/// Instance counts of every recorded draw, in submission order.
pub fn draw_instance_counts(commands: &[DeviceCommand]) -> Vec<u32> {
    commands
        .iter()
        .filter_map(|command| match command {
            DeviceCommand::Draw { instance_count, .. } => Some(*instance_count),
            _ => None,
        })
        .collect()
}
