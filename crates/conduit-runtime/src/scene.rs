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

//! The scene rendered by the runtime: a textured quad drawn into an
//! offscreen target, then onto the back buffer.

use anyhow::{Context, Result};
use conduit_core::renderer::{
    IndexFormat, TextureFormat, VertexAttributeLayout, VertexComponentType,
};
use conduit_core::{Handle, UniformLocation};
use conduit_lanes::Engine;

const VERTEX_SHADER: &str = r#"
    attribute vec2 position;
    uniform vec4 offset;
    void main() { gl_Position = vec4(position + offset.xy, 0.0, 1.0); }
"#;

const FRAGMENT_SHADER: &str = r#"
    precision mediump float;
    uniform vec4 color;
    uniform sampler2D checker;
    void main() { gl_FragColor = color; }
"#;

const CLEAR_COLOR: u32 = 1;
const CLEAR_DEPTH: u32 = 2;
const DEPTH_LESS_EQUAL: u32 = 0x0203;
const FILL_TRIANGLES: u32 = 0;
const SAMPLING_NEAREST: u32 = 1;

#[derive(Debug, Clone, Copy)]
pub struct Scene {
    program: Handle,
    quad: Handle,
    checker: Handle,
    target: Handle,
    offset: UniformLocation,
    color: UniformLocation,
    sampler: UniformLocation,
}

impl Scene {
    /// Creates every resource the scene draws with.
    pub fn load(engine: &mut Engine) -> Result<Self> {
        let program = engine.create_program(VERTEX_SHADER, FRAGMENT_SHADER)?;
        let locations = engine.get_uniforms(program, &["offset", "color", "checker"])?;
        let [Some(offset), Some(color), Some(sampler)] = locations[..] else {
            anyhow::bail!("the scene program does not declare its uniforms");
        };
        let position = engine
            .get_attributes(program, &["position"])?
            .first()
            .copied()
            .flatten()
            .context("the scene program has no position attribute")?;

        let corners: [f32; 8] = [-0.5, -0.5, 0.5, -0.5, 0.5, 0.5, -0.5, 0.5];
        let indices: [u16; 6] = [0, 1, 2, 0, 2, 3];
        let vertex_buffer = engine.create_vertex_buffer(bytemuck::cast_slice(&corners), false)?;
        let index_buffer =
            engine.create_index_buffer(bytemuck::cast_slice(&indices), IndexFormat::Uint16, false)?;
        let quad = engine.create_vertex_array()?;
        engine.record_vertex_buffer(
            quad,
            vertex_buffer,
            VertexAttributeLayout {
                location: position,
                offset: 0,
                stride: 8,
                components: 2,
                component_type: VertexComponentType::Float32,
                normalized: false,
                divisor: 0,
            },
        )?;
        engine.record_index_buffer(quad, index_buffer)?;

        let checker = engine.create_texture()?;
        #[rustfmt::skip]
        let texels: [u8; 16] = [
            255, 255, 255, 255,   0,   0,   0, 255,
              0,   0,   0, 255, 255, 255, 255, 255,
        ];
        engine.load_texture(checker, 2, 2, &texels, true, false)?;

        let width = (engine.render_width() / 2).max(1);
        let height = (engine.render_height() / 2).max(1);
        let color_texture = engine.create_texture()?;
        engine.initialize_texture(
            color_texture,
            width,
            height,
            false,
            TextureFormat::Rgba8Unorm,
            true,
        )?;
        let target = engine.create_frame_buffer(Some(color_texture), width, height, false, true)?;

        log::info!("Scene loaded: {} resource record(s).", engine.resource_count());
        Ok(Self {
            program,
            quad,
            checker,
            target,
            offset,
            color,
            sampler,
        })
    }

    /// Records one frame: the quad into the offscreen target, then onto the back buffer.
    pub fn record(self, engine: &mut Engine, frame: usize) {
        let phase = (frame % 60) as f32 / 60.0;
        let recorder = engine.recorder();

        recorder.set_depth_test(DEPTH_LESS_EQUAL);
        recorder.set_texture_sampling(self.checker, SAMPLING_NEAREST);
        recorder.set_program(self.program);
        recorder.bind_vertex_array(self.quad);
        recorder.set_texture(self.sampler, self.checker);

        recorder.bind_frame_buffer(self.target);
        recorder.clear(CLEAR_COLOR | CLEAR_DEPTH, [0.0, 0.0, 0.0, 1.0], 1.0, 0);
        recorder.set_float4(self.offset, 0.0, 0.0, 0.0, 0.0);
        recorder.set_float4(self.color, 1.0, phase, 0.0, 1.0);
        recorder.draw_indexed(FILL_TRIANGLES, 0, 6);
        recorder.unbind_frame_buffer(self.target);

        recorder.clear(CLEAR_COLOR | CLEAR_DEPTH, [0.1, 0.1, 0.1, 1.0], 1.0, 0);
        recorder.set_float4(self.offset, phase - 0.5, 0.0, 0.0, 0.0);
        recorder.set_float4(self.color, 0.0, 0.5, 1.0, 1.0);
        recorder.draw_indexed(FILL_TRIANGLES, 0, 6);
    }
}
