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

//! Shared fixtures for the engine integration tests.

#![allow(dead_code)]

use conduit_core::renderer::{
    Extent2D, IndexFormat, VertexAttributeLayout, VertexComponentType,
};
use conduit_core::{DeviceConfiguration, DeviceContext, EngineSettings, Handle, UniformLocation};
use conduit_infra::{DeviceAction, DeviceJournal, GlslReflector, HeadlessDevice};
use conduit_lanes::Engine;
use std::sync::Arc;

pub const BACK_BUFFER: Extent2D = Extent2D {
    width: 8,
    height: 8,
};

pub const VERTEX_SHADER: &str = r#"
    attribute vec3 position;
    uniform mat4 world;
    void main() { gl_Position = world * vec4(position, 1.0); }
"#;

pub const FRAGMENT_SHADER: &str = r#"
    precision mediump float;
    uniform vec4 color;
    uniform vec4 bones[2];
    uniform sampler2D diffuse;
    void main() { gl_FragColor = color; }
"#;

/// An engine rendering into a headless device, plus a view of the device's log.
pub struct Harness {
    pub engine: Engine,
    pub device: Arc<HeadlessDevice>,
    pub journal: DeviceJournal,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(EngineSettings::default())
    }

    pub fn with_settings(settings: EngineSettings) -> Self {
        let device = Arc::new(HeadlessDevice::new(BACK_BUFFER));
        let journal = device.journal();
        let context = Arc::new(DeviceContext::new(DeviceConfiguration {
            device: device.clone(),
            device_pixel_ratio: 1.0,
        }));
        let engine = Engine::new(context, Arc::new(GlslReflector::new()), settings)
            .expect("engine creation should succeed");
        Self {
            engine,
            device,
            journal,
        }
    }

    /// Swaps in a fresh device that logs into the same journal.
    pub fn recreate_device(&mut self) -> Arc<HeadlessDevice> {
        let device = Arc::new(HeadlessDevice::with_journal(BACK_BUFFER, self.journal.clone()));
        self.engine.device_context().recreate(device.clone());
        self.device = device.clone();
        device
    }

    /// Creates the test program and returns it with its `world`, `color`,
    /// `bones` and `diffuse` locations.
    pub fn program(&mut self) -> (Handle, [UniformLocation; 4]) {
        let program = self
            .engine
            .create_program(VERTEX_SHADER, FRAGMENT_SHADER)
            .expect("program should compile");
        let locations = self
            .engine
            .get_uniforms(program, &["world", "color", "bones", "diffuse"])
            .expect("program should be ready");
        let locations: Vec<UniformLocation> = locations
            .into_iter()
            .map(|l| l.expect("every uniform is declared"))
            .collect();
        (
            program,
            [locations[0], locations[1], locations[2], locations[3]],
        )
    }

    /// Creates a two-triangle quad: one vertex buffer and six `u16` indices.
    pub fn quad(&mut self) -> Handle {
        let positions: [f32; 12] = [
            -1.0, -1.0, 0.0, //
            1.0, -1.0, 0.0, //
            1.0, 1.0, 0.0, //
            -1.0, 1.0, 0.0,
        ];
        let indices: [u16; 6] = [0, 1, 2, 0, 2, 3];

        let vertex_buffer = self
            .engine
            .create_vertex_buffer(bytemuck::cast_slice(&positions), false)
            .expect("vertex buffer creation should succeed");
        let index_buffer = self
            .engine
            .create_index_buffer(bytemuck::cast_slice(&indices), IndexFormat::Uint16, false)
            .expect("index buffer creation should succeed");
        let vertex_array = self
            .engine
            .create_vertex_array()
            .expect("vertex array creation should succeed");
        self.engine
            .record_vertex_buffer(vertex_array, vertex_buffer, position_layout())
            .expect("vertex buffer recording should succeed");
        self.engine
            .record_index_buffer(vertex_array, index_buffer)
            .expect("index buffer recording should succeed");
        vertex_array
    }

    /// Encoder-level actions logged since the last call.
    pub fn take_encoder_actions(&self) -> Vec<DeviceAction> {
        self.journal
            .take()
            .into_iter()
            .filter(is_encoder_action)
            .collect()
    }
}

pub fn position_layout() -> VertexAttributeLayout {
    VertexAttributeLayout {
        location: 0,
        offset: 0,
        stride: 12,
        components: 3,
        component_type: VertexComponentType::Float32,
        normalized: false,
        divisor: 0,
    }
}

pub fn is_encoder_action(action: &DeviceAction) -> bool {
    matches!(
        action,
        DeviceAction::BindFrameBuffer(_)
            | DeviceAction::SetViewport(_)
            | DeviceAction::SetScissor(_)
            | DeviceAction::BindProgram(_)
            | DeviceAction::BindVertexArray { .. }
            | DeviceAction::UploadUniform { .. }
            | DeviceAction::SetTexture { .. }
            | DeviceAction::SetRenderState(_)
            | DeviceAction::Clear(_)
            | DeviceAction::Draw { .. }
            | DeviceAction::DrawIndexed { .. }
            | DeviceAction::Blit { .. }
    )
}

/// The values of every upload, in order.
pub fn uploads(actions: &[DeviceAction]) -> Vec<Vec<f32>> {
    actions
        .iter()
        .filter_map(|action| match action {
            DeviceAction::UploadUniform { values, .. } => Some(values.clone()),
            _ => None,
        })
        .collect()
}
