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

use super::device::{lock, HeadlessState};
use super::DeviceAction;
use conduit_core::renderer::*;
use std::any::Any;
use std::sync::Arc;

/// The submission context handed out by [`HeadlessDevice::begin_frame`].
///
/// Calls are journaled as they happen. Clears of color attachments are applied
/// to the in-memory pixels of the bound target, so read-backs observe them.
///
/// [`HeadlessDevice::begin_frame`]: super::HeadlessDevice
#[derive(Debug)]
pub struct HeadlessEncoder {
    state: Arc<HeadlessState>,
    target: Option<FrameBufferId>,
    commands: usize,
    finished: bool,
}

impl HeadlessEncoder {
    pub(super) fn new(state: Arc<HeadlessState>) -> Self {
        Self {
            state,
            target: None,
            commands: 0,
            finished: false,
        }
    }

    /// Number of calls recorded so far.
    pub fn command_count(&self) -> usize {
        self.commands
    }

    /// Seals the encoder and returns its call count.
    pub(super) fn finish(&mut self) -> usize {
        self.finished = true;
        self.commands
    }

    fn record(&mut self, action: DeviceAction) {
        if self.finished {
            log::warn!("HeadlessEncoder: {action:?} recorded after submission, ignored.");
            return;
        }
        self.commands += 1;
        self.state.journal.record(action);
    }

    fn clear_color(&self, color: [f32; 4]) {
        let rgba = color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        let result = match self.target {
            None => lock(&self.state.back_buffer).map(|mut back_buffer| {
                for pixel in back_buffer.pixels.chunks_exact_mut(4) {
                    pixel.copy_from_slice(&rgba);
                }
            }),
            Some(id) => {
                let color = lock(&self.state.frame_buffers)
                    .map(|fbs| fbs.get(&id).and_then(|fb| fb.color));
                match color {
                    Ok(Some(texture)) => lock(&self.state.textures).map(|mut textures| {
                        if let Some(entry) = textures.get_mut(&texture) {
                            entry.fill(rgba);
                        }
                    }),
                    Ok(None) => Ok(()),
                    Err(e) => Err(e),
                }
            }
        };
        if let Err(e) = result {
            log::error!("HeadlessEncoder: failed to apply clear: {e}");
        }
    }

    fn copy_texture(&self, source: TextureId, destination: TextureId) {
        let Ok(mut textures) = lock(&self.state.textures) else {
            log::error!("HeadlessEncoder: texture table poisoned, blit skipped.");
            return;
        };
        let Some(levels) = textures.get(&source).map(|src| {
            (src.width, src.height, src.format, src.levels.clone())
        }) else {
            log::warn!("HeadlessEncoder: blit source {source:?} not found.");
            return;
        };
        match textures.get_mut(&destination) {
            Some(dst) if (dst.width, dst.height, dst.format) == (levels.0, levels.1, levels.2) => {
                let count = dst.levels.len().min(levels.3.len());
                dst.levels[..count].clone_from_slice(&levels.3[..count]);
            }
            Some(_) => log::warn!(
                "HeadlessEncoder: blit {source:?} -> {destination:?} between mismatched textures skipped."
            ),
            None => log::warn!("HeadlessEncoder: blit destination {destination:?} not found."),
        }
    }
}

impl Encoder for HeadlessEncoder {
    fn bind_framebuffer(&mut self, target: Option<FrameBufferId>) {
        self.target = target;
        self.record(DeviceAction::BindFrameBuffer(target));
    }

    fn set_viewport(&mut self, rect: Rect) {
        self.record(DeviceAction::SetViewport(rect));
    }

    fn set_scissor(&mut self, rect: Option<Rect>) {
        self.record(DeviceAction::SetScissor(rect));
    }

    fn set_program(&mut self, program: ProgramId) {
        self.record(DeviceAction::BindProgram(program));
    }

    fn bind_vertex_array(
        &mut self,
        vertex_buffers: &[VertexBufferBinding],
        index_buffer: Option<IndexBufferBinding>,
    ) {
        self.record(DeviceAction::BindVertexArray {
            vertex_buffers: vertex_buffers.iter().map(|b| b.buffer).collect(),
            index_buffer: index_buffer.map(|b| b.buffer),
        });
    }

    fn upload_uniform(&mut self, uniform: UniformId, values: &[f32]) {
        self.record(DeviceAction::UploadUniform {
            uniform,
            values: values.to_vec(),
        });
    }

    fn set_texture(&mut self, uniform: UniformId, texture: Option<TextureId>, sampler: &SamplerState) {
        self.record(DeviceAction::SetTexture {
            uniform,
            texture,
            sampler: *sampler,
        });
    }

    fn set_render_state(&mut self, state: &RenderState) {
        self.record(DeviceAction::SetRenderState(*state));
    }

    fn clear(&mut self, request: &ClearRequest) {
        if request.flags.contains(ClearFlags::COLOR) {
            self.clear_color(request.color);
        }
        self.record(DeviceAction::Clear(*request));
    }

    fn draw(&mut self, call: &DrawCall) {
        let FillMode {
            topology,
            polygon_mode,
        } = call.fill;
        let action = match call.range {
            DrawRange::Vertices { first, count } => DeviceAction::Draw {
                topology,
                polygon_mode,
                first,
                count,
                instances: call.instance_count,
            },
            DrawRange::Indices { first, count } => DeviceAction::DrawIndexed {
                topology,
                polygon_mode,
                first,
                count,
                instances: call.instance_count,
            },
        };
        self.record(action);
    }

    fn blit(&mut self, source: TextureId, destination: TextureId) {
        self.copy_texture(source, destination);
        self.record(DeviceAction::Blit {
            source,
            destination,
        });
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::super::HeadlessDevice;
    use super::*;

    #[test]
    fn clear_fills_the_back_buffer() {
        let device = HeadlessDevice::new(Extent2D::new(2, 1));
        let mut encoder = device.begin_frame().expect("frame");
        encoder.bind_framebuffer(None);
        encoder.clear(&ClearRequest {
            flags: ClearFlags::COLOR | ClearFlags::DEPTH,
            color: [1.0, 0.0, 0.5, 1.0],
            depth: 1.0,
            stencil: 0,
        });
        device.submit(encoder).expect("submit");

        assert_eq!(
            device.read_framebuffer(None),
            Ok(vec![255, 0, 128, 255, 255, 0, 128, 255])
        );
        assert!(device
            .journal()
            .snapshot()
            .contains(&DeviceAction::Submit { commands: 2 }));
    }

    #[test]
    fn draw_range_selects_the_action() {
        let device = HeadlessDevice::new(Extent2D::new(1, 1));
        let mut encoder = device.begin_frame().expect("frame");
        let fill = FillMode::from_code(0)
            .expect("supported")
            .expect("known");
        encoder.draw(&DrawCall {
            fill,
            range: DrawRange::Indices { first: 0, count: 6 },
            instance_count: 1,
        });
        device.submit(encoder).expect("submit");
        assert_eq!(
            device
                .journal()
                .count(|a| matches!(a, DeviceAction::DrawIndexed { count: 6, .. })),
            1
        );
    }
}
