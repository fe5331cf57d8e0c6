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

//! Opcode handlers.
//!
//! Every handler reads all of its arguments before validating anything, so a
//! non-fatal failure never leaves the reader in the middle of an entry.

use super::state::{
    apply_cull_state, blend_mode_from_code, depth_test_from_code, NormalizedRect, StencilArgs,
};
use super::{stale, Engine, FrameContext};
use crate::binder::pack_vec4;
use crate::resource::{BufferRecord, ResourceKind};
use conduit_core::renderer::{
    AddressMode, BufferId, BufferKind, ClearFlags, ClearRequest, DrawCall, DrawRange, FillMode,
    IndexBufferBinding, ProtocolError, RenderError, SamplerState, TextureId, UniformId,
    VertexBufferBinding,
};
use conduit_core::Handle;
use conduit_data::{CommandBuffer, CommandReader, Opcode};

type Location = (Handle, u32);

fn read_location(reader: &mut CommandReader<'_>) -> Result<Location, ProtocolError> {
    Ok((reader.handle()?, reader.u32()?))
}

fn read_rect(reader: &mut CommandReader<'_>) -> Result<NormalizedRect, ProtocolError> {
    Ok(NormalizedRect {
        x: reader.f32()?,
        y: reader.f32()?,
        width: reader.f32()?,
        height: reader.f32()?,
    })
}

fn slot_index(slot: u32) -> Result<u16, RenderError> {
    u16::try_from(slot)
        .map_err(|_| RenderError::InvalidOperation(format!("uniform slot {slot} out of range")))
}

fn ints_as_floats(values: &[i32]) -> Vec<f32> {
    values.iter().map(|v| *v as f32).collect()
}

impl Engine {
    /// Executes one sealed buffer to exhaustion.
    ///
    /// Non-fatal errors are logged and collected in the frame report; a
    /// protocol error stops the drain and is returned.
    pub(crate) fn drain_buffer(
        &mut self,
        buffer: &CommandBuffer,
        frame: &mut FrameContext,
    ) -> Result<(), RenderError> {
        let mut reader = buffer.reader();
        while let Some(opcode) = reader.next_opcode()? {
            log::trace!("Dispatching {opcode} at word {}.", reader.position());
            frame.report.commands += 1;
            if let Err(e) = self.dispatch(opcode, &mut reader, frame) {
                if e.is_fatal() {
                    return Err(e);
                }
                log::warn!("{opcode} failed: {e}");
                frame.report.errors.push(e);
            }
        }
        if self.settings.validate_stream_exhaustion {
            reader.finish()?;
        }
        Ok(())
    }

    fn dispatch(
        &mut self,
        opcode: Opcode,
        reader: &mut CommandReader<'_>,
        frame: &mut FrameContext,
    ) -> Result<(), RenderError> {
        match opcode {
            // --- Vertex arrays and buffers ---
            Opcode::DeleteVertexArray => {
                let vertex_array = reader.handle()?;
                self.resources
                    .release(vertex_array, ResourceKind::VertexArray, &self.context)?;
                if self.bound.vertex_array == Some(vertex_array) {
                    self.bound.vertex_array = None;
                }
                Ok(())
            }
            Opcode::BindVertexArray => {
                let vertex_array = reader.handle()?;
                self.resources.vertex_array(vertex_array)?;
                self.bound.vertex_array = Some(vertex_array);
                Ok(())
            }
            Opcode::DeleteIndexBuffer => {
                let buffer = reader.handle()?;
                self.resources
                    .release(buffer, ResourceKind::IndexBuffer, &self.context)
                    .map(|_| ())
            }
            Opcode::DeleteVertexBuffer => {
                let buffer = reader.handle()?;
                self.resources
                    .release(buffer, ResourceKind::VertexBuffer, &self.context)
                    .map(|_| ())
            }

            // --- Programs ---
            Opcode::SetProgram => {
                let program = reader.handle()?;
                let object = self.ready_program(program)?.object;
                if !object.is_current(&self.context) {
                    return Err(stale(program, ResourceKind::Program));
                }
                self.bound.program = Some(program);
                Ok(())
            }
            Opcode::DeleteProgram => {
                let program = reader.handle()?;
                self.resources
                    .release(program, ResourceKind::Program, &self.context)?;
                if self.bound.program == Some(program) {
                    self.bound.program = None;
                }
                Ok(())
            }

            // --- Render state ---
            Opcode::SetState => {
                let culling = reader.bool()?;
                let cull_back_faces = reader.bool()?;
                let z_offset = reader.f32()?;
                let z_offset_units = reader.f32()?;
                let reverse_side = reader.bool()?;
                apply_cull_state(
                    &mut self.bound.render_state,
                    culling,
                    cull_back_faces,
                    z_offset,
                    z_offset_units,
                    reverse_side,
                );
                Ok(())
            }
            Opcode::SetZOffset => {
                self.bound.render_state.depth_bias.factor = reader.f32()?;
                Ok(())
            }
            Opcode::SetZOffsetUnits => {
                self.bound.render_state.depth_bias.units = reader.f32()?;
                Ok(())
            }
            Opcode::SetDepthTest => {
                let code = reader.u32()?;
                self.bound.render_state.depth_test = depth_test_from_code(code)?;
                Ok(())
            }
            Opcode::SetDepthWrite => {
                self.bound.render_state.depth_write = reader.bool()?;
                Ok(())
            }
            Opcode::SetColorWrite => {
                self.bound.render_state.color_write = reader.bool()?;
                Ok(())
            }
            Opcode::SetBlendMode => {
                let code = reader.u32()?;
                self.bound.render_state.blend = blend_mode_from_code(code)?;
                Ok(())
            }
            Opcode::SetStencil => {
                let args = StencilArgs {
                    write_mask: reader.u32()?,
                    fail_op: reader.u32()?,
                    depth_fail_op: reader.u32()?,
                    pass_op: reader.u32()?,
                    function: reader.u32()?,
                    reference: reader.u32()?,
                    read_mask: reader.u32()?,
                    enabled: reader.bool()?,
                };
                self.bound.render_state.stencil = args.to_state()?;
                Ok(())
            }
            Opcode::SetViewPort => {
                self.bound.viewport = Some(read_rect(reader)?);
                self.bound.view_dirty = true;
                Ok(())
            }
            Opcode::SetScissor => {
                let rect = read_rect(reader)?;
                // A zero-sized scissor disables the test.
                self.bound.scissor = (rect.width > 0.0 && rect.height > 0.0).then_some(rect);
                self.bound.view_dirty = true;
                Ok(())
            }

            // --- Uniforms ---
            Opcode::SetMatrix | Opcode::SetMatrices => {
                let (program, slot) = read_location(reader)?;
                let values = reader.f32_array()?;
                self.set_matrix_values(program, slot, values, 16)
            }
            Opcode::SetMatrix3x3 => {
                let (program, slot) = read_location(reader)?;
                let values = reader.f32_array()?;
                self.set_matrix_values(program, slot, values, 9)
            }
            Opcode::SetMatrix2x2 => {
                let (program, slot) = read_location(reader)?;
                let values = reader.f32_array()?;
                self.set_matrix_values(program, slot, values, 4)
            }
            Opcode::SetInt => {
                let (program, slot) = read_location(reader)?;
                let value = reader.i32()?;
                self.set_vector_values(program, slot, &[value as f32], 1)
            }
            Opcode::SetIntArray
            | Opcode::SetIntArray2
            | Opcode::SetIntArray3
            | Opcode::SetIntArray4 => {
                let (program, slot) = read_location(reader)?;
                let values = ints_as_floats(reader.i32_array()?);
                let components = match opcode {
                    Opcode::SetIntArray => 1,
                    Opcode::SetIntArray2 => 2,
                    Opcode::SetIntArray3 => 3,
                    _ => 4,
                };
                self.set_vector_values(program, slot, &values, components)
            }
            Opcode::SetFloat => {
                let (program, slot) = read_location(reader)?;
                let x = reader.f32()?;
                self.set_vector_values(program, slot, &[x], 1)
            }
            Opcode::SetFloat2 => {
                let (program, slot) = read_location(reader)?;
                let values = [reader.f32()?, reader.f32()?];
                self.set_vector_values(program, slot, &values, 2)
            }
            Opcode::SetFloat3 => {
                let (program, slot) = read_location(reader)?;
                let values = [reader.f32()?, reader.f32()?, reader.f32()?];
                self.set_vector_values(program, slot, &values, 3)
            }
            Opcode::SetFloat4 => {
                let (program, slot) = read_location(reader)?;
                let values = [reader.f32()?, reader.f32()?, reader.f32()?, reader.f32()?];
                self.set_vector_values(program, slot, &values, 4)
            }
            Opcode::SetFloatArray
            | Opcode::SetFloatArray2
            | Opcode::SetFloatArray3
            | Opcode::SetFloatArray4 => {
                let (program, slot) = read_location(reader)?;
                let values = reader.f32_array()?;
                let components = match opcode {
                    Opcode::SetFloatArray => 1,
                    Opcode::SetFloatArray2 => 2,
                    Opcode::SetFloatArray3 => 3,
                    _ => 4,
                };
                self.set_vector_values(program, slot, values, components)
            }

            // --- Textures ---
            Opcode::CopyTexture => {
                let source = reader.handle()?;
                let destination = reader.handle()?;
                let source_id = self.current_texture(source)?;
                let destination_id = self.current_texture(destination)?;
                frame.encoder.blit(source_id, destination_id);
                Ok(())
            }
            Opcode::SetTextureSampling => {
                let texture = reader.handle()?;
                let mode = reader.u32()?;
                let record = self.resources.texture_mut(texture)?;
                if record.sampler.apply_sampling_mode(mode) {
                    Ok(())
                } else {
                    Err(RenderError::InvalidOperation(format!(
                        "unknown sampling mode {mode}"
                    )))
                }
            }
            Opcode::SetTextureWrapMode => {
                let texture = reader.handle()?;
                let codes = [reader.u32()?, reader.u32()?, reader.u32()?];
                let [u, v, w] = codes.map(AddressMode::from_code);
                let (Some(u), Some(v), Some(w)) = (u, v, w) else {
                    return Err(RenderError::InvalidOperation(format!(
                        "unknown address mode in {codes:?}"
                    )));
                };
                let sampler = &mut self.resources.texture_mut(texture)?.sampler;
                sampler.address_u = u;
                sampler.address_v = v;
                sampler.address_w = w;
                Ok(())
            }
            Opcode::SetTextureAnisotropicLevel => {
                let texture = reader.handle()?;
                let level = reader.u32()?;
                self.resources.texture_mut(texture)?.sampler.anisotropy = level.max(1);
                Ok(())
            }
            Opcode::SetTexture => {
                let (program, slot) = read_location(reader)?;
                let texture = reader.handle()?;
                self.resources.texture(texture)?;
                let slot = slot_index(slot)?;
                self.ready_program(program)?
                    .binder
                    .bind_texture(slot, Some(texture))
            }
            Opcode::UnsetTexture => {
                let (program, slot) = read_location(reader)?;
                let slot = slot_index(slot)?;
                self.ready_program(program)?.binder.bind_texture(slot, None)
            }
            Opcode::DiscardAllTextures => {
                let unbound: usize = self
                    .resources
                    .programs_mut()
                    .filter_map(|(_, record)| record.data_mut())
                    .map(|data| data.binder.clear_textures())
                    .sum();
                log::trace!("Discarded {unbound} texture binding(s).");
                Ok(())
            }

            // --- Framebuffers ---
            Opcode::DeleteFrameBuffer => {
                let frame_buffer = reader.handle()?;
                if frame_buffer == self.default_frame_buffer {
                    return Err(RenderError::InvalidOperation(
                        "the default framebuffer cannot be deleted".to_string(),
                    ));
                }
                self.resources
                    .release(frame_buffer, ResourceKind::FrameBuffer, &self.context)?;
                if self.bound.frame_buffer == frame_buffer {
                    self.retarget(frame.index, self.default_frame_buffer);
                }
                Ok(())
            }
            Opcode::BindFrameBuffer => {
                let frame_buffer = reader.handle()?;
                self.resources.frame_buffer(frame_buffer)?;
                self.retarget(frame.index, frame_buffer);
                Ok(())
            }
            Opcode::UnbindFrameBuffer => {
                let frame_buffer = reader.handle()?;
                self.resources.frame_buffer(frame_buffer)?;
                if self.bound.frame_buffer == frame_buffer {
                    self.retarget(frame.index, self.default_frame_buffer);
                }
                Ok(())
            }

            // --- Draws ---
            Opcode::DrawIndexed | Opcode::Draw => {
                let fill_mode = reader.u32()?;
                let first = reader.u32()?;
                let count = reader.u32()?;
                let range = if opcode == Opcode::DrawIndexed {
                    DrawRange::Indices { first, count }
                } else {
                    DrawRange::Vertices { first, count }
                };
                self.draw(frame, fill_mode, range, 1)
            }
            Opcode::DrawIndexedInstanced | Opcode::DrawInstanced => {
                let fill_mode = reader.u32()?;
                let first = reader.u32()?;
                let count = reader.u32()?;
                let instances = reader.u32()?;
                let range = if opcode == Opcode::DrawIndexedInstanced {
                    DrawRange::Indices { first, count }
                } else {
                    DrawRange::Vertices { first, count }
                };
                self.draw(frame, fill_mode, range, instances)
            }
            Opcode::Clear => {
                let flags = ClearFlags::from_bits_truncate(reader.u32()?);
                let color = [reader.f32()?, reader.f32()?, reader.f32()?, reader.f32()?];
                let depth = reader.f32()?;
                let stencil = reader.u32()?;
                self.ensure_target(frame);
                frame.encoder.clear(&ClearRequest {
                    flags,
                    color,
                    depth,
                    stencil: (stencil & 0xFF) as u8,
                });
                Ok(())
            }
        }
    }

    fn set_vector_values(
        &mut self,
        program: Handle,
        slot: u32,
        values: &[f32],
        components: usize,
    ) -> Result<(), RenderError> {
        let slot = slot_index(slot)?;
        let (packed, elements) = pack_vec4(values, components);
        self.ready_program(program)?
            .binder
            .set(slot, &packed, elements)
    }

    fn set_matrix_values(
        &mut self,
        program: Handle,
        slot: u32,
        values: &[f32],
        width: usize,
    ) -> Result<(), RenderError> {
        let slot = slot_index(slot)?;
        if values.is_empty() || values.len() % width != 0 {
            return Err(RenderError::InvalidOperation(format!(
                "matrix data of {} float(s) is not a multiple of {width}",
                values.len()
            )));
        }
        self.ready_program(program)?
            .binder
            .set(slot, values, values.len() / width)
    }

    fn current_texture(&self, texture: Handle) -> Result<TextureId, RenderError> {
        self.resources
            .texture(texture)?
            .object
            .and_then(|object| object.current(&self.context))
            .ok_or_else(|| stale(texture, ResourceKind::Texture))
    }

    fn current_buffer(
        &self,
        handle: Handle,
        record: &BufferRecord,
        kind: ResourceKind,
    ) -> Result<BufferId, RenderError> {
        record
            .object
            .current(&self.context)
            .ok_or_else(|| stale(handle, kind))
    }

    fn resolve_vertex_array(
        &self,
        vertex_array: Handle,
    ) -> Result<(Vec<VertexBufferBinding>, Option<IndexBufferBinding>), RenderError> {
        let array = self.resources.vertex_array(vertex_array)?;
        let mut vertex_buffers = Vec::with_capacity(array.vertex_buffers.len());
        for slot in &array.vertex_buffers {
            let record = self.resources.vertex_buffer(slot.buffer)?;
            vertex_buffers.push(VertexBufferBinding {
                buffer: self.current_buffer(slot.buffer, record, ResourceKind::VertexBuffer)?,
                layout: slot.layout,
            });
        }
        let index_buffer = match array.index_buffer {
            Some(slot) => {
                let record = self.resources.index_buffer(slot.buffer)?;
                let BufferKind::Index(format) = record.kind else {
                    return Err(stale(slot.buffer, ResourceKind::IndexBuffer));
                };
                Some(IndexBufferBinding {
                    buffer: self.current_buffer(slot.buffer, record, ResourceKind::IndexBuffer)?,
                    format,
                })
            }
            None => None,
        };
        Ok((vertex_buffers, index_buffer))
    }

    /// Texture bindings of a program; textures that are gone are bound as nothing.
    fn resolve_textures(
        &self,
        program: Handle,
    ) -> Result<Vec<(UniformId, Option<TextureId>, SamplerState)>, RenderError> {
        let data = self
            .resources
            .program(program)?
            .data()
            .ok_or_else(|| stale(program, ResourceKind::Program))?;
        Ok(data
            .binder
            .texture_bindings()
            .map(|(slot, texture)| match self.resources.texture(texture) {
                Ok(record) => (
                    slot.uniform.id,
                    record.object.and_then(|o| o.current(&self.context)),
                    record.sampler,
                ),
                Err(_) => {
                    log::warn!("Texture {texture} bound to '{}' no longer exists.", slot.name);
                    (slot.uniform.id, None, SamplerState::default())
                }
            })
            .collect())
    }

    fn draw(
        &mut self,
        frame: &mut FrameContext,
        fill_mode: u32,
        range: DrawRange,
        instance_count: u32,
    ) -> Result<(), RenderError> {
        let fill = match FillMode::from_code(fill_mode) {
            Ok(Some(fill)) => fill,
            Ok(None) => {
                return Err(RenderError::InvalidOperation(format!(
                    "unknown fill mode {fill_mode}"
                )))
            }
            Err(unsupported) => return Err(RenderError::Unsupported(unsupported)),
        };
        let program = self
            .bound
            .program
            .ok_or_else(|| RenderError::InvalidOperation("draw without a program".to_string()))?;
        let vertex_array = self.bound.vertex_array.ok_or_else(|| {
            RenderError::InvalidOperation("draw without a vertex array".to_string())
        })?;

        // Resolve everything first so a failed draw emits nothing.
        self.resolve_program(program)?;
        let (vertex_buffers, index_buffer) = self.resolve_vertex_array(vertex_array)?;
        if matches!(range, DrawRange::Indices { .. }) && index_buffer.is_none() {
            return Err(RenderError::InvalidOperation(format!(
                "indexed draw with vertex array {vertex_array} that has no index buffer"
            )));
        }
        let textures = self.resolve_textures(program)?;
        let program_id = self
            .resources
            .program(program)?
            .data()
            .and_then(|data| data.object.current(&self.context))
            .ok_or_else(|| stale(program, ResourceKind::Program))?;

        self.ensure_target(frame);

        let data = self
            .resources
            .program(program)?
            .data()
            .ok_or_else(|| stale(program, ResourceKind::Program))?;
        let encoder = frame.encoder.as_mut();
        encoder.set_program(program_id);
        encoder.bind_vertex_array(&vertex_buffers, index_buffer);
        frame.report.uniform_uploads += data.binder.flush(encoder);
        for (uniform, texture, sampler) in &textures {
            encoder.set_texture(*uniform, *texture, sampler);
        }
        encoder.set_render_state(&self.bound.render_state);
        encoder.draw(&DrawCall {
            fill,
            range,
            instance_count,
        });
        frame.report.draw_calls += 1;
        Ok(())
    }
}
