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

use super::{CommandBuffer, CommandWriter, Opcode};
use conduit_core::{Handle, UniformLocation};

/// The single-producer/single-consumer queue of sealed command buffers.
///
/// The render side owns the queue; the producer side owns the matching
/// [`CommandRecorder`], which may live on another thread.
#[derive(Debug)]
pub struct CommandQueue {
    sender: flume::Sender<CommandBuffer>,
    receiver: flume::Receiver<CommandBuffer>,
}

impl CommandQueue {
    /// Creates an empty, unbounded queue.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::debug!("Command queue initialized.");
        Self { sender, receiver }
    }

    /// Creates a recorder that submits into this queue.
    pub fn recorder(&self) -> CommandRecorder {
        CommandRecorder {
            writer: CommandWriter::with_capacity(256),
            sender: self.sender.clone(),
        }
    }

    /// Pops the oldest sealed buffer, if any.
    pub fn try_next(&self) -> Option<CommandBuffer> {
        self.receiver.try_recv().ok()
    }

    /// Number of sealed buffers waiting to be drained.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Drops every queued buffer and returns how many were dropped.
    pub fn discard(&self) -> usize {
        self.receiver.try_iter().count()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Records drawing instructions into the command stream.
///
/// Calls only append to the current buffer. Nothing is visible to the render
/// side until [`submit`](Self::submit) seals the buffer and queues it.
#[derive(Debug)]
pub struct CommandRecorder {
    writer: CommandWriter,
    sender: flume::Sender<CommandBuffer>,
}

impl CommandRecorder {
    /// Seals everything recorded since the last submission and queues it.
    ///
    /// Returns `false` if nothing was recorded or the render side is gone.
    pub fn submit(&mut self) -> bool {
        if self.writer.is_empty() {
            return false;
        }
        let buffer = self.writer.seal();
        let commands = buffer.command_count();
        match self.sender.send(buffer) {
            Ok(()) => {
                log::trace!("Submitted a command buffer with {commands} command(s).");
                true
            }
            Err(e) => {
                log::error!("Failed to submit command buffer: {e}. Queue likely dropped.");
                false
            }
        }
    }

    /// Drops everything recorded since the last submission.
    pub fn discard(&mut self) {
        self.writer.seal();
    }

    /// Number of commands recorded since the last submission.
    pub fn pending_commands(&self) -> usize {
        self.writer.command_count()
    }

    /// Gives raw access to the current buffer.
    pub fn writer(&mut self) -> &mut CommandWriter {
        &mut self.writer
    }

    fn with_handle(&mut self, opcode: Opcode, handle: Handle) {
        self.writer.begin(opcode).handle(handle);
    }

    fn uniform(&mut self, opcode: Opcode, location: UniformLocation) -> &mut CommandWriter {
        self.writer
            .begin(opcode)
            .handle(location.program)
            .u32(location.slot as u32)
    }

    // --- Vertex arrays & buffers ---

    /// Deletes a vertex array.
    pub fn delete_vertex_array(&mut self, vertex_array: Handle) {
        self.with_handle(Opcode::DeleteVertexArray, vertex_array);
    }

    /// Binds a vertex array for subsequent draws.
    pub fn bind_vertex_array(&mut self, vertex_array: Handle) {
        self.with_handle(Opcode::BindVertexArray, vertex_array);
    }

    /// Deletes an index buffer.
    pub fn delete_index_buffer(&mut self, buffer: Handle) {
        self.with_handle(Opcode::DeleteIndexBuffer, buffer);
    }

    /// Deletes a vertex buffer.
    pub fn delete_vertex_buffer(&mut self, buffer: Handle) {
        self.with_handle(Opcode::DeleteVertexBuffer, buffer);
    }

    // --- Programs ---

    /// Makes `program` the active program.
    pub fn set_program(&mut self, program: Handle) {
        self.with_handle(Opcode::SetProgram, program);
    }

    /// Deletes a program.
    pub fn delete_program(&mut self, program: Handle) {
        self.with_handle(Opcode::DeleteProgram, program);
    }

    // --- Render state ---

    /// Sets culling, depth bias and winding in one call.
    pub fn set_state(
        &mut self,
        culling: bool,
        cull_back_faces: bool,
        z_offset: f32,
        z_offset_units: f32,
        reverse_side: bool,
    ) {
        self.writer
            .begin(Opcode::SetState)
            .bool(culling)
            .bool(cull_back_faces)
            .f32(z_offset)
            .f32(z_offset_units)
            .bool(reverse_side);
    }

    /// Sets the slope-scaled depth bias.
    pub fn set_z_offset(&mut self, z_offset: f32) {
        self.writer.begin(Opcode::SetZOffset).f32(z_offset);
    }

    /// Sets the constant depth bias.
    pub fn set_z_offset_units(&mut self, units: f32) {
        self.writer.begin(Opcode::SetZOffsetUnits).f32(units);
    }

    /// Sets the depth function from a GL code; `0` disables the depth test.
    pub fn set_depth_test(&mut self, function: u32) {
        self.writer.begin(Opcode::SetDepthTest).u32(function);
    }

    /// Enables or disables depth writes.
    pub fn set_depth_write(&mut self, enabled: bool) {
        self.writer.begin(Opcode::SetDepthWrite).bool(enabled);
    }

    /// Enables or disables color writes.
    pub fn set_color_write(&mut self, enabled: bool) {
        self.writer.begin(Opcode::SetColorWrite).bool(enabled);
    }

    /// Sets the alpha blend mode.
    pub fn set_blend_mode(&mut self, mode: u32) {
        self.writer.begin(Opcode::SetBlendMode).u32(mode);
    }

    /// Configures the stencil test. Operations and function are GL codes.
    #[allow(clippy::too_many_arguments)]
    pub fn set_stencil(
        &mut self,
        write_mask: u32,
        fail_op: u32,
        depth_fail_op: u32,
        pass_op: u32,
        function: u32,
        reference: u32,
        read_mask: u32,
        enabled: bool,
    ) {
        self.writer
            .begin(Opcode::SetStencil)
            .u32(write_mask)
            .u32(fail_op)
            .u32(depth_fail_op)
            .u32(pass_op)
            .u32(function)
            .u32(reference)
            .u32(read_mask)
            .bool(enabled);
    }

    /// Sets the viewport in normalized coordinates of the bound target.
    pub fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.writer
            .begin(Opcode::SetViewPort)
            .f32(x)
            .f32(y)
            .f32(width)
            .f32(height);
    }

    /// Sets the scissor in normalized coordinates of the bound target.
    pub fn set_scissor(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.writer
            .begin(Opcode::SetScissor)
            .f32(x)
            .f32(y)
            .f32(width)
            .f32(height);
    }

    // --- Uniforms ---

    /// Sets an `int` uniform.
    pub fn set_int(&mut self, location: UniformLocation, value: i32) {
        self.uniform(Opcode::SetInt, location).i32(value);
    }

    /// Sets an `int[]` uniform.
    pub fn set_int_array(&mut self, location: UniformLocation, values: &[i32]) {
        self.uniform(Opcode::SetIntArray, location).i32_array(values);
    }

    /// Sets an `ivec2[]` uniform from flat values.
    pub fn set_int_array2(&mut self, location: UniformLocation, values: &[i32]) {
        self.uniform(Opcode::SetIntArray2, location).i32_array(values);
    }

    /// Sets an `ivec3[]` uniform from flat values.
    pub fn set_int_array3(&mut self, location: UniformLocation, values: &[i32]) {
        self.uniform(Opcode::SetIntArray3, location).i32_array(values);
    }

    /// Sets an `ivec4[]` uniform from flat values.
    pub fn set_int_array4(&mut self, location: UniformLocation, values: &[i32]) {
        self.uniform(Opcode::SetIntArray4, location).i32_array(values);
    }

    /// Sets a `float` uniform.
    pub fn set_float(&mut self, location: UniformLocation, x: f32) {
        self.uniform(Opcode::SetFloat, location).f32(x);
    }

    /// Sets a `vec2` uniform.
    pub fn set_float2(&mut self, location: UniformLocation, x: f32, y: f32) {
        self.uniform(Opcode::SetFloat2, location).f32(x).f32(y);
    }

    /// Sets a `vec3` uniform.
    pub fn set_float3(&mut self, location: UniformLocation, x: f32, y: f32, z: f32) {
        self.uniform(Opcode::SetFloat3, location)
            .f32(x)
            .f32(y)
            .f32(z);
    }

    /// Sets a `vec4` uniform.
    pub fn set_float4(&mut self, location: UniformLocation, x: f32, y: f32, z: f32, w: f32) {
        self.uniform(Opcode::SetFloat4, location)
            .f32(x)
            .f32(y)
            .f32(z)
            .f32(w);
    }

    /// Sets a `float[]` uniform.
    pub fn set_float_array(&mut self, location: UniformLocation, values: &[f32]) {
        self.uniform(Opcode::SetFloatArray, location).f32_array(values);
    }

    /// Sets a `vec2[]` uniform from flat values.
    pub fn set_float_array2(&mut self, location: UniformLocation, values: &[f32]) {
        self.uniform(Opcode::SetFloatArray2, location).f32_array(values);
    }

    /// Sets a `vec3[]` uniform from flat values.
    pub fn set_float_array3(&mut self, location: UniformLocation, values: &[f32]) {
        self.uniform(Opcode::SetFloatArray3, location).f32_array(values);
    }

    /// Sets a `vec4[]` uniform from flat values.
    pub fn set_float_array4(&mut self, location: UniformLocation, values: &[f32]) {
        self.uniform(Opcode::SetFloatArray4, location).f32_array(values);
    }

    /// Sets a `mat4` uniform.
    pub fn set_matrix(&mut self, location: UniformLocation, matrix: &[f32; 16]) {
        self.uniform(Opcode::SetMatrix, location).f32_array(matrix);
    }

    /// Sets a `mat3` uniform.
    pub fn set_matrix3x3(&mut self, location: UniformLocation, matrix: &[f32; 9]) {
        self.uniform(Opcode::SetMatrix3x3, location).f32_array(matrix);
    }

    /// Sets a `mat2` uniform.
    pub fn set_matrix2x2(&mut self, location: UniformLocation, matrix: &[f32; 4]) {
        self.uniform(Opcode::SetMatrix2x2, location).f32_array(matrix);
    }

    /// Sets a `mat4[]` uniform from consecutive matrices.
    pub fn set_matrices(&mut self, location: UniformLocation, matrices: &[f32]) {
        self.uniform(Opcode::SetMatrices, location).f32_array(matrices);
    }

    // --- Textures ---

    /// Copies the contents of one texture into another.
    pub fn copy_texture(&mut self, source: Handle, destination: Handle) {
        self.writer
            .begin(Opcode::CopyTexture)
            .handle(source)
            .handle(destination);
    }

    /// Sets the filtering of a texture from a sampling mode code.
    pub fn set_texture_sampling(&mut self, texture: Handle, mode: u32) {
        self.writer
            .begin(Opcode::SetTextureSampling)
            .handle(texture)
            .u32(mode);
    }

    /// Sets the address modes of a texture.
    pub fn set_texture_wrap_mode(&mut self, texture: Handle, u: u32, v: u32, w: u32) {
        self.writer
            .begin(Opcode::SetTextureWrapMode)
            .handle(texture)
            .u32(u)
            .u32(v)
            .u32(w);
    }

    /// Sets the maximum anisotropy of a texture.
    pub fn set_texture_anisotropic_level(&mut self, texture: Handle, level: u32) {
        self.writer
            .begin(Opcode::SetTextureAnisotropicLevel)
            .handle(texture)
            .u32(level);
    }

    /// Binds a texture to a sampler uniform.
    pub fn set_texture(&mut self, location: UniformLocation, texture: Handle) {
        self.uniform(Opcode::SetTexture, location).handle(texture);
    }

    /// Unbinds the texture of a sampler uniform.
    pub fn unset_texture(&mut self, location: UniformLocation) {
        self.uniform(Opcode::UnsetTexture, location);
    }

    /// Unbinds every texture of every program.
    pub fn discard_all_textures(&mut self) {
        self.writer.begin(Opcode::DiscardAllTextures);
    }

    // --- Framebuffers ---

    /// Deletes a framebuffer.
    pub fn delete_frame_buffer(&mut self, frame_buffer: Handle) {
        self.with_handle(Opcode::DeleteFrameBuffer, frame_buffer);
    }

    /// Makes `frame_buffer` the target of subsequent clears and draws.
    pub fn bind_frame_buffer(&mut self, frame_buffer: Handle) {
        self.with_handle(Opcode::BindFrameBuffer, frame_buffer);
    }

    /// Returns to the default target if `frame_buffer` is bound.
    pub fn unbind_frame_buffer(&mut self, frame_buffer: Handle) {
        self.with_handle(Opcode::UnbindFrameBuffer, frame_buffer);
    }

    /// Clears attachments of the bound target.
    pub fn clear(&mut self, flags: u32, color: [f32; 4], depth: f32, stencil: u32) {
        self.writer
            .begin(Opcode::Clear)
            .u32(flags)
            .f32(color[0])
            .f32(color[1])
            .f32(color[2])
            .f32(color[3])
            .f32(depth)
            .u32(stencil);
    }

    // --- Draws ---

    /// Draws `count` indices of the bound vertex array.
    pub fn draw_indexed(&mut self, fill_mode: u32, first: u32, count: u32) {
        self.writer
            .begin(Opcode::DrawIndexed)
            .u32(fill_mode)
            .u32(first)
            .u32(count);
    }

    /// Draws `instances` instances of `count` indices.
    pub fn draw_indexed_instanced(&mut self, fill_mode: u32, first: u32, count: u32, instances: u32) {
        self.writer
            .begin(Opcode::DrawIndexedInstanced)
            .u32(fill_mode)
            .u32(first)
            .u32(count)
            .u32(instances);
    }

    /// Draws `count` vertices of the bound vertex array.
    pub fn draw(&mut self, fill_mode: u32, first: u32, count: u32) {
        self.writer
            .begin(Opcode::Draw)
            .u32(fill_mode)
            .u32(first)
            .u32(count);
    }

    /// Draws `instances` instances of `count` vertices.
    pub fn draw_instanced(&mut self, fill_mode: u32, first: u32, count: u32, instances: u32) {
        self.writer
            .begin(Opcode::DrawInstanced)
            .u32(fill_mode)
            .u32(first)
            .u32(count)
            .u32(instances);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn submit_seals_and_queues_in_order() {
        let queue = CommandQueue::new();
        let mut recorder = queue.recorder();

        recorder.set_depth_write(false);
        assert!(recorder.submit());
        recorder.bind_vertex_array(Handle(3));
        recorder.draw(0, 0, 3);
        assert!(recorder.submit());

        assert_eq!(queue.pending(), 2);
        let first = queue.try_next().expect("first buffer");
        let second = queue.try_next().expect("second buffer");
        assert_eq!(first.command_count(), 1);
        assert_eq!(second.command_count(), 2);
        assert!(queue.try_next().is_none());
    }

    #[test]
    fn empty_submit_queues_nothing() {
        let queue = CommandQueue::new();
        let mut recorder = queue.recorder();
        assert!(!recorder.submit());
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn recorder_works_from_another_thread() {
        let queue = CommandQueue::new();
        let mut recorder = queue.recorder();
        thread::spawn(move || {
            recorder.set_color_write(true);
            recorder.submit()
        })
        .join()
        .expect("recorder thread panicked");

        let buffer = queue.try_next().expect("buffer from thread");
        let mut reader = buffer.reader();
        assert_eq!(reader.next_opcode(), Ok(Some(Opcode::SetColorWrite)));
        assert_eq!(reader.bool(), Ok(true));
        assert_eq!(reader.finish(), Ok(()));
    }

    #[test]
    fn uniform_setters_prefix_program_and_slot() {
        let queue = CommandQueue::new();
        let mut recorder = queue.recorder();
        let location = UniformLocation {
            program: Handle(4),
            slot: 2,
        };
        recorder.set_float2(location, 1.0, 2.0);
        recorder.submit();

        let buffer = queue.try_next().expect("buffer");
        let mut reader = buffer.reader();
        assert_eq!(reader.next_opcode(), Ok(Some(Opcode::SetFloat2)));
        assert_eq!(reader.handle(), Ok(Handle(4)));
        assert_eq!(reader.u32(), Ok(2));
        assert_eq!(reader.f32(), Ok(1.0));
        assert_eq!(reader.f32(), Ok(2.0));
        assert!(reader.is_exhausted());
    }

    #[test]
    fn discard_drops_queued_buffers() {
        let queue = CommandQueue::new();
        let mut recorder = queue.recorder();
        recorder.discard_all_textures();
        recorder.submit();
        recorder.discard_all_textures();
        recorder.discard();
        assert_eq!(recorder.pending_commands(), 0);
        assert_eq!(queue.discard(), 1);
        assert_eq!(queue.pending(), 0);
    }
}
