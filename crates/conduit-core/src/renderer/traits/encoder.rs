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

use crate::renderer::api::{
    ClearRequest, DrawCall, FrameBufferId, IndexBufferBinding, ProgramId, Rect, RenderState,
    SamplerState, TextureId, UniformId, VertexBufferBinding,
};
use std::any::Any;

/// A trait for the submission context of a single frame.
///
/// An `Encoder` is obtained from [`GraphicsDevice::begin_frame`] and handed back
/// through [`GraphicsDevice::submit`]. Every call is recorded in order; nothing
/// reaches the GPU before submission.
///
/// [`GraphicsDevice::begin_frame`]: crate::renderer::GraphicsDevice::begin_frame
/// [`GraphicsDevice::submit`]: crate::renderer::GraphicsDevice::submit
pub trait Encoder {
    /// Makes `target` the destination of subsequent clears and draws.
    ///
    /// `None` selects the default (swap-chain) target.
    fn bind_framebuffer(&mut self, target: Option<FrameBufferId>);

    /// Sets the viewport, in pixels of the bound target.
    fn set_viewport(&mut self, rect: Rect);

    /// Sets the scissor rectangle, or disables the scissor test with `None`.
    fn set_scissor(&mut self, rect: Option<Rect>);

    /// Sets the active program for subsequent draw calls.
    fn set_program(&mut self, program: ProgramId);

    /// Binds vertex buffers (and optionally an index buffer) for subsequent draws.
    fn bind_vertex_array(
        &mut self,
        vertex_buffers: &[VertexBufferBinding],
        index_buffer: Option<IndexBufferBinding>,
    );

    /// Uploads the values of one uniform of the active program.
    fn upload_uniform(&mut self, uniform: UniformId, values: &[f32]);

    /// Binds a texture (or nothing) to a sampler uniform.
    fn set_texture(&mut self, uniform: UniformId, texture: Option<TextureId>, sampler: &SamplerState);

    /// Applies the raster, depth, stencil and blend state.
    fn set_render_state(&mut self, state: &RenderState);

    /// Clears attachments of the bound target.
    fn clear(&mut self, request: &ClearRequest);

    /// Records a draw call.
    fn draw(&mut self, call: &DrawCall);

    /// Copies the contents of `source` into `destination`.
    fn blit(&mut self, source: TextureId, destination: TextureId);

    /// Returns a mutable reference to the underlying trait object as `Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
