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

use crate::renderer::api::*;
use crate::renderer::error::ResourceError;
use crate::renderer::traits::Encoder;
use std::fmt::Debug;

/// The main interface for creating and managing GPU resources.
///
/// A `GraphicsDevice` is shared between the engine and whoever owns the platform
/// surface, so every method takes `&self` and implementations synchronize internally.
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Links a compiled vertex/fragment pair into a program.
    /// ## Arguments
    /// * `shaders` - The compiled stages.
    /// ## Returns
    /// A `Result` containing the ID of the created program or an error if linking fails.
    /// ## Errors
    /// * `ResourceError` - If the program creation fails.
    fn create_program(&self, shaders: &CompiledShaders) -> Result<ProgramId, ResourceError>;

    /// Destroys the program associated with the given ID.
    fn destroy_program(&self, id: ProgramId) -> Result<(), ResourceError>;

    /// Creates the device-side handle of a uniform declared by `program`.
    /// ## Arguments
    /// * `program` - The program that declares the uniform.
    /// * `descriptor` - The uniform name, kind and declared length.
    /// ## Returns
    /// A `Result` containing the ID of the uniform.
    fn create_uniform(
        &self,
        program: ProgramId,
        descriptor: &UniformDescriptor,
    ) -> Result<UniformId, ResourceError>;

    /// Destroys a uniform handle.
    fn destroy_uniform(&self, id: UniformId) -> Result<(), ResourceError>;

    /// Creates a new GPU buffer and initializes it with the provided data.
    /// ## Arguments
    /// * `descriptor` - A reference to a `BufferDescriptor` containing the buffer configuration.
    /// * `data` - A slice of bytes containing the initial data for the buffer.
    /// ## Returns
    /// A `Result` containing the ID of the created buffer or an error if the creation fails.
    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError>;

    /// Writes data to a GPU buffer.
    /// ## Arguments
    /// * `id` - The ID of the buffer to write to.
    /// * `offset` - The byte offset in the buffer where the data will be written.
    /// * `data` - A slice of bytes containing the data to be written.
    /// ## Errors
    /// * `ResourceError::OutOfBounds` - If the write does not fit a static buffer.
    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError>;

    /// Destroys a GPU buffer.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    /// Creates a new GPU texture with undefined contents.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError>;

    /// Writes texels into a region of a texture.
    /// ## Arguments
    /// * `id` - The ID of the texture to write to.
    /// * `region` - The mip level, layer and rectangle to write.
    /// * `data` - Tightly packed texels in the texture's format.
    fn write_texture(
        &self,
        id: TextureId,
        region: &TextureRegion,
        data: &[u8],
    ) -> Result<(), ResourceError>;

    /// Fills mip levels `1..` of a texture from level 0.
    fn generate_mipmaps(&self, id: TextureId) -> Result<(), ResourceError>;

    /// Reads texels back from a region of a texture.
    fn read_texture(&self, id: TextureId, region: &TextureRegion) -> Result<Vec<u8>, ResourceError>;

    /// Destroys a GPU texture.
    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError>;

    /// Creates a custom render target.
    fn create_framebuffer(
        &self,
        descriptor: &FrameBufferDescriptor,
    ) -> Result<FrameBufferId, ResourceError>;

    /// Destroys a custom render target.
    fn destroy_framebuffer(&self, id: FrameBufferId) -> Result<(), ResourceError>;

    /// Reads back the color attachment of a target (`None` for the default target)
    /// as tightly packed RGBA8 pixels.
    fn read_framebuffer(&self, target: Option<FrameBufferId>) -> Result<Vec<u8>, ResourceError>;

    /// Acquires the submission context for a new frame.
    fn begin_frame(&self) -> Result<Box<dyn Encoder>, ResourceError>;

    /// Submits a frame's encoder to the GPU.
    fn submit(&self, encoder: Box<dyn Encoder>) -> Result<(), ResourceError>;

    /// The size of the default target, in physical pixels.
    fn back_buffer_size(&self) -> Extent2D;

    /// Returns `true` while the device cannot accept work.
    fn is_lost(&self) -> bool;
}
