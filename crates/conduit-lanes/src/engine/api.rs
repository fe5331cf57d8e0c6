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

//! Synchronous entry points, grouped by resource kind.
//!
//! These calls reach the device immediately. Everything that only matters at
//! draw time goes through the [`CommandRecorder`](conduit_data::CommandRecorder)
//! instead.

use super::{stale, Engine};
use crate::binder::UniformRef;
use crate::compile::{CompileCompletion, PendingCompile};
use crate::resource::{
    BufferRecord, DeviceObject, FrameBufferRecord, FrameBufferTarget, IndexBufferSlot,
    ProgramRecord, ProgramState, Resource, ResourceKind, TextureRecord, VertexArrayRecord,
    VertexBufferSlot,
};
use conduit_core::renderer::{
    BufferDescriptor, BufferKind, FrameBufferDescriptor, IndexFormat, RenderError,
    TextureDescriptor, TextureFormat, TextureId, TextureKind, TextureRegion,
    VertexAttributeLayout,
};
use conduit_core::{Handle, UniformLocation};
use std::borrow::Cow;

/// Flips the rows of a tightly packed image.
fn flip_rows(data: &[u8], row_bytes: usize) -> Vec<u8> {
    if row_bytes == 0 {
        return data.to_vec();
    }
    data.chunks(row_bytes).rev().flatten().copied().collect()
}

fn expected_len(width: u32, height: u32, format: TextureFormat) -> usize {
    (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(format.bytes_per_pixel() as usize)
}

fn check_len(data: &[u8], width: u32, height: u32, format: TextureFormat) -> Result<(), RenderError> {
    let expected = expected_len(width, height, format);
    if data.len() != expected {
        return Err(RenderError::InvalidOperation(format!(
            "expected {expected} byte(s) of {format:?} texels for {width}x{height}, got {}",
            data.len()
        )));
    }
    Ok(())
}

impl Engine {
    // --- Vertex buffers ---

    /// Creates a vertex buffer holding `data`.
    pub fn create_vertex_buffer(&mut self, data: &[u8], dynamic: bool) -> Result<Handle, RenderError> {
        let record = self.create_buffer(data, BufferKind::Vertex, dynamic)?;
        let handle = self.resources.insert(Resource::VertexBuffer(record))?;
        log::info!("Created vertex buffer {handle} ({} bytes).", data.len());
        Ok(handle)
    }

    /// Rewrites part of a dynamic vertex buffer.
    pub fn update_dynamic_vertex_buffer(
        &mut self,
        buffer: Handle,
        byte_offset: u64,
        data: &[u8],
    ) -> Result<(), RenderError> {
        self.update_buffer(buffer, ResourceKind::VertexBuffer, byte_offset, data)
    }

    /// Records a vertex buffer into a vertex array at `layout.location`.
    ///
    /// A previous binding of the same location is replaced. The array must not
    /// be the one currently bound for drawing.
    pub fn record_vertex_buffer(
        &mut self,
        vertex_array: Handle,
        buffer: Handle,
        layout: VertexAttributeLayout,
    ) -> Result<(), RenderError> {
        if !(1..=4).contains(&layout.components) {
            return Err(RenderError::InvalidOperation(format!(
                "vertex attribute {} has {} components",
                layout.location, layout.components
            )));
        }
        self.resources.vertex_buffer(buffer)?;
        self.mutable_vertex_array(vertex_array)?
            .record_vertex_buffer(VertexBufferSlot { buffer, layout });
        Ok(())
    }

    // --- Index buffers ---

    /// Creates an index buffer holding `data`.
    pub fn create_index_buffer(
        &mut self,
        data: &[u8],
        format: IndexFormat,
        dynamic: bool,
    ) -> Result<Handle, RenderError> {
        if data.len() % format.size() != 0 {
            return Err(RenderError::InvalidOperation(format!(
                "{} bytes are not a whole number of {format:?} indices",
                data.len()
            )));
        }
        let record = self.create_buffer(data, BufferKind::Index(format), dynamic)?;
        let handle = self.resources.insert(Resource::IndexBuffer(record))?;
        log::info!("Created index buffer {handle} ({format:?}, {} bytes).", data.len());
        Ok(handle)
    }

    /// Rewrites part of a dynamic index buffer.
    pub fn update_dynamic_index_buffer(
        &mut self,
        buffer: Handle,
        byte_offset: u64,
        data: &[u8],
    ) -> Result<(), RenderError> {
        self.update_buffer(buffer, ResourceKind::IndexBuffer, byte_offset, data)
    }

    /// Records the index buffer of a vertex array, replacing the previous one.
    pub fn record_index_buffer(&mut self, vertex_array: Handle, buffer: Handle) -> Result<(), RenderError> {
        self.resources.index_buffer(buffer)?;
        self.mutable_vertex_array(vertex_array)?
            .record_index_buffer(IndexBufferSlot { buffer });
        Ok(())
    }

    fn create_buffer(
        &self,
        data: &[u8],
        kind: BufferKind,
        dynamic: bool,
    ) -> Result<BufferRecord, RenderError> {
        let id = self.context.device().create_buffer_with_data(
            &BufferDescriptor {
                label: None,
                kind,
                dynamic,
            },
            data,
        )?;
        Ok(BufferRecord {
            object: DeviceObject::new(id, &self.context),
            kind,
            dynamic,
            size: data.len(),
        })
    }

    fn update_buffer(
        &mut self,
        buffer: Handle,
        kind: ResourceKind,
        byte_offset: u64,
        data: &[u8],
    ) -> Result<(), RenderError> {
        let record = match kind {
            ResourceKind::IndexBuffer => self.resources.index_buffer_mut(buffer)?,
            _ => self.resources.vertex_buffer_mut(buffer)?,
        };
        if !record.dynamic {
            return Err(RenderError::InvalidOperation(format!(
                "{} {buffer} is not dynamic",
                kind.name()
            )));
        }
        let id = record
            .object
            .current(&self.context)
            .ok_or_else(|| stale(buffer, kind))?;
        self.context.device().write_buffer(id, byte_offset, data)?;
        let end = usize::try_from(byte_offset)
            .unwrap_or(usize::MAX)
            .saturating_add(data.len());
        record.size = record.size.max(end);
        Ok(())
    }

    // --- Vertex arrays ---

    /// Creates an empty vertex array.
    pub fn create_vertex_array(&mut self) -> Result<Handle, RenderError> {
        self.resources
            .insert(Resource::VertexArray(VertexArrayRecord::default()))
    }

    fn mutable_vertex_array(&mut self, vertex_array: Handle) -> Result<&mut VertexArrayRecord, RenderError> {
        if self.bound.vertex_array == Some(vertex_array) {
            return Err(RenderError::InvalidOperation(format!(
                "vertex array {vertex_array} is bound for drawing"
            )));
        }
        self.resources.vertex_array_mut(vertex_array)
    }

    // --- Programs ---

    /// Compiles and links a program on the calling thread.
    pub fn create_program(&mut self, vertex_source: &str, fragment_source: &str) -> Result<Handle, RenderError> {
        let shaders = self.compiler.compile(vertex_source, fragment_source)?;
        let data = self.link_program(&shaders)?;
        let handle = self.resources.insert(Resource::Program(ProgramRecord {
            state: ProgramState::Ready(data),
        }))?;
        log::info!("Created program {handle}.");
        Ok(handle)
    }

    /// Compiles a program on a worker thread.
    ///
    /// The handle is usable right away: commands that need the program block
    /// until it is linked. The completion resolves once the program is linked
    /// or has been dropped because it failed.
    pub fn create_program_async(
        &mut self,
        vertex_source: impl Into<String>,
        fragment_source: impl Into<String>,
    ) -> Result<(Handle, CompileCompletion), RenderError> {
        let (pending, completion) = PendingCompile::spawn(
            self.compiler.clone(),
            vertex_source.into(),
            fragment_source.into(),
            &self.settings.compile_threads_name,
        )?;
        let handle = self.resources.insert(Resource::Program(ProgramRecord {
            state: ProgramState::Pending(pending),
        }))?;
        log::info!("Started compiling program {handle}.");
        Ok((handle, completion))
    }

    /// Looks up uniform locations by name; undeclared names map to `None`.
    pub fn get_uniforms(
        &mut self,
        program: Handle,
        names: &[&str],
    ) -> Result<Vec<Option<UniformLocation>>, RenderError> {
        let binder = &self.ready_program(program)?.binder;
        Ok(names
            .iter()
            .map(|name| {
                binder
                    .slot(name)
                    .map(|slot| UniformLocation { program, slot })
            })
            .collect())
    }

    /// Looks up attribute locations by name; undeclared names map to `None`.
    pub fn get_attributes(&mut self, program: Handle, names: &[&str]) -> Result<Vec<Option<u32>>, RenderError> {
        let attributes = &self.ready_program(program)?.attributes;
        Ok(names
            .iter()
            .map(|name| attributes.get(*name).copied())
            .collect())
    }

    /// Writes a uniform value straight into the program's cache.
    ///
    /// `values` holds `element_len` elements laid out the way the device
    /// expects them (see [`pack_vec4`](crate::binder::pack_vec4)).
    pub fn set_uniform(
        &mut self,
        program: Handle,
        uniform: UniformRef<'_>,
        values: &[f32],
        element_len: usize,
    ) -> Result<(), RenderError> {
        let binder = &mut self.ready_program(program)?.binder;
        let slot = binder.resolve(uniform)?;
        binder.set(slot, values, element_len)
    }

    // --- Textures ---

    /// Creates a texture with no storage. It must be initialized or loaded before use.
    pub fn create_texture(&mut self) -> Result<Handle, RenderError> {
        self.resources
            .insert(Resource::Texture(TextureRecord::empty()))
    }

    /// Allocates storage with undefined contents, e.g. for a render target.
    pub fn initialize_texture(
        &mut self,
        texture: Handle,
        width: u32,
        height: u32,
        has_mips: bool,
        format: TextureFormat,
        render_target: bool,
    ) -> Result<(), RenderError> {
        let mip_level_count = if has_mips {
            TextureDescriptor::full_mip_chain(width, height)
        } else {
            1
        };
        self.replace_texture_storage(
            texture,
            &TextureDescriptor {
                label: None,
                width,
                height,
                mip_level_count,
                format,
                kind: TextureKind::D2,
                render_target,
            },
        )?;
        Ok(())
    }

    /// Uploads decoded RGBA8 pixels as level 0 of a 2D texture.
    pub fn load_texture(
        &mut self,
        texture: Handle,
        width: u32,
        height: u32,
        rgba8: &[u8],
        generate_mips: bool,
        invert_y: bool,
    ) -> Result<(), RenderError> {
        self.load_raw_texture(
            texture,
            rgba8,
            width,
            height,
            TextureFormat::Rgba8Unorm,
            generate_mips,
            invert_y,
        )
    }

    /// Uploads texels of any supported format as level 0 of a 2D texture.
    #[allow(clippy::too_many_arguments)]
    pub fn load_raw_texture(
        &mut self,
        texture: Handle,
        data: &[u8],
        width: u32,
        height: u32,
        format: TextureFormat,
        generate_mips: bool,
        invert_y: bool,
    ) -> Result<(), RenderError> {
        check_len(data, width, height, format)?;
        let mip_level_count = if generate_mips {
            TextureDescriptor::full_mip_chain(width, height)
        } else {
            1
        };
        let id = self.replace_texture_storage(
            texture,
            &TextureDescriptor {
                label: None,
                width,
                height,
                mip_level_count,
                format,
                kind: TextureKind::D2,
                render_target: false,
            },
        )?;
        let device = self.context.device();
        let region = TextureRegion::whole(width, height);
        if invert_y {
            let row_bytes = width as usize * format.bytes_per_pixel() as usize;
            device.write_texture(id, &region, &flip_rows(data, row_bytes))?;
        } else {
            device.write_texture(id, &region, data)?;
        }
        if generate_mips {
            device.generate_mipmaps(id)?;
        }
        log::debug!("Loaded {width}x{height} {format:?} texture {texture}.");
        Ok(())
    }

    /// 2D array textures cannot be expressed by the device abstraction.
    pub fn load_raw_texture_2d_array(
        &mut self,
        _texture: Handle,
        _data: &[u8],
        _width: u32,
        _height: u32,
        _depth: u32,
    ) -> Result<(), RenderError> {
        Err(RenderError::Unsupported("2D array raw textures"))
    }

    /// Uploads six square RGBA8 faces (+X, -X, +Y, -Y, +Z, -Z) as a cube texture.
    pub fn load_cube_texture(
        &mut self,
        texture: Handle,
        faces: [&[u8]; 6],
        size: u32,
        generate_mips: bool,
    ) -> Result<(), RenderError> {
        self.load_cube(texture, &[faces], size, generate_mips)
    }

    /// Uploads a cube texture with explicit mip levels; level `i` is `size >> i` wide.
    pub fn load_cube_texture_with_mips(
        &mut self,
        texture: Handle,
        mips: &[[&[u8]; 6]],
        size: u32,
    ) -> Result<(), RenderError> {
        self.load_cube(texture, mips, size, false)
    }

    fn load_cube(
        &mut self,
        texture: Handle,
        mips: &[[&[u8]; 6]],
        size: u32,
        generate_mips: bool,
    ) -> Result<(), RenderError> {
        let format = TextureFormat::Rgba8Unorm;
        if mips.is_empty() {
            return Err(RenderError::InvalidOperation(
                "cube texture without faces".to_string(),
            ));
        }
        let full_chain = TextureDescriptor::full_mip_chain(size, size);
        if mips.len() > full_chain as usize {
            return Err(RenderError::InvalidOperation(format!(
                "{} mip level(s) given for a {size}x{size} cube, at most {full_chain} exist",
                mips.len()
            )));
        }
        for (level, faces) in mips.iter().enumerate() {
            let level_size = (size >> level).max(1);
            for face in faces {
                check_len(face, level_size, level_size, format)?;
            }
        }
        let mip_level_count = if generate_mips {
            TextureDescriptor::full_mip_chain(size, size)
        } else {
            mips.len() as u32
        };
        let id = self.replace_texture_storage(
            texture,
            &TextureDescriptor {
                label: None,
                width: size,
                height: size,
                mip_level_count,
                format,
                kind: TextureKind::Cube,
                render_target: false,
            },
        )?;
        let device = self.context.device();
        for (level, faces) in mips.iter().enumerate() {
            let level_size = (size >> level).max(1);
            for (layer, face) in faces.iter().enumerate() {
                let region = TextureRegion {
                    mip_level: level as u32,
                    layer: layer as u32,
                    ..TextureRegion::whole(level_size, level_size)
                };
                device.write_texture(id, &region, face)?;
            }
        }
        if generate_mips {
            device.generate_mipmaps(id)?;
        }
        log::debug!("Loaded {size}x{size} cube texture {texture} ({} level(s)).", mips.len());
        Ok(())
    }

    /// Logical width of a texture.
    pub fn get_texture_width(&self, texture: Handle) -> Result<u32, RenderError> {
        Ok(self.resources.texture(texture)?.width)
    }

    /// Logical height of a texture.
    pub fn get_texture_height(&self, texture: Handle) -> Result<u32, RenderError> {
        Ok(self.resources.texture(texture)?.height)
    }

    /// Reads back a rectangle of one mip level of a texture.
    pub fn read_texture(
        &self,
        texture: Handle,
        mip_level: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let record = self.resources.texture(texture)?;
        let id = record
            .object
            .and_then(|object| object.current(&self.context))
            .ok_or_else(|| stale(texture, ResourceKind::Texture))?;
        Ok(self.context.device().read_texture(
            id,
            &TextureRegion {
                mip_level,
                layer: 0,
                x,
                y,
                width,
                height,
            },
        )?)
    }

    /// Deletes a texture and its device storage.
    pub fn delete_texture(&mut self, texture: Handle) -> Result<(), RenderError> {
        self.resources
            .release(texture, ResourceKind::Texture, &self.context)?;
        Ok(())
    }

    /// Image bitmaps are decoded by the platform, not by the engine.
    pub fn create_image_bitmap(&mut self, _data: &[u8]) -> Result<Handle, RenderError> {
        Err(RenderError::Unsupported("image bitmaps"))
    }

    /// Image bitmaps are decoded by the platform, not by the engine.
    pub fn resize_image_bitmap(
        &mut self,
        _bitmap: Handle,
        _width: u32,
        _height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::Unsupported("image bitmaps"))
    }

    /// Creates new device storage for a texture record and drops the old one.
    fn replace_texture_storage(
        &mut self,
        texture: Handle,
        descriptor: &TextureDescriptor,
    ) -> Result<TextureId, RenderError> {
        self.resources.texture(texture)?;
        let id = self.context.device().create_texture(descriptor)?;
        let record = self.resources.texture_mut(texture)?;
        let previous = record.take_object();
        record.object = Some(DeviceObject::new(id, &self.context));
        record.width = descriptor.width;
        record.height = descriptor.height;
        record.format = Some(descriptor.format);
        record.kind = descriptor.kind;
        record.mip_levels = descriptor.mip_level_count;
        record.render_target = descriptor.render_target;
        if let Some(previous) = previous {
            previous.release(&self.context, |device, id| device.destroy_texture(id))?;
        }
        Ok(id)
    }

    // --- Framebuffers ---

    /// Creates a render target, optionally rendering into `texture`.
    ///
    /// The color texture must already be initialized as a render target of
    /// the same size.
    pub fn create_frame_buffer(
        &mut self,
        texture: Option<Handle>,
        width: u32,
        height: u32,
        generate_stencil: bool,
        generate_depth: bool,
    ) -> Result<Handle, RenderError> {
        let color = match texture {
            Some(handle) => {
                let record = self.resources.texture(handle)?;
                if !record.render_target {
                    return Err(RenderError::InvalidOperation(format!(
                        "texture {handle} was not initialized as a render target"
                    )));
                }
                if (record.width, record.height) != (width, height) {
                    return Err(RenderError::InvalidOperation(format!(
                        "texture {handle} is {}x{}, framebuffer is {width}x{height}",
                        record.width, record.height
                    )));
                }
                let id = record
                    .object
                    .and_then(|object| object.current(&self.context))
                    .ok_or_else(|| stale(handle, ResourceKind::Texture))?;
                Some(id)
            }
            None => None,
        };
        let id = self.context.device().create_framebuffer(&FrameBufferDescriptor {
            label: Some(Cow::Borrowed("engine framebuffer")),
            color,
            width,
            height,
            depth: generate_depth || generate_stencil,
            stencil: generate_stencil,
        })?;
        let handle = self.resources.insert(Resource::FrameBuffer(FrameBufferRecord {
            target: FrameBufferTarget::Custom(DeviceObject::new(id, &self.context)),
            owned: true,
            width,
            height,
            color: texture,
        }))?;
        log::info!("Created framebuffer {handle} ({width}x{height}).");
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_rows_reverses_row_order() {
        let data = [1, 2, 3, 4, 5, 6];
        assert_eq!(flip_rows(&data, 2), vec![5, 6, 3, 4, 1, 2]);
    }

    #[test]
    fn texel_length_is_checked() {
        assert!(check_len(&[0; 16], 2, 2, TextureFormat::Rgba8Unorm).is_ok());
        assert!(check_len(&[0; 15], 2, 2, TextureFormat::Rgba8Unorm).is_err());
    }
}
