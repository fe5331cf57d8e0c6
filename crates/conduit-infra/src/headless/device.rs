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

use super::{DeviceAction, DeviceJournal, HeadlessEncoder};
use conduit_core::renderer::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Largest texture or back-buffer edge the device accepts, in texels.
pub const MAX_TEXTURE_DIMENSION: u32 = 16_384;

/// Byte size of a `width` x `height` image, or `OutOfBounds` past the device limits.
fn image_bytes(width: u32, height: u32, bytes_per_pixel: u32) -> Result<usize, ResourceError> {
    if width > MAX_TEXTURE_DIMENSION || height > MAX_TEXTURE_DIMENSION {
        return Err(ResourceError::OutOfBounds);
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|texels| texels.checked_mul(bytes_per_pixel as usize))
        .ok_or(ResourceError::OutOfBounds)
}

#[derive(Debug)]
struct BufferEntry {
    kind: BufferKind,
    dynamic: bool,
    data: Vec<u8>,
}

#[derive(Debug)]
pub(super) struct TextureEntry {
    pub(super) width: u32,
    pub(super) height: u32,
    pub(super) format: TextureFormat,
    pub(super) mip_level_count: u32,
    pub(super) layers: u32,
    /// One allocation per `(layer, mip)`, indexed `layer * mip_level_count + mip`.
    pub(super) levels: Vec<Vec<u8>>,
}

impl TextureEntry {
    fn new(descriptor: &TextureDescriptor) -> Result<Self, ResourceError> {
        let layers = match descriptor.kind {
            TextureKind::D2 => 1,
            TextureKind::Cube => 6,
        };
        let mip_level_count = descriptor.mip_level_count.max(1);
        if mip_level_count > TextureDescriptor::full_mip_chain(descriptor.width, descriptor.height) {
            return Err(ResourceError::OutOfBounds);
        }
        let bpp = descriptor.format.bytes_per_pixel();
        let mut sizes = Vec::with_capacity(mip_level_count as usize);
        for mip in 0..mip_level_count {
            let (w, h) = mip_extent(descriptor.width, descriptor.height, mip);
            sizes.push(image_bytes(w, h, bpp)?);
        }
        let mut levels = Vec::with_capacity((layers * mip_level_count) as usize);
        for _ in 0..layers {
            levels.extend(sizes.iter().map(|size| vec![0; *size]));
        }
        Ok(Self {
            width: descriptor.width,
            height: descriptor.height,
            format: descriptor.format,
            mip_level_count,
            layers,
            levels,
        })
    }

    fn level_index(&self, region: &TextureRegion) -> Result<usize, ResourceError> {
        if region.mip_level >= self.mip_level_count || region.layer >= self.layers {
            return Err(ResourceError::OutOfBounds);
        }
        let (w, h) = mip_extent(self.width, self.height, region.mip_level);
        let fits_x = region.x.checked_add(region.width).is_some_and(|r| r <= w);
        let fits_y = region.y.checked_add(region.height).is_some_and(|b| b <= h);
        if !fits_x || !fits_y {
            return Err(ResourceError::OutOfBounds);
        }
        Ok((region.layer * self.mip_level_count + region.mip_level) as usize)
    }

    fn write(&mut self, region: &TextureRegion, data: &[u8]) -> Result<(), ResourceError> {
        let index = self.level_index(region)?;
        let bpp = self.format.bytes_per_pixel() as usize;
        let row = region.width as usize * bpp;
        if data.len() != row * region.height as usize {
            return Err(ResourceError::OutOfBounds);
        }
        let (level_width, _) = mip_extent(self.width, self.height, region.mip_level);
        let pitch = level_width as usize * bpp;
        let level = &mut self.levels[index];
        for (y, src) in data.chunks_exact(row.max(1)).enumerate() {
            let start = (region.y as usize + y) * pitch + region.x as usize * bpp;
            level[start..start + row].copy_from_slice(src);
        }
        Ok(())
    }

    fn read(&self, region: &TextureRegion) -> Result<Vec<u8>, ResourceError> {
        let index = self.level_index(region)?;
        let bpp = self.format.bytes_per_pixel() as usize;
        let row = region.width as usize * bpp;
        let (level_width, _) = mip_extent(self.width, self.height, region.mip_level);
        let pitch = level_width as usize * bpp;
        let level = &self.levels[index];
        let mut out = Vec::with_capacity(row * region.height as usize);
        for y in 0..region.height as usize {
            let start = (region.y as usize + y) * pitch + region.x as usize * bpp;
            out.extend_from_slice(&level[start..start + row]);
        }
        Ok(out)
    }

    /// Nearest-neighbour downsampling of every level from the one above it.
    fn generate_mipmaps(&mut self) {
        let bpp = self.format.bytes_per_pixel() as usize;
        for layer in 0..self.layers {
            for mip in 1..self.mip_level_count {
                let (src_w, _) = mip_extent(self.width, self.height, mip - 1);
                let (dst_w, dst_h) = mip_extent(self.width, self.height, mip);
                let src_index = (layer * self.mip_level_count + mip - 1) as usize;
                let mut level = vec![0u8; (dst_w * dst_h) as usize * bpp];
                let src = &self.levels[src_index];
                for y in 0..dst_h as usize {
                    for x in 0..dst_w as usize {
                        let s = ((y * 2) * src_w as usize + x * 2) * bpp;
                        let d = (y * dst_w as usize + x) * bpp;
                        level[d..d + bpp].copy_from_slice(&src[s..s + bpp]);
                    }
                }
                self.levels[src_index + 1] = level;
            }
        }
    }

    /// Fills level 0 of every layer with one RGBA8 color, if the format is RGBA8-like.
    pub(super) fn fill(&mut self, rgba: [u8; 4]) {
        let texel: [u8; 4] = match self.format {
            TextureFormat::Rgba8Unorm | TextureFormat::Rgba8UnormSrgb => rgba,
            TextureFormat::Bgra8Unorm => [rgba[2], rgba[1], rgba[0], rgba[3]],
            _ => return,
        };
        for layer in 0..self.layers {
            let index = (layer * self.mip_level_count) as usize;
            for chunk in self.levels[index].chunks_exact_mut(4) {
                chunk.copy_from_slice(&texel);
            }
        }
    }

    fn rgba8_pixels(&self) -> Result<Vec<u8>, ResourceError> {
        let level = &self.levels[0];
        match self.format {
            TextureFormat::Rgba8Unorm | TextureFormat::Rgba8UnormSrgb => Ok(level.clone()),
            TextureFormat::Bgra8Unorm => Ok(level
                .chunks_exact(4)
                .flat_map(|p| [p[2], p[1], p[0], p[3]])
                .collect()),
            other => Err(ResourceError::UnsupportedFormat(format!(
                "read-back of {other:?} attachments"
            ))),
        }
    }
}

pub(super) fn mip_extent(width: u32, height: u32, mip: u32) -> (u32, u32) {
    let shrink = |edge: u32| edge.checked_shr(mip).unwrap_or(0).max(1);
    (shrink(width), shrink(height))
}

#[derive(Debug)]
pub(super) struct FrameBufferEntry {
    pub(super) color: Option<TextureId>,
}

#[derive(Debug)]
pub(super) struct BackBuffer {
    pub(super) extent: Extent2D,
    pub(super) pixels: Vec<u8>,
}

impl BackBuffer {
    fn new(extent: Extent2D) -> Result<Self, ResourceError> {
        let size = image_bytes(extent.width, extent.height, 4)?;
        Ok(Self {
            extent,
            pixels: vec![0; size],
        })
    }
}

/// State shared between the device and the encoders it hands out.
#[derive(Debug)]
pub(super) struct HeadlessState {
    pub(super) journal: DeviceJournal,
    buffers: Mutex<HashMap<BufferId, BufferEntry>>,
    pub(super) textures: Mutex<HashMap<TextureId, TextureEntry>>,
    pub(super) frame_buffers: Mutex<HashMap<FrameBufferId, FrameBufferEntry>>,
    programs: Mutex<HashMap<ProgramId, CompiledShaders>>,
    uniforms: Mutex<HashMap<UniformId, ProgramId>>,
    pub(super) back_buffer: Mutex<BackBuffer>,
    lost: AtomicBool,
    next_id: AtomicUsize,
}

/// Locks a device table, mapping poisoning to a backend error.
pub(super) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, ResourceError> {
    mutex
        .lock()
        .map_err(|_| ResourceError::Backend("headless device state poisoned".to_string()))
}

/// A clonable, thread-safe handle to an in-memory graphics device.
#[derive(Clone, Debug)]
pub struct HeadlessDevice {
    state: Arc<HeadlessState>,
}

impl HeadlessDevice {
    /// Creates a device whose default target is `back_buffer` pixels large.
    ///
    /// Edges are clamped to [`MAX_TEXTURE_DIMENSION`].
    pub fn new(back_buffer: Extent2D) -> Self {
        Self::with_journal(back_buffer, DeviceJournal::new())
    }

    /// Creates a device that records into an existing journal.
    ///
    /// Useful to observe several device generations through one log.
    pub fn with_journal(back_buffer: Extent2D, journal: DeviceJournal) -> Self {
        let back_buffer = Extent2D::new(
            back_buffer.width.min(MAX_TEXTURE_DIMENSION),
            back_buffer.height.min(MAX_TEXTURE_DIMENSION),
        );
        let pixels = vec![0; back_buffer.width as usize * back_buffer.height as usize * 4];
        log::info!(
            "HeadlessDevice: created with a {}x{} back buffer.",
            back_buffer.width,
            back_buffer.height
        );
        Self {
            state: Arc::new(HeadlessState {
                journal,
                buffers: Mutex::new(HashMap::new()),
                textures: Mutex::new(HashMap::new()),
                frame_buffers: Mutex::new(HashMap::new()),
                programs: Mutex::new(HashMap::new()),
                uniforms: Mutex::new(HashMap::new()),
                back_buffer: Mutex::new(BackBuffer {
                    extent: back_buffer,
                    pixels,
                }),
                lost: AtomicBool::new(false),
                next_id: AtomicUsize::new(1),
            }),
        }
    }

    /// The journal this device records into.
    pub fn journal(&self) -> DeviceJournal {
        self.state.journal.clone()
    }

    /// Marks the device as lost (or recovered).
    pub fn set_lost(&self, lost: bool) {
        log::info!("HeadlessDevice: lost = {lost}.");
        self.state.lost.store(lost, Ordering::Release);
    }

    /// Resizes the default target, discarding its contents.
    ///
    /// Sizes past [`MAX_TEXTURE_DIMENSION`] are refused with `OutOfBounds`.
    pub fn resize(&self, extent: Extent2D) -> Result<(), ResourceError> {
        let back_buffer = BackBuffer::new(extent)?;
        *lock(&self.state.back_buffer)? = back_buffer;
        Ok(())
    }

    /// Number of live device objects of every kind.
    pub fn live_objects(&self) -> Result<usize, ResourceError> {
        Ok(lock(&self.state.buffers)?.len()
            + lock(&self.state.textures)?.len()
            + lock(&self.state.frame_buffers)?.len()
            + lock(&self.state.programs)?.len()
            + lock(&self.state.uniforms)?.len())
    }

    /// Reads back the raw bytes of a buffer.
    pub fn buffer_contents(&self, id: BufferId) -> Result<Vec<u8>, ResourceError> {
        lock(&self.state.buffers)?
            .get(&id)
            .map(|entry| entry.data.clone())
            .ok_or(ResourceError::NotFound)
    }

    // --- ID Generation Helpers ---

    fn next_id(&self) -> usize {
        self.state.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn ensure_alive(&self) -> Result<(), ResourceError> {
        if self.is_lost() {
            Err(ResourceError::Backend("device is lost".to_string()))
        } else {
            Ok(())
        }
    }

    fn record(&self, action: DeviceAction) {
        self.state.journal.record(action);
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_program(&self, shaders: &CompiledShaders) -> Result<ProgramId, ResourceError> {
        self.ensure_alive()?;
        let id = ProgramId(self.next_id());
        lock(&self.state.programs)?.insert(id, shaders.clone());
        self.record(DeviceAction::CreateProgram(id));
        log::info!("HeadlessDevice: Created program. ID: {id:?}");
        Ok(id)
    }

    fn destroy_program(&self, id: ProgramId) -> Result<(), ResourceError> {
        lock(&self.state.programs)?
            .remove(&id)
            .ok_or(ResourceError::NotFound)?;
        self.record(DeviceAction::DestroyProgram(id));
        log::debug!("HeadlessDevice: Destroyed program with ID: {id:?}");
        Ok(())
    }

    fn create_uniform(
        &self,
        program: ProgramId,
        descriptor: &UniformDescriptor,
    ) -> Result<UniformId, ResourceError> {
        self.ensure_alive()?;
        if !lock(&self.state.programs)?.contains_key(&program) {
            return Err(ResourceError::NotFound);
        }
        let id = UniformId(self.next_id());
        lock(&self.state.uniforms)?.insert(id, program);
        self.record(DeviceAction::CreateUniform {
            program,
            uniform: id,
            name: descriptor.name.to_string(),
        });
        Ok(id)
    }

    fn destroy_uniform(&self, id: UniformId) -> Result<(), ResourceError> {
        lock(&self.state.uniforms)?
            .remove(&id)
            .ok_or(ResourceError::NotFound)?;
        self.record(DeviceAction::DestroyUniform(id));
        Ok(())
    }

    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        self.ensure_alive()?;
        let id = BufferId(self.next_id());
        lock(&self.state.buffers)?.insert(
            id,
            BufferEntry {
                kind: descriptor.kind,
                dynamic: descriptor.dynamic,
                data: data.to_vec(),
            },
        );
        self.record(DeviceAction::CreateBuffer {
            id,
            kind: descriptor.kind,
            size: data.len(),
        });
        log::info!(
            "HeadlessDevice: Created buffer '{}'. ID: {:?}, size: {} bytes",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            data.len()
        );
        Ok(id)
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let mut buffers = lock(&self.state.buffers)?;
        let entry = buffers.get_mut(&id).ok_or(ResourceError::NotFound)?;
        let start = usize::try_from(offset).map_err(|_| ResourceError::OutOfBounds)?;
        let end = start
            .checked_add(data.len())
            .ok_or(ResourceError::OutOfBounds)?;
        if end > entry.data.len() {
            // Dynamic buffers grow to fit, but only from within their current contents.
            if !entry.dynamic || start > entry.data.len() {
                return Err(ResourceError::OutOfBounds);
            }
            entry.data.resize(end, 0);
        }
        entry.data[start..end].copy_from_slice(data);
        log::trace!("HeadlessDevice: wrote {} bytes into {:?} buffer {id:?}", data.len(), entry.kind);
        drop(buffers);
        self.record(DeviceAction::WriteBuffer {
            id,
            offset,
            size: data.len(),
        });
        Ok(())
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        lock(&self.state.buffers)?
            .remove(&id)
            .ok_or(ResourceError::NotFound)?;
        self.record(DeviceAction::DestroyBuffer(id));
        log::debug!("HeadlessDevice: Destroyed buffer with ID: {id:?}");
        Ok(())
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        self.ensure_alive()?;
        if descriptor.width == 0 || descriptor.height == 0 {
            return Err(ResourceError::UnsupportedFormat(
                "zero-sized texture".to_string(),
            ));
        }
        let entry = TextureEntry::new(descriptor)?;
        let id = TextureId(self.next_id());
        lock(&self.state.textures)?.insert(id, entry);
        self.record(DeviceAction::CreateTexture {
            id,
            width: descriptor.width,
            height: descriptor.height,
            format: descriptor.format,
        });
        log::info!(
            "HeadlessDevice: Created texture '{}'. ID: {:?}, {}x{} {:?}",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            descriptor.width,
            descriptor.height,
            descriptor.format
        );
        Ok(id)
    }

    fn write_texture(
        &self,
        id: TextureId,
        region: &TextureRegion,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        lock(&self.state.textures)?
            .get_mut(&id)
            .ok_or(ResourceError::NotFound)?
            .write(region, data)?;
        self.record(DeviceAction::WriteTexture {
            id,
            mip_level: region.mip_level,
            layer: region.layer,
        });
        Ok(())
    }

    fn generate_mipmaps(&self, id: TextureId) -> Result<(), ResourceError> {
        lock(&self.state.textures)?
            .get_mut(&id)
            .ok_or(ResourceError::NotFound)?
            .generate_mipmaps();
        self.record(DeviceAction::GenerateMipmaps(id));
        Ok(())
    }

    fn read_texture(&self, id: TextureId, region: &TextureRegion) -> Result<Vec<u8>, ResourceError> {
        let pixels = lock(&self.state.textures)?
            .get(&id)
            .ok_or(ResourceError::NotFound)?
            .read(region)?;
        self.record(DeviceAction::ReadTexture(id));
        Ok(pixels)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        lock(&self.state.textures)?
            .remove(&id)
            .ok_or(ResourceError::NotFound)?;
        self.record(DeviceAction::DestroyTexture(id));
        log::debug!("HeadlessDevice: Destroyed texture with ID: {id:?}");
        Ok(())
    }

    fn create_framebuffer(
        &self,
        descriptor: &FrameBufferDescriptor,
    ) -> Result<FrameBufferId, ResourceError> {
        self.ensure_alive()?;
        if let Some(color) = descriptor.color {
            if !lock(&self.state.textures)?.contains_key(&color) {
                return Err(ResourceError::NotFound);
            }
        }
        let id = FrameBufferId(self.next_id());
        lock(&self.state.frame_buffers)?.insert(
            id,
            FrameBufferEntry {
                color: descriptor.color,
            },
        );
        self.record(DeviceAction::CreateFrameBuffer(id));
        log::info!(
            "HeadlessDevice: Created framebuffer '{}'. ID: {:?}, {}x{}",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            descriptor.width,
            descriptor.height
        );
        Ok(id)
    }

    fn destroy_framebuffer(&self, id: FrameBufferId) -> Result<(), ResourceError> {
        lock(&self.state.frame_buffers)?
            .remove(&id)
            .ok_or(ResourceError::NotFound)?;
        self.record(DeviceAction::DestroyFrameBuffer(id));
        log::debug!("HeadlessDevice: Destroyed framebuffer with ID: {id:?}");
        Ok(())
    }

    fn read_framebuffer(&self, target: Option<FrameBufferId>) -> Result<Vec<u8>, ResourceError> {
        let pixels = match target {
            None => lock(&self.state.back_buffer)?.pixels.clone(),
            Some(id) => {
                let color = lock(&self.state.frame_buffers)?
                    .get(&id)
                    .ok_or(ResourceError::NotFound)?
                    .color
                    .ok_or_else(|| {
                        ResourceError::UnsupportedFormat(
                            "framebuffer without a color attachment".to_string(),
                        )
                    })?;
                lock(&self.state.textures)?
                    .get(&color)
                    .ok_or(ResourceError::NotFound)?
                    .rgba8_pixels()?
            }
        };
        self.record(DeviceAction::ReadFrameBuffer(target));
        Ok(pixels)
    }

    fn begin_frame(&self) -> Result<Box<dyn Encoder>, ResourceError> {
        self.ensure_alive()?;
        self.record(DeviceAction::BeginFrame);
        Ok(Box::new(HeadlessEncoder::new(Arc::clone(&self.state))))
    }

    fn submit(&self, mut encoder: Box<dyn Encoder>) -> Result<(), ResourceError> {
        let headless = encoder
            .as_any_mut()
            .downcast_mut::<HeadlessEncoder>()
            .ok_or_else(|| {
                ResourceError::Backend("encoder was not created by this device".to_string())
            })?;
        let commands = headless.finish();
        self.record(DeviceAction::Submit { commands });
        Ok(())
    }

    fn back_buffer_size(&self) -> Extent2D {
        match lock(&self.state.back_buffer) {
            Ok(back_buffer) => back_buffer.extent,
            Err(_) => Extent2D::default(),
        }
    }

    fn is_lost(&self) -> bool {
        self.state.lost.load(Ordering::Acquire)
    }
}
