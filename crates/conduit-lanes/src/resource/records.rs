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

use super::DeviceObject;
use crate::binder::{AttributeMap, UniformBinder};
use crate::compile::PendingCompile;
use conduit_core::renderer::{
    BufferId, BufferKind, Extent2D, FrameBufferId, ProgramId, ResourceError, SamplerState,
    TextureFormat, TextureId, TextureKind, VertexAttributeLayout,
};
use conduit_core::{DeviceContext, Handle};

/// A vertex or index buffer.
#[derive(Debug)]
pub struct BufferRecord {
    /// The device buffer.
    pub object: DeviceObject<BufferId>,
    /// Vertex, or index with its format.
    pub kind: BufferKind,
    /// If `true`, the contents may be updated after creation.
    pub dynamic: bool,
    /// Current size in bytes.
    pub size: usize,
}

impl BufferRecord {
    /// Destroys the device buffer if it belongs to the current device.
    pub fn release(self, context: &DeviceContext) -> Result<bool, ResourceError> {
        self.object
            .release(context, |device, id| device.destroy_buffer(id))
    }
}

/// One vertex buffer recorded into a vertex array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBufferSlot {
    /// The vertex buffer record.
    pub buffer: Handle,
    /// How the attribute is fetched.
    pub layout: VertexAttributeLayout,
}

/// The index buffer recorded into a vertex array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBufferSlot {
    /// The index buffer record.
    pub buffer: Handle,
}

/// A set of vertex buffer bindings plus an optional index buffer.
///
/// A vertex array owns no device object; it only refers to buffer records
/// that are resolved when the array is bound for a draw.
#[derive(Debug, Default)]
pub struct VertexArrayRecord {
    /// Bindings in recording order, at most one per attribute location.
    pub vertex_buffers: Vec<VertexBufferSlot>,
    /// The index buffer, if any.
    pub index_buffer: Option<IndexBufferSlot>,
}

impl VertexArrayRecord {
    /// Records a vertex buffer, replacing any previous binding of the same location.
    pub fn record_vertex_buffer(&mut self, slot: VertexBufferSlot) {
        match self
            .vertex_buffers
            .iter_mut()
            .find(|existing| existing.layout.location == slot.layout.location)
        {
            Some(existing) => *existing = slot,
            None => self.vertex_buffers.push(slot),
        }
    }

    /// Records the index buffer, replacing the previous one.
    pub fn record_index_buffer(&mut self, slot: IndexBufferSlot) {
        self.index_buffer = Some(slot);
    }
}

/// A linked program with its reflection.
#[derive(Debug)]
pub struct ProgramData {
    /// The device program.
    pub object: DeviceObject<ProgramId>,
    /// Uniform slots and their cached values.
    pub binder: UniformBinder,
    /// Vertex attribute locations, immutable after creation.
    pub attributes: AttributeMap,
}

/// Whether a program is usable yet.
#[derive(Debug)]
pub enum ProgramState {
    /// Sources are being compiled on a worker thread.
    Pending(PendingCompile),
    /// The program is linked and reflected.
    Ready(ProgramData),
}

/// A shader program, created synchronously or asynchronously.
#[derive(Debug)]
pub struct ProgramRecord {
    /// Current state.
    pub state: ProgramState,
}

impl ProgramRecord {
    /// Returns `true` while the compile has not been published.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, ProgramState::Pending(_))
    }

    /// Returns the linked program, if ready.
    pub fn data(&self) -> Option<&ProgramData> {
        match &self.state {
            ProgramState::Ready(data) => Some(data),
            ProgramState::Pending(_) => None,
        }
    }

    /// Mutable variant of [`data`](Self::data).
    pub fn data_mut(&mut self) -> Option<&mut ProgramData> {
        match &mut self.state {
            ProgramState::Ready(data) => Some(data),
            ProgramState::Pending(_) => None,
        }
    }

    /// Destroys the uniforms and then the program.
    ///
    /// Both are attempted; the first failure is returned.
    ///
    /// A pending program has no device objects yet; its compile is cancelled instead.
    pub fn release(self, context: &DeviceContext) -> Result<bool, ResourceError> {
        match self.state {
            ProgramState::Pending(pending) => {
                pending.cancel();
                Ok(false)
            }
            ProgramState::Ready(data) => {
                let uniforms = data.binder.release(context);
                let program = data
                    .object
                    .release(context, |device, id| device.destroy_program(id));
                match (uniforms, program) {
                    (Err(e), _) | (Ok(_), Err(e)) => Err(e),
                    (Ok(_), Ok(destroyed)) => Ok(destroyed),
                }
            }
        }
    }
}

/// A texture, possibly not yet backed by a device texture.
#[derive(Debug)]
pub struct TextureRecord {
    /// The device texture, absent until the texture is initialized or loaded.
    pub object: Option<DeviceObject<TextureId>>,
    /// Logical width of mip level 0.
    pub width: u32,
    /// Logical height of mip level 0.
    pub height: u32,
    /// Texel format, known once initialized.
    pub format: Option<TextureFormat>,
    /// 2D or cube.
    pub kind: TextureKind,
    /// Number of allocated mip levels.
    pub mip_levels: u32,
    /// If `true`, the texture can be used as a framebuffer color attachment.
    pub render_target: bool,
    /// Sampling configuration used whenever the texture is bound.
    pub sampler: SamplerState,
}

impl TextureRecord {
    /// A texture that has a handle but no storage yet.
    pub fn empty() -> Self {
        Self {
            object: None,
            width: 0,
            height: 0,
            format: None,
            kind: TextureKind::D2,
            mip_levels: 0,
            render_target: false,
            sampler: SamplerState::default(),
        }
    }

    /// Destroys the device texture, if any and if it belongs to the current device.
    pub fn release(self, context: &DeviceContext) -> Result<bool, ResourceError> {
        match self.object {
            Some(object) => object.release(context, |device, id| device.destroy_texture(id)),
            None => Ok(false),
        }
    }

    /// Detaches the current device texture, leaving the record uninitialized.
    pub fn take_object(&mut self) -> Option<DeviceObject<TextureId>> {
        self.object.take()
    }
}

/// Where a framebuffer record renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameBufferTarget {
    /// The swap-chain target of the device.
    Default,
    /// A render target created by the engine.
    Custom(DeviceObject<FrameBufferId>),
}

/// A render target.
#[derive(Debug)]
pub struct FrameBufferRecord {
    /// The device target.
    pub target: FrameBufferTarget,
    /// If `true`, the record owns its device object and may destroy it.
    pub owned: bool,
    /// Width in pixels (unused for the default target).
    pub width: u32,
    /// Height in pixels (unused for the default target).
    pub height: u32,
    /// The texture used as color attachment.
    pub color: Option<Handle>,
}

impl FrameBufferRecord {
    /// The record of the swap-chain target.
    pub fn default_target() -> Self {
        Self {
            target: FrameBufferTarget::Default,
            owned: false,
            width: 0,
            height: 0,
            color: None,
        }
    }

    /// Returns `true` for the swap-chain target.
    pub fn is_default(&self) -> bool {
        self.target == FrameBufferTarget::Default
    }

    /// Size of the target; the default target follows the back buffer.
    pub fn extent(&self, back_buffer: Extent2D) -> Extent2D {
        match self.target {
            FrameBufferTarget::Default => back_buffer,
            FrameBufferTarget::Custom(_) => Extent2D::new(self.width, self.height),
        }
    }

    /// Destroys the device target if the record owns it and it is current.
    pub fn release(self, context: &DeviceContext) -> Result<bool, ResourceError> {
        match self.target {
            FrameBufferTarget::Custom(object) if self.owned => {
                object.release(context, |device, id| device.destroy_framebuffer(id))
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::renderer::VertexComponentType;

    fn layout(location: u32, offset: u32) -> VertexAttributeLayout {
        VertexAttributeLayout {
            location,
            offset,
            stride: 12,
            components: 3,
            component_type: VertexComponentType::Float32,
            normalized: false,
            divisor: 0,
        }
    }

    #[test]
    fn recording_the_same_location_replaces_the_binding() {
        let mut array = VertexArrayRecord::default();
        array.record_vertex_buffer(VertexBufferSlot {
            buffer: Handle(1),
            layout: layout(0, 0),
        });
        array.record_vertex_buffer(VertexBufferSlot {
            buffer: Handle(2),
            layout: layout(1, 0),
        });
        array.record_vertex_buffer(VertexBufferSlot {
            buffer: Handle(3),
            layout: layout(0, 4),
        });

        assert_eq!(array.vertex_buffers.len(), 2);
        assert_eq!(array.vertex_buffers[0].buffer, Handle(3));
        assert_eq!(array.vertex_buffers[0].layout.offset, 4);
        assert_eq!(array.vertex_buffers[1].buffer, Handle(2));
    }

    #[test]
    fn default_framebuffer_follows_back_buffer() {
        let record = FrameBufferRecord::default_target();
        assert!(record.is_default());
        assert!(!record.owned);
        assert_eq!(
            record.extent(Extent2D::new(640, 480)),
            Extent2D::new(640, 480)
        );
    }
}
