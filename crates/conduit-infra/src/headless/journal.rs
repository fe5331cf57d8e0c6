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

use conduit_core::renderer::{
    BufferId, BufferKind, ClearRequest, FrameBufferId, PolygonMode, PrimitiveTopology, ProgramId,
    Rect, RenderState, SamplerState, TextureFormat, TextureId, UniformId,
};
use std::sync::{Arc, Mutex, PoisonError};

/// One call observed by the headless device, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceAction {
    // --- Device ---
    /// A program was linked.
    CreateProgram(ProgramId),
    /// A program was destroyed.
    DestroyProgram(ProgramId),
    /// A uniform handle was created.
    CreateUniform {
        /// The declaring program.
        program: ProgramId,
        /// The new uniform.
        uniform: UniformId,
        /// The uniform name.
        name: String,
    },
    /// A uniform handle was destroyed.
    DestroyUniform(UniformId),
    /// A buffer was created.
    CreateBuffer {
        /// The new buffer.
        id: BufferId,
        /// Vertex or index.
        kind: BufferKind,
        /// Initial size in bytes.
        size: usize,
    },
    /// Bytes were written into a buffer.
    WriteBuffer {
        /// The buffer.
        id: BufferId,
        /// Byte offset.
        offset: u64,
        /// Bytes written.
        size: usize,
    },
    /// A buffer was destroyed.
    DestroyBuffer(BufferId),
    /// A texture was created.
    CreateTexture {
        /// The new texture.
        id: TextureId,
        /// Width of level 0.
        width: u32,
        /// Height of level 0.
        height: u32,
        /// Texel format.
        format: TextureFormat,
    },
    /// Texels were written into a texture.
    WriteTexture {
        /// The texture.
        id: TextureId,
        /// Mip level written.
        mip_level: u32,
        /// Layer (cube face) written.
        layer: u32,
    },
    /// Mip levels were generated.
    GenerateMipmaps(TextureId),
    /// Texels were read back.
    ReadTexture(TextureId),
    /// A texture was destroyed.
    DestroyTexture(TextureId),
    /// A framebuffer was created.
    CreateFrameBuffer(FrameBufferId),
    /// A framebuffer was destroyed.
    DestroyFrameBuffer(FrameBufferId),
    /// Pixels of a target were read back.
    ReadFrameBuffer(Option<FrameBufferId>),
    /// A frame's encoder was acquired.
    BeginFrame,
    /// A frame's encoder was submitted.
    Submit {
        /// Number of encoder calls recorded in the frame.
        commands: usize,
    },

    // --- Encoder ---
    /// A target was bound.
    BindFrameBuffer(Option<FrameBufferId>),
    /// The viewport was set.
    SetViewport(Rect),
    /// The scissor was set or disabled.
    SetScissor(Option<Rect>),
    /// A program was made active.
    BindProgram(ProgramId),
    /// Vertex input was bound.
    BindVertexArray {
        /// The bound vertex buffers, in binding order.
        vertex_buffers: Vec<BufferId>,
        /// The bound index buffer.
        index_buffer: Option<BufferId>,
    },
    /// Uniform values were uploaded.
    UploadUniform {
        /// The uniform.
        uniform: UniformId,
        /// The uploaded floats.
        values: Vec<f32>,
    },
    /// A sampler uniform was bound.
    SetTexture {
        /// The sampler uniform.
        uniform: UniformId,
        /// The texture, or `None` when unbound.
        texture: Option<TextureId>,
        /// The sampling configuration.
        sampler: SamplerState,
    },
    /// The raster state was applied.
    SetRenderState(RenderState),
    /// Attachments were cleared.
    Clear(ClearRequest),
    /// A non-indexed draw.
    Draw {
        /// Primitive assembly.
        topology: PrimitiveTopology,
        /// Rasterization.
        polygon_mode: PolygonMode,
        /// First vertex.
        first: u32,
        /// Vertex count.
        count: u32,
        /// Instance count.
        instances: u32,
    },
    /// An indexed draw.
    DrawIndexed {
        /// Primitive assembly.
        topology: PrimitiveTopology,
        /// Rasterization.
        polygon_mode: PolygonMode,
        /// First index.
        first: u32,
        /// Index count.
        count: u32,
        /// Instance count.
        instances: u32,
    },
    /// A texture-to-texture copy.
    Blit {
        /// Source texture.
        source: TextureId,
        /// Destination texture.
        destination: TextureId,
    },
}

/// A shared, append-only log of [`DeviceAction`]s.
///
/// Cloning the journal yields another view of the same log.
#[derive(Debug, Clone, Default)]
pub struct DeviceJournal {
    actions: Arc<Mutex<Vec<DeviceAction>>>,
}

impl DeviceJournal {
    /// Creates an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an action.
    pub fn record(&self, action: DeviceAction) {
        log::trace!("Headless device: {action:?}");
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(action);
    }

    /// Returns a copy of every action recorded so far.
    pub fn snapshot(&self) -> Vec<DeviceAction> {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Removes and returns every action recorded so far.
    pub fn take(&self) -> Vec<DeviceAction> {
        std::mem::take(&mut *self.actions.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of recorded actions.
    pub fn len(&self) -> usize {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of recorded actions matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&DeviceAction) -> bool) -> usize {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|action| predicate(action))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_log() {
        let journal = DeviceJournal::new();
        let view = journal.clone();
        journal.record(DeviceAction::BeginFrame);
        journal.record(DeviceAction::Submit { commands: 0 });
        assert_eq!(view.len(), 2);
        assert_eq!(
            view.count(|a| matches!(a, DeviceAction::Submit { .. })),
            1
        );
        assert_eq!(view.take().len(), 2);
        assert!(journal.is_empty());
    }
}
