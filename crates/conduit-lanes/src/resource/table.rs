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

use super::{
    BufferRecord, FrameBufferRecord, HandleAllocator, ProgramRecord, TextureRecord,
    VertexArrayRecord,
};
use conduit_core::renderer::{RenderError, ResourceError};
use conduit_core::{DeviceContext, Handle};
use std::collections::HashMap;

/// The kind of record a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A shader program.
    Program,
    /// A vertex buffer.
    VertexBuffer,
    /// An index buffer.
    IndexBuffer,
    /// A vertex array.
    VertexArray,
    /// A texture.
    Texture,
    /// A framebuffer.
    FrameBuffer,
}

impl ResourceKind {
    /// Human readable name, used in error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            ResourceKind::Program => "program",
            ResourceKind::VertexBuffer => "vertex buffer",
            ResourceKind::IndexBuffer => "index buffer",
            ResourceKind::VertexArray => "vertex array",
            ResourceKind::Texture => "texture",
            ResourceKind::FrameBuffer => "framebuffer",
        }
    }
}

/// A record stored behind a handle.
#[derive(Debug)]
pub enum Resource {
    /// A shader program.
    Program(ProgramRecord),
    /// A vertex buffer.
    VertexBuffer(BufferRecord),
    /// An index buffer.
    IndexBuffer(BufferRecord),
    /// A vertex array.
    VertexArray(VertexArrayRecord),
    /// A texture.
    Texture(TextureRecord),
    /// A framebuffer.
    FrameBuffer(FrameBufferRecord),
}

impl Resource {
    /// The kind of this record.
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Program(_) => ResourceKind::Program,
            Resource::VertexBuffer(_) => ResourceKind::VertexBuffer,
            Resource::IndexBuffer(_) => ResourceKind::IndexBuffer,
            Resource::VertexArray(_) => ResourceKind::VertexArray,
            Resource::Texture(_) => ResourceKind::Texture,
            Resource::FrameBuffer(_) => ResourceKind::FrameBuffer,
        }
    }

    /// Releases the device objects owned by the record.
    ///
    /// Returns `Ok(true)` if at least one device destroy call was made.
    pub fn release(self, context: &DeviceContext) -> Result<bool, ResourceError> {
        match self {
            Resource::Program(record) => record.release(context),
            Resource::VertexBuffer(record) | Resource::IndexBuffer(record) => {
                record.release(context)
            }
            Resource::VertexArray(_) => Ok(false),
            Resource::Texture(record) => record.release(context),
            Resource::FrameBuffer(record) => record.release(context),
        }
    }
}

macro_rules! typed_access {
    ($get:ident, $get_mut:ident, $variant:ident, $record:ty, $doc:literal) => {
        #[doc = concat!("Returns the ", $doc, " behind `handle`.")]
        pub fn $get(&self, handle: Handle) -> Result<&$record, RenderError> {
            match self.records.get(&handle) {
                Some(Resource::$variant(record)) => Ok(record),
                _ => Err(stale(handle, ResourceKind::$variant)),
            }
        }

        #[doc = concat!("Returns the ", $doc, " behind `handle`, mutably.")]
        pub fn $get_mut(&mut self, handle: Handle) -> Result<&mut $record, RenderError> {
            match self.records.get_mut(&handle) {
                Some(Resource::$variant(record)) => Ok(record),
                _ => Err(stale(handle, ResourceKind::$variant)),
            }
        }
    };
}

fn stale(handle: Handle, kind: ResourceKind) -> RenderError {
    RenderError::StaleHandle {
        handle: handle.0,
        kind: kind.name(),
    }
}

/// Maps handles to resource records.
///
/// All kinds share one handle space. A handle that was removed, never handed
/// out, or refers to another kind of record is reported as
/// [`RenderError::StaleHandle`].
#[derive(Debug, Default)]
pub struct ResourceTable {
    records: HashMap<Handle, Resource>,
    handles: HandleAllocator,
}

impl ResourceTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record under a fresh handle.
    pub fn insert(&mut self, resource: Resource) -> Result<Handle, RenderError> {
        let handle = self.handles.allocate()?;
        log::trace!("Registered {} {handle}.", resource.kind().name());
        self.records.insert(handle, resource);
        Ok(handle)
    }

    /// Returns the kind of the record behind `handle`, if any.
    pub fn kind_of(&self, handle: Handle) -> Option<ResourceKind> {
        self.records.get(&handle).map(Resource::kind)
    }

    /// Removes the record behind `handle` if it has the expected kind.
    pub fn remove(&mut self, handle: Handle, kind: ResourceKind) -> Result<Resource, RenderError> {
        if self.kind_of(handle) != Some(kind) {
            return Err(stale(handle, kind));
        }
        self.records.remove(&handle).ok_or_else(|| stale(handle, kind))
    }

    /// Removes a record and releases its device objects.
    ///
    /// The record is gone afterwards even if the device refused the destroy call.
    pub fn release(
        &mut self,
        handle: Handle,
        kind: ResourceKind,
        context: &DeviceContext,
    ) -> Result<bool, RenderError> {
        let destroyed = self.remove(handle, kind)?.release(context)?;
        log::debug!(
            "Released {} {handle}{}.",
            kind.name(),
            if destroyed { "" } else { " without device calls" }
        );
        Ok(destroyed)
    }

    /// Releases every record. Returns the number of records dropped.
    pub fn release_all(&mut self, context: &DeviceContext) -> usize {
        let count = self.records.len();
        for (handle, resource) in self.records.drain() {
            let kind = resource.kind();
            if let Err(e) = resource.release(context) {
                log::warn!("Failed to release {} {handle}: {e}", kind.name());
            }
        }
        count
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no record is live.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over every program record.
    pub fn programs_mut(&mut self) -> impl Iterator<Item = (Handle, &mut ProgramRecord)> {
        self.records.iter_mut().filter_map(|(handle, resource)| match resource {
            Resource::Program(record) => Some((*handle, record)),
            _ => None,
        })
    }

    /// Handles of the programs whose compile has not been published yet.
    pub fn pending_programs(&self) -> Vec<Handle> {
        let mut pending: Vec<Handle> = self
            .records
            .iter()
            .filter_map(|(handle, resource)| match resource {
                Resource::Program(record) if record.is_pending() => Some(*handle),
                _ => None,
            })
            .collect();
        pending.sort();
        pending
    }

    typed_access!(program, program_mut, Program, ProgramRecord, "program");
    typed_access!(
        vertex_buffer,
        vertex_buffer_mut,
        VertexBuffer,
        BufferRecord,
        "vertex buffer"
    );
    typed_access!(
        index_buffer,
        index_buffer_mut,
        IndexBuffer,
        BufferRecord,
        "index buffer"
    );
    typed_access!(
        vertex_array,
        vertex_array_mut,
        VertexArray,
        VertexArrayRecord,
        "vertex array"
    );
    typed_access!(texture, texture_mut, Texture, TextureRecord, "texture");
    typed_access!(
        frame_buffer,
        frame_buffer_mut,
        FrameBuffer,
        FrameBufferRecord,
        "framebuffer"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_not_reused_after_removal() {
        let mut table = ResourceTable::new();
        let first = table
            .insert(Resource::VertexArray(VertexArrayRecord::default()))
            .expect("insert");
        table
            .remove(first, ResourceKind::VertexArray)
            .expect("remove");
        let second = table
            .insert(Resource::VertexArray(VertexArrayRecord::default()))
            .expect("insert");

        assert_ne!(first, second);
        assert!(table.vertex_array(first).is_err());
    }

    #[test]
    fn wrong_kind_is_a_stale_handle_and_keeps_the_record() {
        let mut table = ResourceTable::new();
        let handle = table
            .insert(Resource::Texture(TextureRecord::empty()))
            .expect("insert");

        let err = table
            .remove(handle, ResourceKind::Program)
            .expect_err("kind mismatch");

        assert_eq!(
            err,
            RenderError::StaleHandle {
                handle: handle.0,
                kind: "program"
            }
        );
        assert_eq!(table.kind_of(handle), Some(ResourceKind::Texture));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn unknown_handle_is_stale() {
        let table = ResourceTable::new();
        assert!(matches!(
            table.texture(Handle(42)),
            Err(RenderError::StaleHandle { handle: 42, .. })
        ));
    }
}
