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

//! Defines data structures related to vertex and index buffers.

use std::borrow::Cow;

/// An opaque handle to a device-side vertex or index buffer.
///
/// This ID is returned by [`GraphicsDevice::create_buffer`] and is used to reference
/// the buffer in all subsequent device operations.
///
/// [`GraphicsDevice::create_buffer`]: crate::renderer::GraphicsDevice::create_buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub usize);

/// Specifies the data type of indices in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// Indices are 16-bit unsigned integers.
    Uint16,
    /// Indices are 32-bit unsigned integers.
    Uint32,
}

impl IndexFormat {
    /// Size of one index in bytes.
    pub const fn size(&self) -> usize {
        match self {
            IndexFormat::Uint16 => 2,
            IndexFormat::Uint32 => 4,
        }
    }
}

/// What a buffer will be bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Per-vertex (or per-instance) attribute data.
    Vertex,
    /// Index data of the given format.
    Index(IndexFormat),
}

/// A descriptor used to create a [`BufferId`].
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// An optional debug label for the buffer.
    pub label: Option<Cow<'a, str>>,
    /// What the buffer will be bound as.
    pub kind: BufferKind,
    /// If `true`, the contents may be rewritten after creation.
    pub dynamic: bool,
}

/// The scalar type of a vertex attribute component.
///
/// The numeric codes used by the scripting side are the GL component type enums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexComponentType {
    /// Signed 8-bit integer.
    Int8,
    /// Unsigned 8-bit integer.
    Uint8,
    /// Signed 16-bit integer.
    Int16,
    /// Unsigned 16-bit integer.
    Uint16,
    /// Signed 32-bit integer.
    Int32,
    /// Unsigned 32-bit integer.
    Uint32,
    /// 32-bit float.
    Float32,
}

impl VertexComponentType {
    /// Converts a GL component type enum (`GL_BYTE` .. `GL_FLOAT`).
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0x1400 => Some(Self::Int8),
            0x1401 => Some(Self::Uint8),
            0x1402 => Some(Self::Int16),
            0x1403 => Some(Self::Uint16),
            0x1404 => Some(Self::Int32),
            0x1405 => Some(Self::Uint32),
            0x1406 => Some(Self::Float32),
            _ => None,
        }
    }

    /// Size of one component in bytes.
    pub const fn size(&self) -> u32 {
        match self {
            Self::Int8 | Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
        }
    }
}

/// Describes how one vertex attribute is fetched from a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttributeLayout {
    /// The input location of this attribute in the vertex shader.
    pub location: u32,
    /// The byte offset of the first element in the buffer.
    pub offset: u32,
    /// The byte distance between consecutive elements.
    pub stride: u32,
    /// Number of components per element (1 to 4).
    pub components: u8,
    /// Component scalar type.
    pub component_type: VertexComponentType,
    /// If `true`, integer components are normalized to `[0, 1]` / `[-1, 1]`.
    pub normalized: bool,
    /// `0` for per-vertex data, otherwise the instance step rate.
    pub divisor: u32,
}

impl VertexAttributeLayout {
    /// Size in bytes of a single attribute element.
    pub const fn element_size(&self) -> u32 {
        self.components as u32 * self.component_type.size()
    }
}

/// A vertex buffer bound at draw time together with its attribute layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBufferBinding {
    /// The device buffer.
    pub buffer: BufferId,
    /// How the attribute is read from it.
    pub layout: VertexAttributeLayout,
}

/// An index buffer bound at draw time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBufferBinding {
    /// The device buffer.
    pub buffer: BufferId,
    /// The format of the stored indices.
    pub format: IndexFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_codes_match_gl_enums() {
        assert_eq!(
            VertexComponentType::from_code(0x1406),
            Some(VertexComponentType::Float32)
        );
        assert_eq!(
            VertexComponentType::from_code(0x1401),
            Some(VertexComponentType::Uint8)
        );
        assert_eq!(VertexComponentType::from_code(0x1407), None);
    }

    #[test]
    fn element_size_accounts_for_component_count() {
        let layout = VertexAttributeLayout {
            location: 0,
            offset: 0,
            stride: 12,
            components: 3,
            component_type: VertexComponentType::Float32,
            normalized: false,
            divisor: 0,
        };
        assert_eq!(layout.element_size(), 12);
    }
}
