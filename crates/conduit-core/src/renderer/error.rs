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

//! Defines the hierarchy of error types for the rendering subsystem.
//!
//! The hierarchy follows the four failure classes of the engine:
//!
//! - [`ProtocolError`]: the command stream was read with a different shape than
//!   it was written. Fatal for the current drain.
//! - [`RenderError::StaleHandle`] / [`RenderError::InvalidOperation`]: the caller
//!   targeted something that no longer exists or is in the wrong state.
//! - [`ResourceError`]: the device refused to create or update a resource.
//! - [`RenderError::Unsupported`]: an entry point that is deliberately not
//!   implemented.

use crate::renderer::api::ShaderStage;
use thiserror::Error;

/// A violation of the command stream protocol.
///
/// These errors mean the producer and the consumer of the stream disagree about
/// its layout. They are never retried and never skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A read needed more words than remained in the buffer.
    #[error("command stream underrun at word {position}: needed {needed} word(s), {available} available")]
    Underrun {
        /// Word offset of the read cursor.
        position: usize,
        /// Number of words the read required.
        needed: usize,
        /// Number of words that were left.
        available: usize,
    },
    /// The value on the wire was written with a different type than the reader expected.
    #[error("command stream type mismatch at word {position}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Word offset of the read cursor.
        position: usize,
        /// The type the handler asked for.
        expected: &'static str,
        /// The type found on the wire.
        found: &'static str,
    },
    /// A type tag that is not part of the protocol.
    #[error("unknown value tag {tag:#x} at word {position}")]
    UnknownTag {
        /// Word offset of the read cursor.
        position: usize,
        /// The raw tag.
        tag: u32,
    },
    /// An opcode that is not part of the protocol.
    #[error("unknown opcode {code:#x} at word {position}")]
    UnknownOpcode {
        /// Word offset of the read cursor.
        position: usize,
        /// The raw opcode.
        code: u32,
    },
    /// A string payload that is not valid UTF-8.
    #[error("invalid UTF-8 string payload at word {position}")]
    InvalidString {
        /// Word offset of the read cursor.
        position: usize,
    },
    /// The drain finished while words were still left in the buffer.
    #[error("command stream not exhausted: {remaining} word(s) left unread")]
    Trailing {
        /// Number of unread words.
        remaining: usize,
    },
}

/// An error related to the compilation of a shader program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShaderError {
    /// The shader source for a stage was empty.
    #[error("empty {0:?} shader source")]
    EmptySource(ShaderStage),
    /// The shader source failed to compile.
    #[error("shader compilation failed for '{label}': {details}")]
    CompilationError {
        /// A descriptive label for the shader.
        label: String,
        /// Detailed error messages from the shader compiler.
        details: String,
    },
    /// The compilation was cancelled before its result was published.
    #[error("shader compilation was cancelled")]
    Cancelled,
}

/// An error related to the creation or use of a device resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// A shader-specific error occurred.
    #[error("shader resource error: {0}")]
    Shader(#[from] ShaderError),
    /// The device does not know the given id.
    #[error("resource not found with ID")]
    NotFound,
    /// An attempt was made to access a resource out of its bounds.
    #[error("resource access out of bounds")]
    OutOfBounds,
    /// The requested format or layout is not supported by the device.
    #[error("unsupported resource format: {0}")]
    UnsupportedFormat(String),
    /// An error originating from the specific graphics backend implementation.
    #[error("backend-specific resource error: {0}")]
    Backend(String),
}

/// A high-level error surfaced by the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// The command stream was desynchronized. Aborts the drain.
    #[error("command stream protocol violation: {0}")]
    Protocol(#[from] ProtocolError),
    /// A handle that was deleted, never created, or refers to another kind of resource.
    #[error("stale handle {handle} ({kind})")]
    StaleHandle {
        /// The raw handle value.
        handle: u32,
        /// The kind of resource the operation expected.
        kind: &'static str,
    },
    /// The operation is not legal in the current engine state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// The entry point is explicitly not implemented.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    /// The device failed to create or update a resource.
    #[error("graphics resource operation failed: {0}")]
    Resource(#[from] ResourceError),
    /// The device is currently lost and cannot accept a frame.
    #[error("the graphics device is lost")]
    DeviceLost,
}

impl From<ShaderError> for RenderError {
    fn from(err: ShaderError) -> Self {
        RenderError::Resource(ResourceError::Shader(err))
    }
}

impl RenderError {
    /// Returns `true` if this error must abort the current drain.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RenderError::Protocol(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn protocol_error_display() {
        let err = ProtocolError::Underrun {
            position: 12,
            needed: 4,
            available: 1,
        };
        assert_eq!(
            format!("{err}"),
            "command stream underrun at word 12: needed 4 word(s), 1 available"
        );
    }

    #[test]
    fn render_error_wraps_shader_error() {
        let shader_err = ShaderError::CompilationError {
            label: "basic".to_string(),
            details: "syntax error".to_string(),
        };
        let render_err: RenderError = shader_err.into();
        assert_eq!(
            format!("{render_err}"),
            "graphics resource operation failed: shader resource error: shader compilation failed for 'basic': syntax error"
        );
        assert!(render_err.source().is_some());
        assert!(!render_err.is_fatal());
    }

    #[test]
    fn only_protocol_errors_are_fatal() {
        let fatal: RenderError = ProtocolError::Trailing { remaining: 2 }.into();
        assert!(fatal.is_fatal());
        assert!(!RenderError::StaleHandle {
            handle: 3,
            kind: "texture"
        }
        .is_fatal());
        assert!(!RenderError::Unsupported("image bitmaps").is_fatal());
    }
}
