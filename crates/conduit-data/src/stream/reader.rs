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

use super::{Opcode, ValueTag};
use conduit_core::renderer::ProtocolError;
use conduit_core::Handle;

/// A read cursor over a sealed command buffer.
///
/// Each read names the type it expects. Reads never skip or coerce: a value
/// written with another type, or a buffer that ends mid-value, is a
/// [`ProtocolError`].
#[derive(Debug, Clone)]
pub struct CommandReader<'a> {
    words: &'a [u32],
    position: usize,
}

impl<'a> CommandReader<'a> {
    /// Creates a cursor at the start of `words`.
    pub fn new(words: &'a [u32]) -> Self {
        Self { words, position: 0 }
    }

    /// The word offset of the cursor.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of words left to read.
    pub fn remaining(&self) -> usize {
        self.words.len() - self.position
    }

    /// Returns `true` once every word has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Reads the opcode starting the next entry, or `None` at the end of the buffer.
    pub fn next_opcode(&mut self) -> Result<Option<Opcode>, ProtocolError> {
        if self.is_exhausted() {
            return Ok(None);
        }
        let position = self.position;
        let code = self.scalar(ValueTag::Opcode)?;
        Opcode::try_from(code)
            .map(Some)
            .map_err(|code| ProtocolError::UnknownOpcode { position, code })
    }

    /// Reads a `u32`.
    pub fn u32(&mut self) -> Result<u32, ProtocolError> {
        self.scalar(ValueTag::U32)
    }

    /// Reads an `i32`.
    pub fn i32(&mut self) -> Result<i32, ProtocolError> {
        self.scalar(ValueTag::I32).map(|word| word as i32)
    }

    /// Reads an `f32`.
    pub fn f32(&mut self) -> Result<f32, ProtocolError> {
        self.scalar(ValueTag::F32).map(f32::from_bits)
    }

    /// Reads a `bool`.
    pub fn bool(&mut self) -> Result<bool, ProtocolError> {
        self.scalar(ValueTag::Bool).map(|word| word != 0)
    }

    /// Reads a resource handle.
    pub fn handle(&mut self) -> Result<Handle, ProtocolError> {
        self.scalar(ValueTag::Handle).map(Handle)
    }

    /// Reads a length-prefixed `f32` array without copying it.
    pub fn f32_array(&mut self) -> Result<&'a [f32], ProtocolError> {
        let len = self.scalar(ValueTag::F32Array)? as usize;
        self.take(len).map(bytemuck::cast_slice)
    }

    /// Reads a length-prefixed `u32` array without copying it.
    pub fn u32_array(&mut self) -> Result<&'a [u32], ProtocolError> {
        let len = self.scalar(ValueTag::U32Array)? as usize;
        self.take(len)
    }

    /// Reads a length-prefixed `i32` array without copying it.
    pub fn i32_array(&mut self) -> Result<&'a [i32], ProtocolError> {
        let len = self.scalar(ValueTag::I32Array)? as usize;
        self.take(len).map(bytemuck::cast_slice)
    }

    /// Reads a length-prefixed UTF-8 string without copying it.
    pub fn str(&mut self) -> Result<&'a str, ProtocolError> {
        let position = self.position;
        let byte_len = self.scalar(ValueTag::String)? as usize;
        let words = self.take(byte_len.div_ceil(4))?;
        let bytes: &'a [u8] = bytemuck::cast_slice(words);
        std::str::from_utf8(&bytes[..byte_len])
            .map_err(|_| ProtocolError::InvalidString { position })
    }

    /// Checks that the whole buffer was consumed.
    pub fn finish(&self) -> Result<(), ProtocolError> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(ProtocolError::Trailing { remaining }),
        }
    }

    fn scalar(&mut self, expected: ValueTag) -> Result<u32, ProtocolError> {
        let position = self.position;
        let words = self.take(2)?;
        let found = ValueTag::from_word(words[0]).ok_or(ProtocolError::UnknownTag {
            position,
            tag: words[0],
        })?;
        if found != expected {
            self.position = position;
            return Err(ProtocolError::TypeMismatch {
                position,
                expected: expected.name(),
                found: found.name(),
            });
        }
        Ok(words[1])
    }

    fn take(&mut self, count: usize) -> Result<&'a [u32], ProtocolError> {
        let available = self.remaining();
        if count > available {
            return Err(ProtocolError::Underrun {
                position: self.position,
                needed: count,
                available,
            });
        }
        let words = &self.words[self.position..self.position + count];
        self.position += count;
        Ok(words)
    }
}
