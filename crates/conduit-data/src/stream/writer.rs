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

use super::{CommandReader, Opcode, ValueTag};
use conduit_core::Handle;

/// A sealed, immutable frame's worth of recorded commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandBuffer {
    words: Vec<u32>,
    commands: usize,
}

impl CommandBuffer {
    /// Returns a cursor positioned at the first entry.
    pub fn reader(&self) -> CommandReader<'_> {
        CommandReader::new(&self.words)
    }

    /// The raw words of the buffer.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Number of entries recorded into the buffer.
    pub fn command_count(&self) -> usize {
        self.commands
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Wraps raw words, e.g. received from another process.
    ///
    /// The command count is unknown for such buffers and reported as `0`.
    pub fn from_words(words: Vec<u32>) -> Self {
        Self { words, commands: 0 }
    }
}

/// Appends type-tagged values to a growable word buffer.
///
/// Every entry starts with [`begin`](Self::begin), followed by exactly the
/// arguments its handler reads, in order.
#[derive(Debug, Default)]
pub struct CommandWriter {
    words: Vec<u32>,
    commands: usize,
}

impl CommandWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty writer with room for `words` words.
    pub fn with_capacity(words: usize) -> Self {
        Self {
            words: Vec::with_capacity(words),
            commands: 0,
        }
    }

    /// Starts a new entry.
    pub fn begin(&mut self, opcode: Opcode) -> &mut Self {
        self.commands += 1;
        self.tagged(ValueTag::Opcode, opcode as u32)
    }

    /// Appends a `u32`.
    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.tagged(ValueTag::U32, value)
    }

    /// Appends an `i32`.
    pub fn i32(&mut self, value: i32) -> &mut Self {
        self.tagged(ValueTag::I32, value as u32)
    }

    /// Appends an `f32`.
    pub fn f32(&mut self, value: f32) -> &mut Self {
        self.tagged(ValueTag::F32, value.to_bits())
    }

    /// Appends a `bool`.
    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.tagged(ValueTag::Bool, value as u32)
    }

    /// Appends a resource handle.
    pub fn handle(&mut self, value: Handle) -> &mut Self {
        self.tagged(ValueTag::Handle, value.0)
    }

    /// Appends a length-prefixed `f32` array.
    pub fn f32_array(&mut self, values: &[f32]) -> &mut Self {
        self.tagged(ValueTag::F32Array, wire_len(values.len()));
        self.words.extend_from_slice(bytemuck::cast_slice(values));
        self
    }

    /// Appends a length-prefixed `u32` array.
    pub fn u32_array(&mut self, values: &[u32]) -> &mut Self {
        self.tagged(ValueTag::U32Array, wire_len(values.len()));
        self.words.extend_from_slice(values);
        self
    }

    /// Appends a length-prefixed `i32` array.
    pub fn i32_array(&mut self, values: &[i32]) -> &mut Self {
        self.tagged(ValueTag::I32Array, wire_len(values.len()));
        self.words.extend_from_slice(bytemuck::cast_slice(values));
        self
    }

    /// Appends a length-prefixed UTF-8 string, zero-padded to a word boundary.
    pub fn str(&mut self, value: &str) -> &mut Self {
        let bytes = value.as_bytes();
        self.tagged(ValueTag::String, wire_len(bytes.len()));
        for chunk in bytes.chunks(4) {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            self.words.push(u32::from_ne_bytes(word));
        }
        self
    }

    /// Number of words written since the last seal.
    pub fn len_words(&self) -> usize {
        self.words.len()
    }

    /// Number of entries started since the last seal.
    pub fn command_count(&self) -> usize {
        self.commands
    }

    /// Returns `true` if nothing was written since the last seal.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Takes everything written so far as a sealed buffer, leaving the writer empty.
    pub fn seal(&mut self) -> CommandBuffer {
        CommandBuffer {
            words: std::mem::take(&mut self.words),
            commands: std::mem::replace(&mut self.commands, 0),
        }
    }

    fn tagged(&mut self, tag: ValueTag, word: u32) -> &mut Self {
        self.words.push(tag as u32);
        self.words.push(word);
        self
    }
}

fn wire_len(len: usize) -> u32 {
    debug_assert!(len <= u32::MAX as usize, "payload too long for the wire");
    len as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_take_two_words() {
        let mut writer = CommandWriter::new();
        writer.begin(Opcode::SetDepthWrite).bool(true);
        assert_eq!(
            writer.seal().words(),
            &[
                ValueTag::Opcode as u32,
                Opcode::SetDepthWrite as u32,
                ValueTag::Bool as u32,
                1
            ]
        );
    }

    #[test]
    fn strings_are_padded_to_words() {
        let mut writer = CommandWriter::new();
        writer.str("abcde");
        // tag, length, two payload words
        assert_eq!(writer.len_words(), 4);
    }

    #[test]
    fn seal_resets_the_writer() {
        let mut writer = CommandWriter::new();
        writer.begin(Opcode::DiscardAllTextures);
        writer.begin(Opcode::DiscardAllTextures);
        let buffer = writer.seal();
        assert_eq!(buffer.command_count(), 2);
        assert!(writer.is_empty());
        assert_eq!(writer.command_count(), 0);
    }
}
