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

/// The type tag written before every value on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ValueTag {
    /// The start of an entry: one opcode word follows.
    Opcode = 0xC0D0_0001,
    /// One `u32` word follows.
    U32 = 0xC0D0_0002,
    /// One `i32` word follows.
    I32 = 0xC0D0_0003,
    /// One `f32` word follows (IEEE-754 bits).
    F32 = 0xC0D0_0004,
    /// One word follows, `0` or `1`.
    Bool = 0xC0D0_0005,
    /// One resource handle word follows.
    Handle = 0xC0D0_0006,
    /// An element count follows, then that many `f32` words.
    F32Array = 0xC0D0_0007,
    /// An element count follows, then that many `u32` words.
    U32Array = 0xC0D0_0008,
    /// An element count follows, then that many `i32` words.
    I32Array = 0xC0D0_0009,
    /// A byte length follows, then the UTF-8 bytes padded to whole words.
    String = 0xC0D0_000A,
}

impl ValueTag {
    /// Decodes a raw tag word.
    pub fn from_word(word: u32) -> Option<Self> {
        Some(match word {
            0xC0D0_0001 => Self::Opcode,
            0xC0D0_0002 => Self::U32,
            0xC0D0_0003 => Self::I32,
            0xC0D0_0004 => Self::F32,
            0xC0D0_0005 => Self::Bool,
            0xC0D0_0006 => Self::Handle,
            0xC0D0_0007 => Self::F32Array,
            0xC0D0_0008 => Self::U32Array,
            0xC0D0_0009 => Self::I32Array,
            0xC0D0_000A => Self::String,
            _ => return None,
        })
    }

    /// The human-readable type name used in protocol errors.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Opcode => "opcode",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::F32 => "f32",
            Self::Bool => "bool",
            Self::Handle => "handle",
            Self::F32Array => "f32 array",
            Self::U32Array => "u32 array",
            Self::I32Array => "i32 array",
            Self::String => "string",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_decode_from_their_word() {
        for tag in [
            ValueTag::Opcode,
            ValueTag::U32,
            ValueTag::Bool,
            ValueTag::F32Array,
            ValueTag::String,
        ] {
            assert_eq!(ValueTag::from_word(tag as u32), Some(tag));
        }
        assert_eq!(ValueTag::from_word(7), None);
    }
}
