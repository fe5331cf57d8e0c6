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

//! The command stream protocol.
//!
//! # Wire format
//!
//! A buffer is a flat sequence of `u32` words. Every value, including the opcode
//! that starts an entry, is preceded by a [`ValueTag`] word:
//!
//! ```text
//! [Opcode tag][opcode] [Handle tag][handle] [F32Array tag][len][f32 bits]...
//! ```
//!
//! Arrays and strings carry their element (or byte) length after the tag. Strings
//! are UTF-8, zero-padded to a word boundary.
//!
//! The reader checks the tag of every value against the type its handler asks for.
//! Any disagreement means the producer and the consumer are out of sync, and is
//! reported as a [`ProtocolError`](conduit_core::renderer::ProtocolError).

mod opcode;
mod reader;
mod recorder;
mod value;
mod writer;

pub use self::opcode::Opcode;
pub use self::reader::CommandReader;
pub use self::recorder::{CommandQueue, CommandRecorder};
pub use self::value::ValueTag;
pub use self::writer::{CommandBuffer, CommandWriter};
