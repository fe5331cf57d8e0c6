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

//! Resource records and their lifecycle.
//!
//! Every resource created through the engine lives in one [`ResourceTable`]
//! under a [`Handle`](conduit_core::Handle). Device-side objects are wrapped in
//! [`DeviceObject`]s that remember the device generation they were created in;
//! releasing a record only calls into the device when that generation is still
//! the current one.

mod handle;
mod object;
mod records;
mod table;

pub use self::handle::HandleAllocator;
pub use self::object::DeviceObject;
pub use self::records::{
    BufferRecord, FrameBufferRecord, FrameBufferTarget, IndexBufferSlot, ProgramData,
    ProgramRecord, ProgramState, TextureRecord, VertexArrayRecord, VertexBufferSlot,
};
pub use self::table::{Resource, ResourceKind, ResourceTable};
