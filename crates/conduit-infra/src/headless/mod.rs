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

//! A graphics device without a GPU.
//!
//! [`HeadlessDevice`] implements the full device contract on the CPU. Buffer,
//! texture and back buffer contents are kept in memory so read-backs return what
//! was written or cleared, and every device and encoder call is appended to a
//! shared [`DeviceJournal`] that tests use as the observable output.

mod device;
mod encoder;
mod journal;

pub use self::device::{HeadlessDevice, MAX_TEXTURE_DIMENSION};
pub use self::encoder::HeadlessEncoder;
pub use self::journal::{DeviceAction, DeviceJournal};
