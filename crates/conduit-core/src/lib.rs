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

//! # Conduit Core
//!
//! Foundational crate containing the graphics device contracts, core types and
//! the frame-level primitives shared by the producer (scripting) side and the
//! render side of the engine.

#![warn(missing_docs)]

pub mod cancellation;
pub mod device;
pub mod frame;
pub mod handle;
pub mod renderer;
pub mod settings;

pub use cancellation::CancellationToken;
pub use device::{DeviceConfiguration, DeviceContext, DeviceEvent, DeviceGeneration};
pub use frame::{FrameIndex, FrameSlotValue, PerFrameValue, MAX_FRAMES_IN_FLIGHT};
pub use handle::{Handle, UniformLocation};
pub use settings::{EngineSettings, SettingsError, UniformOverflow};
