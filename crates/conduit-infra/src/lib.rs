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

//! # Conduit Infra
//!
//! Concrete implementations of the contracts defined in `conduit-core`:
//!
//! - [`headless`]: a CPU-side [`GraphicsDevice`](conduit_core::renderer::GraphicsDevice)
//!   that keeps resource contents in memory and journals every call.
//! - [`shader`]: a [`ShaderCompiler`](conduit_core::renderer::ShaderCompiler) that
//!   reflects GLSL declarations without generating real bytecode.

#![warn(missing_docs)]

pub mod headless;
pub mod shader;

pub use headless::{
    DeviceAction, DeviceJournal, HeadlessDevice, HeadlessEncoder, MAX_TEXTURE_DIMENSION,
};
pub use shader::GlslReflector;
