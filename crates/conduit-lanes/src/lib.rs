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

//! # Conduit Lanes
//!
//! The render side of the command engine:
//!
//! - [`resource`]: the handle table and generation-aware resource records.
//! - [`binder`]: uniform reflection, retained uniform values and attribute maps.
//! - [`engine`]: the [`Engine`] with its synchronous API and opcode handlers.
//! - [`scheduler`]: the per-frame state machine and the [`RenderLoop`].
//! - [`compile`]: asynchronous shader compilation.

#![warn(missing_docs)]

pub mod binder;
pub mod compile;
pub mod engine;
pub mod resource;
pub mod scheduler;

pub use binder::{pack_vec4, UniformRef};
pub use compile::CompileCompletion;
pub use engine::Engine;
pub use scheduler::{
    FrameCallback, FramePhase, FramePixels, FrameReport, FrameStats, PendingReadback,
    RenderLoop, ResetCallback,
};
