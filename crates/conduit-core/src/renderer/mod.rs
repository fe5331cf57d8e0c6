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

//! Provides the public, backend-agnostic rendering contracts.
//!
//! This module defines the "common language" between the command engine and
//! whatever graphics backend sits underneath it. It contains the abstract
//! `traits` (like [`GraphicsDevice`] and [`Encoder`]), the data structures the
//! engine hands to a device (like [`BufferDescriptor`]), and the error types
//! shared by every layer.
//!
//! The 'how' is handled by a concrete backend implementation (see the
//! `conduit-infra` crate) which implements these traits. The engine in
//! `conduit-lanes` only ever talks to the device through them.

pub mod api;
pub mod error;
pub mod traits;

// Re-export the most important traits and types for easier use.
pub use self::api::*;
pub use self::error::{ProtocolError, RenderError, ResourceError, ShaderError};
pub use self::traits::{Encoder, GraphicsDevice, ShaderCompiler};
