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

//! Backend-agnostic rendering API.
//!
//! Organized into several logical sub-modules:
//!
//! - **[`buffer`]**: vertex/index buffer handles, vertex layouts.
//! - **[`texture`]**: texture handles, formats and sampler state.
//! - **[`framebuffer`]**: render targets and clear requests.
//! - **[`program`]**: compiled shaders, reflection and uniform metadata.
//! - **[`state`]**: the retained depth/stencil/blend/raster state.
//! - **[`draw`]**: draw calls and primitive topologies.

pub mod buffer;
pub mod draw;
pub mod framebuffer;
pub mod program;
pub mod state;
pub mod texture;

pub use self::buffer::*;
pub use self::draw::*;
pub use self::framebuffer::*;
pub use self::program::*;
pub use self::state::*;
pub use self::texture::*;
