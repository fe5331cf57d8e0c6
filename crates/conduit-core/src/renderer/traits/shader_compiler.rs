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

use crate::renderer::api::CompiledShaders;
use crate::renderer::error::ShaderError;
use std::fmt::Debug;

/// Compiles shader sources into device binaries and reflection data.
///
/// Implementations run on worker threads for asynchronous program creation,
/// hence the `Send + Sync` bound.
pub trait ShaderCompiler: Send + Sync + Debug + 'static {
    /// Compiles a vertex/fragment source pair.
    /// ## Arguments
    /// * `vertex_source` - The vertex stage source text.
    /// * `fragment_source` - The fragment stage source text.
    /// ## Returns
    /// The compiled stages together with the uniforms and attributes they declare.
    /// ## Errors
    /// * `ShaderError` - If either stage is empty or fails to compile.
    fn compile(
        &self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<CompiledShaders, ShaderError>;
}
