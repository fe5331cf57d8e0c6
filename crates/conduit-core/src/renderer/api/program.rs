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

//! Compiled shader programs and the reflection data that accompanies them.

use std::borrow::Cow;

/// An opaque handle to a device-side linked program (vertex + fragment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub usize);

/// An opaque handle to a device-side uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformId(pub usize);

/// Defines the programmable stage a shader or uniform belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// The vertex shader stage.
    Vertex,
    /// The fragment (or pixel) shader stage.
    Fragment,
}

/// The storage class of a uniform as the device sees it.
///
/// Scalars and short vectors are all widened to `Vec4` elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    /// One `vec4` per element.
    Vec4,
    /// One 3x3 matrix per element.
    Mat3,
    /// One 4x4 matrix per element.
    Mat4,
    /// A texture sampler, set through texture bindings rather than values.
    Sampler,
}

impl UniformKind {
    /// Number of floats a single element occupies.
    pub const fn floats_per_element(&self) -> usize {
        match self {
            UniformKind::Vec4 => 4,
            UniformKind::Mat3 => 9,
            UniformKind::Mat4 => 16,
            UniformKind::Sampler => 0,
        }
    }
}

/// A uniform declared by a shader stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniformDeclaration {
    /// The name used in the shader source.
    pub name: String,
    /// The storage class.
    pub kind: UniformKind,
    /// Declared array length (`1` for non-arrays).
    pub count: u16,
}

/// A vertex attribute declared by the vertex stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeDeclaration {
    /// The name used in the shader source.
    pub name: String,
    /// The input location assigned by the compiler.
    pub location: u32,
}

/// The output of compiling a single stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderBinary {
    /// Which stage this binary is for.
    pub stage: ShaderStage,
    /// Backend bytecode.
    pub bytecode: Vec<u8>,
    /// Uniforms referenced by this stage.
    pub uniforms: Vec<UniformDeclaration>,
    /// Vertex inputs (empty for the fragment stage).
    pub attributes: Vec<AttributeDeclaration>,
}

/// A compiled vertex/fragment pair ready to be linked by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledShaders {
    /// The vertex stage.
    pub vertex: ShaderBinary,
    /// The fragment stage.
    pub fragment: ShaderBinary,
}

impl CompiledShaders {
    /// Iterates the uniforms of both stages, vertex stage first.
    pub fn uniforms(&self) -> impl Iterator<Item = (ShaderStage, &UniformDeclaration)> {
        self.vertex
            .uniforms
            .iter()
            .map(|u| (ShaderStage::Vertex, u))
            .chain(
                self.fragment
                    .uniforms
                    .iter()
                    .map(|u| (ShaderStage::Fragment, u)),
            )
    }
}

/// A descriptor used to create a [`UniformId`].
#[derive(Debug, Clone)]
pub struct UniformDescriptor<'a> {
    /// The uniform name.
    pub name: Cow<'a, str>,
    /// The storage class.
    pub kind: UniformKind,
    /// The declared array length.
    pub count: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary(stage: ShaderStage, names: &[&str]) -> ShaderBinary {
        ShaderBinary {
            stage,
            bytecode: Vec::new(),
            uniforms: names
                .iter()
                .map(|n| UniformDeclaration {
                    name: n.to_string(),
                    kind: UniformKind::Vec4,
                    count: 1,
                })
                .collect(),
            attributes: Vec::new(),
        }
    }

    #[test]
    fn uniforms_iterate_vertex_stage_first() {
        let shaders = CompiledShaders {
            vertex: binary(ShaderStage::Vertex, &["a", "b"]),
            fragment: binary(ShaderStage::Fragment, &["c"]),
        };
        let order: Vec<_> = shaders
            .uniforms()
            .map(|(stage, u)| (stage, u.name.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (ShaderStage::Vertex, "a"),
                (ShaderStage::Vertex, "b"),
                (ShaderStage::Fragment, "c"),
            ]
        );
    }

    #[test]
    fn element_widths() {
        assert_eq!(UniformKind::Vec4.floats_per_element(), 4);
        assert_eq!(UniformKind::Mat4.floats_per_element(), 16);
    }
}
