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

use conduit_core::renderer::{
    AttributeDeclaration, CompiledShaders, ShaderBinary, ShaderCompiler, ShaderError, ShaderStage,
    UniformDeclaration, UniformKind,
};

/// A [`ShaderCompiler`] that reflects GLSL declarations.
///
/// No code is generated: the "bytecode" of each stage is its source text. The
/// reflector recognizes top-level `uniform <type> <name>[N];` declarations in
/// both stages and `attribute|in <type> <name>;` inputs in the vertex stage.
/// Precision qualifiers are skipped. A `#error` directive fails compilation.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlslReflector;

impl GlslReflector {
    /// Creates a reflector.
    pub fn new() -> Self {
        Self
    }

    fn compile_stage(&self, stage: ShaderStage, source: &str) -> Result<ShaderBinary, ShaderError> {
        if source.trim().is_empty() {
            return Err(ShaderError::EmptySource(stage));
        }

        let mut code = String::with_capacity(source.len());
        for line in source.lines() {
            let trimmed = line.trim_start();
            if let Some(message) = trimmed.strip_prefix("#error") {
                return Err(ShaderError::CompilationError {
                    label: stage_label(stage).to_string(),
                    details: message.trim().to_string(),
                });
            }
            if trimmed.starts_with('#') {
                continue;
            }
            let without_comment = match line.find("//") {
                Some(index) => &line[..index],
                None => line,
            };
            code.push_str(without_comment);
            code.push('\n');
        }

        let mut uniforms = Vec::new();
        let mut attributes = Vec::new();
        for statement in code.split([';', '{', '}']) {
            let tokens: Vec<&str> = statement
                .split_whitespace()
                .filter(|t| !matches!(*t, "highp" | "mediump" | "lowp" | "flat"))
                .collect();
            match tokens.as_slice() {
                ["uniform", ty, rest @ ..] if !rest.is_empty() => {
                    let (name, count) = parse_declarator(&rest.concat(), stage)?;
                    let kind = uniform_kind(ty).ok_or_else(|| ShaderError::CompilationError {
                        label: stage_label(stage).to_string(),
                        details: format!("unsupported uniform type '{ty}' for '{name}'"),
                    })?;
                    uniforms.push(UniformDeclaration { name, kind, count });
                }
                ["attribute" | "in", _ty, name] if stage == ShaderStage::Vertex => {
                    attributes.push(AttributeDeclaration {
                        name: name.to_string(),
                        location: attributes.len() as u32,
                    });
                }
                _ => {}
            }
        }

        log::debug!(
            "GlslReflector: {} stage declares {} uniform(s) and {} attribute(s).",
            stage_label(stage),
            uniforms.len(),
            attributes.len()
        );

        Ok(ShaderBinary {
            stage,
            bytecode: source.as_bytes().to_vec(),
            uniforms,
            attributes,
        })
    }
}

impl ShaderCompiler for GlslReflector {
    fn compile(
        &self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<CompiledShaders, ShaderError> {
        Ok(CompiledShaders {
            vertex: self.compile_stage(ShaderStage::Vertex, vertex_source)?,
            fragment: self.compile_stage(ShaderStage::Fragment, fragment_source)?,
        })
    }
}

fn stage_label(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "vertex",
        ShaderStage::Fragment => "fragment",
    }
}

fn uniform_kind(ty: &str) -> Option<UniformKind> {
    match ty {
        "float" | "int" | "uint" | "bool" | "vec2" | "vec3" | "vec4" | "ivec2" | "ivec3"
        | "ivec4" | "uvec2" | "uvec3" | "uvec4" | "bvec2" | "bvec3" | "bvec4" | "mat2" => {
            Some(UniformKind::Vec4)
        }
        "mat3" => Some(UniformKind::Mat3),
        "mat4" => Some(UniformKind::Mat4),
        _ if ty.starts_with("sampler") || ty.starts_with("isampler") || ty.starts_with("usampler") => {
            Some(UniformKind::Sampler)
        }
        _ => None,
    }
}

/// Splits `name[N]` into the name and its array length (`1` without brackets).
fn parse_declarator(declarator: &str, stage: ShaderStage) -> Result<(String, u16), ShaderError> {
    let invalid = || ShaderError::CompilationError {
        label: stage_label(stage).to_string(),
        details: format!("malformed uniform declarator '{declarator}'"),
    };
    match declarator.split_once('[') {
        None => Ok((declarator.to_string(), 1)),
        Some((name, rest)) => {
            let count = rest
                .strip_suffix(']')
                .and_then(|n| n.trim().parse::<u16>().ok())
                .filter(|n| *n > 0)
                .ok_or_else(invalid)?;
            Ok((name.to_string(), count))
        }
    }
}
