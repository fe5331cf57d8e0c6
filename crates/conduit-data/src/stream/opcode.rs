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

use std::fmt;

macro_rules! opcodes {
    ($($(#[$doc:meta])* $name:ident = $code:literal,)*) => {
        /// Identifies the operation a command stream entry represents.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum Opcode {
            $($(#[$doc])* $name = $code,)*
        }

        impl Opcode {
            /// Every opcode, in code order.
            pub const ALL: &'static [Opcode] = &[$(Opcode::$name,)*];

            /// The name of the opcode, for logs.
            pub const fn name(&self) -> &'static str {
                match self {
                    $(Opcode::$name => stringify!($name),)*
                }
            }
        }

        impl TryFrom<u32> for Opcode {
            type Error = u32;

            fn try_from(code: u32) -> Result<Self, Self::Error> {
                match code {
                    $($code => Ok(Opcode::$name),)*
                    other => Err(other),
                }
            }
        }
    };
}

opcodes! {
    /// `(vertex array)`
    DeleteVertexArray = 1,
    /// `(vertex array)`
    BindVertexArray = 2,
    /// `(index buffer)`
    DeleteIndexBuffer = 3,
    /// `(vertex buffer)`
    DeleteVertexBuffer = 4,
    /// `(program)`
    SetProgram = 5,
    /// `(program)`
    DeleteProgram = 6,
    /// `(culling: bool, cull back faces: bool, z offset: f32, z offset units: f32, reverse side: bool)`
    SetState = 7,
    /// `(z offset: f32)`
    SetZOffset = 8,
    /// `(z offset units: f32)`
    SetZOffsetUnits = 9,
    /// `(GL depth function, 0 disables: u32)`
    SetDepthTest = 10,
    /// `(enabled: bool)`
    SetDepthWrite = 11,
    /// `(enabled: bool)`
    SetColorWrite = 12,
    /// `(alpha mode: u32)`
    SetBlendMode = 13,
    /// `(program, slot: u32, 16 x f32)`
    SetMatrix = 14,
    /// `(program, slot: u32, value: i32)`
    SetInt = 15,
    /// `(program, slot: u32, [i32])`
    SetIntArray = 16,
    /// `(program, slot: u32, [i32])`
    SetIntArray2 = 17,
    /// `(program, slot: u32, [i32])`
    SetIntArray3 = 18,
    /// `(program, slot: u32, [i32])`
    SetIntArray4 = 19,
    /// `(program, slot: u32, [f32])`
    SetFloatArray = 20,
    /// `(program, slot: u32, [f32])`
    SetFloatArray2 = 21,
    /// `(program, slot: u32, [f32])`
    SetFloatArray3 = 22,
    /// `(program, slot: u32, [f32])`
    SetFloatArray4 = 23,
    /// `(program, slot: u32, [f32], a multiple of 16)`
    SetMatrices = 24,
    /// `(program, slot: u32, 9 x f32)`
    SetMatrix3x3 = 25,
    /// `(program, slot: u32, 4 x f32)`
    SetMatrix2x2 = 26,
    /// `(program, slot: u32, x: f32)`
    SetFloat = 27,
    /// `(program, slot: u32, x, y: f32)`
    SetFloat2 = 28,
    /// `(program, slot: u32, x, y, z: f32)`
    SetFloat3 = 29,
    /// `(program, slot: u32, x, y, z, w: f32)`
    SetFloat4 = 30,
    /// `(source texture, destination texture)`
    CopyTexture = 31,
    /// `(texture, sampling mode: u32)`
    SetTextureSampling = 32,
    /// `(texture, u: u32, v: u32, w: u32)`
    SetTextureWrapMode = 33,
    /// `(texture, level: u32)`
    SetTextureAnisotropicLevel = 34,
    /// `(program, slot: u32, texture)`
    SetTexture = 35,
    /// `(program, slot: u32)`
    UnsetTexture = 36,
    /// `()`
    DiscardAllTextures = 37,
    /// `(framebuffer)`
    DeleteFrameBuffer = 38,
    /// `(framebuffer)`
    BindFrameBuffer = 39,
    /// `(framebuffer)`
    UnbindFrameBuffer = 40,
    /// `(fill mode: u32, first index: u32, index count: u32)`
    DrawIndexed = 41,
    /// `(fill mode: u32, first index: u32, index count: u32, instances: u32)`
    DrawIndexedInstanced = 42,
    /// `(fill mode: u32, first vertex: u32, vertex count: u32)`
    Draw = 43,
    /// `(fill mode: u32, first vertex: u32, vertex count: u32, instances: u32)`
    DrawInstanced = 44,
    /// `(flags: u32, r, g, b, a: f32, depth: f32, stencil: u32)`
    Clear = 45,
    /// `(write mask, fail op, depth fail op, pass op, function, reference, read mask: u32, enabled: bool)`
    SetStencil = 46,
    /// `(x, y, width, height: f32, normalized)`
    SetViewPort = 47,
    /// `(x, y, width, height: f32, normalized)`
    SetScissor = 48,
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for &op in Opcode::ALL {
            assert_eq!(Opcode::try_from(op as u32), Ok(op));
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert_eq!(Opcode::try_from(0), Err(0));
        assert_eq!(Opcode::try_from(49), Err(49));
    }

    #[test]
    fn codes_are_dense() {
        for (index, &op) in Opcode::ALL.iter().enumerate() {
            assert_eq!(op as u32, index as u32 + 1, "{op}");
        }
    }
}
