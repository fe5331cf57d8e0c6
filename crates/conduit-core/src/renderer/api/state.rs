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

//! The retained raster state applied to every draw.

/// The comparison function used for depth and stencil testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunction {
    /// The test never passes.
    Never,
    /// The test passes if the new value is less than the existing value.
    Less,
    /// The test passes if the new value is equal to the existing value.
    Equal,
    /// The test passes if the new value is less than or equal to the existing value.
    LessEqual,
    /// The test passes if the new value is greater than the existing value.
    Greater,
    /// The test passes if the new value is not equal to the existing value.
    NotEqual,
    /// The test passes if the new value is greater than or equal to the existing value.
    GreaterEqual,
    /// The test always passes.
    #[default]
    Always,
}

impl CompareFunction {
    /// Converts a GL comparison enum (`GL_NEVER` .. `GL_ALWAYS`).
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0x0200 => Self::Never,
            0x0201 => Self::Less,
            0x0202 => Self::Equal,
            0x0203 => Self::LessEqual,
            0x0204 => Self::Greater,
            0x0205 => Self::NotEqual,
            0x0206 => Self::GreaterEqual,
            0x0207 => Self::Always,
            _ => return None,
        })
    }
}

/// An operation to perform on a stencil buffer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOperation {
    /// Keep the existing stencil value.
    #[default]
    Keep,
    /// Set the stencil value to 0.
    Zero,
    /// Replace the stencil value with the reference value.
    Replace,
    /// Bitwise invert the stencil value.
    Invert,
    /// Increment the stencil value, clamping at the maximum value.
    IncrementClamp,
    /// Decrement the stencil value, clamping at 0.
    DecrementClamp,
    /// Increment the stencil value, wrapping to 0 on overflow.
    IncrementWrap,
    /// Decrement the stencil value, wrapping to the maximum value on underflow.
    DecrementWrap,
}

impl StencilOperation {
    /// Converts a GL stencil operation enum.
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0x0000 => Self::Zero,
            0x1E00 => Self::Keep,
            0x1E01 => Self::Replace,
            0x1E02 => Self::IncrementClamp,
            0x1E03 => Self::DecrementClamp,
            0x150A => Self::Invert,
            0x8507 => Self::IncrementWrap,
            0x8508 => Self::DecrementWrap,
            _ => return None,
        })
    }
}

/// Defines which face of a triangle to cull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    /// No culling is performed.
    None,
    /// Cull front-facing triangles.
    Front,
    /// Cull back-facing triangles.
    Back,
}

/// Defines which vertex winding order is considered front-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    /// Counter-clockwise winding order is the front face.
    Ccw,
    /// Clockwise winding order is the front face.
    Cw,
}

/// The blend (alpha) mode applied to the color target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Blending disabled.
    #[default]
    Disable,
    /// `src * a + dst`.
    Add,
    /// `src * a + dst * (1 - a)`.
    Combine,
    /// `dst - src * a`.
    Subtract,
    /// `src * dst`.
    Multiply,
    /// `src * a + dst * (1 - src)`.
    Maximized,
    /// `src + dst`.
    OneOne,
    /// `src + dst * (1 - a)`.
    Premultiplied,
    /// Porter-Duff "over" with premultiplied alpha.
    PremultipliedPorterDuff,
    /// Constant-color interpolation.
    Interpolate,
    /// `src + dst * (1 - src)`.
    ScreenMode,
}

impl BlendMode {
    /// Converts the scripting-side alpha mode code.
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Self::Disable,
            1 => Self::Add,
            2 => Self::Combine,
            3 => Self::Subtract,
            4 => Self::Multiply,
            5 => Self::Maximized,
            6 => Self::OneOne,
            7 => Self::Premultiplied,
            8 => Self::PremultipliedPorterDuff,
            9 => Self::Interpolate,
            10 => Self::ScreenMode,
            _ => return None,
        })
    }
}

/// Stencil test configuration shared by both faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilState {
    /// If `false`, the stencil test is skipped.
    pub enabled: bool,
    /// The comparison function.
    pub compare: CompareFunction,
    /// The reference value.
    pub reference: u8,
    /// Bitmask applied when reading.
    pub read_mask: u8,
    /// Bitmask applied when writing.
    pub write_mask: u8,
    /// Operation when the stencil test fails.
    pub fail_op: StencilOperation,
    /// Operation when the stencil test passes but depth fails.
    pub depth_fail_op: StencilOperation,
    /// Operation when both tests pass.
    pub pass_op: StencilOperation,
}

impl Default for StencilState {
    fn default() -> Self {
        Self {
            enabled: false,
            compare: CompareFunction::Always,
            reference: 0,
            read_mask: 0xFF,
            write_mask: 0xFF,
            fail_op: StencilOperation::Keep,
            depth_fail_op: StencilOperation::Keep,
            pass_op: StencilOperation::Replace,
        }
    }
}

/// Describes depth biasing, used to prevent z-fighting.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DepthBias {
    /// Slope-scaled offset factor.
    pub factor: f32,
    /// Constant offset in depth units.
    pub units: f32,
}

/// The full retained raster state applied with each draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    /// Face culling.
    pub cull_mode: CullMode,
    /// Front face winding.
    pub front_face: FrontFace,
    /// Depth test function, `None` disables the depth test.
    pub depth_test: Option<CompareFunction>,
    /// If `true`, depth values are written.
    pub depth_write: bool,
    /// If `true`, color values are written.
    pub color_write: bool,
    /// Blending.
    pub blend: BlendMode,
    /// Depth bias.
    pub depth_bias: DepthBias,
    /// Stencil configuration.
    pub stencil: StencilState,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            front_face: FrontFace::Ccw,
            depth_test: Some(CompareFunction::LessEqual),
            depth_write: true,
            color_write: true,
            blend: BlendMode::Disable,
            depth_bias: DepthBias::default(),
            stencil: StencilState::default(),
        }
    }
}
