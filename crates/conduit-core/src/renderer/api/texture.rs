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

//! Defines data structures related to textures and sampler state.

use std::borrow::Cow;

/// An opaque handle to a device-side texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// Defines the memory format of pixels in a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Four 8-bit unsigned normalized components (RGBA).
    Rgba8Unorm,
    /// Four 8-bit unsigned normalized components (RGBA) in the sRGB color space.
    Rgba8UnormSrgb,
    /// Four 8-bit unsigned normalized components (BGRA).
    Bgra8Unorm,
    /// Three 8-bit unsigned normalized components (RGB).
    Rgb8Unorm,
    /// One 8-bit unsigned normalized component.
    R8Unorm,
    /// Two 8-bit unsigned normalized components.
    Rg8Unorm,
    /// Four 16-bit float components.
    Rgba16Float,
    /// Four 32-bit float components.
    Rgba32Float,
    /// One 32-bit float component.
    R32Float,
    /// A 24-bit depth component with an 8-bit stencil component.
    Depth24PlusStencil8,
    /// A 32-bit float depth component.
    Depth32Float,
}

impl TextureFormat {
    /// Converts the wire code used by the scripting side.
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Self::Rgba8Unorm,
            1 => Self::Rgba8UnormSrgb,
            2 => Self::Bgra8Unorm,
            3 => Self::Rgb8Unorm,
            4 => Self::R8Unorm,
            5 => Self::Rg8Unorm,
            6 => Self::Rgba16Float,
            7 => Self::Rgba32Float,
            8 => Self::R32Float,
            9 => Self::Depth24PlusStencil8,
            10 => Self::Depth32Float,
            _ => return None,
        })
    }

    /// Number of bytes used by a single texel.
    pub const fn bytes_per_pixel(&self) -> u32 {
        match self {
            Self::R8Unorm => 1,
            Self::Rg8Unorm => 2,
            Self::Rgb8Unorm => 3,
            Self::Rgba8Unorm
            | Self::Rgba8UnormSrgb
            | Self::Bgra8Unorm
            | Self::R32Float
            | Self::Depth24PlusStencil8
            | Self::Depth32Float => 4,
            Self::Rgba16Float => 8,
            Self::Rgba32Float => 16,
        }
    }

    /// Returns `true` for depth and depth/stencil formats.
    pub const fn is_depth(&self) -> bool {
        matches!(self, Self::Depth24PlusStencil8 | Self::Depth32Float)
    }
}

/// The shape of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    /// A plain two-dimensional texture.
    D2,
    /// A cubemap made of six square 2D faces.
    Cube,
}

/// A descriptor used to create a [`TextureId`].
#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    /// An optional debug label for the texture.
    pub label: Option<Cow<'a, str>>,
    /// Width of mip level 0, in texels.
    pub width: u32,
    /// Height of mip level 0, in texels.
    pub height: u32,
    /// Number of mip levels.
    pub mip_level_count: u32,
    /// The texel format.
    pub format: TextureFormat,
    /// 2D or cube.
    pub kind: TextureKind,
    /// If `true`, the texture can be attached to a framebuffer.
    pub render_target: bool,
}

impl TextureDescriptor<'_> {
    /// Number of mip levels needed for a full chain down to 1x1.
    pub fn full_mip_chain(width: u32, height: u32) -> u32 {
        32 - width.max(height).max(1).leading_zeros()
    }
}

/// A rectangular region of one mip level (and cube face) of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureRegion {
    /// The mip level.
    pub mip_level: u32,
    /// The cube face, or `0` for 2D textures.
    pub layer: u32,
    /// Left edge in texels.
    pub x: u32,
    /// Top edge in texels.
    pub y: u32,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
}

impl TextureRegion {
    /// The whole of mip level 0 of a `width` x `height` texture.
    pub fn whole(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }
}

/// Defines the filtering mode for texture sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Point sampling. Returns the value of the nearest texel.
    Nearest,
    /// Linear interpolation between the nearest texels.
    Linear,
}

/// Defines how texture coordinates are handled when sampling outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    /// Coordinates are clamped to the edge.
    ClampToEdge,
    /// Coordinates wrap around.
    Repeat,
    /// Coordinates wrap around, mirroring at each integer boundary.
    MirrorRepeat,
    /// Coordinates outside the range use a fixed border color.
    ClampToBorder,
}

impl AddressMode {
    /// Converts the scripting-side address mode code.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::ClampToEdge),
            1 => Some(Self::Repeat),
            2 => Some(Self::MirrorRepeat),
            3 => Some(Self::ClampToBorder),
            _ => None,
        }
    }
}

/// The sampling configuration of a texture.
///
/// Tracked separately from the texture itself since scripts change it
/// independently of creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerState {
    /// Magnification filter.
    pub mag_filter: FilterMode,
    /// Minification filter.
    pub min_filter: FilterMode,
    /// Filter between mip levels, `None` when mips are not sampled.
    pub mip_filter: Option<FilterMode>,
    /// Wrap mode along U.
    pub address_u: AddressMode,
    /// Wrap mode along V.
    pub address_v: AddressMode,
    /// Wrap mode along W.
    pub address_w: AddressMode,
    /// Maximum anisotropy, `1` disables anisotropic filtering.
    pub anisotropy: u32,
}

impl Default for SamplerState {
    fn default() -> Self {
        Self {
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mip_filter: Some(FilterMode::Linear),
            address_u: AddressMode::Repeat,
            address_v: AddressMode::Repeat,
            address_w: AddressMode::Repeat,
            anisotropy: 1,
        }
    }
}

impl SamplerState {
    /// Applies a scripting-side sampling mode (`1..=12`), returning `false` for unknown codes.
    ///
    /// Codes are named `MAG_MIN_MIP`. `NEAREST`/`BILINEAR`/`TRILINEAR` are aliases of
    /// 1, 2 and 3.
    pub fn apply_sampling_mode(&mut self, code: u32) -> bool {
        use FilterMode::{Linear, Nearest};
        let (mag, min, mip) = match code {
            1 => (Nearest, Nearest, Some(Linear)),
            2 => (Linear, Linear, Some(Nearest)),
            3 => (Linear, Linear, Some(Linear)),
            4 => (Nearest, Nearest, Some(Nearest)),
            5 => (Nearest, Linear, Some(Nearest)),
            6 => (Nearest, Linear, Some(Linear)),
            7 => (Nearest, Linear, None),
            8 => (Nearest, Nearest, None),
            9 => (Linear, Nearest, Some(Nearest)),
            10 => (Linear, Nearest, Some(Linear)),
            11 => (Linear, Linear, None),
            12 => (Linear, Nearest, None),
            _ => return false,
        };
        self.mag_filter = mag;
        self.min_filter = min;
        self.mip_filter = mip;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_mode_trilinear() {
        let mut sampler = SamplerState::default();
        assert!(sampler.apply_sampling_mode(8));
        assert_eq!(sampler.mip_filter, None);
        assert!(sampler.apply_sampling_mode(3));
        assert_eq!(sampler.min_filter, FilterMode::Linear);
        assert_eq!(sampler.mip_filter, Some(FilterMode::Linear));
    }

    #[test]
    fn unknown_sampling_mode_leaves_state_untouched() {
        let mut sampler = SamplerState::default();
        sampler.apply_sampling_mode(8);
        let before = sampler;
        assert!(!sampler.apply_sampling_mode(42));
        assert_eq!(sampler, before);
    }

    #[test]
    fn full_mip_chain() {
        assert_eq!(TextureDescriptor::full_mip_chain(1, 1), 1);
        assert_eq!(TextureDescriptor::full_mip_chain(256, 64), 9);
        assert_eq!(TextureDescriptor::full_mip_chain(300, 2), 9);
    }
}
