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

//! Script-facing resource handles.

use std::fmt;

/// An opaque identifier for an engine resource.
///
/// All resource kinds share one handle space and a handle is never reused within
/// an engine instance. `0` is never handed out and reads as "no resource".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Handle(pub u32);

impl Handle {
    /// The handle that never refers to a resource.
    pub const NULL: Self = Self(0);

    /// Returns `true` for [`Handle::NULL`].
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Addresses one uniform slot of one program.
///
/// Obtained from the engine's uniform reflection and used by every recorded
/// uniform setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation {
    /// The program that declares the uniform.
    pub program: Handle,
    /// The stable slot index of the uniform within the program.
    pub slot: u16,
}
