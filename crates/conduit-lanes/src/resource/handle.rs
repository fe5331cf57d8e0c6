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

use conduit_core::renderer::RenderError;
use conduit_core::Handle;

/// Hands out handles from a single, never-reused counter.
#[derive(Debug)]
pub struct HandleAllocator {
    next: u32,
}

impl HandleAllocator {
    /// Creates an allocator whose first handle is `1`.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Returns a fresh handle.
    pub fn allocate(&mut self) -> Result<Handle, RenderError> {
        let handle = Handle(self.next);
        self.next = self.next.checked_add(1).ok_or_else(|| {
            RenderError::InvalidOperation("resource handle space exhausted".to_string())
        })?;
        Ok(handle)
    }

    /// Number of handles handed out so far.
    pub fn allocated(&self) -> u32 {
        self.next - 1
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_sequential_and_non_null() {
        let mut allocator = HandleAllocator::new();
        let a = allocator.allocate().expect("first");
        let b = allocator.allocate().expect("second");
        assert!(!a.is_null());
        assert_eq!(b.0, a.0 + 1);
        assert_eq!(allocator.allocated(), 2);
    }

    #[test]
    fn exhaustion_is_reported() {
        let mut allocator = HandleAllocator { next: u32::MAX };
        assert!(allocator.allocate().is_err());
    }
}
