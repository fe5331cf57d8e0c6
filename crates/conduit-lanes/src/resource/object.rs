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

use conduit_core::renderer::{GraphicsDevice, ResourceError};
use conduit_core::{DeviceContext, DeviceGeneration};
use std::fmt::Debug;

/// A device-side id paired with the device generation it was created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceObject<Id> {
    /// The device-side id.
    pub id: Id,
    /// The generation of the device that created `id`.
    pub generation: DeviceGeneration,
}

impl<Id: Copy + Debug> DeviceObject<Id> {
    /// Pairs `id` with the current generation of `context`.
    pub fn new(id: Id, context: &DeviceContext) -> Self {
        Self {
            id,
            generation: context.generation(),
        }
    }

    /// Returns `true` if the object belongs to the current device.
    pub fn is_current(&self, context: &DeviceContext) -> bool {
        self.generation == context.generation()
    }

    /// Returns the id only if it belongs to the current device.
    pub fn current(&self, context: &DeviceContext) -> Option<Id> {
        self.is_current(context).then_some(self.id)
    }

    /// Destroys the object on the current device, unless it belongs to an older one.
    ///
    /// Returns `Ok(true)` when the device was called and `Ok(false)` when the
    /// object was stale and simply forgotten.
    pub fn release(
        self,
        context: &DeviceContext,
        destroy: impl FnOnce(&dyn GraphicsDevice, Id) -> Result<(), ResourceError>,
    ) -> Result<bool, ResourceError> {
        if !self.is_current(context) {
            log::debug!(
                "Skipping destroy of {:?} from device generation {} (current is {}).",
                self.id,
                self.generation.0,
                context.generation().0
            );
            return Ok(false);
        }
        destroy(context.device().as_ref(), self.id)?;
        Ok(true)
    }
}
