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

//! The device context: the current graphics device and its generation.
//!
//! A device can be lost and recreated at any time by the platform layer. Every
//! device object created through the engine records the [`DeviceGeneration`] it
//! was created in; objects from an older generation belong to a device that no
//! longer exists and must never be handed back to the current one.

use crate::renderer::GraphicsDevice;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// The number of times the device has been recreated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DeviceGeneration(pub u64);

/// An event published by the [`DeviceContext`] to its subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The platform reported the device as lost. No recreation has happened yet.
    Lost,
    /// A new device replaced the previous one.
    Recreated {
        /// The generation of the new device.
        generation: DeviceGeneration,
    },
}

/// Everything needed to build an engine, supplied once by the platform layer.
#[derive(Debug, Clone)]
pub struct DeviceConfiguration {
    /// The initial graphics device.
    pub device: Arc<dyn GraphicsDevice>,
    /// Ratio between physical and logical pixels of the default target.
    pub device_pixel_ratio: f32,
}

/// Holds the current graphics device and tracks its generation.
#[derive(Debug)]
pub struct DeviceContext {
    device: RwLock<Arc<dyn GraphicsDevice>>,
    generation: AtomicU64,
    device_pixel_ratio: f32,
    subscribers: Mutex<Vec<flume::Sender<DeviceEvent>>>,
}

impl DeviceContext {
    /// Creates a context at generation 0.
    pub fn new(config: DeviceConfiguration) -> Self {
        log::info!(
            "Device context created (device pixel ratio {}).",
            config.device_pixel_ratio
        );
        Self {
            device: RwLock::new(config.device),
            generation: AtomicU64::new(0),
            device_pixel_ratio: config.device_pixel_ratio,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Returns the current device.
    pub fn device(&self) -> Arc<dyn GraphicsDevice> {
        Arc::clone(&self.device.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Returns the current generation.
    pub fn generation(&self) -> DeviceGeneration {
        DeviceGeneration(self.generation.load(Ordering::Acquire))
    }

    /// Returns the ratio between physical and logical pixels.
    pub fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    /// Swaps in a new device and advances the generation by exactly one.
    ///
    /// Objects created on the previous device are not recreated; their records
    /// are dropped without device calls when they are released.
    pub fn recreate(&self, new_device: Arc<dyn GraphicsDevice>) -> DeviceGeneration {
        let generation = {
            let mut device = self.device.write().unwrap_or_else(PoisonError::into_inner);
            *device = new_device;
            DeviceGeneration(self.generation.fetch_add(1, Ordering::AcqRel) + 1)
        };
        log::info!("Graphics device recreated (generation {}).", generation.0);
        self.publish(DeviceEvent::Recreated { generation });
        generation
    }

    /// Reports the current device as lost to every subscriber.
    pub fn notify_lost(&self) {
        log::warn!(
            "Graphics device lost (generation {}).",
            self.generation().0
        );
        self.publish(DeviceEvent::Lost);
    }

    /// Registers a new subscriber and returns its receiving end.
    pub fn subscribe(&self) -> flume::Receiver<DeviceEvent> {
        let (sender, receiver) = flume::unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sender);
        receiver
    }

    fn publish(&self, event: DeviceEvent) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Disconnected subscribers are dropped on the way.
        subscribers.retain(|sender| sender.send(event).is_ok());
        log::trace!("Published {event:?} to {} subscriber(s).", subscribers.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::*;
    use crate::renderer::error::ResourceError;
    use crate::renderer::traits::Encoder;

    #[derive(Debug)]
    struct NullDevice;

    impl GraphicsDevice for NullDevice {
        fn create_program(&self, _: &CompiledShaders) -> Result<ProgramId, ResourceError> {
            Err(ResourceError::NotFound)
        }
        fn destroy_program(&self, _: ProgramId) -> Result<(), ResourceError> {
            Ok(())
        }
        fn create_uniform(
            &self,
            _: ProgramId,
            _: &UniformDescriptor,
        ) -> Result<UniformId, ResourceError> {
            Err(ResourceError::NotFound)
        }
        fn destroy_uniform(&self, _: UniformId) -> Result<(), ResourceError> {
            Ok(())
        }
        fn create_buffer_with_data(
            &self,
            _: &BufferDescriptor,
            _: &[u8],
        ) -> Result<BufferId, ResourceError> {
            Err(ResourceError::NotFound)
        }
        fn write_buffer(&self, _: BufferId, _: u64, _: &[u8]) -> Result<(), ResourceError> {
            Ok(())
        }
        fn destroy_buffer(&self, _: BufferId) -> Result<(), ResourceError> {
            Ok(())
        }
        fn create_texture(&self, _: &TextureDescriptor) -> Result<TextureId, ResourceError> {
            Err(ResourceError::NotFound)
        }
        fn write_texture(
            &self,
            _: TextureId,
            _: &TextureRegion,
            _: &[u8],
        ) -> Result<(), ResourceError> {
            Ok(())
        }
        fn generate_mipmaps(&self, _: TextureId) -> Result<(), ResourceError> {
            Ok(())
        }
        fn read_texture(&self, _: TextureId, _: &TextureRegion) -> Result<Vec<u8>, ResourceError> {
            Ok(Vec::new())
        }
        fn destroy_texture(&self, _: TextureId) -> Result<(), ResourceError> {
            Ok(())
        }
        fn create_framebuffer(
            &self,
            _: &FrameBufferDescriptor,
        ) -> Result<FrameBufferId, ResourceError> {
            Err(ResourceError::NotFound)
        }
        fn destroy_framebuffer(&self, _: FrameBufferId) -> Result<(), ResourceError> {
            Ok(())
        }
        fn read_framebuffer(&self, _: Option<FrameBufferId>) -> Result<Vec<u8>, ResourceError> {
            Ok(Vec::new())
        }
        fn begin_frame(&self) -> Result<Box<dyn Encoder>, ResourceError> {
            Err(ResourceError::Backend("null device".to_string()))
        }
        fn submit(&self, _: Box<dyn Encoder>) -> Result<(), ResourceError> {
            Ok(())
        }
        fn back_buffer_size(&self) -> Extent2D {
            Extent2D::new(1, 1)
        }
        fn is_lost(&self) -> bool {
            false
        }
    }

    fn context() -> DeviceContext {
        DeviceContext::new(DeviceConfiguration {
            device: Arc::new(NullDevice),
            device_pixel_ratio: 1.0,
        })
    }

    #[test]
    fn recreate_bumps_generation_once() {
        let ctx = context();
        assert_eq!(ctx.generation(), DeviceGeneration(0));
        let generation = ctx.recreate(Arc::new(NullDevice));
        assert_eq!(generation, DeviceGeneration(1));
        assert_eq!(ctx.generation(), DeviceGeneration(1));
    }

    #[test]
    fn subscribers_receive_recreation_events() {
        let ctx = context();
        let events = ctx.subscribe();
        ctx.notify_lost();
        ctx.recreate(Arc::new(NullDevice));

        let received: Vec<_> = events.try_iter().collect();
        assert_eq!(
            received,
            vec![
                DeviceEvent::Lost,
                DeviceEvent::Recreated {
                    generation: DeviceGeneration(1)
                }
            ]
        );
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let ctx = context();
        drop(ctx.subscribe());
        let live = ctx.subscribe();
        ctx.recreate(Arc::new(NullDevice));
        assert_eq!(live.len(), 1);
        assert_eq!(
            ctx.subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
            1
        );
    }
}
