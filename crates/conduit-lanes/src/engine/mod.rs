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

//! The command engine.
//!
//! [`Engine`] owns the resource table, the retained binding state and the
//! render side of the command queue. Resource creation and data uploads are
//! synchronous calls (see the `api` module); everything that affects drawing
//! is recorded through a [`CommandRecorder`] and executed when a frame is
//! ticked (see the [`scheduler`](crate::scheduler) module).

mod api;
mod dispatch;
mod state;

use crate::binder::{reflect_attributes, UniformBinder};
use crate::resource::{
    DeviceObject, FrameBufferRecord, FrameBufferTarget, ProgramData, ProgramState, Resource,
    ResourceKind, ResourceTable,
};
use crate::scheduler::{FrameReport, FrameScheduler};
use conduit_core::renderer::{
    CompiledShaders, Encoder, Extent2D, FrameBufferId, RenderError, ShaderCompiler, ShaderError,
};
use conduit_core::{
    DeviceContext, DeviceEvent, EngineSettings, FrameIndex, Handle, PerFrameValue,
};
use conduit_data::{CommandQueue, CommandRecorder};
use state::BoundState;
use std::sync::Arc;

/// The submission context of the frame being drained.
pub(crate) struct FrameContext {
    pub index: FrameIndex,
    pub encoder: Box<dyn Encoder>,
    pub report: FrameReport,
}

pub(crate) fn stale(handle: Handle, kind: ResourceKind) -> RenderError {
    RenderError::StaleHandle {
        handle: handle.0,
        kind: kind.name(),
    }
}

/// Executes recorded drawing commands against a [`GraphicsDevice`].
///
/// The engine is single-owner: every method takes `&mut self`, so synchronous
/// calls can never interleave with a drain. Only the [`CommandRecorder`]s it
/// hands out may live on other threads.
///
/// [`GraphicsDevice`]: conduit_core::renderer::GraphicsDevice
pub struct Engine {
    pub(crate) context: Arc<DeviceContext>,
    pub(crate) compiler: Arc<dyn ShaderCompiler>,
    pub(crate) settings: EngineSettings,
    pub(crate) resources: ResourceTable,
    pub(crate) queue: CommandQueue,
    pub(crate) recorder: CommandRecorder,
    pub(crate) device_events: flume::Receiver<DeviceEvent>,
    pub(crate) default_frame_buffer: Handle,
    pub(crate) bound: BoundState,
    pub(crate) needs_rebinding: PerFrameValue<bool>,
    pub(crate) scheduler: FrameScheduler,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("generation", &self.context.generation())
            .field("resources", &self.resources.len())
            .field("phase", &self.scheduler.phase)
            .field("frame", &self.scheduler.frame)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Creates an engine on top of `context`.
    ///
    /// The default framebuffer is registered first and is the initial target.
    pub fn new(
        context: Arc<DeviceContext>,
        compiler: Arc<dyn ShaderCompiler>,
        settings: EngineSettings,
    ) -> Result<Self, RenderError> {
        let level = settings.hardware_scaling_level;
        if !level.is_finite() || level <= 0.0 {
            return Err(RenderError::InvalidOperation(format!(
                "hardware scaling level must be positive, got {level}"
            )));
        }
        let mut resources = ResourceTable::new();
        let default_frame_buffer =
            resources.insert(Resource::FrameBuffer(FrameBufferRecord::default_target()))?;
        let queue = CommandQueue::new();
        let recorder = queue.recorder();
        let device_events = context.subscribe();

        log::info!(
            "Engine created (device generation {}, {} frames in flight, uniform overflow {:?}).",
            context.generation().0,
            settings.max_frames_in_flight(),
            settings.uniform_overflow
        );

        Ok(Self {
            context,
            compiler,
            settings,
            resources,
            queue,
            recorder,
            device_events,
            default_frame_buffer,
            bound: BoundState::new(default_frame_buffer),
            needs_rebinding: PerFrameValue::new(true),
            scheduler: FrameScheduler::new(level),
        })
    }

    /// The device context the engine renders through.
    pub fn device_context(&self) -> &Arc<DeviceContext> {
        &self.context
    }

    /// The settings the engine was created with.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// The engine's own recorder. Its commands are submitted automatically
    /// at the start of every drain.
    pub fn recorder(&mut self) -> &mut CommandRecorder {
        &mut self.recorder
    }

    /// Creates a recorder that feeds the same queue and can be moved to another thread.
    pub fn command_recorder(&self) -> CommandRecorder {
        self.queue.recorder()
    }

    /// The handle of the swap-chain target.
    pub fn default_frame_buffer(&self) -> Handle {
        self.default_frame_buffer
    }

    /// Number of live resource records, including the default framebuffer.
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    // --- Programs ---

    /// Links compiled shaders on the current device and reflects their uniforms.
    ///
    /// Nothing is left on the device if any step fails.
    pub(crate) fn link_program(&self, shaders: &CompiledShaders) -> Result<ProgramData, RenderError> {
        let device = self.context.device();
        let id = device.create_program(shaders)?;
        let binder = match UniformBinder::reflect(
            &self.context,
            id,
            shaders,
            self.settings.uniform_overflow,
        ) {
            Ok(binder) => binder,
            Err(e) => {
                if let Err(destroy_err) = device.destroy_program(id) {
                    log::warn!("Failed to destroy half-created program {id:?}: {destroy_err}");
                }
                return Err(e.into());
            }
        };
        Ok(ProgramData {
            object: DeviceObject::new(id, &self.context),
            binder,
            attributes: reflect_attributes(shaders),
        })
    }

    /// Publishes the outcome of an asynchronous compile.
    ///
    /// On success the record becomes ready; on failure it is removed. Either
    /// way the caller's completion channel receives the outcome.
    pub(crate) fn finish_compile(
        &mut self,
        handle: Handle,
        result: Result<CompiledShaders, ShaderError>,
    ) -> Result<(), RenderError> {
        let linked = result
            .map_err(RenderError::from)
            .and_then(|shaders| self.link_program(&shaders));
        match linked {
            Ok(data) => {
                let record = self.resources.program_mut(handle)?;
                let previous = std::mem::replace(&mut record.state, ProgramState::Ready(data));
                if let ProgramState::Pending(pending) = previous {
                    pending.complete(Ok(handle));
                }
                log::info!("Program {handle} is ready.");
                Ok(())
            }
            Err(e) => {
                if let Ok(Resource::Program(record)) =
                    self.resources.remove(handle, ResourceKind::Program)
                {
                    if let ProgramState::Pending(pending) = record.state {
                        pending.complete(Err(e.clone()));
                    }
                }
                log::warn!("Program {handle} failed to compile and was dropped: {e}");
                Err(e)
            }
        }
    }

    /// Makes sure a program is linked, blocking on its compile if needed.
    pub(crate) fn resolve_program(&mut self, handle: Handle) -> Result<(), RenderError> {
        let result = match &self.resources.program(handle)?.state {
            ProgramState::Pending(pending) => {
                log::debug!("Waiting for the compile of program {handle}.");
                pending.wait()
            }
            ProgramState::Ready(_) => return Ok(()),
        };
        self.finish_compile(handle, result)
    }

    /// The linked data of a program, resolving a pending compile first.
    pub(crate) fn ready_program(&mut self, handle: Handle) -> Result<&mut ProgramData, RenderError> {
        self.resolve_program(handle)?;
        self.resources
            .program_mut(handle)?
            .data_mut()
            .ok_or_else(|| stale(handle, ResourceKind::Program))
    }

    // --- Render targets ---

    fn resolve_target(&self) -> Result<(Option<FrameBufferId>, Extent2D), RenderError> {
        let handle = self.bound.frame_buffer;
        let record = self.resources.frame_buffer(handle)?;
        let extent = record.extent(self.context.device().back_buffer_size());
        match record.target {
            FrameBufferTarget::Default => Ok((None, extent)),
            FrameBufferTarget::Custom(object) => object
                .current(&self.context)
                .map(|id| (Some(id), extent))
                .ok_or_else(|| stale(handle, ResourceKind::FrameBuffer)),
        }
    }

    /// Binds the current target on the first draw or clear of a frame, and
    /// re-applies viewport and scissor whenever they changed.
    pub(crate) fn ensure_target(&mut self, frame: &mut FrameContext) {
        let rebind = self.needs_rebinding.get(frame.index);
        if !rebind && !self.bound.view_dirty {
            return;
        }
        let (target, extent, fell_back) = match self.resolve_target() {
            Ok((target, extent)) => (target, extent, false),
            Err(e) => {
                log::warn!(
                    "Framebuffer {} is unusable ({e}); rendering to the default target.",
                    self.bound.frame_buffer
                );
                self.bound.frame_buffer = self.default_frame_buffer;
                (None, self.context.device().back_buffer_size(), true)
            }
        };
        if rebind || fell_back {
            frame.encoder.bind_framebuffer(target);
            self.needs_rebinding.set(frame.index, false);
        }
        frame
            .encoder
            .set_viewport(self.bound.viewport_rect(extent));
        frame
            .encoder
            .set_scissor(self.bound.scissor_rect(extent));
        self.bound.view_dirty = false;
    }

    /// Marks the bound target for rebinding on the next draw or clear.
    pub(crate) fn retarget(&mut self, frame: FrameIndex, handle: Handle) {
        if self.bound.frame_buffer != handle {
            self.bound.frame_buffer = handle;
            self.needs_rebinding.set(frame, true);
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // Pending compiles are cancelled as their records are released.
        let released = self.resources.release_all(&self.context);
        let discarded = self.queue.discard();
        log::info!(
            "Engine dropped: released {released} resource record(s), discarded {discarded} command buffer(s)."
        );
    }
}
