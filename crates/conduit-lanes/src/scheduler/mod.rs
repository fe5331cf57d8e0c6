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

//! Frame scheduling.
//!
//! One call to [`Engine::tick`] moves the engine through a full frame:
//!
//! ```text
//! Idle -> AwaitingCommands -> Draining -> Submitted -> Idle
//!         | device events     | begin_frame     | submit
//!         | async compiles    | drain buffers   | release frame slot
//!         | animation frames  |                 | read-backs, end-of-frame callbacks
//! ```

use crate::engine::{Engine, FrameContext};
use crate::resource::ProgramState;
use conduit_core::renderer::RenderError;
use conduit_core::{CancellationToken, DeviceEvent, FrameIndex};

/// A callback run once, with exclusive access to the engine.
pub type FrameCallback = Box<dyn FnOnce(&mut Engine) + 'static>;

/// A callback run after every device recreation.
pub type ResetCallback = Box<dyn FnMut(&mut Engine) + 'static>;

/// Where the engine is within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FramePhase {
    /// Between frames.
    #[default]
    Idle,
    /// Collecting work for the frame: device events, compiles, animation callbacks.
    AwaitingCommands,
    /// Executing the sealed command buffers.
    Draining,
    /// The encoder was handed back to the device.
    Submitted,
}

/// The outcome of one tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameReport {
    /// The frame that was ticked.
    pub frame: FrameIndex,
    /// `true` if the frame was skipped because the device is lost.
    pub skipped: bool,
    /// Number of command buffers drained.
    pub buffers: usize,
    /// Number of commands dispatched.
    pub commands: usize,
    /// Number of draw calls issued to the encoder.
    pub draw_calls: usize,
    /// Number of uniform uploads issued to the encoder.
    pub uniform_uploads: usize,
    /// Non-fatal errors raised by individual commands.
    pub errors: Vec<RenderError>,
}

impl FrameReport {
    fn new(frame: FrameIndex) -> Self {
        Self {
            frame,
            ..Default::default()
        }
    }
}

/// Counters of the last submitted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Number of the frame the counters belong to.
    pub frame_number: u64,
    /// Commands dispatched.
    pub commands_executed: usize,
    /// Draw calls issued.
    pub draw_calls: usize,
    /// Uniform uploads issued.
    pub uniform_uploads: usize,
    /// Non-fatal command errors.
    pub errors: usize,
}

impl From<&FrameReport> for FrameStats {
    fn from(report: &FrameReport) -> Self {
        Self {
            frame_number: report.frame.0,
            commands_executed: report.commands,
            draw_calls: report.draw_calls,
            uniform_uploads: report.uniform_uploads,
            errors: report.errors.len(),
        }
    }
}

/// RGBA8 pixels read back from the default framebuffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePixels {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed rows, top to bottom.
    pub data: Vec<u8>,
}

/// A framebuffer read-back that is fulfilled at the end of the next submitted frame.
#[derive(Debug)]
pub struct PendingReadback {
    receiver: flume::Receiver<Result<FramePixels, RenderError>>,
}

impl PendingReadback {
    /// Returns the pixels if the read-back has been serviced.
    pub fn try_take(&self) -> Option<Result<FramePixels, RenderError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(flume::TryRecvError::Empty) => None,
            Err(flume::TryRecvError::Disconnected) => Some(Err(dropped_readback())),
        }
    }

    /// Blocks until the read-back is serviced.
    pub fn wait(self) -> Result<FramePixels, RenderError> {
        self.receiver
            .recv()
            .unwrap_or_else(|_| Err(dropped_readback()))
    }
}

fn dropped_readback() -> RenderError {
    RenderError::InvalidOperation("the engine was dropped before the read-back".to_string())
}

/// Per-frame bookkeeping of the engine.
pub(crate) struct FrameScheduler {
    pub phase: FramePhase,
    pub frame: FrameIndex,
    pub animation_callbacks: Vec<FrameCallback>,
    pub end_of_frame_callbacks: Vec<FrameCallback>,
    pub readbacks: Vec<flume::Sender<Result<FramePixels, RenderError>>>,
    pub reset_callback: Option<ResetCallback>,
    pub device_reset_pending: bool,
    pub hardware_scaling_level: f32,
    pub stats: FrameStats,
}

impl FrameScheduler {
    pub fn new(hardware_scaling_level: f32) -> Self {
        Self {
            phase: FramePhase::Idle,
            frame: FrameIndex::default(),
            animation_callbacks: Vec::new(),
            end_of_frame_callbacks: Vec::new(),
            readbacks: Vec::new(),
            reset_callback: None,
            device_reset_pending: false,
            hardware_scaling_level,
            stats: FrameStats::default(),
        }
    }
}

impl Engine {
    /// Runs `callback` once, during the next tick, before its commands are drained.
    pub fn request_animation_frame(&mut self, callback: impl FnOnce(&mut Engine) + 'static) {
        self.scheduler.animation_callbacks.push(Box::new(callback));
    }

    /// Runs `callback` once, after the next frame is submitted.
    pub fn on_end_of_frame(&mut self, callback: impl FnOnce(&mut Engine) + 'static) {
        self.scheduler.end_of_frame_callbacks.push(Box::new(callback));
    }

    /// Seals the commands recorded on [`recorder`](Self::recorder) and queues them.
    ///
    /// Returns `false` if nothing was recorded.
    pub fn submit_commands(&mut self) -> bool {
        self.recorder.submit()
    }

    /// Registers the callback run on the first tick after each device recreation.
    pub fn set_render_reset_callback(&mut self, callback: impl FnMut(&mut Engine) + 'static) {
        self.scheduler.reset_callback = Some(Box::new(callback));
    }

    /// Requests the contents of the default framebuffer after the next submitted frame.
    pub fn read_frame_buffer_pixels(&mut self) -> PendingReadback {
        let (sender, receiver) = flume::bounded(1);
        self.scheduler.readbacks.push(sender);
        PendingReadback { receiver }
    }

    /// The divisor applied to the back buffer size.
    pub fn hardware_scaling_level(&self) -> f32 {
        self.scheduler.hardware_scaling_level
    }

    /// Changes the divisor applied to the back buffer size.
    pub fn set_hardware_scaling_level(&mut self, level: f32) -> Result<(), RenderError> {
        if !level.is_finite() || level <= 0.0 {
            return Err(RenderError::InvalidOperation(format!(
                "hardware scaling level must be positive, got {level}"
            )));
        }
        self.scheduler.hardware_scaling_level = level;
        Ok(())
    }

    /// Width scripts should render at.
    pub fn render_width(&self) -> u32 {
        let width = self.context.device().back_buffer_size().width;
        (width as f32 / self.scheduler.hardware_scaling_level) as u32
    }

    /// Height scripts should render at.
    pub fn render_height(&self) -> u32 {
        let height = self.context.device().back_buffer_size().height;
        (height as f32 / self.scheduler.hardware_scaling_level) as u32
    }

    /// Counters of the last submitted frame.
    pub fn frame_stats(&self) -> FrameStats {
        self.scheduler.stats
    }

    /// The current phase. Always [`FramePhase::Idle`] outside of a tick.
    pub fn phase(&self) -> FramePhase {
        self.scheduler.phase
    }

    /// The index of the next frame to be ticked.
    pub fn frame_index(&self) -> FrameIndex {
        self.scheduler.frame
    }

    /// Runs one frame.
    ///
    /// A protocol error aborts the drain: queued buffers are discarded,
    /// nothing is submitted and the frame index does not advance.
    pub fn tick(&mut self) -> Result<FrameReport, RenderError> {
        let frame = self.scheduler.frame;
        self.scheduler.phase = FramePhase::AwaitingCommands;

        self.poll_device_events();
        if self.scheduler.device_reset_pending {
            self.reset_after_recreation();
        }
        if self.context.device().is_lost() {
            log::info!("Skipping frame {}: the graphics device is lost.", frame.0);
            self.scheduler.phase = FramePhase::Idle;
            return Ok(FrameReport {
                skipped: true,
                ..FrameReport::new(frame)
            });
        }
        self.publish_compiles();

        // Callbacks registered from here on wait for the next tick.
        let callbacks = std::mem::take(&mut self.scheduler.animation_callbacks);
        for callback in callbacks {
            callback(self);
        }

        self.scheduler.phase = FramePhase::Draining;
        self.recorder.submit();
        let encoder = match self.context.device().begin_frame() {
            Ok(encoder) => encoder,
            Err(e) => {
                self.scheduler.phase = FramePhase::Idle;
                return Err(e.into());
            }
        };
        let mut context = FrameContext {
            index: frame,
            encoder,
            report: FrameReport::new(frame),
        };
        while let Some(buffer) = self.queue.try_next() {
            context.report.buffers += 1;
            if let Err(e) = self.drain_buffer(&buffer, &mut context) {
                let discarded = self.queue.discard();
                log::error!(
                    "Frame {} aborted: {e}. Discarded {discarded} queued command buffer(s).",
                    frame.0
                );
                self.needs_rebinding.release(frame);
                self.scheduler.phase = FramePhase::Idle;
                return Err(e);
            }
        }

        self.scheduler.phase = FramePhase::Submitted;
        let FrameContext {
            encoder, report, ..
        } = context;
        let submitted = self.context.device().submit(encoder);
        self.needs_rebinding.release(frame);
        if let Err(e) = submitted {
            self.scheduler.phase = FramePhase::Idle;
            return Err(e.into());
        }
        self.service_readbacks();
        self.scheduler.frame = frame.next();
        self.scheduler.stats = FrameStats::from(&report);

        let callbacks = std::mem::take(&mut self.scheduler.end_of_frame_callbacks);
        for callback in callbacks {
            callback(self);
        }
        self.scheduler.phase = FramePhase::Idle;

        log::debug!(
            "Frame {} submitted: {} command(s), {} draw(s), {} upload(s), {} error(s).",
            frame.0,
            report.commands,
            report.draw_calls,
            report.uniform_uploads,
            report.errors.len()
        );
        Ok(report)
    }

    fn poll_device_events(&mut self) {
        while let Ok(event) = self.device_events.try_recv() {
            match event {
                DeviceEvent::Lost => log::info!("Device lost; frames are skipped until it is back."),
                DeviceEvent::Recreated { generation } => {
                    log::info!("Device recreated (generation {}).", generation.0);
                    self.scheduler.device_reset_pending = true;
                }
            }
        }
    }

    /// Forgets every binding that refers to objects of the previous device.
    fn reset_after_recreation(&mut self) {
        self.scheduler.device_reset_pending = false;
        let unbound: usize = self
            .resources
            .programs_mut()
            .filter_map(|(_, record)| record.data_mut())
            .map(|data| data.binder.clear_textures())
            .sum();
        self.bound.frame_buffer = self.default_frame_buffer;
        self.bound.view_dirty = true;
        self.needs_rebinding.reset_all();
        log::info!("Render state reset after device recreation ({unbound} texture binding(s) dropped).");

        if let Some(mut callback) = self.scheduler.reset_callback.take() {
            callback(self);
            // The callback may have installed a replacement.
            if self.scheduler.reset_callback.is_none() {
                self.scheduler.reset_callback = Some(callback);
            }
        }
    }

    fn publish_compiles(&mut self) {
        for handle in self.resources.pending_programs() {
            let result = match self.resources.program(handle).map(|record| &record.state) {
                Ok(ProgramState::Pending(pending)) => pending.try_result(),
                _ => None,
            };
            if let Some(result) = result {
                // Failures are reported on the completion channel.
                let _ = self.finish_compile(handle, result);
            }
        }
    }

    fn service_readbacks(&mut self) {
        let requests = std::mem::take(&mut self.scheduler.readbacks);
        if requests.is_empty() {
            return;
        }
        let device = self.context.device();
        let extent = device.back_buffer_size();
        let result = device
            .read_framebuffer(None)
            .map(|data| FramePixels {
                width: extent.width,
                height: extent.height,
                data,
            })
            .map_err(RenderError::from);
        for request in requests {
            let _ = request.send(result.clone());
        }
    }
}

/// Drives an [`Engine`] until its token is cancelled.
#[derive(Debug)]
pub struct RenderLoop {
    engine: Engine,
    token: CancellationToken,
}

impl RenderLoop {
    /// Wraps an engine. Cancelling `token` prevents every later tick.
    pub fn new(engine: Engine, token: CancellationToken) -> Self {
        Self { engine, token }
    }

    /// The driven engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The driven engine, mutably.
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// The token that stops the loop.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Ticks once, unless cancelled.
    pub fn tick(&mut self) -> Option<Result<FrameReport, RenderError>> {
        if self.token.is_cancelled() {
            return None;
        }
        Some(self.engine.tick())
    }

    /// Ticks up to `frames` times and returns the reports of the ticks that ran.
    ///
    /// Stops early when cancelled or on the first error.
    pub fn run(&mut self, frames: usize) -> Result<Vec<FrameReport>, RenderError> {
        let mut reports = Vec::with_capacity(frames);
        for _ in 0..frames {
            match self.tick() {
                Some(report) => reports.push(report?),
                None => {
                    log::info!("Render loop cancelled after {} frame(s).", reports.len());
                    break;
                }
            }
        }
        Ok(reports)
    }

    /// Stops driving the engine and hands it back.
    pub fn into_engine(self) -> Engine {
        self.engine
    }
}
