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

mod common;

use common::Harness;
use conduit_core::renderer::{ProtocolError, RenderError};
use conduit_core::{CancellationToken, FrameIndex};
use conduit_data::Opcode;
use conduit_infra::DeviceAction;
use conduit_lanes::{FramePhase, RenderLoop};
use std::cell::Cell;
use std::rc::Rc;

const COLOR_BUFFER: u32 = 1;

#[test]
fn test_empty_frame_advances_and_runs_callbacks_once() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let animation_runs = Rc::new(Cell::new(0));
    let end_of_frame_runs = Rc::new(Cell::new(0));
    let counter = Rc::clone(&animation_runs);
    harness
        .engine
        .request_animation_frame(move |_| counter.set(counter.get() + 1));
    let counter = Rc::clone(&end_of_frame_runs);
    harness
        .engine
        .on_end_of_frame(move |_| counter.set(counter.get() + 1));

    // --- 2. ACT ---
    let first = harness.engine.tick().expect("first frame should succeed");
    let second = harness.engine.tick().expect("second frame should succeed");

    // --- 3. ASSERT ---
    assert_eq!(first.commands, 0, "Nothing was recorded.");
    assert!(!first.skipped, "The device is alive.");
    assert_eq!(first.frame, FrameIndex(0));
    assert_eq!(second.frame, FrameIndex(1));
    assert_eq!(harness.engine.frame_index(), FrameIndex(2), "Each tick should advance the frame.");
    assert_eq!(animation_runs.get(), 1, "The animation callback should run exactly once.");
    assert_eq!(end_of_frame_runs.get(), 1, "The end-of-frame callback should run exactly once.");
    assert_eq!(harness.engine.phase(), FramePhase::Idle, "A tick should end idle.");
    assert_eq!(
        harness.journal.count(|a| matches!(a, DeviceAction::Submit { .. })),
        2,
        "Each frame should be submitted."
    );
}

#[test]
fn test_callback_registered_during_a_frame_runs_on_the_next_one() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let runs = Rc::new(Cell::new(0));
    let outer = Rc::clone(&runs);
    harness.engine.request_animation_frame(move |engine| {
        outer.set(outer.get() + 1);
        let inner = Rc::clone(&outer);
        engine.request_animation_frame(move |_| inner.set(inner.get() + 10));
    });

    // --- 2. ACT ---
    harness.engine.tick().expect("first frame should succeed");
    let after_first = runs.get();
    harness.engine.tick().expect("second frame should succeed");

    // --- 3. ASSERT ---
    assert_eq!(after_first, 1, "Only the outer callback should run in the first frame.");
    assert_eq!(runs.get(), 11, "The nested callback should run in the second frame.");
}

#[test]
fn test_every_recorded_command_is_dispatched_in_order() {
    // --- 1. ARRANGE ---
    const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
    const GREEN: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
    const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
    let mut harness = Harness::new();
    let recorder = harness.engine.recorder();
    recorder.clear(COLOR_BUFFER, RED, 1.0, 0);
    recorder.set_viewport(0.0, 0.0, 0.5, 0.5);
    recorder.clear(COLOR_BUFFER, GREEN, 1.0, 0);
    recorder.set_depth_write(false);
    recorder.clear(COLOR_BUFFER, BLUE, 1.0, 0);

    // --- 2. ACT ---
    let report = harness.engine.tick().expect("frame should succeed");

    // --- 3. ASSERT ---
    assert_eq!(report.buffers, 1, "The engine recorder should be auto-submitted.");
    assert_eq!(report.commands, 5, "Five commands should reach five handlers.");
    assert!(report.errors.is_empty(), "No command should fail: {:?}", report.errors);
    assert_eq!(harness.engine.frame_stats().commands_executed, 5);

    let actions = harness.take_encoder_actions();
    let steps: Vec<String> = actions
        .iter()
        .map(|action| match action {
            DeviceAction::BindFrameBuffer(_) => "bind".to_string(),
            DeviceAction::SetViewport(_) => "viewport".to_string(),
            DeviceAction::SetScissor(_) => "scissor".to_string(),
            DeviceAction::Clear(request) => format!("clear {:?}", request.color),
            other => format!("{other:?}"),
        })
        .collect();
    assert_eq!(
        steps,
        vec![
            "bind".to_string(),
            "viewport".to_string(),
            "scissor".to_string(),
            format!("clear {RED:?}"),
            "viewport".to_string(),
            "scissor".to_string(),
            format!("clear {GREEN:?}"),
            format!("clear {BLUE:?}"),
        ],
        "Handlers should run in recording order, with the new viewport applied before the second clear."
    );
    let viewports: Vec<_> = actions
        .iter()
        .filter_map(|action| match action {
            DeviceAction::SetViewport(rect) => Some(*rect),
            _ => None,
        })
        .collect();
    assert_ne!(viewports[0], viewports[1], "The viewport change should reach the encoder.");
}

#[test]
fn test_protocol_error_aborts_the_frame_without_advancing() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let end_of_frame_runs = Rc::new(Cell::new(0));
    let counter = Rc::clone(&end_of_frame_runs);
    harness
        .engine
        .on_end_of_frame(move |_| counter.set(counter.get() + 1));
    // A bool argument written as a u32.
    harness
        .engine
        .recorder()
        .writer()
        .begin(Opcode::SetDepthWrite)
        .u32(1);
    assert!(harness.engine.submit_commands());
    harness
        .engine
        .recorder()
        .clear(COLOR_BUFFER, [1.0, 0.0, 0.0, 1.0], 1.0, 0);
    assert!(harness.engine.submit_commands());

    // --- 2. ACT ---
    let result = harness.engine.tick();

    // --- 3. ASSERT ---
    assert!(
        matches!(
            result,
            Err(RenderError::Protocol(ProtocolError::TypeMismatch { .. }))
        ),
        "The mistyped argument should be a protocol error, got {result:?}"
    );
    assert_eq!(harness.engine.frame_index(), FrameIndex(0), "The frame must not advance.");
    assert_eq!(end_of_frame_runs.get(), 0, "The frame was not submitted.");
    assert_eq!(
        harness.journal.count(|a| matches!(a, DeviceAction::Submit { .. })),
        0,
        "Nothing should be submitted."
    );

    let next = harness.engine.tick().expect("the next frame should succeed");
    assert_eq!(next.buffers, 0, "Buffers queued behind the error should be discarded.");
    assert_eq!(next.frame, FrameIndex(0), "The aborted frame is retried.");
    assert_eq!(end_of_frame_runs.get(), 1);
}

#[test]
fn test_lost_device_skips_frames_and_keeps_callbacks() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let runs = Rc::new(Cell::new(0));
    let counter = Rc::clone(&runs);
    harness
        .engine
        .request_animation_frame(move |_| counter.set(counter.get() + 1));
    harness.device.set_lost(true);
    harness.engine.device_context().notify_lost();

    // --- 2. ACT ---
    let skipped = harness.engine.tick().expect("a lost device is not an error");
    harness.device.set_lost(false);
    let resumed = harness.engine.tick().expect("the device is back");

    // --- 3. ASSERT ---
    assert!(skipped.skipped, "The frame should be reported as skipped.");
    assert!(!resumed.skipped);
    assert_eq!(resumed.frame, FrameIndex(0), "A skipped frame does not advance.");
    assert_eq!(runs.get(), 1, "The callback should wait for the device and run once.");
}

#[test]
fn test_read_back_is_serviced_after_submission() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    harness
        .engine
        .recorder()
        .clear(COLOR_BUFFER, [1.0, 0.0, 0.0, 1.0], 1.0, 0);
    let readback = harness.engine.read_frame_buffer_pixels();
    assert!(readback.try_take().is_none(), "Nothing is read before the frame.");

    // --- 2. ACT ---
    harness.engine.tick().expect("frame should succeed");

    // --- 3. ASSERT ---
    let pixels = readback.wait().expect("read-back should succeed");
    assert_eq!((pixels.width, pixels.height), (8, 8));
    assert_eq!(pixels.data.len(), 8 * 8 * 4);
    assert!(
        pixels.data.chunks_exact(4).all(|p| p == [255, 0, 0, 255]),
        "The back buffer should be cleared to red."
    );
}

#[test]
fn test_target_is_bound_once_per_frame() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let recorder = harness.engine.recorder();
    recorder.clear(COLOR_BUFFER, [0.0; 4], 1.0, 0);
    recorder.clear(COLOR_BUFFER, [0.0; 4], 1.0, 0);

    // --- 2. ACT ---
    harness.engine.tick().expect("first frame should succeed");
    let first = harness.take_encoder_actions();
    harness
        .engine
        .recorder()
        .clear(COLOR_BUFFER, [0.0; 4], 1.0, 0);
    harness.engine.tick().expect("second frame should succeed");
    let second = harness.take_encoder_actions();

    // --- 3. ASSERT ---
    let binds = |actions: &[DeviceAction]| {
        actions
            .iter()
            .filter(|a| matches!(a, DeviceAction::BindFrameBuffer(None)))
            .count()
    };
    assert_eq!(binds(&first), 1, "Two clears in one frame should bind the target once.");
    assert_eq!(binds(&second), 1, "A new frame should bind the target again.");
}

#[test]
fn test_recreation_runs_the_reset_callback_once() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let resets = Rc::new(Cell::new(0));
    let counter = Rc::clone(&resets);
    harness
        .engine
        .set_render_reset_callback(move |_| counter.set(counter.get() + 1));
    harness.engine.tick().expect("frame should succeed");

    // --- 2. ACT ---
    harness.recreate_device();
    harness.engine.tick().expect("first frame on the new device");
    harness.engine.tick().expect("second frame on the new device");

    // --- 3. ASSERT ---
    assert_eq!(resets.get(), 1, "The reset callback should run once per recreation.");
    assert_eq!(harness.engine.frame_index(), FrameIndex(3));
}

#[test]
fn test_render_size_follows_the_scaling_level() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();

    // --- 2. ACT ---
    harness
        .engine
        .set_hardware_scaling_level(2.0)
        .expect("a positive level is valid");
    let zero = harness.engine.set_hardware_scaling_level(0.0);
    let nan = harness.engine.set_hardware_scaling_level(f32::NAN);

    // --- 3. ASSERT ---
    assert_eq!(harness.engine.render_width(), 4);
    assert_eq!(harness.engine.render_height(), 4);
    assert!(zero.is_err(), "A zero level should be refused.");
    assert!(nan.is_err(), "A NaN level should be refused.");
    assert_eq!(harness.engine.hardware_scaling_level(), 2.0, "Refused levels leave it unchanged.");
}

#[test]
fn test_render_loop_stops_once_cancelled() {
    // --- 1. ARRANGE ---
    let harness = Harness::new();
    let token = CancellationToken::new();
    let mut render_loop = RenderLoop::new(harness.engine, token.clone());
    let stop = token.clone();
    render_loop
        .engine_mut()
        .on_end_of_frame(move |_| stop.cancel());

    // --- 2. ACT ---
    let reports = render_loop.run(5).expect("frames should succeed");

    // --- 3. ASSERT ---
    assert_eq!(reports.len(), 1, "Only the frame that cancelled should run.");
    assert!(render_loop.tick().is_none(), "A cancelled loop does not tick.");
    assert!(token.is_cancelled());
}
