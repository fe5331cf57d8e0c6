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

use common::{uploads, Harness};
use conduit_core::renderer::RenderError;
use conduit_core::{EngineSettings, UniformOverflow};
use conduit_infra::DeviceAction;
use conduit_lanes::UniformRef;

const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

#[test]
fn test_uniform_values_stick_until_overwritten() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let (program, [_, color, _, _]) = harness.program();
    let quad = harness.quad();
    let recorder = harness.engine.recorder();
    recorder.set_program(program);
    recorder.bind_vertex_array(quad);
    recorder.set_float4(color, 0.1, 0.2, 0.3, 0.4);
    recorder.draw_indexed(0, 0, 6);
    harness.engine.tick().expect("first frame should succeed");
    harness.journal.take();

    // --- 2. ACT ---
    // No setter in this frame: the cached value must be uploaded again.
    harness.engine.recorder().draw_indexed(0, 0, 6);
    let report = harness.engine.tick().expect("second frame should succeed");

    // --- 3. ASSERT ---
    let actions = harness.take_encoder_actions();
    assert_eq!(report.draw_calls, 1, "The second frame should issue one draw.");
    assert_eq!(
        uploads(&actions),
        vec![vec![0.1, 0.2, 0.3, 0.4]],
        "The value set in the previous frame should be uploaded with the new draw."
    );
}

#[test]
fn test_last_write_before_a_draw_wins() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let (program, [_, color, _, _]) = harness.program();
    let quad = harness.quad();
    let recorder = harness.engine.recorder();
    recorder.set_program(program);
    recorder.bind_vertex_array(quad);

    // --- 2. ACT ---
    recorder.set_float4(color, 1.0, 0.0, 0.0, 1.0);
    recorder.set_float4(color, 0.0, 1.0, 0.0, 1.0);
    recorder.draw_indexed(0, 0, 6);
    let report = harness.engine.tick().expect("frame should succeed");

    // --- 3. ASSERT ---
    let actions = harness.take_encoder_actions();
    assert!(report.errors.is_empty(), "No command should fail: {:?}", report.errors);
    assert_eq!(
        uploads(&actions),
        vec![vec![0.0, 1.0, 0.0, 1.0]],
        "Only the last value written before the draw should reach the device."
    );
}

#[test]
fn test_scalars_and_ints_are_widened_to_vec4() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let (program, [_, color, _, _]) = harness.program();
    let quad = harness.quad();
    let recorder = harness.engine.recorder();
    recorder.set_program(program);
    recorder.bind_vertex_array(quad);

    // --- 2. ACT ---
    recorder.set_int(color, 3);
    recorder.draw_indexed(0, 0, 6);
    recorder.set_float2(color, 0.5, 0.25);
    recorder.draw_indexed(0, 0, 6);
    harness.engine.tick().expect("frame should succeed");

    // --- 3. ASSERT ---
    let actions = harness.take_encoder_actions();
    assert_eq!(
        uploads(&actions),
        vec![vec![3.0, 0.0, 0.0, 0.0], vec![0.5, 0.25, 0.0, 0.0]],
        "Each value should be padded with zeros to one vec4."
    );
}

#[test]
fn test_oversized_array_is_truncated_to_the_declaration() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let (program, [_, _, bones, _]) = harness.program();
    let quad = harness.quad();
    let values: Vec<f32> = (0..12).map(|v| v as f32).collect();
    let recorder = harness.engine.recorder();
    recorder.set_program(program);
    recorder.bind_vertex_array(quad);

    // --- 2. ACT ---
    recorder.set_float_array4(bones, &values);
    recorder.draw_indexed(0, 0, 6);
    let report = harness.engine.tick().expect("frame should succeed");

    // --- 3. ASSERT ---
    let actions = harness.take_encoder_actions();
    assert!(report.errors.is_empty(), "Truncation is not an error.");
    assert_eq!(
        uploads(&actions),
        vec![values[..8].to_vec()],
        "Only the two declared elements should be uploaded."
    );
}

#[test]
fn test_oversized_array_is_refused_when_configured() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::with_settings(EngineSettings {
        uniform_overflow: UniformOverflow::Reject,
        ..EngineSettings::default()
    });
    let (program, [_, _, bones, _]) = harness.program();
    let quad = harness.quad();
    let recorder = harness.engine.recorder();
    recorder.set_program(program);
    recorder.bind_vertex_array(quad);

    // --- 2. ACT ---
    recorder.set_float_array4(bones, &[0.0; 12]);
    recorder.draw_indexed(0, 0, 6);
    let report = harness.engine.tick().expect("a refused value does not abort the frame");

    // --- 3. ASSERT ---
    let actions = harness.take_encoder_actions();
    assert_eq!(report.errors.len(), 1, "The setter should be reported once.");
    assert!(
        matches!(report.errors[0], RenderError::InvalidOperation(_)),
        "Overflow should be an invalid operation, got {:?}",
        report.errors[0]
    );
    assert_eq!(report.draw_calls, 1, "The draw should still be issued.");
    assert!(uploads(&actions).is_empty(), "Nothing was cached, so nothing is uploaded.");
}

#[test]
fn test_matrix_data_must_be_whole_matrices() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let (program, [world, _, _, _]) = harness.program();
    let quad = harness.quad();
    let recorder = harness.engine.recorder();
    recorder.set_program(program);
    recorder.bind_vertex_array(quad);

    // --- 2. ACT ---
    recorder.set_matrices(world, &[1.0; 10]);
    recorder.set_matrix(world, &IDENTITY);
    recorder.draw_indexed(0, 0, 6);
    let report = harness.engine.tick().expect("frame should succeed");

    // --- 3. ASSERT ---
    let actions = harness.take_encoder_actions();
    assert_eq!(report.errors.len(), 1, "The partial matrix should be refused.");
    assert_eq!(
        uploads(&actions),
        vec![IDENTITY.to_vec()],
        "The valid matrix should be uploaded."
    );
}

#[test]
fn test_sync_setter_shares_the_stream_cache() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let (program, _) = harness.program();
    let quad = harness.quad();

    // --- 2. ACT ---
    harness
        .engine
        .set_uniform(program, UniformRef::Name("color"), &[0.5, 0.5, 0.5, 1.0], 1)
        .expect("set by name should succeed");
    let recorder = harness.engine.recorder();
    recorder.set_program(program);
    recorder.bind_vertex_array(quad);
    recorder.draw_indexed(0, 0, 6);
    harness.engine.tick().expect("frame should succeed");

    // --- 3. ASSERT ---
    let actions = harness.take_encoder_actions();
    assert_eq!(
        uploads(&actions),
        vec![vec![0.5, 0.5, 0.5, 1.0]],
        "A value set synchronously should be uploaded by the next draw."
    );
    let unknown = harness
        .engine
        .set_uniform(program, UniformRef::Name("missing"), &[0.0; 4], 1);
    assert!(unknown.is_err(), "Unknown uniform names should be refused.");
}

#[test]
fn test_sync_setter_refuses_malformed_payloads() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let (program, _) = harness.program();
    let quad = harness.quad();

    // --- 2. ACT ---
    let short_vector = harness
        .engine
        .set_uniform(program, UniformRef::Name("color"), &[1.0], 1);
    let ragged_array = harness
        .engine
        .set_uniform(program, UniformRef::Name("bones"), &[1.0, 2.0, 3.0], 3);
    let recorder = harness.engine.recorder();
    recorder.set_program(program);
    recorder.bind_vertex_array(quad);
    recorder.draw_indexed(0, 0, 6);
    harness.engine.tick().expect("frame should succeed");

    // --- 3. ASSERT ---
    assert!(
        matches!(short_vector, Err(RenderError::InvalidOperation(_))),
        "One float cannot fill a vec4, got {short_vector:?}"
    );
    assert!(
        matches!(ragged_array, Err(RenderError::InvalidOperation(_))),
        "Three floats are not three vec4 elements, got {ragged_array:?}"
    );
    let actions = harness.take_encoder_actions();
    assert!(
        uploads(&actions).is_empty(),
        "Refused values must not reach the cache."
    );
}

#[test]
fn test_bound_texture_is_sent_with_the_draw() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let (program, [_, _, _, diffuse]) = harness.program();
    let quad = harness.quad();
    let texture = harness.engine.create_texture().expect("texture");
    harness
        .engine
        .load_texture(texture, 2, 2, &[255; 16], false, false)
        .expect("texture upload should succeed");
    let recorder = harness.engine.recorder();
    recorder.set_program(program);
    recorder.bind_vertex_array(quad);

    // --- 2. ACT ---
    recorder.set_texture(diffuse, texture);
    recorder.draw_indexed(0, 0, 6);
    harness.engine.tick().expect("frame should succeed");

    // --- 3. ASSERT ---
    let actions = harness.take_encoder_actions();
    let bound: Vec<_> = actions
        .iter()
        .filter_map(|action| match action {
            DeviceAction::SetTexture { texture, .. } => Some(*texture),
            _ => None,
        })
        .collect();
    assert_eq!(bound.len(), 1, "One texture binding should be sent.");
    assert!(bound[0].is_some(), "The texture should resolve to a device object.");
}
