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

use common::{position_layout, Harness};
use conduit_core::renderer::{GraphicsDevice, RenderError, ResourceError, TextureFormat};
use conduit_infra::DeviceAction;

const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

#[test]
fn test_indexed_draw_emits_bindings_uploads_and_draw_in_order() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let (program, [world, color, _, _]) = harness.program();
    let quad = harness.quad();
    harness.journal.take();

    // --- 2. ACT ---
    let recorder = harness.engine.recorder();
    recorder.set_program(program);
    recorder.bind_vertex_array(quad);
    recorder.set_matrix(world, &IDENTITY);
    recorder.set_float4(color, 1.0, 0.5, 0.25, 1.0);
    recorder.draw_indexed(0, 0, 6);
    let report = harness.engine.tick().expect("frame should succeed");

    // --- 3. ASSERT ---
    assert!(report.errors.is_empty(), "No command should fail: {:?}", report.errors);
    let sequence: Vec<&'static str> = harness
        .take_encoder_actions()
        .iter()
        .filter_map(|action| match action {
            DeviceAction::BindProgram(_) => Some("bind_program"),
            DeviceAction::BindVertexArray { .. } => Some("bind_vertex_array"),
            DeviceAction::UploadUniform { .. } => Some("upload_uniform"),
            DeviceAction::DrawIndexed { count: 6, .. } => Some("draw_indexed_6"),
            DeviceAction::DrawIndexed { .. } | DeviceAction::Draw { .. } => Some("other_draw"),
            _ => None,
        })
        .collect();
    assert_eq!(
        sequence,
        vec![
            "bind_program",
            "bind_vertex_array",
            "upload_uniform",
            "upload_uniform",
            "draw_indexed_6"
        ],
        "The draw should bind, upload both uniforms and draw exactly once."
    );
    assert_eq!(report.uniform_uploads, 2, "The report should count both uploads.");
}

#[test]
fn test_failed_draw_emits_nothing() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let (program, _) = harness.program();
    let vertex_buffer = harness
        .engine
        .create_vertex_buffer(&[0; 36], false)
        .expect("vertex buffer");
    let vertex_array = harness.engine.create_vertex_array().expect("vertex array");
    harness
        .engine
        .record_vertex_buffer(vertex_array, vertex_buffer, position_layout())
        .expect("record");
    harness.journal.take();

    // --- 2. ACT ---
    // Indexed draw without an index buffer.
    let recorder = harness.engine.recorder();
    recorder.set_program(program);
    recorder.bind_vertex_array(vertex_array);
    recorder.draw_indexed(0, 0, 3);
    let report = harness.engine.tick().expect("a failed draw does not abort the frame");

    // --- 3. ASSERT ---
    assert_eq!(report.errors.len(), 1, "The draw should be reported as failed.");
    assert_eq!(report.draw_calls, 0, "No draw should be counted.");
    assert!(
        harness.take_encoder_actions().is_empty(),
        "A failed draw should leave no trace on the encoder."
    );
}

#[test]
fn test_delete_after_recreation_makes_no_device_call() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let old_buffer = harness
        .engine
        .create_vertex_buffer(&[0; 12], true)
        .expect("vertex buffer");
    let new_device = harness.recreate_device();
    let new_buffer = harness
        .engine
        .create_vertex_buffer(&[0; 12], true)
        .expect("vertex buffer on the new device");
    harness.journal.take();

    // --- 2. ACT ---
    harness.engine.recorder().delete_vertex_buffer(old_buffer);
    let report = harness.engine.tick().expect("frame should succeed");

    // --- 3. ASSERT ---
    assert!(report.errors.is_empty(), "Deleting a stale object is not an error.");
    assert_eq!(
        harness
            .journal
            .count(|a| matches!(a, DeviceAction::DestroyBuffer(_))),
        0,
        "The old buffer must never be destroyed through the new device."
    );
    assert_eq!(
        new_device.live_objects().expect("live objects"),
        1,
        "The buffer created on the new device must survive."
    );
    let update = harness
        .engine
        .update_dynamic_vertex_buffer(old_buffer, 0, &[1; 4]);
    assert!(
        matches!(update, Err(RenderError::StaleHandle { .. })),
        "The deleted record should be gone, got {update:?}"
    );
    assert!(
        harness
            .engine
            .update_dynamic_vertex_buffer(new_buffer, 0, &[1; 4])
            .is_ok(),
        "The new buffer should still be writable."
    );
}

#[test]
fn test_framebuffer_from_previous_device_is_dropped_without_destroy() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let texture = harness.engine.create_texture().expect("texture");
    harness
        .engine
        .initialize_texture(texture, 4, 4, false, TextureFormat::Rgba8Unorm, true)
        .expect("render target storage");
    let frame_buffer = harness
        .engine
        .create_frame_buffer(Some(texture), 4, 4, false, true)
        .expect("framebuffer");
    harness.recreate_device();
    harness.journal.take();

    // --- 2. ACT ---
    harness.engine.recorder().delete_frame_buffer(frame_buffer);
    harness.engine.tick().expect("frame should succeed");
    harness
        .engine
        .delete_texture(texture)
        .expect("deleting a stale texture should succeed");

    // --- 3. ASSERT ---
    let actions = harness.journal.take();
    assert!(
        !actions
            .iter()
            .any(|a| matches!(a, DeviceAction::DestroyFrameBuffer(_) | DeviceAction::DestroyTexture(_))),
        "Objects of the previous generation must not be destroyed: {actions:?}"
    );
    harness.engine.recorder().bind_frame_buffer(frame_buffer);
    let report = harness.engine.tick().expect("frame should succeed");
    assert!(
        matches!(
            report.errors.as_slice(),
            [RenderError::StaleHandle { kind: "framebuffer", .. }]
        ),
        "The framebuffer record should be gone, got {:?}",
        report.errors
    );
}

#[test]
fn test_deleted_and_mistyped_handles_are_stale() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let texture = harness.engine.create_texture().expect("texture");
    harness
        .engine
        .load_texture(texture, 1, 1, &[0, 0, 0, 255], false, false)
        .expect("texture upload");
    let vertex_buffer = harness
        .engine
        .create_vertex_buffer(&[0; 12], false)
        .expect("vertex buffer");

    // --- 2. ACT ---
    harness.engine.delete_texture(texture).expect("delete");
    let deleted = harness.engine.get_texture_width(texture);
    let mistyped = harness.engine.get_texture_width(vertex_buffer);

    // --- 3. ASSERT ---
    assert!(
        matches!(deleted, Err(RenderError::StaleHandle { kind: "texture", .. })),
        "A deleted texture should be stale, got {deleted:?}"
    );
    assert!(
        matches!(mistyped, Err(RenderError::StaleHandle { kind: "texture", .. })),
        "A vertex buffer is not a texture, got {mistyped:?}"
    );
    assert_eq!(
        harness
            .journal
            .count(|a| matches!(a, DeviceAction::DestroyTexture(_))),
        1,
        "The texture should be destroyed exactly once."
    );
}

#[test]
fn test_unsupported_entry_points_report_unsupported() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let (program, _) = harness.program();
    let quad = harness.quad();
    let texture = harness.engine.create_texture().expect("texture");

    // --- 2. ACT ---
    let bitmap = harness.engine.create_image_bitmap(&[0; 4]);
    let resized = harness.engine.resize_image_bitmap(texture, 2, 2);
    let array = harness
        .engine
        .load_raw_texture_2d_array(texture, &[0; 32], 2, 2, 2);
    let recorder = harness.engine.recorder();
    recorder.set_program(program);
    recorder.bind_vertex_array(quad);
    recorder.draw_indexed(8, 0, 6);
    let report = harness.engine.tick().expect("frame should succeed");

    // --- 3. ASSERT ---
    assert!(matches!(bitmap, Err(RenderError::Unsupported(_))), "{bitmap:?}");
    assert!(matches!(resized, Err(RenderError::Unsupported(_))), "{resized:?}");
    assert!(matches!(array, Err(RenderError::Unsupported(_))), "{array:?}");
    assert!(
        matches!(report.errors.as_slice(), [RenderError::Unsupported(_)]),
        "Triangle fans should be unsupported, got {:?}",
        report.errors
    );
}

#[test]
fn test_default_framebuffer_cannot_be_deleted() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let default = harness.engine.default_frame_buffer();

    // --- 2. ACT ---
    harness.engine.recorder().delete_frame_buffer(default);
    let report = harness.engine.tick().expect("frame should succeed");

    // --- 3. ASSERT ---
    assert!(
        matches!(report.errors.as_slice(), [RenderError::InvalidOperation(_)]),
        "Deleting the default target should be refused, got {:?}",
        report.errors
    );
    assert_eq!(harness.engine.resource_count(), 1, "The default record should remain.");
}

#[test]
fn test_bound_vertex_array_cannot_be_recorded_into() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let quad = harness.quad();
    let extra = harness
        .engine
        .create_vertex_buffer(&[0; 12], false)
        .expect("vertex buffer");
    harness.engine.recorder().bind_vertex_array(quad);
    harness.engine.tick().expect("frame should succeed");

    // --- 2. ACT ---
    let result = harness
        .engine
        .record_vertex_buffer(quad, extra, position_layout());

    // --- 3. ASSERT ---
    assert!(
        matches!(result, Err(RenderError::InvalidOperation(_))),
        "The bound vertex array should be immutable, got {result:?}"
    );
}

#[test]
fn test_framebuffer_texture_must_match_size() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let texture = harness.engine.create_texture().expect("texture");
    harness
        .engine
        .initialize_texture(texture, 4, 4, false, TextureFormat::Rgba8Unorm, true)
        .expect("render target storage");

    // --- 2. ACT ---
    let result = harness
        .engine
        .create_frame_buffer(Some(texture), 8, 8, false, false);

    // --- 3. ASSERT ---
    assert!(
        matches!(result, Err(RenderError::InvalidOperation(_))),
        "A 4x4 texture cannot back an 8x8 framebuffer, got {result:?}"
    );
}

#[test]
fn test_out_of_range_updates_fail_without_breaking_the_device() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let buffer = harness
        .engine
        .create_vertex_buffer(&[0; 8], true)
        .expect("dynamic buffer");
    let texture = harness.engine.create_texture().expect("texture");

    // --- 2. ACT ---
    let huge_offset = harness
        .engine
        .update_dynamic_vertex_buffer(buffer, u64::MAX, &[1; 4]);
    let huge_texture = harness.engine.initialize_texture(
        texture,
        70_000,
        70_000,
        false,
        TextureFormat::Rgba8Unorm,
        false,
    );

    // --- 3. ASSERT ---
    assert!(
        matches!(huge_offset, Err(RenderError::Resource(ResourceError::OutOfBounds))),
        "An overflowing offset should be out of bounds, got {huge_offset:?}"
    );
    assert!(
        matches!(huge_texture, Err(RenderError::Resource(ResourceError::OutOfBounds))),
        "An oversized texture should be refused, got {huge_texture:?}"
    );
    harness
        .engine
        .update_dynamic_vertex_buffer(buffer, 4, &[1; 4])
        .expect("the buffer should stay writable");
    harness
        .engine
        .initialize_texture(texture, 4, 4, false, TextureFormat::Rgba8Unorm, false)
        .expect("a regular texture should still be created");
}

#[test]
fn test_cube_mip_levels_are_bounded_by_the_chain() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let texture = harness.engine.create_texture().expect("texture");
    let texel: &[u8] = &[0; 4];
    let quad_face: &[u8] = &[0; 16];

    // --- 2. ACT ---
    let one_too_many = harness.engine.load_cube_texture_with_mips(
        texture,
        &[[quad_face; 6], [texel; 6], [texel; 6]],
        2,
    );
    let far_too_many = harness
        .engine
        .load_cube_texture_with_mips(texture, &vec![[texel; 6]; 40], 1);
    let full_chain = harness
        .engine
        .load_cube_texture_with_mips(texture, &[[quad_face; 6], [texel; 6]], 2);

    // --- 3. ASSERT ---
    assert!(
        matches!(one_too_many, Err(RenderError::InvalidOperation(_))),
        "A 2x2 cube has two levels, got {one_too_many:?}"
    );
    assert!(
        matches!(far_too_many, Err(RenderError::InvalidOperation(_))),
        "Forty levels for a 1x1 cube should be refused, got {far_too_many:?}"
    );
    assert!(full_chain.is_ok(), "The full chain should load, got {full_chain:?}");
    assert_eq!(harness.engine.get_texture_width(texture), Ok(2));
}

#[test]
fn test_program_is_destroyed_even_if_a_uniform_destroy_fails() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let (program, _) = harness.program();
    let uniform = harness
        .journal
        .snapshot()
        .into_iter()
        .find_map(|action| match action {
            DeviceAction::CreateUniform { uniform, .. } => Some(uniform),
            _ => None,
        })
        .expect("the program should declare uniforms");
    harness
        .device
        .destroy_uniform(uniform)
        .expect("destroying the uniform behind the engine's back");
    let live_before = harness.device.live_objects().expect("live objects");
    harness.journal.take();

    // --- 2. ACT ---
    harness.engine.recorder().delete_program(program);
    let report = harness.engine.tick().expect("frame should succeed");

    // --- 3. ASSERT ---
    assert_eq!(
        report.errors.len(),
        1,
        "The failed uniform destroy should be reported."
    );
    assert!(
        harness
            .journal
            .snapshot()
            .iter()
            .any(|action| matches!(action, DeviceAction::DestroyProgram(_))),
        "The program itself should still be destroyed."
    );
    assert_eq!(
        harness.device.live_objects().expect("live objects"),
        live_before - 4,
        "The program and its three remaining uniforms should be gone."
    );
}

#[test]
fn test_dropping_the_engine_releases_every_device_object() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    harness.program();
    harness.quad();
    let texture = harness.engine.create_texture().expect("texture");
    harness
        .engine
        .initialize_texture(texture, 4, 4, true, TextureFormat::Rgba8Unorm, true)
        .expect("storage");
    harness
        .engine
        .create_frame_buffer(Some(texture), 4, 4, true, true)
        .expect("framebuffer");
    assert!(harness.device.live_objects().expect("live objects") > 0);

    // --- 2. ACT ---
    let device = harness.device.clone();
    drop(harness);

    // --- 3. ASSERT ---
    assert_eq!(
        device.live_objects().expect("live objects"),
        0,
        "Every object created by the engine should be destroyed with it."
    );
}
