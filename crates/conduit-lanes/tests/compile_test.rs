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

use common::{Harness, FRAGMENT_SHADER, VERTEX_SHADER};
use conduit_core::renderer::{RenderError, ResourceError, ShaderError};
use conduit_core::EngineSettings;
use conduit_infra::DeviceAction;

#[test]
fn test_async_program_is_usable_before_its_compile_finishes() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let (program, completion) = harness
        .engine
        .create_program_async(VERTEX_SHADER, FRAGMENT_SHADER)
        .expect("the compile should start");

    // --- 2. ACT ---
    // Needs the linked program, so it waits for the worker.
    let locations = harness
        .engine
        .get_uniforms(program, &["color", "missing"])
        .expect("the program should link");

    // --- 3. ASSERT ---
    assert!(locations[0].is_some(), "A declared uniform should have a location.");
    assert!(locations[1].is_none(), "An undeclared uniform should not.");
    assert_eq!(
        completion.wait().expect("the compile should succeed"),
        program,
        "The completion should resolve to the program handle."
    );
    assert_eq!(
        harness
            .engine
            .get_attributes(program, &["position"])
            .expect("attributes"),
        vec![Some(0)]
    );
}

#[test]
fn test_async_program_is_published_by_a_tick() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::with_settings(EngineSettings {
        compile_threads_name: "compile-worker".to_string(),
        ..EngineSettings::default()
    });
    let (program, completion) = harness
        .engine
        .create_program_async(VERTEX_SHADER, FRAGMENT_SHADER)
        .expect("the compile should start");

    // --- 2. ACT ---
    let mut outcome = None;
    for _ in 0..1000 {
        harness.engine.tick().expect("frame should succeed");
        outcome = completion.try_result();
        if outcome.is_some() {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(1));
    }

    // --- 3. ASSERT ---
    assert_eq!(outcome, Some(Ok(program)), "A tick should publish the finished compile.");
    assert_eq!(
        harness
            .journal
            .count(|a| matches!(a, DeviceAction::CreateProgram(_))),
        1,
        "The program should be linked exactly once."
    );
}

#[test]
fn test_failed_async_program_is_dropped() {
    // --- 1. ARRANGE ---
    let mut harness = Harness::new();
    let (program, completion) = harness
        .engine
        .create_program_async(VERTEX_SHADER, "#error broken fragment\nvoid main() {}")
        .expect("the compile should start");

    // --- 2. ACT ---
    let first = harness.engine.get_uniforms(program, &["color"]);
    let second = harness.engine.get_uniforms(program, &["color"]);

    // --- 3. ASSERT ---
    assert!(
        matches!(
            first,
            Err(RenderError::Resource(ResourceError::Shader(
                ShaderError::CompilationError { .. }
            )))
        ),
        "The first use should surface the compile error, got {first:?}"
    );
    assert!(
        matches!(second, Err(RenderError::StaleHandle { kind: "program", .. })),
        "The failed program should be removed, got {second:?}"
    );
    assert!(
        completion.wait().is_err(),
        "The completion should report the failure."
    );
    assert_eq!(harness.engine.resource_count(), 1, "Only the default framebuffer remains.");
}

#[test]
fn test_dropping_the_engine_cancels_pending_compiles() {
    // --- 1. ARRANGE ---
    let harness = Harness::new();
    let mut engine = harness.engine;
    let (_program, completion) = engine
        .create_program_async(VERTEX_SHADER, FRAGMENT_SHADER)
        .expect("the compile should start");

    // --- 2. ACT ---
    drop(engine);

    // --- 3. ASSERT ---
    assert!(
        completion.wait().is_err(),
        "A cancelled compile never resolves to a program."
    );
    assert_eq!(
        harness
            .journal
            .count(|a| matches!(a, DeviceAction::CreateProgram(_))),
        0,
        "A cancelled compile should never be linked."
    );
}
