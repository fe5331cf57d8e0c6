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

//! Off-thread shader compilation.
//!
//! Each asynchronous program gets its own worker thread. The worker publishes
//! exactly one result through a bounded(1) channel, unless its
//! [`CancellationToken`] was cancelled first. The engine resolves the result
//! either on a frame tick or on demand, when a command needs the program.

use conduit_core::renderer::{CompiledShaders, RenderError, ShaderCompiler, ShaderError};
use conduit_core::{CancellationToken, Handle};
use std::sync::Arc;
use std::thread;

/// The receiving side of a compile that has not been linked yet.
#[derive(Debug)]
pub struct PendingCompile {
    result: flume::Receiver<Result<CompiledShaders, ShaderError>>,
    completion: flume::Sender<Result<Handle, RenderError>>,
    token: CancellationToken,
}

impl PendingCompile {
    /// Starts compiling `vertex` and `fragment` on a new named thread.
    pub(crate) fn spawn(
        compiler: Arc<dyn ShaderCompiler>,
        vertex: String,
        fragment: String,
        thread_name: &str,
    ) -> Result<(Self, CompileCompletion), RenderError> {
        let (result_tx, result_rx) = flume::bounded(1);
        let (completion_tx, completion_rx) = flume::bounded(1);
        let token = CancellationToken::new();
        let worker_token = token.clone();

        thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || {
                let result = compiler.compile(&vertex, &fragment);
                if worker_token.is_cancelled() {
                    log::debug!("Shader compile finished after cancellation; result dropped.");
                    return;
                }
                // The engine may already be gone.
                let _ = result_tx.send(result);
            })
            .map_err(|e| {
                RenderError::InvalidOperation(format!("failed to spawn compile thread: {e}"))
            })?;

        Ok((
            Self {
                result: result_rx,
                completion: completion_tx,
                token,
            },
            CompileCompletion {
                receiver: completion_rx,
            },
        ))
    }

    /// Prevents the worker from publishing its result.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns the compile result if the worker has published it.
    pub fn try_result(&self) -> Option<Result<CompiledShaders, ShaderError>> {
        match self.result.try_recv() {
            Ok(result) => Some(result),
            Err(flume::TryRecvError::Empty) => None,
            Err(flume::TryRecvError::Disconnected) => Some(Err(ShaderError::Cancelled)),
        }
    }

    /// Blocks until the worker publishes its result.
    pub fn wait(&self) -> Result<CompiledShaders, ShaderError> {
        self.result.recv().unwrap_or(Err(ShaderError::Cancelled))
    }

    /// Reports the final outcome on the caller's completion channel.
    pub fn complete(self, outcome: Result<Handle, RenderError>) {
        // The caller may have dropped its completion handle.
        let _ = self.completion.send(outcome);
    }
}

/// The caller's view of an asynchronous program creation.
///
/// Resolves to the program handle once the program is linked, or to the
/// error that made the engine drop it.
#[derive(Debug)]
pub struct CompileCompletion {
    receiver: flume::Receiver<Result<Handle, RenderError>>,
}

impl CompileCompletion {
    /// Returns the outcome if the engine has published it.
    pub fn try_result(&self) -> Option<Result<Handle, RenderError>> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(flume::TryRecvError::Empty) => None,
            Err(flume::TryRecvError::Disconnected) => Some(Err(ShaderError::Cancelled.into())),
        }
    }

    /// Blocks until the engine publishes the outcome.
    pub fn wait(self) -> Result<Handle, RenderError> {
        self.receiver
            .recv()
            .unwrap_or_else(|_| Err(ShaderError::Cancelled.into()))
    }
}
