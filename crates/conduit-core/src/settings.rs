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

//! Engine settings, loaded from RON.

use crate::frame::MAX_FRAMES_IN_FLIGHT;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// What to do when a uniform value carries more elements than the shader declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UniformOverflow {
    /// Keep exactly the declared number of elements and drop the rest.
    #[default]
    Truncate,
    /// Refuse the value with an invalid-operation error.
    Reject,
}

/// An error raised while loading [`EngineSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    /// The settings text is not valid RON for [`EngineSettings`].
    #[error("failed to parse settings: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// The settings could not be written out as RON.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] ron::Error),
}

/// Tunables of the command engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Policy for uniform values longer than their declaration.
    pub uniform_overflow: UniformOverflow,
    /// Divisor applied to the back buffer size to obtain the render size.
    pub hardware_scaling_level: f32,
    /// If `true`, a drain that leaves unread words in a buffer is a protocol error.
    pub validate_stream_exhaustion: bool,
    /// Name given to shader compilation worker threads.
    pub compile_threads_name: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            uniform_overflow: UniformOverflow::Truncate,
            hardware_scaling_level: 1.0,
            validate_stream_exhaustion: true,
            compile_threads_name: "conduit-shader-compile".to_string(),
        }
    }
}

impl EngineSettings {
    /// Parses settings from RON text. Missing fields take their default value.
    pub fn from_ron_str(text: &str) -> Result<Self, SettingsError> {
        Ok(ron::from_str(text)?)
    }

    /// Reads and parses a RON settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_ron_str(&text)?;
        log::info!("Loaded engine settings from {}.", path.as_ref().display());
        Ok(settings)
    }

    /// Serializes the settings as pretty RON.
    pub fn to_ron_string(&self) -> Result<String, SettingsError> {
        let pretty_config = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        Ok(ron::ser::to_string_pretty(self, pretty_config)?)
    }

    /// Number of frames the engine keeps in flight. Fixed, reported for diagnostics.
    pub const fn max_frames_in_flight(&self) -> usize {
        MAX_FRAMES_IN_FLIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_take_defaults() {
        let settings = EngineSettings::from_ron_str("(uniform_overflow: Reject)")
            .expect("valid settings");
        assert_eq!(settings.uniform_overflow, UniformOverflow::Reject);
        assert_eq!(settings.hardware_scaling_level, 1.0);
        assert!(settings.validate_stream_exhaustion);
    }

    #[test]
    fn malformed_text_is_a_parse_error() {
        let err = EngineSettings::from_ron_str("(uniform_overflow: Sometimes)")
            .expect_err("unknown variant");
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            "(hardware_scaling_level: 2.0, compile_threads_name: \"compile\")"
        )
        .expect("write settings");

        let settings = EngineSettings::load(file.path()).expect("load settings");
        assert_eq!(settings.hardware_scaling_level, 2.0);
        assert_eq!(settings.compile_threads_name, "compile");
        assert_eq!(settings.uniform_overflow, UniformOverflow::Truncate);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = EngineSettings::load(dir.path().join("absent.ron")).expect_err("no file");
        assert!(matches!(err, SettingsError::Io(_)));
    }

    #[test]
    fn pretty_output_parses_back() {
        let settings = EngineSettings {
            uniform_overflow: UniformOverflow::Reject,
            ..Default::default()
        };
        let text = settings.to_ron_string().expect("serialize");
        assert_eq!(EngineSettings::from_ron_str(&text).expect("parse"), settings);
    }
}
