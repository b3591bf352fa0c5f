use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::cli::MicrFormat;
use crate::config::{DebugLevel, Interpolation, ScoreType, SegmenterAccuracy};
use crate::error::{MicrError, Result};

/// Engine options read from a JSON file.
///
/// Every field is optional; only the keys present in the file override the
/// built-in defaults. Unknown keys are kept and forwarded to the engine.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ConfigOverrides {
    pub debug_level: Option<DebugLevel>,
    pub debug_write_input_image_enabled: Option<bool>,
    pub debug_internal_data_path: Option<String>,
    pub num_threads: Option<i32>,
    pub gpgpu_enabled: Option<bool>,
    pub gpgpu_workload_balancing_enabled: Option<bool>,
    pub segmenter_accuracy: Option<SegmenterAccuracy>,
    pub backpropagation_enabled: Option<bool>,
    pub ielcd_enabled: Option<bool>,
    pub interpolation: Option<Interpolation>,
    pub roi: Option<[f32; 4]>,
    pub min_score: Option<f64>,
    pub score_type: Option<ScoreType>,
    pub format: Option<MicrFormat>,
    pub assets_folder: Option<String>,
    pub license_token_file: Option<String>,
    pub license_token_data: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConfigOverrides {
    /// Load overrides from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| MicrError::InvalidConfig {
            path: path.to_path_buf(),
            reason: format!("failed to read file: {}", e),
        })?;

        let overrides: ConfigOverrides =
            serde_json::from_str(&contents).map_err(|e| MicrError::InvalidConfig {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        tracing::debug!("Loaded engine options from: {}", path.display());
        Ok(overrides)
    }

    /// Load overrides when a path was given, empty overrides otherwise
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
