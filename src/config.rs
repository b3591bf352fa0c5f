//! Engine configuration record
//!
//! The engine takes a flat JSON object. Values are passed through as-is; the
//! only decisions made here are the defaults and which optional keys to emit.
//! Key reference: https://www.doubango.org/SDKs/micr/docs/Configuration_options.html

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumString};
use tracing::warn;

use crate::cli::{default_enhancements_enabled, MicrFormat};
use crate::config_file::ConfigOverrides;
use crate::error::Result;
use crate::utils::{is_valid_base64, normalize_separators};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DebugLevel {
    Verbose,
    Info,
    Warn,
    Error,
    Fatal,
}

/// How low the segmenter's hysteresis thresholds go. Lower means more
/// fragments, higher recall and more CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SegmenterAccuracy {
    VeryHigh,
    High,
    Medium,
    Low,
    VeryLow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Interpolation {
    Nearest,
    Bilinear,
    Bicubic,
}

/// How per-character scores are folded into the line score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScoreType {
    Min,
    Mean,
    Median,
    Max,
    MinMax,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub debug_level: DebugLevel,
    pub debug_write_input_image_enabled: bool,
    pub debug_internal_data_path: String,

    pub num_threads: i32,
    pub gpgpu_enabled: bool,
    pub gpgpu_workload_balancing_enabled: bool,

    pub segmenter_accuracy: SegmenterAccuracy,
    pub backpropagation_enabled: bool,
    pub ielcd_enabled: bool,
    pub interpolation: Interpolation,

    /// [left, right, top, bottom], all zeros means the whole image
    pub roi: [f32; 4],
    pub min_score: f64,
    pub score_type: ScoreType,

    pub format: MicrFormat,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets_folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_token_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_token_data: Option<String>,

    /// Keys this tool does not know about, forwarded untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Engine options given as command-line flags
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub format: Option<MicrFormat>,
    pub backpropagation_enabled: Option<bool>,
    pub ielcd_enabled: Option<bool>,
    pub assets_folder: Option<PathBuf>,
    pub license_token_file: Option<PathBuf>,
    pub license_token_data: Option<String>,
}

fn path_value(path: Option<&Path>) -> Option<String> {
    path.map(|p| normalize_separators(&p.to_string_lossy()))
        .filter(|p| !p.is_empty())
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::recognizer()
    }
}

impl EngineConfig {
    /// Defaults used by the recognizer
    pub fn recognizer() -> Self {
        Self {
            debug_level: DebugLevel::Info,
            debug_write_input_image_enabled: false,
            debug_internal_data_path: ".".to_string(),
            num_threads: -1,
            gpgpu_enabled: true,
            gpgpu_workload_balancing_enabled: false,
            segmenter_accuracy: SegmenterAccuracy::High,
            backpropagation_enabled: default_enhancements_enabled(),
            ielcd_enabled: default_enhancements_enabled(),
            interpolation: Interpolation::Bilinear,
            roi: [0.0; 4],
            min_score: 0.4,
            score_type: ScoreType::Min,
            format: MicrFormat::E13bCmc7,
            assets_folder: None,
            license_token_file: None,
            license_token_data: None,
            extra: Map::new(),
        }
    }

    /// Defaults used by the benchmark: a lower threshold so negatives still exercise the recognizer
    pub fn benchmark() -> Self {
        Self {
            min_score: 0.3,
            ..Self::recognizer()
        }
    }

    /// Layer values from a configuration file on top of the current ones
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides {
            debug_level,
            debug_write_input_image_enabled,
            debug_internal_data_path,
            num_threads,
            gpgpu_enabled,
            gpgpu_workload_balancing_enabled,
            segmenter_accuracy,
            backpropagation_enabled,
            ielcd_enabled,
            interpolation,
            roi,
            min_score,
            score_type,
            format,
            assets_folder,
            license_token_file,
            license_token_data,
            extra,
        } = overrides;

        if let Some(v) = debug_level {
            self.debug_level = v;
        }
        if let Some(v) = debug_write_input_image_enabled {
            self.debug_write_input_image_enabled = v;
        }
        if let Some(v) = debug_internal_data_path {
            self.debug_internal_data_path = v;
        }
        if let Some(v) = num_threads {
            self.num_threads = v;
        }
        if let Some(v) = gpgpu_enabled {
            self.gpgpu_enabled = v;
        }
        if let Some(v) = gpgpu_workload_balancing_enabled {
            self.gpgpu_workload_balancing_enabled = v;
        }
        if let Some(v) = segmenter_accuracy {
            self.segmenter_accuracy = v;
        }
        if let Some(v) = backpropagation_enabled {
            self.backpropagation_enabled = v;
        }
        if let Some(v) = ielcd_enabled {
            self.ielcd_enabled = v;
        }
        if let Some(v) = interpolation {
            self.interpolation = v;
        }
        if let Some(v) = roi {
            self.roi = v;
        }
        if let Some(v) = min_score {
            self.min_score = v;
        }
        if let Some(v) = score_type {
            self.score_type = v;
        }
        if let Some(v) = format {
            self.format = v;
        }
        if assets_folder.is_some() {
            self.assets_folder = assets_folder;
        }
        if license_token_file.is_some() {
            self.license_token_file = license_token_file;
        }
        if license_token_data.is_some() {
            self.license_token_data = license_token_data;
        }
        self.extra.extend(extra);
    }

    /// Layer command-line values on top of everything else.
    ///
    /// Empty strings count as absent. Paths get Windows separators normalized.
    pub fn apply_cli(&mut self, cli: CliOverrides) {
        if let Some(format) = cli.format {
            self.format = format;
        }
        if let Some(enabled) = cli.backpropagation_enabled {
            self.backpropagation_enabled = enabled;
        }
        if let Some(enabled) = cli.ielcd_enabled {
            self.ielcd_enabled = enabled;
        }
        if let Some(folder) = path_value(cli.assets_folder.as_deref()) {
            self.assets_folder = Some(folder);
        }
        if let Some(file) = path_value(cli.license_token_file.as_deref()) {
            self.license_token_file = Some(file);
        }
        if let Some(data) = cli.license_token_data.filter(|d| !d.is_empty()) {
            if !is_valid_base64(&data) {
                warn!("--tokendata is not valid base64, passing it to the engine as-is");
            }
            self.license_token_data = Some(data);
        }
    }

    /// Defaults, then the optional configuration file, then the command line
    pub fn resolve(defaults: Self, config_file: Option<&Path>, cli: CliOverrides) -> Result<Self> {
        let mut config = defaults;
        config.apply_overrides(ConfigOverrides::load_optional(config_file)?);
        config.apply_cli(cli);
        Ok(config)
    }

    /// Serialize into the JSON string handed to `init`
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognizer_defaults_json() {
        let json: Value = serde_json::from_str(&EngineConfig::recognizer().to_json().unwrap()).unwrap();

        assert_eq!(json["debug_level"], "info");
        assert_eq!(json["debug_write_input_image_enabled"], false);
        assert_eq!(json["debug_internal_data_path"], ".");
        assert_eq!(json["num_threads"], -1);
        assert_eq!(json["gpgpu_enabled"], true);
        assert_eq!(json["gpgpu_workload_balancing_enabled"], false);
        assert_eq!(json["segmenter_accuracy"], "high");
        assert_eq!(json["interpolation"], "bilinear");
        assert_eq!(json["roi"], serde_json::json!([0.0, 0.0, 0.0, 0.0]));
        assert_eq!(json["min_score"], 0.4);
        assert_eq!(json["score_type"], "min");
        assert_eq!(json["format"], "e13b+cmc7");
        assert_eq!(json["backpropagation_enabled"], default_enhancements_enabled());
        assert_eq!(json["ielcd_enabled"], default_enhancements_enabled());
    }

    #[test]
    fn test_unset_optional_keys_are_omitted() {
        let json: Value = serde_json::from_str(&EngineConfig::recognizer().to_json().unwrap()).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("assets_folder"));
        assert!(!object.contains_key("license_token_file"));
        assert!(!object.contains_key("license_token_data"));
    }

    #[test]
    fn test_optional_keys_are_emitted_when_set() {
        let config = EngineConfig {
            assets_folder: Some("/opt/assets".to_string()),
            license_token_data: Some("AAAA".to_string()),
            ..EngineConfig::recognizer()
        };
        let json: Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();
        assert_eq!(json["assets_folder"], "/opt/assets");
        assert_eq!(json["license_token_data"], "AAAA");
    }

    #[test]
    fn test_benchmark_threshold() {
        assert_eq!(EngineConfig::benchmark().min_score, 0.3);
        assert_eq!(EngineConfig::benchmark().format, MicrFormat::E13bCmc7);
    }

    #[test]
    fn test_apply_overrides() {
        let overrides: ConfigOverrides = serde_json::from_str(
            r#"{
                "debug_level": "verbose",
                "num_threads": 4,
                "segmenter_accuracy": "veryhigh",
                "score_type": "minmax",
                "roi": [10, 20, 30, 40],
                "format": "cmc7",
                "charset": "latin"
            }"#,
        )
        .unwrap();

        let mut config = EngineConfig::recognizer();
        config.apply_overrides(overrides);

        assert_eq!(config.debug_level, DebugLevel::Verbose);
        assert_eq!(config.num_threads, 4);
        assert_eq!(config.segmenter_accuracy, SegmenterAccuracy::VeryHigh);
        assert_eq!(config.score_type, ScoreType::MinMax);
        assert_eq!(config.roi, [10.0, 20.0, 30.0, 40.0]);
        assert_eq!(config.format, MicrFormat::Cmc7);
        // untouched values keep their defaults
        assert_eq!(config.min_score, 0.4);
        assert_eq!(config.interpolation, Interpolation::Bilinear);

        let json: Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();
        assert_eq!(json["charset"], "latin");
    }

    #[test]
    fn test_apply_cli() {
        let mut config = EngineConfig::recognizer();
        config.apply_cli(CliOverrides {
            format: Some(MicrFormat::E13b),
            backpropagation_enabled: Some(false),
            ielcd_enabled: Some(true),
            assets_folder: Some(PathBuf::from("../../../assets")),
            license_token_file: Some(PathBuf::from("")),
            license_token_data: Some("AAECAwQF".to_string()),
        });

        assert_eq!(config.format, MicrFormat::E13b);
        assert!(!config.backpropagation_enabled);
        assert!(config.ielcd_enabled);
        assert_eq!(config.assets_folder.as_deref(), Some("../../../assets"));
        // empty values are ignored
        assert_eq!(config.license_token_file, None);
        assert_eq!(config.license_token_data.as_deref(), Some("AAECAwQF"));
    }

    #[test]
    fn test_invalid_token_data_is_passed_through() {
        let mut config = EngineConfig::recognizer();
        config.apply_cli(CliOverrides {
            license_token_data: Some("not base64!".to_string()),
            ..Default::default()
        });
        assert_eq!(config.license_token_data.as_deref(), Some("not base64!"));
    }

    #[test]
    fn test_precedence_defaults_file_cli() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"{ "format": "cmc7", "min_score": 0.8, "assets_folder": "/from/file" }"#,
        )
        .unwrap();

        let config = EngineConfig::resolve(
            EngineConfig::recognizer(),
            Some(file.path()),
            CliOverrides {
                format: Some(MicrFormat::E13b),
                ..Default::default()
            },
        )
        .unwrap();

        // CLI beats the file, the file beats the defaults
        assert_eq!(config.format, MicrFormat::E13b);
        assert_eq!(config.min_score, 0.8);
        assert_eq!(config.assets_folder.as_deref(), Some("/from/file"));
        assert_eq!(config.score_type, ScoreType::Min);
    }

    #[test]
    fn test_resolve_without_file() {
        let config =
            EngineConfig::resolve(EngineConfig::benchmark(), None, CliOverrides::default()).unwrap();
        assert_eq!(config, EngineConfig::benchmark());
    }

    #[test]
    fn test_resolve_bad_file() {
        let err = EngineConfig::resolve(
            EngineConfig::recognizer(),
            Some(Path::new("/no/such/options.json")),
            CliOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, crate::error::MicrError::InvalidConfig { .. }));
    }

    #[test]
    fn test_enum_display() {
        assert_eq!(SegmenterAccuracy::VeryLow.to_string(), "verylow");
        assert_eq!(ScoreType::MinMax.to_string(), "minmax");
        assert_eq!("bicubic".parse::<Interpolation>().unwrap(), Interpolation::Bicubic);
    }
}
