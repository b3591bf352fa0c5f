use clap::{ArgAction, CommandFactory, Parser, ValueEnum};
use tracing::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{MicrError, Result};

/// MICR fonts the engine can look for
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Serialize, Deserialize)]
pub enum MicrFormat {
    /// E-13B lines only (North America, UK, Australia...)
    #[value(name = "e13b")]
    #[serde(rename = "e13b")]
    E13b,
    /// CMC-7 lines only (France, Spain, Brazil...)
    #[value(name = "cmc7")]
    #[serde(rename = "cmc7")]
    Cmc7,
    /// Both fonts. Slower, only use when a document may carry both
    #[value(name = "e13b+cmc7")]
    #[serde(rename = "e13b+cmc7")]
    E13bCmc7,
}

impl MicrFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            MicrFormat::E13b => "e13b",
            MicrFormat::Cmc7 => "cmc7",
            MicrFormat::E13bCmc7 => "e13b+cmc7",
        }
    }
}

/// Backpropagation and IELCD are worth their cost on x86 but not on ARM
pub const fn default_enhancements_enabled() -> bool {
    !cfg!(any(target_arch = "arm", target_arch = "aarch64"))
}

/// Flat `--key value` arguments, validated but not yet typed.
///
/// Repeated keys keep the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgMap {
    values: BTreeMap<String, String>,
}

impl ArgMap {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn path(&self, key: &str) -> Option<PathBuf> {
        self.get(key).map(PathBuf::from)
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    /// Path that must be present, `Usage` error otherwise
    pub fn required_path(&self, key: &str) -> Result<PathBuf> {
        self.path(key)
            .ok_or_else(|| MicrError::Usage(format!("{} required", key)))
    }

    /// Typed value of `key` when present; a rejected value is a `Usage` error
    pub fn parsed<T>(
        &self,
        key: &str,
        parse: impl Fn(&str) -> std::result::Result<T, String>,
    ) -> Result<Option<T>> {
        self.get(key)
            .map(|value| parse(value).map_err(MicrError::Usage))
            .transpose()
    }
}

/// Typed arguments read from a validated [`ArgMap`]
pub trait FromArgMap: Sized {
    /// Keys this command understands; any other key is ignored
    const KEYS: &'static [&'static str];

    fn from_arg_map(map: &ArgMap) -> Result<Self>;
}

/// Parse an argument list (program name excluded) made of `--key value` pairs
pub fn parse_pairs<I, S>(args: I) -> Result<ArgMap>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();

    if args.len() & 1 != 0 {
        return Err(MicrError::OddArgumentCount(args.len()));
    }

    let mut values = BTreeMap::new();
    for pair in args.chunks_exact(2) {
        let key = &pair[0];
        if key.len() < 2 || !key.starts_with("--") {
            return Err(MicrError::InvalidKey(key.clone()));
        }
        values.insert(key.clone(), pair[1].clone());
    }

    Ok(ArgMap { values })
}

/// Validate the pair layout of a full argv (program name first) and type the
/// keys the command knows. Unknown keys are ignored.
pub fn parse_flat<T, I, S>(argv: I) -> Result<T>
where
    T: FromArgMap,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let pairs = parse_pairs(argv.into_iter().map(Into::into).skip(1))?;
    for key in pairs.keys().filter(|key| !T::KEYS.contains(key)) {
        debug!("Ignoring unknown argument: {}", key);
    }
    T::from_arg_map(&pairs)
}

/// Long help text for a command, printed after argument errors
pub fn usage<T: CommandFactory>() -> String {
    T::command().render_long_help().to_string()
}

pub const DEFAULT_LOOPS: usize = 100;
pub const DEFAULT_RATE: f64 = 0.2;

/// `true` is the only spelling that enables a switch
fn parse_switch(value: &str) -> std::result::Result<bool, String> {
    Ok(value == "true")
}

fn parse_loops(value: &str) -> std::result::Result<usize, String> {
    match value.trim().parse::<i64>() {
        Ok(loops) if loops >= 1 => Ok(loops as usize),
        _ => Err("--loops must be within [1, inf]".to_string()),
    }
}

fn parse_format(value: &str) -> std::result::Result<MicrFormat, String> {
    <MicrFormat as ValueEnum>::from_str(value, false).map_err(|_| {
        format!(
            "invalid value '{}' for '--format': expected e13b, cmc7 or e13b+cmc7",
            value
        )
    })
}

fn parse_seed(value: &str) -> std::result::Result<u64, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("invalid value '{}' for '--seed'", value))
}

fn parse_rate(value: &str) -> std::result::Result<f64, String> {
    match value.trim().parse::<f64>() {
        Ok(rate) if (0.0..=1.0).contains(&rate) => Ok(rate),
        _ => Err("--rate must be within [0.0, 1.0]".to_string()),
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "recognizer",
    about = "Recognize MICR lines (E-13B / CMC-7) on a check image",
    disable_help_flag = true,
    disable_version_flag = true,
    long_about = "
MICR Recognizer

Decodes a JPEG/PNG/BMP image, hands the pixels to the native MICR engine and
prints the JSON result. Arguments must be given as `--key value` pairs.

Example Usage:
  recognizer --image ./assets/images/e13b_1280x720.jpg --assets ./assets \\
    --format e13b+cmc7 --backprop true --tokenfile ./tokens/host.lic"
)]
pub struct RecognizerArgs {
    /// Path to the image (JPEG/PNG/BMP) with the MICR zone to recognize
    #[arg(long = "image", value_name = "PATH", allow_hyphen_values = true)]
    pub image: Option<PathBuf>,

    /// Path to the folder containing the configuration files and models. Default: current folder
    #[arg(long = "assets", value_name = "DIR", allow_hyphen_values = true)]
    pub assets: Option<PathBuf>,

    /// MICR format to look for. Avoid "e13b+cmc7" unless documents really carry both fonts. Default: e13b+cmc7
    #[arg(long = "format", value_name = "FORMAT")]
    pub format: Option<MicrFormat>,

    /// Whether to enable backpropagation (CMC-7 only). Default: true on x86, false on ARM
    #[arg(long = "backprop", value_name = "BOOL", value_parser = parse_switch)]
    pub backprop: Option<bool>,

    /// Whether to enable Image Enhancement for Low Contrast Document. Default: true on x86, false on ARM
    #[arg(long = "ielcd", value_name = "BOOL", value_parser = parse_switch)]
    pub ielcd: Option<bool>,

    /// Path to the file containing the base64 license token. Without a token the engine runs as a trial
    #[arg(long = "tokenfile", value_name = "PATH", allow_hyphen_values = true)]
    pub tokenfile: Option<PathBuf>,

    /// Base64 license token. Without a token the engine runs as a trial
    #[arg(long = "tokendata", value_name = "BASE64", allow_hyphen_values = true)]
    pub tokendata: Option<String>,

    /// JSON file with engine options; command-line values take precedence
    #[arg(long = "config", value_name = "FILE", allow_hyphen_values = true)]
    pub config: Option<PathBuf>,

    /// Path to the engine shared library. Default: platform library name, resolved by the loader
    #[arg(long = "engine", value_name = "LIBRARY", allow_hyphen_values = true)]
    pub engine: Option<PathBuf>,
}

impl RecognizerArgs {
    pub fn backprop_enabled(&self) -> bool {
        self.backprop.unwrap_or(default_enhancements_enabled())
    }

    pub fn ielcd_enabled(&self) -> bool {
        self.ielcd.unwrap_or(default_enhancements_enabled())
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "benchmark",
    about = "Measure MICR engine throughput over a mix of positive and negative images",
    disable_help_flag = true,
    disable_version_flag = true,
    long_about = "
MICR Benchmark

Runs the engine `--loops` times over a shuffled mix of an image with MICR
lines (positive) and one without (negative). `--rate` is the share of
positives. Warm-up is excluded from timing.

Example Usage:
  benchmark --positive ./assets/images/e13b_1280x720.jpg \\
    --negative ./assets/images/traffic_1280x720.jpg --loops 100 --rate 0.2"
)]
pub struct BenchmarkArgs {
    /// Path to an image (JPEG/PNG/BMP) with MICR lines, evaluates the recognizer
    #[arg(long = "positive", value_name = "PATH", required = true, allow_hyphen_values = true)]
    pub positive: PathBuf,

    /// Path to an image (JPEG/PNG/BMP) without MICR lines, evaluates the detector
    #[arg(long = "negative", value_name = "PATH", required = true, allow_hyphen_values = true)]
    pub negative: PathBuf,

    /// Number of times to run the processing pipeline
    #[arg(long = "loops", value_name = "N", default_value_t = DEFAULT_LOOPS, value_parser = parse_loops, allow_hyphen_values = true)]
    pub loops: usize,

    /// Share of positive images within [0.0, 1.0]
    #[arg(long = "rate", value_name = "RATE", default_value_t = DEFAULT_RATE, value_parser = parse_rate, allow_hyphen_values = true)]
    pub rate: f64,

    /// Seed for the image shuffle. Random when absent
    #[arg(long = "seed", value_name = "N")]
    pub seed: Option<u64>,

    /// Path to the folder containing the configuration files and models
    #[arg(long = "assets", value_name = "DIR", allow_hyphen_values = true)]
    pub assets: Option<PathBuf>,

    /// MICR format to look for. Default: e13b+cmc7
    #[arg(long = "format", value_name = "FORMAT")]
    pub format: Option<MicrFormat>,

    /// Path to the file containing the base64 license token
    #[arg(long = "tokenfile", value_name = "PATH", allow_hyphen_values = true)]
    pub tokenfile: Option<PathBuf>,

    /// Base64 license token
    #[arg(long = "tokendata", value_name = "BASE64", allow_hyphen_values = true)]
    pub tokendata: Option<String>,

    /// JSON file with engine options; command-line values take precedence
    #[arg(long = "config", value_name = "FILE", allow_hyphen_values = true)]
    pub config: Option<PathBuf>,

    /// Path to the engine shared library
    #[arg(long = "engine", value_name = "LIBRARY", allow_hyphen_values = true)]
    pub engine: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "runtime-key",
    about = "Request the runtime license key of this host from the MICR engine",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct RuntimeKeyArgs {
    /// Output the key as a JSON document instead of the raw string
    #[arg(
        long = "json",
        value_name = "BOOL",
        default_value = "true",
        action = ArgAction::Set,
        value_parser = parse_switch
    )]
    pub json: bool,

    /// Path to the folder containing the configuration files and models
    #[arg(long = "assets", value_name = "DIR", allow_hyphen_values = true)]
    pub assets: Option<PathBuf>,

    /// Path to the engine shared library
    #[arg(long = "engine", value_name = "LIBRARY", allow_hyphen_values = true)]
    pub engine: Option<PathBuf>,
}

impl FromArgMap for RecognizerArgs {
    const KEYS: &'static [&'static str] = &[
        "--image",
        "--assets",
        "--format",
        "--backprop",
        "--ielcd",
        "--tokenfile",
        "--tokendata",
        "--config",
        "--engine",
    ];

    fn from_arg_map(map: &ArgMap) -> Result<Self> {
        Ok(Self {
            image: map.path("--image"),
            assets: map.path("--assets"),
            format: map.parsed("--format", parse_format)?,
            backprop: map.parsed("--backprop", parse_switch)?,
            ielcd: map.parsed("--ielcd", parse_switch)?,
            tokenfile: map.path("--tokenfile"),
            tokendata: map.string("--tokendata"),
            config: map.path("--config"),
            engine: map.path("--engine"),
        })
    }
}

impl FromArgMap for BenchmarkArgs {
    const KEYS: &'static [&'static str] = &[
        "--positive",
        "--negative",
        "--loops",
        "--rate",
        "--seed",
        "--assets",
        "--format",
        "--tokenfile",
        "--tokendata",
        "--config",
        "--engine",
    ];

    fn from_arg_map(map: &ArgMap) -> Result<Self> {
        Ok(Self {
            positive: map.required_path("--positive")?,
            negative: map.required_path("--negative")?,
            loops: map.parsed("--loops", parse_loops)?.unwrap_or(DEFAULT_LOOPS),
            rate: map.parsed("--rate", parse_rate)?.unwrap_or(DEFAULT_RATE),
            seed: map.parsed("--seed", parse_seed)?,
            assets: map.path("--assets"),
            format: map.parsed("--format", parse_format)?,
            tokenfile: map.path("--tokenfile"),
            tokendata: map.string("--tokendata"),
            config: map.path("--config"),
            engine: map.path("--engine"),
        })
    }
}

impl FromArgMap for RuntimeKeyArgs {
    const KEYS: &'static [&'static str] = &["--json", "--assets", "--engine"];

    fn from_arg_map(map: &ArgMap) -> Result<Self> {
        Ok(Self {
            json: map.parsed("--json", parse_switch)?.unwrap_or(true),
            assets: map.path("--assets"),
            engine: map.path("--engine"),
        })
    }
}
