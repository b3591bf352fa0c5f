use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MicrError {
    #[error("Number of args must be even: {0}")]
    OddArgumentCount(usize),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("{0}")]
    Usage(String),

    #[error("--image required")]
    MissingImage,

    #[error("File not found: {}", .0.display())]
    ImageNotFound(PathBuf),

    #[error("Invalid BPP: {0}")]
    UnsupportedBytesPerPixel(u8),

    #[error("Unsupported pixel layout: {0}")]
    UnsupportedColorType(String),

    #[error("Pixel buffer too small: {actual} bytes, expected at least {expected}")]
    BufferTooSmall { expected: usize, actual: usize },

    #[error("Image type {0} cannot be used with this processing path")]
    ImageTypeMismatch(String),

    #[error("{operation}: Execution failed (code {code}, phrase '{phrase}'): {json}")]
    Engine {
        operation: &'static str,
        code: i32,
        phrase: String,
        json: String,
    },

    #[error("Failed to load engine library {}: {source}", path.display())]
    LibraryLoad {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("Engine library does not export '{symbol}': {source}")]
    MissingSymbol {
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },

    #[error("String passed to the engine contains an interior NUL byte")]
    InteriorNul(#[from] std::ffi::NulError),

    #[error("Invalid configuration file {}: {reason}", path.display())]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MicrError>;
