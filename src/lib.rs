// Library exports shared by the recognizer, benchmark and runtime-key binaries
pub mod benchmark;
pub mod cli;
pub mod config;
pub mod config_file;
pub mod engine;
pub mod error;
pub mod image_processing;
pub mod license;
pub mod recognizer;
pub mod utils;

// Re-export commonly used types
pub use cli::{BenchmarkArgs, MicrFormat, RecognizerArgs, RuntimeKeyArgs};
pub use config::EngineConfig;
pub use engine::{EngineResult, ImageType, MicrEngine, NativeEngine, Session};
pub use error::{MicrError, Result};
pub use image_processing::{decode_file, ExifOrientation, MicrImage};
