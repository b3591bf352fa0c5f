//! The recognizer pipeline: arguments in, engine JSON out

use tracing::info;

use crate::cli::RecognizerArgs;
use crate::config::{CliOverrides, EngineConfig};
use crate::engine::{EngineResult, MicrEngine, Session};
use crate::error::{MicrError, Result};
use crate::image_processing::decode_file;

impl From<&RecognizerArgs> for CliOverrides {
    fn from(args: &RecognizerArgs) -> Self {
        Self {
            format: args.format,
            backpropagation_enabled: args.backprop,
            ielcd_enabled: args.ielcd,
            assets_folder: args.assets.clone(),
            license_token_file: args.tokenfile.clone(),
            license_token_data: args.tokendata.clone(),
        }
    }
}

/// Engine configuration for a recognizer run
pub fn build_config(args: &RecognizerArgs) -> Result<EngineConfig> {
    EngineConfig::resolve(
        EngineConfig::recognizer(),
        args.config.as_deref(),
        CliOverrides::from(args),
    )
}

/// Decode the image, run it through the engine and return the result.
///
/// The engine is only loaded once the image decoded cleanly. `on_result` runs
/// while the engine is still initialized, right before `deinit`.
pub fn run<E, F, C>(args: &RecognizerArgs, load_engine: F, on_result: C) -> Result<EngineResult>
where
    E: MicrEngine,
    F: FnOnce() -> Result<E>,
    C: FnOnce(&EngineResult),
{
    let image_path = args.image.as_deref().ok_or(MicrError::MissingImage)?;
    let config = build_config(args)?;

    let image = decode_file(image_path)?;
    info!(
        "Image: {} ({}x{}, {}, stride {})",
        image_path.display(),
        image.width,
        image.height,
        image.image_type,
        image.stride
    );

    let engine = load_engine()?;
    info!("Starting recognizer...");
    let mut session = Session::init(engine, &config)?;

    let result = session.process_image(&image)?;
    info!("Processing done.");

    on_result(&result);

    info!("Ending recognizer...");
    session.deinit()?;
    Ok(result)
}
