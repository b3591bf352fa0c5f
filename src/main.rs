use anyhow::{Context, Result};
use console::style;
use std::time::Instant;

use micr_recognizer::cli::{parse_flat, usage, RecognizerArgs};
use micr_recognizer::utils::{format_duration, init_logging, wait_for_keypress};
use micr_recognizer::{recognizer, MicrError, NativeEngine};

fn main() -> Result<()> {
    init_logging();
    let start_time = Instant::now();

    let args: RecognizerArgs = match parse_flat(std::env::args()) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", usage::<RecognizerArgs>());
            return Err(e.into());
        }
    };

    // Print banner
    eprintln!("{}", style("MICR Recognizer").bold().blue());
    eprintln!("{}", style("E-13B / CMC-7 line recognition").dim());
    eprintln!();

    let outcome = recognizer::run(
        &args,
        || NativeEngine::load(args.engine.as_deref()),
        |result| {
            if !result.json.is_empty() {
                println!("{}", result.json);
            }
            wait_for_keypress();
        },
    );

    match outcome {
        Ok(_) => {
            eprintln!(
                "{} in {}",
                style("Done").bold().green(),
                format_duration(start_time.elapsed())
            );
            Ok(())
        }
        Err(MicrError::MissingImage) => {
            eprintln!("{}", usage::<RecognizerArgs>());
            Err(MicrError::MissingImage.into())
        }
        Err(e) => Err(e).context("Recognition failed"),
    }
}
