use anyhow::{Context, Result};
use console::style;

use micr_recognizer::cli::{parse_flat, usage, RuntimeKeyArgs};
use micr_recognizer::license::request_runtime_key;
use micr_recognizer::utils::{error_println, init_logging, wait_for_keypress};
use micr_recognizer::NativeEngine;

fn main() -> Result<()> {
    init_logging();

    let args: RuntimeKeyArgs = match parse_flat(std::env::args()) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", usage::<RuntimeKeyArgs>());
            return Err(e.into());
        }
    };

    request_runtime_key(
        &args,
        || NativeEngine::load(args.engine.as_deref()),
        |result| {
            if result.is_ok() {
                println!("\n{}\n", result.json);
            } else {
                error_println(&format!(
                    "*** Failed: code -> {}, phrase -> {} ***",
                    style(result.code).bold(),
                    result.phrase
                ));
            }
            wait_for_keypress();
        },
    )
    .context("Runtime key request failed")?;

    Ok(())
}
