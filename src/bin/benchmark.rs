use anyhow::{Context, Result};
use console::style;

use micr_recognizer::cli::{parse_flat, usage, BenchmarkArgs};
use micr_recognizer::utils::{init_logging, wait_for_keypress};
use micr_recognizer::{benchmark, NativeEngine};

fn main() -> Result<()> {
    init_logging();

    let args: BenchmarkArgs = match parse_flat(std::env::args()) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", usage::<BenchmarkArgs>());
            return Err(e.into());
        }
    };

    eprintln!("{}", style("MICR Benchmark").bold().blue());
    eprintln!(
        "{}",
        style(format!(
            "{} loops, {:.0}% positives",
            args.loops,
            args.rate * 100.0
        ))
        .dim()
    );
    eprintln!();

    benchmark::run(
        &args,
        || NativeEngine::load(args.engine.as_deref()),
        |report| {
            report.print();
            wait_for_keypress();
        },
    )
    .context("Benchmark failed")?;

    Ok(())
}
