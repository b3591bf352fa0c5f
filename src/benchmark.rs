//! Throughput measurement over a shuffled mix of positive and negative images
//!
//! A positive image carries at least one MICR line and exercises the whole
//! recognizer; a negative one stops at the detector. Changing the share of
//! positives shows how the cost splits between the two stages.

use console::style;
use indicatif::ProgressBar;
use prettytable::{format, Cell, Row, Table};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};
use tracing::info;

use crate::cli::BenchmarkArgs;
use crate::config::{CliOverrides, EngineConfig};
use crate::engine::{EngineResult, MicrEngine, Session};
use crate::error::Result;
use crate::image_processing::{decode_file, MicrImage};
use crate::utils::{create_progress_bar, format_duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    Positive,
    Negative,
}

/// Positives in a run of `loops` frames: `loops * rate` rounded down, at least one
pub fn positive_count(loops: usize, rate: f64) -> usize {
    let count = (loops as f64 * rate).max(1.0) as usize;
    count.min(loops)
}

/// `loops` samples with [`positive_count`] positives, in random order
pub fn schedule<R: Rng + ?Sized>(loops: usize, rate: f64, rng: &mut R) -> Vec<Sample> {
    let positives = positive_count(loops, rate);
    let mut samples = vec![Sample::Negative; loops];
    samples[..positives].fill(Sample::Positive);
    samples.shuffle(rng);
    samples
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

#[derive(Debug, Clone)]
pub struct BenchmarkReport {
    pub loops: usize,
    pub positives: usize,
    pub elapsed: Duration,
    /// Result of the last processed frame
    pub last_result: EngineResult,
}

impl BenchmarkReport {
    pub fn elapsed_millis(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    pub fn estimated_fps(&self) -> f64 {
        1000.0 / (self.elapsed_millis() / self.loops as f64)
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);

        table.add_row(Row::new(vec![Cell::new("Metric"), Cell::new("Value")]));
        table.add_row(Row::new(vec![
            Cell::new("Loops"),
            Cell::new(&self.loops.to_string()),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("Positives"),
            Cell::new(&format!(
                "{} ({:.1}%)",
                self.positives,
                self.positives as f64 * 100.0 / self.loops as f64
            )),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("Elapsed"),
            Cell::new(&format!(
                "{:.3} ms ({})",
                self.elapsed_millis(),
                format_duration(self.elapsed)
            )),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("Estimated FPS"),
            Cell::new(&format!("{:.2}", self.estimated_fps())),
        ]));
        table
    }

    pub fn print(&self) {
        println!("\n{}\n", style("BENCHMARK").bold().cyan());
        self.to_table().printstd();
        if !self.last_result.json.is_empty() {
            println!("\n{} {}", style("Last result:").bold(), self.last_result.json);
        }
    }
}

/// Process every sample in order and time the loop.
///
/// When there is more than one sample the engine is warmed up first, outside
/// the timed section.
pub fn run_loop<E: MicrEngine>(
    session: &mut Session<E>,
    positive: &MicrImage,
    negative: &MicrImage,
    samples: &[Sample],
    progress: &ProgressBar,
) -> Result<BenchmarkReport> {
    if samples.len() > 1 {
        info!("Warming up ({})...", positive.image_type);
        session.warm_up(positive.image_type)?;
    }

    let positive_frame = positive.as_frame()?;
    let negative_frame = negative.as_frame()?;

    let mut last_result = EngineResult {
        code: 0,
        phrase: "OK".to_string(),
        json: "{}".to_string(),
    };

    let start = Instant::now();
    for sample in samples {
        let frame = match sample {
            Sample::Positive => &positive_frame,
            Sample::Negative => &negative_frame,
        };
        last_result = session.process(frame)?;
        progress.inc(1);
    }
    let elapsed = start.elapsed();
    progress.finish_and_clear();

    let positives = samples.iter().filter(|s| **s == Sample::Positive).count();
    info!(
        "Elapsed time (MICR) = [[[ {:.3} millis ]]]",
        elapsed.as_secs_f64() * 1000.0
    );

    Ok(BenchmarkReport {
        loops: samples.len(),
        positives,
        elapsed,
        last_result,
    })
}

impl From<&BenchmarkArgs> for CliOverrides {
    fn from(args: &BenchmarkArgs) -> Self {
        Self {
            format: args.format,
            assets_folder: args.assets.clone(),
            license_token_file: args.tokenfile.clone(),
            license_token_data: args.tokendata.clone(),
            ..Default::default()
        }
    }
}

/// Engine configuration for a benchmark run
pub fn build_config(args: &BenchmarkArgs) -> Result<EngineConfig> {
    EngineConfig::resolve(
        EngineConfig::benchmark(),
        args.config.as_deref(),
        CliOverrides::from(args),
    )
}

/// Decode both images, run the benchmark and return its report.
///
/// `on_report` runs while the engine is still initialized, right before
/// `deinit`.
pub fn run<E, F, C>(args: &BenchmarkArgs, load_engine: F, on_report: C) -> Result<BenchmarkReport>
where
    E: MicrEngine,
    F: FnOnce() -> Result<E>,
    C: FnOnce(&BenchmarkReport),
{
    let config = build_config(args)?;
    let positive = decode_file(&args.positive)?;
    let negative = decode_file(&args.negative)?;

    let samples = schedule(args.loops, args.rate, &mut rng_for(args.seed));

    let engine = load_engine()?;
    info!("Starting benchmark...");
    let mut session = Session::init(engine, &config)?;

    let progress = create_progress_bar(samples.len() as u64);
    progress.set_message("frames");
    let report = run_loop(&mut session, &positive, &negative, &samples, &progress)?;

    on_report(&report);

    info!("Ending benchmark...");
    session.deinit()?;
    Ok(report)
}
