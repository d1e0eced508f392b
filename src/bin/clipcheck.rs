use std::{fs, path::PathBuf, sync::Arc};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use clipcheck::ffmpeg::FfmpegBackend;
use clipcheck::{
    FrameEncoding, SampleOptions, SamplePolicy, Thresholds, run_preflight, sample_frames,
    validate_batch, validate_media,
};

const CLI_AFTER_HELP: &str = "Examples:\n  clipcheck validate input.mp4 --json\n  clipcheck validate a.mp4 b.mp4 c.mp4 --min-duration 1 --progress\n  clipcheck sample input.mp4 --frames 8 --out frames/\n  clipcheck preflight --json\n  clipcheck completions zsh > _clipcheck";

#[derive(Debug, Parser)]
#[command(
    name = "clipcheck",
    version,
    about = "Validate video clips and sample evenly-spaced frames from them",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct ThresholdOptions {
    /// Minimum acceptable duration in seconds.
    #[arg(long)]
    min_duration: Option<f64>,

    /// Maximum recommended duration in seconds (warning above this).
    #[arg(long)]
    max_duration: Option<f64>,

    /// Minimum acceptable frame width in pixels.
    #[arg(long)]
    min_width: Option<u32>,

    /// Minimum acceptable frame height in pixels.
    #[arg(long)]
    min_height: Option<u32>,

    /// Load timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl ThresholdOptions {
    fn resolve(&self) -> Thresholds {
        let mut thresholds = Thresholds::new();
        if let Some(value) = self.min_duration {
            thresholds = thresholds.with_min_duration(value);
        }
        if let Some(value) = self.max_duration {
            thresholds = thresholds.with_max_duration(value);
        }
        if self.min_width.is_some() || self.min_height.is_some() {
            let width = self.min_width.unwrap_or(thresholds.min_width);
            let height = self.min_height.unwrap_or(thresholds.min_height);
            thresholds = thresholds.with_min_resolution(width, height);
        }
        if let Some(value) = self.timeout_ms {
            thresholds = thresholds.with_load_timeout_ms(value);
        }
        thresholds
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate one or more clips against duration/resolution thresholds.
    #[command(
        about = "Validate clips against thresholds",
        after_help = "Examples:\n  clipcheck validate input.mp4\n  clipcheck validate a.mp4 b.mp4 --json\n  clipcheck validate input.mp4 --min-duration 1 --max-duration 60"
    )]
    Validate {
        /// Input media paths or URLs.
        #[arg(required = true)]
        inputs: Vec<String>,

        #[command(flatten)]
        thresholds: ThresholdOptions,

        /// Output the outcome(s) as machine-readable JSON.
        #[arg(long)]
        json: bool,

        /// Show a progress bar for batches.
        #[arg(long)]
        progress: bool,
    },

    /// Sample evenly-spaced frames from a clip.
    #[command(
        about = "Sample frames as JPEG images",
        after_help = "Examples:\n  clipcheck sample input.mp4 --frames 8 --out frames/\n  clipcheck sample input.mp4 --per-second 0.5 --policy offset --data-url"
    )]
    Sample {
        /// Input media path or URL.
        input: String,

        /// Number of frames to sample.
        #[arg(long, default_value_t = 8)]
        frames: usize,

        /// Derive the frame count from a rate instead (frames per second
        /// of source duration), bounded to [1, 64].
        #[arg(long)]
        per_second: Option<f64>,

        /// Interval policy (interior | offset).
        #[arg(long, default_value = "interior")]
        policy: String,

        /// Emit data-URL-prefixed payloads instead of raw base64.
        #[arg(long)]
        data_url: bool,

        /// JPEG quality (1-100).
        #[arg(long, default_value_t = 80)]
        quality: u8,

        /// Write decoded JPEG files into this directory instead of
        /// printing payloads.
        #[arg(long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        thresholds: ThresholdOptions,
    },

    /// Check that the external ffmpeg tools are available.
    #[command(about = "Check environment prerequisites")]
    Preflight {
        /// Output the report as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let exit_code = match cli.command {
        Commands::Validate {
            inputs,
            thresholds,
            json,
            progress,
        } => run_validate(inputs, thresholds.resolve(), json, progress).await,
        Commands::Sample {
            input,
            frames,
            per_second,
            policy,
            data_url,
            quality,
            out,
            thresholds,
        } => {
            run_sample(
                input,
                frames,
                per_second,
                policy,
                data_url,
                quality,
                out,
                thresholds.resolve(),
            )
            .await
        }
        Commands::Preflight { json } => run_preflight_command(json),
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "clipcheck", &mut std::io::stdout());
            0
        }
    };
    std::process::exit(exit_code);
}

async fn run_validate(
    inputs: Vec<String>,
    thresholds: Thresholds,
    json: bool,
    progress: bool,
) -> i32 {
    let backend = Arc::new(FfmpegBackend::new());

    if inputs.len() == 1 {
        let outcome = validate_media(backend.as_ref(), &inputs[0], &thresholds).await;
        if json {
            println!("{}", serde_json::to_string_pretty(&outcome).unwrap_or_default());
        } else {
            print_outcome(&inputs[0], &outcome.errors, &outcome.warnings, outcome.valid);
        }
        return if outcome.valid { 0 } else { 1 };
    }

    let spinner = if progress && !json {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("validating {} clips", inputs.len()));
        spinner.enable_steady_tick(std::time::Duration::from_millis(100));
        Some(spinner)
    } else {
        None
    };

    let summary = validate_batch(backend, inputs.clone(), thresholds).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summary).unwrap_or_default());
    } else {
        for (input, outcome) in inputs.iter().zip(summary.outcomes.iter()) {
            print_outcome(input, &outcome.errors, &outcome.warnings, outcome.valid);
        }
        println!(
            "\n{} passed, {} failed ({:.0}%), mean duration {:.2}s",
            summary.passed.to_string().green(),
            summary.failed.to_string().red(),
            summary.pass_rate,
            summary.avg_duration,
        );
    }
    if summary.failed == 0 { 0 } else { 1 }
}

#[allow(clippy::too_many_arguments)]
async fn run_sample(
    input: String,
    frames: usize,
    per_second: Option<f64>,
    policy: String,
    data_url: bool,
    quality: u8,
    out: Option<PathBuf>,
    thresholds: Thresholds,
) -> i32 {
    let policy = match policy.as_str() {
        "interior" => SamplePolicy::Interior,
        "offset" => SamplePolicy::Offset,
        other => {
            eprintln!("{} unknown policy {other:?} (interior | offset)", "error:".red());
            return 2;
        }
    };

    let mut options = SampleOptions::new()
        .with_frame_count(frames)
        .with_policy(policy)
        .with_jpeg_quality(quality)
        .with_encoding(if data_url {
            FrameEncoding::DataUrl
        } else {
            FrameEncoding::Base64
        });
    if let Some(rate) = per_second {
        options = options.with_frames_per_second(rate);
    }

    let backend = FfmpegBackend::new();
    let sequence = match sample_frames(&backend, &input, &thresholds, &options).await {
        Ok(sequence) => sequence,
        Err(error) => {
            eprintln!("{} {error}", "error:".red());
            return 1;
        }
    };

    match out {
        Some(directory) => {
            if let Err(error) = fs::create_dir_all(&directory) {
                eprintln!("{} cannot create {}: {error}", "error:".red(), directory.display());
                return 1;
            }
            for (index, payload) in sequence.payloads().enumerate() {
                let raw = payload.strip_prefix("data:image/jpeg;base64,").unwrap_or(payload);
                match BASE64.decode(raw) {
                    Ok(bytes) => {
                        let path = directory.join(format!("frame_{index:03}.jpg"));
                        if let Err(error) = fs::write(&path, bytes) {
                            eprintln!("{} cannot write {}: {error}", "error:".red(), path.display());
                        }
                    }
                    Err(error) => eprintln!("{} undecodable payload {index}: {error}", "error:".red()),
                }
            }
            println!(
                "{} wrote {} frames to {}",
                "ok:".green(),
                sequence.len(),
                directory.display(),
            );
        }
        None => {
            for payload in sequence.payloads() {
                println!("{payload}");
            }
        }
    }
    0
}

fn run_preflight_command(json: bool) -> i32 {
    let report = run_preflight();
    if json {
        println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
    } else {
        print_availability("ffmpeg", report.ffmpeg_available);
        print_availability("ffprobe", report.ffprobe_available);
        for warning in &report.warnings {
            println!("{} {warning}", "warning:".yellow());
        }
    }
    if report.all_available() { 0 } else { 1 }
}

fn print_availability(tool: &str, available: bool) {
    if available {
        println!("{} {tool} available", "ok:".green());
    } else {
        println!("{} {tool} missing", "missing:".red());
    }
}

fn print_outcome(input: &str, errors: &[String], warnings: &[String], valid: bool) {
    let verdict = if valid { "PASS".green() } else { "FAIL".red() };
    println!("{verdict} {input}");
    for error in errors {
        println!("  {} {error}", "error:".red());
    }
    for warning in warnings {
        println!("  {} {warning}", "warning:".yellow());
    }
}
