use crate::cli::{Cli, Commands, EncodeArgs};
use std::io::Write;
use std::path::PathBuf;
use std::process;

use vidpress::engine::{
    self, CompressError, CompressionJob, CompressionOptions, JobRunner, Tools,
};

pub fn run(cli: Cli) {
    let verbose = cli.verbose;
    match cli.command {
        Commands::CheckFfmpeg => handle_check_ffmpeg(),
        Commands::Probe { file, json } => handle_probe(file, json),
        Commands::Plan { encode } => handle_plan(encode),
        Commands::Run { encode, json } => handle_run(encode, json, verbose),
        Commands::Thumbnail { input, output } => handle_thumbnail(input, output),
    }
}

/// Exit with the code for an engine error: 2 for anything caught before
/// the subprocess launched, 130 for a user cancel, 1 otherwise.
fn fail(err: &CompressError) -> ! {
    eprintln!("Error: {err}");
    let code = match err {
        CompressError::Cancelled => 130,
        e if e.is_pre_launch() => 2,
        _ => 1,
    };
    process::exit(code);
}

fn handle_check_ffmpeg() {
    let tools = match Tools::locate() {
        Ok(tools) => tools,
        Err(e) => fail(&e),
    };

    match engine::tools::ffmpeg_version(&tools) {
        Ok(version) => println!("✓ {version}"),
        Err(e) => {
            eprintln!("✗ ffmpeg check failed: {e:#}");
            process::exit(2);
        }
    }
    match engine::tools::ffprobe_version(&tools) {
        Ok(version) => println!("✓ {version}"),
        Err(e) => {
            eprintln!("✗ ffprobe check failed: {e:#}");
            process::exit(2);
        }
    }
}

fn handle_probe(file: PathBuf, json: bool) {
    let tools = Tools::locate().unwrap_or_else(|e| fail(&e));
    let probe = engine::probe_media(&tools, &file).unwrap_or_else(|e| fail(&e));

    if json {
        println!("{}", serde_json::to_string_pretty(&probe).expect("probe serializes"));
    } else {
        println!("File:       {}", file.display());
        println!("Resolution: {}x{}", probe.width, probe.height);
        if probe.duration_s > 0.0 {
            println!("Duration:   {:.2}s", probe.duration_s);
        } else {
            println!("Duration:   unknown");
        }
    }
}

fn to_options(args: &EncodeArgs) -> CompressionOptions {
    CompressionOptions {
        quality: args.quality,
        preset: args.preset,
        bitrate_kbps: args.bitrate,
        resolution: args.resolution,
        frame_rate: args.fps,
        container: args.container,
    }
}

fn output_path(args: &EncodeArgs) -> PathBuf {
    args.output
        .clone()
        .unwrap_or_else(|| engine::derive_output_path(&args.input, args.container))
}

fn handle_plan(args: EncodeArgs) {
    let tools = Tools::locate().unwrap_or_else(|e| fail(&e));
    let options = to_options(&args);
    let probe = engine::probe_media(&tools, &args.input).unwrap_or_else(|e| fail(&e));
    let plan = engine::build(&options, &probe).unwrap_or_else(|e| fail(&e));

    let output = output_path(&args);
    println!(
        "Quality {} ({}), preset {}",
        options.quality,
        options.quality_label(),
        options.preset
    );
    println!("{}", plan.render(&tools.ffmpeg, &args.input, &output));
}

fn handle_run(args: EncodeArgs, json: bool, verbose: bool) {
    let tools = Tools::locate().unwrap_or_else(|e| fail(&e));
    let options = to_options(&args);
    let probe = engine::probe_media(&tools, &args.input).unwrap_or_else(|e| fail(&e));
    let output = output_path(&args);

    let job = CompressionJob::new(args.input.clone(), output.clone(), options, &probe);
    let runner = JobRunner::new(tools);

    if !json {
        println!("Compressing: {} → {}", args.input.display(), output.display());
        if probe.duration_s > 0.0 {
            println!("Duration: {:.2}s", probe.duration_s);
        }
    }

    let handle = runner
        .start(
            job,
            move |event| {
                if json {
                    return;
                }
                match event.percent {
                    Some(pct) => print!("\rProgress: {pct:.1}%"),
                    None => print!("\rProgress: {:.1}s encoded (duration unknown)", event.elapsed_s),
                }
                std::io::stdout().flush().ok();
            },
            move |line| {
                if verbose {
                    eprintln!("{line}");
                }
            },
        )
        .unwrap_or_else(|e| fail(&e));
    tracing::debug!(job_id = %handle.job_id(), "job started");

    match handle.wait() {
        Ok(summary) => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&summary).expect("summary serializes")
                );
            } else {
                println!();
                println!("✓ Compression complete");
                println!(
                    "  Original:   {} ({} bytes)",
                    fmt_bytes(summary.original_bytes),
                    summary.original_bytes
                );
                println!(
                    "  Compressed: {} ({} bytes)",
                    fmt_bytes(summary.compressed_bytes),
                    summary.compressed_bytes
                );
                println!("  Reduction:  {:.2}%", summary.reduction_pct);
            }
        }
        Err(e) => {
            if !json {
                println!();
            }
            if let CompressError::RunFailed { stderr_tail, .. } = &e {
                eprintln!("{stderr_tail}");
            }
            fail(&e);
        }
    }
}

fn handle_thumbnail(input: PathBuf, output: PathBuf) {
    let tools = Tools::locate().unwrap_or_else(|e| fail(&e));
    match engine::thumbnail::extract_thumbnail(&tools, &input, &output) {
        Ok(()) => println!("Thumbnail written to {}", output.display()),
        Err(e) => {
            // Best-effort by design: report the placeholder outcome but
            // keep the non-zero exit for scripting.
            eprintln!("No preview available: {e}");
            process::exit(1);
        }
    }
}

/// Human-readable byte count, decimal units.
fn fmt_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
