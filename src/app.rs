use crate::cli::{BurnArgs, Cli, Commands};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;
use subburn::config::Config;
use subburn::engine::validate::{BurnOptions, validate};
use subburn::engine::worker::{EncodeHandle, WorkerMessage, spawn_encode};
use subburn::engine::{
    self, EncodeError, ProgressSample, QualityTier, Session, SessionState, probe, synthesize,
};
use subburn::{logging, stats};
use tracing::{info, warn};

const EXIT_FAILURE: i32 = 1;
const EXIT_INVALID: i32 = 2;
const EXIT_TOOL_MISSING: i32 = 127;
const EXIT_CANCELLED: i32 = 130;

const BAR_WIDTH: usize = 30;

fn load_config(path: Option<&Path>) -> Config {
    let result = match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    result.unwrap_or_else(|e| {
        eprintln!("Warning: {:#}; using built-in defaults", e);
        Config::default()
    })
}

pub fn run(cli: Cli) {
    if let Commands::InitConfig = cli.command {
        handle_init_config(cli.config.as_deref());
        return;
    }

    let config = load_config(cli.config.as_deref());
    if let Err(e) = logging::init(cli.verbose, config.logging.file.as_deref()) {
        eprintln!("Warning: {:#}", e);
    }

    match cli.command {
        Commands::Burn(args) => handle_burn(&config, args),
        Commands::DryRun(args) => handle_dry_run(&config, args),
        Commands::Probe { file } => handle_probe(&config, file),
        Commands::CheckFfmpeg => handle_check_ffmpeg(&config),
        Commands::InitConfig => unreachable!("handled before config load"),
    }
}

fn burn_options(config: &Config, args: BurnArgs) -> BurnOptions {
    BurnOptions {
        video: args.video,
        subtitle: args.subtitle,
        output_name: args.name,
        output_dir: args.output_dir,
        format: args.format.unwrap_or(config.defaults.format),
        quality: args.quality.unwrap_or(config.defaults.quality),
        hw_accel: args.hw.unwrap_or(config.defaults.hw_accel),
        name_suffix: config.defaults.name_suffix.clone(),
    }
}

fn handle_burn(config: &Config, args: BurnArgs) {
    let job = match validate(&burn_options(config, args)) {
        Ok(job) => job,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(EXIT_INVALID);
        }
    };

    println!(
        "Burning {} into {} ({} quality, encoder {})",
        job.subtitle.display(),
        job.output.display(),
        job.quality,
        job.hw_accel.video_codec()
    );

    let mut session = Session::new();
    if let Err(e) = session.start(job.id) {
        eprintln!("Error: {}", e);
        process::exit(EXIT_FAILURE);
    }

    let handle = spawn_encode(job, config.tools.toolchain());
    let canceller = handle.canceller();
    if let Err(e) = ctrlc::set_handler(move || canceller.cancel()) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    let code = drive(&mut session, &handle);
    handle.join();
    process::exit(code);
}

/// Front-end loop: apply worker messages to the session until the encode ends
fn drive(session: &mut Session, handle: &EncodeHandle) -> i32 {
    loop {
        match handle.receiver().recv_timeout(Duration::from_millis(200)) {
            Ok(message) => {
                if let Some(code) = apply_message(session, message) {
                    return code;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                eprintln!("\nError: encode worker stopped without reporting a result");
                let _ = session.process_exited();
                return EXIT_FAILURE;
            }
        }

        if handle.canceller().is_requested()
            && matches!(session.state(), SessionState::Running { .. })
            && session.cancel().is_ok()
        {
            eprintln!("\nCancelling...");
        }
    }
}

/// Returns the exit code once the message ends the encode
fn apply_message(session: &mut Session, message: WorkerMessage) -> Option<i32> {
    match message {
        WorkerMessage::Started { command, .. } => {
            info!("Command: {}", command);
            println!("Processing video...");
            None
        }
        WorkerMessage::Progress { sample, .. } => {
            session.record(sample);
            print!("\r{}", progress_line(&sample));
            std::io::stdout().flush().ok();
            None
        }
        WorkerMessage::Completed { output, stats, .. } => {
            let _ = session.process_exited();
            println!("\r{}", completed_line());
            println!("Done: {}", output.display());
            if let Some(stats) = stats {
                println!("{}", stats.summary());
            }
            Some(0)
        }
        WorkerMessage::Failed { error, .. } => {
            let _ = session.process_exited();
            println!();
            eprintln!("Error: {:#}", error);
            Some(exit_code_for(&error))
        }
        WorkerMessage::Cancelled { .. } => {
            let _ = session.process_exited();
            println!();
            eprintln!("Cancelled by user.");
            Some(EXIT_CANCELLED)
        }
    }
}

fn exit_code_for(error: &EncodeError) -> i32 {
    match error {
        EncodeError::Invalid(_) => EXIT_INVALID,
        EncodeError::ToolNotFound { .. } => EXIT_TOOL_MISSING,
        EncodeError::EncoderFailed { .. } | EncodeError::Other(_) => EXIT_FAILURE,
    }
}

fn render_bar(fraction: f64) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * BAR_WIDTH as f64) as usize).min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// Single-line progress display
fn progress_line(sample: &ProgressSample) -> String {
    match sample.fraction {
        Some(fraction) => format!(
            "{} {:>3}% | ETA {}",
            render_bar(fraction),
            sample.percent().unwrap_or(0),
            sample.remaining.label()
        ),
        None => format!(
            "Processed {} | {}",
            stats::format_duration(sample.processed_s),
            sample.remaining.label()
        ),
    }
}

fn completed_line() -> String {
    format!("{} 100% | done          ", render_bar(1.0))
}

fn handle_dry_run(config: &Config, args: BurnArgs) {
    let job = match validate(&burn_options(config, args)) {
        Ok(job) => job,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(EXIT_INVALID);
        }
    };

    let tools = config.tools.toolchain();
    let source_bitrate = if job.quality == QualityTier::Original {
        probe::probe_bitrate(&tools.ffprobe, &job.video).unwrap_or_else(|e| {
            warn!("Could not probe bitrate: {:#}", e);
            None
        })
    } else {
        None
    };

    let request = job.request(job.subtitle.clone(), source_bitrate);
    let cmd = synthesize(&request);
    println!("{}", cmd.display_with(&tools.ffmpeg));
}

fn handle_probe(config: &Config, file: PathBuf) {
    match probe::probe_media_info(&config.tools.ffprobe, &file) {
        Ok(info) => {
            match info.duration_s {
                Some(duration) => println!("Duration: {:.2} seconds", duration),
                None => println!("Duration: unavailable"),
            }
            match info.bitrate {
                Some(bitrate) => println!("Bitrate: {} b/s", bitrate),
                None => println!("Bitrate: unavailable"),
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(EXIT_FAILURE);
        }
    }
}

fn handle_check_ffmpeg(config: &Config) {
    match engine::ffmpeg_version(&config.tools.ffmpeg) {
        Ok(version) => {
            println!("ffmpeg found: {}", version);
            match engine::ffprobe_version(&config.tools.ffprobe) {
                Ok(probe_version) => {
                    println!("ffprobe found: {}", probe_version);
                    process::exit(0);
                }
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    process::exit(EXIT_TOOL_MISSING);
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(EXIT_TOOL_MISSING);
        }
    }
}

fn handle_init_config(path: Option<&Path>) {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match Config::config_path() {
            Ok(path) => path,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                process::exit(EXIT_FAILURE);
            }
        },
    };

    if path.exists() {
        match Config::load_from(&path) {
            Ok(cfg) => {
                println!("Config loaded successfully from {}", path.display());
                println!("{:#?}", cfg);
            }
            Err(e) => {
                eprintln!("Config invalid: {:#}", e);
                process::exit(EXIT_FAILURE);
            }
        }
    } else {
        println!("Creating default config...");
        if let Err(err) = Config::default().save_to(&path) {
            eprintln!("Failed to save default config: {:#}", err);
            process::exit(EXIT_FAILURE);
        }
        println!("Default config saved to {}", path.display());
    }
}
