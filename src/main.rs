/*!
 * Command-line interface for repo-serializer
 */

use std::io;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};

use repo_serializer::clipboard::copy_to_clipboard;
use repo_serializer::config::{Args, Config};
use repo_serializer::report::Reporter;
use repo_serializer::serializer::Serializer;
use repo_serializer::types::Mode;

fn main() -> ExitCode {
    // Parse command line arguments
    let args = Args::parse();

    if let Some(shell) = args.generate {
        clap_complete::generate(shell, &mut Args::command(), "repo-serializer", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    setup_logging(args.quiet, args.verbose);
    log::debug!("CLI args parsed: {:?}", args);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn run(args: Args) -> Result<(), String> {
    let quiet = args.quiet;
    let show_stats = args.stats;

    // Create and validate configuration before touching the filesystem
    let config = Config::from_args(args).map_err(|e| e.to_string())?;
    config.validate().map_err(|e| e.to_string())?;

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        create_progress_bar()
    };
    progress.set_message(format!(
        "Scanning directory: {}",
        config.target_dir.display()
    ));

    let start_time = Instant::now();
    let mut serializer = Serializer::new(config.clone(), progress.clone());
    let result = serializer.run();
    let duration = start_time.elapsed();
    progress.finish_and_clear();

    let document = result.map_err(|e| e.to_string())?;
    let output = config.output_file.display().to_string();

    println!("Repository serialized to {} (mode: {})", output, config.mode);
    if config.mode == Mode::StructureOnly {
        println!("Note: Only directory structure was included (no file contents)");
    }

    if config.clip {
        match copy_to_clipboard(document.as_str()) {
            Ok(()) => println!("Output also copied to clipboard"),
            Err(e) => log::warn!("Could not copy to clipboard: {}", e),
        }
    }

    if show_stats {
        Reporter::print_report(serializer.statistics(), &output, duration);
    }

    Ok(())
}

fn create_progress_bar() -> ProgressBar {
    let progress = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} {wide_msg:.dim.white} {pos}/{len} ({percent}%) Elapsed: {elapsed_precise}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress.set_style(style);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}
