//! Command-line interface for tokenorder
//! This binary links Python source files with their syntax trees and runs the token-based tools.
//!
//! Usage:
//!   tokenorder execute --config `<config>` `<path>` [--format `<format>`] [--settings `<file>`]
//!   tokenorder check `<path>`...                   - Synchronize files, non-zero exit on failure
//!   tokenorder list-configs                       - List all available configurations

use clap::{Arg, ArgAction, Command};
use log::{LevelFilter, Log, Metadata, Record};
use tokenorder::tog::formats::OutputFormat;
use tokenorder::tog::processor::Processor;

struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{:<5} {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let logger = Box::new(StderrLogger { level });
    if log::set_boxed_logger(logger).is_ok() {
        log::set_max_level(level);
    }
}

fn main() {
    let matches = Command::new("tokenorder")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Links Python syntax trees to the tokens that produced them")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log more (repeat for debug output)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(
            Command::new("execute")
                .about("Execute a processing configuration")
                .arg(
                    Arg::new("path")
                        .help("Path to the Python file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .help("Configuration name (see list-configs)")
                        .default_value("links"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format for dumps ('text' or 'json')")
                        .default_value("text"),
                )
                .arg(
                    Arg::new("settings")
                        .long("settings")
                        .short('s')
                        .help("YAML or JSON file with beautifier settings"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Synchronize files and report failures")
                .arg(
                    Arg::new("paths")
                        .help("Python files to check")
                        .required(true)
                        .num_args(1..)
                        .index(1),
                ),
        )
        .subcommand(Command::new("list-configs").about("List available processing configurations"))
        .get_matches();

    init_logging(matches.get_count("verbose"));

    match matches.subcommand() {
        Some(("execute", execute_matches)) => {
            let path = execute_matches
                .get_one::<String>("path")
                .expect("path is required");
            let config = execute_matches
                .get_one::<String>("config")
                .expect("config has a default");
            let format = execute_matches
                .get_one::<String>("format")
                .expect("format has a default");
            let settings = execute_matches.get_one::<String>("settings");
            handle_execute_command(path, config, format, settings.map(String::as_str));
        }
        Some(("check", check_matches)) => {
            let paths: Vec<&String> = check_matches
                .get_many::<String>("paths")
                .expect("paths are required")
                .collect();
            handle_check_command(&paths);
        }
        Some(("list-configs", _)) => {
            handle_list_configs_command();
        }
        _ => unreachable!(),
    }
}

/// Handle the execute command
fn handle_execute_command(path: &str, config: &str, format: &str, settings: Option<&str>) {
    let format = OutputFormat::from_name(format).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    });

    let mut processor = Processor::new();
    if let Some(settings) = settings {
        processor = processor.with_settings_file(settings).unwrap_or_else(|e| {
            eprintln!("Error loading settings: {}", e);
            std::process::exit(2);
        });
    }

    let output = processor
        .process_file(config, path, format)
        .unwrap_or_else(|e| {
            eprintln!("Execution error: {}", e);
            std::process::exit(1);
        });

    print!("{}", output);
}

/// Handle the check command
fn handle_check_command(paths: &[&String]) {
    let reports = Processor::new().check_files(paths);
    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    for report in &reports {
        match &report.outcome {
            Ok(summary) => println!("ok   {}: {}", report.path.display(), summary),
            Err(e) => println!("FAIL {}: {}", report.path.display(), e),
        }
    }
    if failed > 0 {
        log::warn!("{} of {} files failed", failed, reports.len());
        std::process::exit(1);
    }
}

/// Handle the list-configs command
fn handle_list_configs_command() {
    println!("Available processing configurations:\n");
    for config in Processor::new().list_configs() {
        println!("  {}", config.name);
        println!("    {}", config.description);
    }
}
