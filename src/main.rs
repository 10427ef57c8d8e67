//! calctex - Render a calculation spreadsheet as a LaTeX derivation

mod logger;

use anyhow::Context;
use calctex_core::{DEFAULT_TEX_FILE, Document, FileWatcher, RunSummary, load_config};
use calctex_engine::engine::Warning;
use log::LevelFilter;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

fn print_usage() {
    eprintln!("Usage: calctex [OPTIONS] <ODS-FILE> <SHEET>");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <ODS-FILE>                Spreadsheet with the calculation (.ods)");
    eprintln!("  <SHEET>                   Sheet whose rows are rendered");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -t, --tex <FILE>          Output TeX file (default: {})", DEFAULT_TEX_FILE);
    eprintln!("  -c, --config <FILE>       Load settings from a TOML file");
    eprintln!("  -w, --watch               Re-render whenever the spreadsheet changes");
    eprintln!("  --interval <MS>           Polling interval in watch mode (default: 500)");
    eprintln!("  -q, --quiet               Only print errors");
    eprintln!("  -h, --help                Print help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CALCTEX_LOG               Log level: off, error, warn, info, debug, trace");
}

struct Args {
    ods_path: PathBuf,
    sheet: String,
    tex_path: PathBuf,
    config_file: Option<PathBuf>,
    watch: bool,
    interval: Duration,
    quiet: bool,
}

fn exit_with_usage(message: &str) -> ! {
    eprintln!("Error: {}", message);
    print_usage();
    std::process::exit(1);
}

fn parse_args(args: &[String]) -> Args {
    let mut positional: Vec<String> = Vec::new();
    let mut tex_path: Option<PathBuf> = None;
    let mut config_file: Option<PathBuf> = None;
    let mut watch = false;
    let mut interval = FileWatcher::DEFAULT_INTERVAL;
    let mut quiet = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            "-t" | "--tex" => {
                i += 1;
                if i >= args.len() {
                    exit_with_usage("--tex requires a file path");
                }
                tex_path = Some(PathBuf::from(&args[i]));
            }
            "-c" | "--config" => {
                i += 1;
                if i >= args.len() {
                    exit_with_usage("--config requires a file path");
                }
                config_file = Some(PathBuf::from(&args[i]));
            }
            "-w" | "--watch" => watch = true,
            "--interval" => {
                i += 1;
                if i >= args.len() {
                    exit_with_usage("--interval requires a value in milliseconds");
                }
                match args[i].parse::<u64>() {
                    Ok(ms) if ms > 0 => interval = Duration::from_millis(ms),
                    _ => exit_with_usage(&format!("Invalid interval: {}", args[i])),
                }
            }
            "-q" | "--quiet" => quiet = true,
            arg if arg.starts_with('-') && arg.len() > 1 => {
                exit_with_usage(&format!("Unknown option: {}", arg));
            }
            _ => positional.push(args[i].clone()),
        }
        i += 1;
    }

    if positional.len() != 2 {
        exit_with_usage(&format!(
            "Expected an ODS file and a sheet name, got {} argument(s)",
            positional.len()
        ));
    }
    let sheet = positional.pop().unwrap_or_default();
    let ods_path = PathBuf::from(positional.pop().unwrap_or_default());

    Args {
        ods_path,
        sheet,
        tex_path: tex_path.unwrap_or_else(|| PathBuf::from(DEFAULT_TEX_FILE)),
        config_file,
        watch,
        interval,
        quiet,
    }
}

fn log_level(quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match env::var("CALCTEX_LOG") {
        Ok(value) => logger::parse_level(&value).unwrap_or_else(|| {
            eprintln!("Warning: Ignoring invalid CALCTEX_LOG value: {}", value);
            LevelFilter::Warn
        }),
        Err(_) => LevelFilter::Warn,
    }
}

fn format_warning(warning: &Warning) -> String {
    if warning.count > 1 {
        format!("{} (x{})", warning.message, warning.count)
    } else {
        warning.message.clone()
    }
}

fn print_summary(summary: &RunSummary, doc: &Document) {
    for table in &summary.tables {
        println!("{} : {} x {}", table.name, table.rows, table.columns);
    }
    println!();
    if !summary.warnings.is_empty() {
        eprintln!("{} warning(s):", summary.warnings.len());
        for warning in &summary.warnings {
            eprintln!("  {}", format_warning(warning));
        }
    }
    println!(
        "Written {} bytes in '{}'",
        summary.bytes,
        doc.tex_path.display()
    );
}

fn run(args: Args) -> anyhow::Result<()> {
    let (config, warnings) = load_config(args.config_file.as_deref());
    for warning in warnings {
        log::warn!("{}", warning);
    }
    if let Some(path) = &config.path {
        log::info!("Using config {}", path.display());
    }

    let mut doc = Document::new(&args.ods_path, &args.sheet)
        .with_tex_path(&args.tex_path)
        .with_options(config.render);

    if !args.watch {
        let summary = doc
            .run()
            .with_context(|| format!("Failed to render {}", args.ods_path.display()))?;
        if !args.quiet {
            print_summary(&summary, &doc);
        }
        return Ok(());
    }

    let mut watcher = FileWatcher::new(&args.ods_path, args.interval);
    loop {
        watcher
            .wait()
            .with_context(|| format!("Failed to watch {}", args.ods_path.display()))?;
        match doc.run() {
            Ok(summary) => {
                if !args.quiet {
                    print_summary(&summary, &doc);
                }
            }
            // Keep watching: the next save may fix it.
            Err(err) => log::error!("Failed to render {}: {}", args.ods_path.display(), err),
        }
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let args = parse_args(&args);
    logger::init(log_level(args.quiet));

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
