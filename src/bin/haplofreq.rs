use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use haplofreq::app::{App, ClassifyEntry, ProgressSinkKind, RunReport, TableStatus};
use haplofreq::config::{ConfigLoader, ConfigOverrides, DEFAULT_CONFIG_FILE};
use haplofreq::domain::{HaplogroupKind, RegionPolicy};
use haplofreq::error::HaploError;
use haplofreq::output::{JsonOutput, LogSink, OutputMode};

#[derive(Parser)]
#[command(name = "haplofreq")]
#[command(about = "Build Y-chromosome and mtDNA haplogroup frequency tables from ancient-DNA annotations")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true, help = "Print machine-readable JSON instead of a summary")]
    json: bool,

    #[arg(long, global = true, help = "Config file (default: ./haplofreq.json if present)")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Build frequency tables from an annotation file")]
    Build(BuildArgs),
    #[command(about = "Show how haplogroup codes are classified")]
    Classify(ClassifyArgs),
    #[command(about = "Write a default haplofreq.json")]
    Init(InitArgs),
}

#[derive(Args, Clone)]
struct BuildArgs {
    #[arg(long, short)]
    input: Utf8PathBuf,

    #[arg(long, help = "Input delimiter (default: tab)")]
    sep: Option<String>,

    #[arg(long, help = "Output delimiter (default: tab)")]
    out_sep: Option<String>,

    #[arg(long)]
    y_output: Option<Utf8PathBuf>,

    #[arg(long)]
    mt_output: Option<Utf8PathBuf>,

    #[arg(long = "kind", value_enum, help = "Haplogroup kinds to build (default: all)")]
    kinds: Vec<HaplogroupKind>,

    #[arg(long)]
    bin_width: Option<u32>,

    #[arg(long, help = "Calendar year that BP ages count back from")]
    epoch: Option<i64>,

    #[arg(long, value_enum)]
    region_policy: Option<RegionPolicy>,
}

#[derive(Args)]
struct ClassifyArgs {
    #[arg(required = true)]
    codes: Vec<String>,
}

#[derive(Args)]
struct InitArgs {
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    path: Utf8PathBuf,

    #[arg(long)]
    force: bool,
}

enum Outcome {
    Success,
    AllTablesFailed,
}

fn main() -> ExitCode {
    match run() {
        Ok(Outcome::Success) => ExitCode::SUCCESS,
        Ok(Outcome::AllTablesFailed) => ExitCode::from(3),
        Err(report) => {
            eprintln!("{report:?}");
            if let Some(error) = report.downcast_ref::<HaploError>() {
                return ExitCode::from(map_exit_code(error));
            }
            ExitCode::from(1)
        }
    }
}

fn map_exit_code(error: &HaploError) -> u8 {
    match error {
        HaploError::ConfigRead(_)
        | HaploError::ConfigParse(_)
        | HaploError::InvalidConfig(_)
        | HaploError::InvalidDelimiter(_) => 2,
        error if error.is_precondition() => 2,
        HaploError::OutputWrite { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<Outcome> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    match cli.command {
        Commands::Build(args) => run_build(args, cli.config.as_deref(), output_mode),
        Commands::Classify(args) => run_classify(args, cli.config.as_deref(), output_mode),
        Commands::Init(args) => run_init(args, cli.config.as_deref(), output_mode),
    }
}

fn run_build(
    args: BuildArgs,
    config: Option<&str>,
    output_mode: OutputMode,
) -> miette::Result<Outcome> {
    let BuildArgs {
        input,
        sep,
        out_sep,
        y_output,
        mt_output,
        kinds,
        bin_width,
        epoch,
        region_policy,
    } = args;

    let overrides = ConfigOverrides {
        input_delimiter: sep,
        output_delimiter: out_sep,
        bin_width,
        reference_epoch: epoch,
        region_policy,
        y_output,
        mt_output,
    };
    let resolved = ConfigLoader::resolve(config, overrides)?;
    let app = App::new(resolved)?;

    let kinds = if kinds.is_empty() {
        HaplogroupKind::ALL.to_vec()
    } else {
        dedup_kinds(kinds)
    };

    let report = match output_mode {
        OutputMode::Json => {
            let report = app.build(&input, &kinds, &JsonOutput)?;
            JsonOutput::print_report(&report).into_diagnostic()?;
            report
        }
        OutputMode::Human => {
            let report = app.build(&input, &kinds, &LogSink::new(ProgressSinkKind::Build))?;
            print_build_summary(&report);
            report
        }
    };

    if report.written() == 0 && report.failed() > 0 {
        return Ok(Outcome::AllTablesFailed);
    }
    Ok(Outcome::Success)
}

fn run_classify(
    args: ClassifyArgs,
    config: Option<&str>,
    output_mode: OutputMode,
) -> miette::Result<Outcome> {
    let resolved = ConfigLoader::resolve(config, ConfigOverrides::default())?;
    let app = App::new(resolved)?;
    let entries = app.classify(&args.codes);
    match output_mode {
        OutputMode::Json => JsonOutput::print_classify(&entries).into_diagnostic()?,
        OutputMode::Human => print_classify_summary(&entries),
    }
    Ok(Outcome::Success)
}

fn run_init(args: InitArgs, config: Option<&str>, output_mode: OutputMode) -> miette::Result<Outcome> {
    let resolved = ConfigLoader::resolve(config, ConfigOverrides::default())?;
    let app = App::new(resolved)?;
    match output_mode {
        OutputMode::Json => {
            let result = app.init_config(&args.path, args.force, &JsonOutput)?;
            JsonOutput::print_init(&result).into_diagnostic()?;
        }
        OutputMode::Human => {
            let result =
                app.init_config(&args.path, args.force, &LogSink::new(ProgressSinkKind::Init))?;
            if result.written {
                println!("wrote {}", result.path);
            } else {
                println!("{} already exists (use --force to overwrite)", result.path);
            }
        }
    }
    Ok(Outcome::Success)
}

fn dedup_kinds(mut kinds: Vec<HaplogroupKind>) -> Vec<HaplogroupKind> {
    kinds.sort();
    kinds.dedup();
    kinds
}

fn print_build_summary(report: &RunReport) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let red = "\x1b[31m";
    let reset = "\x1b[0m";

    println!("{cyan}haplofreq summary{reset}");
    println!("{cyan}input: {} ({} rows){reset}", report.input, report.rows);

    for table in &report.tables {
        match table.status {
            TableStatus::Written => {
                println!("{green}+ {} -> {}{reset}", table.kind, table.output);
                if let Some(stats) = &table.stats {
                    println!(
                        "{green}   groups: {}, counted: {}, excluded: {}, undated: {}{reset}",
                        stats.groups, stats.counted, stats.excluded, stats.undated
                    );
                    if stats.zero_divisions > 0 {
                        println!(
                            "{yellow}   zero denominators resolved to 0%: {}{reset}",
                            stats.zero_divisions
                        );
                    }
                }
            }
            TableStatus::Skipped => {
                println!(
                    "{yellow}- {} skipped: {}{reset}",
                    table.kind,
                    table.error.as_deref().unwrap_or("no data")
                );
            }
            TableStatus::Failed => {
                println!(
                    "{red}x {} failed: {}{reset}",
                    table.kind,
                    table.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }
}

fn print_classify_summary(entries: &[ClassifyEntry]) {
    for entry in entries {
        match (&entry.basal, &entry.subclade) {
            (Some(basal), Some(subclade)) => {
                println!("{}\tbasal={basal}\tsubclade={subclade}", entry.code)
            }
            (Some(basal), None) => println!("{}\tbasal={basal}", entry.code),
            _ => println!("{}\tinvalid", entry.code),
        }
    }
}
