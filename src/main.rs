// Command-line entry point for Locust Lens.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use locust_lens::application::ExtractUsecase;
use locust_lens::domain::dialect::DialectConfig;
use locust_lens::infrastructure::concurrency::init_thread_pool;
use locust_lens::infrastructure::dialect_loader::load_dialect;
use locust_lens::infrastructure::{JsonExporter, ScriptLoader, TextExporter, TreeSitterPythonParser};
use locust_lens::ports::traffic_exporter::TrafficDotExporter;
use locust_lens::ports::ReportExporter;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input script path (can specify multiple)
    #[arg(short, long, required = false)]
    input: Vec<String>,

    /// Input folder(s), searched recursively for .py files
    #[arg(short = 'd', long, required = false)]
    folder: Vec<String>,

    /// Output file path (stdout when omitted)
    #[arg(short, long)]
    output: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// TOML file overriding the recognized names
    #[arg(long)]
    dialect: Option<String>,

    /// Worker threads (defaults to one per core)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Exit with failure when any warning is reported
    #[arg(long)]
    deny_warnings: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Json,
    Text,
    Dot,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    if cli.input.is_empty() && cli.folder.is_empty() {
        bail!("Please provide at least one --input <file> or --folder <dir>");
    }

    init_thread_pool(cli.jobs)?;

    let dialect = match &cli.dialect {
        Some(path) => load_dialect(path)?,
        None => DialectConfig::default(),
    };

    let mut scripts = ScriptLoader::load_files(&cli.input)?;
    for folder in &cli.folder {
        scripts.extend(ScriptLoader::load_folder(folder)?);
    }
    info!(scripts = scripts.len(), "loaded scripts");

    let usecase = ExtractUsecase {
        parser: &TreeSitterPythonParser,
        dialect: &dialect,
    };
    let reports = usecase.extract_all(&scripts);

    let exporter: Box<dyn ReportExporter> = match cli.format {
        Format::Json => Box::new(JsonExporter),
        Format::Text => Box::new(TextExporter),
        Format::Dot => Box::new(TrafficDotExporter),
    };

    match &cli.output {
        Some(path) => {
            exporter
                .export(&reports, path)
                .with_context(|| format!("Failed to write output to {}", path))?;
            info!(path = %path, format = ?cli.format, "output written");
        }
        None => print!("{}", exporter.render(&reports)?),
    }

    let failed = reports.iter().filter(|r| r.is_failed()).count();
    let with_errors = reports.iter().filter(|r| r.has_errors()).count();
    let with_warnings = reports.iter().filter(|r| r.has_warnings()).count();
    info!(
        files = reports.len(),
        failed, with_errors, with_warnings, "extraction finished"
    );

    if failed > 0 || with_errors > 0 || (cli.deny_warnings && with_warnings > 0) {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
