//! `meander` command-line tool.

use clap::{Parser, Subcommand};
use meander_reach::{HucLevel, SegmentId};
use meander_runner::{
    output_path, write_chain, write_profile, RunnerConfig, RunnerError, SaveFormat, Workspace,
};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meander")]
#[command(
    author,
    version,
    about = "Assemble river reaches into arc-length parameterized curves",
    long_about = None
)]
struct Cli {
    /// Runner configuration (YAML)
    #[arg(short, long, global = true, default_value = "meander.yaml")]
    config: PathBuf,

    /// Override the output directory
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Override the save format (json or csv)
    #[arg(short, long, global = true, value_parser = SaveFormat::from_str)]
    format: Option<SaveFormat>,

    /// Override the hydrologic unit level used for walking
    #[arg(long, global = true)]
    hu_level: Option<u8>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the segment chain starting at a segment, as JSON unless --format is given
    Walk {
        /// Start segment id
        start: u64,
    },
    /// Walk and stitch, saving the raw profile
    Stitch {
        /// Start segment id
        start: u64,
    },
    /// Walk, stitch and fit one reach, saving every artifact
    Assemble {
        /// Start segment id
        start: u64,
    },
    /// Assemble every headwater reach of a hydrologic unit
    Batch {
        /// Unit code at the walk level, e.g. 0601
        unit: String,
    },
    /// List the units available at the walk level
    Units,
}

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<RunnerConfig, RunnerError> {
    let mut config = RunnerConfig::from_path(&cli.config)?;
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(format) = cli.format {
        config.save_format = format;
    }
    if let Some(digits) = cli.hu_level {
        config.extraction.hu_level = HucLevel::new(digits)?;
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> Result<(), RunnerError> {
    let config = load_config(cli)?;
    let workspace = Workspace::open(config)?;
    let extractor = workspace.extractor()?;

    match &cli.command {
        Commands::Walk { start } => {
            let chain = extractor.chain(SegmentId(*start))?;
            let format = cli.format.unwrap_or(SaveFormat::Json);
            write_chain(&chain, format, io::stdout().lock())?;
            if format == SaveFormat::Json {
                println!();
            }
        }
        Commands::Stitch { start } => {
            let start = SegmentId(*start);
            let chain = extractor.chain(start)?;
            let profile = extractor.profile(&chain)?;

            let config = workspace.config();
            std::fs::create_dir_all(&config.output_dir)?;
            let path = output_path(&config.output_dir, start, "profile", config.save_format);
            write_profile(&profile, config.save_format, BufWriter::new(File::create(&path)?))?;
            info!(
                path = %path.display(),
                points = profile.len(),
                length = profile.length(),
                "saved profile"
            );
        }
        Commands::Assemble { start } => {
            for path in workspace.run_reach(SegmentId(*start))? {
                println!("{}", path.display());
            }
        }
        Commands::Batch { unit } => {
            let summary = workspace.run_unit(unit)?;
            serde_json::to_writer_pretty(io::stdout().lock(), &summary)?;
            println!();
        }
        Commands::Units => {
            for unit in extractor.units() {
                println!("{}", unit);
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
