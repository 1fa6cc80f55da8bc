use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kpka::archive::unknown_name;
use kpka::{CompressionMethod, PakBuilder, PakConfig, PakReader, PathRegistry};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "kpka",
    about = "Pack, unpack and inspect KPKA asset archives",
    version
)]
struct Cli {
    /// Set the logging level
    #[arg(short, long, value_enum, global = true, default_value = "info")]
    log_level: LogLevel,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Codec {
    None,
    Deflate,
    Zstd,
}

impl From<Codec> for CompressionMethod {
    fn from(codec: Codec) -> Self {
        match codec {
            Codec::None => CompressionMethod::None,
            Codec::Deflate => CompressionMethod::Deflate,
            Codec::Zstd => CompressionMethod::Zstd,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build an archive from files and directories
    Pack {
        /// Files (stored under their file name) or directories (stored recursively)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output archive
        #[arg(short, long)]
        output: PathBuf,

        /// Codec for compressible entries
        #[arg(long, value_enum)]
        compression: Option<Codec>,
    },

    /// Extract every entry of an archive
    Unpack {
        input: PathBuf,

        /// Destination directory
        #[arg(short, long)]
        output: PathBuf,

        /// Known-path list used to name entries
        #[arg(short, long)]
        paths: Option<PathBuf>,

        /// Keep going when an entry fails to extract
        #[arg(long)]
        continue_on_error: bool,

        /// Worker threads
        #[arg(long)]
        threads: Option<usize>,
    },

    /// List the entries of an archive
    List {
        input: PathBuf,

        /// Known-path list used to name entries
        #[arg(short, long)]
        paths: Option<PathBuf>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct ListedEntry {
    hash: String,
    path: Option<String>,
    offset: u64,
    compressed_size: u64,
    decompressed_size: u64,
    /// `None` when the attribute word names no known codec
    compression: Option<CompressionMethod>,
    attributes: i64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(cli.log_level.into()).into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => PakConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PakConfig::default(),
    };

    match cli.command {
        Commands::Pack {
            inputs,
            output,
            compression,
        } => pack(&config, &inputs, &output, compression),
        Commands::Unpack {
            input,
            output,
            paths,
            continue_on_error,
            threads,
        } => {
            let mut options = config.extract.clone();
            options.continue_on_error |= continue_on_error;
            if threads.is_some() {
                options.threads = threads;
            }
            unpack(&config, &input, &output, paths.as_deref(), options)
        }
        Commands::List { input, paths, json } => list(&config, &input, paths.as_deref(), json),
    }
}

fn load_registry(paths: Option<&Path>) -> Result<PathRegistry> {
    match paths {
        Some(path) => PathRegistry::from_file(path)
            .with_context(|| format!("Failed to load path list {}", path.display())),
        None => Ok(PathRegistry::new()),
    }
}

fn open_archive(config: &PakConfig, input: &Path) -> Result<PakReader<BufReader<File>>> {
    PakReader::open_file_with(input, config.read.clone(), None)
        .with_context(|| format!("Failed to open archive {}", input.display()))
}

fn pack(
    config: &PakConfig,
    inputs: &[PathBuf],
    output: &Path,
    compression: Option<Codec>,
) -> Result<()> {
    let method = compression
        .map(CompressionMethod::from)
        .unwrap_or(config.build.compression);
    let mut builder = PakBuilder::with_config(config.build.clone());

    for input in inputs {
        if input.is_dir() {
            let added = builder
                .add_directory(input)
                .with_context(|| format!("Failed to add directory {}", input.display()))?;
            info!(directory = %input.display(), files = added, "Added directory");
        } else {
            let Some(name) = input.file_name().and_then(|name| name.to_str()) else {
                bail!("Input has no usable file name: {}", input.display());
            };
            builder
                .add_file_from_disk(name, input)
                .with_context(|| format!("Failed to add file {}", input.display()))?;
        }
    }

    builder
        .save_to_file(output, method)
        .with_context(|| format!("Failed to write archive {}", output.display()))?;
    println!("Packed {} entries into {}", builder.len(), output.display());
    Ok(())
}

fn unpack(
    config: &PakConfig,
    input: &Path,
    output: &Path,
    paths: Option<&Path>,
    options: kpka::ExtractOptions,
) -> Result<()> {
    let registry = load_registry(paths)?;
    let reader = open_archive(config, input)?;

    let report = reader
        .extract_all(&registry, output, &options, || File::open(input).map(BufReader::new))
        .with_context(|| format!("Failed to extract {}", input.display()))?;

    println!(
        "Extracted {} entries ({} unknown) into {}",
        report.extracted,
        report.unknown,
        output.display()
    );
    if !report.failed.is_empty() {
        for failure in &report.failed {
            eprintln!("  {}: {}", failure.hash, failure.error);
        }
        bail!("{} entries failed to extract", report.failed.len());
    }
    Ok(())
}

fn list(config: &PakConfig, input: &Path, paths: Option<&Path>, json: bool) -> Result<()> {
    let registry = load_registry(paths)?;
    let reader = open_archive(config, input)?;

    let listed: Vec<ListedEntry> = reader
        .entries()
        .iter()
        .map(|entry| ListedEntry {
            hash: entry.hash.to_string(),
            path: registry.resolve(entry.hash).map(str::to_string),
            offset: entry.offset,
            compressed_size: entry.compressed_size,
            decompressed_size: entry.decompressed_size,
            compression: entry.compression().ok(),
            attributes: entry.attributes,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&listed)?);
        return Ok(());
    }

    let header = reader.header();
    println!(
        "{}: version {}.{}, {} entries",
        input.display(),
        header.version_major,
        header.version_minor,
        listed.len()
    );
    for (entry, row) in reader.entries().iter().zip(&listed) {
        let name = row
            .path
            .clone()
            .unwrap_or_else(|| unknown_name(entry.hash, &[]));
        println!(
            "{}  {:>10}  {:>10}  {:<7}  {}",
            row.hash,
            row.compressed_size,
            row.decompressed_size,
            row.compression.map_or("unknown", CompressionMethod::name),
            name
        );
    }
    Ok(())
}
