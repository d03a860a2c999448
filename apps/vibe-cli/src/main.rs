//! `vibe` command line: initialise the index, ingest profiles, run vibe searches.
//!
//! Results are printed as JSON on stdout; logs go to stderr.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vibe_core::config::Config;
use vibe_core::constants::{AUDIO, VISUAL};
use vibe_core::types::{AttrValue, Conditions, EmbedInput, Payload, Query};
use vibe_hybrid::open_engine;

#[derive(Parser)]
#[command(name = "vibe")]
#[command(author, version, about = "Vibe search over creative profiles", long_about = None)]
struct Cli {
    /// Directory holding config.toml (relative index paths resolve against it).
    /// Defaults to the working directory.
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the point table with one vector space per configured modality
    Init,

    /// Store a profile with its image and/or audio embedded into their spaces
    Ingest {
        #[arg(long)]
        name: String,

        #[arg(long)]
        role: Option<String>,

        /// Extra attribute, repeatable. Comma-separated values become a list: tags=neon,retro
        #[arg(long = "attr", value_name = "KEY=VALUE")]
        attrs: Vec<String>,

        /// Image file, embedded into the visual space
        #[arg(long)]
        image: Option<PathBuf>,

        /// Audio file, embedded into the audio space
        #[arg(long)]
        audio: Option<PathBuf>,
    },

    /// Rank profiles against a natural-language vibe
    Search {
        query: String,

        /// Vector space to search; defaults to the primary modality
        #[arg(short, long)]
        modality: Option<String>,

        /// Hard constraint, repeatable
        #[arg(long = "must", value_name = "KEY=VALUE")]
        must: Vec<String>,

        /// Soft preference, repeatable
        #[arg(long = "prefer", value_name = "KEY=VALUE")]
        prefer: Vec<String>,

        /// Zero or negative returns no results
        #[arg(short, long, allow_negative_numbers = true)]
        limit: Option<i64>,
    },

    /// Show the point count and the first stored payloads
    Inspect {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn split_pair(raw: &str) -> Result<(String, String)> {
    let (k, v) = raw.split_once('=').ok_or_else(|| anyhow!("expected KEY=VALUE, got '{raw}'"))?;
    if k.is_empty() {
        return Err(anyhow!("empty key in '{raw}'"));
    }
    Ok((k.to_string(), v.to_string()))
}

fn parse_conditions(raw: &[String]) -> Result<Conditions> {
    raw.iter().map(|r| split_pair(r)).collect()
}

fn attr_value(v: String) -> AttrValue {
    if v.contains(',') {
        AttrValue::List(v.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect())
    } else {
        AttrValue::Text(v)
    }
}

fn read_media(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

/// Exit status: 2 for a bad request (unknown modality, empty ingest, ...), 1 for anything else.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<vibe_core::Error>() {
        Some(e) if e.is_request_error() => 2,
        _ => 1,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        error!("{err:#}");
        std::process::exit(exit_code(&err));
    }
}

async fn run(cli: Cli) -> Result<()> {
    let (config, base) = match &cli.config_dir {
        Some(dir) => (Config::load_in(dir)?, dir.clone()),
        None => (Config::load()?, PathBuf::from(".")),
    };
    let settings = config.settings()?;
    let engine = open_engine(&settings, &base).await?;

    match cli.command {
        Commands::Init => {
            let modalities: Vec<_> = engine.index().modalities().iter().map(|m| json!({"name": m.name, "dim": m.dim})).collect();
            info!(backend = ?settings.index.backend, table = %settings.index.table, "index ready");
            let summary = json!({
                "table": settings.index.table,
                "modalities": modalities,
                "primary_modality": engine.primary_modality(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Commands::Ingest { name, role, attrs, image, audio } => {
            let mut payload = Payload::new();
            payload.insert("name".to_string(), AttrValue::Text(name));
            if let Some(role) = role {
                payload.insert("role".to_string(), AttrValue::Text(role));
            }
            for raw in &attrs {
                let (k, v) = split_pair(raw)?;
                payload.insert(k, attr_value(v));
            }

            let mut media = Vec::new();
            if let Some(path) = image {
                media.push((VISUAL.to_string(), EmbedInput::Image(read_media(&path)?)));
            }
            if let Some(path) = audio {
                media.push((AUDIO.to_string(), EmbedInput::Audio(read_media(&path)?)));
            }

            let id = engine.ingest_media(payload, media).await?;
            println!("{}", serde_json::to_string_pretty(&json!({ "id": id }))?);
        }

        Commands::Search { query, modality, must, prefer, limit } => {
            let query = Query {
                text: query,
                modality,
                hard_filters: parse_conditions(&must)?,
                soft_filters: parse_conditions(&prefer)?,
                limit: limit.unwrap_or_else(|| i64::try_from(settings.search.default_limit).unwrap_or(i64::MAX)),
            };
            let results = engine.search(&query).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }

        Commands::Inspect { limit } => {
            let count = engine.index().count().await?;
            let points = engine.index().scroll(limit).await?;
            println!("{}", serde_json::to_string_pretty(&json!({ "count": count, "points": points }))?);
        }
    }

    Ok(())
}
