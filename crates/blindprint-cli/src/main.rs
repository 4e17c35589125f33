//! Blindprint command-line tool.
//!
//! # Usage
//!
//! ```bash
//! # Enroll float feature vectors into a store
//! blindprint enroll --db features.redb --input enroll.json
//!
//! # Match a query against every enrolled vector
//! blindprint match --db features.redb --query query.json --mode corrected
//! ```

mod input;

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use blindprint_core::{
    ClientSession, DistanceMode, FeatureStore, KeyConfig, MatchServer, ProtocolConfig,
    RedbFeatureStore, StorageError,
    config::{DEFAULT_MASK_MAX, DEFAULT_MASK_MIN},
    run_match,
    vector::DEFAULT_QUANTIZATION_SCALE,
};
use clap::{Parser, Subcommand};
use rand::rngs::OsRng;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::input::{MatchReport, read_query, read_records};

/// Privacy-preserving fingerprint distance matching
#[derive(Parser, Debug)]
#[command(name = "blindprint")]
#[command(about = "Privacy-preserving fingerprint distance matching")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Quantize and store labelled feature vectors
    Enroll {
        /// Path to the feature store
        #[arg(long)]
        db: PathBuf,

        /// JSON array of {"label", "features"} records
        #[arg(long)]
        input: PathBuf,

        /// Fixed-point scale applied before rounding
        #[arg(long, default_value_t = DEFAULT_QUANTIZATION_SCALE)]
        scale: f64,
    },

    /// List enrolled labels
    List {
        /// Path to the feature store
        #[arg(long)]
        db: PathBuf,
    },

    /// Remove an enrolled vector
    Delete {
        /// Path to the feature store
        #[arg(long)]
        db: PathBuf,

        /// Label to remove
        #[arg(long)]
        label: String,
    },

    /// Run the encrypted distance protocol against the store
    Match {
        /// Path to the feature store
        #[arg(long)]
        db: PathBuf,

        /// JSON object {"features": [...]}
        #[arg(long)]
        query: PathBuf,

        /// Distance formula (legacy, corrected)
        #[arg(long, default_value = "legacy")]
        mode: DistanceMode,

        /// Paillier modulus size in bits
        #[arg(long, default_value_t = KeyConfig::default().modulus_bits)]
        key_bits: usize,

        /// Fixed-point scale applied before rounding
        #[arg(long, default_value_t = DEFAULT_QUANTIZATION_SCALE)]
        scale: f64,

        /// Smallest mask value (inclusive)
        #[arg(long, default_value_t = DEFAULT_MASK_MIN)]
        mask_min: u64,

        /// Mask upper bound (exclusive)
        #[arg(long, default_value_t = DEFAULT_MASK_MAX)]
        mask_max: u64,

        /// Evaluate entries on one thread
        #[arg(long)]
        sequential: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match args.command {
        Command::Enroll { db, input, scale } => enroll(&db, &input, scale),
        Command::List { db } => list(&db),
        Command::Delete { db, label } => delete(&db, &label),
        Command::Match { db, query, mode, key_bits, scale, mask_min, mask_max, sequential } => {
            let config = ProtocolConfig {
                key: KeyConfig { modulus_bits: key_bits },
                mode,
                mask_min,
                mask_max,
                parallel: !sequential,
            };
            run(&db, &query, scale, config)
        },
    }
}

fn enroll(db: &Path, input: &Path, scale: f64) -> Result<(), Box<dyn std::error::Error>> {
    let store = RedbFeatureStore::open(db)?;
    let records = read_records(input)?;

    for record in &records {
        let vector = record.quantize(scale)?;
        store.insert(&record.label, &vector)?;
        tracing::debug!(label = %record.label, len = vector.len(), "enrolled");
    }

    let total = store.len()?;
    tracing::info!(enrolled = records.len(), total, "enrollment complete");
    Ok(())
}

fn list(db: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = RedbFeatureStore::open(db)?;
    let mut stdout = std::io::stdout().lock();

    for label in store.labels()? {
        writeln!(stdout, "{label}")?;
    }
    Ok(())
}

fn delete(db: &Path, label: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = RedbFeatureStore::open(db)?;

    if !store.delete(label)? {
        return Err(StorageError::NotFound(label.to_string()).into());
    }

    tracing::info!(%label, "deleted");
    Ok(())
}

fn run(
    db: &Path,
    query: &Path,
    scale: f64,
    config: ProtocolConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let vector = read_query(query, scale)?;
    let server = MatchServer::new(RedbFeatureStore::open(db)?, config);
    let session = ClientSession::start(config, &mut OsRng)?;

    let results = run_match(&session, &server, &vector, &mut OsRng)?;

    let skipped = results.iter().filter(|r| !r.is_ok()).count();
    tracing::info!(entries = results.len(), skipped, "match complete");

    let report = MatchReport::new(
        config.mode.to_string(),
        session.public_key().fingerprint().to_string(),
        &results,
    );
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &report)?;
    writeln!(stdout)?;

    Ok(())
}
