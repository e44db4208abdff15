//! polysql CLI
//!
//! Command-line tool for compiling schema documents to vendor DDL.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use polysql_core::{
    Compliance, DdlCompiler, DdlOptions, Dialect, QuotePolicy, Vendor, REGISTRY,
};
use polysql_runner::prelude::*;

/// Multi-vendor SQL schema compiler.
#[derive(Parser)]
#[command(name = "polysql")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a schema document to DDL for one vendor.
    Ddl {
        /// Target vendor.
        #[arg(long, env = "POLYSQL_VENDOR")]
        vendor: Vendor,

        /// Schema document.
        #[arg(short, long)]
        schema: PathBuf,

        /// Fail on reserved identifiers instead of warning.
        #[arg(long)]
        strict: bool,

        /// Identifier quoting.
        #[arg(long, value_enum, default_value_t = Quoting::Always)]
        quote: Quoting,

        /// Write the script here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create the schema in a SQLite database.
    Apply {
        /// Database URL.
        #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
        database: String,

        /// Schema document.
        #[arg(short, long)]
        schema: PathBuf,
    },

    /// Print the schema of a SQLite database as a document.
    Introspect {
        /// Database URL.
        #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
        database: String,
    },

    /// List supported vendors.
    Vendors,
}

#[derive(Clone, Copy, ValueEnum)]
enum Quoting {
    Always,
    Reserved,
    Never,
}

impl From<Quoting> for QuotePolicy {
    fn from(quoting: Quoting) -> Self {
        match quoting {
            Quoting::Always => Self::Always,
            Quoting::Reserved => Self::Reserved,
            Quoting::Never => Self::Never,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Ddl {
            vendor,
            schema,
            strict,
            quote,
            output,
        } => {
            let schema = load_schema(&schema)?;
            let compliance = if strict {
                Compliance::Strict
            } else {
                Compliance::Lenient
            };
            let options = DdlOptions::new()
                .compliance(compliance)
                .quoting(quote.into());
            let batch = DdlCompiler::new(vendor.dialect(), options).compile(&schema)?;
            for warning in &batch.warnings {
                warn!("{warning}");
            }

            let script = batch.to_script();
            match output {
                Some(path) => {
                    std::fs::write(&path, script)?;
                    info!(
                        "Wrote {} statements for {vendor} to {}",
                        batch.len(),
                        path.display()
                    );
                }
                None => print!("{script}"),
            }
        }

        Commands::Apply { database, schema } => {
            let schema = load_schema(&schema)?;
            let executor = SqliteExecutor::connect(&database).await?;
            let batch = executor.apply(&schema, DdlOptions::new()).await?;
            info!("Applied {} statements to {database}", batch.len());
        }

        Commands::Introspect { database } => {
            let executor = SqliteExecutor::connect(&database).await?;
            let schema = introspect(executor.pool()).await?;
            println!("{}", to_json(&schema)?);
        }

        Commands::Vendors => {
            for (vendor, dialect) in REGISTRY.iter() {
                println!("{:<12} {}", vendor.name(), dialect.name());
            }
        }
    }

    Ok(())
}
