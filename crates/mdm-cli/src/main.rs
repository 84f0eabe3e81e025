//! # mdm-cli
//!
//! Command-line front end for the master-data attribute engine.
//!
//! Catalogs are JSON or YAML files holding definitions, groups, the
//! item-type, category, family, and item hierarchy, and associations.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use commands::{Target, TreeKind};
use config::CliConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mdm")]
#[command(about = "Master-data attribute engine CLI")]
#[command(version)]
struct Cli {
    /// Path to configuration file (YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct TargetArgs {
    /// Item type id
    #[arg(long)]
    item_type: String,

    /// Category id (defaults to the item type's category)
    #[arg(long)]
    category: Option<String>,

    /// Family id
    #[arg(long)]
    family: Option<String>,
}

impl From<TargetArgs> for Target {
    fn from(args: TargetArgs) -> Self {
        Self {
            item_type: args.item_type,
            category: args.category,
            family: args.family,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every definition, group, hierarchy node, and attribute value
    Check {
        /// Catalog file path
        catalog: PathBuf,
    },

    /// Print the effective attribute schema for an item classification
    Resolve {
        /// Catalog file path
        catalog: PathBuf,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Validate attribute values and print the normalized map
    Normalize {
        /// Catalog file path
        catalog: PathBuf,

        #[command(flatten)]
        target: TargetArgs,

        /// Provided values as a JSON object
        #[arg(long)]
        values: String,

        /// Stored values as a JSON object
        #[arg(long)]
        existing: Option<String>,

        /// Apply update semantics instead of create
        #[arg(long)]
        update: bool,
    },

    /// Print the category or family tree
    Tree {
        /// Catalog file path
        catalog: PathBuf,

        /// Which hierarchy to print
        #[arg(short, long, value_enum, default_value = "category")]
        kind: TreeKind,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check { catalog } => {
            tracing::info!("Checking {}", catalog.display());
            commands::check(&catalog, &config.engine).await
        }
        Commands::Resolve { catalog, target } => {
            commands::resolve(&catalog, &config.engine, &target.into()).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Normalize {
            catalog,
            target,
            values,
            existing,
            update,
        } => {
            commands::normalize_values(
                &catalog,
                &config.engine,
                &target.into(),
                &values,
                existing.as_deref(),
                update,
            )
            .await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Tree { catalog, kind } => {
            commands::tree(&catalog, &config.engine, kind).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
