//! Subcommand implementations
//!
//! Every command loads the catalog into a fresh in-memory store before doing
//! its work, so nothing is persisted between runs.

use anyhow::{Context, bail};
use mdm_engine::{CatalogService, EngineConfig, audit_catalog, import_catalog};
use mdm_ir::{AttributeMap, EntityId, Value};
use mdm_schema::{Catalog, CatalogLoader};
use mdm_store::MemoryStore;
use mdm_validation::{ValidationReporter, WriteMode, normalize};
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;
use tracing::info;

/// Tree kinds the `tree` command can print
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TreeKind {
    Category,
    Family,
}

/// Classification an item is resolved against
pub struct Target {
    pub item_type: String,
    pub category: Option<String>,
    pub family: Option<String>,
}

fn load_catalog(path: &Path) -> anyhow::Result<Catalog> {
    let catalog = CatalogLoader::default()
        .load_from_file(path)
        .with_context(|| format!("failed to load catalog {}", path.display()))?;
    info!("Loaded {} entities from {}", catalog.len(), path.display());
    Ok(catalog)
}

async fn imported(path: &Path, config: &EngineConfig) -> anyhow::Result<CatalogService<MemoryStore>> {
    let catalog = load_catalog(path)?;
    let service = CatalogService::new(MemoryStore::new(), config.clone());
    import_catalog(&service, &catalog)
        .await
        .with_context(|| format!("catalog {} is inconsistent", path.display()))?;
    Ok(service)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_values(json: &str, what: &str) -> anyhow::Result<AttributeMap> {
    let value: serde_json::Value =
        serde_json::from_str(json).with_context(|| format!("{what} is not valid JSON"))?;
    match Value::from(value).into_map() {
        Ok(map) => Ok(map),
        Err(err) => bail!("{what} must be a JSON object: {err}"),
    }
}

/// Audit a catalog and print every issue
///
/// Exits 0 when clean, 1 with warnings only, 2 with errors.
pub async fn check(path: &Path, config: &EngineConfig) -> anyhow::Result<ExitCode> {
    let catalog = load_catalog(path)?;
    let service = CatalogService::new(MemoryStore::new(), config.clone());
    let report = audit_catalog(&service, &catalog).await;

    println!("{}", ValidationReporter::new().render(&report));

    Ok(if !report.is_valid() {
        ExitCode::from(2)
    } else if report.warning_count() > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

/// Print the effective schema for an item classification
pub async fn resolve(path: &Path, config: &EngineConfig, target: &Target) -> anyhow::Result<()> {
    let service = imported(path, config).await?;
    let category = target.category.as_deref().map(EntityId::from);
    let family = target.family.as_deref().map(EntityId::from);

    let schema = service
        .resolve_item_schema(
            &EntityId::from(target.item_type.as_str()),
            category.as_ref(),
            family.as_ref(),
        )
        .await?;
    print_json(&schema)
}

/// Print the normalized attribute map for an item classification
pub async fn normalize_values(
    path: &Path,
    config: &EngineConfig,
    target: &Target,
    values: &str,
    existing: Option<&str>,
    update: bool,
) -> anyhow::Result<()> {
    let service = imported(path, config).await?;
    let category = target.category.as_deref().map(EntityId::from);
    let family = target.family.as_deref().map(EntityId::from);
    let schema = service
        .resolve_item_schema(
            &EntityId::from(target.item_type.as_str()),
            category.as_ref(),
            family.as_ref(),
        )
        .await?;

    let provided = parse_values(values, "--values")?;
    let existing = match existing {
        Some(json) => parse_values(json, "--existing")?,
        None => AttributeMap::new(),
    };
    let mode = if update { WriteMode::Update } else { WriteMode::Create };

    let normalized = normalize(&schema.definitions, &provided, &existing, mode)?;
    print_json(&normalized)
}

/// Print the category or family tree
pub async fn tree(path: &Path, config: &EngineConfig, kind: TreeKind) -> anyhow::Result<()> {
    let service = imported(path, config).await?;
    match kind {
        TreeKind::Category => print_json(&service.category_tree().await?),
        TreeKind::Family => print_json(&service.family_tree().await?),
    }
}
