//! Bulk loading of a [`Catalog`] through the write services
//!
//! Entities are written in dependency order: definitions, groups, item types,
//! categories (parents first), item-type default categories, families
//! (parents first), items, then associations. Category and family attribute
//! values are applied as an update after the node exists, since creation
//! refuses them.

use crate::hierarchy::parents_first;
use crate::service::{CatalogService, CategoryUpdate, FamilyUpdate, ItemTypeUpdate, NewItem};
use crate::{Error, Result};
use mdm_ir::{AttributeMap, Category, Family, Item, ItemType};
use mdm_schema::Catalog;
use mdm_store::Repository;
use mdm_validation::{ValidationIssue, ValidationReport, audit_values};
use serde::Serialize;
use tracing::{info, warn};

/// Number of entities written per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub definitions: usize,
    pub groups: usize,
    pub item_types: usize,
    pub categories: usize,
    pub families: usize,
    pub items: usize,
    pub associations: usize,
}

impl ImportSummary {
    #[must_use]
    pub fn total(&self) -> usize {
        self.definitions
            + self.groups
            + self.item_types
            + self.categories
            + self.families
            + self.items
            + self.associations
    }
}

/// Load a catalog, stopping at the first failure
///
/// # Errors
///
/// The first error any write service returns.
pub async fn import_catalog<R: Repository>(
    service: &CatalogService<R>,
    catalog: &Catalog,
) -> Result<ImportSummary> {
    let mut failures = Failures::Stop;
    let summary = run(service, catalog, &mut failures).await?;
    info!("Imported {} entities", summary.total());
    Ok(summary)
}

/// Load a catalog, recording every failure instead of stopping
///
/// Entities that fail are skipped and anything depending on them fails in
/// turn. Items whose attribute values are rejected get one issue per
/// offending attribute.
pub async fn audit_catalog<R: Repository>(
    service: &CatalogService<R>,
    catalog: &Catalog,
) -> ValidationReport {
    let mut failures = Failures::Collect(ValidationReport::new());
    // Collect mode never short-circuits
    if let Err(err) = run(service, catalog, &mut failures).await {
        failures.record(service, "catalog", None, err).await.ok();
    }
    match failures {
        Failures::Collect(report) => report,
        Failures::Stop => ValidationReport::new(),
    }
}

enum Failures {
    Stop,
    Collect(ValidationReport),
}

impl Failures {
    async fn record<R: Repository>(
        &mut self,
        service: &CatalogService<R>,
        entity: &str,
        item: Option<&Item>,
        err: Error,
    ) -> Result<()> {
        let Failures::Collect(report) = self else {
            return Err(err);
        };
        warn!("{}: {}", entity, err);

        if let (Some(item), Error::Validation(_)) = (item, &err) {
            if let Ok(schema) = service
                .resolve_item_schema(&item.item_type, Some(&item.category), item.family.as_ref())
                .await
            {
                let issues = audit_values(&schema.definitions, &item.attributes);
                if !issues.is_empty() {
                    report.merge(entity, issues);
                    return Ok(());
                }
            }
        }

        report.add(ValidationIssue::error(err.to_string()).with_entity(entity));
        Ok(())
    }
}

async fn run<R: Repository>(
    service: &CatalogService<R>,
    catalog: &Catalog,
    failures: &mut Failures,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for raw in &catalog.definitions {
        match service.save_raw_definition(raw.clone()).await {
            Ok(_) => summary.definitions += 1,
            Err(err) => failures.record(service, &raw.code, None, err).await?,
        }
    }

    for group in &catalog.groups {
        match service.save_group(group.clone()).await {
            Ok(()) => summary.groups += 1,
            Err(err) => failures.record(service, &group.code, None, err).await?,
        }
    }

    let mut created_item_types: Vec<&ItemType> = Vec::new();
    for item_type in &catalog.item_types {
        let detached = ItemType {
            category: None,
            ..item_type.clone()
        };
        match service.create_item_type(detached).await {
            Ok(_) => {
                summary.item_types += 1;
                created_item_types.push(item_type);
            }
            Err(err) => failures.record(service, &item_type.code, None, err).await?,
        }
    }

    for category in parents_first(&catalog.categories) {
        let attributes = category.attributes.clone();
        let bare = Category {
            attributes: AttributeMap::new(),
            ..category.clone()
        };
        if let Err(err) = service.create_category(bare).await {
            failures.record(service, &category.code, None, err).await?;
            continue;
        }
        summary.categories += 1;

        if !attributes.is_empty() {
            let update = CategoryUpdate {
                attributes: Some(attributes),
                ..CategoryUpdate::default()
            };
            if let Err(err) = service.update_category(&category.id, update).await {
                failures.record(service, &category.code, None, err).await?;
            }
        }
    }

    for item_type in created_item_types {
        let Some(category) = &item_type.category else {
            continue;
        };
        let update = ItemTypeUpdate {
            category: Some(Some(category.clone())),
            ..ItemTypeUpdate::default()
        };
        if let Err(err) = service.update_item_type(&item_type.id, update).await {
            failures.record(service, &item_type.code, None, err).await?;
        }
    }

    for family in parents_first(&catalog.families) {
        let attributes = family.attributes.clone();
        let bare = Family {
            attributes: AttributeMap::new(),
            ..family.clone()
        };
        if let Err(err) = service.create_family(bare).await {
            failures.record(service, &family.code, None, err).await?;
            continue;
        }
        summary.families += 1;

        if !attributes.is_empty() {
            let update = FamilyUpdate {
                attributes: Some(attributes),
                ..FamilyUpdate::default()
            };
            if let Err(err) = service.update_family(&family.id, update).await {
                failures.record(service, &family.code, None, err).await?;
            }
        }
    }

    for item in &catalog.items {
        match service.create_item(NewItem::from(item.clone())).await {
            Ok(_) => summary.items += 1,
            Err(err) => failures.record(service, &item.code, Some(item), err).await?,
        }
    }

    for association in &catalog.associations {
        match service.create_association(association.clone()).await {
            Ok(_) => summary.associations += 1,
            Err(err) => {
                failures
                    .record(service, association.id.as_str(), None, err)
                    .await?;
            }
        }
    }

    Ok(summary)
}
