//! Effective-schema resolution for items
//!
//! An item's definitions come from the attribute groups of its item type, its
//! category and that category's ancestors, and its family and that family's
//! ancestors. Groups are collected in that precedence order and merged with
//! first-seen-wins semantics per attribute code.

use crate::policies::{CategoryPolicy, EngineConfig};
use crate::{Error, Result};
use mdm_ir::{Category, EntityId, EntityKind, Family, ItemType};
use mdm_schema::{DefinitionSet, merge_groups};
use mdm_store::Repository;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Definitions that apply to an item, with the entities they came from
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSchema {
    pub item_type: ItemType,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<Family>,
    /// Contributing groups, in precedence order
    pub group_ids: Vec<EntityId>,
    pub definitions: DefinitionSet,
}

/// Resolve the effective definition set for an item type, category, and family
///
/// # Errors
///
/// - [`Error::NotFound`] for a missing item type, category, or family
/// - [`Error::MissingCategory`] when no category is given and none can be
///   inferred under the configured [`CategoryPolicy`]
/// - [`Error::Containment`] when the category does not belong to the item type
///   (if enforced) or the family does not belong to the category
/// - [`Error::Schema`] for a conflicting duplicate code
pub async fn resolve<R: Repository>(
    repo: &R,
    config: &EngineConfig,
    item_type_id: &EntityId,
    category_id: Option<&EntityId>,
    family_id: Option<&EntityId>,
) -> Result<ResolvedSchema> {
    let item_type = repo
        .find_item_type(item_type_id)
        .await?
        .ok_or_else(|| Error::not_found(EntityKind::ItemType, item_type_id.clone()))?;

    let category_id = match (category_id, config.category_policy, &item_type.category) {
        (Some(id), _, _) => id.clone(),
        (None, CategoryPolicy::FallbackToItemType, Some(default)) => default.clone(),
        (None, _, _) => {
            return Err(Error::MissingCategory {
                item_type: item_type.id.clone(),
            });
        }
    };

    let category = repo
        .find_category(&category_id)
        .await?
        .ok_or_else(|| Error::not_found(EntityKind::Category, category_id.clone()))?;

    if config.enforce_containment && category.item_type.as_ref() != Some(&item_type.id) {
        return Err(Error::Containment(format!(
            "Category {} is not allowed for item type {}",
            category.code, item_type.code
        )));
    }

    let family = match family_id {
        Some(id) => {
            let family = repo
                .find_family(id)
                .await?
                .ok_or_else(|| Error::not_found(EntityKind::Family, id.clone()))?;
            if family.category.as_ref() != Some(&category.id) {
                return Err(Error::Containment(format!(
                    "Family {} does not belong to category {}",
                    family.code, category.code
                )));
            }
            Some(family)
        }
        None => None,
    };

    let mut group_ids = item_type.attribute_groups.clone();
    for ancestor_id in &category.ancestors {
        match repo.find_category(ancestor_id).await? {
            Some(ancestor) => group_ids.extend(ancestor.attribute_groups),
            None => warn!("Skipping missing ancestor category {}", ancestor_id),
        }
    }
    group_ids.extend(category.attribute_groups.iter().cloned());
    if let Some(family) = &family {
        for ancestor_id in &family.ancestors {
            match repo.find_family(ancestor_id).await? {
                Some(ancestor) => group_ids.extend(ancestor.attribute_groups),
                None => warn!("Skipping missing ancestor family {}", ancestor_id),
            }
        }
        group_ids.extend(family.attribute_groups.iter().cloned());
    }

    let mut seen = HashSet::new();
    group_ids.retain(|id| seen.insert(id.clone()));

    let populated = repo.find_attribute_groups_by_ids(&group_ids).await?;
    let definitions = merge_groups(&populated, config.conflict_policy, config.include_inactive)?;

    debug!(
        "Resolved {} definitions from {} groups for item type {}",
        definitions.len(),
        group_ids.len(),
        item_type.code
    );

    Ok(ResolvedSchema {
        item_type,
        category,
        family,
        group_ids,
        definitions,
    })
}
