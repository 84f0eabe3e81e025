//! Concurrent registry of attribute definitions and groups

use crate::model::{AttributeDefinition, AttributeGroup, PopulatedGroup};
use dashmap::DashMap;
use mdm_ir::EntityId;
use tracing::{debug, trace};

/// Thread-safe cache of definitions and groups, indexed by id and by code
///
/// Share it behind an `Arc`; every method takes `&self`.
#[derive(Debug, Default)]
pub struct CatalogRegistry {
    definitions: DashMap<EntityId, AttributeDefinition>,
    definition_codes: DashMap<String, EntityId>,
    groups: DashMap<EntityId, AttributeGroup>,
    group_codes: DashMap<String, EntityId>,
}

impl CatalogRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a definition, returning the previous version
    pub fn register_definition(&self, definition: AttributeDefinition) -> Option<AttributeDefinition> {
        trace!("Registering definition: {} ({})", definition.code, definition.id);
        let previous = self
            .definitions
            .insert(definition.id.clone(), definition.clone());
        if let Some(old) = &previous {
            if old.code != definition.code {
                self.definition_codes.remove(&old.code);
            }
        }
        self.definition_codes
            .insert(definition.code.clone(), definition.id);
        previous
    }

    #[must_use]
    pub fn get_definition(&self, id: &EntityId) -> Option<AttributeDefinition> {
        self.definitions.get(id).map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn get_definition_by_code(&self, code: &str) -> Option<AttributeDefinition> {
        let id = self.definition_codes.get(code)?.value().clone();
        self.get_definition(&id)
    }

    /// Id of the definition currently holding `code`
    #[must_use]
    pub fn definition_code_owner(&self, code: &str) -> Option<EntityId> {
        self.definition_codes.get(code).map(|entry| entry.value().clone())
    }

    pub fn remove_definition(&self, id: &EntityId) -> Option<AttributeDefinition> {
        let (_, removed) = self.definitions.remove(id)?;
        self.definition_codes.remove(&removed.code);
        debug!("Removed definition: {}", removed.code);
        Some(removed)
    }

    /// All definitions, sorted by code
    #[must_use]
    pub fn definitions(&self) -> Vec<AttributeDefinition> {
        let mut all: Vec<_> = self.definitions.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        all
    }

    /// Insert or replace a group, returning the previous version
    pub fn register_group(&self, group: AttributeGroup) -> Option<AttributeGroup> {
        trace!("Registering group: {} ({})", group.code, group.id);
        let previous = self.groups.insert(group.id.clone(), group.clone());
        if let Some(old) = &previous {
            if old.code != group.code {
                self.group_codes.remove(&old.code);
            }
        }
        self.group_codes.insert(group.code.clone(), group.id);
        previous
    }

    #[must_use]
    pub fn get_group(&self, id: &EntityId) -> Option<AttributeGroup> {
        self.groups.get(id).map(|entry| entry.value().clone())
    }

    /// Id of the group currently holding `code`
    #[must_use]
    pub fn group_code_owner(&self, code: &str) -> Option<EntityId> {
        self.group_codes.get(code).map(|entry| entry.value().clone())
    }

    pub fn remove_group(&self, id: &EntityId) -> Option<AttributeGroup> {
        let (_, removed) = self.groups.remove(id)?;
        self.group_codes.remove(&removed.code);
        debug!("Removed group: {}", removed.code);
        Some(removed)
    }

    /// All groups, sorted by code
    #[must_use]
    pub fn groups(&self) -> Vec<AttributeGroup> {
        let mut all: Vec<_> = self.groups.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        all
    }

    /// Ids of groups that list the definition
    #[must_use]
    pub fn groups_containing(&self, definition: &EntityId) -> Vec<EntityId> {
        let mut ids: Vec<_> = self
            .groups
            .iter()
            .filter(|entry| entry.value().contains(definition))
            .map(|entry| entry.key().clone())
            .collect();
        ids.sort();
        ids
    }

    /// Resolve groups with their definitions
    ///
    /// Follows the order of `ids`. Unknown group ids and dangling definition
    /// ids are skipped.
    #[must_use]
    pub fn populate(&self, ids: &[EntityId]) -> Vec<PopulatedGroup> {
        ids.iter()
            .filter_map(|id| {
                let Some(group) = self.get_group(id) else {
                    trace!("Skipping unknown group: {}", id);
                    return None;
                };
                let definitions = group
                    .attributes
                    .iter()
                    .filter_map(|def_id| self.get_definition(def_id))
                    .collect();
                Some(PopulatedGroup { group, definitions })
            })
            .collect()
    }
}
