//! Engine policies and configuration

use mdm_schema::ConflictPolicy;
use serde::{Deserialize, Serialize};

/// How an item's category is chosen when the request names none
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryPolicy {
    /// A category must always be given
    Explicit,

    /// Use the item type's default category
    #[default]
    FallbackToItemType,
}

/// Settings for schema resolution and entity writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Category selection when an item names none
    pub category_policy: CategoryPolicy,
    /// Require a category to belong to the item's item type
    pub enforce_containment: bool,
    /// Duplicate codes with different kinds across merged groups
    pub conflict_policy: ConflictPolicy,
    /// Keep soft-disabled definitions in resolved schemas
    pub include_inactive: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            category_policy: CategoryPolicy::default(),
            enforce_containment: true,
            conflict_policy: ConflictPolicy::default(),
            include_inactive: false,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_category_policy(mut self, policy: CategoryPolicy) -> Self {
        self.category_policy = policy;
        self
    }

    #[must_use]
    pub fn with_containment(mut self, enforce: bool) -> Self {
        self.enforce_containment = enforce;
        self
    }

    #[must_use]
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    #[must_use]
    pub fn with_inactive(mut self, include: bool) -> Self {
        self.include_inactive = include;
        self
    }
}
