//! Merging of attribute groups into one effective definition set
//!
//! Groups arrive in precedence order (item type, category ancestors root to
//! leaf, category, family ancestors root to leaf, family). Definitions are
//! taken in that order and the first definition seen for a code wins.

use crate::model::{DefinitionSet, PopulatedGroup};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What to do when two groups define the same code with different kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Fail the merge
    #[default]
    Reject,
    /// Keep the earlier definition
    FirstWins,
}

/// Merge populated groups into an ordered, code-unique definition set
///
/// Same-kind duplicates always resolve to the first definition. Inactive
/// definitions are skipped unless `include_inactive` is set.
///
/// # Errors
///
/// [`Error::Conflict`] for a duplicate code with a different kind under
/// [`ConflictPolicy::Reject`].
pub fn merge_groups(
    groups: &[PopulatedGroup],
    policy: ConflictPolicy,
    include_inactive: bool,
) -> Result<DefinitionSet> {
    let mut merged = DefinitionSet::new();
    let mut origin: HashMap<String, &str> = HashMap::new();

    for populated in groups {
        let group_code = populated.group.code.as_str();

        for definition in &populated.definitions {
            if !definition.active && !include_inactive {
                continue;
            }

            match merged.get(&definition.code) {
                Some(first) if first.kind() != definition.kind() => {
                    if policy == ConflictPolicy::Reject {
                        return Err(Error::Conflict {
                            code: definition.code.clone(),
                            first: first.kind(),
                            first_group: origin
                                .get(&definition.code)
                                .copied()
                                .unwrap_or_default()
                                .to_string(),
                            second: definition.kind(),
                            second_group: group_code.to_string(),
                        });
                    }
                }
                Some(_) => {}
                None => {
                    origin.insert(definition.code.clone(), group_code);
                    merged.insert(definition.clone());
                }
            }
        }
    }

    Ok(merged)
}
