//! Entity attribute normalization
//!
//! [`normalize`] turns the attribute values supplied with an entity write into
//! the map that gets stored. Checks run in phases across the whole definition
//! set, so every unknown key is caught before any required check, and so on:
//!
//! 1. unknown keys
//! 2. required attributes (create only)
//! 3. readonly immutability (update only)
//! 4. value rules for every provided key
//!
//! The first violation aborts; there is no partial result.

use crate::rules::validate_value;
use crate::{Error, Result};
use mdm_ir::AttributeMap;
use mdm_schema::DefinitionSet;

/// Whether the write creates the entity or updates a stored one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    Create,
    Update,
}

impl WriteMode {
    #[must_use]
    pub fn is_update(self) -> bool {
        self == WriteMode::Update
    }
}

/// Validate `provided` against `definitions` and merge it over `existing`
///
/// The result starts from `existing`, takes every provided key on top, then
/// fills defaults for definitions that still have no value. Normalizing an
/// already normalized map with nothing provided returns it unchanged.
///
/// # Errors
///
/// - [`Error::UnknownAttribute`] for a provided key with no definition
/// - [`Error::MissingRequired`] on create for a required attribute that is
///   neither provided, existing, nor defaulted
/// - [`Error::Readonly`] on update when a readonly value would change
/// - [`Error::Value`] when a provided value breaks its definition's rules
pub fn normalize(
    definitions: &DefinitionSet,
    provided: &AttributeMap,
    existing: &AttributeMap,
    mode: WriteMode,
) -> Result<AttributeMap> {
    if let Some(unknown) = provided.keys().find(|code| !definitions.contains(code)) {
        return Err(Error::UnknownAttribute {
            code: unknown.clone(),
        });
    }

    if mode == WriteMode::Create {
        let missing = definitions.iter().find(|def| {
            def.required
                && !provided.contains_key(&def.code)
                && !existing.contains_key(&def.code)
                && def.default_value.is_none()
        });
        if let Some(def) = missing {
            return Err(Error::MissingRequired {
                code: def.code.clone(),
            });
        }
    }

    if mode.is_update() {
        for def in definitions.iter().filter(|def| def.is_readonly()) {
            if let (Some(before), Some(after)) = (existing.get(&def.code), provided.get(&def.code)) {
                if before != after {
                    return Err(Error::Readonly {
                        code: def.code.clone(),
                    });
                }
            }
        }
    }

    for def in definitions {
        if let Some(value) = provided.get(&def.code) {
            validate_value(def, value)?;
        }
    }

    let mut normalized = existing.clone();
    normalized.extend(provided.iter().map(|(k, v)| (k.clone(), v.clone())));
    for def in definitions {
        if let Some(default) = &def.default_value {
            normalized
                .entry(def.code.clone())
                .or_insert_with(|| default.clone());
        }
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdm_ir::Value;
    use mdm_schema::{AttributeDefinition, AttributeKind};
    use serde_json::json;

    fn map(value: serde_json::Value) -> AttributeMap {
        Value::from(value).into_map().unwrap()
    }

    fn def(code: &str, kind: AttributeKind, config: serde_json::Value) -> AttributeDefinition {
        AttributeDefinition::parse(code, code, kind, &Value::from(config)).unwrap()
    }

    fn sample() -> DefinitionSet {
        vec![
            def("name", AttributeKind::Text, json!({"maxLength": 20})).with_required(true),
            def("weight", AttributeKind::Number, json!({"min": 0})).with_default(1),
            def("created_label", AttributeKind::ReadOnly, json!({})),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_create_fills_defaults() {
        let out = normalize(&sample(), &map(json!({"name": "Shirt"})), &AttributeMap::new(), WriteMode::Create)
            .unwrap();
        assert_eq!(out, map(json!({"name": "Shirt", "weight": 1})));
    }

    #[test]
    fn test_unknown_key_wins_over_other_failures() {
        let err = normalize(
            &sample(),
            &map(json!({"nonexistent_code": 1, "weight": -5})),
            &AttributeMap::new(),
            WriteMode::Create,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownAttribute { ref code } if code == "nonexistent_code"));
    }

    #[test]
    fn test_missing_required_on_create() {
        let err = normalize(&sample(), &AttributeMap::new(), &AttributeMap::new(), WriteMode::Create)
            .unwrap_err();
        assert!(matches!(err, Error::MissingRequired { ref code } if code == "name"));
    }

    #[test]
    fn test_required_satisfied_by_existing_or_skipped_on_update() {
        let existing = map(json!({"name": "Shirt"}));
        assert!(normalize(&sample(), &AttributeMap::new(), &existing, WriteMode::Create).is_ok());
        assert!(normalize(&sample(), &AttributeMap::new(), &AttributeMap::new(), WriteMode::Update).is_ok());
    }

    #[test]
    fn test_required_check_precedes_value_check() {
        let err = normalize(&sample(), &map(json!({"weight": -1})), &AttributeMap::new(), WriteMode::Create)
            .unwrap_err();
        assert!(matches!(err, Error::MissingRequired { .. }));
    }

    #[test]
    fn test_readonly_cannot_change_on_update() {
        let existing = map(json!({"name": "Shirt", "created_label": "x"}));

        let err = normalize(&sample(), &map(json!({"created_label": "y"})), &existing, WriteMode::Update)
            .unwrap_err();
        assert!(matches!(err, Error::Readonly { ref code } if code == "created_label"));

        let out = normalize(&sample(), &map(json!({"created_label": "x"})), &existing, WriteMode::Update)
            .unwrap();
        assert_eq!(out["created_label"], Value::from("x"));
    }

    #[test]
    fn test_readonly_may_be_set_when_absent() {
        let out = normalize(
            &sample(),
            &map(json!({"created_label": "first"})),
            &map(json!({"name": "Shirt"})),
            WriteMode::Update,
        )
        .unwrap();
        assert_eq!(out["created_label"], Value::from("first"));
    }

    #[test]
    fn test_value_failure_names_attribute() {
        let err = normalize(
            &sample(),
            &map(json!({"name": "Shirt", "weight": -1})),
            &AttributeMap::new(),
            WriteMode::Create,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Value { ref code, .. } if code == "weight"));
    }

    #[test]
    fn test_provided_overrides_existing() {
        let existing = map(json!({"name": "Old", "weight": 3}));
        let out = normalize(&sample(), &map(json!({"name": "New"})), &existing, WriteMode::Update).unwrap();
        assert_eq!(out, map(json!({"name": "New", "weight": 3})));
    }
}
