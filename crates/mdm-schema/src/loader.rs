//! Catalog loading from JSON and YAML files

use crate::model::{AttributeDefinition, AttributeGroup, RawAttributeDefinition};
use crate::{Error, Result};
use mdm_ir::{Association, Category, Family, Item, ItemType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

/// Everything a catalog file can carry
///
/// Definitions stay raw so a caller can report every bad definition instead
/// of failing on the first during deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Catalog {
    pub definitions: Vec<RawAttributeDefinition>,
    pub groups: Vec<AttributeGroup>,
    pub item_types: Vec<ItemType>,
    pub categories: Vec<Category>,
    pub families: Vec<Family>,
    pub items: Vec<Item>,
    pub associations: Vec<Association>,
}

impl Catalog {
    /// Parse every definition's kind and config
    ///
    /// # Errors
    ///
    /// The first structurally invalid definition.
    pub fn parse_definitions(&self) -> Result<Vec<AttributeDefinition>> {
        self.definitions
            .iter()
            .cloned()
            .map(AttributeDefinition::try_from)
            .collect()
    }

    /// Total number of records of all kinds
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
            + self.groups.len()
            + self.item_types.len()
            + self.categories.len()
            + self.families.len()
            + self.items.len()
            + self.associations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Finds and parses catalog files
pub struct CatalogLoader {
    search_paths: Vec<PathBuf>,
}

impl CatalogLoader {
    /// Create a loader with the given search paths
    #[must_use]
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// Load a catalog by name from the search paths
    ///
    /// Tries `<name>.json`, `<name>.yaml`, and `<name>.yml` in each path.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when no file matches, or the parse error.
    pub fn load(&self, name: &str) -> Result<Catalog> {
        let candidates = [
            format!("{name}.json"),
            format!("{name}.yaml"),
            format!("{name}.yml"),
        ];

        for path in &self.search_paths {
            for candidate in &candidates {
                let file_path = path.join(candidate);
                if file_path.exists() {
                    trace!("Found catalog file: {:?}", file_path);
                    return self.load_from_file(&file_path);
                }
            }
        }

        Err(Error::NotFound(format!("catalog '{name}'")))
    }

    /// Load a catalog from a specific file
    ///
    /// Files ending in `.yaml` or `.yml` are read as YAML, anything else as JSON.
    ///
    /// # Errors
    ///
    /// IO failures and parse errors.
    pub fn load_from_file(&self, path: &Path) -> Result<Catalog> {
        debug!("Loading catalog from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;

        let catalog = if path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml")
        {
            self.load_from_yaml(&content)?
        } else {
            self.load_from_json(&content)?
        };

        info!(
            "Loaded catalog {:?}: {} definitions, {} groups, {} item types, {} categories, {} families, {} items, {} associations",
            path,
            catalog.definitions.len(),
            catalog.groups.len(),
            catalog.item_types.len(),
            catalog.categories.len(),
            catalog.families.len(),
            catalog.items.len(),
            catalog.associations.len()
        );
        Ok(catalog)
    }

    /// Parse a catalog from JSON text
    ///
    /// # Errors
    ///
    /// [`Error::InvalidFormat`] on malformed JSON or shape mismatch.
    pub fn load_from_json(&self, json: &str) -> Result<Catalog> {
        serde_json::from_str(json)
            .map_err(|e| Error::InvalidFormat(format!("JSON parse error: {e}")))
    }

    /// Parse a catalog from YAML text
    ///
    /// # Errors
    ///
    /// [`Error::InvalidFormat`] on malformed YAML or shape mismatch.
    pub fn load_from_yaml(&self, yaml: &str) -> Result<Catalog> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::InvalidFormat(format!("YAML parse error: {e}")))
    }

    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

impl Default for CatalogLoader {
    fn default() -> Self {
        Self::new(vec![PathBuf::from(".")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::AttributeKind;
    use std::io::Write;

    const CATALOG_JSON: &str = r#"{
        "definitions": [
            {"id": "d1", "code": "weight", "name": "Weight", "type": "number", "config": {"min": 0}},
            {"id": "d2", "code": "size", "name": "Size", "type": "select",
             "config": {"options": [{"value": "s"}, {"value": "m"}]}}
        ],
        "groups": [{"id": "g1", "code": "basic", "name": "Basic", "attributes": ["d1", "d2"]}],
        "itemTypes": [{"id": "it1", "code": "product", "name": "Product", "attributeGroups": ["g1"]}],
        "categories": [{"id": "c1", "code": "root", "name": "Root", "itemType": "it1"}]
    }"#;

    const CATALOG_YAML: &str = r"
definitions:
  - id: d1
    code: color
    name: Color
    type: color
    config:
      format: hex
families:
  - id: f1
    code: shirts
    name: Shirts
    category: c1
";

    #[test]
    fn test_load_from_json() {
        let catalog = CatalogLoader::default().load_from_json(CATALOG_JSON).unwrap();

        assert_eq!(catalog.definitions.len(), 2);
        assert_eq!(catalog.groups[0].attributes.len(), 2);
        assert_eq!(catalog.item_types[0].attribute_groups[0].as_str(), "g1");
        assert_eq!(catalog.categories[0].item_type.as_ref().unwrap().as_str(), "it1");
        assert!(catalog.families.is_empty());
        assert_eq!(catalog.len(), 5);

        let definitions = catalog.parse_definitions().unwrap();
        assert_eq!(definitions[1].kind(), AttributeKind::Select);
    }

    #[test]
    fn test_load_from_yaml() {
        let catalog = CatalogLoader::default().load_from_yaml(CATALOG_YAML).unwrap();
        assert_eq!(catalog.definitions[0].kind, "color");
        assert_eq!(catalog.families[0].category.as_ref().unwrap().as_str(), "c1");
    }

    #[test]
    fn test_invalid_json_is_format_error() {
        let err = CatalogLoader::default().load_from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_parse_definitions_reports_bad_config() {
        let catalog = CatalogLoader::default()
            .load_from_json(
                r#"{"definitions": [{"id": "d", "code": "tags", "name": "Tags", "type": "array"}]}"#,
            )
            .unwrap();
        let err = catalog.parse_definitions().unwrap_err();
        assert!(matches!(err, Error::Config { ref field, .. } if field == "itemType"));
    }

    #[test]
    fn test_load_by_name_from_search_paths() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut file = std::fs::File::create(dir.path().join("apparel.yaml"))?;
        file.write_all(CATALOG_YAML.as_bytes())?;

        let loader = CatalogLoader::new(vec![dir.path().to_path_buf()]);
        let catalog = loader.load("apparel")?;
        assert_eq!(catalog.definitions.len(), 1);

        assert!(matches!(loader.load("missing"), Err(Error::NotFound(_))));
        Ok(())
    }

    #[test]
    fn test_load_from_json_file() -> anyhow::Result<()> {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
        file.write_all(CATALOG_JSON.as_bytes())?;

        let catalog = CatalogLoader::default().load_from_file(file.path())?;
        assert_eq!(catalog.groups.len(), 1);
        Ok(())
    }
}
