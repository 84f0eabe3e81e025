//! Entity write services
//!
//! [`CatalogService`] wraps a [`Repository`] and enforces the write rules for
//! every entity kind: referenced entities must exist, attribute values are
//! normalized against the applicable definitions, ancestor chains are kept
//! current, and deletes are refused while anything still points at the
//! target.
//!
//! Owner fields (an item type's default category, a category's item type, a
//! family's category) are mirrored as `belongs_to` associations.

use crate::hierarchy::{StoredNode, compute_ancestors, propagate_ancestors};
use crate::policies::EngineConfig;
use crate::resolver::{ResolvedSchema, resolve};
use crate::{Error, Result};
use mdm_ir::{
    Association, AttributeMap, BELONGS_TO, Category, EntityId, EntityKind, EntityRef, Family,
    HierarchyNode, Item, ItemType, TreeNode, build_tree,
};
use mdm_schema::{
    AttributeDefinition, AttributeGroup, DefinitionSet, RawAttributeDefinition, merge_groups,
};
use mdm_store::{AssociationFilter, Repository};
use mdm_validation::{WriteMode, check_definition, normalize, validate_definition};
use serde::Deserialize;
use tracing::{debug, info};

/// Changes to an item type; `None` leaves a field as stored
#[derive(Debug, Clone, Default)]
pub struct ItemTypeUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` clears the default category
    pub category: Option<Option<EntityId>>,
    pub attribute_groups: Option<Vec<EntityId>>,
    pub attributes: Option<AttributeMap>,
}

/// Changes to a category; `None` leaves a field as stored
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    /// `Some(None)` makes the category a root
    pub parent: Option<Option<EntityId>>,
    pub item_type: Option<Option<EntityId>>,
    pub attribute_groups: Option<Vec<EntityId>>,
    pub attributes: Option<AttributeMap>,
}

/// Changes to a family; `None` leaves a field as stored
#[derive(Debug, Clone, Default)]
pub struct FamilyUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    /// `Some(None)` makes the family a root
    pub parent: Option<Option<EntityId>>,
    pub category: Option<Option<EntityId>>,
    pub attribute_groups: Option<Vec<EntityId>>,
    pub attributes: Option<AttributeMap>,
}

/// A new item; the category may be left to the item type's default
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    pub item_type: EntityId,
    #[serde(default)]
    pub category: Option<EntityId>,
    #[serde(default)]
    pub family: Option<EntityId>,
    #[serde(default)]
    pub attributes: AttributeMap,
    #[serde(default)]
    pub metadata: AttributeMap,
}

impl From<Item> for NewItem {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            code: item.code,
            name: item.name,
            item_type: item.item_type,
            category: Some(item.category),
            family: item.family,
            attributes: item.attributes,
            metadata: item.metadata,
        }
    }
}

/// Changes to an item; `None` leaves a field as stored
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    pub item_type: Option<EntityId>,
    pub category: Option<EntityId>,
    /// `Some(None)` detaches the family
    pub family: Option<Option<EntityId>>,
    pub attributes: Option<AttributeMap>,
    pub metadata: Option<AttributeMap>,
}

/// Write services over a repository
pub struct CatalogService<R> {
    repo: R,
    config: EngineConfig,
}

impl<R: Repository> CatalogService<R> {
    pub fn new(repo: R, config: EngineConfig) -> Self {
        Self { repo, config }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // Definitions and groups

    /// Parse, check, and store a definition from its wire form
    ///
    /// # Errors
    ///
    /// Structural config errors, an invalid default, or a duplicate code.
    pub async fn save_raw_definition(
        &self,
        raw: RawAttributeDefinition,
    ) -> Result<AttributeDefinition> {
        let definition = validate_definition(raw)?;
        self.repo.save_definition(definition.clone()).await?;
        Ok(definition)
    }

    /// Check the default value and store a definition
    ///
    /// # Errors
    ///
    /// An invalid default or a duplicate code.
    pub async fn save_definition(&self, definition: AttributeDefinition) -> Result<()> {
        check_definition(&definition)?;
        self.repo.save_definition(definition).await?;
        Ok(())
    }

    /// Delete a definition that no group lists
    ///
    /// # Errors
    ///
    /// [`Error::Store`] when a group still lists it or it does not exist.
    pub async fn delete_definition(&self, id: &EntityId) -> Result<()> {
        self.repo.delete(EntityKind::AttributeDefinition, id).await?;
        Ok(())
    }

    /// Store a group whose definitions all exist
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for an unknown definition id, or a duplicate code.
    pub async fn save_group(&self, group: AttributeGroup) -> Result<()> {
        for id in &group.attributes {
            if self.repo.find_definition(id).await?.is_none() {
                return Err(Error::not_found(EntityKind::AttributeDefinition, id.clone()));
            }
        }
        self.repo.save_group(group).await?;
        Ok(())
    }

    /// Delete an empty, unreferenced group
    ///
    /// # Errors
    ///
    /// [`Error::InUse`] while the group lists definitions; [`Error::Store`]
    /// while entities still attach it.
    pub async fn delete_group(&self, id: &EntityId) -> Result<()> {
        let group = self
            .repo
            .find_group(id)
            .await?
            .ok_or_else(|| Error::not_found(EntityKind::AttributeGroup, id.clone()))?;
        if !group.attributes.is_empty() {
            return Err(Error::InUse {
                entity: EntityKind::AttributeGroup,
                id: id.clone(),
                reason: format!("group still lists {} definitions", group.attributes.len()),
            });
        }
        self.repo.delete(EntityKind::AttributeGroup, id).await?;
        Ok(())
    }

    /// Merged definitions of the given groups, in order
    ///
    /// # Errors
    ///
    /// [`Error::Schema`] for a conflicting duplicate code.
    pub async fn definitions_for_groups(&self, group_ids: &[EntityId]) -> Result<DefinitionSet> {
        let populated = self.repo.find_attribute_groups_by_ids(group_ids).await?;
        Ok(merge_groups(
            &populated,
            self.config.conflict_policy,
            self.config.include_inactive,
        )?)
    }

    async fn normalize_for_groups(
        &self,
        group_ids: &[EntityId],
        provided: &AttributeMap,
        existing: &AttributeMap,
        mode: WriteMode,
    ) -> Result<AttributeMap> {
        let definitions = self.definitions_for_groups(group_ids).await?;
        Ok(normalize(&definitions, provided, existing, mode)?)
    }

    // Item types

    /// Create an item type
    ///
    /// Attributes are normalized against the item type's own groups.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyExists`], [`Error::NotFound`] for a missing default
    /// category, or a normalization failure.
    pub async fn create_item_type(&self, mut item_type: ItemType) -> Result<ItemType> {
        if self.repo.find_item_type(&item_type.id).await?.is_some() {
            return Err(Error::AlreadyExists {
                entity: EntityKind::ItemType,
                id: item_type.id,
            });
        }
        if let Some(category) = &item_type.category {
            self.require_category(category).await?;
        }

        item_type.attributes = self
            .normalize_for_groups(
                &item_type.attribute_groups,
                &item_type.attributes,
                &AttributeMap::new(),
                WriteMode::Create,
            )
            .await?;

        self.repo.save_item_type(item_type.clone()).await?;
        self.link_owner(
            EntityRef::item_type(item_type.id.clone()),
            item_type.category.clone().map(EntityRef::category),
        )
        .await?;
        info!("Created item type {}", item_type.code);
        Ok(item_type)
    }

    /// Update an item type
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for the item type or a new default category, or a
    /// normalization failure.
    pub async fn update_item_type(&self, id: &EntityId, update: ItemTypeUpdate) -> Result<ItemType> {
        let mut item_type = self
            .repo
            .find_item_type(id)
            .await?
            .ok_or_else(|| Error::not_found(EntityKind::ItemType, id.clone()))?;

        if let Some(code) = update.code {
            item_type.code = code;
        }
        if let Some(name) = update.name {
            item_type.name = name;
        }
        if let Some(description) = update.description {
            item_type.description = description;
        }
        let owner_changed = update.category.is_some();
        if let Some(category) = update.category {
            if let Some(category_id) = &category {
                self.require_category(category_id).await?;
            }
            item_type.category = category;
        }
        if update.attribute_groups.is_some() || update.attributes.is_some() {
            if let Some(groups) = update.attribute_groups {
                item_type.attribute_groups = groups;
            }
            item_type.attributes = self
                .normalize_for_groups(
                    &item_type.attribute_groups,
                    &update.attributes.unwrap_or_default(),
                    &item_type.attributes,
                    WriteMode::Update,
                )
                .await?;
        }

        self.repo.save_item_type(item_type.clone()).await?;
        if owner_changed {
            self.link_owner(
                EntityRef::item_type(item_type.id.clone()),
                item_type.category.clone().map(EntityRef::category),
            )
            .await?;
        }
        debug!("Updated item type {}", item_type.code);
        Ok(item_type)
    }

    /// Delete an item type nothing references
    ///
    /// # Errors
    ///
    /// [`Error::Store`] while categories or items reference it.
    pub async fn delete_item_type(&self, id: &EntityId) -> Result<()> {
        self.repo.delete(EntityKind::ItemType, id).await?;
        Ok(())
    }

    // Categories

    /// Create a category under its parent
    ///
    /// Attribute values cannot be supplied on create.
    ///
    /// # Errors
    ///
    /// [`Error::AttributesOnCreate`], [`Error::AlreadyExists`],
    /// [`Error::NotFound`] for a missing item type, or
    /// [`Error::ParentNotFound`].
    pub async fn create_category(&self, mut category: Category) -> Result<Category> {
        self.prepare_node(&mut category).await?;
        if let Some(item_type) = &category.item_type {
            self.require_item_type(item_type).await?;
        }

        self.repo.save_category(category.clone()).await?;
        self.link_owner(
            EntityRef::category(category.id.clone()),
            category.item_type.clone().map(EntityRef::item_type),
        )
        .await?;
        info!("Created category {}", category.code);
        Ok(category)
    }

    /// Update a category, moving its subtree when the parent changes
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`], [`Error::ParentNotFound`],
    /// [`Error::CycleDetected`], or a normalization failure.
    pub async fn update_category(&self, id: &EntityId, update: CategoryUpdate) -> Result<Category> {
        let mut category = self
            .repo
            .find_category(id)
            .await?
            .ok_or_else(|| Error::not_found(EntityKind::Category, id.clone()))?;

        if let Some(code) = update.code {
            category.code = code;
        }
        if let Some(name) = update.name {
            category.name = name;
        }
        let owner_changed = update.item_type.is_some();
        if let Some(item_type) = update.item_type {
            if let Some(item_type_id) = &item_type {
                self.require_item_type(item_type_id).await?;
            }
            category.item_type = item_type;
        }
        if update.attribute_groups.is_some() || update.attributes.is_some() {
            if let Some(groups) = update.attribute_groups {
                category.attribute_groups = groups;
            }
            category.attributes = self
                .normalize_for_groups(
                    &category.attribute_groups,
                    &update.attributes.unwrap_or_default(),
                    &category.attributes,
                    WriteMode::Update,
                )
                .await?;
        }

        let moved = self.apply_parent(&mut category, update.parent).await?;
        self.repo.save_category(category.clone()).await?;
        if moved {
            propagate_ancestors(&self.repo, &category).await?;
        }
        if owner_changed {
            self.link_owner(
                EntityRef::category(category.id.clone()),
                category.item_type.clone().map(EntityRef::item_type),
            )
            .await?;
        }
        debug!("Updated category {}", category.code);
        Ok(category)
    }

    /// Delete a category with no children, families, or items
    ///
    /// # Errors
    ///
    /// [`Error::Store`] while anything references it.
    pub async fn delete_category(&self, id: &EntityId) -> Result<()> {
        self.repo.delete(EntityKind::Category, id).await?;
        Ok(())
    }

    // Families

    /// Create a family under its parent
    ///
    /// # Errors
    ///
    /// Same as [`CatalogService::create_category`], with the owning category
    /// in place of the item type.
    pub async fn create_family(&self, mut family: Family) -> Result<Family> {
        self.prepare_node(&mut family).await?;
        if let Some(category) = &family.category {
            self.require_category(category).await?;
        }

        self.repo.save_family(family.clone()).await?;
        self.link_owner(
            EntityRef::family(family.id.clone()),
            family.category.clone().map(EntityRef::category),
        )
        .await?;
        info!("Created family {}", family.code);
        Ok(family)
    }

    /// Update a family, moving its subtree when the parent changes
    ///
    /// # Errors
    ///
    /// Same as [`CatalogService::update_category`].
    pub async fn update_family(&self, id: &EntityId, update: FamilyUpdate) -> Result<Family> {
        let mut family = self
            .repo
            .find_family(id)
            .await?
            .ok_or_else(|| Error::not_found(EntityKind::Family, id.clone()))?;

        if let Some(code) = update.code {
            family.code = code;
        }
        if let Some(name) = update.name {
            family.name = name;
        }
        let owner_changed = update.category.is_some();
        if let Some(category) = update.category {
            if let Some(category_id) = &category {
                self.require_category(category_id).await?;
            }
            family.category = category;
        }
        if update.attribute_groups.is_some() || update.attributes.is_some() {
            if let Some(groups) = update.attribute_groups {
                family.attribute_groups = groups;
            }
            family.attributes = self
                .normalize_for_groups(
                    &family.attribute_groups,
                    &update.attributes.unwrap_or_default(),
                    &family.attributes,
                    WriteMode::Update,
                )
                .await?;
        }

        let moved = self.apply_parent(&mut family, update.parent).await?;
        self.repo.save_family(family.clone()).await?;
        if moved {
            propagate_ancestors(&self.repo, &family).await?;
        }
        if owner_changed {
            self.link_owner(
                EntityRef::family(family.id.clone()),
                family.category.clone().map(EntityRef::category),
            )
            .await?;
        }
        debug!("Updated family {}", family.code);
        Ok(family)
    }

    /// Delete a family with no children or items
    ///
    /// # Errors
    ///
    /// [`Error::Store`] while anything references it.
    pub async fn delete_family(&self, id: &EntityId) -> Result<()> {
        self.repo.delete(EntityKind::Family, id).await?;
        Ok(())
    }

    // Items

    /// Preview the effective schema for an item without writing anything
    ///
    /// # Errors
    ///
    /// See [`resolve`].
    pub async fn resolve_item_schema(
        &self,
        item_type: &EntityId,
        category: Option<&EntityId>,
        family: Option<&EntityId>,
    ) -> Result<ResolvedSchema> {
        resolve(&self.repo, &self.config, item_type, category, family).await
    }

    /// Create an item with attributes normalized against its resolved schema
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyExists`], any resolution error, or a normalization
    /// failure.
    pub async fn create_item(&self, new: NewItem) -> Result<Item> {
        if self.repo.find_item(&new.id).await?.is_some() {
            return Err(Error::AlreadyExists {
                entity: EntityKind::Item,
                id: new.id,
            });
        }

        let schema = self
            .resolve_item_schema(&new.item_type, new.category.as_ref(), new.family.as_ref())
            .await?;
        let attributes = normalize(
            &schema.definitions,
            &new.attributes,
            &AttributeMap::new(),
            WriteMode::Create,
        )?;

        let item = Item {
            id: new.id,
            code: new.code,
            name: new.name,
            item_type: schema.item_type.id,
            category: schema.category.id,
            family: schema.family.map(|f| f.id),
            attributes,
            metadata: new.metadata,
        };
        self.repo.save_item(item.clone()).await?;
        info!("Created item {}", item.code);
        Ok(item)
    }

    /// Update an item, re-checking containment for the resulting classification
    ///
    /// Attributes are only re-normalized when supplied.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`], any resolution error, or a normalization failure.
    pub async fn update_item(&self, id: &EntityId, update: ItemUpdate) -> Result<Item> {
        let mut item = self
            .repo
            .find_item(id)
            .await?
            .ok_or_else(|| Error::not_found(EntityKind::Item, id.clone()))?;

        let item_type = update.item_type.unwrap_or_else(|| item.item_type.clone());
        let category = update.category.unwrap_or_else(|| item.category.clone());
        let family = update.family.unwrap_or_else(|| item.family.clone());

        let schema = self
            .resolve_item_schema(&item_type, Some(&category), family.as_ref())
            .await?;

        if let Some(provided) = update.attributes {
            item.attributes =
                normalize(&schema.definitions, &provided, &item.attributes, WriteMode::Update)?;
        }
        if let Some(code) = update.code {
            item.code = code;
        }
        if let Some(name) = update.name {
            item.name = name;
        }
        if let Some(metadata) = update.metadata {
            item.metadata = metadata;
        }
        item.item_type = item_type;
        item.category = category;
        item.family = family;

        self.repo.save_item(item.clone()).await?;
        debug!("Updated item {}", item.code);
        Ok(item)
    }

    /// # Errors
    ///
    /// [`Error::Store`] when the item does not exist.
    pub async fn delete_item(&self, id: &EntityId) -> Result<()> {
        self.repo.delete(EntityKind::Item, id).await?;
        Ok(())
    }

    // Associations

    /// Link two item types, categories, or families
    ///
    /// # Errors
    ///
    /// [`Error::InvalidAssociation`] for an end that is not an item type,
    /// category, or family, or for a self-link; [`Error::NotFound`] for a
    /// missing end; [`Error::AlreadyExists`] for a used id; [`Error::Store`]
    /// when the same ends are already linked with the same kind.
    pub async fn create_association(&self, association: Association) -> Result<Association> {
        if self.repo.find_association(&association.id).await?.is_some() {
            return Err(Error::AlreadyExists {
                entity: EntityKind::Association,
                id: association.id,
            });
        }
        for end in [&association.from, &association.to] {
            if !end.entity.is_linkable() {
                return Err(Error::InvalidAssociation(format!(
                    "{} cannot be associated",
                    end.entity
                )));
            }
        }
        if association.from == association.to {
            return Err(Error::InvalidAssociation(
                "Self-association is not allowed".to_string(),
            ));
        }
        self.require_end(&association.from).await?;
        self.require_end(&association.to).await?;

        self.repo.save_association(association.clone()).await?;
        info!(
            "Created association {} -[{}]-> {}",
            association.from, association.kind, association.to
        );
        Ok(association)
    }

    /// Associations matching `filter`, ordered by id
    ///
    /// # Errors
    ///
    /// Storage failures.
    pub async fn list_associations(&self, filter: &AssociationFilter) -> Result<Vec<Association>> {
        Ok(self.repo.find_associations(filter).await?)
    }

    /// # Errors
    ///
    /// [`Error::NotFound`] when no association has this id.
    pub async fn get_association(&self, id: &EntityId) -> Result<Association> {
        self.repo
            .find_association(id)
            .await?
            .ok_or_else(|| Error::not_found(EntityKind::Association, id.clone()))
    }

    /// # Errors
    ///
    /// [`Error::Store`] when the association does not exist.
    pub async fn delete_association(&self, id: &EntityId) -> Result<()> {
        self.repo.delete_association(id).await?;
        Ok(())
    }

    // Trees

    /// All categories nested by parent
    ///
    /// # Errors
    ///
    /// Storage failures.
    pub async fn category_tree(&self) -> Result<Vec<TreeNode<Category>>> {
        Ok(build_tree(&self.repo.list_categories().await?))
    }

    /// All families nested by parent
    ///
    /// # Errors
    ///
    /// Storage failures.
    pub async fn family_tree(&self) -> Result<Vec<TreeNode<Family>>> {
        Ok(build_tree(&self.repo.list_families().await?))
    }

    // Shared helpers

    /// Checks for a new tree node: no attributes, unused id, ancestors from parent
    async fn prepare_node<N: StoredNode>(&self, node: &mut N) -> Result<()>
    where
        N: NodeAttributes,
    {
        if !node.attributes().is_empty() {
            return Err(Error::AttributesOnCreate { entity: N::KIND });
        }
        if N::load(&self.repo, node.id()).await?.is_some() {
            return Err(Error::AlreadyExists {
                entity: N::KIND,
                id: node.id().clone(),
            });
        }
        let ancestors = compute_ancestors::<N, R>(&self.repo, node.id(), node.parent()).await?;
        node.set_ancestors(ancestors);
        Ok(())
    }

    /// Apply a parent change and recompute ancestors; returns whether it moved
    async fn apply_parent<N>(&self, node: &mut N, parent: Option<Option<EntityId>>) -> Result<bool>
    where
        N: StoredNode + NodeAttributes,
    {
        let Some(parent) = parent else {
            return Ok(false);
        };
        if parent.as_ref() == node.parent() {
            return Ok(false);
        }
        let ancestors = compute_ancestors::<N, R>(&self.repo, node.id(), parent.as_ref()).await?;
        node.set_parent(parent);
        node.set_ancestors(ancestors);
        Ok(true)
    }

    /// Replace the `belongs_to` links leaving `from` with one to `owner`
    async fn link_owner(&self, from: EntityRef, owner: Option<EntityRef>) -> Result<()> {
        let current = self
            .repo
            .find_associations(&AssociationFilter::outgoing(&from).with_kind(BELONGS_TO))
            .await?;

        let mut linked = false;
        for link in current {
            if owner.as_ref() == Some(&link.to) {
                linked = true;
            } else {
                self.repo.delete_association(&link.id).await?;
            }
        }
        if let Some(owner) = owner.filter(|_| !linked) {
            self.repo.save_association(Association::belongs_to(from, owner)).await?;
        }
        Ok(())
    }

    async fn require_end(&self, end: &EntityRef) -> Result<()> {
        match end.entity {
            EntityKind::ItemType => self.require_item_type(&end.id).await,
            EntityKind::Category => self.require_category(&end.id).await,
            EntityKind::Family => match self.repo.find_family(&end.id).await? {
                Some(_) => Ok(()),
                None => Err(Error::not_found(EntityKind::Family, end.id.clone())),
            },
            other => Err(Error::InvalidAssociation(format!("{other} cannot be associated"))),
        }
    }

    async fn require_item_type(&self, id: &EntityId) -> Result<()> {
        match self.repo.find_item_type(id).await? {
            Some(_) => Ok(()),
            None => Err(Error::not_found(EntityKind::ItemType, id.clone())),
        }
    }

    async fn require_category(&self, id: &EntityId) -> Result<()> {
        match self.repo.find_category(id).await? {
            Some(_) => Ok(()),
            None => Err(Error::not_found(EntityKind::Category, id.clone())),
        }
    }
}

/// Mutable access to the fields that differ between tree node kinds
pub(crate) trait NodeAttributes {
    fn attributes(&self) -> &AttributeMap;
    fn set_parent(&mut self, parent: Option<EntityId>);
}

impl NodeAttributes for Category {
    fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    fn set_parent(&mut self, parent: Option<EntityId>) {
        self.parent = parent;
    }
}

impl NodeAttributes for Family {
    fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    fn set_parent(&mut self, parent: Option<EntityId>) {
        self.parent = parent;
    }
}
