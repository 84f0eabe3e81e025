//! Write-service behavior: hierarchy upkeep, containment, normalization,
//! associations, and delete guards

use mdm_engine::{
    CatalogService, CategoryUpdate, EngineConfig, Error, ErrorKind, FamilyUpdate, ItemTypeUpdate,
    ItemUpdate, NewItem,
};
use mdm_ir::{
    Association, AttributeMap, BELONGS_TO, Category, EntityId, EntityKind, EntityRef, Family,
    ItemType, Value,
};
use mdm_schema::{AttributeDefinition, AttributeGroup, AttributeKind, RawAttributeDefinition};
use mdm_store::{AssociationFilter, MemoryStore, Repository};
use serde_json::json;

fn attrs(value: serde_json::Value) -> AttributeMap {
    Value::from(value).into_map().unwrap()
}

fn ids(list: &[EntityId]) -> Vec<&str> {
    list.iter().map(EntityId::as_str).collect()
}

/// Item type `product` with a required `name` and a bounded `weight`;
/// category `tools` allows it; category `food` belongs to `grocery`
async fn service() -> CatalogService<MemoryStore> {
    let service = CatalogService::new(MemoryStore::new(), EngineConfig::default());

    service
        .save_definition(
            AttributeDefinition::parse("d-name", "name", AttributeKind::Text, &Value::Null)
                .unwrap()
                .with_required(true),
        )
        .await
        .unwrap();
    service
        .save_definition(
            AttributeDefinition::parse(
                "d-weight",
                "weight",
                AttributeKind::Number,
                &json!({"min": 0, "max": 100}).into(),
            )
            .unwrap(),
        )
        .await
        .unwrap();
    service
        .save_group(AttributeGroup::new("g-basic", "basic", "Basic").with_attributes(["d-name", "d-weight"]))
        .await
        .unwrap();

    service
        .create_item_type(ItemType::new("product", "product", "Product").with_groups(["g-basic"]))
        .await
        .unwrap();
    service
        .create_item_type(ItemType::new("grocery", "grocery", "Grocery"))
        .await
        .unwrap();
    service
        .create_category(Category::new("tools", "tools", "Tools").with_item_type("product"))
        .await
        .unwrap();
    service
        .create_category(Category::new("food", "food", "Food").with_item_type("grocery"))
        .await
        .unwrap();
    service
}

#[tokio::test]
async fn test_create_category_computes_ancestors() {
    let service = service().await;
    service
        .create_category(Category::new("A", "a", "A").with_item_type("product"))
        .await
        .unwrap();
    service
        .create_category(Category::new("B", "b", "B").with_parent("A"))
        .await
        .unwrap();
    let c = service
        .create_category(Category::new("C", "c", "C").with_parent("B"))
        .await
        .unwrap();

    assert_eq!(ids(&c.ancestors), vec!["A", "B"]);
}

#[tokio::test]
async fn test_create_category_with_missing_parent() {
    let service = service().await;
    let err = service
        .create_category(Category::new("B", "b", "B").with_parent("ghost"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ParentNotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_create_category_rejects_attributes() {
    let service = service().await;
    let mut category = Category::new("X", "x", "X");
    category.attributes = attrs(json!({"name": "nope"}));

    let err = service.create_category(category).await.unwrap_err();
    assert!(matches!(err, Error::AttributesOnCreate { .. }));
    assert_eq!(err.kind(), ErrorKind::BadRequest);
}

#[tokio::test]
async fn test_create_duplicate_id() {
    let service = service().await;
    let err = service
        .create_category(Category::new("tools", "tools2", "Tools"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyExists { .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_moving_subtree_recomputes_descendants() {
    let service = service().await;
    for category in [
        Category::new("A", "a", "A"),
        Category::new("B", "b", "B").with_parent("A"),
        Category::new("C", "c", "C").with_parent("B"),
        Category::new("D", "d", "D").with_parent("C"),
        Category::new("X", "x", "X"),
    ] {
        service.create_category(category).await.unwrap();
    }

    let update = CategoryUpdate {
        parent: Some(Some("X".into())),
        ..CategoryUpdate::default()
    };
    let b = service.update_category(&"B".into(), update).await.unwrap();
    assert_eq!(ids(&b.ancestors), vec!["X"]);

    let repo = service.repository();
    let c = repo.find_category(&"C".into()).await.unwrap().unwrap();
    let d = repo.find_category(&"D".into()).await.unwrap().unwrap();
    assert_eq!(ids(&c.ancestors), vec!["X", "B"]);
    assert_eq!(ids(&d.ancestors), vec!["X", "B", "C"]);

    // Detaching makes B a root again
    let update = CategoryUpdate {
        parent: Some(None),
        ..CategoryUpdate::default()
    };
    service.update_category(&"B".into(), update).await.unwrap();
    let d = repo.find_category(&"D".into()).await.unwrap().unwrap();
    assert_eq!(ids(&d.ancestors), vec!["B", "C"]);
}

#[tokio::test]
async fn test_moving_under_own_subtree_is_rejected() {
    let service = service().await;
    for category in [
        Category::new("A", "a", "A"),
        Category::new("B", "b", "B").with_parent("A"),
        Category::new("C", "c", "C").with_parent("B"),
    ] {
        service.create_category(category).await.unwrap();
    }

    for parent in ["C", "A"] {
        let update = CategoryUpdate {
            parent: Some(Some(parent.into())),
            ..CategoryUpdate::default()
        };
        let err = service.update_category(&"A".into(), update).await.unwrap_err();
        assert!(matches!(err, Error::CycleDetected { .. }), "parent {parent}: {err}");
    }
}

#[tokio::test]
async fn test_family_tree_and_move() {
    let service = service().await;
    service
        .create_family(Family::new("F1", "f1", "F1").with_category("tools"))
        .await
        .unwrap();
    service
        .create_family(Family::new("F2", "f2", "F2").with_parent("F1"))
        .await
        .unwrap();
    service
        .create_family(Family::new("F3", "f3", "F3").with_parent("F2"))
        .await
        .unwrap();

    let tree = service.family_tree().await.unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(ids(&tree[0].preorder_ids()), vec!["F1", "F2", "F3"]);

    let update = FamilyUpdate {
        parent: Some(None),
        ..FamilyUpdate::default()
    };
    service.update_family(&"F2".into(), update).await.unwrap();
    let f3 = service.repository().find_family(&"F3".into()).await.unwrap().unwrap();
    assert_eq!(ids(&f3.ancestors), vec!["F2"]);
    assert_eq!(service.family_tree().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_item_normalizes_values() {
    let service = service().await;
    let item = service
        .create_item(NewItem {
            id: "i1".into(),
            code: "sku-1".into(),
            name: "Hammer".into(),
            item_type: "product".into(),
            category: Some("tools".into()),
            family: None,
            attributes: attrs(json!({"name": "Hammer", "weight": 1.5})),
            metadata: AttributeMap::new(),
        })
        .await
        .unwrap();

    assert_eq!(item.attributes.get("weight"), Some(&Value::from(1.5)));
    assert_eq!(item.category.as_str(), "tools");
}

#[tokio::test]
async fn test_create_item_value_errors() {
    let service = service().await;
    let new = |attributes: serde_json::Value| NewItem {
        id: "i1".into(),
        code: "sku-1".into(),
        name: "Hammer".into(),
        item_type: "product".into(),
        category: Some("tools".into()),
        family: None,
        attributes: attrs(attributes),
        metadata: AttributeMap::new(),
    };

    let err = service.create_item(new(json!({"weight": 5}))).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRequired);

    let err = service
        .create_item(new(json!({"name": "Hammer", "weight": 500})))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValueValidation);

    let err = service
        .create_item(new(json!({"name": "Hammer", "color": "red"})))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownAttribute);

    assert!(service.repository().list_items().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_containment_checked_before_values() {
    let service = service().await;
    let err = service
        .create_item(NewItem {
            id: "i1".into(),
            code: "sku-1".into(),
            name: "Apple".into(),
            item_type: "product".into(),
            category: Some("food".into()),
            family: None,
            attributes: attrs(json!({"bogus": true})),
            metadata: AttributeMap::new(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Containment);
}

#[tokio::test]
async fn test_update_item_rechecks_containment() {
    let service = service().await;
    service
        .create_item(NewItem {
            id: "i1".into(),
            code: "sku-1".into(),
            name: "Hammer".into(),
            item_type: "product".into(),
            category: Some("tools".into()),
            family: None,
            attributes: attrs(json!({"name": "Hammer"})),
            metadata: AttributeMap::new(),
        })
        .await
        .unwrap();

    let err = service
        .update_item(
            &"i1".into(),
            ItemUpdate {
                category: Some("food".into()),
                ..ItemUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Containment);

    let item = service
        .update_item(
            &"i1".into(),
            ItemUpdate {
                attributes: Some(attrs(json!({"weight": 7}))),
                ..ItemUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(item.attributes.get("name"), Some(&Value::from("Hammer")));
    assert_eq!(item.attributes.get("weight"), Some(&Value::from(7)));
}

#[tokio::test]
async fn test_category_attributes_on_update() {
    let service = service().await;
    let update = CategoryUpdate {
        attribute_groups: Some(vec!["g-basic".into()]),
        attributes: Some(attrs(json!({"weight": 3}))),
        ..CategoryUpdate::default()
    };

    let category = service.update_category(&"tools".into(), update).await.unwrap();
    assert_eq!(category.attributes.get("weight"), Some(&Value::from(3)));
}

#[tokio::test]
async fn test_item_type_default_category_must_exist() {
    let service = service().await;
    let err = service
        .create_item_type(ItemType::new("it2", "it2", "It2").with_category("ghost"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_save_raw_definition_rejects_bad_config() {
    let service = service().await;
    let raw = RawAttributeDefinition {
        id: "d-bad".into(),
        code: "bad".into(),
        name: "Bad".into(),
        description: None,
        kind: "number".into(),
        config: json!({"min": 10, "max": 1}).into(),
        required: false,
        default_value: None,
        active: true,
    };

    let err = service.save_raw_definition(raw).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralConfig);
}

#[tokio::test]
async fn test_save_group_requires_definitions() {
    let service = service().await;
    let err = service
        .save_group(AttributeGroup::new("g-x", "x", "X").with_attributes(["ghost"]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_delete_guards() {
    let service = service().await;

    // Group still lists definitions
    let err = service.delete_group(&"g-basic".into()).await.unwrap_err();
    assert!(matches!(err, Error::InUse { .. }));

    // Definition is listed by a group
    let err = service.delete_definition(&"d-name".into()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // Item type is referenced by a category
    let err = service.delete_item_type(&"grocery".into()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    service.delete_category(&"food".into()).await.unwrap();
    service.delete_item_type(&"grocery".into()).await.unwrap();

    let err = service.delete_category(&"food".into()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_empty_group_can_be_deleted() {
    let service = service().await;
    service
        .save_group(AttributeGroup::new("g-empty", "empty", "Empty"))
        .await
        .unwrap();
    service.delete_group(&"g-empty".into()).await.unwrap();
    assert!(service.repository().find_group(&"g-empty".into()).await.unwrap().is_none());
}

/// Adds a readonly `sku` in group `g-ident`
async fn with_sku(service: &CatalogService<MemoryStore>) {
    service
        .save_definition(
            AttributeDefinition::parse("d-sku", "sku", AttributeKind::ReadOnly, &Value::Null)
                .unwrap(),
        )
        .await
        .unwrap();
    service
        .save_group(AttributeGroup::new("g-ident", "ident", "Identity").with_attributes(["d-sku"]))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_item_type_attribute_errors() {
    let service = service().await;
    with_sku(&service).await;

    let first = ItemTypeUpdate {
        attribute_groups: Some(vec!["g-basic".into(), "g-ident".into()]),
        attributes: Some(attrs(json!({"sku": "P-1", "weight": 4}))),
        ..ItemTypeUpdate::default()
    };
    let product = service.update_item_type(&"product".into(), first).await.unwrap();
    assert_eq!(product.attributes.get("sku"), Some(&Value::from("P-1")));

    let unknown = ItemTypeUpdate {
        attributes: Some(attrs(json!({"colour": "red"}))),
        ..ItemTypeUpdate::default()
    };
    let err = service.update_item_type(&"product".into(), unknown).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownAttribute);

    let readonly = ItemTypeUpdate {
        attributes: Some(attrs(json!({"sku": "P-2"}))),
        ..ItemTypeUpdate::default()
    };
    let err = service.update_item_type(&"product".into(), readonly).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReadonlyViolation);

    // Resubmitting the stored value is not a change
    let same = ItemTypeUpdate {
        attributes: Some(attrs(json!({"sku": "P-1", "weight": 5}))),
        ..ItemTypeUpdate::default()
    };
    let product = service.update_item_type(&"product".into(), same).await.unwrap();
    assert_eq!(product.attributes.get("weight"), Some(&Value::from(5)));

    let stored = service.repository().find_item_type(&"product".into()).await.unwrap().unwrap();
    assert_eq!(stored.attributes.get("sku"), Some(&Value::from("P-1")));
}

#[tokio::test]
async fn test_update_family_attribute_errors() {
    let service = service().await;
    with_sku(&service).await;
    service
        .create_family(Family::new("hand", "hand", "Hand Tools").with_category("tools"))
        .await
        .unwrap();

    let first = FamilyUpdate {
        attribute_groups: Some(vec!["g-ident".into()]),
        attributes: Some(attrs(json!({"sku": "F-1"}))),
        ..FamilyUpdate::default()
    };
    service.update_family(&"hand".into(), first).await.unwrap();

    let unknown = FamilyUpdate {
        attributes: Some(attrs(json!({"weight": 3}))),
        ..FamilyUpdate::default()
    };
    let err = service.update_family(&"hand".into(), unknown).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownAttribute);

    let readonly = FamilyUpdate {
        attributes: Some(attrs(json!({"sku": "F-2"}))),
        ..FamilyUpdate::default()
    };
    let err = service.update_family(&"hand".into(), readonly).await.unwrap_err();
    assert!(matches!(err, Error::Validation(mdm_validation::Error::Readonly { ref code }) if code == "sku"));

    let stored = service.repository().find_family(&"hand".into()).await.unwrap().unwrap();
    assert_eq!(stored.attributes.get("sku"), Some(&Value::from("F-1")));
}

#[tokio::test]
async fn test_create_association_between_hierarchy_entities() -> anyhow::Result<()> {
    let service = service().await;
    let link = Association::new("a1", EntityRef::item_type("product"), EntityRef::category("food"))
        .with_kind("cross_sell")
        .with_metadata(attrs(json!({"weight": 2})));

    let created = service.create_association(link.clone()).await?;
    assert_eq!(created, link);
    assert_eq!(service.get_association(&"a1".into()).await?, link);

    let filter = AssociationFilter {
        to_id: Some("food".into()),
        kind: Some("cross_sell".into()),
        ..AssociationFilter::default()
    };
    assert_eq!(service.list_associations(&filter).await?, vec![link]);
    Ok(())
}

#[tokio::test]
async fn test_create_association_rejections() -> anyhow::Result<()> {
    let service = service().await;
    let product = EntityRef::item_type("product");

    let err = service
        .create_association(Association::new("a1", product.clone(), product.clone()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert!(err.to_string().contains("Self-association is not allowed"));

    let err = service
        .create_association(Association::new(
            "a1",
            product.clone(),
            EntityRef::new(EntityKind::Item, "i1"),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidAssociation(_)));

    let err = service
        .create_association(Association::new("a1", product.clone(), EntityRef::family("ghost")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { entity: EntityKind::Family, .. }));

    service
        .create_association(Association::new("a1", product.clone(), EntityRef::category("food")))
        .await?;
    let err = service
        .create_association(Association::new("a2", product.clone(), EntityRef::category("food")))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = service
        .create_association(Association::new("a1", product, EntityRef::category("tools")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyExists { entity: EntityKind::Association, .. }));
    Ok(())
}

#[tokio::test]
async fn test_owner_fields_mirrored_as_belongs_to() -> anyhow::Result<()> {
    let service = service().await;
    let owner_of = |from: EntityRef| AssociationFilter::outgoing(&from).with_kind(BELONGS_TO);

    let tools = service.list_associations(&owner_of(EntityRef::category("tools"))).await?;
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].to, EntityRef::item_type("product"));

    let update = CategoryUpdate {
        item_type: Some(Some("grocery".into())),
        ..CategoryUpdate::default()
    };
    service.update_category(&"tools".into(), update).await?;
    let tools = service.list_associations(&owner_of(EntityRef::category("tools"))).await?;
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].to, EntityRef::item_type("grocery"));

    let update = ItemTypeUpdate {
        category: Some(Some("food".into())),
        ..ItemTypeUpdate::default()
    };
    service.update_item_type(&"grocery".into(), update).await?;
    let update = ItemTypeUpdate {
        category: Some(None),
        ..ItemTypeUpdate::default()
    };
    service.update_item_type(&"grocery".into(), update).await?;
    assert!(
        service
            .list_associations(&owner_of(EntityRef::item_type("grocery")))
            .await?
            .is_empty()
    );

    service
        .create_family(Family::new("hand", "hand", "Hand Tools").with_category("tools"))
        .await?;
    let hand = service.list_associations(&owner_of(EntityRef::family("hand"))).await?;
    assert_eq!(hand[0].id.as_str(), "hand:belongs_to:tools");
    Ok(())
}

#[tokio::test]
async fn test_deleting_entity_drops_its_associations() -> anyhow::Result<()> {
    let service = service().await;
    service
        .create_association(Association::new(
            "a1",
            EntityRef::category("food"),
            EntityRef::category("tools"),
        ))
        .await?;

    service.delete_category(&"food".into()).await?;

    let left = service.list_associations(&AssociationFilter::default()).await?;
    assert!(left.iter().all(|a| !a.touches(&"food".into())));
    assert_eq!(left.len(), 1, "only tools belongs_to product remains");

    service.delete_association(&left[0].id).await?;
    let err = service.get_association(&left[0].id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    Ok(())
}
