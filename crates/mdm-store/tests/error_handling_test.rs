use mdm_ir::{EntityKind, ItemType, Value};
use mdm_schema::{AttributeDefinition, AttributeGroup, AttributeKind};
use mdm_store::{Error, MemoryStore, Repository};

#[tokio::test]
async fn test_delete_missing_entity() {
    let store = MemoryStore::new();
    let err = store.delete(EntityKind::Item, &"ghost".into()).await.unwrap_err();

    assert!(matches!(err, Error::NotFound { entity: EntityKind::Item, .. }));
    assert_eq!(err.to_string(), "Item not found: ghost");
}

#[tokio::test]
async fn test_definition_in_group_cannot_be_deleted() {
    let store = MemoryStore::new();
    let def = AttributeDefinition::parse("d1", "name", AttributeKind::Text, &Value::Null).unwrap();
    store.save_definition(def).await.unwrap();
    store
        .save_group(AttributeGroup::new("g1", "basic", "Basic").with_attributes(["d1"]))
        .await
        .unwrap();

    let err = store
        .delete(EntityKind::AttributeDefinition, &"d1".into())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("referenced by 1"));
}

#[tokio::test]
async fn test_duplicate_code_message() {
    let store = MemoryStore::new();
    store.save_item_type(ItemType::new("a", "product", "A")).await.unwrap();
    let err = store
        .save_item_type(ItemType::new("b", "product", "B"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "ItemType code already in use: product");
}
