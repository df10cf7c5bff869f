//! Index management against the live SQLite catalog

use crate::common::*;
use jsondoc::{Execute, IndexDescriptor, IndexKind};
use serde_json::json;

fn catalog_sql(t: &TestDb, name: &str) -> String {
    let out = t
        .db
        .executor()
        .execute("SELECT sql FROM sqlite_master WHERE name = ?", &[json!(name)])
        .unwrap();
    out.scalar().and_then(|v| v.as_str()).unwrap().to_string()
}

#[test]
fn new_collection_has_id_index() {
    let t = TestDb::new();
    let people = t.collection();
    let indexes = people.indexes().unwrap();
    assert_eq!(indexes.len(), 1);
    assert_eq!(indexes[0].kind(), IndexKind::Unique);
    assert_eq!(indexes[0].field().as_str(), "id");
    assert_eq!(indexes[0].name(), "test_collection_idx_unique_id");
}

#[test]
fn create_path_index() {
    let t = TestDb::new();
    let people = t.seeded();
    let city = IndexDescriptor::path("address.city");
    people.create_index(&city).unwrap();
    people.create_index(&city).unwrap();

    let indexes = people.indexes().unwrap();
    assert_eq!(indexes, vec![city.clone(), Collection::id_index()]);
    assert_eq!(indexes[0].name(), "test_collection_idx_path_address_city");

    let sql = catalog_sql(&t, indexes[0].name());
    assert!(sql.starts_with("CREATE INDEX"));
    assert!(sql.contains("json_extract(data, '$.address.city')"));
}

#[test]
fn path_index_serves_equality_filters() {
    let t = TestDb::new();
    let people = t.seeded();
    people.create_index(&IndexDescriptor::path("address.city")).unwrap();

    let plan = t
        .db
        .executor()
        .execute(
            "EXPLAIN QUERY PLAN SELECT data FROM test_collection \
             WHERE json_extract(data, '$.address.city') = ?",
            &[json!("New York")],
        )
        .unwrap();
    let detail: String = plan
        .rows
        .iter()
        .filter_map(|row| row.last().and_then(|v| v.as_str()))
        .collect::<Vec<_>>()
        .join("\n");
    assert!(detail.contains("test_collection_idx_path_address_city"), "{}", detail);
}

#[test]
fn unique_index_enforced() {
    let t = TestDb::new();
    let people = t.seeded();

    // two Johns already stored
    let err = people.create_index(&IndexDescriptor::unique("name")).unwrap_err();
    assert!(err.is_engine());
    assert_eq!(people.indexes().unwrap().len(), 1);

    people.create_index(&IndexDescriptor::unique("age")).unwrap();
    let dup = json!({"name": "Jim", "age": 25});
    assert!(people.insert(dup, OnConflict::Raise).unwrap_err().is_engine());
    assert_eq!(people.count(None).unwrap(), 5);
}

#[test]
fn drop_index_by_descriptor_and_name() {
    let t = TestDb::new();
    let people = t.collection();
    people.create_index(&IndexDescriptor::path("age")).unwrap();
    people.create_index(&IndexDescriptor::path("name")).unwrap();

    assert!(people.drop_index(&IndexDescriptor::path("age")).unwrap());
    assert!(!people.drop_index(&IndexDescriptor::path("age")).unwrap());
    assert!(!people.drop_index(&IndexDescriptor::unique("name")).unwrap());

    people.drop_index_by_name("test_collection_idx_path_name").unwrap();
    assert_eq!(people.indexes().unwrap(), vec![Collection::id_index()]);
}

#[test]
fn drop_all_keeps_id_index() {
    let t = TestDb::new();
    let people = t.collection();
    people.create_index(&IndexDescriptor::path("age")).unwrap();
    people.create_index(&IndexDescriptor::unique("email")).unwrap();
    assert_eq!(people.drop_all_indexes().unwrap(), 2);
    assert_eq!(people.indexes().unwrap(), vec![Collection::id_index()]);
}

#[test]
fn sync_indexes_applies_diff() {
    let t = TestDb::new();
    let people = t.seeded();
    people.create_index(&IndexDescriptor::path("name")).unwrap();
    people.create_index(&IndexDescriptor::path("age")).unwrap();

    let desired = [
        IndexDescriptor::path("age"),
        IndexDescriptor::path("address.city"),
    ];
    let diff = people.sync_indexes(&desired).unwrap();
    assert_eq!(diff.to_create, vec![IndexDescriptor::path("address.city")]);
    assert_eq!(diff.to_drop, vec![IndexDescriptor::path("name")]);

    let names: Vec<String> = people
        .indexes()
        .unwrap()
        .iter()
        .map(|i| i.name().to_string())
        .collect();
    assert_eq!(
        names,
        [
            "test_collection_idx_path_address_city",
            "test_collection_idx_path_age",
            "test_collection_idx_unique_id",
        ]
    );

    assert!(people.sync_indexes(&desired).unwrap().is_empty());
}

#[test]
fn same_field_indexed_in_two_collections() {
    let t = TestDb::new();
    let people = t.collection();
    let pets = t.db.collection("pets").unwrap();
    let age = IndexDescriptor::path("age");
    people.create_index(&age).unwrap();
    pets.create_index(&age).unwrap();
    assert_eq!(pets.indexes().unwrap()[0].name(), "pets_idx_path_age");
    assert!(people.drop_index(&age).unwrap());
    assert_eq!(pets.indexes().unwrap().len(), 2);
}

#[test]
fn database_drop_all_indexes_includes_id_indexes() {
    let t = TestDb::new();
    let people = t.collection();
    people.create_index(&IndexDescriptor::path("age")).unwrap();
    t.db.collection("pets").unwrap();
    assert_eq!(t.db.drop_all_indexes().unwrap(), 3);
    assert!(people.indexes().unwrap().is_empty());
    assert_eq!(t.collection().indexes().unwrap(), vec![Collection::id_index()]);
}
