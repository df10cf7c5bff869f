//! Inserting documents and conflict handling

use crate::common::*;
use jsondoc::{eq, Error, IndexDescriptor};
use serde_json::json;

#[test]
fn insert_returns_stored_document() {
    let t = TestDb::new();
    let people = t.collection();
    let doc = people
        .insert(json!({"name": "John", "age": 25}), OnConflict::Raise)
        .unwrap();
    assert_eq!(doc["name"], "John");
    assert_eq!(doc["id"].as_str().unwrap().len(), 32);
    assert_eq!(people.get(doc["id"].clone()).unwrap().unwrap(), doc);
}

#[test]
fn insert_keeps_caller_id() {
    let t = TestDb::new();
    let people = t.collection();
    let doc = people.insert(json!({"id": 42, "name": "John"}), OnConflict::Raise).unwrap();
    assert_eq!(doc["id"], 42);
    assert!(people.get(42).unwrap().is_some());
}

#[test]
fn insert_rejects_non_objects() {
    let t = TestDb::new();
    let people = t.collection();
    for value in [json!(1), json!("text"), json!([{"a": 1}]), json!(null)] {
        assert!(matches!(
            people.insert(value, OnConflict::Raise),
            Err(Error::NotADocument(_))
        ));
    }
    assert_eq!(people.count(None).unwrap(), 0);
}

#[test]
fn insert_many_writes_all() {
    let t = TestDb::new();
    let people = t.collection();
    let fixture = crate::common::people();
    assert_eq!(people.insert_many(fixture, OnConflict::Raise).unwrap(), 5);
    assert_eq!(people.count(None).unwrap(), 5);
    assert_eq!(people.insert_many(Vec::<serde_json::Value>::new(), OnConflict::Raise).unwrap(), 0);
}

#[test]
fn insert_many_raise_rolls_back_batch() {
    let t = TestDb::new();
    let people = t.collection();
    let batch = vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 1})];
    let err = people.insert_many(batch, OnConflict::Raise).unwrap_err();
    assert!(err.is_engine());
    assert_eq!(people.count(None).unwrap(), 0);
}

#[test]
fn insert_many_ignore_skips_duplicates() {
    let t = TestDb::new();
    let people = t.collection();
    people.insert(json!({"id": 1, "v": "old"}), OnConflict::Raise).unwrap();
    let batch = vec![json!({"id": 1, "v": "new"}), json!({"id": 2}), json!({"id": 3})];
    assert_eq!(people.insert_many(batch, OnConflict::Ignore).unwrap(), 2);
    assert_eq!(people.get(1).unwrap().unwrap()["v"], "old");
}

#[test]
fn insert_many_replace_overwrites() {
    let t = TestDb::new();
    let people = t.collection();
    people.insert(json!({"id": 1, "v": "old"}), OnConflict::Raise).unwrap();
    let batch = vec![json!({"id": 1, "v": "new"}), json!({"id": 2})];
    people.insert_many(batch, OnConflict::Replace).unwrap();
    assert_eq!(people.count(None).unwrap(), 2);
    assert_eq!(people.get(1).unwrap().unwrap()["v"], "new");
}

#[test]
fn conflict_on_secondary_unique_index() {
    let t = TestDb::new();
    let people = t.collection();
    people.create_index(&IndexDescriptor::unique("email")).unwrap();
    people
        .insert(json!({"email": "j@example.com", "name": "John"}), OnConflict::Raise)
        .unwrap();

    let dup = json!({"email": "j@example.com", "name": "Jack"});
    assert!(people.insert(dup.clone(), OnConflict::Raise).unwrap_err().is_engine());

    // nothing carries the new id, so the unsaved document comes back
    let returned = people.insert(dup.clone(), OnConflict::Ignore).unwrap();
    assert_eq!(returned["name"], "Jack");
    let filter = eq("email", "j@example.com").unwrap();
    let stored = people.find(Some(&filter), &FindOptions::new()).unwrap();
    assert_eq!(strings(&stored, "name"), ["John"]);

    people.insert(dup, OnConflict::Replace).unwrap();
    let stored = people.find(Some(&filter), &FindOptions::new()).unwrap();
    assert_eq!(strings(&stored, "name"), ["Jack"]);
}

#[test]
fn collections_are_isolated() {
    let t = TestDb::new();
    let people = t.seeded();
    let other = t.db.collection("other").unwrap();
    assert_eq!(other.count(None).unwrap(), 0);
    other.insert(json!({"id": 1}), OnConflict::Raise).unwrap();
    people.insert(json!({"id": 1}), OnConflict::Raise).unwrap();
    assert_eq!(people.count(None).unwrap(), 6);
    assert_eq!(t.db.collection_names().unwrap(), ["other", "test_collection"]);
}
