//! In-place document updates

use crate::common::*;
use jsondoc::{eq, increment, remove_field, set, set_timestamp_now, Update};
use serde_json::json;

fn john(people: &Collection) -> Vec<Document> {
    let filter = eq("name", "John").unwrap();
    people.find(Some(&filter), &FindOptions::new()).unwrap()
}

#[test]
fn set_top_level_field() {
    let t = TestDb::new();
    let people = t.seeded();
    let filter = eq("name", "Jane").unwrap();
    let changed = people
        .update(Some(&filter), &Update::from(set("age", 23).unwrap()))
        .unwrap();
    assert_eq!(changed, 1);
    let jane = people.find_one(Some(&filter), &FindOptions::new()).unwrap().unwrap();
    assert_eq!(jane["age"], 23);
}

#[test]
fn set_nested_field_and_structured_value() {
    let t = TestDb::new();
    let people = t.seeded();
    let filter = eq("name", "Joe").unwrap();
    let update = Update::new(vec![
        set("address.city", "Springfield").unwrap(),
        set("tags", json!(["a", "b"])).unwrap(),
    ])
    .unwrap();
    people.update(Some(&filter), &update).unwrap();

    let joe = people.find_one(Some(&filter), &FindOptions::new()).unwrap().unwrap();
    assert_eq!(joe["address"], json!({"city": "Springfield", "state": "IL"}));
    assert_eq!(joe["tags"], json!(["a", "b"]));
}

#[test]
fn set_timestamp_to_now() {
    let t = TestDb::new();
    let people = t.seeded();
    let before = chrono::Utc::now().timestamp();
    people
        .update(None, &Update::from(set_timestamp_now("updated_at")))
        .unwrap();
    let after = chrono::Utc::now().timestamp();

    for doc in people.find(None, &FindOptions::new()).unwrap() {
        let stamp = doc["updated_at"].as_i64().unwrap();
        assert!(stamp >= before - 1 && stamp <= after + 1);
    }
}

#[test]
fn remove_fields() {
    let t = TestDb::new();
    let people = t.seeded();
    let update = Update::new(vec![remove_field("address.state"), remove_field("created_at")]).unwrap();
    assert_eq!(people.update(None, &update).unwrap(), 5);

    for doc in people.find(None, &FindOptions::new()).unwrap() {
        assert!(!doc.contains_key("created_at"));
        let address = doc["address"].as_object().unwrap();
        assert!(address.contains_key("city"));
        assert!(!address.contains_key("state"));
    }
}

#[test]
fn increment_counts_from_stored_value() {
    let t = TestDb::new();
    let people = t.seeded();
    people
        .update(None, &Update::from(increment("age", 5).unwrap()))
        .unwrap();
    let docs = people.find(None, &FindOptions::new()).unwrap();
    assert_eq!(ints(&docs, "age"), [30, 27, 35, 45, 32]);

    // missing fields start from zero
    people
        .update(None, &Update::from(increment("visits", 2).unwrap()))
        .unwrap();
    let docs = people.find(None, &FindOptions::new()).unwrap();
    assert_eq!(ints(&docs, "visits"), [2, 2, 2, 2, 2]);

    people
        .update(None, &Update::from(increment("score", 0.5).unwrap()))
        .unwrap();
    assert_eq!(people.find(None, &FindOptions::new()).unwrap()[0]["score"], 0.5);
}

#[test]
fn update_without_filter_touches_every_document() {
    let t = TestDb::new();
    let people = t.seeded();
    let changed = people
        .update(None, &Update::from(set("active", true).unwrap()))
        .unwrap();
    assert_eq!(changed, 5);
    let filter = eq("active", true).unwrap();
    assert_eq!(people.count(Some(&filter)).unwrap(), 5);
}

#[test]
fn update_many_matches() {
    let t = TestDb::new();
    let people = t.seeded();
    let filter = eq("name", "John").unwrap();
    let changed = people
        .update(Some(&filter), &Update::from(set("address.city", "Boston").unwrap()))
        .unwrap();
    assert_eq!(changed, 2);
    for doc in john(&people) {
        assert_eq!(doc["address"]["city"], "Boston");
    }
}

#[test]
fn update_one_changes_first_match_only() {
    let t = TestDb::new();
    let people = t.seeded();
    let filter = eq("name", "John").unwrap();
    let changed = people
        .update_one(Some(&filter), &Update::from(increment("age", 1).unwrap()))
        .unwrap();
    assert_eq!(changed, 1);
    assert_eq!(ints(&john(&people), "age"), [26, 40]);

    let nobody = eq("name", "Nobody").unwrap();
    let changed = people
        .update_one(Some(&nobody), &Update::from(increment("age", 1).unwrap()))
        .unwrap();
    assert_eq!(changed, 0);
}

#[test]
fn update_no_match_changes_nothing() {
    let t = TestDb::new();
    let people = t.seeded();
    let filter = eq("name", "Nobody").unwrap();
    let changed = people
        .update(Some(&filter), &Update::from(set("age", 1).unwrap()))
        .unwrap();
    assert_eq!(changed, 0);
}

#[test]
fn delete_and_delete_one() {
    let t = TestDb::new();
    let people = t.seeded();
    let filter = eq("name", "John").unwrap();
    assert_eq!(people.delete_one(Some(&filter)).unwrap(), 1);
    assert_eq!(ints(&john(&people), "age"), [40]);
    assert_eq!(people.delete(Some(&filter)).unwrap(), 1);
    assert_eq!(people.delete(None).unwrap(), 3);
    assert_eq!(people.count(None).unwrap(), 0);
}
