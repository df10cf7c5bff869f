//! Filtering, ordering and paging

use crate::common::*;
use jsondoc::{and, eq, gt, gte, in_, lt, lte, neq, not_in, or};

fn find(collection: &Collection, filter: jsondoc::Predicate) -> Vec<Document> {
    collection.find(Some(&filter), &FindOptions::new()).unwrap()
}

#[test]
fn find_all_in_insertion_order() {
    let t = TestDb::new();
    let people = t.seeded();
    let docs = people.find(None, &FindOptions::new()).unwrap();
    assert_eq!(strings(&docs, "name"), ["John", "Jane", "Joe", "John", "Linda"]);
}

#[test]
fn find_equals() {
    let t = TestDb::new();
    let people = t.seeded();
    let docs = find(&people, eq("name", "John").unwrap());
    assert_eq!(ints(&docs, "age"), [25, 40]);
}

#[test]
fn find_not_equals() {
    let t = TestDb::new();
    let people = t.seeded();
    let docs = find(&people, neq("name", "John").unwrap());
    assert_eq!(strings(&docs, "name"), ["Jane", "Joe", "Linda"]);
}

#[test]
fn find_comparisons() {
    let t = TestDb::new();
    let people = t.seeded();
    assert_eq!(ints(&find(&people, gt("age", 27).unwrap()), "age"), [30, 40]);
    assert_eq!(ints(&find(&people, gte("age", 27).unwrap()), "age"), [30, 40, 27]);
    assert_eq!(ints(&find(&people, lt("age", 25).unwrap()), "age"), [22]);
    assert_eq!(ints(&find(&people, lte("age", 25).unwrap()), "age"), [25, 22]);
}

#[test]
fn find_in_and_not_in() {
    let t = TestDb::new();
    let people = t.seeded();
    let docs = find(&people, in_("name", ["John", "Jane"]).unwrap());
    assert_eq!(strings(&docs, "name"), ["John", "Jane", "John"]);
    let docs = find(&people, not_in("name", ["John", "Jane"]).unwrap());
    assert_eq!(strings(&docs, "name"), ["Joe", "Linda"]);
}

#[test]
fn find_nested_field() {
    let t = TestDb::new();
    let people = t.seeded();
    let docs = find(&people, eq("address.city", "Los Angeles").unwrap());
    assert_eq!(strings(&docs, "name"), ["Jane", "Linda"]);
    assert!(find(&people, eq("address.zip", "10001").unwrap()).is_empty());
}

#[test]
fn find_and_or() {
    let t = TestDb::new();
    let people = t.seeded();

    let filter = and([eq("name", "John").unwrap(), gt("age", 30).unwrap()]).unwrap();
    assert_eq!(ints(&find(&people, filter), "age"), [40]);

    let filter = or([eq("name", "Jane").unwrap(), eq("address.state", "IL").unwrap()]).unwrap();
    assert_eq!(strings(&find(&people, filter), "name"), ["Jane", "Joe"]);

    let filter = and([
        or([eq("name", "John").unwrap(), eq("name", "Linda").unwrap()]).unwrap(),
        lt("age", 30).unwrap(),
    ])
    .unwrap();
    assert_eq!(strings(&find(&people, filter), "name"), ["John", "Linda"]);
}

#[test]
fn find_order_by() {
    let t = TestDb::new();
    let people = t.seeded();
    let docs = people.find(None, &FindOptions::new().order_by("age")).unwrap();
    assert_eq!(ints(&docs, "age"), [22, 25, 27, 30, 40]);
    let docs = people
        .find(None, &FindOptions::new().order_by("age").descending())
        .unwrap();
    assert_eq!(ints(&docs, "age"), [40, 30, 27, 25, 22]);
    let docs = people
        .find(None, &FindOptions::new().order_by("address.city"))
        .unwrap();
    assert_eq!(strings(&docs, "name")[0], "Joe");
}

#[test]
fn find_limit_and_offset() {
    let t = TestDb::new();
    let people = t.seeded();
    let by_age = FindOptions::new().order_by("age");

    let docs = people.find(None, &by_age.clone().limit(2)).unwrap();
    assert_eq!(ints(&docs, "age"), [22, 25]);

    let docs = people.find(None, &by_age.clone().offset(1).limit(2)).unwrap();
    assert_eq!(ints(&docs, "age"), [25, 27]);

    let docs = people.find(None, &by_age.clone().offset(3)).unwrap();
    assert_eq!(ints(&docs, "age"), [30, 40]);

    assert!(people.find(None, &by_age.offset(10)).unwrap().is_empty());
}

#[test]
fn find_one_and_get() {
    let t = TestDb::new();
    let people = t.seeded();

    let filter = eq("name", "John").unwrap();
    let first = people.find_one(Some(&filter), &FindOptions::new()).unwrap().unwrap();
    assert_eq!(first["age"], 25);
    let oldest = people
        .find_one(Some(&filter), &FindOptions::new().order_by("age").descending())
        .unwrap()
        .unwrap();
    assert_eq!(oldest["age"], 40);

    let missing = eq("name", "Nobody").unwrap();
    assert!(people.find_one(Some(&missing), &FindOptions::new()).unwrap().is_none());

    let id = first["id"].as_str().unwrap().to_string();
    assert_eq!(people.get(id).unwrap().unwrap(), first);
    assert!(people.get("nope").unwrap().is_none());
}

#[test]
fn count_matches_find() {
    let t = TestDb::new();
    let people = t.seeded();
    assert_eq!(people.count(None).unwrap(), 5);
    let filter = gte("age", 27).unwrap();
    assert_eq!(people.count(Some(&filter)).unwrap(), find(&people, filter).len());
}
