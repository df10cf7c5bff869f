//! Rich values stored and read back through the document column

use crate::common::*;
use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use jsondoc::{encode, eq, EncodeOptions, EncodedValue, EnumValue, Fields, Record, Secret, Value};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::PathBuf;
use uuid::Uuid;

fn created() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 500_000_000).unwrap()
}

fn account_uuid() -> Uuid {
    Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap()
}

fn user() -> Record {
    let address = Record::new("Address")
        .field("city", "New York")
        .field("zip", Option::<String>::None);
    let scores: BTreeMap<String, i64> = [("math".to_string(), 90), ("art".to_string(), 75)]
        .into_iter()
        .collect();
    Record::new("User")
        .field("id", "u1")
        .field("role", EnumValue::new("Role", "Admin", "admin"))
        .field("created", created())
        .field("birthday", NaiveDate::from_ymd_opt(1990, 5, 17).unwrap())
        .field("session", TimeDelta::minutes(90) + TimeDelta::milliseconds(250))
        .field("account", account_uuid())
        .field("ip", "192.168.1.10".parse::<IpAddr>().unwrap())
        .field("home", PathBuf::from("/home/user"))
        .field("password", Secret::new("hunter2"))
        .aliased_field("email_address", "email", "u1@example.com")
        .field("address", address)
        .field("tags", vec!["a", "b"])
        .field("scores", scores)
}

fn stored(people: &Collection) -> EncodedValue {
    let doc = people.get("u1").unwrap().unwrap();
    EncodedValue::Object(doc)
}

#[test]
fn record_round_trips_through_storage() {
    let t = TestDb::new();
    let people = t.collection();
    people.insert(user(), OnConflict::Raise).unwrap();

    let doc = stored(&people);
    let fields = Fields::new(&doc).unwrap();
    assert_eq!(fields.get::<String>("role").unwrap(), "admin");
    assert_eq!(fields.get::<DateTime<Utc>>("created").unwrap(), created());
    assert_eq!(
        fields.get::<NaiveDate>("birthday").unwrap(),
        NaiveDate::from_ymd_opt(1990, 5, 17).unwrap()
    );
    assert_eq!(
        fields.get::<TimeDelta>("session").unwrap(),
        TimeDelta::milliseconds(5_400_250)
    );
    assert_eq!(fields.get::<Uuid>("account").unwrap(), account_uuid());
    assert_eq!(
        fields.get::<IpAddr>("ip").unwrap(),
        "192.168.1.10".parse::<IpAddr>().unwrap()
    );
    assert_eq!(fields.get::<PathBuf>("home").unwrap(), PathBuf::from("/home/user"));
    assert_eq!(fields.get::<Secret>("password").unwrap(), Secret::new("hunter2"));
    assert_eq!(fields.get::<String>("email").unwrap(), "u1@example.com");
    assert!(fields.raw("email_address").is_none());
    assert_eq!(fields.get::<Vec<String>>("tags").unwrap(), ["a", "b"]);
    assert_eq!(fields.get::<BTreeMap<String, i64>>("scores").unwrap()["math"], 90);

    let address = Fields::new(fields.raw("address").unwrap()).unwrap();
    assert_eq!(address.get::<String>("city").unwrap(), "New York");
    assert_eq!(address.raw("zip"), Some(&EncodedValue::Null));
}

#[test]
fn encoded_fields_are_queryable() {
    let t = TestDb::new();
    let people = t.collection();
    people.insert(user(), OnConflict::Raise).unwrap();
    people
        .insert(
            Record::new("User").field("id", "u2").field("created", Utc.timestamp_opt(0, 0).unwrap()),
            OnConflict::Raise,
        )
        .unwrap();

    let by_role = eq("role", EnumValue::new("Role", "Admin", "admin")).unwrap();
    assert_eq!(people.count(Some(&by_role)).unwrap(), 1);

    let recent = jsondoc::gt("created", Utc.timestamp_opt(1_600_000_000, 0).unwrap()).unwrap();
    let docs = people.find(Some(&recent), &FindOptions::new()).unwrap();
    assert_eq!(strings(&docs, "id"), ["u1"]);

    let by_uuid = eq("account", account_uuid()).unwrap();
    assert_eq!(people.count(Some(&by_uuid)).unwrap(), 1);
}

#[test]
fn excluded_fields_are_not_stored() {
    let t = TestDb::new();
    let people = t.collection();
    let options = EncodeOptions::new().exclude(["password", "email_address"]);
    let encoded = encode(&Value::from(user()), &options).unwrap();
    people.insert(encoded, OnConflict::Raise).unwrap();

    let doc = stored(&people);
    let fields = Fields::new(&doc).unwrap();
    assert!(fields.raw("password").is_none());
    assert!(fields.raw("email").is_none());
    assert_eq!(fields.get::<String>("role").unwrap(), "admin");
}

#[test]
fn opaque_values_are_rejected() {
    struct Handle;
    let t = TestDb::new();
    let people = t.collection();
    let record = Record::new("Job").field("handle", Value::opaque(Handle));
    assert!(matches!(
        people.insert(record, OnConflict::Raise),
        Err(jsondoc::Error::Unencodable { .. })
    ));
    assert_eq!(people.count(None).unwrap(), 0);
}
