use super::support::{CrewMember, crew_member, item};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use odm_lite::codec::{deserialize, serialize};
use odm_lite::{FieldType, Model, OdmError, Schema};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LogEntry {
    key: Option<String>,
    at: NaiveDateTime,
    acked: Option<NaiveDateTime>,
}

static LOG_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder()
        .field("at", FieldType::DateTime)
        .field("acked", FieldType::optional(FieldType::DateTime))
        .build()
        .expect("log schema")
});

impl Model for LogEntry {
    fn schema() -> &'static Schema {
        &LOG_SCHEMA
    }

    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn set_key(&mut self, key: Option<String>) {
        self.key = key;
    }
}

#[test]
fn serialized_layout_follows_schema() {
    let mut record = crew_member(1);
    record.name = "Jean-Luc Picard".into();
    let out = serialize(&record, &[]).unwrap();
    let keys: Vec<&str> = out.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        ["name", "group", "rating", "active", "ships", "joined", "shift", "last_seen", "notes", "rank"]
    );
    assert_eq!(out["name"], json!("Jean-Luc Picard"));
    assert_eq!(out["ships"], json!(["Enterprise", "Stargazer"]));
    assert_eq!(out["joined"], json!(22_490_101));
    assert_eq!(out["rank"], json!({"title": "Lieutenant", "grade": 3}));
}

#[test]
fn key_is_kept_once_assigned_and_exclusions_apply() {
    let mut record = crew_member(1);
    record.key = Some("k-1".into());
    let out = serialize(&record, &["notes", "rank"]).unwrap();
    assert_eq!(out["key"], json!("k-1"));
    assert!(!out.contains_key("notes"));
    assert!(!out.contains_key("rank"));
}

#[test]
fn unset_optional_is_stored_as_null_and_read_back_as_none() {
    let mut record = crew_member(1);
    record.shift = None;
    let out = serialize(&record, &[]).unwrap();
    assert!(out["shift"].is_null());
    let back: CrewMember = deserialize(&out).unwrap();
    assert_eq!(back.shift, None);
    assert_eq!(back, record);
}

#[test]
fn early_morning_times_survive_round_trip() {
    let mut record = crew_member(1);
    record.shift = NaiveTime::from_hms_micro_opt(0, 0, 5, 42);
    let out = serialize(&record, &[]).unwrap();
    assert_eq!(out["shift"], json!(5_000_042));
    let back: CrewMember = deserialize(&out).unwrap();
    assert_eq!(back.shift, record.shift);
}

#[test]
fn custom_json_text_is_decoded() {
    let mut stored = serialize(&crew_member(1), &[]).unwrap();
    stored.insert("rank".into(), json!("{\"title\":\"Commander\",\"grade\":5}"));
    let back: CrewMember = deserialize(&stored).unwrap();
    assert_eq!(back.rank.title, "Commander");
}

#[test]
fn unknown_and_invalid_items() {
    let extra = {
        let mut s = serialize(&crew_member(1), &[]).unwrap();
        s.insert("legacy".into(), json!(true));
        s
    };
    assert!(deserialize::<CrewMember>(&extra).is_ok());
    let broken = item(json!({"name": "x"}));
    assert!(matches!(deserialize::<CrewMember>(&broken), Err(OdmError::Validation(_))));
}

#[test]
fn naive_datetimes_round_trip_as_utc() {
    let at = NaiveDate::from_ymd_opt(2023, 5, 17).unwrap().and_hms_opt(12, 30, 0).unwrap();
    let record = LogEntry {
        key: None,
        at,
        acked: NaiveDate::from_ymd_opt(2023, 5, 17).unwrap().and_hms_micro_opt(12, 31, 2, 250_000),
    };
    let out = serialize(&record, &[]).unwrap();
    assert_eq!(out["at"], json!(1_684_326_600.0));
    assert_eq!(out["acked"], json!(1_684_326_662.25));
    let back: LogEntry = deserialize(&out).unwrap();
    assert_eq!(back, record);
}

#[test]
fn dates_before_the_common_era_round_trip() {
    let mut record = crew_member(1);
    record.joined = NaiveDate::from_ymd_opt(-44, 3, 15).unwrap();
    let out = serialize(&record, &[]).unwrap();
    assert_eq!(out["joined"], json!(-439_685));
    let back: CrewMember = deserialize(&out).unwrap();
    assert_eq!(back.joined, record.joined);
}
