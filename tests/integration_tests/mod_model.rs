use super::support::{CountingStore, CrewMember, crew_member, item};
use odm_lite::store::{MemoryStore, Store};
use odm_lite::{Model, OdmError, Repo};
use serde_json::json;
use std::sync::Arc;

fn repo_over(store: Arc<MemoryStore>) -> Repo<CrewMember> {
    Repo::new(store)
}

#[test]
fn save_assigns_key_and_get_reads_it_back() {
    let store = Arc::new(MemoryStore::new());
    let repo = repo_over(Arc::clone(&store));
    let mut record = crew_member(1);
    repo.save(&mut record).unwrap();
    let key = record.key.clone().expect("key assigned");
    assert_eq!(key.len(), 32);

    let loaded = repo.get(&key).unwrap();
    assert_eq!(loaded, record);

    let raw = store.get(&key).unwrap().unwrap();
    assert_eq!(raw["joined"], json!(22_490_101));
    assert_eq!(raw["shift"], json!(93_015_000_123_i64));
    assert_eq!(raw["last_seen"], json!(1_700_000_000.0));
}

#[test]
fn save_with_existing_key_upserts() {
    let store = Arc::new(MemoryStore::new());
    let repo = repo_over(Arc::clone(&store));
    let mut record = crew_member(1);
    record.key = Some("picard".into());
    repo.save(&mut record).unwrap();
    record.group = 7;
    repo.save(&mut record).unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(repo.get("picard").unwrap().group, 7);
}

#[test]
fn get_misses_are_not_found() {
    let store = Arc::new(MemoryStore::new());
    let repo = repo_over(Arc::clone(&store));
    assert!(matches!(repo.get("absent"), Err(OdmError::NotFound(_))));
    assert!(matches!(repo.get(""), Err(OdmError::MissingKey(_))));
    assert!(repo.get_or_none("absent").unwrap().is_none());
    assert!(matches!(repo.get_or_none(""), Err(OdmError::MissingKey(_))));
}

#[test]
fn none_key_sentinel_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    store.put(item(json!({"key": "None", "name": "ghost"}))).unwrap();
    let repo = repo_over(store);
    assert!(matches!(repo.get("None"), Err(OdmError::NotFound(_))));
}

#[test]
fn invalid_stored_item_is_not_found_on_get() {
    let store = Arc::new(MemoryStore::new());
    store.put(item(json!({"key": "bad", "name": 5}))).unwrap();
    let repo = repo_over(store);
    assert!(matches!(repo.get("bad"), Err(OdmError::NotFound(_))));
    assert!(repo.get_or_none("bad").unwrap().is_none());
    assert!(matches!(repo.get_all(), Err(OdmError::Validation(_))));
}

#[test]
fn get_all_follows_pages() {
    let store = Arc::new(MemoryStore::with_page_size(4));
    let repo = repo_over(Arc::clone(&store));
    for i in 0..10 {
        let mut r = crew_member(i);
        repo.save(&mut r).unwrap();
    }
    let all = repo.get_all().unwrap();
    assert_eq!(all.len(), 10);
    let mut groups: Vec<i64> = all.iter().map(|r| r.group).collect();
    groups.sort_unstable();
    assert_eq!(groups, (0..10).collect::<Vec<_>>());
}

#[test]
fn query_by_group_across_pages() {
    let store = Arc::new(MemoryStore::with_page_size(3));
    let repo = repo_over(store);
    let records: Vec<CrewMember> = (0..15).map(|i| crew_member(if i < 10 { 1 } else { 2 })).collect();
    repo.put_many(&records).unwrap();
    let group = CrewMember::field("group").unwrap();
    let found = repo.query(group.equals(1).unwrap()).unwrap();
    assert_eq!(found.len(), 10);
    assert!(found.iter().all(|r| r.group == 1 && r.key.is_some()));
}

#[test]
fn put_many_chunks_by_twenty_five() {
    let store = Arc::new(CountingStore::default());
    let repo: Repo<CrewMember> = Repo::new(Arc::clone(&store) as Arc<dyn Store>);
    let records: Vec<CrewMember> = (0..52).map(crew_member).collect();
    let saved = repo.put_many(&records).unwrap();
    assert_eq!(store.batch_sizes(), vec![25, 25, 2]);
    assert_eq!(saved.len(), 52);
    assert!(saved.iter().all(|r| r.key.is_some()));
    assert_eq!(store.inner.len(), 52);
}

#[test]
fn put_many_stops_at_first_failed_batch_without_rollback() {
    let store = Arc::new(CountingStore::failing_at(1));
    let repo: Repo<CrewMember> = Repo::new(Arc::clone(&store) as Arc<dyn Store>);
    let records: Vec<CrewMember> = (0..60).map(crew_member).collect();
    assert!(matches!(repo.put_many(&records), Err(OdmError::Store(_))));
    assert_eq!(store.batch_sizes(), vec![25, 25]);
    assert_eq!(store.inner.len(), 25);
}

#[test]
fn put_many_of_nothing_makes_no_calls() {
    let store = Arc::new(CountingStore::default());
    let repo: Repo<CrewMember> = Repo::new(Arc::clone(&store) as Arc<dyn Store>);
    assert!(repo.put_many(&[]).unwrap().is_empty());
    assert!(store.batch_sizes().is_empty());
}

#[test]
fn delete_without_key_never_reaches_store() {
    let store = Arc::new(CountingStore::default());
    let repo: Repo<CrewMember> = Repo::new(Arc::clone(&store) as Arc<dyn Store>);
    let mut record = crew_member(1);
    assert!(matches!(repo.delete(&mut record), Err(OdmError::MissingKey(_))));
    assert_eq!(store.delete_calls(), 0);
}

#[test]
fn delete_removes_item_and_clears_key() {
    let store = Arc::new(CountingStore::default());
    let repo: Repo<CrewMember> = Repo::new(Arc::clone(&store) as Arc<dyn Store>);
    let mut record = crew_member(1);
    repo.save(&mut record).unwrap();
    let key = record.key.clone().unwrap();
    let name = record.name.clone();
    repo.delete(&mut record).unwrap();
    assert_eq!(store.delete_calls(), 1);
    assert!(record.key.is_none());
    assert_eq!(record.name, name);
    assert!(repo.get_or_none(&key).unwrap().is_none());
}

#[test]
fn delete_key_directly() {
    let store = Arc::new(MemoryStore::new());
    let repo = repo_over(Arc::clone(&store));
    let mut record = crew_member(2);
    repo.save(&mut record).unwrap();
    repo.delete_key(record.key.as_deref().unwrap()).unwrap();
    assert!(store.is_empty());
    assert!(matches!(repo.delete_key(""), Err(OdmError::MissingKey(_))));
}

#[test]
fn base_name_defaults_to_snake_case() {
    assert_eq!(CrewMember::base_name(), "crew_member");
}
