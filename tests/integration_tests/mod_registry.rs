use super::support::{CrewMember, Starship, crew_member};
use odm_lite::store::{MemoryStore, Store};
use odm_lite::{FieldType, Model, OdmConfig, OdmError, Schema, StoreRegistry};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn config() -> OdmConfig {
    OdmConfig::default().with_project_key("a0abcyxz_aSecretValue").with_page_size(7)
}

static OUTPOST_SCHEMA: Lazy<Schema> =
    Lazy::new(|| Schema::builder().field("sector", FieldType::Str).build().expect("outpost schema"));

/// Kept in another project than the rest of the fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Outpost {
    key: Option<String>,
    sector: String,
}

impl Model for Outpost {
    fn schema() -> &'static Schema {
        &OUTPOST_SCHEMA
    }

    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn set_key(&mut self, key: Option<String>) {
        self.key = key;
    }

    fn project_key() -> Option<String> {
        Some("b1frontier_otherSecret".into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Relay {
    key: Option<String>,
}

impl Model for Relay {
    fn schema() -> &'static Schema {
        &OUTPOST_SCHEMA
    }

    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn set_key(&mut self, key: Option<String>) {
        self.key = key;
    }

    fn project_key() -> Option<String> {
        Some("no-separator".into())
    }
}

#[test]
fn missing_project_key_fails_construction() {
    let made: Result<StoreRegistry, _> =
        StoreRegistry::new(OdmConfig::default(), |_: &OdmConfig, _: &str| Ok(Arc::new(MemoryStore::new()) as Arc<dyn Store>));
    assert!(matches!(made, Err(OdmError::Configuration(_))));
}

#[test]
fn stores_are_built_once_per_type_with_base_names() {
    let calls = Arc::new(AtomicUsize::new(0));
    let bases = Arc::new(Mutex::new(Vec::new()));
    let registry: StoreRegistry = {
        let (calls, bases) = (Arc::clone(&calls), Arc::clone(&bases));
        StoreRegistry::new(config(), move |cfg: &OdmConfig, base: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            bases.lock().push(base.to_string());
            Ok(Arc::new(MemoryStore::with_page_size(cfg.page_size)) as Arc<dyn Store>)
        })
        .unwrap()
    };
    assert!(!registry.is_connected::<CrewMember>());

    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| registry.store_for::<CrewMember>().unwrap());
        }
    });
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(registry.is_connected::<CrewMember>());

    let a = registry.store_for::<CrewMember>().unwrap();
    let b = registry.store_for::<CrewMember>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    registry.store_for::<Starship>().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(*bases.lock(), ["crew_member", "fleet"]);
}

#[test]
fn repos_from_registry_share_the_cached_store() {
    let registry: StoreRegistry =
        StoreRegistry::new(config(), |_: &OdmConfig, _: &str| Ok(Arc::new(MemoryStore::new()) as Arc<dyn Store>))
            .unwrap();
    let writer = registry.repo::<CrewMember>().unwrap();
    let reader = registry.repo::<CrewMember>().unwrap();
    let mut record = crew_member(4);
    writer.save(&mut record).unwrap();
    assert_eq!(reader.get(record.key.as_deref().unwrap()).unwrap(), record);
}

#[test]
fn failed_construction_is_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let registry: StoreRegistry = {
        let attempts = Arc::clone(&attempts);
        StoreRegistry::new(config(), move |_: &OdmConfig, _: &str| {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(OdmError::Store("unreachable".into()))
            } else {
                Ok(Arc::new(MemoryStore::new()) as Arc<dyn Store>)
            }
        })
        .unwrap()
    };
    assert!(registry.store_for::<CrewMember>().is_err());
    assert!(!registry.is_connected::<CrewMember>());
    assert!(registry.store_for::<CrewMember>().is_ok());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn async_repos_over_concrete_stores() {
    let registry: StoreRegistry<MemoryStore> =
        StoreRegistry::new(config(), |cfg: &OdmConfig, _: &str| Ok(Arc::new(MemoryStore::with_page_size(cfg.page_size))))
            .unwrap();
    let repo = registry.async_repo::<CrewMember>().unwrap();
    assert_eq!(repo.store().page_size(), 7);
    let mut record = crew_member(1);
    repo.save(&mut record).await.unwrap();
    assert_eq!(repo.get_all().await.unwrap(), vec![record]);
}

#[test]
fn record_types_can_use_their_own_project_key() {
    let keys = Arc::new(Mutex::new(Vec::new()));
    let registry: StoreRegistry = {
        let keys = Arc::clone(&keys);
        StoreRegistry::new(config(), move |cfg: &OdmConfig, base: &str| {
            keys.lock().push((base.to_string(), cfg.project_id()?.to_string(), cfg.page_size));
            Ok(Arc::new(MemoryStore::new()) as Arc<dyn Store>)
        })
        .unwrap()
    };
    registry.store_for::<CrewMember>().unwrap();
    registry.store_for::<Outpost>().unwrap();
    assert_eq!(
        *keys.lock(),
        [("crew_member".to_string(), "a0abcyxz".to_string(), 7), ("outpost".to_string(), "b1frontier".to_string(), 7)]
    );
    assert_eq!(registry.config().project_id().unwrap(), "a0abcyxz");

    assert!(matches!(registry.store_for::<Relay>(), Err(OdmError::Configuration(_))));
    assert!(!registry.is_connected::<Relay>());
    assert_eq!(keys.lock().len(), 2);
}
