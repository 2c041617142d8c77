//! Records persisted through a [`Store`], and the blocking operations on them.

use crate::codec;
use crate::errors::OdmError;
use crate::logger::AUDIT_TARGET;
use crate::query::{Field, Query};
use crate::schema::Schema;
use crate::store::{Store, fetch_all};
use crate::types::{Filter, Item, KEY_FIELD, PUT_MANY_LIMIT};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

/// A schema-validated record stored as one store entry.
///
/// Implementors carry an optional primary key (serialized as `key`) and
/// describe their fields once through [`Model::schema`]:
///
/// ```
/// use odm_lite::{FieldType, Model, Schema};
/// use serde::{Deserialize, Serialize};
/// use std::sync::LazyLock;
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Captain {
///     key: Option<String>,
///     name: String,
///     ships: Vec<String>,
/// }
///
/// impl Model for Captain {
///     fn schema() -> &'static Schema {
///         static SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
///             Schema::builder()
///                 .field("name", FieldType::Str)
///                 .field("ships", FieldType::list(FieldType::Str))
///                 .build()
///                 .expect("captain schema")
///         });
///         &SCHEMA
///     }
///     fn key(&self) -> Option<&str> {
///         self.key.as_deref()
///     }
///     fn set_key(&mut self, key: Option<String>) {
///         self.key = key;
///     }
/// }
///
/// let by_name = Captain::field("name").unwrap().prefix("Jean").unwrap();
/// assert_eq!(by_name.field_path(), "name?pfx");
/// assert_eq!(Captain::base_name(), "captain");
/// ```
pub trait Model: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn schema() -> &'static Schema;

    fn key(&self) -> Option<&str>;

    fn set_key(&mut self, key: Option<String>);

    /// Name of the store base holding this record type; snake_case of the type name by default.
    fn base_name() -> String {
        base_name_for(std::any::type_name::<Self>())
    }

    /// Project key for this record type's store when it differs from the configured one.
    fn project_key() -> Option<String> {
        None
    }

    /// Comparator for one declared field.
    ///
    /// # Errors
    /// `InvalidQuery` for an undeclared field.
    fn field(name: &str) -> Result<&'static Field, OdmError> {
        Self::schema().field(name)
    }
}

/// `my_app::models::ObjectExample` -> `object_example`.
#[must_use]
pub fn base_name_for(type_name: &str) -> String {
    let without_generics = type_name.split('<').next().unwrap_or(type_name);
    let short = without_generics.rsplit("::").next().unwrap_or(without_generics);
    let mut out = String::with_capacity(short.len() + 4);
    for (i, ch) in short.chars().enumerate() {
        if ch.is_uppercase() && i > 0 {
            out.push('_');
        }
        out.extend(ch.to_lowercase());
    }
    out
}

/// Rejects keys a store cannot address.
pub(crate) fn require_key(key: &str) -> Result<(), OdmError> {
    if key.is_empty() {
        Err(OdmError::MissingKey("key cannot be empty".into()))
    } else {
        Ok(())
    }
}

/// The assigned key of a record, or `MissingKey`.
pub(crate) fn assigned_key<M: Model>(record: &M) -> Result<String, OdmError> {
    match record.key() {
        Some(k) if !k.is_empty() => Ok(k.to_owned()),
        _ => Err(OdmError::MissingKey(format!(
            "{} item does not have a key for deletion",
            M::base_name()
        ))),
    }
}

/// Key the store assigned to a written item.
pub(crate) fn key_of(saved: &Item) -> Result<String, OdmError> {
    saved
        .get(KEY_FIELD)
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| OdmError::Store("store response is missing the item key".into()))
}

/// Serialized records split into `put_many`-sized batches.
pub(crate) fn batches<M: Model>(records: &[M]) -> Result<Vec<Vec<Item>>, OdmError> {
    let items = records.iter().map(|r| codec::serialize(r, &[])).collect::<Result<Vec<_>, _>>()?;
    Ok(items.chunks(PUT_MANY_LIMIT).map(<[Item]>::to_vec).collect())
}

pub(crate) fn decode_all<M: Model>(items: &[Item]) -> Result<Vec<M>, OdmError> {
    items.iter().map(codec::deserialize).collect()
}

/// Blocking operations for one record type over a store.
pub struct Repo<M: Model> {
    store: Arc<dyn Store>,
    _record: PhantomData<fn() -> M>,
}

impl<M: Model> Clone for Repo<M> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), _record: PhantomData }
    }
}

impl<M: Model> Repo<M> {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store, _record: PhantomData }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// # Errors
    /// `MissingKey` for an empty key; `NotFound` when nothing valid is stored under it.
    pub fn get(&self, key: &str) -> Result<M, OdmError> {
        require_key(key)?;
        let item = self.store.get(key)?;
        codec::deserialize_found(item, key)
    }

    /// Like [`Repo::get`] but a miss is `Ok(None)`.
    ///
    /// # Errors
    /// `MissingKey` for an empty key, or any store error.
    pub fn get_or_none(&self, key: &str) -> Result<Option<M>, OdmError> {
        match self.get(key) {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Every stored record, across all pages.
    ///
    /// # Errors
    /// Store errors, or `Validation` for a stored item that does not fit the record.
    pub fn get_all(&self) -> Result<Vec<M>, OdmError> {
        self.fetch(None)
    }

    /// Records matching `query`, across all pages.
    ///
    /// # Errors
    /// Store errors, or `Validation` for a stored item that does not fit the record.
    pub fn query(&self, query: impl Into<Query>) -> Result<Vec<M>, OdmError> {
        let filter = query.into().to_filter();
        self.fetch(Some(&filter))
    }

    fn fetch(&self, filter: Option<&Filter>) -> Result<Vec<M>, OdmError> {
        let items = fetch_all(self.store.as_ref(), filter)?;
        log::debug!("{}: fetched {} items", M::base_name(), items.len());
        decode_all(&items)
    }

    /// # Errors
    /// `MissingKey` for an empty key, or any store error.
    pub fn delete_key(&self, key: &str) -> Result<(), OdmError> {
        require_key(key)?;
        self.store.delete(key)?;
        log::info!(target: AUDIT_TARGET, "delete base={} key={key}", M::base_name());
        Ok(())
    }

    /// Store many records, 25 per store call, and return them with their assigned keys.
    ///
    /// Batches are written in order and not rolled back: if a call fails, the
    /// batches before it stay stored and the error is returned.
    ///
    /// # Errors
    /// The first store error, or `Validation` from (de)serialization.
    pub fn put_many(&self, records: &[M]) -> Result<Vec<M>, OdmError> {
        let mut accepted = Vec::with_capacity(records.len());
        for batch in batches(records)? {
            let size = batch.len();
            let result = self.store.put_many(batch)?;
            if !result.failed.is_empty() {
                log::warn!("{}: store rejected {} of {size} items", M::base_name(), result.failed.len());
            }
            log::info!(target: AUDIT_TARGET, "put_many base={} items={}", M::base_name(), result.accepted.len());
            accepted.extend(result.accepted);
        }
        decode_all(&accepted)
    }

    /// Upsert `record`; the key the store assigns is written back to it.
    ///
    /// # Errors
    /// Store errors, or `Validation` from serialization.
    pub fn save(&self, record: &mut M) -> Result<(), OdmError> {
        let saved = self.store.put(codec::serialize(record, &[])?)?;
        let key = key_of(&saved)?;
        log::info!(target: AUDIT_TARGET, "put base={} key={key}", M::base_name());
        record.set_key(Some(key));
        Ok(())
    }

    /// Delete `record` from the store and clear its key. The value itself is left intact.
    ///
    /// # Errors
    /// `MissingKey` (without contacting the store) when the record has no key.
    pub fn delete(&self, record: &mut M) -> Result<(), OdmError> {
        let key = assigned_key(record)?;
        self.delete_key(&key)?;
        record.set_key(None);
        Ok(())
    }
}
