//! Async counterpart of [`crate::model::Repo`] over a non-blocking store.

use crate::codec;
use crate::errors::OdmError;
use crate::logger::AUDIT_TARGET;
use crate::model::{Model, assigned_key, batches, decode_all, key_of, require_key};
use crate::query::Query;
use crate::store::{FetchPage, PutManyResult};
use crate::types::{Filter, Item};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Non-blocking store seam; same contract as [`crate::store::Store`].
pub trait AsyncStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Item>, OdmError>> + Send;

    fn fetch(
        &self,
        filter: Option<&Filter>,
        last: Option<&str>,
    ) -> impl Future<Output = Result<FetchPage, OdmError>> + Send;

    fn put(&self, item: Item) -> impl Future<Output = Result<Item, OdmError>> + Send;

    fn put_many(&self, items: Vec<Item>) -> impl Future<Output = Result<PutManyResult, OdmError>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), OdmError>> + Send;
}

/// Follow `last` cursors until the store reports the final page.
///
/// # Errors
/// The first failing page.
pub async fn fetch_all_async<S: AsyncStore + ?Sized>(
    store: &S,
    filter: Option<&Filter>,
) -> Result<Vec<Item>, OdmError> {
    let mut page = store.fetch(filter, None).await?;
    let mut items = std::mem::take(&mut page.items);
    while let Some(last) = page.last.take() {
        page = store.fetch(filter, Some(&last)).await?;
        items.append(&mut page.items);
    }
    Ok(items)
}

pub struct AsyncRepo<M: Model, S: AsyncStore> {
    store: Arc<S>,
    _record: PhantomData<fn() -> M>,
}

impl<M: Model, S: AsyncStore> Clone for AsyncRepo<M, S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), _record: PhantomData }
    }
}

impl<M: Model, S: AsyncStore> AsyncRepo<M, S> {
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store, _record: PhantomData }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// # Errors
    /// `MissingKey` for an empty key; `NotFound` when nothing valid is stored under it.
    pub async fn get(&self, key: &str) -> Result<M, OdmError> {
        require_key(key)?;
        let item = self.store.get(key).await?;
        codec::deserialize_found(item, key)
    }

    /// # Errors
    /// `MissingKey` for an empty key, or any store error.
    pub async fn get_or_none(&self, key: &str) -> Result<Option<M>, OdmError> {
        match self.get(key).await {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// # Errors
    /// Store errors, or `Validation` for a stored item that does not fit the record.
    pub async fn get_all(&self) -> Result<Vec<M>, OdmError> {
        let items = fetch_all_async(self.store.as_ref(), None).await?;
        decode_all(&items)
    }

    /// # Errors
    /// Store errors, or `Validation` for a stored item that does not fit the record.
    pub async fn query(&self, query: impl Into<Query>) -> Result<Vec<M>, OdmError> {
        let filter = query.into().to_filter();
        let items = fetch_all_async(self.store.as_ref(), Some(&filter)).await?;
        log::debug!("{}: query matched {} items", M::base_name(), items.len());
        decode_all(&items)
    }

    /// # Errors
    /// `MissingKey` for an empty key, or any store error.
    pub async fn delete_key(&self, key: &str) -> Result<(), OdmError> {
        require_key(key)?;
        self.store.delete(key).await?;
        log::info!(target: AUDIT_TARGET, "delete base={} key={key}", M::base_name());
        Ok(())
    }

    /// Store many records, 25 per store call; batches are awaited in order and never rolled back.
    ///
    /// # Errors
    /// The first store error, or `Validation` from (de)serialization.
    pub async fn put_many(&self, records: &[M]) -> Result<Vec<M>, OdmError> {
        let mut accepted = Vec::with_capacity(records.len());
        for batch in batches(records)? {
            let result = self.store.put_many(batch).await?;
            if !result.failed.is_empty() {
                log::warn!("{}: store rejected {} items", M::base_name(), result.failed.len());
            }
            log::info!(target: AUDIT_TARGET, "put_many base={} items={}", M::base_name(), result.accepted.len());
            accepted.extend(result.accepted);
        }
        decode_all(&accepted)
    }

    /// # Errors
    /// Store errors, or `Validation` from serialization.
    pub async fn save(&self, record: &mut M) -> Result<(), OdmError> {
        let item = codec::serialize(record, &[])?;
        let saved = self.store.put(item).await?;
        let key = key_of(&saved)?;
        log::info!(target: AUDIT_TARGET, "put base={} key={key}", M::base_name());
        record.set_key(Some(key));
        Ok(())
    }

    /// # Errors
    /// `MissingKey` (without contacting the store) when the record has no key.
    pub async fn delete(&self, record: &mut M) -> Result<(), OdmError> {
        let key = assigned_key(record)?;
        self.delete_key(&key).await?;
        record.set_key(None);
        Ok(())
    }
}
