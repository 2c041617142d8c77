use super::{FetchPage, PutManyResult, Store, matches};
use crate::async_model::AsyncStore;
use crate::errors::OdmError;
use crate::types::{Filter, Item, KEY_FIELD, PUT_MANY_LIMIT};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::ops::Bound;

pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// In-process store with the same paging and batch limits as the hosted one.
///
/// Items are kept in key order, so pagination cursors are stable.
#[derive(Debug)]
pub struct MemoryStore {
    items: RwLock<BTreeMap<String, Item>>,
    page_size: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// A zero page size is treated as one.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        Self { items: RwLock::new(BTreeMap::new()), page_size: page_size.max(1) }
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    fn keyed(mut item: Item) -> Result<(String, Item), OdmError> {
        let key = match item.get(KEY_FIELD) {
            None | Some(Value::Null) => uuid::Uuid::new_v4().simple().to_string(),
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(other) => {
                return Err(OdmError::Store(format!("item key must be a non-empty string, got {other}")));
            }
        };
        item.insert(KEY_FIELD.to_owned(), Value::String(key.clone()));
        Ok((key, item))
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Item>, OdmError> {
        Ok(self.items.read().get(key).cloned())
    }

    fn fetch(&self, filter: Option<&Filter>, last: Option<&str>) -> Result<FetchPage, OdmError> {
        let guard = self.items.read();
        let start = last.map_or(Bound::Unbounded, |k| Bound::Excluded(k.to_owned()));
        let mut items = Vec::new();
        let mut more = false;
        for (_, item) in guard.range::<String, _>((start, Bound::Unbounded)) {
            let selected = match filter {
                Some(f) => matches(item, f)?,
                None => true,
            };
            if !selected {
                continue;
            }
            if items.len() == self.page_size {
                more = true;
                break;
            }
            items.push(item.clone());
        }
        let last = if more {
            items.last().and_then(|i| i.get(KEY_FIELD)).and_then(Value::as_str).map(str::to_owned)
        } else {
            None
        };
        Ok(FetchPage { items, last })
    }

    fn put(&self, item: Item) -> Result<Item, OdmError> {
        let (key, item) = Self::keyed(item)?;
        self.items.write().insert(key, item.clone());
        Ok(item)
    }

    fn put_many(&self, items: Vec<Item>) -> Result<PutManyResult, OdmError> {
        if items.len() > PUT_MANY_LIMIT {
            return Err(OdmError::Store(format!(
                "put_many accepts at most {PUT_MANY_LIMIT} items, got {}",
                items.len()
            )));
        }
        let mut result = PutManyResult::default();
        let mut guard = self.items.write();
        for item in items {
            match Self::keyed(item.clone()) {
                Ok((key, stored)) => {
                    guard.insert(key, stored.clone());
                    result.accepted.push(stored);
                }
                Err(e) => {
                    log::debug!("put_many rejected item: {e}");
                    result.failed.push(item);
                }
            }
        }
        Ok(result)
    }

    fn delete(&self, key: &str) -> Result<(), OdmError> {
        self.items.write().remove(key);
        Ok(())
    }
}

impl AsyncStore for MemoryStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Item>, OdmError>> + Send {
        std::future::ready(Store::get(self, key))
    }

    fn fetch(
        &self,
        filter: Option<&Filter>,
        last: Option<&str>,
    ) -> impl Future<Output = Result<FetchPage, OdmError>> + Send {
        std::future::ready(Store::fetch(self, filter, last))
    }

    fn put(&self, item: Item) -> impl Future<Output = Result<Item, OdmError>> + Send {
        std::future::ready(Store::put(self, item))
    }

    fn put_many(&self, items: Vec<Item>) -> impl Future<Output = Result<PutManyResult, OdmError>> + Send {
        std::future::ready(Store::put_many(self, items))
    }

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), OdmError>> + Send {
        std::future::ready(Store::delete(self, key))
    }
}
