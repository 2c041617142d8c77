//! Key-value store seam. Items are flat JSON mappings addressed by their `key` field.

mod eval;
mod memory;

pub use eval::matches;
pub use memory::{DEFAULT_PAGE_SIZE, MemoryStore};

use crate::errors::OdmError;
use crate::types::{Filter, Item};

/// One page of a fetch. `last` is the cursor for the next page, `None` on the final page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchPage {
    pub items: Vec<Item>,
    pub last: Option<String>,
}

/// Outcome of a batch write: stored items (with their keys) and rejected ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PutManyResult {
    pub accepted: Vec<Item>,
    pub failed: Vec<Item>,
}

/// A named base of items. Implementations must be shareable across threads.
pub trait Store: Send + Sync {
    /// Item stored under `key`, if any.
    ///
    /// # Errors
    /// Backend failures.
    fn get(&self, key: &str) -> Result<Option<Item>, OdmError>;

    /// One page of items matching `filter` (all items when `None`), resuming after `last`.
    ///
    /// # Errors
    /// `InvalidQuery` for a filter the backend cannot evaluate, or backend failures.
    fn fetch(&self, filter: Option<&Filter>, last: Option<&str>) -> Result<FetchPage, OdmError>;

    /// Upsert one item, assigning a key when it has none. Returns the stored item.
    ///
    /// # Errors
    /// Backend failures.
    fn put(&self, item: Item) -> Result<Item, OdmError>;

    /// Upsert at most 25 items in one call.
    ///
    /// # Errors
    /// `Store` when the batch is too large, or backend failures.
    fn put_many(&self, items: Vec<Item>) -> Result<PutManyResult, OdmError>;

    /// Remove the item under `key`. Deleting an absent key is not an error.
    ///
    /// # Errors
    /// Backend failures.
    fn delete(&self, key: &str) -> Result<(), OdmError>;
}

/// Follow `last` cursors until the store reports the final page.
///
/// # Errors
/// The first failing page.
pub fn fetch_all(store: &dyn Store, filter: Option<&Filter>) -> Result<Vec<Item>, OdmError> {
    let mut page = store.fetch(filter, None)?;
    let mut items = std::mem::take(&mut page.items);
    while let Some(last) = page.last.take() {
        page = store.fetch(filter, Some(&last))?;
        items.append(&mut page.items);
    }
    Ok(items)
}
