//! Per-record-type store handles, built on first use and shared afterwards.

use crate::async_model::{AsyncRepo, AsyncStore};
use crate::config::OdmConfig;
use crate::errors::OdmError;
use crate::model::{Model, Repo};
use crate::store::Store;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

type Factory<S> = Box<dyn Fn(&OdmConfig, &str) -> Result<Arc<S>, OdmError> + Send + Sync>;

/// Lazily connects each record type to its store base.
///
/// The factory is called with the resolved configuration and the record's
/// [`Model::base_name`], at most once per record type even when several
/// threads ask for the same type concurrently. A failed construction is not
/// cached; the next call retries. A record type that names its own
/// [`Model::project_key`] gets a copy of the configuration carrying that key.
pub struct StoreRegistry<S: ?Sized + Send + Sync + 'static = dyn Store> {
    config: OdmConfig,
    factory: Factory<S>,
    cells: RwLock<HashMap<TypeId, Arc<OnceCell<Arc<S>>>>>,
}

impl<S: ?Sized + Send + Sync + 'static> StoreRegistry<S> {
    /// # Errors
    /// `Configuration` when `config` carries no usable project key.
    pub fn new<F>(config: OdmConfig, factory: F) -> Result<Self, OdmError>
    where
        F: Fn(&OdmConfig, &str) -> Result<Arc<S>, OdmError> + Send + Sync + 'static,
    {
        config.require_project_key()?;
        Ok(Self { config, factory: Box::new(factory), cells: RwLock::new(HashMap::new()) })
    }

    #[must_use]
    pub const fn config(&self) -> &OdmConfig {
        &self.config
    }

    /// The store for record type `M`, constructing it on first use.
    ///
    /// # Errors
    /// `Configuration` for a malformed per-record project key, otherwise whatever the factory returns.
    pub fn store_for<M: Model>(&self) -> Result<Arc<S>, OdmError> {
        let cell = self.cell(TypeId::of::<M>());
        let store = cell.get_or_try_init(|| {
            let base = M::base_name();
            log::debug!("connecting store base '{base}'");
            match M::project_key() {
                Some(key) => {
                    let config = self.config.clone().with_project_key(key);
                    config.require_project_key()?;
                    (self.factory)(&config, &base)
                }
                None => (self.factory)(&self.config, &base),
            }
        })?;
        Ok(Arc::clone(store))
    }

    #[must_use]
    pub fn is_connected<M: Model>(&self) -> bool {
        self.cells.read().get(&TypeId::of::<M>()).is_some_and(|c| c.get().is_some())
    }

    fn cell(&self, id: TypeId) -> Arc<OnceCell<Arc<S>>> {
        if let Some(cell) = self.cells.read().get(&id) {
            return Arc::clone(cell);
        }
        Arc::clone(self.cells.write().entry(id).or_default())
    }
}

impl StoreRegistry<dyn Store> {
    /// # Errors
    /// Whatever the factory returns.
    pub fn repo<M: Model>(&self) -> Result<Repo<M>, OdmError> {
        Ok(Repo::new(self.store_for::<M>()?))
    }
}

impl<S: AsyncStore + 'static> StoreRegistry<S> {
    /// # Errors
    /// Whatever the factory returns.
    pub fn async_repo<M: Model>(&self) -> Result<AsyncRepo<M, S>, OdmError> {
        Ok(AsyncRepo::new(self.store_for::<M>()?))
    }
}
