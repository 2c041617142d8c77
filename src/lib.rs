//! Typed records over a key/document store.
//!
//! Records implement [`Model`] and declare their fields in a [`Schema`]; the
//! schema's [`Field`] comparators build [`Condition`]s, which combine with `&`
//! and `|` into the store's filter shape. [`Repo`] and [`AsyncRepo`] move
//! records in and out of a [`Store`] through the schema-driven [`codec`].

pub mod async_model;
pub mod codec;
pub mod config;
pub mod errors;
pub mod logger;
pub mod model;
pub mod query;
pub mod registry;
pub mod schema;
pub mod store;
pub mod temporal;
pub mod types;

pub use async_model::{AsyncRepo, AsyncStore};
pub use config::OdmConfig;
pub use errors::OdmError;
pub use model::{Model, Repo};
pub use query::{Clause, CmpOp, Condition, Conjunction, Disjunction, Field, Operand, Query};
pub use registry::StoreRegistry;
pub use schema::{FieldType, Schema};
pub use store::{FetchPage, MemoryStore, PutManyResult, Store};
pub use types::{Filter, Item};

/// Resolve configuration from the environment and config files, then set up logging from it.
///
/// # Errors
/// Configuration or logging setup failures.
pub fn init() -> Result<OdmConfig, OdmError> {
    let config = OdmConfig::load(None)?;
    logger::configure_from(&config)?;
    Ok(config)
}
