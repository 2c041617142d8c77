//! Declared field types of a record and the per-record field registry.
//!
//! A [`Schema`] is built once per record type. Building it constructs one
//! [`Field`] comparator per declared field, indexed by name, so query
//! expressions look fields up explicitly instead of through attribute magic.

use crate::errors::OdmError;
use crate::query::Field;
use crate::types::KEY_FIELD;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Str,
    Int,
    Float,
    Bool,
    /// Free-form JSON mapping.
    Map,
    /// Nested sub-record, stored as a plain mapping of its fields.
    Record,
    Date,
    Time,
    DateTime,
    /// Validated scalar types (e-mail, IP address, ...) stored in their canonical JSON form.
    Custom,
    List(Box<FieldType>),
    Optional(Box<FieldType>),
}

impl FieldType {
    #[must_use]
    pub fn list(inner: Self) -> Self {
        Self::List(Box::new(inner))
    }

    #[must_use]
    pub fn optional(inner: Self) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// The type with any `Optional` wrappers removed.
    #[must_use]
    pub fn effective(&self) -> &Self {
        match self {
            Self::Optional(inner) => inner.effective(),
            other => other,
        }
    }

    #[must_use]
    pub const fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// Types the store holds natively: scalars, mappings, and lists of those.
    #[must_use]
    pub fn is_basic(&self) -> bool {
        match self.effective() {
            Self::Str | Self::Int | Self::Float | Self::Bool | Self::Map => true,
            Self::List(inner) => inner.is_basic(),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self.effective(), Self::Int | Self::Float)
    }

    #[must_use]
    pub fn is_temporal(&self) -> bool {
        matches!(self.effective(), Self::Date | Self::Time | Self::DateTime)
    }

    /// Plain strings and lists of strings accept `contains` / `not_contains`.
    #[must_use]
    pub fn is_text_searchable(&self) -> bool {
        match self.effective() {
            Self::Str => true,
            Self::List(inner) => *inner.effective() == Self::Str,
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str => f.write_str("string"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Bool => f.write_str("bool"),
            Self::Map => f.write_str("mapping"),
            Self::Record => f.write_str("record"),
            Self::Date => f.write_str("date"),
            Self::Time => f.write_str("time"),
            Self::DateTime => f.write_str("datetime"),
            Self::Custom => f.write_str("custom"),
            Self::List(inner) => write!(f, "list[{inner}]"),
            Self::Optional(inner) => write!(f, "optional[{inner}]"),
        }
    }
}

/// Declared fields of one record type, in declaration order.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<Field>,
    index: HashMap<String, usize>,
}

impl Schema {
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// The comparator registered for `name`.
    ///
    /// # Errors
    /// Returns `InvalidQuery` when the record declares no such field.
    pub fn field(&self, name: &str) -> Result<&Field, OdmError> {
        self.get(name).ok_or_else(|| OdmError::InvalidQuery(format!("unknown field '{name}'")))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Collects field declarations; the primary key field is always registered first.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    declared: Vec<(String, FieldType)>,
}

impl SchemaBuilder {
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.declared.push((name.into(), ty));
        self
    }

    /// # Errors
    /// Returns `InvalidQuery` for empty or duplicate field names (including a re-declared `key`).
    pub fn build(self) -> Result<Schema, OdmError> {
        let mut fields = Vec::with_capacity(self.declared.len() + 1);
        let mut index = HashMap::with_capacity(self.declared.len() + 1);
        let key = std::iter::once((KEY_FIELD.to_string(), FieldType::optional(FieldType::Str)));
        for (name, ty) in key.chain(self.declared) {
            if name.is_empty() {
                return Err(OdmError::InvalidQuery("field name cannot be empty".into()));
            }
            if index.contains_key(&name) {
                return Err(OdmError::InvalidQuery(format!("field '{name}' declared twice")));
            }
            index.insert(name.clone(), fields.len());
            fields.push(Field::new(name, ty));
        }
        Ok(Schema { fields, index })
    }
}
