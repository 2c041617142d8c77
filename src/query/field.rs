use super::condition::Condition;
use super::operand::{Operand, compare_numbers};
use crate::errors::OdmError;
use crate::schema::FieldType;
use serde_json::Value;
use std::cmp::Ordering;

/// Comparison operators with their wire tags (`<field>?<tag>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
}

impl CmpOp {
    /// Wire suffix; equality uses the bare field name.
    #[must_use]
    pub const fn tag(self) -> Option<&'static str> {
        match self {
            Self::Eq => None,
            Self::Ne => Some("ne"),
            Self::Lt => Some("lt"),
            Self::Gt => Some("gt"),
            Self::Lte => Some("lte"),
            Self::Gte => Some("gte"),
        }
    }
}

/// A declared record field, acting as the entry point for building conditions on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    ty: FieldType,
}

impl Field {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self { name: name.into(), ty }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn field_type(&self) -> &FieldType {
        &self.ty
    }

    /// # Errors
    /// `TypeMismatch` when `value` does not fit the declared field type.
    pub fn compare(&self, op: CmpOp, value: impl Into<Operand>) -> Result<Condition, OdmError> {
        let operand = self.checked(value.into())?;
        let path = match op.tag() {
            None => self.name.clone(),
            Some(tag) => self.path(tag),
        };
        Ok(Condition::new(path, operand.normalize()))
    }

    /// # Errors
    /// `TypeMismatch` when `value` does not fit the declared field type.
    pub fn equals(&self, value: impl Into<Operand>) -> Result<Condition, OdmError> {
        self.compare(CmpOp::Eq, value)
    }

    /// # Errors
    /// `TypeMismatch` when `value` does not fit the declared field type.
    pub fn not_equals(&self, value: impl Into<Operand>) -> Result<Condition, OdmError> {
        self.compare(CmpOp::Ne, value)
    }

    /// # Errors
    /// `TypeMismatch` when `value` does not fit the declared field type.
    pub fn less_than(&self, value: impl Into<Operand>) -> Result<Condition, OdmError> {
        self.compare(CmpOp::Lt, value)
    }

    /// # Errors
    /// `TypeMismatch` when `value` does not fit the declared field type.
    pub fn greater_than(&self, value: impl Into<Operand>) -> Result<Condition, OdmError> {
        self.compare(CmpOp::Gt, value)
    }

    /// # Errors
    /// `TypeMismatch` when `value` does not fit the declared field type.
    pub fn less_or_equal(&self, value: impl Into<Operand>) -> Result<Condition, OdmError> {
        self.compare(CmpOp::Lte, value)
    }

    /// # Errors
    /// `TypeMismatch` when `value` does not fit the declared field type.
    pub fn greater_or_equal(&self, value: impl Into<Operand>) -> Result<Condition, OdmError> {
        self.compare(CmpOp::Gte, value)
    }

    /// Match values starting with `value`. String fields only.
    ///
    /// # Errors
    /// `InvalidQuery` on a non-string field or a non-string argument.
    pub fn prefix(&self, value: impl Into<Operand>) -> Result<Condition, OdmError> {
        match value.into() {
            Operand::Str(s) if *self.ty.effective() == FieldType::Str => {
                Ok(Condition::new(self.path("pfx"), Value::String(s)))
            }
            _ => Err(OdmError::InvalidQuery(format!(
                "prefix is only valid for string fields with a string argument ('{}' is {})",
                self.name, self.ty
            ))),
        }
    }

    /// Inclusive range `[lower, upper]`. Numeric and temporal fields only; bounds
    /// are compared after normalization and `upper` must be strictly greater.
    ///
    /// # Errors
    /// `InvalidQuery` for other field types, bounds that do not fit the field, or `upper <= lower`.
    pub fn range(
        &self,
        lower: impl Into<Operand>,
        upper: impl Into<Operand>,
    ) -> Result<Condition, OdmError> {
        if !(self.ty.is_numeric() || self.ty.is_temporal()) {
            return Err(OdmError::InvalidQuery(format!(
                "range is only valid for numeric or temporal fields ('{}' is {})",
                self.name, self.ty
            )));
        }
        let (lower, upper) = (lower.into(), upper.into());
        for (label, bound) in [("lower", &lower), ("upper", &upper)] {
            if matches!(bound, Operand::Null) || !bound.fits(&self.ty) {
                return Err(OdmError::InvalidQuery(format!(
                    "{label} bound must be {} for field '{}', got {}",
                    self.ty.effective(),
                    self.name,
                    bound.kind()
                )));
            }
        }
        let (lo, hi) = (lower.normalize(), upper.normalize());
        if compare_numbers(&lo, &hi) != Some(Ordering::Less) {
            return Err(OdmError::InvalidQuery(format!(
                "range on '{}': lower bound {lo} must be less than upper bound {hi}",
                self.name
            )));
        }
        Ok(Condition::new(self.path("r"), Value::Array(vec![lo, hi])))
    }

    /// # Errors
    /// `InvalidQuery` unless the field is a string or list of strings and `value` is a string.
    pub fn contains(&self, value: impl Into<Operand>) -> Result<Condition, OdmError> {
        self.text_search("contains", value.into())
    }

    /// # Errors
    /// `InvalidQuery` unless the field is a string or list of strings and `value` is a string.
    pub fn not_contains(&self, value: impl Into<Operand>) -> Result<Condition, OdmError> {
        self.text_search("not_contains", value.into())
    }

    fn text_search(&self, tag: &str, value: Operand) -> Result<Condition, OdmError> {
        match value {
            Operand::Str(s) if self.ty.is_text_searchable() => {
                Ok(Condition::new(self.path(tag), Value::String(s)))
            }
            _ => Err(OdmError::InvalidQuery(format!(
                "{tag} is only valid for strings or lists of strings with a string argument ('{}' is {})",
                self.name, self.ty
            ))),
        }
    }

    fn checked(&self, operand: Operand) -> Result<Operand, OdmError> {
        if operand.fits(&self.ty) {
            Ok(operand)
        } else {
            Err(OdmError::TypeMismatch {
                field: self.name.clone(),
                expected: self.ty.to_string(),
                found: operand.kind().to_string(),
            })
        }
    }

    fn path(&self, tag: &str) -> String {
        format!("{}?{tag}", self.name)
    }
}
