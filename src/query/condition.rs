//! The condition algebra: a single [`Condition`], an AND-group [`Conjunction`] and an
//! OR-group [`Disjunction`] of conditions and conjunctions.
//!
//! Combination rules:
//! - `Condition & Condition` builds a new conjunction (left, right).
//! - `Condition & Conjunction` and `Conjunction & Condition` append the condition to
//!   the existing conjunction, which is returned; `Conjunction & Conjunction` extends
//!   the left one. AND never wraps a conjunction in another node.
//! - AND with a disjunction is rejected: the grouping would be ambiguous.
//!   The operator impls make that a type error; [`Query::and`] reports `InvalidQuery`.
//! - OR always yields a disjunction: conditions and conjunctions are appended to an
//!   existing one, two disjunctions merge their member lists.
//!
//! Combinators consume their operands and reuse the left (or the existing group)
//! operand's storage instead of allocating a new node, so a combined group is the
//! same value its operand was, grown in place.

use crate::errors::OdmError;
use crate::types::Filter;
use serde_json::{Map, Value};
use std::ops::{BitAnd, BitOr};

/// An atomic comparison: `{field_path: operand}` on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    field_path: String,
    operand: Value,
}

impl Condition {
    /// `operand` must already be in wire form (see [`super::Operand::normalize`]).
    #[must_use]
    pub fn new(field_path: impl Into<String>, operand: Value) -> Self {
        Self { field_path: field_path.into(), operand }
    }

    #[must_use]
    pub fn field_path(&self) -> &str {
        &self.field_path
    }

    #[must_use]
    pub const fn operand(&self) -> &Value {
        &self.operand
    }

    #[must_use]
    pub fn as_query(&self) -> Map<String, Value> {
        let mut m = Map::with_capacity(1);
        m.insert(self.field_path.clone(), self.operand.clone());
        m
    }
}

/// An AND-group of conditions, serialized as one merged mapping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Conjunction {
    conditions: Vec<Condition>,
}

impl Conjunction {
    #[must_use]
    pub const fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn extend(&mut self, other: Self) {
        self.conditions.extend(other.conditions);
    }

    /// Merges every member into a single mapping.
    ///
    /// Two members with the same field path collide: the later one wins and a
    /// warning is logged. The store's filter shape has one entry per key.
    #[must_use]
    pub fn as_query(&self) -> Map<String, Value> {
        let mut m = Map::with_capacity(self.conditions.len());
        for c in &self.conditions {
            if m.insert(c.field_path.clone(), c.operand.clone()).is_some() {
                log::warn!(
                    "AND group has more than one condition on '{}'; only the last one is kept",
                    c.field_path
                );
            }
        }
        m
    }
}

/// A member of an OR-group.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Condition(Condition),
    Conjunction(Conjunction),
}

impl Clause {
    #[must_use]
    pub fn as_query(&self) -> Map<String, Value> {
        match self {
            Self::Condition(c) => c.as_query(),
            Self::Conjunction(c) => c.as_query(),
        }
    }
}

impl From<Condition> for Clause {
    fn from(c: Condition) -> Self {
        Self::Condition(c)
    }
}

impl From<Conjunction> for Clause {
    fn from(c: Conjunction) -> Self {
        Self::Conjunction(c)
    }
}

/// An OR-group, serialized as a list of mappings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Disjunction {
    clauses: Vec<Clause>,
}

impl Disjunction {
    #[must_use]
    pub const fn new(clauses: Vec<Clause>) -> Self {
        Self { clauses }
    }

    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn push(&mut self, clause: impl Into<Clause>) {
        self.clauses.push(clause.into());
    }

    pub fn merge(&mut self, other: Self) {
        self.clauses.extend(other.clauses);
    }

    #[must_use]
    pub fn as_query(&self) -> Vec<Map<String, Value>> {
        self.clauses.iter().map(Clause::as_query).collect()
    }
}

impl BitAnd for Condition {
    type Output = Conjunction;
    fn bitand(self, rhs: Self) -> Conjunction {
        Conjunction::new(vec![self, rhs])
    }
}

impl BitAnd<Conjunction> for Condition {
    type Output = Conjunction;
    fn bitand(self, rhs: Conjunction) -> Conjunction {
        rhs & self
    }
}

impl BitAnd<Condition> for Conjunction {
    type Output = Self;
    fn bitand(mut self, rhs: Condition) -> Self {
        self.push(rhs);
        self
    }
}

impl BitAnd for Conjunction {
    type Output = Self;
    fn bitand(mut self, rhs: Self) -> Self {
        self.extend(rhs);
        self
    }
}

impl BitOr for Condition {
    type Output = Disjunction;
    fn bitor(self, rhs: Self) -> Disjunction {
        Disjunction::new(vec![self.into(), rhs.into()])
    }
}

impl BitOr<Conjunction> for Condition {
    type Output = Disjunction;
    fn bitor(self, rhs: Conjunction) -> Disjunction {
        Disjunction::new(vec![self.into(), rhs.into()])
    }
}

impl BitOr<Disjunction> for Condition {
    type Output = Disjunction;
    fn bitor(self, rhs: Disjunction) -> Disjunction {
        rhs | self
    }
}

impl BitOr for Conjunction {
    type Output = Disjunction;
    fn bitor(self, rhs: Self) -> Disjunction {
        Disjunction::new(vec![self.into(), rhs.into()])
    }
}

impl BitOr<Condition> for Conjunction {
    type Output = Disjunction;
    fn bitor(self, rhs: Condition) -> Disjunction {
        Disjunction::new(vec![self.into(), rhs.into()])
    }
}

impl BitOr<Disjunction> for Conjunction {
    type Output = Disjunction;
    fn bitor(self, rhs: Disjunction) -> Disjunction {
        rhs | self
    }
}

impl BitOr<Condition> for Disjunction {
    type Output = Self;
    fn bitor(mut self, rhs: Condition) -> Self {
        self.push(rhs);
        self
    }
}

impl BitOr<Conjunction> for Disjunction {
    type Output = Self;
    fn bitor(mut self, rhs: Conjunction) -> Self {
        self.push(rhs);
        self
    }
}

impl BitOr for Disjunction {
    type Output = Self;
    fn bitor(mut self, rhs: Self) -> Self {
        self.merge(rhs);
        self
    }
}

/// Any node of the algebra, for code that combines expressions chosen at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Condition(Condition),
    Conjunction(Conjunction),
    Disjunction(Disjunction),
}

impl Query {
    /// AND-combine two nodes following the rules in the module docs.
    ///
    /// # Errors
    /// Returns `InvalidQuery` if either side is a disjunction.
    pub fn and(self, rhs: impl Into<Self>) -> Result<Self, OdmError> {
        Ok(match (self, rhs.into()) {
            (Self::Disjunction(_), _) | (_, Self::Disjunction(_)) => {
                return Err(OdmError::InvalidQuery(
                    "incorrect and/or nesting: cannot AND an OR-group".into(),
                ));
            }
            (Self::Condition(a), Self::Condition(b)) => Self::Conjunction(a & b),
            (Self::Condition(a), Self::Conjunction(b)) => Self::Conjunction(a & b),
            (Self::Conjunction(a), Self::Condition(b)) => Self::Conjunction(a & b),
            (Self::Conjunction(a), Self::Conjunction(b)) => Self::Conjunction(a & b),
        })
    }

    /// OR-combine two nodes; always yields a disjunction.
    #[must_use]
    pub fn or(self, rhs: impl Into<Self>) -> Self {
        let d = match (self, rhs.into()) {
            (Self::Disjunction(a), Self::Disjunction(b)) => a | b,
            (Self::Disjunction(a), Self::Condition(b)) => a | b,
            (Self::Disjunction(a), Self::Conjunction(b)) => a | b,
            (Self::Condition(a), Self::Disjunction(b)) => a | b,
            (Self::Conjunction(a), Self::Disjunction(b)) => a | b,
            (Self::Condition(a), Self::Condition(b)) => a | b,
            (Self::Condition(a), Self::Conjunction(b)) => a | b,
            (Self::Conjunction(a), Self::Condition(b)) => a | b,
            (Self::Conjunction(a), Self::Conjunction(b)) => a | b,
        };
        Self::Disjunction(d)
    }

    /// Wire form: a mapping for a condition or AND-group, a list of mappings for an OR-group.
    #[must_use]
    pub fn as_query(&self) -> Value {
        self.to_filter().to_value()
    }

    #[must_use]
    pub fn to_filter(&self) -> Filter {
        match self {
            Self::Condition(c) => Filter::All(c.as_query()),
            Self::Conjunction(c) => Filter::All(c.as_query()),
            Self::Disjunction(d) => Filter::Any(d.as_query()),
        }
    }
}

impl From<Condition> for Query {
    fn from(c: Condition) -> Self {
        Self::Condition(c)
    }
}

impl From<Conjunction> for Query {
    fn from(c: Conjunction) -> Self {
        Self::Conjunction(c)
    }
}

impl From<Disjunction> for Query {
    fn from(d: Disjunction) -> Self {
        Self::Disjunction(d)
    }
}

impl From<Clause> for Query {
    fn from(c: Clause) -> Self {
        match c {
            Clause::Condition(c) => Self::Condition(c),
            Clause::Conjunction(c) => Self::Conjunction(c),
        }
    }
}

impl BitOr for Query {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.or(rhs)
    }
}
