//! Filter evaluation for in-memory record matching.
//!
//! This module walks an [`Expr`] tree against a single JSON record, following the
//! MongoDB matching rules the lookup grammar is modelled on: equality against an array
//! field matches when any element is equal, and `$ne`/`$nin` match records that lack
//! the field entirely.

use serde_json::{Map, Value};
use std::cmp::Ordering;

use restlayer_core::{
    error::RestError,
    query::{Expr, FieldOp, QueryVisitor, field_value},
};

/// Comparable view of a JSON value.
///
/// All numbers are normalised to `f64` so `3` and `3.0` compare equal.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(&'a Map<String, Value>),
}

impl<'a> From<&'a Value> for Comparable<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Comparable::Null,
            Value::Bool(value) => Comparable::Bool(*value),
            Value::Number(value) => value
                .as_f64()
                .map(Comparable::Number)
                .unwrap_or(Comparable::Null),
            Value::String(value) => Comparable::String(value),
            Value::Array(items) => Comparable::Array(items.iter().map(Comparable::from).collect()),
            Value::Object(map) => Comparable::Map(map),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl<'a> Comparable<'a> {
    /// Equality, or membership when `self` is an array and `other` is not.
    fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Array(items), single) if !matches!(single, Comparable::Array(_)) => {
                items.iter().any(|item| item == single)
            }
            _ => self == other,
        }
    }

    /// Ordering test; an array field satisfies it when any element does.
    fn satisfies(&self, other: &Self, accept: fn(Ordering) -> bool) -> bool {
        match self {
            Comparable::Array(items) => items.iter().any(|item| item.satisfies(other, accept)),
            _ => self.partial_cmp(other).is_some_and(accept),
        }
    }
}

pub(crate) struct RecordEvaluator<'a> {
    record: &'a Value,
}

impl<'a> RecordEvaluator<'a> {
    pub fn new(record: &'a Value) -> Self {
        Self { record }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<bool, RestError> {
        self.visit_expr(expr)
    }

    /// Returns the records matching `expr`, in their original order.
    pub fn filter_records(
        records: impl IntoIterator<Item = &'a Value>,
        expr: &Expr,
    ) -> Result<Vec<&'a Value>, RestError> {
        let mut matched = Vec::new();

        for record in records {
            if RecordEvaluator::new(record).evaluate(expr)? {
                matched.push(record);
            }
        }

        Ok(matched)
    }
}

impl<'a> QueryVisitor for RecordEvaluator<'a> {
    type Output = bool;
    type Error = RestError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(field_value(self.record, field).is_some() == should_exist)
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Value) -> Result<Self::Output, Self::Error> {
        let Some(field_value) = field_value(self.record, field) else {
            // A missing field only satisfies the negative operators, or equality with null.
            return Ok(match op {
                FieldOp::Ne | FieldOp::NoneOf => true,
                FieldOp::Eq => value.is_null(),
                _ => false,
            });
        };

        let left = Comparable::from(field_value);
        let right = Comparable::from(value);

        Ok(match op {
            FieldOp::Eq => left.matches(&right),
            FieldOp::Ne => !left.matches(&right),
            FieldOp::Gt => left.satisfies(&right, Ordering::is_gt),
            FieldOp::Gte => left.satisfies(&right, Ordering::is_ge),
            FieldOp::Lt => left.satisfies(&right, Ordering::is_lt),
            FieldOp::Lte => left.satisfies(&right, Ordering::is_le),
            FieldOp::AnyOf => any_of(&left, &right),
            FieldOp::NoneOf => !any_of(&left, &right),
        })
    }
}

fn any_of(left: &Comparable<'_>, candidates: &Comparable<'_>) -> bool {
    match candidates {
        Comparable::Array(candidates) => candidates.iter().any(|candidate| left.matches(candidate)),
        single => left.matches(single),
    }
}
