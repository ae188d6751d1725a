//! Filter expressions, field selection and paging options for store lookups.
//!
//! Requests carry their filter as Mongo-style lookup JSON in the query string:
//!
//! ```ignore
//! use restlayer_core::query::Expr;
//!
//! let expr = Expr::from_lookup(r#"{"status": "active", "age": {"$gte": 18}}"#)?;
//! ```
//!
//! The lookup is parsed once into an [`Expr`] tree so every model evaluates the same
//! AST, either directly (in-memory) or by translating it with a [`QueryVisitor`]
//! (MongoDB).
//!
//! # Lookup grammar
//!
//! - `{"field": value}` - equality (array fields match when they contain the value)
//! - `{"field": {"$eq" | "$ne" | "$gt" | "$gte" | "$lt" | "$lte": value}}`
//! - `{"field": {"$in" | "$nin": [values]}}`
//! - `{"field": {"$exists": bool}}`
//! - `{"field": {"$not": {operators}}}`
//! - `{"$and" | "$or" | "$nor": [lookups]}`
//!
//! Several keys in one object are combined with AND. Field names may use dotted paths.

use serde_json::{Map, Value};

use crate::error::{RestError, RestResult};

/// Comparison applied by [`Expr::Field`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    /// Equal to (exact match, or membership when the field is an array).
    Eq,
    /// Not equal to.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
    /// Field equals, or array field contains, any of the values.
    AnyOf,
    /// Field equals, and array field contains, none of the values.
    NoneOf,
}

impl FieldOp {
    fn from_operator(operator: &str) -> Option<Self> {
        match operator {
            "$eq" => Some(FieldOp::Eq),
            "$ne" => Some(FieldOp::Ne),
            "$gt" => Some(FieldOp::Gt),
            "$gte" => Some(FieldOp::Gte),
            "$lt" => Some(FieldOp::Lt),
            "$lte" => Some(FieldOp::Lte),
            "$in" => Some(FieldOp::AnyOf),
            "$nin" => Some(FieldOp::NoneOf),
            _ => None,
        }
    }
}

/// Parsed lookup filter.
///
/// The empty conjunction `And([])` matches every record and is what an absent lookup
/// parses to.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Every child matches.
    And(Vec<Expr>),
    /// At least one child matches.
    Or(Vec<Expr>),
    /// The child does not match. `$nor` parses to `Not(Or(..))`.
    Not(Box<Expr>),
    /// `$exists`: the field is present (`true`) or absent (`false`).
    Exists(String, bool),
    /// Compares the value at a field path.
    Field {
        /// The field name (or dotted path) to compare.
        field: String,
        op: FieldOp,
        value: Value,
    },
}

impl Default for Expr {
    fn default() -> Self {
        Expr::empty()
    }
}

impl Expr {
    /// The filter that matches every record.
    pub fn empty() -> Self {
        Expr::And(Vec::new())
    }

    /// Returns true for the match-everything filter.
    pub fn is_empty(&self) -> bool {
        matches!(self, Expr::And(list) if list.is_empty())
    }

    /// Creates a field comparison expression.
    pub fn field(field: String, op: FieldOp, value: Value) -> Self {
        Expr::Field { field, op, value }
    }

    /// Conjunction with `other`, flattening into an existing `And`.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Disjunction with `other`, flattening into an existing `Or`.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }

    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// Parses serialized lookup JSON into an expression.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::MalformedFilter`] when the text is not valid JSON, is not an
    /// object, or uses an unknown operator.
    pub fn from_lookup(text: &str) -> RestResult<Expr> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| RestError::MalformedFilter(e.to_string()))?;

        Expr::from_value(&value)
    }

    /// Builds an expression from an already decoded lookup object.
    pub fn from_value(value: &Value) -> RestResult<Expr> {
        let map = value
            .as_object()
            .ok_or_else(|| RestError::MalformedFilter("lookup must be a JSON object".into()))?;

        let mut exprs = Vec::with_capacity(map.len());

        for (key, value) in map {
            match key.as_str() {
                "$and" => exprs.push(Expr::And(Self::parse_list(key, value)?)),
                "$or" => exprs.push(Expr::Or(Self::parse_list(key, value)?)),
                "$nor" => exprs.push(Expr::Or(Self::parse_list(key, value)?).not()),
                operator if operator.starts_with('$') => {
                    return Err(RestError::MalformedFilter(format!(
                        "unknown top-level operator {operator}"
                    )));
                }
                field => exprs.extend(Self::parse_field(field, value)?),
            }
        }

        Ok(match exprs.len() {
            1 => exprs.remove(0),
            _ => Expr::And(exprs),
        })
    }

    fn parse_list(operator: &str, value: &Value) -> RestResult<Vec<Expr>> {
        value
            .as_array()
            .ok_or_else(|| RestError::MalformedFilter(format!("{operator} expects an array")))?
            .iter()
            .map(Expr::from_value)
            .collect()
    }

    fn parse_field(field: &str, value: &Value) -> RestResult<Vec<Expr>> {
        let operators = match value.as_object() {
            Some(map) if Self::is_operator_map(field, map)? => map,
            Some(_) | None => return Ok(vec![Filter::eq(field, value.clone())]),
        };

        operators
            .iter()
            .map(|(operator, operand)| match operator.as_str() {
                "$exists" => operand
                    .as_bool()
                    .map(|should_exist| Expr::Exists(field.to_string(), should_exist))
                    .ok_or_else(|| {
                        RestError::MalformedFilter(format!("$exists on {field} expects a boolean"))
                    }),
                "$not" => {
                    let inner = Self::parse_field(field, operand)?;
                    Ok(Expr::And(inner).not())
                }
                "$in" | "$nin" if !operand.is_array() => Err(RestError::MalformedFilter(
                    format!("{operator} on {field} expects an array"),
                )),
                _ => FieldOp::from_operator(operator)
                    .map(|op| Expr::field(field.to_string(), op, operand.clone()))
                    .ok_or_else(|| {
                        RestError::MalformedFilter(format!("unknown operator {operator} on {field}"))
                    }),
            })
            .collect()
    }

    /// An object is an operator map when all of its keys are operators. Mixing
    /// operators with plain keys is rejected; an object without operators is a
    /// literal value compared for equality.
    fn is_operator_map(field: &str, map: &Map<String, Value>) -> RestResult<bool> {
        let operators = map.keys().filter(|key| key.starts_with('$')).count();

        match operators {
            0 => Ok(false),
            n if n == map.len() => Ok(true),
            _ => Err(RestError::MalformedFilter(format!(
                "{field} mixes operators and plain keys"
            ))),
        }
    }
}

/// Shorthand constructors for [`Expr`] leaves and groups.
///
/// ```ignore
/// use restlayer_core::query::Filter;
///
/// let expr = Filter::eq("name", "Alice").and(Filter::gt("age", 18));
/// ```
pub struct Filter;

impl Filter {
    /// Matches the record with the given identifier.
    pub fn id(id: impl Into<String>) -> Expr {
        Filter::eq("_id", id.into())
    }

    /// Matches records where the field equals the value.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Eq, value.into())
    }

    /// Matches records where the field does not equal the value.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Ne, value.into())
    }

    /// Matches records where the field is greater than the value.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Gt, value.into())
    }

    /// Matches records where the field is greater than or equal to the value.
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Gte, value.into())
    }

    /// Matches records where the field is less than the value.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Lt, value.into())
    }

    /// Matches records where the field is less than or equal to the value.
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Lte, value.into())
    }

    /// Matches records where the field matches any of the values.
    pub fn any_of(field: impl Into<String>, values: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::AnyOf, values.into())
    }

    /// Matches records where the field matches none of the values.
    pub fn none_of(field: impl Into<String>, values: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::NoneOf, values.into())
    }

    /// Matches records where the field exists.
    pub fn exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), true)
    }

    /// Matches records where the field is missing.
    pub fn not_exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), false)
    }

    /// All expressions must match.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    /// Any expression must match.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }
}

/// Resolves a dotted field path (`address.city`) inside a record.
pub fn field_value<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(record, |current, segment| current.as_object()?.get(segment))
}

/// Projection applied to returned records, parsed from the `keys` parameter.
///
/// Tokens are separated by spaces or commas and may be dotted paths. A token prefixed
/// with `-` excludes the field. When any field is included, only included fields are
/// returned and exclusions other than `-_id` are ignored, as MongoDB cannot mix the
/// two. `_id` is always returned unless explicitly excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelector {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl FieldSelector {
    /// Parses a selector, returning `None` when it names no fields.
    pub fn parse(text: &str) -> Option<Self> {
        let mut selector = FieldSelector::default();

        for token in text
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
        {
            match token.strip_prefix('-') {
                Some(field) if !field.is_empty() => selector.exclude.push(field.to_string()),
                Some(_) => {}
                None => selector.include.push(token.to_string()),
            }
        }

        if selector.include.is_empty() && selector.exclude.is_empty() {
            None
        } else {
            Some(selector)
        }
    }

    /// Fields explicitly requested.
    pub fn includes(&self) -> &[String] {
        &self.include
    }

    /// Fields explicitly removed.
    pub fn excludes(&self) -> &[String] {
        &self.exclude
    }

    fn is_excluded(&self, field: &str) -> bool {
        self.exclude.iter().any(|excluded| excluded == field)
    }

    /// Applies this projection to a record.
    pub fn apply(&self, record: Value) -> Value {
        if !record.is_object() {
            return record;
        }

        if self.include.is_empty() {
            let mut record = record;
            for path in &self.exclude {
                remove_path(&mut record, path);
            }
            return record;
        }

        let mut projected = Map::new();
        if !self.is_excluded("_id") {
            if let Some(id) = record.get("_id") {
                projected.insert("_id".to_string(), id.clone());
            }
        }
        for path in &self.include {
            if let Some(value) = field_value(&record, path) {
                insert_path(&mut projected, path, value.clone());
            }
        }

        Value::Object(projected)
    }
}

fn remove_path(record: &mut Value, path: &str) {
    let (parent, last) = match path.rsplit_once('.') {
        Some((parent, last)) => (parent, last),
        None => ("", path),
    };

    let target = if parent.is_empty() {
        Some(record)
    } else {
        parent
            .split('.')
            .try_fold(record, |current, segment| current.as_object_mut()?.get_mut(segment))
    };

    if let Some(Value::Object(map)) = target {
        map.remove(last);
    }
}

fn insert_path(projected: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = projected;

    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }

        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match entry {
            Value::Object(map) => current = map,
            // A shorter included path already copied this subtree whole.
            _ => return,
        }
    }
}

/// Paging options passed to [`Model::find`](crate::model::Model::find).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Maximum number of records to return; `None` is unbounded.
    pub limit: Option<usize>,
    /// Number of matching records to skip.
    pub skip: usize,
}

pub trait QueryVisitor {
    type Output;
    type Error: Into<RestError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_exists(
        &mut self,
        field: &str,
        should_exist: bool,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Value,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Exists(field, should_exist) => self.visit_exists(field, *should_exist),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
        }
    }
}
