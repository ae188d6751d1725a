//! Translation from restlayer filter expressions to MongoDB query documents.

use bson::{Bson, Document, doc, oid::ObjectId, ser::serialize_to_bson};
use serde_json::Value;

use restlayer_core::{
    error::RestError,
    query::{Expr, FieldOp, FieldSelector, QueryVisitor},
};

/// Translates [`Expr`] trees into MongoDB's native BSON query syntax.
///
/// Values compared against `_id` that parse as an [`ObjectId`] are converted to one, so
/// lookups written against the hex form of generated ids keep working.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    pub fn translate(expr: &Expr) -> Result<Document, RestError> {
        MongoQueryTranslator.visit_expr(expr)
    }

    fn value(field: &str, value: &Value) -> Result<Bson, RestError> {
        if field == "_id" {
            return Ok(match value {
                Value::String(id) => id_value(id),
                Value::Array(ids) => Bson::Array(
                    ids.iter()
                        .map(|id| Self::value(field, id))
                        .collect::<Result<Vec<_>, _>>()?,
                ),
                other => to_bson(other)?,
            });
        }

        to_bson(value)
    }
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = RestError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        // `$and` rejects an empty array; the empty conjunction matches everything.
        if exprs.is_empty() {
            return Ok(doc! {});
        }

        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        // Top-level `$not` is not valid MongoDB syntax.
        Ok(doc! {
            "$nor": [self.visit_expr(expr)?],
        })
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: { "$exists": should_exist },
        })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Value) -> Result<Self::Output, Self::Error> {
        let value = Self::value(field, value)?;

        Ok(doc! {
            field: match op {
                FieldOp::Eq => doc! { "$eq": value },
                FieldOp::Ne => doc! { "$ne": value },
                FieldOp::Gt => doc! { "$gt": value },
                FieldOp::Gte => doc! { "$gte": value },
                FieldOp::Lt => doc! { "$lt": value },
                FieldOp::Lte => doc! { "$lte": value },
                FieldOp::AnyOf => doc! { "$in": value },
                FieldOp::NoneOf => doc! { "$nin": value },
            }
        })
    }
}

/// Builds the projection document for a field selector.
///
/// MongoDB cannot mix inclusions and exclusions (except for `_id`), so when fields are
/// included the remaining exclusions only matter for `_id`.
pub(crate) fn projection(fields: &FieldSelector) -> Document {
    let mut projection = Document::new();

    if fields.includes().is_empty() {
        for field in fields.excludes() {
            projection.insert(field.as_str(), 0);
        }
    } else {
        for field in fields.includes() {
            projection.insert(field.as_str(), 1);
        }
        if fields.excludes().iter().any(|field| field == "_id") {
            projection.insert("_id", 0);
        }
    }

    projection
}

/// The `_id` value for an identifier taken from a request path.
pub(crate) fn id_value(id: &str) -> Bson {
    match ObjectId::parse_str(id) {
        Ok(oid) => Bson::ObjectId(oid),
        Err(_) => Bson::String(id.to_string()),
    }
}

pub(crate) fn to_bson(value: &Value) -> Result<Bson, RestError> {
    serialize_to_bson(value).map_err(|e| RestError::Serialization(e.to_string()))
}
