//! The four built-in method operations.
//!
//! Each operation reads the descriptor and request from the context, makes its store
//! calls, and writes its own success response. Store failures are returned unchanged;
//! operations never write a response on error.
//!
//! | Method | Store calls | Body | Status |
//! |---|---|---|---|
//! | read | `find_by_id` or `find` | record or array | 200 |
//! | create | `create` | `{"ok": record}` | 201 |
//! | update | `update` (without `_id`) | `{"ok": affected}` | 201 |
//! | delete | `find_by_id`, then `remove` | `{"ok": 1}` | 201 |

use http::StatusCode;
use serde_json::{Map, Value, json};

use crate::{
    context::PipelineContext,
    descriptor::Method,
    error::{RestError, RestResult},
};

/// Runs the operation selected by the descriptor's method.
pub async fn execute(ctx: &mut PipelineContext) -> RestResult<()> {
    match ctx.descriptor().method() {
        Method::Read => read(ctx).await,
        Method::Create => create(ctx).await,
        Method::Update => update(ctx).await,
        Method::Delete => delete(ctx).await,
    }
}

async fn read(ctx: &mut PipelineContext) -> RestResult<()> {
    let model = ctx.model().clone();
    let query = ctx.descriptor().query();

    let body = match ctx.descriptor().id() {
        Some(id) => model
            .find_by_id(id, query.fields.as_ref())
            .await?
            .ok_or_else(|| not_found(ctx, id))?,
        None => Value::Array(
            model
                .find(&query.filter, query.fields.as_ref(), query.find_options())
                .await?,
        ),
    };

    ctx.response.json(body, StatusCode::OK);

    Ok(())
}

async fn create(ctx: &mut PipelineContext) -> RestResult<()> {
    let data = body_object(ctx)?;
    let created = ctx.model().create(Value::Object(data)).await?;

    ctx.response.json(json!({ "ok": created }), StatusCode::CREATED);

    Ok(())
}

async fn update(ctx: &mut PipelineContext) -> RestResult<()> {
    let id = record_id(ctx)?;
    let mut data = body_object(ctx)?;

    // Identity is never rewritten through an update.
    data.remove("_id");

    let affected = ctx.model().update(&id, data).await?;

    ctx.response.json(json!({ "ok": affected }), StatusCode::CREATED);

    Ok(())
}

async fn delete(ctx: &mut PipelineContext) -> RestResult<()> {
    let id = record_id(ctx)?;
    let model = ctx.model().clone();

    if model.find_by_id(&id, None).await?.is_none() {
        return Err(not_found(ctx, &id));
    }
    let removed = model.remove(&id).await?;

    tracing::debug!(collection = ctx.collection(), id = %id, removed, "record removed");

    ctx.response.json(json!({ "ok": 1 }), StatusCode::CREATED);

    Ok(())
}

fn record_id(ctx: &PipelineContext) -> RestResult<String> {
    ctx.descriptor()
        .id()
        .map(str::to_string)
        .ok_or_else(|| RestError::MissingRecordId(ctx.descriptor().method().to_string()))
}

fn body_object(ctx: &PipelineContext) -> RestResult<Map<String, Value>> {
    match &ctx.request.body {
        None => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(other) => Err(RestError::InvalidDocument(format!(
            "expected a JSON object, got {}",
            json_kind(other)
        ))),
    }
}

fn not_found(ctx: &PipelineContext, id: &str) -> RestError {
    RestError::DocumentNotFound(id.to_string(), ctx.collection().to_string())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
