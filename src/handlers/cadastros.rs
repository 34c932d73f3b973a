use std::collections::HashMap;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde_json::Value;

use crate::{
    AppState,
    cadastros::Cadastro,
    error::{AppError, AppResult, StoreError},
    extract::{ApiJson, ApiPath},
    handlers::SuccessResponse,
    schema::{ListFilter, Record, Table, validate},
};

/// Query parameter carrying the free-text filter.
pub const SEARCH_PARAM: &str = "busca";

/// list_filter
///
/// Builds the list filter from the raw query string: `busca` plus the table's
/// foreign-key filter, whose parameter is named after the field
/// (e.g. `?fabricanteId=3`).
pub fn list_filter(
    table: &'static Table,
    params: &HashMap<String, String>,
    limit: Option<usize>,
) -> AppResult<ListFilter> {
    let parent = match table.parent.and_then(|field| params.get(field).map(|v| (field, v))) {
        Some((_, raw)) if raw.trim().is_empty() => None,
        Some((field, raw)) => Some(raw.trim().parse::<i64>().map_err(|_| {
            AppError::Validation(format!("Campo '{field}' deve ser um número inteiro"))
        })?),
        None => None,
    };

    Ok(ListFilter {
        search: params.get(SEARCH_PARAM).cloned(),
        parent,
        limit,
    })
}

/// Maps a store failure, using the table's own message for uniqueness conflicts.
pub fn store_error(table: &'static Table, err: StoreError) -> AppError {
    match err {
        StoreError::Conflict => AppError::Conflict(table.conflict.to_string()),
        other => other.into(),
    }
}

/// Converts a stored record into the resource's typed model.
pub fn to_model<C: Cadastro>(record: Record) -> AppResult<C> {
    serde_json::from_value(Value::Object(record)).map_err(|e| {
        AppError::Internal(format!(
            "stored {} record does not match its model: {e}",
            C::table().name
        ))
    })
}

pub fn to_models<C: Cadastro>(records: Vec<Record>) -> AppResult<Vec<C>> {
    records.into_iter().map(to_model::<C>).collect()
}

/// list
///
/// [Authenticated Route] `GET /api/cadastros/<resource>`. Ordered by the
/// resource's sort field, then id. Not capped.
pub async fn list<C: Cadastro>(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<Vec<C>>> {
    let table = C::table();
    let filter = list_filter(table, &params, None)?;
    let records = state
        .repo
        .list_records(table, &filter)
        .await
        .map_err(|e| store_error(table, e))?;
    Ok(Json(to_models::<C>(records)?))
}

/// get
///
/// [Authenticated Route] `GET /api/cadastros/<resource>/{id}`.
pub async fn get<C: Cadastro>(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<C>> {
    let table = C::table();
    let record = state
        .repo
        .get_record(table, id)
        .await
        .map_err(|e| store_error(table, e))?
        .ok_or_else(AppError::not_found)?;
    Ok(Json(to_model::<C>(record)?))
}

/// create
///
/// [Authenticated Route] `POST /api/cadastros/<resource>`.
///
/// Validation runs first and names the offending field. The uniqueness check
/// and the insert are a single store operation, so two concurrent creates
/// with the same code cannot both succeed.
pub async fn create<C: Cadastro>(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<(StatusCode, Json<C>)> {
    let table = C::table();
    let values = validate(table, &body)?;
    let record = state
        .repo
        .insert_record(table, &values)
        .await
        .map_err(|e| store_error(table, e))?;

    tracing::info!(resource = table.resource, id = ?record.get("id"), "Cadastro created");
    Ok((StatusCode::CREATED, Json(to_model::<C>(record)?)))
}

/// Overlays the request body on the stored record. Fields the body omits keep
/// their stored value; an explicit `null` still clears an optional field.
pub fn merge_over(stored: Record, body: Value) -> Value {
    match body {
        Value::Object(changes) => {
            let mut merged = stored;
            merged.extend(changes);
            Value::Object(merged)
        }
        other => other,
    }
}

/// update
///
/// [Authenticated Route] `PUT|PATCH /api/cadastros/<resource>/{id}`.
/// Omitted fields keep their stored value, so a rename does not reset flags.
/// A record may keep its own code and description.
pub async fn update<C: Cadastro>(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<Json<C>> {
    let table = C::table();
    let stored = state
        .repo
        .get_record(table, id)
        .await
        .map_err(|e| store_error(table, e))?
        .ok_or_else(AppError::not_found)?;
    let values = validate(table, &merge_over(stored, body))?;
    let record = state
        .repo
        .update_record(table, id, &values)
        .await
        .map_err(|e| store_error(table, e))?;

    tracing::info!(resource = table.resource, id, "Cadastro updated");
    Ok(Json(to_model::<C>(record)?))
}

/// delete
///
/// [Authenticated Route] `DELETE /api/cadastros/<resource>/{id}`.
pub async fn delete<C: Cadastro>(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<SuccessResponse>> {
    let table = C::table();
    state
        .repo
        .delete_record(table, id)
        .await
        .map_err(|e| store_error(table, e))?;

    tracing::info!(resource = table.resource, id, "Cadastro deleted");
    Ok(Json(SuccessResponse::ok()))
}
