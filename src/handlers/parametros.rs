use std::collections::HashMap;

use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    AppState,
    cadastros::Cadastro,
    error::AppResult,
    handlers::cadastros::{list_filter, store_error, to_models},
};

/// Autocomplete lists never return more than this many entries.
pub const PARAMETROS_LIMIT: usize = 20;

/// list
///
/// [Public Route] `GET /api/parametros/<resource>`. Same filters as the
/// cadastro listing, capped at `PARAMETROS_LIMIT` for selection widgets.
pub async fn list<C: Cadastro>(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<Vec<C>>> {
    let table = C::table();
    let filter = list_filter(table, &params, Some(PARAMETROS_LIMIT))?;
    let records = state
        .repo
        .list_records(table, &filter)
        .await
        .map_err(|e| store_error(table, e))?;
    Ok(Json(to_models::<C>(records)?))
}
