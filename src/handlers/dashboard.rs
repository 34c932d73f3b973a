use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Deserialize;

use crate::{
    AppState,
    auth::AuthUser,
    error::AppResult,
    models::{DashboardResumo, VendaDiaria, VendaPorFabricante, VendaPorRegiao},
};

pub const DEFAULT_DIAS: i64 = 30;
pub const MAX_DIAS: i64 = 365;

/// PeriodoQuery
///
/// Trailing window for the sales charts. Kept as raw text so a malformed
/// value falls back to the default instead of failing the request.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeriodoQuery {
    /// Number of days, 1 to 365. Defaults to 30.
    pub dias: Option<String>,
}

/// Resolves `dias`: unparsable values use the default, the rest are clamped.
pub fn janela_dias(raw: Option<&str>) -> i64 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .map(|dias| dias.clamp(1, MAX_DIAS))
        .unwrap_or(DEFAULT_DIAS)
}

/// Start of the window: midnight UTC of the oldest day included, so `dias = 1`
/// covers today only.
pub fn inicio_janela(now: DateTime<Utc>, dias: i64) -> DateTime<Utc> {
    (now.date_naive() - Duration::days(dias - 1))
        .and_time(NaiveTime::MIN)
        .and_utc()
}

fn desde(query: &PeriodoQuery) -> DateTime<Utc> {
    inicio_janela(Utc::now(), janela_dias(query.dias.as_deref()))
}

/// resumo
///
/// [Authenticated Route] Headline counters. "Active" is entity-specific:
/// products that are not blocked, manufacturers both active and released.
#[utoipa::path(
    get,
    path = "/api/dashboard/resumo",
    responses((status = 200, description = "Dashboard counters", body = DashboardResumo))
)]
pub async fn resumo(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DashboardResumo>> {
    Ok(Json(state.repo.dashboard_resumo(id).await?))
}

/// vendas_evolucao
///
/// [Authenticated Route] Orders and value per UTC day, oldest first. Days
/// without sales are omitted.
#[utoipa::path(
    get,
    path = "/api/dashboard/vendas/evolucao",
    params(PeriodoQuery),
    responses((status = 200, description = "Daily sales", body = [VendaDiaria]))
)]
pub async fn vendas_evolucao(
    State(state): State<AppState>,
    Query(query): Query<PeriodoQuery>,
) -> AppResult<Json<Vec<VendaDiaria>>> {
    Ok(Json(state.repo.vendas_por_dia(desde(&query)).await?))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/vendas/regioes",
    params(PeriodoQuery),
    responses((status = 200, description = "Sales by region, highest value first", body = [VendaPorRegiao]))
)]
pub async fn vendas_regioes(
    State(state): State<AppState>,
    Query(query): Query<PeriodoQuery>,
) -> AppResult<Json<Vec<VendaPorRegiao>>> {
    Ok(Json(state.repo.vendas_por_regiao(desde(&query)).await?))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/vendas/fabricantes",
    params(PeriodoQuery),
    responses((status = 200, description = "Sales by manufacturer, highest value first", body = [VendaPorFabricante]))
)]
pub async fn vendas_fabricantes(
    State(state): State<AppState>,
    Query(query): Query<PeriodoQuery>,
) -> AppResult<Json<Vec<VendaPorFabricante>>> {
    Ok(Json(state.repo.vendas_por_fabricante(desde(&query)).await?))
}
