use serde::Serialize;
use ts_rs::TS;
use utoipa::ToSchema;

pub mod auth;
pub mod cadastros;
pub mod dashboard;
pub mod lembretes;
pub mod pages;
pub mod parametros;

/// Body returned by deletes and logout.
#[derive(Debug, Clone, Serialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// health
///
/// Liveness check for load balancers. Never touches the store.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}
