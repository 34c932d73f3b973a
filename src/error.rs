use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// AppError
///
/// The single error type returned by every handler. Each variant maps to one
/// HTTP status and is rendered as the `{ "error": <message> }` envelope, so
/// no failure reaches the client as an unhandled fault.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing, malformed or too-long input (400).
    #[error("{0}")]
    Validation(String),

    /// Uniqueness violation or a record still in use (400).
    #[error("{0}")]
    Conflict(String),

    /// The referenced id does not exist or is not visible to the caller (404).
    #[error("{0}")]
    NotFound(String),

    /// Missing or invalid session (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Unexpected store or runtime failure (500). The message is logged, never sent.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn unauthorized() -> Self {
        Self::Unauthorized("Não autenticado".to_string())
    }

    pub fn not_found() -> Self {
        Self::NotFound("Registro não encontrado".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                "Erro interno do servidor".to_string()
            }
            other => {
                tracing::warn!(status = status.as_u16(), error = %other, "Request rejected");
                other.to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(format!("Corpo da requisição inválido: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        Self::Validation("Identificador inválido".to_string())
    }
}

/// StoreError
///
/// Failures reported by a `Repository` implementation. Handlers translate them
/// into `AppError`, usually with a resource-specific message for conflicts.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// A unique group matched an existing record.
    #[error("unique constraint violated")]
    Conflict,

    /// An integer field points at a record that does not exist.
    #[error("field `{0}` references a missing record")]
    InvalidReference(&'static str),

    /// The record is still referenced by another table.
    #[error("record is referenced by `{0}`")]
    InUse(String),

    /// The row changed between read and write.
    #[error("record changed concurrently")]
    Stale,

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Corrupt(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::not_found(),
            StoreError::Conflict => Self::Conflict("Registro já existe".to_string()),
            StoreError::InvalidReference(field) => {
                Self::Validation(format!("Campo '{field}' referencia um registro inexistente"))
            }
            StoreError::InUse(by) => Self::Conflict(format!(
                "Registro em uso por {by} e não pode ser excluído"
            )),
            StoreError::Stale => {
                Self::Conflict("Registro alterado por outra requisição, tente novamente".to_string())
            }
            StoreError::Database(e) => Self::Internal(e.to_string()),
            StoreError::Corrupt(msg) => Self::Internal(msg),
        }
    }
}
