use axum::{Json, extract::State, http::StatusCode};
use chrono::Duration;

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult, StoreError},
    extract::{ApiJson, ApiPath},
    handlers::SuccessResponse,
    models::{
        AlterarStatusRequest, CreateLembreteRequest, Lembrete, LembreteDetalhe, NovoLembrete,
        StatusChange, StatusLembrete,
    },
};

const TITULO_MAX: usize = 120;

fn required<T>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::Validation(format!("Campo '{field}' é obrigatório")))
}

fn minutes(value: Option<i32>, field: &str) -> AppResult<i32> {
    let value = required(value, field)?;
    if value < 0 {
        return Err(AppError::Validation(format!(
            "Campo '{field}' deve ser maior ou igual a zero"
        )));
    }
    Ok(value)
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// validate_lembrete
///
/// Checks a create request and fills in the defaults (`prioridade = MEDIA`).
pub fn validate_lembrete(request: CreateLembreteRequest) -> AppResult<NovoLembrete> {
    let titulo = required(trimmed(request.titulo), "titulo")?;
    if titulo.chars().count() > TITULO_MAX {
        return Err(AppError::Validation(format!(
            "Campo 'titulo' deve ter no máximo {TITULO_MAX} caracteres"
        )));
    }

    Ok(NovoLembrete {
        titulo,
        descricao: trimmed(request.descricao),
        prioridade: request.prioridade.unwrap_or_default(),
        intervalo_minutos: minutes(request.intervalo_minutos, "intervaloMinutos")?,
        antecedencia_minutos: minutes(request.antecedencia_minutos, "antecedenciaMinutos")?,
        adiamento_minutos: minutes(request.adiamento_minutos, "adiamentoMinutos")?,
        proximo_disparo: required(request.proximo_disparo, "proximoDisparo")?,
        observacao: trimmed(request.observacao),
    })
}

/// create_lembrete
///
/// [Authenticated Route] Creates a reminder in `CONFIRMADO` for the caller.
/// The reminder and its `CRIACAO` history row are written together.
#[utoipa::path(
    post,
    path = "/api/lembretes",
    request_body = CreateLembreteRequest,
    responses(
        (status = 201, description = "Reminder created", body = Lembrete),
        (status = 400, description = "Missing or invalid field"),
        (status = 401, description = "No session")
    )
)]
pub async fn create_lembrete(
    AuthUser { id: owner, .. }: AuthUser,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateLembreteRequest>,
) -> AppResult<(StatusCode, Json<Lembrete>)> {
    let novo = validate_lembrete(request)?;
    let lembrete = state.repo.create_lembrete(owner, novo).await?;

    tracing::info!(lembrete_id = lembrete.id, user_id = %owner, "Reminder created");
    Ok((StatusCode::CREATED, Json(lembrete)))
}

/// list_lembretes
///
/// [Authenticated Route] The caller's reminders, next trigger first.
#[utoipa::path(
    get,
    path = "/api/lembretes",
    responses((status = 200, description = "Caller's reminders", body = [Lembrete]))
)]
pub async fn list_lembretes(
    AuthUser { id: owner, .. }: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Lembrete>>> {
    Ok(Json(state.repo.list_lembretes(owner).await?))
}

/// get_lembrete
///
/// [Authenticated Route] One reminder with its history, newest entry first.
/// Reminders of other users are reported as missing.
#[utoipa::path(
    get,
    path = "/api/lembretes/{id}",
    params(("id" = i64, Path, description = "Reminder id")),
    responses(
        (status = 200, description = "Reminder and history", body = LembreteDetalhe),
        (status = 404, description = "Not found or not owned")
    )
)]
pub async fn get_lembrete(
    AuthUser { id: owner, .. }: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<LembreteDetalhe>> {
    let lembrete = state
        .repo
        .get_lembrete(owner, id)
        .await?
        .ok_or_else(AppError::not_found)?;
    let historico = state.repo.list_historico(lembrete.id).await?;
    Ok(Json(LembreteDetalhe {
        lembrete,
        historico,
    }))
}

/// change_status
///
/// [Authenticated Route] Moves a reminder to a new status.
///
/// * Finished reminders (`CONCLUIDO`, `CANCELADO`) reject every change.
/// * Setting the current status again is rejected.
/// * `ADIADO` pushes `proximoDisparo` forward by `adiamentoMinutos`.
///
/// The store applies the change only if the status is still the one read
/// here; a concurrent transition surfaces as a conflict.
#[utoipa::path(
    patch,
    path = "/api/lembretes/{id}/status",
    params(("id" = i64, Path, description = "Reminder id")),
    request_body = AlterarStatusRequest,
    responses(
        (status = 200, description = "Updated reminder", body = Lembrete),
        (status = 400, description = "Transition not allowed"),
        (status = 404, description = "Not found or not owned")
    )
)]
pub async fn change_status(
    AuthUser { id: owner, .. }: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<AlterarStatusRequest>,
) -> AppResult<Json<Lembrete>> {
    let novo = required(request.status, "status")?;
    let atual = state
        .repo
        .get_lembrete(owner, id)
        .await?
        .ok_or_else(AppError::not_found)?;
    atual.status.check_transition(novo)?;

    let proximo_disparo = if novo == StatusLembrete::Adiado {
        atual.proximo_disparo + Duration::minutes(i64::from(atual.adiamento_minutos))
    } else {
        atual.proximo_disparo
    };

    let change = StatusChange {
        anterior: atual.status,
        novo,
        proximo_disparo,
        observacao: trimmed(request.observacao),
    };
    let lembrete = state
        .repo
        .change_lembrete_status(owner, id, change)
        .await
        .map_err(|e| match e {
            StoreError::Stale => AppError::Conflict(
                "Lembrete alterado por outra requisição, tente novamente".to_string(),
            ),
            other => other.into(),
        })?;

    tracing::info!(lembrete_id = id, from = %atual.status, to = %novo, "Reminder status changed");
    Ok(Json(lembrete))
}

/// delete_lembrete
///
/// [Authenticated Route] Removes one of the caller's reminders. The history
/// keeps an `EXCLUSAO` entry.
#[utoipa::path(
    delete,
    path = "/api/lembretes/{id}",
    params(("id" = i64, Path, description = "Reminder id")),
    responses(
        (status = 200, description = "Deleted", body = SuccessResponse),
        (status = 404, description = "Not found or not owned")
    )
)]
pub async fn delete_lembrete(
    AuthUser { id: owner, .. }: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<SuccessResponse>> {
    state.repo.delete_lembrete(owner, id, None).await?;

    tracing::info!(lembrete_id = id, user_id = %owner, "Reminder deleted");
    Ok(Json(SuccessResponse::ok()))
}
