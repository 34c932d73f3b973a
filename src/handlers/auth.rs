use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{AppendHeaders, IntoResponse},
};

use crate::{
    AppState,
    auth::{
        AuthUser, clear_session_cookie, hash_password, issue_token, session_cookie,
        verify_against_dummy, verify_password,
    },
    config::AppConfig,
    error::{AppError, AppResult, StoreError},
    extract::ApiJson,
    handlers::SuccessResponse,
    models::{LoginRequest, LoginResponse, NewUser, RegisterRequest, User},
};

const SENHA_MIN: usize = 8;
const NOME_MAX: usize = 120;
const EMAIL_MAX: usize = 255;

fn required_text(value: Option<String>, field: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("Campo '{field}' é obrigatório")))
}

/// Minimal shape check: one `@`, a non-empty local part, a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.contains(char::is_whitespace)
        && domain.contains('.')
        && domain.split('.').all(|part| !part.is_empty())
}

/// register
///
/// [Public Route] Creates an account. The email is unique case-insensitively
/// and the password is stored only as an Argon2id hash.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 400, description = "Invalid data or email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let nome = required_text(request.nome, "nome")?;
    if nome.chars().count() > NOME_MAX {
        return Err(AppError::Validation(format!(
            "Campo 'nome' deve ter no máximo {NOME_MAX} caracteres"
        )));
    }

    let email = required_text(request.email, "email")?.to_lowercase();
    if email.len() > EMAIL_MAX || !is_valid_email(&email) {
        return Err(AppError::Validation("E-mail inválido".to_string()));
    }

    let senha = request.senha.unwrap_or_default();
    if senha.chars().count() < SENHA_MIN {
        return Err(AppError::Validation(format!(
            "Senha deve ter pelo menos {SENHA_MIN} caracteres"
        )));
    }

    let senha_hash = hash_password(&senha)?;
    let user = state
        .repo
        .create_user(NewUser {
            email,
            nome,
            senha_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict => AppError::Conflict("E-mail já cadastrado".to_string()),
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// login
///
/// [Public Route] Verifies the credentials and opens a session. The token is
/// returned in the body and set as the session cookie. Unknown email and wrong
/// password produce the same 401.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let email = required_text(request.email, "email")?;
    let senha = request
        .senha
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("Campo 'senha' é obrigatório".to_string()))?;

    let invalid = || AppError::Unauthorized("E-mail ou senha inválidos".to_string());
    let Some(credentials) = state.repo.find_user_by_email(&email).await? else {
        // Unknown e-mails cost one Argon2 verification, like a wrong password.
        let _ = verify_against_dummy(&senha);
        return Err(invalid());
    };
    if !verify_password(&senha, &credentials.senha_hash)? {
        return Err(invalid());
    }

    let (token, expira_em) = issue_token(&state.config, credentials.user.id)?;
    let cookie = session_cookie(&token, &state.config);

    tracing::info!(user_id = %credentials.user.id, "User logged in");
    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(LoginResponse {
            token,
            expira_em,
            usuario: credentials.user,
        }),
    ))
}

/// logout
///
/// [Public Route] Expires the session cookie. Tokens are stateless, so a copy
/// kept by an API client stays valid until it expires.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Cookie cleared", body = SuccessResponse))
)]
pub async fn logout(State(config): State<AppConfig>) -> impl IntoResponse {
    (
        AppendHeaders([(header::SET_COOKIE, clear_session_cookie(&config))]),
        Json(SuccessResponse::ok()),
    )
}

/// me
///
/// [Authenticated Route] The current user.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "No session")
    )
)]
pub async fn me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<User>> {
    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(AppError::unauthorized)?;
    Ok(Json(user))
}
