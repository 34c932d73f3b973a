use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::ACCEPT_LANGUAGE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use uuid::Uuid;

use crate::{
    auth::{token_from_headers, verify_token},
    config::AppConfig,
    locale::{Locale, SUPPORTED, resolve_locale},
    repository::RepositoryState,
};

/// Path prefixes (after the locale) reachable without a session.
const PUBLIC_PREFIXES: [&str; 2] = ["/auth", "/public"];
/// Pages an authenticated user is sent away from.
const AUTH_ONLY_PATHS: [&str; 2] = ["/auth/login", "/auth/register"];

/// GateOutcome
///
/// Terminal state of one request's pass through the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Allowed { locale: Locale },
    RedirectedToLocale(String),
    RedirectedToLogin(String),
    RedirectedToDashboard(String),
}

/// Identity and locale the gate attaches to allowed page requests.
#[derive(Debug, Clone)]
pub struct PageSession {
    pub locale: Locale,
    pub user_id: Option<Uuid>,
}

/// Splits `/pt-br/dashboard` into the locale and the remainder (`/dashboard`).
/// The locale segment must match a supported tag exactly.
pub fn split_locale(path: &str) -> Option<(Locale, &str)> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let (segment, rest) = match trimmed.find('/') {
        Some(idx) => (&trimmed[..idx], &trimmed[idx..]),
        None => (trimmed, ""),
    };
    SUPPORTED
        .into_iter()
        .find(|l| l.as_str() == segment)
        .map(|locale| (locale, rest))
}

fn has_prefix(rest: &str, prefix: &str) -> bool {
    rest == prefix
        || rest
            .strip_prefix(prefix)
            .is_some_and(|tail| tail.starts_with('/'))
}

pub fn is_public(rest: &str) -> bool {
    PUBLIC_PREFIXES.iter().any(|prefix| has_prefix(rest, prefix))
}

pub fn is_auth_only(rest: &str) -> bool {
    let rest = rest.strip_suffix('/').unwrap_or(rest);
    AUTH_ONLY_PATHS.contains(&rest)
}

/// decide
///
/// Runs the gate's state machine for one request:
/// `NeedsLocale → LocaleOk → AuthChecked → Allowed | Redirected…`.
/// `authenticated` is only evaluated once the locale prefix is in place.
pub fn decide(
    path: &str,
    query: Option<&str>,
    accept_language: Option<&str>,
    authenticated: impl FnOnce() -> bool,
) -> GateOutcome {
    let Some((locale, rest)) = split_locale(path) else {
        let resolved = resolve_locale(accept_language);
        let mut target = format!("/{resolved}{path}");
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            target.push('?');
            target.push_str(query);
        }
        return GateOutcome::RedirectedToLocale(target);
    };

    let authenticated = authenticated();
    if !authenticated && !is_public(rest) {
        return GateOutcome::RedirectedToLogin(format!("/{locale}/auth/login"));
    }
    if authenticated && is_auth_only(rest) {
        return GateOutcome::RedirectedToDashboard(format!("/{locale}/dashboard"));
    }

    GateOutcome::Allowed { locale }
}

/// session_user
///
/// Resolves the request's session to a user that still exists in the store.
/// Tokens that fail verification, deleted users and store failures all count
/// as anonymous.
pub async fn session_user(
    config: &AppConfig,
    repo: &RepositoryState,
    headers: &HeaderMap,
) -> Option<Uuid> {
    let claims = token_from_headers(headers)
        .and_then(|token| verify_token(&config.jwt_secret, &token))?;
    match repo.get_user(claims.sub).await {
        Ok(user) => user.map(|u| u.id),
        Err(e) => {
            tracing::warn!(error = %e, "Gate could not load session user");
            None
        }
    }
}

/// locale_gate
///
/// Middleware wrapping every page path. A session whose user is gone is
/// treated exactly like a missing one; the gate never errors.
pub async fn locale_gate(
    State(config): State<AppConfig>,
    State(repo): State<RepositoryState>,
    mut request: Request,
    next: Next,
) -> Response {
    let accept_language = request
        .headers()
        .get(ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let uri = request.uri().clone();
    // The session only matters once the locale prefix is in place.
    let user_id = match split_locale(uri.path()) {
        Some(_) => session_user(&config, &repo, request.headers()).await,
        None => None,
    };
    let outcome = decide(uri.path(), uri.query(), accept_language.as_deref(), || {
        user_id.is_some()
    });

    match outcome {
        GateOutcome::Allowed { locale } => {
            request
                .extensions_mut()
                .insert(PageSession { locale, user_id });
            next.run(request).await
        }
        GateOutcome::RedirectedToLocale(to)
        | GateOutcome::RedirectedToLogin(to)
        | GateOutcome::RedirectedToDashboard(to) => {
            tracing::debug!(from = %uri, to = %to, "Gate redirect");
            Redirect::temporary(&to).into_response()
        }
    }
}
