use crate::{
    AppState,
    cadastros::Cadastro,
    handlers::{auth, parametros},
};
use axum::{
    Router,
    routing::{get, post},
};

/// GET /parametros/<resource>?busca=...
/// Capped lists feeding selection widgets.
fn parametro_routes<C: Cadastro>() -> Router<AppState> {
    Router::new().route(
        &format!("/parametros/{}", C::table().resource),
        get(parametros::list::<C>),
    )
}

/// Public Router Module
///
/// Unauthenticated API endpoints, mounted under `/api`.
pub fn public_routes() -> Router<AppState> {
    let router = Router::new()
        // POST /auth/register
        .route("/auth/register", post(auth::register))
        // POST /auth/login
        // Returns the token and sets the session cookie.
        .route("/auth/login", post(auth::login))
        // POST /auth/logout
        .route("/auth/logout", post(auth::logout));

    for_each_cadastro!(router, parametro_routes)
}
