use crate::{
    AppState,
    cadastros::Cadastro,
    handlers::{auth, cadastros, dashboard, lembretes},
};
use axum::{
    Router,
    routing::{get, patch},
};

/// GET|POST /cadastros/<resource>
/// GET|PUT|PATCH|DELETE /cadastros/<resource>/{id}
fn cadastro_routes<C: Cadastro>() -> Router<AppState> {
    let base = format!("/cadastros/{}", C::table().resource);
    Router::new()
        .route(&base, get(cadastros::list::<C>).post(cadastros::create::<C>))
        .route(
            &format!("{base}/{{id}}"),
            get(cadastros::get::<C>)
                .put(cadastros::update::<C>)
                .patch(cadastros::update::<C>)
                .delete(cadastros::delete::<C>),
        )
}

/// Authenticated Router Module
///
/// Every route here requires a session. The `AuthUser` layer is applied by
/// `create_router`; handlers that need the caller's id extract it again
/// (owner scoping of reminders and the dashboard's open-reminder count).
pub fn authenticated_routes() -> Router<AppState> {
    let router = Router::<AppState>::new()
        // GET /auth/me
        .route("/auth/me", get(auth::me))
        // --- Dashboard ---
        .route("/dashboard/resumo", get(dashboard::resumo))
        // GET /dashboard/vendas/*?dias=N
        // Trailing window, default 30 days, clamped to 1..=365.
        .route("/dashboard/vendas/evolucao", get(dashboard::vendas_evolucao))
        .route("/dashboard/vendas/regioes", get(dashboard::vendas_regioes))
        .route("/dashboard/vendas/fabricantes", get(dashboard::vendas_fabricantes))
        // --- Lembretes (owner-scoped) ---
        .route(
            "/lembretes",
            get(lembretes::list_lembretes).post(lembretes::create_lembrete),
        )
        .route(
            "/lembretes/{id}",
            get(lembretes::get_lembrete).delete(lembretes::delete_lembrete),
        )
        // PATCH /lembretes/{id}/status
        // Appends an ALTERACAO_STATUS history row.
        .route("/lembretes/{id}/status", patch(lembretes::change_status));

    for_each_cadastro!(router, cadastro_routes)
}
