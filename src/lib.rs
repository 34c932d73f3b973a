use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod cadastros;
pub mod config;
pub mod error;
pub mod extract;
pub mod gate;
pub mod handlers;
pub mod locale;
pub mod memory;
pub mod models;
pub mod repository;
pub mod schema;

pub mod routes;
use auth::AuthUser;
use error::AppError;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use memory::InMemoryRepository;
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document served at `/api-docs/openapi.json`. The generic cadastro
/// handlers are instantiated per resource and are described by their model
/// schemas only.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::auth::register, handlers::auth::login, handlers::auth::logout,
        handlers::auth::me,
        handlers::lembretes::create_lembrete, handlers::lembretes::list_lembretes,
        handlers::lembretes::get_lembrete, handlers::lembretes::change_status,
        handlers::lembretes::delete_lembrete,
        handlers::dashboard::resumo, handlers::dashboard::vendas_evolucao,
        handlers::dashboard::vendas_regioes, handlers::dashboard::vendas_fabricantes,
    ),
    components(
        schemas(
            cadastros::Estado, cadastros::Unidade, cadastros::GrupoProduto,
            cadastros::Fabricante, cadastros::Marca, cadastros::Produto,
            cadastros::CriterioPagamento, cadastros::MotivoBloqueio,
            cadastros::GrupoCliente, cadastros::TabelaPreco, cadastros::VendedorRegiao,
            models::User, models::RegisterRequest, models::LoginRequest, models::LoginResponse,
            models::Lembrete, models::HistoricoLembrete, models::LembreteDetalhe,
            models::CreateLembreteRequest, models::AlterarStatusRequest,
            models::DashboardResumo, models::VendaDiaria, models::VendaPorRegiao,
            models::VendaPorFabricante, handlers::SuccessResponse,
        )
    ),
    tags(
        (name = "tremonte", description = "Tremonte administrative dashboard API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The shared, cloneable application state. Handlers pull the parts they need
/// through `FromRef`; nothing is global.
#[derive(Clone)]
pub struct AppState {
    /// Store handle: Postgres in production, in-memory for tests and local runs.
    pub repo: RepositoryState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards the authenticated router. `AuthUser` rejects with a 401 JSON body
/// before the handler runs when the session is missing or invalid.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

async fn api_not_found() -> AppError {
    AppError::NotFound("Rota não encontrada".to_string())
}

/// create_router
///
/// Assembles the application:
/// * `/api/*`: JSON API (public routes plus the authenticated router).
/// * `/health`, `/swagger-ui`, `/api-docs/openapi.json`: operational.
/// * everything else: page requests, passed through the locale/auth gate.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let api = Router::new()
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Unknown API paths answer 404 JSON instead of reaching the page gate.
        .fallback(api_not_found);

    let pages = Router::new()
        .fallback(handlers::pages::render)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::locale_gate,
        ))
        .with_state(state.clone());

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // GET /health
        // Load balancer health check, outside both the API and the gate.
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .fallback_service(pages)
        .with_state(state);

    // Observability: request id, tracing span, propagated id.
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one request, correlated by its `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
