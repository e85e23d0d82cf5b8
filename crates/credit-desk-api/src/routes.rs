use crate::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub fn create_router(state: AppState) -> Router {
    let static_dir = state.static_dir.clone();

    let router = Router::new()
        // Health check
        .route("/health", get(handlers::health))

        // Companies
        .route("/api/empresas", get(handlers::list_companies))
        .route("/api/empresas/{id}", get(handlers::get_company))
        .route("/api/pesquisar", get(handlers::search_companies))

        // Cached generation
        .route(
            "/api/analise/{id}",
            get(handlers::get_analysis).put(handlers::regenerate_analysis),
        )
        .route(
            "/api/sugestao/{id}",
            get(handlers::get_suggestion).put(handlers::regenerate_suggestion),
        )

        // Decisions and simulation
        .route("/api/decisao/{id}", post(handlers::record_decision))
        .route("/api/simulacao", post(handlers::simulate))

        .with_state(state);

    // Dashboard assets
    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
