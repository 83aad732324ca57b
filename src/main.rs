//src/main.rs

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod docs;
mod handlers;
mod models;
mod pdf;
mod services;

use crate::{common::error::panic_response, config::AppState, docs::ApiDoc};

// Assinaturas desenhadas vêm embutidas no JSON como imagens base64
const MAX_BODY_BYTES: usize = 15 * 1024 * 1024;

pub(crate) fn build_router(app_state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/forms/submit", post(handlers::forms::submit_form))
        .route("/guidelines/submit", post(handlers::guidelines::submit_guidelines))
        // Estouro do limite chega ao handler como JsonRejection e vira 413 no envelope padrão
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api", api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        // Pânico em qualquer etapa vira 500 genérico, sem derrubar o servidor
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Carrega .env e monta os serviços. Nenhuma integração é obrigatória.
    let app_state = AppState::new()?;

    let app = build_router(app_state);

    // Inicia o servidor
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
