//src/main.rs

use axum::{
    Json, Router,
    routing::{get, post, put},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod models;
mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas do balcão: busca, prévias e checkout
    let sale_routes = Router::new()
        .route("/totals", post(handlers::sale::cart_totals))
        .route("/installments", post(handlers::sale::installments_preview))
        .route("/checkout", post(handlers::sale::checkout));

    // Ciclo de vida do orçamento
    let quote_routes = Router::new()
        .route(
            "/",
            get(handlers::quote::list_quotes),
        )
        .route(
            "/{id}",
            get(handlers::quote::get_quote).delete(handlers::quote::delete_quote),
        )
        .route("/{id}/status", put(handlers::quote::update_status))
        .route("/{id}/reopen", post(handlers::quote::reopen_quote))
        .route("/{id}/freight", post(handlers::quote::attach_freight))
        .route("/{id}/pdf-generated", post(handlers::quote::mark_pdf_generated))
        .route("/{id}/delivered", post(handlers::quote::mark_delivered));

    // Fila de autorização de desconto
    let discount_routes = Router::new()
        .route("/requests", post(handlers::discount::request_discount))
        .route("/requests/{id}", get(handlers::discount::get_discount_request))
        .route(
            "/requests/{id}/decision",
            put(handlers::discount::decide_discount_request),
        );

    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/catalog/search", get(handlers::sale::search_catalog))
        .route("/api/freight/rate-shop", post(handlers::freight::rate_shop))
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .nest("/api/sales", sale_routes)
        .nest("/api/quotes", quote_routes)
        .nest("/api/discounts", discount_routes)
        .with_state(app_state);

    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
