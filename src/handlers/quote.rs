// src/handlers/quote.rs
//
// Rotas do documento de orçamento: listagem, detalhe, ciclo de vida
// (status, reabertura), frete e a exclusão administrativa.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    db::quote_repo::QuoteFilter,
    models::quote::{FreightAttachment, QuoteStatus},
};

// ---
// Listagem com filtros
// ---

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListQuotesParams {
    pub status: Option<QuoteStatus>,
    pub seller_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

#[utoipa::path(
    get,
    path = "/api/quotes",
    params(ListQuotesParams),
    responses((status = 200, description = "Orçamentos filtrados"))
)]
pub async fn list_quotes(
    State(app_state): State<AppState>,
    Query(params): Query<ListQuotesParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = QuoteFilter {
        status: params.status,
        seller_id: params.seller_id,
        customer_id: params.customer_id,
        created_from: params.created_from,
        created_to: params.created_to,
    };
    let quotes = app_state
        .quote_service
        .list(&app_state.db_pool, &filter)
        .await?;
    Ok((StatusCode::OK, Json(quotes)))
}

#[utoipa::path(
    get,
    path = "/api/quotes/{id}",
    params(("id" = Uuid, Path, description = "Id do orçamento")),
    responses((status = 200, description = "Cabeçalho + itens"), (status = 404))
)]
pub async fn get_quote(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state
        .quote_service
        .get_detail(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(detail)))
}

// ---
// Ciclo de vida
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
    pub new_status: QuoteStatus,
    pub notes: Option<String>,
    /// Revisão que o cliente viu por último; com ela a atualização vira
    /// condicional e edições concorrentes não se atropelam.
    pub expected_revision: Option<i32>,
}

#[utoipa::path(
    put,
    path = "/api/quotes/{id}/status",
    params(("id" = Uuid, Path, description = "Id do orçamento")),
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Status atualizado"),
        (status = 422, description = "Transição fora da tabela do ciclo de vida"),
        (status = 409, description = "Conflito de revisão")
    )
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let quote = app_state
        .quote_service
        .update_status(
            &app_state.db_pool,
            id,
            payload.new_status,
            payload.notes.as_deref(),
            payload.expected_revision,
        )
        .await?;
    Ok((StatusCode::OK, Json(quote)))
}

#[utoipa::path(
    post,
    path = "/api/quotes/{id}/reopen",
    params(("id" = Uuid, Path, description = "Id do orçamento")),
    responses(
        (status = 200, description = "Orçamento reaberto (Cancelado -> Pendente)"),
        (status = 409, description = "Itens sem estoque disponível para reservar de novo")
    )
)]
pub async fn reopen_quote(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let quote = app_state
        .quote_service
        .reopen(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(quote)))
}

// ---
// Frete
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachFreightPayload {
    #[validate(length(min = 1, message = "A transportadora é obrigatória."))]
    pub carrier_name: String,
    #[validate(length(min = 1, message = "O código do serviço é obrigatório."))]
    pub service_code: String,
    pub value: Decimal,
    pub delivery_days: i32,
    pub expected_revision: Option<i32>,
}

#[utoipa::path(
    post,
    path = "/api/quotes/{id}/freight",
    params(("id" = Uuid, Path, description = "Id do orçamento")),
    request_body = AttachFreightPayload,
    responses(
        (status = 200, description = "Frete anexado, total recalculado"),
        (status = 422, description = "Orçamento não está mais aberto")
    )
)]
pub async fn attach_freight(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttachFreightPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let freight = FreightAttachment {
        carrier_name: payload.carrier_name,
        service_code: payload.service_code,
        value: payload.value,
        delivery_days: payload.delivery_days,
    };
    let quote = app_state
        .quote_service
        .attach_freight(&app_state.db_pool, id, freight, payload.expected_revision)
        .await?;
    Ok((StatusCode::OK, Json(quote)))
}

// ---
// Flags de efeito colateral e exclusão administrativa
// ---

#[utoipa::path(
    post,
    path = "/api/quotes/{id}/pdf-generated",
    params(("id" = Uuid, Path, description = "Id do orçamento")),
    responses((status = 200))
)]
pub async fn mark_pdf_generated(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let quote = app_state
        .quote_service
        .mark_pdf_generated(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(quote)))
}

#[utoipa::path(
    post,
    path = "/api/quotes/{id}/delivered",
    params(("id" = Uuid, Path, description = "Id do orçamento")),
    responses((status = 200))
)]
pub async fn mark_delivered(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let quote = app_state
        .quote_service
        .mark_delivered(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(quote)))
}

#[utoipa::path(
    delete,
    path = "/api/quotes/{id}",
    params(("id" = Uuid, Path, description = "Id do orçamento")),
    responses(
        (status = 204, description = "Removido em definitivo. Limpeza administrativa, \
            permitida apenas para orçamentos cancelados (cujo estoque já foi devolvido)"),
        (status = 400, description = "O orçamento não está cancelado"),
        (status = 404)
    )
)]
pub async fn delete_quote(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .quote_service
        .hard_delete(&app_state.db_pool, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
