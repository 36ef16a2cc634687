// src/handlers/discount.rs
//
// Fila de autorização de desconto acima da alçada: o vendedor abre a
// solicitação, o gestor decide, o checkout consome o ticket aprovado.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{common::error::AppError, config::AppState};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestDiscountPayload {
    /// Orçamento ao qual o pedido se refere, se já existir.
    pub quote_id: Option<Uuid>,
    pub seller_id: Uuid,
    pub requested_percent: Decimal,
    #[validate(length(max = 500, message = "A justificativa é longa demais."))]
    pub reason: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/discounts/requests",
    request_body = RequestDiscountPayload,
    responses(
        (status = 201, description = "Solicitação aberta, aguardando o gestor"),
        (status = 400, description = "Desconto dentro da alçada ou acima de 100%")
    )
)]
pub async fn request_discount(
    State(app_state): State<AppState>,
    Json(payload): Json<RequestDiscountPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let ticket = app_state
        .quote_service
        .request_discount_authorization(
            &app_state.db_pool,
            payload.quote_id,
            payload.seller_id,
            payload.requested_percent,
            payload.reason.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

#[utoipa::path(
    get,
    path = "/api/discounts/requests/{id}",
    params(("id" = Uuid, Path, description = "Id da solicitação")),
    responses((status = 200, description = "Status atual do ticket"), (status = 404))
)]
pub async fn get_discount_request(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ticket = app_state
        .quote_service
        .get_ticket(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(ticket)))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecideDiscountPayload {
    pub approve: bool,
}

#[utoipa::path(
    put,
    path = "/api/discounts/requests/{id}/decision",
    params(("id" = Uuid, Path, description = "Id da solicitação")),
    request_body = DecideDiscountPayload,
    responses(
        (status = 200, description = "Decisão registrada"),
        (status = 400, description = "Solicitação já decidida"),
        (status = 404)
    )
)]
pub async fn decide_discount_request(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DecideDiscountPayload>,
) -> Result<impl IntoResponse, AppError> {
    let ticket = app_state
        .quote_service
        .decide_ticket(&app_state.db_pool, id, payload.approve)
        .await?;
    Ok((StatusCode::OK, Json(ticket)))
}
