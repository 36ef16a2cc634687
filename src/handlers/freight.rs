// src/handlers/freight.rs
//
// Cotação de frete contra o provedor externo. O deployment pode rodar sem
// integração; nesse caso a rota responde 503 em vez de inventar tarifa.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{common::error::AppError, config::AppState, services::freight::is_valid_cep};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateShopPayload {
    /// CEP de origem; ausente, vale o CEP da loja configurado.
    pub origin_cep: Option<String>,
    pub destination_cep: String,
    /// Peso estimado do carrinho em kg.
    pub weight_kg: Decimal,
}

fn cep_error(field: &'static str) -> AppError {
    let mut errors = ValidationErrors::new();
    let mut error = ValidationError::new("cep");
    error.message = Some("O CEP deve ter 8 dígitos.".into());
    errors.add(field.into(), error);
    AppError::ValidationError(errors)
}

#[utoipa::path(
    post,
    path = "/api/freight/rate-shop",
    request_body = RateShopPayload,
    responses(
        (status = 200, description = "Opções de serviço precificadas"),
        (status = 400, description = "CEP malformado"),
        (status = 503, description = "Integração de frete não configurada")
    )
)]
pub async fn rate_shop(
    State(app_state): State<AppState>,
    Json(payload): Json<RateShopPayload>,
) -> Result<impl IntoResponse, AppError> {
    let provider = app_state.freight_provider.as_ref().ok_or_else(|| {
        AppError::CollaboratorUnavailable(
            "Integração de frete não configurada neste deployment.".to_string(),
        )
    })?;

    let origin_cep = payload
        .origin_cep
        .unwrap_or_else(|| app_state.policy.default_origin_cep.clone());
    if !is_valid_cep(&origin_cep) {
        return Err(cep_error("originCep"));
    }
    if !is_valid_cep(&payload.destination_cep) {
        return Err(cep_error("destinationCep"));
    }
    if payload.weight_kg <= Decimal::ZERO {
        let mut errors = ValidationErrors::new();
        let mut error = ValidationError::new("range");
        error.message = Some("O peso deve ser maior que zero.".into());
        errors.add("weightKg".into(), error);
        return Err(AppError::ValidationError(errors));
    }

    let rates = provider
        .quote_rates(&origin_cep, &payload.destination_cep, payload.weight_kg)
        .await?;
    Ok((StatusCode::OK, Json(rates)))
}
