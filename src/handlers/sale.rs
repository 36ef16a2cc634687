// src/handlers/sale.rs
//
// Rotas do balcão: busca de peças, prévia de totais/parcelamento e o
// checkout (salvar orçamento ou finalizar a venda na hora).

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, money::{format_brl, round_money}},
    config::AppState,
    models::sale::{CartItem, CartTotals, InstallmentPlan, PaymentMethod},
    services::{
        cart::{Cart, DiscountGate, GateState},
        payment::installment_plan,
    },
};

// ---
// Busca de catálogo
// ---

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Nome ou SKU, busca parcial.
    pub term: String,
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/catalog/search",
    params(SearchParams),
    responses((status = 200, description = "Peças encontradas"))
)]
pub async fn search_catalog(
    State(app_state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(10).clamp(1, 50);
    let hits = app_state
        .catalog_repo
        .search(&app_state.db_pool, &params.term, limit)
        .await?;
    Ok((StatusCode::OK, Json(hits)))
}

// ---
// Prévia de totais do carrinho
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartTotalsPayload {
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub general_discount_percent: Decimal,
    #[serde(default)]
    pub freight_value: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartTotalsResponse {
    pub totals: CartTotals,
    /// Estado da trava de alçada para este desconto. Só UX: a regra vale
    /// de novo, no servidor, na hora do checkout.
    pub gate_state: GateState,
    #[schema(example = "R$ 260,00")]
    pub formatted_total: String,
}

#[utoipa::path(
    post,
    path = "/api/sales/totals",
    request_body = CartTotalsPayload,
    responses((status = 200, body = CartTotalsResponse))
)]
pub async fn cart_totals(
    State(app_state): State<AppState>,
    Json(payload): Json<CartTotalsPayload>,
) -> Result<impl IntoResponse, AppError> {
    let cart = Cart::from_items(payload.items)?;
    let totals = cart
        .totals(payload.general_discount_percent, payload.freight_value)
        .presented();

    let mut gate = DiscountGate::new(app_state.policy.discount_threshold_percent);
    gate.set_discount(payload.general_discount_percent);

    let formatted_total = format_brl(totals.total);
    Ok((
        StatusCode::OK,
        Json(CartTotalsResponse {
            totals,
            gate_state: gate.state(),
            formatted_total,
        }),
    ))
}

// ---
// Prévia de parcelamento
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentsPayload {
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    #[serde(default = "default_installments")]
    pub installment_count: i32,
}

fn default_installments() -> i32 {
    1
}

#[utoipa::path(
    post,
    path = "/api/sales/installments",
    request_body = InstallmentsPayload,
    responses((status = 200, body = InstallmentPlan))
)]
pub async fn installments_preview(
    Json(payload): Json<InstallmentsPayload>,
) -> Result<impl IntoResponse, AppError> {
    let plan = installment_plan(
        payload.total,
        payload.payment_method,
        payload.installment_count,
    )?;
    // Arredonda na borda de apresentação.
    let presented = InstallmentPlan {
        original_value: round_money(plan.original_value),
        per_installment: round_money(plan.per_installment),
        total_with_interest: round_money(plan.total_with_interest),
        total_interest: round_money(plan.total_interest),
        ..plan
    };
    Ok((StatusCode::OK, Json(presented)))
}

// ---
// Checkout (salvar orçamento / finalizar venda)
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    pub customer_id: Option<Uuid>,
    /// Opcional: sem ele vale o vendedor padrão da configuração.
    pub seller_id: Option<Uuid>,
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub general_discount_percent: Decimal,
    /// Token de autorização para desconto acima da alçada.
    pub discount_ticket_id: Option<Uuid>,
    #[serde(default)]
    pub freight_value: Decimal,
    pub payment_method: Option<PaymentMethod>,
    #[serde(default = "default_installments")]
    pub installment_count: i32,
    pub notes: Option<String>,
    /// true = venda rápida (nasce Concluído); false = orçamento Pendente.
    #[serde(default)]
    pub finalize_immediately: bool,
}

#[utoipa::path(
    post,
    path = "/api/sales/checkout",
    request_body = CheckoutPayload,
    responses(
        (status = 201, description = "Orçamento criado"),
        (status = 409, description = "Estoque insuficiente (nenhuma reserva fica para trás)"),
        (status = 422, description = "Desconto acima da alçada sem ticket aprovado")
    )
)]
pub async fn checkout(
    State(app_state): State<AppState>,
    Json(payload): Json<CheckoutPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let cart = Cart::from_items(payload.items)?;
    let payment = payload
        .payment_method
        .map(|method| (method, payload.installment_count));

    let detail = app_state
        .quote_service
        .checkout(
            &app_state.db_pool,
            payload.customer_id,
            payload.seller_id,
            cart,
            payload.general_discount_percent,
            payload.discount_ticket_id,
            payload.freight_value,
            payment,
            payload.notes.as_deref(),
            payload.finalize_immediately,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(detail)))
}
