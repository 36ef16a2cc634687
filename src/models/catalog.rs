// src/models/catalog.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Catálogo de peças. O estoque fica em `stock_levels`, separado do cadastro.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(example = "FLT-0042")]
    pub sku: String,
    #[schema(example = "Filtro de óleo")]
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    #[schema(example = "89.90")]
    pub unit_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Resultado da busca do balcão: cadastro + saldo disponível, numa linha só.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductSearchHit {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub unit_price: Decimal,
    #[schema(example = 12)]
    pub available_quantity: i32,
}
