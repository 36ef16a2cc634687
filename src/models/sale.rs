// src/models/sale.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::money::round_money;

// --- Carrinho ---

// Origem de uma linha do carrinho: peça do catálogo ou item avulso
// digitado no balcão (sem cadastro, sem estoque).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "item_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    Catalog,
    AdHoc,
}

/// Uma linha do carrinho em edição. Conjunto de trabalho em memória:
/// nada aqui toca estoque nem banco até a finalização.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub kind: ItemKind,
    /// Presente apenas para itens de catálogo.
    pub product_id: Option<Uuid>,
    pub name: String,
    #[schema(example = 2)]
    pub quantity: i32,
    #[schema(example = "100.00")]
    pub unit_price: Decimal,
    #[schema(example = "0")]
    pub line_discount_percent: Decimal,
}

// Agregado de preços do carrinho. Derivado, nunca persistido sozinho:
// qualquer mutação do carrinho invalida o snapshot anterior.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub line_discount_total: Decimal,
    pub general_discount_percent: Decimal,
    pub general_discount_value: Decimal,
    pub freight: Decimal,
    pub total: Decimal,
}

impl CartTotals {
    /// Versão arredondada a 2 casas, para a borda de apresentação.
    pub fn presented(&self) -> CartTotals {
        CartTotals {
            subtotal: round_money(self.subtotal),
            line_discount_total: round_money(self.line_discount_total),
            general_discount_percent: self.general_discount_percent,
            general_discount_value: round_money(self.general_discount_value),
            freight: round_money(self.freight),
            total: round_money(self.total),
        }
    }
}

// --- Pagamento ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Pix,
    DebitCard,
    CreditCard,
    BankTransfer,
    StoreCredit,
}

/// Plano de parcelamento apresentado ao comprador na escolha da forma
/// de pagamento.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentPlan {
    pub original_value: Decimal,
    #[schema(example = 3)]
    pub installment_count: i32,
    #[schema(example = "5.0")]
    pub rate_percent: Decimal,
    pub per_installment: Decimal,
    pub total_with_interest: Decimal,
    pub total_interest: Decimal,
}
