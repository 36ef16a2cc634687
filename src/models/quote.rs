// src/models/quote.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::sale::{CartItem, ItemKind, PaymentMethod};

// --- Status do orçamento ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "quote_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteStatus {
    Pending,
    Negotiating,
    Approved,
    Completed,
    Cancelled,
}

impl QuoteStatus {
    /// Tabela de transições do ciclo de vida. Tudo que não está aqui é
    /// rejeitado com `InvalidStatusTransition`.
    ///
    /// Cancelado é terminal para este caminho: sair de Cancelado só pela
    /// operação dedicada de reabertura (`reopen`), que revalida estoque.
    pub fn can_transition_to(self, next: QuoteStatus) -> bool {
        use QuoteStatus::*;
        match (self, next) {
            (Pending, Negotiating | Approved | Completed | Cancelled) => true,
            (Negotiating, Pending | Approved | Completed | Cancelled) => true,
            (Approved, Completed | Cancelled | Negotiating) => true,
            (Completed, Cancelled) => true,
            _ => false,
        }
    }

    /// Frete só pode ser anexado enquanto o orçamento ainda está aberto.
    pub fn allows_freight_attachment(self) -> bool {
        matches!(
            self,
            QuoteStatus::Pending | QuoteStatus::Negotiating | QuoteStatus::Approved
        )
    }

    /// Exclusão definitiva só vale para documentos cancelados: qualquer
    /// outro status ainda tem estoque comprometido que a exclusão não
    /// compensaria (os itens caem em cascata junto com o cabeçalho).
    pub fn allows_hard_delete(self) -> bool {
        self == QuoteStatus::Cancelled
    }
}

// --- Entidade persistida ---

/// Cabeçalho do orçamento ("orçamento" / venda rápida). Os itens ficam
/// em `quote_items`; `QuoteDetail` junta as duas partes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub seller_id: Uuid,
    pub status: QuoteStatus,
    pub subtotal: Decimal,
    pub general_discount_percent: Decimal,
    /// Sempre reflete itens + desconto + frete; recalculado a cada edição.
    pub total_value: Decimal,
    pub freight_carrier: Option<String>,
    pub freight_service_code: Option<String>,
    pub freight_value: Option<Decimal>,
    pub freight_delivery_days: Option<i32>,
    pub payment_method: Option<PaymentMethod>,
    pub installment_count: Option<i32>,
    pub total_with_interest: Option<Decimal>,
    pub notes: Option<String>,
    pub pdf_generated: bool,
    pub delivered_to_customer: bool,
    /// Contador de revisão para atualização condicional (edições
    /// concorrentes de vendedor e gestor não se sobrescrevem em silêncio).
    pub revision: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fotografia de uma linha do carrinho, imutável depois de anexada ao
/// orçamento (edições passam por operações explícitas do serviço).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteItem {
    pub id: Uuid,
    pub quote_id: Uuid,
    pub kind: ItemKind,
    pub product_id: Option<Uuid>,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_discount_percent: Decimal,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

impl QuoteItem {
    /// Reconstrói a linha de carrinho equivalente, para recalcular totais
    /// com o mesmo agregador usado na finalização.
    pub fn as_cart_item(&self) -> CartItem {
        CartItem {
            kind: self.kind,
            product_id: self.product_id,
            name: self.name.clone(),
            quantity: self.quantity,
            unit_price: self.unit_price,
            line_discount_percent: self.line_discount_percent,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDetail {
    #[serde(flatten)]
    pub header: Quote,
    pub items: Vec<QuoteItem>,
}

/// Cotação de transportadora anexada ao orçamento.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FreightAttachment {
    #[schema(example = "Correios")]
    pub carrier_name: String,
    #[schema(example = "SEDEX")]
    pub service_code: String,
    #[schema(example = "35.90")]
    pub value: Decimal,
    #[schema(example = 4)]
    pub delivery_days: i32,
}

// --- Autorização de desconto ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "ticket_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Pending,
    Approved,
    Rejected,
}

/// Solicitação de autorização de desconto acima da alçada do vendedor.
/// O vendedor dispara e segue trabalhando; o status fica consultável e um
/// ticket aprovado serve de token de autorização na finalização.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiscountTicket {
    pub id: Uuid,
    pub quote_id: Option<Uuid>,
    pub seller_id: Uuid,
    pub requested_percent: Decimal,
    pub reason: Option<String>,
    pub status: TicketStatus,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DiscountTicket {
    /// Autorização de desconto na finalização. Um ticket aprovado vale só
    /// para o vendedor que o solicitou, até o percentual concedido; ticket
    /// amarrado a um documento existente não autoriza um checkout novo.
    pub fn authorizes(&self, seller_id: Uuid, percent: Decimal) -> bool {
        self.status == TicketStatus::Approved
            && self.seller_id == seller_id
            && self.requested_percent >= percent
            && self.quote_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use QuoteStatus::*;

    const ALL: [QuoteStatus; 5] = [Pending, Negotiating, Approved, Completed, Cancelled];

    #[test]
    fn transition_table_matches_lifecycle_rules() {
        let allowed = [
            (Pending, Negotiating),
            (Pending, Approved),
            (Pending, Completed),
            (Pending, Cancelled),
            (Negotiating, Pending),
            (Negotiating, Approved),
            (Negotiating, Completed),
            (Negotiating, Cancelled),
            (Approved, Completed),
            (Approved, Cancelled),
            (Approved, Negotiating),
            (Completed, Cancelled),
        ];

        // Percorre a grade inteira: o que não está na lista acima é proibido.
        for from in ALL {
            for to in ALL {
                let expected = allowed.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "transição {from:?} -> {to:?}"
                );
            }
        }
    }

    #[test]
    fn completed_cannot_go_back_to_approved() {
        assert!(!Completed.can_transition_to(Approved));
    }

    #[test]
    fn cancelled_has_no_ordinary_exit() {
        for to in ALL {
            assert!(!Cancelled.can_transition_to(to));
        }
    }

    #[test]
    fn freight_attachment_only_while_open() {
        assert!(Pending.allows_freight_attachment());
        assert!(Negotiating.allows_freight_attachment());
        assert!(Approved.allows_freight_attachment());
        assert!(!Completed.allows_freight_attachment());
        assert!(!Cancelled.allows_freight_attachment());
    }

    #[test]
    fn hard_delete_only_from_cancelled() {
        // Apagar um documento não cancelado perderia a fotografia dos itens
        // e, com ela, a chance de devolver o estoque comprometido.
        for status in ALL {
            assert_eq!(status.allows_hard_delete(), status == Cancelled);
        }
    }

    fn ticket(seller_id: Uuid, percent: Decimal, status: TicketStatus) -> DiscountTicket {
        DiscountTicket {
            id: Uuid::new_v4(),
            quote_id: None,
            seller_id,
            requested_percent: percent,
            reason: None,
            status,
            decided_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn ticket_authorizes_only_its_own_seller() {
        let seller = Uuid::new_v4();
        let other_seller = Uuid::new_v4();
        let fifteen = Decimal::from(15);
        let approved = ticket(seller, fifteen, TicketStatus::Approved);

        assert!(approved.authorizes(seller, fifteen));
        // A aprovação não é um token transferível.
        assert!(!approved.authorizes(other_seller, fifteen));
    }

    #[test]
    fn ticket_authorizes_up_to_the_granted_percent() {
        let seller = Uuid::new_v4();
        let approved = ticket(seller, Decimal::from(15), TicketStatus::Approved);

        assert!(approved.authorizes(seller, Decimal::from(12)));
        assert!(!approved.authorizes(seller, Decimal::from(20)));
    }

    #[test]
    fn undecided_or_rejected_ticket_authorizes_nothing() {
        let seller = Uuid::new_v4();
        let fifteen = Decimal::from(15);

        for status in [TicketStatus::Pending, TicketStatus::Rejected] {
            assert!(!ticket(seller, fifteen, status).authorizes(seller, fifteen));
        }
    }

    #[test]
    fn ticket_bound_to_another_document_does_not_authorize_a_new_checkout() {
        let seller = Uuid::new_v4();
        let fifteen = Decimal::from(15);
        let mut bound = ticket(seller, fifteen, TicketStatus::Approved);
        bound.quote_id = Some(Uuid::new_v4());

        assert!(!bound.authorizes(seller, fifteen));
    }
}
