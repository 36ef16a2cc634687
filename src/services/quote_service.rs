// src/services/quote_service.rs
//
// Ciclo de vida do orçamento. Aqui mora a regra que o gate do cliente só
// antecipa: desconto acima da alçada não passa sem ticket aprovado, e o
// estoque é comprometido UMA vez, na finalização — mudanças de status não
// tocam estoque, com duas exceções compensatórias (cancelar devolve,
// reabrir revalida e reserva de novo).

use rust_decimal::Decimal;
use sqlx::{Acquire, Postgres};
use std::sync::Arc;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::error::AppError,
    config::SalesPolicy,
    db::{DiscountRepository, QuoteRepository, quote_repo::{PaymentRecord, QuoteFilter}},
    models::{
        quote::{DiscountTicket, FreightAttachment, Quote, QuoteDetail, QuoteStatus, TicketStatus},
        sale::{CartItem, PaymentMethod},
    },
    services::{
        cart::{Cart, compute_totals},
        payment::installment_plan,
        stock::{StockGateway, reserve_cart},
    },
};

fn validation_error(field: &'static str, message: &'static str) -> AppError {
    let mut err = ValidationError::new("invalid");
    err.message = Some(message.into());
    let mut errors = ValidationErrors::new();
    errors.add(field.into(), err);
    AppError::ValidationError(errors)
}

#[derive(Clone)]
pub struct QuoteService {
    repo: QuoteRepository,
    discount_repo: DiscountRepository,
    stock: Arc<dyn StockGateway>,
    policy: SalesPolicy,
}

impl QuoteService {
    pub fn new(
        repo: QuoteRepository,
        discount_repo: DiscountRepository,
        stock: Arc<dyn StockGateway>,
        policy: SalesPolicy,
    ) -> Self {
        Self {
            repo,
            discount_repo,
            stock,
            policy,
        }
    }

    /// Reaplica a regra de alçada do lado do servidor. O gate do cliente é
    /// só UX; quem manda é esta checagem, que exige um ticket APROVADO do
    /// PRÓPRIO vendedor cobrindo o percentual pedido (a autorização não é
    /// um token transferível entre vendedores).
    async fn enforce_discount_policy<'e, E>(
        &self,
        executor: E,
        seller_id: Uuid,
        general_discount_percent: Decimal,
        ticket_id: Option<Uuid>,
    ) -> Result<(), AppError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let threshold = self.policy.discount_threshold_percent;
        if general_discount_percent <= threshold {
            return Ok(());
        }

        let denied = AppError::DiscountAboveThreshold {
            requested: general_discount_percent,
            threshold,
        };
        let Some(ticket_id) = ticket_id else {
            return Err(denied);
        };
        let ticket = self
            .discount_repo
            .get_ticket(executor, ticket_id)
            .await?
            .ok_or(AppError::TicketNotFound)?;

        if ticket.authorizes(seller_id, general_discount_percent) {
            Ok(())
        } else {
            Err(denied)
        }
    }

    /// Finalização do carrinho: orçamento pendente ou venda rápida completa.
    ///
    /// Protocolo: valida política de desconto, reserva o estoque
    /// (tudo-ou-nada), e só então grava o documento. Se a gravação falhar, a
    /// reserva é compensada — um orçamento nunca chega a um status
    /// comprometido apontando para estoque não reservado.
    #[allow(clippy::too_many_arguments)]
    pub async fn checkout<'e, E>(
        &self,
        executor: E,
        customer_id: Option<Uuid>,
        seller_id: Option<Uuid>,
        cart: Cart,
        general_discount_percent: Decimal,
        discount_ticket_id: Option<Uuid>,
        freight_value: Decimal,
        payment: Option<(PaymentMethod, i32)>,
        notes: Option<&str>,
        finalize_immediately: bool,
    ) -> Result<QuoteDetail, AppError>
    where
        E: Acquire<'e, Database = Postgres> + Copy,
    {
        if cart.is_empty() {
            return Err(validation_error(
                "items",
                "O carrinho precisa de ao menos um item.",
            ));
        }
        if general_discount_percent < Decimal::ZERO
            || general_discount_percent > Decimal::ONE_HUNDRED
        {
            return Err(validation_error(
                "generalDiscountPercent",
                "O desconto geral deve estar entre 0 e 100.",
            ));
        }
        if freight_value < Decimal::ZERO {
            return Err(validation_error(
                "freightValue",
                "O frete não pode ser negativo.",
            ));
        }
        // Identidade padrão do vendedor vem da configuração, nunca de um
        // literal no meio da regra.
        let seller_id = seller_id
            .or(self.policy.default_seller_id)
            .ok_or_else(|| validation_error("sellerId", "O vendedor é obrigatório."))?;

        // Conexão curta, devolvida ao pool antes de falar com o colaborador
        // de estoque: nenhuma conexão fica presa atravessando os awaits do
        // gateway (com o pool cheio isso vira inanição mútua).
        {
            let mut conn = executor.acquire().await?;
            self.enforce_discount_policy(
                &mut *conn,
                seller_id,
                general_discount_percent,
                discount_ticket_id,
            )
            .await?;
        }

        let totals = compute_totals(cart.items(), general_discount_percent, freight_value);

        let payment_record = match payment {
            Some((method, count)) => {
                let plan = installment_plan(totals.total, method, count)?;
                Some(PaymentRecord {
                    method,
                    installment_count: plan.installment_count,
                    total_with_interest: plan.total_with_interest,
                })
            }
            None => None,
        };

        let status = if finalize_immediately {
            // Venda rápida: pula a negociação e nasce concluída.
            QuoteStatus::Completed
        } else {
            QuoteStatus::Pending
        };

        // A reserva precisa terminar (toda ou nenhuma) ANTES do documento
        // existir. A corrida entre dois balcões pelo mesmo produto é
        // resolvida pelo colaborador de estoque, não aqui.
        let mut ledger = reserve_cart(self.stock.as_ref(), cart.items()).await?;

        // A transação só começa com a reserva já fechada: nada de segurar
        // conexão do pool enquanto o gateway trabalha.
        let persisted: Result<QuoteDetail, AppError> = async {
            let mut tx = executor.begin().await?;
            let quote = self
                .repo
                .create_quote(
                    &mut *tx,
                    customer_id,
                    seller_id,
                    status,
                    totals.subtotal,
                    general_discount_percent,
                    totals.total,
                    (!freight_value.is_zero()).then_some(freight_value),
                    payment_record,
                    notes,
                )
                .await?;

            let mut items = Vec::with_capacity(cart.items().len());
            for (position, item) in cart.items().iter().enumerate() {
                items.push(
                    self.repo
                        .insert_item(&mut *tx, quote.id, item, position as i32)
                        .await?,
                );
            }

            tx.commit().await?;
            Ok(QuoteDetail {
                header: quote,
                items,
            })
        }
        .await;

        match persisted {
            Ok(detail) => {
                tracing::info!(
                    "Orçamento {} criado ({:?}), total {}",
                    detail.header.id,
                    detail.header.status,
                    detail.header.total_value
                );
                Ok(detail)
            }
            Err(err) => {
                // Persistência falhou depois da reserva: compensa tudo antes
                // de propagar, para não vazar estoque preso.
                ledger.release_all(self.stock.as_ref()).await;
                Err(err)
            }
        }
    }

    /// Mudança de status conforme a tabela de transições. Atualização pura
    /// de campos + carimbo de tempo; transição para Cancelado devolve o
    /// estoque comprometido na finalização.
    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
        new_status: QuoteStatus,
        notes: Option<&str>,
        expected_revision: Option<i32>,
    ) -> Result<Quote, AppError>
    where
        E: sqlx::Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self
            .repo
            .get_quote(&mut *tx, quote_id)
            .await?
            .ok_or(AppError::QuoteNotFound)?;

        if !current.status.can_transition_to(new_status) {
            return Err(AppError::InvalidStatusTransition {
                from: current.status,
                to: new_status,
            });
        }

        let items = self.repo.list_items(&mut *tx, quote_id).await?;

        let updated = self
            .repo
            .update_status(&mut *tx, quote_id, new_status, notes, expected_revision)
            .await?
            .ok_or(AppError::RevisionConflict {
                expected: expected_revision.unwrap_or(current.revision),
            })?;

        tx.commit().await?;

        if new_status == QuoteStatus::Cancelled {
            self.release_committed_stock(&items).await;
        }

        tracing::info!(
            "Orçamento {} mudou de {:?} para {:?}",
            quote_id,
            current.status,
            new_status
        );
        Ok(updated)
    }

    /// Reabertura: única saída de Cancelado, de volta a Pendente. O carrinho
    /// pode não estar mais em estoque depois do cancelamento, então a
    /// disponibilidade é revalidada reservando tudo de novo (tudo-ou-nada).
    pub async fn reopen<'e, E>(&self, executor: E, quote_id: Uuid) -> Result<Quote, AppError>
    where
        E: Acquire<'e, Database = Postgres> + Copy,
    {
        // Leitura numa conexão curta; a reserva roda sem conexão presa e a
        // escrita final é condicional à revisão lida (se o documento mudou
        // no meio tempo, a reabertura falha e a reserva é compensada).
        let (current, cart_items) = {
            let mut conn = executor.acquire().await?;
            let current = self
                .repo
                .get_quote(&mut *conn, quote_id)
                .await?
                .ok_or(AppError::QuoteNotFound)?;

            if current.status != QuoteStatus::Cancelled {
                return Err(AppError::InvalidStatusTransition {
                    from: current.status,
                    to: QuoteStatus::Pending,
                });
            }

            let items = self.repo.list_items(&mut *conn, quote_id).await?;
            let cart_items: Vec<CartItem> = items.iter().map(|i| i.as_cart_item()).collect();
            (current, cart_items)
        };

        let mut ledger = reserve_cart(self.stock.as_ref(), &cart_items).await?;

        let result: Result<Quote, AppError> = async {
            let mut tx = executor.begin().await?;
            let updated = self
                .repo
                .update_status(
                    &mut *tx,
                    quote_id,
                    QuoteStatus::Pending,
                    None,
                    Some(current.revision),
                )
                .await?
                .ok_or(AppError::RevisionConflict {
                    expected: current.revision,
                })?;
            tx.commit().await?;
            Ok(updated)
        }
        .await;

        match result {
            Ok(quote) => Ok(quote),
            Err(err) => {
                ledger.release_all(self.stock.as_ref()).await;
                Err(err)
            }
        }
    }

    /// Anexa a cotação de transportadora escolhida e recalcula o total.
    /// Permitido apenas enquanto o orçamento está aberto (Pendente,
    /// Negociando ou Aprovado).
    pub async fn attach_freight<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
        freight: FreightAttachment,
        expected_revision: Option<i32>,
    ) -> Result<Quote, AppError>
    where
        E: sqlx::Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if freight.value < Decimal::ZERO {
            return Err(validation_error("value", "O frete não pode ser negativo."));
        }
        if freight.delivery_days < 1 {
            return Err(validation_error(
                "deliveryDays",
                "O prazo de entrega deve ser de ao menos 1 dia.",
            ));
        }

        let mut tx = executor.begin().await?;

        let current = self
            .repo
            .get_quote(&mut *tx, quote_id)
            .await?
            .ok_or(AppError::QuoteNotFound)?;

        if !current.status.allows_freight_attachment() {
            return Err(AppError::FreightNotAttachable {
                status: current.status,
            });
        }

        // Total sempre reflete itens + desconto + frete: recalcula com o
        // mesmo agregador da finalização.
        let items = self.repo.list_items(&mut *tx, quote_id).await?;
        let cart_items: Vec<CartItem> = items.iter().map(|i| i.as_cart_item()).collect();
        let totals = compute_totals(
            &cart_items,
            current.general_discount_percent,
            freight.value,
        );

        let updated = self
            .repo
            .attach_freight(&mut *tx, quote_id, &freight, totals.total, expected_revision)
            .await?
            .ok_or(AppError::RevisionConflict {
                expected: expected_revision.unwrap_or(current.revision),
            })?;

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn get_detail<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
    ) -> Result<QuoteDetail, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;
        let quote = self
            .repo
            .get_quote(&mut *conn, quote_id)
            .await?
            .ok_or(AppError::QuoteNotFound)?;
        let items = self.repo.list_items(&mut *conn, quote_id).await?;
        Ok(QuoteDetail {
            header: quote,
            items,
        })
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        filter: &QuoteFilter,
    ) -> Result<Vec<Quote>, AppError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        self.repo.list_quotes(executor, filter).await
    }

    /// Exclusão administrativa definitiva, restrita a documentos cancelados.
    /// Qualquer outro status ainda tem estoque comprometido que a exclusão
    /// não compensaria (os itens caem em cascata e a devolução fica
    /// impossível); o DELETE repete a condição de status contra corrida.
    pub async fn hard_delete<'e, E>(&self, executor: E, quote_id: Uuid) -> Result<(), AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;
        let current = self
            .repo
            .get_quote(&mut *conn, quote_id)
            .await?
            .ok_or(AppError::QuoteNotFound)?;

        if !current.status.allows_hard_delete() {
            return Err(validation_error(
                "status",
                "Só orçamentos cancelados podem ser excluídos em definitivo.",
            ));
        }

        if self.repo.delete_quote(&mut *conn, quote_id).await? {
            Ok(())
        } else {
            Err(AppError::QuoteNotFound)
        }
    }

    pub async fn mark_pdf_generated<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
    ) -> Result<Quote, AppError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        self.repo
            .set_flag(executor, quote_id, "pdf_generated")
            .await?
            .ok_or(AppError::QuoteNotFound)
    }

    pub async fn mark_delivered<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
    ) -> Result<Quote, AppError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        self.repo
            .set_flag(executor, quote_id, "delivered_to_customer")
            .await?
            .ok_or(AppError::QuoteNotFound)
    }

    // --- Autorização de desconto ---

    /// Abre a solicitação na fila do gestor. Dispara-e-esquece do ponto de
    /// vista do vendedor: a resposta não chega por aqui, o status do ticket
    /// fica consultável em `get_ticket`.
    pub async fn request_discount_authorization<'e, E>(
        &self,
        executor: E,
        quote_id: Option<Uuid>,
        seller_id: Uuid,
        requested_percent: Decimal,
        reason: Option<&str>,
    ) -> Result<DiscountTicket, AppError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        if requested_percent <= self.policy.discount_threshold_percent {
            return Err(validation_error(
                "requestedPercent",
                "Desconto dentro da alçada não precisa de autorização.",
            ));
        }
        if requested_percent > Decimal::ONE_HUNDRED {
            return Err(validation_error(
                "requestedPercent",
                "O desconto não pode passar de 100%.",
            ));
        }
        let ticket = self
            .discount_repo
            .create_ticket(executor, quote_id, seller_id, requested_percent, reason)
            .await?;
        tracing::info!(
            "Solicitação de desconto {} aberta: {}% (alçada {}%)",
            ticket.id,
            requested_percent,
            self.policy.discount_threshold_percent
        );
        Ok(ticket)
    }

    pub async fn get_ticket<'e, E>(
        &self,
        executor: E,
        ticket_id: Uuid,
    ) -> Result<DiscountTicket, AppError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        self.discount_repo
            .get_ticket(executor, ticket_id)
            .await?
            .ok_or(AppError::TicketNotFound)
    }

    /// Decisão do gestor sobre uma solicitação pendente.
    pub async fn decide_ticket<'e, E>(
        &self,
        executor: E,
        ticket_id: Uuid,
        approve: bool,
    ) -> Result<DiscountTicket, AppError>
    where
        E: sqlx::Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let decision = if approve {
            TicketStatus::Approved
        } else {
            TicketStatus::Rejected
        };
        let decided = self
            .discount_repo
            .decide_ticket(&mut *tx, ticket_id, decision)
            .await?;

        let Some(ticket) = decided else {
            // Já decidido ou inexistente: distingue para o chamador.
            return match self.discount_repo.get_ticket(&mut *tx, ticket_id).await? {
                Some(_) => Err(validation_error(
                    "ticketId",
                    "Esta solicitação já foi decidida.",
                )),
                None => Err(AppError::TicketNotFound),
            };
        };

        tx.commit().await?;
        Ok(ticket)
    }

    /// Compensação do cancelamento: devolve ao estoque o que a finalização
    /// comprometeu. Falha de liberação individual não interrompe as demais.
    async fn release_committed_stock(&self, items: &[crate::models::quote::QuoteItem]) {
        for item in items {
            let Some(product_id) = item.product_id else {
                continue;
            };
            if let Err(err) = self.stock.release(product_id, item.quantity).await {
                tracing::error!(
                    "Falha ao devolver {} unidades do produto {} no cancelamento: {}",
                    item.quantity,
                    product_id,
                    err
                );
            }
        }
    }
}
