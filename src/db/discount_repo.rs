// src/db/discount_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::quote::{DiscountTicket, TicketStatus},
};

#[derive(Clone)]
pub struct DiscountRepository {
    #[allow(dead_code)]
    pool: PgPool,
}

impl DiscountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Abre uma solicitação de autorização de desconto (entra na fila do
    /// gestor com status PENDING).
    pub async fn create_ticket<'e, E>(
        &self,
        executor: E,
        quote_id: Option<Uuid>,
        seller_id: Uuid,
        requested_percent: Decimal,
        reason: Option<&str>,
    ) -> Result<DiscountTicket, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ticket = sqlx::query_as::<_, DiscountTicket>(
            r#"
            INSERT INTO discount_tickets (quote_id, seller_id, requested_percent, reason)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(quote_id)
        .bind(seller_id)
        .bind(requested_percent)
        .bind(reason)
        .fetch_one(executor)
        .await?;
        Ok(ticket)
    }

    pub async fn get_ticket<'e, E>(
        &self,
        executor: E,
        ticket_id: Uuid,
    ) -> Result<Option<DiscountTicket>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ticket =
            sqlx::query_as::<_, DiscountTicket>("SELECT * FROM discount_tickets WHERE id = $1")
                .bind(ticket_id)
                .fetch_optional(executor)
                .await?;
        Ok(ticket)
    }

    /// Decisão do gestor. Só tickets pendentes podem ser decididos.
    pub async fn decide_ticket<'e, E>(
        &self,
        executor: E,
        ticket_id: Uuid,
        decision: TicketStatus,
    ) -> Result<Option<DiscountTicket>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ticket = sqlx::query_as::<_, DiscountTicket>(
            r#"
            UPDATE discount_tickets
            SET status = $2, decided_at = now()
            WHERE id = $1 AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(decision)
        .fetch_optional(executor)
        .await?;
        Ok(ticket)
    }
}
