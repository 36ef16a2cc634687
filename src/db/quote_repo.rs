// src/db/quote_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        quote::{FreightAttachment, Quote, QuoteItem, QuoteStatus},
        sale::{CartItem, PaymentMethod},
    },
};

/// Filtro da listagem de orçamentos.
#[derive(Debug, Default, Clone)]
pub struct QuoteFilter {
    pub status: Option<QuoteStatus>,
    pub seller_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

/// Registro de pagamento gravado junto com a venda rápida finalizada.
#[derive(Debug, Clone, Copy)]
pub struct PaymentRecord {
    pub method: PaymentMethod,
    pub installment_count: i32,
    pub total_with_interest: Decimal,
}

#[derive(Clone)]
pub struct QuoteRepository {
    #[allow(dead_code)]
    pool: PgPool,
}

impl QuoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Escrita
    // ---

    #[allow(clippy::too_many_arguments)]
    pub async fn create_quote<'e, E>(
        &self,
        executor: E,
        customer_id: Option<Uuid>,
        seller_id: Uuid,
        status: QuoteStatus,
        subtotal: Decimal,
        general_discount_percent: Decimal,
        total_value: Decimal,
        freight_value: Option<Decimal>,
        payment: Option<PaymentRecord>,
        notes: Option<&str>,
    ) -> Result<Quote, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quote = sqlx::query_as::<_, Quote>(
            r#"
            INSERT INTO quotes (
                customer_id, seller_id, status, subtotal,
                general_discount_percent, total_value, freight_value,
                payment_method, installment_count, total_with_interest, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(seller_id)
        .bind(status)
        .bind(subtotal)
        .bind(general_discount_percent)
        .bind(total_value)
        .bind(freight_value)
        .bind(payment.map(|p| p.method))
        .bind(payment.map(|p| p.installment_count))
        .bind(payment.map(|p| p.total_with_interest))
        .bind(notes)
        .fetch_one(executor)
        .await?;
        Ok(quote)
    }

    /// Grava a fotografia de uma linha do carrinho como item do orçamento.
    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
        item: &CartItem,
        position: i32,
    ) -> Result<QuoteItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, QuoteItem>(
            r#"
            INSERT INTO quote_items (
                quote_id, kind, product_id, name, quantity,
                unit_price, line_discount_percent, position
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(quote_id)
        .bind(item.kind)
        .bind(item.product_id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.line_discount_percent)
        .bind(position)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    /// Atualização condicional de status. Com `expected_revision` presente, a
    /// escrita só acontece se ninguém mexeu no orçamento no meio tempo.
    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
        new_status: QuoteStatus,
        notes: Option<&str>,
        expected_revision: Option<i32>,
    ) -> Result<Option<Quote>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quote = sqlx::query_as::<_, Quote>(
            r#"
            UPDATE quotes
            SET status = $2,
                notes = COALESCE($3, notes),
                revision = revision + 1,
                updated_at = now()
            WHERE id = $1 AND ($4::INTEGER IS NULL OR revision = $4)
            RETURNING *
            "#,
        )
        .bind(quote_id)
        .bind(new_status)
        .bind(notes)
        .bind(expected_revision)
        .fetch_optional(executor)
        .await?;
        Ok(quote)
    }

    pub async fn attach_freight<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
        freight: &FreightAttachment,
        new_total: Decimal,
        expected_revision: Option<i32>,
    ) -> Result<Option<Quote>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quote = sqlx::query_as::<_, Quote>(
            r#"
            UPDATE quotes
            SET freight_carrier = $2,
                freight_service_code = $3,
                freight_value = $4,
                freight_delivery_days = $5,
                total_value = $6,
                revision = revision + 1,
                updated_at = now()
            WHERE id = $1 AND ($7::INTEGER IS NULL OR revision = $7)
            RETURNING *
            "#,
        )
        .bind(quote_id)
        .bind(&freight.carrier_name)
        .bind(&freight.service_code)
        .bind(freight.value)
        .bind(freight.delivery_days)
        .bind(new_total)
        .bind(expected_revision)
        .fetch_optional(executor)
        .await?;
        Ok(quote)
    }

    /// Liga um dos flags de efeito colateral do ciclo de vida (PDF gerado /
    /// entregue ao cliente).
    pub async fn set_flag<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
        flag: &str,
    ) -> Result<Option<Quote>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Coluna controlada pelo chamador interno, nunca por entrada externa.
        let sql = match flag {
            "pdf_generated" => {
                "UPDATE quotes SET pdf_generated = TRUE, revision = revision + 1, \
                 updated_at = now() WHERE id = $1 RETURNING *"
            }
            _ => {
                "UPDATE quotes SET delivered_to_customer = TRUE, revision = revision + 1, \
                 updated_at = now() WHERE id = $1 RETURNING *"
            }
        };
        let quote = sqlx::query_as::<_, Quote>(sql)
            .bind(quote_id)
            .fetch_optional(executor)
            .await?;
        Ok(quote)
    }

    /// Exclusão administrativa, condicionada ao status cancelado direto no
    /// SQL (o serviço valida antes, a condição cobre a corrida); os itens
    /// caem junto por ON DELETE CASCADE.
    pub async fn delete_quote<'e, E>(&self, executor: E, quote_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM quotes WHERE id = $1 AND status = 'CANCELLED'")
            .bind(quote_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---
    // Leitura
    // ---

    pub async fn get_quote<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
    ) -> Result<Option<Quote>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quote = sqlx::query_as::<_, Quote>("SELECT * FROM quotes WHERE id = $1")
            .bind(quote_id)
            .fetch_optional(executor)
            .await?;
        Ok(quote)
    }

    pub async fn list_items<'e, E>(
        &self,
        executor: E,
        quote_id: Uuid,
    ) -> Result<Vec<QuoteItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, QuoteItem>(
            "SELECT * FROM quote_items WHERE quote_id = $1 ORDER BY position ASC",
        )
        .bind(quote_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn list_quotes<'e, E>(
        &self,
        executor: E,
        filter: &QuoteFilter,
    ) -> Result<Vec<Quote>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quotes = sqlx::query_as::<_, Quote>(
            r#"
            SELECT * FROM quotes
            WHERE ($1::quote_status IS NULL OR status = $1)
              AND ($2::UUID IS NULL OR seller_id = $2)
              AND ($3::UUID IS NULL OR customer_id = $3)
              AND ($4::TIMESTAMPTZ IS NULL OR created_at >= $4)
              AND ($5::TIMESTAMPTZ IS NULL OR created_at <= $5)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.status)
        .bind(filter.seller_id)
        .bind(filter.customer_id)
        .bind(filter.created_from)
        .bind(filter.created_to)
        .fetch_all(executor)
        .await?;
        Ok(quotes)
    }
}
