// src/db/stock_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, services::stock::StockGateway};

/// Implementação Postgres do colaborador de estoque.
///
/// A atomicidade por produto vem do UPDATE condicional: duas finalizações
/// concorrentes da mesma peça disputam a mesma linha e só uma leva a última
/// unidade. Nada de ler-e-depois-escrever.
#[derive(Clone)]
pub struct StockRepository {
    pool: PgPool,
}

impl StockRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn available_quantity(&self, product_id: Uuid) -> Result<i32, AppError> {
        let row: Option<(i32,)> =
            sqlx::query_as("SELECT available_quantity FROM stock_levels WHERE product_id = $1")
                .bind(product_id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(|(qty,)| qty).ok_or(AppError::ProductNotFound)
    }
}

#[async_trait]
impl StockGateway for StockRepository {
    async fn reserve(&self, product_id: Uuid, quantity: i32) -> Result<(), AppError> {
        let updated = sqlx::query(
            r#"
            UPDATE stock_levels
            SET available_quantity = available_quantity - $2,
                updated_at = now()
            WHERE product_id = $1 AND available_quantity >= $2
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            // Ou a peça não existe no estoque, ou o saldo é insuficiente.
            let available = self.available_quantity(product_id).await?;
            return Err(AppError::InsufficientStock {
                product_id,
                requested: quantity,
                available,
            });
        }
        Ok(())
    }

    async fn release(&self, product_id: Uuid, quantity: i32) -> Result<(), AppError> {
        let updated = sqlx::query(
            r#"
            UPDATE stock_levels
            SET available_quantity = available_quantity + $2,
                updated_at = now()
            WHERE product_id = $1
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::ProductNotFound);
        }
        Ok(())
    }
}
