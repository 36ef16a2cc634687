// src/db/catalog_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{common::error::AppError, models::catalog::ProductSearchHit};

#[derive(Clone)]
pub struct CatalogRepository {
    #[allow(dead_code)]
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Busca do balcão: nome ou SKU, com o saldo disponível junto.
    pub async fn search<'e, E>(
        &self,
        executor: E,
        term: &str,
        limit: i64,
    ) -> Result<Vec<ProductSearchHit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pattern = format!("%{}%", term.trim());
        let hits = sqlx::query_as::<_, ProductSearchHit>(
            r#"
            SELECT p.id, p.sku, p.name, p.brand, p.category, p.unit_price,
                   COALESCE(s.available_quantity, 0) AS available_quantity
            FROM products p
            LEFT JOIN stock_levels s ON s.product_id = p.id
            WHERE p.name ILIKE $1 OR p.sku ILIKE $1
            ORDER BY p.name ASC
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(executor)
        .await?;
        Ok(hits)
    }
}
