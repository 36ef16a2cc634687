// src/config.rs

use rust_decimal::Decimal;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{env, str::FromStr, sync::Arc, time::Duration};
use uuid::Uuid;

use crate::{
    db::{CatalogRepository, DiscountRepository, QuoteRepository, StockRepository},
    services::{freight::FreightRateProvider, quote_service::QuoteService, stock::StockGateway},
};

/// Política comercial da loja. Os valores que o balcão antigo carregava
/// como literais (alçada de 10%, CEP de origem, vendedor padrão) entram
/// aqui por configuração, com default sensato e override por deployment.
#[derive(Clone, Debug)]
pub struct SalesPolicy {
    pub discount_threshold_percent: Decimal,
    pub default_origin_cep: String,
    pub default_seller_id: Option<Uuid>,
}

impl SalesPolicy {
    fn from_env() -> anyhow::Result<Self> {
        let discount_threshold_percent = match env::var("DISCOUNT_THRESHOLD_PERCENT") {
            Ok(raw) => Decimal::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("DISCOUNT_THRESHOLD_PERCENT inválido: {e}"))?,
            Err(_) => Decimal::from(10),
        };
        let default_origin_cep =
            env::var("DEFAULT_ORIGIN_CEP").unwrap_or_else(|_| "01001-000".to_string());
        let default_seller_id = match env::var("DEFAULT_SELLER_ID") {
            Ok(raw) => Some(
                Uuid::parse_str(&raw)
                    .map_err(|e| anyhow::anyhow!("DEFAULT_SELLER_ID inválido: {e}"))?,
            ),
            Err(_) => None,
        };
        Ok(Self {
            discount_threshold_percent,
            default_origin_cep,
            default_seller_id,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub policy: SalesPolicy,
    pub catalog_repo: CatalogRepository,
    pub quote_service: QuoteService,
    /// Provedor de cotação de frete. `None` quando o deployment não tem
    /// integração configurada: a rota de cotação responde 503.
    pub freight_provider: Option<Arc<dyn FreightRateProvider>>,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL deve ser definida"))?;
        let policy = SalesPolicy::from_env()?;

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let catalog_repo = CatalogRepository::new(db_pool.clone());
        let quote_repo = QuoteRepository::new(db_pool.clone());
        let discount_repo = DiscountRepository::new(db_pool.clone());
        let stock: Arc<dyn StockGateway> = Arc::new(StockRepository::new(db_pool.clone()));
        let quote_service =
            QuoteService::new(quote_repo, discount_repo, stock, policy.clone());

        Ok(Self {
            db_pool,
            policy,
            catalog_repo,
            quote_service,
            freight_provider: None,
        })
    }
}
