use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::quote::QuoteStatus;

// Nosso tipo de erro central, com `thiserror` para melhor ergonomia.
// Cada variante mapeia para um status HTTP em `IntoResponse`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Número de parcelas inválido: {0} (permitido: 1 a 6)")]
    InstallmentCountOutOfRange(i32),

    #[error("Desconto de {requested}% excede a alçada de {threshold}% sem autorização do gestor")]
    DiscountAboveThreshold {
        requested: Decimal,
        threshold: Decimal,
    },

    #[error(
        "Estoque insuficiente para o produto {product_id}: solicitado {requested}, disponível {available}"
    )]
    InsufficientStock {
        product_id: Uuid,
        requested: i32,
        available: i32,
    },

    #[error("Transição de status inválida: {from:?} -> {to:?}")]
    InvalidStatusTransition { from: QuoteStatus, to: QuoteStatus },

    #[error("Frete não pode ser anexado a um orçamento com status {status:?}")]
    FreightNotAttachable { status: QuoteStatus },

    #[error(
        "Liberação de {requested} unidades excede o saldo reservado ({outstanding}) do produto {product_id}"
    )]
    ReleaseExceedsReservation {
        product_id: Uuid,
        requested: i32,
        outstanding: i32,
    },

    #[error("Orçamento foi alterado por outro usuário (revisão esperada: {expected})")]
    RevisionConflict { expected: i32 },

    #[error("Orçamento não encontrado")]
    QuoteNotFound,

    #[error("Produto não encontrado")]
    ProductNotFound,

    #[error("Solicitação de desconto não encontrada")]
    TicketNotFound,

    #[error("Serviço externo indisponível: {0}")]
    CollaboratorUnavailable(String),

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::InstallmentCountOutOfRange(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::DiscountAboveThreshold { .. }
            | AppError::InvalidStatusTransition { .. }
            | AppError::FreightNotAttachable { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            // Condições recuperáveis: o chamador pode ajustar quantidades e repetir.
            AppError::InsufficientStock { .. }
            | AppError::ReleaseExceedsReservation { .. }
            | AppError::RevisionConflict { .. } => (StatusCode::CONFLICT, self.to_string()),
            AppError::QuoteNotFound | AppError::ProductNotFound | AppError::TicketNotFound => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            AppError::CollaboratorUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` loga a mensagem detalhada; o cliente recebe algo genérico.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
