// src/services/freight.rs
//
// Cotação de frete. O cálculo de tarifa é de um provedor externo opaco
// (transportadoras/correios); o motor só define o contrato e anexa a cotação
// escolhida ao orçamento (QuoteService::attach_freight).

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::{common::error::AppError, models::quote::FreightAttachment};

/// Provedor de cotações: recebe origem/destino e peso estimado do carrinho,
/// devolve zero ou mais opções de serviço já precificadas.
#[async_trait]
pub trait FreightRateProvider: Send + Sync {
    async fn quote_rates(
        &self,
        origin_cep: &str,
        destination_cep: &str,
        weight_kg: Decimal,
    ) -> Result<Vec<FreightAttachment>, AppError>;
}

/// CEP válido: 8 dígitos, com ou sem hífen.
pub fn is_valid_cep(cep: &str) -> bool {
    let digits: String = cep.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.len() == 8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cep_accepts_both_masked_and_raw_forms() {
        assert!(is_valid_cep("01001-000"));
        assert!(is_valid_cep("01001000"));
        assert!(!is_valid_cep("0100-000"));
        assert!(!is_valid_cep(""));
        assert!(!is_valid_cep("abcdefgh"));
    }
}
