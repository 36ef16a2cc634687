// src/services/payment.rs
//
// Calculadora de parcelamento. Tabela fixa de taxas do cartão de crédito,
// sem juros compostos: consulta determinística por número de parcelas.

use rust_decimal::Decimal;

use crate::{
    common::{error::AppError, money::apply_percent},
    models::sale::{InstallmentPlan, PaymentMethod},
};

pub const MAX_INSTALLMENTS: i32 = 6;

/// Taxa da tabela para o cartão de crédito, por número de parcelas.
fn credit_card_rate(installments: i32) -> Option<Decimal> {
    let rate = match installments {
        1 => Decimal::ZERO,
        2 => Decimal::new(25, 1),  // 2.5%
        3 => Decimal::new(50, 1),  // 5.0%
        4 => Decimal::new(75, 1),  // 7.5%
        5 => Decimal::new(100, 1), // 10.0%
        6 => Decimal::new(125, 1), // 12.5%
        _ => return None,
    };
    Some(rate)
}

/// Monta o plano de parcelamento para o total já fechado do carrinho.
///
/// Formas à vista (dinheiro, PIX, débito, transferência, vale-peça) saem em
/// parcela única sem juros; `installment_count` é ignorado para elas. Para
/// cartão de crédito o número de parcelas deve estar em [1, 6] — fora disso
/// é erro de validação, nunca um ajuste silencioso.
pub fn installment_plan(
    total: Decimal,
    method: PaymentMethod,
    installment_count: i32,
) -> Result<InstallmentPlan, AppError> {
    match method {
        PaymentMethod::Cash
        | PaymentMethod::Pix
        | PaymentMethod::DebitCard
        | PaymentMethod::BankTransfer
        | PaymentMethod::StoreCredit => Ok(InstallmentPlan {
            original_value: total,
            installment_count: 1,
            rate_percent: Decimal::ZERO,
            per_installment: total,
            total_with_interest: total,
            total_interest: Decimal::ZERO,
        }),
        PaymentMethod::CreditCard => {
            let rate = credit_card_rate(installment_count)
                .ok_or(AppError::InstallmentCountOutOfRange(installment_count))?;

            let total_interest = apply_percent(total, rate);
            let total_with_interest = total + total_interest;
            // Total zero produz plano zerado; o guard evita divisão inútil.
            let per_installment = if total.is_zero() {
                Decimal::ZERO
            } else {
                total_with_interest / Decimal::from(installment_count)
            };

            Ok(InstallmentPlan {
                original_value: total,
                installment_count,
                rate_percent: rate,
                per_installment,
                total_with_interest,
                total_interest,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::money::round_money;

    fn dec(value: i64, scale: u32) -> Decimal {
        Decimal::new(value, scale)
    }

    #[test]
    fn cash_like_methods_have_single_installment_without_interest() {
        for method in [
            PaymentMethod::Cash,
            PaymentMethod::Pix,
            PaymentMethod::DebitCard,
            PaymentMethod::BankTransfer,
            PaymentMethod::StoreCredit,
        ] {
            let plan = installment_plan(dec(26000, 2), method, 4).unwrap();
            assert_eq!(plan.installment_count, 1);
            assert_eq!(plan.total_interest, Decimal::ZERO);
            assert_eq!(plan.per_installment, dec(26000, 2));
            assert_eq!(plan.total_with_interest, dec(26000, 2));
        }
    }

    #[test]
    fn credit_card_single_installment_is_interest_free() {
        let plan = installment_plan(dec(26000, 2), PaymentMethod::CreditCard, 1).unwrap();
        assert_eq!(plan.rate_percent, Decimal::ZERO);
        assert_eq!(plan.total_interest, Decimal::ZERO);
        assert_eq!(plan.total_with_interest, dec(26000, 2));
    }

    #[test]
    fn credit_card_three_installments_scenario() {
        // 260.00 em 3x: 5% de juros = 13.00, total 273.00, parcela 91.00.
        let plan = installment_plan(dec(26000, 2), PaymentMethod::CreditCard, 3).unwrap();
        assert_eq!(round_money(plan.total_interest), dec(1300, 2));
        assert_eq!(round_money(plan.total_with_interest), dec(27300, 2));
        assert_eq!(round_money(plan.per_installment), dec(9100, 2));
    }

    #[test]
    fn credit_card_six_installments_hit_the_table_ceiling() {
        let plan = installment_plan(dec(10000, 2), PaymentMethod::CreditCard, 6).unwrap();
        assert_eq!(plan.rate_percent, dec(125, 1));
        assert_eq!(round_money(plan.total_interest), dec(1250, 2));
    }

    #[test]
    fn per_installment_times_count_recovers_the_total() {
        let total = dec(26000, 2);
        for count in 1..=MAX_INSTALLMENTS {
            let plan = installment_plan(total, PaymentMethod::CreditCard, count).unwrap();
            let reconstructed = plan.per_installment * Decimal::from(count);
            // Tolerância de arredondamento na borda de apresentação.
            assert_eq!(round_money(reconstructed), round_money(plan.total_with_interest));
        }
    }

    #[test]
    fn out_of_range_installments_are_rejected_not_clamped() {
        for count in [0, -1, 7, 12] {
            let result = installment_plan(dec(10000, 2), PaymentMethod::CreditCard, count);
            assert!(matches!(
                result,
                Err(AppError::InstallmentCountOutOfRange(c)) if c == count
            ));
        }
    }

    #[test]
    fn zero_total_yields_all_zero_plan() {
        let plan = installment_plan(Decimal::ZERO, PaymentMethod::CreditCard, 6).unwrap();
        assert_eq!(plan.per_installment, Decimal::ZERO);
        assert_eq!(plan.total_with_interest, Decimal::ZERO);
        assert_eq!(plan.total_interest, Decimal::ZERO);
    }
}
