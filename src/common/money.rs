// src/common/money.rs

use rust_decimal::{Decimal, RoundingStrategy};

/// Arredonda um valor monetário para 2 casas decimais.
///
/// Regra numérica do motor: os cálculos intermediários rodam com a precisão
/// completa do `Decimal` e o arredondamento acontece UMA vez, na borda de
/// apresentação. Isso evita acumular desvios de arredondamento no meio das
/// contas.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Aplica um percentual sobre uma base (ex: desconto, juros).
pub fn apply_percent(base: Decimal, percent: Decimal) -> Decimal {
    base * percent / Decimal::ONE_HUNDRED
}

/// Trava o valor no piso zero (um desconto maior que o subtotal nunca
/// produz total negativo).
pub fn clamp_non_negative(value: Decimal) -> Decimal {
    if value < Decimal::ZERO {
        Decimal::ZERO
    } else {
        value
    }
}

/// Formata um valor em Real brasileiro: "R$ 1.234,56".
pub fn format_brl(value: Decimal) -> String {
    let rounded = round_money(value).abs();
    let cents = (rounded * Decimal::ONE_HUNDRED).trunc();
    let total_cents: i128 = cents.try_into().unwrap_or(0);

    let integer = total_cents / 100;
    let fraction = total_cents % 100;

    // Agrupa os milhares com ponto, padrão pt-BR.
    let digits = integer.to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if value < Decimal::ZERO { "-" } else { "" };
    format!("{}R$ {},{:02}", sign, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: i64, scale: u32) -> Decimal {
        Decimal::new(value, scale)
    }

    #[test]
    fn round_money_half_up() {
        assert_eq!(round_money(dec(10005, 3)), dec(1001, 2)); // 10.005 -> 10.01
        assert_eq!(round_money(dec(10004, 3)), dec(1000, 2)); // 10.004 -> 10.00
    }

    #[test]
    fn apply_percent_basic() {
        // 15% de 250.00 = 37.50
        assert_eq!(apply_percent(dec(25000, 2), dec(15, 0)), dec(375000, 4));
    }

    #[test]
    fn clamp_floors_negative_values() {
        assert_eq!(clamp_non_negative(dec(-1, 2)), Decimal::ZERO);
        assert_eq!(clamp_non_negative(dec(1, 2)), dec(1, 2));
    }

    #[test]
    fn format_brl_groups_thousands() {
        assert_eq!(format_brl(dec(123456789, 2)), "R$ 1.234.567,89");
        assert_eq!(format_brl(dec(50, 2)), "R$ 0,50");
        assert_eq!(format_brl(Decimal::ZERO), "R$ 0,00");
        assert_eq!(format_brl(dec(-9990, 2)), "-R$ 99,90");
    }
}
