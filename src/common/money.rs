// src/common/money.rs

use rust_decimal::{Decimal, RoundingStrategy};

/// Arredonda para centavos (meio para longe do zero: 166,665 -> 166,67).
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Aplica um percentual (ex.: 2.5 = 2,5%) sobre um valor, sem arredondar.
pub fn percent_of(amount: Decimal, percentage: Decimal) -> Decimal {
    amount * percentage / Decimal::ONE_HUNDRED
}

/// Formata no padrão brasileiro: `R$ 1.234,56`.
pub fn format_brl(value: Decimal) -> String {
    let rounded = round_cents(value);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}R$ {grouped},{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_cents(dec!(166.665)), dec!(166.67));
        assert_eq!(round_cents(dec!(83.3333)), dec!(83.33));
        assert_eq!(round_cents(dec!(41.6666)), dec!(41.67));
    }

    #[test]
    fn formats_brazilian_currency() {
        assert_eq!(format_brl(dec!(0)), "R$ 0,00");
        assert_eq!(format_brl(dec!(166.666)), "R$ 166,67");
        assert_eq!(format_brl(dec!(1234567.5)), "R$ 1.234.567,50");
        assert_eq!(format_brl(dec!(-950)), "-R$ 950,00");
    }

    #[test]
    fn percent_of_keeps_full_precision() {
        assert_eq!(percent_of(dec!(100000), dec!(2)), dec!(2000));
        assert_eq!(percent_of(dec!(100000), dec!(0.5)), dec!(500));
    }
}
