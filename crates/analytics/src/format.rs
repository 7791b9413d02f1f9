use rust_decimal::{Decimal, RoundingStrategy};

/// Formats money as `<label> 1,234.56`.
pub fn format_currency(value: Decimal, label: &str) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let digits = format!("{:.2}", rounded.abs());
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{label} {sign}{}.{fraction}", group_thousands(whole))
}

/// Rounds a percentage to the one decimal place it is displayed with.
pub fn round_pct(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats a percentage magnitude with one decimal place, e.g. `20.0`.
pub fn format_pct(value: Decimal) -> String {
    let rounded = round_pct(value).abs();
    format!("{rounded:.1}")
}

/// Formats a count with thousands separators, e.g. `12,345`.
pub fn format_count(value: usize) -> String {
    group_thousands(&value.to_string())
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(dec!(1234567.891), "BRL"), "BRL 1,234,567.89");
        assert_eq!(format_currency(dec!(100), "BRL"), "BRL 100.00");
        assert_eq!(format_currency(dec!(0), "USD"), "USD 0.00");
        assert_eq!(format_currency(dec!(999.995), "BRL"), "BRL 1,000.00");
    }

    #[test]
    fn currency_keeps_sign() {
        assert_eq!(format_currency(dec!(-1500.5), "BRL"), "BRL -1,500.50");
    }

    #[test]
    fn count_groups_thousands() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(98666), "98,666");
    }

    #[test]
    fn pct_has_one_decimal() {
        assert_eq!(format_pct(dec!(20)), "20.0");
        assert_eq!(format_pct(dec!(-12.345)), "12.3");
        assert_eq!(format_pct(dec!(83.3333)), "83.3");
        assert!(round_pct(dec!(0.04)).is_zero());
        assert!(round_pct(dec!(-0.04)).is_zero());
        assert_eq!(round_pct(dec!(0.05)), dec!(0.1));
        assert_eq!(format_pct(dec!(0.05)), "0.1");
    }
}
