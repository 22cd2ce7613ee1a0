/// Cleans a raw cell value into a signed float, defaulting to 0.0 on
/// irrecoverable garbage. Never fails.
///
/// If the text contains a comma it is treated as European formatting:
/// periods are stripped as thousands separators and the comma becomes the
/// decimal point. Afterwards every character that is not a digit, a period
/// or a leading minus sign is removed and the remainder parsed.
///
/// Known limitation: a US-style thousands comma with no decimal period
/// ("1,234") is reinterpreted as "1.234". The input gives us no locale to
/// disambiguate with, so the European reading wins.
pub fn clean_numeric(raw: &str) -> f64 {
    let text = if raw.contains(',') {
        raw.replace('.', "").replace(',', ".")
    } else {
        raw.to_string()
    };

    let mut cleaned = String::with_capacity(text.len());
    for ch in text.trim().chars() {
        if ch.is_ascii_digit() || ch == '.' || (ch == '-' && cleaned.is_empty()) {
            cleaned.push(ch);
        }
    }

    cleaned.parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_european_format() {
        assert_eq!(clean_numeric("1.234,56"), 1234.56);
        assert_eq!(clean_numeric("1.000.000,00"), 1_000_000.0);
        assert_eq!(clean_numeric("2,34"), 2.34);
    }

    #[test]
    fn test_plain_and_currency() {
        assert_eq!(clean_numeric("1234.56"), 1234.56);
        assert_eq!(clean_numeric("$ 2,34"), 2.34);
        assert_eq!(clean_numeric("€1.500,25"), 1500.25);
        assert_eq!(clean_numeric("  42  "), 42.0);
    }

    #[test]
    fn test_negative_amounts() {
        assert_eq!(clean_numeric("-1000.50"), -1000.50);
        assert_eq!(clean_numeric("-1.000,50"), -1000.50);
        assert_eq!(clean_numeric("$ -200.00"), -200.0);
    }

    #[test]
    fn test_garbage_defaults_to_zero() {
        assert_eq!(clean_numeric("abc"), 0.0);
        assert_eq!(clean_numeric(""), 0.0);
        assert_eq!(clean_numeric("--"), 0.0);
        assert_eq!(clean_numeric("N/A"), 0.0);
    }

    // Pins the documented misparse of US thousands commas rather than
    // silently changing the policy.
    #[test]
    fn test_us_thousands_comma_limitation() {
        assert_eq!(clean_numeric("1,234"), 1.234);
        assert_eq!(clean_numeric("1,234.56"), 1.23456);
    }
}
