//! Locale-aware amount formatting and parsing.
//!
//! The server renders amounts in fr-MA style (space-grouped thousands,
//! decimal comma, two fraction digits) and the totals routine has to read
//! those strings back out of table cells, so formatting and parsing live
//! together here.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Locale {
    pub decimal_sep: char,
    pub group_sep: char,
    pub currency: &'static str,
}

/// The locale the RecipeRover pages are rendered with.
pub const FR_MA: Locale = Locale {
    decimal_sep: ',',
    group_sep: '\u{202f}',
    currency: "MAD",
};

impl Locale {
    /// Formats an amount with two fraction digits and grouped thousands,
    /// e.g. `1 234,56`.
    pub fn format_amount(&self, amount: f64) -> String {
        let negative = amount < 0.0;
        let cents = (amount.abs() * 100.0).round() as u64;
        let units = (cents / 100).to_string();
        let fraction = cents % 100;

        let mut grouped = String::with_capacity(units.len() + units.len() / 3);
        for (index, digit) in units.chars().enumerate() {
            if index != 0 && (units.len() - index) % 3 == 0 {
                grouped.push(self.group_sep);
            }
            grouped.push(digit);
        }

        let sign = if negative { "-" } else { "" };
        format!("{}{}{}{:02}", sign, grouped, self.decimal_sep, fraction)
    }

    /// Formats an amount followed by the currency code, as the chart
    /// tooltips display it.
    pub fn format_currency(&self, amount: f64) -> String {
        format!("{} {}", self.format_amount(amount), self.currency)
    }

    /// Reads a rendered amount back into a number. Whitespace, grouping
    /// separators and a trailing currency code are tolerated; the decimal
    /// comma becomes a decimal point. Anything else is `None`.
    pub fn parse_amount(&self, text: &str) -> Option<f64> {
        let mut cleaned = String::with_capacity(text.len());
        for ch in text.chars() {
            if ch.is_whitespace() || ch == self.group_sep {
                continue;
            }
            if ch == self.decimal_sep {
                cleaned.push('.');
            } else {
                cleaned.push(ch);
            }
        }

        let cleaned = cleaned.strip_suffix(self.currency).unwrap_or(&cleaned);
        if cleaned.is_empty() {
            return None;
        }
        cleaned.parse::<f64>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn formats_two_fraction_digits() {
        assert_eq!(FR_MA.format_amount(0.0), "0,00");
        assert_eq!(FR_MA.format_amount(100.0), "100,00");
        assert_eq!(FR_MA.format_amount(50.5), "50,50");
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(FR_MA.format_amount(1234.56), "1\u{202f}234,56");
        assert_eq!(FR_MA.format_amount(1_000_000.0), "1\u{202f}000\u{202f}000,00");
    }

    #[test]
    fn formats_negative_amounts() {
        assert_eq!(FR_MA.format_amount(-1234.5), "-1\u{202f}234,50");
    }

    #[test]
    fn formats_currency_with_code() {
        assert_eq!(FR_MA.format_currency(1234.56), "1\u{202f}234,56 MAD");
    }

    #[test]
    fn parses_grouped_amounts() {
        assert!(close(FR_MA.parse_amount("1\u{202f}234,56").unwrap(), 1234.56));
        assert!(close(FR_MA.parse_amount("1 234,56").unwrap(), 1234.56));
        assert!(close(FR_MA.parse_amount("100,00").unwrap(), 100.0));
    }

    #[test]
    fn parses_dot_decimal_amounts() {
        // Server-rendered cells occasionally carry the raw form.
        assert!(close(FR_MA.parse_amount("100.00").unwrap(), 100.0));
    }

    #[test]
    fn parses_currency_suffix() {
        assert!(close(FR_MA.parse_amount("1 234,56 MAD").unwrap(), 1234.56));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(FR_MA.parse_amount(""), None);
        assert_eq!(FR_MA.parse_amount("   "), None);
        assert_eq!(FR_MA.parse_amount("n/a"), None);
    }

    #[test]
    fn round_trips_two_decimal_values() {
        for amount in [0.0, 0.01, 99.99, 1234.56, 987_654.32] {
            let rendered = FR_MA.format_amount(amount);
            assert!(close(FR_MA.parse_amount(&rendered).unwrap(), amount));
        }
    }
}
