//! Indian-style currency text (`₹ 12,34,56,789.00`).

use crate::models::CellValue;

pub const CURRENCY_SYMBOL: &str = "₹";

/// Spreadsheet number format for currency columns.
pub const CURRENCY_FORMAT: &str = "₹ #,##0.00;[Red]₹ -#,##0.00";

/// Group integer digits Indian style: last three together, then pairs.
pub fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, last_three) = digits.split_at(digits.len() - 3);

    let mut groups: Vec<&str> = Vec::new();
    let mut rest = head;
    while !rest.is_empty() {
        let cut = rest.len().saturating_sub(2);
        groups.push(&rest[cut..]);
        rest = &rest[..cut];
    }
    groups.reverse();
    groups.push(last_three);
    groups.join(",")
}

/// Format an amount with two decimals, e.g. `-1234.5` -> `₹ -1,234.50`.
pub fn format_indian_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("{} {}", CURRENCY_SYMBOL, amount);
    }

    let fixed = format!("{:.2}", amount.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let negative = amount < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9'));

    format!(
        "{} {}{}.{}",
        CURRENCY_SYMBOL,
        if negative { "-" } else { "" },
        group_indian(integer),
        fraction
    )
}

/// Currency text for numbers, pass-through for text, blank for empty cells.
pub fn format_cell(cell: &CellValue) -> String {
    match cell {
        CellValue::Number(n) => format_indian_currency(*n),
        other => other.as_text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping() {
        assert_eq!(group_indian("5"), "5");
        assert_eq!(group_indian("999"), "999");
        assert_eq!(group_indian("1000"), "1,000");
        assert_eq!(group_indian("100000"), "1,00,000");
        assert_eq!(group_indian("123456789"), "12,34,56,789");
    }

    #[test]
    fn test_format_amounts() {
        assert_eq!(format_indian_currency(123456789.0), "₹ 12,34,56,789.00");
        assert_eq!(format_indian_currency(0.5), "₹ 0.50");
        assert_eq!(format_indian_currency(1234.567), "₹ 1,234.57");
    }

    #[test]
    fn test_format_negative() {
        assert_eq!(format_indian_currency(-1234.5), "₹ -1,234.50");
        // Rounds to zero: no negative sign
        assert_eq!(format_indian_currency(-0.001), "₹ 0.00");
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(&CellValue::Number(1500.0)), "₹ 1,500.00");
        assert_eq!(format_cell(&CellValue::Text("n/a".into())), "n/a");
        assert_eq!(format_cell(&CellValue::Empty), "");
    }
}
