/// Convert a period-decimal amount to comma-decimal.
///
/// Every `.` becomes `,`; when that leaves several commas, all but the last are
/// treated as thousands separators and dropped.
pub fn normalize_amount(raw: &str) -> String {
    let replaced = raw.trim().replace('.', ",");
    match replaced.rfind(',') {
        Some(last) if replaced[..last].contains(',') => {
            let (head, tail) = replaced.split_at(last);
            format!("{}{}", head.replace(',', ""), tail)
        }
        _ => replaced,
    }
}

/// `None` stays `None`.
pub fn normalize_optional_amount(raw: Option<&str>) -> Option<String> {
    raw.map(normalize_amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_decimal() {
        assert_eq!(normalize_amount("1234.56"), "1234,56");
        assert_eq!(normalize_amount("100.00"), "100,00");
        assert_eq!(normalize_amount("250"), "250");
    }

    #[test]
    fn thousands_separators_collapse() {
        assert_eq!(normalize_amount("1.234.567.89"), "1234567,89");
        assert_eq!(normalize_amount("1.234.567,89"), "1234567,89");
        assert_eq!(normalize_amount("1,5"), "1,5");
    }

    #[test]
    fn absent_passes_through() {
        assert_eq!(normalize_optional_amount(None), None);
        assert_eq!(normalize_optional_amount(Some("3.5")), Some("3,5".into()));
    }
}
