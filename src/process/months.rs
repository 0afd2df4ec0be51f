use chrono::{Datelike, NaiveDate};
use serde_json::Value;
use std::collections::BTreeSet;

use super::literal::parse_literal;
use crate::{config::MonthNames, error::ParseError};

const DATE_KEY: &str = "dato";

/// Turn the serialized travel-date list into a label like `"Januar/Marts 2024"`.
///
/// Months are deduplicated and ordered by calendar position. The year is the
/// one of the *last* dated entry in iteration order, so a list spanning two
/// years reports only one of them. Entries that are not dicts, or that lack a
/// `dato` key, are ignored; if nothing is dated the call fails.
pub fn extract_months_and_year(raw: &str, names: &MonthNames) -> Result<String, ParseError> {
    let data = parse_literal(raw)?;
    let entries = match &data {
        Value::Array(items) => items.as_slice(),
        _ => &[],
    };

    let mut months = BTreeSet::new();
    let mut year = None;

    for entry in entries {
        let Some(date) = entry.as_object().and_then(|o| o.get(DATE_KEY)) else {
            continue;
        };
        let text = date
            .as_str()
            .ok_or_else(|| ParseError::DateType(date.to_string()))?;
        let parsed = NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|source| {
            ParseError::Date {
                value: text.to_string(),
                source,
            }
        })?;
        months.insert(parsed.month());
        year = Some(parsed.year());
    }

    let year = year.ok_or(ParseError::NoDatedEntries)?;
    let label = months
        .into_iter()
        .map(|m| names.name(m).map(str::to_string).unwrap_or_else(|| m.to_string()))
        .collect::<Vec<_>>()
        .join("/");

    Ok(format!("{label} {year}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> MonthNames {
        MonthNames::default()
    }

    #[test]
    fn calendar_order_not_lexical() {
        let raw = "[{'dato': '2024-02-10'}, {'dato': '2024-01-03'}, {'dato': '2024-02-11'}]";
        assert_eq!(
            extract_months_and_year(raw, &names()).unwrap(),
            "Januar/Februar 2024"
        );
    }

    #[test]
    fn localised_names_and_single_month() {
        let raw = "[{'dato': '2023-05-02', 'km': 4}]";
        assert_eq!(extract_months_and_year(raw, &names()).unwrap(), "Maj 2023");
    }

    #[test]
    fn last_encountered_year_wins() {
        let raw = "[{'dato': '2025-01-04'}, {'dato': '2024-12-20'}]";
        assert_eq!(
            extract_months_and_year(raw, &names()).unwrap(),
            "Januar/December 2024"
        );
    }

    #[test]
    fn undated_entries_are_skipped() {
        let raw = "[{'km': 3}, 'note', {'dato': '2024-10-01'}]";
        assert_eq!(extract_months_and_year(raw, &names()).unwrap(), "Oktober 2024");
    }

    #[test]
    fn synthetic_month_table() {
        let custom = MonthNames(
            (1..=12).map(|m| format!("M{m:02}")).collect::<Vec<_>>(),
        );
        let raw = "[{'dato': '2024-11-01'}, {'dato': '2024-03-01'}]";
        assert_eq!(extract_months_and_year(raw, &custom).unwrap(), "M03/M11 2024");
    }

    #[test]
    fn failures() {
        assert!(matches!(
            extract_months_and_year("[{'km': 1}]", &names()),
            Err(ParseError::NoDatedEntries)
        ));
        assert!(matches!(
            extract_months_and_year("[]", &names()),
            Err(ParseError::NoDatedEntries)
        ));
        assert!(matches!(
            extract_months_and_year("[{'dato': '2024-13-01'}]", &names()),
            Err(ParseError::Date { .. })
        ));
        assert!(matches!(
            extract_months_and_year("[{'dato': None}]", &names()),
            Err(ParseError::DateType(_))
        ));
        assert!(matches!(
            extract_months_and_year("not a list", &names()),
            Err(ParseError::Literal(_))
        ));
    }
}
