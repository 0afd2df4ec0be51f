// src/process/types.rs

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::RowError;

/// One spreadsheet record, by the column names the request form exports.
/// Blank cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawRequestRow {
    #[serde(rename = "test", default, deserialize_with = "blank_as_none")]
    pub travel_dates: Option<String>,
    #[serde(rename = "cpr_nr", default, deserialize_with = "blank_as_none")]
    pub national_id: Option<String>,
    /// Overrides `national_id` when filled.
    #[serde(rename = "cpr_nr_paaanden", default, deserialize_with = "blank_as_none")]
    pub national_id_override: Option<String>,
    #[serde(rename = "aendret_beloeb_i_alt", default, deserialize_with = "blank_as_none")]
    pub amount_override: Option<String>,
    #[serde(rename = "beloeb_i_alt", default, deserialize_with = "blank_as_none")]
    pub amount: Option<String>,
    #[serde(rename = "skoleliste", default, deserialize_with = "blank_as_none")]
    pub school_list: Option<String>,
    #[serde(
        rename = "skriv_dit_barns_skole_eller_dagtilbud",
        default,
        deserialize_with = "blank_as_none"
    )]
    pub school_name: Option<String>,
    #[serde(rename = "attachments", default, deserialize_with = "blank_as_none")]
    pub attachments: Option<String>,
    #[serde(rename = "godkendt", default, deserialize_with = "blank_as_none")]
    pub approval: Option<String>,
    #[serde(rename = "uuid", default, deserialize_with = "blank_as_none")]
    pub uuid: Option<String>,
    #[serde(rename = "godkendt_af", default, deserialize_with = "blank_as_none")]
    pub approved_by: Option<String>,
}

impl RawRequestRow {
    /// Build a row from parallel header / cell slices. Extra columns are ignored,
    /// missing trailing cells are blank.
    pub fn from_cells(headers: &[String], cells: &[String]) -> Result<Self, RowError> {
        let map: Map<String, Value> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let cell = cells.get(i).cloned().unwrap_or_default();
                (h.trim().to_string(), Value::String(cell))
            })
            .collect();
        Ok(serde_json::from_value(Value::Object(map))?)
    }
}

/// Accepts strings, numbers and booleans; empty or whitespace-only text is `None`.
fn blank_as_none<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(de)?;
    Ok(match v {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// A payment-ready record. Field names on the wire are the queue's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPaymentRecord {
    #[serde(rename = "cpr_encrypted")]
    pub encrypted_national_id: String,
    #[serde(rename = "beloeb")]
    pub amount: Option<String>,
    pub reference: String,
    #[serde(rename = "arts_konto")]
    pub account_code: String,
    #[serde(rename = "psp")]
    pub cost_center: String,
    #[serde(rename = "posteringstekst")]
    pub posting_text: String,
    #[serde(rename = "naeste_agent")]
    pub next_agent: String,
    #[serde(rename = "attachment")]
    pub attachment_url: Option<String>,
    pub uuid: Option<String>,
    #[serde(rename = "godkendt_af")]
    pub approved_by: Option<String>,
    #[serde(rename = "skole")]
    pub school: Option<String>,
    #[serde(rename = "is_godkendt")]
    pub approved: bool,
}

/// A record ready for the queue: unique reference plus JSON payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSubmission {
    pub reference: String,
    pub payload: String,
}
