// src/process/row.rs

use super::{
    amount::normalize_optional_amount, attachments::extract_url_from_attachments,
    months::extract_months_and_year, school::determine_cost_center,
    types::{NormalizedPaymentRecord, RawRequestRow},
};
use crate::{config::Config, crypto::Encrypt, error::RowError};

/// Turns one raw row into one payment record. Pure apart from the injected encryptor.
pub struct RowTransformer<'a> {
    config: &'a Config,
    encryptor: &'a dyn Encrypt,
}

impl<'a> RowTransformer<'a> {
    pub fn new(config: &'a Config, encryptor: &'a dyn Encrypt) -> Self {
        Self { config, encryptor }
    }

    pub fn transform(
        &self,
        row: &RawRequestRow,
        next_agent: &str,
    ) -> Result<NormalizedPaymentRecord, RowError> {
        let travel_dates = row
            .travel_dates
            .as_deref()
            .ok_or(RowError::MissingField("test"))?;
        let reference = extract_months_and_year(travel_dates, &self.config.months)?;

        let national_id = row
            .national_id_override
            .as_deref()
            .or(row.national_id.as_deref())
            .ok_or(RowError::MissingField("cpr_nr"))?;

        let amount = normalize_optional_amount(
            row.amount_override.as_deref().or(row.amount.as_deref()),
        );

        let school_list = row
            .school_list
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_default();
        let cost_center = determine_cost_center(
            &school_list,
            row.school_name.as_deref(),
            &self.config.cost_centers,
        );

        let attachment_url = row
            .attachments
            .as_deref()
            .and_then(extract_url_from_attachments)
            .map(str::to_string);

        let approved = row
            .approval
            .as_deref()
            .is_some_and(|a| a.to_lowercase().contains('x'));

        Ok(NormalizedPaymentRecord {
            encrypted_national_id: self.encryptor.encrypt(national_id),
            amount,
            posting_text: format!("{} {}", self.config.posting.text_prefix, reference),
            reference,
            account_code: self.config.posting.account_code.clone(),
            cost_center: cost_center.to_string(),
            next_agent: next_agent.to_string(),
            attachment_url,
            uuid: row.uuid.clone(),
            approved_by: row.approved_by.clone(),
            school: row.school_name.clone().or_else(|| row.school_list.clone()),
            approved,
        })
    }
}
