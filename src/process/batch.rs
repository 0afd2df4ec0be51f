// src/process/batch.rs

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{
    row::RowTransformer,
    types::{NormalizedPaymentRecord, QueueSubmission, RawRequestRow},
};
use crate::{
    config::{Config, RowErrorPolicy},
    crypto::Encrypt,
    error::{PipelineError, RowError},
    table::RawTable,
};

/// A row that could not be transformed, with its 0-based data-row index.
#[derive(Debug)]
pub struct RowFailure {
    pub index: usize,
    pub error: RowError,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Number of input rows seen.
    pub rows: usize,
    /// Successfully transformed rows, input order.
    pub records: Vec<NormalizedPaymentRecord>,
    pub failures: Vec<RowFailure>,
}

impl BatchOutcome {
    pub fn approved(&self) -> impl Iterator<Item = &NormalizedPaymentRecord> {
        self.records.iter().filter(|r| r.approved)
    }
}

pub struct BatchProcessor<'a> {
    transformer: RowTransformer<'a>,
    policy: RowErrorPolicy,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(config: &'a Config, encryptor: &'a dyn Encrypt) -> Self {
        Self {
            transformer: RowTransformer::new(config, encryptor),
            policy: config.row_errors,
        }
    }

    /// One result per input row, same order.
    pub fn transform_rows(
        &self,
        rows: &[RawRequestRow],
        next_agent: &str,
    ) -> Vec<Result<NormalizedPaymentRecord, RowError>> {
        rows.iter()
            .map(|row| self.transformer.transform(row, next_agent))
            .collect()
    }

    /// Transform every data row of `table`, applying the row-error policy.
    #[instrument(level = "info", skip_all, fields(rows = table.rows.len()))]
    pub fn process_table(
        &self,
        table: &RawTable,
        next_agent: &str,
    ) -> Result<BatchOutcome, PipelineError> {
        let mut outcome = BatchOutcome {
            rows: table.rows.len(),
            ..Default::default()
        };

        for (index, cells) in table.rows.iter().enumerate() {
            let result = RawRequestRow::from_cells(&table.headers, cells)
                .and_then(|row| self.transformer.transform(&row, next_agent));
            match result {
                Ok(record) => outcome.records.push(record),
                Err(error) => match self.policy {
                    RowErrorPolicy::Abort => {
                        return Err(PipelineError::Row {
                            index,
                            source: error,
                        })
                    }
                    RowErrorPolicy::Skip => {
                        warn!(index, %error, "row skipped");
                        outcome.failures.push(RowFailure { index, error });
                    }
                },
            }
        }

        info!(
            transformed = outcome.records.len(),
            failed = outcome.failures.len(),
            approved = outcome.approved().count(),
            "batch transformed"
        );
        Ok(outcome)
    }
}

/// Append a fresh 32-hex-digit suffix to each reference.
pub fn make_unique_references(references: &[String]) -> Vec<String> {
    references
        .iter()
        .map(|r| format!("{}_{}", r, Uuid::new_v4().simple()))
        .collect()
}

/// Pair each record with a unique reference and its JSON payload.
pub fn build_submissions<'r, I>(records: I) -> serde_json::Result<Vec<QueueSubmission>>
where
    I: IntoIterator<Item = &'r NormalizedPaymentRecord>,
{
    let records: Vec<_> = records.into_iter().collect();
    let base: Vec<String> = records.iter().map(|r| r.posting_text.clone()).collect();
    let references = make_unique_references(&base);

    let submissions = records
        .into_iter()
        .zip(references)
        .map(|(record, reference)| -> serde_json::Result<QueueSubmission> {
            Ok(QueueSubmission {
                reference,
                payload: serde_json::to_string(record)?,
            })
        })
        .collect::<serde_json::Result<Vec<_>>>()?;
    debug!(count = submissions.len(), "built queue submissions");
    Ok(submissions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::row::tests::TagEncrypt;
    use std::collections::HashSet;

    fn table(rows: &[[&str; 5]]) -> RawTable {
        RawTable {
            headers: ["test", "cpr_nr", "beloeb_i_alt", "skoleliste", "godkendt"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    const DATES: &str = "[{'dato': '2024-01-09'}]";

    #[test]
    fn transform_preserves_count_and_order() {
        let cfg = Config::default();
        let bp = BatchProcessor::new(&cfg, &TagEncrypt);
        let rows: Vec<RawRequestRow> = (0..4)
            .map(|i| RawRequestRow {
                travel_dates: Some(DATES.into()),
                national_id: Some(format!("id{i}")),
                approval: (i % 2 == 0).then(|| "x".to_string()),
                ..Default::default()
            })
            .collect();
        let out = bp.transform_rows(&rows, "n");
        assert_eq!(out.len(), rows.len());
        for (i, r) in out.iter().enumerate() {
            let r = r.as_ref().unwrap();
            assert_eq!(r.encrypted_national_id, format!("enc(id{i})"));
        }
        let approved = out.iter().flatten().filter(|r| r.approved).count();
        assert_eq!(approved, 2);
    }

    #[test]
    fn skip_policy_collects_failures() {
        let cfg = Config::default();
        let bp = BatchProcessor::new(&cfg, &TagEncrypt);
        let t = table(&[
            [DATES, "a", "10.5", "", "X"],
            ["broken", "b", "1", "", "x"],
            [DATES, "c", "2", "", ""],
        ]);
        let out = bp.process_table(&t, "n").unwrap();
        assert_eq!(out.rows, 3);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].index, 1);
        let approved: Vec<_> = out.approved().collect();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].amount.as_deref(), Some("10,5"));
    }

    #[test]
    fn abort_policy_stops_on_first_failure() {
        let cfg = Config {
            row_errors: RowErrorPolicy::Abort,
            ..Default::default()
        };
        let bp = BatchProcessor::new(&cfg, &TagEncrypt);
        let t = table(&[[DATES, "a", "1", "", "x"], [DATES, "", "1", "", "x"]]);
        match bp.process_table(&t, "n") {
            Err(PipelineError::Row { index, source }) => {
                assert_eq!(index, 1);
                assert!(matches!(source, RowError::MissingField("cpr_nr")));
            }
            other => panic!("expected row error, got {other:?}"),
        }
    }

    #[test]
    fn identical_posting_texts_get_distinct_references() {
        let refs = vec!["Egenbefordring Januar 2024".to_string(); 3];
        let first = make_unique_references(&refs);
        let second = make_unique_references(&refs);
        let all: HashSet<_> = first.iter().chain(second.iter()).collect();
        assert_eq!(all.len(), 6);
        for r in &first {
            let (head, suffix) = r.rsplit_once('_').unwrap();
            assert_eq!(head, "Egenbefordring Januar 2024");
            assert_eq!(suffix.len(), 32);
        }
    }

    #[test]
    fn submissions_carry_json_payloads() -> anyhow::Result<()> {
        let cfg = Config::default();
        let bp = BatchProcessor::new(&cfg, &TagEncrypt);
        let out = bp.process_table(&table(&[[DATES, "a", "5", "Skole Ø", "x"]]), "next")?;
        let subs = build_submissions(out.approved())?;
        assert_eq!(subs.len(), 1);
        assert!(subs[0].reference.starts_with("Egenbefordring Januar 2024_"));
        let payload: serde_json::Value = serde_json::from_str(&subs[0].payload)?;
        assert_eq!(payload["beloeb"], "5");
        assert_eq!(payload["naeste_agent"], "next");
        assert_eq!(payload["skole"], "Skole Ø");
        assert!(subs[0].payload.contains("Skole Ø"));
        Ok(())
    }
}
