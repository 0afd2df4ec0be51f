// src/pipeline.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{error, info, instrument};

use crate::{
    config::Config,
    credentials::CredentialLookup,
    crypto::Encrypt,
    error::PipelineError,
    fetch::FileFetch,
    process::{build_submissions, BatchProcessor, RowFailure},
    queue::WorkQueue,
    table::{take_spreadsheet, TableSource},
};

/// Process arguments handed over by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunArgs {
    /// Local working directory for downloaded files.
    pub path: PathBuf,
    /// Identifier of the agent that picks the queue elements up.
    pub naeste_agent: String,
}

impl RunArgs {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("parsing process arguments")
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub downloaded: Vec<String>,
    pub file: PathBuf,
    pub rows: usize,
    pub transformed: usize,
    pub approved: usize,
    pub failures: Vec<RowFailure>,
    pub submitted: usize,
}

/// One reimbursement run with all collaborators injected.
pub struct Pipeline<'a> {
    pub config: &'a Config,
    pub credentials: &'a dyn CredentialLookup,
    pub fetch: &'a dyn FileFetch,
    pub tables: &'a dyn TableSource,
    pub encryptor: &'a dyn Encrypt,
    pub queue: &'a dyn WorkQueue,
}

impl Pipeline<'_> {
    /// Clear the queue, fetch and load the spreadsheet, transform every row and
    /// submit the approved ones. Any queue rejection fails the run.
    #[instrument(
        level = "info",
        skip_all,
        fields(path = %args.path.display(), next_agent = %args.naeste_agent)
    )]
    pub async fn run(&self, args: &RunArgs) -> Result<RunSummary> {
        info!("running process");
        let queue_name = self.config.queue.name.as_str();

        let account = &self.config.store.credential_account;
        let credentials = self
            .credentials
            .credentials(account)
            .with_context(|| format!("looking up credentials for {account}"))?;

        let removed = self
            .queue
            .clear(queue_name)
            .await
            .map_err(PipelineError::from)?;
        info!(queue = queue_name, removed, "queue cleared");

        let downloaded = self
            .fetch
            .fetch(&credentials, &args.path)
            .await
            .context("fetching spreadsheets")?;
        info!(count = downloaded.len(), "files fetched");

        let (file, table) =
            take_spreadsheet(self.tables, &args.path, &self.config.store.file_pattern)?;

        let batch = BatchProcessor::new(self.config, self.encryptor)
            .process_table(&table, &args.naeste_agent)?;
        let approved = batch.approved().count();

        let submissions =
            build_submissions(batch.approved()).context("serializing queue payloads")?;
        let submitted = submissions.len();
        if submissions.is_empty() {
            info!("no approved rows; nothing submitted");
        } else {
            let (references, payloads): (Vec<String>, Vec<String>) = submissions
                .into_iter()
                .map(|s| (s.reference, s.payload))
                .unzip();
            info!(queue = queue_name, count = submitted, "uploading data to queue");
            if let Err(e) = self
                .queue
                .bulk_create(queue_name, &references, &payloads)
                .await
            {
                error!(queue = queue_name, error = %e, "queue submission failed");
                return Err(PipelineError::from(e).into());
            }
            info!(queue = queue_name, "data uploaded to queue");
        }

        Ok(RunSummary {
            downloaded,
            file,
            rows: batch.rows,
            transformed: batch.records.len(),
            approved,
            failures: batch.failures,
            submitted,
        })
    }
}
