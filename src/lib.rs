//! Travel-reimbursement intake: fetch the submitted spreadsheet, turn each
//! request into a payment record and queue the approved ones.

pub mod config;
pub mod credentials;
pub mod crypto;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod process;
pub mod queue;
pub mod table;
pub mod telemetry;

pub use config::Config;
pub use error::{ParseError, PipelineError, QueueError, RowError};
pub use pipeline::{Pipeline, RunArgs, RunSummary};
