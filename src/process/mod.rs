// src/process/mod.rs
pub mod amount;
pub mod attachments;
pub mod batch;
pub mod literal;
pub mod months;
pub mod row;
pub mod school;
pub mod types;

pub use batch::{
    build_submissions, make_unique_references, BatchOutcome, BatchProcessor, RowFailure,
};
pub use row::RowTransformer;
pub use types::{NormalizedPaymentRecord, QueueSubmission, RawRequestRow};
