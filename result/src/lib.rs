//! Outcomes reported by an execution backend, and their normalized form.

pub mod types;

pub use types::{
    BackendOutcome, ExecutionResult, FailedTransactionMetadata, RejectedTransaction,
    TransactionMetadata,
};
