//! Core result types for transaction execution.

use {
    omnipair_harness_error::error::{HarnessError, HarnessResult},
    trezoa_signature::Signature,
    trezoa_transaction_error::TransactionError,
};

/// Metadata of a transaction the backend executed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionMetadata {
    /// The transaction's first signature. `Signature::default()` when the
    /// transaction was never signed.
    pub signature: Signature,
    /// Program logs captured during execution.
    pub logs: Vec<String>,
    /// The number of compute units consumed by the transaction.
    pub compute_units_consumed: u64,
    /// The return data produced by the transaction, if any.
    pub return_data: Vec<u8>,
}

/// An execution failure, reachable only through its accessors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedTransactionMetadata {
    err: TransactionError,
    meta: TransactionMetadata,
}

impl FailedTransactionMetadata {
    pub fn new(err: TransactionError, meta: TransactionMetadata) -> Self {
        Self { err, meta }
    }

    pub fn err(&self) -> &TransactionError {
        &self.err
    }

    pub fn meta(&self) -> &TransactionMetadata {
        &self.meta
    }
}

/// A transaction turned away before execution (bad signature, unknown
/// blockhash, duplicate, unfunded fee payer).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedTransaction {
    pub err: TransactionError,
    pub logs: Option<Vec<String>>,
}

/// The raw value a backend hands back for a submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendOutcome {
    Processed(TransactionMetadata),
    Failed(FailedTransactionMetadata),
    Rejected(RejectedTransaction),
}

/// The normalized result of a submission. Exactly one variant is populated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutionResult {
    Success(TransactionMetadata),
    Failure {
        err: TransactionError,
        logs: Vec<String>,
    },
}

impl From<BackendOutcome> for ExecutionResult {
    fn from(outcome: BackendOutcome) -> Self {
        // Accessor shape first, then the plain error field, and only then
        // success.
        match outcome {
            BackendOutcome::Failed(failed) => {
                let FailedTransactionMetadata { err, meta } = failed;
                ExecutionResult::Failure {
                    err,
                    logs: meta.logs,
                }
            }
            BackendOutcome::Rejected(RejectedTransaction { err, logs }) => {
                ExecutionResult::Failure {
                    err,
                    logs: logs.unwrap_or_default(),
                }
            }
            BackendOutcome::Processed(meta) => ExecutionResult::Success(meta),
        }
    }
}

impl ExecutionResult {
    /// Returns `true` if the transaction succeeded.
    pub const fn is_ok(&self) -> bool {
        matches!(self, ExecutionResult::Success(_))
    }

    /// Returns `true` if the transaction failed.
    pub const fn is_err(&self) -> bool {
        !self.is_ok()
    }

    /// Logs captured on either path.
    pub fn logs(&self) -> &[String] {
        match self {
            ExecutionResult::Success(meta) => &meta.logs,
            ExecutionResult::Failure { logs, .. } => logs,
        }
    }

    /// Converts a failure into `HarnessError::TransactionFailure`, carrying
    /// the rendered error and the captured logs.
    pub fn into_result(self) -> HarnessResult<TransactionMetadata> {
        match self {
            ExecutionResult::Success(meta) => Ok(meta),
            ExecutionResult::Failure { err, logs } => Err(HarnessError::TransactionFailure {
                err: err.to_string(),
                logs,
            }),
        }
    }
}
