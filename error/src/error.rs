//! Harness errors.
//!
//! `HarnessError` is returned to callers of the backend, the RPC adapter and
//! the view decoder. `EngineError` covers misconfiguration of the execution
//! engine itself; those will throw a panic, since no test can continue past
//! them.

use {
    trezoa_pubkey::Pubkey,
    std::fmt::{Display, Write},
    thiserror::Error,
};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HarnessError {
    /// The backend rejected a submitted transaction.
    #[error("Transaction failed: {}", render_failure(.err, .logs))]
    TransactionFailure { err: String, logs: Vec<String> },
    /// The backend rejected a balance credit.
    #[error("Airdrop failed: {0}")]
    AirdropFailure(String),
    /// The caller invoked an RPC method the harness does not proxy.
    #[error(
        "Unsupported RPC method: {0}. The local connection does not support HTTP RPC calls."
    )]
    UnsupportedRpcMethod(String),
    /// The request cannot be served locally, e.g. an unsigned raw transaction.
    #[error("Unsupported request: {0}")]
    UnsupportedRequest(String),
    /// Parameters of a proxied RPC method could not be parsed.
    #[error("Invalid params for {method}: {reason}")]
    InvalidParams { method: String, reason: String },
    /// No log line matched the expected view label.
    #[error("Value for {0} not found in logs")]
    ViewValueNotFound(String),
    /// A view query was not a single-key object.
    #[error("Invalid view query: {0}")]
    InvalidViewQuery(String),
    /// Program file not found at the given path or in any search path.
    #[error("Program file not found at {0}")]
    ProgramFileNotFound(String),
    /// Failed to read a file.
    #[error("Failed to read file {path}: {reason}")]
    FileRead { path: String, reason: String },
    /// The program ELF could not be loaded into the program cache.
    #[error("Failed to load program: {0}")]
    ProgramLoad(String),
    /// One of the supplied signers could not sign the transaction.
    #[error("Failed to sign transaction: {0}")]
    Signing(String),
    /// Failed to (de)serialize a transaction or a JSON payload.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Failed to load a test setup config file.
    #[error("Failed to load config: {0}")]
    ConfigLoad(String),
}

impl HarnessError {
    /// Program logs captured alongside a transaction failure, if any.
    pub fn logs(&self) -> &[String] {
        match self {
            HarnessError::TransactionFailure { logs, .. } => logs,
            _ => &[],
        }
    }
}

fn render_failure(err: &str, logs: &[String]) -> String {
    let mut out = err.to_string();
    if !logs.is_empty() {
        let _ = write!(out, "\nLogs:\n{}", logs.join("\n"));
    }
    out
}

pub type HarnessResult<T> = Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum EngineError<'a> {
    /// An account required by the transaction was not provided.
    #[error("    [HARNESS]: An account required by the transaction was not provided: {0}")]
    AccountMissing(&'a Pubkey),
    /// An account could not be read back from the transaction context.
    #[error("    [HARNESS]: Failed to read back account after execution: {0}")]
    AccountUnavailable(&'a Pubkey),
    /// A builtin or program ELF could not be registered with the runtime.
    #[error("    [HARNESS]: Failed to build the program runtime environment")]
    RuntimeEnvironment,
    /// A top-level instruction could not be prepared for invocation.
    #[error("    [HARNESS]: Failed to prepare instruction {0}")]
    PrepareInstruction(usize),
}

pub trait EnginePanic<T> {
    fn or_panic_with(self, error: EngineError) -> T;
}

impl<T, E> EnginePanic<T> for Result<T, E>
where
    E: Display,
{
    fn or_panic_with(self, engine_err: EngineError) -> T {
        self.unwrap_or_else(|err| panic!("{}: {}", engine_err, err))
    }
}

impl<T> EnginePanic<T> for Option<T> {
    fn or_panic_with(self, engine_err: EngineError) -> T {
        self.unwrap_or_else(|| panic!("{}", engine_err))
    }
}
