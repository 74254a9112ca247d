//! Engine configuration.

use trezoa_native_token::LAMPORTS_PER_SOL;

/// Fee charged per required signature, matching the cluster default.
pub const DEFAULT_LAMPORTS_PER_SIGNATURE: u64 = 5000;

/// Number of blockhashes, including the latest, a transaction may reference.
pub const MAX_RECENT_BLOCKHASHES: usize = 300;

/// Bytes of program log retained per transaction.
pub const DEFAULT_LOG_BYTES_LIMIT: usize = 10_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SvmConfig {
    /// Verify transaction signatures on submission.
    pub sigverify: bool,
    /// Reject transactions whose blockhash is not recent.
    pub blockhash_check: bool,
    pub lamports_per_signature: u64,
    /// Initial balance of the internal faucet funding airdrops.
    pub faucet_lamports: u64,
    /// `None` keeps every log line.
    pub log_bytes_limit: Option<usize>,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            sigverify: true,
            blockhash_check: true,
            lamports_per_signature: DEFAULT_LAMPORTS_PER_SIGNATURE,
            faucet_lamports: 1_000_000_000 * LAMPORTS_PER_SOL,
            log_bytes_limit: Some(DEFAULT_LOG_BYTES_LIMIT),
        }
    }
}

impl SvmConfig {
    pub fn with_sigverify(mut self, sigverify: bool) -> Self {
        self.sigverify = sigverify;
        self
    }

    pub fn with_blockhash_check(mut self, blockhash_check: bool) -> Self {
        self.blockhash_check = blockhash_check;
        self
    }

    pub fn with_lamports_per_signature(mut self, lamports_per_signature: u64) -> Self {
        self.lamports_per_signature = lamports_per_signature;
        self
    }

    pub fn with_faucet_lamports(mut self, faucet_lamports: u64) -> Self {
        self.faucet_lamports = faucet_lamports;
        self
    }

    pub fn with_log_bytes_limit(mut self, log_bytes_limit: Option<usize>) -> Self {
        self.log_bytes_limit = log_bytes_limit;
        self
    }
}
