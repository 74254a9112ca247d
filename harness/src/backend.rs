//! The contract an execution engine offers to the RPC adapter.

use {
    omnipair_harness_error::error::HarnessResult, omnipair_harness_result::BackendOutcome,
    trezoa_account::Account, trezoa_hash::Hash, trezoa_pubkey::Pubkey,
    trezoa_transaction::Transaction, std::path::Path,
};

/// A synchronous, deterministic engine executing transactions against an
/// in-memory account store.
pub trait ExecutionBackend {
    /// Load a program binary from `path` and deploy it at `program_id`.
    fn add_program(&mut self, program_id: &Pubkey, path: &Path) -> HarnessResult<()>;

    /// Execute and, on success, commit a transaction.
    fn send_transaction(&mut self, tx: Transaction) -> BackendOutcome;

    /// Execute a transaction without committing any state.
    fn simulate_transaction(&self, tx: &Transaction) -> BackendOutcome;

    fn get_account(&self, address: &Pubkey) -> Option<Account>;

    fn get_balance(&self, address: &Pubkey) -> Option<u64> {
        self.get_account(address).map(|account| account.lamports)
    }

    fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> u64;

    fn latest_blockhash(&self) -> Hash;

    /// Credit `lamports` to `address`.
    fn airdrop(&mut self, address: &Pubkey, lamports: u64) -> BackendOutcome;
}
