//! A remote-connection interface answered by a local execution backend.

use {
    crate::{
        request::{rent_data_len, RpcRequest},
        response::{
            LatestBlockhash, Response, SendOptions, SignatureResult, SimulateTransactionResult,
            UiAccount,
        },
    },
    omnipair_harness::{ExecutionBackend, LocalSvm},
    omnipair_harness_error::error::{HarnessError, HarnessResult},
    omnipair_harness_result::{ExecutionResult, TransactionMetadata},
    serde_json::{json, Value},
    trezoa_account::Account,
    trezoa_hash::Hash,
    trezoa_pubkey::Pubkey,
    trezoa_signature::Signature,
    trezoa_signer::Signer,
    trezoa_transaction::Transaction,
    std::cell::{Ref, RefCell, RefMut},
};

/// Returned in place of a signature when a processed transaction carries
/// none.
pub const PLACEHOLDER_SIGNATURE: &str = "signature";

/// The remote-connection operation set test code is written against.
#[allow(async_fn_in_trait)]
pub trait Connection {
    /// Submit a transaction, signing it first when `signers` is non-empty.
    async fn send_transaction(
        &self,
        tx: Transaction,
        signers: &[&dyn Signer],
        options: Option<SendOptions>,
    ) -> HarnessResult<String>;

    /// Submit a bincode-serialized, already signed transaction.
    async fn send_raw_transaction(
        &self,
        bytes: &[u8],
        options: Option<SendOptions>,
    ) -> HarnessResult<String>;

    async fn get_account_info(&self, address: &Pubkey) -> HarnessResult<Option<Account>>;

    async fn get_balance(&self, address: &Pubkey) -> HarnessResult<u64>;

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> HarnessResult<u64>;

    async fn get_latest_blockhash(&self) -> HarnessResult<LatestBlockhash>;

    async fn confirm_transaction(&self, signature: &str)
        -> HarnessResult<Response<SignatureResult>>;

    async fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> HarnessResult<String>;

    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
    ) -> HarnessResult<Vec<(Pubkey, Account)>>;

    async fn simulate_transaction(
        &self,
        tx: &Transaction,
    ) -> HarnessResult<Response<SimulateTransactionResult>>;
}

fn encode_signature(signature: &Signature) -> String {
    if *signature == Signature::default() {
        PLACEHOLDER_SIGNATURE.to_string()
    } else {
        signature.to_string()
    }
}

/// A `Connection` backed by an in-process engine.
///
/// The backend sits behind a `RefCell`; no borrow is held across an await,
/// so the connection can be shared by reference within a single-threaded
/// test.
pub struct LocalConnection<B: ExecutionBackend = LocalSvm> {
    backend: RefCell<B>,
}

impl Default for LocalConnection {
    fn default() -> Self {
        Self::new(LocalSvm::default())
    }
}

impl<B: ExecutionBackend> LocalConnection<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: RefCell::new(backend),
        }
    }

    pub fn backend(&self) -> Ref<'_, B> {
        self.backend.borrow()
    }

    pub fn backend_mut(&self) -> RefMut<'_, B> {
        self.backend.borrow_mut()
    }

    pub fn into_inner(self) -> B {
        self.backend.into_inner()
    }

    fn fill_blockhash(&self, tx: &mut Transaction) {
        if tx.message.recent_blockhash == Hash::default() {
            tx.message.recent_blockhash = self.backend.borrow().latest_blockhash();
        }
    }

    fn submit(&self, tx: Transaction) -> HarnessResult<TransactionMetadata> {
        let outcome = self.backend.borrow_mut().send_transaction(tx);
        let result = ExecutionResult::from(outcome);
        if let ExecutionResult::Failure { err, logs } = &result {
            log::debug!("Transaction failed: {} ({} log lines)", err, logs.len());
        }
        result.into_result()
    }

    /// Run a non-committing simulation and hand back its logs. Used by view
    /// decoding; a failed simulation surfaces as `TransactionFailure`.
    pub fn simulate_for_logs(&self, mut tx: Transaction) -> HarnessResult<Vec<String>> {
        self.fill_blockhash(&mut tx);
        let outcome = self.backend.borrow().simulate_transaction(&tx);
        ExecutionResult::from(outcome)
            .into_result()
            .map(|meta| meta.logs)
    }

    /// Answer a raw JSON-RPC request from local state.
    pub fn send(&self, method: &str, params: Value) -> HarnessResult<Value> {
        let request = RpcRequest::parse(method, &params)?;
        log::trace!("Local RPC request: {}", request.method());
        let backend = self.backend.borrow();
        let value = match request {
            RpcRequest::GetAccountInfo { address } => {
                let account = backend.get_account(&address);
                serde_json::to_value(Response::new(account.as_ref().map(UiAccount::from)))
            }
            RpcRequest::GetBalance { address } => serde_json::to_value(Response::new(
                backend.get_balance(&address).unwrap_or(0),
            )),
            RpcRequest::GetMinimumBalanceForRentExemption { data_len } => {
                Ok(json!(backend.minimum_balance_for_rent_exemption(data_len)))
            }
            RpcRequest::GetLatestBlockhash => Ok(json!({
                "blockhash": backend.latest_blockhash().to_string(),
                "lastValidBlockHeight": 0,
            })),
        };
        value.map_err(|err| HarnessError::Serialization(err.to_string()))
    }
}

impl<B: ExecutionBackend> Connection for LocalConnection<B> {
    async fn send_transaction(
        &self,
        mut tx: Transaction,
        signers: &[&dyn Signer],
        _options: Option<SendOptions>,
    ) -> HarnessResult<String> {
        self.fill_blockhash(&mut tx);
        if !signers.is_empty() {
            let blockhash = tx.message.recent_blockhash;
            tx.try_sign(signers, blockhash)
                .map_err(|err| HarnessError::Signing(err.to_string()))?;
        }
        let signature = tx.signatures.first().copied().unwrap_or_default();
        self.submit(tx)?;
        Ok(encode_signature(&signature))
    }

    async fn send_raw_transaction(
        &self,
        bytes: &[u8],
        _options: Option<SendOptions>,
    ) -> HarnessResult<String> {
        let mut tx: Transaction = bincode::deserialize(bytes)
            .map_err(|err| HarnessError::Serialization(err.to_string()))?;
        if tx
            .signatures
            .iter()
            .all(|signature| *signature == Signature::default())
        {
            return Err(HarnessError::UnsupportedRequest(
                "raw transactions must be signed before submission".to_string(),
            ));
        }
        self.fill_blockhash(&mut tx);
        let meta = self.submit(tx)?;
        Ok(encode_signature(&meta.signature))
    }

    async fn get_account_info(&self, address: &Pubkey) -> HarnessResult<Option<Account>> {
        Ok(self
            .backend
            .borrow()
            .get_account(address)
            .map(|account| Account {
                rent_epoch: 0,
                ..account
            }))
    }

    async fn get_balance(&self, address: &Pubkey) -> HarnessResult<u64> {
        Ok(self.backend.borrow().get_balance(address).unwrap_or(0))
    }

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> HarnessResult<u64> {
        let data_len = rent_data_len(data_len as u64)?;
        Ok(self
            .backend
            .borrow()
            .minimum_balance_for_rent_exemption(data_len))
    }

    async fn get_latest_blockhash(&self) -> HarnessResult<LatestBlockhash> {
        Ok(LatestBlockhash {
            blockhash: self.backend.borrow().latest_blockhash(),
            last_valid_block_height: 0,
        })
    }

    async fn confirm_transaction(
        &self,
        _signature: &str,
    ) -> HarnessResult<Response<SignatureResult>> {
        // Local execution is final by the time a signature is handed out.
        Ok(Response::new(SignatureResult { err: None }))
    }

    async fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> HarnessResult<String> {
        let outcome = self.backend.borrow_mut().airdrop(address, lamports);
        match ExecutionResult::from(outcome) {
            ExecutionResult::Success(meta) => Ok(encode_signature(&meta.signature)),
            ExecutionResult::Failure { err, .. } => {
                Err(HarnessError::AirdropFailure(err.to_string()))
            }
        }
    }

    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
    ) -> HarnessResult<Vec<(Pubkey, Account)>> {
        log::warn!(
            "get_program_accounts({}) is not supported locally; returning no accounts",
            program_id
        );
        Ok(Vec::new())
    }

    async fn simulate_transaction(
        &self,
        _tx: &Transaction,
    ) -> HarnessResult<Response<SimulateTransactionResult>> {
        Ok(Response::new(SimulateTransactionResult::default()))
    }
}
