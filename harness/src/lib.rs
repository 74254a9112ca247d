//! # Omnipair Harness
//!
//! An in-process execution engine standing in for a cluster while testing
//! the Omnipair program. `LocalSvm` keeps an account store, a program cache
//! and a window of recent blockhashes, and runs whole transactions through
//! the program runtime synchronously.
//!
//! ```rust,ignore
//! use {
//!     omnipair_harness::{ExecutionBackend, LocalSvm},
//!     trezoa_keypair::Keypair,
//!     trezoa_signer::Signer,
//! };
//!
//! let mut svm = LocalSvm::default();
//! let user = Keypair::new();
//! svm.airdrop(&user.pubkey(), 10_000_000_000);
//! assert_eq!(svm.get_balance(&user.pubkey()), Some(10_000_000_000));
//! ```
//!
//! A submitted transaction is:
//!
//! * checked for well-formed signatures, a recent blockhash and a signature
//!   not seen before, and turned away with `BackendOutcome::Rejected`
//!   otherwise;
//! * charged `lamports_per_signature` for each required signature;
//! * executed instruction by instruction, stopping at the first error;
//! * committed only if every instruction succeeded. The fee is kept either
//!   way.
//!
//! Programs are loaded under the upgradeable loader, either from an explicit
//! path or by name from the default search paths:
//!
//! * `tests/fixtures`
//! * The directory specified by the `BPF_OUT_DIR` environment variable
//! * The directory specified by the `SBF_OUT_DIR` environment variable
//! * The current working directory

pub mod account_store;
pub mod backend;
mod compile_accounts;
pub mod config;
pub mod file;
pub mod instructions_sysvar;
pub mod program;
pub mod sysvar;

pub use {
    backend::ExecutionBackend, config::SvmConfig, omnipair_harness_result as result,
};
use {
    crate::{
        account_store::AccountStore,
        config::MAX_RECENT_BLOCKHASHES,
        program::{create_program_account_loader_v3, ProgramCache},
        sysvar::Sysvars,
    },
    omnipair_harness_error::error::{EngineError, EnginePanic, HarnessResult},
    omnipair_harness_result::{
        BackendOutcome, FailedTransactionMetadata, RejectedTransaction, TransactionMetadata,
    },
    sha2::{Digest, Sha256},
    trezoa_account::{Account, AccountSharedData, ReadableAccount},
    trezoa_compute_budget::compute_budget::ComputeBudget,
    trezoa_feature_set::FeatureSet,
    trezoa_hash::Hash,
    trezoa_keypair::Keypair,
    trezoa_message::SanitizedMessage,
    trezoa_program_runtime::{
        invoke_context::{EnvironmentConfig, InvokeContext},
        loaded_programs::ProgramRuntimeEnvironments,
        sysvar_cache::SysvarCache,
    },
    trezoa_pubkey::Pubkey,
    trezoa_signature::Signature,
    trezoa_signer::Signer,
    trezoa_svm_callback::InvokeContextCallback,
    trezoa_svm_log_collector::LogCollector,
    trezoa_svm_timings::ExecuteTimings,
    trezoa_svm_transaction::instruction::SVMInstruction,
    trezoa_syscalls::{
        create_program_runtime_environment_v1, create_program_runtime_environment_v2,
    },
    trezoa_transaction::Transaction,
    trezoa_transaction_context::{IndexOfAccount, TransactionContext},
    trezoa_transaction_error::TransactionError,
    std::{
        cell::RefCell,
        collections::{HashMap, HashSet, VecDeque},
        path::Path,
        rc::Rc,
        sync::Arc,
    },
};

pub(crate) const DEFAULT_LOADER_KEY: Pubkey = trezoa_sdk_ids::bpf_loader_upgradeable::id();

const FAUCET_SECRET: [u8; 32] = [7; 32];
const GENESIS_SEED: &[u8] = b"omnipair-harness genesis";

/// The local engine.
///
/// All fields but the account store and the blockhash window can be
/// manipulated directly by callers who need more control.
pub struct LocalSvm<AS: AccountStore = HashMap<Pubkey, Account>> {
    pub config: SvmConfig,
    pub compute_budget: ComputeBudget,
    pub feature_set: FeatureSet,
    pub program_cache: ProgramCache,
    pub sysvars: Sysvars,
    accounts: AS,
    blockhash: Hash,
    recent_blockhashes: VecDeque<Hash>,
    // Signatures seen per blockhash, dropped once the blockhash leaves the
    // recent window.
    processed_signatures: HashMap<Hash, HashSet<Signature>>,
    faucet: Keypair,
}

struct HarnessInvokeContextCallback;

impl InvokeContextCallback for HarnessInvokeContextCallback {}

struct MessageResult {
    /// The number of compute units consumed by the transaction.
    pub compute_units_consumed: u64,
    /// The raw result of the transaction's execution.
    pub raw_result: Result<(), TransactionError>,
    /// The return data produced by the transaction, if any.
    pub return_data: Vec<u8>,
}

/// Which pre-execution checks a pipeline run applies. Each one is further
/// gated by the engine's `SvmConfig`.
#[derive(Clone, Copy)]
struct Checks {
    sigverify: bool,
    blockhash: bool,
    history: bool,
}

impl Checks {
    const SUBMIT: Self = Self {
        sigverify: true,
        blockhash: true,
        history: true,
    };
    const SIMULATE: Self = Self {
        sigverify: false,
        blockhash: true,
        history: false,
    };
    const AIRDROP: Self = Self {
        sigverify: false,
        blockhash: false,
        history: false,
    };
}

/// The outcome of a pipeline run plus the account writes it would commit.
struct Execution {
    outcome: BackendOutcome,
    writes: Vec<(Pubkey, Account)>,
}

impl Execution {
    fn rejected(err: TransactionError) -> Self {
        Self {
            outcome: BackendOutcome::Rejected(RejectedTransaction { err, logs: None }),
            writes: Vec::new(),
        }
    }
}

fn next_blockhash(previous: &Hash) -> Hash {
    Hash::new_from_array(Sha256::digest(previous.to_bytes()).into())
}

impl Default for LocalSvm {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSvm {
    /// Create an engine with the default configuration and an empty
    /// in-memory store.
    pub fn new() -> Self {
        Self::with_config(SvmConfig::default())
    }

    pub fn with_config(config: SvmConfig) -> Self {
        Self::with_store(HashMap::new(), config)
    }
}

impl<AS: AccountStore> LocalSvm<AS> {
    /// Create an engine over a caller-provided account store.
    pub fn with_store(accounts: AS, config: SvmConfig) -> Self {
        #[rustfmt::skip]
        trezoa_logger::setup_with_default(
            "trezoa_rbpf::vm=debug,\
             trezoa_runtime::message_processor=debug,\
             trezoa_runtime::system_instruction_processor=trace",
        );
        let compute_budget = ComputeBudget::new_with_defaults(true, true);
        let feature_set = FeatureSet::all_enabled();
        let program_cache = ProgramCache::new(&feature_set, &compute_budget);

        let genesis = Hash::new_from_array(Sha256::digest(GENESIS_SEED).into());
        let faucet = Keypair::new_from_array(FAUCET_SECRET);
        let faucet_account = Account::new(
            config.faucet_lamports,
            0,
            &trezoa_sdk_ids::system_program::id(),
        );

        let mut me = Self {
            config,
            compute_budget,
            feature_set,
            program_cache,
            sysvars: Sysvars::default(),
            accounts,
            blockhash: genesis,
            recent_blockhashes: VecDeque::from([genesis]),
            processed_signatures: HashMap::new(),
            faucet,
        };
        me.accounts.store_account(me.faucet.pubkey(), faucet_account);
        me
    }

    /// Deploy a program ELF at `program_id` under the upgradeable loader.
    pub fn add_program_with_elf(&mut self, program_id: &Pubkey, elf: &[u8]) -> HarnessResult<()> {
        self.program_cache
            .add_program(program_id, &DEFAULT_LOADER_KEY, elf)?;
        let program_account = create_program_account_loader_v3(program_id)?;
        self.accounts.store_account(*program_id, program_account);
        log::debug!("Deployed program {} ({} bytes)", program_id, elf.len());
        Ok(())
    }

    /// Deploy a program found by name in the default search paths.
    pub fn add_program_by_name(&mut self, program_id: &Pubkey, program_name: &str) -> HarnessResult<()> {
        let elf = file::load_program_elf(program_name)?;
        self.add_program_with_elf(program_id, &elf)
    }

    /// Seed an account directly, bypassing transaction execution.
    pub fn set_account(&mut self, address: Pubkey, account: Account) {
        self.accounts.store_account(address, account);
    }

    /// Warp the engine to a slot by updating sysvars.
    pub fn warp_to_slot(&mut self, slot: u64) {
        self.sysvars.warp_to_slot(slot)
    }

    /// Advance to a new blockhash. The previous ones stay valid until they
    /// fall out of the recent window.
    pub fn expire_blockhash(&mut self) {
        let next = next_blockhash(&self.blockhash);
        self.recent_blockhashes.push_back(next);
        while self.recent_blockhashes.len() > MAX_RECENT_BLOCKHASHES {
            if let Some(expired) = self.recent_blockhashes.pop_front() {
                self.processed_signatures.remove(&expired);
            }
        }
        self.blockhash = next;
    }

    /// The backing account store.
    pub fn account_store(&self) -> &AS {
        &self.accounts
    }

    /// The address funding airdrops.
    pub fn faucet_pubkey(&self) -> Pubkey {
        self.faucet.pubkey()
    }

    // Accounts to fall back to for keys the store doesn't hold.
    fn get_account_fallbacks(&self, message: &SanitizedMessage) -> HashMap<Pubkey, Account> {
        message
            .account_keys()
            .iter()
            .filter(|key| self.accounts.get_account(key).is_none())
            .filter_map(|key| {
                let account = if key == &trezoa_instructions_sysvar::ID {
                    Some(instructions_sysvar::keyed_account(message).1)
                } else {
                    self.sysvars
                        .maybe_create_sysvar_account(key)
                        .or_else(|| self.program_cache.maybe_create_program_account(key))
                };
                account.map(|account| (*key, account))
            })
            .collect()
    }

    fn create_transaction_context(
        &self,
        transaction_accounts: Vec<(Pubkey, AccountSharedData)>,
    ) -> TransactionContext<'_> {
        TransactionContext::new(
            transaction_accounts,
            self.sysvars.rent.clone(),
            self.compute_budget.max_instruction_stack_depth,
            self.compute_budget.max_instruction_trace_length,
        )
    }

    fn deconstruct_writable_accounts(
        transaction_context: &TransactionContext,
        message: &SanitizedMessage,
    ) -> Vec<(Pubkey, Account)> {
        message
            .account_keys()
            .iter()
            .enumerate()
            .filter(|(index, _)| message.is_writable(*index))
            .map(|(_, pubkey)| {
                let index = transaction_context
                    .find_index_of_account(pubkey)
                    .or_panic_with(EngineError::AccountMissing(pubkey));
                let account_ref = transaction_context
                    .accounts()
                    .try_borrow(index)
                    .or_panic_with(EngineError::AccountUnavailable(pubkey));
                let resulting_account = Account {
                    lamports: account_ref.lamports(),
                    data: account_ref.data().to_vec(),
                    owner: *account_ref.owner(),
                    executable: account_ref.executable(),
                    rent_epoch: account_ref.rent_epoch(),
                };
                (*pubkey, resulting_account)
            })
            .collect()
    }

    fn process_transaction_message<'a>(
        &self,
        sanitized_message: &'a SanitizedMessage,
        transaction_context: &mut TransactionContext<'a>,
        sysvar_cache: &SysvarCache,
        logger: Option<Rc<RefCell<LogCollector>>>,
    ) -> MessageResult {
        let mut compute_units_consumed = 0;
        let mut timings = ExecuteTimings::default();

        let mut program_cache = self.program_cache.cache();
        let callback = HarnessInvokeContextCallback;
        let execution_budget = self.compute_budget.to_budget();
        let runtime_features = self.feature_set.runtime_features();

        let program_runtime_environments: ProgramRuntimeEnvironments = ProgramRuntimeEnvironments {
            program_runtime_v1: Arc::new(
                create_program_runtime_environment_v1(
                    &runtime_features,
                    &execution_budget,
                    /* reject_deployment_of_broken_elfs */ false,
                    /* debugging_features */ false,
                )
                .or_panic_with(EngineError::RuntimeEnvironment),
            ),
            program_runtime_v2: Arc::new(create_program_runtime_environment_v2(
                &execution_budget,
                /* debugging_features */ false,
            )),
        };

        let mut invoke_context = InvokeContext::new(
            transaction_context,
            &mut program_cache,
            EnvironmentConfig::new(
                *sanitized_message.recent_blockhash(),
                self.config.lamports_per_signature,
                &callback,
                &runtime_features,
                &program_runtime_environments,
                &program_runtime_environments,
                sysvar_cache,
            ),
            logger,
            self.compute_budget.to_budget(),
            self.compute_budget.to_cost(),
        );

        let mut raw_result = Ok(());

        for (instruction_index, (_program_id, compiled_ix)) in
            sanitized_message.program_instructions_iter().enumerate()
        {
            let program_id_index = compiled_ix.program_id_index as IndexOfAccount;

            invoke_context
                .prepare_next_top_level_instruction(
                    sanitized_message,
                    &SVMInstruction::from(compiled_ix),
                    program_id_index,
                    &compiled_ix.data,
                )
                .or_panic_with(EngineError::PrepareInstruction(instruction_index));

            if let Err(err) =
                invoke_context.process_instruction(&mut compute_units_consumed, &mut timings)
            {
                raw_result = Err(TransactionError::InstructionError(
                    instruction_index as u8,
                    err,
                ));
                break;
            }
        }

        let return_data = transaction_context.get_return_data().1.to_vec();

        MessageResult {
            compute_units_consumed,
            raw_result,
            return_data,
        }
    }

    fn execute(&self, tx: &Transaction, checks: Checks) -> Execution {
        let signature = tx.signatures.first().copied().unwrap_or_default();
        let num_required_signatures = tx.message.header.num_required_signatures as usize;

        if tx.message.account_keys.is_empty()
            || num_required_signatures == 0
            || tx.signatures.len() < num_required_signatures
        {
            return Execution::rejected(TransactionError::SanitizeFailure);
        }
        // Bounds-checks every program id and account index in the message.
        let Ok(sanitized_message) =
            SanitizedMessage::try_from_legacy_message(tx.message.clone(), &HashSet::new())
        else {
            return Execution::rejected(TransactionError::SanitizeFailure);
        };
        if checks.sigverify && self.config.sigverify && tx.verify().is_err() {
            return Execution::rejected(TransactionError::SignatureFailure);
        }
        if checks.blockhash
            && self.config.blockhash_check
            && !self.recent_blockhashes.contains(&tx.message.recent_blockhash)
        {
            return Execution::rejected(TransactionError::BlockhashNotFound);
        }
        if checks.history
            && signature != Signature::default()
            && self
                .processed_signatures
                .get(&tx.message.recent_blockhash)
                .is_some_and(|seen| seen.contains(&signature))
        {
            return Execution::rejected(TransactionError::AlreadyProcessed);
        }

        let fee_payer = *sanitized_message.fee_payer();
        let fee = self
            .config
            .lamports_per_signature
            .saturating_mul(num_required_signatures as u64);
        let Some(mut fee_payer_account) = self
            .accounts
            .get_account(&fee_payer)
            .filter(|account| account.lamports > 0)
        else {
            return Execution::rejected(TransactionError::AccountNotFound);
        };
        if fee_payer_account.lamports < fee {
            return Execution::rejected(TransactionError::InsufficientFundsForFee);
        }
        fee_payer_account.lamports -= fee;

        let fallback_accounts = self.get_account_fallbacks(&sanitized_message);
        let mut transaction_accounts = compile_accounts::load_transaction_accounts(
            &sanitized_message,
            &self.accounts,
            &fallback_accounts,
        );
        transaction_accounts[0].1 = AccountSharedData::from(fee_payer_account.clone());

        let missing_program = sanitized_message
            .program_instructions_iter()
            .any(|(program_id, _)| {
                transaction_accounts
                    .iter()
                    .find(|(key, _)| key == program_id)
                    .map_or(true, |(_, account)| !account.executable())
            });
        if missing_program {
            return Execution::rejected(TransactionError::ProgramAccountNotFound);
        }

        let logger = LogCollector::new_ref_with_limit(self.config.log_bytes_limit);
        let mut transaction_context = self.create_transaction_context(transaction_accounts);
        let sysvar_cache = self.sysvars.setup_sysvar_cache();

        let message_result = self.process_transaction_message(
            &sanitized_message,
            &mut transaction_context,
            &sysvar_cache,
            Some(logger.clone()),
        );

        let meta = TransactionMetadata {
            signature,
            logs: logger.borrow().get_recorded_content().to_vec(),
            compute_units_consumed: message_result.compute_units_consumed,
            return_data: message_result.return_data,
        };

        match message_result.raw_result {
            Ok(()) => Execution {
                outcome: BackendOutcome::Processed(meta),
                writes: Self::deconstruct_writable_accounts(
                    &transaction_context,
                    &sanitized_message,
                ),
            },
            Err(err) => {
                log::trace!("Transaction {} failed: {}", signature, err);
                Execution {
                    outcome: BackendOutcome::Failed(FailedTransactionMetadata::new(err, meta)),
                    writes: vec![(fee_payer, fee_payer_account)],
                }
            }
        }
    }

    fn commit(
        &mut self,
        signature: Signature,
        blockhash: Hash,
        execution: Execution,
    ) -> BackendOutcome {
        if matches!(execution.outcome, BackendOutcome::Rejected(_)) {
            return execution.outcome;
        }
        if signature != Signature::default() {
            self.processed_signatures
                .entry(blockhash)
                .or_default()
                .insert(signature);
        }
        for (pubkey, account) in execution.writes {
            self.accounts.store_account(pubkey, account);
        }
        execution.outcome
    }
}

impl<AS: AccountStore> ExecutionBackend for LocalSvm<AS> {
    fn add_program(&mut self, program_id: &Pubkey, path: &Path) -> HarnessResult<()> {
        let elf = file::read_file(path)?;
        self.add_program_with_elf(program_id, &elf)
    }

    fn send_transaction(&mut self, tx: Transaction) -> BackendOutcome {
        let execution = self.execute(&tx, Checks::SUBMIT);
        let signature = tx.signatures.first().copied().unwrap_or_default();
        self.commit(signature, tx.message.recent_blockhash, execution)
    }

    fn simulate_transaction(&self, tx: &Transaction) -> BackendOutcome {
        self.execute(tx, Checks::SIMULATE).outcome
    }

    fn get_account(&self, address: &Pubkey) -> Option<Account> {
        self.accounts.live_account(address)
    }

    fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> u64 {
        self.sysvars.rent.minimum_balance(data_len)
    }

    fn latest_blockhash(&self) -> Hash {
        self.blockhash
    }

    fn airdrop(&mut self, address: &Pubkey, lamports: u64) -> BackendOutcome {
        let faucet = self.faucet.pubkey();
        let tx = Transaction::new_signed_with_payer(
            &[trezoa_system_interface::instruction::transfer(
                &faucet, address, lamports,
            )],
            Some(&faucet),
            &[&self.faucet],
            self.blockhash,
        );
        let execution = self.execute(&tx, Checks::AIRDROP);
        self.commit(Signature::default(), tx.message.recent_blockhash, execution)
    }
}
