//! Module for working with programs deployed to the local engine.

use {
    omnipair_harness_error::error::{EngineError, EnginePanic, HarnessError, HarnessResult},
    trezoa_account::Account,
    trezoa_compute_budget::compute_budget::ComputeBudget,
    trezoa_feature_set::FeatureSet,
    trezoa_loader_v3_interface::state::UpgradeableLoaderState,
    trezoa_program_runtime::{
        invoke_context::{BuiltinFunctionWithContext, InvokeContext},
        loaded_programs::{LoadProgramMetrics, ProgramCacheEntry, ProgramCacheForTxBatch},
        trezoa_sbpf::program::BuiltinProgram,
    },
    trezoa_pubkey::Pubkey,
    trezoa_rent::Rent,
    trezoa_syscalls::create_program_runtime_environment_v1,
    std::{
        cell::{RefCell, RefMut},
        collections::HashMap,
        rc::Rc,
        sync::Arc,
    },
};

/// Loader keys, re-exported for convenience.
pub mod loader_keys {
    pub use trezoa_sdk_ids::{
        bpf_loader::ID as LOADER_V2, bpf_loader_upgradeable::ID as LOADER_V3,
        native_loader::ID as NATIVE_LOADER,
    };
}

pub struct ProgramCache {
    cache: Rc<RefCell<ProgramCacheForTxBatch>>,
    // `ProgramCacheForTxBatch` doesn't expose its entries, so the loader of
    // every cached program is tracked here to synthesize program accounts.
    //
    // K: program ID, V: loader key
    loaders: Rc<RefCell<HashMap<Pubkey, Pubkey>>>,
    // The function registry (syscalls) to use for verifying and loading
    // program ELFs.
    pub program_runtime_environment: BuiltinProgram<InvokeContext<'static, 'static>>,
}

impl ProgramCache {
    pub fn new(feature_set: &FeatureSet, compute_budget: &ComputeBudget) -> Self {
        let me = Self {
            cache: Rc::new(RefCell::new(ProgramCacheForTxBatch::default())),
            loaders: Rc::new(RefCell::new(HashMap::new())),
            program_runtime_environment: create_program_runtime_environment_v1(
                &feature_set.runtime_features(),
                &compute_budget.to_budget(),
                /* reject_deployment_of_broken_elfs */ false,
                /* debugging_features */ false,
            )
            .or_panic_with(EngineError::RuntimeEnvironment),
        };
        BUILTINS.iter().for_each(|builtin| {
            me.replenish(builtin.program_id, builtin.program_cache_entry());
        });
        me
    }

    pub(crate) fn cache(&self) -> RefMut<'_, ProgramCacheForTxBatch> {
        self.cache.borrow_mut()
    }

    fn replenish(&self, program_id: Pubkey, entry: Arc<ProgramCacheEntry>) {
        self.loaders
            .borrow_mut()
            .insert(program_id, entry.account_owner());
        self.cache.borrow_mut().replenish(program_id, entry);
    }

    /// Verify and add a program ELF to the cache.
    pub fn add_program(
        &mut self,
        program_id: &Pubkey,
        loader_key: &Pubkey,
        elf: &[u8],
    ) -> HarnessResult<()> {
        // Rebuild a loader carrying the same syscalls for this entry.
        let environment = {
            let config = self.program_runtime_environment.get_config().clone();
            let mut loader = BuiltinProgram::new_loader(config);

            for (_key, (name, value)) in self
                .program_runtime_environment
                .get_function_registry()
                .iter()
            {
                let name = std::str::from_utf8(name)
                    .map_err(|err| HarnessError::ProgramLoad(err.to_string()))?;
                loader
                    .register_function(name, value)
                    .map_err(|err| HarnessError::ProgramLoad(err.to_string()))?;
            }

            Arc::new(loader)
        };
        let entry = ProgramCacheEntry::new(
            loader_key,
            environment,
            0,
            0,
            elf,
            elf.len(),
            &mut LoadProgramMetrics::default(),
        )
        .map_err(|err| HarnessError::ProgramLoad(format!("{program_id}: {err}")))?;
        self.replenish(*program_id, Arc::new(entry));
        Ok(())
    }

    /// Load a program from the cache.
    pub fn load_program(&self, program_id: &Pubkey) -> Option<Arc<ProgramCacheEntry>> {
        self.cache.borrow().find(program_id)
    }

    /// Create the executable account stub for a cached program. The ELF
    /// itself stays in the cache, where the runtime looks it up.
    pub(crate) fn maybe_create_program_account(&self, pubkey: &Pubkey) -> Option<Account> {
        let loader_key = *self.loaders.borrow().get(pubkey)?;
        match loader_key {
            loader_keys::NATIVE_LOADER => {
                Some(create_keyed_account_for_builtin_program(pubkey, "builtin").1)
            }
            loader_keys::LOADER_V2 => Some(create_program_account_loader_v2(&[])),
            loader_keys::LOADER_V3 => create_program_account_loader_v3(pubkey).ok(),
            _ => None,
        }
    }
}

pub struct Builtin {
    program_id: Pubkey,
    name: &'static str,
    entrypoint: BuiltinFunctionWithContext,
}

impl Builtin {
    fn program_cache_entry(&self) -> Arc<ProgramCacheEntry> {
        Arc::new(ProgramCacheEntry::new_builtin(
            0,
            self.name.len(),
            self.entrypoint,
        ))
    }
}

static BUILTINS: &[Builtin] = &[
    Builtin {
        program_id: trezoa_system_program::id(),
        name: "system_program",
        entrypoint: trezoa_system_program::system_processor::Entrypoint::vm,
    },
    Builtin {
        program_id: loader_keys::LOADER_V2,
        name: "trezoa_bpf_loader_program",
        entrypoint: trezoa_bpf_loader_program::Entrypoint::vm,
    },
    Builtin {
        program_id: loader_keys::LOADER_V3,
        name: "trezoa_bpf_loader_upgradeable_program",
        entrypoint: trezoa_bpf_loader_program::Entrypoint::vm,
    },
];

/// Create a key and account for a builtin program.
pub fn create_keyed_account_for_builtin_program(
    program_id: &Pubkey,
    name: &str,
) -> (Pubkey, Account) {
    let data = name.as_bytes().to_vec();
    let lamports = Rent::default().minimum_balance(data.len());
    let account = Account {
        lamports,
        data,
        owner: loader_keys::NATIVE_LOADER,
        executable: true,
        ..Default::default()
    };
    (*program_id, account)
}

/// Get the key and account for the system program.
pub fn keyed_account_for_system_program() -> (Pubkey, Account) {
    create_keyed_account_for_builtin_program(&BUILTINS[0].program_id, BUILTINS[0].name)
}

/// Create a BPF Loader 2 program account.
pub fn create_program_account_loader_v2(elf: &[u8]) -> Account {
    let lamports = Rent::default().minimum_balance(elf.len());
    Account {
        lamports,
        data: elf.to_vec(),
        owner: loader_keys::LOADER_V2,
        executable: true,
        ..Default::default()
    }
}

/// Create a BPF Loader v3 (Upgradeable) program account.
pub fn create_program_account_loader_v3(program_id: &Pubkey) -> HarnessResult<Account> {
    let programdata_address =
        Pubkey::find_program_address(&[program_id.as_ref()], &loader_keys::LOADER_V3).0;
    let data = bincode::serialize(&UpgradeableLoaderState::Program {
        programdata_address,
    })
    .map_err(|err| HarnessError::Serialization(err.to_string()))?;
    let lamports = Rent::default().minimum_balance(data.len());
    Ok(Account {
        lamports,
        data,
        owner: loader_keys::LOADER_V3,
        executable: true,
        ..Default::default()
    })
}
