//! Test environment bootstrap: a connection with the program deployed and
//! two funded keypairs.

use {
    crate::connection::{Connection, LocalConnection},
    omnipair_harness::{ExecutionBackend, LocalSvm},
    omnipair_harness_error::error::{HarnessError, HarnessResult},
    serde::{Deserialize, Serialize},
    trezoa_keypair::Keypair,
    trezoa_native_token::LAMPORTS_PER_SOL,
    trezoa_pubkey::Pubkey,
    trezoa_signer::Signer,
    std::path::{Path, PathBuf},
};

pub const DEFAULT_INITIAL_BALANCE: u64 = 10 * LAMPORTS_PER_SOL;

fn default_initial_balance() -> u64 {
    DEFAULT_INITIAL_BALANCE
}

/// How to set up a test environment.
///
/// `program_path` takes precedence over `program_name`; the latter is looked
/// up in the default program search paths. With neither, only the builtin
/// programs are available.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSetupConfig {
    #[serde(default)]
    pub program_path: Option<PathBuf>,
    #[serde(default)]
    pub program_name: Option<String>,
    #[serde(default = "default_initial_balance")]
    pub initial_balance: u64,
}

impl Default for TestSetupConfig {
    fn default() -> Self {
        Self {
            program_path: None,
            program_name: Some("omnipair".to_string()),
            initial_balance: DEFAULT_INITIAL_BALANCE,
        }
    }
}

impl TestSetupConfig {
    /// Load a config from a `.json`, `.yaml` or `.yml` file.
    pub fn try_load<P: AsRef<Path>>(path: P) -> HarnessResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|err| HarnessError::FileRead {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents)
                .map_err(|err| HarnessError::ConfigLoad(err.to_string())),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)
                .map_err(|err| HarnessError::ConfigLoad(err.to_string())),
            _ => Err(HarnessError::ConfigLoad(format!(
                "unsupported config file extension: {}",
                path.display()
            ))),
        }
    }
}

pub struct TestEnvironment<B: ExecutionBackend = LocalSvm> {
    pub connection: LocalConnection<B>,
    pub deployer: Keypair,
    pub payer: Keypair,
    pub program_id: Pubkey,
}

/// Deploy the configured program on a fresh engine and fund a deployer and a
/// payer with `initial_balance` each.
pub async fn initialize_test_environment(
    program_id: Pubkey,
    config: &TestSetupConfig,
) -> HarnessResult<TestEnvironment> {
    initialize_test_environment_with(LocalSvm::default(), program_id, config).await
}

/// Same as `initialize_test_environment`, on a caller-built engine.
pub async fn initialize_test_environment_with(
    mut svm: LocalSvm,
    program_id: Pubkey,
    config: &TestSetupConfig,
) -> HarnessResult<TestEnvironment> {
    match (&config.program_path, &config.program_name) {
        (Some(path), _) => svm.add_program(&program_id, path)?,
        (None, Some(name)) => svm.add_program_by_name(&program_id, name)?,
        (None, None) => log::warn!(
            "No program configured for {}; only builtins are deployed",
            program_id
        ),
    }

    let connection = LocalConnection::new(svm);
    let deployer = create_funded_keypair(&connection, config.initial_balance).await?;
    let payer = create_funded_keypair(&connection, config.initial_balance).await?;

    Ok(TestEnvironment {
        connection,
        deployer,
        payer,
        program_id,
    })
}

/// A fresh keypair holding `lamports`.
pub async fn create_funded_keypair<C: Connection>(
    connection: &C,
    lamports: u64,
) -> HarnessResult<Keypair> {
    let keypair = Keypair::new();
    connection
        .request_airdrop(&keypair.pubkey(), lamports)
        .await?;
    Ok(keypair)
}

/// Render lamports as SOL, e.g. `"1.5 SOL"`.
pub fn format_balance(lamports: u64) -> String {
    format!("{} SOL", lamports as f64 / LAMPORTS_PER_SOL as f64)
}
