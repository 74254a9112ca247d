//! Response shapes mirroring the JSON-RPC envelopes client libraries expect.

use {
    serde::{Deserialize, Serialize},
    trezoa_account::Account,
    trezoa_hash::Hash,
};

/// The harness doesn't model slot progression, so every context reports
/// slot 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcResponseContext {
    pub slot: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response<T> {
    pub context: RpcResponseContext,
    pub value: T,
}

impl<T> Response<T> {
    pub fn new(value: T) -> Self {
        Self {
            context: RpcResponseContext::default(),
            value,
        }
    }
}

/// `last_valid_block_height` is not tracked and always 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LatestBlockhash {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureResult {
    pub err: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateTransactionResult {
    pub err: Option<String>,
    pub logs: Option<Vec<String>>,
}

/// Accepted for interface parity. Local submission has no preflight or
/// retry stage, so these are ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOptions {
    pub skip_preflight: bool,
    pub max_retries: Option<usize>,
}

/// JSON rendering of an account, with base58-encoded data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiAccount {
    pub lamports: u64,
    pub owner: String,
    pub data: (String, String),
    pub executable: bool,
    pub rent_epoch: u64,
}

impl From<&Account> for UiAccount {
    fn from(account: &Account) -> Self {
        Self {
            lamports: account.lamports,
            owner: account.owner.to_string(),
            data: (
                bs58::encode(&account.data).into_string(),
                "base58".to_string(),
            ),
            executable: account.executable,
            rent_epoch: 0,
        }
    }
}
