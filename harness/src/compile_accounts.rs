//! Message -> transaction account loading, with program and sysvar stubbing.

use {
    crate::account_store::AccountStore,
    trezoa_account::{Account, AccountSharedData},
    trezoa_message::SanitizedMessage,
    trezoa_pubkey::Pubkey,
    std::collections::HashMap,
};

/// Resolve every key of the message, in message order: stored accounts win,
/// then the fallbacks (program stubs, sysvars), then the store's default.
pub fn load_transaction_accounts<AS: AccountStore>(
    message: &SanitizedMessage,
    store: &AS,
    fallback_accounts: &HashMap<Pubkey, Account>,
) -> Vec<(Pubkey, AccountSharedData)> {
    message
        .account_keys()
        .iter()
        .map(|key| {
            let account = store
                .get_account(key)
                .or_else(|| fallback_accounts.get(key).cloned())
                .unwrap_or_else(|| store.default_account(key));
            (*key, AccountSharedData::from(account))
        })
        .collect()
}
