//! Account storage behind a `LocalSvm`.
use {
    trezoa_account::Account,
    trezoa_pubkey::Pubkey,
    std::collections::{BTreeMap, HashMap},
};

/// The persistent account state of the engine.
///
/// Writes only come from committed transactions and from explicit seeding
/// through `LocalSvm::set_account`. Reads made while loading a transaction go
/// through `account_or_default`, so a store can decide what an address it has
/// never seen looks like.
pub trait AccountStore {
    fn get_account(&self, pubkey: &Pubkey) -> Option<Account>;

    fn store_account(&mut self, pubkey: Pubkey, account: Account);

    /// What a transaction sees at an address the store has no entry for.
    fn default_account(&self, _pubkey: &Pubkey) -> Account {
        Account::default()
    }

    fn account_or_default(&self, pubkey: &Pubkey) -> Account {
        self.get_account(pubkey)
            .unwrap_or_else(|| self.default_account(pubkey))
    }

    /// Like `get_account`, but an entry with no lamports and no data counts
    /// as absent. A drained account is indistinguishable from one that never
    /// existed.
    fn live_account(&self, pubkey: &Pubkey) -> Option<Account> {
        self.get_account(pubkey)
            .filter(|account| account.lamports > 0 || !account.data.is_empty())
    }
}

impl AccountStore for HashMap<Pubkey, Account> {
    fn get_account(&self, pubkey: &Pubkey) -> Option<Account> {
        self.get(pubkey).cloned()
    }

    fn store_account(&mut self, pubkey: Pubkey, account: Account) {
        self.insert(pubkey, account);
    }
}

impl AccountStore for BTreeMap<Pubkey, Account> {
    fn get_account(&self, pubkey: &Pubkey) -> Option<Account> {
        self.get(pubkey).cloned()
    }

    fn store_account(&mut self, pubkey: Pubkey, account: Account) {
        self.insert(pubkey, account);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_account() {
        let mut store = HashMap::new();
        let drained = Pubkey::new_unique();
        let rent_free_data = Pubkey::new_unique();
        store.store_account(drained, Account::default());
        store.store_account(
            rent_free_data,
            Account {
                data: vec![1],
                ..Account::default()
            },
        );

        assert!(store.get_account(&drained).is_some());
        assert!(store.live_account(&drained).is_none());
        assert!(store.live_account(&rent_free_data).is_some());
        assert_eq!(
            store.account_or_default(&Pubkey::new_unique()),
            Account::default()
        );
    }
}
