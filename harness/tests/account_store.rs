use {
    omnipair_harness::{
        account_store::AccountStore, result::BackendOutcome, ExecutionBackend, LocalSvm, SvmConfig,
    },
    trezoa_account::{Account, ReadableAccount},
    trezoa_keypair::Keypair,
    trezoa_pubkey::Pubkey,
    trezoa_signer::Signer,
    trezoa_transaction::Transaction,
    std::collections::BTreeMap,
};

/// A store that hands out pre-funded accounts for keys it has never seen.
#[derive(Default)]
struct PrefundedStore {
    accounts: BTreeMap<Pubkey, Account>,
}

const PREFUNDED_LAMPORTS: u64 = 1_000_000_000;

impl AccountStore for PrefundedStore {
    fn default_account(&self, _pubkey: &Pubkey) -> Account {
        Account::new(PREFUNDED_LAMPORTS, 0, &trezoa_sdk_ids::system_program::id())
    }

    fn get_account(&self, pubkey: &Pubkey) -> Option<Account> {
        self.accounts.get(pubkey).cloned()
    }

    fn store_account(&mut self, pubkey: Pubkey, account: Account) {
        self.accounts.insert(pubkey, account);
    }
}

#[test]
fn test_transfer_with_custom_store() {
    let sender = Keypair::new();
    let recipient = Pubkey::new_unique();

    let base_lamports = 100_000_000u64;
    let transfer_amount = 42_000u64;

    let mut store = PrefundedStore::default();
    store.store_account(
        sender.pubkey(),
        Account::new(base_lamports, 0, &trezoa_sdk_ids::system_program::id()),
    );
    let mut svm = LocalSvm::with_store(store, SvmConfig::default());

    let tx = Transaction::new_signed_with_payer(
        &[trezoa_system_interface::instruction::transfer(
            &sender.pubkey(),
            &recipient,
            transfer_amount,
        )],
        Some(&sender.pubkey()),
        &[&sender],
        svm.latest_blockhash(),
    );
    let outcome = svm.send_transaction(tx);
    assert!(matches!(outcome, BackendOutcome::Processed(_)));

    let store = svm.account_store();
    let sender_account = store.get_account(&sender.pubkey()).unwrap();
    assert_eq!(
        sender_account.lamports(),
        base_lamports - transfer_amount - 5000
    );

    // The recipient was unknown, so it started from the store's default.
    let recipient_account = store.get_account(&recipient).unwrap();
    assert_eq!(
        recipient_account.lamports(),
        PREFUNDED_LAMPORTS + transfer_amount
    );
}

#[test]
fn test_ordered_store() {
    let user = Keypair::new();
    let mut svm = LocalSvm::with_store(BTreeMap::new(), SvmConfig::default());
    svm.airdrop(&user.pubkey(), 1_000_000);

    assert_eq!(svm.get_balance(&user.pubkey()), Some(1_000_000));
    let keys: Vec<Pubkey> = svm.account_store().keys().copied().collect();
    assert!(keys.contains(&user.pubkey()));
    assert!(keys.contains(&svm.faucet_pubkey()));
    assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
}
