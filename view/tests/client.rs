use {
    omnipair_harness::ExecutionBackend,
    omnipair_harness_error::error::HarnessError,
    omnipair_harness_rpc::{create_funded_keypair, LocalConnection},
    omnipair_harness_view::{
        EmitValueArgs, OmnipairViewClient, PairViewAccounts, PairViewKind, UserPositionViewKind,
        ViewQuery, ViewSimulator,
    },
    serde_json::json,
    trezoa_native_token::LAMPORTS_PER_SOL,
    trezoa_pubkey::Pubkey,
    trezoa_signer::Signer,
};

fn pair_accounts() -> PairViewAccounts {
    PairViewAccounts {
        pair: Pubkey::new_unique(),
        rate_model: Pubkey::new_unique(),
        futarchy_authority: Pubkey::new_unique(),
    }
}

#[tokio::test]
async fn test_undeployed_program_fails_before_decoding() {
    let connection = LocalConnection::default();
    let payer = create_funded_keypair(&connection, LAMPORTS_PER_SOL)
        .await
        .unwrap();
    let client = OmnipairViewClient::new(
        &connection,
        Pubkey::new_unique(),
        payer.pubkey(),
        pair_accounts(),
    );

    let err = client
        .pair_view(PairViewKind::EmaPrice0Nad, EmitValueArgs::default())
        .unwrap_err();
    assert!(
        matches!(err, HarnessError::TransactionFailure { .. }),
        "unexpected error: {err:?}"
    );

    // Nothing was charged for the simulation.
    assert_eq!(
        connection.backend().get_account(&payer.pubkey()).unwrap().lamports,
        LAMPORTS_PER_SOL
    );
}

#[tokio::test]
async fn test_unfunded_payer() {
    let connection = LocalConnection::default();
    let client = OmnipairViewClient::new(
        &connection,
        Pubkey::new_unique(),
        Pubkey::new_unique(),
        pair_accounts(),
    );
    let query = ViewQuery::from_encoded(json!({ "spotPrice1Nad": {} })).unwrap();
    assert!(matches!(
        client.simulate_view(&query),
        Err(HarnessError::TransactionFailure { .. })
    ));
}

#[test]
fn test_user_position_requires_account() {
    let connection = LocalConnection::default();
    let client = OmnipairViewClient::new(
        &connection,
        Pubkey::new_unique(),
        Pubkey::new_unique(),
        pair_accounts(),
    );
    assert!(matches!(
        client.user_position_view(UserPositionViewKind::UserLiquidationPrice),
        Err(HarnessError::InvalidViewQuery(_))
    ));

    let user_position = Pubkey::new_unique();
    let client = client.with_user_position(user_position);
    let ix = client
        .instruction(&omnipair_harness_view::OmnipairView::UserPosition(
            UserPositionViewKind::UserLiquidationPrice,
        ))
        .unwrap();
    assert_eq!(ix.accounts[1].pubkey, user_position);
}

#[test]
fn test_unknown_getter() {
    let connection = LocalConnection::default();
    let client = OmnipairViewClient::new(
        &connection,
        Pubkey::new_unique(),
        Pubkey::new_unique(),
        pair_accounts(),
    );
    let query = ViewQuery::from_encoded(json!({ "reserve0": {} })).unwrap();
    assert!(matches!(
        client.simulate_view(&query),
        Err(HarnessError::InvalidViewQuery(_))
    ));
}
