use {
    omnipair_harness_error::error::HarnessError,
    omnipair_harness_rpc::{
        initialize_test_environment, Connection, TestSetupConfig,
    },
    std::{io::Write, path::PathBuf},
    trezoa_native_token::LAMPORTS_PER_SOL,
    trezoa_pubkey::Pubkey,
    trezoa_signer::Signer,
};

fn config_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_yaml_config() {
    let file = config_file(
        ".yaml",
        "programPath: target/deploy/omnipair.so\ninitialBalance: 5000000000\n",
    );
    let config = TestSetupConfig::try_load(file.path()).unwrap();
    assert_eq!(
        config,
        TestSetupConfig {
            program_path: Some(PathBuf::from("target/deploy/omnipair.so")),
            program_name: None,
            initial_balance: 5 * LAMPORTS_PER_SOL,
        }
    );
}

#[test]
fn test_load_json_config_with_defaults() {
    let file = config_file(".json", r#"{ "programName": "omnipair" }"#);
    let config = TestSetupConfig::try_load(file.path()).unwrap();
    assert_eq!(config, TestSetupConfig::default());
}

#[test]
fn test_load_config_errors() {
    let file = config_file(".toml", "initial_balance = 1\n");
    assert!(matches!(
        TestSetupConfig::try_load(file.path()),
        Err(HarnessError::ConfigLoad(_))
    ));

    let file = config_file(".json", "{ not json");
    assert!(matches!(
        TestSetupConfig::try_load(file.path()),
        Err(HarnessError::ConfigLoad(_))
    ));

    assert!(matches!(
        TestSetupConfig::try_load("missing/config.yaml"),
        Err(HarnessError::FileRead { .. })
    ));
}

#[tokio::test]
async fn test_environment_funds_deployer_and_payer() {
    let program_id = Pubkey::new_unique();
    let config = TestSetupConfig {
        program_name: None,
        ..Default::default()
    };
    let env = initialize_test_environment(program_id, &config)
        .await
        .unwrap();

    assert_eq!(env.program_id, program_id);
    assert_ne!(env.deployer.pubkey(), env.payer.pubkey());
    for keypair in [&env.deployer, &env.payer] {
        assert_eq!(
            env.connection.get_balance(&keypair.pubkey()).await.unwrap(),
            10 * LAMPORTS_PER_SOL
        );
    }
}

#[tokio::test]
async fn test_environment_missing_program() {
    let config = TestSetupConfig {
        program_path: Some(PathBuf::from("does/not/exist/omnipair.so")),
        ..Default::default()
    };
    let err = initialize_test_environment(Pubkey::new_unique(), &config)
        .await
        .err()
        .unwrap();
    assert_eq!(
        err,
        HarnessError::ProgramFileNotFound("does/not/exist/omnipair.so".to_string())
    );
}

#[tokio::test]
#[serial_test::serial]
async fn test_environment_looks_up_program_by_name() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("omnipair_env_test.so"), b"not an elf").unwrap();

    std::env::set_var("SBF_OUT_DIR", dir.path());
    let config = TestSetupConfig {
        program_name: Some("omnipair_env_test".to_string()),
        ..Default::default()
    };
    let result = initialize_test_environment(Pubkey::new_unique(), &config).await;
    std::env::remove_var("SBF_OUT_DIR");

    // Found by name, then refused by the loader.
    assert!(matches!(result.err(), Some(HarnessError::ProgramLoad(_))));
}
