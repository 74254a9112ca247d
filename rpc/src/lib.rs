//! RPC-compatible connection over the local engine.
//!
//! Code written against the `Connection` surface runs unchanged against a
//! `LocalConnection`, which answers every call synchronously from the
//! engine's in-memory state.

pub mod connection;
pub mod environment;
pub mod request;
pub mod response;

pub use {
    connection::{Connection, LocalConnection, PLACEHOLDER_SIGNATURE},
    environment::{
        create_funded_keypair, format_balance, initialize_test_environment,
        initialize_test_environment_with, TestEnvironment, TestSetupConfig,
    },
    request::RpcRequest,
    response::{
        LatestBlockhash, Response, RpcResponseContext, SendOptions, SignatureResult,
        SimulateTransactionResult, UiAccount,
    },
};
