//! Omnipair's view getters and a client that simulates them locally.

use {
    crate::{
        decoder::{ViewArity, ViewDecoder, ViewResult, ViewSimulator},
        query::ViewQuery,
    },
    borsh::{BorshDeserialize, BorshSerialize},
    omnipair_harness::{ExecutionBackend, LocalSvm},
    omnipair_harness_error::error::{HarnessError, HarnessResult},
    omnipair_harness_rpc::LocalConnection,
    serde::{Deserialize, Serialize},
    serde_json::Value,
    trezoa_instruction::{AccountMeta, Instruction},
    trezoa_pubkey::Pubkey,
    trezoa_transaction::Transaction,
};

/// Anchor discriminator of `view_pair_data`.
pub const VIEW_PAIR_DATA_DISCRIMINATOR: [u8; 8] = [0x1e, 0xe7, 0xa9, 0x49, 0x13, 0xa1, 0x2c, 0xfc];
/// Anchor discriminator of `view_user_position_data`.
pub const VIEW_USER_POSITION_DATA_DISCRIMINATOR: [u8; 8] =
    [0xcb, 0xda, 0xad, 0xd5, 0x2b, 0x1f, 0xd3, 0x98];

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum PairViewKind {
    EmaPrice0Nad,
    EmaPrice1Nad,
    SpotPrice0Nad,
    SpotPrice1Nad,
    K,
    GetRates,
    GetBorrowLimitAndCfBpsForCollateral,
}

impl PairViewKind {
    pub const fn arity(&self) -> ViewArity {
        match self {
            Self::GetRates | Self::GetBorrowLimitAndCfBpsForCollateral => ViewArity::Pair,
            _ => ViewArity::Single,
        }
    }
}

/// Every user-position getter logs a pair.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum UserPositionViewKind {
    UserBorrowingPower,
    UserAppliedCollateralFactorBps,
    UserLiquidationCollateralFactorBps,
    UserDebtUtilizationBps,
    UserLiquidationPrice,
    UserDebtWithInterest,
}

/// Optional inputs of `view_pair_data`; only the borrow-limit getter reads
/// the collateral fields.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[serde(default, rename_all = "camelCase")]
pub struct EmitValueArgs {
    pub debt_amount: Option<u64>,
    pub collateral_amount: Option<u64>,
    pub collateral_token: Option<Pubkey>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PairViewAccounts {
    pub pair: Pubkey,
    pub rate_model: Pubkey,
    pub futarchy_authority: Pubkey,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UserPositionViewAccounts {
    pub pair: Pubkey,
    pub user_position: Pubkey,
    pub rate_model: Pubkey,
    pub futarchy_authority: Pubkey,
}

fn serialize_err(err: std::io::Error) -> HarnessError {
    HarnessError::Serialization(err.to_string())
}

pub fn view_pair_data(
    program_id: &Pubkey,
    accounts: &PairViewAccounts,
    getter: PairViewKind,
    args: &EmitValueArgs,
) -> HarnessResult<Instruction> {
    let mut data = VIEW_PAIR_DATA_DISCRIMINATOR.to_vec();
    getter.serialize(&mut data).map_err(serialize_err)?;
    args.serialize(&mut data).map_err(serialize_err)?;
    Ok(Instruction::new_with_bytes(
        *program_id,
        &data,
        vec![
            AccountMeta::new_readonly(accounts.pair, false),
            AccountMeta::new_readonly(accounts.rate_model, false),
            AccountMeta::new_readonly(accounts.futarchy_authority, false),
        ],
    ))
}

pub fn view_user_position_data(
    program_id: &Pubkey,
    accounts: &UserPositionViewAccounts,
    getter: UserPositionViewKind,
) -> HarnessResult<Instruction> {
    let mut data = VIEW_USER_POSITION_DATA_DISCRIMINATOR.to_vec();
    getter.serialize(&mut data).map_err(serialize_err)?;
    Ok(Instruction::new_with_bytes(
        *program_id,
        &data,
        vec![
            AccountMeta::new_readonly(accounts.pair, false),
            AccountMeta::new_readonly(accounts.user_position, false),
            AccountMeta::new_readonly(accounts.rate_model, false),
            AccountMeta::new_readonly(accounts.futarchy_authority, false),
        ],
    ))
}

/// A view query resolved against the Omnipair getter set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OmnipairView {
    Pair(PairViewKind, EmitValueArgs),
    UserPosition(UserPositionViewKind),
}

impl OmnipairView {
    pub fn from_query(query: &ViewQuery) -> HarnessResult<Self> {
        let label = Value::String(query.label().to_string());
        if let Ok(kind) = serde_json::from_value::<PairViewKind>(label.clone()) {
            let args = match query.args() {
                Value::Null => EmitValueArgs::default(),
                args => serde_json::from_value(args.clone())
                    .map_err(|err| HarnessError::InvalidViewQuery(err.to_string()))?,
            };
            return Ok(Self::Pair(kind, args));
        }
        if let Ok(kind) = serde_json::from_value::<UserPositionViewKind>(label) {
            return Ok(Self::UserPosition(kind));
        }
        Err(HarnessError::InvalidViewQuery(format!(
            "unknown getter: {}",
            query.label()
        )))
    }

    pub fn query(&self) -> HarnessResult<ViewQuery> {
        match self {
            Self::Pair(kind, args) => {
                let label = ViewQuery::from_getter(kind)?;
                let args = serde_json::to_value(args)
                    .map_err(|err| HarnessError::Serialization(err.to_string()))?;
                Ok(ViewQuery::new(label.label(), args))
            }
            Self::UserPosition(kind) => ViewQuery::from_getter(kind),
        }
    }

    pub const fn arity(&self) -> ViewArity {
        match self {
            Self::Pair(kind, _) => kind.arity(),
            Self::UserPosition(_) => ViewArity::Pair,
        }
    }
}

/// Runs Omnipair getters against a local connection.
pub struct OmnipairViewClient<'a, B: ExecutionBackend = LocalSvm> {
    connection: &'a LocalConnection<B>,
    program_id: Pubkey,
    payer: Pubkey,
    accounts: PairViewAccounts,
    user_position: Option<Pubkey>,
    decoder: ViewDecoder,
}

impl<'a, B: ExecutionBackend> OmnipairViewClient<'a, B> {
    /// `payer` must hold enough lamports to cover a simulated fee.
    pub fn new(
        connection: &'a LocalConnection<B>,
        program_id: Pubkey,
        payer: Pubkey,
        accounts: PairViewAccounts,
    ) -> Self {
        Self {
            connection,
            program_id,
            payer,
            accounts,
            user_position: None,
            decoder: ViewDecoder::new(),
        }
    }

    pub fn with_user_position(mut self, user_position: Pubkey) -> Self {
        self.user_position = Some(user_position);
        self
    }

    pub fn instruction(&self, view: &OmnipairView) -> HarnessResult<Instruction> {
        match view {
            OmnipairView::Pair(kind, args) => {
                view_pair_data(&self.program_id, &self.accounts, *kind, args)
            }
            OmnipairView::UserPosition(kind) => {
                let user_position = self.user_position.ok_or_else(|| {
                    HarnessError::InvalidViewQuery(
                        "user position getters need a user position account".to_string(),
                    )
                })?;
                let accounts = UserPositionViewAccounts {
                    pair: self.accounts.pair,
                    user_position,
                    rate_model: self.accounts.rate_model,
                    futarchy_authority: self.accounts.futarchy_authority,
                };
                view_user_position_data(&self.program_id, &accounts, *kind)
            }
        }
    }

    pub fn view(&self, view: &OmnipairView) -> HarnessResult<ViewResult> {
        self.decoder.query(self, &view.query()?, view.arity())
    }

    pub fn pair_view(&self, kind: PairViewKind, args: EmitValueArgs) -> HarnessResult<ViewResult> {
        self.view(&OmnipairView::Pair(kind, args))
    }

    pub fn user_position_view(&self, kind: UserPositionViewKind) -> HarnessResult<ViewResult> {
        self.view(&OmnipairView::UserPosition(kind))
    }
}

impl<B: ExecutionBackend> ViewSimulator for OmnipairViewClient<'_, B> {
    fn simulate_view(&self, query: &ViewQuery) -> HarnessResult<Vec<String>> {
        let view = OmnipairView::from_query(query)?;
        let instruction = self.instruction(&view)?;
        let tx = Transaction::new_with_payer(&[instruction], Some(&self.payer));
        self.connection.simulate_for_logs(tx)
    }
}
