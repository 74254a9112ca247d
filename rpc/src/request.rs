//! The closed set of JSON-RPC methods answered from local state.

use {
    omnipair_harness_error::error::{HarnessError, HarnessResult},
    serde_json::Value,
    trezoa_pubkey::Pubkey,
    trezoa_system_interface::MAX_PERMITTED_DATA_LENGTH,
    std::str::FromStr,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RpcRequest {
    GetAccountInfo { address: Pubkey },
    GetBalance { address: Pubkey },
    GetMinimumBalanceForRentExemption { data_len: usize },
    GetLatestBlockhash,
}

impl RpcRequest {
    /// Parse a method name and its positional params. Any method outside the
    /// supported set is an `UnsupportedRpcMethod` error.
    pub fn parse(method: &str, params: &Value) -> HarnessResult<Self> {
        match method {
            "getAccountInfo" => Ok(Self::GetAccountInfo {
                address: address_param(method, params)?,
            }),
            "getBalance" => Ok(Self::GetBalance {
                address: address_param(method, params)?,
            }),
            "getMinimumBalanceForRentExemption" => {
                let data_len = first_param(method, params)?
                    .as_u64()
                    .ok_or_else(|| invalid(method, "expected a data length"))?;
                Ok(Self::GetMinimumBalanceForRentExemption {
                    data_len: rent_data_len(data_len)?,
                })
            }
            "getLatestBlockhash" => Ok(Self::GetLatestBlockhash),
            _ => Err(HarnessError::UnsupportedRpcMethod(method.to_string())),
        }
    }

    pub const fn method(&self) -> &'static str {
        match self {
            Self::GetAccountInfo { .. } => "getAccountInfo",
            Self::GetBalance { .. } => "getBalance",
            Self::GetMinimumBalanceForRentExemption { .. } => "getMinimumBalanceForRentExemption",
            Self::GetLatestBlockhash => "getLatestBlockhash",
        }
    }
}

/// Validate the data length of a rent-exemption query. Lengths past the
/// largest account the runtime allows are refused instead of overflowing the
/// rent computation.
pub(crate) fn rent_data_len(data_len: u64) -> HarnessResult<usize> {
    const METHOD: &str = "getMinimumBalanceForRentExemption";
    if data_len > MAX_PERMITTED_DATA_LENGTH {
        return Err(invalid(
            METHOD,
            &format!("data length {data_len} exceeds {MAX_PERMITTED_DATA_LENGTH}"),
        ));
    }
    usize::try_from(data_len).map_err(|_| invalid(METHOD, "data length does not fit in usize"))
}

fn invalid(method: &str, reason: &str) -> HarnessError {
    HarnessError::InvalidParams {
        method: method.to_string(),
        reason: reason.to_string(),
    }
}

fn first_param<'a>(method: &str, params: &'a Value) -> HarnessResult<&'a Value> {
    match params {
        Value::Array(values) => values
            .first()
            .ok_or_else(|| invalid(method, "missing positional parameter")),
        _ => Err(invalid(method, "params must be an array")),
    }
}

fn address_param(method: &str, params: &Value) -> HarnessResult<Pubkey> {
    let address = first_param(method, params)?
        .as_str()
        .ok_or_else(|| invalid(method, "expected a base58 address"))?;
    Pubkey::from_str(address).map_err(|err| invalid(method, &err.to_string()))
}
