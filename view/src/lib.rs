//! View-call decoding.
//!
//! The Omnipair program answers read-only queries by writing
//! `"<label>: <value>"` lines to the program log instead of returning
//! structured data. A query is run as a non-committing simulation, and the
//! answer is scraped back out of the simulation logs and scaled to a human
//! unit. Callers only see `ViewResult`; the log grammar lives in `logs`.

pub mod decoder;
pub mod logs;
pub mod omnipair;
pub mod query;
pub mod scale;

pub use {
    decoder::{ViewArity, ViewDecoder, ViewResult, ViewSimulator, ViewValues},
    omnipair::{
        EmitValueArgs, OmnipairView, OmnipairViewClient, PairViewAccounts, PairViewKind,
        UserPositionViewAccounts, UserPositionViewKind,
    },
    query::ViewQuery,
    scale::{FormattedValue, OmnipairScaling, Scale, ScalingPolicy},
};
