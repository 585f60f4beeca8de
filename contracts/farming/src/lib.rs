pub mod allocation;
pub mod bank;
pub mod contract;
pub mod epoch;
pub mod error;
pub mod genesis;
pub mod invariants;
pub mod msg;
pub mod plan;
pub mod proposal;
pub mod query;
pub mod reward;
pub mod staking;
pub mod state;

pub use crate::error::ContractError;
