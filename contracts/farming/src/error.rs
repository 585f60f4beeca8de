use cosmwasm_std::{OverflowError, StdError, Timestamp};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    // ── Validation ──
    #[error("invalid plan name: {reason}")]
    InvalidPlanName { reason: String },

    #[error("plan name '{name}' already exists")]
    DuplicatePlanName { name: String },

    #[error("plan start time {start_time} must be before end time {end_time}")]
    InvalidPlanTimes {
        start_time: Timestamp,
        end_time: Timestamp,
    },

    #[error("invalid staking coin weights: {reason}")]
    InvalidStakingCoinWeights { reason: String },

    #[error("invalid epoch amount: {reason}")]
    InvalidEpochAmount { reason: String },

    #[error("epoch ratio must be in (0, 1], got {ratio}")]
    InvalidEpochRatio { ratio: String },

    #[error("total epoch ratio of farming pool {farming_pool} exceeds 1")]
    InvalidTotalEpochRatio { farming_pool: String },

    #[error("invalid denom: {denom}")]
    InvalidDenom { denom: String },

    #[error("duplicate denom: {denom}")]
    DuplicateDenom { denom: String },

    #[error("invalid coins: {reason}")]
    InvalidCoins { reason: String },

    #[error("invalid proposal: {reason}")]
    InvalidProposal { reason: String },

    #[error("invalid params: {reason}")]
    InvalidParams { reason: String },

    #[error("plan {plan_id} is terminated")]
    PlanTerminated { plan_id: u64 },

    #[error("plan {plan_id} is not a {expected} plan")]
    InvalidPlanType { plan_id: u64, expected: String },

    #[error("invalid genesis: {reason}")]
    InvalidGenesis { reason: String },

    #[error("genesis funds mismatch: sent {sent}, declared {declared}")]
    GenesisFundsMismatch { sent: String, declared: String },

    // ── Funds ──
    #[error("insufficient funds in {account}: need {needed}, have {available}")]
    InsufficientFunds {
        account: String,
        needed: String,
        available: String,
    },

    #[error("insufficient staking of {denom}: requested {requested}, available {available}")]
    InsufficientStaking {
        denom: String,
        requested: String,
        available: String,
    },

    // ── Lookups ──
    #[error("plan {plan_id} not found")]
    PlanNotFound { plan_id: u64 },

    #[error("plan {plan_id} is not terminated yet")]
    PlanNotTerminated { plan_id: u64 },

    #[error("staking not found for {farmer}")]
    StakingNotFound { farmer: String },

    #[error("no reward for staking coin denom {denom}")]
    RewardNotFound { denom: String },

    #[error("private plan limit of {limit} live plans reached")]
    PrivatePlanLimitExceeded { limit: u32 },
}
