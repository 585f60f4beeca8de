use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Coin, Decimal, Timestamp, Uint128};
use farming_common::{PlanType, StakingCoinWeight};

use crate::genesis::GenesisState;
use crate::state::{EpochState, Params, Plan, Staking};

#[cw_serde]
pub struct InstantiateMsg {
    pub private_plan_creation_fee: Vec<Coin>,
    pub staking_creation_fee: Vec<Coin>,
    pub next_epoch_days: u32,
    pub max_num_private_plans: u32,
    pub fee_collector: String,
    /// Import a full state snapshot. Attached funds must cover every
    /// declared internal balance exactly.
    pub genesis: Option<GenesisState>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Create a private plan emitting `epoch_amount` every epoch.
    /// Attach the private plan creation fee.
    CreateFixedAmountPlan {
        name: String,
        staking_coin_weights: Vec<StakingCoinWeight>,
        start_time: Timestamp,
        end_time: Timestamp,
        epoch_amount: Vec<Coin>,
    },
    /// Create a private plan emitting `epoch_ratio` of its farming pool
    /// every epoch. Attach the private plan creation fee.
    CreateRatioPlan {
        name: String,
        staking_coin_weights: Vec<StakingCoinWeight>,
        start_time: Timestamp,
        end_time: Timestamp,
        epoch_ratio: Decimal,
    },
    /// Stake `amount` from the attached funds. The first stake also pays the
    /// staking creation fee.
    Stake { amount: Vec<Coin> },
    Unstake { amount: Vec<Coin> },
    Harvest { staking_coin_denoms: Vec<String> },
    /// Remove a terminated private plan. Termination address only.
    RemovePlan { plan_id: u64 },
    /// Credit the attached funds to a farming pool.
    FundFarmingPool { farming_pool_address: String },
    /// Withdraw from the sender's own farming pool balance.
    WithdrawFarmingPool { amount: Vec<Coin> },
    /// Block tick: terminate ended plans and settle the epoch when due.
    Advance {},
}

#[cw_serde]
pub enum SudoMsg {
    /// Governance batch, applied as adds, then modifies, then deletes.
    PublicPlanProposal {
        add_plan_requests: Vec<AddPlanRequest>,
        modify_plan_requests: Vec<ModifyPlanRequest>,
        delete_plan_requests: Vec<DeletePlanRequest>,
    },
    UpdateParams {
        private_plan_creation_fee: Option<Vec<Coin>>,
        staking_creation_fee: Option<Vec<Coin>>,
        next_epoch_days: Option<u32>,
        max_num_private_plans: Option<u32>,
        fee_collector: Option<String>,
    },
    Advance {},
}

/// Exactly one of `epoch_amount` and `epoch_ratio` must be set.
#[cw_serde]
pub struct AddPlanRequest {
    pub name: String,
    pub farming_pool_address: String,
    pub termination_address: String,
    pub staking_coin_weights: Vec<StakingCoinWeight>,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub epoch_amount: Option<Vec<Coin>>,
    pub epoch_ratio: Option<Decimal>,
}

/// Unset fields keep their current value. Setting `epoch_amount` or
/// `epoch_ratio` switches the plan to that kind.
#[cw_serde]
pub struct ModifyPlanRequest {
    pub plan_id: u64,
    pub name: Option<String>,
    pub farming_pool_address: Option<String>,
    pub termination_address: Option<String>,
    pub staking_coin_weights: Option<Vec<StakingCoinWeight>>,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub epoch_amount: Option<Vec<Coin>>,
    pub epoch_ratio: Option<Decimal>,
}

#[cw_serde]
pub struct DeletePlanRequest {
    pub plan_id: u64,
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(Params)]
    Params {},
    #[returns(Plan)]
    Plan { plan_id: u64 },
    #[returns(Vec<Plan>)]
    Plans {
        plan_type: Option<PlanType>,
        farming_pool_address: Option<String>,
        terminated: Option<bool>,
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(Option<Staking>)]
    Staking { farmer: String },
    #[returns(Vec<Staking>)]
    Stakings {
        staking_coin_denom: Option<String>,
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(TotalStakedResponse)]
    TotalStaked { staking_coin_denom: String },
    #[returns(RewardsResponse)]
    Rewards {
        farmer: String,
        staking_coin_denom: Option<String>,
    },
    #[returns(EpochState)]
    EpochState {},
    #[returns(ReservesResponse)]
    Reserves {},
    #[returns(FarmingPoolResponse)]
    FarmingPool { address: String },
    #[returns(InvariantsResponse)]
    Invariants {},
    #[returns(GenesisState)]
    ExportGenesis {},
}

#[cw_serde]
pub struct MigrateMsg {}

#[cw_serde]
pub struct TotalStakedResponse {
    pub staking_coin_denom: String,
    pub queued_amount: Uint128,
    pub staked_amount: Uint128,
}

#[cw_serde]
pub struct RewardEntry {
    pub staking_coin_denom: String,
    pub rewards: Vec<Coin>,
}

#[cw_serde]
pub struct RewardsResponse {
    pub farmer: String,
    pub rewards: Vec<RewardEntry>,
    /// Sum over all entries above.
    pub total: Vec<Coin>,
}

#[cw_serde]
pub struct ReservesResponse {
    pub staking_reserve: Vec<Coin>,
    pub rewards_reserve: Vec<Coin>,
    pub fee_collector: Vec<Coin>,
    pub undistributed_rewards: Vec<Coin>,
}

#[cw_serde]
pub struct FarmingPoolResponse {
    pub address: String,
    pub balance: Vec<Coin>,
    pub plan_ids: Vec<u64>,
}

#[cw_serde]
pub struct InvariantsResponse {
    pub broken: Vec<String>,
}
