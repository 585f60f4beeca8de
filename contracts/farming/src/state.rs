use std::collections::BTreeSet;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Coin, Empty, Order, StdResult, Storage, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};
use farming_common::{coins, is_valid_denom, PlanKind, PlanType, StakingCoinWeight};

use crate::error::ContractError;

/// Upper bound on `Params::next_epoch_days`.
pub const MAX_EPOCH_DAYS: u32 = 365;

pub const PARAMS: Item<Params> = Item::new("params");
pub const EPOCH_STATE: Item<EpochState> = Item::new("epoch_state");
pub const LAST_PLAN_ID: Item<u64> = Item::new("last_plan_id");
pub const LAST_STAKING_ID: Item<u64> = Item::new("last_staking_id");
/// Private plans that are not terminated yet.
pub const NUM_PRIVATE_PLANS: Item<u32> = Item::new("num_private_plans");
/// Truncation dust and orphaned shares kept in the rewards reserve.
pub const UNDISTRIBUTED_REWARDS: Item<Vec<Coin>> = Item::new("undistributed");

pub const PLANS: Map<u64, Plan> = Map::new("plans");
pub const PLAN_ID_BY_NAME: Map<&str, u64> = Map::new("plan_by_name");
pub const PLANS_BY_FARMING_POOL: Map<(&Addr, u64), Empty> = Map::new("plans_by_pool");

pub const STAKINGS: Map<u64, Staking> = Map::new("stakings");
pub const STAKING_ID_BY_FARMER: Map<&Addr, u64> = Map::new("staking_by_farmer");
pub const STAKINGS_BY_DENOM: Map<(&str, u64), Empty> = Map::new("stakings_by_denom");

/// (staking coin denom, farmer) -> accrued reward coins
pub const REWARDS: Map<(&str, &Addr), Vec<Coin>> = Map::new("rewards");
pub const REWARDS_BY_FARMER: Map<(&Addr, &str), Empty> = Map::new("rewards_by_farmer");

/// (account key, denom) -> balance, see `bank::Account`
pub const BALANCES: Map<(&str, &str), Uint128> = Map::new("balances");

#[cw_serde]
pub struct Params {
    /// Charged to private plan creators, escrowed and refunded on removal.
    pub private_plan_creation_fee: Vec<Coin>,
    /// Charged once when a farmer opens a staking record.
    pub staking_creation_fee: Vec<Coin>,
    pub next_epoch_days: u32,
    pub max_num_private_plans: u32,
    /// Receives staking creation fees.
    pub fee_collector: Addr,
}

impl Params {
    pub fn validate(&self) -> Result<(), ContractError> {
        validate_fee(&self.private_plan_creation_fee, "private_plan_creation_fee")?;
        validate_fee(&self.staking_creation_fee, "staking_creation_fee")?;
        if self.next_epoch_days == 0 {
            return Err(ContractError::InvalidParams {
                reason: "next_epoch_days must be positive".to_string(),
            });
        }
        if self.next_epoch_days > MAX_EPOCH_DAYS {
            return Err(ContractError::InvalidParams {
                reason: format!("next_epoch_days must not exceed {MAX_EPOCH_DAYS}"),
            });
        }
        Ok(())
    }
}

fn validate_fee(fee: &[Coin], field: &str) -> Result<(), ContractError> {
    if let Some(denom) = coins::find_duplicate_denom(fee) {
        return Err(ContractError::InvalidParams {
            reason: format!("{field} has duplicate denom {denom}"),
        });
    }
    for c in fee {
        if !is_valid_denom(&c.denom) {
            return Err(ContractError::InvalidParams {
                reason: format!("{field} has invalid denom {}", c.denom),
            });
        }
    }
    Ok(())
}

#[cw_serde]
pub struct Plan {
    pub id: u64,
    pub name: String,
    pub plan_type: PlanType,
    pub kind: PlanKind,
    pub farming_pool_address: Addr,
    pub termination_address: Addr,
    pub staking_coin_weights: Vec<StakingCoinWeight>,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub terminated: bool,
    /// Fee paid at creation (private plans only), refunded on removal.
    pub creation_fee: Vec<Coin>,
    pub last_distribution_time: Option<Timestamp>,
    /// Cumulative coins moved out of the farming pool by this plan.
    pub distributed_coins: Vec<Coin>,
}

impl Plan {
    /// Running window `[start_time, end_time)` and not terminated.
    pub fn is_active(&self, now: Timestamp) -> bool {
        !self.terminated && self.start_time <= now && now < self.end_time
    }
}

#[cw_serde]
pub struct Staking {
    pub id: u64,
    pub farmer: Addr,
    /// Deposited during the current epoch, not yet eligible for rewards.
    pub queued_coins: Vec<Coin>,
    pub staked_coins: Vec<Coin>,
}

impl Staking {
    pub fn is_empty(&self) -> bool {
        coins::is_zero(&self.queued_coins) && coins::is_zero(&self.staked_coins)
    }

    /// Every denom present in either the queued or the staked coins.
    pub fn denoms(&self) -> BTreeSet<String> {
        self.queued_coins
            .iter()
            .chain(self.staked_coins.iter())
            .filter(|c| !c.amount.is_zero())
            .map(|c| c.denom.clone())
            .collect()
    }
}

#[cw_serde]
pub struct EpochState {
    /// Unset until the first tick after instantiation.
    pub epoch_end_time: Option<Timestamp>,
    pub current_epoch_days: u32,
    pub current_epoch: u64,
    pub last_epoch_time: Option<Timestamp>,
}

pub fn next_plan_id(storage: &mut dyn Storage) -> StdResult<u64> {
    let id = LAST_PLAN_ID.may_load(storage)?.unwrap_or_default() + 1;
    LAST_PLAN_ID.save(storage, &id)?;
    Ok(id)
}

pub fn next_staking_id(storage: &mut dyn Storage) -> StdResult<u64> {
    let id = LAST_STAKING_ID.may_load(storage)?.unwrap_or_default() + 1;
    LAST_STAKING_ID.save(storage, &id)?;
    Ok(id)
}

// ── Plans ──

/// Store a plan and rewrite its name and farming pool index entries.
pub fn save_plan(storage: &mut dyn Storage, plan: &Plan) -> StdResult<()> {
    if let Some(old) = PLANS.may_load(storage, plan.id)? {
        remove_plan_indexes(storage, &old);
    }
    PLANS.save(storage, plan.id, plan)?;
    PLAN_ID_BY_NAME.save(storage, &plan.name, &plan.id)?;
    PLANS_BY_FARMING_POOL.save(storage, (&plan.farming_pool_address, plan.id), &Empty {})
}

pub fn delete_plan(storage: &mut dyn Storage, plan: &Plan) {
    remove_plan_indexes(storage, plan);
    PLANS.remove(storage, plan.id);
}

fn remove_plan_indexes(storage: &mut dyn Storage, plan: &Plan) {
    PLAN_ID_BY_NAME.remove(storage, &plan.name);
    PLANS_BY_FARMING_POOL.remove(storage, (&plan.farming_pool_address, plan.id));
}

pub fn load_plan(storage: &dyn Storage, plan_id: u64) -> Result<Plan, ContractError> {
    PLANS
        .may_load(storage, plan_id)?
        .ok_or(ContractError::PlanNotFound { plan_id })
}

pub fn all_plans(storage: &dyn Storage) -> StdResult<Vec<Plan>> {
    PLANS
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, plan)| plan))
        .collect()
}

// ── Stakings ──

/// Store a staking record and keep the farmer and denom indexes in sync.
pub fn save_staking(storage: &mut dyn Storage, staking: &Staking) -> StdResult<()> {
    if let Some(old) = STAKINGS.may_load(storage, staking.id)? {
        for denom in old.denoms() {
            STAKINGS_BY_DENOM.remove(storage, (denom.as_str(), old.id));
        }
    }
    STAKINGS.save(storage, staking.id, staking)?;
    STAKING_ID_BY_FARMER.save(storage, &staking.farmer, &staking.id)?;
    for denom in staking.denoms() {
        STAKINGS_BY_DENOM.save(storage, (denom.as_str(), staking.id), &Empty {})?;
    }
    Ok(())
}

pub fn delete_staking(storage: &mut dyn Storage, staking: &Staking) -> StdResult<()> {
    if let Some(old) = STAKINGS.may_load(storage, staking.id)? {
        for denom in old.denoms() {
            STAKINGS_BY_DENOM.remove(storage, (denom.as_str(), old.id));
        }
    }
    STAKINGS.remove(storage, staking.id);
    STAKING_ID_BY_FARMER.remove(storage, &staking.farmer);
    Ok(())
}

pub fn staking_by_farmer(storage: &dyn Storage, farmer: &Addr) -> StdResult<Option<Staking>> {
    match STAKING_ID_BY_FARMER.may_load(storage, farmer)? {
        Some(id) => STAKINGS.may_load(storage, id),
        None => Ok(None),
    }
}

pub fn all_stakings(storage: &dyn Storage) -> StdResult<Vec<Staking>> {
    STAKINGS
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, staking)| staking))
        .collect()
}

/// Stakings holding `denom` in either coin set, ascending by id.
pub fn staking_ids_by_denom(storage: &dyn Storage, denom: &str) -> StdResult<Vec<u64>> {
    STAKINGS_BY_DENOM
        .prefix(denom)
        .keys(storage, None, None, Order::Ascending)
        .collect()
}

// ── Rewards ──

pub fn add_reward(
    storage: &mut dyn Storage,
    denom: &str,
    farmer: &Addr,
    amount: &[Coin],
) -> StdResult<()> {
    if coins::is_zero(amount) {
        return Ok(());
    }
    let current = REWARDS.may_load(storage, (denom, farmer))?.unwrap_or_default();
    REWARDS.save(storage, (denom, farmer), &coins::add(&current, amount)?)?;
    REWARDS_BY_FARMER.save(storage, (farmer, denom), &Empty {})
}

pub fn remove_reward(storage: &mut dyn Storage, denom: &str, farmer: &Addr) {
    REWARDS.remove(storage, (denom, farmer));
    REWARDS_BY_FARMER.remove(storage, (farmer, denom));
}

/// Staking coin denoms the farmer has rewards for.
pub fn reward_denoms_of(storage: &dyn Storage, farmer: &Addr) -> StdResult<Vec<String>> {
    REWARDS_BY_FARMER
        .prefix(farmer)
        .keys(storage, None, None, Order::Ascending)
        .collect()
}

pub fn has_rewards(storage: &dyn Storage, farmer: &Addr) -> bool {
    REWARDS_BY_FARMER
        .prefix(farmer)
        .keys_raw(storage, None, None, Order::Ascending)
        .next()
        .is_some()
}
