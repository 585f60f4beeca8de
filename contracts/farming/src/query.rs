use cosmwasm_std::{to_json_binary, Binary, Coin, Deps, Order, StdResult, Uint128};
use cw_storage_plus::Bound;
use farming_common::{coins, PlanType};

use crate::bank::{self, Account};
use crate::genesis::export_genesis;
use crate::invariants::check_invariants;
use crate::msg::{
    FarmingPoolResponse, InvariantsResponse, RewardEntry, RewardsResponse, ReservesResponse,
    TotalStakedResponse,
};
use crate::plan::plan_ids_by_farming_pool;
use crate::state::{
    reward_denoms_of, staking_by_farmer, Plan, Staking, EPOCH_STATE, PARAMS, PLANS, REWARDS,
    STAKINGS, STAKINGS_BY_DENOM, UNDISTRIBUTED_REWARDS,
};

const DEFAULT_LIMIT: u32 = 30;
const MAX_LIMIT: u32 = 100;

pub fn query_params(deps: Deps) -> StdResult<Binary> {
    to_json_binary(&PARAMS.load(deps.storage)?)
}

pub fn query_plan(deps: Deps, plan_id: u64) -> StdResult<Binary> {
    to_json_binary(&PLANS.load(deps.storage, plan_id)?)
}

pub fn query_plans(
    deps: Deps,
    plan_type: Option<PlanType>,
    farming_pool_address: Option<String>,
    terminated: Option<bool>,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let farming_pool = farming_pool_address
        .map(|addr| deps.api.addr_validate(&addr))
        .transpose()?;
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);

    let plans: Vec<Plan> = PLANS
        .range(deps.storage, start, None, Order::Ascending)
        .filter_map(|r| r.ok())
        .map(|(_, plan)| plan)
        .filter(|plan| plan_type.map_or(true, |t| plan.plan_type == t))
        .filter(|plan| {
            farming_pool
                .as_ref()
                .map_or(true, |pool| &plan.farming_pool_address == pool)
        })
        .filter(|plan| terminated.map_or(true, |t| plan.terminated == t))
        .take(limit)
        .collect();

    to_json_binary(&plans)
}

pub fn query_staking(deps: Deps, farmer: String) -> StdResult<Binary> {
    let farmer = deps.api.addr_validate(&farmer)?;
    to_json_binary(&staking_by_farmer(deps.storage, &farmer)?)
}

pub fn query_stakings(
    deps: Deps,
    staking_coin_denom: Option<String>,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);

    let stakings: Vec<Staking> = match staking_coin_denom {
        Some(denom) => STAKINGS_BY_DENOM
            .prefix(denom.as_str())
            .keys(deps.storage, start, None, Order::Ascending)
            .take(limit)
            .filter_map(|r| r.ok())
            .filter_map(|id| STAKINGS.may_load(deps.storage, id).ok().flatten())
            .collect(),
        None => STAKINGS
            .range(deps.storage, start, None, Order::Ascending)
            .take(limit)
            .filter_map(|r| r.ok())
            .map(|(_, staking)| staking)
            .collect(),
    };

    to_json_binary(&stakings)
}

pub fn query_total_staked(deps: Deps, staking_coin_denom: String) -> StdResult<Binary> {
    let mut queued_amount = Uint128::zero();
    let mut staked_amount = Uint128::zero();
    for id in STAKINGS_BY_DENOM
        .prefix(staking_coin_denom.as_str())
        .keys(deps.storage, None, None, Order::Ascending)
    {
        let staking = STAKINGS.load(deps.storage, id?)?;
        queued_amount += coins::amount_of(&staking.queued_coins, &staking_coin_denom);
        staked_amount += coins::amount_of(&staking.staked_coins, &staking_coin_denom);
    }

    to_json_binary(&TotalStakedResponse {
        staking_coin_denom,
        queued_amount,
        staked_amount,
    })
}

pub fn query_rewards(
    deps: Deps,
    farmer: String,
    staking_coin_denom: Option<String>,
) -> StdResult<Binary> {
    let addr = deps.api.addr_validate(&farmer)?;
    let denoms = match staking_coin_denom {
        Some(denom) => vec![denom],
        None => reward_denoms_of(deps.storage, &addr)?,
    };

    let mut rewards = vec![];
    let mut total: Vec<Coin> = vec![];
    for denom in denoms {
        if let Some(amount) = REWARDS.may_load(deps.storage, (denom.as_str(), &addr))? {
            total = coins::add(&total, &amount)?;
            rewards.push(RewardEntry {
                staking_coin_denom: denom,
                rewards: amount,
            });
        }
    }

    to_json_binary(&RewardsResponse {
        farmer,
        rewards,
        total,
    })
}

pub fn query_epoch_state(deps: Deps) -> StdResult<Binary> {
    to_json_binary(&EPOCH_STATE.load(deps.storage)?)
}

pub fn query_reserves(deps: Deps) -> StdResult<Binary> {
    to_json_binary(&ReservesResponse {
        staking_reserve: bank::balance_of(deps.storage, &Account::StakingReserve)?,
        rewards_reserve: bank::balance_of(deps.storage, &Account::RewardsReserve)?,
        fee_collector: bank::balance_of(deps.storage, &Account::FeeCollector)?,
        undistributed_rewards: UNDISTRIBUTED_REWARDS
            .may_load(deps.storage)?
            .unwrap_or_default(),
    })
}

pub fn query_farming_pool(deps: Deps, address: String) -> StdResult<Binary> {
    let addr = deps.api.addr_validate(&address)?;
    let balance = bank::balance_of(deps.storage, &Account::FarmingPool(addr.clone()))?;
    let plan_ids = plan_ids_by_farming_pool(deps.storage, &addr)?;
    to_json_binary(&FarmingPoolResponse {
        address,
        balance,
        plan_ids,
    })
}

pub fn query_invariants(deps: Deps) -> StdResult<Binary> {
    to_json_binary(&InvariantsResponse {
        broken: check_invariants(deps.storage)?,
    })
}

pub fn query_export_genesis(deps: Deps) -> StdResult<Binary> {
    to_json_binary(&export_genesis(deps.storage)?)
}
