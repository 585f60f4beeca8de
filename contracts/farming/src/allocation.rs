use cosmwasm_std::{Api, Coin, Event, Order, StdResult, Storage, Timestamp, Uint128};
use farming_common::coins;

use crate::bank::{self, Account};
use crate::error::ContractError;
use crate::state::{
    add_reward, save_plan, staking_ids_by_denom, Plan, Staking, PLANS, STAKINGS,
    UNDISTRIBUTED_REWARDS,
};

/// Distribute one epoch of rewards from every active plan.
///
/// Plans run in ascending id order. Each plan moves its disbursable amount
/// from the farming pool into the rewards reserve, splits it across its
/// staking coin weights, and credits farmers pro rata to their staked coins.
/// Queued coins earn nothing. Truncation remainders stay in the reserve and
/// are tallied in `UNDISTRIBUTED_REWARDS`.
pub fn allocate_rewards(
    storage: &mut dyn Storage,
    api: &dyn Api,
    now: Timestamp,
) -> Result<Vec<Event>, ContractError> {
    let active: Vec<Plan> = PLANS
        .range(storage, None, None, Order::Ascending)
        .filter_map(|item| match item {
            Ok((_, plan)) if plan.is_active(now) => Some(Ok(plan)),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
        .collect::<StdResult<_>>()?;

    let mut events = vec![];
    for plan in active {
        if let Some(event) = allocate_plan(storage, api, plan, now)? {
            events.push(event);
        }
    }
    Ok(events)
}

fn allocate_plan(
    storage: &mut dyn Storage,
    api: &dyn Api,
    mut plan: Plan,
    now: Timestamp,
) -> Result<Option<Event>, ContractError> {
    let pool = Account::FarmingPool(plan.farming_pool_address.clone());
    let balance = bank::balance_of(storage, &pool)?;
    let disbursable = plan.kind.epoch_allocation(&balance)?;
    if disbursable.is_empty() {
        return Ok(None);
    }
    if !coins::is_all_gte(&balance, &disbursable) {
        api.debug(&format!(
            "farming: skipping plan {}, pool {} holds {} but needs {}",
            plan.id,
            plan.farming_pool_address,
            coins::display(&balance),
            coins::display(&disbursable)
        ));
        return Ok(Some(
            Event::new("farming_allocation_skipped")
                .add_attribute("plan_id", plan.id.to_string())
                .add_attribute("farming_pool_address", plan.farming_pool_address.to_string())
                .add_attribute("needed", coins::display(&disbursable))
                .add_attribute("available", coins::display(&balance)),
        ));
    }

    bank::send(storage, &pool, &Account::RewardsReserve, &disbursable)?;

    let mut allocated: Vec<Coin> = vec![];
    for weight in &plan.staking_coin_weights {
        let share = coins::mul_dec_floor(&disbursable, weight.weight)?;
        if share.is_empty() {
            continue;
        }
        let stakers = staked_of(storage, &weight.denom)?;
        let total = stakers
            .iter()
            .fold(Uint128::zero(), |acc, (_, amount)| acc + *amount);
        if total.is_zero() {
            continue;
        }
        for (staking, staked) in &stakers {
            let increment = coins::mul_ratio_floor(&share, *staked, total)?;
            add_reward(storage, &weight.denom, &staking.farmer, &increment)?;
            allocated = coins::add(&allocated, &increment)?;
        }
    }

    let remainder = coins::checked_sub(&disbursable, &allocated).ok_or_else(|| {
        ContractError::InvalidCoins {
            reason: format!(
                "plan {} allocated {} out of {}",
                plan.id,
                coins::display(&allocated),
                coins::display(&disbursable)
            ),
        }
    })?;
    if !remainder.is_empty() {
        let undistributed = UNDISTRIBUTED_REWARDS.may_load(storage)?.unwrap_or_default();
        UNDISTRIBUTED_REWARDS.save(storage, &coins::add(&undistributed, &remainder)?)?;
    }

    plan.last_distribution_time = Some(now);
    plan.distributed_coins = coins::add(&plan.distributed_coins, &disbursable)?;
    save_plan(storage, &plan)?;

    Ok(Some(
        Event::new("farming_rewards_allocated")
            .add_attribute("plan_id", plan.id.to_string())
            .add_attribute("farming_pool_address", plan.farming_pool_address.to_string())
            .add_attribute("amount", coins::display(&disbursable))
            .add_attribute("undistributed", coins::display(&remainder)),
    ))
}

/// Stakings with a positive staked amount of `denom`.
fn staked_of(
    storage: &dyn Storage,
    denom: &str,
) -> StdResult<Vec<(Staking, Uint128)>> {
    let mut out = vec![];
    for id in staking_ids_by_denom(storage, denom)? {
        let staking = STAKINGS.load(storage, id)?;
        let staked = coins::amount_of(&staking.staked_coins, denom);
        if !staked.is_zero() {
            out.push((staking, staked));
        }
    }
    Ok(out)
}
