use std::collections::BTreeSet;

use cosmwasm_std::{
    Addr, Api, CanonicalAddr, Coin, Decimal, DepsMut, Event, MessageInfo, Order, Response,
    StdResult, Storage, Timestamp,
};
use farming_common::types::total_weight;
use farming_common::{coins, is_valid_denom, PlanKind, PlanType, StakingCoinWeight};
use sha2::{Digest, Sha256};

use crate::bank::{self, Account, AttachedFunds};
use crate::error::ContractError;
use crate::state::{
    delete_plan, load_plan, next_plan_id, save_plan, Plan, NUM_PRIVATE_PLANS, PARAMS,
    PLANS, PLANS_BY_FARMING_POOL, PLAN_ID_BY_NAME,
};

pub const MAX_NAME_LENGTH: usize = 140;

// ── Validation ──

pub fn validate_name(name: &str) -> Result<(), ContractError> {
    if name.trim().is_empty() {
        return Err(ContractError::InvalidPlanName {
            reason: "name must not be empty".to_string(),
        });
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(ContractError::InvalidPlanName {
            reason: format!("name is longer than {MAX_NAME_LENGTH} bytes"),
        });
    }
    if name.chars().any(char::is_control) {
        return Err(ContractError::InvalidPlanName {
            reason: "name contains control characters".to_string(),
        });
    }
    Ok(())
}

pub fn validate_staking_coin_weights(weights: &[StakingCoinWeight]) -> Result<(), ContractError> {
    if weights.is_empty() {
        return Err(ContractError::InvalidStakingCoinWeights {
            reason: "staking coin weights must not be empty".to_string(),
        });
    }
    let mut seen = BTreeSet::new();
    for w in weights {
        if !is_valid_denom(&w.denom) {
            return Err(ContractError::InvalidDenom {
                denom: w.denom.clone(),
            });
        }
        if !seen.insert(w.denom.as_str()) {
            return Err(ContractError::DuplicateDenom {
                denom: w.denom.clone(),
            });
        }
        if w.weight.is_zero() || w.weight > Decimal::one() {
            return Err(ContractError::InvalidStakingCoinWeights {
                reason: format!("weight of {} must be in (0, 1], got {}", w.denom, w.weight),
            });
        }
    }
    let total = total_weight(weights)?;
    if total > Decimal::one() {
        return Err(ContractError::InvalidStakingCoinWeights {
            reason: format!("total weight {total} exceeds 1"),
        });
    }
    Ok(())
}

/// A user-supplied coin list: non-empty, positive, valid and unique denoms.
pub fn validate_coins(amount: &[Coin]) -> Result<(), ContractError> {
    if amount.is_empty() {
        return Err(ContractError::InvalidCoins {
            reason: "no coins given".to_string(),
        });
    }
    if let Some(denom) = coins::find_duplicate_denom(amount) {
        return Err(ContractError::DuplicateDenom {
            denom: denom.to_string(),
        });
    }
    for c in amount {
        if !is_valid_denom(&c.denom) {
            return Err(ContractError::InvalidDenom {
                denom: c.denom.clone(),
            });
        }
        if c.amount.is_zero() {
            return Err(ContractError::InvalidCoins {
                reason: format!("amount of {} must be positive", c.denom),
            });
        }
    }
    Ok(())
}

pub fn validate_kind(kind: &PlanKind) -> Result<(), ContractError> {
    match kind {
        PlanKind::FixedAmount { epoch_amount } => {
            validate_coins(epoch_amount).map_err(|e| ContractError::InvalidEpochAmount {
                reason: e.to_string(),
            })
        }
        PlanKind::Ratio { epoch_ratio } => {
            if epoch_ratio.is_zero() || *epoch_ratio > Decimal::one() {
                return Err(ContractError::InvalidEpochRatio {
                    ratio: epoch_ratio.to_string(),
                });
            }
            Ok(())
        }
    }
}

/// Stateless checks on a plan's own fields.
pub fn validate_plan(plan: &Plan) -> Result<(), ContractError> {
    validate_name(&plan.name)?;
    validate_staking_coin_weights(&plan.staking_coin_weights)?;
    if plan.start_time >= plan.end_time {
        return Err(ContractError::InvalidPlanTimes {
            start_time: plan.start_time,
            end_time: plan.end_time,
        });
    }
    validate_kind(&plan.kind)
}

/// Fails when `name` belongs to a plan other than `except`.
pub fn ensure_unique_name(
    storage: &dyn Storage,
    name: &str,
    except: Option<u64>,
) -> Result<(), ContractError> {
    match PLAN_ID_BY_NAME.may_load(storage, name)? {
        Some(id) if Some(id) != except => Err(ContractError::DuplicatePlanName {
            name: name.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Plan ids funded by `farming_pool`, ascending.
pub fn plan_ids_by_farming_pool(storage: &dyn Storage, farming_pool: &Addr) -> StdResult<Vec<u64>> {
    PLANS_BY_FARMING_POOL
        .prefix(farming_pool)
        .keys(storage, None, None, Order::Ascending)
        .collect()
}

/// Live ratio plans sharing a farming pool may not claim more than the
/// whole pool per epoch.
pub fn ensure_total_epoch_ratio(
    storage: &dyn Storage,
    farming_pool: &Addr,
) -> Result<(), ContractError> {
    let mut total = Decimal::zero();
    for id in plan_ids_by_farming_pool(storage, farming_pool)? {
        let plan = PLANS.load(storage, id)?;
        if plan.terminated {
            continue;
        }
        if let Some(ratio) = plan.kind.epoch_ratio() {
            total = total.checked_add(ratio)?;
        }
    }
    if total > Decimal::one() {
        return Err(ContractError::InvalidTotalEpochRatio {
            farming_pool: farming_pool.to_string(),
        });
    }
    Ok(())
}

/// Deterministic farming pool of a private plan. Nobody holds its key, so
/// its balance only leaves through allocation or plan removal.
pub fn private_plan_farming_pool(api: &dyn Api, plan_id: u64, name: &str) -> StdResult<Addr> {
    let hash = Sha256::digest(format!("farming/PrivatePlan/{plan_id}/{name}").as_bytes());
    api.addr_humanize(&CanonicalAddr::from(hash.as_slice()))
}

// ── Private plans ──

pub fn create_private_plan(
    deps: DepsMut,
    info: MessageInfo,
    name: String,
    staking_coin_weights: Vec<StakingCoinWeight>,
    start_time: Timestamp,
    end_time: Timestamp,
    kind: PlanKind,
) -> Result<Response, ContractError> {
    let params = PARAMS.load(deps.storage)?;
    let live_private = NUM_PRIVATE_PLANS.may_load(deps.storage)?.unwrap_or_default();
    if live_private >= params.max_num_private_plans {
        return Err(ContractError::PrivatePlanLimitExceeded {
            limit: params.max_num_private_plans,
        });
    }

    let plan_id = next_plan_id(deps.storage)?;
    let farming_pool_address = private_plan_farming_pool(deps.api, plan_id, &name)?;
    let creation_fee = coins::normalize(&params.private_plan_creation_fee)?;

    let plan = Plan {
        id: plan_id,
        name,
        plan_type: PlanType::Private,
        kind,
        farming_pool_address,
        termination_address: info.sender.clone(),
        staking_coin_weights,
        start_time,
        end_time,
        terminated: false,
        creation_fee: creation_fee.clone(),
        last_distribution_time: None,
        distributed_coins: vec![],
    };
    validate_plan(&plan)?;
    ensure_unique_name(deps.storage, &plan.name, None)?;

    let mut funds = AttachedFunds::new(&info.funds)?;
    funds.take(&creation_fee)?;
    bank::credit(deps.storage, &Account::FeeCollector, &creation_fee)?;

    save_plan(deps.storage, &plan)?;
    ensure_total_epoch_ratio(deps.storage, &plan.farming_pool_address)?;
    NUM_PRIVATE_PLANS.save(deps.storage, &(live_private + 1))?;

    let action = format!("create_{}_plan", plan.kind.as_str());
    let mut event = Event::new(format!("farming_{action}"))
        .add_attribute("plan_id", plan_id.to_string())
        .add_attribute("name", plan.name.clone())
        .add_attribute("farming_pool_address", plan.farming_pool_address.to_string())
        .add_attribute("start_time", plan.start_time.to_string())
        .add_attribute("end_time", plan.end_time.to_string());
    event = match &plan.kind {
        PlanKind::FixedAmount { epoch_amount } => {
            event.add_attribute("epoch_amount", coins::display(epoch_amount))
        }
        PlanKind::Ratio { epoch_ratio } => event.add_attribute("epoch_ratio", epoch_ratio.to_string()),
    };

    let mut response = Response::new()
        .add_attribute("action", action)
        .add_attribute("creator", info.sender.to_string())
        .add_attribute("plan_id", plan_id.to_string())
        .add_attribute("farming_pool_address", plan.farming_pool_address.to_string())
        .add_event(event);
    if let Some(refund) = funds.refund(&info.sender) {
        response = response.add_message(refund);
    }
    Ok(response)
}

/// Mark a plan terminated. Private plans free a slot in the live count.
pub fn terminate_plan(storage: &mut dyn Storage, plan: &mut Plan) -> Result<Event, ContractError> {
    plan.terminated = true;
    save_plan(storage, plan)?;
    if plan.plan_type == PlanType::Private {
        let live = NUM_PRIVATE_PLANS.may_load(storage)?.unwrap_or_default();
        NUM_PRIVATE_PLANS.save(storage, &live.saturating_sub(1))?;
    }
    Ok(Event::new("farming_plan_terminated")
        .add_attribute("plan_id", plan.id.to_string())
        .add_attribute("plan_type", plan.plan_type.to_string()))
}

/// Terminate every live plan whose end time has passed.
pub fn terminate_ended_plans(storage: &mut dyn Storage, now: Timestamp) -> Result<Vec<Event>, ContractError> {
    let ended: Vec<Plan> = PLANS
        .range(storage, None, None, Order::Ascending)
        .filter_map(|item| match item {
            Ok((_, plan)) if !plan.terminated && now > plan.end_time => Some(Ok(plan)),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
        .collect::<StdResult<_>>()?;

    let mut events = Vec::with_capacity(ended.len());
    for mut plan in ended {
        events.push(terminate_plan(storage, &mut plan)?);
    }
    Ok(events)
}

pub fn remove_plan(deps: DepsMut, info: MessageInfo, plan_id: u64) -> Result<Response, ContractError> {
    let plan = load_plan(deps.storage, plan_id)?;
    if !plan.terminated {
        return Err(ContractError::PlanNotTerminated { plan_id });
    }
    if info.sender != plan.termination_address {
        return Err(ContractError::Unauthorized {
            reason: "only the termination address can remove a plan".to_string(),
        });
    }
    if plan.plan_type != PlanType::Private {
        return Err(ContractError::InvalidPlanType {
            plan_id,
            expected: PlanType::Private.to_string(),
        });
    }

    let pool = Account::FarmingPool(plan.farming_pool_address.clone());
    let residual = bank::balance_of(deps.storage, &pool)?;
    let sweep = bank::withdraw(deps.storage, &pool, &plan.termination_address, &residual)?;
    let refund = bank::withdraw(
        deps.storage,
        &Account::FeeCollector,
        &plan.termination_address,
        &plan.creation_fee,
    )?;
    delete_plan(deps.storage, &plan);

    let mut response = Response::new()
        .add_attribute("action", "remove_plan")
        .add_attribute("plan_id", plan_id.to_string())
        .add_event(
            Event::new("farming_remove_plan")
                .add_attribute("plan_id", plan_id.to_string())
                .add_attribute("termination_address", plan.termination_address.to_string())
                .add_attribute("swept", coins::display(&residual))
                .add_attribute("refunded_fee", coins::display(&plan.creation_fee)),
        );
    if let Some(msg) = sweep {
        response = response.add_message(msg);
    }
    if let Some(msg) = refund {
        response = response.add_message(msg);
    }
    Ok(response)
}

// ── Farming pools ──

pub fn fund_farming_pool(
    deps: DepsMut,
    info: MessageInfo,
    farming_pool_address: String,
) -> Result<Response, ContractError> {
    let farming_pool = deps.api.addr_validate(&farming_pool_address)?;
    let funds = coins::normalize(&info.funds)?;
    validate_coins(&funds)?;
    bank::credit(deps.storage, &Account::FarmingPool(farming_pool.clone()), &funds)?;

    Ok(Response::new()
        .add_attribute("action", "fund_farming_pool")
        .add_attribute("farming_pool_address", farming_pool.to_string())
        .add_event(
            Event::new("farming_fund_farming_pool")
                .add_attribute("farming_pool_address", farming_pool.to_string())
                .add_attribute("funder", info.sender.to_string())
                .add_attribute("amount", coins::display(&funds)),
        ))
}

pub fn withdraw_farming_pool(
    deps: DepsMut,
    info: MessageInfo,
    amount: Vec<Coin>,
) -> Result<Response, ContractError> {
    validate_coins(&amount)?;
    let pool = Account::FarmingPool(info.sender.clone());
    let msg = bank::withdraw(deps.storage, &pool, &info.sender, &amount)?;

    let mut response = Response::new()
        .add_attribute("action", "withdraw_farming_pool")
        .add_attribute("farming_pool_address", info.sender.to_string())
        .add_event(
            Event::new("farming_withdraw_farming_pool")
                .add_attribute("farming_pool_address", info.sender.to_string())
                .add_attribute("amount", coins::display(&amount)),
        );
    if let Some(msg) = msg {
        response = response.add_message(msg);
    }
    Ok(response)
}
