use std::collections::BTreeSet;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Api, Coin, DepsMut, Order, StdResult, Storage};
use farming_common::{coins, PlanType};

use crate::bank::{self, Account};
use crate::error::ContractError;
use crate::invariants::assert_invariants;
use crate::plan::{ensure_total_epoch_ratio, validate_plan};
use crate::state::{
    add_reward, all_plans, all_stakings, save_plan, save_staking, EpochState, Plan, Staking,
    EPOCH_STATE, LAST_PLAN_ID, LAST_STAKING_ID, NUM_PRIVATE_PLANS, REWARDS,
    UNDISTRIBUTED_REWARDS,
};

/// Full snapshot of the farming state, used to seed a new instance.
#[cw_serde]
pub struct GenesisState {
    pub plans: Vec<Plan>,
    pub stakings: Vec<Staking>,
    pub rewards: Vec<RewardRecord>,
    pub farming_pool_balances: Vec<FarmingPoolBalance>,
    pub staking_reserve_coins: Vec<Coin>,
    pub rewards_reserve_coins: Vec<Coin>,
    pub fee_collector_coins: Vec<Coin>,
    pub undistributed_rewards: Vec<Coin>,
    pub epoch_state: EpochState,
    pub last_plan_id: u64,
    pub last_staking_id: u64,
}

#[cw_serde]
pub struct RewardRecord {
    pub farmer: Addr,
    pub staking_coin_denom: String,
    pub rewards: Vec<Coin>,
}

#[cw_serde]
pub struct FarmingPoolBalance {
    pub address: Addr,
    pub balance: Vec<Coin>,
}

fn invalid(reason: impl Into<String>) -> ContractError {
    ContractError::InvalidGenesis {
        reason: reason.into(),
    }
}

fn check_addr(api: &dyn Api, addr: &Addr) -> Result<(), ContractError> {
    let validated = api.addr_validate(addr.as_str())?;
    if &validated != addr {
        return Err(invalid(format!("address {addr} is not normalized")));
    }
    Ok(())
}

fn check_coins(amount: &[Coin], what: &str) -> Result<(), ContractError> {
    if coins::normalize(amount)? != amount {
        return Err(invalid(format!("{what} must be sorted, unique and non-zero")));
    }
    Ok(())
}

impl GenesisState {
    /// Stateless consistency checks.
    pub fn validate(&self, api: &dyn Api) -> Result<(), ContractError> {
        let mut last_id = 0u64;
        let mut names = BTreeSet::new();
        for plan in &self.plans {
            if plan.id <= last_id {
                return Err(invalid("plans must be sorted by strictly increasing id"));
            }
            last_id = plan.id;
            if plan.id > self.last_plan_id {
                return Err(invalid(format!("plan {} is above last_plan_id", plan.id)));
            }
            if !names.insert(plan.name.as_str()) {
                return Err(ContractError::DuplicatePlanName {
                    name: plan.name.clone(),
                });
            }
            validate_plan(plan)?;
            check_addr(api, &plan.farming_pool_address)?;
            check_addr(api, &plan.termination_address)?;
            check_coins(&plan.creation_fee, "plan creation fee")?;
            check_coins(&plan.distributed_coins, "plan distributed coins")?;
        }

        let mut ids = BTreeSet::new();
        let mut farmers = BTreeSet::new();
        for staking in &self.stakings {
            if !ids.insert(staking.id) {
                return Err(invalid(format!("duplicate staking id {}", staking.id)));
            }
            if staking.id == 0 || staking.id > self.last_staking_id {
                return Err(invalid(format!(
                    "staking id {} is outside 1..={}",
                    staking.id, self.last_staking_id
                )));
            }
            if !farmers.insert(staking.farmer.as_str()) {
                return Err(invalid(format!("farmer {} has two stakings", staking.farmer)));
            }
            check_addr(api, &staking.farmer)?;
            check_coins(&staking.queued_coins, "queued coins")?;
            check_coins(&staking.staked_coins, "staked coins")?;
        }

        let mut reward_keys = BTreeSet::new();
        for record in &self.rewards {
            if !reward_keys.insert((record.staking_coin_denom.as_str(), record.farmer.as_str())) {
                return Err(invalid(format!(
                    "duplicate reward for {} on {}",
                    record.farmer, record.staking_coin_denom
                )));
            }
            check_addr(api, &record.farmer)?;
            check_coins(&record.rewards, "rewards")?;
            if record.rewards.is_empty() {
                return Err(invalid("reward records must not be empty"));
            }
        }

        let mut pools = BTreeSet::new();
        for pool in &self.farming_pool_balances {
            if !pools.insert(pool.address.as_str()) {
                return Err(invalid(format!("duplicate farming pool {}", pool.address)));
            }
            check_addr(api, &pool.address)?;
            check_coins(&pool.balance, "farming pool balance")?;
        }

        check_coins(&self.staking_reserve_coins, "staking reserve")?;
        check_coins(&self.rewards_reserve_coins, "rewards reserve")?;
        check_coins(&self.fee_collector_coins, "fee collector")?;
        check_coins(&self.undistributed_rewards, "undistributed rewards")?;
        Ok(())
    }

    /// Sum of every internal balance the snapshot declares.
    pub fn declared_balances(&self) -> StdResult<Vec<Coin>> {
        let mut total = coins::add(&self.staking_reserve_coins, &self.rewards_reserve_coins)?;
        total = coins::add(&total, &self.fee_collector_coins)?;
        for pool in &self.farming_pool_balances {
            total = coins::add(&total, &pool.balance)?;
        }
        Ok(total)
    }
}

/// Load a snapshot backed by the funds attached to instantiation.
/// Panics when the loaded ledgers violate the reserve invariants.
pub fn import_genesis(
    deps: DepsMut,
    funds: &[Coin],
    genesis: GenesisState,
) -> Result<(), ContractError> {
    genesis.validate(deps.api)?;

    let declared = genesis.declared_balances()?;
    let sent = coins::normalize(funds)?;
    if sent != declared {
        return Err(ContractError::GenesisFundsMismatch {
            sent: coins::display(&sent),
            declared: coins::display(&declared),
        });
    }

    let mut live_private = 0u32;
    for plan in &genesis.plans {
        save_plan(deps.storage, plan)?;
        if plan.plan_type == PlanType::Private && !plan.terminated {
            live_private += 1;
        }
    }
    for plan in &genesis.plans {
        ensure_total_epoch_ratio(deps.storage, &plan.farming_pool_address)?;
    }
    for staking in &genesis.stakings {
        save_staking(deps.storage, staking)?;
    }
    for record in &genesis.rewards {
        add_reward(
            deps.storage,
            &record.staking_coin_denom,
            &record.farmer,
            &record.rewards,
        )?;
    }

    for pool in &genesis.farming_pool_balances {
        bank::credit(
            deps.storage,
            &Account::FarmingPool(pool.address.clone()),
            &pool.balance,
        )?;
    }
    bank::credit(deps.storage, &Account::StakingReserve, &genesis.staking_reserve_coins)?;
    bank::credit(deps.storage, &Account::RewardsReserve, &genesis.rewards_reserve_coins)?;
    bank::credit(deps.storage, &Account::FeeCollector, &genesis.fee_collector_coins)?;

    UNDISTRIBUTED_REWARDS.save(deps.storage, &genesis.undistributed_rewards)?;
    EPOCH_STATE.save(deps.storage, &genesis.epoch_state)?;
    LAST_PLAN_ID.save(deps.storage, &genesis.last_plan_id)?;
    LAST_STAKING_ID.save(deps.storage, &genesis.last_staking_id)?;
    NUM_PRIVATE_PLANS.save(deps.storage, &live_private)?;

    assert_invariants(deps.storage);
    Ok(())
}

pub fn export_genesis(storage: &dyn Storage) -> StdResult<GenesisState> {
    let rewards = REWARDS
        .range(storage, None, None, Order::Ascending)
        .map(|item| {
            item.map(|((staking_coin_denom, farmer), rewards)| RewardRecord {
                farmer,
                staking_coin_denom,
                rewards,
            })
        })
        .collect::<StdResult<Vec<_>>>()?;
    let farming_pool_balances = bank::farming_pool_balances(storage)?
        .into_iter()
        .map(|(address, balance)| FarmingPoolBalance {
            address: Addr::unchecked(address),
            balance,
        })
        .collect();

    Ok(GenesisState {
        plans: all_plans(storage)?,
        stakings: all_stakings(storage)?,
        rewards,
        farming_pool_balances,
        staking_reserve_coins: bank::balance_of(storage, &Account::StakingReserve)?,
        rewards_reserve_coins: bank::balance_of(storage, &Account::RewardsReserve)?,
        fee_collector_coins: bank::balance_of(storage, &Account::FeeCollector)?,
        undistributed_rewards: UNDISTRIBUTED_REWARDS.may_load(storage)?.unwrap_or_default(),
        epoch_state: EPOCH_STATE.load(storage)?,
        last_plan_id: LAST_PLAN_ID.may_load(storage)?.unwrap_or_default(),
        last_staking_id: LAST_STAKING_ID.may_load(storage)?.unwrap_or_default(),
    })
}
