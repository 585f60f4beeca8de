use cosmwasm_std::{
    entry_point, Binary, Deps, DepsMut, Env, Event, MessageInfo, Response, StdResult,
};
use cw2::{get_contract_version, set_contract_version};
use farming_common::{coins, PlanKind};

use crate::epoch;
use crate::error::ContractError;
use crate::genesis::import_genesis;
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg, SudoMsg};
use crate::plan;
use crate::proposal;
use crate::query;
use crate::reward;
use crate::staking;
use crate::state::{
    EpochState, Params, EPOCH_STATE, LAST_PLAN_ID, LAST_STAKING_ID, NUM_PRIVATE_PLANS, PARAMS,
    UNDISTRIBUTED_REWARDS,
};

const CONTRACT_NAME: &str = "crates.io:farming-engine";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[entry_point]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let params = Params {
        private_plan_creation_fee: coins::normalize(&msg.private_plan_creation_fee)?,
        staking_creation_fee: coins::normalize(&msg.staking_creation_fee)?,
        next_epoch_days: msg.next_epoch_days,
        max_num_private_plans: msg.max_num_private_plans,
        fee_collector: deps.api.addr_validate(&msg.fee_collector)?,
    };
    params.validate()?;
    PARAMS.save(deps.storage, &params)?;

    let from_genesis = msg.genesis.is_some();
    match msg.genesis {
        Some(genesis) => import_genesis(deps, &info.funds, genesis)?,
        None => {
            if !coins::is_zero(&info.funds) {
                return Err(ContractError::InvalidCoins {
                    reason: "funds are only accepted together with a genesis snapshot".to_string(),
                });
            }
            EPOCH_STATE.save(
                deps.storage,
                &EpochState {
                    epoch_end_time: None,
                    current_epoch_days: params.next_epoch_days,
                    current_epoch: 0,
                    last_epoch_time: None,
                },
            )?;
            LAST_PLAN_ID.save(deps.storage, &0)?;
            LAST_STAKING_ID.save(deps.storage, &0)?;
            NUM_PRIVATE_PLANS.save(deps.storage, &0)?;
            UNDISTRIBUTED_REWARDS.save(deps.storage, &vec![])?;
        }
    }

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("contract", "farming-engine")
        .add_attribute("fee_collector", params.fee_collector.to_string())
        .add_attribute("from_genesis", from_genesis.to_string()))
}

#[entry_point]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::CreateFixedAmountPlan {
            name,
            staking_coin_weights,
            start_time,
            end_time,
            epoch_amount,
        } => plan::create_private_plan(
            deps,
            info,
            name,
            staking_coin_weights,
            start_time,
            end_time,
            PlanKind::FixedAmount {
                epoch_amount: coins::normalize(&epoch_amount)?,
            },
        ),
        ExecuteMsg::CreateRatioPlan {
            name,
            staking_coin_weights,
            start_time,
            end_time,
            epoch_ratio,
        } => plan::create_private_plan(
            deps,
            info,
            name,
            staking_coin_weights,
            start_time,
            end_time,
            PlanKind::Ratio { epoch_ratio },
        ),
        ExecuteMsg::Stake { amount } => staking::stake(deps, info, amount),
        ExecuteMsg::Unstake { amount } => staking::unstake(deps, info, amount),
        ExecuteMsg::Harvest {
            staking_coin_denoms,
        } => reward::harvest(deps, info, staking_coin_denoms),
        ExecuteMsg::RemovePlan { plan_id } => plan::remove_plan(deps, info, plan_id),
        ExecuteMsg::FundFarmingPool {
            farming_pool_address,
        } => plan::fund_farming_pool(deps, info, farming_pool_address),
        ExecuteMsg::WithdrawFarmingPool { amount } => {
            plan::withdraw_farming_pool(deps, info, amount)
        }
        ExecuteMsg::Advance {} => epoch::advance(deps, &env),
    }
}

#[entry_point]
pub fn sudo(deps: DepsMut, env: Env, msg: SudoMsg) -> Result<Response, ContractError> {
    match msg {
        SudoMsg::PublicPlanProposal {
            add_plan_requests,
            modify_plan_requests,
            delete_plan_requests,
        } => proposal::apply_public_plan_proposal(
            deps,
            add_plan_requests,
            modify_plan_requests,
            delete_plan_requests,
        ),
        SudoMsg::UpdateParams {
            private_plan_creation_fee,
            staking_creation_fee,
            next_epoch_days,
            max_num_private_plans,
            fee_collector,
        } => {
            let mut params = PARAMS.load(deps.storage)?;
            if let Some(fee) = private_plan_creation_fee {
                params.private_plan_creation_fee = coins::normalize(&fee)?;
            }
            if let Some(fee) = staking_creation_fee {
                params.staking_creation_fee = coins::normalize(&fee)?;
            }
            if let Some(days) = next_epoch_days {
                params.next_epoch_days = days;
            }
            if let Some(max) = max_num_private_plans {
                params.max_num_private_plans = max;
            }
            if let Some(addr) = fee_collector {
                params.fee_collector = deps.api.addr_validate(&addr)?;
            }
            params.validate()?;
            PARAMS.save(deps.storage, &params)?;

            Ok(Response::new()
                .add_attribute("action", "update_params")
                .add_event(
                    Event::new("farming_params_updated")
                        .add_attribute("next_epoch_days", params.next_epoch_days.to_string())
                        .add_attribute(
                            "max_num_private_plans",
                            params.max_num_private_plans.to_string(),
                        )
                        .add_attribute("fee_collector", params.fee_collector.to_string()),
                ))
        }
        SudoMsg::Advance {} => epoch::advance(deps, &env),
    }
}

#[entry_point]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Params {} => query::query_params(deps),
        QueryMsg::Plan { plan_id } => query::query_plan(deps, plan_id),
        QueryMsg::Plans {
            plan_type,
            farming_pool_address,
            terminated,
            start_after,
            limit,
        } => query::query_plans(
            deps,
            plan_type,
            farming_pool_address,
            terminated,
            start_after,
            limit,
        ),
        QueryMsg::Staking { farmer } => query::query_staking(deps, farmer),
        QueryMsg::Stakings {
            staking_coin_denom,
            start_after,
            limit,
        } => query::query_stakings(deps, staking_coin_denom, start_after, limit),
        QueryMsg::TotalStaked { staking_coin_denom } => {
            query::query_total_staked(deps, staking_coin_denom)
        }
        QueryMsg::Rewards {
            farmer,
            staking_coin_denom,
        } => query::query_rewards(deps, farmer, staking_coin_denom),
        QueryMsg::EpochState {} => query::query_epoch_state(deps),
        QueryMsg::Reserves {} => query::query_reserves(deps),
        QueryMsg::FarmingPool { address } => query::query_farming_pool(deps, address),
        QueryMsg::Invariants {} => query::query_invariants(deps),
        QueryMsg::ExportGenesis {} => query::query_export_genesis(deps),
    }
}

#[entry_point]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let stored = get_contract_version(deps.storage)?;
    if stored.contract != CONTRACT_NAME {
        return Err(ContractError::Unauthorized {
            reason: format!(
                "stored contract {} is not a farming engine ({CONTRACT_NAME})",
                stored.contract
            ),
        });
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("from_version", stored.version)
        .add_attribute("to_version", CONTRACT_VERSION))
}
