use cosmwasm_std::{Coin, Decimal, DepsMut, Event, Response, Storage};
use farming_common::{coins, PlanKind, PlanType};

use crate::error::ContractError;
use crate::msg::{AddPlanRequest, DeletePlanRequest, ModifyPlanRequest};
use crate::plan::{ensure_total_epoch_ratio, ensure_unique_name, validate_plan};
use crate::state::{delete_plan, load_plan, next_plan_id, save_plan, Plan};

/// Apply a governance batch. Adds run first, then modifies, then deletes.
/// Any failure fails the whole call, which discards every earlier request.
pub fn apply_public_plan_proposal(
    mut deps: DepsMut,
    add_plan_requests: Vec<AddPlanRequest>,
    modify_plan_requests: Vec<ModifyPlanRequest>,
    delete_plan_requests: Vec<DeletePlanRequest>,
) -> Result<Response, ContractError> {
    if add_plan_requests.is_empty()
        && modify_plan_requests.is_empty()
        && delete_plan_requests.is_empty()
    {
        return Err(ContractError::InvalidProposal {
            reason: "proposal contains no requests".to_string(),
        });
    }

    let mut events = vec![];
    for request in add_plan_requests {
        events.push(add_public_plan(&mut deps, request)?);
    }
    for request in modify_plan_requests {
        events.push(modify_public_plan(&mut deps, request)?);
    }
    for request in delete_plan_requests {
        events.push(delete_public_plan(&mut deps, request)?);
    }

    Ok(Response::new()
        .add_attribute("action", "public_plan_proposal")
        .add_attribute("num_requests", events.len().to_string())
        .add_events(events))
}

fn kind_from_request(
    epoch_amount: Option<Vec<Coin>>,
    epoch_ratio: Option<Decimal>,
) -> Result<Option<PlanKind>, ContractError> {
    match (epoch_amount, epoch_ratio) {
        (Some(_), Some(_)) => Err(ContractError::InvalidProposal {
            reason: "only one of epoch_amount and epoch_ratio may be set".to_string(),
        }),
        (Some(epoch_amount), None) => Ok(Some(PlanKind::FixedAmount {
            epoch_amount: coins::normalize(&epoch_amount)?,
        })),
        (None, Some(epoch_ratio)) => Ok(Some(PlanKind::Ratio { epoch_ratio })),
        (None, None) => Ok(None),
    }
}

fn add_public_plan(deps: &mut DepsMut, request: AddPlanRequest) -> Result<Event, ContractError> {
    let kind = kind_from_request(request.epoch_amount, request.epoch_ratio)?.ok_or_else(|| {
        ContractError::InvalidProposal {
            reason: format!(
                "plan '{}' needs either epoch_amount or epoch_ratio",
                request.name
            ),
        }
    })?;
    let farming_pool_address = deps.api.addr_validate(&request.farming_pool_address)?;
    let termination_address = deps.api.addr_validate(&request.termination_address)?;

    let plan_id = next_plan_id(deps.storage)?;
    let plan = Plan {
        id: plan_id,
        name: request.name,
        plan_type: PlanType::Public,
        kind,
        farming_pool_address,
        termination_address,
        staking_coin_weights: request.staking_coin_weights,
        start_time: request.start_time,
        end_time: request.end_time,
        terminated: false,
        creation_fee: vec![],
        last_distribution_time: None,
        distributed_coins: vec![],
    };
    validate_plan(&plan)?;
    ensure_unique_name(deps.storage, &plan.name, None)?;
    save_plan(deps.storage, &plan)?;
    ensure_total_epoch_ratio(deps.storage, &plan.farming_pool_address)?;

    Ok(Event::new("farming_add_public_plan")
        .add_attribute("plan_id", plan_id.to_string())
        .add_attribute("name", plan.name)
        .add_attribute("plan_kind", plan.kind.as_str())
        .add_attribute("farming_pool_address", plan.farming_pool_address.to_string()))
}

fn load_public_plan(storage: &dyn Storage, plan_id: u64) -> Result<Plan, ContractError> {
    let plan = load_plan(storage, plan_id)?;
    if plan.plan_type != PlanType::Public {
        return Err(ContractError::InvalidPlanType {
            plan_id,
            expected: PlanType::Public.to_string(),
        });
    }
    Ok(plan)
}

fn modify_public_plan(
    deps: &mut DepsMut,
    request: ModifyPlanRequest,
) -> Result<Event, ContractError> {
    let mut plan = load_public_plan(deps.storage, request.plan_id)?;
    if plan.terminated {
        return Err(ContractError::PlanTerminated {
            plan_id: plan.id,
        });
    }

    if let Some(name) = request.name {
        plan.name = name;
    }
    if let Some(address) = request.farming_pool_address {
        plan.farming_pool_address = deps.api.addr_validate(&address)?;
    }
    if let Some(address) = request.termination_address {
        plan.termination_address = deps.api.addr_validate(&address)?;
    }
    if let Some(weights) = request.staking_coin_weights {
        plan.staking_coin_weights = weights;
    }
    if let Some(start_time) = request.start_time {
        plan.start_time = start_time;
    }
    if let Some(end_time) = request.end_time {
        plan.end_time = end_time;
    }
    if let Some(kind) = kind_from_request(request.epoch_amount, request.epoch_ratio)? {
        plan.kind = kind;
    }

    validate_plan(&plan)?;
    ensure_unique_name(deps.storage, &plan.name, Some(plan.id))?;
    save_plan(deps.storage, &plan)?;
    ensure_total_epoch_ratio(deps.storage, &plan.farming_pool_address)?;

    Ok(Event::new("farming_modify_public_plan")
        .add_attribute("plan_id", plan.id.to_string())
        .add_attribute("name", plan.name)
        .add_attribute("plan_kind", plan.kind.as_str()))
}

fn delete_public_plan(
    deps: &mut DepsMut,
    request: DeletePlanRequest,
) -> Result<Event, ContractError> {
    let plan = load_public_plan(deps.storage, request.plan_id)?;
    delete_plan(deps.storage, &plan);

    Ok(Event::new("farming_delete_public_plan")
        .add_attribute("plan_id", plan.id.to_string())
        .add_attribute("name", plan.name))
}
