use cosmwasm_std::{DepsMut, Env, Event, OverflowError, OverflowOperation, Response, Timestamp};

use crate::allocation::allocate_rewards;
use crate::error::ContractError;
use crate::invariants::assert_invariants;
use crate::plan::terminate_ended_plans;
use crate::staking::process_queued_coins;
use crate::state::{EPOCH_STATE, PARAMS};

const NANOS_PER_DAY: u64 = 24 * 60 * 60 * 1_000_000_000;

fn epoch_end(now: Timestamp, days: u32) -> Result<Timestamp, ContractError> {
    let length = u64::from(days)
        .checked_mul(NANOS_PER_DAY)
        .ok_or(OverflowError::new(OverflowOperation::Mul))?;
    let end = now
        .nanos()
        .checked_add(length)
        .ok_or(OverflowError::new(OverflowOperation::Add))?;
    Ok(Timestamp::from_nanos(end))
}

/// Block tick.
///
/// Ended plans are terminated on every tick. The first tick only schedules
/// the end of the first epoch. Once the block time passes the scheduled end,
/// rewards are allocated, queued coins become staked, the next epoch is
/// scheduled and the reserve invariants are checked, in that order.
pub fn advance(deps: DepsMut, env: &Env) -> Result<Response, ContractError> {
    let now = env.block.time;
    let mut events = terminate_ended_plans(deps.storage, now)?;
    let terminated = events.len();

    let params = PARAMS.load(deps.storage)?;
    let mut state = EPOCH_STATE.load(deps.storage)?;

    let mut settled = false;
    match state.epoch_end_time {
        None => {
            let next_end = epoch_end(now, params.next_epoch_days)?;
            state.epoch_end_time = Some(next_end);
            state.current_epoch_days = params.next_epoch_days;
            EPOCH_STATE.save(deps.storage, &state)?;
            events.push(
                Event::new("farming_epoch_scheduled")
                    .add_attribute("epoch_end_time", next_end.to_string())
                    .add_attribute("epoch_days", params.next_epoch_days.to_string()),
            );
        }
        Some(end) if now > end => {
            let next_end = epoch_end(now, params.next_epoch_days)?;
            events.extend(allocate_rewards(deps.storage, deps.api, now)?);
            let processed = process_queued_coins(deps.storage)?;

            state.epoch_end_time = Some(next_end);
            state.current_epoch_days = params.next_epoch_days;
            state.current_epoch += 1;
            state.last_epoch_time = Some(now);
            EPOCH_STATE.save(deps.storage, &state)?;

            assert_invariants(deps.storage);
            settled = true;
            events.push(
                Event::new("farming_epoch_advanced")
                    .add_attribute("epoch", state.current_epoch.to_string())
                    .add_attribute("epoch_end_time", next_end.to_string())
                    .add_attribute("processed_stakings", processed.to_string()),
            );
        }
        Some(_) => {}
    }

    Ok(Response::new()
        .add_attribute("action", "advance")
        .add_attribute("current_epoch", state.current_epoch.to_string())
        .add_attribute("terminated_plans", terminated.to_string())
        .add_attribute("settled", settled.to_string())
        .add_events(events))
}
