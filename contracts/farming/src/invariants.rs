use cosmwasm_std::{Coin, Order, StdResult, Storage};
use farming_common::coins;

use crate::bank::{self, Account};
use crate::state::{REWARDS, STAKINGS, UNDISTRIBUTED_REWARDS};

/// The staking reserve holds exactly the queued and staked coins of every
/// staking record.
pub fn staking_reserve_invariant(storage: &dyn Storage) -> StdResult<Option<String>> {
    let mut expected: Vec<Coin> = vec![];
    for item in STAKINGS.range(storage, None, None, Order::Ascending) {
        let (_, staking) = item?;
        expected = coins::add(&expected, &staking.queued_coins)?;
        expected = coins::add(&expected, &staking.staked_coins)?;
    }
    let reserve = bank::balance_of(storage, &Account::StakingReserve)?;
    if reserve == expected {
        return Ok(None);
    }
    Ok(Some(format!(
        "staking reserve holds {} but stakings total {}",
        coins::display(&reserve),
        coins::display(&expected)
    )))
}

/// The rewards reserve holds exactly the unharvested rewards plus the
/// undistributed remainder.
pub fn rewards_reserve_invariant(storage: &dyn Storage) -> StdResult<Option<String>> {
    let mut expected = UNDISTRIBUTED_REWARDS.may_load(storage)?.unwrap_or_default();
    for item in REWARDS.range(storage, None, None, Order::Ascending) {
        let (_, reward) = item?;
        expected = coins::add(&expected, &reward)?;
    }
    let expected = coins::normalize(&expected)?;
    let reserve = bank::balance_of(storage, &Account::RewardsReserve)?;
    if reserve == expected {
        return Ok(None);
    }
    Ok(Some(format!(
        "rewards reserve holds {} but rewards and remainder total {}",
        coins::display(&reserve),
        coins::display(&expected)
    )))
}

/// Every broken invariant, described.
pub fn check_invariants(storage: &dyn Storage) -> StdResult<Vec<String>> {
    Ok([
        staking_reserve_invariant(storage)?,
        rewards_reserve_invariant(storage)?,
    ]
    .into_iter()
    .flatten()
    .collect())
}

/// Halt on any broken invariant. A panic aborts the whole call, so the
/// broken state is never committed.
pub fn assert_invariants(storage: &dyn Storage) {
    match check_invariants(storage) {
        Ok(broken) if broken.is_empty() => {}
        Ok(broken) => panic!("farming invariant broken: {}", broken.join("; ")),
        Err(e) => panic!("farming invariant check failed: {e}"),
    }
}
