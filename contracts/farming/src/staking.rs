use cosmwasm_std::{BankMsg, Coin, DepsMut, Event, MessageInfo, Order, Response, StdResult, Storage};
use farming_common::coins;

use crate::bank::{self, Account, AttachedFunds};
use crate::error::ContractError;
use crate::plan::validate_coins;
use crate::state::{
    delete_staking, has_rewards, next_staking_id, save_staking, staking_by_farmer, Staking, PARAMS,
    STAKINGS,
};

/// Queue `amount` from the attached funds for staking. The coins start
/// earning rewards after the next epoch boundary.
pub fn stake(deps: DepsMut, info: MessageInfo, amount: Vec<Coin>) -> Result<Response, ContractError> {
    validate_coins(&amount)?;
    let amount = coins::normalize(&amount)?;
    let params = PARAMS.load(deps.storage)?;

    let mut funds = AttachedFunds::new(&info.funds)?;
    funds.take(&amount)?;

    let mut fee_msg = None;
    let mut staking = match staking_by_farmer(deps.storage, &info.sender)? {
        Some(staking) => staking,
        None => {
            let fee = coins::normalize(&params.staking_creation_fee)?;
            funds.take(&fee)?;
            if !fee.is_empty() {
                fee_msg = Some(BankMsg::Send {
                    to_address: params.fee_collector.to_string(),
                    amount: fee,
                });
            }
            Staking {
                id: next_staking_id(deps.storage)?,
                farmer: info.sender.clone(),
                queued_coins: vec![],
                staked_coins: vec![],
            }
        }
    };

    bank::credit(deps.storage, &Account::StakingReserve, &amount)?;
    staking.queued_coins = coins::add(&staking.queued_coins, &amount)?;
    save_staking(deps.storage, &staking)?;

    let mut response = Response::new()
        .add_attribute("action", "stake")
        .add_attribute("farmer", info.sender.to_string())
        .add_attribute("amount", coins::display(&amount))
        .add_event(
            Event::new("farming_stake")
                .add_attribute("farmer", info.sender.to_string())
                .add_attribute("staking_id", staking.id.to_string())
                .add_attribute("amount", coins::display(&amount)),
        );
    if let Some(msg) = fee_msg {
        response = response.add_message(msg);
    }
    if let Some(refund) = funds.refund(&info.sender) {
        response = response.add_message(refund);
    }
    Ok(response)
}

/// Release `amount` back to the farmer, drawing queued coins before
/// staked coins.
pub fn unstake(deps: DepsMut, info: MessageInfo, amount: Vec<Coin>) -> Result<Response, ContractError> {
    validate_coins(&amount)?;
    let amount = coins::normalize(&amount)?;
    let mut staking =
        staking_by_farmer(deps.storage, &info.sender)?.ok_or_else(|| ContractError::StakingNotFound {
            farmer: info.sender.to_string(),
        })?;

    let mut from_queued = vec![];
    let mut from_staked = vec![];
    for c in &amount {
        let queued = coins::amount_of(&staking.queued_coins, &c.denom);
        let staked = coins::amount_of(&staking.staked_coins, &c.denom);
        if c.amount > queued + staked {
            return Err(ContractError::InsufficientStaking {
                denom: c.denom.clone(),
                requested: c.amount.to_string(),
                available: (queued + staked).to_string(),
            });
        }
        let take_queued = c.amount.min(queued);
        from_queued.push(Coin::new(take_queued, &c.denom));
        from_staked.push(Coin::new(c.amount - take_queued, &c.denom));
    }
    staking.queued_coins = remaining(&staking.queued_coins, &from_queued)?;
    staking.staked_coins = remaining(&staking.staked_coins, &from_staked)?;

    let payout = bank::withdraw(deps.storage, &Account::StakingReserve, &info.sender, &amount)?;

    let removed = staking.is_empty() && !has_rewards(deps.storage, &info.sender);
    if removed {
        delete_staking(deps.storage, &staking)?;
    } else {
        save_staking(deps.storage, &staking)?;
    }

    let mut response = Response::new()
        .add_attribute("action", "unstake")
        .add_attribute("farmer", info.sender.to_string())
        .add_attribute("amount", coins::display(&amount))
        .add_event(
            Event::new("farming_unstake")
                .add_attribute("farmer", info.sender.to_string())
                .add_attribute("staking_id", staking.id.to_string())
                .add_attribute("amount", coins::display(&amount))
                .add_attribute("staking_removed", removed.to_string()),
        );
    if let Some(msg) = payout {
        response = response.add_message(msg);
    }
    Ok(response)
}

fn remaining(held: &[Coin], taken: &[Coin]) -> Result<Vec<Coin>, ContractError> {
    coins::checked_sub(held, taken).ok_or_else(|| ContractError::InvalidCoins {
        reason: format!("cannot take {} from {}", coins::display(taken), coins::display(held)),
    })
}

/// Move every record's queued coins into its staked coins.
/// Returns the number of records touched.
pub fn process_queued_coins(storage: &mut dyn Storage) -> Result<u64, ContractError> {
    let pending: Vec<Staking> = STAKINGS
        .range(storage, None, None, Order::Ascending)
        .filter_map(|item| match item {
            Ok((_, staking)) if !coins::is_zero(&staking.queued_coins) => Some(Ok(staking)),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
        .collect::<StdResult<_>>()?;

    let mut processed = 0u64;
    for mut staking in pending {
        staking.staked_coins = coins::add(&staking.staked_coins, &staking.queued_coins)?;
        staking.queued_coins = vec![];
        save_staking(storage, &staking)?;
        processed += 1;
    }
    Ok(processed)
}
