use cosmwasm_std::{Coin, DepsMut, Event, MessageInfo, Response};
use farming_common::coins;

use crate::bank::{self, Account};
use crate::error::ContractError;
use crate::state::{delete_staking, has_rewards, remove_reward, staking_by_farmer, REWARDS};

/// Pay out the farmer's rewards accrued for each staking coin denom.
pub fn harvest(
    deps: DepsMut,
    info: MessageInfo,
    staking_coin_denoms: Vec<String>,
) -> Result<Response, ContractError> {
    if staking_coin_denoms.is_empty() {
        return Err(ContractError::InvalidCoins {
            reason: "no staking coin denoms given".to_string(),
        });
    }
    let mut seen = std::collections::BTreeSet::new();
    for denom in &staking_coin_denoms {
        if !seen.insert(denom.as_str()) {
            return Err(ContractError::DuplicateDenom {
                denom: denom.clone(),
            });
        }
    }

    let farmer = info.sender;
    let mut total: Vec<Coin> = vec![];
    for denom in &staking_coin_denoms {
        let reward = REWARDS
            .may_load(deps.storage, (denom.as_str(), &farmer))?
            .ok_or_else(|| ContractError::RewardNotFound {
                denom: denom.clone(),
            })?;
        total = coins::add(&total, &reward)?;
    }
    for denom in &staking_coin_denoms {
        remove_reward(deps.storage, denom, &farmer);
    }

    let payout = bank::withdraw(deps.storage, &Account::RewardsReserve, &farmer, &total)?;

    let mut staking_removed = false;
    if !has_rewards(deps.storage, &farmer) {
        if let Some(staking) = staking_by_farmer(deps.storage, &farmer)? {
            if staking.is_empty() {
                delete_staking(deps.storage, &staking)?;
                staking_removed = true;
            }
        }
    }

    let mut response = Response::new()
        .add_attribute("action", "harvest")
        .add_attribute("farmer", farmer.to_string())
        .add_attribute("amount", coins::display(&total))
        .add_event(
            Event::new("farming_harvest")
                .add_attribute("farmer", farmer.to_string())
                .add_attribute("staking_coin_denoms", staking_coin_denoms.join(","))
                .add_attribute("amount", coins::display(&total))
                .add_attribute("staking_removed", staking_removed.to_string()),
        );
    if let Some(msg) = payout {
        response = response.add_message(msg);
    }
    Ok(response)
}
