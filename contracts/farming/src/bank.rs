//! Internal ledger of module accounts.
//!
//! The contract holds every coin it escrows in one bank account, so reserves,
//! farming pools and escrowed fees are tracked here per logical account.
//! Coins leave the contract only through [`withdraw`], which pairs the ledger
//! debit with a `BankMsg::Send`.

use std::fmt;

use cosmwasm_std::{Addr, BankMsg, Coin, Order, StdResult, Storage, Uint128};
use farming_common::coins;

use crate::error::ContractError;
use crate::state::BALANCES;

const POOL_PREFIX: &str = "pool:";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Account {
    StakingReserve,
    RewardsReserve,
    /// Escrow of refundable private plan creation fees.
    FeeCollector,
    FarmingPool(Addr),
}

impl Account {
    pub fn key(&self) -> String {
        match self {
            Account::StakingReserve => "staking_reserve".to_string(),
            Account::RewardsReserve => "rewards_reserve".to_string(),
            Account::FeeCollector => "fee_collector".to_string(),
            Account::FarmingPool(addr) => format!("{POOL_PREFIX}{addr}"),
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

pub fn balance_of(storage: &dyn Storage, account: &Account) -> StdResult<Vec<Coin>> {
    let key = account.key();
    BALANCES
        .prefix(key.as_str())
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(denom, amount)| Coin { denom, amount }))
        .collect()
}

pub fn balance_of_denom(storage: &dyn Storage, account: &Account, denom: &str) -> StdResult<Uint128> {
    Ok(BALANCES
        .may_load(storage, (account.key().as_str(), denom))?
        .unwrap_or_default())
}

/// Every farming pool holding a non-zero balance, ascending by address.
pub fn farming_pool_balances(storage: &dyn Storage) -> StdResult<Vec<(String, Vec<Coin>)>> {
    let mut pools: Vec<(String, Vec<Coin>)> = vec![];
    for item in BALANCES.range(storage, None, None, Order::Ascending) {
        let ((key, denom), amount) = item?;
        let Some(addr) = key.strip_prefix(POOL_PREFIX) else {
            continue;
        };
        let coin = Coin { denom, amount };
        match pools.last_mut() {
            Some((last, balance)) if last == addr => balance.push(coin),
            _ => pools.push((addr.to_string(), vec![coin])),
        }
    }
    Ok(pools)
}

pub fn credit(storage: &mut dyn Storage, account: &Account, amount: &[Coin]) -> StdResult<()> {
    let key = account.key();
    for c in amount {
        if c.amount.is_zero() {
            continue;
        }
        let current = BALANCES
            .may_load(storage, (key.as_str(), c.denom.as_str()))?
            .unwrap_or_default();
        BALANCES.save(storage, (key.as_str(), c.denom.as_str()), &current.checked_add(c.amount)?)?;
    }
    Ok(())
}

pub fn debit(storage: &mut dyn Storage, account: &Account, amount: &[Coin]) -> Result<(), ContractError> {
    let key = account.key();
    let amount = coins::normalize(amount)?;
    let balance = balance_of(storage, account)?;
    if !coins::is_all_gte(&balance, &amount) {
        return Err(ContractError::InsufficientFunds {
            account: key,
            needed: coins::display(&amount),
            available: coins::display(&balance),
        });
    }
    for c in &amount {
        let remaining = coins::amount_of(&balance, &c.denom) - c.amount;
        if remaining.is_zero() {
            BALANCES.remove(storage, (key.as_str(), c.denom.as_str()));
        } else {
            BALANCES.save(storage, (key.as_str(), c.denom.as_str()), &remaining)?;
        }
    }
    Ok(())
}

/// Move coins between two internal accounts.
pub fn send(
    storage: &mut dyn Storage,
    from: &Account,
    to: &Account,
    amount: &[Coin],
) -> Result<(), ContractError> {
    debit(storage, from, amount)?;
    credit(storage, to, amount)?;
    Ok(())
}

/// Debit an internal account and pay the coins out to `recipient`.
/// Returns `None` when there is nothing to send.
pub fn withdraw(
    storage: &mut dyn Storage,
    from: &Account,
    recipient: &Addr,
    amount: &[Coin],
) -> Result<Option<BankMsg>, ContractError> {
    let amount = coins::normalize(amount)?;
    if amount.is_empty() {
        return Ok(None);
    }
    debit(storage, from, &amount)?;
    Ok(Some(BankMsg::Send {
        to_address: recipient.to_string(),
        amount,
    }))
}

/// Funds attached to a message, spent step by step by one operation.
/// Whatever is left over goes back to the sender.
pub struct AttachedFunds {
    remaining: Vec<Coin>,
}

impl AttachedFunds {
    pub fn new(funds: &[Coin]) -> StdResult<Self> {
        Ok(Self {
            remaining: coins::normalize(funds)?,
        })
    }

    pub fn take(&mut self, amount: &[Coin]) -> Result<(), ContractError> {
        match coins::checked_sub(&self.remaining, amount) {
            Some(rest) => {
                self.remaining = rest;
                Ok(())
            }
            None => Err(ContractError::InsufficientFunds {
                account: "sender".to_string(),
                needed: coins::display(amount),
                available: coins::display(&self.remaining),
            }),
        }
    }

    pub fn refund(self, sender: &Addr) -> Option<BankMsg> {
        if self.remaining.is_empty() {
            return None;
        }
        Some(BankMsg::Send {
            to_address: sender.to_string(),
            amount: self.remaining,
        })
    }
}
