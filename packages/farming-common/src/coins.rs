//! Multiset arithmetic over `Vec<Coin>`.
//!
//! Every function returns coins sorted by denom, with duplicate denoms merged
//! and zero amounts dropped, so two equal multisets always compare equal.

use std::collections::BTreeMap;

use cosmwasm_std::{Coin, Decimal, StdError, StdResult, Uint128};

/// 10^18, the scale of `Decimal::atomics()`.
const DECIMAL_FRACTIONAL: Uint128 = Uint128::new(1_000_000_000_000_000_000u128);

fn to_map(coins: &[Coin]) -> StdResult<BTreeMap<String, Uint128>> {
    let mut map: BTreeMap<String, Uint128> = BTreeMap::new();
    for coin in coins {
        let entry = map.entry(coin.denom.clone()).or_default();
        *entry = entry.checked_add(coin.amount)?;
    }
    Ok(map)
}

fn from_map(map: BTreeMap<String, Uint128>) -> Vec<Coin> {
    map.into_iter()
        .filter(|(_, amount)| !amount.is_zero())
        .map(|(denom, amount)| Coin { denom, amount })
        .collect()
}

/// Sort by denom, merge duplicates and drop zero amounts.
pub fn normalize(coins: &[Coin]) -> StdResult<Vec<Coin>> {
    Ok(from_map(to_map(coins)?))
}

pub fn add(a: &[Coin], b: &[Coin]) -> StdResult<Vec<Coin>> {
    let mut map = to_map(a)?;
    for coin in b {
        let entry = map.entry(coin.denom.clone()).or_default();
        *entry = entry.checked_add(coin.amount)?;
    }
    Ok(from_map(map))
}

/// `a - b`, or `None` when any denom of `b` exceeds its amount in `a`.
pub fn checked_sub(a: &[Coin], b: &[Coin]) -> Option<Vec<Coin>> {
    let mut map = to_map(a).ok()?;
    for coin in b {
        if coin.amount.is_zero() {
            continue;
        }
        let entry = map.get_mut(&coin.denom)?;
        *entry = entry.checked_sub(coin.amount).ok()?;
    }
    Some(from_map(map))
}

/// True when `a` holds at least `b` of every denom in `b`.
pub fn is_all_gte(a: &[Coin], b: &[Coin]) -> bool {
    checked_sub(a, b).is_some()
}

pub fn amount_of(coins: &[Coin], denom: &str) -> Uint128 {
    coins
        .iter()
        .filter(|c| c.denom == denom)
        .fold(Uint128::zero(), |acc, c| acc.saturating_add(c.amount))
}

pub fn is_zero(coins: &[Coin]) -> bool {
    coins.iter().all(|c| c.amount.is_zero())
}

/// Multiply every amount by `ratio` and truncate to whole units.
pub fn mul_dec_floor(coins: &[Coin], ratio: Decimal) -> StdResult<Vec<Coin>> {
    let mut out = Vec::with_capacity(coins.len());
    for coin in normalize(coins)? {
        let amount = coin
            .amount
            .checked_multiply_ratio(ratio.atomics(), DECIMAL_FRACTIONAL)
            .map_err(|e| StdError::generic_err(e.to_string()))?;
        if !amount.is_zero() {
            out.push(Coin {
                denom: coin.denom,
                amount,
            });
        }
    }
    Ok(out)
}

/// `amount * numerator / denominator` per denom, truncated.
pub fn mul_ratio_floor(
    coins: &[Coin],
    numerator: Uint128,
    denominator: Uint128,
) -> StdResult<Vec<Coin>> {
    if denominator.is_zero() {
        return Err(StdError::generic_err("ratio denominator is zero"));
    }
    let mut out = Vec::with_capacity(coins.len());
    for coin in coins {
        let amount = coin
            .amount
            .checked_multiply_ratio(numerator, denominator)
            .map_err(|e| StdError::generic_err(e.to_string()))?;
        if !amount.is_zero() {
            out.push(Coin {
                denom: coin.denom.clone(),
                amount,
            });
        }
    }
    Ok(out)
}

/// The first denom that appears more than once, if any.
pub fn find_duplicate_denom(coins: &[Coin]) -> Option<&str> {
    let mut seen = std::collections::BTreeSet::new();
    coins
        .iter()
        .find(|c| !seen.insert(c.denom.as_str()))
        .map(|c| c.denom.as_str())
}

/// Comma separated `{amount}{denom}` list, as used in event attributes.
pub fn display(coins: &[Coin]) -> String {
    coins
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
