use std::fmt;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Coin, Decimal, StdResult};

use crate::coins;

/// Who created a plan: a fee-paying account (private) or governance (public).
#[cw_serde]
#[derive(Copy, Eq)]
pub enum PlanType {
    Private,
    Public,
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanType::Private => write!(f, "private"),
            PlanType::Public => write!(f, "public"),
        }
    }
}

/// Share of a plan's epoch emission that goes to stakers of `denom`.
#[cw_serde]
pub struct StakingCoinWeight {
    pub denom: String,
    pub weight: Decimal,
}

impl StakingCoinWeight {
    pub fn new(denom: impl Into<String>, weight: Decimal) -> Self {
        Self {
            denom: denom.into(),
            weight,
        }
    }
}

/// How much a plan emits per epoch.
#[cw_serde]
pub enum PlanKind {
    /// A constant amount every epoch.
    FixedAmount { epoch_amount: Vec<Coin> },
    /// A fraction of the farming pool's current balance every epoch.
    Ratio { epoch_ratio: Decimal },
}

impl PlanKind {
    /// Coins to move out of the farming pool for one epoch, given the pool's
    /// current balance.
    pub fn epoch_allocation(&self, pool_balance: &[Coin]) -> StdResult<Vec<Coin>> {
        match self {
            PlanKind::FixedAmount { epoch_amount } => coins::normalize(epoch_amount),
            PlanKind::Ratio { epoch_ratio } => coins::mul_dec_floor(pool_balance, *epoch_ratio),
        }
    }

    pub fn epoch_ratio(&self) -> Option<Decimal> {
        match self {
            PlanKind::Ratio { epoch_ratio } => Some(*epoch_ratio),
            PlanKind::FixedAmount { .. } => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanKind::FixedAmount { .. } => "fixed_amount",
            PlanKind::Ratio { .. } => "ratio",
        }
    }
}

/// Sum of all weights, `Err` on overflow.
pub fn total_weight(weights: &[StakingCoinWeight]) -> StdResult<Decimal> {
    let mut total = Decimal::zero();
    for w in weights {
        total = total.checked_add(w.weight)?;
    }
    Ok(total)
}
