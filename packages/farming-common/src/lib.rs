pub mod coins;
pub mod denom;
pub mod types;

pub use denom::is_valid_denom;
pub use types::{PlanKind, PlanType, StakingCoinWeight};
