//! Integration tests for the farming engine.
//!
//! These tests drive the contract through its `instantiate` / `execute` /
//! `sudo` / `query` entry points using `cosmwasm_std::testing` mocks, the
//! same way a chain would. Epoch boundaries are crossed by sending
//! `SudoMsg::Advance {}` with an explicit block time.
//!
//! Run:
//! ```bash
//! cargo test -p farming-integration-tests
//! ```

use cosmwasm_std::testing::{message_info, mock_dependencies, mock_env, MockApi, MockQuerier};
use cosmwasm_std::{
    coin, coins, from_json, Addr, BankMsg, Coin, CosmosMsg, Decimal, Env, MemoryStorage, OwnedDeps,
    Response, Timestamp, Uint128,
};
use farming_common::{PlanType, StakingCoinWeight};
use farming_engine::contract::{execute, instantiate, query, sudo};
use farming_engine::genesis::GenesisState;
use farming_engine::msg::{
    AddPlanRequest, DeletePlanRequest, ExecuteMsg, FarmingPoolResponse, InstantiateMsg,
    InvariantsResponse, ModifyPlanRequest, QueryMsg, ReservesResponse, RewardsResponse, SudoMsg,
    TotalStakedResponse,
};
use farming_engine::state::{EpochState, Plan, Staking};
use farming_engine::ContractError;
use proptest::prelude::*;

type Deps = OwnedDeps<MemoryStorage, MockApi, MockQuerier>;

// ─── Constants ───

const T0: u64 = 1_700_000_000;
const DAY: u64 = 86_400;
const PRIVATE_PLAN_FEE: u128 = 100_000_000;

// ─── Helpers ───

fn env_at(seconds: u64) -> Env {
    let mut env = mock_env();
    env.block.time = Timestamp::from_seconds(seconds);
    env
}

fn instantiate_msg() -> InstantiateMsg {
    let mock_api = MockApi::default();
    InstantiateMsg {
        private_plan_creation_fee: coins(PRIVATE_PLAN_FEE, "stake"),
        staking_creation_fee: vec![],
        next_epoch_days: 1,
        max_num_private_plans: 10,
        fee_collector: mock_api.addr_make("fee_collector").to_string(),
        genesis: None,
    }
}

fn setup_farming(deps: &mut Deps) {
    let admin = deps.api.addr_make("admin");
    let info = message_info(&admin, &[]);
    instantiate(deps.as_mut(), env_at(T0), info, instantiate_msg()).unwrap();
}

fn weights(entries: &[(&str, u64)]) -> Vec<StakingCoinWeight> {
    entries
        .iter()
        .map(|(denom, pct)| StakingCoinWeight::new(*denom, Decimal::percent(*pct)))
        .collect()
}

fn public_plan(
    name: &str,
    pool: &Addr,
    staking_coin_weights: Vec<StakingCoinWeight>,
    start: u64,
    end: u64,
    epoch_amount: Option<Vec<Coin>>,
    epoch_ratio: Option<Decimal>,
) -> AddPlanRequest {
    AddPlanRequest {
        name: name.to_string(),
        farming_pool_address: pool.to_string(),
        termination_address: pool.to_string(),
        staking_coin_weights,
        start_time: Timestamp::from_seconds(start),
        end_time: Timestamp::from_seconds(end),
        epoch_amount,
        epoch_ratio,
    }
}

fn propose(deps: &mut Deps, adds: Vec<AddPlanRequest>) -> Response {
    sudo(
        deps.as_mut(),
        env_at(T0),
        SudoMsg::PublicPlanProposal {
            add_plan_requests: adds,
            modify_plan_requests: vec![],
            delete_plan_requests: vec![],
        },
    )
    .unwrap()
}

fn fund_pool(deps: &mut Deps, pool: &Addr, amount: &[Coin]) {
    let funder = deps.api.addr_make("funder");
    execute(
        deps.as_mut(),
        env_at(T0),
        message_info(&funder, amount),
        ExecuteMsg::FundFarmingPool {
            farming_pool_address: pool.to_string(),
        },
    )
    .unwrap();
}

fn stake(deps: &mut Deps, farmer: &Addr, now: u64, amount: &[Coin]) -> Response {
    execute(
        deps.as_mut(),
        env_at(now),
        message_info(farmer, amount),
        ExecuteMsg::Stake {
            amount: amount.to_vec(),
        },
    )
    .unwrap()
}

fn advance(deps: &mut Deps, now: u64) -> Response {
    sudo(deps.as_mut(), env_at(now), SudoMsg::Advance {}).unwrap()
}

fn rewards_of(deps: &Deps, farmer: &Addr) -> RewardsResponse {
    let res = query(
        deps.as_ref(),
        mock_env(),
        QueryMsg::Rewards {
            farmer: farmer.to_string(),
            staking_coin_denom: None,
        },
    )
    .unwrap();
    from_json(res).unwrap()
}

fn epoch_state(deps: &Deps) -> EpochState {
    let res = query(deps.as_ref(), mock_env(), QueryMsg::EpochState {}).unwrap();
    from_json(res).unwrap()
}

fn reserves(deps: &Deps) -> ReservesResponse {
    let res = query(deps.as_ref(), mock_env(), QueryMsg::Reserves {}).unwrap();
    from_json(res).unwrap()
}

fn broken_invariants(deps: &Deps) -> Vec<String> {
    let res = query(deps.as_ref(), mock_env(), QueryMsg::Invariants {}).unwrap();
    let invariants: InvariantsResponse = from_json(res).unwrap();
    invariants.broken
}

fn pool_balance(deps: &Deps, pool: &Addr) -> Vec<Coin> {
    let res = query(
        deps.as_ref(),
        mock_env(),
        QueryMsg::FarmingPool {
            address: pool.to_string(),
        },
    )
    .unwrap();
    let pool: FarmingPoolResponse = from_json(res).unwrap();
    pool.balance
}

fn sent_to(res: &Response, recipient: &Addr) -> Vec<Coin> {
    res.messages
        .iter()
        .filter_map(|m| match &m.msg {
            CosmosMsg::Bank(BankMsg::Send { to_address, amount })
                if to_address == recipient.as_str() =>
            {
                Some(amount.clone())
            }
            _ => None,
        })
        .flatten()
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_public_plan_rewards_split_by_stake() {
    let mut deps = mock_dependencies();
    setup_farming(&mut deps);

    let pool = deps.api.addr_make("pool");
    let alice = deps.api.addr_make("alice");
    let bob = deps.api.addr_make("bob");

    propose(
        &mut deps,
        vec![public_plan(
            "atom incentives",
            &pool,
            weights(&[("uatom", 100)]),
            T0,
            T0 + 30 * DAY,
            Some(coins(1_000, "ustake")),
            None,
        )],
    );
    fund_pool(&mut deps, &pool, &coins(10_000, "ustake"));

    stake(&mut deps, &alice, T0, &coins(300, "uatom"));
    stake(&mut deps, &bob, T0, &coins(100, "uatom"));

    // 1. First tick schedules the first boundary
    advance(&mut deps, T0);

    // 2. First boundary: nothing is staked yet, the epoch amount stays undistributed
    advance(&mut deps, T0 + DAY + 1);
    assert!(rewards_of(&deps, &alice).total.is_empty());
    let r = reserves(&deps);
    assert_eq!(r.undistributed_rewards, coins(1_000, "ustake"));
    assert_eq!(r.staking_reserve, coins(400, "uatom"));

    let res = query(
        deps.as_ref(),
        mock_env(),
        QueryMsg::TotalStaked {
            staking_coin_denom: "uatom".to_string(),
        },
    )
    .unwrap();
    let total: TotalStakedResponse = from_json(res).unwrap();
    assert_eq!(total.staked_amount, Uint128::new(400));
    assert_eq!(total.queued_amount, Uint128::zero());

    // 3. Second boundary: 3:1 split
    advance(&mut deps, T0 + 2 * DAY + 2);
    assert_eq!(rewards_of(&deps, &alice).total, coins(750, "ustake"));
    assert_eq!(rewards_of(&deps, &bob).total, coins(250, "ustake"));
    assert_eq!(pool_balance(&deps, &pool), coins(8_000, "ustake"));
    assert_eq!(reserves(&deps).rewards_reserve, coins(2_000, "ustake"));
    assert!(broken_invariants(&deps).is_empty());

    // 4. Alice harvests
    let res = execute(
        deps.as_mut(),
        env_at(T0 + 2 * DAY + 3),
        message_info(&alice, &[]),
        ExecuteMsg::Harvest {
            staking_coin_denoms: vec!["uatom".to_string()],
        },
    )
    .unwrap();
    assert_eq!(sent_to(&res, &alice), coins(750, "ustake"));
    assert!(rewards_of(&deps, &alice).total.is_empty());

    // 5. Harvesting again finds nothing
    let err = execute(
        deps.as_mut(),
        env_at(T0 + 2 * DAY + 4),
        message_info(&alice, &[]),
        ExecuteMsg::Harvest {
            staking_coin_denoms: vec!["uatom".to_string()],
        },
    )
    .unwrap_err();
    assert_eq!(
        err,
        ContractError::RewardNotFound {
            denom: "uatom".to_string()
        }
    );
    assert!(broken_invariants(&deps).is_empty());
}

#[test]
fn test_weighted_plan_across_denoms() {
    let mut deps = mock_dependencies();
    setup_farming(&mut deps);

    let pool = deps.api.addr_make("pool");
    let alice = deps.api.addr_make("alice");
    let bob = deps.api.addr_make("bob");
    let carol = deps.api.addr_make("carol");

    // Starts after the first boundary so every farmer is staked when it pays
    propose(
        &mut deps,
        vec![public_plan(
            "split",
            &pool,
            weights(&[("uatom", 50), ("uosmo", 50)]),
            T0 + DAY + 100,
            T0 + 30 * DAY,
            Some(coins(1_001, "ustake")),
            None,
        )],
    );
    fund_pool(&mut deps, &pool, &coins(5_000, "ustake"));

    stake(&mut deps, &alice, T0, &coins(1, "uatom"));
    stake(&mut deps, &bob, T0, &coins(1, "uosmo"));
    stake(&mut deps, &carol, T0, &coins(2, "uosmo"));

    advance(&mut deps, T0);
    advance(&mut deps, T0 + DAY + 1);
    assert!(reserves(&deps).undistributed_rewards.is_empty());

    advance(&mut deps, T0 + 2 * DAY + 2);
    // floor(1001 * 0.5) = 500 per denom
    assert_eq!(rewards_of(&deps, &alice).total, coins(500, "ustake"));
    assert_eq!(rewards_of(&deps, &bob).total, coins(166, "ustake"));
    assert_eq!(rewards_of(&deps, &carol).total, coins(333, "ustake"));

    let r = reserves(&deps);
    assert_eq!(r.undistributed_rewards, coins(2, "ustake"));
    assert_eq!(r.rewards_reserve, coins(1_001, "ustake"));
    assert_eq!(pool_balance(&deps, &pool), coins(3_999, "ustake"));

    let res = query(
        deps.as_ref(),
        mock_env(),
        QueryMsg::Rewards {
            farmer: carol.to_string(),
            staking_coin_denom: Some("uosmo".to_string()),
        },
    )
    .unwrap();
    let rewards: RewardsResponse = from_json(res).unwrap();
    assert_eq!(rewards.rewards.len(), 1);
    assert_eq!(rewards.rewards[0].staking_coin_denom, "uosmo");
    assert!(broken_invariants(&deps).is_empty());
}

#[test]
fn test_queued_coins_earn_nothing() {
    let mut deps = mock_dependencies();
    setup_farming(&mut deps);

    let pool = deps.api.addr_make("pool");
    let alice = deps.api.addr_make("alice");
    let bob = deps.api.addr_make("bob");

    propose(
        &mut deps,
        vec![public_plan(
            "late joiner",
            &pool,
            weights(&[("uatom", 100)]),
            T0 + DAY + 100,
            T0 + 30 * DAY,
            Some(coins(100, "ustake")),
            None,
        )],
    );
    fund_pool(&mut deps, &pool, &coins(1_000, "ustake"));

    stake(&mut deps, &alice, T0, &coins(10, "uatom"));
    advance(&mut deps, T0);
    advance(&mut deps, T0 + DAY + 1);

    // Bob joins mid-epoch and stays queued through the next boundary
    stake(&mut deps, &bob, T0 + DAY + 50, &coins(10, "uatom"));
    advance(&mut deps, T0 + 2 * DAY + 2);
    assert_eq!(rewards_of(&deps, &alice).total, coins(100, "ustake"));
    assert!(rewards_of(&deps, &bob).total.is_empty());

    let res = query(
        deps.as_ref(),
        mock_env(),
        QueryMsg::Staking {
            farmer: bob.to_string(),
        },
    )
    .unwrap();
    let staking: Option<Staking> = from_json(res).unwrap();
    let staking = staking.unwrap();
    assert!(staking.queued_coins.is_empty());
    assert_eq!(staking.staked_coins, coins(10, "uatom"));

    advance(&mut deps, T0 + 3 * DAY + 3);
    assert_eq!(rewards_of(&deps, &alice).total, coins(150, "ustake"));
    assert_eq!(rewards_of(&deps, &bob).total, coins(50, "ustake"));

    // Unstaking the queued-then-staked coins keeps the record while rewards remain
    let res = execute(
        deps.as_mut(),
        env_at(T0 + 3 * DAY + 4),
        message_info(&bob, &[]),
        ExecuteMsg::Unstake {
            amount: coins(10, "uatom"),
        },
    )
    .unwrap();
    assert_eq!(sent_to(&res, &bob), coins(10, "uatom"));
    let res = query(
        deps.as_ref(),
        mock_env(),
        QueryMsg::Staking {
            farmer: bob.to_string(),
        },
    )
    .unwrap();
    let staking: Option<Staking> = from_json(res).unwrap();
    assert!(staking.is_some());
    assert!(broken_invariants(&deps).is_empty());
}

#[test]
fn test_ratio_plan_stops_after_termination() {
    let mut deps = mock_dependencies();
    setup_farming(&mut deps);

    let pool = deps.api.addr_make("pool");
    let alice = deps.api.addr_make("alice");

    propose(
        &mut deps,
        vec![public_plan(
            "two epochs",
            &pool,
            weights(&[("uatom", 100)]),
            T0,
            T0 + 2 * DAY + 10,
            None,
            Some(Decimal::percent(50)),
        )],
    );
    fund_pool(&mut deps, &pool, &coins(1_000, "ustake"));
    stake(&mut deps, &alice, T0, &coins(1, "uatom"));

    advance(&mut deps, T0);
    advance(&mut deps, T0 + DAY + 1);
    assert_eq!(pool_balance(&deps, &pool), coins(500, "ustake"));

    advance(&mut deps, T0 + 2 * DAY + 2);
    assert_eq!(pool_balance(&deps, &pool), coins(250, "ustake"));
    assert_eq!(rewards_of(&deps, &alice).total, coins(250, "ustake"));

    // Ended: terminated on the next tick, before any further allocation
    let res = advance(&mut deps, T0 + 3 * DAY + 3);
    assert!(res.events.iter().any(|e| e.ty == "farming_plan_terminated"));
    assert_eq!(pool_balance(&deps, &pool), coins(250, "ustake"));
    assert_eq!(rewards_of(&deps, &alice).total, coins(250, "ustake"));

    let res = query(
        deps.as_ref(),
        mock_env(),
        QueryMsg::Plans {
            plan_type: Some(PlanType::Public),
            farming_pool_address: None,
            terminated: Some(true),
            start_after: None,
            limit: None,
        },
    )
    .unwrap();
    let plans: Vec<Plan> = from_json(res).unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].distributed_coins, coins(750, "ustake"));

    // A public plan's pool stays with its owner
    let res = execute(
        deps.as_mut(),
        env_at(T0 + 3 * DAY + 4),
        message_info(&pool, &[]),
        ExecuteMsg::WithdrawFarmingPool {
            amount: coins(250, "ustake"),
        },
    )
    .unwrap();
    assert_eq!(sent_to(&res, &pool), coins(250, "ustake"));
    assert!(pool_balance(&deps, &pool).is_empty());
}

#[test]
fn test_private_plan_lifecycle() {
    let mut deps = mock_dependencies();
    setup_farming(&mut deps);

    let creator = deps.api.addr_make("creator");
    let alice = deps.api.addr_make("alice");

    let res = execute(
        deps.as_mut(),
        env_at(T0),
        message_info(&creator, &coins(PRIVATE_PLAN_FEE, "stake")),
        ExecuteMsg::CreateRatioPlan {
            name: "creator drip".to_string(),
            staking_coin_weights: weights(&[("uatom", 100)]),
            start_time: Timestamp::from_seconds(T0),
            end_time: Timestamp::from_seconds(T0 + DAY + 10),
            epoch_ratio: Decimal::percent(10),
        },
    )
    .unwrap();
    let pool_attr = res
        .attributes
        .iter()
        .find(|a| a.key == "farming_pool_address")
        .unwrap();
    let pool = Addr::unchecked(pool_attr.value.clone());
    assert_eq!(reserves(&deps).fee_collector, coins(PRIVATE_PLAN_FEE, "stake"));

    fund_pool(&mut deps, &pool, &coins(1_000, "ustake"));
    stake(&mut deps, &alice, T0, &coins(5, "uatom"));
    advance(&mut deps, T0);
    advance(&mut deps, T0 + DAY + 1);
    assert_eq!(pool_balance(&deps, &pool), coins(900, "ustake"));

    // Still live: cannot be removed
    let err = execute(
        deps.as_mut(),
        env_at(T0 + DAY + 2),
        message_info(&creator, &[]),
        ExecuteMsg::RemovePlan { plan_id: 1 },
    )
    .unwrap_err();
    assert_eq!(err, ContractError::PlanNotTerminated { plan_id: 1 });

    advance(&mut deps, T0 + DAY + 20);

    let err = execute(
        deps.as_mut(),
        env_at(T0 + DAY + 21),
        message_info(&alice, &[]),
        ExecuteMsg::RemovePlan { plan_id: 1 },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::Unauthorized { .. }));

    let res = execute(
        deps.as_mut(),
        env_at(T0 + DAY + 21),
        message_info(&creator, &[]),
        ExecuteMsg::RemovePlan { plan_id: 1 },
    )
    .unwrap();
    assert_eq!(
        sent_to(&res, &creator),
        vec![coin(900, "ustake"), coin(PRIVATE_PLAN_FEE, "stake")]
    );
    assert!(reserves(&deps).fee_collector.is_empty());
    assert!(pool_balance(&deps, &pool).is_empty());

    let err = query(deps.as_ref(), mock_env(), QueryMsg::Plan { plan_id: 1 });
    assert!(err.is_err());
    assert!(broken_invariants(&deps).is_empty());
}

#[test]
fn test_public_plan_proposal_modify_and_delete() {
    let mut deps = mock_dependencies();
    setup_farming(&mut deps);
    let pool = deps.api.addr_make("pool");

    let res = propose(
        &mut deps,
        vec![
            public_plan(
                "first",
                &pool,
                weights(&[("uatom", 100)]),
                T0,
                T0 + 10 * DAY,
                None,
                Some(Decimal::percent(60)),
            ),
            public_plan(
                "second",
                &pool,
                weights(&[("uatom", 100)]),
                T0,
                T0 + 10 * DAY,
                None,
                Some(Decimal::percent(30)),
            ),
        ],
    );
    assert_eq!(
        res.events
            .iter()
            .filter(|e| e.ty == "farming_add_public_plan")
            .count(),
        2
    );

    let modify = |plan_id: u64| ModifyPlanRequest {
        plan_id,
        name: None,
        farming_pool_address: None,
        termination_address: None,
        staking_coin_weights: None,
        start_time: None,
        end_time: None,
        epoch_amount: None,
        epoch_ratio: None,
    };

    // Rename onto an existing name
    let err = sudo(
        deps.as_mut(),
        env_at(T0),
        SudoMsg::PublicPlanProposal {
            add_plan_requests: vec![],
            modify_plan_requests: vec![ModifyPlanRequest {
                name: Some("first".to_string()),
                ..modify(2)
            }],
            delete_plan_requests: vec![],
        },
    )
    .unwrap_err();
    assert_eq!(
        err,
        ContractError::DuplicatePlanName {
            name: "first".to_string()
        }
    );

    // Switch the second plan to a fixed amount
    sudo(
        deps.as_mut(),
        env_at(T0),
        SudoMsg::PublicPlanProposal {
            add_plan_requests: vec![],
            modify_plan_requests: vec![ModifyPlanRequest {
                epoch_amount: Some(coins(10, "ustake")),
                ..modify(2)
            }],
            delete_plan_requests: vec![],
        },
    )
    .unwrap();
    let res = query(deps.as_ref(), mock_env(), QueryMsg::Plan { plan_id: 2 }).unwrap();
    let plan: Plan = from_json(res).unwrap();
    assert_eq!(plan.kind.epoch_ratio(), None);

    // Delete the first plan
    sudo(
        deps.as_mut(),
        env_at(T0),
        SudoMsg::PublicPlanProposal {
            add_plan_requests: vec![],
            modify_plan_requests: vec![],
            delete_plan_requests: vec![DeletePlanRequest { plan_id: 1 }],
        },
    )
    .unwrap();
    assert!(query(deps.as_ref(), mock_env(), QueryMsg::Plan { plan_id: 1 }).is_err());

    let err = sudo(
        deps.as_mut(),
        env_at(T0),
        SudoMsg::PublicPlanProposal {
            add_plan_requests: vec![],
            modify_plan_requests: vec![],
            delete_plan_requests: vec![DeletePlanRequest { plan_id: 1 }],
        },
    )
    .unwrap_err();
    assert_eq!(err, ContractError::PlanNotFound { plan_id: 1 });

    // Private plans are out of reach for governance
    let creator = deps.api.addr_make("creator");
    execute(
        deps.as_mut(),
        env_at(T0),
        message_info(&creator, &coins(PRIVATE_PLAN_FEE, "stake")),
        ExecuteMsg::CreateFixedAmountPlan {
            name: "private".to_string(),
            staking_coin_weights: weights(&[("uatom", 100)]),
            start_time: Timestamp::from_seconds(T0),
            end_time: Timestamp::from_seconds(T0 + DAY),
            epoch_amount: coins(1, "ustake"),
        },
    )
    .unwrap();
    let err = sudo(
        deps.as_mut(),
        env_at(T0),
        SudoMsg::PublicPlanProposal {
            add_plan_requests: vec![],
            modify_plan_requests: vec![],
            delete_plan_requests: vec![DeletePlanRequest { plan_id: 3 }],
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::InvalidPlanType { plan_id: 3, .. }));
}

#[test]
fn test_total_epoch_ratio_capped_per_pool() {
    let mut deps = mock_dependencies();
    setup_farming(&mut deps);
    let pool = deps.api.addr_make("pool");

    let err = sudo(
        deps.as_mut(),
        env_at(T0),
        SudoMsg::PublicPlanProposal {
            add_plan_requests: vec![
                public_plan(
                    "a",
                    &pool,
                    weights(&[("uatom", 100)]),
                    T0,
                    T0 + DAY,
                    None,
                    Some(Decimal::percent(70)),
                ),
                public_plan(
                    "b",
                    &pool,
                    weights(&[("uatom", 100)]),
                    T0,
                    T0 + DAY,
                    None,
                    Some(Decimal::percent(40)),
                ),
            ],
            modify_plan_requests: vec![],
            delete_plan_requests: vec![],
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::InvalidTotalEpochRatio { .. }));
}

#[test]
fn test_epoch_length_change_applies_to_next_epoch() {
    let mut deps = mock_dependencies();
    setup_farming(&mut deps);
    advance(&mut deps, T0);

    sudo(
        deps.as_mut(),
        env_at(T0 + 100),
        SudoMsg::UpdateParams {
            private_plan_creation_fee: None,
            staking_creation_fee: None,
            next_epoch_days: Some(7),
            max_num_private_plans: None,
            fee_collector: None,
        },
    )
    .unwrap();

    let state = epoch_state(&deps);
    assert_eq!(state.epoch_end_time, Some(Timestamp::from_seconds(T0 + DAY)));
    assert_eq!(state.current_epoch_days, 1);

    // the old boundary is still the one that settles
    advance(&mut deps, T0 + DAY);
    assert_eq!(epoch_state(&deps).current_epoch, 0);

    let res = advance(&mut deps, T0 + DAY + 1);
    assert!(res.events.iter().any(|e| e.ty == "farming_epoch_advanced"));
    let state = epoch_state(&deps);
    assert_eq!(state.current_epoch, 1);
    assert_eq!(state.current_epoch_days, 7);
    assert_eq!(
        state.epoch_end_time,
        Some(Timestamp::from_seconds(T0 + DAY + 1 + 7 * DAY))
    );
    assert_eq!(state.last_epoch_time, Some(Timestamp::from_seconds(T0 + DAY + 1)));

    advance(&mut deps, T0 + 3 * DAY);
    assert_eq!(epoch_state(&deps).current_epoch, 1);
}

#[test]
fn test_genesis_roundtrip_after_activity() {
    let mut deps = mock_dependencies();
    setup_farming(&mut deps);

    let pool = deps.api.addr_make("pool");
    let alice = deps.api.addr_make("alice");
    propose(
        &mut deps,
        vec![public_plan(
            "exported",
            &pool,
            weights(&[("uatom", 100)]),
            T0,
            T0 + 30 * DAY,
            Some(coins(10, "ustake")),
            None,
        )],
    );
    fund_pool(&mut deps, &pool, &coins(100, "ustake"));
    stake(&mut deps, &alice, T0, &coins(3, "uatom"));
    advance(&mut deps, T0);
    advance(&mut deps, T0 + DAY + 1);
    advance(&mut deps, T0 + 2 * DAY + 2);

    let res = query(deps.as_ref(), mock_env(), QueryMsg::ExportGenesis {}).unwrap();
    let genesis: GenesisState = from_json(res).unwrap();
    assert_eq!(genesis.last_plan_id, 1);
    assert_eq!(genesis.epoch_state.current_epoch, 2);

    // Backing funds: 3uatom staked, 20ustake in the rewards reserve (10 of it
    // undistributed from the first epoch), 80ustake in the pool
    let backing = vec![coin(3, "uatom"), coin(100, "ustake")];

    let mut fresh = mock_dependencies();
    let admin = fresh.api.addr_make("admin");
    let mut msg = instantiate_msg();
    msg.genesis = Some(genesis.clone());

    let short = msg.clone();
    let err = instantiate(
        fresh.as_mut(),
        env_at(T0),
        message_info(&admin, &[coin(3, "uatom")]),
        short,
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::GenesisFundsMismatch { .. }));

    let mut fresh = mock_dependencies();
    instantiate(
        fresh.as_mut(),
        env_at(T0 + 2 * DAY + 3),
        message_info(&admin, &backing),
        msg,
    )
    .unwrap();
    let res = query(fresh.as_ref(), mock_env(), QueryMsg::ExportGenesis {}).unwrap();
    let exported: GenesisState = from_json(res).unwrap();
    assert_eq!(exported, genesis);
    assert_eq!(rewards_of(&fresh, &alice).total, coins(10, "ustake"));

    // The imported engine keeps running from the exported epoch
    advance(&mut fresh, T0 + 3 * DAY + 3);
    assert_eq!(rewards_of(&fresh, &alice).total, coins(20, "ustake"));
    assert!(broken_invariants(&fresh).is_empty());
}

// ─── Property: the staking reserve always matches the staking records ───

#[derive(Debug, Clone)]
enum Op {
    Stake { farmer: usize, amount: u128 },
    Unstake { farmer: usize, amount: u128 },
    Advance { seconds: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..3, 1u128..1_000).prop_map(|(farmer, amount)| Op::Stake { farmer, amount }),
        (0usize..3, 1u128..1_000).prop_map(|(farmer, amount)| Op::Unstake { farmer, amount }),
        (0u64..2 * DAY).prop_map(|seconds| Op::Advance { seconds }),
    ]
}

fn staked_total(deps: &Deps) -> Vec<Coin> {
    let res = query(
        deps.as_ref(),
        mock_env(),
        QueryMsg::TotalStaked {
            staking_coin_denom: "uatom".to_string(),
        },
    )
    .unwrap();
    let total: TotalStakedResponse = from_json(res).unwrap();
    let sum = total.queued_amount + total.staked_amount;
    if sum.is_zero() {
        vec![]
    } else {
        vec![Coin::new(sum, "uatom")]
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn staking_reserve_matches_records(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let mut deps = mock_dependencies();
        setup_farming(&mut deps);

        let pool = deps.api.addr_make("pool");
        propose(
            &mut deps,
            vec![public_plan(
                "drip",
                &pool,
                weights(&[("uatom", 100)]),
                T0,
                T0 + 365 * DAY,
                None,
                Some(Decimal::percent(7)),
            )],
        );
        fund_pool(&mut deps, &pool, &coins(1_000_000, "ustake"));

        let farmers: Vec<Addr> = ["alice", "bob", "carol"]
            .iter()
            .map(|name| deps.api.addr_make(name))
            .collect();

        let mut now = T0;
        for op in ops {
            match op {
                Op::Stake { farmer, amount } => {
                    stake(&mut deps, &farmers[farmer], now, &coins(amount, "uatom"));
                }
                Op::Unstake { farmer, amount } => {
                    // Over-withdrawals fail before touching state
                    let _ = execute(
                        deps.as_mut(),
                        env_at(now),
                        message_info(&farmers[farmer], &[]),
                        ExecuteMsg::Unstake { amount: coins(amount, "uatom") },
                    );
                }
                Op::Advance { seconds } => {
                    now += seconds;
                    advance(&mut deps, now);
                }
            }

            prop_assert_eq!(reserves(&deps).staking_reserve, staked_total(&deps));
            prop_assert!(broken_invariants(&deps).is_empty());
        }
    }
}
