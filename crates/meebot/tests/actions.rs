//! Integration tests for user actions against the simulated ledger.

mod common;

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;

use common::*;
use meebot::{ConfirmMode, SimLedger, SwapRequest, TxError};
use meebot_chain::contracts::{IMeeBotNFT, IMeeBotStaking, IMeeBotSwap};
use meebot_chain::LedgerError;
use meebot_shared::{ArgValue, ResourceKind, Slippage, SWAP_DEADLINE_WINDOW_SECS};

fn token(id: u64) -> U256 {
    U256::from(id)
}

#[tokio::test]
async fn test_stake_without_approval_never_reaches_the_ledger() {
    let (ledger, session, _wallet) = connected_session().await;
    script_approved(&ledger, token(1), Address::ZERO);

    let err = session.actions().stake(token(1)).await.unwrap_err();

    assert!(matches!(err, TxError::NotAuthorized(_)));
    assert!(ledger.simulated().is_empty());
    assert!(ledger.submitted().is_empty());
    assert_eq!(
        session.store().error().as_deref(),
        Some("NFT not approved. Please approve first.")
    );
    assert_eq!(session.store().loading_count(), 0);
}

#[tokio::test]
async fn test_approve_then_stake() {
    let (ledger, session, _wallet) = connected_session().await;
    let actions = session.actions();

    actions.approve_nft(token(1)).await.unwrap();
    let submitted = ledger.submitted();
    let approve = &submitted[0];
    assert_eq!(approve.to, NFT);
    assert_eq!(approve.from, Some(ALICE));
    let decoded = IMeeBotNFT::approveCall::abi_decode(&approve.input, true).unwrap();
    assert_eq!(decoded.to, STAKING);
    assert_eq!(decoded.tokenId, token(1));

    script_approved(&ledger, token(1), STAKING);
    let outcome = actions.stake(token(1)).await.unwrap();
    assert!(outcome.receipt.success);
    assert_eq!(ledger.submitted().len(), 2);

    let state = session.store().snapshot();
    assert!(state.error.is_none());
    let names: Vec<_> = state.events.iter().map(|e| e.event_name.as_str()).collect();
    assert_eq!(names, ["NFT Staked", "NFT Approved"]);
    let staked = state.events.latest().unwrap();
    assert_eq!(staked.resource, ResourceKind::Staking);
    assert_eq!(staked.transaction_ref, outcome.tx_hash);
    assert_eq!(staked.args.get("tokenId"), Some(&ArgValue::from(token(1))));
    assert_eq!(session.store().loading_count(), 0);
}

#[tokio::test]
async fn test_precondition_failures_make_no_remote_calls() {
    let (ledger, session, _wallet) = session().await;

    let err = session.actions().stake(token(1)).await.unwrap_err();

    assert!(matches!(err, TxError::MissingPrecondition(_)));
    assert!(ledger.calls().is_empty());
    assert_eq!(session.store().error().as_deref(), Some("Wallet not connected."));
}

#[tokio::test]
async fn test_missing_resource_is_a_precondition() {
    let ledger = std::sync::Arc::new(SimLedger::new());
    script_account(&ledger, ALICE, &Holdings::default());
    let mut config = config();
    config.resources.staking = None;
    let (wallet, status) = tokio::sync::watch::channel(connected());
    let session = meebot::Session::start(ledger, config, status).await;
    wait_until(session.store(), |s| s.account == Some(ALICE)).await;

    let err = session.actions().unstake(token(1)).await.unwrap_err();
    assert_eq!(err.to_string(), "Staking contract address missing.");
    drop(wallet);
}

#[tokio::test]
async fn test_simulation_rejection_is_prefixed_and_not_submitted() {
    let (ledger, session, _wallet) = connected_session().await;
    ledger.reject_simulation::<IMeeBotStaking::unstakeCall>(STAKING, "Not the staker");

    let err = session.actions().unstake(token(9)).await.unwrap_err();

    assert!(matches!(err, TxError::SimulationRejected(_)));
    assert!(ledger.submitted().is_empty());
    assert_eq!(
        session.store().error().as_deref(),
        Some("Unstaking failed: Not the staker")
    );
    assert_eq!(session.store().loading_count(), 0);
}

#[tokio::test]
async fn test_reverted_confirmation() {
    let (ledger, session, _wallet) = connected_session().await;
    ledger.confirm_with(ConfirmMode::Revert);

    let err = session.actions().unstake(token(7)).await.unwrap_err();

    assert!(matches!(err, TxError::ConfirmationFailed { .. }));
    assert_eq!(ledger.submitted().len(), 1);
    assert!(session.store().error().unwrap().starts_with("Unstaking failed: transaction "));
    assert!(session.store().read(|s| s.events.is_empty()));
}

#[tokio::test]
async fn test_error_clears_on_next_action() {
    let (ledger, session, _wallet) = connected_session().await;
    ledger.reject_simulation::<IMeeBotStaking::unstakeCall>(STAKING, "Not the staker");
    session.actions().unstake(token(9)).await.unwrap_err();
    assert!(session.store().error().is_some());

    session.actions().claim_rewards().await.unwrap();
    assert!(session.store().error().is_none());
}

#[tokio::test]
async fn test_submission_failure_is_prefixed() {
    let (ledger, session, _wallet) = connected_session().await;
    ledger.fail_submissions(LedgerError::Rejected { reason: "nonce too low".into() });

    let err = session.actions().claim_rewards().await.unwrap_err();

    assert!(matches!(err, TxError::SubmissionFailed(_)));
    assert_eq!(session.store().error().as_deref(), Some("Claiming failed: nonce too low"));
}

#[tokio::test]
async fn test_claim_records_the_claimed_amount() {
    let (ledger, session, _wallet) = connected_session().await;

    session.actions().claim_rewards().await.unwrap();

    let submitted = ledger.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].method, "claimReward()");
    let record = session.store().read(|s| s.events.latest().cloned()).unwrap();
    assert_eq!(record.event_name, "Rewards Claimed");
    assert_eq!(record.args.get("amount"), Some(&ArgValue::from("3.5")));
}

#[tokio::test]
async fn test_claim_with_nothing_earned() {
    let ledger = std::sync::Arc::new(SimLedger::new());
    let holdings = Holdings {
        earned: U256::ZERO,
        ..Holdings::default()
    };
    script_account(&ledger, ALICE, &holdings);
    let (wallet, status) = tokio::sync::watch::channel(connected());
    let session = meebot::Session::start(std::sync::Arc::clone(&ledger), config(), status).await;
    wait_until(session.store(), |s| s.balances.token_balance == "250").await;

    let err = session.actions().claim_rewards().await.unwrap_err();
    assert_eq!(err.to_string(), "No rewards to claim.");
    assert!(ledger.simulated().is_empty());
    drop(wallet);
}

#[tokio::test]
async fn test_transfer_nft() {
    let (ledger, session, _wallet) = connected_session().await;

    session.actions().transfer_nft(BOB, token(4)).await.unwrap();

    let submitted = ledger.submitted();
    let call = IMeeBotNFT::transferFromCall::abi_decode(&submitted[0].input, true).unwrap();
    assert_eq!((call.from, call.to, call.tokenId), (ALICE, BOB, token(4)));
    let record = session.store().read(|s| s.events.latest().cloned()).unwrap();
    assert_eq!(record.event_name, "NFT Transferred");
    assert_eq!(record.args.get("to"), Some(&ArgValue::from(BOB)));
}

#[tokio::test]
async fn test_swap_passes_slippage_floor_and_deadline_to_simulation() {
    let ledger = std::sync::Arc::new(SimLedger::new());
    let holdings = Holdings {
        swap_allowance: ether("1000"),
        ..Holdings::default()
    };
    script_account(&ledger, ALICE, &holdings);
    let (wallet, status) = tokio::sync::watch::channel(connected());
    let session = meebot::Session::start(std::sync::Arc::clone(&ledger), config(), status).await;
    wait_until(session.store(), |s| s.balances.swap_allowance == "1000").await;
    wait_idle(session.store()).await;

    let request = SwapRequest::new("100")
        .slippage(Slippage::from_percent("0.5").unwrap())
        .estimated_out("10");
    session.actions().swap(&request).await.unwrap();

    let simulated = ledger.simulated();
    assert_eq!(simulated.len(), 1);
    assert_eq!(simulated[0].to, SWAP);
    let call = IMeeBotSwap::swapExactMTKForETHCall::abi_decode(&simulated[0].input, true).unwrap();
    assert_eq!(call.amountIn, ether("100"));
    assert_eq!(call.amountOutMin, ether("9.95"));
    assert_eq!(call.to, ALICE);
    assert_eq!(
        call.deadline,
        U256::from(SimLedger::GENESIS_TIMESTAMP + SWAP_DEADLINE_WINDOW_SECS)
    );

    let record = session.store().read(|s| s.events.latest().cloned()).unwrap();
    assert_eq!(record.event_name, "Tokens Swapped");
    assert_eq!(record.args.get("from"), Some(&ArgValue::from("MTK")));
    assert_eq!(record.args.get("amountOut"), Some(&ArgValue::from("10")));
    drop(wallet);
}

#[tokio::test]
async fn test_swap_without_allowance_is_not_authorized() {
    let (ledger, session, _wallet) = connected_session().await;

    let err = session.actions().swap(&SwapRequest::new("100")).await.unwrap_err();

    assert!(matches!(err, TxError::NotAuthorized(_)));
    assert_eq!(err.to_string(), "MTK not approved. Please approve first.");
    assert!(ledger.simulated().is_empty());
}

#[tokio::test]
async fn test_swap_rejects_amounts_above_balance() {
    let (ledger, session, _wallet) = connected_session().await;
    let reads_before = ledger.read_count();

    let err = session.actions().swap(&SwapRequest::new("300")).await.unwrap_err();

    assert_eq!(err.to_string(), "Insufficient MTK balance.");
    assert_eq!(ledger.read_count(), reads_before);

    let err = session.actions().swap(&SwapRequest::new("abc")).await.unwrap_err();
    assert_eq!(err.to_string(), "Please enter a valid amount.");
}

#[tokio::test]
async fn test_approve_swap_grants_large_allowance() {
    let (ledger, session, _wallet) = connected_session().await;

    session.actions().approve_swap().await.unwrap();

    let submitted = ledger.submitted();
    let approve = &submitted[0];
    assert_eq!(approve.to, TOKEN);
    assert_eq!(approve.method, "approve(address,uint256)");
    let record = session.store().read(|s| s.events.latest().cloned()).unwrap();
    assert_eq!(record.event_name, "Approval (Swap)");
    assert_eq!(record.args.get("amount"), Some(&ArgValue::from("Unlimited")));
}

#[tokio::test]
async fn test_estimate_uses_configured_rate() {
    let (_ledger, session, _wallet) = connected_session().await;

    assert_eq!(session.actions().estimate_swap_output("100").unwrap(), "0.01");
    assert_eq!(session.actions().estimate_swap_output("0").unwrap(), "0");
    assert!(session.actions().estimate_swap_output("1e3").is_err());
}

#[tokio::test]
async fn test_action_holds_one_busy_unit_until_confirmed() {
    let (ledger, session, _wallet) = connected_session().await;
    ledger.hold_confirmations();

    let actions = session.actions().clone();
    let pending = tokio::spawn(async move { actions.unstake(U256::from(7u64)).await });
    wait_busy(session.store(), 1).await;
    assert_eq!(ledger.submitted().len(), 1);

    ledger.release_confirmations();
    pending.await.unwrap().unwrap();
    wait_idle(session.store()).await;
}
