//! Shared fixtures for the client integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use tokio::sync::watch;

use meebot::{Session, SimLedger, WalletStatus};
use meebot_chain::contracts::{IERC20, IMeeBotNFT, IMeeBotStaking};
use meebot_chain::{ClientConfig, ResourceRegistry};
use meebot_shared::{parse_units, REQUIRED_CHAIN_ID, REQUIRED_CHAIN_NAME};
use meebot_state::Store;

pub const NFT: Address = Address::new([0x11; 20]);
pub const TOKEN: Address = Address::new([0x22; 20]);
pub const STAKING: Address = Address::new([0x33; 20]);
pub const SWAP: Address = Address::new([0x44; 20]);
pub const ALICE: Address = Address::new([0xa1; 20]);
pub const BOB: Address = Address::new([0xb0; 20]);

pub fn registry() -> ResourceRegistry {
    ResourceRegistry {
        nft: Some(NFT),
        token: Some(TOKEN),
        staking: Some(STAKING),
        swap: Some(SWAP),
    }
}

pub fn config() -> ClientConfig {
    ClientConfig {
        resources: registry(),
        ..ClientConfig::default()
    }
}

pub fn ether(amount: &str) -> U256 {
    parse_units(amount, 18).unwrap()
}

/// What the scripted ledger answers for one account.
#[derive(Clone, Debug)]
pub struct Holdings {
    pub tokens: U256,
    pub nfts: u64,
    pub staked: Vec<U256>,
    pub reward_rate: U256,
    pub earned: U256,
    pub swap_allowance: U256,
}

impl Default for Holdings {
    fn default() -> Self {
        Self {
            tokens: ether("250"),
            nfts: 2,
            staked: vec![U256::from(7u64)],
            reward_rate: ether("1"),
            earned: ether("3.5"),
            swap_allowance: U256::ZERO,
        }
    }
}

/// Scripts every read a refresh makes for `account`.
pub fn script_account(ledger: &SimLedger, account: Address, holdings: &Holdings) {
    ledger.respond(TOKEN, &IERC20::decimalsCall {}, 18u16);
    ledger.respond(TOKEN, &IERC20::symbolCall {}, "MTK".to_owned());
    ledger.respond(TOKEN, &IERC20::balanceOfCall { account }, holdings.tokens);
    ledger.respond(
        TOKEN,
        &IERC20::allowanceCall { owner: account, spender: SWAP },
        holdings.swap_allowance,
    );
    ledger.respond(NFT, &IMeeBotNFT::balanceOfCall { owner: account }, U256::from(holdings.nfts));
    ledger.respond(
        STAKING,
        &IMeeBotStaking::getStakedNFTsCall { user: account },
        holdings.staked.clone(),
    );
    ledger.respond(STAKING, &IMeeBotStaking::getRewardRateCall {}, holdings.reward_rate);
    ledger.respond(STAKING, &IMeeBotStaking::earnedCall { account }, holdings.earned);
    ledger.set_native_balance(account, ether("1.5"));
}

/// Marks `operator` as the approved operator of `token_id`.
pub fn script_approved(ledger: &SimLedger, token_id: U256, operator: Address) {
    ledger.respond(NFT, &IMeeBotNFT::getApprovedCall { tokenId: token_id }, operator);
}

pub fn connected() -> WalletStatus {
    WalletStatus::connected(ALICE, REQUIRED_CHAIN_ID, REQUIRED_CHAIN_NAME)
}

/// Session with ALICE scripted, wallet initially disconnected.
pub async fn session() -> (
    Arc<SimLedger>,
    Session<SimLedger>,
    watch::Sender<WalletStatus>,
) {
    let ledger = Arc::new(SimLedger::new());
    script_account(&ledger, ALICE, &Holdings::default());
    let (wallet, status) = watch::channel(WalletStatus::disconnected());
    let session = Session::start(Arc::clone(&ledger), config(), status).await;
    (ledger, session, wallet)
}

/// Session with ALICE connected and the first refresh landed.
pub async fn connected_session() -> (
    Arc<SimLedger>,
    Session<SimLedger>,
    watch::Sender<WalletStatus>,
) {
    let (ledger, session, wallet) = session().await;
    wallet.send_replace(connected());
    wait_until(session.store(), |s| s.balances.token_balance == "250").await;
    wait_idle(session.store()).await;
    (ledger, session, wallet)
}

pub async fn wait_until(store: &Store, pred: impl FnMut(&meebot_state::AppState) -> bool) {
    let mut rx = store.subscribe();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
        .await
        .expect("timed out waiting for state")
        .expect("store dropped");
}

pub async fn wait_busy(store: &Store, count: usize) {
    let mut rx = store.busy().subscribe();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|c| *c == count))
        .await
        .expect("timed out waiting for busy count")
        .expect("busy signal dropped");
}

pub async fn wait_idle(store: &Store) {
    wait_busy(store, 0).await;
}
