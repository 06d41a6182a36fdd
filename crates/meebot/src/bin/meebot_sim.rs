//! # MeeBot Walk-through
//!
//! Runs the client against the simulated ledger and prints what the user
//! would see:
//! 1. Wallet connects, balances refresh
//! 2. Stakeable collectibles are listed
//! 3. Collectible approved, then staked
//! 4. Swap approved, then 100 tokens swapped at 0.5% slippage
//! 5. A notification from the token arrives
//! 6. The event log is exported as JSON
//!
//! Pass a TOML config path as the first argument to override the defaults.
//! Resources the file leaves out get the simulator's addresses.
//! `RUST_LOG=debug` shows every ledger call.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use meebot::{Session, SimLedger, SwapRequest, WalletStatus};
use meebot_chain::contracts::{IERC20, IMeeBotNFT, IMeeBotStaking};
use meebot_chain::events::encode_notification;
use meebot_chain::{ClientConfig, ResourceRegistry};
use meebot_shared::{parse_units, Slippage};
use meebot_state::{export_file_name, export_json, Store};

const NFT: Address = Address::new([0x11; 20]);
const TOKEN: Address = Address::new([0x22; 20]);
const STAKING: Address = Address::new([0x33; 20]);
const SWAP: Address = Address::new([0x44; 20]);
const USER: Address = Address::new([0xa1; 20]);

type BoxError = Box<dyn std::error::Error>;

/// Where each resource lives on the simulated ledger.
struct Deployment {
    nft: Address,
    token: Address,
    staking: Address,
    swap: Address,
}

fn load_config() -> Result<(ClientConfig, Deployment), BoxError> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    let ResourceRegistry {
        nft,
        token,
        staking,
        swap,
    } = &mut config.resources;
    let deployment = Deployment {
        nft: *nft.get_or_insert(NFT),
        token: *token.get_or_insert(TOKEN),
        staking: *staking.get_or_insert(STAKING),
        swap: *swap.get_or_insert(SWAP),
    };
    Ok((config, deployment))
}

fn script(ledger: &SimLedger, at: &Deployment) -> Result<(), BoxError> {
    let ether = |amount: &str| parse_units(amount, 18);

    ledger.respond(at.token, &IERC20::decimalsCall {}, 18u16);
    ledger.respond(at.token, &IERC20::symbolCall {}, "MTK".to_owned());
    ledger.respond(at.token, &IERC20::balanceOfCall { account: USER }, ether("500")?);
    ledger.respond(
        at.token,
        &IERC20::allowanceCall {
            owner: USER,
            spender: at.swap,
        },
        ether("1000000")?,
    );

    ledger.respond(at.nft, &IMeeBotNFT::balanceOfCall { owner: USER }, U256::from(3u64));
    for id in 1..=3u64 {
        let token_id = U256::from(id);
        let operator = if id == 1 { at.staking } else { Address::ZERO };
        let uri = format!("ipfs://meebot/{id}");
        ledger.respond(at.nft, &IMeeBotNFT::tokenURICall { tokenId: token_id }, uri);
        ledger.respond(at.nft, &IMeeBotNFT::ownerOfCall { tokenId: token_id }, USER);
        ledger.respond(at.nft, &IMeeBotNFT::getApprovedCall { tokenId: token_id }, operator);
    }

    ledger.respond(
        at.staking,
        &IMeeBotStaking::getStakedNFTsCall { user: USER },
        vec![U256::from(3u64)],
    );
    ledger.respond(at.staking, &IMeeBotStaking::getRewardRateCall {}, ether("0.1")?);
    ledger.respond(at.staking, &IMeeBotStaking::earnedCall { account: USER }, ether("0")?);
    ledger.set_native_balance(USER, ether("10")?);
    Ok(())
}

fn print_balances(store: &Store) {
    store.read(|state| {
        let b = &state.balances;
        println!(
            "  {} {} | {} NFT | {} staked | {} ETH",
            b.token_balance, b.token_symbol, b.nft_balance, b.staking_balance, b.native_balance
        );
    });
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), BoxError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let (config, deployment) = load_config()?;
    tracing::info!(
        rpc_url = %config.rpc_url,
        poll_interval_ms = config.poll_interval_ms,
        "simulated ledger standing in for the configured endpoint"
    );
    let poll_interval = Duration::from_millis(config.poll_interval_ms);
    let chain = config.chain.clone();

    let ledger = Arc::new(SimLedger::new());
    script(&ledger, &deployment)?;

    let (wallet, status) = watch::channel(WalletStatus::disconnected());
    let session = Session::start(Arc::clone(&ledger), config, status).await;
    let store = session.store().clone();

    println!("== connect");
    wallet.send_replace(WalletStatus::connected(USER, chain.id, chain.name));
    store.subscribe().wait_for(|s| s.account.is_some()).await?;
    session.refresher().refresh().await?;
    print_balances(&store);

    println!("== stakeable collectibles");
    for meta in session.reader().stakeable_nfts(USER).await? {
        println!("  #{} {} ({})", meta.token_id, meta.name, meta.image);
    }

    println!("== approve + stake collectible #1");
    let actions = session.actions();
    actions.approve_nft(U256::from(1u64)).await?;
    let staked = actions.stake(U256::from(1u64)).await?;
    println!("  staked in {}", staked.tx_hash);

    println!("== approve + swap 100 tokens");
    actions.approve_swap().await?;
    let estimate = actions.estimate_swap_output("100")?;
    let request = SwapRequest::new("100")
        .slippage(Slippage::from_percent("0.5")?)
        .estimated_out(estimate.clone());
    let swapped = actions.swap(&request).await?;
    println!("  expected {estimate} ETH, tx {}", swapped.tx_hash);
    print_balances(&store);

    println!("== notification");
    let transfer = IERC20::Transfer {
        from: USER,
        to: deployment.swap,
        value: parse_units("100", 18)?,
    };
    ledger.emit(encode_notification(&transfer, deployment.token, B256::repeat_byte(0x42)));
    tokio::time::sleep(poll_interval).await;

    let (file_name, json) = store.read(|state| {
        let name = export_file_name(time::OffsetDateTime::now_utc());
        (name, export_json(state.events.iter()))
    });
    println!("== {file_name}");
    println!("{}", json?);

    session.shutdown();
    Ok(())
}
