//! Integration tests for listing an account's collectibles.

mod common;

use alloy_primitives::{Address, U256};

use common::*;
use meebot::SimLedger;
use meebot_chain::contracts::{IMeeBotNFT, IMeeBotStaking};
use meebot_chain::{ContractReader, LedgerError, ResourceRegistry};
use meebot_shared::MAX_LISTED_NFTS;

fn script_collectible(ledger: &SimLedger, id: u64, holder: Address) {
    let token_id = U256::from(id);
    let uri = format!("ipfs://meebot/{id}");
    ledger.respond(NFT, &IMeeBotNFT::tokenURICall { tokenId: token_id }, uri);
    ledger.respond(NFT, &IMeeBotNFT::ownerOfCall { tokenId: token_id }, holder);
    ledger.respond(NFT, &IMeeBotNFT::getApprovedCall { tokenId: token_id }, Address::ZERO);
}

fn script_holdings(ledger: &SimLedger, balance: u64, staked: &[u64]) {
    ledger.respond(NFT, &IMeeBotNFT::balanceOfCall { owner: ALICE }, U256::from(balance));
    let staked: Vec<U256> = staked.iter().copied().map(U256::from).collect();
    ledger.respond(STAKING, &IMeeBotStaking::getStakedNFTsCall { user: ALICE }, staked);
}

fn ids(listing: &[meebot_chain::NftMetadata]) -> Vec<u64> {
    listing.iter().map(|meta| meta.token_id.to::<u64>()).collect()
}

#[tokio::test]
async fn test_owned_nfts_keep_only_the_accounts_tokens() {
    let ledger = SimLedger::new();
    let registry = registry();
    script_holdings(&ledger, 3, &[]);
    script_collectible(&ledger, 1, ALICE);
    script_collectible(&ledger, 2, BOB);
    script_collectible(&ledger, 3, ALICE);
    script_collectible(&ledger, 4, ALICE);

    let owned = ContractReader::new(&ledger, &registry).owned_nfts(ALICE).await.unwrap();

    assert_eq!(ids(&owned), [1, 3]);
    assert_eq!(owned[0].name, "MeeBot #1");
    assert_eq!(owned[0].image, "ipfs://meebot/1");
    assert_eq!(owned[0].owner, ALICE);
}

#[tokio::test]
async fn test_owned_nfts_scan_stops_at_the_cap() {
    let ledger = SimLedger::new();
    let registry = registry();
    script_holdings(&ledger, 25, &[]);
    for id in 1..=12 {
        script_collectible(&ledger, id, ALICE);
    }

    let owned = ContractReader::new(&ledger, &registry).owned_nfts(ALICE).await.unwrap();

    assert_eq!(owned.len(), usize::try_from(MAX_LISTED_NFTS).unwrap());
    assert_eq!(ids(&owned), (1..=MAX_LISTED_NFTS).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_stakeable_nfts_leave_out_staked_ids() {
    let ledger = SimLedger::new();
    let registry = registry();
    script_holdings(&ledger, 3, &[2]);
    for id in 1..=3 {
        script_collectible(&ledger, id, ALICE);
    }

    let reader = ContractReader::new(&ledger, &registry);

    assert_eq!(ids(&reader.owned_nfts(ALICE).await.unwrap()), [1, 2, 3]);
    assert_eq!(ids(&reader.stakeable_nfts(ALICE).await.unwrap()), [1, 3]);
}

#[tokio::test]
async fn test_unreadable_collectible_is_skipped() {
    let ledger = SimLedger::new();
    let registry = registry();
    script_holdings(&ledger, 3, &[]);
    script_collectible(&ledger, 1, ALICE);
    script_collectible(&ledger, 3, ALICE);

    let owned = ContractReader::new(&ledger, &registry).owned_nfts(ALICE).await.unwrap();

    assert_eq!(ids(&owned), [1, 3]);
}

#[tokio::test]
async fn test_transport_failure_aborts_the_listing() {
    let ledger = SimLedger::new();
    let registry = registry();
    script_holdings(&ledger, 2, &[]);
    script_collectible(&ledger, 1, ALICE);
    script_collectible(&ledger, 2, ALICE);
    ledger.fail_read(
        NFT,
        &IMeeBotNFT::ownerOfCall { tokenId: U256::from(2u64) },
        LedgerError::Transport("connection reset".into()),
    );

    let err = ContractReader::new(&ledger, &registry).owned_nfts(ALICE).await.unwrap_err();

    assert!(matches!(err, LedgerError::Transport(_)));
}

#[tokio::test]
async fn test_listing_without_collectible_address_is_empty() {
    let ledger = SimLedger::new();
    let registry = ResourceRegistry {
        nft: None,
        ..registry()
    };
    script_holdings(&ledger, 3, &[]);

    let reader = ContractReader::new(&ledger, &registry);

    assert!(reader.owned_nfts(ALICE).await.unwrap().is_empty());
    assert!(reader.stakeable_nfts(ALICE).await.unwrap().is_empty());
    assert_eq!(ledger.read_count(), 1);
}
