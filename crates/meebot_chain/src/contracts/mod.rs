//! # Contract Definitions
//!
//! Solidity interfaces of the four resources, generated with alloy's `sol!`
//! macro, plus the table of notification kinds each resource emits.

// The sol! macro generates code that we can't document, so allow missing_docs
#![allow(missing_docs)]

use alloy_primitives::B256;
use alloy_sol_types::{sol, SolEvent};

use meebot_shared::ResourceKind;

sol! {
    /// The fungible token (ERC-20).
    #[derive(Debug)]
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);

        function balanceOf(address account) external view returns (uint256 balance);
        function decimals() external view returns (uint8 decimalPlaces);
        function symbol() external view returns (string tokenSymbol);
        function allowance(address owner, address spender) external view returns (uint256 remaining);
        function approve(address spender, uint256 amount) external returns (bool success);
    }
}

sol! {
    /// The MeeBot collectible (ERC-721 with an owner).
    #[derive(Debug)]
    interface IMeeBotNFT {
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
        event Approval(address indexed owner, address indexed approved, uint256 indexed tokenId);
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

        function balanceOf(address owner) external view returns (uint256 balance);
        function ownerOf(uint256 tokenId) external view returns (address holder);
        function getApproved(uint256 tokenId) external view returns (address operator);
        function tokenURI(uint256 tokenId) external view returns (string uri);
        function approve(address to, uint256 tokenId) external;
        function transferFrom(address from, address to, uint256 tokenId) external;
    }
}

sol! {
    /// The staking facility: stake collectibles, accrue token rewards.
    #[derive(Debug)]
    interface IMeeBotStaking {
        event NFTStaked(address indexed user, uint256 indexed tokenId);
        event NFTUnstaked(address indexed user, uint256 indexed tokenId);
        event Claimed(address indexed user, uint256 amount);

        function getStakedNFTs(address user) external view returns (uint256[] tokenIds);
        function getRewardRate() external view returns (uint256 rate);
        function earned(address account) external view returns (uint256 amount);
        function stake(uint256 tokenId) external;
        function unstake(uint256 tokenId) external;
        function claimReward() external;
    }
}

sol! {
    /// The swap facility: fungible token in, native currency out.
    #[derive(Debug)]
    interface IMeeBotSwap {
        function swapExactMTKForETH(
            uint256 amountIn,
            uint256 amountOutMin,
            address to,
            uint256 deadline
        ) external returns (uint256 amountOut);
    }
}

/// One notification kind a resource emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WatchedEvent {
    /// Event name as declared in the interface.
    pub name: &'static str,
    /// Signature hash (first topic).
    pub topic0: B256,
}

const fn watched(name: &'static str, topic0: B256) -> WatchedEvent {
    WatchedEvent { name, topic0 }
}

/// Notification kinds the normalizer subscribes to for `kind`.
///
/// The swap facility emits nothing the client watches.
#[must_use]
pub fn watched_events(kind: ResourceKind) -> Vec<WatchedEvent> {
    match kind {
        ResourceKind::Token => vec![
            watched("Approval", IERC20::Approval::SIGNATURE_HASH),
            watched("Transfer", IERC20::Transfer::SIGNATURE_HASH),
        ],
        ResourceKind::Nft => vec![
            watched("Approval", IMeeBotNFT::Approval::SIGNATURE_HASH),
            watched("Transfer", IMeeBotNFT::Transfer::SIGNATURE_HASH),
            watched(
                "OwnershipTransferred",
                IMeeBotNFT::OwnershipTransferred::SIGNATURE_HASH,
            ),
        ],
        ResourceKind::Staking => vec![
            watched("NFTStaked", IMeeBotStaking::NFTStaked::SIGNATURE_HASH),
            watched("NFTUnstaked", IMeeBotStaking::NFTUnstaked::SIGNATURE_HASH),
            watched("Claimed", IMeeBotStaking::Claimed::SIGNATURE_HASH),
        ],
        ResourceKind::Swap => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watched_event_counts() {
        assert_eq!(watched_events(ResourceKind::Token).len(), 2);
        assert_eq!(watched_events(ResourceKind::Nft).len(), 3);
        assert_eq!(watched_events(ResourceKind::Staking).len(), 3);
        assert!(watched_events(ResourceKind::Swap).is_empty());
    }

    #[test]
    fn test_erc20_and_erc721_transfer_share_signature() {
        // Same canonical signature; only the indexed layout differs.
        assert_eq!(IERC20::Transfer::SIGNATURE_HASH, IMeeBotNFT::Transfer::SIGNATURE_HASH);
        assert_ne!(IERC20::Approval::SIGNATURE_HASH, IMeeBotStaking::Claimed::SIGNATURE_HASH);
    }
}
