//! # Typed Contract Reads
//!
//! Read-only views over the four resources. A read against a resource with
//! no configured address answers the resource's zero value without touching
//! the ledger.

use alloy_primitives::{Address, U256};
use base64::Engine;
use serde::{Deserialize, Serialize};

use meebot_shared::constants::{DEFAULT_TOKEN_DECIMALS, DEFAULT_TOKEN_SYMBOL, MAX_LISTED_NFTS};

use crate::config::ResourceRegistry;
use crate::contracts::{IERC20, IMeeBotNFT, IMeeBotStaking};
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{read_call, Ledger};

const JSON_DATA_URI_PREFIX: &str = "data:application/json;base64,";

/// Display metadata of one collectible.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NftMetadata {
    /// Token id.
    #[serde(rename = "tokenId")]
    pub token_id: U256,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Image location.
    pub image: String,
    /// Current holder.
    pub owner: Address,
    /// Approved operator (zero if none).
    pub approved: Address,
}

#[derive(Deserialize)]
struct MetadataDocument {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    image: String,
}

/// Borrowed view of the ledger plus the registry.
#[derive(Clone, Copy, Debug)]
pub struct ContractReader<'a, L> {
    ledger: &'a L,
    registry: &'a ResourceRegistry,
}

impl<'a, L: Ledger> ContractReader<'a, L> {
    /// Creates a reader.
    #[must_use]
    pub const fn new(ledger: &'a L, registry: &'a ResourceRegistry) -> Self {
        Self { ledger, registry }
    }

    // -------------------------------------------------------------------------
    // Token
    // -------------------------------------------------------------------------

    /// Token balance of `account` in base units.
    pub async fn token_balance(&self, account: Address) -> LedgerResult<U256> {
        let Some(token) = self.registry.token else {
            return Ok(U256::ZERO);
        };
        Ok(read_call(self.ledger, token, &IERC20::balanceOfCall { account }).await?.balance)
    }

    /// Token decimals. Falls back to 18 if the token does not answer.
    pub async fn token_decimals(&self) -> LedgerResult<u8> {
        let Some(token) = self.registry.token else {
            return Ok(DEFAULT_TOKEN_DECIMALS);
        };
        match read_call(self.ledger, token, &IERC20::decimalsCall {}).await {
            Ok(ret) => Ok(ret.decimalPlaces),
            Err(LedgerError::Rejected { reason }) => {
                tracing::warn!(%reason, "decimals() rejected, assuming {DEFAULT_TOKEN_DECIMALS}");
                Ok(DEFAULT_TOKEN_DECIMALS)
            }
            Err(e) => Err(e),
        }
    }

    /// Token symbol. Falls back to `TOKEN` if the token does not answer.
    pub async fn token_symbol(&self) -> LedgerResult<String> {
        let Some(token) = self.registry.token else {
            return Ok(DEFAULT_TOKEN_SYMBOL.to_owned());
        };
        match read_call(self.ledger, token, &IERC20::symbolCall {}).await {
            Ok(ret) => Ok(ret.tokenSymbol),
            Err(LedgerError::Rejected { reason }) => {
                tracing::warn!(%reason, "symbol() rejected, using {DEFAULT_TOKEN_SYMBOL}");
                Ok(DEFAULT_TOKEN_SYMBOL.to_owned())
            }
            Err(e) => Err(e),
        }
    }

    /// Amount `spender` may pull from `owner`.
    pub async fn token_allowance(&self, owner: Address, spender: Address) -> LedgerResult<U256> {
        let Some(token) = self.registry.token else {
            return Ok(U256::ZERO);
        };
        let call = IERC20::allowanceCall { owner, spender };
        Ok(read_call(self.ledger, token, &call).await?.remaining)
    }

    // -------------------------------------------------------------------------
    // Collectible
    // -------------------------------------------------------------------------

    /// Number of collectibles `owner` holds.
    pub async fn nft_balance(&self, owner: Address) -> LedgerResult<U256> {
        let Some(nft) = self.registry.nft else {
            return Ok(U256::ZERO);
        };
        Ok(read_call(self.ledger, nft, &IMeeBotNFT::balanceOfCall { owner }).await?.balance)
    }

    /// Holder of `token_id`.
    pub async fn nft_owner_of(&self, token_id: U256) -> LedgerResult<Option<Address>> {
        let Some(nft) = self.registry.nft else {
            return Ok(None);
        };
        let call = IMeeBotNFT::ownerOfCall { tokenId: token_id };
        Ok(Some(read_call(self.ledger, nft, &call).await?.holder))
    }

    /// Operator approved for `token_id` (zero address if none).
    pub async fn nft_approved(&self, token_id: U256) -> LedgerResult<Option<Address>> {
        let Some(nft) = self.registry.nft else {
            return Ok(None);
        };
        let call = IMeeBotNFT::getApprovedCall { tokenId: token_id };
        Ok(Some(read_call(self.ledger, nft, &call).await?.operator))
    }

    /// Metadata URI of `token_id`.
    pub async fn nft_token_uri(&self, token_id: U256) -> LedgerResult<Option<String>> {
        let Some(nft) = self.registry.nft else {
            return Ok(None);
        };
        let call = IMeeBotNFT::tokenURICall { tokenId: token_id };
        Ok(Some(read_call(self.ledger, nft, &call).await?.uri))
    }

    /// Combines `tokenURI`, `ownerOf` and `getApproved` into display metadata.
    ///
    /// Inline `data:application/json;base64,` documents are decoded; any
    /// other URI gets a placeholder name and is used as the image location.
    pub async fn fetch_nft_metadata(&self, token_id: U256) -> LedgerResult<Option<NftMetadata>> {
        let (Some(uri), Some(owner), Some(approved)) = (
            self.nft_token_uri(token_id).await?,
            self.nft_owner_of(token_id).await?,
            self.nft_approved(token_id).await?,
        ) else {
            return Ok(None);
        };

        let placeholder = format!("MeeBot #{token_id}");
        let (name, description, image) = match uri.strip_prefix(JSON_DATA_URI_PREFIX) {
            Some(payload) => {
                let doc = decode_metadata_document(payload)?;
                (doc.name.unwrap_or(placeholder), doc.description, doc.image)
            }
            None => {
                let description = format!("A digital collectible {placeholder}.");
                (placeholder, description, uri)
            }
        };

        Ok(Some(NftMetadata {
            token_id,
            name,
            description,
            image,
            owner,
            approved,
        }))
    }

    /// Collectibles held by `account`, with metadata.
    ///
    /// Scans ids `1..=min(balance, MAX_LISTED_NFTS)` and keeps those whose
    /// holder is `account`. An id the ledger refuses to describe (burned,
    /// never minted, bad metadata) is skipped; transport errors abort.
    pub async fn owned_nfts(&self, account: Address) -> LedgerResult<Vec<NftMetadata>> {
        if self.registry.nft.is_none() {
            return Ok(Vec::new());
        }
        let balance = self.nft_balance(account).await?;
        let scan = balance.saturating_to::<u64>().min(MAX_LISTED_NFTS);

        let mut owned = Vec::new();
        for id in 1..=scan {
            let token_id = U256::from(id);
            match self.fetch_nft_metadata(token_id).await {
                Ok(Some(meta)) if meta.owner == account => owned.push(meta),
                Ok(_) => {}
                Err(LedgerError::Rejected { reason }) => {
                    tracing::debug!(%token_id, %reason, "collectible not readable, skipping");
                }
                Err(LedgerError::Decode(reason)) => {
                    tracing::warn!(%token_id, %reason, "collectible metadata malformed, skipping");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(owned)
    }

    /// Collectibles `account` holds and has not staked yet.
    pub async fn stakeable_nfts(&self, account: Address) -> LedgerResult<Vec<NftMetadata>> {
        let staked = self.staked_nfts(account).await?;
        let mut owned = self.owned_nfts(account).await?;
        owned.retain(|meta| !staked.contains(&meta.token_id));
        Ok(owned)
    }

    // -------------------------------------------------------------------------
    // Staking
    // -------------------------------------------------------------------------

    /// Token ids `user` has staked.
    pub async fn staked_nfts(&self, user: Address) -> LedgerResult<Vec<U256>> {
        let Some(staking) = self.registry.staking else {
            return Ok(Vec::new());
        };
        let call = IMeeBotStaking::getStakedNFTsCall { user };
        Ok(read_call(self.ledger, staking, &call).await?.tokenIds)
    }

    /// Global reward rate.
    pub async fn reward_rate(&self) -> LedgerResult<U256> {
        let Some(staking) = self.registry.staking else {
            return Ok(U256::ZERO);
        };
        Ok(read_call(self.ledger, staking, &IMeeBotStaking::getRewardRateCall {}).await?.rate)
    }

    /// Rewards `account` can claim.
    pub async fn earned(&self, account: Address) -> LedgerResult<U256> {
        let Some(staking) = self.registry.staking else {
            return Ok(U256::ZERO);
        };
        Ok(read_call(self.ledger, staking, &IMeeBotStaking::earnedCall { account }).await?.amount)
    }

    // -------------------------------------------------------------------------
    // Native
    // -------------------------------------------------------------------------

    /// Native currency balance.
    pub async fn native_balance(&self, account: Address) -> LedgerResult<U256> {
        self.ledger.native_balance(account).await
    }
}

fn decode_metadata_document(payload: &str) -> LedgerResult<MetadataDocument> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| LedgerError::Decode(format!("metadata base64: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| LedgerError::Decode(format!("metadata json: {e}")))
}
