//! # Balance Refresher
//!
//! Re-reads every derived quantity for the connected account as one batch.
//! Either the whole batch lands in the store or none of it does.

use std::sync::Arc;

use alloy_primitives::U256;

use meebot_chain::{ContractReader, Ledger, ResourceRegistry};
use meebot_shared::{format_units, NATIVE_DECIMALS};
use meebot_state::{DerivedBalances, Store};

use crate::error::RefreshError;

/// What a refresh call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The batch landed.
    Applied,
    /// No account: balances were reset without a remote call.
    Reset,
    /// Not on the required chain: nothing was read.
    Skipped,
    /// The batch completed for an account that is no longer connected.
    Stale,
}

/// Runs refresh batches against one ledger.
pub struct Refresher<L> {
    ledger: Arc<L>,
    registry: ResourceRegistry,
    required_chain_id: u64,
    store: Store,
}

impl<L> Clone for Refresher<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            registry: self.registry,
            required_chain_id: self.required_chain_id,
            store: self.store.clone(),
        }
    }
}

impl<L: Ledger> Refresher<L> {
    /// Creates a refresher.
    #[must_use]
    pub const fn new(
        ledger: Arc<L>,
        registry: ResourceRegistry,
        required_chain_id: u64,
        store: Store,
    ) -> Self {
        Self {
            ledger,
            registry,
            required_chain_id,
            store,
        }
    }

    /// Refreshes derived state for whoever is connected right now.
    ///
    /// On failure the previous balances stay, and the error message is
    /// written to the store.
    pub async fn refresh(&self) -> Result<RefreshOutcome, RefreshError> {
        let (account, chain_id) = self.store.read(|s| (s.account, s.chain_id));
        let Some(account) = account else {
            self.store.reset_balances();
            return Ok(RefreshOutcome::Reset);
        };
        if chain_id != Some(self.required_chain_id) {
            tracing::debug!(?chain_id, "not on the required chain, skipping refresh");
            return Ok(RefreshOutcome::Skipped);
        }

        let _busy = self.store.busy().guard();
        let reader = ContractReader::new(self.ledger.as_ref(), &self.registry);

        let swap_allowance = async {
            match self.registry.swap {
                Some(swap) => reader.token_allowance(account, swap).await,
                None => Ok(U256::ZERO),
            }
        };

        let batch = tokio::try_join!(
            reader.token_decimals(),
            reader.token_symbol(),
            reader.token_balance(account),
            reader.nft_balance(account),
            reader.staked_nfts(account),
            reader.reward_rate(),
            reader.earned(account),
            reader.native_balance(account),
            swap_allowance,
        );

        let (decimals, symbol, token, nft, staked, rate, earned, native, allowance) = match batch {
            Ok(values) => values,
            Err(e) => {
                let err = RefreshError::from(e);
                tracing::error!(
                    %account,
                    error = %err,
                    "refresh failed, keeping previous balances"
                );
                self.store.set_error(err.to_string());
                return Err(err);
            }
        };

        let balances = DerivedBalances {
            nft_balance: nft.to_string(),
            token_balance: format_units(token, decimals),
            staking_balance: staked.len().to_string(),
            reward_rate: format_units(rate, decimals),
            earned: format_units(earned, decimals),
            native_balance: format_units(native, NATIVE_DECIMALS),
            swap_allowance: format_units(allowance, decimals),
            token_decimals: decimals,
            token_symbol: symbol,
            staked_token_ids: staked,
        };

        if self.store.apply_refresh(account, balances) {
            tracing::info!(%account, "refresh applied");
            Ok(RefreshOutcome::Applied)
        } else {
            Ok(RefreshOutcome::Stale)
        }
    }
}
