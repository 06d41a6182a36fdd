//! # Actions
//!
//! Every user-initiated mutation, as one cycle:
//!
//! 1. clear the previous error
//! 2. local precondition check (no busy unit, no remote call)
//! 3. take one busy unit for the rest of the cycle
//! 4. gated actions only: read the current approval/allowance fresh
//! 5. simulate, submit, confirm
//! 6. append a record of what the user did, then refresh
//!
//! Approval and the gated action are separate cycles. Nothing here chains
//! them, and nothing serializes two concurrent calls of the same action.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, U256};

use meebot_chain::contracts::{IERC20, IMeeBotNFT, IMeeBotStaking, IMeeBotSwap};
use meebot_chain::{ClientConfig, ContractCall, ContractReader, Ledger, ResourceRegistry};
use meebot_shared::constants::SWAP_APPROVAL_WHOLE_UNITS;
use meebot_shared::{
    format_units, min_output, parse_units, quote_output, CanonicalEvent, EventArgs,
    ResourceKind, Slippage, UnitsResult, NATIVE_DECIMALS, SWAP_DEADLINE_WINDOW_SECS,
};
use meebot_state::Store;

use crate::error::{TxError, TxResult};
use crate::orchestrator::{Orchestrator, TxOutcome};
use crate::refresher::Refresher;

/// The user-facing actions, for error prefixes and logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Token allowance for some spender.
    ApproveToken,
    /// Collectible approval for the staking facility.
    ApproveNft,
    /// Stake a collectible.
    Stake,
    /// Unstake a collectible.
    Unstake,
    /// Claim staking rewards.
    Claim,
    /// Swap token for native currency.
    Swap,
    /// Transfer a collectible.
    TransferNft,
}

impl Action {
    /// Prefix of the error message written to the store.
    #[must_use]
    pub const fn failure_prefix(self) -> &'static str {
        match self {
            Self::ApproveToken => "Approval failed",
            Self::ApproveNft => "NFT Approval failed",
            Self::Stake => "Staking failed",
            Self::Unstake => "Unstaking failed",
            Self::Claim => "Claiming failed",
            Self::Swap => "Swap failed",
            Self::TransferNft => "Transfer failed",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Parameters of a swap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapRequest {
    /// Token amount in, as a decimal string.
    pub amount_in: String,
    /// Tolerance below the estimate.
    pub slippage: Slippage,
    /// Expected native amount out. `None` quotes at the configured rate.
    pub estimated_out: Option<String>,
}

impl SwapRequest {
    /// Swap `amount_in` with the default tolerance and a quoted estimate.
    #[must_use]
    pub fn new(amount_in: impl Into<String>) -> Self {
        Self {
            amount_in: amount_in.into(),
            slippage: Slippage::default(),
            estimated_out: None,
        }
    }

    /// Sets the tolerance.
    #[must_use]
    pub fn slippage(mut self, slippage: Slippage) -> Self {
        self.slippage = slippage;
        self
    }

    /// Sets the expected output.
    #[must_use]
    pub fn estimated_out(mut self, estimated_out: impl Into<String>) -> Self {
        self.estimated_out = Some(estimated_out.into());
        self
    }
}

/// Runs actions against one ledger and one store.
pub struct ActionRunner<L> {
    ledger: Arc<L>,
    registry: ResourceRegistry,
    required_chain_id: u64,
    swap_rate: String,
    store: Store,
    orchestrator: Orchestrator<L>,
    refresher: Refresher<L>,
}

impl<L> Clone for ActionRunner<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            registry: self.registry,
            required_chain_id: self.required_chain_id,
            swap_rate: self.swap_rate.clone(),
            store: self.store.clone(),
            orchestrator: self.orchestrator.clone(),
            refresher: self.refresher.clone(),
        }
    }
}

impl<L: Ledger> ActionRunner<L> {
    /// Creates a runner.
    #[must_use]
    pub fn new(ledger: Arc<L>, config: &ClientConfig, store: Store) -> Self {
        let refresher = Refresher::new(
            Arc::clone(&ledger),
            config.resources,
            config.chain.id,
            store.clone(),
        );
        Self {
            orchestrator: Orchestrator::new(Arc::clone(&ledger)),
            ledger,
            registry: config.resources,
            required_chain_id: config.chain.id,
            swap_rate: config.swap.rate.clone(),
            store,
            refresher,
        }
    }

    /// The refresher actions run after confirming.
    #[must_use]
    pub const fn refresher(&self) -> &Refresher<L> {
        &self.refresher
    }

    // -------------------------------------------------------------------------
    // Token
    // -------------------------------------------------------------------------

    /// Lets `spender` pull up to `amount` tokens.
    pub async fn approve_token(&self, spender: Address, amount: &str) -> TxResult<TxOutcome> {
        self.store.clear_error();
        let result = self.try_approve_token(spender, amount, false).await;
        self.finish(Action::ApproveToken, result)
    }

    /// Grants the swap facility an effectively unlimited allowance.
    pub async fn approve_swap(&self) -> TxResult<TxOutcome> {
        self.store.clear_error();
        let result = match self.resource(ResourceKind::Swap) {
            Ok(swap) => self.try_approve_token(swap, SWAP_APPROVAL_WHOLE_UNITS, true).await,
            Err(e) => Err(e),
        };
        self.finish(Action::ApproveToken, result)
    }

    async fn try_approve_token(
        &self,
        spender: Address,
        amount: &str,
        unlimited: bool,
    ) -> TxResult<TxOutcome> {
        let account = self.account()?;
        let token = self.resource(ResourceKind::Token)?;
        let decimals = self.store.read(|s| s.balances.token_decimals);
        let value = parse_units(amount, decimals)
            .map_err(|e| TxError::MissingPrecondition(format!("Invalid amount: {e}")))?;
        if value.is_zero() {
            return Err(TxError::MissingPrecondition("Please enter a valid amount.".into()));
        }

        let _busy = self.store.busy().guard();
        let call = IERC20::approveCall { spender, amount: value };
        let outcome = self.execute(token, account, &call).await?;

        let (name, shown) = if unlimited {
            ("Approval (Swap)", "Unlimited".to_owned())
        } else {
            ("Token Approved", amount.trim().to_owned())
        };
        let args = EventArgs::new().with("spender", spender).with("amount", shown);
        self.after_confirmed(ResourceKind::Token, name, args, &outcome).await;
        Ok(outcome)
    }

    // -------------------------------------------------------------------------
    // Collectible
    // -------------------------------------------------------------------------

    /// Approves the staking facility to move `token_id`.
    pub async fn approve_nft(&self, token_id: U256) -> TxResult<TxOutcome> {
        self.store.clear_error();
        let result = self.try_approve_nft(token_id).await;
        self.finish(Action::ApproveNft, result)
    }

    async fn try_approve_nft(&self, token_id: U256) -> TxResult<TxOutcome> {
        let account = self.account()?;
        let nft = self.resource(ResourceKind::Nft)?;
        let staking = self.resource(ResourceKind::Staking)?;

        let _busy = self.store.busy().guard();
        let call = IMeeBotNFT::approveCall { to: staking, tokenId: token_id };
        let outcome = self.execute(nft, account, &call).await?;

        let args = EventArgs::new().with("tokenId", token_id).with("approved", staking);
        self.after_confirmed(ResourceKind::Nft, "NFT Approved", args, &outcome).await;
        Ok(outcome)
    }

    /// Transfers `token_id` from the connected account to `to`.
    pub async fn transfer_nft(&self, to: Address, token_id: U256) -> TxResult<TxOutcome> {
        self.store.clear_error();
        let result = self.try_transfer_nft(to, token_id).await;
        self.finish(Action::TransferNft, result)
    }

    async fn try_transfer_nft(&self, to: Address, token_id: U256) -> TxResult<TxOutcome> {
        let account = self.account()?;
        let nft = self.resource(ResourceKind::Nft)?;
        if to.is_zero() {
            return Err(TxError::MissingPrecondition("Recipient address is missing.".into()));
        }

        let _busy = self.store.busy().guard();
        let call = IMeeBotNFT::transferFromCall { from: account, to, tokenId: token_id };
        let outcome = self.execute(nft, account, &call).await?;

        let args = EventArgs::new()
            .with("from", account)
            .with("to", to)
            .with("tokenId", token_id);
        self.after_confirmed(ResourceKind::Nft, "NFT Transferred", args, &outcome).await;
        Ok(outcome)
    }

    // -------------------------------------------------------------------------
    // Staking
    // -------------------------------------------------------------------------

    /// Stakes `token_id`. Fails with [`TxError::NotAuthorized`] unless the
    /// staking facility is the approved operator of the collectible.
    pub async fn stake(&self, token_id: U256) -> TxResult<TxOutcome> {
        self.store.clear_error();
        let result = self.try_stake(token_id).await;
        self.finish(Action::Stake, result)
    }

    async fn try_stake(&self, token_id: U256) -> TxResult<TxOutcome> {
        let account = self.account()?;
        self.resource(ResourceKind::Nft)?;
        let staking = self.resource(ResourceKind::Staking)?;

        let _busy = self.store.busy().guard();
        let approved = self
            .reader()
            .nft_approved(token_id)
            .await
            .map_err(TxError::SimulationRejected)?;
        if approved != Some(staking) {
            tracing::warn!(%token_id, ?approved, "stake attempted without approval");
            return Err(TxError::NotAuthorized(
                "NFT not approved. Please approve first.".into(),
            ));
        }

        let call = IMeeBotStaking::stakeCall { tokenId: token_id };
        let outcome = self.execute(staking, account, &call).await?;

        let args = EventArgs::new().with("tokenId", token_id);
        self.after_confirmed(ResourceKind::Staking, "NFT Staked", args, &outcome).await;
        Ok(outcome)
    }

    /// Unstakes `token_id`.
    pub async fn unstake(&self, token_id: U256) -> TxResult<TxOutcome> {
        self.store.clear_error();
        let result = self.try_unstake(token_id).await;
        self.finish(Action::Unstake, result)
    }

    async fn try_unstake(&self, token_id: U256) -> TxResult<TxOutcome> {
        let account = self.account()?;
        let staking = self.resource(ResourceKind::Staking)?;

        let _busy = self.store.busy().guard();
        let call = IMeeBotStaking::unstakeCall { tokenId: token_id };
        let outcome = self.execute(staking, account, &call).await?;

        let args = EventArgs::new().with("tokenId", token_id);
        self.after_confirmed(ResourceKind::Staking, "NFT Unstaked", args, &outcome).await;
        Ok(outcome)
    }

    /// Claims accrued rewards.
    pub async fn claim_rewards(&self) -> TxResult<TxOutcome> {
        self.store.clear_error();
        let result = self.try_claim().await;
        self.finish(Action::Claim, result)
    }

    async fn try_claim(&self) -> TxResult<TxOutcome> {
        let account = self.account()?;
        let staking = self.resource(ResourceKind::Staking)?;
        let earned = self.store.read(|s| s.balances.earned.clone());
        if earned == "0" {
            return Err(TxError::MissingPrecondition("No rewards to claim.".into()));
        }

        let _busy = self.store.busy().guard();
        let outcome = self
            .execute(staking, account, &IMeeBotStaking::claimRewardCall {})
            .await?;

        let args = EventArgs::new().with("amount", earned);
        self.after_confirmed(ResourceKind::Staking, "Rewards Claimed", args, &outcome).await;
        Ok(outcome)
    }

    // -------------------------------------------------------------------------
    // Swap
    // -------------------------------------------------------------------------

    /// Native amount `amount_in` tokens fetch at the configured rate.
    pub fn estimate_swap_output(&self, amount_in: &str) -> UnitsResult<String> {
        let decimals = self.store.read(|s| s.balances.token_decimals);
        let amount = parse_units(amount_in, decimals)?;
        let rate = parse_units(&self.swap_rate, NATIVE_DECIMALS)?;
        let out = quote_output(amount, decimals, rate)?;
        Ok(format_units(out, NATIVE_DECIMALS))
    }

    /// Swaps tokens for native currency.
    ///
    /// The minimum output is `estimate × (1 − slippage)` and the deadline is
    /// the latest block time plus twenty minutes; both go into the single
    /// simulation. Fails with [`TxError::NotAuthorized`] if the current
    /// allowance of the swap facility is below `amount_in`.
    pub async fn swap(&self, request: &SwapRequest) -> TxResult<TxOutcome> {
        self.store.clear_error();
        let result = self.try_swap(request).await;
        self.finish(Action::Swap, result)
    }

    async fn try_swap(&self, request: &SwapRequest) -> TxResult<TxOutcome> {
        let account = self.account()?;
        self.resource(ResourceKind::Token)?;
        let swap = self.resource(ResourceKind::Swap)?;

        let invalid = || TxError::MissingPrecondition("Please enter a valid amount.".into());
        let (decimals, symbol, held) = self.store.read(|s| {
            (
                s.balances.token_decimals,
                s.balances.token_symbol.clone(),
                s.balances.token_balance.clone(),
            )
        });
        let amount_in = parse_units(&request.amount_in, decimals).map_err(|_| invalid())?;
        if amount_in.is_zero() {
            return Err(invalid());
        }
        let held = parse_units(&held, decimals).unwrap_or(U256::ZERO);
        if held < amount_in {
            return Err(TxError::MissingPrecondition(format!("Insufficient {symbol} balance.")));
        }

        let estimated_out = match &request.estimated_out {
            Some(estimate) => estimate.trim().to_owned(),
            None => self.estimate_swap_output(&request.amount_in).map_err(|_| invalid())?,
        };
        let estimated = parse_units(&estimated_out, NATIVE_DECIMALS).map_err(|_| invalid())?;
        let amount_out_min = min_output(estimated, request.slippage).map_err(|_| invalid())?;
        if amount_out_min.is_zero() {
            return Err(TxError::MissingPrecondition("Estimated output is zero.".into()));
        }

        let _busy = self.store.busy().guard();
        let allowance = self
            .reader()
            .token_allowance(account, swap)
            .await
            .map_err(TxError::SimulationRejected)?;
        if allowance < amount_in {
            tracing::warn!(%allowance, %amount_in, "swap attempted without allowance");
            return Err(TxError::NotAuthorized(format!(
                "{symbol} not approved. Please approve first."
            )));
        }

        let now = self
            .ledger
            .latest_block_timestamp()
            .await
            .map_err(TxError::SimulationRejected)?;
        let deadline = U256::from(now.saturating_add(SWAP_DEADLINE_WINDOW_SECS));

        let call = IMeeBotSwap::swapExactMTKForETHCall {
            amountIn: amount_in,
            amountOutMin: amount_out_min,
            to: account,
            deadline,
        };
        tracing::info!(
            %amount_in,
            %amount_out_min,
            %deadline,
            slippage = %request.slippage,
            "submitting swap"
        );
        let outcome = self.execute(swap, account, &call).await?;

        let args = EventArgs::new()
            .with("from", symbol)
            .with("to", "ETH")
            .with("amountIn", request.amount_in.trim())
            .with("amountOut", estimated_out);
        self.after_confirmed(ResourceKind::Swap, "Tokens Swapped", args, &outcome).await;
        Ok(outcome)
    }

    // -------------------------------------------------------------------------
    // Shared steps
    // -------------------------------------------------------------------------

    fn reader(&self) -> ContractReader<'_, L> {
        ContractReader::new(self.ledger.as_ref(), &self.registry)
    }

    fn account(&self) -> TxResult<Address> {
        let (account, chain_id) = self.store.read(|s| (s.account, s.chain_id));
        let Some(account) = account else {
            return Err(TxError::MissingPrecondition("Wallet not connected.".into()));
        };
        if chain_id != Some(self.required_chain_id) {
            return Err(TxError::MissingPrecondition(
                "Wrong network. Switch networks and try again.".into(),
            ));
        }
        Ok(account)
    }

    fn resource(&self, kind: ResourceKind) -> TxResult<Address> {
        self.registry.address(kind).ok_or_else(|| {
            TxError::MissingPrecondition(format!("{} contract address missing.", kind.label()))
        })
    }

    async fn execute<C: alloy_sol_types::SolCall>(
        &self,
        to: Address,
        account: Address,
        call: &C,
    ) -> TxResult<TxOutcome> {
        let call = ContractCall::new(to, call).from_account(account);
        self.orchestrator.execute(call).await
    }

    async fn after_confirmed(
        &self,
        kind: ResourceKind,
        name: &str,
        args: EventArgs,
        outcome: &TxOutcome,
    ) {
        self.store
            .append_event(CanonicalEvent::now(kind, name, args, outcome.tx_hash));
        if let Err(e) = self.refresher.refresh().await {
            tracing::warn!(error = %e, "refresh after confirmed transaction failed");
        }
    }

    fn finish<T>(&self, action: Action, result: TxResult<T>) -> TxResult<T> {
        if let Err(e) = &result {
            let message = if e.is_precondition() {
                e.to_string()
            } else {
                format!("{}: {e}", action.failure_prefix())
            };
            tracing::error!(%action, error = %e, "action failed");
            self.store.set_error(message);
        }
        result
    }
}
