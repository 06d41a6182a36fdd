//! # Notification Decoding
//!
//! Turns one raw ledger notification into one [`CanonicalEvent`].
//!
//! The resource kind decides which interface the log is decoded against:
//! token and collectible `Transfer` share a signature, so the topic alone is
//! not enough.

use alloy_sol_types::SolEvent;

use meebot_shared::{CanonicalEvent, EventArgs, ResourceKind};

use crate::contracts::{IERC20, IMeeBotNFT, IMeeBotStaking};
use crate::error::DecodeError;
use crate::ledger::RawLog;

/// Decodes `log` as a notification of `kind`.
///
/// # Errors
///
/// [`DecodeError::UnknownEvent`] if the signature is not one `kind` emits,
/// [`DecodeError::Malformed`] if topics or data do not fit the event.
pub fn decode_notification(
    kind: ResourceKind,
    log: &RawLog,
) -> Result<CanonicalEvent, DecodeError> {
    let topic0 = log.topics.first().copied();
    let (event_name, args) = match kind {
        ResourceKind::Token => decode_token(log)?,
        ResourceKind::Nft => decode_nft(log)?,
        ResourceKind::Staking => decode_staking(log)?,
        ResourceKind::Swap => return Err(DecodeError::UnknownEvent(topic0)),
    };
    Ok(CanonicalEvent::now(kind, event_name, args, log.transaction_hash))
}

fn decode_token(log: &RawLog) -> Result<(&'static str, EventArgs), DecodeError> {
    match log.topics.first() {
        Some(t) if *t == IERC20::Approval::SIGNATURE_HASH => {
            let ev = decode::<IERC20::Approval>(log, "Approval")?;
            Ok((
                "Approval",
                EventArgs::new()
                    .with("owner", ev.owner)
                    .with("spender", ev.spender)
                    .with("value", ev.value),
            ))
        }
        Some(t) if *t == IERC20::Transfer::SIGNATURE_HASH => {
            let ev = decode::<IERC20::Transfer>(log, "Transfer")?;
            Ok((
                "Transfer",
                EventArgs::new()
                    .with("from", ev.from)
                    .with("to", ev.to)
                    .with("value", ev.value),
            ))
        }
        other => Err(DecodeError::UnknownEvent(other.copied())),
    }
}

fn decode_nft(log: &RawLog) -> Result<(&'static str, EventArgs), DecodeError> {
    match log.topics.first() {
        Some(t) if *t == IMeeBotNFT::Approval::SIGNATURE_HASH => {
            let ev = decode::<IMeeBotNFT::Approval>(log, "Approval")?;
            Ok((
                "Approval",
                EventArgs::new()
                    .with("owner", ev.owner)
                    .with("approved", ev.approved)
                    .with("tokenId", ev.tokenId),
            ))
        }
        Some(t) if *t == IMeeBotNFT::Transfer::SIGNATURE_HASH => {
            let ev = decode::<IMeeBotNFT::Transfer>(log, "Transfer")?;
            Ok((
                "Transfer",
                EventArgs::new()
                    .with("from", ev.from)
                    .with("to", ev.to)
                    .with("tokenId", ev.tokenId),
            ))
        }
        Some(t) if *t == IMeeBotNFT::OwnershipTransferred::SIGNATURE_HASH => {
            let ev = decode::<IMeeBotNFT::OwnershipTransferred>(log, "OwnershipTransferred")?;
            Ok((
                "OwnershipTransferred",
                EventArgs::new()
                    .with("previousOwner", ev.previousOwner)
                    .with("newOwner", ev.newOwner),
            ))
        }
        other => Err(DecodeError::UnknownEvent(other.copied())),
    }
}

fn decode_staking(log: &RawLog) -> Result<(&'static str, EventArgs), DecodeError> {
    match log.topics.first() {
        Some(t) if *t == IMeeBotStaking::NFTStaked::SIGNATURE_HASH => {
            let ev = decode::<IMeeBotStaking::NFTStaked>(log, "NFTStaked")?;
            Ok(("NFTStaked", EventArgs::new().with("user", ev.user).with("tokenId", ev.tokenId)))
        }
        Some(t) if *t == IMeeBotStaking::NFTUnstaked::SIGNATURE_HASH => {
            let ev = decode::<IMeeBotStaking::NFTUnstaked>(log, "NFTUnstaked")?;
            Ok(("NFTUnstaked", EventArgs::new().with("user", ev.user).with("tokenId", ev.tokenId)))
        }
        Some(t) if *t == IMeeBotStaking::Claimed::SIGNATURE_HASH => {
            let ev = decode::<IMeeBotStaking::Claimed>(log, "Claimed")?;
            Ok(("Claimed", EventArgs::new().with("user", ev.user).with("amount", ev.amount)))
        }
        other => Err(DecodeError::UnknownEvent(other.copied())),
    }
}

fn decode<E: SolEvent>(log: &RawLog, event: &'static str) -> Result<E, DecodeError> {
    E::decode_raw_log(log.topics.iter().copied(), &log.data, true).map_err(|e| {
        DecodeError::Malformed {
            event,
            reason: e.to_string(),
        }
    })
}

/// Builds a raw log from a typed event (tests, benches, simulated ledgers).
#[must_use]
pub fn encode_notification<E: SolEvent>(
    event: &E,
    address: alloy_primitives::Address,
    transaction_hash: crate::ledger::TxHash,
) -> RawLog {
    RawLog {
        address,
        topics: event.encode_topics().into_iter().map(|t| t.0).collect(),
        data: event.encode_data().into(),
        transaction_hash,
        block_number: None,
        log_index: None,
    }
}
