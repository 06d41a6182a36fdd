//! # Protocol Constants
//!
//! Defaults baked into the client. Everything here can be overridden by
//! `ClientConfig` except the event cap, which the store enforces structurally.

// =============================================================================
// CHAIN
// =============================================================================

/// Chain the contracts are deployed on (local Hardhat network).
pub const REQUIRED_CHAIN_ID: u64 = 31337;

/// Display name of the required chain.
pub const REQUIRED_CHAIN_NAME: &str = "Hardhat";

/// Default JSON-RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9545";

/// Default polling interval for log watching.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

// =============================================================================
// EVENT LOG
// =============================================================================

/// Maximum number of records kept in the event log.
pub const MAX_EVENTS: usize = 100;

// =============================================================================
// COLLECTIBLES
// =============================================================================

/// Most token ids scanned when listing an account's collectibles. Ids are
/// scanned from 1 upward since the collectible exposes no owner index.
pub const MAX_LISTED_NFTS: u64 = 10;

// =============================================================================
// TOKENS
// =============================================================================

/// Decimals assumed when the token does not answer `decimals()`.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// Decimals of the native currency.
pub const NATIVE_DECIMALS: u8 = 18;

/// Fallback symbol when the token does not answer `symbol()`.
pub const DEFAULT_TOKEN_SYMBOL: &str = "TOKEN";

/// Whole token units granted by the swap approval ("unlimited").
pub const SWAP_APPROVAL_WHOLE_UNITS: &str = "1000000000000000000000000";

// =============================================================================
// SWAP
// =============================================================================

/// Submission deadline window added to the latest block time (20 minutes).
pub const SWAP_DEADLINE_WINDOW_SECS: u64 = 60 * 20;

/// Default slippage tolerance in basis points (0.5%).
pub const DEFAULT_SLIPPAGE_BPS: u32 = 50;

/// Basis point denominator.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Default quoted rate: native units per whole token.
pub const DEFAULT_SWAP_RATE: &str = "0.0001";
