//! # Canonical Event Records
//!
//! The display/export representation of everything that happened: decoded
//! ledger notifications and the synthetic records the client writes after a
//! confirmed action.
//!
//! Large integers are converted to decimal strings here, at the ingestion
//! boundary, so nothing downstream can round them.

use std::fmt;

use alloy_primitives::{Address, B256, U256};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Logical on-chain facility a record belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// The collectible (ERC-721) contract.
    Nft,
    /// The fungible (ERC-20) token contract.
    Token,
    /// The staking facility.
    Staking,
    /// The swap facility.
    Swap,
}

impl ResourceKind {
    /// Every resource kind, in registry order.
    pub const ALL: [Self; 4] = [Self::Nft, Self::Token, Self::Staking, Self::Swap];

    /// Registry key (`"nft"`, `"token"`, ...).
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Nft => "nft",
            Self::Token => "token",
            Self::Staking => "staking",
            Self::Swap => "swap",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Nft => "NFT",
            Self::Token => "Token",
            Self::Staking => "Staking",
            Self::Swap => "Swap",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A single argument value of a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgValue {
    /// An account or contract address.
    Address(Address),
    /// An unsigned integer, as an exact decimal string.
    Integer(String),
    /// Free text.
    Text(String),
    /// A flag.
    Bool(bool),
}

impl ArgValue {
    /// Plain string form used for search and display.
    #[must_use]
    pub fn as_plain_string(&self) -> String {
        match self {
            Self::Address(addr) => addr.to_checksum(None),
            Self::Integer(s) | Self::Text(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

impl From<U256> for ArgValue {
    fn from(value: U256) -> Self {
        Self::Integer(value.to_string())
    }
}

impl From<u64> for ArgValue {
    fn from(value: u64) -> Self {
        Self::Integer(value.to_string())
    }
}

impl From<Address> for ArgValue {
    fn from(value: Address) -> Self {
        Self::Address(value)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl Serialize for ArgValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Address(addr) => serializer.serialize_str(&addr.to_checksum(None)),
            Self::Integer(s) | Self::Text(s) => serializer.serialize_str(s),
            Self::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

/// Named arguments of a record, in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventArgs(Vec<(String, ArgValue)>);

impl EventArgs {
    /// Creates an empty argument list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends an argument (builder style).
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<ArgValue>) -> Self {
        self.0.push((name.to_owned(), value.into()));
        self
    }

    /// Looks up an argument by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for EventArgs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// The normalized representation of a notification or a user action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CanonicalEvent {
    /// When the client observed the record (RFC 3339, UTC).
    pub timestamp: String,
    /// Resource the record belongs to.
    #[serde(rename = "contract")]
    pub resource: ResourceKind,
    /// Event name (`Transfer`, `NFT Staked`, ...).
    #[serde(rename = "event")]
    pub event_name: String,
    /// Named arguments.
    pub args: EventArgs,
    /// Transaction that produced the record.
    #[serde(rename = "transactionHash")]
    pub transaction_ref: B256,
}

impl CanonicalEvent {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn now(
        resource: ResourceKind,
        event_name: impl Into<String>,
        args: EventArgs,
        transaction_ref: B256,
    ) -> Self {
        Self {
            timestamp: now_timestamp(),
            resource,
            event_name: event_name.into(),
            args,
            transaction_ref,
        }
    }

    /// Lowercased text covering name, resource, transaction and argument values.
    #[must_use]
    pub fn searchable_text(&self) -> String {
        let mut text = format!("{} {} {}", self.event_name, self.resource, self.transaction_ref);
        for (_, value) in self.args.iter() {
            text.push(' ');
            text.push_str(&value.as_plain_string());
        }
        text.to_lowercase()
    }
}

/// Current UTC time as RFC 3339.
#[must_use]
pub fn now_timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_args_are_exact_decimal() {
        let big = U256::from(10u64).pow(U256::from(30u64)) + U256::from(1u64);
        let value = ArgValue::from(big);
        assert_eq!(value, ArgValue::Integer("1000000000000000000000000000001".into()));
    }

    #[test]
    fn test_args_serialize_in_declaration_order() {
        let args = EventArgs::new()
            .with("tokenId", U256::from(7u64))
            .with("approved", Address::repeat_byte(0xaa))
            .with("flag", true);

        let json = serde_json::to_string(&args).unwrap();
        let token_pos = json.find("tokenId").unwrap();
        let approved_pos = json.find("approved").unwrap();
        assert!(token_pos < approved_pos);
        assert!(json.contains("\"tokenId\":\"7\""));
        assert!(json.contains("\"flag\":true"));
    }

    #[test]
    fn test_record_export_field_names() {
        let record = CanonicalEvent::now(
            ResourceKind::Staking,
            "NFT Staked",
            EventArgs::new().with("tokenId", 3u64),
            B256::repeat_byte(1),
        );
        let json: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert_eq!(json["contract"], "staking");
        assert_eq!(json["event"], "NFT Staked");
        assert_eq!(json["args"]["tokenId"], "3");
        assert!(json["transactionHash"].as_str().unwrap().starts_with("0x"));
    }

    #[test]
    fn test_searchable_text_is_lowercase() {
        let record = CanonicalEvent::now(
            ResourceKind::Token,
            "Approval",
            EventArgs::new().with("amount", "Unlimited"),
            B256::ZERO,
        );
        let text = record.searchable_text();
        assert!(text.contains("approval"));
        assert!(text.contains("token"));
        assert!(text.contains("unlimited"));
    }
}
