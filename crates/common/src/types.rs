use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tiny_keccak::{Hasher, Keccak};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address must start with 0x: {0}")]
    MissingPrefix(String),
    #[error("address must have 40 hex digits, got {len}: {value}")]
    BadLength { value: String, len: usize },
    #[error("address contains non-hex characters: {0}")]
    NotHex(String),
}

/// 20-byte account address.
///
/// Stored as the lowercase hex body so that equality, hashing and the
/// prefix/suffix comparisons never depend on how upstream cased the input.
/// Serializes to the EIP-55 checksummed form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    body: String,
}

impl Address {
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let body = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| AddressError::MissingPrefix(s.to_string()))?;
        if body.len() != 40 {
            return Err(AddressError::BadLength {
                value: s.to_string(),
                len: body.len(),
            });
        }
        if !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressError::NotHex(s.to_string()));
        }
        Ok(Self {
            body: body.to_ascii_lowercase(),
        })
    }

    /// Lowercase hex digits without the `0x` prefix.
    pub fn hex_body(&self) -> &str {
        &self.body
    }

    /// EIP-55 mixed-case form, `0x`-prefixed.
    pub fn checksummed(&self) -> String {
        let mut hasher = Keccak::v256();
        let mut hash = [0u8; 32];
        hasher.update(self.body.as_bytes());
        hasher.finalize(&mut hash);

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in self.body.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.checksummed()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.checksummed())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransferDirection {
    Incoming,
    Outgoing,
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incoming => write!(f, "INCOMING"),
            Self::Outgoing => write!(f, "OUTGOING"),
        }
    }
}

fn default_trusted() -> bool {
    true
}

/// A native or token transfer with its counterparty already resolved.
/// `counterparty` is the side that is not the Safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub counterparty: Address,
    pub direction: TransferDirection,
    /// `None` for native transfers.
    pub token_address: Option<Address>,
    /// Integer amount in the token's smallest unit.
    pub raw_amount: String,
    pub decimals: Option<u8>,
    pub execution_date: DateTime<Utc>,
    #[serde(default = "default_trusted")]
    pub trusted: bool,
}

/// Upstream page record, tagged by `txType`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "txType")]
pub enum TransactionRecord {
    #[serde(rename = "MULTISIG_TRANSACTION")]
    Multisig(MultisigRecord),
    #[serde(rename = "MODULE_TRANSACTION")]
    Module(ModuleRecord),
    #[serde(rename = "ETHEREUM_TRANSACTION")]
    Ethereum(EthereumRecord),
    #[serde(rename = "CREATION")]
    Creation(CreationRecord),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultisigRecord {
    pub safe_tx_hash: String,
    pub nonce: u64,
    pub to: Address,
    pub value: Option<String>,
    pub method_name: Option<String>,
    pub execution_date: Option<DateTime<Utc>>,
    pub submission_date: Option<DateTime<Utc>>,
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub transfers: Vec<Transfer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    pub module: Address,
    pub to: Address,
    pub value: Option<String>,
    pub method_name: Option<String>,
    pub execution_date: Option<DateTime<Utc>>,
    pub transaction_hash: String,
    #[serde(default)]
    pub transfers: Vec<Transfer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EthereumRecord {
    pub tx_hash: String,
    pub execution_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub transfers: Vec<Transfer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationRecord {
    pub created: Option<DateTime<Utc>>,
    pub creator: Address,
    pub transaction_hash: String,
    pub factory_address: Option<Address>,
    pub master_copy: Option<Address>,
}

/// Enriched payload of a history item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum TransactionInfo {
    Transfer {
        transfer: Transfer,
        imitation: bool,
    },
    Custom {
        to: Address,
        value: Option<String>,
        method_name: Option<String>,
    },
    Creation {
        creator: Address,
        factory: Option<Address>,
        implementation: Option<Address>,
    },
}

/// Present when the Safe itself executed the transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ExecutionInfo {
    Multisig { nonce: u64 },
    Module { address: Address },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: String,
    pub tx_hash: Option<String>,
    pub execution_info: Option<ExecutionInfo>,
    pub info: TransactionInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionItem {
    pub timestamp: DateTime<Utc>,
    pub transaction: TransactionView,
}

impl TransactionItem {
    pub fn transfer(&self) -> Option<&Transfer> {
        match &self.transaction.info {
            TransactionInfo::Transfer { transfer, .. } => Some(transfer),
            _ => None,
        }
    }

    pub fn is_imitation(&self) -> bool {
        matches!(
            self.transaction.info,
            TransactionInfo::Transfer {
                imitation: true,
                ..
            }
        )
    }

    /// Copy of this item with the imitation flag set. Non-transfer items are
    /// returned unchanged.
    pub fn with_imitation(mut self, flag: bool) -> Self {
        if let TransactionInfo::Transfer { imitation, .. } = &mut self.transaction.info {
            *imitation = flag;
        }
        self
    }
}

/// Day header: start of the calendar day in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateLabel {
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryEntry {
    DateLabel(DateLabel),
    Transaction(TransactionItem),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_checksum_known_vectors() {
        // EIP-55 reference vectors
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let addr = Address::parse(&expected.to_lowercase()).unwrap();
            assert_eq!(addr.checksummed(), expected);
        }
    }

    #[test]
    fn test_address_case_insensitive_equality() {
        let a = Address::parse("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap();
        let b = Address::parse("0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.hex_body(), "5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
    }

    #[test]
    fn test_address_rejects_malformed() {
        assert!(matches!(
            Address::parse("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
            Err(AddressError::MissingPrefix(_))
        ));
        assert!(matches!(
            Address::parse("0x1234"),
            Err(AddressError::BadLength { len: 4, .. })
        ));
        assert!(matches!(
            Address::parse("0xzzaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
            Err(AddressError::NotHex(_))
        ));
    }

    #[test]
    fn test_record_tag_dispatch() {
        let json = r#"[
            {"txType": "ETHEREUM_TRANSACTION", "txHash": "0x01",
             "executionDate": "2024-03-01T10:00:00Z", "transfers": []},
            {"txType": "CREATION", "created": "2024-01-01T00:00:00Z",
             "creator": "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed", "transactionHash": "0x02"},
            {"txType": "SOMETHING_NEW", "foo": 1}
        ]"#;
        let records: Vec<TransactionRecord> = serde_json::from_str(json).unwrap();
        assert!(matches!(records[0], TransactionRecord::Ethereum(_)));
        assert!(matches!(records[1], TransactionRecord::Creation(_)));
        assert!(matches!(records[2], TransactionRecord::Unknown));
    }

    #[test]
    fn test_transfer_defaults_to_trusted() {
        let json = r#"{
            "counterparty": "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed",
            "direction": "INCOMING",
            "tokenAddress": null,
            "rawAmount": "1000",
            "decimals": null,
            "executionDate": "2024-03-01T10:00:00Z"
        }"#;
        let transfer: Transfer = serde_json::from_str(json).unwrap();
        assert!(transfer.trusted);
        assert_eq!(transfer.direction, TransferDirection::Incoming);
    }

    #[test]
    fn test_history_entry_serializes_with_type_tag() {
        let label = HistoryEntry::DateLabel(DateLabel {
            timestamp: 1_709_251_200_000,
        });
        let value = serde_json::to_value(&label).unwrap();
        assert_eq!(value["type"], "DATE_LABEL");
        assert_eq!(value["timestamp"], 1_709_251_200_000_i64);
    }
}
