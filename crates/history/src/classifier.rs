use chrono::{DateTime, Utc};
use common::types::TransactionRecord;
use std::fmt;

use crate::error::{HistoryError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Multisig,
    Module,
    Ethereum,
    Creation,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Multisig => "multisig",
            Self::Module => "module",
            Self::Ethereum => "ethereum",
            Self::Creation => "creation",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag a record by kind. `index` is the record's position in the page and
/// only feeds the error.
pub fn classify(record: &TransactionRecord, index: usize) -> Result<RecordKind> {
    match record {
        TransactionRecord::Multisig(_) => Ok(RecordKind::Multisig),
        TransactionRecord::Module(_) => Ok(RecordKind::Module),
        TransactionRecord::Ethereum(_) => Ok(RecordKind::Ethereum),
        TransactionRecord::Creation(_) => Ok(RecordKind::Creation),
        TransactionRecord::Unknown => Err(HistoryError::UnrecognizedKind { index }),
    }
}

/// Timestamp used for ordering and day bucketing.
///
/// Multisig records fall back to the submission date while unexecuted.
pub fn comparison_timestamp(record: &TransactionRecord, index: usize) -> Result<DateTime<Utc>> {
    let kind = classify(record, index)?;
    let timestamp = match record {
        TransactionRecord::Multisig(tx) => tx.execution_date.or(tx.submission_date),
        TransactionRecord::Module(tx) => tx.execution_date,
        TransactionRecord::Ethereum(tx) => tx.execution_date,
        TransactionRecord::Creation(tx) => tx.created,
        TransactionRecord::Unknown => None,
    };
    timestamp.ok_or(HistoryError::UnresolvableTimestamp { kind, index })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> TransactionRecord {
        serde_json::from_str(json).unwrap()
    }

    const SAFE_TO: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";

    #[test]
    fn test_classify_known_kinds() {
        let multisig = record(&format!(
            r#"{{"txType": "MULTISIG_TRANSACTION", "safeTxHash": "0xaa", "nonce": 1,
                "to": "{SAFE_TO}", "executionDate": null,
                "submissionDate": "2024-03-01T10:00:00Z"}}"#
        ));
        let ethereum = record(
            r#"{"txType": "ETHEREUM_TRANSACTION", "txHash": "0xbb",
                "executionDate": "2024-03-01T10:00:00Z"}"#,
        );
        assert_eq!(classify(&multisig, 0).unwrap(), RecordKind::Multisig);
        assert_eq!(classify(&ethereum, 1).unwrap(), RecordKind::Ethereum);
    }

    #[test]
    fn test_classify_unknown_is_fatal() {
        let unknown = record(r#"{"txType": "BRIDGE_TRANSACTION"}"#);
        let err = classify(&unknown, 7).unwrap_err();
        assert!(matches!(err, HistoryError::UnrecognizedKind { index: 7 }));
    }

    #[test]
    fn test_multisig_falls_back_to_submission_date() {
        let pending = record(&format!(
            r#"{{"txType": "MULTISIG_TRANSACTION", "safeTxHash": "0xaa", "nonce": 1,
                "to": "{SAFE_TO}", "submissionDate": "2024-03-01T10:00:00Z"}}"#
        ));
        let executed = record(&format!(
            r#"{{"txType": "MULTISIG_TRANSACTION", "safeTxHash": "0xaa", "nonce": 1,
                "to": "{SAFE_TO}", "executionDate": "2024-03-02T08:00:00Z",
                "submissionDate": "2024-03-01T10:00:00Z"}}"#
        ));
        assert_eq!(
            comparison_timestamp(&pending, 0).unwrap().to_rfc3339(),
            "2024-03-01T10:00:00+00:00"
        );
        assert_eq!(
            comparison_timestamp(&executed, 0).unwrap().to_rfc3339(),
            "2024-03-02T08:00:00+00:00"
        );
    }

    #[test]
    fn test_missing_timestamp_is_fatal() {
        let creation = record(&format!(
            r#"{{"txType": "CREATION", "creator": "{SAFE_TO}", "transactionHash": "0xcc"}}"#
        ));
        let err = comparison_timestamp(&creation, 3).unwrap_err();
        assert!(matches!(
            err,
            HistoryError::UnresolvableTimestamp {
                kind: RecordKind::Creation,
                index: 3
            }
        ));
    }
}
