use thiserror::Error;

use crate::classifier::RecordKind;

/// Boxed error returned by enrichment mappers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum HistoryError {
    /// All timestamp fields of a record are null. Indicates corrupt upstream data.
    #[error("{kind} record at position {index} has no resolvable timestamp")]
    UnresolvableTimestamp { kind: RecordKind, index: usize },

    /// The record's `txType` matched none of the known shapes.
    #[error("record at position {index} has an unrecognized transaction type")]
    UnrecognizedKind { index: usize },

    /// An enrichment mapper failed for one record.
    #[error("enrichment of {kind} record at position {index} failed: {source}")]
    Enrichment {
        kind: RecordKind,
        index: usize,
        #[source]
        source: BoxError,
    },
}

pub type Result<T, E = HistoryError> = std::result::Result<T, E>;
