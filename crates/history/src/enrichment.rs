use common::types::{
    Address, CreationRecord, EthereumRecord, ExecutionInfo, ModuleRecord, MultisigRecord,
    TransactionInfo, TransactionView, Transfer,
};
use std::future::Future;

use crate::error::BoxError;

/// The Safe whose history is being assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentContext {
    pub chain_id: String,
    pub safe: Address,
}

/// Per-kind enrichment of upstream records into displayable views.
///
/// Implementations resolve address-book names, decode calldata and attach
/// token metadata. Whatever they return must keep the transfer comparison
/// fields (`counterparty`, `raw_amount`, `decimals`) intact.
pub trait EnrichmentMapper {
    fn map_multisig(
        &self,
        ctx: &EnrichmentContext,
        record: &MultisigRecord,
    ) -> impl Future<Output = Result<TransactionView, BoxError>> + Send;

    fn map_module(
        &self,
        ctx: &EnrichmentContext,
        record: &ModuleRecord,
    ) -> impl Future<Output = Result<TransactionView, BoxError>> + Send;

    /// One view per transfer; a record without transfers yields none.
    fn map_ethereum(
        &self,
        ctx: &EnrichmentContext,
        record: &EthereumRecord,
    ) -> impl Future<Output = Result<Vec<TransactionView>, BoxError>> + Send;

    fn map_creation(
        &self,
        ctx: &EnrichmentContext,
        record: &CreationRecord,
    ) -> impl Future<Output = Result<TransactionView, BoxError>> + Send;
}

/// Maps records whose lookups upstream already resolved, without further I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct HydratedMapper;

/// A Safe-executed transaction with exactly one transfer displays as that
/// transfer; anything else is a custom call.
fn executed_info(
    to: &Address,
    value: Option<&str>,
    method_name: Option<&str>,
    transfers: &[Transfer],
) -> TransactionInfo {
    match transfers {
        [transfer] => TransactionInfo::Transfer {
            transfer: transfer.clone(),
            imitation: false,
        },
        _ => TransactionInfo::Custom {
            to: to.clone(),
            value: value.map(str::to_string),
            method_name: method_name.map(str::to_string),
        },
    }
}

impl EnrichmentMapper for HydratedMapper {
    async fn map_multisig(
        &self,
        ctx: &EnrichmentContext,
        record: &MultisigRecord,
    ) -> Result<TransactionView, BoxError> {
        Ok(TransactionView {
            id: format!("multisig_{}_{}", ctx.safe, record.safe_tx_hash),
            tx_hash: record.transaction_hash.clone(),
            execution_info: Some(ExecutionInfo::Multisig {
                nonce: record.nonce,
            }),
            info: executed_info(
                &record.to,
                record.value.as_deref(),
                record.method_name.as_deref(),
                &record.transfers,
            ),
        })
    }

    async fn map_module(
        &self,
        ctx: &EnrichmentContext,
        record: &ModuleRecord,
    ) -> Result<TransactionView, BoxError> {
        Ok(TransactionView {
            id: format!("module_{}_{}", ctx.safe, record.transaction_hash),
            tx_hash: Some(record.transaction_hash.clone()),
            execution_info: Some(ExecutionInfo::Module {
                address: record.module.clone(),
            }),
            info: executed_info(
                &record.to,
                record.value.as_deref(),
                record.method_name.as_deref(),
                &record.transfers,
            ),
        })
    }

    async fn map_ethereum(
        &self,
        ctx: &EnrichmentContext,
        record: &EthereumRecord,
    ) -> Result<Vec<TransactionView>, BoxError> {
        Ok(record
            .transfers
            .iter()
            .enumerate()
            .map(|(i, transfer)| TransactionView {
                id: format!("transfer_{}_{}_{i}", ctx.safe, record.tx_hash),
                tx_hash: Some(record.tx_hash.clone()),
                execution_info: None,
                info: TransactionInfo::Transfer {
                    transfer: transfer.clone(),
                    imitation: false,
                },
            })
            .collect())
    }

    async fn map_creation(
        &self,
        ctx: &EnrichmentContext,
        record: &CreationRecord,
    ) -> Result<TransactionView, BoxError> {
        Ok(TransactionView {
            id: format!("creation_{}", ctx.safe),
            tx_hash: Some(record.transaction_hash.clone()),
            execution_info: None,
            info: TransactionInfo::Creation {
                creator: record.creator.clone(),
                factory: record.factory_address.clone(),
                implementation: record.master_copy.clone(),
            },
        })
    }
}
