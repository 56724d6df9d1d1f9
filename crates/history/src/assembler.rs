use chrono::{DateTime, Utc};
use common::config::Config;
use common::types::{
    HistoryEntry, TransactionInfo, TransactionItem, TransactionRecord, TransactionView,
};
use futures_util::{stream, StreamExt, TryStreamExt};
use tracing::{info, warn};

use crate::classifier::{classify, comparison_timestamp, RecordKind};
use crate::day_bucketer::{bucket, day_start, split_page_boundary};
use crate::enrichment::{EnrichmentContext, EnrichmentMapper};
use crate::error::{HistoryError, Result};
use crate::imitation::ImitationDetector;

/// Request parameters for one history page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Position of the page's first record in the full upstream ordering.
    pub offset: usize,
    pub timezone_offset_seconds: i32,
    /// Remove flagged imitations instead of returning them flagged.
    pub suppress_imitations: bool,
    /// Drop Ethereum transfers of tokens outside the trusted list.
    pub only_trusted: bool,
}

/// Builds day-labelled history pages from upstream record pages.
pub struct HistoryAssembler<M> {
    mapper: M,
    context: EnrichmentContext,
    /// `None` when imitation detection is disabled.
    detector: Option<ImitationDetector>,
    max_nested_transfers: usize,
    max_concurrent_enrichments: usize,
}

impl<M: EnrichmentMapper> HistoryAssembler<M> {
    pub fn new(mapper: M, context: EnrichmentContext, config: &Config) -> Self {
        Self {
            mapper,
            context,
            detector: config
                .imitation
                .enabled
                .then(|| ImitationDetector::from_config(&config.imitation)),
            max_nested_transfers: config.history.max_nested_transfers,
            max_concurrent_enrichments: config.history.max_concurrent_enrichments.max(1),
        }
    }

    /// Assemble one page.
    ///
    /// With `offset > 0` the first record belongs to the previous page and
    /// only decides whether the first day of this page needs a label.
    pub async fn assemble(
        &self,
        records: &[TransactionRecord],
        query: &HistoryQuery,
    ) -> Result<Vec<HistoryEntry>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let tz = query.timezone_offset_seconds;
        let (boundary, displayed) = split_page_boundary(records, query.offset);
        let previous_page_day_start = boundary
            .map(|record| comparison_timestamp(record, 0))
            .transpose()?
            .map(|timestamp| day_start(timestamp, tz));
        let first_index = usize::from(boundary.is_some());

        let prepared = displayed
            .iter()
            .enumerate()
            .map(|(i, record)| -> Result<_> {
                let index = first_index + i;
                Ok((
                    index,
                    classify(record, index)?,
                    comparison_timestamp(record, index)?,
                    record,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        // `buffered` yields in input order regardless of completion order.
        let enriched: Vec<Vec<TransactionItem>> = stream::iter(prepared)
            .map(|(index, kind, timestamp, record)| {
                self.enrich(index, kind, timestamp, record, query.only_trusted)
            })
            .buffered(self.max_concurrent_enrichments)
            .try_collect()
            .await?;
        let items: Vec<TransactionItem> = enriched.into_iter().flatten().collect();
        let enriched_count = items.len();

        let items = match &self.detector {
            Some(detector) => detector.apply(items, query.suppress_imitations),
            None => items,
        };
        let shown_count = items.len();

        let entries = bucket(items, previous_page_day_start, tz);
        metrics::counter!(crate::metrics::PAGES_ASSEMBLED).increment(1);
        info!(
            safe = %self.context.safe,
            chain_id = %self.context.chain_id,
            offset = query.offset,
            records = displayed.len(),
            items = enriched_count,
            suppressed = enriched_count - shown_count,
            entries = entries.len(),
            "history page assembled"
        );
        Ok(entries)
    }

    async fn enrich(
        &self,
        index: usize,
        kind: RecordKind,
        timestamp: DateTime<Utc>,
        record: &TransactionRecord,
        only_trusted: bool,
    ) -> Result<Vec<TransactionItem>> {
        let ctx = &self.context;
        let views = match record {
            TransactionRecord::Multisig(tx) => {
                self.mapper.map_multisig(ctx, tx).await.map(|v| vec![v])
            }
            TransactionRecord::Module(tx) => self.mapper.map_module(ctx, tx).await.map(|v| vec![v]),
            TransactionRecord::Ethereum(tx) => self
                .mapper
                .map_ethereum(ctx, tx)
                .await
                .map(|views| self.limit_transfers(views, index, only_trusted)),
            TransactionRecord::Creation(tx) => {
                self.mapper.map_creation(ctx, tx).await.map(|v| vec![v])
            }
            TransactionRecord::Unknown => return Err(HistoryError::UnrecognizedKind { index }),
        }
        .map_err(|source| HistoryError::Enrichment {
            kind,
            index,
            source,
        })?;

        Ok(views
            .into_iter()
            .map(|transaction| TransactionItem {
                timestamp,
                transaction,
            })
            .collect())
    }

    fn limit_transfers(
        &self,
        mut views: Vec<TransactionView>,
        index: usize,
        only_trusted: bool,
    ) -> Vec<TransactionView> {
        if only_trusted {
            views.retain(|view| match &view.info {
                TransactionInfo::Transfer { transfer, .. } => transfer.trusted,
                _ => true,
            });
        }
        if views.len() > self.max_nested_transfers {
            warn!(
                index,
                transfers = views.len(),
                limit = self.max_nested_transfers,
                "truncating nested transfers"
            );
            views.truncate(self.max_nested_transfers);
        }
        views
    }
}
