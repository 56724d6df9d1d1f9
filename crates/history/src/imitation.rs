use common::config::Imitation;
use common::types::{Address, TransactionItem};
use tracing::debug;

use crate::amount::NormalizedAmount;

const ADDRESS_HEX_LEN: usize = 40;

/// Flags address-poisoning transfers.
///
/// Items arrive newest first. A transfer is an imitation when an older
/// transfer at most `lookup_distance` positions further down the sequence has
/// a different counterparty sharing its first `prefix_length` and last
/// `suffix_length` hex digits, carries the same decimal-normalized amount, and
/// is not an imitation itself. Incoming and outgoing transfers, Safe-executed
/// or not, are all treated alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImitationDetector {
    lookup_distance: usize,
    prefix_length: usize,
    suffix_length: usize,
}

/// Comparison fields of one transfer item, computed once per pass.
struct Candidate<'a> {
    counterparty: &'a Address,
    amount: Option<NormalizedAmount>,
}

impl<'a> Candidate<'a> {
    fn from_item(item: &'a TransactionItem) -> Option<Self> {
        let transfer = item.transfer()?;
        Some(Self {
            counterparty: &transfer.counterparty,
            amount: NormalizedAmount::new(&transfer.raw_amount, transfer.decimals),
        })
    }
}

impl ImitationDetector {
    pub fn new(lookup_distance: usize, prefix_length: usize, suffix_length: usize) -> Self {
        Self {
            lookup_distance,
            prefix_length: prefix_length.min(ADDRESS_HEX_LEN),
            suffix_length: suffix_length.min(ADDRESS_HEX_LEN),
        }
    }

    pub fn from_config(config: &Imitation) -> Self {
        Self::new(
            config.lookup_distance,
            config.prefix_length,
            config.suffix_length,
        )
    }

    /// Different address with the same leading and trailing hex digits.
    pub fn addresses_collide(&self, a: &Address, b: &Address) -> bool {
        if a == b {
            return false;
        }
        let (a, b) = (a.hex_body(), b.hex_body());
        let suffix_start = ADDRESS_HEX_LEN - self.suffix_length;
        a[..self.prefix_length] == b[..self.prefix_length]
            && a[suffix_start..] == b[suffix_start..]
    }

    fn matches(&self, suspect: &Candidate<'_>, reference: &Candidate<'_>) -> bool {
        if !self.addresses_collide(suspect.counterparty, reference.counterparty) {
            return false;
        }
        match (&suspect.amount, &reference.amount) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Returns the items with `imitation` recomputed on every transfer item.
    /// Order is preserved and any flag already present is ignored.
    pub fn flag(&self, items: Vec<TransactionItem>) -> Vec<TransactionItem> {
        let flags = self.compute_flags(&items);
        items
            .into_iter()
            .zip(flags)
            .map(|(item, flag)| match item.transfer() {
                Some(_) => item.with_imitation(flag),
                None => item,
            })
            .collect()
    }

    /// Flags imitations, then drops them when `suppress` is set.
    pub fn apply(&self, items: Vec<TransactionItem>, suppress: bool) -> Vec<TransactionItem> {
        let flagged = self.flag(items);
        let imitations = flagged.iter().filter(|item| item.is_imitation()).count();
        if imitations == 0 {
            return flagged;
        }
        metrics::counter!(crate::metrics::IMITATIONS_FLAGGED).increment(imitations as u64);
        if !suppress {
            return flagged;
        }
        metrics::counter!(crate::metrics::IMITATIONS_SUPPRESSED).increment(imitations as u64);
        flagged
            .into_iter()
            .filter(|item| !item.is_imitation())
            .collect()
    }

    fn compute_flags(&self, items: &[TransactionItem]) -> Vec<bool> {
        let candidates: Vec<Option<Candidate<'_>>> =
            items.iter().map(Candidate::from_item).collect();

        // Oldest first, so every reference is settled before it is consulted.
        let mut flags = vec![false; items.len()];
        for i in (0..items.len()).rev() {
            let Some(suspect) = &candidates[i] else {
                continue;
            };
            let end = i.saturating_add(self.lookup_distance).min(items.len() - 1);

            let matched = (i + 1..=end)
                .filter(|&j| !flags[j])
                .filter_map(|j| candidates[j].as_ref().map(|c| (j, c)))
                .find(|(_, reference)| self.matches(suspect, reference));

            if let Some((j, reference)) = matched {
                flags[i] = true;
                debug!(
                    position = i,
                    reference_position = j,
                    counterparty = %suspect.counterparty,
                    reference_counterparty = %reference.counterparty,
                    amount = ?suspect.amount.as_ref().map(ToString::to_string),
                    "transfer flagged as imitation"
                );
            }
        }
        flags
    }
}
