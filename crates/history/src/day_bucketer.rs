use chrono::{DateTime, Duration, NaiveTime, Utc};
use common::types::{DateLabel, HistoryEntry, TransactionItem};
use std::collections::HashMap;

/// Start of the calendar day containing `timestamp` under a fixed UTC offset,
/// as UTC milliseconds of that date's midnight.
pub fn day_start(timestamp: DateTime<Utc>, timezone_offset_seconds: i32) -> i64 {
    let shifted = timestamp + Duration::seconds(i64::from(timezone_offset_seconds));
    shifted
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc()
        .timestamp_millis()
}

/// Separates the previous page's last record from the records to display.
///
/// When `offset > 0` and the page holds more than one record, upstream was
/// asked for one extra leading record so the day of the previous page's last
/// item is known. It is never displayed.
pub fn split_page_boundary<T>(records: &[T], offset: usize) -> (Option<&T>, &[T]) {
    match records {
        [boundary, rest @ ..] if offset > 0 && !rest.is_empty() => (Some(boundary), rest),
        _ => (None, records),
    }
}

/// Groups items into day buckets, each headed by a [`DateLabel`].
///
/// Items must already be ordered newest first; buckets keep first-seen order
/// and nothing is re-sorted. The bucket whose day equals
/// `previous_page_day_start` gets no label since the previous page already
/// showed it.
pub fn bucket(
    items: Vec<TransactionItem>,
    previous_page_day_start: Option<i64>,
    timezone_offset_seconds: i32,
) -> Vec<HistoryEntry> {
    let mut days: Vec<(i64, Vec<TransactionItem>)> = Vec::new();
    let mut positions: HashMap<i64, usize> = HashMap::new();

    for item in items {
        let day = day_start(item.timestamp, timezone_offset_seconds);
        let position = *positions.entry(day).or_insert_with(|| {
            days.push((day, Vec::new()));
            days.len() - 1
        });
        days[position].1.push(item);
    }

    let mut entries = Vec::with_capacity(days.len() * 2);
    for (day, day_items) in days {
        if day_items.is_empty() {
            continue;
        }
        if previous_page_day_start != Some(day) {
            entries.push(HistoryEntry::DateLabel(DateLabel { timestamp: day }));
        }
        entries.extend(day_items.into_iter().map(HistoryEntry::Transaction));
    }
    entries
}
