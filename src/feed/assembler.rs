//! Chunk assembly: raw upstream items → typed timeline entries.
//!
//! The transform is pure and deterministic: the same chunk and time base
//! always produce the same entries, ids included, so re-assembly after a
//! redraw or retry can never fork the timeline.

use chrono::{DateTime, Duration, Utc};

use crate::feed::fetcher::RawItem;
use crate::feed::types::{EntryKind, FeedEntry, Sender};
use crate::util::normalize_ws;

/// Spacing between consecutive text entries within a chunk.
const ENTRY_SPACING_SECS: i64 = 60;
/// Synthetic entries sit just after their neighboring real entry.
const EVENT_OFFSET_SECS: i64 = 30;
const NOTE_OFFSET_SECS: i64 = 40;
/// A synthetic pair is spliced in ahead of every tenth text entry.
const MARKER_STRIDE: usize = 10;

/// Maps one fetched chunk into ordered timeline entries.
///
/// Text entries: item `i` of the chunk becomes a [`EntryKind::Text`] entry
/// attributed to the local user when `i % 3 == 0` and to the counterparty
/// otherwise — a fixed, reproducible one-in-three pattern per chunk. Items
/// are spaced one minute apart, ending at `time_base`, so a chunk reads as
/// a contiguous run of recent history.
///
/// Synthetic markers: for each position `10, 20, 30, …` below the chunk's
/// text-entry count, in ascending order, a system event ("conversation
/// opened/closed") and a system note ("assigned/unassigned") are spliced
/// into the growing result at that literal index. Earlier insertions shift
/// later content, so the pairs land at final indices 10/11, 20/21, … The
/// alternation keys off `(position / 10) % 2`: multiples of twenty get the
/// opened/assigned variant, the rest closed/unassigned.
///
/// The position scan restarts for every chunk; a chunk shorter than ten
/// items therefore carries no markers at all. That per-chunk reset is
/// intended behavior and is pinned by tests.
///
/// Synthetic ids and timestamps derive from the real entry currently at
/// the insertion position (`sys-{id}-openclose` / `note-{id}-assign`,
/// +30 s / +40 s), which keeps them stable and collision-free as long as
/// upstream ids are unique.
pub fn map_chunk(raw: &[RawItem], time_base: DateTime<Utc>) -> Vec<FeedEntry> {
    let chunk_len = raw.len();
    let mut mapped: Vec<FeedEntry> = raw
        .iter()
        .enumerate()
        .map(|(i, item)| FeedEntry {
            id: item.id.to_string(),
            text: normalize_ws(&item.body).into_owned(),
            sender: if i % 3 == 0 {
                Sender::LocalUser
            } else {
                Sender::Counterparty
            },
            kind: EntryKind::Text,
            timestamp: time_base
                - Duration::seconds((chunk_len - i) as i64 * ENTRY_SPACING_SECS),
        })
        .collect();

    let mut pos = MARKER_STRIDE;
    while pos < chunk_len {
        let neighbor_id = mapped[pos].id.clone();
        let neighbor_ts = mapped[pos].timestamp;
        let opened_variant = (pos / MARKER_STRIDE) % 2 == 0;

        mapped.insert(
            pos,
            FeedEntry {
                id: format!("sys-{neighbor_id}-openclose"),
                text: if opened_variant {
                    "Conversation opened by you".to_string()
                } else {
                    "Conversation closed by you".to_string()
                },
                sender: Sender::System,
                kind: EntryKind::Event,
                timestamp: neighbor_ts + Duration::seconds(EVENT_OFFSET_SECS),
            },
        );
        mapped.insert(
            pos + 1,
            FeedEntry {
                id: format!("note-{neighbor_id}-assign"),
                text: if opened_variant {
                    "Assigned to you".to_string()
                } else {
                    "You unassigned this person".to_string()
                },
                sender: Sender::System,
                kind: EntryKind::Note,
                timestamp: neighbor_ts + Duration::seconds(NOTE_OFFSET_SECS),
            },
        );

        pos += MARKER_STRIDE;
    }

    mapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn raw_items(n: usize) -> Vec<RawItem> {
        (0..n)
            .map(|i| RawItem {
                id: 1000 + i as i64,
                body: format!("message number {i}"),
            })
            .collect()
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 11, 12, 0, 0).unwrap()
    }

    #[test]
    fn chunk_of_25_places_pairs_at_10_and_20() {
        let entries = map_chunk(&raw_items(25), base());
        assert_eq!(entries.len(), 29); // 25 text + 2 pairs

        // Position 10: the closed/unassigned variant
        assert_eq!(entries[10].kind, EntryKind::Event);
        assert_eq!(entries[10].text, "Conversation closed by you");
        assert_eq!(entries[11].kind, EntryKind::Note);
        assert_eq!(entries[11].text, "You unassigned this person");

        // Position 20: the opened/assigned variant
        assert_eq!(entries[20].kind, EntryKind::Event);
        assert_eq!(entries[20].text, "Conversation opened by you");
        assert_eq!(entries[21].kind, EntryKind::Note);
        assert_eq!(entries[21].text, "Assigned to you");
    }

    #[test]
    fn chunk_of_9_has_no_synthetic_entries() {
        let entries = map_chunk(&raw_items(9), base());
        assert_eq!(entries.len(), 9);
        assert!(entries.iter().all(|e| !e.is_synthetic()));
    }

    #[test]
    fn full_page_of_30_assembles_to_34() {
        let entries = map_chunk(&raw_items(30), base());
        assert_eq!(entries.len(), 34);
        assert_eq!(entries.iter().filter(|e| e.is_synthetic()).count(), 4);
    }

    #[test]
    fn sender_alternation_is_one_in_three() {
        let entries = map_chunk(&raw_items(9), base());
        for (i, entry) in entries.iter().enumerate() {
            let expected = if i % 3 == 0 {
                Sender::LocalUser
            } else {
                Sender::Counterparty
            };
            assert_eq!(entry.sender, expected, "entry {i}");
        }
    }

    #[test]
    fn text_entries_are_spaced_one_minute_apart_ending_at_base() {
        let entries = map_chunk(&raw_items(3), base());
        assert_eq!(entries[0].timestamp, base() - Duration::seconds(180));
        assert_eq!(entries[1].timestamp, base() - Duration::seconds(120));
        assert_eq!(entries[2].timestamp, base() - Duration::seconds(60));
    }

    #[test]
    fn synthetic_ids_and_timestamps_derive_from_neighbor() {
        let entries = map_chunk(&raw_items(12), base());
        // Neighbor is the text entry that ends up right after the pair
        let neighbor = &entries[12];
        assert_eq!(entries[10].id, format!("sys-{}-openclose", neighbor.id));
        assert_eq!(entries[11].id, format!("note-{}-assign", neighbor.id));
        assert_eq!(
            entries[10].timestamp,
            neighbor.timestamp + Duration::seconds(30)
        );
        assert_eq!(
            entries[11].timestamp,
            neighbor.timestamp + Duration::seconds(40)
        );
    }

    #[test]
    fn body_whitespace_is_normalized() {
        let raw = vec![RawItem {
            id: 7,
            body: "  spread\nover\n\nlines \t".to_string(),
        }];
        let entries = map_chunk(&raw, base());
        assert_eq!(entries[0].text, "spread over lines");
    }

    #[test]
    fn empty_chunk_maps_to_empty() {
        assert!(map_chunk(&[], base()).is_empty());
    }

    #[test]
    fn reassembly_is_deterministic() {
        let raw = raw_items(25);
        assert_eq!(map_chunk(&raw, base()), map_chunk(&raw, base()));
    }

    proptest! {
        #[test]
        fn marker_pairs_sit_at_every_tenth_index(n in 0usize..120) {
            let entries = map_chunk(&raw_items(n), base());
            let pairs = if n == 0 { 0 } else { (n - 1) / 10 };
            prop_assert_eq!(entries.len(), n + 2 * pairs);

            for p in (10..n).step_by(10) {
                prop_assert_eq!(entries[p].kind, EntryKind::Event);
                prop_assert_eq!(entries[p + 1].kind, EntryKind::Note);
            }

            // Text entries keep their upstream order
            let texts: Vec<&str> = entries
                .iter()
                .filter(|e| e.kind == EntryKind::Text)
                .map(|e| e.id.as_str())
                .collect();
            let expected: Vec<String> =
                (0..n).map(|i| (1000 + i as i64).to_string()).collect();
            prop_assert_eq!(texts, expected.iter().map(String::as_str).collect::<Vec<_>>());
        }

        #[test]
        fn ids_are_unique_within_a_chunk(n in 0usize..120) {
            let entries = map_chunk(&raw_items(n), base());
            let mut ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
            ids.sort_unstable();
            ids.dedup();
            prop_assert_eq!(ids.len(), entries.len());
        }
    }
}
