//! Client-held draft buffer for zero-quantity reports.
//!
//! Ad hoc zero-stock scans accumulate here, keyed by barcode, before any
//! report entry exists server-side. The buffer is a staged aggregate with
//! its own reducer; submitting it materializes `reviewing` report entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scan::{interpret_history, ScanEvent};

/// A staged report entry, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftEntry {
    pub barcode: String,
    pub name: Option<String>,
    pub department: Option<String>,
    /// Baseline stock-on-hand as last read from the external system.
    pub soh: i64,
    pub history: Vec<ScanEvent>,
    pub poh: Option<i64>,
    pub is_exact: bool,
}

/// Pending zero-quantity scans, keyed by barcode.
#[derive(Debug, Clone, Default)]
pub struct ZeroQtyDraft {
    entries: BTreeMap<String, DraftEntry>,
}

impl ZeroQtyDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a scan to the buffer, refreshing the entry's baseline and
    /// derived fields.
    ///
    /// A `confirmed` scan on a barcode with no existing entry is dropped:
    /// POH equals baseline, so there is no discrepancy to report.
    pub fn record(
        &mut self,
        barcode: &str,
        name: Option<String>,
        department: Option<String>,
        soh: i64,
        event: ScanEvent,
    ) -> Option<&DraftEntry> {
        if event.is_confirmed() && !self.entries.contains_key(barcode) {
            return None;
        }

        let entry = self
            .entries
            .entry(barcode.to_string())
            .or_insert_with(|| DraftEntry {
                barcode: barcode.to_string(),
                name: None,
                department: None,
                soh,
                history: Vec::new(),
                poh: None,
                is_exact: false,
            });

        if name.is_some() {
            entry.name = name;
        }
        if department.is_some() {
            entry.department = department;
        }
        entry.soh = soh;
        entry.history.push(event);

        let interp = interpret_history(entry.soh, &entry.history);
        entry.poh = interp.poh;
        entry.is_exact = interp.is_exact;

        Some(entry)
    }

    pub fn get(&self, barcode: &str) -> Option<&DraftEntry> {
        self.entries.get(barcode)
    }

    pub fn remove(&mut self, barcode: &str) -> Option<DraftEntry> {
        self.entries.remove(barcode)
    }

    pub fn entries(&self) -> impl Iterator<Item = &DraftEntry> {
        self.entries.values()
    }

    /// Drain the buffer in barcode order, for submission.
    pub fn into_entries(self) -> Vec<DraftEntry> {
        self.entries.into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmed_without_an_entry_never_creates_one() {
        let mut draft = ZeroQtyDraft::new();
        let result = draft.record("111", None, None, 4, ScanEvent::confirmed_now());
        assert!(result.is_none());
        assert!(draft.is_empty());
    }

    #[test]
    fn counted_scan_creates_an_entry_with_derived_fields() {
        let mut draft = ZeroQtyDraft::new();
        draft
            .record(
                "111",
                Some("Lace Wig".into()),
                Some("HAIR".into()),
                4,
                ScanEvent::counted_now(0),
            )
            .unwrap();

        let entry = draft.get("111").unwrap();
        assert_eq!(entry.poh, Some(0));
        assert!(!entry.is_exact);
        assert_eq!(entry.soh, 4);
    }

    #[test]
    fn scans_on_the_same_barcode_accumulate() {
        let mut draft = ZeroQtyDraft::new();
        draft.record("222", None, None, 5, ScanEvent::counted_now(3));
        draft.record("222", None, None, 5, ScanEvent::counted_now(2));

        let entry = draft.get("222").unwrap();
        assert_eq!(entry.poh, Some(5));
        assert!(entry.is_exact);
        assert_eq!(draft.len(), 1);
    }

    #[test]
    fn confirmed_on_an_existing_entry_resets_to_baseline() {
        let mut draft = ZeroQtyDraft::new();
        draft.record("333", None, None, 8, ScanEvent::counted_now(1));
        draft.record("333", None, None, 8, ScanEvent::confirmed_now());

        let entry = draft.get("333").unwrap();
        assert_eq!(entry.poh, Some(8));
        assert!(entry.is_exact);
    }

    #[test]
    fn baseline_refreshes_on_each_scan() {
        let mut draft = ZeroQtyDraft::new();
        draft.record("444", None, None, 10, ScanEvent::counted_now(2));
        // second scan cycle re-read a different baseline
        draft.record("444", None, None, 12, ScanEvent::counted_now(3));

        let entry = draft.get("444").unwrap();
        assert_eq!(entry.soh, 12);
        assert_eq!(entry.poh, Some(5));
    }

    #[test]
    fn into_entries_drains_in_barcode_order() {
        let mut draft = ZeroQtyDraft::new();
        draft.record("b", None, None, 1, ScanEvent::counted_now(0));
        draft.record("a", None, None, 1, ScanEvent::counted_now(0));

        let barcodes: Vec<_> = draft
            .into_entries()
            .into_iter()
            .map(|e| e.barcode)
            .collect();
        assert_eq!(barcodes, vec!["a", "b"]);
    }
}
