//! Scan events and the history reducer.
//!
//! A task item's counted quantity is never stored as a mutable field. Staff
//! scans append immutable events to a history, and the physical-on-hand
//! (POH) value is recomputed from `(baseline, history)` on every append.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One scan recorded against an item. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScanEvent {
    /// Staff affirmed that the physical count matches the baseline.
    #[serde(rename_all = "camelCase")]
    Confirmed { created_at: DateTime<Utc> },
    /// Staff reported an explicit physical count.
    #[serde(rename_all = "camelCase")]
    Counted {
        value: i64,
        created_at: DateTime<Utc>,
    },
}

impl ScanEvent {
    /// A `confirmed` event stamped now.
    pub fn confirmed_now() -> Self {
        Self::Confirmed {
            created_at: Utc::now(),
        }
    }

    /// A `counted` event stamped now.
    pub fn counted_now(value: i64) -> Self {
        Self::Counted {
            value,
            created_at: Utc::now(),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }

    /// The counted value, if this is a `counted` event.
    pub fn counted_value(&self) -> Option<i64> {
        match self {
            Self::Counted { value, .. } => Some(*value),
            Self::Confirmed { .. } => None,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Confirmed { created_at } | Self::Counted { created_at, .. } => *created_at,
        }
    }
}

/// Derived state of an item after replaying its scan history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interpretation {
    /// Physical on hand; `None` until the first scan.
    pub poh: Option<i64>,
    /// True when the last event is `confirmed`, or the computed POH equals
    /// the baseline.
    pub is_exact: bool,
}

/// Reduce a scan history to the physical-on-hand quantity.
///
/// - Empty history: `None` (no physical count yet).
/// - Last event `confirmed`: the count resets exactly to `baseline`.
/// - Otherwise: sum of `counted` values strictly after the last `confirmed`
///   event (or over the whole history if none).
pub fn interpret(baseline: i64, history: &[ScanEvent]) -> Option<i64> {
    let last = history.last()?;
    if last.is_confirmed() {
        return Some(baseline);
    }

    let tail_start = history
        .iter()
        .rposition(ScanEvent::is_confirmed)
        .map_or(0, |idx| idx + 1);

    Some(
        history[tail_start..]
            .iter()
            .filter_map(ScanEvent::counted_value)
            .sum(),
    )
}

/// Reduce a scan history to `(POH, exact-match)` in one pass.
pub fn interpret_history(baseline: i64, history: &[ScanEvent]) -> Interpretation {
    let poh = interpret(baseline, history);
    let is_exact = match (history.last(), poh) {
        (Some(last), Some(value)) => last.is_confirmed() || value == baseline,
        _ => false,
    };
    Interpretation { poh, is_exact }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counted(value: i64) -> ScanEvent {
        ScanEvent::counted_now(value)
    }

    fn confirmed() -> ScanEvent {
        ScanEvent::confirmed_now()
    }

    #[test]
    fn empty_history_has_no_count() {
        assert_eq!(interpret(10, &[]), None);
        let interp = interpret_history(10, &[]);
        assert_eq!(interp.poh, None);
        assert!(!interp.is_exact);
    }

    #[test]
    fn counted_then_confirmed_resets_to_baseline() {
        // baseline=10, counted(7) -> POH 7, not exact
        let mut history = vec![counted(7)];
        let interp = interpret_history(10, &history);
        assert_eq!(interp.poh, Some(7));
        assert!(!interp.is_exact);

        // then confirmed -> POH 10, exact, commit delta would be 0
        history.push(confirmed());
        let interp = interpret_history(10, &history);
        assert_eq!(interp.poh, Some(10));
        assert!(interp.is_exact);
    }

    #[test]
    fn counted_events_accumulate() {
        // baseline=5, [counted(3), counted(2)] -> POH 5, exact because 5 == baseline
        let history = vec![counted(3), counted(2)];
        let interp = interpret_history(5, &history);
        assert_eq!(interp.poh, Some(5));
        assert!(interp.is_exact);
    }

    #[test]
    fn confirmed_resets_the_accumulation_window() {
        // baseline=5, [counted(3), confirmed, counted(4)] -> POH 4, not exact
        let history = vec![counted(3), confirmed(), counted(4)];
        let interp = interpret_history(5, &history);
        assert_eq!(interp.poh, Some(4));
        assert!(!interp.is_exact);
    }

    #[test]
    fn last_confirmed_wins_regardless_of_prior_events() {
        let history = vec![counted(99), counted(1), confirmed(), counted(2), confirmed()];
        let interp = interpret_history(42, &history);
        assert_eq!(interp.poh, Some(42));
        assert!(interp.is_exact);
    }

    #[test]
    fn events_before_the_last_confirmed_never_change_the_result() {
        let tail = vec![counted(2), counted(3)];
        let plain = interpret(7, &tail);

        let mut prefixed = vec![counted(100), confirmed(), confirmed()];
        prefixed.extend(tail);
        assert_eq!(interpret(7, &prefixed), plain);
        assert_eq!(plain, Some(5));
    }

    #[test]
    fn interpret_is_deterministic() {
        let history = vec![counted(3), confirmed(), counted(4), counted(1)];
        let first = interpret(9, &history);
        for _ in 0..5 {
            assert_eq!(interpret(9, &history), first);
        }
    }

    #[test]
    fn zero_counts_are_valid() {
        let history = vec![counted(0)];
        let interp = interpret_history(0, &history);
        assert_eq!(interp.poh, Some(0));
        assert!(interp.is_exact);
    }

    #[test]
    fn scan_event_wire_format() {
        let json = serde_json::to_value(counted(7)).unwrap();
        assert_eq!(json["kind"], "counted");
        assert_eq!(json["value"], 7);
        assert!(json["createdAt"].is_string());

        let json = serde_json::to_value(confirmed()).unwrap();
        assert_eq!(json["kind"], "confirmed");
    }
}
