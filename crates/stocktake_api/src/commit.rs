//! Inventory commit protocol.
//!
//! Pushes one counted discrepancy to the external ledger as a relative
//! adjustment. The adjustment is a delta, never an absolute set, so a stock
//! change between the baseline read and the commit is preserved rather than
//! overwritten.

use std::time::Duration;

use stocktake_gateway::{GatewayError, InventoryGateway};
use tracing::{debug, warn};

/// Audit tag the external platform records against each adjustment.
const ADJUSTMENT_REASON: &str = "correction";

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_STEP: Duration = Duration::from_millis(500);

/// Result of pushing one item's delta.
#[derive(Debug)]
pub enum CommitOutcome {
    /// The adjustment was applied to the external ledger.
    Applied,
    /// The delta was zero; nothing to push, but the item counts as settled.
    NoChange,
    /// The external catalog does not know the barcode.
    NotFound,
    /// The gateway failed after retries; the item stays uncommitted.
    Failed(GatewayError),
}

impl CommitOutcome {
    /// True when the item's ledger state is settled and it may be marked
    /// committed.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Applied | Self::NoChange)
    }
}

/// Push one delta for `barcode` at `location_id`.
///
/// Throttled adjustment calls are retried up to [`MAX_ATTEMPTS`] times with a
/// linearly growing pause. Any other failure returns immediately.
pub async fn commit_delta(
    gateway: &dyn InventoryGateway,
    barcode: &str,
    location_id: &str,
    delta: i64,
) -> CommitOutcome {
    if delta == 0 {
        debug!(barcode, "Delta is zero, nothing to adjust");
        return CommitOutcome::NoChange;
    }

    let resolved = match gateway.resolve_item(barcode).await {
        Ok(Some(item)) => item,
        Ok(None) => {
            warn!(barcode, "Barcode not found in external catalog");
            return CommitOutcome::NotFound;
        }
        Err(err) => return CommitOutcome::Failed(err),
    };

    let mut attempt = 1;
    loop {
        match gateway
            .adjust_quantity(
                &resolved.inventory_item_id,
                location_id,
                delta,
                ADJUSTMENT_REASON,
            )
            .await
        {
            Ok(()) => {
                debug!(barcode, delta, "Adjustment applied");
                return CommitOutcome::Applied;
            }
            Err(err) if err.is_throttled() && attempt < MAX_ATTEMPTS => {
                let pause = BACKOFF_STEP * attempt;
                warn!(barcode, attempt, pause_ms = pause.as_millis() as u64, "Gateway throttled, backing off");
                tokio::time::sleep(pause).await;
                attempt += 1;
            }
            Err(err) => {
                warn!(barcode, attempt, "Adjustment failed: {err}");
                return CommitOutcome::Failed(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stocktake_gateway::MemoryGateway;

    #[tokio::test]
    async fn zero_delta_never_touches_the_gateway() {
        let gateway = MemoryGateway::new();
        gateway.add_item("111", "inv/1", "Braid", "BRAID");

        let outcome = commit_delta(&gateway, "111", "loc/1", 0).await;
        assert!(matches!(outcome, CommitOutcome::NoChange));
        assert!(gateway.adjustments().is_empty());
    }

    #[tokio::test]
    async fn unknown_barcode_is_not_found() {
        let gateway = MemoryGateway::new();

        let outcome = commit_delta(&gateway, "999", "loc/1", -2).await;
        assert!(matches!(outcome, CommitOutcome::NotFound));
    }

    #[tokio::test]
    async fn applied_delta_is_relative() {
        let gateway = MemoryGateway::new();
        gateway.add_item("111", "inv/1", "Braid", "BRAID");
        gateway.set_stock("inv/1", "loc/1", 10);

        let outcome = commit_delta(&gateway, "111", "loc/1", -3).await;
        assert!(matches!(outcome, CommitOutcome::Applied));
        assert_eq!(gateway.stock("inv/1", "loc/1"), 7);

        let recorded = gateway.adjustments();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].delta, -3);
        assert_eq!(recorded[0].reason, "correction");
    }

    #[tokio::test(start_paused = true)]
    async fn throttles_are_retried_with_backoff() {
        let gateway = MemoryGateway::new();
        gateway.add_item("111", "inv/1", "Braid", "BRAID");
        gateway.throttle_next(2);

        let outcome = commit_delta(&gateway, "111", "loc/1", 4).await;
        assert!(matches!(outcome, CommitOutcome::Applied));
        assert_eq!(gateway.stock("inv/1", "loc/1"), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_give_up_after_three_attempts() {
        let gateway = MemoryGateway::new();
        gateway.add_item("111", "inv/1", "Braid", "BRAID");
        gateway.throttle_next(3);

        let outcome = commit_delta(&gateway, "111", "loc/1", 4).await;
        match outcome {
            CommitOutcome::Failed(err) => assert!(err.is_throttled()),
            other => panic!("expected Failed, got {other:?}"),
        }
        assert!(gateway.adjustments().is_empty());
    }

    #[tokio::test]
    async fn business_errors_are_not_retried() {
        let gateway = MemoryGateway::new();
        gateway.add_item("111", "inv/1", "Braid", "BRAID");
        gateway.fail_adjustments_for("inv/1");

        let outcome = commit_delta(&gateway, "111", "loc/1", 4).await;
        match outcome {
            CommitOutcome::Failed(err) => assert!(!err.is_throttled()),
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
