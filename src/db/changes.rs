//! Change notifications for store writes.
//!
//! Open readers (the presentation layer's live views) subscribe here and
//! re-query when a write commits. Only writes that actually changed visible
//! rows are announced; a delete that touched zero rows stays silent so idle
//! views aren't refreshed for nothing.

use tokio::sync::broadcast;

/// Capacity of the broadcast channel. A subscriber that lags further than
/// this sees a `Lagged` error and should re-query unconditionally.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// A committed write that changed visible rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataChange {
    /// The forecast-day window for a location was replaced.
    Forecasts { input_name: String },
    /// The photo set for a location was replaced.
    Photos { input_name: String },
    /// The tracked-location set itself changed.
    Locations,
}

/// Broadcast fan-out for [`DataChange`] events.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<DataChange>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DataChange> {
        self.tx.subscribe()
    }

    /// Announce a committed change. A send with no live subscribers is fine.
    pub fn notify(&self, change: DataChange) {
        let _ = self.tx.send(change);
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn test_subscriber_receives_change() {
        let notifier = ChangeNotifier::new();
        let mut rx = notifier.subscribe();

        notifier.notify(DataChange::Forecasts {
            input_name: "paris".to_string(),
        });

        assert_eq!(
            rx.try_recv().unwrap(),
            DataChange::Forecasts {
                input_name: "paris".to_string()
            }
        );
    }

    #[test]
    fn test_notify_without_subscribers_does_not_panic() {
        let notifier = ChangeNotifier::new();
        notifier.notify(DataChange::Locations);
    }

    #[test]
    fn test_no_spurious_events() {
        let notifier = ChangeNotifier::new();
        let mut rx = notifier.subscribe();
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_multiple_subscribers_all_receive() {
        let notifier = ChangeNotifier::new();
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();

        notifier.notify(DataChange::Photos {
            input_name: "tokyo".to_string(),
        });

        assert!(a.try_recv().is_ok());
        assert!(b.try_recv().is_ok());
    }
}
