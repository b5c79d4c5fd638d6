use anyhow::{bail, Result};
use std::sync::Mutex;
use tokio::sync::oneshot;

/// A single outstanding interactive question: the set of keys that answer
/// it and the completion handle of the suspended command.
struct PendingQuery {
    accepted: Vec<String>,
    tx: oneshot::Sender<String>,
}

/// Outcome of feeding a raw key to the channel.
#[derive(Debug, PartialEq, Eq)]
pub enum Offer {
    Accepted,
    /// Key not in the accepted set; carries the set for the retry notice.
    Rejected(Vec<String>),
    NotPending,
}

/// Single-slot channel for mid-command confirmations. Holding the pending
/// request in an explicit slot makes "at most one query at a time" a
/// checkable invariant rather than an implicit captured closure.
#[derive(Default)]
pub struct QueryChannel {
    slot: Mutex<Option<PendingQuery>>,
}

impl QueryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a query and returns the receiver the suspended command awaits.
    /// Opening a second query while one is outstanding is a caller bug and
    /// comes back as an error.
    pub fn begin(&self, accepted: &[String]) -> Result<oneshot::Receiver<String>> {
        let mut slot = self.slot.lock().expect("query slot lock");
        if slot.is_some() {
            bail!("a query is already pending");
        }
        let (tx, rx) = oneshot::channel();
        *slot = Some(PendingQuery {
            accepted: accepted.to_vec(),
            tx,
        });
        Ok(rx)
    }

    pub fn is_pending(&self) -> bool {
        self.slot.lock().expect("query slot lock").is_some()
    }

    /// Tries to answer the pending query with `key`. An accepted key clears
    /// the slot and resolves the suspended command.
    pub fn offer(&self, key: &str) -> Offer {
        let mut slot = self.slot.lock().expect("query slot lock");
        match slot.as_ref() {
            None => Offer::NotPending,
            Some(pending) if !pending.accepted.iter().any(|a| a == key) => {
                Offer::Rejected(pending.accepted.clone())
            }
            Some(_) => {
                let pending = slot.take().expect("pending query present");
                let _ = pending.tx.send(key.to_string());
                Offer::Accepted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_offer_without_query_is_not_pending() {
        let channel = QueryChannel::new();
        assert_eq!(channel.offer("y"), Offer::NotPending);
    }

    #[test]
    fn test_rejects_until_accepted_key() {
        let channel = QueryChannel::new();
        let mut rx = channel.begin(&answers(&["y", "n"])).unwrap();

        assert_eq!(channel.offer("x"), Offer::Rejected(answers(&["y", "n"])));
        assert!(channel.is_pending());
        assert!(rx.try_recv().is_err());

        assert_eq!(channel.offer("y"), Offer::Accepted);
        assert!(!channel.is_pending());
        assert_eq!(rx.try_recv().unwrap(), "y");
    }

    #[test]
    fn test_second_concurrent_query_is_an_error() {
        let channel = QueryChannel::new();
        let _rx = channel.begin(&answers(&["y", "n"])).unwrap();
        assert!(channel.begin(&answers(&["y"])).is_err());
        // The original query is still answerable.
        assert_eq!(channel.offer("n"), Offer::Accepted);
    }

    #[test]
    fn test_slot_is_reusable_after_resolution() {
        let channel = QueryChannel::new();
        let _rx = channel.begin(&answers(&["y"])).unwrap();
        channel.offer("y");
        assert!(channel.begin(&answers(&["a", "b"])).is_ok());
    }
}
