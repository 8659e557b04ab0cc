//! Plumbing shared by the off-thread workers.
//!
//! Requests and responses cross the boundary by value. Inbound JSON that does
//! not match a worker's request shape is logged and dropped.

use serde::de::DeserializeOwned;
use tokio::sync::oneshot;
use tracing::warn;

/// Parses an inbound message for `worker`, or rejects it.
pub fn decode_message<T: DeserializeOwned>(worker: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(message) => Some(message),
        Err(err) => {
            warn!(worker, %err, "rejecting malformed message");
            None
        }
    }
}

/// Runs a synchronous single-pass job on the blocking pool and answers once.
pub fn spawn_oneshot<T, F>(worker: &'static str, job: F) -> oneshot::Receiver<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    // A panicking job drops `tx`, which the receiver sees as a closed channel.
    tokio::task::spawn_blocking(move || {
        if tx.send(job()).is_err() {
            warn!(worker, "reply dropped, receiver gone");
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Ping { n: u32 }

    #[test]
    fn decode_accepts_matching_shape() {
        assert_eq!(decode_message::<Ping>("test", r#"{"n": 3}"#), Some(Ping { n: 3 }));
    }

    #[test]
    fn decode_rejects_malformed() {
        assert_eq!(decode_message::<Ping>("test", r#"{"m": 3}"#), None);
        assert_eq!(decode_message::<Ping>("test", "not json"), None);
    }

    #[tokio::test]
    async fn oneshot_answers_once() {
        let rx = spawn_oneshot("test", || 21 * 2);
        assert_eq!(rx.await.unwrap(), 42);
    }
}
