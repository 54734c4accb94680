use std::time::Duration;

use tokio::sync::watch;
use tracing::warn;

/// Cooperative shutdown signal. `Signal` is held by the process entry point
/// and triggers `shutdown()`; every background task (mapping reaper, cache
/// reaper, audit flusher) holds a `Watcher` clone and selects on
/// `watcher.signaled()` in its loop.
#[derive(Debug)]
pub struct Signal {
	tx: watch::Sender<bool>,
}

#[derive(Clone, Debug)]
pub struct Watcher {
	rx: watch::Receiver<bool>,
}

pub fn new() -> (Signal, Watcher) {
	let (tx, rx) = watch::channel(false);
	(Signal { tx }, Watcher { rx })
}

impl Signal {
	/// Trigger shutdown. Idempotent.
	pub fn shutdown(&self) {
		let _ = self.tx.send(true);
	}
}

impl Watcher {
	/// Resolves once shutdown has been signaled. Safe to poll repeatedly and
	/// to call from multiple clones concurrently.
	pub async fn signaled(&mut self) {
		if *self.rx.borrow() {
			return;
		}
		let _ = self.rx.changed().await;
	}

	pub fn is_signaled(&self) -> bool {
		*self.rx.borrow()
	}
}

/// Joins a set of background task handles, giving each `timeout` to finish
/// after shutdown was already signaled. Tasks that do not finish in time are
/// abandoned (their `JoinHandle` is dropped, not aborted) and logged.
pub async fn join_within(
	handles: Vec<(&'static str, tokio::task::JoinHandle<()>)>,
	timeout: Duration,
) {
	for (name, handle) in handles {
		match tokio::time::timeout(timeout, handle).await {
			Ok(Ok(())) => {},
			Ok(Err(e)) => warn!(task = name, error = %e, "background task panicked during shutdown"),
			Err(_) => warn!(task = name, ?timeout, "background task did not finish before shutdown deadline"),
		}
	}
}
