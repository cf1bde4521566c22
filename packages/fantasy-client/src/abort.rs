use std::sync::{
	Arc,
	atomic::{AtomicBool, Ordering},
};

use tokio::sync::Notify;

/// Cancellation flag shared between an owner and the operations it started.
///
/// Once aborted it stays aborted; operations check it before committing any state.
#[derive(Clone, Debug, Default)]
pub struct AbortSignal {
	inner: Arc<AbortState>,
}

#[derive(Debug, Default)]
struct AbortState {
	aborted: AtomicBool,
	notify: Notify,
}

impl AbortSignal {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn abort(&self) {
		self.inner.aborted.store(true, Ordering::SeqCst);
		self.inner.notify.notify_waiters();
	}

	pub fn is_aborted(&self) -> bool {
		self.inner.aborted.load(Ordering::SeqCst)
	}

	/// Resolves once [`AbortSignal::abort`] has been called.
	pub async fn aborted(&self) {
		let notified = self.inner.notify.notified();

		tokio::pin!(notified);

		notified.as_mut().enable();

		if self.is_aborted() {
			return;
		}

		notified.await;
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;

	#[tokio::test]
	async fn waiters_wake_on_abort() {
		let signal = AbortSignal::new();
		let waiter = {
			let signal = signal.clone();

			tokio::spawn(async move { signal.aborted().await })
		};

		tokio::time::sleep(Duration::from_millis(10)).await;
		signal.abort();

		tokio::time::timeout(Duration::from_secs(1), waiter)
			.await
			.expect("Waiter must wake.")
			.expect("Waiter task panicked.");

		assert!(signal.is_aborted());

		// Already aborted: resolves immediately.
		signal.aborted().await;
	}
}
