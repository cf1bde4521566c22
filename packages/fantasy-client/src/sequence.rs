//! Latest-issued-wins bookkeeping for overlapping fetches of the same logical query.

use std::{
	collections::HashMap,
	sync::{
		Mutex,
		atomic::{AtomicU64, Ordering},
	},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
	key: String,
	seq: u64,
}
impl Ticket {
	pub fn key(&self) -> &str {
		&self.key
	}

	pub fn seq(&self) -> u64 {
		self.seq
	}
}

#[derive(Debug, Default)]
pub struct Sequencer {
	next: AtomicU64,
	latest: Mutex<HashMap<String, u64>>,
}
impl Sequencer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Issues a ticket that supersedes every earlier ticket for `key`.
	pub fn issue(&self, key: &str) -> Ticket {
		let seq = self.next.fetch_add(1, Ordering::SeqCst) + 1;
		let mut latest = self.latest.lock().unwrap_or_else(|err| err.into_inner());

		latest.insert(key.to_string(), seq);

		Ticket { key: key.to_string(), seq }
	}

	/// True while no newer ticket has been issued for the same key.
	pub fn is_current(&self, ticket: &Ticket) -> bool {
		let latest = self.latest.lock().unwrap_or_else(|err| err.into_inner());

		latest.get(&ticket.key).is_some_and(|seq| *seq == ticket.seq)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn newer_tickets_supersede_older_ones_per_key() {
		let sequencer = Sequencer::new();
		let first = sequencer.issue("records:list");
		let other = sequencer.issue("records:detail");
		let second = sequencer.issue("records:list");

		assert!(second.seq() > first.seq());
		assert!(!sequencer.is_current(&first));
		assert!(sequencer.is_current(&second));
		assert!(sequencer.is_current(&other));
	}
}
