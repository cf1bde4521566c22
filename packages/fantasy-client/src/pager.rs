//! Paged record listing with "latest issued wins" commits.
//!
//! A [`RecordsPager`] owns the loaded records and the pagination cursor. Every list fetch takes a
//! ticket from its [`Sequencer`]; a response is committed only while its ticket is still the
//! newest one and the pager's [`AbortSignal`] has not fired. Everything else is dropped.

use std::sync::Arc;

use tokio::sync::Mutex;

use fantasy_domain::{FilterState, Pagination, Record, RecordPage, query};

use crate::{AbortSignal, ApiClient, BoxFuture, Result, Sequencer};

const LIST_QUERY: &str = "records:list";

pub trait RecordSource
where
	Self: Send + Sync,
{
	fn fetch_page<'a>(&'a self, page: u32, limit: u32) -> BoxFuture<'a, Result<RecordPage>>;
}
impl RecordSource for ApiClient {
	fn fetch_page<'a>(&'a self, page: u32, limit: u32) -> BoxFuture<'a, Result<RecordPage>> {
		Box::pin(self.list_records(page, limit))
	}
}

/// What happened to a fetch's response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Commit {
	Applied,
	/// A newer fetch was issued while this one was in flight.
	Stale,
	Cancelled,
}

#[derive(Clone, Debug, Default)]
pub struct PagerState {
	pub records: Vec<Record>,
	pub cursor: Pagination,
	pub loading: bool,
	pub error: Option<String>,
}

pub struct RecordsPager {
	source: Arc<dyn RecordSource>,
	limit: u32,
	sequencer: Sequencer,
	signal: AbortSignal,
	state: Mutex<PagerState>,
}
impl RecordsPager {
	pub fn new(source: Arc<dyn RecordSource>, limit: u32) -> Self {
		Self {
			source,
			limit,
			sequencer: Sequencer::new(),
			signal: AbortSignal::new(),
			state: Mutex::new(PagerState::default()),
		}
	}

	/// A handle that cancels this pager's in-flight and future fetches.
	pub fn signal(&self) -> AbortSignal {
		self.signal.clone()
	}

	pub fn abort(&self) {
		self.signal.abort();
	}

	pub async fn load_page(&self, page: u32) -> Result<Commit> {
		if self.signal.is_aborted() {
			return Ok(Commit::Cancelled);
		}

		let ticket = self.sequencer.issue(LIST_QUERY);

		self.state.lock().await.loading = true;

		let fetched = tokio::select! {
			biased;
			_ = self.signal.aborted() => {
				tracing::debug!(page, seq = ticket.seq(), "List fetch cancelled.");

				self.state.lock().await.loading = false;

				return Ok(Commit::Cancelled);
			},
			fetched = self.source.fetch_page(page, self.limit) => fetched,
		};
		let mut state = self.state.lock().await;

		if self.signal.is_aborted() {
			state.loading = false;

			return Ok(Commit::Cancelled);
		}
		if !self.sequencer.is_current(&ticket) {
			tracing::debug!(page, seq = ticket.seq(), "Discarding stale list response.");

			return Ok(Commit::Stale);
		}

		state.loading = false;

		match fetched {
			Ok(fetched) => {
				state.records = fetched.records;
				state.cursor = fetched.pagination;
				state.error = None;

				Ok(Commit::Applied)
			},
			Err(err) => {
				state.error = Some(err.to_string());

				Err(err)
			},
		}
	}

	/// Reloads the current page, or the first page before anything was loaded.
	pub async fn refresh(&self) -> Result<Commit> {
		let page = self.state.lock().await.cursor.current_page.max(1);

		self.load_page(page).await
	}

	/// `None` when already on the last page.
	pub async fn next_page(&self) -> Result<Option<Commit>> {
		let cursor = self.cursor().await;

		if !cursor.has_next() {
			return Ok(None);
		}

		self.load_page(cursor.current_page + 1).await.map(Some)
	}

	/// `None` when already on the first page.
	pub async fn prev_page(&self) -> Result<Option<Commit>> {
		let cursor = self.cursor().await;

		if !cursor.has_prev() {
			return Ok(None);
		}

		self.load_page(cursor.current_page - 1).await.map(Some)
	}

	pub async fn cursor(&self) -> Pagination {
		self.state.lock().await.cursor
	}

	pub async fn snapshot(&self) -> PagerState {
		self.state.lock().await.clone()
	}

	/// Filtered and sorted copy of the loaded records.
	pub async fn view(&self, filter: &FilterState) -> Vec<Record> {
		let state = self.state.lock().await;

		query::apply(&state.records, filter).into_iter().cloned().collect()
	}

	/// Tag options from the loaded records, independent of any active filter.
	pub async fn all_tags(&self) -> Vec<String> {
		query::all_tags(&self.state.lock().await.records)
	}
}

#[cfg(test)]
mod tests {
	use std::{collections::HashMap, sync::Mutex as StdMutex, time::Duration};

	use tokio::sync::oneshot;

	use fantasy_domain::TagFilter;

	use super::*;
	use crate::Error;

	fn record(id: &str, tags: &[&str]) -> Record {
		Record {
			id: id.to_string(),
			title: format!("Record {id}"),
			content: "body".to_string(),
			snippet: String::new(),
			tags: tags.iter().map(|tag| tag.to_string()).collect(),
			mood: "沉思".to_string(),
			attachments: Vec::new(),
			category: None,
			user_id: None,
			created_at: None,
			updated_at: None,
		}
	}

	fn page(current_page: u32, total_pages: u32, records: Vec<Record>) -> RecordPage {
		RecordPage {
			pagination: Pagination { current_page, total_pages, total_records: records.len() as u64 },
			records,
		}
	}

	/// Serves canned pages; a page can be held back until its gate is released.
	#[derive(Default)]
	struct StubSource {
		pages: StdMutex<HashMap<u32, RecordPage>>,
		gates: StdMutex<HashMap<u32, oneshot::Receiver<()>>>,
	}
	impl StubSource {
		fn with_page(self, page: RecordPage) -> Self {
			self.pages
				.lock()
				.unwrap_or_else(|err| err.into_inner())
				.insert(page.pagination.current_page, page);

			self
		}

		fn gate(&self, page: u32) -> oneshot::Sender<()> {
			let (tx, rx) = oneshot::channel();

			self.gates.lock().unwrap_or_else(|err| err.into_inner()).insert(page, rx);

			tx
		}
	}
	impl RecordSource for StubSource {
		fn fetch_page<'a>(&'a self, page: u32, _limit: u32) -> BoxFuture<'a, Result<RecordPage>> {
			let gate = self.gates.lock().unwrap_or_else(|err| err.into_inner()).remove(&page);

			Box::pin(async move {
				if let Some(gate) = gate {
					let _ = gate.await;
				}

				self.pages
					.lock()
					.unwrap_or_else(|err| err.into_inner())
					.get(&page)
					.cloned()
					.ok_or(Error::RequestFailed { status: 404, body: "no such page".to_string() })
			})
		}
	}

	#[tokio::test]
	async fn applies_pages_and_walks_the_cursor() {
		let source = StubSource::default()
			.with_page(page(1, 2, vec![record("1", &["a"]), record("2", &["b"])]))
			.with_page(page(2, 2, vec![record("3", &["c"])]));
		let pager = RecordsPager::new(Arc::new(source), 10);

		assert_eq!(pager.load_page(1).await.expect("load"), Commit::Applied);
		assert_eq!(pager.all_tags().await, vec!["a", "b"]);
		assert_eq!(pager.prev_page().await.expect("prev"), None);
		assert_eq!(pager.next_page().await.expect("next"), Some(Commit::Applied));
		assert_eq!(pager.cursor().await.current_page, 2);
		assert_eq!(pager.next_page().await.expect("next"), None);

		let filter = FilterState { active_tag: TagFilter::from("c"), ..FilterState::default() };

		assert_eq!(pager.view(&filter).await.len(), 1);
	}

	#[tokio::test]
	async fn failed_fetch_keeps_previous_cursor() {
		let source = StubSource::default().with_page(page(1, 3, vec![record("1", &[])]));
		let pager = RecordsPager::new(Arc::new(source), 10);

		pager.load_page(1).await.expect("load");

		let err = pager.load_page(9).await.expect_err("Expected a 404.");
		let state = pager.snapshot().await;

		assert_eq!(err.status(), Some(404));
		assert_eq!(state.cursor.current_page, 1);
		assert_eq!(state.records.len(), 1);
		assert!(state.error.is_some());
		assert!(!state.loading);
	}

	#[tokio::test]
	async fn older_response_resolving_last_is_stale() {
		let source = Arc::new(
			StubSource::default()
				.with_page(page(1, 2, vec![record("old", &[])]))
				.with_page(page(2, 2, vec![record("new", &[])])),
		);
		let release_first = source.gate(1);
		let pager = Arc::new(RecordsPager::new(source, 10));
		let first = {
			let pager = pager.clone();

			tokio::spawn(async move { pager.load_page(1).await })
		};

		tokio::time::sleep(Duration::from_millis(20)).await;

		assert_eq!(pager.load_page(2).await.expect("second load"), Commit::Applied);

		release_first.send(()).expect("gate");

		let first = first.await.expect("task").expect("first load");

		assert_eq!(first, Commit::Stale);
		assert_eq!(pager.snapshot().await.records[0].id, "new");
	}

	#[tokio::test]
	async fn abort_cancels_in_flight_fetch_without_committing() {
		let source = Arc::new(StubSource::default().with_page(page(1, 1, vec![record("1", &[])])));
		let _hold = source.gate(1);
		let pager = Arc::new(RecordsPager::new(source, 10));
		let pending = {
			let pager = pager.clone();

			tokio::spawn(async move { pager.load_page(1).await })
		};

		tokio::time::sleep(Duration::from_millis(20)).await;
		pager.abort();

		let outcome = tokio::time::timeout(Duration::from_secs(1), pending)
			.await
			.expect("Aborted fetch must resolve.")
			.expect("task")
			.expect("load");

		let state = pager.snapshot().await;

		assert_eq!(outcome, Commit::Cancelled);
		assert!(state.records.is_empty());
		assert!(!state.loading);
		assert_eq!(pager.load_page(1).await.expect("load"), Commit::Cancelled);
	}
}
