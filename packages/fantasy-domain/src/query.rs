//! Derived views over an in-memory record collection.
//!
//! Nothing here mutates or refetches the collection; every call recomputes from its inputs.

use std::{cmp::Ordering, collections::BTreeSet, str::FromStr};

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::record::Record;

/// Tag-filter values that mean "no tag filter".
pub const ALL_TAGS_SENTINELS: [&str; 2] = ["all", "全部"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
	/// Newest first by creation time.
	#[default]
	Date,
	Title,
	Mood,
}
impl FromStr for SortKey {
	type Err = UnknownSortKey;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"date" => Ok(Self::Date),
			"title" => Ok(Self::Title),
			"mood" => Ok(Self::Mood),
			_ => Err(UnknownSortKey(raw.to_string())),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown sort key {0:?}; expected date, title, or mood.")]
pub struct UnknownSortKey(pub String);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TagFilter {
	#[default]
	All,
	Tag(String),
}
impl TagFilter {
	pub fn matches(&self, record: &Record) -> bool {
		match self {
			Self::All => true,
			Self::Tag(tag) => record.has_tag(tag),
		}
	}
}
impl From<&str> for TagFilter {
	fn from(raw: &str) -> Self {
		if raw.is_empty() || ALL_TAGS_SENTINELS.contains(&raw) {
			Self::All
		} else {
			Self::Tag(raw.to_string())
		}
	}
}

/// Ephemeral UI filter state. Never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterState {
	pub search_query: String,
	pub sort_key: SortKey,
	pub active_tag: TagFilter,
}

/// Case-insensitive substring match against title, content, and snippet.
pub fn matches_search(record: &Record, query: &str) -> bool {
	let needle = query.to_lowercase();

	if needle.is_empty() {
		return true;
	}

	[&record.title, &record.content, &record.snippet]
		.into_iter()
		.any(|field| field.to_lowercase().contains(&needle))
}

pub fn filter_records<'a>(
	records: &'a [Record],
	search_query: &str,
	tag: &TagFilter,
) -> Vec<&'a Record> {
	records
		.iter()
		.filter(|record| matches_search(record, search_query) && tag.matches(record))
		.collect()
}

/// Stable sort; equal keys keep their input order.
pub fn sort_records(records: &mut [&Record], key: SortKey) {
	match key {
		SortKey::Date => records.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
		SortKey::Title => records.sort_by(|a, b| compare_titles(&a.title, &b.title)),
		SortKey::Mood => records.sort_by(|a, b| a.mood.cmp(&b.mood)),
	}
}

/// Filter then sort, the view a listing page renders.
pub fn apply<'a>(records: &'a [Record], state: &FilterState) -> Vec<&'a Record> {
	let mut view = filter_records(records, &state.search_query, &state.active_tag);

	sort_records(&mut view, state.sort_key);

	view
}

/// Every distinct tag in the full collection, sorted. Feed it the unfiltered records so the
/// options do not shrink while a filter is active.
pub fn all_tags(records: &[Record]) -> Vec<String> {
	records
		.iter()
		.flat_map(|record| record.tags.iter().cloned())
		.collect::<BTreeSet<_>>()
		.into_iter()
		.collect()
}

/// Locale-style title ordering: accents and case are ignored first, the raw text breaks ties.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
	collation_key(a).cmp(&collation_key(b)).then_with(|| a.cmp(b))
}

fn collation_key(raw: &str) -> String {
	raw.nfkd().filter(|ch| !is_combining_mark(*ch)).flat_map(char::to_lowercase).collect()
}
