//! Turns raw server payloads into canonical shapes.
//!
//! The server's JSON has drifted across versions: `tags` may be an array or a JSON-encoded
//! string, list responses may nest `records`/`pagination` under `data` or flatten them, and text
//! may arrive as `content`, `snippet`, or both. Everything here degrades to a safe default and
//! logs instead of failing, so a page can always render.

use serde_json::{Map, Value};

use crate::{
	analytics::{MentalStateAnalysis, MoodTrend, RecordsSummary, TagCount, ThemeWord},
	record::{Attachment, CategoryRef, Pagination, Record, RecordPage, User},
	time_serde,
};

/// Decodes a tag set. Strings are parsed as JSON; anything unusable yields an empty list.
pub fn decode_tags(value: Option<&Value>) -> Vec<String> {
	decode_string_list("tags", value)
}

/// Shared decoder for JSON-array-or-JSON-string fields such as `tags` and `attachments`.
pub fn decode_string_list(field: &str, value: Option<&Value>) -> Vec<String> {
	match value {
		None | Some(Value::Null) => Vec::new(),
		Some(Value::Array(items)) => collect_strings(field, items),
		Some(Value::String(raw)) => {
			let raw = raw.trim();

			if raw.is_empty() {
				return Vec::new();
			}

			match serde_json::from_str::<Value>(raw) {
				Ok(Value::Array(items)) => collect_strings(field, &items),
				Ok(other) => {
					tracing::warn!(field, kind = json_kind(&other), "Decoded list is not an array.");

					Vec::new()
				},
				Err(err) => {
					tracing::warn!(field, error = %err, "Failed to decode list string.");

					Vec::new()
				},
			}
		},
		Some(other) => {
			tracing::warn!(field, kind = json_kind(other), "Unexpected list encoding.");

			Vec::new()
		},
	}
}

/// Canonicalizes one raw record. Never fails; missing fields take defaults.
pub fn normalize_record(raw: &Value) -> Record {
	let empty = Map::new();
	let object = raw.as_object().unwrap_or(&empty);
	let content = string_field(object, "content");
	let snippet = string_field(object, "snippet");
	let (content, snippet) = match (content.is_empty(), snippet.is_empty()) {
		(true, false) => (snippet.clone(), snippet),
		(false, true) => (content.clone(), content),
		_ => (content, snippet),
	};

	Record {
		id: id_field(object, "id").unwrap_or_default(),
		title: string_field(object, "title"),
		content,
		snippet,
		tags: decode_tags(object.get("tags")),
		mood: string_field(object, "mood"),
		attachments: decode_string_list("attachments", object.get("attachments")),
		category: category_ref(object),
		user_id: id_field(object, "userId"),
		created_at: timestamp_field(object, "createdAt"),
		updated_at: timestamp_field(object, "updatedAt"),
	}
}

/// Canonicalizes a list of raw records, skipping entries that are not objects.
pub fn normalize_records(raw: &[Value]) -> Vec<Record> {
	raw.iter()
		.filter(|item| {
			let keep = item.is_object();

			if !keep {
				tracing::warn!(kind = json_kind(item), "Skipping non-object record entry.");
			}

			keep
		})
		.map(normalize_record)
		.collect()
}

/// Extracts records and the pagination cursor from any known list envelope.
///
/// Recognized shapes, in order: `data.records` + `data.pagination`, top-level `records` +
/// `pagination`, and `data: [...]` + top-level `pagination`. Anything else yields an empty page
/// with a zeroed cursor.
pub fn normalize_records_page(raw: &Value) -> RecordPage {
	let nested = raw.get("data").filter(|data| data.is_object());
	let (records, pagination) =
		if let Some(records) = nested.and_then(|data| data.get("records")).and_then(Value::as_array)
		{
			let pagination = nested
				.and_then(|data| data.get("pagination"))
				.or_else(|| raw.get("pagination"));

			(records, pagination)
		} else if let Some(records) = raw.get("records").and_then(Value::as_array) {
			(records, raw.get("pagination"))
		} else if let Some(records) = raw.get("data").and_then(Value::as_array) {
			(records, raw.get("pagination"))
		} else {
			tracing::warn!(
				kind = json_kind(raw),
				"List response matches no known envelope shape; rendering an empty page."
			);

			return RecordPage::default();
		};
	let records = normalize_records(records);
	let pagination = match pagination {
		Some(value) => normalize_pagination(value),
		None => {
			tracing::warn!("List response carries no pagination block; assuming a single page.");

			Pagination {
				current_page: 1,
				total_pages: 1,
				total_records: records.len() as u64,
			}
		},
	};

	RecordPage { records, pagination }
}

/// Accepts both `{currentPage, totalPages, totalRecords}` and `{page, totalPages, total}`.
pub fn normalize_pagination(raw: &Value) -> Pagination {
	let Some(object) = raw.as_object() else {
		tracing::warn!(kind = json_kind(raw), "Pagination block is not an object.");

		return Pagination::default();
	};
	let current_page = first_u64(object, &["currentPage", "page"]).unwrap_or(0);
	let total_pages = first_u64(object, &["totalPages", "pages"]).unwrap_or(0);
	let total_records = first_u64(object, &["totalRecords", "total"]).unwrap_or(0);

	Pagination {
		current_page: u32::try_from(current_page).unwrap_or(u32::MAX),
		total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
		total_records,
	}
}

pub fn normalize_attachment(raw: &Value) -> Option<Attachment> {
	let mut value = raw.clone();

	stringify_id(&mut value, "id");
	stringify_id(&mut value, "userId");
	stringify_id(&mut value, "recordId");

	match serde_json::from_value(value) {
		Ok(attachment) => Some(attachment),
		Err(err) => {
			tracing::warn!(error = %err, "Attachment payload is missing required fields.");

			None
		},
	}
}

pub fn normalize_user(raw: &Value) -> Option<User> {
	let mut value = raw.clone();

	stringify_id(&mut value, "id");

	match serde_json::from_value(value) {
		Ok(user) => Some(user),
		Err(err) => {
			tracing::warn!(error = %err, "User payload is missing required fields.");

			None
		},
	}
}

/// Accepts `{labels, dataPoints}` or a chart dataset `{labels, datasets: [{data, borderColor}]}`.
pub fn normalize_mood_trend(raw: &Value) -> MoodTrend {
	let labels = raw
		.get("labels")
		.and_then(Value::as_array)
		.map(|items| items.iter().filter_map(scalar_to_string).collect::<Vec<_>>())
		.unwrap_or_default();
	let dataset = raw.get("datasets").and_then(Value::as_array).and_then(|sets| sets.first());
	let points = raw
		.get("dataPoints")
		.or_else(|| raw.get("data_points"))
		.or_else(|| dataset.and_then(|set| set.get("data")))
		.and_then(Value::as_array)
		.map(|items| items.iter().map(|item| item.as_f64().unwrap_or(0.0)).collect::<Vec<_>>())
		.unwrap_or_default();
	let border_color = dataset
		.and_then(|set| set.get("borderColor"))
		.and_then(Value::as_str)
		.map(str::to_string);

	if labels.len() != points.len() {
		tracing::warn!(
			labels = labels.len(),
			points = points.len(),
			"Mood trend labels and data points differ in length."
		);
	}

	MoodTrend { labels, data_points: points, border_color }
}

pub fn normalize_records_summary(raw: &Value) -> RecordsSummary {
	let Some(object) = raw.as_object() else {
		tracing::warn!(kind = json_kind(raw), "Records summary is not an object.");

		return RecordsSummary::default();
	};
	let counts = object
		.iter()
		.filter(|(key, value)| key.as_str() != "topTags" && !value.is_object() && !value.is_array())
		.map(|(key, value)| (key.clone(), value.clone()))
		.collect();
	let top_tags = object
		.get("topTags")
		.and_then(Value::as_array)
		.map(|items| items.iter().filter_map(tag_count).collect())
		.unwrap_or_default();

	RecordsSummary { counts, top_tags }
}

pub fn normalize_mental_state(raw: &Value) -> MentalStateAnalysis {
	let emotion_chart =
		raw.get("emotionChartData").map(normalize_mood_trend).unwrap_or_default();
	let theme_words = raw
		.get("themeWordCloud")
		.and_then(Value::as_array)
		.map(|items| {
			items
				.iter()
				.filter_map(|item| {
					let text = item.get("text").or_else(|| item.get("name")).and_then(Value::as_str)?;
					let value = item.get("value").and_then(Value::as_f64).unwrap_or(0.0);

					Some(ThemeWord { text: text.to_string(), value })
				})
				.collect()
		})
		.unwrap_or_default();
	let summary_report =
		raw.get("summaryReport").and_then(Value::as_str).unwrap_or_default().to_string();

	MentalStateAnalysis { emotion_chart, theme_words, summary_report }
}

fn tag_count(item: &Value) -> Option<TagCount> {
	if let Some(tag) = item.as_str() {
		return Some(TagCount { tag: tag.to_string(), count: 0 });
	}

	let tag = item.get("tag").or_else(|| item.get("name")).and_then(Value::as_str)?;
	let count = item.get("count").and_then(Value::as_u64).unwrap_or(0);

	Some(TagCount { tag: tag.to_string(), count })
}

fn collect_strings(field: &str, items: &[Value]) -> Vec<String> {
	items
		.iter()
		.filter_map(|item| {
			let value =
				scalar_to_string(item).or_else(|| item.get("id").and_then(scalar_to_string));

			if value.is_none() {
				tracing::warn!(field, kind = json_kind(item), "Dropping non-scalar list entry.");
			}

			value
		})
		.collect()
}

fn scalar_to_string(value: &Value) -> Option<String> {
	match value {
		Value::String(raw) => Some(raw.clone()),
		Value::Number(number) => Some(number.to_string()),
		Value::Bool(flag) => Some(flag.to_string()),
		_ => None,
	}
}

fn string_field(object: &Map<String, Value>, key: &str) -> String {
	object.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn id_field(object: &Map<String, Value>, key: &str) -> Option<String> {
	object.get(key).and_then(scalar_to_string).filter(|id| !id.is_empty())
}

fn timestamp_field(object: &Map<String, Value>, key: &str) -> Option<time::OffsetDateTime> {
	let raw = object.get(key).and_then(Value::as_str)?;
	let parsed = time_serde::parse_timestamp(raw);

	if parsed.is_none() {
		tracing::warn!(field = key, raw, "Unparsable record timestamp.");
	}

	parsed
}

fn category_ref(object: &Map<String, Value>) -> Option<CategoryRef> {
	match object.get("category") {
		Some(Value::Object(category)) =>
			if let Some(id) = id_field(category, "id") {
				let name = category.get("name").and_then(Value::as_str).map(str::to_string);

				return Some(CategoryRef { id, name });
			},
		Some(Value::String(id)) if !id.is_empty() =>
			return Some(CategoryRef { id: id.clone(), name: None }),
		_ => {},
	}

	id_field(object, "categoryId").map(|id| CategoryRef { id, name: None })
}

fn first_u64(object: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
	keys.iter().find_map(|key| {
		let value = object.get(*key)?;

		value
			.as_u64()
			.or_else(|| value.as_f64().filter(|n| *n >= 0.0).map(|n| n as u64))
			.or_else(|| value.as_str().and_then(|raw| raw.trim().parse().ok()))
	})
}

fn stringify_id(value: &mut Value, key: &str) {
	if let Some(slot) = value.get_mut(key)
		&& slot.is_number()
	{
		*slot = Value::String(slot.to_string());
	}
}

fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "bool",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stringifies_numeric_ids_in_lists() {
		let tags = decode_string_list("attachments", Some(&serde_json::json!([7, "a", { "id": 9 }])));

		assert_eq!(tags, vec!["7", "a", "9"]);
	}

	#[test]
	fn pagination_accepts_both_spellings() {
		let canonical =
			normalize_pagination(&serde_json::json!({ "currentPage": 2, "totalPages": 5, "totalRecords": 41 }));
		let typed = normalize_pagination(&serde_json::json!({ "page": 2, "totalPages": 5, "total": 41, "limit": 10 }));

		assert_eq!(canonical, typed);
		assert_eq!(canonical, Pagination { current_page: 2, total_pages: 5, total_records: 41 });
	}
}
