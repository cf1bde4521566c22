use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::mood::Mood;

/// Canonical journaling entry, as produced by [`crate::normalize::normalize_record`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
	pub id: String,
	pub title: String,
	pub content: String,
	pub snippet: String,
	pub tags: Vec<String>,
	pub mood: String,
	/// Attachment ids; metadata is resolved server-side.
	pub attachments: Vec<String>,
	pub category: Option<CategoryRef>,
	pub user_id: Option<String>,
	#[serde(with = "crate::time_serde::option")]
	pub created_at: Option<OffsetDateTime>,
	#[serde(with = "crate::time_serde::option")]
	pub updated_at: Option<OffsetDateTime>,
}
impl Record {
	/// Display text: content when present, otherwise the snippet.
	pub fn body(&self) -> &str {
		if self.content.is_empty() { &self.snippet } else { &self.content }
	}

	pub fn mood_kind(&self) -> Option<Mood> {
		Mood::from_label(&self.mood)
	}

	pub fn has_tag(&self, tag: &str) -> bool {
		self.tags.iter().any(|candidate| candidate == tag)
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
	pub id: String,
	pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
	pub id: String,
	pub url: String,
	#[serde(alias = "filename")]
	pub file_name: String,
	#[serde(alias = "mimeType")]
	pub file_type: String,
	#[serde(default)]
	pub file_size: Option<u64>,
	#[serde(default)]
	pub user_id: Option<String>,
	#[serde(default)]
	pub record_id: Option<String>,
	#[serde(default, with = "crate::time_serde::option")]
	pub created_at: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	pub id: String,
	pub username: String,
	pub email: String,
	#[serde(default)]
	pub settings: Option<Value>,
	#[serde(default, with = "crate::time_serde::option")]
	pub created_at: Option<OffsetDateTime>,
}

/// Pagination cursor. Only a successful list fetch replaces it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
	pub current_page: u32,
	pub total_pages: u32,
	pub total_records: u64,
}
impl Pagination {
	pub fn has_next(&self) -> bool {
		self.current_page < self.total_pages
	}

	pub fn has_prev(&self) -> bool {
		self.current_page > 1
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RecordPage {
	pub records: Vec<Record>,
	pub pagination: Pagination,
}

/// Body of `POST /records`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDraft {
	pub title: String,
	pub content: String,
	pub tags: Vec<String>,
	pub mood: String,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub attachments: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub category_id: Option<String>,
}

/// Body of `PUT /records/{id}`; unset fields are left untouched by the server.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPatch {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub content: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tags: Option<Vec<String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub mood: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub attachments: Option<Vec<String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub category_id: Option<String>,
}
impl RecordPatch {
	pub fn is_empty(&self) -> bool {
		self == &Self::default()
	}
}
