//! Client-side checks that block a submission before any request is made.

use std::fmt;

use serde::Serialize;

use crate::record::{RecordDraft, RecordPatch};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
	pub field: &'static str,
	pub message: &'static str,
}
impl fmt::Display for FieldError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.field, self.message)
	}
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FileRejection {
	#[error("{file_name}: unsupported file type {mime}.")]
	UnsupportedType { file_name: String, mime: String },
	#[error(
		"{file_name}: file size {:.2}MB exceeds the {:.2}MB limit.",
		megabytes(.size),
		megabytes(.limit)
	)]
	TooLarge { file_name: String, size: u64, limit: u64 },
}
impl FileRejection {
	pub fn file_name(&self) -> &str {
		match self {
			Self::UnsupportedType { file_name, .. } | Self::TooLarge { file_name, .. } => file_name,
		}
	}
}

pub fn validate_draft(draft: &RecordDraft) -> Result<(), Vec<FieldError>> {
	let mut errors = Vec::new();

	if draft.title.trim().is_empty() {
		errors.push(FieldError { field: "title", message: "Title must not be empty." });
	}
	if draft.content.trim().is_empty() {
		errors.push(FieldError { field: "content", message: "Content must not be empty." });
	}
	if draft.mood.trim().is_empty() {
		errors.push(FieldError { field: "mood", message: "Choose a mood." });
	}

	if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Fields present in a patch obey the same rules as a draft; absent fields are not checked.
pub fn validate_patch(patch: &RecordPatch) -> Result<(), Vec<FieldError>> {
	let mut errors = Vec::new();

	if patch.is_empty() {
		errors.push(FieldError { field: "record", message: "Nothing to update." });
	}
	if patch.title.as_deref().is_some_and(|title| title.trim().is_empty()) {
		errors.push(FieldError { field: "title", message: "Title must not be empty." });
	}
	if patch.content.as_deref().is_some_and(|content| content.trim().is_empty()) {
		errors.push(FieldError { field: "content", message: "Content must not be empty." });
	}
	if patch.mood.as_deref().is_some_and(|mood| mood.trim().is_empty()) {
		errors.push(FieldError { field: "mood", message: "Choose a mood." });
	}

	if errors.is_empty() { Ok(()) } else { Err(errors) }
}

pub fn validate_file(
	file_name: &str,
	mime: &str,
	size: u64,
	rules: &fantasy_config::Upload,
) -> Result<(), FileRejection> {
	if !rules.allows_type(mime) {
		return Err(FileRejection::UnsupportedType {
			file_name: file_name.to_string(),
			mime: mime.to_string(),
		});
	}
	if size > rules.max_file_bytes {
		return Err(FileRejection::TooLarge {
			file_name: file_name.to_string(),
			size,
			limit: rules.max_file_bytes,
		});
	}

	Ok(())
}

fn megabytes(bytes: &u64) -> f64 {
	*bytes as f64 / 1024.0 / 1024.0
}

#[cfg(test)]
mod tests {
	use super::*;

	fn draft() -> RecordDraft {
		RecordDraft {
			title: "Night train".to_string(),
			content: "A train that only runs in dreams.".to_string(),
			tags: vec!["story".to_string()],
			mood: "沉思".to_string(),
			..Default::default()
		}
	}

	#[test]
	fn complete_draft_passes() {
		assert_eq!(validate_draft(&draft()), Ok(()));
	}

	#[test]
	fn reports_every_missing_field() {
		let errors = validate_draft(&RecordDraft { title: "  ".to_string(), ..Default::default() })
			.expect_err("Expected validation errors.");
		let fields: Vec<_> = errors.iter().map(|error| error.field).collect();

		assert_eq!(fields, vec!["title", "content", "mood"]);
	}

	#[test]
	fn patch_checks_only_present_fields() {
		let ok = RecordPatch { tags: Some(Vec::new()), ..Default::default() };
		let blank = RecordPatch { title: Some(String::new()), ..Default::default() };

		assert_eq!(validate_patch(&ok), Ok(()));
		assert_eq!(validate_patch(&blank).expect_err("blank title").len(), 1);
		assert_eq!(validate_patch(&RecordPatch::default()).expect_err("empty patch")[0].field, "record");
	}

	#[test]
	fn file_rules_check_type_then_size() {
		let rules = fantasy_config::Upload::default();
		let too_big = rules.max_file_bytes + 1;

		assert_eq!(validate_file("a.png", "image/png", 1_024, &rules), Ok(()));
		assert!(matches!(
			validate_file("a.zip", "application/zip", 1, &rules),
			Err(FileRejection::UnsupportedType { .. })
		));

		let rejection = validate_file("big.pdf", "application/pdf", too_big, &rules)
			.expect_err("Expected size rejection.");

		assert_eq!(rejection.file_name(), "big.pdf");
		assert!(rejection.to_string().contains("exceeds the 10.00MB limit"));
	}
}
