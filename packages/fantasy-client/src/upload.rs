//! Attachment upload: one multipart request per file, batches settle independently.

use std::{fs, path::Path};

use reqwest::multipart::{Form, Part};
use serde::Serialize;

use fantasy_domain::{Attachment, normalize, validate::validate_file};

use crate::{ApiClient, Error, Notice, Result, ensure_success};

const MIME_BY_EXTENSION: &[(&str, &str)] = &[
	("jpg", "image/jpeg"),
	("jpeg", "image/jpeg"),
	("png", "image/png"),
	("gif", "image/gif"),
	("webp", "image/webp"),
	("pdf", "application/pdf"),
	("txt", "text/plain"),
	("doc", "application/msword"),
	("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
];
const FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Clone, Debug)]
pub struct UploadFile {
	pub file_name: String,
	pub mime_type: String,
	pub bytes: Vec<u8>,
}
impl UploadFile {
	pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
		Self { file_name: file_name.into(), mime_type: mime_type.into(), bytes }
	}

	/// Reads a file from disk and guesses its MIME type from the extension.
	pub fn from_path(path: &Path) -> Result<Self> {
		let bytes = fs::read(path)
			.map_err(|source| Error::ReadFile { path: path.to_path_buf(), source })?;
		let file_name = path
			.file_name()
			.map(|name| name.to_string_lossy().into_owned())
			.unwrap_or_else(|| path.display().to_string());

		Ok(Self { mime_type: guess_mime(path).to_string(), file_name, bytes })
	}

	pub fn size(&self) -> u64 {
		self.bytes.len() as u64
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UploadFailure {
	pub file_name: String,
	pub reason: String,
}

/// Outcome of a batch upload. Partial success is normal.
#[derive(Clone, Debug, Default, Serialize)]
pub struct UploadReport {
	pub uploaded: Vec<Attachment>,
	pub failed: Vec<UploadFailure>,
}
impl UploadReport {
	pub fn is_complete(&self) -> bool {
		self.failed.is_empty()
	}
}

impl ApiClient {
	/// Checks the file against the configured rules, then uploads it as multipart field `file`.
	pub async fn upload_file(&self, file: &UploadFile) -> Result<Attachment> {
		if let Err(rejection) =
			validate_file(&file.file_name, &file.mime_type, file.size(), self.upload_rules())
		{
			tracing::warn!(file = %file.file_name, reason = %rejection, "Rejected file before upload.");

			self.notify(Notice::error(rejection.to_string()));

			return Err(rejection.into());
		}

		let result: Result<_> = async {
			let part = Part::bytes(file.bytes.clone())
				.file_name(file.file_name.clone())
				.mime_str(&file.mime_type)?;
			let request = self.post("/attachments/upload").multipart(Form::new().part("file", part));
			let json = self.send("POST /attachments/upload", request).await?;

			ensure_success(&json)?;

			json.get("attachment")
				.or_else(|| json.get("data"))
				.and_then(normalize::normalize_attachment)
				.ok_or_else(|| Error::InvalidResponse {
					message: "Upload response is missing the attachment.".to_string(),
				})
		}
		.await;

		self.report(&format!("Uploading {}", file.file_name), result)
	}

	/// Uploads every file concurrently and waits for all of them to settle.
	pub async fn upload_files(&self, files: &[UploadFile]) -> UploadReport {
		let results = futures::future::join_all(files.iter().map(|file| self.upload_file(file))).await;
		let mut report = UploadReport::default();

		for (file, result) in files.iter().zip(results) {
			match result {
				Ok(attachment) => report.uploaded.push(attachment),
				Err(err) => report
					.failed
					.push(UploadFailure { file_name: file.file_name.clone(), reason: err.to_string() }),
			}
		}

		tracing::info!(
			uploaded = report.uploaded.len(),
			failed = report.failed.len(),
			"Batch upload settled."
		);

		if !report.uploaded.is_empty() {
			self.notify(Notice::success(format!("Uploaded {} file(s).", report.uploaded.len())));
		}

		report
	}
}

pub fn guess_mime(path: &Path) -> &'static str {
	let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
		return FALLBACK_MIME;
	};

	MIME_BY_EXTENSION
		.iter()
		.find(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
		.map(|(_, mime)| *mime)
		.unwrap_or(FALLBACK_MIME)
}
