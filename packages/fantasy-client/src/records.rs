use serde_json::Value;

use fantasy_config::MAX_PAGE_SIZE;
use fantasy_domain::{
	Record, RecordDraft, RecordPage, RecordPatch, normalize,
	validate::{validate_draft, validate_patch},
};

use crate::{ApiClient, Error, Notice, Result, ensure_success, envelope_data, path_id};

impl ApiClient {
	/// `limit` is clamped to `1..=50`; page numbers start at 1.
	pub async fn list_records(&self, page: u32, limit: u32) -> Result<RecordPage> {
		let page = page.max(1);
		let limit = limit.clamp(1, MAX_PAGE_SIZE);
		let result: Result<RecordPage> = async {
			let request = self.get("/records").query(&[("page", page), ("limit", limit)]);
			let json = self.send("GET /records", request).await?;

			ensure_success(&json)?;

			Ok(normalize::normalize_records_page(&json))
		}
		.await;

		self.report("Loading records", result)
	}

	pub async fn get_record(&self, id: &str) -> Result<Record> {
		let id = path_id(id)?;
		let result: Result<_> = async {
			let json = self.send("GET /records/{id}", self.http.get(self.record_url(id)?)).await?;

			record_from_envelope(&json)
		}
		.await;

		self.report("Loading the record", result)
	}

	/// Validates locally first; an invalid draft never reaches the network.
	pub async fn create_record(&self, draft: &RecordDraft) -> Result<Record> {
		validate_draft(draft).map_err(|errors| Error::Validation { errors })?;

		let result: Result<_> = async {
			let json = self.send("POST /records", self.post("/records").json(draft)).await?;

			record_from_envelope(&json)
		}
		.await;
		let record = self.report("Creating the record", result)?;

		tracing::info!(record_id = %record.id, "Record created.");

		self.notify(Notice::success("Record created."));

		Ok(record)
	}

	pub async fn update_record(&self, id: &str, patch: &RecordPatch) -> Result<Record> {
		let id = path_id(id)?;

		validate_patch(patch).map_err(|errors| Error::Validation { errors })?;

		let result: Result<_> = async {
			let request = self.http.put(self.record_url(id)?).json(patch);
			let json = self.send("PUT /records/{id}", request).await?;

			record_from_envelope(&json)
		}
		.await;
		let record = self.report("Updating the record", result)?;

		tracing::info!(record_id = %record.id, "Record updated.");

		self.notify(Notice::success("Record updated."));

		Ok(record)
	}

	pub async fn delete_record(&self, id: &str) -> Result<()> {
		let id = path_id(id)?;
		let result: Result<_> = async {
			let request = self.http.delete(self.record_url(id)?);
			let json = self.send("DELETE /records/{id}", request).await?;

			ensure_success(&json)
		}
		.await;

		self.report("Deleting the record", result)?;

		tracing::info!(record_id = id, "Record deleted.");

		self.notify(Notice::success("Record deleted."));

		Ok(())
	}
}

fn record_from_envelope(json: &Value) -> Result<Record> {
	ensure_success(json)?;

	let data = envelope_data(json, "Record")?;

	if !data.is_object() {
		return Err(Error::InvalidResponse { message: "Record payload is not an object.".to_string() });
	}

	Ok(normalize::normalize_record(data))
}
