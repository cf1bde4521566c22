use fantasy_domain::{MentalStateAnalysis, MoodTrend, RecordsSummary, normalize};

use crate::{ApiClient, Notice, Result, ensure_success, envelope_data};

impl ApiClient {
	pub async fn mood_trend(&self) -> Result<MoodTrend> {
		let result: Result<_> = async {
			let json =
				self.send("GET /analytics/mood-trend", self.get("/analytics/mood-trend")).await?;

			ensure_success(&json)?;

			Ok(normalize::normalize_mood_trend(envelope_data(&json, "Mood trend")?))
		}
		.await;

		self.report("Loading the mood trend", result)
	}

	pub async fn records_summary(&self) -> Result<RecordsSummary> {
		let result: Result<_> = async {
			let request = self.get("/analytics/records-summary");
			let json = self.send("GET /analytics/records-summary", request).await?;

			ensure_success(&json)?;

			Ok(normalize::normalize_records_summary(envelope_data(&json, "Records summary")?))
		}
		.await;

		self.report("Loading the records summary", result)
	}

	pub async fn mental_state_analysis(&self) -> Result<MentalStateAnalysis> {
		let result: Result<_> = async {
			let request = self.get("/ai/mental-state-analysis");
			let json = self.send("GET /ai/mental-state-analysis", request).await?;

			ensure_success(&json)?;

			Ok(normalize::normalize_mental_state(envelope_data(&json, "Mental-state analysis")?))
		}
		.await;

		self.report("Loading the mental-state analysis", result)
	}

	/// Asks the server to recompute the analysis; the result is fetched separately.
	pub async fn trigger_analysis(&self) -> Result<()> {
		let result: Result<_> = async {
			let json =
				self.send("POST /ai/trigger-analysis", self.post("/ai/trigger-analysis")).await?;

			ensure_success(&json)
		}
		.await;

		self.report("Starting the analysis", result)?;
		self.notify(Notice::success("Analysis started."));

		Ok(())
	}
}
