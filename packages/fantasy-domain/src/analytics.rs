use serde::Serialize;
use serde_json::{Map, Value};

/// Mood series for charting; labels and points are index-aligned.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodTrend {
	pub labels: Vec<String>,
	pub data_points: Vec<f64>,
	pub border_color: Option<String>,
}
impl MoodTrend {
	pub fn points(&self) -> impl Iterator<Item = (&str, f64)> {
		self.labels.iter().map(String::as_str).zip(self.data_points.iter().copied())
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TagCount {
	pub tag: String,
	pub count: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsSummary {
	/// Every scalar field of the payload other than `topTags`.
	pub counts: Map<String, Value>,
	pub top_tags: Vec<TagCount>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ThemeWord {
	pub text: String,
	pub value: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MentalStateAnalysis {
	pub emotion_chart: MoodTrend,
	pub theme_words: Vec<ThemeWord>,
	pub summary_report: String,
}
