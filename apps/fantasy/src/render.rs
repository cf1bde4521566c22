//! Terminal output for command results.

use serde::Serialize;
use serde_json::json;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use fantasy_cli::OutputFormat;
use fantasy_client::UploadReport;
use fantasy_domain::{
	MentalStateAnalysis, MoodTrend, Pagination, Record, RecordsSummary, User, mood::mood_emoji,
	snippet::{DEFAULT_SNIPPET_CHARS, generate_snippet},
};

const NO_DATE: &str = "----------";

fn print_json<T>(value: &T) -> color_eyre::Result<()>
where
	T: ?Sized + Serialize,
{
	println!("{}", serde_json::to_string_pretty(value)?);

	Ok(())
}

fn timestamp(at: Option<OffsetDateTime>) -> color_eyre::Result<String> {
	match at {
		Some(at) => Ok(at.format(&Rfc3339)?),
		None => Ok(NO_DATE.to_string()),
	}
}

/// `id  date  emoji title  #tags`
pub fn record_line(record: &Record) -> String {
	let date = record.created_at.map(|at| at.date().to_string()).unwrap_or_else(|| NO_DATE.into());
	let tags =
		if record.tags.is_empty() { String::new() } else { format!("  #{}", record.tags.join(" #")) };

	format!("{:>6}  {date}  {} {}{tags}", record.id, mood_emoji(&record.mood), record.title)
}

pub fn records(view: &[Record], cursor: Pagination, output: OutputFormat) -> color_eyre::Result<()> {
	if output == OutputFormat::Json {
		return print_json(&json!({ "records": view, "pagination": cursor }));
	}

	for record in view {
		println!("{}", record_line(record));

		let preview = generate_snippet(record.body(), DEFAULT_SNIPPET_CHARS);

		if !preview.is_empty() {
			println!("        {preview}");
		}
	}

	println!(
		"Page {}/{} ({} records, {} shown).",
		cursor.current_page,
		cursor.total_pages,
		cursor.total_records,
		view.len()
	);

	Ok(())
}

pub fn record(record: &Record, output: OutputFormat) -> color_eyre::Result<()> {
	if output == OutputFormat::Json {
		return print_json(record);
	}

	println!("{} {}", mood_emoji(&record.mood), record.title);
	println!("id:       {}", record.id);
	println!("mood:     {}", record.mood);
	println!("tags:     {}", record.tags.join(", "));
	println!("created:  {}", timestamp(record.created_at)?);
	println!("updated:  {}", timestamp(record.updated_at)?);

	if let Some(category) = &record.category {
		println!("category: {}", category.name.as_deref().unwrap_or(&category.id));
	}
	if !record.attachments.is_empty() {
		println!("files:    {}", record.attachments.join(", "));
	}

	println!();
	println!("{}", record.body());

	Ok(())
}

pub fn user(user: &User, output: OutputFormat) -> color_eyre::Result<()> {
	if output == OutputFormat::Json {
		return print_json(user);
	}

	println!("{} <{}> (id {})", user.username, user.email, user.id);

	Ok(())
}

pub fn tags(tags: &[String], output: OutputFormat) -> color_eyre::Result<()> {
	if output == OutputFormat::Json {
		return print_json(tags);
	}

	for tag in tags {
		println!("{tag}");
	}

	Ok(())
}

pub fn upload_report(report: &UploadReport, output: OutputFormat) -> color_eyre::Result<()> {
	if output == OutputFormat::Json {
		return print_json(report);
	}

	for attachment in &report.uploaded {
		println!("uploaded  {}  {}  {}", attachment.id, attachment.file_name, attachment.url);
	}
	for failure in &report.failed {
		println!("failed    {}  {}", failure.file_name, failure.reason);
	}

	Ok(())
}

pub fn mood_trend(trend: &MoodTrend, output: OutputFormat) -> color_eyre::Result<()> {
	if output == OutputFormat::Json {
		return print_json(trend);
	}

	for (label, value) in trend.points() {
		println!("{label:<12} {value:>6.2}  {}", bar(value));
	}

	Ok(())
}

pub fn summary(summary: &RecordsSummary, output: OutputFormat) -> color_eyre::Result<()> {
	if output == OutputFormat::Json {
		return print_json(summary);
	}

	for (key, value) in &summary.counts {
		println!("{key}: {value}");
	}
	if !summary.top_tags.is_empty() {
		let top = summary
			.top_tags
			.iter()
			.map(|entry| format!("{} ({})", entry.tag, entry.count))
			.collect::<Vec<_>>();

		println!("topTags: {}", top.join(", "));
	}

	Ok(())
}

pub fn analysis(analysis: &MentalStateAnalysis, output: OutputFormat) -> color_eyre::Result<()> {
	if output == OutputFormat::Json {
		return print_json(analysis);
	}

	println!("{}", analysis.summary_report);
	println!();

	for (label, value) in analysis.emotion_chart.points() {
		println!("{} {label:<10} {value:>6.2}  {}", mood_emoji(label), bar(value));
	}
	if !analysis.theme_words.is_empty() {
		let words = analysis
			.theme_words
			.iter()
			.map(|word| format!("{} ({})", word.text, word.value))
			.collect::<Vec<_>>();

		println!();
		println!("themes: {}", words.join(", "));
	}

	Ok(())
}

fn bar(value: f64) -> String {
	"#".repeat(value.clamp(0.0, 60.0).round() as usize)
}
