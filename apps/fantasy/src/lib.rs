pub mod render;

use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use tracing_subscriber::EnvFilter;

use fantasy_cli::OutputFormat;
use fantasy_client::{ApiClient, Commit, LogNotifier, RecordsPager, Session, UploadFile};
use fantasy_domain::{
	FilterState, Mood, Record, RecordDraft, RecordPatch, SortKey, TagFilter,
	validate::validate_draft,
};

#[derive(Debug, Parser)]
#[command(
	version = fantasy_cli::VERSION,
	rename_all = "kebab",
	styles = fantasy_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Text)]
	pub output: OutputFormat,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Sign in and store the session token.
	Login {
		#[arg(long)]
		email: String,
		#[arg(long)]
		password: String,
	},
	Register {
		#[arg(long)]
		username: String,
		#[arg(long)]
		email: String,
		#[arg(long)]
		password: String,
	},
	Whoami,
	Logout,
	/// List one page of records, filtered and sorted locally.
	List {
		#[arg(long, default_value_t = 1)]
		page: u32,
		#[arg(long)]
		limit: Option<u32>,
		#[arg(long)]
		search: Option<String>,
		/// Tag to filter by; `all` disables the filter.
		#[arg(long)]
		tag: Option<String>,
		/// One of date, title, or mood.
		#[arg(long, default_value = "date")]
		sort: SortKey,
	},
	/// Every tag on the given page, independent of filters.
	Tags {
		#[arg(long, default_value_t = 1)]
		page: u32,
	},
	Show {
		id: String,
	},
	Create {
		#[arg(long)]
		title: String,
		#[arg(long, conflicts_with = "content_file")]
		content: Option<String>,
		#[arg(long, value_name = "FILE")]
		content_file: Option<PathBuf>,
		#[arg(long = "tag")]
		tags: Vec<String>,
		/// Server label (e.g. 沉思) or English name (e.g. pensive).
		#[arg(long)]
		mood: String,
		/// Upload these files first and attach them.
		#[arg(long = "attach", value_name = "FILE")]
		attachments: Vec<PathBuf>,
	},
	Update {
		id: String,
		#[arg(long)]
		title: Option<String>,
		#[arg(long)]
		content: Option<String>,
		/// Replaces the whole tag list.
		#[arg(long = "tag")]
		tags: Option<Vec<String>>,
		#[arg(long)]
		mood: Option<String>,
	},
	Delete {
		id: String,
	},
	Upload {
		#[arg(required = true)]
		files: Vec<PathBuf>,
	},
	MoodTrend,
	Summary,
	Analysis,
	TriggerAnalysis,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = fantasy_config::load(&args.config)?;

	init_tracing(&config)?;

	let session = Session::load(&config.session)?;
	let client = Arc::new(ApiClient::new(&config, session, Arc::new(LogNotifier))?);
	let output = args.output;

	match args.command {
		Command::Login { email, password } => {
			let user = client.login(&email, &password).await?;

			render::user(&user, output)?;
		},
		Command::Register { username, email, password } => {
			let user = client.register(&username, &email, &password).await?;

			render::user(&user, output)?;
		},
		Command::Whoami => {
			if !client.session().is_authenticated() {
				tracing::warn!("No stored session; the request will be sent without a token.");
			}

			render::user(&client.current_user().await?, output)?;
		},
		Command::Logout => client.logout().await?,
		Command::List { page, limit, search, tag, sort } => {
			let pager = RecordsPager::new(client.clone(), limit.unwrap_or(client.page_size()));

			if !load(&pager, page).await? {
				return Ok(());
			}

			let filter = FilterState {
				search_query: search.unwrap_or_default(),
				sort_key: sort,
				active_tag: tag.as_deref().map(TagFilter::from).unwrap_or_default(),
			};
			let view = pager.view(&filter).await;

			render::records(&view, pager.cursor().await, output)?;
		},
		Command::Tags { page } => {
			let pager = RecordsPager::new(client.clone(), client.page_size());

			if load(&pager, page).await? {
				render::tags(&pager.all_tags().await, output)?;
			}
		},
		Command::Show { id } => render::record(&client.get_record(&id).await?, output)?,
		Command::Create { title, content, content_file, tags, mood, attachments } => {
			let content = match (content, content_file) {
				(Some(content), _) => content,
				(None, Some(path)) => std::fs::read_to_string(&path)
					.map_err(|err| eyre::eyre!("Failed to read {}: {err}", path.display()))?,
				(None, None) => String::new(),
			};
			let draft = RecordDraft {
				title,
				content,
				tags,
				mood: mood_label(&mood)?,
				attachments: Vec::new(),
				category_id: None,
			};

			render::record(&create(&client, draft, &attachments).await?, output)?;
		},
		Command::Update { id, title, content, tags, mood } => {
			let patch = RecordPatch {
				title,
				content,
				tags,
				mood: mood.as_deref().map(mood_label).transpose()?,
				..RecordPatch::default()
			};

			render::record(&client.update_record(&id, &patch).await?, output)?;
		},
		Command::Delete { id } => client.delete_record(&id).await?,
		Command::Upload { files } => {
			let files = files
				.iter()
				.map(|path| UploadFile::from_path(path))
				.collect::<Result<Vec<_>, _>>()?;
			let report = client.upload_files(&files).await;

			render::upload_report(&report, output)?;

			if !report.is_complete() {
				return Err(eyre::eyre!("{} of {} uploads failed.", report.failed.len(), files.len()));
			}
		},
		Command::MoodTrend => render::mood_trend(&client.mood_trend().await?, output)?,
		Command::Summary => render::summary(&client.records_summary().await?, output)?,
		Command::Analysis => render::analysis(&client.mental_state_analysis().await?, output)?,
		Command::TriggerAnalysis => client.trigger_analysis().await?,
	}

	Ok(())
}

fn init_tracing(config: &fantasy_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	Ok(())
}

/// Loads a page, aborting on Ctrl-C. `false` when nothing was committed.
async fn load(pager: &RecordsPager, page: u32) -> color_eyre::Result<bool> {
	let signal = pager.signal();
	let interrupt = tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			signal.abort();
		}
	});
	let commit = pager.load_page(page).await;

	interrupt.abort();

	match commit? {
		Commit::Applied => Ok(true),
		outcome => {
			tracing::warn!(?outcome, "Listing was not applied.");

			Ok(false)
		},
	}
}

/// Checks the draft before any upload so a rejected draft leaves no orphaned files.
async fn create(
	client: &ApiClient,
	mut draft: RecordDraft,
	attachments: &[PathBuf],
) -> color_eyre::Result<Record> {
	validate_draft(&draft).map_err(|errors| fantasy_client::Error::Validation { errors })?;

	draft.attachments = upload_all(client, attachments).await?;

	Ok(client.create_record(&draft).await?)
}

/// Attachment ids of the uploaded files. Any failure aborts before the record is created.
async fn upload_all(client: &ApiClient, paths: &[PathBuf]) -> color_eyre::Result<Vec<String>> {
	if paths.is_empty() {
		return Ok(Vec::new());
	}

	let files =
		paths.iter().map(|path| UploadFile::from_path(path)).collect::<Result<Vec<_>, _>>()?;
	let report = client.upload_files(&files).await;

	if let Some(failure) = report.failed.first() {
		return Err(eyre::eyre!("Upload of {} failed: {}", failure.file_name, failure.reason));
	}

	Ok(report.uploaded.into_iter().map(|attachment| attachment.id).collect())
}

fn mood_label(raw: &str) -> color_eyre::Result<String> {
	Ok(raw.parse::<Mood>()?.label().to_string())
}

#[cfg(test)]
mod tests {
	use std::{
		env, fs,
		sync::atomic::{AtomicU64, Ordering},
		time::{SystemTime, UNIX_EPOCH},
	};

	use fantasy_client::{Error, MemoryNotifier};
	use fantasy_testkit::{MockApi, MockOptions, TEST_TOKEN};

	use super::*;

	fn attachment_file(name: &str) -> PathBuf {
		static COUNTER: AtomicU64 = AtomicU64::new(0);

		let nanos = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.expect("System time must be valid.")
			.as_nanos();
		let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
		let dir = env::temp_dir()
			.join(format!("fantasy_cli_test_{nanos}_{}_{ordinal}", std::process::id()));

		fs::create_dir_all(&dir).expect("Failed to create temp dir.");

		let path = dir.join(name);

		fs::write(&path, [0x89, b'P', b'N', b'G']).expect("Failed to write attachment.");

		path
	}

	fn signed_in(api: &MockApi) -> ApiClient {
		let cfg = fantasy_config::parse(&format!("[api]\nbase_url = \"{}\"\n", api.base_url()))
			.expect("Test config must parse.");
		let session = Session::in_memory(7);

		session.set_token(TEST_TOKEN).expect("Failed to set token.");

		ApiClient::new(&cfg, session, Arc::new(MemoryNotifier::default()))
			.expect("Failed to build client.")
	}

	fn draft(content: &str) -> RecordDraft {
		RecordDraft {
			title: "Harbor".to_string(),
			content: content.to_string(),
			mood: mood_label("pensive").expect("mood"),
			..RecordDraft::default()
		}
	}

	#[tokio::test]
	async fn invalid_draft_uploads_nothing() {
		let api = MockApi::start(MockOptions::default()).await.expect("Failed to start mock API.");
		let client = signed_in(&api);
		let path = attachment_file("pic.png");
		let err = create(&client, draft(""), std::slice::from_ref(&path))
			.await
			.expect_err("Expected validation to fail.");

		assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Validation { .. })), "{err:?}");
		assert!(api.uploaded_files().is_empty());
		assert!(api.requests().is_empty());

		if let Some(dir) = path.parent() {
			let _ = fs::remove_dir_all(dir);
		}
	}

	#[tokio::test]
	async fn valid_draft_uploads_then_attaches() {
		let api = MockApi::start(MockOptions::default()).await.expect("Failed to start mock API.");
		let client = signed_in(&api);
		let path = attachment_file("pic.png");
		let record = create(&client, draft("Gulls over the pier."), std::slice::from_ref(&path))
			.await
			.expect("create");

		assert_eq!(api.uploaded_files(), vec!["pic.png"]);
		assert_eq!(record.attachments.len(), 1);

		if let Some(dir) = path.parent() {
			let _ = fs::remove_dir_all(dir);
		}
	}

	#[test]
	fn parses_list_flags() {
		let args = Args::try_parse_from([
			"fantasy", "-c", "fantasy.toml", "list", "--search", "city", "--tag", "all", "--sort",
			"title",
		])
		.expect("Args must parse.");

		match args.command {
			Command::List { page, sort, tag, .. } => {
				assert_eq!(page, 1);
				assert_eq!(sort, SortKey::Title);
				assert_eq!(tag.as_deref().map(TagFilter::from), Some(TagFilter::All));
			},
			other => panic!("Unexpected command {other:?}"),
		}
	}

	#[test]
	fn rejects_unknown_sort_key() {
		assert!(
			Args::try_parse_from(["fantasy", "-c", "f.toml", "list", "--sort", "priority"]).is_err()
		);
	}

	#[test]
	fn mood_accepts_label_or_english_name() {
		assert_eq!(mood_label("pensive").expect("alias"), "沉思");
		assert_eq!(mood_label("兴奋").expect("label"), "兴奋");
		assert!(mood_label("bored").is_err());
	}
}
