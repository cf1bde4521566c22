use std::{env, path::PathBuf};

use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 50;
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub service: Service,
	pub api: Api,
	#[serde(default)]
	pub session: Session,
	#[serde(default)]
	pub upload: Upload,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}
impl Default for Service {
	fn default() -> Self {
		Self { log_level: default_log_level() }
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct Api {
	pub base_url: String,
	/// Zero keeps the transport default.
	#[serde(default)]
	pub timeout_ms: u64,
	#[serde(default = "default_page_size")]
	pub page_size: u32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Session {
	/// Where the bearer token is persisted between runs. Falls back to
	/// `$HOME/.fantasy/session.json`, or the temp directory without a home.
	pub token_file: Option<PathBuf>,
	pub ttl_days: i64,
}
impl Session {
	pub fn token_path(&self) -> PathBuf {
		if let Some(path) = self.token_file.as_ref() {
			return path.clone();
		}

		let base = env::var_os("HOME").map(PathBuf::from).unwrap_or_else(env::temp_dir);

		base.join(".fantasy").join("session.json")
	}
}
impl Default for Session {
	fn default() -> Self {
		Self { token_file: None, ttl_days: DEFAULT_SESSION_TTL_DAYS }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Upload {
	pub max_file_bytes: u64,
	pub allowed_types: Vec<String>,
}
impl Upload {
	pub fn allows_type(&self, mime: &str) -> bool {
		self.allowed_types.iter().any(|allowed| allowed.eq_ignore_ascii_case(mime))
	}
}
impl Default for Upload {
	fn default() -> Self {
		Self {
			max_file_bytes: DEFAULT_MAX_FILE_BYTES,
			allowed_types: [
				"image/jpeg",
				"image/png",
				"image/gif",
				"image/webp",
				"application/pdf",
				"text/plain",
				"application/msword",
				"application/vnd.openxmlformats-officedocument.wordprocessingml.document",
			]
			.into_iter()
			.map(str::to_string)
			.collect(),
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_page_size() -> u32 {
	DEFAULT_PAGE_SIZE
}
