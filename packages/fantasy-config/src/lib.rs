mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Api, Config, DEFAULT_MAX_FILE_BYTES, DEFAULT_PAGE_SIZE, DEFAULT_SESSION_TTL_DAYS,
	MAX_PAGE_SIZE, Service, Session, Upload,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } =>
			Error::ParseConfig { path: path.to_path_buf(), source },
		other => other,
	})
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}

	let base_url = cfg.api.base_url.as_str();

	if base_url.is_empty() {
		return Err(Error::Validation { message: "api.base_url must be non-empty.".to_string() });
	}
	if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
		return Err(Error::Validation {
			message: "api.base_url must start with http:// or https://.".to_string(),
		});
	}
	if cfg.api.page_size == 0 {
		return Err(Error::Validation {
			message: "api.page_size must be greater than zero.".to_string(),
		});
	}
	if cfg.api.page_size > MAX_PAGE_SIZE {
		return Err(Error::Validation {
			message: format!("api.page_size must be {MAX_PAGE_SIZE} or less."),
		});
	}
	if !(1..=DEFAULT_SESSION_TTL_DAYS).contains(&cfg.session.ttl_days) {
		return Err(Error::Validation {
			message: format!("session.ttl_days must be in the range 1-{DEFAULT_SESSION_TTL_DAYS}."),
		});
	}
	if cfg.upload.max_file_bytes == 0 {
		return Err(Error::Validation {
			message: "upload.max_file_bytes must be greater than zero.".to_string(),
		});
	}
	if cfg.upload.allowed_types.is_empty() {
		return Err(Error::Validation {
			message: "upload.allowed_types must be non-empty.".to_string(),
		});
	}

	for mime in &cfg.upload.allowed_types {
		if mime.trim().is_empty() || !mime.contains('/') {
			return Err(Error::Validation {
				message: format!("upload.allowed_types entry {mime:?} is not a MIME type."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let trimmed = cfg.api.base_url.trim().trim_end_matches('/').to_string();

	cfg.api.base_url = trimmed;

	if cfg
		.session
		.token_file
		.as_deref()
		.map(|path| path.as_os_str().to_string_lossy().trim().is_empty())
		.unwrap_or(false)
	{
		cfg.session.token_file = None;
	}

	for mime in cfg.upload.allowed_types.iter_mut() {
		*mime = mime.trim().to_ascii_lowercase();
	}
}
