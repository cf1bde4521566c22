//! The one place that knows the bearer token.
//!
//! A [`Session`] is created once and handed to the client. It persists the token to a JSON file
//! and broadcasts every change to subscribers, so nothing else reads or parses stored tokens.

use std::{
	fs, io,
	path::{Path, PathBuf},
	sync::Arc,
};

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tokio::sync::watch;

use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
	pub token: String,
	#[serde(with = "fantasy_domain::time_serde")]
	pub expires_at: OffsetDateTime,
}
impl SessionToken {
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		now >= self.expires_at
	}
}

#[derive(Clone, Debug)]
pub struct Session {
	inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
	path: Option<PathBuf>,
	ttl: Duration,
	tx: watch::Sender<Option<SessionToken>>,
}

impl Session {
	/// A session that lives only as long as the process.
	pub fn in_memory(ttl_days: i64) -> Self {
		Self::with_state(None, ttl_days, None)
	}

	/// Restores the session persisted at the configured token file. Expired or unreadable tokens
	/// start the session signed out.
	pub fn load(cfg: &fantasy_config::Session) -> Result<Self> {
		let path = cfg.token_path();
		let stored = read_token_file(&path)?
			.filter(|token| !token.is_expired_at(OffsetDateTime::now_utc()));

		Ok(Self::with_state(Some(path), cfg.ttl_days, stored))
	}

	fn with_state(path: Option<PathBuf>, ttl_days: i64, token: Option<SessionToken>) -> Self {
		let (tx, _rx) = watch::channel(token);

		Self { inner: Arc::new(SessionInner { path, ttl: Duration::days(ttl_days), tx }) }
	}

	/// Current, unexpired bearer token.
	pub fn token(&self) -> Option<String> {
		let now = OffsetDateTime::now_utc();

		self.inner
			.tx
			.borrow()
			.as_ref()
			.filter(|token| !token.is_expired_at(now))
			.map(|token| token.token.clone())
	}

	pub fn current(&self) -> Option<SessionToken> {
		self.inner.tx.borrow().clone()
	}

	pub fn is_authenticated(&self) -> bool {
		self.token().is_some()
	}

	pub fn set_token(&self, token: impl Into<String>) -> Result<()> {
		let token = SessionToken {
			token: token.into(),
			expires_at: OffsetDateTime::now_utc() + self.inner.ttl,
		};

		if let Some(path) = self.inner.path.as_deref() {
			write_token_file(path, &token)?;
		}

		self.inner.tx.send_replace(Some(token));

		tracing::info!("Session token updated.");

		Ok(())
	}

	pub fn clear(&self) -> Result<()> {
		if let Some(path) = self.inner.path.as_deref() {
			match fs::remove_file(path) {
				Ok(()) => {},
				Err(err) if err.kind() == io::ErrorKind::NotFound => {},
				Err(err) => return Err(Error::SessionFile { path: path.to_path_buf(), source: err }),
			}
		}

		self.inner.tx.send_replace(None);

		tracing::info!("Session cleared.");

		Ok(())
	}

	/// Receives every token change from now on.
	pub fn subscribe(&self) -> watch::Receiver<Option<SessionToken>> {
		self.inner.tx.subscribe()
	}
}

fn read_token_file(path: &Path) -> Result<Option<SessionToken>> {
	let raw = match fs::read_to_string(path) {
		Ok(raw) => raw,
		Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
		Err(err) => return Err(Error::SessionFile { path: path.to_path_buf(), source: err }),
	};

	match serde_json::from_str(&raw) {
		Ok(token) => Ok(Some(token)),
		Err(err) => {
			tracing::warn!(path = %path.display(), error = %err, "Ignoring unreadable session file.");

			Ok(None)
		},
	}
}

fn write_token_file(path: &Path, token: &SessionToken) -> Result<()> {
	let to_io = |err| Error::SessionFile { path: path.to_path_buf(), source: err };

	if let Some(parent) = path.parent()
		&& !parent.as_os_str().is_empty()
	{
		fs::create_dir_all(parent).map_err(to_io)?;
	}

	let payload = serde_json::to_vec_pretty(token)?;

	fs::write(path, payload).map_err(to_io)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn expired_tokens_are_not_offered() {
		let session = Session::in_memory(7);

		session.inner.tx.send_replace(Some(SessionToken {
			token: "old".to_string(),
			expires_at: OffsetDateTime::now_utc() - Duration::minutes(1),
		}));

		assert!(session.current().is_some());
		assert_eq!(session.token(), None);
		assert!(!session.is_authenticated());
	}

	#[test]
	fn subscribers_see_changes() {
		let session = Session::in_memory(1);
		let mut rx = session.subscribe();

		session.set_token("abc").expect("set_token failed");

		assert!(rx.has_changed().expect("sender alive"));
		assert_eq!(rx.borrow_and_update().as_ref().map(|token| token.token.as_str()), Some("abc"));

		session.clear().expect("clear failed");

		assert!(rx.borrow_and_update().is_none());
	}
}
