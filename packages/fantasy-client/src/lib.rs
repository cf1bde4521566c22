//! Data access for the Fantasy Record REST API.
//!
//! Every operation issues exactly one request (batch upload issues one per file), attaches the
//! session's bearer token when there is one, and reports remote failures to the injected
//! [`Notifier`] before returning them. There are no retries and no caches.

pub mod abort;
pub mod notify;
pub mod pager;
pub mod sequence;
pub mod session;
pub mod upload;

mod analytics;
mod auth;
mod error;
mod records;

pub use abort::AbortSignal;
pub use auth::{LoginRequest, RegisterRequest};
pub use error::{Error, Result};
pub use notify::{LogNotifier, MemoryNotifier, Notice, NoticeLevel, Notifier};
pub use pager::{Commit, PagerState, RecordSource, RecordsPager};
pub use sequence::{Sequencer, Ticket};
pub use session::{Session, SessionToken};
pub use upload::{UploadFailure, UploadFile, UploadReport};

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use reqwest::{
	Client, RequestBuilder, Url,
	header::{AUTHORIZATION, HeaderMap},
};
use serde_json::Value;

use fantasy_domain::FieldError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub struct ApiClient {
	http: Client,
	base_url: Url,
	page_size: u32,
	upload: fantasy_config::Upload,
	session: Session,
	notifier: Arc<dyn Notifier>,
}
impl ApiClient {
	pub fn new(
		cfg: &fantasy_config::Config,
		session: Session,
		notifier: Arc<dyn Notifier>,
	) -> Result<Self> {
		let mut builder = Client::builder();

		if cfg.api.timeout_ms > 0 {
			builder = builder.timeout(Duration::from_millis(cfg.api.timeout_ms));
		}

		let base_url = Url::parse(cfg.api.base_url.trim_end_matches('/')).map_err(|err| {
			Error::InvalidBaseUrl { url: cfg.api.base_url.clone(), message: err.to_string() }
		})?;

		Ok(Self {
			http: builder.build()?,
			base_url,
			page_size: cfg.api.page_size,
			upload: cfg.upload.clone(),
			session,
			notifier,
		})
	}

	pub fn session(&self) -> &Session {
		&self.session
	}

	pub fn page_size(&self) -> u32 {
		self.page_size
	}

	pub fn upload_rules(&self) -> &fantasy_config::Upload {
		&self.upload
	}

	pub(crate) fn get(&self, path: &str) -> RequestBuilder {
		self.http.get(self.url(path))
	}

	pub(crate) fn post(&self, path: &str) -> RequestBuilder {
		self.http.post(self.url(path))
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
	}

	/// `/records/{id}` with the id percent-encoded as one path segment.
	pub(crate) fn record_url(&self, id: &str) -> Result<Url> {
		let mut url = self.base_url.clone();

		url.path_segments_mut()
			.map_err(|()| Error::InvalidBaseUrl {
				url: self.base_url.to_string(),
				message: "URL cannot carry a path.".to_string(),
			})?
			.pop_if_empty()
			.push("records")
			.push(id);

		Ok(url)
	}

	/// Sends one request and returns the parsed JSON body of a 2xx response.
	pub(crate) async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Value> {
		let token = self.session.token();
		let request = request.headers(auth_headers(token.as_deref())?);

		tracing::debug!(endpoint, authenticated = token.is_some(), "Sending request.");

		let res = request
			.send()
			.await
			.map_err(|source| Error::Transport { endpoint: endpoint.to_string(), source })?;
		let status = res.status();

		if !status.is_success() {
			let body = res.text().await.unwrap_or_else(|err| {
				tracing::debug!(endpoint, error = %err, "Failed to read error response body.");

				String::new()
			});

			tracing::debug!(endpoint, status = status.as_u16(), "Request rejected by server.");

			return Err(Error::RequestFailed { status: status.as_u16(), body });
		}

		let bytes = res
			.bytes()
			.await
			.map_err(|source| Error::Transport { endpoint: endpoint.to_string(), source })?;

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(Value::Null);
		}

		serde_json::from_slice(&bytes).map_err(|err| Error::InvalidResponse {
			message: format!("{endpoint} returned a body that is not JSON: {err}"),
		})
	}

	/// Surfaces remote failures to the user, then hands the result back unchanged.
	pub(crate) fn report<T>(&self, action: &str, result: Result<T>) -> Result<T> {
		if let Err(err) = &result
			&& err.is_remote()
		{
			tracing::error!(action, error = %err, "Request failed.");

			self.notifier.notify(Notice::error(format!("{action} failed: {err}")));
		}

		result
	}

	pub(crate) fn notify(&self, notice: Notice) {
		self.notifier.notify(notice);
	}
}

pub fn auth_headers(token: Option<&str>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	if let Some(token) = token.map(str::trim).filter(|token| !token.is_empty()) {
		headers.insert(AUTHORIZATION, format!("Bearer {token}").parse()?);
	}

	Ok(headers)
}

/// Fails when the envelope says `success: false`. A missing flag is tolerated.
pub(crate) fn ensure_success(json: &Value) -> Result<()> {
	match json.get("success").and_then(Value::as_bool) {
		Some(false) => {
			let message = json
				.get("message")
				.or_else(|| json.get("error"))
				.and_then(Value::as_str)
				.unwrap_or("The server reported a failure.")
				.to_string();

			Err(Error::Rejected { message })
		},
		Some(true) => Ok(()),
		None => {
			if !json.is_null() {
				tracing::warn!("Response envelope has no success flag.");
			}

			Ok(())
		},
	}
}

/// `data` of a `{success, data}` envelope.
pub(crate) fn envelope_data<'a>(json: &'a Value, what: &str) -> Result<&'a Value> {
	json.get("data").filter(|data| !data.is_null()).ok_or_else(|| Error::InvalidResponse {
		message: format!("{what} payload is missing data."),
	})
}

/// Ids are opaque; only a blank id is refused.
pub(crate) fn path_id(id: &str) -> Result<&str> {
	let id = id.trim();

	if id.is_empty() {
		return Err(Error::Validation {
			errors: vec![FieldError { field: "id", message: "Id must not be empty." }],
		});
	}

	Ok(id)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builds_bearer_header_only_with_token() {
		let headers = auth_headers(Some("secret")).expect("Failed to build headers.");

		assert_eq!(headers.get(AUTHORIZATION).expect("Missing authorization header."), "Bearer secret");
		assert!(auth_headers(None).expect("headers").is_empty());
		assert!(auth_headers(Some("  ")).expect("headers").is_empty());
	}

	#[test]
	fn success_flag_rules() {
		assert!(ensure_success(&serde_json::json!({ "success": true })).is_ok());
		assert!(ensure_success(&serde_json::json!({ "data": [] })).is_ok());

		let err = ensure_success(&serde_json::json!({ "success": false, "message": "Nope" }))
			.expect_err("Expected rejection.");

		assert_eq!(err.to_string(), "Nope");
	}

	#[test]
	fn only_blank_path_ids_are_rejected() {
		assert_eq!(path_id(" abc ").expect("valid id"), "abc");
		assert_eq!(path_id("a/b?c").expect("opaque id"), "a/b?c");
		assert!(path_id("  ").is_err());
	}

	#[test]
	fn record_urls_encode_the_id_as_one_segment() {
		let cfg = fantasy_config::parse("[api]\nbase_url = \"http://localhost:9/api/\"\n")
			.expect("Test config must parse.");
		let client = ApiClient::new(&cfg, Session::in_memory(7), Arc::new(MemoryNotifier::default()))
			.expect("Failed to build client.");

		assert_eq!(
			client.record_url("a/b?c#d%e").expect("url").as_str(),
			"http://localhost:9/api/records/a%2Fb%3Fc%23d%25e"
		);
		assert_eq!(client.url("/records"), "http://localhost:9/api/records");
	}
}
