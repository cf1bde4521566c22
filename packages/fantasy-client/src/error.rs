use fantasy_domain::{FieldError, FileRejection};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Request to {endpoint} could not be completed.")]
	Transport { endpoint: String, source: reqwest::Error },
	#[error("Request failed with status {status}: {body}")]
	RequestFailed { status: u16, body: String },
	#[error("{message}")]
	Rejected { message: String },
	#[error("Invalid response: {message}")]
	InvalidResponse { message: String },
	#[error("Invalid base URL {url}: {message}")]
	InvalidBaseUrl { url: String, message: String },
	#[error("Validation failed: {}", join_field_errors(.errors))]
	Validation { errors: Vec<FieldError> },
	#[error(transparent)]
	FileRejected(#[from] FileRejection),
	#[error("Failed to access session file at {path:?}.")]
	SessionFile { path: std::path::PathBuf, source: std::io::Error },
	#[error("Failed to read {path:?}.")]
	ReadFile { path: std::path::PathBuf, source: std::io::Error },
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
}
impl Error {
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::RequestFailed { status, .. } => Some(*status),
			_ => None,
		}
	}

	pub fn is_unauthorized(&self) -> bool {
		self.status() == Some(401)
	}

	/// Failures that reached or tried to reach the server, as opposed to local checks.
	pub fn is_remote(&self) -> bool {
		matches!(
			self,
			Self::Transport { .. }
				| Self::RequestFailed { .. }
				| Self::Rejected { .. }
				| Self::InvalidResponse { .. }
		)
	}
}

fn join_field_errors(errors: &[FieldError]) -> String {
	errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}
