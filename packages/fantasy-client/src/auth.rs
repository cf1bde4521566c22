use serde::Serialize;
use serde_json::Value;

use fantasy_domain::{FieldError, User, normalize};

use crate::{ApiClient, Error, Notice, Result, ensure_success, envelope_data};

#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest {
	pub email: String,
	pub password: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct RegisterRequest {
	pub username: String,
	pub email: String,
	pub password: String,
}

impl ApiClient {
	/// Signs in and stores the returned token in the session.
	pub async fn login(&self, email: &str, password: &str) -> Result<User> {
		let mut errors = Vec::new();

		require(&mut errors, "email", email, "Email must not be empty.");
		require(&mut errors, "password", password, "Password must not be empty.");

		if !errors.is_empty() {
			return Err(Error::Validation { errors });
		}

		let body = LoginRequest { email: email.trim().to_string(), password: password.to_string() };
		let result: Result<_> = async {
			let json = self.send("POST /auth/login", self.post("/auth/login").json(&body)).await?;

			self.accept_credentials(&json, "Login")
		}
		.await;
		let user = self.report("Signing in", result)?;

		self.notify(Notice::success(format!("Signed in as {}.", user.username)));

		Ok(user)
	}

	pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
		let mut errors = Vec::new();

		require(&mut errors, "username", username, "Username must not be empty.");
		require(&mut errors, "email", email, "Email must not be empty.");
		require(&mut errors, "password", password, "Password must not be empty.");

		if !errors.is_empty() {
			return Err(Error::Validation { errors });
		}

		let body = RegisterRequest {
			username: username.trim().to_string(),
			email: email.trim().to_string(),
			password: password.to_string(),
		};
		let result: Result<_> = async {
			let json =
				self.send("POST /auth/register", self.post("/auth/register").json(&body)).await?;

			self.accept_credentials(&json, "Registration")
		}
		.await;
		let user = self.report("Registering", result)?;

		self.notify(Notice::success(format!("Welcome, {}.", user.username)));

		Ok(user)
	}

	/// `/auth/me`, falling back to `/auth/profile` on servers that only expose the latter.
	pub async fn current_user(&self) -> Result<User> {
		let result: Result<_> = async {
			let json = match self.send("GET /auth/me", self.get("/auth/me")).await {
				Err(err) if err.status() == Some(404) => {
					tracing::debug!("GET /auth/me is not available; trying /auth/profile.");

					self.send("GET /auth/profile", self.get("/auth/profile")).await?
				},
				other => other?,
			};

			ensure_success(&json)?;

			normalize::normalize_user(envelope_data(&json, "User")?).ok_or_else(|| {
				Error::InvalidResponse { message: "User payload is missing required fields.".to_string() }
			})
		}
		.await;

		self.report("Loading the profile", result)
	}

	/// The local session is cleared even when the server call fails.
	pub async fn logout(&self) -> Result<()> {
		if let Err(err) = self.send("POST /auth/logout", self.post("/auth/logout")).await {
			tracing::warn!(error = %err, "Server-side logout failed; clearing the local session anyway.");
		}

		self.session().clear()?;
		self.notify(Notice::success("Signed out."));

		Ok(())
	}

	fn accept_credentials(&self, json: &Value, what: &str) -> Result<User> {
		ensure_success(json)?;

		let data = json.get("data");
		let token = json
			.get("token")
			.or_else(|| data.and_then(|data| data.get("token")))
			.and_then(Value::as_str)
			.filter(|token| !token.trim().is_empty())
			.ok_or_else(|| Error::InvalidResponse {
				message: format!("{what} response is missing a token."),
			})?;
		let user = json
			.get("user")
			.or_else(|| data.and_then(|data| data.get("user")))
			.and_then(normalize::normalize_user)
			.ok_or_else(|| Error::InvalidResponse {
				message: format!("{what} response is missing the user."),
			})?;

		self.session().set_token(token)?;

		tracing::info!(user_id = %user.id, "Session established.");

		Ok(user)
	}
}

fn require(errors: &mut Vec<FieldError>, field: &'static str, value: &str, message: &'static str) {
	if value.trim().is_empty() {
		errors.push(FieldError { field, message });
	}
}
