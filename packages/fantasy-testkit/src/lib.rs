//! In-process stand-in for the Fantasy Record REST API, for integration tests.

mod error;

pub use error::{Error, Result};

use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
};

use axum::{
	Json, Router,
	extract::{DefaultBodyLimit, Multipart, Path, Query, RawQuery, State},
	http::{HeaderMap, StatusCode, header::AUTHORIZATION},
	response::{IntoResponse, Response},
	routing,
};
use serde_json::{Map, Value, json};
use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339, macros::datetime};
use tokio::{net::TcpListener, sync::oneshot};
use uuid::Uuid;

pub const TEST_TOKEN: &str = "fantasy-test-token";
pub const TEST_PASSWORD: &str = "correct horse";
pub const TEST_USERNAME: &str = "dreamer";

/// Envelope the list endpoint answers with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListShape {
	/// `{success, data: {records, pagination}}`
	#[default]
	Nested,
	/// `{success, records, pagination}`
	Flattened,
	/// `{success, data: [...], pagination: {page, total, totalPages}}`
	DataArray,
	/// `{success, items: [...]}`
	Unknown,
}

#[derive(Clone, Debug, Default)]
pub struct MockOptions {
	pub list_shape: ListShape,
	/// Store tags as a JSON-encoded string instead of an array.
	pub tags_as_string: bool,
	/// Answer uploads above this size with 413.
	pub max_upload_bytes: Option<usize>,
	/// Serve only `/auth/profile`; `/auth/me` is a 404.
	pub profile_only: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
	pub endpoint: String,
	pub query: Option<String>,
	pub authorization: Option<String>,
}

pub struct MockApi {
	base_url: String,
	state: Arc<MockState>,
	shutdown: Option<oneshot::Sender<()>>,
}
impl MockApi {
	pub async fn start(options: MockOptions) -> Result<Self> {
		let state = Arc::new(MockState::new(options));
		let app = router(state.clone());
		let listener = TcpListener::bind("127.0.0.1:0").await?;
		let addr = listener.local_addr()?;
		let (tx, rx) = oneshot::channel();
		let server = axum::serve(listener, app).with_graceful_shutdown(async move {
			let _ = rx.await;
		});

		tokio::spawn(async move {
			if let Err(err) = server.await {
				eprintln!("Mock API server failed: {err}.");
			}
		});

		Ok(Self { base_url: format!("http://{addr}"), state, shutdown: Some(tx) })
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	/// Stores a record payload verbatim, bypassing the create endpoint.
	pub fn seed_raw_record(&self, raw: Value) {
		self.state.lock().records.push(raw);
	}

	pub fn stored_records(&self) -> Vec<Value> {
		self.state.lock().records.clone()
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.state.lock().requests.clone()
	}

	pub fn requests_to(&self, endpoint: &str) -> usize {
		self.state.lock().requests.iter().filter(|request| request.endpoint == endpoint).count()
	}

	pub fn last_query(&self, endpoint: &str) -> Option<String> {
		self.state
			.lock()
			.requests
			.iter()
			.rev()
			.find(|request| request.endpoint == endpoint)
			.and_then(|request| request.query.clone())
	}

	pub fn uploaded_files(&self) -> Vec<String> {
		self.state.lock().uploads.clone()
	}
}
impl Drop for MockApi {
	fn drop(&mut self) {
		if let Some(tx) = self.shutdown.take() {
			let _ = tx.send(());
		}
	}
}

struct MockState {
	options: MockOptions,
	inner: Mutex<Inner>,
}
impl MockState {
	fn new(options: MockOptions) -> Self {
		Self { options, inner: Mutex::new(Inner::default()) }
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
		self.inner.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn log(&self, endpoint: &str, query: Option<String>, headers: &HeaderMap) -> Option<String> {
		let authorization =
			headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()).map(str::to_string);

		self.lock().requests.push(RecordedRequest {
			endpoint: endpoint.to_string(),
			query,
			authorization: authorization.clone(),
		});

		authorization
	}

	fn authorize(&self, endpoint: &str, headers: &HeaderMap) -> Result<(), Response> {
		self.authorize_query(endpoint, None, headers)
	}

	fn authorize_query(
		&self,
		endpoint: &str,
		query: Option<String>,
		headers: &HeaderMap,
	) -> Result<(), Response> {
		let expected = format!("Bearer {TEST_TOKEN}");

		match self.log(endpoint, query, headers) {
			Some(value) if value == expected => Ok(()),
			_ => Err(failure(StatusCode::UNAUTHORIZED, "Unauthorized")),
		}
	}

	fn encode_tags(&self, tags: Value) -> Value {
		if self.options.tags_as_string && tags.is_array() {
			Value::String(tags.to_string())
		} else {
			tags
		}
	}
}

#[derive(Default)]
struct Inner {
	records: Vec<Value>,
	next_id: i64,
	requests: Vec<RecordedRequest>,
	uploads: Vec<String>,
	analyses: usize,
}

type Shared = State<Arc<MockState>>;

fn router(state: Arc<MockState>) -> Router {
	let mut router = Router::new()
		.route("/auth/login", routing::post(login))
		.route("/auth/register", routing::post(register))
		.route("/auth/logout", routing::post(logout))
		.route("/auth/profile", routing::get(profile))
		.route("/records", routing::get(list_records).post(create_record))
		.route("/records/{id}", routing::get(get_record).put(update_record).delete(delete_record))
		.route("/attachments/upload", routing::post(upload))
		.route("/analytics/mood-trend", routing::get(mood_trend))
		.route("/analytics/records-summary", routing::get(records_summary))
		.route("/ai/mental-state-analysis", routing::get(mental_state))
		.route("/ai/trigger-analysis", routing::post(trigger_analysis));

	if !state.options.profile_only {
		router = router.route("/auth/me", routing::get(profile));
	}

	router.layer(DefaultBodyLimit::disable()).with_state(state)
}

fn failure(status: StatusCode, message: &str) -> Response {
	(status, Json(json!({ "success": false, "message": message }))).into_response()
}

fn test_user(email: &str, username: &str) -> Value {
	json!({ "id": 1, "username": username, "email": email, "createdAt": "2025-01-01T00:00:00Z" })
}

fn id_matches(record: &Value, id: &str) -> bool {
	match record.get("id") {
		Some(Value::String(raw)) => raw == id,
		Some(Value::Number(raw)) => raw.to_string() == id,
		_ => false,
	}
}

async fn login(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
	state.log("POST /auth/login", None, &headers);

	let email = body.get("email").and_then(Value::as_str).unwrap_or_default();

	if body.get("password").and_then(Value::as_str) != Some(TEST_PASSWORD) {
		return failure(StatusCode::UNAUTHORIZED, "Invalid email or password");
	}

	Json(json!({ "success": true, "token": TEST_TOKEN, "user": test_user(email, TEST_USERNAME) }))
		.into_response()
}

async fn register(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
	state.log("POST /auth/register", None, &headers);

	let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
	let username = body.get("username").and_then(Value::as_str).unwrap_or(TEST_USERNAME);

	// Registration nests the credentials under `data`.
	Json(json!({
		"success": true,
		"data": { "token": TEST_TOKEN, "user": test_user(email, username) }
	}))
	.into_response()
}

async fn logout(State(state): Shared, headers: HeaderMap) -> Response {
	if let Err(denied) = state.authorize("POST /auth/logout", &headers) {
		return denied;
	}

	Json(json!({ "success": true })).into_response()
}

async fn profile(State(state): Shared, headers: HeaderMap) -> Response {
	if let Err(denied) = state.authorize("GET /auth/profile", &headers) {
		return denied;
	}

	Json(json!({ "success": true, "data": test_user("dreamer@example.com", TEST_USERNAME) }))
		.into_response()
}

async fn list_records(
	State(state): Shared,
	headers: HeaderMap,
	RawQuery(raw_query): RawQuery,
	Query(params): Query<HashMap<String, String>>,
) -> Response {
	if let Err(denied) = state.authorize_query("GET /records", raw_query, &headers) {
		return denied;
	}

	let page = params.get("page").and_then(|raw| raw.parse::<usize>().ok()).unwrap_or(1).max(1);
	let limit = params.get("limit").and_then(|raw| raw.parse::<usize>().ok()).unwrap_or(10).max(1);
	let records = state.lock().records.clone();
	let total = records.len();
	let total_pages = total.div_ceil(limit).max(1);
	let slice: Vec<Value> = records.into_iter().skip((page - 1) * limit).take(limit).collect();
	let pagination = json!({ "currentPage": page, "totalPages": total_pages, "totalRecords": total });
	let body = match state.options.list_shape {
		ListShape::Nested =>
			json!({ "success": true, "data": { "records": slice, "pagination": pagination } }),
		ListShape::Flattened => json!({ "success": true, "records": slice, "pagination": pagination }),
		ListShape::DataArray => json!({
			"success": true,
			"data": slice,
			"pagination": { "page": page, "total": total, "totalPages": total_pages }
		}),
		ListShape::Unknown => json!({ "success": true, "items": slice }),
	};

	Json(body).into_response()
}

async fn get_record(State(state): Shared, headers: HeaderMap, Path(id): Path<String>) -> Response {
	if let Err(denied) = state.authorize("GET /records/{id}", &headers) {
		return denied;
	}

	match state.lock().records.iter().find(|record| id_matches(record, &id)) {
		Some(record) => Json(json!({ "success": true, "data": record })).into_response(),
		None => failure(StatusCode::NOT_FOUND, "Record not found"),
	}
}

async fn create_record(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
	if let Err(denied) = state.authorize("POST /records", &headers) {
		return denied;
	}

	let Some(fields) = body.as_object() else {
		return failure(StatusCode::BAD_REQUEST, "Body must be an object");
	};
	let mut inner = state.lock();

	inner.next_id += 1;

	let id = inner.next_id;
	let created_at = (datetime!(2025-01-01 0:00 UTC) + Duration::hours(id))
		.format(&Rfc3339)
		.unwrap_or_default();
	let mut record = Map::new();

	record.insert("id".to_string(), json!(id));

	for key in ["title", "content", "mood", "attachments", "categoryId"] {
		if let Some(value) = fields.get(key) {
			record.insert(key.to_string(), value.clone());
		}
	}

	record.insert(
		"tags".to_string(),
		state.encode_tags(fields.get("tags").cloned().unwrap_or_else(|| json!([]))),
	);
	record.insert("userId".to_string(), json!(1));
	record.insert("createdAt".to_string(), Value::String(created_at.clone()));
	record.insert("updatedAt".to_string(), Value::String(created_at));

	let record = Value::Object(record);

	inner.records.push(record.clone());

	(StatusCode::CREATED, Json(json!({ "success": true, "data": record }))).into_response()
}

async fn update_record(
	State(state): Shared,
	headers: HeaderMap,
	Path(id): Path<String>,
	Json(body): Json<Value>,
) -> Response {
	if let Err(denied) = state.authorize("PUT /records/{id}", &headers) {
		return denied;
	}

	let Some(fields) = body.as_object() else {
		return failure(StatusCode::BAD_REQUEST, "Body must be an object");
	};
	let mut inner = state.lock();
	let Some(record) = inner.records.iter_mut().find(|record| id_matches(record, &id)) else {
		return failure(StatusCode::NOT_FOUND, "Record not found");
	};

	if let Some(stored) = record.as_object_mut() {
		for (key, value) in fields {
			let value =
				if key == "tags" { state.encode_tags(value.clone()) } else { value.clone() };

			stored.insert(key.clone(), value);
		}
	}

	Json(json!({ "success": true, "data": record })).into_response()
}

async fn delete_record(State(state): Shared, headers: HeaderMap, Path(id): Path<String>) -> Response {
	if let Err(denied) = state.authorize("DELETE /records/{id}", &headers) {
		return denied;
	}

	let mut inner = state.lock();
	let before = inner.records.len();

	inner.records.retain(|record| !id_matches(record, &id));

	if inner.records.len() == before {
		return failure(StatusCode::NOT_FOUND, "Record not found");
	}

	Json(json!({ "success": true, "message": "Record deleted" })).into_response()
}

async fn upload(State(state): Shared, headers: HeaderMap, mut multipart: Multipart) -> Response {
	if let Err(denied) = state.authorize("POST /attachments/upload", &headers) {
		return denied;
	}

	loop {
		let field = match multipart.next_field().await {
			Ok(Some(field)) => field,
			Ok(None) => return failure(StatusCode::BAD_REQUEST, "No file uploaded"),
			Err(err) => return failure(StatusCode::BAD_REQUEST, &err.to_string()),
		};

		if field.name() != Some("file") {
			continue;
		}

		let file_name = field.file_name().unwrap_or("upload.bin").to_string();
		let mime = field.content_type().unwrap_or("application/octet-stream").to_string();
		let bytes = match field.bytes().await {
			Ok(bytes) => bytes,
			Err(err) => return failure(StatusCode::BAD_REQUEST, &err.to_string()),
		};

		if let Some(max) = state.options.max_upload_bytes
			&& bytes.len() > max
		{
			return (StatusCode::PAYLOAD_TOO_LARGE, "File too large").into_response();
		}

		state.lock().uploads.push(file_name.clone());

		let id = Uuid::new_v4();

		return Json(json!({
			"success": true,
			"attachment": {
				"id": id.to_string(),
				"url": format!("/uploads/{id}-{file_name}"),
				"filename": file_name,
				"mimeType": mime,
				"fileSize": bytes.len(),
				"userId": 1,
				"createdAt": OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
			}
		}))
		.into_response();
	}
}

async fn mood_trend(State(state): Shared, headers: HeaderMap) -> Response {
	if let Err(denied) = state.authorize("GET /analytics/mood-trend", &headers) {
		return denied;
	}

	Json(json!({
		"success": true,
		"data": {
			"labels": ["2025-01-01", "2025-01-02", "2025-01-03"],
			"dataPoints": [3, 4.5, 2]
		}
	}))
	.into_response()
}

async fn records_summary(State(state): Shared, headers: HeaderMap) -> Response {
	if let Err(denied) = state.authorize("GET /analytics/records-summary", &headers) {
		return denied;
	}

	let total = state.lock().records.len();

	Json(json!({
		"success": true,
		"data": {
			"totalRecords": total,
			"recordsThisMonth": total,
			"topTags": [{ "tag": "dream", "count": total }]
		}
	}))
	.into_response()
}

async fn mental_state(State(state): Shared, headers: HeaderMap) -> Response {
	if let Err(denied) = state.authorize("GET /ai/mental-state-analysis", &headers) {
		return denied;
	}

	let analyses = state.lock().analyses;

	Json(json!({
		"success": true,
		"data": {
			"emotionChartData": {
				"labels": ["兴奋", "沉思"],
				"datasets": [{ "data": [2, 1], "borderColor": "#6366f1" }]
			},
			"themeWordCloud": [{ "text": "future", "value": 7 }, { "name": "city", "value": 3 }],
			"summaryReport": format!("Analyses run: {analyses}.")
		}
	}))
	.into_response()
}

async fn trigger_analysis(State(state): Shared, headers: HeaderMap) -> Response {
	if let Err(denied) = state.authorize("POST /ai/trigger-analysis", &headers) {
		return denied;
	}

	state.lock().analyses += 1;

	Json(json!({ "success": true, "message": "Analysis started" })).into_response()
}
