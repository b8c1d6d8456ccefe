use axum::{
	Json, Router,
	extract::{
		DefaultBodyLimit, Multipart, State,
		multipart::{MultipartError, MultipartRejection},
	},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::state::AppState;
use attend_service::{
	Error as ServiceError, MatchOutcome, MatchRequest, RegisterOutcome, RegisterRequest,
};

pub const FILE_FIELD: &str = "file1";
pub const NO_FILE_PROVIDED: &str = "No file provided";

pub fn router(state: AppState) -> Router {
	let max_upload_bytes = state.service.cfg.service.max_upload_bytes;

	Router::new()
		.route("/", get(home))
		.route("/health", get(health))
		.route("/add_face", post(add_face))
		.route("/face_match", post(face_match))
		.layer(DefaultBodyLimit::max(max_upload_bytes))
		.with_state(state)
}

async fn home() -> &'static str {
	"AttendEase API is running."
}

#[derive(Debug, Serialize)]
struct HealthBody {
	status: &'static str,
	timestamp: String,
}

async fn health() -> Result<Json<HealthBody>, ApiError> {
	let timestamp = OffsetDateTime::now_utc().format(&Rfc3339).map_err(|err| {
		ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to format timestamp: {err}."))
	})?;

	Ok(Json(HealthBody { status: "healthy", timestamp }))
}

/// `true`/`false` for registration, the matched identifier or `false` for matching.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Status {
	Flag(bool),
	Identifier(String),
}

#[derive(Debug, Serialize)]
pub struct StatusBody {
	pub status: Status,
}

async fn add_face(
	State(state): State<AppState>,
	multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<StatusBody>, ApiError> {
	let upload = read_upload(multipart).await?;
	let outcome = state
		.service
		.register(RegisterRequest { file_name: upload.file_name, image: upload.bytes })
		.await?;
	let registered = matches!(outcome, RegisterOutcome::Registered { .. });

	Ok(Json(StatusBody { status: Status::Flag(registered) }))
}

async fn face_match(
	State(state): State<AppState>,
	multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<StatusBody>, ApiError> {
	let upload = read_upload(multipart).await?;
	let outcome = state
		.service
		.face_match(MatchRequest { file_name: upload.file_name, image: upload.bytes })
		.await?;
	let status = match outcome {
		MatchOutcome::Matched { face, .. } => Status::Identifier(face.identifier),
		MatchOutcome::NoMatch => Status::Flag(false),
	};

	Ok(Json(StatusBody { status }))
}

struct Upload {
	file_name: String,
	bytes: Vec<u8>,
}

/// The first `file1` part that carries a filename. Anything else counts as no file.
async fn read_upload(multipart: Result<Multipart, MultipartRejection>) -> Result<Upload, ApiError> {
	let mut multipart = match multipart {
		Ok(multipart) => multipart,
		Err(rejection) => {
			tracing::debug!(error = %rejection, "Request body is not multipart.");

			return Err(ApiError::no_file());
		},
	};

	while let Some(field) = multipart.next_field().await.map_err(ApiError::from_multipart)? {
		if field.name() != Some(FILE_FIELD) {
			continue;
		}

		let Some(file_name) = field.file_name().map(str::to_string) else {
			continue;
		};
		let bytes = field.bytes().await.map_err(ApiError::from_multipart)?;

		return Ok(Upload { file_name, bytes: bytes.to_vec() });
	}

	Err(ApiError::no_file())
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, message: impl Into<String>) -> Self {
		Self { status, message: message.into() }
	}

	fn no_file() -> Self {
		Self::new(StatusCode::BAD_REQUEST, NO_FILE_PROVIDED)
	}

	fn from_multipart(err: MultipartError) -> Self {
		tracing::debug!(error = %err, "Malformed multipart body.");

		Self::new(err.status(), err.body_text())
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } => Self::new(StatusCode::BAD_REQUEST, message),
			ServiceError::Extractor { message } => {
				tracing::error!(error = %message, "Face extractor failed.");

				Self::new(StatusCode::BAD_GATEWAY, "Face extractor is unavailable.")
			},
			ServiceError::StoreUnavailable { message } => {
				tracing::error!(error = %message, "Encoding store is unavailable.");

				Self::new(StatusCode::SERVICE_UNAVAILABLE, "Store is unavailable.")
			},
			err @ (ServiceError::DimensionMismatch { .. }
			| ServiceError::Config { .. }
			| ServiceError::Internal { .. }) => {
				tracing::error!(error = %err, "Request failed.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		(self.status, Json(ErrorBody { error: self.message })).into_response()
	}
}
