use axum::{
	Json,
	http::StatusCode,
	response::{AppendHeaders, IntoResponse, Response},
};
use bloghub_backend_service::{
	BackendError, comment::CommentError, post::PostError, session::SessionError,
	user::UserError,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
	#[error(transparent)]
	BackendError(BackendError),

	#[error("api error: {1}")]
	CustomRef(StatusCode, &'static str),
	#[error("api error: {1}")]
	CustomString(StatusCode, String),

	#[error("authentication is required")]
	AuthRequired,
	#[error("admin privileges are required")]
	AdminRequired,
}

impl ApiError {
	/// HTTP status for the domain error carried by this value.
	fn status(&self) -> StatusCode {
		match self {
			ApiError::BackendError(err) => backend_status(err),
			ApiError::CustomRef(status, _) | ApiError::CustomString(status, _) => *status,
			ApiError::AuthRequired => StatusCode::UNAUTHORIZED,
			ApiError::AdminRequired => StatusCode::FORBIDDEN,
		}
	}
}

fn backend_status(err: &BackendError) -> StatusCode {
	match err {
		BackendError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
		BackendError::UserError(err) => match err {
			UserError::RegistrationDisabled => StatusCode::FORBIDDEN,
			UserError::MissingFields | UserError::InvalidEmail => StatusCode::BAD_REQUEST,
			UserError::UsernameTaken | UserError::EmailTaken => StatusCode::CONFLICT,
			UserError::NotFound => StatusCode::NOT_FOUND,
			UserError::InvalidResetToken => StatusCode::UNAUTHORIZED,
			UserError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
		},
		BackendError::SessionError(err) => match err {
			SessionError::InvalidCredentials | SessionError::InvalidToken => {
				StatusCode::UNAUTHORIZED
			}
			SessionError::AccountDisabled => StatusCode::FORBIDDEN,
		},
		BackendError::PostError(err) => match err {
			PostError::NotFound => StatusCode::NOT_FOUND,
			PostError::MissingFields | PostError::UnsluggableTitle => StatusCode::BAD_REQUEST,
			PostError::DuplicateSlug => StatusCode::CONFLICT,
			PostError::NotAuthor => StatusCode::FORBIDDEN,
		},
		BackendError::CommentError(err) => match err {
			CommentError::NotFound | CommentError::PostNotFound => StatusCode::NOT_FOUND,
			CommentError::CommentsDisabled => StatusCode::FORBIDDEN,
			CommentError::EmptyContent => StatusCode::BAD_REQUEST,
		},
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = self.status();
		let body = Json(json!({ "error": self.to_string() }));
		if let ApiError::AuthRequired = self {
			(
				status,
				AppendHeaders([("WWW-Authenticate", "Bearer")]),
				body,
			)
				.into_response()
		} else {
			(status, body).into_response()
		}
	}
}

impl<T: Into<BackendError>> From<T> for ApiError {
	fn from(value: T) -> Self {
		Self::BackendError(value.into())
	}
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

pub(crate) trait IntoCustomApiError {
	fn into_custom_api_error(self, status: StatusCode) -> ApiError;
}

impl IntoCustomApiError for &'static str {
	fn into_custom_api_error(self, status: StatusCode) -> ApiError {
		ApiError::CustomRef(status, self)
	}
}
impl IntoCustomApiError for String {
	fn into_custom_api_error(self, status: StatusCode) -> ApiError {
		ApiError::CustomString(status, self)
	}
}

pub(crate) trait OptionExt<T> {
	fn or_api_error<M: IntoCustomApiError>(
		self,
		status: StatusCode,
		message: M,
	) -> Result<T, ApiError>;
}

impl<T> OptionExt<T> for Option<T> {
	fn or_api_error<M: IntoCustomApiError>(
		self,
		status: StatusCode,
		message: M,
	) -> Result<T, ApiError> {
		match self {
			Some(val) => Ok(val),
			None => Err(message.into_custom_api_error(status)),
		}
	}
}
