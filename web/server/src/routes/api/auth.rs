use axum::{
	Json,
	extract::{FromRequestParts, Path, State},
	http::{StatusCode, header, request::Parts},
};
use bloghub_api_model::{
	MessageResponse,
	auth::{
		ApiSessionUser, ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest,
		RegisterResponse, ResetPasswordRequest, ResetPasswordResponse,
	},
};
use bloghub_backend_service::session::SessionUser;

use crate::routes::WebServices;

use super::{
	api_user,
	error::{ApiError, ApiResult, OptionExt},
};

/// An authenticated caller, resolved from the `Authorization` bearer
/// token.
pub struct Identity(pub SessionUser);

impl FromRequestParts<WebServices> for Identity {
	type Rejection = ApiError;

	async fn from_request_parts(
		parts: &mut Parts,
		state: &WebServices,
	) -> Result<Self, Self::Rejection> {
		let token = bearer_token(parts).ok_or(ApiError::AuthRequired)?;
		let user = state.backend.session.authenticate(&token).await?;
		Ok(Self(user))
	}
}

/// An authenticated admin caller.
pub struct AdminIdentity(pub SessionUser);

impl FromRequestParts<WebServices> for AdminIdentity {
	type Rejection = ApiError;

	async fn from_request_parts(
		parts: &mut Parts,
		state: &WebServices,
	) -> Result<Self, Self::Rejection> {
		let Identity(user) = Identity::from_request_parts(parts, state).await?;
		if !user.is_admin {
			return Err(ApiError::AdminRequired);
		}
		Ok(Self(user))
	}
}

/// Best-effort identity for routes that are public but show more to
/// authenticated callers. Never rejects; bad tokens read as anonymous.
pub struct MaybeIdentity(pub Option<SessionUser>);

impl FromRequestParts<WebServices> for MaybeIdentity {
	type Rejection = ApiError;

	async fn from_request_parts(
		parts: &mut Parts,
		state: &WebServices,
	) -> Result<Self, Self::Rejection> {
		let Some(token) = bearer_token(parts) else {
			return Ok(Self(None));
		};
		Ok(Self(state.backend.session.authenticate(&token).await.ok()))
	}
}

fn bearer_token(parts: &Parts) -> Option<String> {
	parts
		.headers
		.get(header::AUTHORIZATION)?
		.to_str()
		.ok()?
		.strip_prefix("Bearer ")
		.map(str::to_owned)
}

/// The raw bearer token, for operations on the session itself.
pub struct BearerToken(pub String);

impl FromRequestParts<WebServices> for BearerToken {
	type Rejection = ApiError;

	async fn from_request_parts(
		parts: &mut Parts,
		_state: &WebServices,
	) -> Result<Self, Self::Rejection> {
		bearer_token(parts).map(Self).ok_or(ApiError::AuthRequired)
	}
}

pub async fn register(
	State(services): State<WebServices>,
	Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
	let user_id = services
		.backend
		.user
		.register(&req.username, &req.email, &req.password)
		.await?;
	Ok((StatusCode::CREATED, Json(RegisterResponse { user_id })))
}

pub async fn login(
	State(services): State<WebServices>,
	Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
	let session = services
		.backend
		.session
		.login(&req.username, &req.password)
		.await?;
	Ok(Json(LoginResponse {
		token: session.token,
		user: ApiSessionUser {
			id: session.user.id,
			username: session.user.username,
			is_admin: session.user.is_admin,
		},
	}))
}

pub async fn logout(
	BearerToken(token): BearerToken,
	State(services): State<WebServices>,
) -> ApiResult<Json<MessageResponse>> {
	services.backend.session.logout(&token).await?;
	Ok(Json(MessageResponse::new("logged out")))
}

pub async fn reset_password(
	State(services): State<WebServices>,
	Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<ResetPasswordResponse>> {
	let reset_token = services.backend.user.issue_reset_token(&req.email).await?;
	// identical answer whether or not the address is registered
	Ok(Json(ResetPasswordResponse {
		message: "if the address is registered, reset instructions have been issued".into(),
		reset_token,
	}))
}

pub async fn change_password(
	State(services): State<WebServices>,
	Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
	services
		.backend
		.user
		.redeem_reset_token(&req.email, &req.token, &req.new_password)
		.await?;
	Ok(Json(MessageResponse::new("password updated")))
}

pub async fn profile(
	State(services): State<WebServices>,
	Path(username): Path<String>,
) -> ApiResult<Json<bloghub_api_model::auth::ApiUser>> {
	let profile = services
		.backend
		.user
		.profile(&username)
		.await?
		.or_api_error(StatusCode::NOT_FOUND, "user not found")?;
	Ok(Json(api_user(profile)))
}
