use std::sync::Arc;

use anyhow::Result;
use axum::{
	Json, Router,
	extract::FromRef,
	http::StatusCode,
	response::IntoResponse,
	routing::get,
};
use bloghub_backend_service::BackendServices;
use serde_json::json;

use crate::config::BlogConfig;

mod api;

#[derive(Debug, Clone)]
pub struct WebServices {
	pub config: Arc<BlogConfig>,
	pub backend: BackendServices,
}

impl FromRef<WebServices> for BackendServices {
	fn from_ref(services: &WebServices) -> Self {
		services.backend.clone()
	}
}

pub fn make_router(services: WebServices) -> Result<Router> {
	let router = Router::new()
		.route("/", get(handler))
		.nest("/api", api::api_router())
		.fallback(not_found)
		.with_state(services);

	Ok(router)
}

async fn handler() -> &'static str {
	concat!("BlogHub ", env!("CARGO_PKG_VERSION"))
}

async fn not_found() -> impl IntoResponse {
	(StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}
