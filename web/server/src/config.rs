use bloghub_backend_service::{
	config::{AuthConfig, BackendConfig, ContentConfig},
	database::DatabaseConfig,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Clone, Hash, Deserialize, Serialize)]
pub struct BlogConfig {
	pub web: WebConfig,
	pub database: DatabaseConfig,
	#[serde(default)]
	pub auth: AuthConfig,
	#[serde(default)]
	pub content: ContentConfig,
}

impl TryFrom<BlogConfig> for BackendConfig {
	type Error = anyhow::Error;

	fn try_from(config: BlogConfig) -> Result<Self, Self::Error> {
		Ok(BackendConfig {
			database: config.database,
			auth: config.auth,
			content: config.content,
		})
	}
}

#[derive(Debug, PartialEq, Eq, Clone, Hash, Deserialize, Serialize)]
pub struct WebConfig {
	/// Address for the web server to listen on.
	///
	/// Examples:
	/// - `unix://bloghub.socket`
	/// - `tcp://0.0.0.0:5000`
	pub listen: String,
}
