//! Provider settings loaded from process configuration.
//!
//! [`ProviderSettings`] deserializes from any serde source or from `OAUTH2_PROXY_*`
//! environment variables, validates the client credentials, and selects the adapter to
//! instantiate. Endpoint strings that are empty count as unset so adapters backfill them.

// std
use std::env;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ConfigError,
	http::IdentityHttpClient,
	provider::{Provider, ProviderData, ProviderDataBuilder, SlackProvider},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Identity providers with an adapter in this crate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
	/// Sign in with Slack.
	#[default]
	Slack,
}
impl ProviderKind {
	/// Returns the configuration identifier of the provider.
	pub const fn as_str(self) -> &'static str {
		match self {
			ProviderKind::Slack => "slack",
		}
	}
}
impl Display for ProviderKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for ProviderKind {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"slack" => Ok(ProviderKind::Slack),
			_ => Err(ConfigError::UnsupportedProvider { name: s.to_owned() }),
		}
	}
}

/// Raw provider settings as they appear in flags, files, or the environment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
	/// Adapter to instantiate.
	pub provider: ProviderKind,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// OAuth 2.0 client secret.
	pub client_secret: TokenSecret,
	/// Authorization endpoint override.
	pub login_url: Option<String>,
	/// Token endpoint override.
	pub redeem_url: Option<String>,
	/// Profile endpoint.
	pub profile_url: Option<String>,
	/// Identity-validation endpoint override.
	pub validate_url: Option<String>,
	/// Protected resource identifier.
	pub resource: Option<String>,
	/// Scope override.
	pub scope: Option<String>,
	/// Prompt hint forwarded to the provider.
	pub approval_prompt: Option<String>,
	/// Slack workspace restriction.
	pub slack_team: Option<String>,
}
impl ProviderSettings {
	/// Environment variable prefix used by [`ProviderSettings::from_env`].
	pub const ENV_PREFIX: &'static str = "OAUTH2_PROXY_";

	/// Loads settings from `OAUTH2_PROXY_*` environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| env::var(key).ok())
	}

	/// Loads settings through `lookup`, which receives fully prefixed variable names.
	pub fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
	where
		F: FnMut(&str) -> Option<String>,
	{
		let mut var = |name: &str| lookup(&format!("{}{name}", Self::ENV_PREFIX));
		let provider = match var("PROVIDER") {
			Some(name) if !name.trim().is_empty() => name.parse()?,
			_ => ProviderKind::default(),
		};

		Ok(Self {
			provider,
			client_id: var("CLIENT_ID").unwrap_or_default(),
			client_secret: var("CLIENT_SECRET").unwrap_or_default().into(),
			login_url: var("LOGIN_URL"),
			redeem_url: var("REDEEM_URL"),
			profile_url: var("PROFILE_URL"),
			validate_url: var("VALIDATE_URL"),
			resource: var("RESOURCE"),
			scope: var("SCOPE"),
			approval_prompt: var("APPROVAL_PROMPT"),
			slack_team: var("SLACK_TEAM"),
		})
	}

	/// Checks that the client credentials are present.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::MissingClientId);
		}
		if self.client_secret.expose().trim().is_empty() {
			return Err(ConfigError::MissingClientSecret);
		}

		Ok(())
	}

	/// Parses endpoint strings into an unresolved [`ProviderDataBuilder`].
	pub fn to_builder(&self) -> Result<ProviderDataBuilder, ConfigError> {
		Ok(ProviderDataBuilder {
			client_id: self.client_id.clone(),
			client_secret: self.client_secret.clone(),
			login_url: parse_url("login-url", self.login_url.as_deref())?,
			redeem_url: parse_url("redeem-url", self.redeem_url.as_deref())?,
			profile_url: parse_url("profile-url", self.profile_url.as_deref())?,
			protected_resource: parse_url("resource", self.resource.as_deref())?,
			validate_url: parse_url("validate-url", self.validate_url.as_deref())?,
			scope: self.scope.clone(),
			prompt: self.approval_prompt.clone(),
			..ProviderData::builder()
		})
	}

	/// Validates the settings and instantiates the selected adapter over `http_client`.
	pub fn into_provider_with_http_client<C>(
		self,
		http_client: impl Into<Arc<C>>,
	) -> Result<Box<dyn Provider>>
	where
		C: ?Sized + IdentityHttpClient,
	{
		self.validate()?;

		let builder = self.to_builder()?;

		match self.provider {
			ProviderKind::Slack => {
				let mut provider = SlackProvider::with_http_client(builder, http_client);

				if let Some(team) = self.slack_team {
					provider.configure(team);
				}

				Ok(Box::new(provider))
			},
		}
	}

	/// Validates the settings and instantiates the selected adapter over reqwest.
	#[cfg(feature = "reqwest")]
	pub fn into_provider(self) -> Result<Box<dyn Provider>> {
		self.into_provider_with_http_client(ReqwestHttpClient::default())
	}
}

fn parse_url(field: &'static str, raw: Option<&str>) -> Result<Option<Url>, ConfigError> {
	match raw.map(str::trim) {
		None | Some("") => Ok(None),
		Some(value) =>
			Url::parse(value).map(Some).map_err(|source| ConfigError::InvalidUrl { field, source }),
	}
}
