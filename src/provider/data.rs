//! Resolved provider configuration and the defaulting builder that produces it.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Immutable configuration record shared by all provider adapters.
///
/// Values come out of [`ProviderDataBuilder::build`], so the required endpoints and the
/// scope are always populated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderData {
	/// Display identifier of the provider.
	pub provider_name: String,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// OAuth 2.0 client secret.
	pub client_secret: TokenSecret,
	/// Authorization endpoint the browser is sent to.
	pub login_url: Url,
	/// Token endpoint used by the shared redemption routine.
	pub redeem_url: Url,
	/// Optional profile endpoint.
	pub profile_url: Option<Url>,
	/// Optional protected resource identifier.
	pub protected_resource: Option<Url>,
	/// Endpoint used to resolve an access token to an identity.
	pub validate_url: Url,
	/// Scope requested during authorization, kept exactly as configured.
	pub scope: String,
	/// Optional prompt hint forwarded to the provider.
	pub prompt: Option<String>,
}
impl ProviderData {
	/// Creates an empty builder.
	pub fn builder() -> ProviderDataBuilder {
		ProviderDataBuilder::default()
	}

	/// Returns the record itself so wrapping adapters can expose it uniformly.
	pub fn data(&self) -> &Self {
		self
	}
}

/// Provider-specific values used to backfill unset fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderDefaults {
	/// Display name; always replaces whatever the caller supplied.
	pub provider_name: &'static str,
	/// Fallback authorization endpoint.
	pub login_url: Url,
	/// Fallback token endpoint.
	pub redeem_url: Url,
	/// Fallback identity-validation endpoint.
	pub validate_url: Url,
	/// Fallback scope.
	pub scope: &'static str,
}

/// Unresolved provider configuration where every overridable field may be unset.
#[derive(Clone, Debug, Default)]
pub struct ProviderDataBuilder {
	/// Caller-supplied display name (adapters overwrite it).
	pub provider_name: Option<String>,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// OAuth 2.0 client secret.
	pub client_secret: TokenSecret,
	/// Authorization endpoint override.
	pub login_url: Option<Url>,
	/// Token endpoint override.
	pub redeem_url: Option<Url>,
	/// Profile endpoint.
	pub profile_url: Option<Url>,
	/// Protected resource identifier.
	pub protected_resource: Option<Url>,
	/// Identity-validation endpoint override.
	pub validate_url: Option<Url>,
	/// Scope override; empty counts as unset.
	pub scope: Option<String>,
	/// Prompt hint; empty counts as unset.
	pub prompt: Option<String>,
}
impl ProviderDataBuilder {
	/// Sets the caller-supplied display name.
	pub fn provider_name(mut self, name: impl Into<String>) -> Self {
		self.provider_name = Some(name.into());

		self
	}

	/// Sets the client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = client_id.into();

		self
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, client_secret: impl Into<TokenSecret>) -> Self {
		self.client_secret = client_secret.into();

		self
	}

	/// Overrides the authorization endpoint.
	pub fn login_url(mut self, url: Url) -> Self {
		self.login_url = Some(url);

		self
	}

	/// Overrides the token endpoint.
	pub fn redeem_url(mut self, url: Url) -> Self {
		self.redeem_url = Some(url);

		self
	}

	/// Sets the profile endpoint.
	pub fn profile_url(mut self, url: Url) -> Self {
		self.profile_url = Some(url);

		self
	}

	/// Sets the protected resource.
	pub fn protected_resource(mut self, url: Url) -> Self {
		self.protected_resource = Some(url);

		self
	}

	/// Overrides the identity-validation endpoint.
	pub fn validate_url(mut self, url: Url) -> Self {
		self.validate_url = Some(url);

		self
	}

	/// Overrides the scope.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Sets the prompt hint.
	pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
		self.prompt = Some(prompt.into());

		self
	}

	/// Resolves the builder against `defaults`.
	///
	/// The provider name always comes from `defaults`. Endpoints and scope keep the caller's
	/// value when set and non-empty, and fall back to `defaults` otherwise. Building the
	/// result back into a builder and resolving again yields the same record.
	pub fn build(self, defaults: &ProviderDefaults) -> ProviderData {
		ProviderData {
			provider_name: defaults.provider_name.to_owned(),
			client_id: self.client_id,
			client_secret: self.client_secret,
			login_url: self.login_url.unwrap_or_else(|| defaults.login_url.clone()),
			redeem_url: self.redeem_url.unwrap_or_else(|| defaults.redeem_url.clone()),
			profile_url: self.profile_url,
			protected_resource: self.protected_resource,
			validate_url: self.validate_url.unwrap_or_else(|| defaults.validate_url.clone()),
			scope: non_empty(self.scope).unwrap_or_else(|| defaults.scope.to_owned()),
			prompt: non_empty(self.prompt),
		}
	}
}
impl From<ProviderData> for ProviderDataBuilder {
	fn from(data: ProviderData) -> Self {
		Self {
			provider_name: Some(data.provider_name),
			client_id: data.client_id,
			client_secret: data.client_secret,
			login_url: Some(data.login_url),
			redeem_url: Some(data.redeem_url),
			profile_url: data.profile_url,
			protected_resource: data.protected_resource,
			validate_url: Some(data.validate_url),
			scope: Some(data.scope),
			prompt: data.prompt,
		}
	}
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Test URL fixture should parse.")
	}

	fn defaults() -> ProviderDefaults {
		ProviderDefaults {
			provider_name: "Mock",
			login_url: url("https://mock.example/authorize"),
			redeem_url: url("https://mock.example/token"),
			validate_url: url("https://mock.example/me"),
			scope: "profile",
		}
	}

	#[test]
	fn build_backfills_unset_and_empty_fields() {
		let data = ProviderData::builder()
			.provider_name("Caller")
			.client_id("id")
			.scope("")
			.prompt("")
			.build(&defaults());

		assert_eq!(data.provider_name, "Mock");
		assert_eq!(data.client_id, "id");
		assert_eq!(data.login_url.as_str(), "https://mock.example/authorize");
		assert_eq!(data.redeem_url.as_str(), "https://mock.example/token");
		assert_eq!(data.validate_url.as_str(), "https://mock.example/me");
		assert_eq!(data.scope, "profile");
		assert_eq!(data.prompt, None);
		assert_eq!(data.profile_url, None);
		assert_eq!(data.data(), &data);
	}

	#[test]
	fn build_is_idempotent() {
		let first = ProviderData::builder()
			.login_url(url("https://custom.example/auth"))
			.scope("a b")
			.prompt("consent")
			.build(&defaults());
		let second = ProviderDataBuilder::from(first.clone()).build(&defaults());

		assert_eq!(first, second);
		assert_eq!(second.login_url.as_str(), "https://custom.example/auth");
		assert_eq!(second.prompt.as_deref(), Some("consent"));
	}
}
