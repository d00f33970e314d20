//! Session record produced by the proxy after a successful redemption.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Authenticated-user record carrying the access token used for identity resolution.
///
/// Providers only read from the session; persistence, encryption, and refresh
/// scheduling belong to the proxy that owns it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
	/// Bearer token issued by the provider.
	pub access_token: TokenSecret,
	/// Refresh token, when the provider issued one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Instant after which the access token should no longer be trusted.
	#[serde(default, skip_serializing_if = "Option::is_none", with = "time::serde::rfc3339::option")]
	pub expires_on: Option<OffsetDateTime>,
	/// Resolved email address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Resolved user name, when distinct from the email.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user: Option<String>,
}
impl SessionState {
	/// Creates a session holding only an access token.
	pub fn new(access_token: impl Into<TokenSecret>) -> Self {
		Self { access_token: access_token.into(), ..Default::default() }
	}

	/// Attaches a refresh token.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<TokenSecret>) -> Self {
		self.refresh_token = Some(refresh_token.into());

		self
	}

	/// Sets the expiry instant.
	pub fn with_expires_on(mut self, expires_on: OffsetDateTime) -> Self {
		self.expires_on = Some(expires_on);

		self
	}

	/// Sets the resolved email address.
	pub fn with_email(mut self, email: impl Into<String>) -> Self {
		self.email = Some(email.into());

		self
	}

	/// Returns true if the session carries an expiry at or before `now`.
	///
	/// Sessions without an expiry never report as expired.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.expires_on.is_some_and(|at| at <= now)
	}
}
