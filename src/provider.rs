//! Provider-facing configuration (data) and adapters (behavior).
//!
//! `data` exposes the resolved [`ProviderData`] record every adapter carries plus the
//! builder/defaults pair that backfills provider-specific endpoints exactly once at
//! construction. [`Provider`] is the capability set the proxy programs against; each
//! concrete adapter (currently [`SlackProvider`]) implements it with its own defaults
//! and response parsing.

pub mod data;
pub mod slack;

pub use data::*;
pub use slack::*;

// self
use crate::{_prelude::*, auth::SessionState};

/// Boxed future returned by provider lookups so the trait stays object safe.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Capability set shared by every identity-provider adapter.
///
/// Implementors are required to be `Debug + Send + Sync`; lookups take `&self` and never mutate
/// the adapter, so one instance can serve concurrent logins.
pub trait Provider: Debug + Send + Sync {
	/// Returns the resolved configuration record.
	fn data(&self) -> &ProviderData;

	/// Builds the authorization URL the browser is redirected to.
	///
	/// `state` is the caller's anti-forgery token and is passed through untouched.
	fn login_url(&self, redirect_uri: &str, state: &str) -> String;

	/// Resolves the session's access token to the user's email address.
	fn email_address<'a>(&'a self, session: &'a SessionState) -> ProviderFuture<'a, String>;

	/// Checks provider-side group membership for `email`.
	///
	/// The default accepts everyone, which is right for providers without group support.
	fn validate_group(&self, _email: &str) -> bool {
		true
	}
}
