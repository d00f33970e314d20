//! Slack "Sign in with Slack" adapter.
//!
//! Slack identifies users through `users.identity`, which accepts the access token as a
//! `token` query parameter and answers with `{"user": {"id": .., "email": ..}}`. Workspaces
//! that do not grant `identity.email` omit the email, in which case the stable user id is
//! returned instead.

// std
use std::sync::LazyLock;
// crates.io
use oauth2::{HttpRequest, http::Method};
// self
use crate::{
	_prelude::*,
	auth::SessionState,
	http::{self, IdentityHttpClient},
	obs::{self, OperationOutcome, ProviderOperation, ProviderSpan},
	provider::{Provider, ProviderData, ProviderDataBuilder, ProviderDefaults, ProviderFuture},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Display name every Slack adapter reports.
pub const SLACK_PROVIDER_NAME: &str = "Slack";
/// Default authorization endpoint.
pub const SLACK_LOGIN_URL: &str = "https://slack.com/oauth/authorize";
/// Default token endpoint.
pub const SLACK_REDEEM_URL: &str = "https://slack.com/api/oauth.access";
/// Default identity endpoint.
pub const SLACK_VALIDATE_URL: &str = "https://slack.com/api/users.identity";
/// Default scope (comma-delimited, as Slack expects).
pub const SLACK_SCOPE: &str = "identity.basic,identity.email";

static SLACK_DEFAULTS: LazyLock<ProviderDefaults> = LazyLock::new(|| ProviderDefaults {
	provider_name: SLACK_PROVIDER_NAME,
	login_url: static_url(SLACK_LOGIN_URL),
	redeem_url: static_url(SLACK_REDEEM_URL),
	validate_url: static_url(SLACK_VALIDATE_URL),
	scope: SLACK_SCOPE,
});

#[cfg(feature = "reqwest")]
/// Slack adapter specialized for the crate's default reqwest transport.
pub type ReqwestSlackProvider = SlackProvider<ReqwestHttpClient>;

/// Slack identity-provider adapter.
///
/// Construction backfills Slack's endpoints and scope; afterwards only the team can
/// change, through [`SlackProvider::configure`].
pub struct SlackProvider<C>
where
	C: ?Sized + IdentityHttpClient,
{
	data: ProviderData,
	team: String,
	http_client: Arc<C>,
}
impl<C> SlackProvider<C>
where
	C: ?Sized + IdentityHttpClient,
{
	/// Creates an adapter that performs lookups through `http_client`.
	pub fn with_http_client(builder: ProviderDataBuilder, http_client: impl Into<Arc<C>>) -> Self {
		Self {
			data: builder.build(&SLACK_DEFAULTS),
			team: String::new(),
			http_client: http_client.into(),
		}
	}

	/// Scopes logins to a single workspace; an empty string lifts the restriction.
	pub fn configure(&mut self, team: impl Into<String>) {
		self.team = team.into();
	}

	/// Returns the configured workspace, empty when unrestricted.
	pub fn team(&self) -> &str {
		&self.team
	}

	fn build_login_url(&self, redirect_uri: &str, state: &str) -> Url {
		let mut url = self.data.login_url.clone();
		let mut params = BTreeMap::<String, Vec<String>>::new();

		for (key, value) in url.query_pairs() {
			params.entry(key.into_owned()).or_default().push(value.into_owned());
		}

		set_param(&mut params, "redirect_uri", redirect_uri);

		if !self.team.is_empty() {
			set_param(&mut params, "team", &self.team);
		}

		set_param(&mut params, "scope", &self.data.scope);
		set_param(&mut params, "client_id", &self.data.client_id);
		set_param(&mut params, "response_type", "code");
		set_param(&mut params, "state", state);

		let mut pairs = url.query_pairs_mut();

		pairs.clear();

		for (key, values) in &params {
			for value in values {
				pairs.append_pair(key, value);
			}
		}

		drop(pairs);

		url
	}

	async fn fetch_email(&self, session: &SessionState) -> Result<String> {
		let request = identity_request(&self.data.validate_url, session.access_token.expose())?;
		let identity: IdentityResponse = http::request_json(&*self.http_client, request).await?;

		Ok(identity.user.into_identifier())
	}

	fn record(&self, operation: ProviderOperation, outcome: OperationOutcome) {
		obs::record_operation_outcome(&self.data.provider_name, operation, outcome);
	}
}
#[cfg(feature = "reqwest")]
impl SlackProvider<ReqwestHttpClient> {
	/// Creates an adapter backed by a default reqwest client.
	pub fn new(builder: ProviderDataBuilder) -> Self {
		Self::with_http_client(builder, ReqwestHttpClient::default())
	}
}
impl<C> Provider for SlackProvider<C>
where
	C: ?Sized + IdentityHttpClient,
{
	fn data(&self) -> &ProviderData {
		&self.data
	}

	fn login_url(&self, redirect_uri: &str, state: &str) -> String {
		self.record(ProviderOperation::LoginUrl, OperationOutcome::Attempt);

		let url = self.build_login_url(redirect_uri, state);

		self.record(ProviderOperation::LoginUrl, OperationOutcome::Success);

		url.into()
	}

	fn email_address<'a>(&'a self, session: &'a SessionState) -> ProviderFuture<'a, String> {
		let operation = ProviderOperation::EmailAddress;
		let span = ProviderSpan::new(&self.data.provider_name, operation);

		Box::pin(span.instrument(async move {
			self.record(operation, OperationOutcome::Attempt);

			let result = self.fetch_email(session).await;

			match &result {
				Ok(_) => self.record(operation, OperationOutcome::Success),
				Err(e) => {
					obs::trace_failure(operation, e);
					self.record(operation, OperationOutcome::Failure);
				},
			}

			result
		}))
	}
}
impl<C> Debug for SlackProvider<C>
where
	C: ?Sized + IdentityHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SlackProvider")
			.field("data", &self.data)
			.field("team", &self.team)
			.finish()
	}
}

#[derive(Debug, Deserialize)]
struct IdentityResponse {
	user: IdentityUser,
}

/// Identifier resolved from the `user` object: the email when present, else the id.
#[derive(Debug, Deserialize)]
#[serde(try_from = "RawIdentityUser")]
struct IdentityUser(String);
impl IdentityUser {
	fn into_identifier(self) -> String {
		self.0
	}
}
impl TryFrom<RawIdentityUser> for IdentityUser {
	type Error = &'static str;

	fn try_from(raw: RawIdentityUser) -> Result<Self, Self::Error> {
		raw.email.or(raw.id).map(Self).ok_or("user object carries neither email nor id")
	}
}

#[derive(Deserialize)]
struct RawIdentityUser {
	// A present `email` must be a string; only an absent key falls back to `id`.
	#[serde(default, deserialize_with = "present_string")]
	email: Option<String>,
	#[serde(default)]
	id: Option<String>,
}

fn present_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: serde::Deserializer<'de>,
{
	String::deserialize(deserializer).map(Some)
}

/// Builds the `users.identity` lookup request.
///
/// The request builder only rejects URIs that `http` cannot parse; a `Url` parsed from an
/// `http`/`https` endpoint always round-trips, so [`Error::RequestConstruction`] is reserved
/// for exotic schemes.
fn identity_request(validate_url: &Url, access_token: &str) -> Result<HttpRequest> {
	let mut url = validate_url.clone();

	url.query_pairs_mut().append_pair("token", access_token);

	oauth2::http::Request::builder()
		.method(Method::GET)
		.uri(url.as_str())
		.body(Vec::new())
		.map_err(|source| Error::RequestConstruction { source })
}

fn set_param(params: &mut BTreeMap<String, Vec<String>>, key: &str, value: &str) {
	params.insert(key.to_owned(), vec![value.to_owned()]);
}

fn static_url(raw: &'static str) -> Url {
	Url::parse(raw).expect("Built-in Slack endpoint must be a valid URL.")
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::Mutex;
	// crates.io
	use oauth2::{AsyncHttpClient, HttpClientError, HttpResponse, http::StatusCode};
	// self
	use super::*;
	use crate::{error::RequestExecutionError, http::decode_json};

	#[derive(Clone)]
	struct CannedHttpClient {
		status: StatusCode,
		body: &'static str,
		seen: Arc<Mutex<Vec<String>>>,
	}
	impl CannedHttpClient {
		fn new(status: StatusCode, body: &'static str) -> Self {
			Self { status, body, seen: Default::default() }
		}

		fn seen(&self) -> Vec<String> {
			self.seen.lock().expect("Seen request log should not be poisoned.").clone()
		}
	}
	impl IdentityHttpClient for CannedHttpClient {
		type Handle = CannedHttpClient;
		type TransportError = std::io::Error;

		fn handle(&self) -> Self::Handle {
			self.clone()
		}
	}
	impl<'c> AsyncHttpClient<'c> for CannedHttpClient {
		type Error = HttpClientError<std::io::Error>;
		type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

		fn call(&'c self, request: HttpRequest) -> Self::Future {
			self.seen
				.lock()
				.expect("Seen request log should not be poisoned.")
				.push(request.uri().to_string());

			let mut response = HttpResponse::new(self.body.as_bytes().to_vec());

			*response.status_mut() = self.status;

			Box::pin(async move { Ok(response) })
		}
	}

	fn provider(client: CannedHttpClient) -> SlackProvider<CannedHttpClient> {
		SlackProvider::with_http_client(ProviderData::builder().client_id("cid"), client)
	}

	fn query(url: &str) -> Vec<(String, String)> {
		Url::parse(url)
			.expect("Login URL should parse.")
			.query_pairs()
			.map(|(k, v)| (k.into_owned(), v.into_owned()))
			.collect()
	}

	#[test]
	fn login_url_replaces_preset_parameters() {
		let login = Url::parse("https://slack.example/authorize?team=old&scope=x&keep=1")
			.expect("Login URL fixture should parse.");
		let mut provider = SlackProvider::with_http_client(
			ProviderData::builder().client_id("cid").login_url(login),
			CannedHttpClient::new(StatusCode::OK, "{}"),
		);

		provider.configure("new");

		let pairs = query(&provider.login_url("https://cb", "s1"));
		let count = |key: &str| pairs.iter().filter(|(k, _)| k == key).count();

		assert_eq!(count("team"), 1);
		assert_eq!(count("scope"), 1);
		assert!(pairs.contains(&("team".into(), "new".into())));
		assert!(pairs.contains(&("scope".into(), SLACK_SCOPE.into())));
		assert!(pairs.contains(&("keep".into(), "1".into())));
		assert_eq!(
			provider.data().login_url.as_str(),
			"https://slack.example/authorize?team=old&scope=x&keep=1"
		);
	}

	#[test]
	fn login_url_sorts_parameters_by_key() {
		let provider = provider(CannedHttpClient::new(StatusCode::OK, "{}"));
		let keys: Vec<_> =
			query(&provider.login_url("https://cb", "s")).into_iter().map(|(k, _)| k).collect();

		assert_eq!(keys, ["client_id", "redirect_uri", "response_type", "scope", "state"]);
	}

	#[test]
	fn identity_request_encodes_token_and_keeps_existing_query() {
		let url = Url::parse("https://slack.example/api/users.identity?pretty=1")
			.expect("Validate URL fixture should parse.");
		let request = identity_request(&url, "a b&c").expect("Request should build.");

		assert_eq!(request.method(), Method::GET);
		assert_eq!(
			request.uri().to_string(),
			"https://slack.example/api/users.identity?pretty=1&token=a+b%26c"
		);
		assert!(request.body().is_empty());
	}

	#[tokio::test]
	async fn email_address_prefers_email_then_id() {
		let client =
			CannedHttpClient::new(StatusCode::OK, r#"{"user":{"id":"U1","email":"a@b.com"}}"#);
		let email = provider(client.clone())
			.email_address(&SessionState::new("tok"))
			.await
			.expect("Email lookup should succeed.");

		assert_eq!(email, "a@b.com");
		assert_eq!(client.seen(), ["https://slack.com/api/users.identity?token=tok"]);

		let client = CannedHttpClient::new(StatusCode::OK, r#"{"user":{"id":"U1"}}"#);
		let id = provider(client)
			.email_address(&SessionState::new("tok"))
			.await
			.expect("Id fallback should succeed.");

		assert_eq!(id, "U1");
	}

	#[tokio::test]
	async fn email_address_classifies_failures() {
		let err = provider(CannedHttpClient::new(StatusCode::UNAUTHORIZED, "invalid_auth"))
			.email_address(&SessionState::new("tok"))
			.await
			.expect_err("Non-success statuses should fail.");

		assert!(matches!(
			err,
			Error::RequestExecution(RequestExecutionError::Status { status: 401, .. })
		));

		let err = provider(CannedHttpClient::new(StatusCode::OK, r#"{"ok":false}"#))
			.email_address(&SessionState::new("tok"))
			.await
			.expect_err("Responses without a user should be malformed.");

		assert!(matches!(err, Error::MalformedResponse { status: 200, .. }));

		let err = provider(CannedHttpClient::new(StatusCode::OK, "not json"))
			.email_address(&SessionState::new("tok"))
			.await
			.expect_err("Non-JSON bodies should be malformed.");

		assert!(matches!(err, Error::MalformedResponse { .. }));
	}

	fn decode_identifier(body: &str) -> Result<String> {
		decode_json::<IdentityResponse>(200, body.as_bytes()).map(|r| r.user.into_identifier())
	}

	#[test]
	fn identity_falls_back_to_id_only_when_email_is_absent() {
		assert_eq!(
			decode_identifier(r#"{"user":{"id":"U1","email":"a@b.com"}}"#)
				.expect("Email should be preferred."),
			"a@b.com"
		);
		assert_eq!(
			decode_identifier(r#"{"user":{"email":"a@b.com"}}"#)
				.expect("Email without an id should resolve."),
			"a@b.com"
		);
		assert_eq!(
			decode_identifier(r#"{"user":{"id":"U1"}}"#).expect("Missing email should use id."),
			"U1"
		);
	}

	#[test]
	fn identity_rejects_non_string_email_and_empty_user() {
		for body in [
			r#"{"user":{"id":"U1","email":null}}"#,
			r#"{"user":{"id":"U1","email":42}}"#,
			r#"{"user":{}}"#,
		] {
			let err = decode_identifier(body).expect_err("Body should be malformed.");

			assert!(matches!(err, Error::MalformedResponse { status: 200, .. }), "{body}");
		}
	}

	#[test]
	fn validate_group_accepts_everyone() {
		let provider = provider(CannedHttpClient::new(StatusCode::OK, "{}"));

		assert!(provider.validate_group("anyone@example.com"));
	}
}
