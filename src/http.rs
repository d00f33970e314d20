//! Transport primitives for provider identity lookups.
//!
//! The module exposes [`IdentityHttpClient`], the crate's only dependency on an HTTP
//! stack, and [`request_json`], the shared helper that executes a request, rejects
//! non-success statuses, and decodes the JSON body into a typed response. Providers
//! build an [`HttpRequest`] and hand it to [`request_json`]; they never touch sockets.

// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
	http::{HeaderMap, header::RETRY_AFTER},
};
use serde::de::DeserializeOwned;
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::RequestExecutionError};

const BODY_PREVIEW_LEN: usize = 256;

/// Abstraction over HTTP transports capable of executing provider identity requests.
///
/// Callers provide an implementation (typically behind `Arc<T>`) and providers request
/// short-lived [`AsyncHttpClient`] handles from it for each lookup. Implementations must be
/// `Send + Sync + 'static` so one transport can back every provider in the process, and the
/// futures returned by their handles must be `Send` so lookups can hop executors.
pub trait IdentityHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle used for a single lookup.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds a handle for the next request.
	fn handle(&self) -> Self::Handle;
}

/// Executes `request` and decodes a successful JSON body into `T`.
///
/// - Transport failures map to [`Error::RequestExecution`] (or
///   [`Error::RequestConstruction`] when the transport rejects the request shape).
/// - Any non-2xx status maps to [`RequestExecutionError::Status`] with a short body preview.
/// - Bodies that do not decode into `T` map to [`Error::MalformedResponse`].
pub async fn request_json<C, T>(client: &C, request: HttpRequest) -> Result<T>
where
	C: ?Sized + IdentityHttpClient,
	T: DeserializeOwned,
{
	let handle = client.handle();
	let response = handle.call(request).await.map_err(map_transport_error)?;
	let status = response.status();

	if !status.is_success() {
		return Err(RequestExecutionError::Status {
			status: status.as_u16(),
			body_preview: body_preview(response.body()),
			retry_after: parse_retry_after(response.headers()),
		}
		.into());
	}

	decode_json(status.as_u16(), response.body())
}

pub(crate) fn decode_json<T>(status: u16, body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::MalformedResponse { status, source })
}

/// Converts an [`HttpClientError`] emitted by a transport into a crate [`Error`].
pub fn map_transport_error<E>(err: HttpClientError<E>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => RequestExecutionError::network(*inner).into(),
		HttpClientError::Http(source) => Error::RequestConstruction { source },
		HttpClientError::Io(inner) => RequestExecutionError::Io(inner).into(),
		HttpClientError::Other(message) =>
			RequestExecutionError::Network { source: message.into() }.into(),
		_ => RequestExecutionError::Network { source: "Unknown transport failure.".into() }.into(),
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// No timeout is configured here; pass a customized client through
/// [`ReqwestHttpClient::with_client`] to bound lookups.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl std::ops::Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl IdentityHttpClient for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn handle(&self) -> Self::Handle {
		ReqwestHandle(self.0.clone())
	}
}

/// Handle returned by [`ReqwestHttpClient`] that satisfies [`IdentityHttpClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHandle(ReqwestClient);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

fn body_preview(body: &[u8]) -> String {
	String::from_utf8_lossy(body).chars().take(BODY_PREVIEW_LEN).collect()
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return i64::try_from(secs).ok().map(Duration::seconds);
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::HeaderValue;
	// self
	use super::*;

	#[derive(Debug, Deserialize)]
	struct Envelope {
		user: EnvelopeUser,
	}
	#[derive(Debug, Deserialize)]
	struct EnvelopeUser {
		id: String,
	}

	#[test]
	fn decode_json_reports_missing_path() {
		let err = decode_json::<Envelope>(200, br#"{"user":{}}"#)
			.expect_err("Missing nested fields should be malformed.");

		match err {
			Error::MalformedResponse { status, source } => {
				assert_eq!(status, 200);
				assert!(source.path().to_string().contains("user"));
			},
			other => panic!("Unexpected error: {other:?}."),
		}

		let envelope = decode_json::<Envelope>(200, br#"{"user":{"id":"U1"}}"#)
			.expect("Well-formed payloads should decode.");

		assert_eq!(envelope.user.id, "U1");
	}

	#[test]
	fn retry_after_accepts_delta_seconds() {
		let mut headers = HeaderMap::new();

		assert_eq!(parse_retry_after(&headers), None);

		headers.insert(RETRY_AFTER, HeaderValue::from_static("30"));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(30)));

		headers.insert(RETRY_AFTER, HeaderValue::from_static("18446744073709551615"));

		assert_eq!(parse_retry_after(&headers), None);

		headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));

		assert_eq!(parse_retry_after(&headers), None);
	}

	#[test]
	fn body_preview_is_bounded() {
		let long = "x".repeat(BODY_PREVIEW_LEN * 2);

		assert_eq!(body_preview(long.as_bytes()).len(), BODY_PREVIEW_LEN);
		assert_eq!(body_preview(b"not found"), "not found");
	}

	#[test]
	fn rejected_request_shapes_are_construction_failures() {
		let source = oauth2::http::Request::builder()
			.method("NOT A METHOD")
			.body(Vec::<u8>::new())
			.expect_err("Methods with spaces should be rejected.");
		let err = map_transport_error::<std::io::Error>(HttpClientError::Http(source));

		assert!(matches!(err, Error::RequestConstruction { .. }));
	}

	#[test]
	fn other_transport_errors_are_execution_failures() {
		let err = map_transport_error::<std::io::Error>(HttpClientError::Other("boom".into()));

		assert!(matches!(err, Error::RequestExecution(RequestExecutionError::Network { .. })));
	}
}
