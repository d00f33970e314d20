//! Crate-level error types shared by providers, the HTTP layer, and config loading.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Callers authenticating a user should treat every variant returned from
/// [`Provider::email_address`](crate::provider::Provider::email_address) as a failed
/// login; there is no partial-success mode.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The outbound identity request could not be built.
	#[error("Identity request could not be constructed.")]
	RequestConstruction {
		/// Underlying request builder failure.
		#[source]
		source: oauth2::http::Error,
	},
	/// Network failure or unsuccessful HTTP status from the provider.
	#[error(transparent)]
	RequestExecution(#[from] RequestExecutionError),
	/// Response body did not match the expected JSON shape.
	#[error("Identity endpoint returned a malformed response (status {status}).")]
	MalformedResponse {
		/// HTTP status code of the response.
		status: u16,
		/// Structured parsing failure, including the offending JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// OAuth client identifier is missing.
	#[error("Missing setting: client-id.")]
	MissingClientId,
	/// OAuth client secret is missing.
	#[error("Missing setting: client-secret.")]
	MissingClientSecret,
	/// A configured endpoint could not be parsed as a URL.
	#[error("Setting `{field}` is not a valid URL.")]
	InvalidUrl {
		/// Name of the offending setting.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The requested provider has no adapter in this crate.
	#[error("Provider `{name}` is not supported.")]
	UnsupportedProvider {
		/// Provider name as supplied by configuration.
		name: String,
	},
}

/// Failures raised while executing the identity request.
#[derive(Debug, ThisError)]
pub enum RequestExecutionError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the identity endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the identity endpoint.")]
	Io(#[from] std::io::Error),
	/// Provider answered with a non-success status.
	#[error("Identity endpoint returned HTTP {status}: {body_preview}")]
	Status {
		/// HTTP status code returned by the provider.
		status: u16,
		/// Leading slice of the response body for diagnostics.
		body_preview: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
}
impl RequestExecutionError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
