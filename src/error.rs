//! Session-level error types shared across discovery, flows, transports, and stores.

// self
use crate::_prelude::*;

/// Session-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type SharedError = Arc<dyn StdError + Send + Sync>;

/// Canonical session error exposed by public APIs.
///
/// Every variant is `Clone` so callers sharing one in-flight refresh all observe the same
/// failure.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// Token mirror failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Wallet provider rejected or failed a request.
	#[error(transparent)]
	Provider(#[from] crate::provider::ProviderError),

	/// Discovery found no usable wallet provider.
	#[error("No injected wallet provider found.")]
	NoProvider,
	/// The wallet exposed no account, even after prompting.
	#[error("No account available.")]
	NoAccount,
	/// An auth endpoint answered with a non-2xx status.
	#[error("The {operation} request failed with HTTP {status}: {body}")]
	HttpFailure {
		/// Auth operation label (`challenge`, `verify`, `refresh`, `logout`).
		operation: &'static str,
		/// HTTP status code.
		status: u16,
		/// Raw response body text.
		body: String,
	},
	/// A challenge or token could not be located in the response payload.
	#[error("The {operation} response is missing the {field}.")]
	MissingField {
		/// Auth operation label.
		operation: &'static str,
		/// Field that could not be extracted.
		field: &'static str,
	},
	/// A 2xx auth response body was not valid JSON.
	#[error("The {operation} response is not valid JSON: {message}.")]
	Decode {
		/// Auth operation label.
		operation: &'static str,
		/// Parser failure summary.
		message: String,
	},
	/// The signing request returned something other than a string.
	#[error("Invalid signature response.")]
	InvalidSignature,
	/// The balance query returned something other than a string.
	#[error("Invalid balance response.")]
	InvalidBalance,
}

/// Configuration and validation failures raised by the session.
#[derive(Clone, Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: SharedError,
	},
	/// HTTP request construction failed.
	#[error("HTTP request is invalid: {message}.")]
	InvalidRequest {
		/// Builder failure summary.
		message: String,
	},
	/// A relative request target was issued without an origin to resolve it against.
	#[error("Request target `{target}` is relative and no origin is configured.")]
	RelativeTarget {
		/// Offending target.
		target: String,
	},
	/// A request target could not be parsed as a URL.
	#[error("Request target `{target}` is not a valid URL.")]
	InvalidTarget {
		/// Offending target.
		target: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Arc::new(src) }
	}
}
impl From<::http::Error> for ConfigError {
	fn from(e: ::http::Error) -> Self {
		Self::InvalidRequest { message: e.to_string() }
	}
}

/// Transport-level failures (network, IO).
#[derive(Clone, Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {target}.")]
	Network {
		/// Request target that failed.
		target: String,
		/// Transport-specific network error.
		#[source]
		source: SharedError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(target: impl Into<String>, src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { target: target.into(), source: Arc::new(src) }
	}
}
