//! Token record model and its mirror encoding.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// How the cached token came to exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSource {
	/// Issued by the verify step of a challenge/response login.
	Login,
	/// Issued by the refresh endpoint.
	Refresh,
	/// Supplied directly by the application or restored from a bare mirror value.
	Provided,
}
impl TokenSource {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Login => "login",
			Self::Refresh => "refresh",
			Self::Provided => "provided",
		}
	}
}
impl Display for TokenSource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Access token held by a session together with its provenance.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
	/// Bearer credential; callers must avoid logging it.
	pub token: TokenSecret,
	/// Flow that produced the token.
	pub issued_via: TokenSource,
	/// Instant the record was created locally.
	#[serde(with = "time::serde::rfc3339")]
	pub issued_at: OffsetDateTime,
}
impl TokenRecord {
	/// Creates a record stamped with the current clock.
	pub fn new(token: impl Into<TokenSecret>, issued_via: TokenSource) -> Self {
		Self { token: token.into(), issued_via, issued_at: OffsetDateTime::now_utc() }
	}

	/// Shorthand for a record produced by the verify step.
	pub fn login(token: impl Into<TokenSecret>) -> Self {
		Self::new(token, TokenSource::Login)
	}

	/// Shorthand for a record produced by the refresh endpoint.
	pub fn refresh(token: impl Into<TokenSecret>) -> Self {
		Self::new(token, TokenSource::Refresh)
	}

	/// Shorthand for a record handed in by the application.
	pub fn provided(token: impl Into<TokenSecret>) -> Self {
		Self::new(token, TokenSource::Provided)
	}

	/// Returns the raw token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		self.token.expose()
	}

	/// Encodes the record for a durable mirror slot.
	pub fn to_mirror_value(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string(self)
	}

	/// Decodes a mirror slot value.
	///
	/// Slots written by other clients hold the bare token string; those decode as
	/// [`TokenSource::Provided`]. Empty values decode to `None`.
	pub fn from_mirror_value(raw: &str) -> Option<Self> {
		if raw.is_empty() {
			return None;
		}

		match serde_json::from_str::<Self>(raw) {
			Ok(record) if !record.token.is_empty() => Some(record),
			Ok(_) => None,
			Err(_) => Some(Self::provided(raw)),
		}
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("token", &"<redacted>")
			.field("issued_via", &self.issued_via)
			.field("issued_at", &self.issued_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn mirror_encoding_keeps_provenance() {
		let record = TokenRecord {
			token: TokenSecret::new("jwt-1"),
			issued_via: TokenSource::Refresh,
			issued_at: macros::datetime!(2025-01-01 00:00 UTC),
		};
		let encoded = record.to_mirror_value().expect("Record should encode for the mirror.");
		let decoded =
			TokenRecord::from_mirror_value(&encoded).expect("Encoded record should decode.");

		assert_eq!(decoded, record);
	}

	#[test]
	fn bare_mirror_values_decode_as_provided() {
		let decoded = TokenRecord::from_mirror_value("eyJhbGciOi.payload.sig")
			.expect("Bare tokens should decode.");

		assert_eq!(decoded.expose(), "eyJhbGciOi.payload.sig");
		assert_eq!(decoded.issued_via, TokenSource::Provided);
		assert!(TokenRecord::from_mirror_value("").is_none());
	}

	#[test]
	fn debug_output_redacts_token() {
		let record = TokenRecord::login("very-secret");

		assert!(!format!("{record:?}").contains("very-secret"));
	}
}
