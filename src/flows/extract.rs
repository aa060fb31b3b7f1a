//! Challenge and token extraction from auth response envelopes.
//!
//! Servers wrap their answers differently (`{data: {...}}`, `{result: ...}`, `{body: {...}}`).
//! Each extractor is an ordered list of strategies; the first one that finds a string wins, even
//! an empty one, which callers then treat as missing. Shapes outside the lists are not accepted.

// self
use crate::_prelude::*;

type Strategy = fn(&Value) -> Option<&str>;

const CHALLENGE_STRATEGIES: [Strategy; 3] =
	[enveloped_challenge, top_level_challenge, body_result_challenge];
const TOKEN_STRATEGIES: [Strategy; 4] =
	[enveloped_token, top_level_token, body_token, body_result_token];

/// Locates the challenge message in a challenge response.
pub fn extract_challenge(payload: &Value) -> Option<String> {
	first_match(&CHALLENGE_STRATEGIES, payload)
}

/// Locates the access token in a verify or refresh response.
pub fn extract_token(payload: &Value) -> Option<String> {
	first_match(&TOKEN_STRATEGIES, payload)
}

fn first_match(strategies: &[Strategy], payload: &Value) -> Option<String> {
	strategies
		.iter()
		.find_map(|strategy| strategy(payload))
		.filter(|found| !found.is_empty())
		.map(str::to_owned)
}

fn enveloped_challenge(payload: &Value) -> Option<&str> {
	payload.get("data")?.get("challenge")?.as_str()
}

fn top_level_challenge(payload: &Value) -> Option<&str> {
	string_or_nested(first_truthy(payload, "challenge", "result")?, "challenge")
}

fn body_result_challenge(payload: &Value) -> Option<&str> {
	string_or_nested(payload.get("body")?.get("result")?, "challenge")
}

fn enveloped_token(payload: &Value) -> Option<&str> {
	payload.get("data")?.get("token")?.as_str()
}

fn top_level_token(payload: &Value) -> Option<&str> {
	first_truthy(payload, "token", "result")?.as_str()
}

fn body_token(payload: &Value) -> Option<&str> {
	payload.get("body")?.get("token")?.as_str()
}

fn body_result_token(payload: &Value) -> Option<&str> {
	string_or_nested(payload.get("body")?.get("result")?, "token")
}

// `payload[primary] || payload[fallback]`.
fn first_truthy<'a>(payload: &'a Value, primary: &str, fallback: &str) -> Option<&'a Value> {
	payload.get(primary).filter(|value| is_truthy(value)).or_else(|| payload.get(fallback))
}

fn string_or_nested<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
	match value {
		Value::String(found) => Some(found),
		other => other.get(field)?.as_str(),
	}
}

fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(flag) => *flag,
		Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
		Value::String(text) => !text.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}
