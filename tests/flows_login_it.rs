#![cfg(feature = "reqwest")]

mod common;

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use common::RecordingWallet;
use wallet_session::{
	auth::TokenSource,
	error::Error,
	flows::{LoginRequest, SignMethod, SignRequest},
	store::{DEFAULT_TOKEN_KEY, StoreOptions, TokenMirror},
};

#[tokio::test]
async fn login_signs_challenge_and_caches_token() -> color_eyre::Result<()> {
	let server = MockServer::start_async().await;
	let challenge = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/challenge")
				.header("content-type", "application/json")
				.header("accept", "application/json")
				.json_body(json!({ "address": "0xAA" }));
			then.status(200).json_body(json!({ "data": { "challenge": "abc123" } }));
		})
		.await;
	let verify = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/verify")
				.json_body(json!({ "address": "0xAA", "signature": "0xsigned" }));
			then.status(200).json_body(json!({ "body": { "result": { "token": "issued" } } }));
		})
		.await;
	let (session, mirror) = common::mirrored_session();
	let wallet = Arc::new(RecordingWallet::new(&["0xAA"]));
	let outcome = session
		.login(
			&LoginRequest::default()
				.with_provider(wallet.clone())
				.with_options(common::auth_options(&server)),
		)
		.await?;

	assert_eq!(outcome.token.expose(), "issued");
	assert_eq!(outcome.address, "0xAA");
	assert_eq!(outcome.challenge, "abc123");
	assert_eq!(outcome.signature, "0xsigned");
	assert_eq!(outcome.response, json!({ "body": { "result": { "token": "issued" } } }));
	assert_eq!(
		wallet.sign_calls().into_iter().map(|call| call.params).collect::<Vec<_>>(),
		vec![Some(json!(["abc123", "0xAA"]))]
	);

	let cached = session.tokens.get(&StoreOptions::default())?.expect("Login should cache the token.");

	assert_eq!(cached.expose(), "issued");
	assert_eq!(cached.issued_via, TokenSource::Login);
	assert!(mirror.read(DEFAULT_TOKEN_KEY)?.is_some());

	challenge.assert_calls_async(1).await;
	verify.assert_calls_async(1).await;

	Ok(())
}

#[tokio::test]
async fn eth_sign_puts_address_first() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/challenge");
			then.status(200).json_body(json!({ "challenge": "abc123" }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/verify");
			then.status(200).json_body(json!({ "token": "t" }));
		})
		.await;

	let session = common::session();
	let wallet = Arc::new(RecordingWallet::new(&["0xAA"]));

	session
		.login(
			&LoginRequest::default()
				.with_provider(wallet.clone())
				.with_sign_method(SignMethod::EthSign)
				.with_options(common::auth_options(&server)),
		)
		.await
		.expect("Login with eth_sign should succeed.");

	let calls = wallet.sign_calls();

	assert_eq!(calls.len(), 1);
	assert_eq!(calls[0].method, "eth_sign");
	assert_eq!(calls[0].params, Some(json!(["0xAA", "abc123"])));
}

#[tokio::test]
async fn challenge_failure_reports_status_and_body() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/challenge");
			then.status(503).body("maintenance");
		})
		.await;

	let session = common::session();
	let wallet = Arc::new(RecordingWallet::new(&["0xAA"]));
	let err = session
		.login(
			&LoginRequest::default()
				.with_provider(wallet.clone())
				.with_options(common::auth_options(&server)),
		)
		.await
		.expect_err("A 503 challenge answer should fail the login.");

	assert!(matches!(
		&err,
		Error::HttpFailure { operation: "challenge", status: 503, body } if body == "maintenance"
	));
	assert!(wallet.sign_calls().is_empty());
}

#[tokio::test]
async fn missing_challenge_and_token_are_reported() {
	let server = MockServer::start_async().await;
	let mut challenge = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/challenge");
			then.status(200).json_body(json!({ "message": "no challenge here" }));
		})
		.await;
	let session = common::session();
	let wallet: Arc<RecordingWallet> = Arc::new(RecordingWallet::new(&["0xAA"]));
	let request = LoginRequest::default()
		.with_provider(wallet.clone())
		.with_options(common::auth_options(&server));
	let err = session.login(&request).await.expect_err("Missing challenge should fail.");

	assert!(matches!(err, Error::MissingField { operation: "challenge", field: "challenge" }));

	challenge.delete_async().await;
	challenge = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/challenge");
			then.status(200).json_body(json!({ "result": "abc123" }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/verify");
			then.status(200).json_body(json!({ "result": { "token": "not-accepted-here" } }));
		})
		.await;

	let err = session.login(&request).await.expect_err("Missing token should fail.");

	assert!(matches!(err, Error::MissingField { operation: "verify", field: "token" }));
	assert!(session.access_token(&StoreOptions::default()).expect("Read should succeed.").is_none());

	challenge.assert_calls_async(1).await;
}

#[tokio::test]
async fn non_string_signature_is_rejected() {
	let session = common::session();
	let wallet = Arc::new(RecordingWallet::new(&["0xAA"]).with_signature(json!({ "r": "0x1" })));
	let err = session
		.sign_message(&SignRequest::new("hello").with_provider(wallet))
		.await
		.expect_err("Object signatures should be rejected.");

	assert!(matches!(err, Error::InvalidSignature));
}

#[tokio::test]
async fn login_without_accounts_fails_before_any_request() {
	let server = MockServer::start_async().await;
	let challenge = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/challenge");
			then.status(200).json_body(json!({ "challenge": "abc123" }));
		})
		.await;
	let session = common::session();
	let wallet = Arc::new(RecordingWallet::new(&[]));
	let err = session
		.login(
			&LoginRequest::default()
				.with_provider(wallet.clone())
				.with_options(common::auth_options(&server)),
		)
		.await
		.expect_err("A wallet without accounts cannot log in.");

	assert!(matches!(err, Error::NoAccount));
	assert_eq!(
		wallet.calls().into_iter().map(|call| call.method).collect::<Vec<_>>(),
		["eth_accounts", "eth_requestAccounts"]
	);

	challenge.assert_calls_async(0).await;
}
