#![cfg(feature = "reqwest")]

mod common;

// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use wallet_session::{
	flows::FetchOptions,
	http::HttpRequest,
	http_types::{Request, StatusCode, header::AUTHORIZATION},
	store::StoreOptions,
};

fn get(url: String) -> HttpRequest {
	Request::get(url).body(Vec::new()).expect("Fixture request should build.")
}

#[tokio::test]
async fn unauthorized_refreshes_once_and_retries_with_new_token() -> color_eyre::Result<()> {
	let server = MockServer::start_async().await;
	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile").header("authorization", "Bearer stale");
			then.status(401).body("expired");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200).json_body(json!({ "token": "fresh" }));
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile").header("authorization", "Bearer fresh");
			then.status(200).json_body(json!({ "name": "alice" }));
		})
		.await;
	let session = common::session();

	session.set_access_token(Some("stale"), &StoreOptions::default())?;

	let options = FetchOptions::default().with_auth(common::auth_options(&server));
	let response = session.auth_fetch(get(server.url("/profile")), &options).await?;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(
		serde_json::from_slice::<serde_json::Value>(response.body())?,
		json!({ "name": "alice" })
	);

	stale.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;
	fresh.assert_calls_async(1).await;

	Ok(())
}

#[tokio::test]
async fn disabled_retry_returns_401_untouched() {
	let server = MockServer::start_async().await;
	let resource = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile");
			then.status(401).body("expired");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200).json_body(json!({ "token": "fresh" }));
		})
		.await;
	let session = common::session();
	let options = FetchOptions::default()
		.with_auth(common::auth_options(&server))
		.with_retry_on_unauthorized(false)
		.with_access_token("stale");
	let response = session
		.auth_fetch(get(server.url("/profile")), &options)
		.await
		.expect("A 401 is a response, not an error.");

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(response.body(), b"expired");

	resource.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;
}

#[tokio::test]
async fn failed_refresh_returns_the_original_401() {
	let server = MockServer::start_async().await;
	let resource = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile");
			then.status(401).body("expired");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(403).body("no session");
		})
		.await;
	let session = common::session();
	let options = FetchOptions::default().with_auth(common::auth_options(&server));
	let response = session
		.auth_fetch(get(server.url("/profile")), &options)
		.await
		.expect("Refresh failures should be absorbed.");

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(response.body(), b"expired");

	resource.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;
}

#[tokio::test]
async fn explicit_authorization_header_wins() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/admin").header("authorization", "Basic YWRtaW46YWRtaW4=");
			then.status(204);
		})
		.await;
	let session = common::session();

	session
		.set_access_token(Some("cached"), &StoreOptions::default())
		.expect("Set should succeed.");

	let request = Request::get(server.url("/admin"))
		.header(AUTHORIZATION, "Basic YWRtaW46YWRtaW4=")
		.body(Vec::new())
		.expect("Fixture request should build.");
	let response = session
		.auth_fetch(request, &FetchOptions::default().with_auth(common::auth_options(&server)))
		.await
		.expect("Request should be sent.");

	assert_eq!(response.status(), StatusCode::NO_CONTENT);

	mock.assert_async().await;
}

#[tokio::test]
async fn no_token_means_no_authorization_header() {
	let server = MockServer::start_async().await;
	let bearer = server
		.mock_async(|when, then| {
			when.method(GET).path("/public").header_exists("authorization");
			then.status(400);
		})
		.await;
	let public = server
		.mock_async(|when, then| {
			when.method(GET).path("/public");
			then.status(200);
		})
		.await;
	let session = common::session();
	let response = session
		.auth_fetch(
			get(server.url("/public")),
			&FetchOptions::default().with_auth(common::auth_options(&server)),
		)
		.await
		.expect("Request should be sent.");

	assert_eq!(response.status(), StatusCode::OK);

	bearer.assert_calls_async(0).await;
	public.assert_calls_async(1).await;
}
