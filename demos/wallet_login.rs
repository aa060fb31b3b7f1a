//! Demonstrates a full wallet session against a mock auth API: discovery through an in-process
//! host, challenge/response login, a bearer-injected request that survives a 401, and logout.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::{Value, json};
// self
use wallet_session::{
	flows::{AuthOptions, FetchOptions, LoginRequest, Session},
	http::ReqwestHttpClient,
	http_types::Request,
	provider::{
		DiscoveryOptions, LocalHost, PREFERRED_RDNS, ProviderCandidate, ProviderError,
		ProviderFuture, ProviderInfo, ProviderRegistry, ProviderRequest, WalletProvider,
	},
	store::FileMirror,
};

struct DemoWallet;
impl WalletProvider for DemoWallet {
	fn request(&self, request: ProviderRequest) -> ProviderFuture<'_> {
		Box::pin(async move {
			match request.method.as_str() {
				"eth_accounts" => Ok(json!(["0x52908400098527886E0F7030069857D2E4169EE7"])),
				"personal_sign" => Ok(Value::from("0xdemo-signature")),
				other => Err(ProviderError::new(4200, format!("{other} is not supported"))),
			}
		})
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/public/auth/challenge");
			then.status(200).json_body(json!({ "data": { "challenge": "Sign in to demo: 4f1c" } }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/public/auth/verify");
			then.status(200).json_body(json!({ "data": { "token": "demo-expired" } }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/public/auth/refresh");
			then.status(200).json_body(json!({ "data": { "token": "demo-fresh" } }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/public/auth/logout");
			then.status(200).json_body(json!({ "ok": true }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/profile").header("authorization", "Bearer demo-expired");
			then.status(401);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/profile").header("authorization", "Bearer demo-fresh");
			then.status(200).json_body(json!({ "name": "demo" }));
		})
		.await;

	let host = LocalHost::default();

	host.register(ProviderCandidate::new(
		Arc::new(DemoWallet),
		ProviderInfo::new("YeYing Wallet", PREFERRED_RDNS),
	));

	let origin = server.base_url().parse()?;
	let mirror = FileMirror::open(std::env::temp_dir().join("wallet-session-demo.json"))?;
	let session = Session::with_executor(Arc::new(ReqwestHttpClient::new()?.with_origin(origin)))
		.with_mirror(Arc::new(mirror))
		.with_registry(ProviderRegistry::new(Arc::new(host)));
	let login = session
		.login(&LoginRequest::default().with_discovery(DiscoveryOptions::default()))
		.await?;

	println!("Signed `{}` as {}.", login.challenge, login.address);

	let profile = session
		.auth_fetch(Request::get("/api/v1/profile").body(Vec::new())?, &FetchOptions::default())
		.await?;

	println!("Profile answered {} after one refresh.", profile.status());

	session.logout(&AuthOptions::default()).await?;

	let remaining = session.access_token(&Default::default())?;

	println!("Logged out; cached token present: {}.", remaining.is_some());

	Ok(())
}
