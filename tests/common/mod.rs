//! Shared fixtures for the integration tests.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use httpmock::MockServer;
use parking_lot::Mutex;
use serde_json::{Value, json};
// self
use wallet_session::{
	flows::{AuthOptions, Session},
	http::ReqwestHttpClient,
	provider::{ProviderError, ProviderFuture, ProviderRequest, WalletProvider},
	store::MemoryMirror,
};

/// Scripted wallet that records every request it receives.
pub struct RecordingWallet {
	accounts: Vec<String>,
	signature: Value,
	calls: Mutex<Vec<ProviderRequest>>,
}
impl RecordingWallet {
	pub fn new(accounts: &[&str]) -> Self {
		Self {
			accounts: accounts.iter().map(|account| account.to_string()).collect(),
			signature: Value::from("0xsigned"),
			calls: Mutex::new(Vec::new()),
		}
	}

	pub fn with_signature(mut self, signature: Value) -> Self {
		self.signature = signature;

		self
	}

	pub fn calls(&self) -> Vec<ProviderRequest> {
		self.calls.lock().clone()
	}

	pub fn sign_calls(&self) -> Vec<ProviderRequest> {
		self.calls()
			.into_iter()
			.filter(|call| matches!(call.method.as_str(), "personal_sign" | "eth_sign"))
			.collect()
	}
}
impl WalletProvider for RecordingWallet {
	fn request(&self, request: ProviderRequest) -> ProviderFuture<'_> {
		let answer = match request.method.as_str() {
			"eth_accounts" | "eth_requestAccounts" => Ok(json!(self.accounts)),
			"personal_sign" | "eth_sign" => Ok(self.signature.clone()),
			other => Err(ProviderError::new(4200, format!("Unsupported method {other}"))),
		};

		self.calls.lock().push(request);

		Box::pin(async move { answer })
	}
}

pub fn session() -> Session {
	let executor = ReqwestHttpClient::new().expect("Failed to build reqwest clients for tests.");

	Session::with_executor(Arc::new(executor))
}

pub fn mirrored_session() -> (Session, Arc<MemoryMirror>) {
	let mirror = Arc::new(MemoryMirror::default());

	(session().with_mirror(mirror.clone()), mirror)
}

pub fn auth_options(server: &MockServer) -> AuthOptions {
	AuthOptions::default().with_base_url(server.url("/auth"))
}
