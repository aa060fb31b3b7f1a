//! Challenge/response login and standalone message signing.

// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, TokenSecret},
	flows::{AuthOptions, Session, common, extract},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{self, DiscoveryOptions, ProviderRequest, WalletProvider},
};

const CHALLENGE: &str = "challenge";
const VERIFY: &str = "verify";

/// Wallet signing method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignMethod {
	/// `personal_sign`, params `[message, address]`.
	#[default]
	PersonalSign,
	/// `eth_sign`, params `[address, message]`.
	EthSign,
}
impl SignMethod {
	/// Returns the RPC method name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::PersonalSign => "personal_sign",
			Self::EthSign => "eth_sign",
		}
	}

	/// Builds the provider request that signs `message` with `address`.
	pub fn request(self, address: &str, message: &str) -> ProviderRequest {
		let (address, message) = (Value::from(address), Value::from(message));
		let params = match self {
			Self::PersonalSign => [message, address],
			Self::EthSign => [address, message],
		};

		ProviderRequest::new(self.as_str()).with_params(params)
	}
}
impl Display for SignMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Input for [`Session::sign_message`].
#[derive(Clone)]
pub struct SignRequest {
	/// Provider to sign with; discovered through the session registry when absent.
	pub provider: Option<Arc<dyn WalletProvider>>,
	/// Signing address; resolved from the wallet when absent.
	pub address: Option<String>,
	/// Message to sign.
	pub message: String,
	/// Signing method.
	pub method: SignMethod,
	/// Discovery settings used when no provider is supplied.
	pub discovery: DiscoveryOptions,
}
impl SignRequest {
	/// Creates a request that signs `message` with defaults for everything else.
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			provider: None,
			address: None,
			message: message.into(),
			method: SignMethod::default(),
			discovery: DiscoveryOptions::default(),
		}
	}

	/// Signs with `provider` instead of discovering one.
	pub fn with_provider(mut self, provider: Arc<dyn WalletProvider>) -> Self {
		self.provider = Some(provider);

		self
	}

	/// Signs with `address` instead of the wallet's first account.
	pub fn with_address(mut self, address: impl Into<String>) -> Self {
		self.address = Some(address.into());

		self
	}

	/// Overrides the signing method.
	pub fn with_method(mut self, method: SignMethod) -> Self {
		self.method = method;

		self
	}

	/// Overrides the discovery settings.
	pub fn with_discovery(mut self, discovery: DiscoveryOptions) -> Self {
		self.discovery = discovery;

		self
	}
}
impl Debug for SignRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignRequest")
			.field("provider_set", &self.provider.is_some())
			.field("address", &self.address)
			.field("method", &self.method)
			.finish_non_exhaustive()
	}
}

/// Input for [`Session::login`].
#[derive(Clone, Default)]
pub struct LoginRequest {
	/// Provider to sign with; discovered through the session registry when absent.
	pub provider: Option<Arc<dyn WalletProvider>>,
	/// Signing address; resolved from the wallet when absent.
	pub address: Option<String>,
	/// Method used to sign the challenge.
	pub sign_method: SignMethod,
	/// Endpoint, storage, and transport settings.
	pub options: AuthOptions,
	/// Discovery settings used when no provider is supplied.
	pub discovery: DiscoveryOptions,
}
impl LoginRequest {
	/// Signs with `provider` instead of discovering one.
	pub fn with_provider(mut self, provider: Arc<dyn WalletProvider>) -> Self {
		self.provider = Some(provider);

		self
	}

	/// Logs in as `address` instead of the wallet's first account.
	pub fn with_address(mut self, address: impl Into<String>) -> Self {
		self.address = Some(address.into());

		self
	}

	/// Overrides the signing method.
	pub fn with_sign_method(mut self, sign_method: SignMethod) -> Self {
		self.sign_method = sign_method;

		self
	}

	/// Overrides the endpoint, storage, and transport settings.
	pub fn with_options(mut self, options: AuthOptions) -> Self {
		self.options = options;

		self
	}

	/// Overrides the discovery settings.
	pub fn with_discovery(mut self, discovery: DiscoveryOptions) -> Self {
		self.discovery = discovery;

		self
	}
}
impl Debug for LoginRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginRequest")
			.field("provider_set", &self.provider.is_some())
			.field("address", &self.address)
			.field("sign_method", &self.sign_method)
			.field("options", &self.options)
			.field("discovery", &self.discovery)
			.finish()
	}
}

/// Result of a successful login.
#[derive(Clone, Debug)]
pub struct LoginOutcome {
	/// Access token issued by the verify endpoint.
	pub token: TokenSecret,
	/// Address that signed the challenge.
	pub address: String,
	/// Signature sent to the verify endpoint.
	pub signature: String,
	/// Challenge message that was signed.
	pub challenge: String,
	/// Raw verify response payload.
	pub response: Value,
}

impl Session {
	/// Signs an arbitrary message with the resolved provider and address.
	pub async fn sign_message(&self, request: &SignRequest) -> Result<String> {
		let provider = self.resolve_provider(request.provider.as_ref(), request.discovery).await?;
		let address = provider::resolve_address(provider.as_ref(), request.address.as_deref()).await?;

		sign_with(provider.as_ref(), &address, &request.message, request.method).await
	}

	/// Runs the challenge/response login and caches the issued token.
	///
	/// The address is resolved before the challenge is requested, the challenge is signed with
	/// the requested method, and the verify answer's token is written to the token store before
	/// returning.
	pub async fn login(&self, request: &LoginRequest) -> Result<LoginOutcome> {
		const KIND: FlowKind = FlowKind::Login;

		let span = FlowSpan::new(KIND, "login");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.login_inner(request)).await;

		obs::record_flow_result(KIND, &result);

		result
	}

	async fn login_inner(&self, request: &LoginRequest) -> Result<LoginOutcome> {
		let options = &request.options;
		let provider = self.resolve_provider(request.provider.as_ref(), request.discovery).await?;
		let address = provider::resolve_address(provider.as_ref(), request.address.as_deref()).await?;
		let executor = self.executor_for(options);
		let challenge_response = common::post_auth(
			executor,
			CHALLENGE,
			&options.endpoints.challenge_url(),
			Some(&serde_json::json!({ "address": address })),
			options.credentials,
		)
		.await?;
		let challenge = extract::extract_challenge(&common::parse_json(CHALLENGE, &challenge_response)?)
			.ok_or(Error::MissingField { operation: CHALLENGE, field: "challenge" })?;
		let signature = sign_with(provider.as_ref(), &address, &challenge, request.sign_method).await?;
		let verify_response = common::post_auth(
			executor,
			VERIFY,
			&options.endpoints.verify_url(),
			Some(&serde_json::json!({ "address": address, "signature": signature })),
			options.credentials,
		)
		.await?;
		let payload = common::parse_json(VERIFY, &verify_response)?;
		let token = extract::extract_token(&payload)
			.ok_or(Error::MissingField { operation: VERIFY, field: "token" })?;

		self.tokens.set(Some(TokenRecord::login(token.as_str())), &options.storage)?;

		Ok(LoginOutcome { token: token.into(), address, signature, challenge, response: payload })
	}

	async fn resolve_provider(
		&self,
		supplied: Option<&Arc<dyn WalletProvider>>,
		discovery: DiscoveryOptions,
	) -> Result<Arc<dyn WalletProvider>> {
		match supplied {
			Some(provider) => Ok(provider.clone()),
			None => Ok(self.require_provider(discovery).await?.provider),
		}
	}
}

async fn sign_with(
	provider: &dyn WalletProvider,
	address: &str,
	message: &str,
	method: SignMethod,
) -> Result<String> {
	match provider.request(method.request(address, message)).await? {
		Value::String(signature) => Ok(signature),
		_ => Err(Error::InvalidSignature),
	}
}
