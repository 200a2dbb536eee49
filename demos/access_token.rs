//! Issues an SDK access token through the signed client against a local mock provider and
//! prints the headers the provider would verify.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use kyb_broker::{
	auth::ProviderRequest,
	client::SignedRequestClient,
	config::ProviderConfig,
	resources::AccessTokenRequest,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/resources/accessTokens")
				.query_param("levelName", "basic-kyb-level")
				.header_exists("X-App-Access-Sig");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"token\":\"_act-demo\",\"userId\":\"empresa@example.com\"}");
		})
		.await;
	let config = ProviderConfig::builder()
		.app_token("demo-app-token")
		.secret("demo-secret")
		.base_url(server.base_url())
		.build()?;
	let client = SignedRequestClient::new(config)?;
	let request = AccessTokenRequest::new("empresa@example.com", "basic-kyb-level");
	let preview = client.sign_request(ProviderRequest::post(request.path()?))?;

	println!("Signing {} {} at {}.", preview.method, preview.path, preview.timestamp);

	for (name, value) in preview.auth_headers("demo-app-token") {
		println!("  {name}: {value}");
	}

	let token = client.access_token(&request).await?;

	println!("Issued token for {}: {token:?}.", token.user_id);

	token_mock.assert_async().await;

	Ok(())
}
