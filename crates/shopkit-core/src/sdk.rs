//! SDK facade: configuration, authentication and OAuth helpers over a [`Client`]

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use http::HeaderMap;
use serde_json::{json, Value};
use url::Url;

use crate::client::Client;
use crate::config::SdkConfig;
use crate::credential::{AccessToken, Credential};
use crate::http::transport::{ReqwestTransport, Transport};
use crate::pagination::Pager;
use crate::resource::Resource;
use crate::utils::{remove_query_params, verify_signed_request};
use crate::{Error, Result};

/// Entry point tying a configured [`Client`] to one app and shop
pub struct ShopSdk {
    config: SdkConfig,
    client: Client,
}

impl ShopSdk {
    /// Build the client for the configured shop
    ///
    /// When an app password is configured, requests are authenticated with
    /// the shared-secret credential right away.
    pub fn new(config: SdkConfig) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config.http)?;
        let endpoint = format!("https://{}", config.shop_domain);
        Self::with_transport(config, &endpoint, Arc::new(transport))
    }

    /// Load configuration from the environment
    pub fn from_env() -> Result<Self> {
        Self::new(SdkConfig::from_env()?)
    }

    /// Build against a custom endpoint and transport
    pub fn with_transport(config: SdkConfig, endpoint: &str, transport: Arc<dyn Transport>) -> Result<Self> {
        let mut client = Client::with_endpoint(endpoint, transport, config.http.clone())?;

        if let Some(password) = config.app_password.as_deref() {
            client.authenticate(Credential::shared_secret(
                config.app_key.clone(),
                config.app_secret.clone(),
                password,
            )?);
            tracing::debug!(target: "shopkit::http", shop = %config.shop_domain, "authenticated with shared secret");
        }

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }

    /// Switch to bearer-token authentication
    pub fn set_access_token(&mut self, token: impl Into<String>) -> Result<()> {
        self.client.authenticate(Credential::bearer_token(token)?);
        Ok(())
    }

    pub fn resource(&self, name: &str) -> Result<Resource<'_>> {
        Resource::new(&self.client, name)
    }

    pub fn pager(&self) -> Pager<'_> {
        Pager::new(&self.client)
    }

    /// URL the shop owner visits to grant `scopes` to the app
    pub fn authorization_url(
        &self,
        redirect_uri: &str,
        scopes: &[&str],
        state: Option<&str>,
        extra: &[(&str, &str)],
    ) -> Result<String> {
        let base = format!("{}{}/oauth/authorize", self.client.endpoint(), self.client.base_path());
        let mut url = Url::parse(&base)
            .map_err(|e| Error::invalid_argument(format!("Invalid authorization URL '{}': {}", base, e)))?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.config.app_key)
                .append_pair("scope", &scopes.join(","))
                .append_pair("redirect_uri", redirect_uri)
                .append_pair("response_type", "code");
            if let Some(state) = state {
                query.append_pair("state", state);
            }
            query.extend_pairs(extra.iter().copied());
        }

        Ok(url.to_string())
    }

    /// Whether a callback's query parameters carry a valid `hmac` for this app
    pub fn verify_signed_request(&self, params: &BTreeMap<String, String>) -> Result<bool> {
        verify_signed_request(params, &self.config.app_secret)
    }

    /// Exchange an authorization `code` for an access token
    ///
    /// `state` and `code` are stripped from `redirect_uri` before it is sent.
    pub async fn access_token_from_code(&self, redirect_uri: &str, code: &str) -> Result<AccessToken> {
        if code.is_empty() {
            return Err(Error::MissingArgument {
                required: vec!["code".to_string()],
            });
        }

        let redirect_uri = remove_query_params(redirect_uri, &["state", "code"])?;
        let params = json!({
            "client_id": self.config.app_key,
            "client_secret": self.config.app_secret,
            "code": code,
            "redirect_uri": redirect_uri,
        });

        let content = self
            .client
            .post("oauth/access_token", params, HeaderMap::new())
            .await?;

        match content.as_json().and_then(|body| body.get("access_token")) {
            Some(Value::String(token)) => AccessToken::new(token.as_str()),
            _ => Err(Error::MissingArgument {
                required: vec!["access_token".to_string()],
            }),
        }
    }

    /// Exchange `code` and authenticate later calls with the returned token
    pub async fn authenticate_with_code(&mut self, redirect_uri: &str, code: &str) -> Result<AccessToken> {
        let token = self.access_token_from_code(redirect_uri, code).await?;
        self.client
            .authenticate(Credential::from_access_token(token.clone())?);
        Ok(token)
    }
}

impl fmt::Debug for ShopSdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShopSdk")
            .field("shop_domain", &self.config.shop_domain)
            .field("app_key", &self.config.app_key)
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}
