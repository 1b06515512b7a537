//! Configuration for the HTTP layer and the SDK facade
//!
//! Values come from code or from the environment (optionally seeded by a
//! `.env` file).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::utils::validate_shop_domain;
use crate::{Error, Result};

/// Environment variable holding the app key
pub const APP_KEY_ENV_NAME: &str = "SHOPKIT_APP_KEY";
/// Environment variable holding the app secret
pub const APP_SECRET_ENV_NAME: &str = "SHOPKIT_APP_SECRET";
/// Environment variable holding the private app password
pub const APP_PASSWORD_ENV_NAME: &str = "SHOPKIT_APP_PASSWORD";
/// Environment variable holding the shop domain
pub const SHOP_DOMAIN_ENV_NAME: &str = "SHOPKIT_SHOP_DOMAIN";

/// HTTP layer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Total time allowed for one transport round-trip
    pub request_timeout: Duration,
    /// Time allowed to establish a connection
    pub connect_timeout: Duration,
    /// Whether to validate TLS certificates
    pub validate_tls: bool,
    /// Automatic retries for one logical call
    pub retries: u32,
    /// Redirect hops followed before giving up
    pub max_redirects: usize,
    /// Value of the default `User-Agent` header
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            validate_tls: true,
            retries: 1,
            max_redirects: 10,
            user_agent: format!("shopkit/{}", crate::VERSION),
        }
    }
}

impl HttpConfig {
    /// Set the number of automatic retries
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout.is_zero() {
            return Err(Error::configuration("Connect timeout cannot be zero"));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::configuration("Request timeout cannot be zero"));
        }

        if self.request_timeout < self.connect_timeout {
            return Err(Error::configuration(
                "Request timeout should be >= connect timeout",
            ));
        }

        if self.user_agent.trim().is_empty() {
            return Err(Error::configuration("User agent cannot be empty"));
        }

        Ok(())
    }
}

/// Settings for [`crate::ShopSdk`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdkConfig {
    pub app_key: String,
    pub app_secret: String,
    /// Present for private apps; enables shared-secret authentication
    #[serde(default)]
    pub app_password: Option<String>,
    /// e.g. `your-store.myshopify.com`
    pub shop_domain: String,
    #[serde(default)]
    pub http: HttpConfig,
}

impl SdkConfig {
    pub fn new(
        app_key: impl Into<String>,
        app_secret: impl Into<String>,
        shop_domain: impl Into<String>,
    ) -> Self {
        Self {
            app_key: app_key.into(),
            app_secret: app_secret.into(),
            app_password: None,
            shop_domain: shop_domain.into(),
            http: HttpConfig::default(),
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.app_password = Some(password.into());
        self
    }

    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Load from the environment, reading a `.env` file first when present
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let app_key = read(APP_KEY_ENV_NAME).ok_or_else(|| {
            Error::configuration(format!(
                "Required \"app_key\" not supplied and could not find environment variable \"{}\"",
                APP_KEY_ENV_NAME
            ))
        })?;
        let app_secret = read(APP_SECRET_ENV_NAME).ok_or_else(|| {
            Error::configuration(format!(
                "Required \"app_secret\" not supplied and could not find environment variable \"{}\"",
                APP_SECRET_ENV_NAME
            ))
        })?;
        let shop_domain = read(SHOP_DOMAIN_ENV_NAME).ok_or_else(|| {
            Error::configuration(format!(
                "Required \"shop_domain\" not supplied and could not find environment variable \"{}\"",
                SHOP_DOMAIN_ENV_NAME
            ))
        })?;

        let config = Self {
            app_key,
            app_secret,
            app_password: read(APP_PASSWORD_ENV_NAME),
            shop_domain,
            http: HttpConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.app_key.is_empty() {
            return Err(Error::configuration("Required \"app_key\" is empty"));
        }
        if self.app_secret.is_empty() {
            return Err(Error::configuration("Required \"app_secret\" is empty"));
        }
        if self.shop_domain.is_empty() {
            return Err(Error::configuration("Required \"shop_domain\" is empty"));
        }
        validate_shop_domain(&self.shop_domain)?;
        self.http.validate()
    }
}
