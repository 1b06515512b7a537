//! Credentials applied to outbound requests
//!
//! Supports two schemes:
//! - Shared secret (private apps): `Authorization: Basic base64(key:password)`
//! - Bearer token (public apps): `X-Access-Token: <token>`
//!
//! Everything is validated when the credential is built; applying one to a
//! request cannot fail.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use http::header::{HeaderName, HeaderValue, AUTHORIZATION};

use crate::http::message::Request;
use crate::utils::validate_access_token;
use crate::{Error, Result};

/// Header carrying bearer tokens
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Anything able to authenticate a request
pub trait CredentialProvider: Send + Sync {
    /// Return `request` with exactly one authentication header added or replaced
    fn apply(&self, request: Request) -> Request;
}

/// A validated access token
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        validate_access_token(&token)?;
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Credential variants
#[derive(Clone)]
pub enum CredentialKind {
    /// Private app key, shared secret and password
    SharedSecret {
        key: String,
        secret: String,
        password: String,
    },
    /// Public app access token
    BearerToken(AccessToken),
}

/// A request credential with its pre-computed header value
#[derive(Clone)]
pub struct Credential {
    kind: CredentialKind,
    header: HeaderValue,
}

impl Credential {
    /// Build a shared-secret credential
    pub fn shared_secret(
        key: impl Into<String>,
        secret: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let key = key.into();
        let password = password.into();

        let mut missing = Vec::new();
        if key.is_empty() {
            missing.push("app_key".to_string());
        }
        if password.is_empty() {
            missing.push("app_password".to_string());
        }
        if !missing.is_empty() {
            return Err(Error::MissingArgument { required: missing });
        }

        let encoded = STANDARD.encode(format!("{}:{}", key, password));
        let header = sensitive(format!("Basic {}", encoded))?;

        Ok(Self {
            kind: CredentialKind::SharedSecret {
                key,
                secret: secret.into(),
                password,
            },
            header,
        })
    }

    /// Build a bearer-token credential; the token must match `[a-zA-Z0-9]{10,100}`
    pub fn bearer_token(token: impl Into<String>) -> Result<Self> {
        Self::from_access_token(AccessToken::new(token)?)
    }

    pub fn from_access_token(token: AccessToken) -> Result<Self> {
        let header = sensitive(token.as_str().to_string())?;
        Ok(Self {
            kind: CredentialKind::BearerToken(token),
            header,
        })
    }

    pub fn kind(&self) -> &CredentialKind {
        &self.kind
    }

    /// Name of the header this credential writes
    pub fn header_name(&self) -> HeaderName {
        match self.kind {
            CredentialKind::SharedSecret { .. } => AUTHORIZATION,
            CredentialKind::BearerToken(_) => HeaderName::from_static(ACCESS_TOKEN_HEADER),
        }
    }

    /// Value of the header this credential writes
    pub fn header_value(&self) -> &HeaderValue {
        &self.header
    }

    /// The access token, for bearer credentials
    pub fn access_token(&self) -> Option<&AccessToken> {
        match &self.kind {
            CredentialKind::BearerToken(token) => Some(token),
            CredentialKind::SharedSecret { .. } => None,
        }
    }
}

impl CredentialProvider for Credential {
    fn apply(&self, request: Request) -> Request {
        request.with_header(self.header_name(), self.header.clone())
    }
}

impl fmt::Debug for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialKind::SharedSecret { key, .. } => f
                .debug_struct("SharedSecret")
                .field("key", key)
                .finish_non_exhaustive(),
            CredentialKind::BearerToken(token) => f.debug_tuple("BearerToken").field(token).finish(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

fn sensitive(value: String) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(&value)
        .map_err(|e| Error::invalid_argument(format!("Invalid credential header value: {}", e)))?;
    header.set_sensitive(true);
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn request() -> Request {
        Request::parse(Method::GET, "/shop.json")
            .unwrap()
            .with_header(http::header::ACCEPT, HeaderValue::from_static("application/json"))
    }

    #[test]
    fn test_shared_secret_header() {
        let credential = Credential::shared_secret("key", "secret", "password").unwrap();
        let applied = credential.apply(request());
        // base64("key:password")
        assert_eq!(applied.header("authorization"), Some("Basic a2V5OnBhc3N3b3Jk"));
        assert_eq!(applied.header("accept"), Some("application/json"));
        assert_eq!(applied.headers().len(), 2);
    }

    #[test]
    fn test_bearer_token_header() {
        let credential = Credential::bearer_token("abcdef123456").unwrap();
        let applied = credential.apply(request());
        assert_eq!(applied.header("x-access-token"), Some("abcdef123456"));
        assert!(applied.header("authorization").is_none());
        assert_eq!(credential.access_token().unwrap().as_str(), "abcdef123456");
    }

    #[test]
    fn test_apply_replaces_existing_header() {
        let credential = Credential::bearer_token("abcdef123456").unwrap();
        let stale = request().with_header(
            HeaderName::from_static(ACCESS_TOKEN_HEADER),
            HeaderValue::from_static("oldtoken0000"),
        );
        let applied = credential.apply(stale);
        let values: Vec<_> = applied.headers().get_all(ACCESS_TOKEN_HEADER).iter().collect();
        assert_eq!(values, vec![&HeaderValue::from_static("abcdef123456")]);
    }

    #[test]
    fn test_invalid_token_rejected_at_construction() {
        let err = Credential::bearer_token("short").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert!(Credential::bearer_token("has spaces in it").is_err());
    }

    #[test]
    fn test_shared_secret_missing_parts() {
        let err = Credential::shared_secret("", "secret", "").unwrap_err();
        match err {
            Error::MissingArgument { required } => {
                assert_eq!(required, vec!["app_key".to_string(), "app_password".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_debug_hides_secrets() {
        let credential = Credential::shared_secret("key", "secret", "password").unwrap();
        let rendered = format!("{:?}", credential);
        assert!(!rendered.contains("password"));
        assert!(!rendered.contains("secret"));
    }
}
