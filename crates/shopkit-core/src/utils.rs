//! Input validation and small URL helpers

use std::collections::BTreeMap;
use std::sync::OnceLock;

use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use sha2::Sha256;
use url::Url;

use crate::{Error, Result};

/// HTTP methods accepted by the client
pub const HTTP_METHODS: [&str; 6] = ["POST", "PUT", "PATCH", "GET", "DELETE", "HEAD"];

fn shop_domain_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([a-z0-9\-]{3,100})\.myshopify\.com$").expect("Valid regex pattern")
    })
}

fn access_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z0-9]{10,100}$").expect("Valid regex pattern"))
}

/// Check a shop domain such as `your-store.myshopify.com`
pub fn validate_shop_domain(domain: &str) -> Result<()> {
    if !shop_domain_pattern().is_match(domain) {
        return Err(Error::invalid_argument(
            "Shop name should be 3-100 letters, numbers, or hyphens e.g. your-store.myshopify.com",
        ));
    }
    Ok(())
}

/// Check an access token: 10 to 100 ASCII letters and digits
pub fn validate_access_token(token: &str) -> Result<()> {
    if !access_token_pattern().is_match(token) {
        return Err(Error::invalid_argument(
            "Access token should be between 10 and 100 letters and numbers",
        ));
    }
    Ok(())
}

/// Check an upper-case HTTP method name
pub fn validate_http_method(method: &str) -> Result<()> {
    if !HTTP_METHODS.contains(&method) {
        return Err(Error::invalid_argument(format!("Method not valid: {}", method)));
    }
    Ok(())
}

/// Random alphanumeric string, e.g. for OAuth `state` nonces
pub fn random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Drop the given query parameters from `url`
pub fn remove_query_params(url: &str, params: &[&str]) -> Result<String> {
    let mut parsed = Url::parse(url)
        .map_err(|e| Error::invalid_argument(format!("Invalid URL '{}': {}", url, e)))?;

    if parsed.query().map(str::is_empty).unwrap_or(true) {
        return Ok(parsed.to_string());
    }

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !params.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept);
    }

    Ok(parsed.to_string())
}

/// Check the `hmac` signature of a request the shop sent to the app
///
/// The message is every other parameter as `key=value`, sorted by key and
/// joined with `&`, signed with HMAC-SHA256 under the app secret. Requests
/// missing `hmac`, `shop` or `timestamp` are never valid.
pub fn verify_signed_request(params: &BTreeMap<String, String>, secret: &str) -> Result<bool> {
    if secret.is_empty() {
        return Err(Error::invalid_argument("App secret must not be empty"));
    }

    let signature = match params.get("hmac") {
        Some(signature) if params.contains_key("shop") && params.contains_key("timestamp") => signature,
        _ => return Ok(false),
    };
    let Ok(signature) = hex::decode(signature) else {
        return Ok(false);
    };

    let message = params
        .iter()
        .filter(|(key, _)| key.as_str() != "hmac")
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::invalid_argument(format!("Invalid app secret: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(mac.verify_slice(&signature).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed(pairs: &[(&str, &str)], secret: &str) -> BTreeMap<String, String> {
        let mut params: BTreeMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        let message = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(message.as_bytes());
        params.insert("hmac".to_string(), hex::encode(mac.finalize().into_bytes()));
        params
    }

    const SIGNED_FIELDS: [(&str, &str); 4] = [
        ("timestamp", "1337178173"),
        ("shop", "some-shop.myshopify.com"),
        ("code", "0907a61c0c8d55e99db179b68161bc00"),
        ("state", "0.6784241404160823"),
    ];

    #[test]
    fn test_shop_domain_validation() {
        assert!(validate_shop_domain("your-store.myshopify.com").is_ok());
        assert!(validate_shop_domain("abc.myshopify.com").is_ok());
        assert!(validate_shop_domain("ab.myshopify.com").is_err());
        assert!(validate_shop_domain("Your-Store.myshopify.com").is_err());
        assert!(validate_shop_domain("your-store.example.com").is_err());
        assert!(validate_shop_domain("").is_err());
    }

    #[test]
    fn test_access_token_validation() {
        assert!(validate_access_token("abcdefghij").is_ok());
        assert!(validate_access_token(&"a1".repeat(50)).is_ok());
        assert!(validate_access_token("short").is_err());
        assert!(validate_access_token(&"a".repeat(101)).is_err());
        assert!(validate_access_token("abcde-fghij").is_err());
    }

    #[test]
    fn test_http_method_validation() {
        for method in HTTP_METHODS {
            assert!(validate_http_method(method).is_ok());
        }
        assert!(validate_http_method("get").is_err());
        assert!(validate_http_method("TRACE").is_err());
    }

    #[test]
    fn test_random_string() {
        let value = random_string(32);
        assert_eq!(value.len(), 32);
        assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(random_string(32), value);
    }

    #[test]
    fn test_remove_query_params() {
        let url = remove_query_params(
            "https://app.test/callback?code=abc&shop=demo&state=xyz",
            &["state", "code"],
        )
        .unwrap();
        assert_eq!(url, "https://app.test/callback?shop=demo");

        let url = remove_query_params("https://app.test/callback?code=abc", &["code"]).unwrap();
        assert_eq!(url, "https://app.test/callback");

        let url = remove_query_params("https://app.test/callback", &["code"]).unwrap();
        assert_eq!(url, "https://app.test/callback");
    }

    #[test]
    fn test_signed_request_verifies() {
        let params = signed(&SIGNED_FIELDS, "hush");
        assert!(verify_signed_request(&params, "hush").unwrap());
        assert!(!verify_signed_request(&params, "other-secret").unwrap());
    }

    #[test]
    fn test_tampered_request_is_rejected() {
        let mut params = signed(&SIGNED_FIELDS, "hush");
        params.insert("shop".to_string(), "evil-shop.myshopify.com".to_string());
        assert!(!verify_signed_request(&params, "hush").unwrap());

        let mut params = signed(&SIGNED_FIELDS, "hush");
        params.insert("hmac".to_string(), "not-hex".to_string());
        assert!(!verify_signed_request(&params, "hush").unwrap());
    }

    #[test]
    fn test_signed_request_requires_shop_and_timestamp() {
        let params = signed(&[("shop", "some-shop.myshopify.com"), ("code", "abc")], "hush");
        assert!(!verify_signed_request(&params, "hush").unwrap());
        assert!(!verify_signed_request(&BTreeMap::new(), "hush").unwrap());
    }

    #[test]
    fn test_signed_request_rejects_empty_secret() {
        let params = signed(&SIGNED_FIELDS, "hush");
        let err = verify_signed_request(&params, "").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }
}
