//! Host and base-path normalization

use async_trait::async_trait;
use http::uri::{Authority, Scheme};
use http::Uri;

use super::{Next, Plugin};
use crate::http::message::{Request, Response};
use crate::{Error, Result};

/// Points requests at the shop endpoint
///
/// Requests without a host always get the endpoint's scheme and authority.
/// With `force`, requests that already name a host are re-targeted too.
#[derive(Debug, Clone)]
pub struct ShopDomain {
    scheme: Scheme,
    authority: Authority,
    force: bool,
}

impl ShopDomain {
    /// `endpoint` must carry a scheme and a host, e.g. `https://demo-shop.myshopify.com`
    pub fn new(endpoint: &str, force: bool) -> Result<Self> {
        let uri = endpoint
            .parse::<Uri>()
            .map_err(|e| Error::invalid_argument(format!("Invalid endpoint '{}': {}", endpoint, e)))?;
        let parts = uri.into_parts();
        match (parts.scheme, parts.authority) {
            (Some(scheme), Some(authority)) => Ok(Self {
                scheme,
                authority,
                force,
            }),
            _ => Err(Error::invalid_argument(format!(
                "Endpoint '{}' must include a scheme and host",
                endpoint
            ))),
        }
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Apply the rewrite without running a chain
    pub fn rewrite(&self, request: Request) -> Result<Request> {
        if self.force || !request.has_host() {
            return request.with_origin(self.scheme.clone(), self.authority.clone());
        }
        Ok(request)
    }
}

#[async_trait]
impl Plugin for ShopDomain {
    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response> {
        let request = self.rewrite(request)?;
        next.run(request).await
    }
}

/// Prefixes a base path unless the path already starts with it
#[derive(Debug, Clone)]
pub struct PathPrepend {
    base: String,
}

impl PathPrepend {
    /// `base` is normalized to a leading slash and no trailing slash
    pub fn new(base: &str) -> Self {
        let trimmed = base.trim_matches('/');
        let base = if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        };
        Self { base }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Whether `path` already lives under the base path
    pub fn is_prefixed(&self, path: &str) -> bool {
        self.base.is_empty()
            || path == self.base
            || path
                .strip_prefix(self.base.as_str())
                .map(|rest| rest.starts_with('/'))
                .unwrap_or(false)
    }

    /// Apply the rewrite without running a chain
    pub fn rewrite(&self, request: Request) -> Result<Request> {
        let path = request.uri().path().to_string();
        if self.is_prefixed(&path) {
            return Ok(request);
        }

        let prefixed = if path.starts_with('/') {
            format!("{}{}", self.base, path)
        } else {
            format!("{}/{}", self.base, path)
        };
        request.with_path(&prefixed)
    }
}

#[async_trait]
impl Plugin for PathPrepend {
    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response> {
        let request = self.rewrite(request)?;
        next.run(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use proptest::prelude::*;

    fn get(uri: &str) -> Request {
        Request::parse(Method::GET, uri).unwrap()
    }

    #[test]
    fn test_relative_request_gets_endpoint() {
        let domain = ShopDomain::new("https://demo-shop.myshopify.com", false).unwrap();
        let request = domain.rewrite(get("/admin/shop.json?fields=id")).unwrap();
        assert_eq!(
            request.uri().to_string(),
            "https://demo-shop.myshopify.com/admin/shop.json?fields=id"
        );
    }

    #[test]
    fn test_existing_host_kept_unless_forced() {
        let keep = ShopDomain::new("https://demo-shop.myshopify.com", false).unwrap();
        let force = ShopDomain::new("http://127.0.0.1:8080", true).unwrap();
        let request = get("https://other.example/admin/shop.json");

        assert_eq!(
            keep.rewrite(request.clone()).unwrap().uri().to_string(),
            "https://other.example/admin/shop.json"
        );
        assert_eq!(
            force.rewrite(request).unwrap().uri().to_string(),
            "http://127.0.0.1:8080/admin/shop.json"
        );
    }

    #[test]
    fn test_endpoint_requires_host() {
        assert!(ShopDomain::new("/admin", false).is_err());
        assert!(ShopDomain::new("not a uri", false).is_err());
    }

    #[test]
    fn test_path_prepend() {
        let prepend = PathPrepend::new("admin/");
        assert_eq!(prepend.base(), "/admin");
        let request = prepend.rewrite(get("https://x.test/products.json?limit=5")).unwrap();
        assert_eq!(request.uri().to_string(), "https://x.test/admin/products.json?limit=5");
    }

    #[test]
    fn test_path_prepend_is_segment_aware() {
        let prepend = PathPrepend::new("/admin");
        assert!(prepend.is_prefixed("/admin"));
        assert!(prepend.is_prefixed("/admin/shop.json"));
        assert!(!prepend.is_prefixed("/administrators.json"));
        let request = prepend.rewrite(get("https://x.test/administrators.json")).unwrap();
        assert_eq!(request.uri().path(), "/admin/administrators.json");
    }

    proptest! {
        #[test]
        fn prop_shop_domain_is_idempotent(
            host in "[a-z]{1,12}\\.(test|example|com)",
            path in "(/[a-z0-9]{1,8}){0,4}",
            force in any::<bool>(),
        ) {
            let domain = ShopDomain::new("https://demo-shop.myshopify.com", force).unwrap();
            let request = get(&format!("https://{}{}", host, path));
            let once = domain.rewrite(request).unwrap();
            let twice = domain.rewrite(once.clone()).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_path_prepend_is_idempotent(
            base in "(/[a-z]{1,6}){1,2}",
            path in "(/[a-z0-9]{1,8}){0,4}",
        ) {
            let prepend = PathPrepend::new(&base);
            let request = get(&format!("https://x.test{}", path));
            let once = prepend.rewrite(request).unwrap();
            let twice = prepend.rewrite(once.clone()).unwrap();
            prop_assert!(prepend.is_prefixed(once.uri().path()));
            prop_assert_eq!(once, twice);
        }
    }
}
