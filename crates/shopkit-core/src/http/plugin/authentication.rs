use std::sync::Arc;

use async_trait::async_trait;

use super::{Next, Plugin};
use crate::credential::CredentialProvider;
use crate::http::message::{Request, Response};
use crate::Result;

/// Applies a credential to every request
#[derive(Clone)]
pub struct Authentication {
    credential: Arc<dyn CredentialProvider>,
}

impl Authentication {
    pub fn new(credential: impl CredentialProvider + 'static) -> Self {
        Self {
            credential: Arc::new(credential),
        }
    }

    pub fn from_provider(credential: Arc<dyn CredentialProvider>) -> Self {
        Self { credential }
    }
}

#[async_trait]
impl Plugin for Authentication {
    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response> {
        next.run(self.credential.apply(request)).await
    }
}
