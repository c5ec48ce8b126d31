//! Resolves the bearer token a pod would authenticate with.
//!
//! The chain is pod -> service account -> token secret -> decoded token.
//! Every step short-circuits with a [`ResolveError`] so callers can degrade
//! uniformly instead of aborting.

use crate::kubernetes::{
    ApiError, Transport, pod_path, secret_path, service_account_path, service_account_token_path,
};
use crate::types::{BearerToken, Settings};
use base64::{Engine, engine};
use http::Method;
use k8s_openapi::api::authentication::v1::{TokenRequest, TokenRequestSpec};
use k8s_openapi::api::core::v1::{Pod, ServiceAccount};
use serde_json::Value;
use tracing::debug;

/// Lifetime requested for fallback tokens; the API server minimum.
const TOKEN_REQUEST_EXPIRATION_SECS: i64 = 600;

#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    #[error("no service account")]
    NoServiceAccount,

    #[error("no secret")]
    NoSecret,

    #[error("no token")]
    NoToken,

    #[error("unexpected response payload")]
    Payload(#[from] serde_json::Error),

    #[error("token is not valid base64")]
    Encoding(#[from] base64::DecodeError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

pub struct CredentialResolver<'a, T> {
    transport: &'a T,
    identity: &'a BearerToken,
    token_request_fallback: bool,
}

impl<'a, T: Transport> CredentialResolver<'a, T> {
    /// `identity` is the exporter's own token, used for every lookup.
    pub fn new(transport: &'a T, identity: &'a BearerToken, settings: &Settings) -> Self {
        Self {
            transport,
            identity,
            token_request_fallback: settings.token_request_fallback,
        }
    }

    pub async fn resolve(&self, namespace: &str, pod: &str) -> Result<BearerToken, ResolveError> {
        let account = self.service_account_name(namespace, pod).await?;
        match self.secret_name(namespace, &account).await {
            Ok(secret) => self.secret_token(namespace, &secret).await,
            Err(ResolveError::NoSecret) if self.token_request_fallback => {
                self.request_token(namespace, &account).await
            }
            Err(e) => Err(e),
        }
    }

    async fn get(&self, path: &str) -> Result<String, ApiError> {
        self.transport
            .request(self.identity, Method::GET, path, None)
            .await
    }

    /// Reads `spec.serviceAccountName` of the pod.
    pub async fn service_account_name(
        &self,
        namespace: &str,
        pod: &str,
    ) -> Result<String, ResolveError> {
        let body = self.get(&pod_path(namespace, pod)).await?;
        let pod: Pod = serde_json::from_str(&body)?;
        pod.spec
            .and_then(|spec| spec.service_account_name)
            .filter(|name| !name.is_empty())
            .ok_or(ResolveError::NoServiceAccount)
    }

    /// Reads `secrets[0].name` of the service account.
    pub async fn secret_name(
        &self,
        namespace: &str,
        account: &str,
    ) -> Result<String, ResolveError> {
        let body = self.get(&service_account_path(namespace, account)).await?;
        let account: ServiceAccount = serde_json::from_str(&body)?;
        account
            .secrets
            .and_then(|secrets| secrets.into_iter().next())
            .and_then(|reference| reference.name)
            .filter(|name| !name.is_empty())
            .ok_or(ResolveError::NoSecret)
    }

    /// Reads and decodes `data.token` of the secret.
    pub async fn secret_token(
        &self,
        namespace: &str,
        secret: &str,
    ) -> Result<BearerToken, ResolveError> {
        let body = self.get(&secret_path(namespace, secret)).await?;
        let secret: Value = serde_json::from_str(&body)?;
        let encoded = secret
            .pointer("/data/token")
            .and_then(Value::as_str)
            .ok_or(ResolveError::NoToken)?;
        let decoded = engine::general_purpose::STANDARD.decode(encoded)?;

        BearerToken::new(String::from_utf8_lossy(&decoded)).ok_or(ResolveError::NoToken)
    }

    /// Mints a short-lived token through the TokenRequest API.
    ///
    /// Any failure is reported as [`ResolveError::NoSecret`], the outcome the
    /// legacy lookup would have produced.
    async fn request_token(
        &self,
        namespace: &str,
        account: &str,
    ) -> Result<BearerToken, ResolveError> {
        match self.try_request_token(namespace, account).await {
            Ok(token) => Ok(token),
            Err(e) => {
                debug!(
                    "TokenRequest for {}/{} failed: {}",
                    namespace, account, e
                );
                Err(ResolveError::NoSecret)
            }
        }
    }

    async fn try_request_token(
        &self,
        namespace: &str,
        account: &str,
    ) -> Result<BearerToken, ResolveError> {
        let request = TokenRequest {
            spec: TokenRequestSpec {
                expiration_seconds: Some(TOKEN_REQUEST_EXPIRATION_SECS),
                ..Default::default()
            },
            ..Default::default()
        };
        let body = self
            .transport
            .request(
                self.identity,
                Method::POST,
                &service_account_token_path(namespace, account),
                Some(serde_json::to_vec(&request)?),
            )
            .await?;
        let response: TokenRequest = serde_json::from_str(&body)?;

        response
            .status
            .and_then(|status| BearerToken::new(status.token))
            .ok_or(ResolveError::NoToken)
    }
}
