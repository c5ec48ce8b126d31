use crate::credentials::CredentialResolver;
use crate::kubernetes::{Transport, namespaces_path};
use crate::types::{BearerToken, ProbeResult};
use http::Method;
use serde_json::Value;
use tracing::debug;

const NAMESPACE_LIST_KIND: &str = "NamespaceList";

/// Checks whether a pod's credentials can list namespaces.
pub struct AccessProber<'a, T> {
    transport: &'a T,
    resolver: CredentialResolver<'a, T>,
}

impl<'a, T: Transport> AccessProber<'a, T> {
    pub fn new(transport: &'a T, resolver: CredentialResolver<'a, T>) -> Self {
        Self {
            transport,
            resolver,
        }
    }

    /// Resolves the pod's token and probes with it. A pod whose token cannot
    /// be resolved is reported as not accessible.
    pub async fn probe_pod(&self, namespace: &str, pod: &str) -> ProbeResult {
        match self.resolver.resolve(namespace, pod).await {
            Ok(token) => self.probe(&token, namespace, pod).await,
            Err(e) => {
                debug!("Could not resolve token for pod {}/{}: {}", namespace, pod, e);
                ProbeResult {
                    namespace: namespace.to_string(),
                    pod: pod.to_string(),
                    accessible: false,
                }
            }
        }
    }

    /// Performs the canary call with `token`.
    pub async fn probe(&self, token: &BearerToken, namespace: &str, pod: &str) -> ProbeResult {
        let accessible = match self
            .transport
            .request(token, Method::GET, &namespaces_path(), None)
            .await
        {
            Ok(body) => is_namespace_list(&body),
            Err(e) => {
                debug!("Canary call for pod {}/{} failed: {}", namespace, pod, e);
                false
            }
        };

        ProbeResult {
            namespace: namespace.to_string(),
            pod: pod.to_string(),
            accessible,
        }
    }
}

/// Lightweight content check: only the top-level `kind` is inspected.
pub fn is_namespace_list(body: &str) -> bool {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("kind")
                .and_then(Value::as_str)
                .map(|kind| kind == NAMESPACE_LIST_KIND)
        })
        .unwrap_or(false)
}
