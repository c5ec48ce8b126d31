use crate::types::{BearerToken, Settings};
use http::{Method, Request, header};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Client;
use kube::config::{
    AuthInfo, Cluster, Context, KubeConfigOptions, Kubeconfig, NamedAuthInfo, NamedCluster,
    NamedContext,
};
use secrecy::SecretString;
use serde::Deserialize;

const CLUSTER_NAME: &str = "in-cluster";
const USER_NAME: &str = "probe";

/// Possible errors from talking to the API server.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// Failed to turn the settings into a client configuration.
    #[error("failed to process kube configuration")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    /// Failed to assemble the HTTP request.
    #[error("failed to build request")]
    Request(#[from] http::Error),

    /// Connection, TLS or non-2xx failure.
    #[error("kubernetes API request failed")]
    Kube(#[from] kube::Error),
}

/// A single authenticated round-trip to the API server.
///
/// Implementations make exactly one attempt per call and return the raw
/// response body on a 2xx status.
pub trait Transport {
    async fn request(
        &self,
        token: &BearerToken,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<String, ApiError>;
}

/// [`Transport`] backed by `kube::Client`.
///
/// The exporter's own identity gets one client for the whole run, any other
/// token gets a fresh client for its single call.
pub struct KubeTransport {
    settings: Settings,
    identity: BearerToken,
    client: Client,
}

impl KubeTransport {
    pub async fn connect(settings: &Settings, identity: BearerToken) -> Result<Self, ApiError> {
        let client = build_client(settings, &identity).await?;
        Ok(Self {
            settings: settings.clone(),
            identity,
            client,
        })
    }

    async fn client_for(&self, token: &BearerToken) -> Result<Client, ApiError> {
        if *token == self.identity {
            Ok(self.client.clone())
        } else {
            build_client(&self.settings, token).await
        }
    }
}

impl Transport for KubeTransport {
    async fn request(
        &self,
        token: &BearerToken,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<String, ApiError> {
        let client = self.client_for(token).await?;
        let req = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.unwrap_or_default())?;

        Ok(client.request_text(req).await?)
    }
}

async fn build_client(settings: &Settings, token: &BearerToken) -> Result<Client, ApiError> {
    let config = kube::Config::from_custom_kubeconfig(
        kubeconfig_for(settings, token),
        &KubeConfigOptions::default(),
    )
    .await?;

    Ok(Client::try_from(config)?)
}

/// Builds a single-context kubeconfig that authenticates as `token`.
pub fn kubeconfig_for(settings: &Settings, token: &BearerToken) -> Kubeconfig {
    let cluster = if settings.verify_tls {
        Cluster {
            server: Some(settings.api_server.clone()),
            certificate_authority: Some(settings.ca_file.to_string_lossy().into_owned()),
            ..Default::default()
        }
    } else {
        Cluster {
            server: Some(settings.api_server.clone()),
            insecure_skip_tls_verify: Some(true),
            ..Default::default()
        }
    };

    Kubeconfig {
        clusters: vec![NamedCluster {
            name: CLUSTER_NAME.to_string(),
            cluster: Some(cluster),
        }],
        auth_infos: vec![NamedAuthInfo {
            name: USER_NAME.to_string(),
            auth_info: Some(AuthInfo {
                token: Some(SecretString::from(token.expose().to_string())),
                ..Default::default()
            }),
        }],
        contexts: vec![NamedContext {
            name: USER_NAME.to_string(),
            context: Some(Context {
                cluster: CLUSTER_NAME.to_string(),
                user: Some(USER_NAME.to_string()),
                ..Default::default()
            }),
        }],
        current_context: Some(USER_NAME.to_string()),
        ..Default::default()
    }
}

pub fn namespaces_path() -> String {
    "/api/v1/namespaces".to_string()
}

pub fn pods_path(namespace: &str) -> String {
    format!("/api/v1/namespaces/{}/pods", namespace)
}

pub fn pod_path(namespace: &str, pod: &str) -> String {
    format!("/api/v1/namespaces/{}/pods/{}", namespace, pod)
}

pub fn service_account_path(namespace: &str, name: &str) -> String {
    format!("/api/v1/namespaces/{}/serviceaccounts/{}", namespace, name)
}

pub fn service_account_token_path(namespace: &str, name: &str) -> String {
    format!("{}/token", service_account_path(namespace, name))
}

pub fn secret_path(namespace: &str, name: &str) -> String {
    format!("/api/v1/namespaces/{}/secrets/{}", namespace, name)
}

#[derive(Deserialize)]
struct NameList {
    #[serde(default)]
    items: Vec<NamedItem>,
}

#[derive(Deserialize)]
struct NamedItem {
    #[serde(default)]
    metadata: ObjectMeta,
}

/// Extracts `.items[].metadata.name` from a list response, skipping unnamed items.
pub fn item_names(body: &str) -> Result<Vec<String>, serde_json::Error> {
    let list: NameList = serde_json::from_str(body)?;
    Ok(list
        .items
        .into_iter()
        .filter_map(|item| item.metadata.name)
        .filter(|name| !name.is_empty())
        .collect())
}
