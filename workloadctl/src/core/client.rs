use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client as HttpClient, Identity, RequestBuilder, StatusCode};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, trace};

use crate::core::config::Credentials;
use crate::core::workload::{DeleteRequest, Workload};

/// Preview length of a body that looks like an HTML page.
pub const HTML_PREVIEW_LEN: usize = 200;
/// Preview length of any other undecodable body.
pub const RAW_PREVIEW_LEN: usize = 500;

/// `ResponseBody` holds what the control plane answered on success.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// The server answered without a body.
    Empty { status: u16 },
    Json(Value),
}

/// Client related errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unable to read the certificate {}. Details : {source}", .path.display())]
    ReadCertificate {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unable to load the PKCS#12 certificate. Details : {0}")]
    Identity(reqwest::Error),
    #[error("Unable to build the HTTP session. Details : {0}")]
    Session(reqwest::Error),
    #[error("Request to {url} failed. Details : {source}")]
    Transport { url: String, source: reqwest::Error },
    #[error("{status} returned by {url}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error("Received non-JSON response (HTTP {status}): {preview}")]
    Decode {
        status: StatusCode,
        preview: String,
        source: serde_json::Error,
    },
}

impl Error {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Status { status, .. } | Error::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }

    /// Error body returned by the control plane, pretty printed when it is JSON.
    pub fn response_body(&self) -> Option<String> {
        match self {
            Error::Status { body, .. } if !body.is_empty() => Some(
                serde_json::from_str::<Value>(body)
                    .ok()
                    .and_then(|json| serde_json::to_string_pretty(&json).ok())
                    .unwrap_or_else(|| body.clone()),
            ),
            _ => None,
        }
    }
}

#[async_trait]
pub trait WorkloadClient: Send + Sync {
    /// Namespace the workloads are managed in.
    fn namespace(&self) -> &str;
    async fn create_workload(&self, workload: &Workload) -> Result<ResponseBody, Error>;
    async fn replace_workload(&self, workload: &Workload) -> Result<ResponseBody, Error>;
    async fn get_workload(&self, name: &str) -> Result<ResponseBody, Error>;
    async fn delete_workload(&self, name: &str) -> Result<ResponseBody, Error>;
}

/// `Client` provides the ability to interact with the workloads
/// of the control plane by using HTTP Protocol.
#[derive(Debug)]
pub struct Client {
    /// The API base URL, without trailing slash.
    ///
    /// e.g: https://tenant.console.ves.volterra.io/api
    endpoint: String,

    namespace: String,

    /// The internal HTTP client, bound to the client certificate.
    http_client: HttpClient,
}

impl Client {
    /// Open the authenticated session described by `credentials`.
    pub fn init(credentials: &Credentials) -> Result<Self, Error> {
        let bundle =
            std::fs::read(&credentials.certificate).map_err(|source| Error::ReadCertificate {
                path: credentials.certificate.clone(),
                source,
            })?;
        let identity =
            Identity::from_pkcs12_der(&bundle, &credentials.password).map_err(Error::Identity)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = HttpClient::builder()
            .identity(identity)
            .default_headers(headers)
            .build()
            .map_err(Error::Session)?;

        debug!(
            endpoint = %credentials.api_url,
            tenant = %credentials.tenant,
            "Session initialized"
        );
        Ok(Self::with_http_client(
            &credentials.api_url,
            &credentials.namespace,
            http_client,
        ))
    }

    pub fn with_http_client(endpoint: &str, namespace: &str, http_client: HttpClient) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            namespace: namespace.to_string(),
            http_client,
        }
    }

    /// Path of the workload collection
    pub fn collection(&self) -> String {
        format!(
            "{}/config/namespaces/{}/workloads",
            self.endpoint, self.namespace
        )
    }

    /// Path of a single workload
    pub fn item(&self, name: &str) -> String {
        format!("{}/{}", self.collection(), name)
    }

    #[tracing::instrument(name = "Client::send", skip(self, request))]
    async fn send(&self, request: RequestBuilder, url: &str) -> Result<ResponseBody, Error> {
        let transport = |source| Error::Transport {
            url: url.to_string(),
            source,
        };

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let text = response.text().await.map_err(transport)?;
        debug!(%status, "Received response");
        trace!(body = %text);

        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status,
                body: text,
            });
        }
        parse_body(status, &text)
    }
}

#[async_trait]
impl WorkloadClient for Client {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn create_workload(&self, workload: &Workload) -> Result<ResponseBody, Error> {
        let url = self.collection();
        self.send(self.http_client.post(&url).json(workload), &url)
            .await
    }

    async fn replace_workload(&self, workload: &Workload) -> Result<ResponseBody, Error> {
        let url = self.item(&workload.metadata.name);
        self.send(self.http_client.put(&url).json(workload), &url)
            .await
    }

    async fn get_workload(&self, name: &str) -> Result<ResponseBody, Error> {
        let url = self.item(name);
        self.send(self.http_client.get(&url), &url).await
    }

    async fn delete_workload(&self, name: &str) -> Result<ResponseBody, Error> {
        let url = self.item(name);
        let body = DeleteRequest::new(&self.namespace, name);
        self.send(self.http_client.delete(&url).json(&body), &url)
            .await
    }
}

/// Decode the body of a successful response.
///
/// An empty body is not an error. Anything else must be JSON.
pub fn parse_body(status: StatusCode, text: &str) -> Result<ResponseBody, Error> {
    if text.is_empty() {
        return Ok(ResponseBody::Empty {
            status: status.as_u16(),
        });
    }

    serde_json::from_str::<Value>(text)
        .map(ResponseBody::Json)
        .map_err(|source| {
            let preview = preview(text);
            debug!(%status, %preview, "Received non-JSON response");
            Error::Decode {
                status,
                preview,
                source,
            }
        })
}

/// Bounded preview of a raw body. HTML pages get a shorter one.
pub fn preview(text: &str) -> String {
    let limit = if text.trim().starts_with('<') {
        HTML_PREVIEW_LEN
    } else {
        RAW_PREVIEW_LEN
    };

    let mut chars = text.chars();
    let head: String = chars.by_ref().take(limit).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
