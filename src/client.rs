//! Backend HTTP client.
//!
//! The Zentral API is collection-oriented REST: `POST /api/<collection>/`
//! creates, `GET`/`PUT /api/<collection>/{id}/` read and update, `DELETE`
//! removes. [`Backend`] is the JSON-level seam over that contract;
//! [`HttpBackend`] is the reqwest implementation and the in-memory fake in
//! [`crate::testing`] is the other. [`ZentralClient`] adds the typed
//! request/response surface the adapters consume.
//!
//! The client is the only shared resource between adapters: it is built once
//! at configure time and immutable afterwards.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::ClientError;

/// Environment fallbacks for the provider configuration block.
pub const ENV_BASE_URL: &str = "ZTL_API_BASE_URL";
/// Environment fallback for the API token.
pub const ENV_TOKEN: &str = "ZTL_API_TOKEN";
/// Environment fallback for the server CA certificate (PEM text).
pub const ENV_TLS_SERVER_CERT: &str = "ZTL_API_TLS_SERVER_CERT";
/// Environment fallback for disabling TLS verification.
pub const ENV_TLS_SKIP_VERIFY: &str = "ZTL_API_TLS_SKIP_VERIFY";

/// A resource identifier: either an integer surrogate key or an opaque
/// UUID string. The two kinds are disjoint; import helpers dispatch on
/// which one a kind uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceId {
    /// Integer surrogate key.
    Integer(i64),
    /// Opaque UUID string; the backend validates the format.
    Uuid(String),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Integer(n) => write!(f, "{}", n),
            ResourceId::Uuid(s) => write!(f, "{}", s),
        }
    }
}

/// Resolved provider configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the Zentral deployment, e.g. `https://zentral.example.com`.
    pub base_url: String,
    /// API bearer token.
    pub token: String,
    /// Optional CA certificate (PEM text) for the server.
    pub ca_certificate: Option<String>,
    /// Skip TLS certificate verification.
    pub tls_skip_verify: bool,
}

impl ClientConfig {
    /// Resolve the configuration from the provider block, falling back to
    /// the `ZTL_API_*` environment variables for anything unset.
    pub fn resolve(config: &Value) -> Result<Self, String> {
        let get_str = |name: &str| -> Option<String> {
            config
                .get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let base_url = get_str("base_url")
            .or_else(|| std::env::var(ENV_BASE_URL).ok().filter(|s| !s.is_empty()))
            .ok_or_else(|| {
                format!(
                    "missing base_url: set the provider attribute or the {} environment variable",
                    ENV_BASE_URL
                )
            })?;

        let token = get_str("token")
            .or_else(|| std::env::var(ENV_TOKEN).ok().filter(|s| !s.is_empty()))
            .ok_or_else(|| {
                format!(
                    "missing token: set the provider attribute or the {} environment variable",
                    ENV_TOKEN
                )
            })?;

        let ca_certificate =
            get_str("ca_certificate").or_else(|| std::env::var(ENV_TLS_SERVER_CERT).ok());

        let tls_skip_verify = config
            .get("tls_skip_verify")
            .and_then(Value::as_bool)
            .or_else(|| {
                std::env::var(ENV_TLS_SKIP_VERIFY)
                    .ok()
                    .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            })
            .unwrap_or(false);

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            ca_certificate,
            tls_skip_verify,
        })
    }
}

/// The JSON-level backend contract the adapters are written against.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// `POST /api/<collection>/` — returns the created object.
    async fn create(&self, collection: &str, body: Value) -> Result<Value, ClientError>;

    /// `GET /api/<collection>/{id}/` — returns the object.
    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Value, ClientError>;

    /// `PUT /api/<collection>/{id}/` — returns the updated object.
    async fn update(&self, collection: &str, id: &str, body: Value) -> Result<Value, ClientError>;

    /// `DELETE /api/<collection>/{id}/`.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), ClientError>;
}

/// reqwest implementation of [`Backend`].
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpBackend {
    /// Build the HTTP backend from a resolved configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder().use_rustls_tls();

        if let Some(pem) = &config.ca_certificate {
            let cert = reqwest::Certificate::from_pem(pem.as_bytes())
                .map_err(|e| ClientError::Configuration(format!("invalid ca_certificate: {}", e)))?;
            builder = builder.add_root_certificate(cert);
        }
        if config.tls_skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/api/{}/", self.base_url, collection)
    }

    fn object_url(&self, collection: &str, id: &str) -> String {
        format!("{}/api/{}/{}/", self.base_url, collection, id)
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", "application/json; charset=utf-8")
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, ClientError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn create(&self, collection: &str, body: Value) -> Result<Value, ClientError> {
        let url = self.collection_url(collection);
        debug!(collection, "POST {}", url);
        let response = self
            .request(reqwest::Method::POST, url)
            .body(serde_json::to_vec(&body)?)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Value, ClientError> {
        let url = self.object_url(collection, id);
        debug!(collection, id, "GET {}", url);
        let response = self.request(reqwest::Method::GET, url).send().await?;
        Self::read_json(response).await
    }

    async fn update(&self, collection: &str, id: &str, body: Value) -> Result<Value, ClientError> {
        let url = self.object_url(collection, id);
        debug!(collection, id, "PUT {}", url);
        let response = self
            .request(reqwest::Method::PUT, url)
            .body(serde_json::to_vec(&body)?)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), ClientError> {
        let url = self.object_url(collection, id);
        debug!(collection, id, "DELETE {}", url);
        let response = self.request(reqwest::Method::DELETE, url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Typed client handle shared by every adapter.
///
/// Published once at configure time; adapters only ever borrow it.
#[derive(Clone)]
pub struct ZentralClient {
    backend: Arc<dyn Backend>,
}

impl ZentralClient {
    /// Wrap a backend implementation.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Build the production client from a resolved configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self::new(Arc::new(HttpBackend::new(config)?)))
    }

    /// Create an object in a collection.
    pub async fn create<Req, Resp>(&self, collection: &str, request: &Req) -> Result<Resp, ClientError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_value(request)?;
        let response = self.backend.create(collection, body).await?;
        Ok(serde_json::from_value(response)?)
    }

    /// Fetch an object by its identifier.
    pub async fn get_by_id<Resp>(&self, collection: &str, id: &ResourceId) -> Result<Resp, ClientError>
    where
        Resp: DeserializeOwned,
    {
        let response = self.backend.get_by_id(collection, &id.to_string()).await?;
        Ok(serde_json::from_value(response)?)
    }

    /// Update an object in place.
    pub async fn update<Req, Resp>(
        &self,
        collection: &str,
        id: &ResourceId,
        request: &Req,
    ) -> Result<Resp, ClientError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_value(request)?;
        let response = self.backend.update(collection, &id.to_string(), body).await?;
        Ok(serde_json::from_value(response)?)
    }

    /// Delete an object.
    pub async fn delete(&self, collection: &str, id: &ResourceId) -> Result<(), ClientError> {
        self.backend.delete(collection, &id.to_string()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_id_display() {
        assert_eq!(ResourceId::Integer(42).to_string(), "42");
        assert_eq!(
            ResourceId::Uuid("4cfe9d8c".to_string()).to_string(),
            "4cfe9d8c"
        );
    }

    #[test]
    fn test_client_config_from_block() {
        let config = json!({
            "base_url": "https://zentral.example.com/",
            "token": "s3cret",
            "tls_skip_verify": true
        });
        let resolved = ClientConfig::resolve(&config).unwrap();
        // Trailing slash is trimmed so URL joins stay canonical.
        assert_eq!(resolved.base_url, "https://zentral.example.com");
        assert_eq!(resolved.token, "s3cret");
        assert!(resolved.tls_skip_verify);
        assert!(resolved.ca_certificate.is_none());
    }

    #[test]
    fn test_client_config_missing_token() {
        // Ensure the env fallback does not mask the failure.
        std::env::remove_var(ENV_TOKEN);
        let err = ClientConfig::resolve(&json!({"base_url": "https://z.example.com"}))
            .expect_err("token should be required");
        assert!(err.contains("token"));
        assert!(err.contains(ENV_TOKEN));
    }

    #[test]
    fn test_http_backend_urls() {
        let backend = HttpBackend::new(&ClientConfig {
            base_url: "https://zentral.example.com".to_string(),
            token: "t".to_string(),
            ca_certificate: None,
            tls_skip_verify: false,
        })
        .unwrap();
        assert_eq!(
            backend.collection_url("inventory/tags"),
            "https://zentral.example.com/api/inventory/tags/"
        );
        assert_eq!(
            backend.object_url("inventory/tags", "42"),
            "https://zentral.example.com/api/inventory/tags/42/"
        );
    }
}
