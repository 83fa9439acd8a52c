//! REST transport for the Banyan control plane
//!
//! Exchanges the long-lived refresh token for an access token, then issues
//! JSON requests against the v1 and v2 API surfaces. A 401 triggers one
//! token refresh and a single replay of the request.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Default control-plane address
pub const DEFAULT_HOST: &str = "https://net.banyanops.com/";

const REFRESH_PATH: &str = "api/v1/refresh_token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// v2 responses wrap the payload in `{"data": ...}`
#[derive(Debug, serde::Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, serde::Deserialize)]
struct RefreshResponse {
    #[serde(rename = "Message")]
    message: String,
}

/// HTTP client bound to one tenant
pub struct RestClient {
    http: reqwest::Client,
    base: Url,
    refresh_token: String,
    access_token: RwLock<Option<String>>,
}

impl RestClient {
    /// Create a client for `host`; no request is made until first use
    pub fn new(host: &str, refresh_token: impl Into<String>) -> ClientResult<Self> {
        let refresh_token = refresh_token.into();
        if refresh_token.is_empty() {
            return Err(ClientError::Configuration(
                "refresh token must not be empty".to_string(),
            ));
        }

        let host = if host.ends_with('/') {
            host.to_string()
        } else {
            format!("{}/", host)
        };
        let base = Url::parse(&host)
            .map_err(|e| ClientError::Configuration(format!("invalid host '{}': {}", host, e)))?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base,
            refresh_token,
            access_token: RwLock::new(None),
        })
    }

    pub fn host(&self) -> &str {
        self.base.as_str()
    }

    /// Exchange the refresh token for a fresh access token
    pub async fn login(&self) -> ClientResult<()> {
        let url = self.url(REFRESH_PATH, &[])?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.refresh_token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Auth(format!("{}: {}", status, body)));
        }

        let refreshed: RefreshResponse = serde_json::from_str(&body)
            .map_err(|e| ClientError::Auth(format!("unexpected refresh response: {}", e)))?;
        *self.access_token.write().await = Some(refreshed.message);
        log::debug!("obtained access token from {}", self.base);
        Ok(())
    }

    async fn token(&self) -> ClientResult<String> {
        if let Some(token) = self.access_token.read().await.clone() {
            return Ok(token);
        }
        self.login().await?;
        self.access_token
            .read()
            .await
            .clone()
            .ok_or_else(|| ClientError::Auth("no access token after refresh".to_string()))
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> ClientResult<Url> {
        let mut url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::Configuration(format!("invalid path '{}': {}", path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Send a request and return the raw body of a successful response
    async fn send<B: Serialize + ?Sized + Sync>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> ClientResult<String> {
        let url = self.url(path, query)?;
        let mut refreshed = false;

        loop {
            let token = self.token().await?;
            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .bearer_auth(token)
                .header("Accept", "application/json");
            if let Some(body) = body {
                request = request.json(body);
            }

            log::debug!("{} {}", method, url.path());
            let response = request.send().await?;
            let status = response.status();
            let text = response.text().await?;

            match status {
                s if s.is_success() => return Ok(text),
                StatusCode::UNAUTHORIZED if !refreshed => {
                    refreshed = true;
                    *self.access_token.write().await = None;
                    continue;
                }
                StatusCode::UNAUTHORIZED => return Err(ClientError::Auth(text)),
                StatusCode::NOT_FOUND => return Err(ClientError::NotFound(path.to_string())),
                s => {
                    return Err(ClientError::Api {
                        status: s.as_u16(),
                        message: text,
                    });
                }
            }
        }
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ClientResult<T> {
        let body = self.send::<()>(Method::GET, path, query, None).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub(crate) async fn post<B: Serialize + ?Sized + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> ClientResult<T> {
        let body = self.send(Method::POST, path, query, Some(body)).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub(crate) async fn delete(&self, path: &str, query: &[(&str, &str)]) -> ClientResult<()> {
        self.send::<()>(Method::DELETE, path, query, None).await?;
        Ok(())
    }

    pub(crate) async fn get_v2<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ClientResult<T> {
        let body = self.send::<()>(Method::GET, path, query, None).await?;
        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        Ok(envelope.data)
    }

    pub(crate) async fn post_v2<B: Serialize + ?Sized + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let body = self.send(Method::POST, path, &[], Some(body)).await?;
        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        Ok(envelope.data)
    }

    pub(crate) async fn put_v2<B: Serialize + ?Sized + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let body = self.send(Method::PUT, path, &[], Some(body)).await?;
        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        Ok(envelope.data)
    }
}

/// Decode a spec the server returns as an embedded JSON string
pub(crate) fn parse_embedded<T: DeserializeOwned>(raw: &str) -> ClientResult<T> {
    serde_json::from_str(raw).map_err(|e| ClientError::Decode(format!("embedded spec: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_refresh_token() {
        assert!(matches!(
            RestClient::new(DEFAULT_HOST, ""),
            Err(ClientError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_unparseable_host() {
        assert!(matches!(
            RestClient::new("not a url", "token"),
            Err(ClientError::Configuration(_))
        ));
    }

    #[test]
    fn builds_urls_relative_to_host() {
        let client = RestClient::new("https://example.banyanops.com", "token").unwrap();
        assert_eq!(client.host(), "https://example.banyanops.com/");
        let url = client
            .url("/api/v1/security_policies", &[("PolicyID", "a b")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.banyanops.com/api/v1/security_policies?PolicyID=a+b"
        );
    }

    #[test]
    fn decodes_embedded_spec() {
        let value: serde_json::Value = parse_embedded(r#"{"kind":"BanyanPolicy"}"#).unwrap();
        assert_eq!(value["kind"], "BanyanPolicy");
        assert!(parse_embedded::<serde_json::Value>("{").is_err());
    }
}
