//! Cloudit REST transport
//!
//! Every Cloudit service lives under
//! `{identity_base}/cloudit/{version}/{engine}/v1.0/{tenant}/...` and
//! authenticates with an `X-Auth-Token` header. A 401 answer triggers one
//! re-authentication through [`Reauthenticate`] and a single retry.

use crate::error::{ClientError, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const DEFAULT_API_VERSION: &str = "v4.0";
pub const USER_AGENT: &str = "cloudweave-cloudit/0.3";

const AUTH_HEADER: &str = "X-Auth-Token";

/// Cloudit service engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Iam,
    Ace,
    Dna,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Iam => "iam",
            Engine::Ace => "ace",
            Engine::Dna => "dna",
        }
    }
}

/// Status codes accepted when the caller does not override them
pub fn default_ok_codes(method: &Method) -> &'static [u16] {
    match *method {
        Method::GET => &[200],
        Method::POST | Method::PUT => &[200, 201, 202],
        Method::PATCH => &[200, 204],
        Method::DELETE => &[200, 202, 204],
        _ => &[],
    }
}

/// Obtains a fresh token after the current one was rejected
#[async_trait]
pub trait Reauthenticate: Send + Sync {
    async fn reauthenticate(&self) -> Result<String>;
}

/// Username/password token issuer
pub struct PasswordAuth {
    http: reqwest::Client,
    identity_endpoint: String,
    username: String,
    password: String,
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    id: &'a str,
    password: &'a str,
}

impl PasswordAuth {
    pub fn new(
        identity_endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            identity_endpoint: identity_endpoint.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// `POST {identity_endpoint}/auth`; the response body is the token.
    pub async fn issue_token(&self) -> Result<String> {
        let url = format!("{}/auth", self.identity_endpoint.trim_end_matches('/'));
        tracing::debug!("Requesting Cloudit token from {}", url);

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(&AuthRequest {
                id: &self.username,
                password: &self.password,
            })
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        if !(200..300).contains(&status) {
            return Err(ClientError::UnexpectedResponseCode {
                url,
                method: "POST".into(),
                expected: vec![200, 201],
                actual: status,
                body,
            });
        }

        let token = body.trim().trim_matches('"').to_string();
        if token.is_empty() {
            return Err(ClientError::AuthenticationFailed(
                "identity service returned an empty token".into(),
            ));
        }
        Ok(token)
    }
}

#[async_trait]
impl Reauthenticate for PasswordAuth {
    async fn reauthenticate(&self) -> Result<String> {
        self.issue_token().await
    }
}

/// Authenticated JSON client for one tenant
pub struct RestClient {
    http: reqwest::Client,
    identity_base: String,
    version: String,
    tenant_id: String,
    token: RwLock<String>,
    reauth: Option<Arc<dyn Reauthenticate>>,
}

impl RestClient {
    pub fn new(
        identity_base: impl Into<String>,
        tenant_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            identity_base: identity_base.into().trim_end_matches('/').to_string(),
            version: DEFAULT_API_VERSION.to_string(),
            tenant_id: tenant_id.into(),
            token: RwLock::new(token.into()),
            reauth: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_reauthenticate(mut self, reauth: Arc<dyn Reauthenticate>) -> Self {
        self.reauth = Some(reauth);
        self
    }

    pub async fn token(&self) -> String {
        self.token.read().await.clone()
    }

    /// Build a service URL from path segments
    pub fn url(&self, engine: Engine, parts: &[&str]) -> String {
        format!(
            "{}/cloudit/{}/{}/v1.0/{}/{}",
            self.identity_base,
            self.version,
            engine.as_str(),
            self.tenant_id,
            parts.join("/")
        )
    }

    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.request(Method::GET, url, None).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let body = self
            .request(Method::POST, url, Some(serde_json::to_value(body)?))
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// POST whose response body is ignored
    pub async fn post_empty<B: Serialize + ?Sized>(&self, url: &str, body: Option<&B>) -> Result<()> {
        let body = body.map(serde_json::to_value).transpose()?;
        self.request(Method::POST, url, body).await?;
        Ok(())
    }

    pub async fn put<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<()> {
        self.request(Method::PUT, url, Some(serde_json::to_value(body)?))
            .await?;
        Ok(())
    }

    pub async fn patch<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<()> {
        self.request(Method::PATCH, url, Some(serde_json::to_value(body)?))
            .await?;
        Ok(())
    }

    pub async fn delete(&self, url: &str) -> Result<()> {
        self.request(Method::DELETE, url, None).await?;
        Ok(())
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<String> {
        match self.send(method.clone(), url, body.as_ref()).await {
            Err(err) if err.status() == Some(401) => {
                let Some(reauth) = &self.reauth else {
                    return Err(err);
                };
                tracing::info!("Cloudit token rejected, re-authenticating");
                let token = reauth.reauthenticate().await?;
                *self.token.write().await = token;
                self.send(method, url, body.as_ref()).await
            }
            other => other,
        }
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<String> {
        tracing::debug!("{} {}", method, url);

        let token = self.token().await;
        let mut request = self
            .http
            .request(method.clone(), url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, USER_AGENT);
        if !token.is_empty() {
            request = request.header(AUTH_HEADER, token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        let ok_codes = default_ok_codes(&method);
        if !ok_codes.contains(&status) {
            return Err(ClientError::UnexpectedResponseCode {
                url: url.to_string(),
                method: method.to_string(),
                expected: ok_codes.to_vec(),
                actual: status,
                body: text,
            });
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_layout() {
        let client = RestClient::new("https://cloudit.example/", "tenant-1", "tok");
        assert_eq!(
            client.url(Engine::Ace, &["servers", "vm-1", "start"]),
            "https://cloudit.example/cloudit/v4.0/ace/v1.0/tenant-1/servers/vm-1/start"
        );
        assert_eq!(
            client.with_version("v5.0").url(Engine::Dna, &["subnets"]),
            "https://cloudit.example/cloudit/v5.0/dna/v1.0/tenant-1/subnets"
        );
    }

    #[test]
    fn test_default_ok_codes() {
        assert_eq!(default_ok_codes(&Method::GET), &[200]);
        assert!(default_ok_codes(&Method::POST).contains(&201));
        assert!(default_ok_codes(&Method::DELETE).contains(&204));
        assert!(!default_ok_codes(&Method::PATCH).contains(&201));
    }
}
