//! Typed client for the SafeClass REST backend.
//!
//! Every request goes through [`ApiClient::send`], which attaches the session
//! token, maps transport failures to [`ClientError`] and ends the session when
//! its token is rejected with a 401. Every response body goes through
//! [`normalize_into`].

mod aggregate;
mod conditions;
mod history;
mod medications;
mod rooms;
mod session;
mod students;
mod users;

pub use aggregate::{Aggregate, FetchFailure};
pub use history::{emergency_description, CrisisSeverity};

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use validator::Validate;

use crate::auth::SessionStore;
use crate::config::{ApiConfig, Config};
use crate::error::{ClientError, ClientResult};
use crate::normalize::normalize_into;
use crate::upload::{select_uploader, ImageUploader};

pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<SessionStore>,
    uploader: Arc<dyn ImageUploader>,
}

impl ApiClient {
    pub fn new(
        config: &ApiConfig,
        session: Arc<SessionStore>,
        uploader: Arc<dyn ImageUploader>,
    ) -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ClientError::Config(format!("header name `{}`: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ClientError::Config(format!("header `{}`: {}", name, e)))?;
            headers.insert(name, value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            uploader,
        })
    }

    /// Client for `config`, with the upload encoding it selects.
    pub fn from_config(config: &Config, session: Arc<SessionStore>) -> ClientResult<Self> {
        let uploader = select_uploader(config.upload.mode);
        tracing::debug!("Profile pictures upload as {:?}", uploader.mode());
        Self::new(&config.api, session, uploader)
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a request to `path` (relative to the base URL), carrying the
    /// bearer token when signed in.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and check its status.
    async fn send(&self, builder: RequestBuilder) -> ClientResult<Response> {
        let request = builder.build().map_err(ClientError::Network)?;
        let method = request.method().clone();
        let url = request.url().clone();
        let sent_token = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string);
        tracing::debug!("{} {}", method, url);

        let response = self.http.execute(request).await.map_err(|e| {
            tracing::warn!("{} {} failed: {}", method, url, e);
            ClientError::Network(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            // Only the token this request carried is known to be rejected.
            let expired = match &sent_token {
                Some(token) => self.session.expire(token).await,
                None => false,
            };
            if expired {
                tracing::warn!("{} {} returned 401, ending session", method, url);
            } else {
                tracing::debug!("{} {} returned 401 for an inactive token", method, url);
            }
        } else {
            tracing::warn!("{} {} returned {}", method, url, status);
        }

        Err(ClientError::Http {
            status: status.as_u16(),
            body,
        })
    }

    /// Send a request and normalize its JSON body into `T`.
    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = self.send(builder).await?;
        let bytes = response.bytes().await.map_err(ClientError::Network)?;
        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::UnexpectedShape(format!("body is not JSON: {}", e)))?;
        normalize_into(body)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.fetch(self.request(Method::GET, path)).await
    }

    /// GET a list; a `null` payload is an empty list.
    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> ClientResult<Vec<T>> {
        let items: Option<Vec<T>> = self.get(path).await?;
        Ok(items.unwrap_or_default())
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch(self.request(Method::POST, path).json(body)).await
    }

    async fn put<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch(self.request(Method::PUT, path).json(body)).await
    }

    async fn post_empty<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<()> {
        self.send(self.request(Method::POST, path).json(body)).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }
}

fn validated<T: Validate>(input: &T) -> ClientResult<&T> {
    input.validate()?;
    Ok(input)
}
