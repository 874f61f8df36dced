//! Thin typed wrapper over the storefront HTTP API.

use reqwest::Method;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Api(String),
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
            token: None,
        }
    }

    /// Set or clear the bearer token attached to every request.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn unwrap_data<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let envelope: ApiResponse<T> = response.json().await?;
        if envelope.success {
            envelope
                .data
                .ok_or_else(|| ClientError::Api("response carried no data".to_string()))
        } else {
            Err(ClientError::Api(
                envelope
                    .error
                    .unwrap_or_else(|| "request failed".to_string()),
            ))
        }
    }

    /// For endpoints whose payload is empty: only the envelope's success flag
    /// matters.
    async fn unwrap_ok(response: reqwest::Response) -> Result<(), ClientError> {
        let envelope: ApiResponse<serde_json::Value> = response.json().await?;
        if envelope.success {
            Ok(())
        } else {
            Err(ClientError::Api(
                envelope
                    .error
                    .unwrap_or_else(|| "request failed".to_string()),
            ))
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        Self::unwrap_data(self.request(Method::GET, path).send().await?).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        Self::unwrap_data(self.request(Method::POST, path).json(body).send().await?).await
    }

    pub async fn post_ok<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ClientError> {
        Self::unwrap_ok(self.request(Method::POST, path).json(body).send().await?).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        Self::unwrap_data(self.request(Method::PUT, path).json(body).send().await?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        Self::unwrap_data(self.request(Method::DELETE, path).send().await?).await
    }

    pub async fn delete_ok(&self, path: &str) -> Result<(), ClientError> {
        Self::unwrap_ok(self.request(Method::DELETE, path).send().await?).await
    }
}
