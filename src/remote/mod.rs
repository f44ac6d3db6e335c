//! Users API client.
//!
//! `UserApi` is the seam the store and the worker bridge talk to;
//! `HttpUserApi` implements it over JSON/HTTP for `{base}/users`.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::RemoteError;
use crate::model::{RemoteUser, UserPayload};

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait UserApi: Send + Sync {
    async fn list(&self) -> Result<Vec<RemoteUser>, RemoteError>;
    async fn get(&self, id: u64) -> Result<RemoteUser, RemoteError>;
    async fn create(&self, payload: &UserPayload) -> Result<RemoteUser, RemoteError>;
    async fn update(&self, id: u64, payload: &UserPayload) -> Result<RemoteUser, RemoteError>;
    async fn delete(&self, id: u64) -> Result<(), RemoteError>;
}

#[derive(Clone, Debug)]
pub struct HttpUserApi {
    http: Client,
    base_url: String,
}

impl HttpUserApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn users_url(&self) -> String {
        format!("{}/users", self.base_url)
    }

    fn user_url(&self, id: u64) -> String {
        format!("{}/users/{id}", self.base_url)
    }
}

/// Turn non-2xx answers into `RemoteError::Status`.
fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(RemoteError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| RemoteError::Decode(e.to_string()))
}

#[async_trait]
impl UserApi for HttpUserApi {
    async fn list(&self) -> Result<Vec<RemoteUser>, RemoteError> {
        let url = self.users_url();
        debug!(%url, "GET users");
        let response = check_status(self.http.get(&url).send().await?)?;
        decode(response).await
    }

    async fn get(&self, id: u64) -> Result<RemoteUser, RemoteError> {
        let url = self.user_url(id);
        debug!(%url, "GET user");
        let response = check_status(self.http.get(&url).send().await?)?;
        decode(response).await
    }

    async fn create(&self, payload: &UserPayload) -> Result<RemoteUser, RemoteError> {
        let url = self.users_url();
        debug!(%url, name = %payload.name, "POST user");
        let response = check_status(self.http.post(&url).json(payload).send().await?)?;
        decode(response).await
    }

    async fn update(&self, id: u64, payload: &UserPayload) -> Result<RemoteUser, RemoteError> {
        let url = self.user_url(id);
        debug!(%url, name = %payload.name, "PUT user");
        let response = check_status(self.http.put(&url).json(payload).send().await?)?;
        decode(response).await
    }

    async fn delete(&self, id: u64) -> Result<(), RemoteError> {
        let url = self.user_url(id);
        debug!(%url, "DELETE user");
        check_status(self.http.delete(&url).send().await?)?;
        Ok(())
    }
}
