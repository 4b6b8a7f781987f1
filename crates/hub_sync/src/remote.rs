//! The remote sheet script: one URL, `GET ?mode=` to read, `POST` to write.

use std::future::Future;

use api_types::{dataset::Dataset, intent::WriteIntent};
use reqwest::{Url, header::CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::RemoteError;

/// Anything the coordinator can read datasets from and submit intents to.
///
/// [`HttpRemote`] talks to the real endpoint; tests plug in an in-memory one.
pub trait RemoteStore: Send + Sync + 'static {
    fn fetch(&self, dataset: Dataset) -> impl Future<Output = Result<Value, RemoteError>> + Send;

    fn submit(
        &self,
        intent: &WriteIntent,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Clone)]
pub struct HttpRemote {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpRemote {
    pub fn new(base_url: &str) -> Result<Self, RemoteError> {
        let base_url =
            Url::parse(base_url).map_err(|err| RemoteError::InvalidUrl(err.to_string()))?;
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn check(res: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        if res.status().is_success() {
            return Ok(res);
        }
        let status = res.status().as_u16();
        let message = res
            .json::<ErrorResponse>()
            .await
            .map(|err| err.error)
            .unwrap_or_else(|_| "unknown error".to_string());
        Err(RemoteError::Server { status, message })
    }
}

impl RemoteStore for HttpRemote {
    async fn fetch(&self, dataset: Dataset) -> Result<Value, RemoteError> {
        debug!(%dataset, "fetching dataset");
        let res = self
            .http
            .get(self.base_url.clone())
            .query(&[("mode", dataset.as_str())])
            .send()
            .await?;
        let res = Self::check(res).await?;
        Ok(res.json::<Value>().await?)
    }

    async fn submit(&self, intent: &WriteIntent) -> Result<(), RemoteError> {
        // The script only reads the raw body, and text/plain avoids a CORS
        // preflight on its side.
        let body = serde_json::to_string(intent)?;
        debug!(kind = intent.kind(), "submitting write");
        let res = self
            .http
            .post(self.base_url.clone())
            .header(CONTENT_TYPE, "text/plain;charset=utf-8")
            .body(body)
            .send()
            .await?;
        Self::check(res).await?;
        Ok(())
    }
}
