//! Minimal HTTP surface for upstream calls.
//!
//! Every request the client sends goes through [`UntisHttp`]. The trait is
//! object-safe (boxed futures, the same shape async traits take elsewhere in
//! this workspace's lineage) so the whole pipeline can be exercised against
//! a scripted transport in tests. Status codes are returned as data, never
//! as errors: the auth cascades need to see 401s and keep going.

use std::future::Future;
use std::pin::Pin;

use crate::error::{UntisError, UntisResult};

/// A boxed future for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Header list for a request.
pub type Headers = Vec<(String, String)>;

/// A raw upstream response: status plus body text.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Returns true for a 200 response.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// The transport operations the client needs.
///
/// Implemented for [`reqwest::Client`]; tests substitute a scripted fake.
/// Only transport-level failures (connect, timeout, body read) surface as
/// errors.
pub trait UntisHttp: Send + Sync {
    /// Sends a GET request.
    fn get(&self, url: String, headers: Headers) -> BoxFuture<'_, UntisResult<HttpResponse>>;

    /// Sends a POST request with a JSON body.
    fn post_json(
        &self,
        url: String,
        body: serde_json::Value,
        headers: Headers,
    ) -> BoxFuture<'_, UntisResult<HttpResponse>>;

    /// Sends a HEAD request (reachability probes).
    fn head(&self, url: String) -> BoxFuture<'_, UntisResult<HttpResponse>>;
}

impl UntisHttp for reqwest::Client {
    fn get(&self, url: String, headers: Headers) -> BoxFuture<'_, UntisResult<HttpResponse>> {
        Box::pin(async move {
            let mut request = reqwest::Client::get(self, &url);
            for (name, value) in &headers {
                request = request.header(name, value);
            }
            collect(request.send().await).await
        })
    }

    fn post_json(
        &self,
        url: String,
        body: serde_json::Value,
        headers: Headers,
    ) -> BoxFuture<'_, UntisResult<HttpResponse>> {
        Box::pin(async move {
            let mut request = reqwest::Client::post(self, &url).json(&body);
            for (name, value) in &headers {
                request = request.header(name, value);
            }
            collect(request.send().await).await
        })
    }

    fn head(&self, url: String) -> BoxFuture<'_, UntisResult<HttpResponse>> {
        Box::pin(async move { collect(reqwest::Client::head(self, &url).send().await).await })
    }
}

async fn collect(result: Result<reqwest::Response, reqwest::Error>) -> UntisResult<HttpResponse> {
    let response =
        result.map_err(|e| UntisError::network(format!("request failed: {e}")).with_source(e))?;
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| UntisError::network(format!("failed to read response: {e}")).with_source(e))?;
    Ok(HttpResponse { status, body })
}
