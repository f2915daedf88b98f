//! JSON-RPC session login.
//!
//! The legacy WebUntis API authenticates over JSON-RPC and hands back a
//! `JSESSIONID` session plus the person the account belongs to. The session
//! cookie (optionally joined by the base64-encoded `schoolname` cookie) is
//! what the weekly fetch and the cookie-mode detail lookups present.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{UntisError, UntisResult};
use crate::http::UntisHttp;

/// An authenticated upstream session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// `JSESSIONID` value.
    pub session_id: String,
    /// Person the credentials belong to.
    pub person_id: i64,
    /// Person type (element kind code, normally 5 for students).
    pub person_type: i64,
}

impl Session {
    /// Bare session cookie, as the weekly endpoint expects it.
    pub fn cookie(&self) -> String {
        format!("JSESSIONID={};", self.session_id)
    }

    /// Session cookie joined by the encoded `schoolname` cookie, as the
    /// REST endpoints expect it.
    pub fn cookie_with_school(&self, school: &str) -> String {
        format!(
            "JSESSIONID={}; schoolname=\"_{}\";",
            self.session_id,
            BASE64.encode(school)
        )
    }
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Session>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Authenticates against the JSON-RPC endpoint.
///
/// # Errors
///
/// `AuthenticationFailed` when the upstream rejects the credentials,
/// `InvalidResponse` when the envelope cannot be decoded, transport errors
/// as returned by the HTTP layer.
pub async fn login(
    http: &dyn UntisHttp,
    host: &str,
    school: &str,
    username: &str,
    password: &str,
) -> UntisResult<Session> {
    let url = format!(
        "https://{host}/WebUntis/jsonrpc.do?school={}",
        urlencoding::encode(school)
    );
    let body = json!({
        "id": "id",
        "method": "authenticate",
        "params": {"user": username, "password": password, "client": "client"},
        "jsonrpc": "2.0",
    });

    let response = http.post_json(url, body, Vec::new()).await?;
    if !response.is_ok() {
        return Err(UntisError::authentication(format!(
            "login returned status {}",
            response.status
        )));
    }

    let envelope: RpcEnvelope = serde_json::from_str(&response.body)
        .map_err(|e| UntisError::invalid_response("malformed login response").with_source(e))?;

    if let Some(error) = envelope.error {
        return Err(UntisError::authentication(format!(
            "login rejected ({}): {}",
            error.code, error.message
        )));
    }

    let session = envelope
        .result
        .ok_or_else(|| UntisError::invalid_response("login response carries no session"))?;
    debug!(person_id = session.person_id, "session established");
    Ok(session)
}
