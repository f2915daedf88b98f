//! REST bearer token acquisition.
//!
//! The newer REST detail endpoints want a short-lived JWT bearer instead of
//! the session cookie. Upstream deployments expose inconsistent login
//! surfaces, so acquisition is a cascade: first exchange the existing
//! session for a token, then walk an ordered list of login endpoint ×
//! payload-shape × query-suffix combinations until one yields a token.
//! Acquisition failure is never fatal; callers fall back to cookie-based
//! queries.

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use serde_json::{Value, json};
use tracing::{debug, trace};

use crate::config::UntisConfig;
use crate::http::{Headers, UntisHttp};
use crate::session::Session;

/// A bearer token plus the tenant headers some deployments require.
#[derive(Debug, Clone)]
pub struct BearerGrant {
    /// The JWT bearer.
    pub token: String,
    /// `Tenant-Id` header value, when known.
    pub tenant_id: Option<String>,
    /// `X-Webuntis-Api-School-Year-Id` header value, when known.
    pub school_year_id: Option<String>,
}

/// Login endpoints observed across deployments, in trial order.
const LOGIN_ENDPOINTS: &[&str] = &[
    "/WebUntis/api/rest/auth/login",
    "/WebUntis/api/rest/view/v1/login",
    "/WebUntis/api/rest/authenticate/user",
];

fn accept_header() -> Headers {
    vec![(
        "Accept".to_string(),
        "application/json, text/plain, */*".to_string(),
    )]
}

/// Acquires a bearer, preferring the session exchange over credential
/// logins. Returns `None` when every strategy fails.
pub async fn acquire_bearer(
    http: &dyn UntisHttp,
    host: &str,
    config: &UntisConfig,
    session: &Session,
) -> Option<BearerGrant> {
    if let Some(mut grant) = bearer_from_session(http, host, &config.school, session).await {
        if grant.school_year_id.is_none() {
            grant.school_year_id =
                school_year_from_app_config(http, host, &config.school, session).await;
        }
        return Some(grant);
    }
    bearer_from_credentials(http, host, &config.school, &config.username, &config.password).await
}

/// Exchanges the JSON-RPC session for a REST bearer.
///
/// The endpoint returns the raw JWT (no JSON wrapper); tenant information
/// hides in the token claims.
pub async fn bearer_from_session(
    http: &dyn UntisHttp,
    host: &str,
    school: &str,
    session: &Session,
) -> Option<BearerGrant> {
    let url = format!("https://{host}/WebUntis/api/token/new");
    let mut headers = accept_header();
    headers.push(("Referer".to_string(), format!("https://{host}/")));
    headers.push(("Cookie".to_string(), session.cookie_with_school(school)));

    let response = match http.get(url, headers).await {
        Ok(response) => response,
        Err(e) => {
            trace!(error = %e, "session token exchange failed");
            return None;
        }
    };

    let token = response.body.trim();
    if !response.is_ok() || token.split('.').count() != 3 {
        return None;
    }

    let claims = decode_jwt_claims(token).unwrap_or(Value::Null);
    debug!("bearer acquired via session token exchange");
    Some(BearerGrant {
        token: token.to_string(),
        tenant_id: scalar(&claims, "tenant_id").or_else(|| scalar(&claims, "tenantId")),
        school_year_id: scalar(&claims, "schoolYearId"),
    })
}

/// Walks the credential login cascade.
pub async fn bearer_from_credentials(
    http: &dyn UntisHttp,
    host: &str,
    school: &str,
    username: &str,
    password: &str,
) -> Option<BearerGrant> {
    let payloads = [
        json!({"user": username, "password": password, "client": "client"}),
        json!({"username": username, "password": password}),
    ];
    let suffixes = [
        String::new(),
        format!("?school={}", urlencoding::encode(school)),
    ];

    for endpoint in LOGIN_ENDPOINTS {
        for payload in &payloads {
            for suffix in &suffixes {
                let url = format!("https://{host}{endpoint}{suffix}");
                let response = match http
                    .post_json(url.clone(), payload.clone(), accept_header())
                    .await
                {
                    Ok(response) => response,
                    Err(e) => {
                        trace!(%url, error = %e, "login attempt failed");
                        continue;
                    }
                };
                if !response.is_ok() {
                    continue;
                }
                let Ok(value) = serde_json::from_str::<Value>(&response.body) else {
                    continue;
                };
                if let Some(grant) = extract_token(&value) {
                    debug!(%url, "bearer acquired via login endpoint");
                    return Some(grant);
                }
            }
        }
    }

    None
}

/// Backfills the school-year id from the app config endpoint.
pub async fn school_year_from_app_config(
    http: &dyn UntisHttp,
    host: &str,
    school: &str,
    session: &Session,
) -> Option<String> {
    let url = format!("https://{host}/WebUntis/api/app/config");
    let mut headers = accept_header();
    headers.push(("Cookie".to_string(), session.cookie_with_school(school)));

    let response = http.get(url, headers).await.ok()?;
    if !response.is_ok() {
        return None;
    }
    let value: Value = serde_json::from_str(&response.body).ok()?;

    // The year id hides in different places across versions.
    scalar(&value["data"]["currentSchoolYear"], "id")
        .or_else(|| scalar(&value["currentSchoolYear"], "id"))
        .or_else(|| scalar(&value["schoolYear"], "id"))
}

/// Recognizes the token response shapes observed upstream:
/// `{token}`, `{bearer}`, and `{data: {token}}`.
fn extract_token(value: &Value) -> Option<BearerGrant> {
    let carrier = if value.get("token").is_some() {
        value
    } else if let Some(bearer) = value.get("bearer").and_then(Value::as_str) {
        return Some(BearerGrant {
            token: bearer.to_string(),
            tenant_id: tenant_of(value),
            school_year_id: school_year_of(value),
        });
    } else if value["data"].get("token").is_some() {
        &value["data"]
    } else {
        return None;
    };

    let token = carrier.get("token").and_then(Value::as_str)?;
    Some(BearerGrant {
        token: token.to_string(),
        tenant_id: tenant_of(carrier),
        school_year_id: school_year_of(carrier),
    })
}

fn tenant_of(value: &Value) -> Option<String> {
    scalar(value, "tenantId").or_else(|| scalar(value, "tenant_id"))
}

fn school_year_of(value: &Value) -> Option<String> {
    scalar(value, "schoolYearId").or_else(|| scalar(value, "school_year_id"))
}

fn scalar(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decodes the claims segment of a JWT without verifying it; the claims
/// only steer optional headers.
fn decode_jwt_claims(token: &str) -> Option<Value> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::FakeHttp;

    fn session() -> Session {
        Session {
            session_id: "ABC123".to_string(),
            person_id: 1234,
            person_type: 5,
        }
    }

    fn config() -> UntisConfig {
        UntisConfig::new("ajax", "My School", "user", "pass")
    }

    fn fake_jwt(claims: &str) -> String {
        format!("header.{}.signature", URL_SAFE_NO_PAD.encode(claims))
    }

    #[test]
    fn extracts_all_token_shapes() {
        let flat: Value =
            serde_json::from_str(r#"{"token": "t1", "tenantId": "a", "schoolYearId": 17}"#).unwrap();
        let grant = extract_token(&flat).unwrap();
        assert_eq!(grant.token, "t1");
        assert_eq!(grant.tenant_id.as_deref(), Some("a"));
        assert_eq!(grant.school_year_id.as_deref(), Some("17"));

        let bearer: Value = serde_json::from_str(r#"{"bearer": "t2"}"#).unwrap();
        assert_eq!(extract_token(&bearer).unwrap().token, "t2");

        let nested: Value =
            serde_json::from_str(r#"{"data": {"token": "t3", "tenant_id": 9}}"#).unwrap();
        let grant = extract_token(&nested).unwrap();
        assert_eq!(grant.token, "t3");
        assert_eq!(grant.tenant_id.as_deref(), Some("9"));

        let none: Value = serde_json::from_str(r#"{"status": "ok"}"#).unwrap();
        assert!(extract_token(&none).is_none());
    }

    #[test]
    fn decodes_jwt_claims() {
        let token = fake_jwt(r#"{"tenant_id": "t-1", "exp": 123}"#);
        let claims = decode_jwt_claims(&token).unwrap();
        assert_eq!(claims["tenant_id"], "t-1");

        assert!(decode_jwt_claims("not-a-jwt").is_none());
    }

    #[tokio::test]
    async fn session_exchange_returns_grant() {
        let token = fake_jwt(r#"{"tenant_id": "t-1"}"#);
        let http = FakeHttp::new().route("GET", "api/token/new", &[(200, token.as_str())]);

        let grant = bearer_from_session(&http, "Ajax.webuntis.com", "My School", &session())
            .await
            .unwrap();
        assert_eq!(grant.token, token);
        assert_eq!(grant.tenant_id.as_deref(), Some("t-1"));
        assert_eq!(grant.school_year_id, None);
    }

    #[tokio::test]
    async fn session_exchange_rejects_non_jwt_bodies() {
        let http = FakeHttp::new().route("GET", "api/token/new", &[(200, "<html>login</html>")]);
        assert!(
            bearer_from_session(&http, "Ajax.webuntis.com", "My School", &session())
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn credential_cascade_walks_endpoints_in_order() {
        // The first two endpoints fail; the third answers with the nested
        // token shape on its first payload variant.
        let http = FakeHttp::new().route(
            "POST",
            "authenticate/user",
            &[(200, r#"{"data": {"token": "t9", "schoolYearId": 17}}"#)],
        );

        let grant = bearer_from_credentials(&http, "Ajax.webuntis.com", "My School", "u", "p")
            .await
            .unwrap();
        assert_eq!(grant.token, "t9");
        assert_eq!(grant.school_year_id.as_deref(), Some("17"));

        // Each failing endpoint is tried with every payload × suffix combination.
        assert_eq!(http.hits("api/rest/auth/login"), 4);
        assert_eq!(http.hits("view/v1/login"), 4);
        assert_eq!(http.hits("authenticate/user"), 1);
    }

    #[tokio::test]
    async fn cascade_exhaustion_yields_none() {
        let http = FakeHttp::new();
        assert!(
            bearer_from_credentials(&http, "Ajax.webuntis.com", "My School", "u", "p")
                .await
                .is_none()
        );
        assert_eq!(http.requests().len(), 12);
    }

    #[tokio::test]
    async fn acquire_backfills_school_year_from_app_config() {
        let token = fake_jwt(r#"{"tenant_id": "t-1"}"#);
        let http = FakeHttp::new()
            .route("GET", "api/token/new", &[(200, token.as_str())])
            .route(
                "GET",
                "api/app/config",
                &[(200, r#"{"data": {"currentSchoolYear": {"id": 21}}}"#)],
            );

        let grant = acquire_bearer(&http, "Ajax.webuntis.com", &config(), &session())
            .await
            .unwrap();
        assert_eq!(grant.school_year_id.as_deref(), Some("21"));
    }

    #[tokio::test]
    async fn acquire_falls_back_to_credentials() {
        let http = FakeHttp::new()
            .route("GET", "api/token/new", &[(403, "")])
            .route("POST", "api/rest/auth/login", &[(200, r#"{"token": "t5"}"#)]);

        let grant = acquire_bearer(&http, "Ajax.webuntis.com", &config(), &session())
            .await
            .unwrap();
        assert_eq!(grant.token, "t5");
    }
}
